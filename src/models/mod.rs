use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Channel {
    pub id: i64,
    pub site: String,
    pub lang: String,
    pub xmltv_id: String,
    pub site_id: String,
    pub name: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

/// Channel parsed from an upstream file, not yet persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedChannel {
    pub site: String,
    pub lang: String,
    pub xmltv_id: String,
    pub site_id: String,
    pub name: String,
    pub country: String,
}

#[derive(Debug, Clone, Default)]
pub struct ChannelFilter {
    pub search: Option<String>,
    pub site: Option<String>,
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total_count: i64,
    pub total_pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelListResponse {
    pub channels: Vec<Channel>,
    pub pagination: Pagination,
    pub last_update: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiltersResponse {
    pub sites: Vec<String>,
    pub languages: Vec<String>,
    pub countries: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_channels: i64,
    pub last_update: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub success: bool,
    pub channel_count: usize,
    pub last_update: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRequest {
    pub channel_id: Option<i64>,
    pub xmltv_id: Option<String>,
    pub channel_name: Option<String>,
    pub site: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Report {
    pub id: i64,
    pub channel_id: Option<i64>,
    pub xmltv_id: Option<String>,
    pub channel_name: Option<String>,
    pub site: Option<String>,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// One entry of the upstream repository tree listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: String,
}

impl TreeEntry {
    /// True for blobs under `sites/` named `*.channels.xml`.
    pub fn is_channel_file(&self) -> bool {
        self.entry_type == "blob"
            && self.path.starts_with("sites/")
            && self.path.ends_with(".channels.xml")
    }

    /// Provider directory name, i.e. the path segment after `sites/`.
    pub fn site_name(&self) -> Option<&str> {
        self.path.split('/').nth(1)
    }
}
