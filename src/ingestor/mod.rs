//! Channel ingestion pipeline.
//!
//! One refresh cycle lists the upstream repository tree, filters it down to
//! channel files, fetches and parses each file in rate-limited batches, and
//! atomically replaces the stored channel set.

use anyhow::Result;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{IngestionConfig, UpstreamConfig};
use crate::country::detect_country;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{ParsedChannel, TreeEntry};

pub mod channels_xml;
pub mod scheduler;

pub use scheduler::RefreshScheduler;

use channels_xml::{parse_channel_entries, ChannelEntry};

const USER_AGENT: &str = "EPG-Browser";

#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
}

pub struct ChannelIngestor {
    client: Client,
    database: Database,
    upstream: UpstreamConfig,
    ingestion: IngestionConfig,
}

impl ChannelIngestor {
    /// Every request goes through one shared client carrying the configured
    /// timeout, so a client build failure is fatal at startup.
    pub fn new(
        database: Database,
        upstream: UpstreamConfig,
        ingestion: IngestionConfig,
    ) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(ingestion.request_timeout_seconds))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            database,
            upstream,
            ingestion,
        })
    }

    /// Run one full refresh cycle and return the stored channel count plus
    /// the new `last_update` timestamp.
    ///
    /// Cycles are serialized on the database refresh lock: a refresh
    /// requested while another is running waits its turn rather than
    /// interleaving fetches and writes.
    pub async fn refresh(&self) -> Result<(usize, String)> {
        let _guard = self.database.acquire_refresh_lock().await;

        info!("Fetching channel data from upstream repository");

        let files = self.list_channel_files().await?;
        info!("Found {} channel files", files.len());

        let channels = self.fetch_all_channels(&files).await;
        let last_update = self.database.replace_all_channels(&channels).await?;

        Ok((channels.len(), last_update))
    }

    /// Fetch the recursive tree listing and keep only channel files.
    pub async fn list_channel_files(&self) -> AppResult<Vec<TreeEntry>> {
        let url = self.upstream.tree_url();

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .await
            .map_err(|e| AppError::upstream_unavailable(format!("tree request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::upstream_unavailable(format!(
                "tree request returned {}",
                response.status()
            )));
        }

        let tree: TreeResponse = response
            .json()
            .await
            .map_err(|e| AppError::upstream_unavailable(format!("invalid tree response: {e}")))?;

        Ok(tree
            .tree
            .into_iter()
            .filter(|entry| entry.is_channel_file())
            .collect())
    }

    /// Fetch and parse every file in fixed-size batches, pausing between
    /// batches to stay polite to the raw content host. Individual file
    /// failures are logged and skipped; they never abort the cycle.
    pub async fn fetch_all_channels(&self, files: &[TreeEntry]) -> Vec<ParsedChannel> {
        let mut channels = Vec::new();
        let batch_size = self.ingestion.batch_size.max(1);
        let total = files.len();

        for (batch_index, batch) in files.chunks(batch_size).enumerate() {
            let results = join_all(batch.iter().map(|file| self.fetch_site_channels(file))).await;

            for result in results {
                match result {
                    Ok(mut parsed) => channels.append(&mut parsed),
                    Err(e) => warn!("{e}"),
                }
            }

            let processed = batch_index * batch_size + batch.len();
            info!(
                "Progress: {}/{} files processed ({} channels)",
                processed,
                total,
                channels.len()
            );

            if processed < total {
                tokio::time::sleep(Duration::from_secs(self.ingestion.batch_pause_seconds)).await;
            }
        }

        channels
    }

    /// Download and parse a single channel file into persistable records.
    pub async fn fetch_site_channels(&self, file: &TreeEntry) -> AppResult<Vec<ParsedChannel>> {
        let site_name = file.site_name().unwrap_or_default();
        let url = self.upstream.raw_url(&file.path);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::file_parse(&file.path, format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::file_parse(
                &file.path,
                format!("fetch returned {}", response.status()),
            ));
        }

        let content = response
            .text()
            .await
            .map_err(|e| AppError::file_parse(&file.path, format!("failed to read body: {e}")))?;

        let entries = parse_channel_entries(&file.path, &content)?;

        Ok(entries
            .into_iter()
            .map(|entry| channel_record(entry, site_name))
            .collect())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Apply the field fallback rules to one raw entry. Empty attribute values
/// count as absent, the same as missing attributes.
fn channel_record(entry: ChannelEntry, site_name: &str) -> ParsedChannel {
    let xmltv_id = non_empty(entry.xmltv_id).unwrap_or_default();

    let mut name = non_empty(entry.name).unwrap_or_else(|| xmltv_id.clone());
    if name.is_empty() {
        name = "Unknown".to_string();
    }

    let country = detect_country(&xmltv_id, site_name).to_string();

    ParsedChannel {
        site: non_empty(entry.site).unwrap_or_else(|| site_name.to_string()),
        lang: non_empty(entry.lang).unwrap_or_else(|| "en".to_string()),
        xmltv_id,
        site_id: non_empty(entry.site_id).unwrap_or_default(),
        name,
        country,
    }
}
