use anyhow::Result;
use chrono::Utc;
use tracing::info;

use super::Database;
use crate::models::{Report, ReportRequest};

impl Database {
    /// Append a channel problem report. `reason` is the validated,
    /// trimmed reason text; the rest of the request fields are stored
    /// as submitted.
    pub async fn insert_report(&self, request: &ReportRequest, reason: &str) -> Result<Report> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO reports (channel_id, xmltv_id, channel_name, site, reason, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(request.channel_id)
        .bind(&request.xmltv_id)
        .bind(&request.channel_name)
        .bind(&request.site)
        .bind(reason)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;

        let report = Report {
            id: result.last_insert_rowid(),
            channel_id: request.channel_id,
            xmltv_id: request.xmltv_id.clone(),
            channel_name: request.channel_name.clone(),
            site: request.site.clone(),
            reason: reason.to_string(),
            created_at: now,
        };

        info!(
            "Recorded channel report {} for '{}'",
            report.id,
            report.channel_name.as_deref().unwrap_or("unknown channel")
        );

        Ok(report)
    }
}
