use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, error, info};

use super::Database;
use crate::models::{Channel, ChannelFilter, ParsedChannel};

// Helper function to parse datetime from either RFC3339 or SQLite format
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    // Try RFC3339 first
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (YYYY-MM-DD HH:MM:SS)
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt.and_utc());
    }
    Err(anyhow::anyhow!("Failed to parse datetime: {}", s))
}

fn channel_from_row(row: &SqliteRow) -> Result<Channel> {
    let created_at = row.get::<String, _>("created_at");
    Ok(Channel {
        id: row.get("id"),
        site: row.get("site"),
        lang: row.get("lang"),
        xmltv_id: row.get("xmltv_id"),
        site_id: row.get::<Option<String>, _>("site_id").unwrap_or_default(),
        name: row.get("name"),
        country: row.get("country"),
        created_at: parse_datetime(&created_at)?,
    })
}

impl Database {
    /// Atomically swap the whole channel set for `channels` and stamp the
    /// `last_update` metadata key, all in one transaction. Readers see
    /// either the previous set or the new one, never a mixture.
    ///
    /// Returns the stored `last_update` timestamp.
    pub async fn replace_all_channels(&self, channels: &[ParsedChannel]) -> Result<String> {
        info!("Replacing channel set with {} channels", channels.len());

        let mut tx = self.pool.begin().await?;

        let delete_result = sqlx::query("DELETE FROM channels").execute(&mut *tx).await?;
        debug!("Deleted {} existing channels", delete_result.rows_affected());

        let now = Utc::now();
        let created_at = now.to_rfc3339();
        for channel in channels {
            sqlx::query(
                "INSERT INTO channels (site, lang, xmltv_id, site_id, name, country, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&channel.site)
            .bind(&channel.lang)
            .bind(&channel.xmltv_id)
            .bind(&channel.site_id)
            .bind(&channel.name)
            .bind(&channel.country)
            .bind(&created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to insert channel '{}': {}", channel.name, e);
                e
            })?;
        }

        let last_update = now.to_rfc3339_opts(SecondsFormat::Millis, true);
        sqlx::query(
            "INSERT OR REPLACE INTO metadata (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)",
        )
        .bind("last_update")
        .bind(&last_update)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("Stored {} channels", channels.len());
        Ok(last_update)
    }

    /// Filtered, paginated page of channels plus the total count of the
    /// filtered set. `page` is 1-based; the caller is responsible for
    /// validating both paging values.
    pub async fn list_channels(
        &self,
        filter: &ChannelFilter,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Channel>, i64)> {
        let mut where_clause = String::from("WHERE 1=1");
        let mut params: Vec<String> = Vec::new();

        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            where_clause.push_str(" AND (name LIKE ? OR country LIKE ? OR xmltv_id LIKE ?)");
            let pattern = format!("%{search}%");
            params.push(pattern.clone());
            params.push(pattern.clone());
            params.push(pattern);
        }

        if let Some(site) = filter.site.as_deref().filter(|s| !s.is_empty()) {
            where_clause.push_str(" AND site = ?");
            params.push(site.to_string());
        }

        if let Some(lang) = filter.lang.as_deref().filter(|s| !s.is_empty()) {
            where_clause.push_str(" AND lang = ?");
            params.push(lang.to_string());
        }

        let count_query = format!("SELECT COUNT(*) FROM channels {where_clause}");
        let mut count = sqlx::query_scalar::<_, i64>(&count_query);
        for param in &params {
            count = count.bind(param);
        }
        let total_count = count.fetch_one(&self.pool).await?;

        let offset = (page.saturating_sub(1) as i64) * limit as i64;
        let page_query = format!(
            "SELECT id, site, lang, xmltv_id, site_id, name, country, created_at
             FROM channels {where_clause} ORDER BY name, id LIMIT ? OFFSET ?"
        );
        let mut query = sqlx::query(&page_query);
        for param in &params {
            query = query.bind(param);
        }
        let rows = query
            .bind(limit as i64)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let mut channels = Vec::new();
        for row in rows {
            channels.push(channel_from_row(&row)?);
        }

        Ok((channels, total_count))
    }

    /// Distinct filter values for the browsing UI, each list sorted.
    pub async fn get_filter_options(&self) -> Result<(Vec<String>, Vec<String>, Vec<String>)> {
        let sites = sqlx::query_scalar::<_, String>("SELECT DISTINCT site FROM channels ORDER BY site")
            .fetch_all(&self.pool)
            .await?;
        let languages =
            sqlx::query_scalar::<_, String>("SELECT DISTINCT lang FROM channels ORDER BY lang")
                .fetch_all(&self.pool)
                .await?;
        let countries = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT country FROM channels ORDER BY country",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok((sites, languages, countries))
    }

    pub async fn channel_count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM channels")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Timestamp recorded by the most recent successful refresh, if any.
    pub async fn last_update(&self) -> Result<Option<String>> {
        let value =
            sqlx::query_scalar::<_, Option<String>>("SELECT value FROM metadata WHERE key = ?")
                .bind("last_update")
                .fetch_optional(&self.pool)
                .await?;
        Ok(value.flatten())
    }
}
