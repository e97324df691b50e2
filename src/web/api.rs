use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use tracing::error;

use super::AppState;
use crate::models::*;

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 100;
const MAX_LIMIT: u32 = 1000;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Query parameters for channel listing. Paging values arrive as raw
/// strings so malformed numbers can fall back to defaults instead of
/// rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct ChannelQueryParams {
    pub search: Option<String>,
    pub site: Option<String>,
    pub lang: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(DEFAULT_PAGE)
}

fn parse_limit(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|limit| *limit >= 1)
        .map(|limit| limit.min(MAX_LIMIT))
        .unwrap_or(DEFAULT_LIMIT)
}

fn internal_error(error: &str, e: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(error, e.to_string())),
    )
}

pub async fn list_channels(
    State(state): State<AppState>,
    Query(params): Query<ChannelQueryParams>,
) -> Result<Json<ChannelListResponse>, ApiError> {
    let page = parse_page(params.page.as_deref());
    let limit = parse_limit(params.limit.as_deref());

    let filter = ChannelFilter {
        search: params.search,
        site: params.site,
        lang: params.lang,
    };

    let (channels, total_count) = match state.database.list_channels(&filter, page, limit).await {
        Ok(result) => result,
        Err(e) => {
            error!("Error in /api/channels: {}", e);
            return Err(internal_error("Failed to fetch channels", e));
        }
    };

    let last_update = match state.database.last_update().await {
        Ok(value) => value,
        Err(e) => {
            error!("Error in /api/channels: {}", e);
            return Err(internal_error("Failed to fetch channels", e));
        }
    };

    let total_pages = (total_count as u64).div_ceil(limit as u64) as u32;

    Ok(Json(ChannelListResponse {
        channels,
        pagination: Pagination {
            page,
            limit,
            total_count,
            total_pages,
        },
        last_update,
    }))
}

pub async fn get_filters(
    State(state): State<AppState>,
) -> Result<Json<FiltersResponse>, ApiError> {
    match state.database.get_filter_options().await {
        Ok((sites, languages, countries)) => Ok(Json(FiltersResponse {
            sites,
            languages,
            countries,
        })),
        Err(e) => {
            error!("Error in /api/filters: {}", e);
            Err(internal_error("Failed to fetch filters", e))
        }
    }
}

pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let total_channels = match state.database.channel_count().await {
        Ok(count) => count,
        Err(e) => {
            error!("Error in /api/stats: {}", e);
            return Err(internal_error("Failed to fetch stats", e));
        }
    };

    let last_update = match state.database.last_update().await {
        Ok(value) => value,
        Err(e) => {
            error!("Error in /api/stats: {}", e);
            return Err(internal_error("Failed to fetch stats", e));
        }
    };

    Ok(Json(StatsResponse {
        total_channels,
        last_update,
    }))
}

pub async fn refresh_channels(
    State(state): State<AppState>,
) -> Result<Json<RefreshResponse>, ApiError> {
    match state.ingestor.refresh().await {
        Ok((channel_count, last_update)) => Ok(Json(RefreshResponse {
            success: true,
            channel_count,
            last_update,
        })),
        Err(e) => {
            error!("Error refreshing channels: {}", e);
            Err(internal_error("Failed to refresh channels", e))
        }
    }
}

pub async fn create_report(
    State(state): State<AppState>,
    Json(payload): Json<ReportRequest>,
) -> Result<(StatusCode, Json<Report>), ApiError> {
    let reason = payload
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|reason| !reason.is_empty());

    let Some(reason) = reason else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "Invalid report",
                "A non-empty reason is required",
            )),
        ));
    };

    match state.database.insert_report(&payload, reason).await {
        Ok(report) => Ok((StatusCode::CREATED, Json(report))),
        Err(e) => {
            error!("Error in /api/report: {}", e);
            Err(internal_error("Failed to submit report", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_defaults() {
        assert_eq!(parse_page(None), 1);
        assert_eq!(parse_page(Some("3")), 3);
        assert_eq!(parse_page(Some(" 7 ")), 7);
        assert_eq!(parse_page(Some("0")), 1);
        assert_eq!(parse_page(Some("-2")), 1);
        assert_eq!(parse_page(Some("abc")), 1);
    }

    #[test]
    fn test_parse_limit_defaults_and_clamps() {
        assert_eq!(parse_limit(None), 100);
        assert_eq!(parse_limit(Some("25")), 25);
        assert_eq!(parse_limit(Some("0")), 100);
        assert_eq!(parse_limit(Some("garbage")), 100);
        assert_eq!(parse_limit(Some("100000")), 1000);
    }
}
