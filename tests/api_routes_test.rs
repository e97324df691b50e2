use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use epg_browser::config::{Config, DatabaseConfig};
use epg_browser::database::Database;
use epg_browser::ingestor::ChannelIngestor;
use epg_browser::models::ParsedChannel;
use epg_browser::web::{AppState, WebServer};

// Helper function to send requests to the app
async fn send_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request_builder = Request::builder().method(method).uri(uri);

    let request = if let Some(body) = body {
        request_builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    } else {
        request_builder.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    let json: Value = if body_bytes.is_empty() {
        json!({})
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(json!({}))
    };

    (status, json)
}

fn channel(site: &str, lang: &str, xmltv_id: &str, name: &str, country: &str) -> ParsedChannel {
    ParsedChannel {
        site: site.to_string(),
        lang: lang.to_string(),
        xmltv_id: xmltv_id.to_string(),
        site_id: String::new(),
        name: name.to_string(),
        country: country.to_string(),
    }
}

fn seed_set() -> Vec<ParsedChannel> {
    vec![
        channel("mi.tv", "es", "Azteca7.mx", "Azteca 7", "Mexico"),
        channel("bbc.co.uk", "en", "bbc1.uk", "BBC One", "United Kingdom"),
        channel("tvguide.com", "en", "CNN.us", "CNN", "United States"),
        channel("mi.tv", "es", "Canal5.mx", "Canal 5", "Mexico"),
        channel("ard.de", "de", "DasErste.de", "Das Erste", "Germany"),
        channel("tvguide.com", "en", "HBO.us", "HBO", "United States"),
        channel("nhk.jp", "ja", "NHK.jp", "NHK", "Japan"),
    ]
}

async fn test_app() -> Router {
    let database = Database::new(&DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: Some(1),
    })
    .await
    .unwrap();
    database.migrate().await.unwrap();
    database.replace_all_channels(&seed_set()).await.unwrap();

    let config = Config::default();
    let ingestor = Arc::new(
        ChannelIngestor::new(
            database.clone(),
            config.upstream.clone(),
            config.ingestion.clone(),
        )
        .unwrap(),
    );

    WebServer::create_router(AppState {
        database,
        config,
        ingestor,
    })
}

#[tokio::test]
async fn test_list_channels_envelope() {
    let app = test_app().await;

    let (status, response) = send_request(&app, Method::GET, "/api/channels", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["channels"].as_array().unwrap().len(), 7);
    assert_eq!(response["pagination"]["page"], json!(1));
    assert_eq!(response["pagination"]["limit"], json!(100));
    assert_eq!(response["pagination"]["totalCount"], json!(7));
    assert_eq!(response["pagination"]["totalPages"], json!(1));
    assert!(response["lastUpdate"].is_string());

    // Channel records keep their snake_case field names.
    let first = &response["channels"][0];
    assert_eq!(first["name"], json!("Azteca 7"));
    assert!(first.get("xmltv_id").is_some());
    assert!(first.get("site_id").is_some());
    assert!(first.get("created_at").is_some());
}

#[tokio::test]
async fn test_list_channels_search() {
    let app = test_app().await;

    let (status, response) =
        send_request(&app, Method::GET, "/api/channels?search=bbc", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["pagination"]["totalCount"], json!(1));
    assert_eq!(response["channels"][0]["name"], json!("BBC One"));

    // Country text is searchable too.
    let (_, response) = send_request(&app, Method::GET, "/api/channels?search=united", None).await;
    assert_eq!(response["pagination"]["totalCount"], json!(3));
}

#[tokio::test]
async fn test_list_channels_site_and_lang_filters() {
    let app = test_app().await;

    let (status, response) = send_request(
        &app,
        Method::GET,
        "/api/channels?site=mi.tv&lang=es",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["pagination"]["totalCount"], json!(2));

    let (_, response) = send_request(&app, Method::GET, "/api/channels?lang=en", None).await;
    assert_eq!(response["pagination"]["totalCount"], json!(3));

    // Empty filter values behave as if they were absent.
    let (_, response) =
        send_request(&app, Method::GET, "/api/channels?search=&site=&lang=", None).await;
    assert_eq!(response["pagination"]["totalCount"], json!(7));
}

#[tokio::test]
async fn test_list_channels_pagination() {
    let app = test_app().await;

    let (status, response) =
        send_request(&app, Method::GET, "/api/channels?page=2&limit=3", None).await;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<&str> = response["channels"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Canal 5", "Das Erste", "HBO"]);
    assert_eq!(response["pagination"]["totalPages"], json!(3));

    // Past the last page: empty slice, accurate count.
    let (status, response) =
        send_request(&app, Method::GET, "/api/channels?page=99&limit=3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(response["channels"].as_array().unwrap().is_empty());
    assert_eq!(response["pagination"]["totalCount"], json!(7));
}

#[tokio::test]
async fn test_list_channels_tolerates_malformed_paging() {
    let app = test_app().await;

    let (status, response) = send_request(
        &app,
        Method::GET,
        "/api/channels?page=abc&limit=-5",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["pagination"]["page"], json!(1));
    assert_eq!(response["pagination"]["limit"], json!(100));

    // Oversized limits are clamped, not rejected.
    let (status, response) =
        send_request(&app, Method::GET, "/api/channels?limit=100000", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["pagination"]["limit"], json!(1000));
}

#[tokio::test]
async fn test_filters_endpoint_lists_distinct_values() {
    let app = test_app().await;

    let (status, response) = send_request(&app, Method::GET, "/api/filters", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        response["sites"],
        json!(["ard.de", "bbc.co.uk", "mi.tv", "nhk.jp", "tvguide.com"])
    );
    assert_eq!(response["languages"], json!(["de", "en", "es", "ja"]));
    assert_eq!(
        response["countries"],
        json!(["Germany", "Japan", "Mexico", "United Kingdom", "United States"])
    );
}

#[tokio::test]
async fn test_stats_endpoint() {
    let app = test_app().await;

    let (status, response) = send_request(&app, Method::GET, "/api/stats", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["totalChannels"], json!(7));
    assert!(response["lastUpdate"].is_string());
}

#[tokio::test]
async fn test_report_requires_reason() {
    let app = test_app().await;

    let (status, response) =
        send_request(&app, Method::POST, "/api/report", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], json!("Invalid report"));
    assert!(response["message"].is_string());

    let (status, _) = send_request(
        &app,
        Method::POST,
        "/api/report",
        Some(json!({ "reason": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_report_stores_trimmed_reason() {
    let app = test_app().await;

    let (status, response) = send_request(
        &app,
        Method::POST,
        "/api/report",
        Some(json!({
            "channel_id": 3,
            "xmltv_id": "CNN.us",
            "channel_name": "CNN",
            "site": "tvguide.com",
            "reason": "  stream is offline  "
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(response["id"].as_i64().unwrap() >= 1);
    assert_eq!(response["reason"], json!("stream is offline"));
    assert_eq!(response["channel_name"], json!("CNN"));
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = test_app().await;

    let (status, _) = send_request(&app, Method::GET, "/api/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_index_serves_embedded_frontend() {
    let app = test_app().await;

    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/html"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(body.to_vec()).unwrap();
    assert!(html.contains("<!DOCTYPE html>"));

    let (status, _) = send_request(&app, Method::GET, "/static/missing.css", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
