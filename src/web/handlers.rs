use axum::{
    body::Body,
    extract::Path,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::assets::StaticAssets;

pub async fn index() -> impl IntoResponse {
    serve_embedded_asset("static/index.html").await
}

pub async fn serve_static_asset(Path(path): Path<String>) -> impl IntoResponse {
    let asset_path = format!("static/{}", path);
    serve_embedded_asset(&asset_path).await
}

async fn serve_embedded_asset(path: &str) -> impl IntoResponse {
    match StaticAssets::get_asset(path) {
        Some(asset) => {
            let content_type = StaticAssets::get_content_type(path);
            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CACHE_CONTROL, "no-cache")
                .body(Body::from(asset.data.to_vec()))
                .unwrap()
        }
        None => Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(Body::from("Asset not found"))
            .unwrap(),
    }
}
