use rust_embed::RustEmbed;

/// Embedded static web assets for the browsing frontend.
#[derive(RustEmbed)]
#[folder = "static/"]
#[prefix = "static/"]
pub struct StaticAssets;

impl StaticAssets {
    /// Get a static asset by path
    pub fn get_asset(path: &str) -> Option<rust_embed::EmbeddedFile> {
        Self::get(path)
    }

    /// Get the content type for a given file extension
    pub fn get_content_type(path: &str) -> &'static str {
        match path.split('.').next_back() {
            Some("html") => "text/html; charset=utf-8",
            Some("css") => "text/css; charset=utf-8",
            Some("js") => "application/javascript; charset=utf-8",
            Some("json") => "application/json; charset=utf-8",
            Some("png") => "image/png",
            Some("svg") => "image/svg+xml; charset=utf-8",
            Some("ico") => "image/x-icon",
            _ => "application/octet-stream",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_detection() {
        assert_eq!(
            StaticAssets::get_content_type("test.html"),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            StaticAssets::get_content_type("app.js"),
            "application/javascript; charset=utf-8"
        );
        assert_eq!(
            StaticAssets::get_content_type("unknown.bin"),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_index_page_is_embedded() {
        assert!(StaticAssets::get_asset("static/index.html").is_some());
    }
}
