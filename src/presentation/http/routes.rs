//! API route definitions

use axum::{
    Router,
    routing::{any, get},
};
use tower_http::trace::TraceLayer;

use crate::application::services::OPTIMIZE_ENDPOINT;

use super::handlers;
use super::state::AppState;

/// Builds the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route(OPTIMIZE_ENDPOINT, any(handlers::optimize_image))
        .fallback(handlers::edge)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::sync::Arc;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use reqwest::Url;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::application::services::{AssetCache, AssetCacheConfig, DEFAULT_PLACEHOLDER};
    use crate::application::use_cases::OptimizeImageUseCase;
    use crate::domain::entities::AssetResponse;
    use crate::domain::ports::mocks::{MockNetwork, MockObjectStorage};
    use crate::infrastructure::cache::MemoryCacheStorage;
    use crate::infrastructure::image::ImageTranscoder;
    use crate::presentation::http::state::EdgeProxy;

    const SOURCE: &str = "https://cdn.example.com/cover.png";
    const SITE: &str = "https://avtor.bg";
    const PLACEHOLDER_SVG: &[u8] = b"<svg xmlns=\"http://www.w3.org/2000/svg\"/>";

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(width, height, image::Rgb([10, 90, 160]));
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn state(network: &Arc<MockNetwork>) -> AppState {
        AppState::new(OptimizeImageUseCase::new(
            network.clone(),
            Arc::new(MockObjectStorage::new()),
            Arc::new(ImageTranscoder::default()),
        ))
    }

    fn network_with_source() -> Arc<MockNetwork> {
        let network = Arc::new(MockNetwork::new());
        network.respond(
            SOURCE,
            AssetResponse::new(200, png(400, 200)).with_header("content-type", "image/png"),
        );
        network
    }

    async fn edge_state() -> (Arc<MockNetwork>, AppState) {
        let network = Arc::new(MockNetwork::new());
        let site = Url::parse(SITE).unwrap();
        network.respond_ok(site.join("/").unwrap().as_str(), "text/html", b"<html>home</html>");
        network.respond_ok(site.join("/manifest.json").unwrap().as_str(), "application/json", b"{}");
        network.respond_ok(
            site.join(DEFAULT_PLACEHOLDER).unwrap().as_str(),
            "image/svg+xml",
            PLACEHOLDER_SVG,
        );

        let cache = AssetCache::new(
            AssetCacheConfig::default(),
            site.clone(),
            network.clone(),
            Arc::new(MemoryCacheStorage::new(64)),
        );
        cache.install().await.unwrap();

        let state = state(&network).with_edge(EdgeProxy {
            cache: Arc::new(cache),
            origin: site,
            network: network.clone(),
        });
        (network, state)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = router(state(&Arc::new(MockNetwork::new())));
        let response = app.oneshot(get("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["status"], "healthy");
        assert!(body.get("asset_cache").is_none());
    }

    #[tokio::test]
    async fn test_missing_url_is_bad_request() {
        let app = router(state(&Arc::new(MockNetwork::new())));
        let response = app
            .oneshot(get("/api/optimize-image?width=100"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["error"], "Missing url parameter");
    }

    #[tokio::test]
    async fn test_post_not_allowed() {
        let app = router(state(&Arc::new(MockNetwork::new())));
        let request = Request::builder()
            .method("POST")
            .uri(format!("/api/optimize-image?url={SOURCE}"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[header::ALLOW], "GET");
    }

    #[tokio::test]
    async fn test_optimized_jpeg() {
        let app = router(state(&network_with_source()));
        let response = app
            .oneshot(get(&format!("/api/optimize-image?url={SOURCE}&width=100&format=jpeg")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "public, max-age=2592000, stale-while-revalidate=86400"
        );

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert!(decoded.width() <= 100);
        assert_eq!(decoded.height(), 50);
    }

    #[tokio::test]
    async fn test_default_format_is_webp() {
        let app = router(state(&network_with_source()));
        let response = app
            .oneshot(get(&format!("/api/optimize-image?url={SOURCE}&width=40")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/webp");
    }

    async fn optimized(format: &str) -> (String, axum::body::Bytes) {
        let app = router(state(&network_with_source()));
        let response = app
            .oneshot(get(&format!("/api/optimize-image?url={SOURCE}&width=40&format={format}")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .to_string();
        (content_type, to_bytes(response.into_body(), usize::MAX).await.unwrap())
    }

    #[tokio::test]
    async fn test_png_content_type() {
        let (content_type, bytes) = optimized("png").await;
        assert_eq!(content_type, "image/png");
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[tokio::test]
    async fn test_avif_content_type() {
        let (content_type, bytes) = optimized("avif").await;
        assert_eq!(content_type, "image/avif");
        assert_eq!(&bytes[4..8], b"ftyp");
    }

    #[tokio::test]
    async fn test_method_checked_before_parameters() {
        let app = router(state(&Arc::new(MockNetwork::new())));
        let request = Request::builder()
            .method("PUT")
            .uri("/api/optimize-image?width=abc&format=gif")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_unreachable_source_is_server_error() {
        let network = Arc::new(MockNetwork::new());
        network.set_offline(true);
        let app = router(state(&network));
        let response = app
            .oneshot(get(&format!("/api/optimize-image?url={SOURCE}")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json(response).await["error"], "Failed to optimize image");
    }

    #[tokio::test]
    async fn test_unknown_route_without_edge() {
        let app = router(state(&Arc::new(MockNetwork::new())));
        let response = app.oneshot(get("/books")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_edge_offline_navigation_served_from_cache() {
        let (network, state) = edge_state().await;
        network.set_offline(true);
        let app = router(state);

        let request = Request::builder()
            .uri("/never-visited")
            .header(header::ACCEPT, "text/html")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"<html>home</html>");
    }

    #[tokio::test]
    async fn test_edge_image_placeholder() {
        let (network, state) = edge_state().await;
        network.set_offline(true);
        let app = router(state);

        let response = app.oneshot(get("/images/missing.jpg")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], PLACEHOLDER_SVG);
    }

    #[tokio::test]
    async fn test_edge_offline_font_is_bad_gateway() {
        let (network, state) = edge_state().await;
        network.set_offline(true);
        let app = router(state);

        let response = app.oneshot(get("/fonts/inter.woff2")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_edge_api_passes_through() {
        let (network, state) = edge_state().await;
        network.respond_ok("https://avtor.bg/api/contact", "application/json", b"{\"ok\":true}");
        let app = router(state);

        let response = app.oneshot(get("/api/contact")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["ok"], true);
        assert_eq!(network.fetch_count("https://avtor.bg/api/contact"), 1);
    }
}
