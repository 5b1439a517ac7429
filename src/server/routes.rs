//! HTTP handlers for analysis, downloads and health

use super::error::ApiError;
use crate::catalog::RenditionOption;
use crate::core::{Downloader, VideoSummary};
use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub downloader: Downloader,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    #[serde(default)]
    pub url: String,
    pub format: RenditionOption,
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze))
        .route("/api/download", post(download))
        .route("/api/health", get(health))
        .with_state(state)
}

async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<VideoSummary>, ApiError> {
    let Json(request) = payload?;
    let summary = state.downloader.analyze(&request.url).await?;
    Ok(Json(summary))
}

async fn download(
    State(state): State<AppState>,
    payload: Result<Json<DownloadRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let transfer = state
        .downloader
        .download(&request.url, &request.format)
        .await?;

    let disposition = HeaderValue::from_str(&transfer.content_disposition())
        .map_err(|e| ApiError::internal(format!("Invalid filename header: {}", e)))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(transfer.content_type),
    );
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    if let Some(length) = transfer.content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    info!(
        "Streaming {} ({:?}) to client",
        transfer.filename, transfer.route
    );
    Ok((headers, Body::from_stream(transfer.body)).into_response())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VidmuxError;
    use crate::testing::{sample_metadata, CatMuxer, ScriptedProvider};
    use crate::transfer::TransferConfig;
    use axum::body::to_bytes;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    const URL: &str = "https://youtu.be/dQw4w9WgXcQ";

    fn app(provider: ScriptedProvider) -> Router {
        let downloader = Downloader::new(Arc::new(provider))
            .with_transfer_config(TransferConfig::default().with_muxer(Arc::new(CatMuxer)));
        router(AppState { downloader })
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn analyzed_formats() -> Vec<Value> {
        let response = app(ScriptedProvider::new(sample_metadata()))
            .oneshot(post_json("/api/analyze", json!({ "url": URL })))
            .await
            .unwrap();
        json_body(response).await["formats"].as_array().unwrap().clone()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(ScriptedProvider::new(sample_metadata()))
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn test_analyze_success() {
        let response = app(ScriptedProvider::new(sample_metadata()))
            .oneshot(post_json("/api/analyze", json!({ "url": URL })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = json_body(response).await;
        assert_eq!(json["title"], "My Video: Part 1");
        assert_eq!(json["duration"], "3:32");
        assert_eq!(json["views"], "1.5K");
        assert_eq!(json["formats"][0]["quality"], "1080p (High Quality)");
        assert_eq!(json["formats"][0]["isHighQuality"], true);
        assert_eq!(json["formats"][2]["containerFormat"], "mp3");
    }

    #[tokio::test]
    async fn test_analyze_missing_url() {
        let response = app(ScriptedProvider::new(sample_metadata()))
            .oneshot(post_json("/api/analyze", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json_body(response).await["error"].is_string());
    }

    #[tokio::test]
    async fn test_analyze_unrecognized_url() {
        let response = app(ScriptedProvider::new(sample_metadata()))
            .oneshot(post_json("/api/analyze", json!({ "url": "https://vimeo.com/1" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app(ScriptedProvider::new(sample_metadata()))
            .oneshot(request)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Invalid request body" })
        );
    }

    #[tokio::test]
    async fn test_provider_errors_map_to_status() {
        let cases: [(fn() -> VidmuxError, StatusCode); 4] = [
            (|| VidmuxError::Private, StatusCode::NOT_FOUND),
            (|| VidmuxError::AgeRestricted, StatusCode::FORBIDDEN),
            (|| VidmuxError::LoginRequired, StatusCode::FORBIDDEN),
            (|| VidmuxError::Generic("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (make, status) in cases {
            let provider = ScriptedProvider::new(sample_metadata()).fail_metadata(make);
            let response = app(provider)
                .oneshot(post_json("/api/analyze", json!({ "url": URL })))
                .await
                .unwrap();
            assert_eq!(response.status(), status);
        }
    }

    #[tokio::test]
    async fn test_download_premuxed() {
        let formats = analyzed_formats().await;
        let response = app(ScriptedProvider::new(sample_metadata()))
            .oneshot(post_json(
                "/api/download",
                json!({ "url": URL, "format": formats[1] }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "video/mp4");
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"My_Video_Part_1.mp4\""
        );
        assert_eq!(headers[header::CONTENT_LENGTH], "8");

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"premuxed");
    }

    #[tokio::test]
    async fn test_download_audio_only() {
        let formats = analyzed_formats().await;
        let response = app(ScriptedProvider::new(sample_metadata()))
            .oneshot(post_json(
                "/api/download",
                json!({ "url": URL, "format": formats[2] }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"My_Video_Part_1.mp3\""
        );
    }

    #[tokio::test]
    async fn test_download_high_quality_is_muxed() {
        let formats = analyzed_formats().await;
        let response = app(ScriptedProvider::new(sample_metadata()))
            .oneshot(post_json(
                "/api/download",
                json!({ "url": URL, "format": formats[0] }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::CONTENT_LENGTH).is_none());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"videoaudio");
    }

    #[tokio::test]
    async fn test_download_stale_format_is_not_found() {
        let mut formats = analyzed_formats().await;
        formats[0]["videoStreamId"] = json!("299");
        let response = app(ScriptedProvider::new(sample_metadata()))
            .oneshot(post_json(
                "/api/download",
                json!({ "url": URL, "format": formats[0] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_download_missing_format_is_bad_request() {
        let response = app(ScriptedProvider::new(sample_metadata()))
            .oneshot(post_json("/api/download", json!({ "url": URL })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_download_upstream_failure_before_headers() {
        let formats = analyzed_formats().await;
        let provider = ScriptedProvider::new(sample_metadata()).fail_open("18");
        let response = app(provider)
            .oneshot(post_json(
                "/api/download",
                json!({ "url": URL, "format": formats[1] }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Failed to process the video" })
        );
    }
}
