use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use civic_pulse::heatmap::{heatmap_router, HeatmapEngine};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_heatmap_routes(engine: Arc<HeatmapEngine>) -> axum::Router {
    heatmap_router(engine)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::FileSources;
    use axum::body::Body;
    use axum::http::Request;
    use civic_pulse::heatmap::states::StateCodes;
    use std::path::PathBuf;
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_engine() -> Arc<HeatmapEngine> {
        // Point at a directory with no corpus files: every source query
        // degrades, which is exactly the zero-score path the routes must
        // still render.
        let sources = FileSources::new(PathBuf::from("./does-not-exist"));
        Arc::new(HeatmapEngine::new(
            Arc::new(sources.clone()),
            Arc::new(sources.clone()),
            Arc::new(sources),
            StateCodes::standard(),
            Duration::ZERO,
        ))
    }

    #[tokio::test]
    async fn representative_heatmap_renders_with_degraded_sources() {
        let app = with_heatmap_routes(test_engine());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/heatmap/representatives?metric=recent_activity")
                    .body(Body::empty())
                    .expect("valid request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body["metric"], "recent_activity");
        assert_eq!(body["metadata"]["total_districts"], 0);
    }

    #[tokio::test]
    async fn unknown_district_type_is_a_terminal_400() {
        let app = with_heatmap_routes(test_engine());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/heatmap/representatives?district_type=county-districts")
                    .body(Body::empty())
                    .expect("valid request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        let valid = body["valid_values"].as_array().expect("valid values listed");
        assert!(valid.contains(&serde_json::Value::String(
            "congressional-districts".to_string()
        )));
    }

    #[tokio::test]
    async fn topic_heatmap_always_offers_the_all_sentinel() {
        let app = with_heatmap_routes(test_engine());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/heatmap/topics?district_type=state-upper-districts")
                    .body(Body::empty())
                    .expect("valid request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body["available_topics"][0], "all");
        assert_eq!(body["selected_topic"], "all");
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }
}
