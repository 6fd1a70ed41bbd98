//! HTTP surface of the exporter
//!
//! One route for the informational root, one for the configured metrics
//! path, a 404 fallback for everything else. Workers run concurrently
//! up to the configured pool size with a per-request ceiling; the only
//! state shared between them is the read-only fallback configuration.

use crate::config::ExporterConfig;
use crate::handler;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use ilo_client::SessionConfig;
use ilo_core::TargetFallback;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::info;

/// Shared read-only request state
#[derive(Clone)]
pub struct AppState {
    pub fallback: Arc<TargetFallback>,
    pub session: SessionConfig,
}

/// Build the exporter router for the given configuration
pub fn build_router(config: &ExporterConfig, state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route(&config.endpoint, get(handler::metrics_handler))
        .fallback(not_found_handler)
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(ConcurrencyLimitLayer::new(config.max_connections))
        .with_state(state)
}

/// Bind and serve until ctrl-c
pub async fn run(config: ExporterConfig, fallback: TargetFallback) -> anyhow::Result<()> {
    config.validate()?;
    let addr = config.socket_addr()?;

    let state = AppState {
        fallback: Arc::new(fallback),
        session: SessionConfig::default(),
    };
    let app = build_router(&config, state);

    let listener = TcpListener::bind(addr).await?;
    info!(
        "Starting exporter on: http://{}:{}{}",
        config.address, config.port, config.endpoint
    );
    info!("Press Ctrl+C to quit");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Killing exporter");
}

/// Static informational page on the root path
async fn index_handler() -> Html<&'static str> {
    Html(
        r#"<html>
            <head><title>HP iLO Exporter</title></head>
            <body>
            <h1>HP iLO Exporter</h1>
            <p>Visit <a href="/metrics">Metrics</a> to use.</p>
            </body>
            </html>"#,
    )
}

async fn not_found_handler() -> StatusCode {
    StatusCode::NOT_FOUND
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let state = AppState {
            fallback: Arc::new(TargetFallback::default()),
            session: SessionConfig::default(),
        };
        build_router(&ExporterConfig::default(), state)
    }

    #[tokio::test]
    async fn test_root_serves_info_page() {
        let response = test_router()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("HP iLO Exporter"));
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/somewhere-else")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_metrics_without_credentials_is_500_empty() {
        // No query parameters and no environment fallback: resolution
        // fails before any collaborator is contacted.
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/metrics")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(body.is_empty());
    }
}
