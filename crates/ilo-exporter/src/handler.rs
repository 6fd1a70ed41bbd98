//! Request orchestration
//!
//! One scrape per request: resolve the target, open a controller
//! session, fetch identity best-effort, fetch the health report, walk
//! it into a fresh request-scoped registry, and encode. Failures before
//! the health report is in hand abort the request with an empty 500;
//! everything after is best-effort and only drops its own samples.

use crate::server::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use ilo_client::{Controller, HttpController};
use ilo_core::{labels, IloTarget, Result, ServerIdentity};
use ilo_metrics::{HealthWalker, ScrapeMetrics};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, warn};

/// Handler for the configured metrics path
pub async fn metrics_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let started = Instant::now();

    let target = match IloTarget::resolve(&params, &state.fallback) {
        Ok(target) => target,
        Err(e) => {
            warn!(error = %e, "target resolution failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let controller = match HttpController::open_session(&target, &state.session).await {
        Ok(controller) => controller,
        Err(e) => {
            warn!(host = %target.host, error = %e, "controller session failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    match scrape(&controller, &target, started).await {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain")],
            body,
        )
            .into_response(),
        Err(e) => {
            warn!(host = %target.host, error = %e, "scrape failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Drive one full scrape against an open controller session.
///
/// Returns the concatenation of the request-scoped exposition payload
/// and the process-wide self-metrics payload.
pub async fn scrape<C: Controller>(
    controller: &C,
    target: &IloTarget,
    started: Instant,
) -> Result<String> {
    let identity = fetch_identity(controller, target).await;
    debug!(server = %identity.server_name, "scraping health report");

    // The one mandatory fetch; without it no meaningful measurement
    // exists and the request fails.
    let health = controller.get_embedded_health().await?;

    let mut metrics = ScrapeMetrics::new()?;
    let mut walker = HealthWalker::new(&mut metrics, &identity);
    walker.walk(&health);

    if let Ok(power) = controller.get_host_power_status().await {
        if let Err(e) = walker.power_state(&power) {
            warn!(error = %e, "power state sample dropped");
        }
    }

    match controller.get_fw_version().await {
        Ok(firmware) => {
            if let Err(e) = walker.network(&health, &firmware) {
                warn!(error = %e, "nic samples dropped");
            }
            if let Err(e) = walker.firmware_version(&firmware) {
                warn!(error = %e, "firmware version sample dropped");
            }
        }
        Err(e) => debug!(error = %e, "firmware version unavailable"),
    }

    if let Ok(oa) = controller.get_oa_info().await {
        if let Err(e) = walker.oa_info(&oa) {
            warn!(error = %e, "onboard administrator sample dropped");
        }
    }

    metrics
        .request_processing_seconds
        .set(started.elapsed().as_secs_f64());

    let mut payload = metrics.export()?;
    payload.push_str(&ScrapeMetrics::export_process_metrics()?);
    Ok(payload)
}

/// Resolve the identity label triple, each field falling back
/// independently so a half-answering controller never aborts the scrape
async fn fetch_identity<C: Controller>(controller: &C, target: &IloTarget) -> ServerIdentity {
    let product_name = controller
        .get_product_name()
        .await
        .unwrap_or_else(|_| labels::UNKNOWN_PRODUCT.to_string());

    let server_name = match controller.get_server_name().await {
        Ok(name) if !name.is_empty() => name,
        _ => target.host.clone(),
    };

    let serial_number = match controller.get_host_data().await {
        Ok(host_data) => labels::serial_from_host_data(&host_data),
        Err(_) => None,
    }
    .unwrap_or_else(|| labels::UNKNOWN_SERIAL.to_string());

    ServerIdentity::new(product_name, server_name, serial_number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ilo_client::MockController;
    use ilo_core::TargetFallback;
    use serde_json::json;

    fn target(host: &str) -> IloTarget {
        let mut params = HashMap::new();
        params.insert("ilo_host".to_string(), host.to_string());
        params.insert("ilo_user".to_string(), "admin".to_string());
        params.insert("ilo_password".to_string(), "secret".to_string());
        IloTarget::resolve(&params, &TargetFallback::default()).unwrap()
    }

    fn sample_line<'t>(text: &'t str, needle: &str) -> &'t str {
        text.lines()
            .filter(|line| !line.starts_with('#'))
            .find(|line| line.contains(needle))
            .unwrap_or_else(|| panic!("no sample line containing {:?}", needle))
    }

    #[tokio::test]
    async fn test_end_to_end_scrape() {
        let mock = MockController::new(json!({
            "health_at_a_glance": {"storage": {"status": "OK"}},
            "temperature": {}
        }))
        .with_power_status("ON");

        let body = scrape(&mock, &target("10.0.0.1"), Instant::now())
            .await
            .unwrap();

        assert_eq!(body.matches("hpilo_storage_status{").count(), 1);
        assert!(sample_line(&body, "hpilo_storage_status{").ends_with(" 0"));
        assert!(!body.contains("hpilo_temperature_value"));
        assert!(sample_line(&body, "hpilo_running_status{").ends_with(" 0"));
        assert!(body.contains("hpilo_request_processing_seconds"));
    }

    #[tokio::test]
    async fn test_mandatory_health_fetch_failure_is_fatal() {
        let broken = MockController::new(json!({})).fail_embedded_health();
        assert!(scrape(&broken, &target("10.0.0.1"), Instant::now())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_soft_fetch_failures_only_drop_their_samples() {
        let mock = MockController::new(json!({
            "health_at_a_glance": {"storage": {"status": "OK"}}
        }))
        .fail_power_status()
        .fail_fw_version();

        let body = scrape(&mock, &target("10.0.0.1"), Instant::now())
            .await
            .unwrap();
        assert!(!body.contains("hpilo_running_status"));
        assert!(!body.contains("hpilo_firmware_version"));
        assert!(body.contains("hpilo_storage_status"));
    }

    #[tokio::test]
    async fn test_identity_fallbacks() {
        let mock = MockController::new(json!({}))
            .fail_product_name()
            .fail_server_name()
            .fail_host_data();

        let identity = fetch_identity(&mock, &target("10.9.9.9")).await;
        assert_eq!(identity.product_name, labels::UNKNOWN_PRODUCT);
        assert_eq!(identity.server_name, "10.9.9.9");
        assert_eq!(identity.serial_number, labels::UNKNOWN_SERIAL);
    }

    #[tokio::test]
    async fn test_empty_server_name_falls_back_to_host() {
        let mock = MockController::new(json!({})).with_server_name("");
        let identity = fetch_identity(&mock, &target("10.1.2.3")).await;
        assert_eq!(identity.server_name, "10.1.2.3");
    }

    #[tokio::test]
    async fn test_concurrent_scrapes_do_not_share_labels() {
        let mock_a = MockController::new(json!({
            "health_at_a_glance": {"storage": {"status": "OK"}}
        }))
        .with_server_name("host-a");
        let mock_b = MockController::new(json!({
            "health_at_a_glance": {"storage": {"status": "Degraded"}}
        }))
        .with_server_name("host-b");

        let target_a = target("10.0.0.1");
        let target_b = target("10.0.0.2");
        let (body_a, body_b) = tokio::join!(
            scrape(&mock_a, &target_a, Instant::now()),
            scrape(&mock_b, &target_b, Instant::now()),
        );
        let (body_a, body_b) = (body_a.unwrap(), body_b.unwrap());

        assert!(body_a.contains("server_name=\"host-a\""));
        assert!(!body_a.contains("server_name=\"host-b\""));
        assert!(body_b.contains("server_name=\"host-b\""));
        assert!(!body_b.contains("server_name=\"host-a\""));
        assert!(sample_line(&body_a, "hpilo_storage_status{").ends_with(" 0"));
        assert!(sample_line(&body_b, "hpilo_storage_status{").ends_with(" 1"));
    }

    #[tokio::test]
    async fn test_legacy_generation_scrape_has_no_nic_samples() {
        let mock = MockController::new(json!({
            "nic_information": {
                "iLO 3": {"status": "OK", "ip_address": "10.0.0.5"}
            }
        }))
        .with_fw_version(json!({
            "firmware_version": "1.89",
            "management_processor": "iLO3"
        }));

        let body = scrape(&mock, &target("10.0.0.1"), Instant::now())
            .await
            .unwrap();
        assert!(!body.contains("hpilo_nic_status"));
        // Firmware version itself is still sampled.
        assert!(body.contains("hpilo_firmware_version"));
    }
}
