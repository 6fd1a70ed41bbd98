//! Request-scoped measurement registry
//!
//! Holds one owned Prometheus registry per scrape with every gauge
//! family declared and registered at construction. The instance is moved
//! into the request handler, populated by the walker, encoded exactly
//! once, and dropped with the request.

use ilo_core::{Error, Result, Severity};
use prometheus::{Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};
use std::collections::HashMap;

/// Prefix shared by every exported metric family
pub const PREFIX: &str = "hpilo_";

/// Label keys carried by every request-scoped sample, in declared order
pub const BASE_LABELS: [&str; 3] = ["product_name", "server_name", "server_serial_num"];

/// Glance-summary categories declared up front. Categories the
/// controller reports outside this set are registered on first sight
/// into the same request-scoped registry.
const GLANCE_CATEGORIES: [&str; 11] = [
    "vrm",
    "drive",
    "battery",
    "storage",
    "fans",
    "bios_hardware",
    "memory",
    "power_supplies",
    "processor",
    "network",
    "temperature",
];

/// One request's worth of measurement slots.
///
/// Two instances never share state; there is no global registry behind
/// this type.
pub struct ScrapeMetrics {
    registry: Registry,

    glance: HashMap<&'static str, GaugeVec>,
    glance_extra: HashMap<String, GaugeVec>,

    pub battery_detail: GaugeVec,
    pub memory_detail: GaugeVec,
    pub memory_detail_summary: GaugeVec,
    pub power_supplies_readings: GaugeVec,
    pub processor_detail: GaugeVec,
    pub nic_status: GaugeVec,
    pub storage_cache_health: GaugeVec,
    pub storage_controller_health: GaugeVec,
    pub storage_enclosure_health: GaugeVec,
    pub storage_ld_health: GaugeVec,
    pub storage_pd_health: GaugeVec,
    pub temperature_value: GaugeVec,
    pub fan: GaugeVec,
    pub fan_speed: GaugeVec,
    pub power_supply: GaugeVec,
    pub running: GaugeVec,
    pub firmware_version: GaugeVec,
    pub oa_info: GaugeVec,
    pub request_processing_seconds: Gauge,
}

impl ScrapeMetrics {
    /// Declare and register every metric family into a fresh registry
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let mut glance = HashMap::new();
        for category in GLANCE_CATEGORIES {
            let gauge = declare(
                &registry,
                &format!("{}{}_status", PREFIX, category),
                &format!("HP iLO {} status", category),
                &[],
            )?;
            glance.insert(category, gauge);
        }

        let battery_detail = declare(
            &registry,
            &format!("{}battery_detail", PREFIX),
            "HP iLO battery detailed status",
            &[
                "label",
                "present",
                "model",
                "spare",
                "serial_number",
                "capacity",
                "firmware_version",
            ],
        )?;
        let memory_detail = declare(
            &registry,
            &format!("{}memory_detail_status", PREFIX),
            "HP iLO memory detailed status",
            &[
                "cpu_id",
                "socket_id",
                "frequency",
                "hp_smart_memory",
                "minimum_voltage",
                "part_number",
                "ranks",
                "size",
                "technology",
                "mem_type",
            ],
        )?;
        let memory_detail_summary = declare(
            &registry,
            &format!("{}memory_detail_summary", PREFIX),
            "HP iLO memory Summary",
            &["cpu_id", "operating_frequency", "operating_voltage"],
        )?;
        let power_supplies_readings = declare(
            &registry,
            &format!("{}power_supplies_readings", PREFIX),
            "HP iLO power_supplies readings",
            &[],
        )?;
        let processor_detail = declare(
            &registry,
            &format!("{}processor_detail_status", PREFIX),
            "HP iLO processor detailed status",
            &["cpu_id", "name", "speed"],
        )?;
        let nic_status = declare(
            &registry,
            &format!("{}nic_status", PREFIX),
            "HP iLO NIC status",
            &["nic_name", "ip_address"],
        )?;
        let storage_cache_health = declare(
            &registry,
            &format!("{}storage_cache_health_status", PREFIX),
            "Cache Module status",
            &["controller"],
        )?;
        let storage_controller_health = declare(
            &registry,
            &format!("{}storage_controller_health_status", PREFIX),
            "Controller status",
            &["controller"],
        )?;
        let storage_enclosure_health = declare(
            &registry,
            &format!("{}storage_enclosure_health_status", PREFIX),
            "Enclosure status",
            &["controller", "enc"],
        )?;
        let storage_ld_health = declare(
            &registry,
            &format!("{}storage_ld_health_status", PREFIX),
            "LD status",
            &["controller", "logical_drive"],
        )?;
        let storage_pd_health = declare(
            &registry,
            &format!("{}storage_pd_health_status", PREFIX),
            "PD status",
            &["controller", "logical_drive", "physical_drive"],
        )?;
        let temperature_value = declare(
            &registry,
            &format!("{}temperature_value", PREFIX),
            "Temperature value",
            &["sensor"],
        )?;
        let fan = declare(
            &registry,
            &format!("{}fan_status", PREFIX),
            "HP iLO one fan status",
            &["fan"],
        )?;
        let fan_speed = declare(
            &registry,
            &format!("{}fan_speed", PREFIX),
            "HP iLO one fan value",
            &["fan"],
        )?;
        let power_supply = declare(
            &registry,
            &format!("{}power_supply_status", PREFIX),
            "HP iLO one power supply power",
            &["ps"],
        )?;
        let running = declare(
            &registry,
            &format!("{}running_status", PREFIX),
            "HP iLO running status",
            &[],
        )?;
        let firmware_version = declare(
            &registry,
            &format!("{}firmware_version", PREFIX),
            "HP iLO firmware version",
            &[],
        )?;
        let oa_info = declare(
            &registry,
            &format!("{}onboard_administrator_info", PREFIX),
            "HP iLO OnBoard Administrator Info",
            &["oa_ip", "encl", "location_bay"],
        )?;

        let request_processing_seconds = Gauge::new(
            format!("{}request_processing_seconds", PREFIX),
            "Time spent processing request",
        )
        .map_err(|e| Error::registry(e.to_string()))?;
        registry
            .register(Box::new(request_processing_seconds.clone()))
            .map_err(|e| Error::registry(e.to_string()))?;

        Ok(Self {
            registry,
            glance,
            glance_extra: HashMap::new(),
            battery_detail,
            memory_detail,
            memory_detail_summary,
            power_supplies_readings,
            processor_detail,
            nic_status,
            storage_cache_health,
            storage_controller_health,
            storage_enclosure_health,
            storage_ld_health,
            storage_pd_health,
            temperature_value,
            fan,
            fan_speed,
            power_supply,
            running,
            firmware_version,
            oa_info,
            request_processing_seconds,
        })
    }

    /// Record a glance-summary severity for one health category.
    ///
    /// Categories outside the declared set get their family registered
    /// into this request's registry on first sight.
    pub fn record_glance(
        &mut self,
        category: &str,
        base_labels: &[&str; 3],
        severity: Severity,
    ) -> Result<()> {
        let gauge = match self.glance.get(category) {
            Some(gauge) => gauge,
            None => {
                if !self.glance_extra.contains_key(category) {
                    let name = format!("{}{}_status", PREFIX, sanitize_metric_name(category));
                    let gauge = declare(
                        &self.registry,
                        &name,
                        &format!("HP iLO {} status", category),
                        &[],
                    )?;
                    self.glance_extra.insert(category.to_string(), gauge);
                }
                &self.glance_extra[category]
            }
        };

        set(gauge, base_labels, severity.value())
    }

    /// Encode this request's samples in the exposition text format
    pub fn export(&self) -> Result<String> {
        encode(&self.registry.gather())
    }

    /// Encode the process-wide self-metrics set (resource usage of the
    /// exporter itself, from the default registry's process collector)
    pub fn export_process_metrics() -> Result<String> {
        encode(&prometheus::gather())
    }
}

/// Record one sample on a gauge family, checking label arity
pub fn set(gauge: &GaugeVec, labels: &[&str], value: f64) -> Result<()> {
    gauge
        .get_metric_with_label_values(labels)
        .map_err(|e| Error::registry(e.to_string()))?
        .set(value);
    Ok(())
}

fn declare(registry: &Registry, name: &str, help: &str, extra_labels: &[&str]) -> Result<GaugeVec> {
    let mut labels: Vec<&str> = BASE_LABELS.to_vec();
    labels.extend_from_slice(extra_labels);

    let gauge = GaugeVec::new(Opts::new(name, help), &labels)
        .map_err(|e| Error::registry(e.to_string()))?;
    registry
        .register(Box::new(gauge.clone()))
        .map_err(|e| Error::registry(e.to_string()))?;
    Ok(gauge)
}

fn encode(families: &[prometheus::proto::MetricFamily]) -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(families, &mut buffer)
        .map_err(|e| Error::encode(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| Error::encode(e.to_string()))
}

/// Sanitize a category name for use inside a metric name
/// (alphanumeric + underscore only)
fn sanitize_metric_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: [&str; 3] = ["ProLiant", "web-01", "CZ123"];

    #[test]
    fn test_fresh_registry_exports_nothing() {
        // Declared families with no samples yet do not appear in the
        // exposition.
        let metrics = ScrapeMetrics::new().unwrap();
        assert_eq!(metrics.export().unwrap(), "");
    }

    #[test]
    fn test_record_known_glance_category() {
        let mut metrics = ScrapeMetrics::new().unwrap();
        metrics
            .record_glance("storage", &BASE, Severity::Ok)
            .unwrap();

        let text = metrics.export().unwrap();
        assert!(text.contains("hpilo_storage_status"));
        assert!(text.contains("server_name=\"web-01\""));
    }

    #[test]
    fn test_record_unknown_glance_category_registers_dynamically() {
        let mut metrics = ScrapeMetrics::new().unwrap();
        metrics
            .record_glance("liquid_cooling", &BASE, Severity::Degraded)
            .unwrap();
        // Second record on the same dynamic family must reuse it.
        metrics
            .record_glance("liquid_cooling", &BASE, Severity::Ok)
            .unwrap();

        let text = metrics.export().unwrap();
        assert!(text.contains("hpilo_liquid_cooling_status"));
    }

    #[test]
    fn test_label_arity_mismatch_is_an_error() {
        let metrics = ScrapeMetrics::new().unwrap();
        let err = set(&metrics.temperature_value, &["only", "three", "labels"], 1.0).unwrap_err();
        assert!(matches!(err, Error::Registry(_)));
    }

    #[test]
    fn test_registries_are_isolated() {
        let mut first = ScrapeMetrics::new().unwrap();
        let mut second = ScrapeMetrics::new().unwrap();

        first
            .record_glance("storage", &["ProLiant", "host-a", "SER-A"], Severity::Ok)
            .unwrap();
        second
            .record_glance("storage", &["ProLiant", "host-b", "SER-B"], Severity::Failed)
            .unwrap();

        let text_a = first.export().unwrap();
        let text_b = second.export().unwrap();

        assert!(text_a.contains("host-a") && !text_a.contains("host-b"));
        assert!(text_b.contains("host-b") && !text_b.contains("host-a"));
    }

    #[test]
    fn test_export_is_exposition_format() {
        let mut metrics = ScrapeMetrics::new().unwrap();
        metrics
            .record_glance("fans", &BASE, Severity::Ok)
            .unwrap();
        metrics.request_processing_seconds.set(0.25);

        let text = metrics.export().unwrap();
        assert!(text.contains("# HELP hpilo_fans_status HP iLO fans status"));
        assert!(text.contains("# TYPE hpilo_fans_status gauge"));
        assert!(text.contains("hpilo_request_processing_seconds 0.25"));
    }
}
