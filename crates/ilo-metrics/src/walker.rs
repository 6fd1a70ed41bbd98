//! Health report walker
//!
//! One extraction routine per subsystem of the controller's nested
//! health document. The document's shape varies by hardware generation
//! and firmware version, so every lookup is defensive: a missing key or
//! an unexpected shape skips that sample and nothing else. No routine
//! can fail the request; errors surfacing from the registry are logged
//! and the walk continues with the next subsystem.

use crate::scrape::{set, ScrapeMetrics};
use ilo_core::{Result, ServerIdentity, Severity};
use serde_json::Value;
use tracing::{debug, warn};

/// NIC status vocabulary; the position in this list is the recorded
/// severity value, anything else records 4.
const NIC_VOCABULARY: [&str; 4] = ["OK", "Disabled", "Unknown", "Link Down"];

/// Firmware generation that cannot report per-NIC status reliably
const LEGACY_NIC_GENERATION: &str = "iLO3";

/// Walks one health report into one request's measurement registry
pub struct HealthWalker<'a> {
    metrics: &'a mut ScrapeMetrics,
    identity: &'a ServerIdentity,
}

impl<'a> HealthWalker<'a> {
    pub fn new(metrics: &'a mut ScrapeMetrics, identity: &'a ServerIdentity) -> Self {
        Self { metrics, identity }
    }

    /// Run every health-document routine against one fetched report.
    ///
    /// Routines are independent; a routine that trips over the document
    /// logs and the walk moves on.
    pub fn walk(&mut self, health: &Value) {
        for (name, outcome) in [
            ("health_at_a_glance", self.glance_summary(health)),
            ("battery", self.battery(health)),
            ("storage", self.storage(health)),
            ("temperature", self.temperature(health)),
            ("processors", self.processors(health)),
            ("memory", self.memory_detail(health)),
            ("memory_summary", self.memory_summary(health)),
            ("fans", self.fans(health)),
            ("power_supplies", self.power_supplies(health)),
        ] {
            if let Err(e) = outcome {
                warn!(subsystem = name, error = %e, "subsystem extraction failed");
            }
        }
    }

    /// One `<category>_status` sample per top-level health category
    /// reporting a status field
    fn glance_summary(&mut self, health: &Value) -> Result<()> {
        let Some(glance) = health.get("health_at_a_glance").and_then(Value::as_object) else {
            return Ok(());
        };

        for (category, value) in glance {
            let Some(status) = value.get("status").and_then(Value::as_str) else {
                continue;
            };
            let severity = Severity::from_vendor(&status.to_uppercase());
            self.metrics
                .record_glance(category, &self.identity.base_labels(), severity)?;
        }
        Ok(())
    }

    /// Raw reading per sensor whose current reading leads with a number
    fn temperature(&mut self, health: &Value) -> Result<()> {
        let Some(sensors) = health.get("temperature").and_then(Value::as_object) else {
            return Ok(());
        };

        for (sensor, value) in sensors {
            let Some(reading) = value.get("currentreading").and_then(leading_number) else {
                continue;
            };
            set(
                &self.metrics.temperature_value,
                &self.labels([sensor]),
                reading,
            )?;
        }
        Ok(())
    }

    /// Severity per CPU slot, labeled with the normalized CPU identifier
    fn processors(&mut self, health: &Value) -> Result<()> {
        let Some(processors) = health.get("processors").and_then(Value::as_object) else {
            return Ok(());
        };

        for (slot, value) in processors {
            // Slot keys read "Proc 1"; the second token is the CPU id.
            let cpu_id = slot.split_whitespace().nth(1).unwrap_or(slot);
            let name = str_or(value, "name", "N/A").trim().to_string();
            let speed = display_or(value, "speed", "N/A");
            let status = str_or(value, "status", "N/A");

            set(
                &self.metrics.processor_detail,
                &self.labels([cpu_id, &name, &speed]),
                Severity::from_vendor(status).value(),
            )?;
        }
        Ok(())
    }

    /// Detail sample per populated memory socket
    fn memory_detail(&mut self, health: &Value) -> Result<()> {
        let Some(cpus) = health
            .get("memory")
            .and_then(|m| m.get("memory_details"))
            .and_then(Value::as_object)
        else {
            return Ok(());
        };

        for (cpu_id, sockets) in cpus {
            let Some(sockets) = sockets.as_object() else {
                continue;
            };
            for socket in sockets.values() {
                let status = str_or(socket, "status", "N/A");
                if status == "Not Present" {
                    continue;
                }

                let socket_id = display_or(socket, "socket", "N/A");
                let frequency = display_or(socket, "frequency", "N/A");
                let hp_smart_memory = display_or(socket, "hp_smart_memory", "N/A");
                let minimum_voltage = display_or(socket, "minimum_voltage", "N/A");
                let part_number = socket
                    .get("part")
                    .map(|part| display_or(part, "number", "N/A"))
                    .unwrap_or_else(|| "N/A".to_string());
                let ranks = display_or(socket, "ranks", "N/A");
                let size = display_or(socket, "size", "N/A");
                let technology = display_or(socket, "technology", "N/A");
                let mem_type = display_or(socket, "type", "N/A");

                set(
                    &self.metrics.memory_detail,
                    &self.labels([
                        cpu_id.as_str(),
                        &socket_id,
                        &frequency,
                        &hp_smart_memory,
                        &minimum_voltage,
                        &part_number,
                        &ranks,
                        &size,
                        &technology,
                        &mem_type,
                    ]),
                    Severity::from_vendor(status).value(),
                )?;
            }
        }
        Ok(())
    }

    /// Total memory size per CPU from the aggregate summary
    fn memory_summary(&mut self, health: &Value) -> Result<()> {
        let Some(cpus) = health
            .get("memory")
            .and_then(|m| m.get("memory_details_summary"))
            .and_then(Value::as_object)
        else {
            return Ok(());
        };

        for (cpu_key, cpu) in cpus {
            // Summary keys read "cpu_1"; the token after the underscore
            // is the CPU id.
            let cpu_id = cpu_key.split('_').nth(1).unwrap_or(cpu_key);
            let total = cpu
                .get("total_memory_size")
                .and_then(leading_number)
                .unwrap_or(0.0);
            let operating_frequency = display_or(cpu, "operating_frequency", "N/A");
            let operating_voltage = display_or(cpu, "operating_voltage", "N/A");

            set(
                &self.metrics.memory_detail_summary,
                &self.labels([cpu_id, &operating_frequency, &operating_voltage]),
                total,
            )?;
        }
        Ok(())
    }

    /// Per-fan speed (when the reading leads with a number) and severity
    fn fans(&mut self, health: &Value) -> Result<()> {
        let Some(fans) = health.get("fans").and_then(Value::as_object) else {
            return Ok(());
        };

        for (fan, value) in fans {
            if let Some(speed) = value.get("speed").and_then(leading_number) {
                set(&self.metrics.fan_speed, &self.labels([fan]), speed)?;
            }
            let status = str_or(value, "status", "N/A");
            set(
                &self.metrics.fan,
                &self.labels([fan]),
                Severity::from_vendor(status).value(),
            )?;
        }
        Ok(())
    }

    /// Severity per supply plus the present-power summary reading
    fn power_supplies(&mut self, health: &Value) -> Result<()> {
        if let Some(supplies) = health.get("power_supplies").and_then(Value::as_object) {
            for (supply, value) in supplies {
                let status = str_or(value, "status", "ABSENT");
                set(
                    &self.metrics.power_supply,
                    &self.labels([supply]),
                    Severity::from_vendor(status).value(),
                )?;
            }
        }

        if let Some(reading) = health
            .get("power_supply_summary")
            .and_then(|s| s.get("present_power_reading"))
            .and_then(leading_number)
        {
            set(
                &self.metrics.power_supplies_readings,
                &self.identity.base_labels(),
                reading,
            )?;
        }
        Ok(())
    }

    /// Detail sample for the cache battery, keyed exactly "Battery 1".
    /// Absence of the key is normal on most rack servers.
    fn battery(&mut self, health: &Value) -> Result<()> {
        let Some(battery) = health
            .get("power_supplies")
            .and_then(|s| s.get("Battery 1"))
        else {
            return Ok(());
        };

        let label = display_or(battery, "label", "N/A");
        let present = display_or(battery, "present", "N/A");
        let model = display_or(battery, "model", "N/A");
        let spare = display_or(battery, "spare", "N/A");
        let serial_number = display_or(battery, "serial_number", "N/A");
        let capacity = display_or(battery, "capacity", "N/A");
        let firmware_version = display_or(battery, "firmware_version", "N/A");
        let status = str_or(battery, "status", "N/A");

        set(
            &self.metrics.battery_detail,
            &self.labels([
                label.as_str(),
                &present,
                &model,
                &spare,
                &serial_number,
                &capacity,
                &firmware_version,
            ]),
            Severity::from_vendor(status).value(),
        )
    }

    /// Controller, cache module, enclosure, logical and physical drive
    /// severities
    fn storage(&mut self, health: &Value) -> Result<()> {
        let Some(controllers) = health.get("storage").and_then(Value::as_object) else {
            return Ok(());
        };

        for (controller_key, controller) in controllers {
            let controller_id =
                format!("{}, {}", controller_key, str_or(controller, "model", ""));

            let cache_status = str_or(controller, "cache_module_status", "absent");
            set(
                &self.metrics.storage_cache_health,
                &self.labels([controller_id.as_str()]),
                Severity::from_vendor(cache_status).value(),
            )?;

            let controller_status = str_or(controller, "controller_status", "unknown");
            set(
                &self.metrics.storage_controller_health,
                &self.labels([controller_id.as_str()]),
                Severity::from_vendor(controller_status).value(),
            )?;

            let enclosures = list_or_empty(controller, "drive_enclosures");
            for (index, enclosure) in enclosures.iter().enumerate() {
                let status = str_or(enclosure, "status", "unknown");
                set(
                    &self.metrics.storage_enclosure_health,
                    &self.labels([controller_id.as_str(), &index.to_string()]),
                    Severity::from_vendor(status).value(),
                )?;
            }

            let logical_drives = list_or_empty(controller, "logical_drives");
            for (ld_index, logical_drive) in logical_drives.iter().enumerate() {
                let ld_status = str_or(logical_drive, "status", "unknown");
                let ld_name = format!(
                    "LD_{}, {}, {}",
                    ld_index,
                    str_or(logical_drive, "capacity", ""),
                    str_or(logical_drive, "fault_tolerance", "")
                );
                set(
                    &self.metrics.storage_ld_health,
                    &self.labels([controller_id.as_str(), &ld_name]),
                    Severity::from_vendor(ld_status).value(),
                )?;

                let physical_drives = list_or_empty(logical_drive, "physical_drives");
                for (pd_index, physical_drive) in physical_drives.iter().enumerate() {
                    let pd_status = str_or(physical_drive, "status", "unknown");
                    let fallback_location = format!("N{}", pd_index);
                    let location = str_or(physical_drive, "location", &fallback_location);
                    let pd_name = format!(
                        "{}, {}, {}",
                        str_or(physical_drive, "model", ""),
                        str_or(physical_drive, "capacity", ""),
                        location
                    );
                    set(
                        &self.metrics.storage_pd_health,
                        &self.labels([controller_id.as_str(), &ld_name, &pd_name]),
                        Severity::from_vendor(pd_status).value(),
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Severity from the controller's reported host power status
    pub fn power_state(&mut self, status: &str) -> Result<()> {
        set(
            &self.metrics.running,
            &self.identity.base_labels(),
            Severity::from_vendor(status).value(),
        )
    }

    /// Per-interface status against the fixed NIC vocabulary.
    ///
    /// Controllers of the legacy generation cannot report per-NIC
    /// status reliably; the whole subsystem is skipped for them.
    pub fn network(&mut self, health: &Value, firmware: &Value) -> Result<()> {
        let generation = firmware
            .get("management_processor")
            .and_then(Value::as_str)
            .unwrap_or("");
        if generation == LEGACY_NIC_GENERATION {
            warn!("Unknown iLO nic status");
            return Ok(());
        }

        let Some(nics) = health.get("nic_information").and_then(Value::as_object) else {
            return Ok(());
        };

        for (nic_name, nic) in nics {
            let status = str_or(nic, "status", "");
            let value = match NIC_VOCABULARY.iter().position(|v| *v == status) {
                Some(position) => position as f64,
                None => {
                    warn!(nic = %nic_name, status = %status, "unrecognised nic status");
                    4.0
                }
            };
            let ip_address = display_or(nic, "ip_address", "N/A");
            set(
                &self.metrics.nic_status,
                &self.labels([nic_name.as_str(), &ip_address]),
                value,
            )?;
        }
        Ok(())
    }

    /// Numeric firmware version as a raw sample
    pub fn firmware_version(&mut self, firmware: &Value) -> Result<()> {
        let Some(version) = firmware.get("firmware_version").and_then(leading_number) else {
            debug!("firmware version not numeric, skipping sample");
            return Ok(());
        };
        set(
            &self.metrics.firmware_version,
            &self.identity.base_labels(),
            version,
        )
    }

    /// Constant presence sample for the onboard administrator
    pub fn oa_info(&mut self, oa: &Value) -> Result<()> {
        let oa_ip = display_or(oa, "ipaddress", "");
        let encl = display_or(oa, "encl", "");
        let location_bay = display_or(oa, "location", "");
        set(
            &self.metrics.oa_info,
            &self.labels([oa_ip.as_str(), &encl, &location_bay]),
            0.0,
        )
    }

    /// Base identity labels followed by the routine's extra label values
    fn labels<'s, const N: usize>(&'s self, extra: [&'s str; N]) -> Vec<&'s str> {
        let mut labels: Vec<&str> = self.identity.base_labels().to_vec();
        labels.extend_from_slice(&extra);
        labels
    }
}

/// String field lookup with a documented default
fn str_or<'v>(value: &'v Value, key: &str, default: &'v str) -> &'v str {
    value.get(key).and_then(Value::as_str).unwrap_or(default)
}

/// Field rendered as a label value: strings verbatim, numbers and
/// booleans via their display form, everything else the default
fn display_or(value: &Value, key: &str, default: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => default.to_string(),
    }
}

/// Sequence field defaulting to empty when absent or not a list
fn list_or_empty<'v>(value: &'v Value, key: &str) -> &'v [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// The leading numeric token of a reading.
///
/// Controllers render readings as a bare number, as a `[value, unit]`
/// pair, or as a `"130 Watts"` style string depending on firmware; all
/// three shapes reduce to the same raw value.
fn leading_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Array(items) => items.first().and_then(leading_number),
        Value::String(s) => s.split_whitespace().next()?.parse().ok(),
        _ => None,
    }
}
