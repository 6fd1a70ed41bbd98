//! Mock controller for testing
//!
//! Serves canned documents for every operation and lets tests inject a
//! failure per operation, mirroring how real controllers fail each fetch
//! independently.

use crate::Controller;
use async_trait::async_trait;
use ilo_core::{Error, Result};
use serde_json::{json, Value};

/// Mock controller built from fixture documents.
///
/// Every operation answers from its stored value; an operation whose
/// value has been cleared fails with a communication error, which is how
/// the orchestrator sees a real controller dropping one fetch.
#[derive(Debug, Clone)]
pub struct MockController {
    product_name: Option<String>,
    server_name: Option<String>,
    host_data: Option<Value>,
    embedded_health: Option<Value>,
    host_power_status: Option<String>,
    fw_version: Option<Value>,
    oa_info: Option<Value>,
}

impl MockController {
    /// Create a mock answering with the given health report and sane
    /// defaults for everything else
    pub fn new(embedded_health: Value) -> Self {
        Self {
            product_name: Some("ProLiant DL380 Gen9".to_string()),
            server_name: Some("mock-server".to_string()),
            host_data: Some(json!([
                {"type": 1, "Serial Number": "ENCL0001"},
                {"type": 2, "Serial Number": "CZ00000001"}
            ])),
            embedded_health: Some(embedded_health),
            host_power_status: Some("ON".to_string()),
            fw_version: Some(json!({
                "firmware_version": "2.70",
                "management_processor": "iLO4"
            })),
            oa_info: None,
        }
    }

    pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    pub fn with_host_data(mut self, host_data: Value) -> Self {
        self.host_data = Some(host_data);
        self
    }

    pub fn with_power_status(mut self, status: impl Into<String>) -> Self {
        self.host_power_status = Some(status.into());
        self
    }

    pub fn with_fw_version(mut self, fw: Value) -> Self {
        self.fw_version = Some(fw);
        self
    }

    pub fn with_oa_info(mut self, oa: Value) -> Self {
        self.oa_info = Some(oa);
        self
    }

    pub fn fail_product_name(mut self) -> Self {
        self.product_name = None;
        self
    }

    pub fn fail_server_name(mut self) -> Self {
        self.server_name = None;
        self
    }

    pub fn fail_host_data(mut self) -> Self {
        self.host_data = None;
        self
    }

    pub fn fail_embedded_health(mut self) -> Self {
        self.embedded_health = None;
        self
    }

    pub fn fail_power_status(mut self) -> Self {
        self.host_power_status = None;
        self
    }

    pub fn fail_fw_version(mut self) -> Self {
        self.fw_version = None;
        self
    }

    fn answer<T: Clone>(value: &Option<T>, operation: &str) -> Result<T> {
        value
            .clone()
            .ok_or_else(|| Error::communication(format!("mock: {} unavailable", operation)))
    }
}

#[async_trait]
impl Controller for MockController {
    async fn get_product_name(&self) -> Result<String> {
        Self::answer(&self.product_name, "product name")
    }

    async fn get_server_name(&self) -> Result<String> {
        Self::answer(&self.server_name, "server name")
    }

    async fn get_host_data(&self) -> Result<Value> {
        Self::answer(&self.host_data, "host data")
    }

    async fn get_embedded_health(&self) -> Result<Value> {
        Self::answer(&self.embedded_health, "embedded health")
    }

    async fn get_host_power_status(&self) -> Result<String> {
        Self::answer(&self.host_power_status, "host power status")
    }

    async fn get_fw_version(&self) -> Result<Value> {
        Self::answer(&self.fw_version, "firmware version")
    }

    async fn get_oa_info(&self) -> Result<Value> {
        Self::answer(&self.oa_info, "onboard administrator info")
    }
}
