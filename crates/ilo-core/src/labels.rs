//! Server identity labels
//!
//! Every measurement produced for one request carries the target server's
//! product name, display name, and serial number. Each field is fetched
//! best-effort from the controller and falls back independently, so a
//! half-answering controller still yields a fully labeled scrape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fallback product name when the controller does not answer
pub const UNKNOWN_PRODUCT: &str = "Unknown HP Server";

/// Fallback serial number sentinel
pub const UNKNOWN_SERIAL: &str = "Unknown Serial Number";

/// Identity label triple attached to every sample of one scrape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerIdentity {
    /// Controller-reported product name (e.g. "ProLiant DL380 Gen9")
    pub product_name: String,

    /// Controller-reported display name; falls back to the resolved host
    pub server_name: String,

    /// Chassis serial number
    pub serial_number: String,
}

impl ServerIdentity {
    pub fn new(
        product_name: impl Into<String>,
        server_name: impl Into<String>,
        serial_number: impl Into<String>,
    ) -> Self {
        Self {
            product_name: product_name.into(),
            server_name: server_name.into(),
            serial_number: serial_number.into(),
        }
    }

    /// The base label values in declared order
    /// (`product_name`, `server_name`, `server_serial_num`)
    pub fn base_labels(&self) -> [&str; 3] {
        [&self.product_name, &self.server_name, &self.serial_number]
    }
}

/// Pull the serial number out of the controller's host data record list.
///
/// Takes the *second* record carrying a "Serial Number" field; the first
/// SMBIOS record repeats the enclosure serial on blade systems. Firmware
/// that reports fewer than two such records yields `None` and the caller
/// falls back to [`UNKNOWN_SERIAL`].
pub fn serial_from_host_data(host_data: &Value) -> Option<String> {
    host_data
        .as_array()?
        .iter()
        .filter_map(|record| record.get("Serial Number"))
        .filter_map(Value::as_str)
        .nth(1)
        .map(str::to_string)
}
