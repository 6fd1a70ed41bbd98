//! # ilo-client
//!
//! Controller client for the iLO exporter.
//!
//! This crate owns the session boundary against the remote management
//! controller: opening an authenticated session with the permissive TLS
//! policy legacy firmware requires, and the per-operation data retrieval
//! calls the orchestrator drives. Each operation fails independently so
//! the caller can treat metadata fetches as best-effort.
//!
//! The health report and other provider-shaped documents are returned as
//! opaque [`serde_json::Value`] trees; interpreting them is the walker's
//! job, not this crate's.

pub mod mock;
pub mod session;

pub use mock::MockController;
pub use session::{HttpController, SessionConfig, TlsPolicy};

use async_trait::async_trait;
use ilo_core::Result;
use serde_json::Value;

/// Data-retrieval operations on one open controller session.
///
/// Every method performs a fresh fetch; nothing is cached between calls
/// or across sessions.
#[async_trait]
pub trait Controller: Send + Sync {
    /// Server product name (e.g. "ProLiant DL380 Gen9")
    async fn get_product_name(&self) -> Result<String>;

    /// Configured server display name; may be empty on unnamed hosts
    async fn get_server_name(&self) -> Result<String>;

    /// SMBIOS host data as a list of records
    async fn get_host_data(&self) -> Result<Value>;

    /// The full nested health report across all subsystems
    async fn get_embedded_health(&self) -> Result<Value>;

    /// Host power state as a vendor status string ("ON" / "OFF")
    async fn get_host_power_status(&self) -> Result<String>;

    /// Firmware description, including `firmware_version` and
    /// `management_processor` generation marker
    async fn get_fw_version(&self) -> Result<Value>;

    /// Onboard administrator description for enclosure-housed servers
    async fn get_oa_info(&self) -> Result<Value>;
}
