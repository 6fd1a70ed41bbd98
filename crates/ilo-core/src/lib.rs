//! # ilo-core
//!
//! Core types shared by every part of the iLO exporter.
//!
//! This crate provides the foundational pieces that the client, metrics,
//! and exporter crates build on:
//!
//! - Unified error type covering the request-failure taxonomy
//! - Severity codes and the vendor status translation rule
//! - Per-request target resolution (query overlay over environment fallback)
//! - Server identity labels attached to every measurement

pub mod error;
pub mod labels;
pub mod severity;
pub mod target;

// Re-export commonly used types at the crate root
pub use error::{Error, Result};
pub use labels::ServerIdentity;
pub use severity::Severity;
pub use target::{IloTarget, TargetFallback};
