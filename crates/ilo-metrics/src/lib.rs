//! # ilo-metrics
//!
//! Measurement registry and health report walker for the iLO exporter.
//!
//! One [`ScrapeMetrics`] instance is built per incoming request; it owns
//! a fresh Prometheus registry with every metric family pre-declared, is
//! populated by the [`HealthWalker`] from the controller's health report,
//! encoded once, and dropped. Nothing here is process-global, so
//! concurrent scrapes of different targets cannot contaminate each
//! other's output.

pub mod scrape;
pub mod walker;

pub use scrape::ScrapeMetrics;
pub use walker::HealthWalker;
