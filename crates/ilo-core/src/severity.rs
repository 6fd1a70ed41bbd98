//! Severity codes and the vendor status translation rule
//!
//! Every subsystem extraction routine converges on one small ordinal
//! classification of the controller's free-text status vocabulary. The
//! numeric values are part of the exposition contract and must not change.

use serde::{Deserialize, Serialize};

/// Ordinal severity classification of a vendor status string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Subsystem is healthy ("OK", "Good, In Use", "ON")
    Ok,
    /// Subsystem is operating in a degraded state
    Degraded,
    /// Subsystem has failed ("OFF", "Permanent Failure")
    Failed,
    /// Subsystem hardware is not installed
    Absent,
    /// Vendor status outside the known vocabulary
    Unknown,
}

impl Severity {
    /// Translate a vendor status string into a severity code.
    ///
    /// Total over all inputs: any string, including the empty string,
    /// yields a code.
    pub fn from_vendor(status: &str) -> Self {
        let folded = status.to_uppercase();
        match folded.as_str() {
            "OK" | "GOOD, IN USE" | "ON" => Severity::Ok,
            "DEGRADED" => Severity::Degraded,
            "OFF" => Severity::Failed,
            "ABSENT" => Severity::Absent,
            // "Permanent Failure" is matched case-sensitively while every
            // other arm folds case; inherited vendor rule, kept as-is.
            _ if status == "Permanent Failure" => Severity::Failed,
            _ => Severity::Unknown,
        }
    }

    /// The wire value recorded into a gauge
    pub fn value(self) -> f64 {
        self.code() as f64
    }

    /// The ordinal code behind this severity
    pub fn code(self) -> i8 {
        match self {
            Severity::Ok => 0,
            Severity::Degraded => 1,
            Severity::Failed => 2,
            Severity::Absent => -1,
            Severity::Unknown => 3,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Ok => write!(f, "ok"),
            Severity::Degraded => write!(f, "degraded"),
            Severity::Failed => write!(f, "failed"),
            Severity::Absent => write!(f, "absent"),
            Severity::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_vocabulary_any_casing() {
        for s in ["OK", "ok", "Ok", "Good, In Use", "GOOD, IN USE", "ON", "on"] {
            assert_eq!(Severity::from_vendor(s), Severity::Ok, "{}", s);
            assert_eq!(Severity::from_vendor(s).code(), 0);
        }
    }

    #[test]
    fn test_degraded() {
        assert_eq!(Severity::from_vendor("DEGRADED").code(), 1);
        assert_eq!(Severity::from_vendor("degraded").code(), 1);
    }

    #[test]
    fn test_failed_vocabulary() {
        assert_eq!(Severity::from_vendor("OFF").code(), 2);
        assert_eq!(Severity::from_vendor("off").code(), 2);
        assert_eq!(Severity::from_vendor("Permanent Failure").code(), 2);
    }

    #[test]
    fn test_permanent_failure_is_case_sensitive() {
        // The upper-cased spelling falls through to the unknown arm.
        assert_eq!(Severity::from_vendor("PERMANENT FAILURE"), Severity::Unknown);
        assert_eq!(Severity::from_vendor("permanent failure"), Severity::Unknown);
    }

    #[test]
    fn test_absent() {
        assert_eq!(Severity::from_vendor("ABSENT").code(), -1);
        assert_eq!(Severity::from_vendor("absent").code(), -1);
    }

    #[test]
    fn test_unknown_fallback() {
        assert_eq!(Severity::from_vendor("Weird").code(), 3);
        assert_eq!(Severity::from_vendor("").code(), 3);
        assert_eq!(Severity::from_vendor("N/A").code(), 3);
    }

    #[test]
    fn test_gauge_values() {
        assert_eq!(Severity::Ok.value(), 0.0);
        assert_eq!(Severity::Absent.value(), -1.0);
        assert_eq!(Severity::Unknown.value(), 3.0);
    }
}
