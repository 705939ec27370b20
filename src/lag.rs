//! Replication lag report and the pre-comparison wait policy.

use serde::ser::SerializeMap;
use serde::Serialize;
use std::time::Duration;

/// Grace period added on top of the measured lag, in seconds.
const LAG_WAIT_GRACE_SECS: u64 = 5;

/// Hard cap on the pre-comparison wait, in seconds.
const LAG_WAIT_CAP_SECS: u64 = 30;

/// Outcome of probing the replica for replication delay.
///
/// `Measured(0)` means the store reported no lag (or the probe failed
/// transiently and we fail open); `Unsupported` means the store cannot
/// report lag at all. The two are deliberately distinct: callers and tests
/// can tell "in sync" from "couldn't ask".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LagReport {
    /// The store does not expose replication metrics.
    Unsupported,
    /// Measured lag in whole seconds, rounded down. Negative raw readings
    /// are clamped to 0 before construction.
    Measured(u64),
}

impl LagReport {
    /// Build a report from a raw reading, clamping negative values to zero.
    ///
    /// Clamping conflates "no lag" with a clock-skewed reading; operators
    /// depend on a skewed clock not aborting the audit.
    pub fn from_raw_seconds(raw: i64) -> Self {
        Self::Measured(raw.max(0) as u64)
    }

    /// How long to wait before comparing: `min(lag + 5, 30)` seconds when
    /// lag was measured and non-zero, otherwise no wait. One shot; the
    /// engine never re-probes after the wait.
    pub fn wait_duration(&self) -> Duration {
        match self {
            Self::Unsupported | Self::Measured(0) => Duration::ZERO,
            Self::Measured(secs) => {
                Duration::from_secs((secs + LAG_WAIT_GRACE_SECS).min(LAG_WAIT_CAP_SECS))
            }
        }
    }
}

impl Serialize for LagReport {
    /// Serialized as `{"supported": bool, "lag_seconds": n}` with
    /// `lag_seconds` present only when lag was actually measured.
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            Self::Unsupported => map.serialize_entry("supported", &false)?,
            Self::Measured(secs) => {
                map.serialize_entry("supported", &true)?;
                map.serialize_entry("lag_seconds", secs)?;
            }
        }
        map.end()
    }
}

impl std::fmt::Display for LagReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported => write!(f, "not supported by this server"),
            Self::Measured(secs) => write!(f, "{secs} seconds"),
        }
    }
}
