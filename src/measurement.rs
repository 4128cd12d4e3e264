//! Measurement types shared across the acquisition pipeline.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of conductivity units reported by the supported meters.
///
/// Wire text is accepted case-insensitively and with the micro sign already
/// folded to ASCII `u` (see the adapter line normalization), so every
/// downstream consumer sees exactly `"uS/cm"` or `"mS/cm"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConductivityUnit {
    /// Microsiemens per centimetre.
    #[serde(rename = "uS/cm")]
    MicroSiemensPerCm,
    /// Millisiemens per centimetre.
    #[serde(rename = "mS/cm")]
    MilliSiemensPerCm,
}

impl ConductivityUnit {
    /// Canonical ASCII rendering of the unit.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConductivityUnit::MicroSiemensPerCm => "uS/cm",
            ConductivityUnit::MilliSiemensPerCm => "mS/cm",
        }
    }

    /// Parse a unit token captured from an instrument line.
    ///
    /// Expects the micro sign to have been folded to `u` already; matching is
    /// case-insensitive because meter firmware is not consistent about case.
    pub fn from_wire(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("uS/cm") {
            Some(ConductivityUnit::MicroSiemensPerCm)
        } else if token.eq_ignore_ascii_case("mS/cm") {
            Some(ConductivityUnit::MilliSiemensPerCm)
        } else {
            None
        }
    }
}

impl fmt::Display for ConductivityUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One timestamped conductivity reading accepted into the system.
///
/// The timestamp is assigned by the acquisition loop at the moment a complete
/// record is recognized; none of the supported meters report one. A
/// `Measurement` only exists when both the value and the unit were extracted,
/// so there is no representable partial reading. `temperature` is `None`
/// (never zero) for models that do not report it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    /// Wall-clock capture time.
    pub timestamp: DateTime<Local>,
    /// Conductivity reading in the unit given by `unit`.
    pub conductivity: f64,
    /// Unit the meter reported (or the adapter's documented default).
    pub unit: ConductivityUnit,
    /// Solution temperature in degrees Celsius, when the meter reports one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}
