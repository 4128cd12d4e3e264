//! Meter protocol adapters.
//!
//! Every supported conductivity meter speaks a slightly different line
//! protocol: some label their fields, some print bare readings, some need a
//! poll command before they answer. Each model gets one adapter implementing
//! [`MeterAdapter`]; the acquisition loop stays agnostic to which meter is on
//! the wire.
//!
//! Parsing follows one shared design across adapters: the raw line is
//! normalized (stray NULs dropped, micro sign folded to ASCII `u`,
//! whitespace trimmed), then an ordered sequence of patterns is tried from
//! most to least specific, first match wins. A capture that fails numeric
//! conversion falls through to the next tier instead of aborting. Adapters
//! whose firmware is known to drop the unit finish with an anchored
//! bare-number tier and a documented default unit; the rest reject unit-less
//! lines.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ec_daq::adapters::AdapterRegistry;
//!
//! let registry = AdapterRegistry::with_builtin();
//! let adapter = registry.get("Oakton CON150");
//! if let Some(reading) = adapter.parse_line("COND: 123.4 uS/cm, TEMP: 25.3 C") {
//!     println!("{} {}", reading.conductivity, reading.unit);
//! }
//! ```

use crate::measurement::ConductivityUnit;
use std::sync::Arc;
use tracing::warn;

pub mod con150;
pub mod mw301;
pub mod sension7;

pub use con150::Con150Adapter;
pub use mw301::Mw301Adapter;
pub use sension7::Sension7Adapter;

/// Model the registry falls back to when the configured name is unknown.
pub const DEFAULT_MODEL: &str = "HACH Sension7";

// =============================================================================
// Adapter contract
// =============================================================================

/// One successfully parsed instrument line, before the acquisition loop
/// stamps it with a timestamp.
///
/// A reading carries its unit by construction: there is no way to represent
/// a conductivity value whose unit failed to parse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedReading {
    /// Conductivity value in `unit`.
    pub conductivity: f64,
    /// Unit the meter reported, or the adapter's documented default.
    pub unit: ConductivityUnit,
    /// Temperature in degrees Celsius, for models that report one.
    pub temperature: Option<f64>,
}

/// Capability set every supported meter model implements.
///
/// Adapters are stateless: `parse_line` is a pure function and may be called
/// from any context. Implementations must never panic on malformed input;
/// any failure to extract a valid value and unit yields `None`.
pub trait MeterAdapter: Send + Sync {
    /// Stable registry key; this is what operators put in `[device] model`.
    fn name(&self) -> &'static str;

    /// Human-readable summary shown by `ec-daq adapters`.
    fn description(&self) -> &'static str;

    /// Fixed request-data command written once per polling cycle, for meters
    /// that only answer when solicited. `None` for push-style meters.
    fn poll_command(&self) -> Option<&'static [u8]> {
        None
    }

    /// Parse one framed line into a reading, or `None` when no valid reading
    /// can be extracted.
    fn parse_line(&self, raw: &str) -> Option<ParsedReading>;
}

/// Cleanup applied before any pattern matching: drop stray NUL bytes, fold
/// the micro sign to ASCII `u`, trim surrounding whitespace.
pub(crate) fn normalize_line(raw: &str) -> String {
    raw.replace('\0', "").replace('µ', "u").trim().to_string()
}

// =============================================================================
// Registry
// =============================================================================

/// Static mapping from model name to adapter, built once at startup.
///
/// Lookup never fails: an unknown model logs a warning and hands back the
/// [`DEFAULT_MODEL`] adapter, so a garbled `[device] model` entry cannot
/// prevent acquisition from starting.
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn MeterAdapter>>,
}

impl AdapterRegistry {
    /// Empty registry; useful when embedding a custom adapter set.
    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
        }
    }

    /// Registry holding every built-in meter adapter.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(Sension7Adapter));
        registry.register(Arc::new(Con150Adapter));
        registry.register(Arc::new(Mw301Adapter));
        registry
    }

    /// Add an adapter. Registration order is the order `iter` reports.
    pub fn register(&mut self, adapter: Arc<dyn MeterAdapter>) {
        self.adapters.push(adapter);
    }

    /// Look up a model by name, falling back to the default adapter (with a
    /// warning) when the name is unknown.
    pub fn get(&self, model_name: &str) -> Arc<dyn MeterAdapter> {
        if let Some(adapter) = self.adapters.iter().find(|a| a.name() == model_name) {
            return Arc::clone(adapter);
        }
        warn!(
            model = %model_name,
            default = DEFAULT_MODEL,
            "unknown meter model, using default adapter"
        );
        self.adapters
            .iter()
            .find(|a| a.name() == DEFAULT_MODEL)
            .map(Arc::clone)
            .unwrap_or_else(|| Arc::new(Sension7Adapter))
    }

    /// Registered adapters, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn MeterAdapter>> {
        self.adapters.iter()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn registry_resolves_every_builtin_model() {
        let registry = AdapterRegistry::with_builtin();
        for name in ["HACH Sension7", "Oakton CON150", "Milwaukee MW301"] {
            assert_eq!(registry.get(name).name(), name);
        }
    }

    #[traced_test]
    #[test]
    fn unknown_model_warns_and_falls_back_to_default() {
        let registry = AdapterRegistry::with_builtin();
        let adapter = registry.get("Fluke 287");
        assert_eq!(adapter.name(), DEFAULT_MODEL);
        assert!(logs_contain("unknown meter model"));
    }

    #[test]
    fn all_adapters_reject_empty_and_whitespace_lines() {
        let registry = AdapterRegistry::with_builtin();
        for adapter in registry.iter() {
            for input in ["", "   ", "\r\n", "\0\0"] {
                assert!(
                    adapter.parse_line(input).is_none(),
                    "{} accepted {:?}",
                    adapter.name(),
                    input
                );
            }
        }
    }

    #[test]
    fn parsing_is_idempotent_for_every_adapter() {
        let registry = AdapterRegistry::with_builtin();
        let lines = [
            "1413 uS/cm",
            "COND: 123.4 uS/cm, TEMP: 25.3 C",
            "205.3 mS/cm",
            "garbage",
        ];
        for adapter in registry.iter() {
            for line in lines {
                assert_eq!(
                    adapter.parse_line(line),
                    adapter.parse_line(line),
                    "{} is not stateless on {:?}",
                    adapter.name(),
                    line
                );
            }
        }
    }

    #[test]
    fn normalize_strips_nulls_and_folds_micro_sign() {
        assert_eq!(normalize_line("\0 1413 µS/cm \0\r"), "1413 uS/cm");
        assert_eq!(normalize_line("   "), "");
    }
}
