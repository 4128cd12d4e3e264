//! HACH Sension7 adapter.
//!
//! Push-style bench meter: readings arrive whenever the operator presses
//! Print or continuous output is enabled, so there is no poll command. A
//! typical line is `1413 uS/cm 25.0 C`; the temperature field is optional
//! and some firmware revisions drop the unit entirely.
//!
//! Tiers, most to least specific (micro sign already folded to `u`):
//! 1. value + explicit unit, with a trailing temperature field
//! 2. value + explicit unit
//! 3. a line that is nothing but a number, assumed to be uS/cm

use crate::adapters::{normalize_line, MeterAdapter, ParsedReading};
use crate::measurement::ConductivityUnit;
use regex::Regex;
use std::sync::LazyLock;

static CONDUCTIVITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+\.?\d*)\s*(uS/cm|mS/cm)").expect("Invalid Sension7 conductivity regex")
});

// The temperature field is matched case-sensitively: a lower-case `c` next
// to a digit run is part of a unit token, not a temperature.
static TEMPERATURE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+\.?\d*)\s*[°]?C").expect("Invalid Sension7 temperature regex")
});

static BARE_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.?\d*)$").expect("Invalid Sension7 bare-value regex"));

/// Adapter for the HACH Sension7 conductivity meter. This is the registry's
/// default model.
pub struct Sension7Adapter;

impl MeterAdapter for Sension7Adapter {
    fn name(&self) -> &'static str {
        "HACH Sension7"
    }

    fn description(&self) -> &'static str {
        "HACH Sension7 conductivity meter with serial output"
    }

    fn parse_line(&self, raw: &str) -> Option<ParsedReading> {
        let line = normalize_line(raw);
        if line.is_empty() {
            return None;
        }

        if let Some(caps) = CONDUCTIVITY_RE.captures(&line) {
            if let (Ok(conductivity), Some(unit)) = (
                caps[1].parse::<f64>(),
                ConductivityUnit::from_wire(&caps[2]),
            ) {
                let temperature = TEMPERATURE_RE
                    .captures(&line)
                    .and_then(|c| c[1].parse::<f64>().ok());
                return Some(ParsedReading {
                    conductivity,
                    unit,
                    temperature,
                });
            }
        }

        // Unit-dropping firmware: a line that is only a number is still a
        // reading, reported in uS/cm.
        BARE_VALUE_RE
            .captures(&line)
            .and_then(|caps| caps[1].parse::<f64>().ok())
            .map(|conductivity| ParsedReading {
                conductivity,
                unit: ConductivityUnit::MicroSiemensPerCm,
                temperature: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_value_unit_and_temperature_tiers() {
        let adapter = Sension7Adapter;
        let test_cases = vec![
            (
                "1413 uS/cm 25.0 C",
                Some((1413.0, ConductivityUnit::MicroSiemensPerCm, Some(25.0))),
            ),
            (
                "2.5 mS/cm 21 °C",
                Some((2.5, ConductivityUnit::MilliSiemensPerCm, Some(21.0))),
            ),
            (
                "1413 uS/cm",
                Some((1413.0, ConductivityUnit::MicroSiemensPerCm, None)),
            ),
            (
                "1413",
                Some((1413.0, ConductivityUnit::MicroSiemensPerCm, None)),
            ),
            ("ERR 123", None),
            ("no reading", None),
        ];

        for (input, expected) in test_cases {
            let got = adapter
                .parse_line(input)
                .map(|r| (r.conductivity, r.unit, r.temperature));
            assert_eq!(got, expected, "input: {input:?}");
        }
    }

    #[test]
    fn micro_sign_and_case_fold_to_canonical_unit() {
        let adapter = Sension7Adapter;
        for input in ["1413.5 µS/cm", "1413.5 US/CM", "1413.5 us/cm"] {
            let reading = adapter.parse_line(input).unwrap();
            assert_eq!(reading.conductivity, 1413.5);
            assert_eq!(reading.unit, ConductivityUnit::MicroSiemensPerCm);
        }
    }

    #[test]
    fn tolerates_nulls_and_padding_from_the_wire() {
        let adapter = Sension7Adapter;
        let reading = adapter.parse_line("\0\0  1413 uS/cm  \r").unwrap();
        assert_eq!(reading.conductivity, 1413.0);
        assert!(reading.temperature.is_none());
    }

    #[test]
    fn no_poll_command_for_push_style_meter() {
        assert!(Sension7Adapter.poll_command().is_none());
    }
}
