//! Milwaukee MW301 adapter.
//!
//! Push-style EC meter with no temperature probe on its output. Lines look
//! like `1413 uS/cm` or a bare number; any temperature-looking text that
//! does appear belongs to a different display page and is ignored.

use crate::adapters::{normalize_line, MeterAdapter, ParsedReading};
use crate::measurement::ConductivityUnit;
use regex::Regex;
use std::sync::LazyLock;

static CONDUCTIVITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+\.?\d*)\s*(uS/cm|mS/cm)").expect("Invalid MW301 conductivity regex")
});

static BARE_VALUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+\.?\d*)$").expect("Invalid MW301 bare-value regex"));

/// Adapter for the Milwaukee MW301 EC meter.
pub struct Mw301Adapter;

impl MeterAdapter for Mw301Adapter {
    fn name(&self) -> &'static str {
        "Milwaukee MW301"
    }

    fn description(&self) -> &'static str {
        "Milwaukee MW301 EC meter with digital output"
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
                return Some(ParsedReading {
                    conductivity,
                    unit,
                    temperature: None,
                });
            }
        }

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
    fn parses_unit_and_bare_value_tiers() {
        let adapter = Mw301Adapter;
        let test_cases = vec![
            (
                "205.3 mS/cm",
                Some((205.3, ConductivityUnit::MilliSiemensPerCm)),
            ),
            (
                "1413 µS/cm",
                Some((1413.0, ConductivityUnit::MicroSiemensPerCm)),
            ),
            ("456", Some((456.0, ConductivityUnit::MicroSiemensPerCm))),
            ("ERR 456", None),
            ("garbage", None),
        ];

        for (input, expected) in test_cases {
            let got = adapter.parse_line(input).map(|r| (r.conductivity, r.unit));
            assert_eq!(got, expected, "input: {input:?}");
        }
    }

    #[test]
    fn temperature_text_is_ignored() {
        let adapter = Mw301Adapter;
        let reading = adapter.parse_line("1413 uS/cm 25.0 C").unwrap();
        assert_eq!(reading.conductivity, 1413.0);
        assert!(reading.temperature.is_none());
    }

    #[test]
    fn no_poll_command_for_push_style_meter() {
        assert!(Mw301Adapter.poll_command().is_none());
    }
}
