//! Oakton CON150 adapter.
//!
//! Poll-style meter: it replies to `D\r` with a labelled dump such as
//! `COND: 1413 uS/cm TEMP: 25.0 C`. Because every field carries a label,
//! this adapter is strict — an unlabelled number is not accepted as a
//! reading, unlike the push-style meters.

use crate::adapters::{normalize_line, MeterAdapter, ParsedReading};
use crate::measurement::ConductivityUnit;
use regex::Regex;
use std::sync::LazyLock;

static COND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)COND:\s*(\d+\.?\d*)\s*(uS/cm|mS/cm)").expect("Invalid CON150 COND regex")
});

static TEMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)TEMP:\s*(\d+\.?\d*)\s*[°]?C").expect("Invalid CON150 TEMP regex")
});

/// Adapter for the Oakton CON150 conductivity/TDS meter.
pub struct Con150Adapter;

impl MeterAdapter for Con150Adapter {
    fn name(&self) -> &'static str {
        "Oakton CON150"
    }

    fn description(&self) -> &'static str {
        "Oakton CON150 conductivity/TDS meter with RS232 output"
    }

    fn poll_command(&self) -> Option<&'static [u8]> {
        Some(b"D\r")
    }

    fn parse_line(&self, raw: &str) -> Option<ParsedReading> {
        let line = normalize_line(raw);
        if line.is_empty() {
            return None;
        }

        let caps = COND_RE.captures(&line)?;
        if let (Ok(conductivity), Some(unit)) = (
            caps[1].parse::<f64>(),
            ConductivityUnit::from_wire(&caps[2]),
        ) {
            let temperature = TEMP_RE
                .captures(&line)
                .and_then(|c| c[1].parse::<f64>().ok());
            return Some(ParsedReading {
                conductivity,
                unit,
                temperature,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_labelled_dump_lines() {
        let adapter = Con150Adapter;
        let test_cases = vec![
            (
                "COND: 1413 uS/cm TEMP: 25.0 C",
                Some((1413.0, ConductivityUnit::MicroSiemensPerCm, Some(25.0))),
            ),
            (
                "cond: 2.5 mS/cm temp: 21 °C",
                Some((2.5, ConductivityUnit::MilliSiemensPerCm, Some(21.0))),
            ),
            (
                "COND: 890.1 µS/cm",
                Some((890.1, ConductivityUnit::MicroSiemensPerCm, None)),
            ),
            // Unlabelled values are rejected; only labelled dumps are trusted.
            ("123.4 uS/cm", None),
            ("1413", None),
            ("TEMP: 25.0 C", None),
            ("garbage", None),
        ];

        for (input, expected) in test_cases {
            let got = adapter
                .parse_line(input)
                .map(|r| (r.conductivity, r.unit, r.temperature));
            assert_eq!(got, expected, "input: {input:?}");
        }
    }

    #[test]
    fn polls_with_dump_command() {
        assert_eq!(Con150Adapter.poll_command(), Some(b"D\r".as_slice()));
    }
}
