//! Mock Meter
//!
//! Generates plausible conductivity readings without hardware: a backlog of
//! historical rows to seed an empty log, then live readings on a timer. The
//! RNG can be seeded for reproducible sequences in tests.

use crate::measurement::{ConductivityUnit, Measurement};
use chrono::{Duration as ChronoDuration, Local};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const MIN_VALUE: f64 = 100.0;
const MAX_VALUE: f64 = 500.0;
const MIN_TEMPERATURE: f64 = 100.0;
const MAX_TEMPERATURE: f64 = 200.0;

/// Backlog rows mostly sit in a calm band, with occasional spikes.
const SPIKE_PROBABILITY: f64 = 0.05;
const CALM_BAND_MAX: f64 = 300.0;
const SPIKE_BAND_MIN: f64 = 350.0;

/// Simulated conductivity meter.
///
/// ```rust,ignore
/// use ec_daq::acquisition::MockMeter;
///
/// let mut meter = MockMeter::new(Some(42));
/// let history = meter.backlog(7);
/// let live = meter.next_reading();
/// ```
pub struct MockMeter {
    rng: ChaCha8Rng,
}

impl MockMeter {
    /// Create a mock meter with an optional seed.
    /// If seed is None, uses a random seed from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        Self { rng }
    }

    /// Generate a historical backlog covering the last `days` days.
    ///
    /// Rows step forward by two hours plus minute/second jitter, so the
    /// series is strictly increasing and ends before the current time.
    /// Passing `0` yields an empty backlog.
    pub fn backlog(&mut self, days: u32) -> Vec<Measurement> {
        let now = Local::now();
        let mut cursor = now - ChronoDuration::days(i64::from(days));
        let mut rows = Vec::new();

        while cursor < now {
            let conductivity = if self.rng.gen_bool(SPIKE_PROBABILITY) {
                self.rng.gen_range(SPIKE_BAND_MIN..=MAX_VALUE)
            } else {
                self.rng.gen_range(MIN_VALUE..=CALM_BAND_MAX)
            };
            rows.push(Measurement {
                timestamp: cursor,
                conductivity,
                unit: self.random_unit(),
                temperature: Some(self.rng.gen_range(MIN_TEMPERATURE..=MAX_TEMPERATURE)),
            });
            cursor = cursor
                + ChronoDuration::hours(2)
                + ChronoDuration::minutes(self.rng.gen_range(0..60))
                + ChronoDuration::seconds(self.rng.gen_range(0..60));
        }

        rows
    }

    /// Generate one live reading stamped with the current time.
    pub fn next_reading(&mut self) -> Measurement {
        Measurement {
            timestamp: Local::now(),
            conductivity: self.rng.gen_range(MIN_VALUE..=MAX_VALUE),
            unit: self.random_unit(),
            temperature: Some(self.rng.gen_range(MIN_TEMPERATURE..=MAX_TEMPERATURE)),
        }
    }

    fn random_unit(&mut self) -> ConductivityUnit {
        if self.rng.gen_bool(0.5) {
            ConductivityUnit::MicroSiemensPerCm
        } else {
            ConductivityUnit::MilliSiemensPerCm
        }
    }
}

impl std::fmt::Debug for MockMeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockMeter")
            .field("rng", &"<ChaCha8Rng>")
            .finish()
    }
}
