//! # Conductivity Meter Acquisition Library
//!
//! This crate is the core library for the `ec-daq` application. It reads a
//! bench conductivity meter over a serial port, parses each vendor's line
//! format into a common measurement type, and appends the result to a CSV
//! log. A mock meter stands in for hardware so the full pipeline runs on a
//! development machine.
//!
//! ## Crate Structure
//!
//! - **`adapters`**: Per-model meter adapters (line grammars, poll commands)
//!   and the registry that resolves a configured model name to one of them.
//! - **`acquisition`**: The serial port abstraction, line framing, the mock
//!   meter, and the polling session with its lifecycle states.
//! - **`config`**: Layered TOML + environment configuration. See
//!   [`config::Settings`].
//! - **`error`**: The crate-wide [`EcDaqError`] enum and [`EcResult`] alias.
//! - **`measurement`**: The [`Measurement`] record and its conductivity
//!   units.
//! - **`sink`**: The append-only CSV measurement log.

pub mod acquisition;
pub mod adapters;
pub mod config;
pub mod error;
pub mod measurement;
pub mod sink;

pub use error::{EcDaqError, EcResult};
pub use measurement::{ConductivityUnit, Measurement};
