//! Acquisition Pipeline
//!
//! Everything between a byte source and a parsed measurement:
//!
//! - [`serial`]: async serial port abstractions and opening
//! - [`framing`]: reassembly of newline-delimited output from read chunks
//! - [`mock`]: simulated meter for hardware-free operation
//! - [`session`]: the polling loop, its lifecycle states, and its handle

pub mod framing;
pub mod mock;
pub mod serial;
pub mod session;

pub use framing::LineFramer;
pub use mock::MockMeter;
pub use serial::{open_meter_port, DynSerial, SerialPortIO};
pub use session::{AcquisitionSession, SessionHandle, SessionState};
