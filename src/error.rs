//! Custom error types for the acquisition core.
//!
//! This module defines the primary error type, `EcDaqError`, using the
//! `thiserror` crate. The enum is deliberately small and split along the
//! fatal/recoverable line of the acquisition design:
//!
//! - **`Config` / `Configuration`**: the configuration file could not be read
//!   or deserialized, or passed parsing but holds a semantically broken value
//!   (zero polling interval, absurd buffer bound). Fatal to a run.
//! - **`PortOpen`**: the configured serial port could not be opened. Fatal to
//!   a run and reported once with actionable guidance; a port that fails to
//!   open points at a configuration or cabling problem the operator must fix,
//!   so the session never auto-retries it.
//! - **`Io`** / **`Csv`**: I/O failures outside the polling cycle (opening or
//!   writing the CSV log, joining the runtime). Read/write hiccups *inside*
//!   an active polling cycle are not represented here at all: they are logged
//!   and retried on the next cycle, never propagated.
//! - **`TaskJoin`**: the acquisition task panicked or was aborted.
//!
//! Malformed instrument lines are likewise not errors: the adapter parse
//! yields `None` and the line is dropped.

use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type EcResult<T> = std::result::Result<T, EcDaqError>;

#[derive(Error, Debug)]
pub enum EcDaqError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Configuration(String),

    #[error(
        "Failed to open serial port '{port}': {source}. \
         Check the port name (`ec-daq ports` lists candidates), the cabling, \
         and the configured baud rate, then restart."
    )]
    PortOpen {
        port: String,
        #[source]
        source: tokio_serial::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV log error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Acquisition task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_open_message_names_port_and_next_steps() {
        let source = tokio_serial::Error::new(
            tokio_serial::ErrorKind::NoDevice,
            "No such file or directory",
        );
        let err = EcDaqError::PortOpen {
            port: "/dev/ttyUSB7".to_string(),
            source,
        };
        let msg = err.to_string();
        assert!(msg.contains("/dev/ttyUSB7"));
        assert!(msg.contains("ec-daq ports"));
        assert!(msg.contains("baud rate"));
    }

    #[test]
    fn io_error_converts_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: EcDaqError = io.into();
        match err {
            EcDaqError::Io(inner) => {
                assert_eq!(inner.kind(), std::io::ErrorKind::PermissionDenied)
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
