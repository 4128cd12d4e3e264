//! Serial Port Abstractions
//!
//! Shared types for async serial communication with bench meters.
//!
//! # Types
//!
//! - [`SerialPortIO`]: Trait alias combining AsyncRead + AsyncWrite for serial ports
//! - [`DynSerial`]: Type-erased boxed serial port
//!
//! # Utilities
//!
//! - [`open_meter_port`]: Open a serial port with spawn_blocking
//!
//! # Example
//!
//! ```rust,ignore
//! use ec_daq::acquisition::open_meter_port;
//!
//! let port = open_meter_port("/dev/ttyUSB0", 9600).await?;
//! ```

use crate::error::{EcDaqError, EcResult};
use tokio::io::{AsyncRead, AsyncWrite};

// =============================================================================
// Serial Port Trait
// =============================================================================

/// Trait alias for async serial port I/O.
///
/// Any type implementing `AsyncRead + AsyncWrite + Unpin + Send` can be used
/// as a serial port. This includes:
/// - `tokio_serial::SerialStream` (real hardware)
/// - `tokio::io::DuplexStream` (testing)
pub trait SerialPortIO: AsyncRead + AsyncWrite + Unpin + Send {}

// Blanket implementation for all types meeting the requirements
impl<T: AsyncRead + AsyncWrite + Unpin + Send> SerialPortIO for T {}

/// Type-erased boxed serial port.
///
/// Use this when you need to store a serial port without knowing its concrete
/// type, e.g. to swap in a duplex stream for tests.
pub type DynSerial = Box<dyn SerialPortIO>;

// =============================================================================
// Port Opening
// =============================================================================

/// Open a serial port asynchronously using spawn_blocking.
///
/// Port initialization can block on fcntl/termios calls, so it is moved off
/// the async runtime. Standard meter settings are applied: 8 data bits, no
/// parity, 1 stop bit, no flow control.
///
/// # Errors
///
/// Returns [`EcDaqError::PortOpen`] if the port cannot be opened, or
/// [`EcDaqError::TaskJoin`] if spawn_blocking itself fails.
pub async fn open_meter_port(port_path: &str, baud_rate: u32) -> EcResult<DynSerial> {
    use tokio::task::spawn_blocking;
    use tokio_serial::SerialPortBuilderExt;

    let port_path_owned = port_path.to_string();

    let stream = spawn_blocking(move || {
        tokio_serial::new(&port_path_owned, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|source| EcDaqError::PortOpen {
                port: port_path_owned.clone(),
                source,
            })
    })
    .await??;

    Ok(Box::new(stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn duplex_stream_satisfies_the_port_trait() {
        let (mut host, device) = tokio::io::duplex(64);
        let mut port: DynSerial = Box::new(device);

        host.write_all(b"1413 uS/cm\n").await.unwrap();

        let mut buf = [0u8; 32];
        let n = port.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"1413 uS/cm\n");
    }

    #[tokio::test]
    async fn opening_a_missing_port_reports_the_port_name() {
        match open_meter_port("/dev/ttyNOSUCH99", 9600).await {
            Ok(_) => panic!("expected opening a nonexistent port to fail"),
            Err(EcDaqError::PortOpen { port, .. }) => assert_eq!(port, "/dev/ttyNOSUCH99"),
            Err(other) => panic!("expected PortOpen, got {other:?}"),
        }
    }
}
