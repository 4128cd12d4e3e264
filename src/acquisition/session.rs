//! Acquisition Session
//!
//! Owns the polling loop that turns a byte source (serial port or mock
//! meter) into parsed [`Measurement`]s. The session runs as a spawned task;
//! the caller keeps a [`SessionHandle`] to observe its state and to request
//! an orderly stop.
//!
//! # Lifecycle
//!
//! `Idle` → `Connecting` → `Active` → `Stopped` on shutdown or EOF, or
//! `Failed` if the serial port cannot be opened. State transitions are
//! published on a watch channel so the caller can block on a terminal state.
//!
//! # Example
//!
//! ```rust,ignore
//! use ec_daq::acquisition::AcquisitionSession;
//! use ec_daq::adapters::AdapterRegistry;
//! use ec_daq::config::Settings;
//!
//! let settings = Settings::new(None)?;
//! let registry = AdapterRegistry::with_builtin();
//! let handle = AcquisitionSession::new(&settings, &registry)
//!     .spawn(|m| println!("{} {}", m.conductivity, m.unit));
//! let final_state = handle.stop().await?;
//! ```

use crate::acquisition::framing::LineFramer;
use crate::acquisition::mock::MockMeter;
use crate::acquisition::serial::{open_meter_port, DynSerial};
use crate::adapters::{AdapterRegistry, MeterAdapter};
use crate::config::Settings;
use crate::error::EcResult;
use crate::measurement::Measurement;
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

/// After a first read returns data, further buffered bytes are slurped with
/// this short timeout so one cycle drains one burst.
const SLURP_TIMEOUT: Duration = Duration::from_millis(5);

const READ_CHUNK_BYTES: usize = 256;

// =============================================================================
// Session State
// =============================================================================

/// Observable lifecycle state of an acquisition session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created but not yet spawned.
    Idle,
    /// Opening the byte source.
    Connecting,
    /// Polling and emitting measurements.
    Active,
    /// Ended in an orderly fashion: stop requested or the stream ended.
    Stopped,
    /// The byte source could not be opened.
    Failed,
}

impl SessionState {
    /// True for `Stopped` and `Failed`, the two states a session never
    /// leaves.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Stopped | SessionState::Failed)
    }
}

// =============================================================================
// Byte Sources
// =============================================================================

/// Where the session's bytes come from.
enum ByteSource {
    /// A serial port that will be opened when the session starts, so an
    /// open failure surfaces as the observable `Failed` state.
    Unopened { port_name: String, baud_rate: u32 },
    /// An already-open port, typically a duplex stream in tests.
    Connected(DynSerial),
    /// A simulated meter; no port is involved.
    Mock(MockMeter),
}

// =============================================================================
// Session
// =============================================================================

/// A configured acquisition session, ready to spawn.
pub struct AcquisitionSession {
    adapter: Arc<dyn MeterAdapter>,
    source: ByteSource,
    interval: Duration,
    read_timeout: Duration,
    max_line_bytes: usize,
    mock_history_days: u32,
}

impl AcquisitionSession {
    /// Build a session from settings, resolving the meter adapter through
    /// the registry. Mock mode swaps the serial port for a [`MockMeter`]
    /// and uses the mock cadence instead of the serial polling interval.
    pub fn new(settings: &Settings, registry: &AdapterRegistry) -> Self {
        let adapter = registry.get(&settings.device.model);
        let (source, interval) = if settings.device.mock_data {
            (
                ByteSource::Mock(MockMeter::new(None)),
                Duration::from_millis(settings.device.mock_interval_ms),
            )
        } else {
            (
                ByteSource::Unopened {
                    port_name: settings.serial.port.clone(),
                    baud_rate: settings.serial.baud_rate,
                },
                Duration::from_millis(settings.device.measurement_interval_ms),
            )
        };

        Self {
            adapter,
            source,
            interval,
            read_timeout: Duration::from_millis(settings.serial.timeout_ms),
            max_line_bytes: settings.acquisition.max_line_bytes,
            mock_history_days: settings.device.mock_history_days,
        }
    }

    /// Build a session over an already-open byte source.
    pub fn from_byte_source(
        port: DynSerial,
        adapter: Arc<dyn MeterAdapter>,
        interval: Duration,
    ) -> Self {
        Self {
            adapter,
            source: ByteSource::Connected(port),
            interval,
            read_timeout: Duration::from_millis(1000),
            max_line_bytes: 4096,
            mock_history_days: 0,
        }
    }

    /// Build a mock session, e.g. with a seeded meter for deterministic
    /// tests.
    pub fn from_mock(meter: MockMeter, interval: Duration, history_days: u32) -> Self {
        Self {
            adapter: AdapterRegistry::with_builtin().get(crate::adapters::DEFAULT_MODEL),
            source: ByteSource::Mock(meter),
            interval,
            read_timeout: Duration::from_millis(1000),
            max_line_bytes: 4096,
            mock_history_days: history_days,
        }
    }

    /// Override the unterminated-line buffer limit.
    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    /// Override how long one cycle waits for the first byte.
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Spawn the session task. Every parsed measurement is handed to `sink`
    /// from inside the task.
    pub fn spawn<F>(self, sink: F) -> SessionHandle
    where
        F: FnMut(Measurement) + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (state_tx, state_rx) = watch::channel(SessionState::Idle);
        let join = tokio::spawn(self.run(shutdown_rx, state_tx, sink));
        SessionHandle {
            shutdown: Some(shutdown_tx),
            join,
            state: state_rx,
        }
    }

    async fn run<F>(
        self,
        mut shutdown_rx: oneshot::Receiver<()>,
        state_tx: watch::Sender<SessionState>,
        mut sink: F,
    ) -> EcResult<SessionState>
    where
        F: FnMut(Measurement) + Send + 'static,
    {
        let AcquisitionSession {
            adapter,
            source,
            interval,
            read_timeout,
            max_line_bytes,
            mock_history_days,
        } = self;

        let _ = state_tx.send(SessionState::Connecting);

        let port = match source {
            ByteSource::Mock(meter) => {
                let _ = state_tx.send(SessionState::Active);
                info!(
                    adapter = adapter.name(),
                    interval_ms = interval.as_millis() as u64,
                    "Mock acquisition session active"
                );
                let state =
                    mock_loop(meter, mock_history_days, interval, &mut shutdown_rx, &mut sink)
                        .await;
                let _ = state_tx.send(state);
                return Ok(state);
            }
            ByteSource::Connected(port) => port,
            ByteSource::Unopened {
                port_name,
                baud_rate,
            } => {
                info!(port = %port_name, baud_rate, "Opening serial port");
                match open_meter_port(&port_name, baud_rate).await {
                    Ok(port) => port,
                    Err(err) => {
                        error!(error = %err, "Acquisition session failed to start");
                        let _ = state_tx.send(SessionState::Failed);
                        return Err(err);
                    }
                }
            }
        };

        let _ = state_tx.send(SessionState::Active);
        info!(
            adapter = adapter.name(),
            interval_ms = interval.as_millis() as u64,
            "Acquisition session active"
        );

        let framer = LineFramer::new(max_line_bytes);
        let state = serial_loop(
            port,
            adapter,
            framer,
            interval,
            read_timeout,
            &mut shutdown_rx,
            &mut sink,
        )
        .await;
        let _ = state_tx.send(state);
        Ok(state)
    }
}

// =============================================================================
// Polling Loops
// =============================================================================

async fn serial_loop<F>(
    mut port: DynSerial,
    adapter: Arc<dyn MeterAdapter>,
    mut framer: LineFramer,
    interval: Duration,
    read_timeout: Duration,
    shutdown_rx: &mut oneshot::Receiver<()>,
    sink: &mut F,
) -> SessionState
where
    F: FnMut(Measurement),
{
    loop {
        tokio::select! {
            _ = &mut *shutdown_rx => {
                info!("Acquisition shutdown requested");
                return SessionState::Stopped;
            }
            _ = sleep(interval) => {
                // Poll-style meters need a prompt before they answer.
                if let Some(cmd) = adapter.poll_command() {
                    match timeout(read_timeout, port.write_all(cmd)).await {
                        Ok(Ok(())) => {}
                        Ok(Err(err)) => warn!(error = %err, "Failed to send poll command"),
                        Err(_) => warn!("Poll command write timed out"),
                    }
                }

                let mut chunk = [0u8; READ_CHUNK_BYTES];
                let mut saw_eof = false;
                match timeout(read_timeout, port.read(&mut chunk)).await {
                    Err(_) => {} // nothing arrived this cycle
                    Ok(Ok(0)) => saw_eof = true,
                    Ok(Ok(n)) => {
                        framer.push(&chunk[..n]);
                        // Drain whatever else the burst already delivered.
                        loop {
                            match timeout(SLURP_TIMEOUT, port.read(&mut chunk)).await {
                                Ok(Ok(0)) => {
                                    saw_eof = true;
                                    break;
                                }
                                Ok(Ok(n)) => framer.push(&chunk[..n]),
                                Ok(Err(_)) | Err(_) => break,
                            }
                        }
                    }
                    Ok(Err(err)) => {
                        warn!(error = %err, "Serial read error");
                    }
                }

                while let Some(line) = framer.next_line() {
                    match adapter.parse_line(&line) {
                        Some(reading) => {
                            let measurement = Measurement {
                                timestamp: Local::now(),
                                conductivity: reading.conductivity,
                                unit: reading.unit,
                                temperature: reading.temperature,
                            };
                            debug!(
                                value = measurement.conductivity,
                                unit = %measurement.unit,
                                "Parsed reading"
                            );
                            sink(measurement);
                        }
                        None => {
                            if !line.trim().is_empty() {
                                debug!(line = %line, "Discarded unparseable line");
                            }
                        }
                    }
                }

                if saw_eof {
                    info!("Serial stream ended, stopping acquisition");
                    return SessionState::Stopped;
                }
            }
        }
    }
}

async fn mock_loop<F>(
    mut meter: MockMeter,
    history_days: u32,
    interval: Duration,
    shutdown_rx: &mut oneshot::Receiver<()>,
    sink: &mut F,
) -> SessionState
where
    F: FnMut(Measurement),
{
    if history_days > 0 {
        let backlog = meter.backlog(history_days);
        info!(
            rows = backlog.len(),
            days = history_days,
            "Seeding log with mock backlog"
        );
        for measurement in backlog {
            sink(measurement);
        }
    }

    loop {
        tokio::select! {
            _ = &mut *shutdown_rx => {
                info!("Acquisition shutdown requested");
                return SessionState::Stopped;
            }
            _ = sleep(interval) => {
                let measurement = meter.next_reading();
                debug!(
                    value = measurement.conductivity,
                    unit = %measurement.unit,
                    "Mock reading"
                );
                sink(measurement);
            }
        }
    }
}

// =============================================================================
// Session Handle
// =============================================================================

/// Handle to a running acquisition session.
///
/// Dropping the handle without calling [`stop`](SessionHandle::stop) also
/// shuts the task down, since the shutdown channel closes.
pub struct SessionHandle {
    shutdown: Option<oneshot::Sender<()>>,
    join: JoinHandle<EcResult<SessionState>>,
    state: watch::Receiver<SessionState>,
}

impl SessionHandle {
    /// The most recently published session state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// A watch receiver for state transitions, e.g. to block on a terminal
    /// state.
    pub fn state_watch(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Request an orderly shutdown and wait for the task to finish.
    pub async fn stop(mut self) -> EcResult<SessionState> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.join.await?
    }

    /// Wait for the session to end on its own (EOF or failure).
    pub async fn wait(self) -> EcResult<SessionState> {
        self.join.await?
    }
}
