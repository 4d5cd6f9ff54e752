use std::fmt;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use satlink_frame::Frame;
use satlink_health::{Alert, HealthEvaluator};
use satlink_transport::{DatagramSocket, Received};
use tracing::{debug, error, info, warn};

use crate::config::IngestConfig;
use crate::error::{IngestError, Result};
use crate::observer::{FrameObserver, ObserverResult};
use crate::processor::{panic_message, DatagramProcessor};
use crate::stats::IngestStats;
use crate::store::TelemetryStore;

const LISTENER_THREAD_NAME: &str = "satlink-ingest";

/// Lifecycle of an [`IngestService`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ServiceState {
    Stopped = 0,
    Starting = 1,
    Listening = 2,
    Stopping = 3,
}

impl ServiceState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ServiceState::Starting,
            2 => ServiceState::Listening,
            3 => ServiceState::Stopping,
            _ => ServiceState::Stopped,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceState::Stopped => "stopped",
            ServiceState::Starting => "starting",
            ServiceState::Listening => "listening",
            ServiceState::Stopping => "stopping",
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UDP telemetry ingestion service.
///
/// `start` binds the configured address and spawns one listener thread;
/// `stop` wakes that thread, joins it and releases the port before
/// returning. Dropping a running service stops it.
pub struct IngestService {
    config: IngestConfig,
    processor: DatagramProcessor,
    state: Arc<AtomicU8>,
    running: Arc<AtomicBool>,
    socket: Option<Arc<DatagramSocket>>,
    listener: Option<JoinHandle<()>>,
}

impl IngestService {
    /// Create a stopped service that persists through `store`.
    pub fn new(config: IngestConfig, store: Arc<dyn TelemetryStore>) -> Self {
        Self {
            config,
            processor: DatagramProcessor::new(store),
            state: Arc::new(AtomicU8::new(ServiceState::Stopped as u8)),
            running: Arc::new(AtomicBool::new(false)),
            socket: None,
            listener: None,
        }
    }

    /// Replace the health rule table. Takes effect on the next `start`.
    pub fn with_evaluator(mut self, evaluator: HealthEvaluator) -> Self {
        self.processor.set_evaluator(evaluator);
        self
    }

    /// Attach an observer notified after every decoded frame.
    pub fn with_observer(mut self, observer: Arc<dyn FrameObserver>) -> Self {
        self.processor.set_observer(observer);
        self
    }

    pub fn with_observer_fn<F>(self, observer: F) -> Self
    where
        F: Fn(&Frame, &[Alert]) -> ObserverResult + Send + Sync + 'static,
    {
        self.with_observer(Arc::new(observer))
    }

    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn state(&self) -> ServiceState {
        ServiceState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Whether the listener thread is receiving.
    pub fn is_running(&self) -> bool {
        self.listener.is_some() && self.running.load(Ordering::SeqCst)
    }

    /// Bound address while running.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        if self.is_running() {
            self.socket.as_ref().map(|socket| socket.local_addr())
        } else {
            None
        }
    }

    /// Counters accumulated across every run of this service.
    pub fn stats(&self) -> IngestStats {
        self.processor.stats()
    }

    /// Bind and begin receiving. Returns the bound address.
    ///
    /// Calling `start` on a running service changes nothing and returns the
    /// address already bound. A bind failure leaves the service stopped.
    pub fn start(&mut self) -> Result<SocketAddr> {
        if let Some(addr) = self.local_addr() {
            warn!(%addr, "ingestion service already running");
            return Ok(addr);
        }

        // A listener that exited on a socket error still needs joining.
        self.reap();
        self.set_state(ServiceState::Starting);

        let socket =
            match DatagramSocket::bind_with_options(self.config.bind, self.config.socket_options())
            {
                Ok(socket) => Arc::new(socket),
                Err(err) => {
                    error!(bind = %self.config.bind, error = %err, "failed to start ingestion service");
                    self.set_state(ServiceState::Stopped);
                    return Err(err.into());
                }
            };
        let local_addr = socket.local_addr();

        let listener = Listener {
            socket: socket.clone(),
            processor: self.processor.clone(),
            running: self.running.clone(),
            state: self.state.clone(),
            max_datagram: self.config.max_datagram.max(1),
        };

        self.running.store(true, Ordering::SeqCst);
        self.set_state(ServiceState::Listening);

        let spawned = thread::Builder::new()
            .name(LISTENER_THREAD_NAME.to_string())
            .spawn(move || listener.run());
        match spawned {
            Ok(handle) => {
                self.listener = Some(handle);
                self.socket = Some(socket);
            }
            Err(err) => {
                self.running.store(false, Ordering::SeqCst);
                self.set_state(ServiceState::Stopped);
                error!(error = %err, "failed to spawn ingestion listener");
                return Err(IngestError::Spawn(err));
            }
        }

        info!(%local_addr, "telemetry ingestion started");
        Ok(local_addr)
    }

    /// Stop receiving and release the port. No-op when already stopped.
    pub fn stop(&mut self) {
        let Some(handle) = self.listener.take() else {
            self.socket = None;
            self.set_state(ServiceState::Stopped);
            return;
        };

        self.set_state(ServiceState::Stopping);
        self.running.store(false, Ordering::SeqCst);
        if let Some(socket) = self.socket.take() {
            socket.shutdown();
        }
        if handle.join().is_err() {
            error!("ingestion listener thread panicked");
        }

        self.set_state(ServiceState::Stopped);
        info!("telemetry ingestion stopped");
    }

    fn reap(&mut self) {
        self.socket = None;
        if let Some(handle) = self.listener.take() {
            if handle.join().is_err() {
                error!("ingestion listener thread panicked");
            }
        }
    }

    fn set_state(&self, state: ServiceState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}

impl fmt::Debug for IngestService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestService")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("local_addr", &self.local_addr())
            .finish_non_exhaustive()
    }
}

impl Drop for IngestService {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Listener {
    socket: Arc<DatagramSocket>,
    processor: DatagramProcessor,
    running: Arc<AtomicBool>,
    state: Arc<AtomicU8>,
    max_datagram: usize,
}

impl Listener {
    fn run(self) {
        let mut buf = vec![0u8; self.max_datagram];

        loop {
            let received = self.socket.recv(&mut buf);
            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            match received {
                Ok(Received::TimedOut) => continue,
                Ok(Received::Datagram { len, from }) => {
                    let datagram = &buf[..len];
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        self.processor.process(datagram, Some(from))
                    }));
                    if let Err(payload) = outcome {
                        error!(
                            peer = %from,
                            panic = panic_message(payload.as_ref()),
                            "datagram processing panicked"
                        );
                    }
                }
                Err(err) => {
                    error!(error = %err, "udp receive failed, stopping ingestion");
                    self.running.store(false, Ordering::SeqCst);
                    self.state
                        .store(ServiceState::Stopped as u8, Ordering::SeqCst);
                    break;
                }
            }
        }

        debug!(local_addr = %self.socket.local_addr(), "ingestion listener exiting");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::memory::MemoryStore;

    fn loopback_config() -> IngestConfig {
        IngestConfig::new("127.0.0.1:0".parse().unwrap())
            .with_recv_timeout(Duration::from_millis(200))
    }

    #[test]
    fn state_round_trips_through_u8() {
        for state in [
            ServiceState::Stopped,
            ServiceState::Starting,
            ServiceState::Listening,
            ServiceState::Stopping,
        ] {
            assert_eq!(ServiceState::from_u8(state as u8), state);
        }
        assert_eq!(ServiceState::from_u8(200), ServiceState::Stopped);
        assert_eq!(ServiceState::Listening.to_string(), "listening");
    }

    #[test]
    fn new_service_is_stopped() {
        let service = IngestService::new(loopback_config(), Arc::new(MemoryStore::new()));
        assert_eq!(service.state(), ServiceState::Stopped);
        assert!(!service.is_running());
        assert!(service.local_addr().is_none());
    }

    #[test]
    fn stop_without_start_is_noop() {
        let mut service = IngestService::new(loopback_config(), Arc::new(MemoryStore::new()));
        service.stop();
        service.stop();
        assert_eq!(service.state(), ServiceState::Stopped);
    }

    #[test]
    fn start_then_stop() {
        let mut service = IngestService::new(loopback_config(), Arc::new(MemoryStore::new()));
        let addr = service.start().expect("loopback bind should succeed");
        assert_ne!(addr.port(), 0);
        assert_eq!(service.state(), ServiceState::Listening);
        assert_eq!(service.local_addr(), Some(addr));

        service.stop();
        assert_eq!(service.state(), ServiceState::Stopped);
        assert!(service.local_addr().is_none());
    }
}
