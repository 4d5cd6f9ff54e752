use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use satlink_frame::Frame;
use satlink_health::Alert;
use satlink_ingest::{IngestConfig, IngestService, MemoryStore};
use tracing::info;

use crate::cmd::ListenArgs;
use crate::exit::{ingest_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS};
use crate::output::{print_frame, OutputFormat};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let printed = Arc::new(AtomicUsize::new(0));
    let observer = {
        let running = running.clone();
        let printed = printed.clone();
        let count = args.count;
        move |frame: &Frame, alerts: &[Alert]| {
            print_frame(frame, alerts, format);
            let seen = printed.fetch_add(1, Ordering::SeqCst).saturating_add(1);
            if count.is_some_and(|count| seen >= count) {
                running.store(false, Ordering::SeqCst);
            }
            Ok(())
        }
    };

    let store = Arc::new(MemoryStore::new());
    let config = IngestConfig::new(SocketAddr::new(args.host, args.port));
    let mut service = IngestService::new(config, store.clone()).with_observer_fn(observer);
    service
        .start()
        .map_err(|err| ingest_error("listen failed", err))?;

    while running.load(Ordering::SeqCst) && service.is_running() {
        thread::sleep(POLL_INTERVAL);
    }
    let interrupted = !running.load(Ordering::SeqCst);
    service.stop();

    let stats = service.stats();
    info!(
        received = stats.received,
        decoded = stats.decoded,
        rejected = stats.rejected,
        alerts = stats.alerts_raised,
        stored = store.telemetry_count(),
        "listener finished"
    );

    if interrupted {
        Ok(SUCCESS)
    } else {
        Err(CliError::new(FAILURE, "listener stopped on a socket error"))
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
