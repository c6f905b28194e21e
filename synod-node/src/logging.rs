use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use synod_common::{Result, SynodError};

/// Target of the protocol event log (`EVENT:PROPOSE`, `EVENT:DECIDE`, ...).
pub const CONSENSUS_TARGET: &str = "consensus";

pub const DEFAULT_FILTER: &str = "info,synod_node=debug";

/// Installs two layers: protocol events go to `<log_dir>/consensus.log`,
/// everything else to stdout under `RUST_LOG`.
///
/// The returned guard flushes the file writer and must outlive the run.
pub fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::never(log_dir, "consensus.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let consensus_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(filter_fn(|metadata| metadata.target() == CONSENSUS_TARGET));

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with_filter(filter_fn(|metadata| metadata.target() != CONSENSUS_TARGET));

    tracing_subscriber::registry()
        .with(consensus_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(|e| SynodError::Other(format!("tracing already initialized: {}", e)))?;

    Ok(guard)
}

/// Writes panics to `<log_dir>/panic.log` as well as stderr.
pub fn install_panic_hook(log_dir: &Path) {
    let panic_log = log_dir.join("panic.log");
    std::panic::set_hook(Box::new(move |info| {
        let msg = match info.payload().downcast_ref::<&'static str>() {
            Some(s) => *s,
            None => match info.payload().downcast_ref::<String>() {
                Some(s) => &s[..],
                None => "Box<Any>",
            },
        };
        let location = match info.location() {
            Some(l) => format!("at {}:{}:{}", l.file(), l.line(), l.column()),
            None => "unknown location".to_string(),
        };
        let err_msg = format!("CRASH: {} {}\n", msg, location);
        eprintln!("{}", err_msg);
        let _ = std::fs::write(&panic_log, err_msg);
    }));
}
