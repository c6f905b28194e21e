pub mod cli;
pub mod config;
pub mod logging;
pub mod runtime;

pub use config::{BenchConfig, ExperimentConfig};
pub use runtime::coordinator::{Coordinator, RunReport};
pub use runtime::sink::ResultSink;

/// Value type the experiment harness agrees on.
pub type Value = u8;
