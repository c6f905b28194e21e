//! utils.rs
//!
//! Small shared helpers: process identifiers and clock readings.

pub mod process_id;
pub use process_id::ProcessId;

pub mod time;
