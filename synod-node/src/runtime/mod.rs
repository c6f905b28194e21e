pub mod bench;
pub mod coordinator;
pub mod sink;
