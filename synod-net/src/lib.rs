pub mod codec;
pub mod config;
pub mod error;
pub mod in_memory;
pub mod ports;

pub use config::LinkConfig;
pub use error::NetworkError;
pub use in_memory::InMemoryNetwork;
pub use ports::Transport;
