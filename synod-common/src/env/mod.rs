pub mod ballot;
pub mod membership;
pub mod message;
pub mod value;
