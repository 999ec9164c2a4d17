// Application layer - the ledger's use cases over pluggable storage.

pub mod error;
pub mod service;

pub use error::*;
pub use service::*;
