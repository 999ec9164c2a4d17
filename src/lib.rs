pub mod application;
pub mod cli;
pub mod domain;
pub mod io;
pub mod rates;
pub mod storage;

pub use application::{ErrorKind, LedgerError, LedgerService, TransferReceipt};
pub use domain::*;
pub use rates::{FixedRates, HttpRates, RateProvider};
pub use storage::{LedgerStore, MemoryStore, SqliteStore, StoreError};
