//! Storage contracts for the ledger. Two implementations ship: an
//! in-memory store for tests and ephemeral use, and a SQLite store for
//! durable data. Both expose the same traits, so the service layer never
//! knows which one it is driving.

mod memory;
mod sqlite;

pub use memory::*;
pub use sqlite::*;

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::{Account, AccountId, Payment, PaymentId};

/// SQL migration for initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity absent or soft-deleted. Shared by accounts and payments.
    #[error("record not found")]
    NotFound,

    #[error("account {0} already exists")]
    AlreadyExists(AccountId),

    /// A unit of work touched an account it was not begun over.
    #[error("account {0} is outside this unit of work")]
    NotInScope(AccountId),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Account persistence. Stores hold state and keep it consistent; business
/// decisions (sufficiency, direction, pairing) belong to the service layer.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert if absent. Fails with `AlreadyExists` when the id is taken,
    /// including by a soft-deleted account.
    async fn insert(&self, account: Account) -> Result<(), StoreError>;

    /// Fetch a live account. Soft-deleted accounts read as `NotFound`.
    async fn find(&self, id: &AccountId) -> Result<Account, StoreError>;

    /// Snapshot of all live accounts, order unspecified.
    async fn find_all(&self) -> Result<Vec<Account>, StoreError>;

    /// Soft-delete. Not idempotent: deleting an absent or already-deleted
    /// account fails with `NotFound`.
    async fn mark_deleted(&self, id: &AccountId) -> Result<(), StoreError>;
}

/// Payment persistence. Payments are written only through a unit of work;
/// this trait covers reads and the soft-delete flag.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Live payments owned by the account. An unknown account yields an
    /// empty list, not an error.
    async fn payments_for(&self, account: &AccountId) -> Result<Vec<Payment>, StoreError>;

    async fn all_payments(&self) -> Result<Vec<Payment>, StoreError>;

    /// Soft-delete a payment record. Not idempotent, like account deletion.
    async fn mark_payment_deleted(&self, id: PaymentId) -> Result<(), StoreError>;
}

/// Full ledger storage: both stores plus the transactional scope that
/// makes a transfer atomic.
#[async_trait]
pub trait LedgerStore: AccountStore + PaymentStore {
    /// Open an exclusive unit of work over the given account ids. While it
    /// lives, no other unit of work can mutate those accounts.
    async fn begin<'a>(&'a self, ids: &[AccountId]) -> Result<Box<dyn LedgerTx + 'a>, StoreError>;
}

/// A unit of work. Effects are staged; nothing is visible to other callers
/// until `commit`. Dropping without committing discards every staged
/// effect.
#[async_trait]
pub trait LedgerTx: Send {
    /// Read an account inside the exclusive section.
    async fn account(&mut self, id: &AccountId) -> Result<Account, StoreError>;

    /// Stage a signed balance change and return the post-delta state.
    async fn apply_delta(&mut self, id: &AccountId, delta: Decimal)
    -> Result<Account, StoreError>;

    /// Stage a batch of payment records. All or nothing at commit.
    async fn insert_payments(&mut self, payments: &[Payment]) -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
