// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use pago::application::LedgerService;
use pago::domain::{AccountId, Currency};
use pago::rates::{FixedRates, RateProvider};
use pago::storage::{LedgerStore, MemoryStore, SqliteStore};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tempfile::TempDir;

/// Rates used throughout the tests: 1 USD buys 0.80 EUR or 0.70 GBP.
pub fn test_rates() -> FixedRates {
    FixedRates::new()
        .with_rate(Currency::new("EUR"), dec!(0.80))
        .with_rate(Currency::new("GBP"), dec!(0.70))
}

/// Service over the volatile in-memory store.
pub fn memory_service() -> LedgerService<MemoryStore, FixedRates> {
    LedgerService::new(MemoryStore::new(), test_rates())
}

/// Service over a fresh SQLite database in a temporary directory.
pub async fn sqlite_service() -> Result<(LedgerService<SqliteStore, FixedRates>, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let store = SqliteStore::init(db_path.to_str().unwrap()).await?;
    Ok((LedgerService::new(store, test_rates()), temp_dir))
}

/// A bare SQLite store in a temporary directory, for store-level tests.
pub async fn sqlite_store() -> Result<(SqliteStore, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let store = SqliteStore::init(db_path.to_str().unwrap()).await?;
    Ok((store, temp_dir))
}

/// Create a USD account with the given opening balance.
pub async fn create_usd_account<S: LedgerStore, R: RateProvider>(
    service: &LedgerService<S, R>,
    id: &str,
    balance: Decimal,
) -> Result<()> {
    service
        .create_account(AccountId::new(id), "US", "New York", None, balance)
        .await?;
    Ok(())
}

/// Create an account holding the given currency.
pub async fn create_account_in<S: LedgerStore, R: RateProvider>(
    service: &LedgerService<S, R>,
    id: &str,
    currency: &str,
    balance: Decimal,
) -> Result<()> {
    service
        .create_account(
            AccountId::new(id),
            "DE",
            "Berlin",
            Some(Currency::new(currency)),
            balance,
        )
        .await?;
    Ok(())
}

/// Current balance of an account.
pub async fn balance_of<S: LedgerStore, R: RateProvider>(
    service: &LedgerService<S, R>,
    id: &str,
) -> Result<Decimal> {
    Ok(service.account(&AccountId::new(id)).await?.balance)
}
