use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::domain::{Account, AccountId, Currency, Direction, Payment, PaymentId};

use super::{
    AccountStore, LedgerStore, LedgerTx, MIGRATION_001_INITIAL, PaymentStore, StoreError,
};

/// Durable ledger store on SQLite.
///
/// The pool is capped at a single connection: SQLite allows one writer at a
/// time, and funneling every caller through one connection turns an open
/// transaction into the exclusive section the unit of work needs. Amounts
/// round-trip through TEXT columns as decimal strings; arithmetic never
/// happens in SQL.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Create a store with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to an existing SQLite database at the given path.
    pub async fn connect(database_path: &str) -> Result<Self, StoreError> {
        let db_url = format!("sqlite:{}", database_path);
        Self::connect_url(&db_url).await
    }

    /// Initialize a new database (create if missing + migrate).
    pub async fn init(database_path: &str) -> Result<Self, StoreError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let store = Self::connect_url(&db_url).await?;
        store.migrate().await?;
        Ok(store)
    }

    async fn connect_url(db_url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(db_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        Ok(())
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account, StoreError> {
        let balance_str: String = row.get("balance");

        Ok(Account {
            id: AccountId::new(row.get::<String, _>("id")),
            country: row.get("country"),
            city: row.get("city"),
            currency: Currency::new(row.get::<String, _>("currency")),
            balance: Decimal::from_str(&balance_str).context("Invalid balance")?,
            deleted: row.get::<i32, _>("deleted") != 0,
        })
    }

    fn row_to_payment(row: &sqlx::sqlite::SqliteRow) -> Result<Payment, StoreError> {
        let id_str: String = row.get("id");
        let amount_str: String = row.get("amount");
        let direction_str: String = row.get("direction");
        let to_account: Option<String> = row.get("to_account");
        let from_account: Option<String> = row.get("from_account");

        Ok(Payment {
            id: Uuid::parse_str(&id_str).context("Invalid payment ID")?,
            account: AccountId::new(row.get::<String, _>("account")),
            amount: Decimal::from_str(&amount_str).context("Invalid amount")?,
            to_account: to_account.map(AccountId::new),
            from_account: from_account.map(AccountId::new),
            direction: Direction::from_str(&direction_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid direction: {}", direction_str))?,
            deleted: row.get::<i32, _>("deleted") != 0,
        })
    }
}

// ========================
// Account operations
// ========================

#[async_trait]
impl AccountStore for SqliteStore {
    async fn insert(&self, account: Account) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (id, country, city, currency, balance, deleted)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(account.id.as_str())
        .bind(&account.country)
        .bind(&account.city)
        .bind(account.currency.code())
        .bind(account.balance.to_string())
        .bind(account.deleted)
        .execute(&self.pool)
        .await
        .context("Failed to insert account")?;

        // Zero affected rows means the id was already taken.
        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(account.id));
        }
        Ok(())
    }

    async fn find(&self, id: &AccountId) -> Result<Account, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, country, city, currency, balance, deleted
            FROM accounts
            WHERE id = ? AND deleted = 0
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account")?;

        match row {
            Some(row) => Self::row_to_account(&row),
            None => Err(StoreError::NotFound),
        }
    }

    async fn find_all(&self) -> Result<Vec<Account>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, country, city, currency, balance, deleted
            FROM accounts
            WHERE deleted = 0
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list accounts")?;

        rows.iter().map(Self::row_to_account).collect()
    }

    async fn mark_deleted(&self, id: &AccountId) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE accounts SET deleted = 1 WHERE id = ? AND deleted = 0")
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .context("Failed to delete account")?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

// ========================
// Payment operations
// ========================

#[async_trait]
impl PaymentStore for SqliteStore {
    async fn payments_for(&self, account: &AccountId) -> Result<Vec<Payment>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, account, amount, to_account, from_account, direction, deleted
            FROM payments
            WHERE account = ? AND deleted = 0
            "#,
        )
        .bind(account.as_str())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list payments for account")?;

        rows.iter().map(Self::row_to_payment).collect()
    }

    async fn all_payments(&self) -> Result<Vec<Payment>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, account, amount, to_account, from_account, direction, deleted
            FROM payments
            WHERE deleted = 0
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list payments")?;

        rows.iter().map(Self::row_to_payment).collect()
    }

    async fn mark_payment_deleted(&self, id: PaymentId) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE payments SET deleted = 1 WHERE id = ? AND deleted = 0")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete payment")?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

// ========================
// Unit of work
// ========================

#[async_trait]
impl LedgerStore for SqliteStore {
    async fn begin<'a>(&'a self, _ids: &[AccountId]) -> Result<Box<dyn LedgerTx + 'a>, StoreError> {
        // With a single pooled connection the transaction itself is the
        // exclusive section; overlapping units of work queue on acquire, so
        // the id list needs no per-account locking here.
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;
        Ok(Box::new(SqliteTx { tx }))
    }
}

/// Unit of work over [`SqliteStore`]. Dropping it without committing rolls
/// the transaction back.
struct SqliteTx {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl LedgerTx for SqliteTx {
    async fn account(&mut self, id: &AccountId) -> Result<Account, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, country, city, currency, balance, deleted
            FROM accounts
            WHERE id = ? AND deleted = 0
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to fetch account in transaction")?;

        match row {
            Some(row) => SqliteStore::row_to_account(&row),
            None => Err(StoreError::NotFound),
        }
    }

    async fn apply_delta(
        &mut self,
        id: &AccountId,
        delta: Decimal,
    ) -> Result<Account, StoreError> {
        let mut account = self.account(id).await?;
        account.balance = account
            .balance
            .checked_add(delta)
            .context("Balance overflow")?;

        sqlx::query("UPDATE accounts SET balance = ? WHERE id = ?")
            .bind(account.balance.to_string())
            .bind(id.as_str())
            .execute(&mut *self.tx)
            .await
            .context("Failed to update balance")?;

        Ok(account)
    }

    async fn insert_payments(&mut self, payments: &[Payment]) -> Result<(), StoreError> {
        for payment in payments {
            sqlx::query(
                r#"
                INSERT INTO payments (id, account, amount, to_account, from_account, direction, deleted)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(payment.id.to_string())
            .bind(payment.account.as_str())
            .bind(payment.amount.to_string())
            .bind(payment.to_account.as_ref().map(|id| id.to_string()))
            .bind(payment.from_account.as_ref().map(|id| id.to_string()))
            .bind(payment.direction.as_str())
            .bind(payment.deleted)
            .execute(&mut *self.tx)
            .await
            .context("Failed to insert payment")?;
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .context("Failed to commit transaction")?;
        Ok(())
    }
}
