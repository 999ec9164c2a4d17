use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::domain::{Account, AccountId, Currency, Payment};
use crate::rates::{RateDate, RateProvider};
use crate::storage::{LedgerStore, StoreError};

use super::LedgerError;

/// Application service providing the ledger's business operations. This is
/// the primary interface for any client (CLI, API, tests) and works over
/// any [`LedgerStore`]. Stores persist state and keep concurrent mutations
/// exclusive; every business decision (validation, sufficiency, pairing,
/// balance deltas) is made here.
pub struct LedgerService<S, R> {
    store: S,
    rates: R,
}

/// Both payment records minted by a transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub outgoing: Payment,
    pub incoming: Payment,
}

fn unknown_account(err: StoreError, id: &AccountId) -> LedgerError {
    match err {
        StoreError::NotFound => LedgerError::UnknownAccount(id.clone()),
        other => LedgerError::Storage(other),
    }
}

fn unknown_source(err: StoreError, id: &AccountId) -> LedgerError {
    match err {
        StoreError::NotFound => LedgerError::UnknownSourceAccount(id.clone()),
        other => LedgerError::Storage(other),
    }
}

fn unknown_target(err: StoreError, id: &AccountId) -> LedgerError {
    match err {
        StoreError::NotFound => LedgerError::UnknownTargetAccount(id.clone()),
        other => LedgerError::Storage(other),
    }
}

impl<S: LedgerStore, R: RateProvider> LedgerService<S, R> {
    /// Create a ledger service over the given store and rate provider.
    pub fn new(store: S, rates: R) -> Self {
        Self { store, rates }
    }

    // ========================
    // Account operations
    // ========================

    /// Create an account. Ids are caller-assigned; creating one that
    /// already exists fails, it never overwrites. A missing currency
    /// defaults to USD.
    pub async fn create_account(
        &self,
        id: AccountId,
        country: impl Into<String>,
        city: impl Into<String>,
        currency: Option<Currency>,
        balance: Decimal,
    ) -> Result<Account, LedgerError> {
        let account = Account::new(id, country, city, currency, balance);
        match self.store.insert(account.clone()).await {
            Ok(()) => {
                debug!(account = %account.id, "account created");
                Ok(account)
            }
            Err(StoreError::AlreadyExists(id)) => Err(LedgerError::AccountAlreadyExists(id)),
            Err(err) => Err(err.into()),
        }
    }

    /// Get a live account by id.
    pub async fn account(&self, id: &AccountId) -> Result<Account, LedgerError> {
        self.store
            .find(id)
            .await
            .map_err(|err| unknown_account(err, id))
    }

    /// List all live accounts.
    pub async fn list_accounts(&self) -> Result<Vec<Account>, LedgerError> {
        Ok(self.store.find_all().await?)
    }

    /// Soft-delete an account. The flag is terminal: deleting an already
    /// deleted account fails like a missing one.
    pub async fn delete_account(&self, id: &AccountId) -> Result<(), LedgerError> {
        self.store
            .mark_deleted(id)
            .await
            .map_err(|err| unknown_account(err, id))?;
        debug!(account = %id, "account deleted");
        Ok(())
    }

    // ========================
    // Payment operations
    // ========================

    /// Move `amount` from one account to another. Mints the outgoing and
    /// incoming records and applies both balance changes in a single unit
    /// of work: other callers observe both effects or neither, and any
    /// failure leaves no trace.
    #[instrument(skip(self))]
    pub async fn transfer(
        &self,
        from: &AccountId,
        amount: Decimal,
        to: &AccountId,
    ) -> Result<TransferReceipt, LedgerError> {
        // The self-transfer check comes first: it wins over any amount
        // problem, whatever the amount is.
        if from == to {
            return Err(LedgerError::AccountsAreEqual);
        }

        // Validate amount
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidArgument(
                "Amount must be positive".to_string(),
            ));
        }

        // Resolve both accounts up front to learn their currencies.
        let source = self
            .store
            .find(from)
            .await
            .map_err(|err| unknown_source(err, from))?;
        let target = self
            .store
            .find(to)
            .await
            .map_err(|err| unknown_target(err, to))?;

        // Each leg converts independently into its account's currency.
        // Currencies never change after creation, so the factors can be
        // fetched before the exclusive section: no network wait happens
        // while the accounts are locked.
        let debit = self.converted(amount, &source.currency).await?;
        let credit = self.converted(amount, &target.currency).await?;

        let mut tx = self.store.begin(&[from.clone(), to.clone()]).await?;

        // Re-read under exclusivity; either account may have been deleted
        // since the pre-read.
        let source = tx
            .account(from)
            .await
            .map_err(|err| unknown_source(err, from))?;
        tx.account(to)
            .await
            .map_err(|err| unknown_target(err, to))?;

        // Sufficiency is decided before anything is staged.
        if source.balance < debit {
            return Err(LedgerError::InsufficientFunds {
                account: from.clone(),
                balance: source.balance,
                required: debit,
            });
        }

        let outgoing = Payment::outgoing(from.clone(), debit, to.clone());
        let incoming = Payment::incoming(to.clone(), credit, from.clone());

        let pair = [outgoing.clone(), incoming.clone()];
        tx.insert_payments(&pair)
            .await
            .map_err(LedgerError::StorePayments)?;
        tx.apply_delta(from, -debit)
            .await
            .map_err(LedgerError::StorePayments)?;
        tx.apply_delta(to, credit)
            .await
            .map_err(LedgerError::StorePayments)?;
        tx.commit().await.map_err(LedgerError::StorePayments)?;

        debug!(outgoing = %outgoing.id, incoming = %incoming.id, "transfer recorded");
        Ok(TransferReceipt { outgoing, incoming })
    }

    /// Add `amount` to an account from outside the system. Mints a single
    /// incoming record whose origin is the account itself.
    #[instrument(skip(self))]
    pub async fn deposit(
        &self,
        account: &AccountId,
        amount: Decimal,
    ) -> Result<Payment, LedgerError> {
        // Validate amount
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidArgument(
                "Amount must be positive".to_string(),
            ));
        }

        let owner = self
            .store
            .find(account)
            .await
            .map_err(|err| unknown_source(err, account))?;
        let credit = self.converted(amount, &owner.currency).await?;

        let mut tx = self.store.begin(std::slice::from_ref(account)).await?;
        tx.account(account)
            .await
            .map_err(|err| unknown_source(err, account))?;

        let payment = Payment::incoming(account.clone(), credit, account.clone());
        let staged = [payment.clone()];
        tx.insert_payments(&staged)
            .await
            .map_err(LedgerError::StorePayments)?;
        tx.apply_delta(account, credit)
            .await
            .map_err(LedgerError::StorePayments)?;
        tx.commit().await.map_err(LedgerError::StorePayments)?;

        debug!(payment = %payment.id, "deposit recorded");
        Ok(payment)
    }

    /// Live payment records owned by an account. An unknown id yields an
    /// empty list; listing has no business failure of its own.
    pub async fn payments(&self, account: &AccountId) -> Result<Vec<Payment>, LedgerError> {
        Ok(self.store.payments_for(account).await?)
    }

    /// All live payment records in the system.
    pub async fn all_payments(&self) -> Result<Vec<Payment>, LedgerError> {
        Ok(self.store.all_payments().await?)
    }

    /// Convert a requested amount into the account currency. USD passes
    /// through untouched; anything else needs a live rate.
    async fn converted(&self, amount: Decimal, currency: &Currency) -> Result<Decimal, LedgerError> {
        if currency.is_base() {
            return Ok(amount);
        }
        let factor = self
            .rates
            .rate(currency, RateDate::Latest)
            .await
            .map_err(|source| LedgerError::RateUnavailable {
                currency: currency.clone(),
                source,
            })?;
        amount
            .checked_mul(factor)
            .ok_or_else(|| LedgerError::InvalidArgument("Amount out of range".to_string()))
    }
}
