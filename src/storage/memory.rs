use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::OwnedMutexGuard;

use crate::domain::{Account, AccountId, Payment, PaymentId};

use super::{AccountStore, LedgerStore, LedgerTx, PaymentStore, StoreError};

fn poisoned() -> StoreError {
    StoreError::Backend(anyhow::anyhow!("lock poisoned"))
}

/// Volatile ledger store backed by keyed maps. State lives as long as the
/// process; intended for tests and ephemeral setups.
///
/// Units of work take one async mutex per account id, always in lexical
/// order, so overlapping transfers on the same accounts serialize instead of
/// deadlocking. The collection locks are only held for the duration of a
/// single read or commit, never across an await.
#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<AccountId, Account>>,
    payments: RwLock<HashMap<PaymentId, Payment>>,
    /// Lazily created per-account locks handed out to units of work.
    locks: Mutex<HashMap<AccountId, Arc<tokio::sync::Mutex<()>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn insert(&self, account: Account) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;
        if accounts.contains_key(&account.id) {
            return Err(StoreError::AlreadyExists(account.id));
        }
        accounts.insert(account.id.clone(), account);
        Ok(())
    }

    async fn find(&self, id: &AccountId) -> Result<Account, StoreError> {
        let accounts = self.accounts.read().map_err(|_| poisoned())?;
        accounts
            .get(id)
            .filter(|a| !a.deleted)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_all(&self) -> Result<Vec<Account>, StoreError> {
        let accounts = self.accounts.read().map_err(|_| poisoned())?;
        Ok(accounts.values().filter(|a| !a.deleted).cloned().collect())
    }

    async fn mark_deleted(&self, id: &AccountId) -> Result<(), StoreError> {
        // Deletion mutates an existing account, so it takes the account's
        // lock like a unit of work would. A delete can never land inside an
        // open unit of work and be overwritten by its commit; the deleted
        // flag stays terminal.
        let handle = {
            let mut locks = self.locks.lock().map_err(|_| poisoned())?;
            Arc::clone(locks.entry(id.clone()).or_default())
        };
        let _guard = handle.lock_owned().await;

        let mut accounts = self.accounts.write().map_err(|_| poisoned())?;
        match accounts.get_mut(id) {
            Some(account) if !account.deleted => {
                account.deleted = true;
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn payments_for(&self, account: &AccountId) -> Result<Vec<Payment>, StoreError> {
        let payments = self.payments.read().map_err(|_| poisoned())?;
        Ok(payments
            .values()
            .filter(|p| !p.deleted && &p.account == account)
            .cloned()
            .collect())
    }

    async fn all_payments(&self) -> Result<Vec<Payment>, StoreError> {
        let payments = self.payments.read().map_err(|_| poisoned())?;
        Ok(payments.values().filter(|p| !p.deleted).cloned().collect())
    }

    async fn mark_payment_deleted(&self, id: PaymentId) -> Result<(), StoreError> {
        let mut payments = self.payments.write().map_err(|_| poisoned())?;
        match payments.get_mut(&id) {
            Some(payment) if !payment.deleted => {
                payment.deleted = true;
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn begin<'a>(&'a self, ids: &[AccountId]) -> Result<Box<dyn LedgerTx + 'a>, StoreError> {
        // Dedup and sort before acquiring: one global lock order means two
        // units of work over the same pair cannot deadlock.
        let mut scope: Vec<AccountId> = ids.to_vec();
        scope.sort();
        scope.dedup();

        let handles: Vec<Arc<tokio::sync::Mutex<()>>> = {
            let mut locks = self.locks.lock().map_err(|_| poisoned())?;
            scope
                .iter()
                .map(|id| Arc::clone(locks.entry(id.clone()).or_default()))
                .collect()
        };

        let mut guards = Vec::with_capacity(handles.len());
        for handle in handles {
            guards.push(handle.lock_owned().await);
        }

        Ok(Box::new(MemoryTx {
            store: self,
            scope,
            staged_accounts: HashMap::new(),
            staged_payments: Vec::new(),
            _guards: guards,
        }))
    }
}

/// Unit of work over [`MemoryStore`]. Mutates working copies; the live maps
/// change only in `commit`, under the collection write locks, so readers
/// observe all of a transfer's effects or none of them.
struct MemoryTx<'a> {
    store: &'a MemoryStore,
    scope: Vec<AccountId>,
    staged_accounts: HashMap<AccountId, Account>,
    staged_payments: Vec<Payment>,
    /// Exclusive sections for the scoped accounts, held until drop.
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl MemoryTx<'_> {
    /// Working copy for `id`, loaded from the live map on first touch.
    fn staged(&mut self, id: &AccountId) -> Result<&mut Account, StoreError> {
        if !self.scope.contains(id) {
            return Err(StoreError::NotInScope(id.clone()));
        }
        match self.staged_accounts.entry(id.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let accounts = self.store.accounts.read().map_err(|_| poisoned())?;
                let account = accounts
                    .get(id)
                    .filter(|a| !a.deleted)
                    .cloned()
                    .ok_or(StoreError::NotFound)?;
                Ok(entry.insert(account))
            }
        }
    }
}

#[async_trait]
impl LedgerTx for MemoryTx<'_> {
    async fn account(&mut self, id: &AccountId) -> Result<Account, StoreError> {
        self.staged(id).map(|account| account.clone())
    }

    async fn apply_delta(
        &mut self,
        id: &AccountId,
        delta: Decimal,
    ) -> Result<Account, StoreError> {
        let account = self.staged(id)?;
        account.balance = account
            .balance
            .checked_add(delta)
            .ok_or_else(|| StoreError::Backend(anyhow::anyhow!("balance overflow")))?;
        Ok(account.clone())
    }

    async fn insert_payments(&mut self, payments: &[Payment]) -> Result<(), StoreError> {
        self.staged_payments.extend_from_slice(payments);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let tx = *self;
        let mut accounts = tx.store.accounts.write().map_err(|_| poisoned())?;
        let mut payments = tx.store.payments.write().map_err(|_| poisoned())?;
        for (id, account) in tx.staged_accounts {
            accounts.insert(id, account);
        }
        for payment in tx.staged_payments {
            payments.insert(payment.id, payment);
        }
        Ok(())
    }
}
