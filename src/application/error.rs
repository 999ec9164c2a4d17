use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::{AccountId, Currency};
use crate::rates::RateError;
use crate::storage::StoreError;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Unknown account: {0}")]
    UnknownAccount(AccountId),

    #[error("Unknown source account: {0}")]
    UnknownSourceAccount(AccountId),

    #[error("Unknown target account: {0}")]
    UnknownTargetAccount(AccountId),

    #[error("Account already exists: {0}")]
    AccountAlreadyExists(AccountId),

    #[error("Target account must not be equal to source account")]
    AccountsAreEqual,

    #[error("Insufficient funds on account {account}: balance {balance}, required {required}")]
    InsufficientFunds {
        account: AccountId,
        balance: Decimal,
        required: Decimal,
    },

    #[error("Can not store payments: {0}")]
    StorePayments(#[source] StoreError),

    #[error("Rate unavailable for currency {currency}")]
    RateUnavailable {
        currency: Currency,
        #[source]
        source: RateError,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

/// Coarse failure class, for adapters that have to map a [`LedgerError`]
/// onto a wire status. The classification is part of the service contract:
/// the same store state and request always classify the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced account or payment does not exist.
    NotFound,
    /// The request contradicts itself, such as a self-transfer.
    NotAcceptable,
    /// The request cannot be satisfied as stated.
    BadRequest,
    /// Creation collided with an existing id.
    Conflict,
    /// Storage or collaborator failure.
    Internal,
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::UnknownAccount(_)
            | LedgerError::UnknownSourceAccount(_)
            | LedgerError::UnknownTargetAccount(_) => ErrorKind::NotFound,
            LedgerError::AccountsAreEqual => ErrorKind::NotAcceptable,
            LedgerError::InsufficientFunds { .. } | LedgerError::InvalidArgument(_) => {
                ErrorKind::BadRequest
            }
            LedgerError::AccountAlreadyExists(_) => ErrorKind::Conflict,
            LedgerError::StorePayments(_)
            | LedgerError::RateUnavailable { .. }
            | LedgerError::Storage(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            LedgerError::UnknownSourceAccount("a".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            LedgerError::UnknownTargetAccount("b".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(LedgerError::AccountsAreEqual.kind(), ErrorKind::NotAcceptable);
        assert_eq!(
            LedgerError::InsufficientFunds {
                account: "a".into(),
                balance: Decimal::ZERO,
                required: Decimal::ONE,
            }
            .kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(
            LedgerError::InvalidArgument("amount".into()).kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(
            LedgerError::AccountAlreadyExists("a".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            LedgerError::Storage(StoreError::NotFound).kind(),
            ErrorKind::Internal
        );
    }
}
