use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AccountId;

pub type PaymentId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Incoming => "incoming",
            Direction::Outgoing => "outgoing",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "incoming" => Some(Direction::Incoming),
            "outgoing" => Some(Direction::Outgoing),
            _ => None,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A payment records one leg of a money movement on the account that owns
/// it. Amounts are always non-negative; `direction` carries the sign. A
/// transfer produces two payments (outgoing on the source, incoming on the
/// destination); a deposit produces a single incoming payment whose
/// `from_account` points back at the owner. Exactly one of `to_account` /
/// `from_account` is set, matching the direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    /// Owning account. Listing payments for an account matches this field.
    pub account: AccountId,
    pub amount: Decimal,
    /// Destination, set on outgoing payments only.
    pub to_account: Option<AccountId>,
    /// Origin, set on incoming payments only.
    pub from_account: Option<AccountId>,
    pub direction: Direction,
    pub deleted: bool,
}

impl Payment {
    /// Mint the outgoing leg of a transfer: `account` pays `to`.
    pub fn outgoing(account: AccountId, amount: Decimal, to: AccountId) -> Self {
        assert!(
            amount >= Decimal::ZERO,
            "Payment amount must not be negative"
        );
        Self {
            id: Uuid::new_v4(),
            account,
            amount,
            to_account: Some(to),
            from_account: None,
            direction: Direction::Outgoing,
            deleted: false,
        }
    }

    /// Mint the incoming leg of a transfer: `account` is paid by `from`.
    /// A deposit is the self-referential case, `from == account`.
    pub fn incoming(account: AccountId, amount: Decimal, from: AccountId) -> Self {
        assert!(
            amount >= Decimal::ZERO,
            "Payment amount must not be negative"
        );
        Self {
            id: Uuid::new_v4(),
            account,
            amount,
            to_account: None,
            from_account: Some(from),
            direction: Direction::Incoming,
            deleted: false,
        }
    }

    /// The other account involved, whichever side it is on.
    pub fn counterparty(&self) -> Option<&AccountId> {
        self.to_account.as_ref().or(self.from_account.as_ref())
    }

    /// True for incoming payments an account made to itself (deposits).
    pub fn is_deposit(&self) -> bool {
        self.direction == Direction::Incoming && self.from_account.as_ref() == Some(&self.account)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}
