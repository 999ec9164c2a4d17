use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Caller-assigned account identifier. Opaque to the ledger: any non-empty
/// string the caller picks. Ordered so multi-account lock acquisition can
/// use a fixed lexical order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ISO-style currency code, normalized to uppercase. USD is the base
/// currency: balances convert relative to it and it is the default for
/// accounts created without an explicit currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    pub const BASE_CODE: &'static str = "USD";

    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    pub fn usd() -> Self {
        Self(Self::BASE_CODE.to_string())
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn is_base(&self) -> bool {
        self.0 == Self::BASE_CODE
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An account holds a balance in a single currency. Identity fields are
/// fixed at creation; only `balance` and `deleted` ever change afterwards.
/// Deletion is a soft flag: deleted accounts stay stored but are invisible
/// to reads and unusable for transfers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub country: String,
    pub city: String,
    pub currency: Currency,
    pub balance: Decimal,
    pub deleted: bool,
}

impl Account {
    /// Create an account. Omitting the currency defaults it to USD.
    pub fn new(
        id: AccountId,
        country: impl Into<String>,
        city: impl Into<String>,
        currency: Option<Currency>,
        balance: Decimal,
    ) -> Self {
        Self {
            id,
            country: country.into(),
            city: city.into(),
            currency: currency.unwrap_or_else(Currency::usd),
            balance,
            deleted: false,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_defaults_to_usd() {
        let account = Account::new("alice".into(), "US", "New York", None, Decimal::ZERO);
        assert_eq!(account.currency, Currency::usd());
        assert!(account.currency.is_base());
    }

    #[test]
    fn test_explicit_currency_is_kept() {
        let account = Account::new(
            "bob".into(),
            "DE",
            "Berlin",
            Some(Currency::new("EUR")),
            Decimal::ZERO,
        );
        assert_eq!(account.currency.code(), "EUR");
        assert!(!account.currency.is_base());
    }

    #[test]
    fn test_currency_code_is_uppercased() {
        assert_eq!(Currency::new("eur").code(), "EUR");
    }

    #[test]
    fn test_new_account_is_not_deleted() {
        let account = Account::new("carol".into(), "UK", "London", None, Decimal::ONE);
        assert!(!account.is_deleted());
    }

    #[test]
    fn test_account_ids_order_lexically() {
        let a = AccountId::new("alice");
        let b = AccountId::new("bob");
        assert!(a < b);
    }
}
