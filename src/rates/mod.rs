//! Currency conversion rates relative to USD. The ledger consults a
//! [`RateProvider`] whenever a payment leg lands on a non-USD account; a
//! provider failure is a typed error, never a silent fallback factor.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::Currency;

/// Which day's rate to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDate {
    Latest,
    On(NaiveDate),
}

impl RateDate {
    fn path_segment(&self) -> String {
        match self {
            RateDate::Latest => "latest".to_string(),
            RateDate::On(date) => date.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum RateError {
    #[error("rate service request failed")]
    Http(#[from] reqwest::Error),

    #[error("rate service returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("no rate for currency {0}")]
    MissingRate(Currency),

    #[error("unusable rate {factor} for currency {currency}")]
    InvalidRate { currency: Currency, factor: Decimal },

    #[error("no fixed rate configured for currency {0}")]
    UnsupportedCurrency(Currency),
}

/// Source of conversion factors from USD into other currencies.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Factor that converts a USD amount into `currency` at `date`. The
    /// base currency always resolves to exactly one.
    async fn rate(&self, currency: &Currency, date: RateDate) -> Result<Decimal, RateError>;
}

#[async_trait]
impl<P> RateProvider for Arc<P>
where
    P: RateProvider + ?Sized,
{
    async fn rate(&self, currency: &Currency, date: RateDate) -> Result<Decimal, RateError> {
        (**self).rate(currency, date).await
    }
}

/// Static rate table. Serves as the offline default and as the provider in
/// tests; only currencies added via [`FixedRates::with_rate`] resolve.
#[derive(Debug, Clone, Default)]
pub struct FixedRates {
    rates: HashMap<String, Decimal>,
}

impl FixedRates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, currency: Currency, factor: Decimal) -> Self {
        self.rates.insert(currency.code().to_string(), factor);
        self
    }
}

#[async_trait]
impl RateProvider for FixedRates {
    async fn rate(&self, currency: &Currency, _date: RateDate) -> Result<Decimal, RateError> {
        if currency.is_base() {
            return Ok(Decimal::ONE);
        }
        let factor = self
            .rates
            .get(currency.code())
            .copied()
            .ok_or_else(|| RateError::UnsupportedCurrency(currency.clone()))?;
        if factor <= Decimal::ZERO {
            return Err(RateError::InvalidRate {
                currency: currency.clone(),
                factor,
            });
        }
        Ok(factor)
    }
}

/// Default bound on a single rate request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, Decimal>,
}

/// HTTP rate provider. Expects an exchangeratesapi-style endpoint:
/// `GET {base_url}/{latest|YYYY-MM-DD}?base=USD&symbols=EUR` answering
/// `{"rates": {"EUR": 0.89}}`.
pub struct HttpRates {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRates {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RateError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Requests are bounded: a stalled rate service fails the call instead
    /// of stalling the transfer that asked for it.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RateError> {
        let base_url = base_url.into();
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RateProvider for HttpRates {
    async fn rate(&self, currency: &Currency, date: RateDate) -> Result<Decimal, RateError> {
        if currency.is_base() {
            return Ok(Decimal::ONE);
        }

        let url = format!(
            "{}/{}?base={}&symbols={}",
            self.base_url,
            date.path_segment(),
            Currency::BASE_CODE,
            currency.code()
        );

        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(RateError::Status(resp.status()));
        }

        let body: RatesResponse = resp.json().await?;
        let factor = body
            .rates
            .get(currency.code())
            .copied()
            .ok_or_else(|| RateError::MissingRate(currency.clone()))?;

        if factor <= Decimal::ZERO {
            return Err(RateError::InvalidRate {
                currency: currency.clone(),
                factor,
            });
        }
        Ok(factor)
    }
}
