use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::LedgerService;
use crate::domain::{Account, Payment};
use crate::rates::RateProvider;
use crate::storage::LedgerStore;

/// Full ledger snapshot for JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub accounts: Vec<Account>,
    pub payments: Vec<Payment>,
}

/// Exporter for converting ledger data to various formats
pub struct Exporter<'a, S, R> {
    service: &'a LedgerService<S, R>,
}

impl<'a, S: LedgerStore, R: RateProvider> Exporter<'a, S, R> {
    pub fn new(service: &'a LedgerService<S, R>) -> Self {
        Self { service }
    }

    /// Export payment records to CSV format
    pub async fn export_payments_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let payments = self.service.all_payments().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record([
            "id",
            "account",
            "amount",
            "direction",
            "to_account",
            "from_account",
        ])?;

        let mut count = 0;
        for payment in &payments {
            csv_writer.write_record([
                payment.id.to_string(),
                payment.account.to_string(),
                payment.amount.to_string(),
                payment.direction.to_string(),
                payment
                    .to_account
                    .as_ref()
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
                payment
                    .from_account
                    .as_ref()
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export accounts to CSV format
    pub async fn export_accounts_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let accounts = self.service.list_accounts().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record(["id", "country", "city", "currency", "balance"])?;

        let mut count = 0;
        for account in &accounts {
            csv_writer.write_record([
                account.id.to_string(),
                account.country.clone(),
                account.city.clone(),
                account.currency.to_string(),
                account.balance.to_string(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the full ledger as a JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<LedgerSnapshot> {
        let accounts = self.service.list_accounts().await?;
        let payments = self.service.all_payments().await?;

        let snapshot = LedgerSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            accounts,
            payments,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
