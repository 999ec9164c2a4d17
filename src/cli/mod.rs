use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

use crate::application::LedgerService;
use crate::domain::{AccountId, Currency};
use crate::rates::{FixedRates, HttpRates, RateProvider};
use crate::storage::SqliteStore;

type CliService = LedgerService<SqliteStore, Arc<dyn RateProvider>>;

/// Pago - Minimal Payment Ledger
#[derive(Parser)]
#[command(name = "pago")]
#[command(about = "A minimal payment ledger: accounts, transfers and deposits")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "pago.db")]
    pub database: String,

    /// Exchange rate service URL (exchangeratesapi-style endpoint)
    #[arg(long)]
    pub rates_url: Option<String>,

    /// Fixed exchange rate as CODE=FACTOR, e.g. EUR=0.89 (repeatable;
    /// used when no rates URL is set)
    #[arg(long = "rate")]
    pub rate: Vec<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Transfer money between two accounts
    Transfer {
        /// Amount to transfer (e.g., "50.00" or "50")
        amount: String,

        /// Source account id
        #[arg(long)]
        from: String,

        /// Destination account id
        #[arg(long)]
        to: String,
    },

    /// Deposit money into an account
    Deposit {
        /// Amount to deposit
        amount: String,

        /// Target account id
        #[arg(long)]
        account: String,
    },

    /// List payment records
    Payments {
        /// Only payments owned by this account
        #[arg(long)]
        account: Option<String>,
    },

    /// Export ledger data (CSV, or JSON for the full snapshot)
    Export {
        /// What to export: payments, accounts, full
        export_type: String,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        /// Account id (any unused string)
        id: String,

        /// Country code
        #[arg(long, default_value = "")]
        country: String,

        /// City name
        #[arg(long, default_value = "")]
        city: String,

        /// Currency code (defaults to USD)
        #[arg(long)]
        currency: Option<String>,

        /// Opening balance
        #[arg(long, default_value = "0")]
        balance: String,
    },

    /// List all accounts
    List,

    /// Show a single account
    Show {
        /// Account id
        id: String,
    },

    /// Delete an account (cannot be undone)
    Delete {
        /// Account id
        id: String,
    },
}

impl Cli {
    fn rates(&self) -> Result<Arc<dyn RateProvider>> {
        match &self.rates_url {
            Some(url) => Ok(Arc::new(HttpRates::new(url.clone())?)),
            None => {
                let mut rates = FixedRates::new();
                for spec in &self.rate {
                    let (currency, factor) = parse_rate(spec)?;
                    rates = rates.with_rate(currency, factor);
                }
                Ok(Arc::new(rates))
            }
        }
    }

    async fn service(&self) -> Result<CliService> {
        let store = SqliteStore::connect(&self.database).await?;
        Ok(LedgerService::new(store, self.rates()?))
    }

    pub async fn run(self) -> Result<()> {
        match &self.command {
            Commands::Init => {
                SqliteStore::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Account(account_cmd) => {
                let service = self.service().await?;
                run_account_command(&service, account_cmd).await?;
            }

            Commands::Transfer { amount, from, to } => {
                let service = self.service().await?;
                let amount = parse_amount(amount)?;

                let receipt = service
                    .transfer(&AccountId::new(from.as_str()), amount, &AccountId::new(to.as_str()))
                    .await?;

                println!(
                    "Recorded transfer: {} {} -> {} ({})",
                    receipt.outgoing.amount, from, to, receipt.outgoing.id
                );
            }

            Commands::Deposit { amount, account } => {
                let service = self.service().await?;
                let amount = parse_amount(amount)?;

                let payment = service
                    .deposit(&AccountId::new(account.as_str()), amount)
                    .await?;

                println!(
                    "Recorded deposit: {} to {} ({})",
                    payment.amount, account, payment.id
                );
            }

            Commands::Payments { account } => {
                let service = self.service().await?;
                run_payments_command(&service, account.as_deref()).await?;
            }

            Commands::Export {
                export_type,
                output,
            } => {
                let service = self.service().await?;
                run_export_command(&service, export_type, output.as_deref()).await?;
            }
        }

        Ok(())
    }
}

async fn run_account_command(service: &CliService, cmd: &AccountCommands) -> Result<()> {
    match cmd {
        AccountCommands::Create {
            id,
            country,
            city,
            currency,
            balance,
        } => {
            let balance = parse_amount(balance)?;
            let currency = currency.as_ref().map(|code| Currency::new(code.as_str()));

            let account = service
                .create_account(
                    AccountId::new(id.as_str()),
                    country.as_str(),
                    city.as_str(),
                    currency,
                    balance,
                )
                .await?;

            println!("Created account: {} ({})", account.id, account.currency);
        }

        AccountCommands::List => {
            let accounts = service.list_accounts().await?;
            if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!(
                    "{:<16} {:<8} {:<10} {:<14} {:<12}",
                    "ID", "CURRENCY", "COUNTRY", "CITY", "BALANCE"
                );
                println!("{}", "-".repeat(64));
                for account in accounts {
                    println!(
                        "{:<16} {:<8} {:<10} {:<14} {:<12}",
                        account.id.to_string(),
                        account.currency.to_string(),
                        account.country,
                        account.city,
                        account.balance.to_string()
                    );
                }
            }
        }

        AccountCommands::Show { id } => {
            let account = service.account(&AccountId::new(id.as_str())).await?;

            println!("Account: {}", account.id);
            println!("  Country:  {}", account.country);
            println!("  City:     {}", account.city);
            println!("  Currency: {}", account.currency);
            println!("  Balance:  {} {}", account.balance, account.currency);
        }

        AccountCommands::Delete { id } => {
            service.delete_account(&AccountId::new(id.as_str())).await?;
            println!("Deleted account: {}", id);
        }
    }
    Ok(())
}

async fn run_payments_command(service: &CliService, account: Option<&str>) -> Result<()> {
    let payments = match account {
        Some(id) => service.payments(&AccountId::new(id)).await?,
        None => service.all_payments().await?,
    };

    if payments.is_empty() {
        println!("No payments found.");
        return Ok(());
    }

    println!(
        "{:<36} {:<14} {:<10} {:<12} {:<14}",
        "ID", "ACCOUNT", "DIRECTION", "AMOUNT", "COUNTERPARTY"
    );
    println!("{}", "-".repeat(90));
    for payment in payments {
        let counterparty = payment
            .counterparty()
            .map(|id| id.to_string())
            .unwrap_or_default();
        println!(
            "{:<36} {:<14} {:<10} {:<12} {:<14}",
            payment.id.to_string(),
            payment.account.to_string(),
            payment.direction.to_string(),
            payment.amount.to_string(),
            counterparty
        );
    }
    Ok(())
}

async fn run_export_command(
    service: &CliService,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service);

    // Determine output writer
    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "payments" => {
            let count = exporter.export_payments_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} payments", count);
            }
        }
        "accounts" => {
            let count = exporter.export_accounts_csv(writer).await?;
            if output.is_some() {
                eprintln!("Exported {} accounts", count);
            }
        }
        "full" => {
            let snapshot = exporter.export_full_json(writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported full ledger: {} accounts, {} payments",
                    snapshot.accounts.len(),
                    snapshot.payments.len()
                );
            }
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: payments, accounts, full",
                export_type
            );
        }
    }

    Ok(())
}

fn parse_amount(s: &str) -> Result<Decimal> {
    Decimal::from_str(s).with_context(|| format!("Invalid amount '{}'. Use '50.00' or '50'", s))
}

fn parse_rate(spec: &str) -> Result<(Currency, Decimal)> {
    let (code, factor) = spec.split_once('=').ok_or_else(|| {
        anyhow::anyhow!("Invalid rate '{}'. Use CODE=FACTOR, e.g. EUR=0.89", spec)
    })?;
    let factor = Decimal::from_str(factor.trim())
        .with_context(|| format!("Invalid rate factor in '{}'", spec))?;
    Ok((Currency::new(code.trim()), factor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("50").unwrap(), Decimal::from(50));
        assert_eq!(parse_amount("50.25").unwrap(), Decimal::new(5025, 2));
        assert!(parse_amount("fifty").is_err());
    }

    #[test]
    fn test_parse_rate() {
        let (currency, factor) = parse_rate("EUR=0.89").unwrap();
        assert_eq!(currency.code(), "EUR");
        assert_eq!(factor, Decimal::new(89, 2));
        assert!(parse_rate("EUR").is_err());
        assert!(parse_rate("EUR=lots").is_err());
    }
}
