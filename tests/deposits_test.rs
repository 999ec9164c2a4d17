mod common;

use anyhow::Result;
use common::{balance_of, create_account_in, create_usd_account, memory_service, sqlite_service};
use pago::application::{ErrorKind, LedgerError, LedgerService};
use pago::domain::{AccountId, Direction};
use pago::rates::FixedRates;
use pago::storage::LedgerStore;
use rust_decimal_macros::dec;

async fn assert_deposit_adds_money<S: LedgerStore>(
    service: &LedgerService<S, FixedRates>,
) -> Result<()> {
    create_usd_account(service, "alice", dec!(40)).await?;

    let payment = service.deposit(&AccountId::new("alice"), dec!(25)).await?;

    assert_eq!(balance_of(service, "alice").await?, dec!(65));

    // A deposit is a single incoming record whose origin is the owner
    // itself.
    assert_eq!(payment.account, AccountId::new("alice"));
    assert_eq!(payment.direction, Direction::Incoming);
    assert_eq!(payment.amount, dec!(25));
    assert_eq!(payment.from_account, Some(AccountId::new("alice")));
    assert_eq!(payment.to_account, None);
    assert!(payment.is_deposit());

    let payments = service.payments(&AccountId::new("alice")).await?;
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].id, payment.id);

    Ok(())
}

#[tokio::test]
async fn test_deposit_adds_money_in_memory() -> Result<()> {
    let service = memory_service();
    assert_deposit_adds_money(&service).await
}

#[tokio::test]
async fn test_deposit_adds_money_on_sqlite() -> Result<()> {
    let (service, _temp) = sqlite_service().await?;
    assert_deposit_adds_money(&service).await
}

#[tokio::test]
async fn test_deposits_accumulate() -> Result<()> {
    let service = memory_service();
    create_usd_account(&service, "alice", dec!(0)).await?;

    service.deposit(&AccountId::new("alice"), dec!(40)).await?;
    service.deposit(&AccountId::new("alice"), dec!(25)).await?;

    assert_eq!(balance_of(&service, "alice").await?, dec!(65));
    assert_eq!(service.payments(&AccountId::new("alice")).await?.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_deposit_to_unknown_account() -> Result<()> {
    let service = memory_service();

    let err = service
        .deposit(&AccountId::new("ghost"), dec!(10))
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::UnknownSourceAccount(_)));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(service.all_payments().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_deposit_rejects_non_positive_amounts() -> Result<()> {
    let service = memory_service();
    create_usd_account(&service, "alice", dec!(40)).await?;

    for amount in [dec!(0), dec!(-1)] {
        let err = service
            .deposit(&AccountId::new("alice"), amount)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArgument(_)));
    }
    assert_eq!(balance_of(&service, "alice").await?, dec!(40));
    assert!(service.all_payments().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_deposit_converts_into_account_currency() -> Result<()> {
    let service = memory_service();
    create_account_in(&service, "heidi", "EUR", dec!(10)).await?;

    // 25 requested in base units lands as 20 EUR at 0.80.
    let payment = service.deposit(&AccountId::new("heidi"), dec!(25)).await?;

    assert_eq!(payment.amount, dec!(20));
    assert_eq!(balance_of(&service, "heidi").await?, dec!(30));

    Ok(())
}

#[tokio::test]
async fn test_deposit_to_deleted_account() -> Result<()> {
    let service = memory_service();
    create_usd_account(&service, "alice", dec!(40)).await?;
    service.delete_account(&AccountId::new("alice")).await?;

    let err = service
        .deposit(&AccountId::new("alice"), dec!(10))
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::UnknownSourceAccount(_)));

    Ok(())
}
