mod common;

use anyhow::Result;
use common::{create_usd_account, memory_service, sqlite_service};
use pago::domain::{AccountId, Direction};
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_unknown_account_lists_no_payments() -> Result<()> {
    let service = memory_service();

    // Listing is not a lookup: an id nobody ever used simply has no
    // records.
    assert!(service.payments(&AccountId::new("ghost")).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_all_payments_spans_accounts() -> Result<()> {
    let (service, _temp) = sqlite_service().await?;
    create_usd_account(&service, "alice", dec!(100)).await?;
    create_usd_account(&service, "bob", dec!(0)).await?;
    create_usd_account(&service, "carol", dec!(0)).await?;

    service
        .transfer(&AccountId::new("alice"), dec!(40), &AccountId::new("bob"))
        .await?;
    service.deposit(&AccountId::new("carol"), dec!(25)).await?;

    // One pair plus one deposit
    let all = service.all_payments().await?;
    assert_eq!(all.len(), 3);
    assert_eq!(
        all.iter()
            .filter(|payment| payment.direction == Direction::Incoming)
            .count(),
        2
    );
    assert_eq!(
        all.iter()
            .filter(|payment| payment.direction == Direction::Outgoing)
            .count(),
        1
    );

    Ok(())
}

#[tokio::test]
async fn test_listings_are_repeatable() -> Result<()> {
    let service = memory_service();
    create_usd_account(&service, "alice", dec!(100)).await?;
    create_usd_account(&service, "bob", dec!(0)).await?;
    service
        .transfer(&AccountId::new("alice"), dec!(10), &AccountId::new("bob"))
        .await?;

    let first: Vec<_> = service
        .payments(&AccountId::new("alice"))
        .await?
        .into_iter()
        .map(|payment| payment.id)
        .collect();
    let second: Vec<_> = service
        .payments(&AccountId::new("alice"))
        .await?
        .into_iter()
        .map(|payment| payment.id)
        .collect();

    assert_eq!(first, second);

    Ok(())
}

#[tokio::test]
async fn test_each_leg_lists_under_its_owner() -> Result<()> {
    let (service, _temp) = sqlite_service().await?;
    create_usd_account(&service, "alice", dec!(100)).await?;
    create_usd_account(&service, "bob", dec!(0)).await?;

    let receipt = service
        .transfer(&AccountId::new("alice"), dec!(40), &AccountId::new("bob"))
        .await?;

    let alice = service.payments(&AccountId::new("alice")).await?;
    let bob = service.payments(&AccountId::new("bob")).await?;

    assert_eq!(alice.len(), 1);
    assert_eq!(alice[0].id, receipt.outgoing.id);
    assert_eq!(bob.len(), 1);
    assert_eq!(bob[0].id, receipt.incoming.id);

    Ok(())
}
