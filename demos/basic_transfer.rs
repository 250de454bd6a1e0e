//! Basic fund-transfer walkthrough

use banking_core::utils::MemoryStore;
use banking_core::{AccountManager, LedgerEngine, LedgerError, Principal, TransferRequest};
use bigdecimal::BigDecimal;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🏦 Banking Core - Basic Transfer Example\n");

    let store = MemoryStore::new();
    let manager = AccountManager::new(store.clone());
    let engine = LedgerEngine::new(store);

    // 1. Two customers open accounts
    let alice = Principal::new(Uuid::new_v4());
    let bob = Principal::new(Uuid::new_v4());

    let alice_account = manager
        .open_account(
            "Alice Checking".to_string(),
            BigDecimal::from(0),
            alice.user_id,
            &alice,
        )
        .await?;
    let bob_account = manager
        .open_account(
            "Bob Savings".to_string(),
            BigDecimal::from(0),
            bob.user_id,
            &bob,
        )
        .await?;

    println!("  ✓ Opened account {} for Alice", alice_account.number);
    println!("  ✓ Opened account {} for Bob\n", bob_account.number);

    // 2. Alice funds her account
    println!("💰 Recording Movements...\n");
    let receipt = engine
        .deposit(alice_account.id, BigDecimal::from(1000), &alice)
        .await?;
    println!("  ✓ Deposit of {} (entry #{})", receipt.amount, receipt.id);

    // 3. Alice pays Bob by account number
    let receipt = engine
        .transfer(
            &TransferRequest::to_number(
                alice_account.id,
                bob_account.number.clone(),
                BigDecimal::from(250),
            ),
            &alice,
        )
        .await?;
    println!("  ✓ Transfer of {} (entry #{})", receipt.amount, receipt.id);

    // 4. An over-withdrawal is rejected without touching state
    match engine
        .withdraw(alice_account.id, BigDecimal::from(10_000), &alice)
        .await
    {
        Err(LedgerError::InsufficientBalance {
            available,
            requested,
        }) => println!("  ✗ Withdrawal of {requested} rejected (available: {available})\n"),
        other => println!("  unexpected result: {other:?}\n"),
    }

    // 5. Each side sees its own audit trail
    println!("📜 Alice's history:");
    for entry in engine.account_history(alice_account.id, &alice).await? {
        println!(
            "  #{} {:?} {} at {}",
            entry.id, entry.kind, entry.amount, entry.transaction_date
        );
    }

    println!("\n📜 Bob's history:");
    for entry in engine.account_history(bob_account.id, &bob).await? {
        println!(
            "  #{} {:?} {} at {}",
            entry.id, entry.kind, entry.amount, entry.transaction_date
        );
    }

    Ok(())
}
