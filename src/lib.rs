//! # Banking Core
//!
//! A core banking ledger providing atomic fund transfers, optimistic
//! concurrency control, and an immutable audit trail.
//!
//! ## Features
//!
//! - **Fund movements**: deposit, withdrawal, and transfer with non-negative
//!   balances enforced under concurrent access
//! - **Optimistic concurrency**: version-stamped compare-and-swap with a
//!   bounded retry loop instead of locks
//! - **Audit trail**: every committed movement appends exactly one immutable
//!   ledger entry; failed operations append none
//! - **Ownership authorization**: every operation checks an explicit caller
//!   identity against the account owner
//! - **Storage abstraction**: database-agnostic design with trait-based
//!   stores and an in-memory reference implementation
//!
//! ## Quick Start
//!
//! ```rust
//! use banking_core::{utils::MemoryStore, AccountManager, LedgerEngine, Principal};
//! use bigdecimal::BigDecimal;
//! use uuid::Uuid;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), banking_core::LedgerError> {
//! let store = MemoryStore::new();
//! let manager = AccountManager::new(store.clone());
//! let engine = LedgerEngine::new(store);
//!
//! let alice = Principal::new(Uuid::new_v4());
//! let account = manager
//!     .open_account("Checking".to_string(), BigDecimal::from(100), alice.user_id, &alice)
//!     .await?;
//!
//! let receipt = engine.deposit(account.id, BigDecimal::from(50), &alice).await?;
//! assert_eq!(receipt.amount, BigDecimal::from(50));
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use engine::*;
pub use traits::*;
pub use types::*;
