//! Traits for storage abstraction and authorization

use async_trait::async_trait;
use uuid::Uuid;

use crate::types::*;

/// Persistent store of [`Account`] records keyed by account id
///
/// This trait allows the engine to work with any storage backend
/// (PostgreSQL, MySQL, SQLite, in-memory, etc.) by implementing these
/// methods. The store is the sole locus of mutation authority: the engine
/// never treats a balance as committed until the store has acknowledged it,
/// and implementations must not cache balances outside the store itself.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persist a new account
    ///
    /// Fails with [`LedgerError::DuplicateNumber`] if the account number is
    /// already taken.
    async fn create(&self, account: Account) -> LedgerResult<Account>;

    /// Get an account by id
    async fn get(&self, account_id: Uuid) -> LedgerResult<Option<Account>>;

    /// Get an account by its externally visible number
    async fn find_by_number(&self, number: &str) -> LedgerResult<Option<Account>>;

    /// List all accounts belonging to a user
    async fn list_by_owner(&self, owner_id: Uuid) -> LedgerResult<Vec<Account>>;

    /// Atomically write the account's mutable fields (balance, name) if the
    /// stored version still equals `expected_version`
    ///
    /// On success the store increments the version, refreshes `updated_at`,
    /// and returns the refreshed record. On a version mismatch it returns
    /// [`LedgerError::VersionConflict`] without writing anything. Two racing
    /// updates from the same base version must never both succeed.
    ///
    /// Immutable fields (`number`, `owner_id`, `created_at`) are never taken
    /// from the caller's copy.
    async fn compare_and_update(
        &self,
        account: &Account,
        expected_version: u64,
    ) -> LedgerResult<Account>;
}

/// Append-only store of immutable [`Transaction`] records
///
/// This component performs no business validation (that is the engine's
/// job); it only guarantees immutability and ordering.
#[async_trait]
pub trait TransactionLedger: Send + Sync {
    /// Assign a sequence id and commit timestamp, persist the entry, and
    /// return the stored record
    async fn append(&self, draft: NewTransaction) -> LedgerResult<Transaction>;

    /// All entries touching the given account, ordered by transaction date
    /// descending with ties broken by sequence id
    ///
    /// Each call runs a fresh query; no cursor state is retained.
    async fn find_by_account(&self, account_id: Uuid) -> LedgerResult<Vec<Transaction>>;
}

/// Decides whether a caller may read or mutate a given account
pub trait OwnershipGuard: Send + Sync {
    /// Pure predicate: `Ok` when the caller owns the account, otherwise
    /// [`LedgerError::AccessDenied`]. No side effects.
    fn authorize_ownership(&self, caller: &Principal, account: &Account) -> LedgerResult<()>;
}

/// Default ownership guard: the caller's user id must equal the account's
/// owner id
pub struct DefaultOwnershipGuard;

impl OwnershipGuard for DefaultOwnershipGuard {
    fn authorize_ownership(&self, caller: &Principal, account: &Account) -> LedgerResult<()> {
        if caller.user_id == account.owner_id {
            Ok(())
        } else {
            Err(LedgerError::AccessDenied(format!(
                "account {} is not owned by the caller",
                account.id
            )))
        }
    }
}
