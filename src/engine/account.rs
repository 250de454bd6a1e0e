//! Account opening and management

use bigdecimal::BigDecimal;
use tracing::debug;
use uuid::Uuid;

use crate::engine::core::{commit_with_retry, DEFAULT_MAX_RETRIES};
use crate::traits::*;
use crate::types::*;
use crate::utils::validation;

/// Attempts at drawing an unused account number before giving up
const MAX_NUMBER_ATTEMPTS: u32 = 16;

/// Manager for account lifecycle operations
///
/// Balance mutations go through [`crate::LedgerEngine`]; this manager covers
/// opening, renaming, and lookup, with the same ownership checks and the
/// same CAS discipline for the one mutation it performs (rename).
pub struct AccountManager<S: AccountStore> {
    store: S,
    guard: Box<dyn OwnershipGuard>,
}

impl<S: AccountStore> AccountManager<S> {
    /// Create a manager with the default ownership guard
    pub fn new(store: S) -> Self {
        Self {
            store,
            guard: Box::new(DefaultOwnershipGuard),
        }
    }

    /// Create a manager with a custom ownership guard
    pub fn with_guard(store: S, guard: Box<dyn OwnershipGuard>) -> Self {
        Self { store, guard }
    }

    /// Open a new account for the calling user
    ///
    /// The owner must be the caller; opening an account for someone else is
    /// denied. The account number is generated here and guaranteed unused at
    /// creation time; the store still enforces uniqueness on create.
    pub async fn open_account(
        &self,
        name: String,
        opening_balance: BigDecimal,
        owner_id: Uuid,
        caller: &Principal,
    ) -> LedgerResult<Account> {
        if owner_id != caller.user_id {
            return Err(LedgerError::AccessDenied(
                "cannot open an account for someone else".to_string(),
            ));
        }

        validation::validate_account_name(&name)?;
        if opening_balance < BigDecimal::from(0) {
            return Err(LedgerError::InvalidAmount(opening_balance));
        }

        let number = self.generate_unique_number().await?;
        let account = Account::new(number, name, opening_balance, owner_id);

        debug!(account = %account.id, number = %account.number, "opening account");
        self.store.create(account).await
    }

    /// Get an account by id; only the owner may see it
    pub async fn account(&self, account_id: Uuid, caller: &Principal) -> LedgerResult<Account> {
        let account = self.get_required(account_id).await?;
        self.guard.authorize_ownership(caller, &account)?;
        Ok(account)
    }

    /// All accounts belonging to the calling user
    ///
    /// Listing someone else's accounts is denied.
    pub async fn accounts_for_owner(
        &self,
        owner_id: Uuid,
        caller: &Principal,
    ) -> LedgerResult<Vec<Account>> {
        if owner_id != caller.user_id {
            return Err(LedgerError::AccessDenied(
                "cannot list someone else's accounts".to_string(),
            ));
        }
        self.store.list_by_owner(owner_id).await
    }

    /// Change an account's display name
    ///
    /// Renames go through the same compare-and-swap as balance mutations and
    /// bump the version stamp, so a rename racing a transfer never clobbers
    /// a committed balance.
    pub async fn rename(
        &self,
        account_id: Uuid,
        new_name: &str,
        caller: &Principal,
    ) -> LedgerResult<Account> {
        validation::validate_account_name(new_name)?;

        let account = self.get_required(account_id).await?;
        self.guard.authorize_ownership(caller, &account)?;

        commit_with_retry(&self.store, account, DEFAULT_MAX_RETRIES, |current| {
            let mut candidate = current.clone();
            candidate.name = new_name.to_string();
            Ok(candidate)
        })
        .await
    }

    async fn get_required(&self, account_id: Uuid) -> LedgerResult<Account> {
        self.store
            .get(account_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))
    }

    /// Draw random 10-digit numbers until one is unused
    ///
    /// Uniqueness is double-checked by the store's create, so a race between
    /// two generators collapses into a [`LedgerError::DuplicateNumber`] for
    /// the loser rather than two accounts sharing a number.
    async fn generate_unique_number(&self) -> LedgerResult<String> {
        for _ in 0..MAX_NUMBER_ATTEMPTS {
            let raw = 1_000_000_000u64 + (Uuid::new_v4().as_u128() % 9_000_000_000) as u64;
            let number = raw.to_string();
            if self.store.find_by_number(&number).await?.is_none() {
                return Ok(number);
            }
        }
        Err(LedgerError::Storage(
            "could not allocate an unused account number".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_store::MemoryStore;

    #[tokio::test]
    async fn open_account_generates_a_ten_digit_number() {
        let store = MemoryStore::new();
        let manager = AccountManager::new(store.clone());
        let caller = Principal::new(Uuid::new_v4());

        let account = manager
            .open_account(
                "Checking".to_string(),
                BigDecimal::from(500),
                caller.user_id,
                &caller,
            )
            .await
            .unwrap();

        assert_eq!(account.number.len(), 10);
        assert!(account.number.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(account.balance, BigDecimal::from(500));
        assert_eq!(account.version, 0);
        assert_eq!(account.owner_id, caller.user_id);

        let by_number = store.find_by_number(&account.number).await.unwrap();
        assert_eq!(by_number.map(|a| a.id), Some(account.id));
    }

    #[tokio::test]
    async fn open_account_for_someone_else_is_denied() {
        let store = MemoryStore::new();
        let manager = AccountManager::new(store);
        let caller = Principal::new(Uuid::new_v4());

        let err = manager
            .open_account(
                "Checking".to_string(),
                BigDecimal::from(0),
                Uuid::new_v4(),
                &caller,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccessDenied(_)));
    }

    #[tokio::test]
    async fn open_account_rejects_negative_opening_balance_and_blank_name() {
        let store = MemoryStore::new();
        let manager = AccountManager::new(store);
        let caller = Principal::new(Uuid::new_v4());

        let err = manager
            .open_account(
                "Checking".to_string(),
                BigDecimal::from(-1),
                caller.user_id,
                &caller,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));

        let err = manager
            .open_account("  ".to_string(), BigDecimal::from(0), caller.user_id, &caller)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn rename_bumps_version_and_requires_ownership() {
        let store = MemoryStore::new();
        let manager = AccountManager::new(store.clone());
        let owner = Principal::new(Uuid::new_v4());
        let stranger = Principal::new(Uuid::new_v4());

        let account = manager
            .open_account(
                "Checking".to_string(),
                BigDecimal::from(0),
                owner.user_id,
                &owner,
            )
            .await
            .unwrap();

        let err = manager
            .rename(account.id, "Savings", &stranger)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccessDenied(_)));

        let renamed = manager.rename(account.id, "Savings", &owner).await.unwrap();
        assert_eq!(renamed.name, "Savings");
        assert_eq!(renamed.version, account.version + 1);
        // immutable fields untouched
        assert_eq!(renamed.number, account.number);
        assert_eq!(renamed.owner_id, account.owner_id);
        assert_eq!(renamed.created_at, account.created_at);
    }

    #[tokio::test]
    async fn listing_is_scoped_to_the_caller() {
        let store = MemoryStore::new();
        let manager = AccountManager::new(store);
        let alice = Principal::new(Uuid::new_v4());
        let bob = Principal::new(Uuid::new_v4());

        for name in ["Checking", "Savings"] {
            manager
                .open_account(name.to_string(), BigDecimal::from(0), alice.user_id, &alice)
                .await
                .unwrap();
        }
        manager
            .open_account("Checking".to_string(), BigDecimal::from(0), bob.user_id, &bob)
            .await
            .unwrap();

        let mine = manager
            .accounts_for_owner(alice.user_id, &alice)
            .await
            .unwrap();
        assert_eq!(mine.len(), 2);

        let err = manager
            .accounts_for_owner(alice.user_id, &bob)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::AccessDenied(_)));
    }

    /// Store wrapper that serves a configurable number of stale reads for
    /// one account, forcing the rename CAS to conflict deterministically.
    #[derive(Clone)]
    struct StaleReadStore {
        inner: MemoryStore,
        stale_account: Uuid,
        remaining: std::sync::Arc<std::sync::atomic::AtomicU32>,
    }

    impl StaleReadStore {
        fn new(inner: MemoryStore, stale_account: Uuid, stale_reads: u32) -> Self {
            Self {
                inner,
                stale_account,
                remaining: std::sync::Arc::new(std::sync::atomic::AtomicU32::new(stale_reads)),
            }
        }
    }

    #[async_trait::async_trait]
    impl AccountStore for StaleReadStore {
        async fn create(&self, account: Account) -> LedgerResult<Account> {
            self.inner.create(account).await
        }

        async fn get(&self, account_id: Uuid) -> LedgerResult<Option<Account>> {
            let mut account = self.inner.get(account_id).await?;
            if account_id == self.stale_account {
                use std::sync::atomic::Ordering;
                if self.remaining.load(Ordering::SeqCst) > 0 {
                    self.remaining.fetch_sub(1, Ordering::SeqCst);
                    if let Some(account) = account.as_mut() {
                        account.version = account.version.wrapping_sub(1);
                    }
                }
            }
            Ok(account)
        }

        async fn find_by_number(&self, number: &str) -> LedgerResult<Option<Account>> {
            self.inner.find_by_number(number).await
        }

        async fn list_by_owner(&self, owner_id: Uuid) -> LedgerResult<Vec<Account>> {
            self.inner.list_by_owner(owner_id).await
        }

        async fn compare_and_update(
            &self,
            account: &Account,
            expected_version: u64,
        ) -> LedgerResult<Account> {
            self.inner.compare_and_update(account, expected_version).await
        }
    }

    #[tokio::test]
    async fn rename_recovers_from_a_version_conflict_and_keeps_the_committed_balance() {
        let inner = MemoryStore::new();
        let owner = Principal::new(Uuid::new_v4());
        let account = AccountManager::new(inner.clone())
            .open_account(
                "Checking".to_string(),
                BigDecimal::from(500),
                owner.user_id,
                &owner,
            )
            .await
            .unwrap();

        // A balance commit lands before the rename's CAS attempt.
        let mut funded = inner.get(account.id).await.unwrap().unwrap();
        funded.balance = BigDecimal::from(650);
        inner
            .compare_and_update(&funded, funded.version)
            .await
            .unwrap();

        let manager = AccountManager::new(StaleReadStore::new(inner.clone(), account.id, 1));
        let renamed = manager.rename(account.id, "Savings", &owner).await.unwrap();

        assert_eq!(renamed.name, "Savings");
        assert_eq!(renamed.version, 2);
        assert_eq!(renamed.balance, BigDecimal::from(650));

        let stored = inner.get(account.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Savings");
        assert_eq!(stored.balance, BigDecimal::from(650));
    }

    #[tokio::test]
    async fn rename_exhaustion_surfaces_concurrency_error_without_a_write() {
        let inner = MemoryStore::new();
        let owner = Principal::new(Uuid::new_v4());
        let account = AccountManager::new(inner.clone())
            .open_account(
                "Checking".to_string(),
                BigDecimal::from(500),
                owner.user_id,
                &owner,
            )
            .await
            .unwrap();

        let manager = AccountManager::new(StaleReadStore::new(inner.clone(), account.id, u32::MAX));
        let err = manager
            .rename(account.id, "Savings", &owner)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::ConcurrencyExhausted(_)));

        let stored = inner.get(account.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Checking");
        assert_eq!(stored.version, account.version);
        assert_eq!(stored.balance, BigDecimal::from(500));
    }

    #[tokio::test]
    async fn lookup_requires_ownership() {
        let store = MemoryStore::new();
        let manager = AccountManager::new(store);
        let owner = Principal::new(Uuid::new_v4());
        let stranger = Principal::new(Uuid::new_v4());

        let account = manager
            .open_account(
                "Checking".to_string(),
                BigDecimal::from(0),
                owner.user_id,
                &owner,
            )
            .await
            .unwrap();

        assert!(manager.account(account.id, &owner).await.is_ok());
        assert!(matches!(
            manager.account(account.id, &stranger).await,
            Err(LedgerError::AccessDenied(_))
        ));
        assert!(matches!(
            manager.account(Uuid::new_v4(), &owner).await,
            Err(LedgerError::AccountNotFound(_))
        ));
    }
}
