//! In-memory storage implementation for testing and development

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;

/// In-memory [`AccountStore`] and [`TransactionLedger`]
///
/// Clones share the same underlying maps, so one store can back an engine
/// used from many tasks. The compare-and-swap runs under the account map's
/// write lock, which gives it the required one-winner semantics.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    accounts: Arc<RwLock<HashMap<Uuid, Account>>>,
    transactions: Arc<RwLock<Vec<Transaction>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
            transactions: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        self.accounts.write().unwrap().clear();
        self.transactions.write().unwrap().clear();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn create(&self, account: Account) -> LedgerResult<Account> {
        let mut accounts = self.accounts.write().unwrap();
        if accounts.values().any(|a| a.number == account.number) {
            return Err(LedgerError::DuplicateNumber(account.number));
        }
        if accounts.contains_key(&account.id) {
            return Err(LedgerError::Storage(format!(
                "account id already exists: {}",
                account.id
            )));
        }
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get(&self, account_id: Uuid) -> LedgerResult<Option<Account>> {
        Ok(self.accounts.read().unwrap().get(&account_id).cloned())
    }

    async fn find_by_number(&self, number: &str) -> LedgerResult<Option<Account>> {
        Ok(self
            .accounts
            .read()
            .unwrap()
            .values()
            .find(|a| a.number == number)
            .cloned())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> LedgerResult<Vec<Account>> {
        let mut owned: Vec<Account> = self
            .accounts
            .read()
            .unwrap()
            .values()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(owned)
    }

    async fn compare_and_update(
        &self,
        account: &Account,
        expected_version: u64,
    ) -> LedgerResult<Account> {
        let mut accounts = self.accounts.write().unwrap();
        let stored = accounts
            .get_mut(&account.id)
            .ok_or_else(|| LedgerError::AccountNotFound(account.id.to_string()))?;

        if stored.version != expected_version {
            return Err(LedgerError::VersionConflict(account.id));
        }

        // Only the mutable fields are taken from the caller's copy.
        stored.balance = account.balance.clone();
        stored.name = account.name.clone();
        stored.version += 1;
        stored.updated_at = chrono::Utc::now().naive_utc();

        Ok(stored.clone())
    }
}

#[async_trait]
impl TransactionLedger for MemoryStore {
    async fn append(&self, draft: NewTransaction) -> LedgerResult<Transaction> {
        let mut transactions = self.transactions.write().unwrap();
        let transaction = Transaction {
            id: transactions.len() as u64 + 1,
            from_account_id: draft.from_account_id,
            to_account_id: draft.to_account_id,
            amount: draft.amount,
            kind: draft.kind,
            status: TransactionStatus::Success,
            transaction_date: chrono::Utc::now().naive_utc(),
        };
        transactions.push(transaction.clone());
        Ok(transaction)
    }

    async fn find_by_account(&self, account_id: Uuid) -> LedgerResult<Vec<Transaction>> {
        let mut entries: Vec<Transaction> = self
            .transactions
            .read()
            .unwrap()
            .iter()
            .filter(|t| t.from_account_id == account_id || t.to_account_id == account_id)
            .cloned()
            .collect();
        // newest first, ties broken by sequence id
        entries.sort_by(|a, b| {
            b.transaction_date
                .cmp(&a.transaction_date)
                .then(b.id.cmp(&a.id))
        });
        Ok(entries)
    }
}
