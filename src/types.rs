//! Core types and data structures for the banking ledger

use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of money movement recorded in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    /// Funds added to an account; `from` and `to` reference the same account
    Deposit,
    /// Funds removed from an account; `from` and `to` reference the same account
    Withdrawal,
    /// Funds moved between two distinct accounts
    Transfer,
}

/// Outcome recorded on a ledger entry
///
/// Failed operations never produce a ledger entry, so `Success` is the only
/// persisted value. The enum exists so the persisted schema carries an
/// explicit status column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    Success,
}

/// A customer bank account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier, generated at creation, immutable
    pub id: Uuid,
    /// Externally visible account number, globally unique, immutable
    pub number: String,
    /// Mutable display label
    pub name: String,
    /// Current balance; never negative after a committed operation
    pub balance: BigDecimal,
    /// Identifier of the owning user, immutable once set
    pub owner_id: Uuid,
    /// Monotonically increasing stamp used for optimistic concurrency control;
    /// incremented by the store on every successful mutation
    pub version: u64,
    /// When the account was created
    pub created_at: NaiveDateTime,
    /// When the account was last updated
    pub updated_at: NaiveDateTime,
}

impl Account {
    /// Create a new account record at version 0
    pub fn new(number: String, name: String, balance: BigDecimal, owner_id: Uuid) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Self {
            id: Uuid::new_v4(),
            number,
            name,
            balance,
            owner_id,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// An immutable ledger entry describing one committed money movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Monotonically assigned sequence number
    pub id: u64,
    /// Account the funds left
    pub from_account_id: Uuid,
    /// Account the funds arrived at
    pub to_account_id: Uuid,
    /// Amount moved; always positive
    pub amount: BigDecimal,
    /// Kind of movement
    pub kind: TransactionType,
    /// Persisted outcome
    pub status: TransactionStatus,
    /// Timestamp assigned by the ledger at commit time
    pub transaction_date: NaiveDateTime,
}

/// Draft ledger entry handed to [`crate::TransactionLedger::append`]
///
/// The ledger assigns the sequence id and commit timestamp; the engine only
/// supplies the accounts, amount, and kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub from_account_id: Uuid,
    pub to_account_id: Uuid,
    pub amount: BigDecimal,
    pub kind: TransactionType,
}

impl NewTransaction {
    /// Draft a deposit entry (source and target are the same account)
    pub fn deposit(account_id: Uuid, amount: BigDecimal) -> Self {
        Self {
            from_account_id: account_id,
            to_account_id: account_id,
            amount,
            kind: TransactionType::Deposit,
        }
    }

    /// Draft a withdrawal entry (source and target are the same account)
    pub fn withdrawal(account_id: Uuid, amount: BigDecimal) -> Self {
        Self {
            from_account_id: account_id,
            to_account_id: account_id,
            amount,
            kind: TransactionType::Withdrawal,
        }
    }

    /// Draft a transfer entry between two accounts
    pub fn transfer(from_account_id: Uuid, to_account_id: Uuid, amount: BigDecimal) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
            kind: TransactionType::Transfer,
        }
    }
}

/// Already-authenticated caller identity
///
/// The engine never authenticates; an outer layer verifies credentials and
/// hands the engine this opaque principal, which is compared against
/// `Account::owner_id` by the [`crate::OwnershipGuard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
}

impl Principal {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Parameters for a fund transfer
///
/// The target may be addressed by id or by externally visible account number.
/// When both are present the id wins; when neither is present the request is
/// rejected as malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub source_account_id: Uuid,
    pub target_account_id: Option<Uuid>,
    pub target_account_number: Option<String>,
    pub amount: BigDecimal,
}

impl TransferRequest {
    /// Transfer addressed to a target account id
    pub fn to_id(source_account_id: Uuid, target_account_id: Uuid, amount: BigDecimal) -> Self {
        Self {
            source_account_id,
            target_account_id: Some(target_account_id),
            target_account_number: None,
            amount,
        }
    }

    /// Transfer addressed to a target account number
    pub fn to_number(
        source_account_id: Uuid,
        target_account_number: String,
        amount: BigDecimal,
    ) -> Self {
        Self {
            source_account_id,
            target_account_id: None,
            target_account_number: Some(target_account_number),
            amount,
        }
    }
}

/// Errors that can occur in the ledger system
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(BigDecimal),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("account not found: {0}")]
    AccountNotFound(String),
    #[error("access denied: {0}")]
    AccessDenied(String),
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        available: BigDecimal,
        requested: BigDecimal,
    },
    #[error("transfer source and target are the same account: {0}")]
    SameAccountTransfer(Uuid),
    /// Internal CAS conflict signal; recovered by the engine's retry loop and
    /// never returned from an engine operation
    #[error("version conflict on account {0}")]
    VersionConflict(Uuid),
    #[error("retries exhausted updating account {0}; resubmit the operation")]
    ConcurrencyExhausted(Uuid),
    /// The debit committed but the matching credit could not after bounded
    /// retries; flagged for manual reconciliation
    #[error(
        "transfer of {amount} debited account {source_account_id} but failed to credit \
         account {target_account_id}; manual reconciliation required"
    )]
    PartialTransferFailure {
        source_account_id: Uuid,
        target_account_id: Uuid,
        amount: BigDecimal,
    },
    #[error("account number already in use: {0}")]
    DuplicateNumber(String),
    #[error("validation error: {0}")]
    Validation(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
