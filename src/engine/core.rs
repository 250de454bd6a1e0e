//! The ledger engine: deposit, withdrawal, and transfer orchestration
//!
//! Every operation follows one shape: load accounts, authorize the caller,
//! validate, attempt the balance commit, retry on version conflict, then
//! append the ledger entry. Serialization of concurrent mutations on the
//! same account is achieved by the store's compare-and-swap, not by locks;
//! a loser reloads fresh state and retries up to a bound.

use bigdecimal::BigDecimal;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;
use crate::utils::validation;

/// Default number of commit attempts per logical mutation
pub const DEFAULT_MAX_RETRIES: u32 = 4;

/// Orchestrates fund movements against an [`AccountStore`] and records the
/// audit trail in a [`TransactionLedger`]
///
/// The engine holds no persistent state of its own; all methods take `&self`
/// so one engine value can serve many concurrent callers.
pub struct LedgerEngine<S> {
    store: S,
    guard: Box<dyn OwnershipGuard>,
    max_retries: u32,
}

impl<S: AccountStore + TransactionLedger> LedgerEngine<S> {
    /// Create an engine with the default ownership guard and retry bound
    pub fn new(store: S) -> Self {
        Self {
            store,
            guard: Box::new(DefaultOwnershipGuard),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Create an engine with a custom ownership guard
    pub fn with_guard(store: S, guard: Box<dyn OwnershipGuard>) -> Self {
        Self {
            store,
            guard,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Override the commit retry bound
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Add funds to an account owned by the caller
    ///
    /// Deposits still require ownership; there are no third-party deposits.
    pub async fn deposit(
        &self,
        account_id: Uuid,
        amount: BigDecimal,
        caller: &Principal,
    ) -> LedgerResult<Transaction> {
        validation::validate_positive_amount(&amount)?;

        let account = self.load(account_id).await?;
        self.guard.authorize_ownership(caller, &account)?;

        let committed = self
            .commit_balance(account, |current| Ok(&current.balance + &amount))
            .await?;

        self.store
            .append(NewTransaction::deposit(committed.id, amount))
            .await
    }

    /// Remove funds from an account owned by the caller
    ///
    /// The balance check runs against the freshly loaded account on every
    /// retry iteration, so a concurrent withdrawal cannot slip this one
    /// below zero.
    pub async fn withdraw(
        &self,
        account_id: Uuid,
        amount: BigDecimal,
        caller: &Principal,
    ) -> LedgerResult<Transaction> {
        validation::validate_positive_amount(&amount)?;

        let account = self.load(account_id).await?;
        self.guard.authorize_ownership(caller, &account)?;

        let committed = self
            .commit_balance(account, |current| {
                if current.balance < amount {
                    return Err(LedgerError::InsufficientBalance {
                        available: current.balance.clone(),
                        requested: amount.clone(),
                    });
                }
                Ok(&current.balance - &amount)
            })
            .await?;

        self.store
            .append(NewTransaction::withdrawal(committed.id, amount))
            .await
    }

    /// Move funds from a source account owned by the caller to a target
    /// account addressed by id or number
    ///
    /// The caller must own the source only; transfers to third parties are
    /// the normal case. The debit commits first; the credit then retries
    /// independently against the target. A credit that exhausts its retries
    /// after the debit has committed is surfaced as
    /// [`LedgerError::PartialTransferFailure`] for reconciliation, never
    /// silently dropped.
    pub async fn transfer(
        &self,
        request: &TransferRequest,
        caller: &Principal,
    ) -> LedgerResult<Transaction> {
        validation::validate_positive_amount(&request.amount)?;

        let target = self.resolve_target(request).await?;
        let source = self.load(request.source_account_id).await?;
        self.guard.authorize_ownership(caller, &source)?;

        if source.id == target.id {
            return Err(LedgerError::SameAccountTransfer(source.id));
        }

        let amount = request.amount.clone();
        let debited = self
            .commit_balance(source, |current| {
                if current.balance < amount {
                    return Err(LedgerError::InsufficientBalance {
                        available: current.balance.clone(),
                        requested: amount.clone(),
                    });
                }
                Ok(&current.balance - &amount)
            })
            .await?;

        // The debit is committed from here on; any terminal credit failure
        // must be reported as a partial transfer, not a plain error.
        let credited = match self
            .commit_balance(target.clone(), |current| Ok(&current.balance + &amount))
            .await
        {
            Ok(account) => account,
            Err(err) => {
                warn!(
                    source = %debited.id,
                    target = %target.id,
                    %amount,
                    error = %err,
                    "credit failed after committed debit"
                );
                return Err(LedgerError::PartialTransferFailure {
                    source_account_id: debited.id,
                    target_account_id: target.id,
                    amount,
                });
            }
        };

        self.store
            .append(NewTransaction::transfer(debited.id, credited.id, amount))
            .await
    }

    /// Ledger entries touching the given account, newest first
    pub async fn account_history(
        &self,
        account_id: Uuid,
        caller: &Principal,
    ) -> LedgerResult<Vec<Transaction>> {
        let account = self.load(account_id).await?;
        self.guard.authorize_ownership(caller, &account)?;
        self.store.find_by_account(account_id).await
    }

    /// Load an account or fail with [`LedgerError::AccountNotFound`]
    async fn load(&self, account_id: Uuid) -> LedgerResult<Account> {
        self.store
            .get(account_id)
            .await?
            .ok_or_else(|| LedgerError::AccountNotFound(account_id.to_string()))
    }

    /// Resolve the transfer target by id, falling back to account number
    async fn resolve_target(&self, request: &TransferRequest) -> LedgerResult<Account> {
        if let Some(target_id) = request.target_account_id {
            self.load(target_id).await
        } else if let Some(number) = request.target_account_number.as_deref() {
            validation::validate_account_number(number).map_err(|_| {
                LedgerError::InvalidRequest(format!("malformed target account number: {number}"))
            })?;
            self.store
                .find_by_number(number)
                .await?
                .ok_or_else(|| LedgerError::AccountNotFound(number.to_string()))
        } else {
            Err(LedgerError::InvalidRequest(
                "target account id or number must be provided".to_string(),
            ))
        }
    }

    /// Balance commit through the shared CAS retry loop
    ///
    /// `compute` produces the new balance from the freshly loaded account, so
    /// preconditions such as the sufficient-balance check are re-evaluated
    /// against current state on every iteration.
    async fn commit_balance<F>(&self, account: Account, compute: F) -> LedgerResult<Account>
    where
        F: Fn(&Account) -> LedgerResult<BigDecimal>,
    {
        commit_with_retry(&self.store, account, self.max_retries, |current| {
            let mut candidate = current.clone();
            candidate.balance = compute(current)?;
            Ok(candidate)
        })
        .await
    }
}

/// CAS retry loop shared by every account mutation (balances, renames)
///
/// `mutate` produces the candidate record from the freshly loaded account.
/// Version conflicts are recovered here and never escape; exhausting the
/// bound reports [`LedgerError::ConcurrencyExhausted`].
pub(crate) async fn commit_with_retry<S, F>(
    store: &S,
    mut account: Account,
    max_retries: u32,
    mutate: F,
) -> LedgerResult<Account>
where
    S: AccountStore + ?Sized,
    F: Fn(&Account) -> LedgerResult<Account>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;

        let candidate = mutate(&account)?;

        match store.compare_and_update(&candidate, account.version).await {
            Ok(committed) => return Ok(committed),
            Err(LedgerError::VersionConflict(id)) => {
                if attempt >= max_retries {
                    warn!(account = %id, attempts = attempt, "commit retries exhausted");
                    return Err(LedgerError::ConcurrencyExhausted(id));
                }
                debug!(account = %id, attempt, "version conflict, reloading");
                account = store
                    .get(id)
                    .await?
                    .ok_or_else(|| LedgerError::AccountNotFound(id.to_string()))?;
            }
            Err(err) => return Err(err),
        }
    }
}
