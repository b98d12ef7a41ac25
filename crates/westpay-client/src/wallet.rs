//! Wallet balance, transactions and fund requests.
//!
//! The balance is a denormalized running value: every writer reads it, adds
//! or subtracts, and writes it back, then appends a transaction recording
//! the result. Two writers racing on one wallet can lose an update; the
//! store offers no compare-and-swap on this path.

use serde_json::{Map, Value};
use westpay_core::{
    FundRequest, Money, PushKey, TransactionKind, TransactionSource, UserId, WalletTransaction,
    WestpayError,
};
use westpay_store::{DbPath, Store, StoreExt};

use crate::context::ClientContext;
use crate::error::Result;
use crate::with_server_time;

/// Details recorded on a balance change besides its amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    /// What caused the change.
    pub source: TransactionSource,
    /// Reason shown to the user.
    pub reason: Option<String>,
    /// Whether an admin made the change by hand.
    pub admin_action: bool,
}

impl BalanceChange {
    /// A change from `source` with no reason.
    #[must_use]
    pub const fn from_source(source: TransactionSource) -> Self {
        Self {
            source,
            reason: None,
            admin_action: false,
        }
    }
}

impl ClientContext {
    /// Read a user's wallet balance. A missing balance is zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn balance(&self, uid: &UserId) -> Result<Money> {
        let balance: Option<Money> = self.store().get_as(&DbPath::balance(uid)).await?;
        Ok(balance.unwrap_or_default())
    }

    /// Add `amount` to a wallet. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns an error if `amount` is not positive or a write fails.
    pub async fn credit(&self, uid: &UserId, amount: Money, change: BalanceChange) -> Result<Money> {
        self.change_balance(uid, TransactionKind::Add, amount, change).await
    }

    /// Take `amount` out of a wallet. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns `WestpayError::InsufficientBalance` without writing anything if
    /// the balance is too low, or an error if a write fails.
    pub async fn debit(&self, uid: &UserId, amount: Money, change: BalanceChange) -> Result<Money> {
        self.change_balance(uid, TransactionKind::Withdraw, amount, change).await
    }

    async fn change_balance(
        &self,
        uid: &UserId,
        kind: TransactionKind,
        amount: Money,
        change: BalanceChange,
    ) -> Result<Money> {
        let amount = amount.ensure_positive()?;
        let balance = self.balance(uid).await?;

        let new_balance = match kind {
            TransactionKind::Add => balance.checked_add(amount),
            TransactionKind::Withdraw if balance < amount => {
                return Err(WestpayError::InsufficientBalance {
                    balance,
                    required: amount,
                }
                .into());
            }
            TransactionKind::Withdraw => balance.checked_sub(amount),
        }
        .ok_or_else(|| WestpayError::InvalidAmount(format!("balance overflow adding {amount}")))?;

        self.store()
            .set(&DbPath::balance(uid), serde_json::to_value(new_balance)?)
            .await?;

        let key = PushKey::generate();
        let mut tx = match kind {
            TransactionKind::Add => WalletTransaction::credit(key.clone(), amount, new_balance, change.source),
            TransactionKind::Withdraw => {
                WalletTransaction::debit(key.clone(), amount, new_balance, change.source)
            }
        };
        if let Some(reason) = change.reason {
            tx = tx.with_reason(reason);
        }
        if change.admin_action {
            tx = tx.by_admin();
        }

        self.store()
            .set(
                &DbPath::transactions(uid).child(key.as_str())?,
                with_server_time(&tx, &["timestamp"])?,
            )
            .await?;
        self.balance_loader().invalidate(uid);

        tracing::info!(
            user_id = %uid,
            kind = ?kind,
            amount = %amount,
            balance = %new_balance,
            source = tx.source.as_str(),
            "Wallet balance changed"
        );
        Ok(new_balance)
    }

    /// A user's most recent transactions, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn transactions(&self, uid: &UserId, limit: usize) -> Result<Vec<WalletTransaction>> {
        let mut transactions: Vec<WalletTransaction> = self
            .store()
            .list_as(&DbPath::transactions(uid))
            .await?
            .into_iter()
            .map(|(_, tx)| tx)
            .collect();

        transactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        transactions.truncate(limit);
        Ok(transactions)
    }

    /// File a request to add money to the wallet. Returns the request id.
    ///
    /// # Errors
    ///
    /// Returns an error if `amount` is not positive or the write fails.
    pub async fn add_payment_request(
        &self,
        uid: &UserId,
        amount: Money,
        details: Map<String, Value>,
    ) -> Result<PushKey> {
        let key = PushKey::generate();
        let path = DbPath::payment_request(uid, &key);
        self.add_fund_request(uid, &path, key, amount, details).await
    }

    /// File a request to withdraw money from the wallet. Returns the request id.
    ///
    /// # Errors
    ///
    /// Returns an error if `amount` is not positive or the write fails.
    pub async fn add_withdrawal_request(
        &self,
        uid: &UserId,
        amount: Money,
        details: Map<String, Value>,
    ) -> Result<PushKey> {
        let key = PushKey::generate();
        let path = DbPath::withdrawal_request(uid, &key);
        self.add_fund_request(uid, &path, key, amount, details).await
    }

    async fn add_fund_request(
        &self,
        uid: &UserId,
        path: &DbPath,
        key: PushKey,
        amount: Money,
        mut details: Map<String, Value>,
    ) -> Result<PushKey> {
        let amount = amount.ensure_positive()?;
        for reserved in ["id", "amount", "status", "timestamp", "approvedAt", "rejectedAt", "processedAt"] {
            details.remove(reserved);
        }

        let request = FundRequest {
            id: Some(key.clone()),
            ..FundRequest::pending(amount).with_extra(details)
        };
        self.store()
            .set(path, with_server_time(&request, &["timestamp"])?)
            .await?;

        tracing::info!(user_id = %uid, request_id = %key, amount = %amount, path = %path, "Fund request filed");
        Ok(key)
    }
}
