//! Wallet transaction types.
//!
//! Every balance change appends a transaction under
//! `users/{uid}/wallet/transactions`. The resulting balance is stored on the
//! transaction itself, denormalized at write time.

use serde::{Deserialize, Serialize};

use crate::{Money, PushKey, Timestamp};

/// A wallet transaction representing one balance change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTransaction {
    /// Push key of the record.
    pub id: PushKey,

    /// Credit or debit.
    #[serde(rename = "type")]
    pub kind: TransactionKind,

    /// Amount moved (always positive; direction is given by `kind`).
    pub amount: Money,

    /// Wallet balance after this transaction.
    pub balance: Money,

    /// When the transaction was recorded.
    #[serde(default)]
    pub timestamp: Timestamp,

    /// What caused the change. Older records may not say.
    #[serde(default)]
    pub source: TransactionSource,

    /// Free-form reason supplied by an admin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Whether an admin performed the change by hand.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub admin_action: bool,
}

impl WalletTransaction {
    /// Create a credit transaction.
    #[must_use]
    pub fn credit(id: PushKey, amount: Money, balance: Money, source: TransactionSource) -> Self {
        Self {
            id,
            kind: TransactionKind::Add,
            amount,
            balance,
            timestamp: Timestamp::now(),
            source,
            reason: None,
            admin_action: false,
        }
    }

    /// Create a debit transaction.
    #[must_use]
    pub fn debit(id: PushKey, amount: Money, balance: Money, source: TransactionSource) -> Self {
        Self {
            kind: TransactionKind::Withdraw,
            ..Self::credit(id, amount, balance, source)
        }
    }

    /// Attach a reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Mark as a manual admin action.
    #[must_use]
    pub fn by_admin(mut self) -> Self {
        self.admin_action = true;
        self
    }

    /// Signed change this transaction applied to the balance.
    #[must_use]
    pub fn signed_amount(&self) -> Money {
        match self.kind {
            TransactionKind::Add => self.amount,
            TransactionKind::Withdraw => -self.amount,
        }
    }
}

/// Direction of a wallet transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Money added to the wallet.
    Add,
    /// Money taken out of the wallet.
    Withdraw,
}

/// What caused a wallet transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionSource {
    /// An admin approved a payment request.
    AdminApproved,
    /// An admin credited the wallet by hand.
    AdminCredit,
    /// An admin debited the wallet by hand.
    AdminDebit,
    /// Any other source label.
    Other(String),
}

impl Default for TransactionSource {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl TransactionSource {
    /// Get the source label as stored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::AdminApproved => "admin_approved",
            Self::AdminCredit => "admin_credit",
            Self::AdminDebit => "admin_debit",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for TransactionSource {
    fn from(value: String) -> Self {
        match value.as_str() {
            "admin_approved" => Self::AdminApproved,
            "admin_credit" => Self::AdminCredit,
            "admin_debit" => Self::AdminDebit,
            _ => Self::Other(value),
        }
    }
}

impl From<TransactionSource> for String {
    fn from(source: TransactionSource) -> Self {
        source.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credit_transaction() {
        let tx = WalletTransaction::credit(
            PushKey::generate(),
            Money::from_rupees(500),
            Money::from_rupees(1500),
            TransactionSource::AdminApproved,
        );

        assert_eq!(tx.kind, TransactionKind::Add);
        assert_eq!(tx.signed_amount(), Money::from_rupees(500));
        assert!(!tx.admin_action);
    }

    #[test]
    fn debit_transaction_is_negative() {
        let tx = WalletTransaction::debit(
            PushKey::generate(),
            Money::from_rupees(200),
            Money::from_rupees(800),
            TransactionSource::AdminDebit,
        )
        .with_reason("Chargeback")
        .by_admin();

        assert_eq!(tx.kind, TransactionKind::Withdraw);
        assert_eq!(tx.signed_amount(), Money::from_rupees(-200));
        assert_eq!(tx.reason.as_deref(), Some("Chargeback"));
    }

    #[test]
    fn stored_shape() {
        let tx = WalletTransaction {
            timestamp: Timestamp::from_millis(1_700_000_000_000),
            ..WalletTransaction::credit(
                PushKey::new("k1").unwrap(),
                Money::from_rupees(100),
                Money::from_rupees(100),
                TransactionSource::AdminCredit,
            )
            .by_admin()
        };

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "k1",
                "type": "add",
                "amount": 100,
                "balance": 100,
                "timestamp": 1_700_000_000_000_i64,
                "source": "admin_credit",
                "adminAction": true,
            })
        );
    }

    #[test]
    fn unknown_source_is_preserved() {
        let source: TransactionSource = serde_json::from_str("\"cashback\"").unwrap();
        assert_eq!(source, TransactionSource::Other("cashback".into()));
        assert_eq!(source.as_str(), "cashback");
    }
}
