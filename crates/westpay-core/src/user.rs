//! User records as stored under `users/{uid}`.
//!
//! Every field has a default, so partially written or legacy records still
//! load; a missing profile or wallet reads as an empty one. Nested collections
//! skip children that do not match their record type, and an unreadable
//! profile or wallet reads as the default.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{Money, Notification, PaymentRequest, Timestamp, UserId, WalletTransaction, WithdrawalRequest};

/// A user's profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Sign-in e-mail address.
    #[serde(default)]
    pub email: String,

    /// Phone number, if given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Profile photo URL, if uploaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,

    /// Whether an admin has blocked the account.
    #[serde(default)]
    pub is_blocked: bool,

    /// When the profile was created.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,

    /// When the account was last blocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_at: Option<Timestamp>,

    /// When the account was last unblocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unblocked_at: Option<Timestamp>,
}

impl UserProfile {
    /// Create a profile for a new sign-up.
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    /// Name to show for this user: the profile name, else the e-mail local part.
    #[must_use]
    pub fn display_name(&self) -> String {
        display_name(&self.name, &self.email).unwrap_or_else(|| "User".to_string())
    }
}

/// Pick a display name: `name` if non-blank, else the local part of `email`.
#[must_use]
pub fn display_name(name: &str, email: &str) -> Option<String> {
    let name = name.trim();
    if !name.is_empty() {
        return Some(name.to_string());
    }
    email
        .split('@')
        .next()
        .map(str::trim)
        .filter(|local| !local.is_empty())
        .map(str::to_string)
}

/// A user's wallet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    /// Denormalized running balance.
    #[serde(default, deserialize_with = "or_default")]
    pub balance: Money,

    /// Transactions keyed by push key.
    #[serde(default, deserialize_with = "skip_malformed")]
    pub transactions: BTreeMap<String, WalletTransaction>,
}

/// The full record stored at `users/{uid}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    /// Profile.
    #[serde(default, deserialize_with = "or_default")]
    pub profile: UserProfile,

    /// Wallet.
    #[serde(default, deserialize_with = "or_default")]
    pub wallet: Wallet,

    /// Payment (top-up) requests keyed by push key.
    #[serde(default, deserialize_with = "skip_malformed")]
    pub payment_requests: BTreeMap<String, PaymentRequest>,

    /// Withdrawal requests keyed by push key.
    #[serde(default, deserialize_with = "skip_malformed")]
    pub withdrawal_requests: BTreeMap<String, WithdrawalRequest>,

    /// Admin notifications keyed by push key.
    #[serde(default, deserialize_with = "skip_malformed")]
    pub notifications: BTreeMap<String, Notification>,
}

fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Unreadable user field, using default");
        T::default()
    }))
}

/// Keep the children of a keyed collection that deserialize; a non-object
/// collection reads as empty.
fn skip_malformed<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Object(children) = Value::deserialize(deserializer)? else {
        return Ok(BTreeMap::new());
    };
    Ok(children
        .into_iter()
        .filter_map(|(key, child)| match serde_json::from_value(child) {
            Ok(record) => Some((key, record)),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Skipping malformed record");
                None
            }
        })
        .collect())
}

/// An admin-console view of one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// User id.
    pub user_id: UserId,

    /// Profile.
    pub profile: UserProfile,

    /// Wallet balance.
    pub balance: Money,

    /// Number of payment requests.
    pub payment_requests_count: usize,

    /// Number of withdrawal requests.
    pub withdrawal_requests_count: usize,
}

impl UserSummary {
    /// Summarize a stored record.
    #[must_use]
    pub fn from_record(user_id: UserId, record: &UserRecord) -> Self {
        Self {
            user_id,
            profile: record.profile.clone(),
            balance: record.wallet.balance,
            payment_requests_count: record.payment_requests.len(),
            withdrawal_requests_count: record.withdrawal_requests.len(),
        }
    }
}
