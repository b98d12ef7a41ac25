//! WestPay client.
//!
//! This crate implements the site's client-side logic over the hosted
//! realtime store: wallet balances, payment and withdrawal requests, orders,
//! contact messages, admin notifications, product reviews and the admin
//! console. Everything hangs off a [`ClientContext`], which owns the store
//! handle, local and session storage, configuration and retry policy.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use westpay_client::{AuthUser, ClientConfig, ClientContext, NoView};
//! use westpay_core::UserId;
//!
//! # async fn example() -> Result<(), westpay_client::ClientError> {
//! let ctx = ClientContext::from_config(ClientConfig::from_env())?;
//!
//! // The auth service reported a sign-in
//! let user = AuthUser::new(UserId::new("kX9fQ2aB")?, "asha@mail.in");
//! ctx.on_auth_state_changed(Some(&user)).await?;
//!
//! // Show the wallet balance
//! let balance = ctx.quick_setup(&NoView).await;
//! println!("Balance: {balance:?}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod admin;
pub mod balance;
pub mod config;
pub mod context;
pub mod error;
pub mod messages;
pub mod orders;
pub mod render;
pub mod retry;
pub mod reviews;
pub mod session;
pub mod storage;
pub mod users;
pub mod wallet;

pub use admin::{AdminConsole, BroadcastReport, MessageDelivery, UserRequest};
pub use balance::{BalanceLoader, BalanceView, NoView};
pub use config::ClientConfig;
pub use context::ClientContext;
pub use error::{ClientError, Result};
pub use orders::UserOrder;
pub use retry::{Backoff, RetryPolicy};
pub use reviews::{PendingReview, ReviewDraft, ReviewSubmission};
pub use session::{AuthUser, UserData};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use users::ProfileUpdate;

use serde::Serialize;
use serde_json::Value;

/// Serialize `record` for writing, replacing `fields` with the server
/// timestamp placeholder so the store's clock decides them.
pub(crate) fn with_server_time<T: Serialize>(record: &T, fields: &[&str]) -> Result<Value> {
    let mut value = serde_json::to_value(record)?;
    if let Value::Object(map) = &mut value {
        for field in fields {
            map.insert((*field).to_string(), westpay_store::server_timestamp());
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn server_time_replaces_fields() {
        let value = with_server_time(&json!({ "a": 1, "timestamp": 5 }), &["timestamp"]).unwrap();
        assert_eq!(value["a"], 1);
        assert!(westpay_store::is_server_timestamp(&value["timestamp"]));
    }
}
