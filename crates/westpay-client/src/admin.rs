//! Admin console operations.
//!
//! Every listing reads the whole `users` collection and filters in memory;
//! there is no pagination. Operations that touch more than one path (approve
//! a request, then credit the wallet) are not atomic.

use serde::Serialize;
use serde_json::{Map, Value};
use westpay_core::{
    EmailKey, FundRequest, Money, Notification, PushKey, RequestStatus, TransactionSource, UserId,
    UserRecord, UserSummary,
};
use westpay_store::{server_timestamp, DbPath, Store, StoreExt};

use crate::context::ClientContext;
use crate::error::{ClientError, Result};
use crate::wallet::BalanceChange;
use crate::with_server_time;

/// Recipient label on broadcast notifications until addressed per user.
const ALL_USERS: &str = "all_users";

/// Admin operations over a [`ClientContext`].
#[derive(Debug, Clone, Copy)]
pub struct AdminConsole<'a> {
    ctx: &'a ClientContext,
}

/// A payment or withdrawal request with its owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRequest {
    /// Owner of the request.
    pub user_id: UserId,
    /// Owner's name, or "Unknown".
    pub user_name: String,
    /// Owner's e-mail, or "Unknown".
    pub user_email: String,
    /// The request.
    #[serde(flatten)]
    pub request: FundRequest,
}

/// Outcome of a broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastReport {
    /// Notifications written.
    pub sent: usize,
    /// Writes that failed.
    pub errors: usize,
    /// Users found, including those skipped for having no e-mail.
    pub total: usize,
}

/// Where [`AdminConsole::send_message_to_customer`] delivered a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageDelivery {
    /// To a registered user's notifications.
    Registered(UserId),
    /// To the visitor inbox for an unregistered address.
    Visitor(EmailKey),
}

#[derive(Clone, Copy)]
enum RequestKind {
    Payment,
    Withdrawal,
}

impl RequestKind {
    fn path(self, uid: &UserId, id: &PushKey) -> DbPath {
        match self {
            Self::Payment => DbPath::payment_request(uid, id),
            Self::Withdrawal => DbPath::withdrawal_request(uid, id),
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Payment => "payment",
            Self::Withdrawal => "withdrawal",
        }
    }
}

fn or_unknown(value: &str) -> String {
    if value.trim().is_empty() {
        "Unknown".to_string()
    } else {
        value.to_string()
    }
}

impl<'a> AdminConsole<'a> {
    /// Wrap a context.
    #[must_use]
    pub const fn new(ctx: &'a ClientContext) -> Self {
        Self { ctx }
    }

    /// The wrapped context.
    #[must_use]
    pub const fn context(&self) -> &'a ClientContext {
        self.ctx
    }

    pub(crate) fn store(&self) -> &'a dyn Store {
        self.ctx.store()
    }

    async fn user_records(&self) -> Result<Vec<(UserId, UserRecord)>> {
        let Some(Value::Object(users)) = self.store().get(&DbPath::users()).await? else {
            return Ok(Vec::new());
        };

        let mut records = Vec::with_capacity(users.len());
        for (uid, user) in users {
            let Ok(user_id) = UserId::new(uid.as_str()) else {
                tracing::warn!(user_id = %uid, "Skipping user with invalid id");
                continue;
            };
            match serde_json::from_value::<UserRecord>(user) {
                Ok(record) => records.push((user_id, record)),
                Err(e) => tracing::warn!(user_id = %uid, error = %e, "Skipping malformed user record"),
            }
        }
        Ok(records)
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Every user with their balance and request counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn all_users(&self) -> Result<Vec<UserSummary>> {
        Ok(self
            .user_records()
            .await?
            .into_iter()
            .map(|(uid, record)| UserSummary::from_record(uid, &record))
            .collect())
    }

    /// Find the user whose profile e-mail matches `email`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<UserSummary>> {
        let email = email.trim();
        if email.is_empty() {
            return Ok(None);
        }
        Ok(self
            .all_users()
            .await?
            .into_iter()
            .find(|u| u.profile.email.trim().eq_ignore_ascii_case(email)))
    }

    /// Block a user. They are signed out at their next status check.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` for an unknown user, or an error if
    /// the write fails.
    pub async fn block_user(&self, uid: &UserId) -> Result<()> {
        self.set_blocked(uid, true).await
    }

    /// Lift a block.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` for an unknown user, or an error if
    /// the write fails.
    pub async fn unblock_user(&self, uid: &UserId) -> Result<()> {
        self.set_blocked(uid, false).await
    }

    async fn set_blocked(&self, uid: &UserId, blocked: bool) -> Result<()> {
        let path = DbPath::profile(uid);
        if self.store().get(&path).await?.is_none() {
            return Err(ClientError::NotFound(path.to_string()));
        }

        let mut fields = Map::new();
        fields.insert("isBlocked".into(), Value::Bool(blocked));
        let stamp = if blocked { "blockedAt" } else { "unblockedAt" };
        fields.insert(stamp.into(), server_timestamp());
        self.store().update(&path, fields).await?;

        tracing::info!(user_id = %uid, blocked, "User block status changed");
        Ok(())
    }

    /// Delete a user's whole record.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn remove_user(&self, uid: &UserId) -> Result<()> {
        self.store().remove(&DbPath::user(uid)).await?;
        self.ctx.balance_loader().invalidate(uid);
        tracing::info!(user_id = %uid, "User removed");
        Ok(())
    }

    // =========================================================================
    // Payment and withdrawal requests
    // =========================================================================

    /// Every payment request of every user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn all_payment_requests(&self) -> Result<Vec<UserRequest>> {
        self.all_requests(RequestKind::Payment).await
    }

    /// Every withdrawal request of every user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn all_withdrawal_requests(&self) -> Result<Vec<UserRequest>> {
        self.all_requests(RequestKind::Withdrawal).await
    }

    async fn all_requests(&self, kind: RequestKind) -> Result<Vec<UserRequest>> {
        let mut all = Vec::new();
        for (uid, record) in self.user_records().await? {
            let requests = match kind {
                RequestKind::Payment => record.payment_requests,
                RequestKind::Withdrawal => record.withdrawal_requests,
            };
            for (key, mut request) in requests {
                if request.id.is_none() {
                    request.id = PushKey::new(key).ok();
                }
                all.push(UserRequest {
                    user_id: uid.clone(),
                    user_name: or_unknown(&record.profile.name),
                    user_email: or_unknown(&record.profile.email),
                    request,
                });
            }
        }
        all.sort_by(|a, b| b.request.timestamp.cmp(&a.request.timestamp));
        Ok(all)
    }

    /// Approve a payment request and credit its stored amount to the wallet.
    /// Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` for an unknown request,
    /// `WestpayError::InvalidStatusTransition` if it was already decided, or
    /// an error if a write fails.
    pub async fn approve_payment_request(&self, uid: &UserId, id: &PushKey) -> Result<Money> {
        let request = self.decide(RequestKind::Payment, uid, id, RequestStatus::Approved).await?;

        let change = BalanceChange::from_source(TransactionSource::AdminApproved);
        self.ctx.credit(uid, request.amount, change).await
    }

    /// Reject a payment request.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` for an unknown request,
    /// `WestpayError::InvalidStatusTransition` if it was already decided, or
    /// an error if the write fails.
    pub async fn reject_payment_request(&self, uid: &UserId, id: &PushKey) -> Result<()> {
        self.decide(RequestKind::Payment, uid, id, RequestStatus::Rejected).await?;
        Ok(())
    }

    /// Approve a withdrawal request. The payout happens outside the site;
    /// the wallet is not debited here.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` for an unknown request,
    /// `WestpayError::InvalidStatusTransition` if it was already decided, or
    /// an error if the write fails.
    pub async fn approve_withdrawal_request(&self, uid: &UserId, id: &PushKey) -> Result<()> {
        self.decide(RequestKind::Withdrawal, uid, id, RequestStatus::Approved).await?;
        Ok(())
    }

    /// Reject a withdrawal request.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` for an unknown request,
    /// `WestpayError::InvalidStatusTransition` if it was already decided, or
    /// an error if the write fails.
    pub async fn reject_withdrawal_request(&self, uid: &UserId, id: &PushKey) -> Result<()> {
        self.decide(RequestKind::Withdrawal, uid, id, RequestStatus::Rejected).await?;
        Ok(())
    }

    /// Move a pending request to `status`, returning the request as read.
    async fn decide(
        &self,
        kind: RequestKind,
        uid: &UserId,
        id: &PushKey,
        status: RequestStatus,
    ) -> Result<FundRequest> {
        let path = kind.path(uid, id);
        let Some(request) = self.store().get_as::<FundRequest>(&path).await? else {
            return Err(ClientError::NotFound(path.to_string()));
        };
        request.status.transition_to(status)?;

        let mut fields = Map::new();
        fields.insert("status".into(), Value::from(status.as_str()));
        let stamp = match status {
            RequestStatus::Rejected => "rejectedAt",
            _ => "approvedAt",
        };
        fields.insert(stamp.into(), server_timestamp());
        if matches!(kind, RequestKind::Withdrawal) {
            fields.insert("processedAt".into(), server_timestamp());
        }
        self.store().update(&path, fields).await?;

        tracing::info!(
            user_id = %uid,
            request_id = %id,
            kind = kind.label(),
            status = status.as_str(),
            amount = %request.amount,
            "Request decided"
        );
        Ok(request)
    }

    // =========================================================================
    // Wallet adjustments
    // =========================================================================

    /// Credit a wallet by hand. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns an error if `amount` is not positive or a write fails.
    pub async fn add_money(&self, uid: &UserId, amount: Money, reason: Option<&str>) -> Result<Money> {
        let change = BalanceChange {
            source: TransactionSource::AdminCredit,
            reason: Some(reason.unwrap_or("Admin credit").to_string()),
            admin_action: true,
        };
        self.ctx.credit(uid, amount, change).await
    }

    /// Debit a wallet by hand. Returns the new balance.
    ///
    /// # Errors
    ///
    /// Returns `WestpayError::InsufficientBalance` if the balance is too
    /// low, or an error if a write fails.
    pub async fn withdraw_money(&self, uid: &UserId, amount: Money, reason: Option<&str>) -> Result<Money> {
        let change = BalanceChange {
            source: TransactionSource::AdminDebit,
            reason: Some(reason.unwrap_or("Admin debit").to_string()),
            admin_action: true,
        };
        self.ctx.debit(uid, amount, change).await
    }

    // =========================================================================
    // Messaging
    // =========================================================================

    /// Send a message to one customer. Registered users get it in their
    /// notifications; other addresses go to the visitor inbox.
    ///
    /// # Errors
    ///
    /// Returns an error if `email` cannot be used as a key or a store
    /// operation fails.
    pub async fn send_message_to_customer(
        &self,
        email: &str,
        customer_name: &str,
        subject: Option<String>,
        message: &str,
    ) -> Result<MessageDelivery> {
        let key = PushKey::generate();
        let notification = Notification {
            id: Some(key.clone()),
            ..Notification::from_admin(email, customer_name, subject, message)
        };
        let value = with_server_time(&notification, &["timestamp"])?;

        if let Some(user) = self.find_user_by_email(email).await? {
            self.store().set(&DbPath::notification(&user.user_id, &key), value).await?;
            tracing::info!(user_id = %user.user_id, "Message sent to registered user");
            return Ok(MessageDelivery::Registered(user.user_id));
        }

        let inbox = EmailKey::from_email(email)?;
        self.store()
            .set(&DbPath::admin_messages(&inbox).child(key.as_str())?, value)
            .await?;
        tracing::info!(email_key = %inbox, "Message sent to visitor");
        Ok(MessageDelivery::Visitor(inbox))
    }

    /// Send a message to every user with an e-mail address.
    ///
    /// Each write is attempted once; failures are logged and counted and the
    /// run carries on.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NoUsers` if there are no users, or an error if
    /// the user list cannot be read.
    pub async fn send_message_to_all_users(&self, subject: Option<String>, message: &str) -> Result<BroadcastReport> {
        let users = self.all_users().await?;
        if users.is_empty() {
            return Err(ClientError::NoUsers);
        }

        let template = Notification::from_admin(ALL_USERS, "All Users", subject, message);
        let mut report = BroadcastReport {
            total: users.len(),
            ..BroadcastReport::default()
        };

        for user in &users {
            let email = user.profile.email.trim();
            if email.is_empty() {
                continue;
            }

            let key = PushKey::generate();
            let name = user.profile.name.trim();
            let notification = Notification {
                id: Some(key.clone()),
                to: email.to_string(),
                customer_name: if name.is_empty() { "User".to_string() } else { name.to_string() },
                ..template.clone()
            };

            let written = match with_server_time(&notification, &["timestamp"]) {
                Ok(value) => self
                    .store()
                    .set(&DbPath::notification(&user.user_id, &key), value)
                    .await
                    .map_err(ClientError::from),
                Err(e) => Err(e),
            };
            match written {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    tracing::error!(user_id = %user.user_id, error = %e, "Broadcast to user failed");
                    report.errors += 1;
                }
            }
        }

        tracing::info!(
            sent = report.sent,
            errors = report.errors,
            total = report.total,
            "Broadcast finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_owner_fields_read_unknown() {
        assert_eq!(or_unknown(""), "Unknown");
        assert_eq!(or_unknown("Asha"), "Asha");
    }

    #[test]
    fn request_paths_by_kind() {
        let uid = UserId::new("u1").unwrap();
        let id = PushKey::new("r1").unwrap();
        assert_eq!(
            RequestKind::Payment.path(&uid, &id).to_string(),
            "users/u1/paymentRequests/r1"
        );
        assert_eq!(
            RequestKind::Withdrawal.path(&uid, &id).to_string(),
            "users/u1/withdrawalRequests/r1"
        );
    }

    #[test]
    fn user_request_flattens_request_fields() {
        let request = UserRequest {
            user_id: UserId::new("u1").unwrap(),
            user_name: "Asha".into(),
            user_email: "asha@mail.in".into(),
            request: FundRequest::pending(Money::from_rupees(500)),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["amount"], 500);
        assert_eq!(json["status"], "pending");
    }
}
