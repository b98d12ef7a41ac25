//! Contact messages and admin notifications.

use serde_json::{Map, Value};
use westpay_core::{ContactMessage, NewContactMessage, Notification, PushKey, UserId};
use westpay_store::{DbPath, Store, StoreExt};

use crate::admin::AdminConsole;
use crate::context::ClientContext;
use crate::error::{ClientError, Result};
use crate::with_server_time;

fn read_flag() -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("read".into(), Value::Bool(true));
    fields
}

/// Mark the record at `path` read. Missing records are an error; records
/// already read are left alone.
async fn mark_read(store: &dyn Store, path: &DbPath) -> Result<bool> {
    let Some(record) = store.get(path).await? else {
        return Err(ClientError::NotFound(path.to_string()));
    };
    if record.get("read").and_then(Value::as_bool) == Some(true) {
        return Ok(false);
    }
    store.update(path, read_flag()).await?;
    Ok(true)
}

impl ClientContext {
    /// Save a message from the contact form or support widget.
    ///
    /// The write runs under the context's retry policy. The push key is
    /// chosen once, so a retry after a lost acknowledgement rewrites the same
    /// record.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::PermissionDenied` if the store's security rules
    /// reject the write, or the last store error once retries run out.
    pub async fn save_contact_message(&self, input: NewContactMessage) -> Result<PushKey> {
        let key = PushKey::generate();
        let path = DbPath::contact_message(&key);
        let value = with_server_time(&input.into_record(key.clone()), &["timestamp"])?;

        let store = self.store();
        let target = &path;
        let result = self
            .retry_policy()
            .run("save_contact_message", || {
                let value = value.clone();
                async move { store.set(target, value).await }
            })
            .await;

        match result {
            Ok(()) => {
                tracing::info!(message_id = %key, "Contact message saved");
                Ok(key)
            }
            Err(e) if e.is_permission_denied() => Err(ClientError::PermissionDenied {
                path: DbPath::contact_messages().to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// A user's notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn notifications(&self, uid: &UserId) -> Result<Vec<Notification>> {
        let mut notifications: Vec<Notification> = self
            .store()
            .list_as(&DbPath::notifications(uid))
            .await?
            .into_iter()
            .map(|(key, mut n): (String, Notification)| {
                if n.id.is_none() {
                    n.id = PushKey::new(key).ok();
                }
                n
            })
            .collect();
        notifications.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(notifications)
    }

    /// Number of unread messages from the admin, for the badge.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn unread_admin_count(&self, uid: &UserId) -> Result<usize> {
        let notifications = self.notifications(uid).await?;
        Ok(notifications.iter().filter(|n| n.is_unread_from_admin()).count())
    }

    /// Mark one notification read.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if there is no such notification, or
    /// an error if the store fails.
    pub async fn mark_notification_read(&self, uid: &UserId, id: &PushKey) -> Result<()> {
        if mark_read(self.store(), &DbPath::notification(uid, id)).await? {
            tracing::debug!(user_id = %uid, notification_id = %id, "Notification marked read");
        }
        Ok(())
    }
}

impl AdminConsole<'_> {
    /// Every contact message, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn contact_messages(&self) -> Result<Vec<ContactMessage>> {
        let mut messages: Vec<ContactMessage> = self
            .store()
            .list_as(&DbPath::contact_messages())
            .await?
            .into_iter()
            .map(|(key, mut m): (String, ContactMessage)| {
                if m.id.is_none() {
                    m.id = PushKey::new(key).ok();
                }
                m
            })
            .collect();
        messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(messages)
    }

    /// Mark a contact message read. Marking it again changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NotFound` if there is no such message, or an
    /// error if the store fails.
    pub async fn mark_message_read(&self, id: &PushKey) -> Result<()> {
        if mark_read(self.store(), &DbPath::contact_message(id)).await? {
            tracing::info!(message_id = %id, "Contact message marked read");
        }
        Ok(())
    }
}
