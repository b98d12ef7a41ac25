//! Contact messages and admin notifications.

use serde::{Deserialize, Serialize};

use crate::{PushKey, Timestamp, UserId};

/// Subject used when an admin leaves it blank.
pub const DEFAULT_SUBJECT: &str = "Message from Western Payer";

/// Sender label on notifications written by the admin console.
pub const ADMIN_SENDER: &str = "admin";

fn unknown_name() -> String {
    "Unknown".to_string()
}

/// Where a contact message was sent from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageSource {
    /// The contact page form.
    #[default]
    Contact,
    /// The floating support widget.
    Support,
    /// Any other label.
    Other(String),
}

impl MessageSource {
    /// Get the source as stored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Contact => "contact",
            Self::Support => "support",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for MessageSource {
    fn from(value: String) -> Self {
        match value.as_str() {
            "contact" => Self::Contact,
            "support" => Self::Support,
            _ => Self::Other(value),
        }
    }
}

impl From<MessageSource> for String {
    fn from(source: MessageSource) -> Self {
        source.as_str().to_string()
    }
}

/// A visitor or user message stored under `contactMessages/{pushId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    /// Push key of the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PushKey>,

    /// Sender name.
    #[serde(default = "unknown_name")]
    pub name: String,

    /// Sender e-mail.
    #[serde(default)]
    pub email: String,

    /// Sender user id when signed in.
    #[serde(default)]
    pub user_id: Option<UserId>,

    /// Sender phone number.
    #[serde(default)]
    pub phone: Option<String>,

    /// Message body.
    #[serde(default)]
    pub message: String,

    /// Form the message came from.
    #[serde(default)]
    pub source: MessageSource,

    /// When the message was sent.
    #[serde(default)]
    pub timestamp: Timestamp,

    /// Whether an admin has read it.
    #[serde(default)]
    pub read: bool,
}

/// Input for a new contact message; blank fields take the stored defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewContactMessage {
    /// Sender name (default "Unknown").
    pub name: Option<String>,
    /// Sender e-mail.
    pub email: Option<String>,
    /// Sender user id.
    pub user_id: Option<UserId>,
    /// Sender phone.
    pub phone: Option<String>,
    /// Message body.
    pub message: String,
    /// Originating form (default contact).
    pub source: MessageSource,
}

impl NewContactMessage {
    /// Create a message with only a body.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Build the stored record under push key `id`.
    #[must_use]
    pub fn into_record(self, id: PushKey) -> ContactMessage {
        ContactMessage {
            id: Some(id),
            name: self
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(unknown_name),
            email: self.email.unwrap_or_default(),
            user_id: self.user_id,
            phone: self.phone.filter(|p| !p.trim().is_empty()),
            message: self.message,
            source: self.source,
            timestamp: Timestamp::now(),
            read: false,
        }
    }
}

/// A message from the admin console to a user or visitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Push key of the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PushKey>,

    /// Sender label.
    #[serde(default)]
    pub from: String,

    /// Recipient e-mail, or `all_users` for broadcasts.
    #[serde(default)]
    pub to: String,

    /// Recipient name.
    #[serde(default)]
    pub customer_name: String,

    /// Subject line.
    #[serde(default)]
    pub subject: String,

    /// Message body.
    #[serde(default)]
    pub message: String,

    /// Whether the recipient has read it.
    #[serde(default)]
    pub read: bool,

    /// When it was sent.
    #[serde(default)]
    pub timestamp: Timestamp,
}

impl Notification {
    /// Create an unread admin notification.
    #[must_use]
    pub fn from_admin(
        to: impl Into<String>,
        customer_name: impl Into<String>,
        subject: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            from: ADMIN_SENDER.to_string(),
            to: to.into(),
            customer_name: customer_name.into(),
            subject: subject
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
            message: message.into(),
            read: false,
            timestamp: Timestamp::now(),
        }
    }

    /// Whether this counts towards the unread badge.
    #[must_use]
    pub fn is_unread_from_admin(&self) -> bool {
        self.from == ADMIN_SENDER && !self.read
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_message_defaults() {
        let record = NewContactMessage::new("Where is my refund?").into_record(PushKey::generate());
        assert_eq!(record.name, "Unknown");
        assert_eq!(record.email, "");
        assert_eq!(record.source, MessageSource::Contact);
        assert!(!record.read);
        assert!(record.id.is_some());
    }

    #[test]
    fn stored_message_without_read_flag_is_unread() {
        let msg: ContactMessage = serde_json::from_value(serde_json::json!({
            "message": "hello",
            "timestamp": 5
        }))
        .unwrap();
        assert!(!msg.read);
        assert_eq!(msg.name, "Unknown");
        assert_eq!(msg.timestamp.millis(), 5);
    }

    #[test]
    fn admin_notification_subject_default() {
        let n = Notification::from_admin("a@x.in", "Asha", Some("   ".into()), "Hi");
        assert_eq!(n.subject, DEFAULT_SUBJECT);
        assert!(n.is_unread_from_admin());
    }

    #[test]
    fn read_or_foreign_notifications_do_not_count() {
        let mut n = Notification::from_admin("a@x.in", "Asha", None, "Hi");
        n.read = true;
        assert!(!n.is_unread_from_admin());

        let mut other = Notification::from_admin("a@x.in", "Asha", None, "Hi");
        other.from = "system".into();
        assert!(!other.is_unread_from_admin());
    }
}
