//! Payment / withdrawal requests and orders.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Money, PushKey, Timestamp, WestpayError};

/// Moderation status of a payment or withdrawal request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Awaiting an admin decision.
    #[default]
    Pending,
    /// Approved by an admin.
    Approved,
    /// Rejected by an admin.
    Rejected,
}

impl RequestStatus {
    /// Get the status as stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Whether no further transitions are allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Validate a transition. Only `pending` can move, and only to a terminal state.
    ///
    /// # Errors
    ///
    /// Returns [`WestpayError::InvalidStatusTransition`] otherwise.
    pub fn transition_to(self, to: Self) -> Result<Self, WestpayError> {
        if self == Self::Pending && to.is_terminal() {
            Ok(to)
        } else {
            Err(WestpayError::InvalidStatusTransition { from: self, to })
        }
    }
}

/// A request to move money into (payment) or out of (withdrawal) a wallet.
///
/// Fields written by other pages (UTR numbers, bank details and so on) are
/// kept in `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundRequest {
    /// Push key of the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PushKey>,

    /// Requested amount.
    #[serde(default)]
    pub amount: Money,

    /// Moderation status.
    #[serde(default)]
    pub status: RequestStatus,

    /// When the request was made.
    #[serde(default)]
    pub timestamp: Timestamp,

    /// When an admin approved it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<Timestamp>,

    /// When an admin rejected it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_at: Option<Timestamp>,

    /// When an admin last processed it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<Timestamp>,

    /// Any other stored fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FundRequest {
    /// Create a pending request for `amount`.
    #[must_use]
    pub fn pending(amount: Money) -> Self {
        Self {
            amount,
            ..Self::default()
        }
    }

    /// Attach extra fields.
    #[must_use]
    pub fn with_extra(mut self, extra: Map<String, Value>) -> Self {
        self.extra = extra;
        self
    }
}

/// A request to add money to a wallet.
pub type PaymentRequest = FundRequest;

/// A request to withdraw money from a wallet.
pub type WithdrawalRequest = FundRequest;

/// Fulfilment status of an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    /// Newly placed.
    #[default]
    Pending,
    /// Being worked on.
    Processing,
    /// Done.
    Completed,
    /// Cancelled.
    Cancelled,
    /// Any other status label an admin typed.
    Other(String),
}

impl OrderStatus {
    /// Get the status as stored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => Self::Pending,
            "processing" => Self::Processing,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            _ => Self::Other(value),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}

/// An order stored under `orders/{uid}/{pushId}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Human-facing order number, `ORD<millis><suffix>`.
    #[serde(default)]
    pub order_id: String,

    /// Push key of the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_key: Option<PushKey>,

    /// ISO 8601 placement time.
    #[serde(default)]
    pub order_date: String,

    /// Fulfilment status.
    #[serde(default)]
    pub status: OrderStatus,

    /// Store timestamp of placement.
    #[serde(default)]
    pub timestamp: Timestamp,

    /// Note left by an admin on the last status change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_note: Option<String>,

    /// ISO 8601 time of the last status change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_updated_at: Option<String>,

    /// Store timestamp of the last status change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_timestamp: Option<Timestamp>,

    /// Caller-supplied order details.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Build an order number from a millisecond timestamp and a random suffix.
#[must_use]
pub fn order_number(millis: i64, suffix: &str) -> String {
    format!("ORD{millis}{}", suffix.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_moves() {
        assert_eq!(
            RequestStatus::Pending.transition_to(RequestStatus::Approved),
            Ok(RequestStatus::Approved)
        );
        assert_eq!(
            RequestStatus::Pending.transition_to(RequestStatus::Rejected),
            Ok(RequestStatus::Rejected)
        );
        assert!(RequestStatus::Approved
            .transition_to(RequestStatus::Pending)
            .is_err());
        assert!(RequestStatus::Approved
            .transition_to(RequestStatus::Approved)
            .is_err());
        assert!(RequestStatus::Rejected
            .transition_to(RequestStatus::Approved)
            .is_err());
        assert!(RequestStatus::Pending
            .transition_to(RequestStatus::Pending)
            .is_err());
    }

    #[test]
    fn fund_request_keeps_extra_fields() {
        let request: FundRequest = serde_json::from_value(serde_json::json!({
            "id": "r1",
            "amount": "1500",
            "status": "pending",
            "timestamp": 1_700_000_000_000_i64,
            "utr": "UTR123",
        }))
        .unwrap();

        assert_eq!(request.amount, Money::from_rupees(1500));
        assert_eq!(request.extra["utr"], "UTR123");

        let back = serde_json::to_value(&request).unwrap();
        assert_eq!(back["utr"], "UTR123");
        assert_eq!(back["status"], "pending");
    }

    #[test]
    fn order_status_labels() {
        let status: OrderStatus = serde_json::from_str("\"shipped\"").unwrap();
        assert_eq!(status, OrderStatus::Other("shipped".into()));
        assert_eq!(String::from(OrderStatus::Completed), "completed");
    }

    #[test]
    fn order_number_format() {
        assert_eq!(order_number(1_700_000_000_000, "a1b2"), "ORD1700000000000A1B2");
    }
}
