//! Orders.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use westpay_core::{now_millis, order_number, Order, OrderStatus, PushKey, Timestamp, UserId};
use westpay_store::{server_timestamp, DbPath, Store, StoreExt};

use crate::admin::AdminConsole;
use crate::context::ClientContext;
use crate::error::Result;
use crate::with_server_time;

/// Keys the client sets itself; caller-supplied values for them are dropped.
const RESERVED_ORDER_KEYS: [&str; 8] = [
    "orderId",
    "orderKey",
    "orderDate",
    "status",
    "timestamp",
    "adminNote",
    "statusUpdatedAt",
    "statusTimestamp",
];

/// An order together with the user who placed it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOrder {
    /// The ordering user.
    pub user_id: UserId,
    /// The order.
    #[serde(flatten)]
    pub order: Order,
}

/// Four random upper-case alphanumerics for an order number.
fn order_suffix() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..4].to_ascii_uppercase()
}

fn sort_newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

fn with_key(key: &str, mut order: Order) -> Order {
    if order.order_key.is_none() {
        order.order_key = PushKey::new(key).ok();
    }
    order
}

impl ClientContext {
    /// Place an order with caller-supplied `details`. The order starts pending.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn add_order(&self, uid: &UserId, mut details: Map<String, Value>) -> Result<Order> {
        for reserved in RESERVED_ORDER_KEYS {
            details.remove(reserved);
        }

        let key = PushKey::generate();
        let order = Order {
            order_id: order_number(now_millis(), &order_suffix()),
            order_key: Some(key.clone()),
            order_date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            status: OrderStatus::Pending,
            timestamp: Timestamp::now(),
            admin_note: None,
            status_updated_at: None,
            status_timestamp: None,
            extra: details,
        };

        self.store()
            .set(&DbPath::order(uid, &key), with_server_time(&order, &["timestamp"])?)
            .await?;

        tracing::info!(user_id = %uid, order_id = %order.order_id, "Order placed");
        Ok(order)
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn user_orders(&self, uid: &UserId) -> Result<Vec<Order>> {
        let mut orders: Vec<Order> = self
            .store()
            .list_as(&DbPath::user_orders(uid))
            .await?
            .into_iter()
            .map(|(key, order)| with_key(&key, order))
            .collect();
        sort_newest_first(&mut orders);
        Ok(orders)
    }
}

impl AdminConsole<'_> {
    /// Every order of every user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn all_orders(&self) -> Result<Vec<UserOrder>> {
        let Some(Value::Object(by_user)) = self.store().get(&DbPath::orders()).await? else {
            return Ok(Vec::new());
        };

        let mut all = Vec::new();
        for (uid, orders) in by_user {
            let Ok(user_id) = UserId::new(uid.as_str()) else {
                tracing::warn!(user_id = %uid, "Skipping orders under invalid user id");
                continue;
            };
            let Value::Object(orders) = orders else { continue };

            for (key, order) in orders {
                match serde_json::from_value::<Order>(order) {
                    Ok(order) => all.push(UserOrder {
                        user_id: user_id.clone(),
                        order: with_key(&key, order),
                    }),
                    Err(e) => tracing::warn!(user_id = %uid, key = %key, error = %e, "Skipping malformed order"),
                }
            }
        }

        all.sort_by(|a, b| b.order.timestamp.cmp(&a.order.timestamp));
        Ok(all)
    }

    /// Move an order to `status`, leaving `note` for the customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn update_order_status(
        &self,
        uid: &UserId,
        key: &PushKey,
        status: OrderStatus,
        note: Option<&str>,
    ) -> Result<()> {
        let mut fields = Map::new();
        fields.insert("status".into(), Value::from(status.as_str()));
        fields.insert(
            "statusUpdatedAt".into(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        fields.insert("adminNote".into(), Value::from(note.unwrap_or_default()));
        fields.insert("statusTimestamp".into(), server_timestamp());

        self.store().update(&DbPath::order(uid, key), fields).await?;
        tracing::info!(user_id = %uid, order_key = %key, status = status.as_str(), "Order status updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_is_four_upper_alphanumerics() {
        let suffix = order_suffix();
        assert_eq!(suffix.len(), 4);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn stored_key_fills_missing_order_key() {
        let order: Order = serde_json::from_value(serde_json::json!({ "orderId": "ORD1" })).unwrap();
        assert_eq!(with_key("k1", order).order_key, Some(PushKey::new("k1").unwrap()));
    }
}
