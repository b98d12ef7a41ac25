//! Store path construction.
//!
//! Paths are `/`-separated lists of keys. Every key is validated against the
//! store's key rules, so a path built here can be sent to any backend.

use std::fmt;

use westpay_core::ids::validate_key;
use westpay_core::{EmailKey, ProductId, PushKey, UserId};

use crate::error::{Result, StoreError};
use crate::schema::{root, user, REVIEWS};

/// A validated path in the hosted store. The empty path is the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DbPath {
    segments: Vec<String>,
}

impl DbPath {
    /// The root of the store.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a `/`-separated path. Leading, trailing and doubled slashes are ignored.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidPath` if a segment contains a forbidden character.
    pub fn parse(path: &str) -> Result<Self> {
        Self::root().join(path)
    }

    /// Append one key.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidPath` if the key is empty or contains a
    /// forbidden character.
    pub fn child(&self, key: impl AsRef<str>) -> Result<Self> {
        let key = key.as_ref();
        validate_key(key).map_err(|e| StoreError::InvalidPath(format!("{key:?}: {e}")))?;
        Ok(self.trusted_child(key))
    }

    /// Append a relative `/`-separated path.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidPath` if a segment contains a forbidden character.
    pub fn join(&self, relative: &str) -> Result<Self> {
        relative
            .split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self.clone(), |path, segment| path.child(segment))
    }

    fn trusted_child(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key.to_string());
        Self { segments }
    }

    fn from_keys<const N: usize>(keys: [&str; N]) -> Self {
        Self {
            segments: keys.iter().map(|k| (*k).to_string()).collect(),
        }
    }

    /// The keys of this path, outermost first.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this is the root.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The last key, or `None` at the root.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The parent path, or `None` at the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.segments.split_last()?;
        Some(Self {
            segments: parent.to_vec(),
        })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// `users`
    #[must_use]
    pub fn users() -> Self {
        Self::from_keys([root::USERS])
    }

    /// `users/{uid}`
    #[must_use]
    pub fn user(uid: &UserId) -> Self {
        Self::from_keys([root::USERS, uid.as_str()])
    }

    /// `users/{uid}/profile`
    #[must_use]
    pub fn profile(uid: &UserId) -> Self {
        Self::user(uid).trusted_child(user::PROFILE)
    }

    /// `users/{uid}/wallet`
    #[must_use]
    pub fn wallet(uid: &UserId) -> Self {
        Self::user(uid).trusted_child(user::WALLET)
    }

    /// `users/{uid}/wallet/balance`
    #[must_use]
    pub fn balance(uid: &UserId) -> Self {
        Self::wallet(uid).trusted_child(user::BALANCE)
    }

    /// `users/{uid}/wallet/transactions`
    #[must_use]
    pub fn transactions(uid: &UserId) -> Self {
        Self::wallet(uid).trusted_child(user::TRANSACTIONS)
    }

    /// `users/{uid}/paymentRequests`
    #[must_use]
    pub fn payment_requests(uid: &UserId) -> Self {
        Self::user(uid).trusted_child(user::PAYMENT_REQUESTS)
    }

    /// `users/{uid}/paymentRequests/{id}`
    #[must_use]
    pub fn payment_request(uid: &UserId, id: &PushKey) -> Self {
        Self::payment_requests(uid).trusted_child(id.as_str())
    }

    /// `users/{uid}/withdrawalRequests`
    #[must_use]
    pub fn withdrawal_requests(uid: &UserId) -> Self {
        Self::user(uid).trusted_child(user::WITHDRAWAL_REQUESTS)
    }

    /// `users/{uid}/withdrawalRequests/{id}`
    #[must_use]
    pub fn withdrawal_request(uid: &UserId, id: &PushKey) -> Self {
        Self::withdrawal_requests(uid).trusted_child(id.as_str())
    }

    /// `users/{uid}/notifications`
    #[must_use]
    pub fn notifications(uid: &UserId) -> Self {
        Self::user(uid).trusted_child(user::NOTIFICATIONS)
    }

    /// `users/{uid}/notifications/{id}`
    #[must_use]
    pub fn notification(uid: &UserId, id: &PushKey) -> Self {
        Self::notifications(uid).trusted_child(id.as_str())
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// `orders`
    #[must_use]
    pub fn orders() -> Self {
        Self::from_keys([root::ORDERS])
    }

    /// `orders/{uid}`
    #[must_use]
    pub fn user_orders(uid: &UserId) -> Self {
        Self::from_keys([root::ORDERS, uid.as_str()])
    }

    /// `orders/{uid}/{key}`
    #[must_use]
    pub fn order(uid: &UserId, key: &PushKey) -> Self {
        Self::user_orders(uid).trusted_child(key.as_str())
    }

    // =========================================================================
    // Messages
    // =========================================================================

    /// `contactMessages`
    #[must_use]
    pub fn contact_messages() -> Self {
        Self::from_keys([root::CONTACT_MESSAGES])
    }

    /// `contactMessages/{id}`
    #[must_use]
    pub fn contact_message(id: &PushKey) -> Self {
        Self::from_keys([root::CONTACT_MESSAGES, id.as_str()])
    }

    /// `adminMessages/{emailKey}`
    #[must_use]
    pub fn admin_messages(email: &EmailKey) -> Self {
        Self::from_keys([root::ADMIN_MESSAGES, email.as_str()])
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// `productReviews`
    #[must_use]
    pub fn all_product_reviews() -> Self {
        Self::from_keys([root::PRODUCT_REVIEWS])
    }

    /// `productReviews/{productId}/reviews`
    #[must_use]
    pub fn product_reviews(product: ProductId) -> Self {
        Self::from_keys([root::PRODUCT_REVIEWS, product.as_str(), REVIEWS])
    }

    /// `productReviews/{productId}/reviews/{id}`
    #[must_use]
    pub fn review(product: ProductId, id: &PushKey) -> Self {
        Self::product_reviews(product).trusted_child(id.as_str())
    }
}

impl fmt::Display for DbPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}
