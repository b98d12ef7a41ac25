//! Store layout: root nodes and child collection names.

/// Top-level nodes of the hosted store.
pub mod root {
    /// User records, keyed by user id.
    pub const USERS: &str = "users";

    /// Orders, keyed by user id then push key.
    pub const ORDERS: &str = "orders";

    /// Contact and support messages, keyed by push key.
    pub const CONTACT_MESSAGES: &str = "contactMessages";

    /// Messages for recipients without a user record, keyed by e-mail key.
    pub const ADMIN_MESSAGES: &str = "adminMessages";

    /// Product reviews, keyed by product id.
    pub const PRODUCT_REVIEWS: &str = "productReviews";
}

/// Child collections under `users/{uid}`.
pub mod user {
    /// Profile object.
    pub const PROFILE: &str = "profile";

    /// Wallet object.
    pub const WALLET: &str = "wallet";

    /// Balance field inside the wallet.
    pub const BALANCE: &str = "balance";

    /// Transactions inside the wallet.
    pub const TRANSACTIONS: &str = "transactions";

    /// Payment requests.
    pub const PAYMENT_REQUESTS: &str = "paymentRequests";

    /// Withdrawal requests.
    pub const WITHDRAWAL_REQUESTS: &str = "withdrawalRequests";

    /// Admin notifications.
    pub const NOTIFICATIONS: &str = "notifications";
}

/// Child collection under `productReviews/{productId}`.
pub const REVIEWS: &str = "reviews";

/// Returns every root node, in the order an export would walk them.
#[must_use]
pub fn all_roots() -> Vec<&'static str> {
    vec![
        root::USERS,
        root::ORDERS,
        root::CONTACT_MESSAGES,
        root::ADMIN_MESSAGES,
        root::PRODUCT_REVIEWS,
    ]
}
