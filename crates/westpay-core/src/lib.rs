//! Core types and utilities for WestPay.
//!
//! This crate provides the domain types shared by the store and client crates:
//!
//! - **Identifiers**: `UserId`, `PushKey`, `EmailKey`
//! - **Money**: `Money` (integer paise, decimal rupees on the wire)
//! - **Users**: `UserProfile`, `Wallet`, `UserRecord`, `UserSummary`
//! - **Transactions**: `WalletTransaction`, `TransactionKind`, `TransactionSource`
//! - **Requests**: `PaymentRequest`, `WithdrawalRequest`, `RequestStatus`, `Order`
//! - **Messages**: `ContactMessage`, `Notification`
//! - **Reviews**: `ProductId`, `ProductReview`, `Rating`, `RatingSummary`
//! - **Charges**: `ChargeProduct`, `ChargeQuote`
//!
//! # Money
//!
//! **1 rupee = 100 paise**
//!
//! - The hosted store keeps balances as decimal rupee numbers (`1520.5`)
//! - In memory every amount is an `i64` count of paise (`152_050`)
//! - Reads of legacy float values round to the nearest paisa

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod charges;
pub mod error;
pub mod ids;
pub mod message;
pub mod money;
pub mod request;
pub mod review;
pub mod time;
pub mod transaction;
pub mod user;

pub use charges::{ChargeProduct, ChargeQuote};
pub use error::{Result, WestpayError};
pub use ids::{EmailKey, IdError, PushKey, UserId};
pub use message::{
    ContactMessage, MessageSource, NewContactMessage, Notification, ADMIN_SENDER, DEFAULT_SUBJECT,
};
pub use money::Money;
pub use request::{
    order_number, FundRequest, Order, OrderStatus, PaymentRequest, RequestStatus,
    WithdrawalRequest,
};
pub use review::{
    ProductId, ProductReview, Rating, RatingSummary, ReviewAuthor, ReviewUpdate, ALL_PRODUCTS,
};
pub use time::{now_millis, Timestamp};
pub use transaction::{TransactionKind, TransactionSource, WalletTransaction};
pub use user::{display_name, UserProfile, UserRecord, UserSummary, Wallet};
