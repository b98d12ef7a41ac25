//! Product reviews and ratings.
//!
//! Reviews live under `productReviews/{productId}/reviews/{pushId}`. A review
//! is visible to customers unless its `approved` flag is explicitly `false`;
//! customer submissions start unapproved and wait for an admin.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::{PushKey, Timestamp, UserId, WestpayError};

/// The products that carry reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ProductId {
    /// Bajaj Finserv Insta EMI Card.
    BajajCard,
    /// `LazyPay`.
    LazyPay,
    /// Credit card withdrawal.
    CreditCard,
    /// Home Credit Ujjwal EMI Card.
    HomeCredit,
    /// Axio.
    Axio,
    /// IDFC Buy EMI Card.
    IdfcBuyEmi,
    /// HDFC `EasyEMI` Card.
    HdfcEasyEmi,
    /// Zest Money.
    ZestMoney,
    /// Mobikwik Zip Pay Later.
    MobikwikZip,
    /// Amazon Pay Later withdrawal.
    AmazonPayLater,
}

/// Every product, in catalogue order.
pub const ALL_PRODUCTS: [ProductId; 10] = [
    ProductId::BajajCard,
    ProductId::LazyPay,
    ProductId::CreditCard,
    ProductId::HomeCredit,
    ProductId::Axio,
    ProductId::IdfcBuyEmi,
    ProductId::HdfcEasyEmi,
    ProductId::ZestMoney,
    ProductId::MobikwikZip,
    ProductId::AmazonPayLater,
];

impl ProductId {
    /// Store key of the product.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BajajCard => "bajaj-card",
            Self::LazyPay => "lazypay",
            Self::CreditCard => "credit-card",
            Self::HomeCredit => "home-credit",
            Self::Axio => "axio",
            Self::IdfcBuyEmi => "idfc-buy-emi",
            Self::HdfcEasyEmi => "hdfc-easyemi",
            Self::ZestMoney => "zest-money",
            Self::MobikwikZip => "mobikwik-zip",
            Self::AmazonPayLater => "amazon-pay-later",
        }
    }

    /// Name shown in the admin console.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::BajajCard => "Bajaj Finserv Insta EMI Card",
            Self::LazyPay => "LazyPay",
            Self::CreditCard => "Credit Card",
            Self::HomeCredit => "Home Credit Ujjwal EMI Card",
            Self::Axio => "Axio",
            Self::IdfcBuyEmi => "IDFC Buy EMI Card",
            Self::HdfcEasyEmi => "HDFC EasyEMI Card",
            Self::ZestMoney => "Zest Money",
            Self::MobikwikZip => "Mobikwik Zip Pay Later",
            Self::AmazonPayLater => "Amazon Pay Later Withdrawal",
        }
    }

    /// Resolve the product from a product page path such as
    /// `overview/product info/bajaj card.html`.
    ///
    /// # Errors
    ///
    /// Returns [`WestpayError::UnknownProduct`] if the page is not a product page.
    pub fn from_page(path: &str) -> Result<Self, WestpayError> {
        let file = path.rsplit(['/', '\\']).next().unwrap_or(path);
        let stem = file.strip_suffix(".html").unwrap_or(file);
        let slug = stem
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase();
        slug.parse()
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductId {
    type Err = WestpayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_PRODUCTS
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| WestpayError::UnknownProduct(s.to_string()))
    }
}

impl Serialize for ProductId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProductId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A star rating from 1 to 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Rating(u8);

impl Rating {
    /// The highest rating, also used when a stored review has none.
    pub const MAX: Self = Self(5);

    /// Create a rating.
    ///
    /// # Errors
    ///
    /// Returns [`WestpayError::InvalidRating`] outside 1..=5.
    pub fn new(stars: i64) -> Result<Self, WestpayError> {
        u8::try_from(stars)
            .ok()
            .filter(|s| (1..=5).contains(s))
            .map(Self)
            .ok_or(WestpayError::InvalidRating(stars))
    }

    /// Number of stars.
    #[must_use]
    pub const fn stars(self) -> u8 {
        self.0
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self::MAX
    }
}

/// Stored ratings may be numbers or numeric strings. Zero and anything
/// unusable read as the default of 5; other out-of-range values are clamped.
impl<'de> Deserialize<'de> for Rating {
    #[allow(clippy::cast_possible_truncation)]
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let stars = match &value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        Ok(match stars {
            Some(s) if s >= 1 => Self(s.min(5) as u8),
            Some(0) | None => Self::default(),
            Some(_) => Self(1),
        })
    }
}

/// Who created a review.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAuthor {
    /// Added from the admin console.
    #[default]
    Admin,
    /// Submitted by a signed-in customer.
    Customer,
}

fn anonymous() -> String {
    "Anonymous".to_string()
}

const fn approved_by_default() -> bool {
    true
}

/// Only an explicit `false` hides a review.
fn approved_unless_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(!matches!(Value::deserialize(deserializer)?, Value::Bool(false)))
}

/// A product review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReview {
    /// Push key of the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PushKey>,

    /// Product the review belongs to. Implied by the store path, so not written.
    #[serde(skip)]
    pub product_id: Option<ProductId>,

    /// Star rating.
    #[serde(default)]
    pub rating: Rating,

    /// Review text.
    #[serde(default)]
    pub review: String,

    /// Reviewer name.
    #[serde(default = "anonymous")]
    pub customer_name: String,

    /// Moderation flag; anything but a stored `false` counts as approved.
    #[serde(default = "approved_by_default", deserialize_with = "approved_unless_false")]
    pub approved: bool,

    /// Who created the review.
    #[serde(default)]
    pub submitted_by: ReviewAuthor,

    /// Submitting user, for customer reviews.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,

    /// When the review was written.
    #[serde(default)]
    pub timestamp: Timestamp,
}

impl ProductReview {
    /// A customer submission. Always starts unapproved.
    #[must_use]
    pub fn customer(
        rating: Rating,
        review: impl Into<String>,
        customer_name: impl Into<String>,
        user_id: UserId,
    ) -> Self {
        Self {
            id: None,
            product_id: None,
            rating,
            review: review.into(),
            customer_name: customer_name.into(),
            approved: false,
            submitted_by: ReviewAuthor::Customer,
            user_id: Some(user_id),
            timestamp: Timestamp::now(),
        }
    }

    /// An admin-added review. Approved unless `approved` is `Some(false)`.
    #[must_use]
    pub fn admin(
        rating: Rating,
        review: impl Into<String>,
        customer_name: Option<String>,
        approved: Option<bool>,
    ) -> Self {
        Self {
            id: None,
            product_id: None,
            rating,
            review: review.into(),
            customer_name: customer_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(anonymous),
            approved: approved != Some(false),
            submitted_by: ReviewAuthor::Admin,
            user_id: None,
            timestamp: Timestamp::now(),
        }
    }
}

/// A partial edit of a review from the admin console.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewUpdate {
    /// New rating.
    pub rating: Option<Rating>,
    /// New text.
    pub review: Option<String>,
    /// New reviewer name.
    pub customer_name: Option<String>,
    /// New moderation flag.
    pub approved: Option<bool>,
}

impl ReviewUpdate {
    /// Stored fields this update changes; empty when nothing is set.
    #[must_use]
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(rating) = self.rating {
            fields.insert("rating".into(), Value::from(rating.stars()));
        }
        if let Some(review) = &self.review {
            fields.insert("review".into(), Value::from(review.clone()));
        }
        if let Some(name) = &self.customer_name {
            fields.insert("customerName".into(), Value::from(name.clone()));
        }
        if let Some(approved) = self.approved {
            fields.insert("approved".into(), Value::from(approved));
        }
        fields
    }
}

/// Average rating and review count for a product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    /// Mean rating rounded to one decimal; 0 with no reviews.
    pub average: f64,
    /// Number of reviews counted.
    pub count: usize,
}

impl RatingSummary {
    /// Summarize a set of ratings.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_ratings(ratings: impl IntoIterator<Item = Rating>) -> Self {
        let (sum, count) = ratings
            .into_iter()
            .fold((0_u64, 0_usize), |(sum, n), r| (sum + u64::from(r.stars()), n + 1));
        if count == 0 {
            return Self {
                average: 0.0,
                count: 0,
            };
        }
        let average = sum as f64 / count as f64;
        Self {
            average: (average * 10.0).round() / 10.0,
            count,
        }
    }
}
