//! Product review submission and moderation.
//!
//! Customers submit reviews unapproved; an admin approves, edits or deletes
//! them. A visitor who is not signed in has their review staged in session
//! storage and submitted once they sign in.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use westpay_core::{
    ProductId, ProductReview, PushKey, Rating, RatingSummary, ReviewUpdate, UserId, WestpayError,
};
use westpay_store::{DbPath, Store, StoreExt};

use crate::admin::AdminConsole;
use crate::context::ClientContext;
use crate::error::Result;
use crate::session::review_name;
use crate::storage::{read_json, write_json, PENDING_REVIEW_KEY};
use crate::with_server_time;

/// A review as the customer typed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDraft {
    /// Product under review.
    pub product_id: ProductId,
    /// Star rating.
    pub rating: Rating,
    /// Review text.
    pub review_text: String,
    /// Page to come back to after signing in.
    pub return_url: Option<String>,
}

/// A review staged in session storage until the visitor signs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingReview {
    /// Key the review will be written under; fixed at staging time so a
    /// repeated flush rewrites the same record.
    pub key: PushKey,
    /// Product under review.
    pub product_id: ProductId,
    /// Star rating.
    pub rating: Rating,
    /// Review text.
    pub review_text: String,
    /// Page to come back to after signing in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

/// Outcome of [`ClientContext::submit_review`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewSubmission {
    /// Written for moderation under this key.
    Submitted(PushKey),
    /// Staged; the visitor must sign in first.
    LoginRequired,
}

fn sort_newest_first(reviews: &mut [ProductReview]) {
    reviews.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

fn identify(product: ProductId, key: &str, mut review: ProductReview) -> ProductReview {
    review.product_id = Some(product);
    if review.id.is_none() {
        review.id = PushKey::new(key).ok();
    }
    review
}

async fn read_reviews(store: &dyn Store, product: ProductId) -> Result<Vec<ProductReview>> {
    let mut reviews: Vec<ProductReview> = store
        .list_as(&DbPath::product_reviews(product))
        .await?
        .into_iter()
        .map(|(key, review)| identify(product, &key, review))
        .collect();
    sort_newest_first(&mut reviews);
    Ok(reviews)
}

impl ClientContext {
    /// Approved reviews of `product`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn product_reviews(&self, product: ProductId) -> Result<Vec<ProductReview>> {
        let mut reviews = read_reviews(self.store(), product).await?;
        reviews.retain(|r| r.approved);
        Ok(reviews)
    }

    /// Average rating and count over the approved reviews of `product`.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn average_rating(&self, product: ProductId) -> Result<RatingSummary> {
        let reviews = self.product_reviews(product).await?;
        Ok(RatingSummary::from_ratings(reviews.iter().map(|r| r.rating)))
    }

    /// Submit a review for moderation, or stage it if nobody is signed in.
    ///
    /// # Errors
    ///
    /// Returns `WestpayError::MissingField` for an empty review, or an error
    /// if the write fails.
    pub async fn submit_review(&self, draft: ReviewDraft) -> Result<ReviewSubmission> {
        if draft.review_text.trim().is_empty() {
            return Err(WestpayError::MissingField("review").into());
        }

        let pending = PendingReview {
            key: PushKey::generate(),
            product_id: draft.product_id,
            rating: draft.rating,
            review_text: draft.review_text,
            return_url: draft.return_url,
        };

        let Some(user) = self.current_user() else {
            tracing::info!(product = %pending.product_id, "Review staged until sign-in");
            write_json(self.session_storage(), PENDING_REVIEW_KEY, &pending);
            return Ok(ReviewSubmission::LoginRequired);
        };

        let name = review_name(Some(user.name.as_str()), Some(user.email.as_str()));
        self.write_customer_review(&user.uid, &name, &pending).await?;
        Ok(ReviewSubmission::Submitted(pending.key))
    }

    /// The review staged before sign-in, if any.
    #[must_use]
    pub fn pending_review(&self) -> Option<PendingReview> {
        read_json(self.session_storage(), PENDING_REVIEW_KEY)
    }

    /// Submit the staged review, if any, as `uid`. The staging record is
    /// cleared only once the write succeeds.
    ///
    /// Returns the key of the submitted review.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails; the review stays staged.
    pub async fn flush_pending_review(&self, uid: &UserId, name: &str) -> Result<Option<PushKey>> {
        let Some(pending) = self.pending_review() else {
            return Ok(None);
        };

        self.write_customer_review(uid, name, &pending).await?;
        self.session_storage().remove(PENDING_REVIEW_KEY);
        Ok(Some(pending.key))
    }

    async fn write_customer_review(&self, uid: &UserId, name: &str, pending: &PendingReview) -> Result<()> {
        let review = ProductReview {
            id: Some(pending.key.clone()),
            ..ProductReview::customer(pending.rating, pending.review_text.clone(), name, uid.clone())
        };

        self.store()
            .set(
                &DbPath::review(pending.product_id, &pending.key),
                with_server_time(&review, &["timestamp"])?,
            )
            .await?;

        tracing::info!(
            user_id = %uid,
            product = %pending.product_id,
            review_id = %pending.key,
            "Review submitted for moderation"
        );
        Ok(())
    }
}

impl AdminConsole<'_> {
    /// Every review of every product, approved or not, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn all_reviews(&self) -> Result<Vec<ProductReview>> {
        let Some(Value::Object(products)) = self.store().get(&DbPath::all_product_reviews()).await? else {
            return Ok(Vec::new());
        };

        let mut all = Vec::new();
        for (product, node) in products {
            let Ok(product) = product.parse::<ProductId>() else {
                tracing::warn!(product = %product, "Skipping reviews of unknown product");
                continue;
            };
            let Some(Value::Object(reviews)) = node.get("reviews").cloned() else {
                continue;
            };
            for (key, review) in reviews {
                match serde_json::from_value(review) {
                    Ok(review) => all.push(identify(product, &key, review)),
                    Err(e) => tracing::warn!(product = %product, key = %key, error = %e, "Skipping malformed review"),
                }
            }
        }

        sort_newest_first(&mut all);
        Ok(all)
    }

    /// Every review of `product`, approved or not, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails.
    pub async fn reviews_for_product(&self, product: ProductId) -> Result<Vec<ProductReview>> {
        read_reviews(self.store(), product).await
    }

    /// Add a review from the console. It is approved unless `approved` is
    /// `Some(false)`.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn add_review(
        &self,
        product: ProductId,
        rating: Rating,
        text: &str,
        customer_name: Option<String>,
        approved: Option<bool>,
    ) -> Result<PushKey> {
        let key = PushKey::generate();
        let review = ProductReview {
            id: Some(key.clone()),
            ..ProductReview::admin(rating, text, customer_name, approved)
        };

        self.store()
            .set(
                &DbPath::review(product, &key),
                with_server_time(&review, &["timestamp"])?,
            )
            .await?;
        tracing::info!(product = %product, review_id = %key, "Review added");
        Ok(key)
    }

    /// Change some fields of a review.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn update_review(&self, product: ProductId, id: &PushKey, update: &ReviewUpdate) -> Result<()> {
        let fields = update.to_fields();
        if fields.is_empty() {
            return Ok(());
        }
        self.store().update(&DbPath::review(product, id), fields).await?;
        tracing::info!(product = %product, review_id = %id, "Review updated");
        Ok(())
    }

    /// Delete a review.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn delete_review(&self, product: ProductId, id: &PushKey) -> Result<()> {
        self.store().remove(&DbPath::review(product, id)).await?;
        tracing::info!(product = %product, review_id = %id, "Review deleted");
        Ok(())
    }

    /// Make a review visible to customers.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn approve_review(&self, product: ProductId, id: &PushKey) -> Result<()> {
        self.update_review(
            product,
            id,
            &ReviewUpdate {
                approved: Some(true),
                ..ReviewUpdate::default()
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_review_stored_shape() {
        let pending = PendingReview {
            key: PushKey::new("k1").unwrap(),
            product_id: ProductId::LazyPay,
            rating: Rating::new(4).unwrap(),
            review_text: "Fast".into(),
            return_url: Some("overview/product info/lazypay.html".into()),
        };
        let json = serde_json::to_value(&pending).unwrap();
        assert_eq!(json["productId"], "lazypay");
        assert_eq!(json["reviewText"], "Fast");
        assert_eq!(json["rating"], 4);
        assert_eq!(json["returnUrl"], "overview/product info/lazypay.html");
    }

    #[test]
    fn identify_sets_product_and_key() {
        let review: ProductReview = serde_json::from_value(serde_json::json!({ "review": "ok" })).unwrap();
        let review = identify(ProductId::Axio, "r9", review);
        assert_eq!(review.product_id, Some(ProductId::Axio));
        assert_eq!(review.id, Some(PushKey::new("r9").unwrap()));
    }
}
