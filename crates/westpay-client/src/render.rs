//! HTML fragments for amounts, ratings and reviews.
//!
//! Output carries class names only; styling belongs to the site.

use std::fmt::Write as _;

use westpay_core::{Money, ProductReview, Rating, RatingSummary};

/// Format an amount as rupees with Indian digit grouping: `₹12,34,567.50`.
#[must_use]
pub fn format_inr(amount: Money) -> String {
    let paise = amount.paise();
    let abs = paise.unsigned_abs();
    let rupees = (abs / 100).to_string();
    let fraction = abs % 100;

    // Last three digits form one group, the rest group in pairs.
    let grouped = if rupees.len() > 3 {
        let (head, tail) = rupees.split_at(rupees.len() - 3);
        let mut out = String::with_capacity(rupees.len() + rupees.len() / 2);
        for (i, c) in head.chars().enumerate() {
            if i > 0 && (head.len() - i) % 2 == 0 {
                out.push(',');
            }
            out.push(c);
        }
        out.push(',');
        out.push_str(tail);
        out
    } else {
        rupees
    };

    let sign = if paise < 0 { "-" } else { "" };
    format!("{sign}₹{grouped}.{fraction:02}")
}

/// Five star icons for `rating`: full stars, a half star for a remainder of
/// at least one half, then empty stars.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn render_stars(rating: f64) -> String {
    let max = usize::from(Rating::MAX.stars());
    let rating = if rating.is_finite() {
        rating.clamp(0.0, f64::from(Rating::MAX.stars()))
    } else {
        0.0
    };

    let full = rating.floor() as usize;
    let half = usize::from(full < max && rating - rating.floor() >= 0.5);
    let empty = max - full - half;

    let mut html = String::new();
    html.push_str(&r#"<i class="fas fa-star"></i>"#.repeat(full));
    html.push_str(&r#"<i class="fas fa-star-half-alt"></i>"#.repeat(half));
    html.push_str(&r#"<i class="far fa-star"></i>"#.repeat(empty));
    html
}

/// Escape text for an HTML text node or quoted attribute.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// The rating summary block shown above a product's reviews.
#[must_use]
pub fn render_review_summary(summary: &RatingSummary) -> String {
    let label = if summary.count == 1 { "Review" } else { "Reviews" };
    format!(
        r#"<div class="reviews-summary"><div class="stars-large">{}</div><span class="rating-value-large">{:.1}</span><span class="rating-count-text">{} {label}</span></div>"#,
        render_stars(summary.average),
        summary.average,
        summary.count,
    )
}

/// One review in the product page list.
#[must_use]
pub fn render_review_item(review: &ProductReview) -> String {
    let mut html = String::from(r#"<div class="review-item">"#);
    let _ = write!(
        html,
        r#"<div class="reviewer-name">{}</div><div class="review-rating">{}</div>"#,
        escape_html(&review.customer_name),
        render_stars(f64::from(review.rating.stars())),
    );
    if let Some(at) = review.timestamp.to_datetime() {
        let _ = write!(
            html,
            r#"<div class="review-date">{}</div>"#,
            at.format("%d %b %Y at %H:%M")
        );
    }
    let _ = write!(html, r#"<div class="review-text">{}</div></div>"#, escape_html(&review.review));
    html
}
