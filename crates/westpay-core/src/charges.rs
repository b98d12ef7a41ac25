//! Withdrawal charge calculator.
//!
//! Charges are a percentage of the withdrawal amount; GST is charged on the
//! charges, not on the amount. All rates are in basis points (725 = 7.25 %).

use serde::{Deserialize, Serialize};

use crate::{Money, WestpayError};

/// Default charge rate for EMI products.
pub const DEFAULT_RATE_BPS: i64 = 725;

/// Standard GST rate.
pub const DEFAULT_GST_BPS: i64 = 1_800;

/// A product selectable in the charge calculator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeProduct {
    /// No specific product.
    #[default]
    Generic,
    /// Bajaj Finserv EMI card.
    Bajaj,
    /// HDFC `EasyEMI`.
    #[serde(rename = "hdfc_easyemi")]
    HdfcEasyEmi,
    /// Home Credit.
    HomeCredit,
    /// Zest Money.
    #[serde(rename = "zestmoney")]
    ZestMoney,
    /// Axio.
    Axio,
    /// IDFC Buy EMI.
    IdfcBuyEmi,
    /// `LazyPay`.
    #[serde(rename = "lazypay")]
    LazyPay,
    /// Mobikwik Zip.
    MobikwikZip,
    /// Credit card.
    CreditCard,
}

impl ChargeProduct {
    /// Default charge rate, in basis points.
    #[must_use]
    pub const fn rate_bps(self) -> i64 {
        match self {
            Self::CreditCard => 50,
            _ => DEFAULT_RATE_BPS,
        }
    }

    /// GST rate on the charges, in basis points.
    #[must_use]
    pub const fn gst_bps(self) -> i64 {
        match self {
            Self::CreditCard => 500,
            _ => DEFAULT_GST_BPS,
        }
    }

    /// Smallest amount the product accepts.
    #[must_use]
    pub const fn minimum(self) -> Money {
        Money::from_rupees(match self {
            Self::Generic => 1_000,
            Self::Axio => 5_000,
            Self::LazyPay => 10_000,
            Self::HdfcEasyEmi
            | Self::HomeCredit
            | Self::IdfcBuyEmi
            | Self::MobikwikZip
            | Self::CreditCard => 20_000,
            Self::Bajaj | Self::ZestMoney => 30_000,
        })
    }
}

/// The result of a charge calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChargeQuote {
    /// Amount being withdrawn.
    pub amount: Money,
    /// Charges on the amount.
    pub charges: Money,
    /// GST on the charges.
    pub gst: Money,
    /// Total payable: charges plus GST.
    pub net: Money,
}

impl ChargeQuote {
    /// Quote at the product's default rate.
    ///
    /// # Errors
    ///
    /// Returns [`WestpayError::InvalidAmount`] below the product minimum.
    pub fn for_product(product: ChargeProduct, amount: Money) -> Result<Self, WestpayError> {
        Self::with_rate(product, amount, product.rate_bps())
    }

    /// Quote at a caller-chosen rate. The product still decides the minimum
    /// and the GST rate.
    ///
    /// # Errors
    ///
    /// Returns [`WestpayError::InvalidAmount`] below the product minimum or
    /// for a negative rate.
    pub fn with_rate(
        product: ChargeProduct,
        amount: Money,
        rate_bps: i64,
    ) -> Result<Self, WestpayError> {
        let minimum = product.minimum();
        if amount < minimum {
            return Err(WestpayError::InvalidAmount(format!(
                "please enter at least the minimum amount: {minimum}"
            )));
        }
        if rate_bps < 0 {
            return Err(WestpayError::InvalidAmount(format!(
                "charge rate cannot be negative: {rate_bps} bps"
            )));
        }

        let charges = amount.percent_bps(rate_bps);
        let gst = charges.percent_bps(product.gst_bps());
        Ok(Self {
            amount,
            charges,
            gst,
            net: charges + gst,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_quote() {
        let quote = ChargeQuote::for_product(ChargeProduct::Generic, Money::from_rupees(10_000)).unwrap();
        assert_eq!(quote.charges, Money::from_rupees(725));
        assert_eq!(quote.gst, Money::from_decimal(130.5));
        assert_eq!(quote.net, Money::from_decimal(855.5));
    }

    #[test]
    fn credit_card_uses_lower_rates() {
        let quote =
            ChargeQuote::for_product(ChargeProduct::CreditCard, Money::from_rupees(20_000)).unwrap();
        assert_eq!(quote.charges, Money::from_rupees(100));
        assert_eq!(quote.gst, Money::from_rupees(5));
        assert_eq!(quote.net, Money::from_rupees(105));
    }

    #[test]
    fn below_minimum_is_rejected() {
        let err = ChargeQuote::for_product(ChargeProduct::Bajaj, Money::from_rupees(29_999)).unwrap_err();
        assert!(matches!(err, WestpayError::InvalidAmount(_)));
    }

    #[test]
    fn custom_rate() {
        let quote =
            ChargeQuote::with_rate(ChargeProduct::Axio, Money::from_rupees(5_000), 1_000).unwrap();
        assert_eq!(quote.charges, Money::from_rupees(500));
        assert_eq!(quote.gst, Money::from_rupees(90));
    }

    #[test]
    fn product_keys() {
        let p: ChargeProduct = serde_json::from_str("\"hdfc_easyemi\"").unwrap();
        assert_eq!(p, ChargeProduct::HdfcEasyEmi);
        assert_eq!(p.minimum(), Money::from_rupees(20_000));
    }
}
