//! Order pricing: fixed shipping fee and named percentage discounts.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::value_objects::Money;

/// Default flat shipping fee in cents.
pub const DEFAULT_SHIPPING_FEE_CENTS: i64 = 500;

/// Default discount table, as `CODE:PERCENT` pairs.
pub const DEFAULT_DISCOUNT_CODES: &str = "SAVE10:10,SAVE20:20,WELCOME5:5";

/// Pricing rules applied once, when an order is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingConfig {
    pub shipping_fee: Money,
    discount_codes: HashMap<String, u32>,
}

impl PricingConfig {
    /// Creates a pricing configuration.
    ///
    /// Code lookups are case-insensitive, so keys are normalised here.
    pub fn new(shipping_fee: Money, discount_codes: HashMap<String, u32>) -> Self {
        Self {
            shipping_fee,
            discount_codes: discount_codes
                .into_iter()
                .map(|(code, pct)| (normalize_code(&code), pct))
                .collect(),
        }
    }

    /// Returns the percent-off for a code, if the code is known.
    pub fn discount_percent(&self, code: &str) -> Option<u32> {
        self.discount_codes.get(&normalize_code(code)).copied()
    }

    /// Prices a subtotal.
    ///
    /// Unknown codes apply no discount and are not recorded. The discount is
    /// always taken from the raw subtotal. Fails if any amount leaves the
    /// range of [`Money`].
    pub fn price(
        &self,
        subtotal: Money,
        discount_code: Option<&str>,
    ) -> Result<PriceBreakdown, DomainError> {
        let applied = discount_code
            .and_then(|code| self.discount_percent(code).map(|pct| (normalize_code(code), pct)));

        let (discount_code, discount_percent) = match applied {
            Some((code, pct)) => (Some(code), pct),
            None => (None, 0),
        };
        let discount = subtotal
            .checked_percent(discount_percent)
            .ok_or_else(out_of_range)?;
        let total = subtotal
            .checked_add(self.shipping_fee)
            .and_then(|gross| gross.checked_sub(discount))
            .ok_or_else(out_of_range)?;

        Ok(PriceBreakdown {
            subtotal,
            shipping_fee: self.shipping_fee,
            discount,
            discount_code,
            discount_percent,
            total,
        })
    }
}

impl Default for PricingConfig {
    fn default() -> Self {
        let codes = parse_discount_codes(DEFAULT_DISCOUNT_CODES).unwrap_or_default();
        Self::new(Money::from_cents(DEFAULT_SHIPPING_FEE_CENTS), codes)
    }
}

/// Amounts computed at order creation. Never recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub discount: Money,
    pub discount_code: Option<String>,
    pub discount_percent: u32,
    pub total: Money,
}

/// Parses a discount table written as `CODE:PERCENT,CODE:PERCENT`.
pub fn parse_discount_codes(spec: &str) -> Result<HashMap<String, u32>, String> {
    let mut codes = HashMap::new();
    for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (code, pct) = entry
            .split_once(':')
            .ok_or_else(|| format!("discount entry '{entry}' is not CODE:PERCENT"))?;
        let pct: u32 = pct
            .trim()
            .parse()
            .map_err(|e| format!("discount entry '{entry}': {e}"))?;
        if pct > 100 {
            return Err(format!("discount entry '{entry}': percent exceeds 100"));
        }
        codes.insert(normalize_code(code), pct);
    }
    Ok(codes)
}

pub(crate) fn out_of_range() -> DomainError {
    DomainError::Validation("order total is out of range".to_string())
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_code_discounts_raw_subtotal() {
        let pricing = PricingConfig::default();
        let breakdown = pricing
            .price(Money::from_cents(10_000), Some("SAVE10"))
            .unwrap();

        assert_eq!(breakdown.discount.cents(), 1_000);
        assert_eq!(breakdown.shipping_fee.cents(), 500);
        assert_eq!(breakdown.total.cents(), 10_000 + 500 - 1_000);
        assert_eq!(breakdown.discount_code.as_deref(), Some("SAVE10"));
    }

    #[test]
    fn test_unknown_code_applies_no_discount() {
        let pricing = PricingConfig::default();
        let breakdown = pricing
            .price(Money::from_cents(2_000), Some("BOGUS"))
            .unwrap();

        assert_eq!(breakdown.discount, Money::zero());
        assert_eq!(breakdown.discount_code, None);
        assert_eq!(breakdown.total.cents(), 2_500);
    }

    #[test]
    fn test_subtotal_near_limit_is_rejected() {
        let pricing = PricingConfig::default();
        let result = pricing.price(Money::from_cents(i64::MAX - 100), None);

        assert!(
            matches!(result, Err(DomainError::Validation(ref msg)) if msg == "order total is out of range")
        );
    }

    #[test]
    fn test_code_lookup_is_case_insensitive() {
        let pricing = PricingConfig::default();
        assert_eq!(pricing.discount_percent(" save20 "), Some(20));
    }

    #[test]
    fn test_parse_discount_codes() {
        let codes = parse_discount_codes("a:5, B:50").unwrap();
        assert_eq!(codes.get("A"), Some(&5));
        assert_eq!(codes.get("B"), Some(&50));

        assert!(parse_discount_codes("NOPCT").is_err());
        assert!(parse_discount_codes("X:abc").is_err());
        assert!(parse_discount_codes("X:101").is_err());
        assert!(parse_discount_codes("").unwrap().is_empty());
    }
}
