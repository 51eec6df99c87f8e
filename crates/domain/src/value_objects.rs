//! Value objects shared by the order and request aggregates.

use common::UserId;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Money amount represented in cents to avoid floating point issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money {
    /// Amount in cents (e.g., 1000 = $10.00)
    cents: i64,
}

impl Money {
    /// Creates a new Money amount from cents.
    pub fn from_cents(cents: i64) -> Self {
        Self { cents }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { cents: 0 }
    }

    /// Returns the amount in cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Returns the dollar portion (whole number).
    pub fn dollars(&self) -> i64 {
        self.cents / 100
    }

    /// Returns the cents portion (remainder after dollars).
    pub fn cents_part(&self) -> i64 {
        self.cents.abs() % 100
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.cents < 0
    }

    /// Multiplies by a quantity, saturating at the bounds of `i64`.
    ///
    /// Use [`checked_multiply`](Self::checked_multiply) when the result is
    /// going to be stored.
    pub fn multiply(&self, quantity: u32) -> Money {
        Money {
            cents: self.cents.saturating_mul(i64::from(quantity)),
        }
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    pub fn checked_multiply(&self, quantity: u32) -> Option<Money> {
        self.cents
            .checked_mul(i64::from(quantity))
            .map(Money::from_cents)
    }

    /// Adds two amounts, returning `None` on overflow.
    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.cents.checked_add(rhs.cents).map(Money::from_cents)
    }

    /// Subtracts two amounts, returning `None` on overflow.
    pub fn checked_sub(&self, rhs: Money) -> Option<Money> {
        self.cents.checked_sub(rhs.cents).map(Money::from_cents)
    }

    /// Returns `percent`% of this amount, rounded half-up to the cent.
    ///
    /// Returns `None` if the intermediate product overflows.
    pub fn checked_percent(&self, percent: u32) -> Option<Money> {
        let scaled = self.cents.checked_mul(i64::from(percent))?;
        let rounded = scaled.checked_add(50)?;
        Some(Money {
            cents: rounded.div_euclid(100),
        })
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.cents < 0 {
            write!(f, "-${}.{:02}", self.dollars().abs(), self.cents_part())
        } else {
            write!(f, "${}.{:02}", self.dollars(), self.cents_part())
        }
    }
}

// Operators saturate; totals that get persisted go through the checked_* methods.
impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents.saturating_add(rhs.cents),
        }
    }
}

impl std::ops::Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Self) -> Self::Output {
        Money {
            cents: self.cents.saturating_sub(rhs.cents),
        }
    }
}

/// Role of the caller, as resolved by the authentication layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Customer,
    Admin,
}

/// The authenticated caller of a core operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    /// Creates a customer actor.
    pub fn customer(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Customer,
        }
    }

    /// Creates an administrator actor.
    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id,
            role: Role::Admin,
        }
    }

    /// Returns true if the actor is an administrator.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Returns true if the actor owns the resource or is an administrator.
    pub fn can_access(&self, owner: UserId) -> bool {
        self.is_admin() || self.user_id == owner
    }

    /// Fails with `AccessDenied` unless the actor is an administrator.
    pub fn require_admin(&self, action: &str) -> Result<(), DomainError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(DomainError::AccessDenied(format!(
                "only administrators may {action}"
            )))
        }
    }
}

/// Shipping address captured on the order at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub recipient: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl ShippingAddress {
    /// Checks the fields required to deliver a parcel.
    pub fn validate(&self) -> Result<(), DomainError> {
        let required = [
            ("recipient", &self.recipient),
            ("line1", &self.line1),
            ("city", &self.city),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(DomainError::Validation(format!(
                    "shipping address {field} is required"
                )));
            }
        }
        Ok(())
    }
}

impl std::fmt::Display for ShippingAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.recipient, self.line1)?;
        if let Some(line2) = self.line2.as_deref().filter(|l| !l.trim().is_empty()) {
            write!(f, ", {line2}")?;
        }
        write!(f, ", {} {}, {}", self.city, self.postal_code, self.country)?;
        if let Some(phone) = &self.phone {
            write!(f, " (tel. {phone})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> ShippingAddress {
        ShippingAddress {
            recipient: "Ana Diaz".to_string(),
            line1: "12 Harbour St".to_string(),
            line2: None,
            city: "Lisbon".to_string(),
            postal_code: "1100-001".to_string(),
            country: "PT".to_string(),
            phone: None,
        }
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(1234).to_string(), "$12.34");
        assert_eq!(Money::from_cents(5).to_string(), "$0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-$12.34");
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!(a.multiply(3).cents(), 3000);
        assert_eq!(a.checked_multiply(3), Some(Money::from_cents(3000)));
        assert_eq!(a.checked_add(b), Some(Money::from_cents(1500)));
        assert_eq!(a.checked_sub(b), Some(Money::from_cents(500)));
    }

    #[test]
    fn test_money_checked_ops_detect_overflow() {
        let price = Money::from_cents(10_000_000_000);

        assert_eq!(price.checked_multiply(u32::MAX), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
        assert_eq!(Money::from_cents(i64::MIN).checked_sub(Money::from_cents(1)), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_percent(10), None);
        assert_eq!(price.multiply(u32::MAX).cents(), i64::MAX);
    }

    #[test]
    fn test_money_percent_rounds_half_up() {
        let pct = |cents: i64, percent: u32| Money::from_cents(cents).checked_percent(percent);
        assert_eq!(pct(1000, 10), Some(Money::from_cents(100)));
        assert_eq!(pct(1005, 10), Some(Money::from_cents(101)));
        assert_eq!(pct(1004, 10), Some(Money::from_cents(100)));
        assert_eq!(pct(999, 0), Some(Money::zero()));
    }

    #[test]
    fn test_actor_access() {
        let owner = UserId::new();
        assert!(Actor::customer(owner).can_access(owner));
        assert!(!Actor::customer(UserId::new()).can_access(owner));
        assert!(Actor::admin(UserId::new()).can_access(owner));
    }

    #[test]
    fn test_require_admin() {
        assert!(Actor::admin(UserId::new()).require_admin("decide").is_ok());
        let result = Actor::customer(UserId::new()).require_admin("decide");
        assert!(matches!(result, Err(DomainError::AccessDenied(_))));
    }

    #[test]
    fn test_address_validation() {
        assert!(address().validate().is_ok());

        let mut missing_city = address();
        missing_city.city = "  ".to_string();
        assert!(matches!(
            missing_city.validate(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_address_display() {
        let mut addr = address();
        addr.phone = Some("+351 900 000 000".to_string());
        assert_eq!(
            addr.to_string(),
            "Ana Diaz, 12 Harbour St, Lisbon 1100-001, PT (tel. +351 900 000 000)"
        );
    }
}
