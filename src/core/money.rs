use crate::constants::SUPPORTED_CURRENCIES;
use crate::core::errors::WarikanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Three-letter uppercase currency code from the supported table.
///
/// Construction always validates, so a `CurrencyCode` in hand is known to be
/// well formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "JPY")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn parse(code: &str) -> Result<Self, WarikanError> {
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(WarikanError::invalid_input(
                "currency_code",
                "Invalid currency_code",
                "Currency code must be exactly 3 uppercase letters",
            ));
        }
        if !SUPPORTED_CURRENCIES.contains(&code) {
            return Err(WarikanError::UnsupportedCurrency(code.to_string()));
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = WarikanError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// Integer amount in minor units tagged with its currency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Money {
    amount: i64,
    currency: CurrencyCode,
}

impl Money {
    pub fn new(amount: i64, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn currency(&self) -> &CurrencyCode {
        &self.currency
    }

    pub fn checked_add(&self, other: &Money) -> Result<Money, WarikanError> {
        self.ensure_same_currency(other)?;
        let amount = self.amount.checked_add(other.amount).ok_or(WarikanError::AmountOverflow)?;
        Ok(Money::new(amount, self.currency.clone()))
    }

    pub fn checked_sub(&self, other: &Money) -> Result<Money, WarikanError> {
        self.ensure_same_currency(other)?;
        let amount = self.amount.checked_sub(other.amount).ok_or(WarikanError::AmountOverflow)?;
        Ok(Money::new(amount, self.currency.clone()))
    }

    fn ensure_same_currency(&self, other: &Money) -> Result<(), WarikanError> {
        if self.currency != other.currency {
            return Err(WarikanError::CurrencyMismatch {
                expected: self.currency.to_string(),
                actual: other.currency.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpy() -> CurrencyCode {
        CurrencyCode::parse("JPY").unwrap()
    }

    #[test]
    fn currency_code_must_be_three_uppercase_letters() {
        assert!(CurrencyCode::parse("JPY").is_ok());
        assert!(matches!(CurrencyCode::parse("jpy"), Err(WarikanError::InvalidInput(..))));
        assert!(matches!(CurrencyCode::parse("JP"), Err(WarikanError::InvalidInput(..))));
        assert!(matches!(CurrencyCode::parse("JPYY"), Err(WarikanError::InvalidInput(..))));
    }

    #[test]
    fn unknown_currency_is_unsupported() {
        assert_eq!(
            CurrencyCode::parse("ZZZ"),
            Err(WarikanError::UnsupportedCurrency("ZZZ".to_string()))
        );
    }

    #[test]
    fn currency_code_deserializes_with_validation() {
        let code: CurrencyCode = serde_json::from_str("\"USD\"").unwrap();
        assert_eq!(code.as_str(), "USD");
        assert!(serde_json::from_str::<CurrencyCode>("\"usd\"").is_err());
    }

    #[test]
    fn checked_add_detects_overflow() {
        let a = Money::new(i64::MAX, jpy());
        let b = Money::new(1, jpy());
        assert_eq!(a.checked_add(&b), Err(WarikanError::AmountOverflow));
        assert_eq!(b.checked_add(&b).unwrap().amount(), 2);
    }

    #[test]
    fn checked_sub_detects_overflow() {
        let a = Money::new(i64::MIN, jpy());
        let b = Money::new(1, jpy());
        assert_eq!(a.checked_sub(&b), Err(WarikanError::AmountOverflow));
    }

    #[test]
    fn mixing_currencies_is_rejected() {
        let yen = Money::new(100, jpy());
        let dollars = Money::new(100, CurrencyCode::parse("USD").unwrap());
        assert!(matches!(yen.checked_add(&dollars), Err(WarikanError::CurrencyMismatch { .. })));
    }
}
