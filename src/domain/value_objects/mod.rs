//! Value objects for the storefront domain

use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency every price in the catalog is denominated in.
pub const CURRENCY: &str = "NPR";

/// Prefix of every human-readable order id.
pub const ORDER_ID_PREFIX: &str = "DOPE";

const ORDER_ID_SUFFIX_LEN: usize = 9;
const ORDER_ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_string() } }
    pub fn npr(amount: Decimal) -> Self { Self::new(amount, CURRENCY) }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn add(&self, other: &Money) -> Result<Money, MoneyError> {
        if self.currency != other.currency { return Err(MoneyError::CurrencyMismatch); }
        Ok(Money::new(self.amount + other.amount, &self.currency))
    }
    pub fn multiply(&self, qty: u32) -> Money { Money::new(self.amount * Decimal::from(qty), &self.currency) }
}

impl Default for Money { fn default() -> Self { Self::zero(CURRENCY) } }

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} {}", self.currency, self.amount) }
}

#[derive(Debug, Clone)] pub enum MoneyError { CurrencyMismatch }
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Currency mismatch") }
}

/// Nepali phone number, normalized to `+977` followed by ten digits.
///
/// Customers type anything from a bare ten-digit mobile number to a fully
/// prefixed international one; `normalize` maps all of them onto the same
/// canonical form and is idempotent on already-normalized input.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub fn normalize(raw: &str) -> Result<Self, PhoneError> {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
        if compact.is_empty() { return Err(PhoneError::Empty); }

        let local = if let Some(rest) = compact.strip_prefix("+977") {
            rest.to_string()
        } else if let Some(rest) = compact.strip_prefix("977") {
            // User typed the prefix digits without the plus.
            if rest.len() == 10 { rest.to_string() } else { compact.clone() }
        } else {
            compact.clone()
        };

        if local.len() != 10 || !local.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PhoneError::InvalidFormat);
        }
        if !local.starts_with('9') {
            return Err(PhoneError::InvalidFormat);
        }
        Ok(Self(format!("+977{local}")))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum PhoneError { Empty, InvalidFormat }
impl std::error::Error for PhoneError {}
impl fmt::Display for PhoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Phone number empty"),
            Self::InvalidFormat => write!(f, "Phone number must be +977 followed by ten digits"),
        }
    }
}

/// Human-readable order id: `DOPE-<millis>-<nine uppercase alphanumerics>`.
///
/// Distinct from the database primary key; generated client-side at
/// submission time, so two submissions of the same cart get different ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderId(String);

impl OrderId {
    pub fn generate() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let mut rng = rand::thread_rng();
        let suffix: String = (0..ORDER_ID_SUFFIX_LEN)
            .map(|_| ORDER_ID_CHARSET[rng.gen_range(0..ORDER_ID_CHARSET.len())] as char)
            .collect();
        Self(format!("{ORDER_ID_PREFIX}-{millis}-{suffix}"))
    }

    pub fn parse(value: impl Into<String>) -> Result<Self, OrderIdError> {
        let value = value.into();
        let mut parts = value.splitn(3, '-');
        let (prefix, millis, suffix) = match (parts.next(), parts.next(), parts.next()) {
            (Some(p), Some(m), Some(s)) => (p, m, s),
            _ => return Err(OrderIdError::InvalidFormat),
        };
        if prefix != ORDER_ID_PREFIX
            || millis.is_empty()
            || !millis.bytes().all(|b| b.is_ascii_digit())
            || suffix.len() != ORDER_ID_SUFFIX_LEN
            || !suffix.bytes().all(|b| ORDER_ID_CHARSET.contains(&b))
        {
            return Err(OrderIdError::InvalidFormat);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl TryFrom<String> for OrderId {
    type Error = OrderIdError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Self::parse(value) }
}

impl From<OrderId> for String {
    fn from(id: OrderId) -> Self { id.0 }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum OrderIdError { InvalidFormat }
impl std::error::Error for OrderIdError {}
impl fmt::Display for OrderIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Order id must look like {ORDER_ID_PREFIX}-<millis>-<9 chars>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_add() {
        let a = Money::npr(Decimal::new(100, 0));
        let b = Money::npr(Decimal::new(50, 0));
        assert_eq!(a.add(&b).unwrap().amount(), Decimal::new(150, 0));
    }

    #[test]
    fn test_money_currency_mismatch() {
        let a = Money::npr(Decimal::ONE);
        let b = Money::new(Decimal::ONE, "USD");
        assert!(a.add(&b).is_err());
    }

    #[test]
    fn test_money_multiply() {
        let unit = Money::npr(Decimal::new(5999, 2));
        assert_eq!(unit.multiply(3).amount(), Decimal::new(17997, 2));
    }

    #[test]
    fn test_phone_prepends_prefix_to_raw_digits() {
        let phone = PhoneNumber::normalize("9812345678").unwrap();
        assert_eq!(phone.as_str(), "+9779812345678");
    }

    #[test]
    fn test_phone_normalization_is_idempotent() {
        let once = PhoneNumber::normalize("9812345678").unwrap();
        let twice = PhoneNumber::normalize(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_phone_accepts_prefix_digits_without_plus() {
        let phone = PhoneNumber::normalize("9779812345678").unwrap();
        assert_eq!(phone.as_str(), "+9779812345678");
    }

    #[test]
    fn test_phone_strips_separators() {
        let phone = PhoneNumber::normalize("+977 981-234-5678").unwrap();
        assert_eq!(phone.as_str(), "+9779812345678");
    }

    #[test]
    fn test_phone_rejects_bad_input() {
        assert_eq!(PhoneNumber::normalize(""), Err(PhoneError::Empty));
        assert_eq!(PhoneNumber::normalize("12345"), Err(PhoneError::InvalidFormat));
        assert_eq!(PhoneNumber::normalize("abcdefghij"), Err(PhoneError::InvalidFormat));
        assert_eq!(PhoneNumber::normalize("0812345678"), Err(PhoneError::InvalidFormat));
        // Eleven local digits.
        assert_eq!(PhoneNumber::normalize("+97798123456789"), Err(PhoneError::InvalidFormat));
    }

    #[test]
    fn test_order_id_shape() {
        let id = OrderId::generate();
        let parts: Vec<&str> = id.as_str().splitn(3, '-').collect();
        assert_eq!(parts[0], "DOPE");
        assert!(parts[1].bytes().all(|b| b.is_ascii_digit()));
        assert_eq!(parts[2].len(), 9);
        assert!(parts[2].bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
    }

    #[test]
    fn test_order_id_roundtrip() {
        let id = OrderId::generate();
        assert_eq!(OrderId::parse(id.as_str()).unwrap(), id);
    }

    #[test]
    fn test_order_id_rejects_foreign_shapes() {
        assert!(OrderId::parse("ORD-1700000000000-ABCDEFGHI").is_err());
        assert!(OrderId::parse("DOPE-abc-ABCDEFGHI").is_err());
        assert!(OrderId::parse("DOPE-1700000000000-short").is_err());
        assert!(OrderId::parse("DOPE-1700000000000-abcdefghi").is_err());
        assert!(OrderId::parse("DOPE-1700000000000").is_err());
    }
}
