use std::fmt;
use std::str::FromStr;

use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;
use crate::error::Error;

pub use rust_decimal::Decimal;

/// Decimal places used for fiat-denominated payment amounts.
pub const FIAT_DECIMALS: u32 = 2;
/// Decimal places used for cryptocurrency payout amounts.
pub const CRYPTO_DECIMALS: u32 = 8;

const ORDER_ID_LEN: usize = 8;

/// Short merchant order reference: 8 uppercase ASCII alphanumerics.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderId(String);

impl OrderId {
    /// Generates a fresh id from the leading characters of a random v4 UUID.
    #[must_use]
    pub fn generate() -> Self {
        let id = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(ORDER_ID_LEN)
            .map(|c| c.to_ascii_uppercase())
            .collect();

        Self(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for OrderId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.len() != ORDER_ID_LEN
            || !s
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        {
            return Err(Error::validation(format!(
                "order id `{s}` must be {ORDER_ID_LEN} uppercase alphanumeric characters"
            )));
        }

        Ok(Self(s.to_owned()))
    }
}

impl TryFrom<String> for OrderId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<OrderId> for String {
    fn from(id: OrderId) -> Self {
        id.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Generates a new [`OrderId`].
#[must_use]
pub fn generate_order_id() -> OrderId {
    OrderId::generate()
}

/// Formats a strictly positive amount with exactly `decimals` fractional digits.
///
/// Excess precision is rounded half away from zero; missing digits are padded
/// with zeros. Amounts that round to zero are rejected.
pub fn format_amount(amount: Decimal, decimals: u32) -> Result<String> {
    if amount.is_sign_negative() || amount.is_zero() {
        return Err(Error::validation(format!(
            "amount must be positive, got {amount}"
        )));
    }

    let mut fixed = amount.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
    if fixed.is_zero() {
        return Err(Error::validation(format!(
            "amount {amount} rounds to zero at {decimals} decimal places"
        )));
    }
    fixed.rescale(decimals);
    if fixed.scale() != decimals {
        return Err(Error::validation(format!(
            "amount {amount} cannot be represented with {decimals} decimal places"
        )));
    }
    Ok(fixed.to_string())
}
