use std::str::FromStr;

use crate::Result;
use crate::error::Error;

/// Which configured secret signs a request.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum KeyRole {
    /// Merchant API key, used for payment, white-label and static wallet calls.
    #[default]
    Merchant,
    /// Payout API key, used for send/inquiry/list calls.
    Payout,
}

impl KeyRole {
    pub fn parse(value: &str) -> Result<KeyRole> {
        match value.trim().to_ascii_lowercase().as_str() {
            "merchant" => Ok(KeyRole::Merchant),
            "payout" => Ok(KeyRole::Payout),
            other => Err(Error::validation(format!(
                "invalid key role `{other}`; expected one of: merchant|payout"
            ))),
        }
    }
}

impl FromStr for KeyRole {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        KeyRole::parse(s)
    }
}

/// How the per-request replay nonce is produced.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum NoncePolicy {
    /// Short random alphanumeric token.
    #[default]
    Random,
    /// Fresh v4 UUID in simple (unhyphenated) form.
    Uuid,
}

/// Signing choices shared by every call made through a [`super::Client`].
///
/// `payment_key` covers payment creation and white-label checkout. Static
/// wallets always use the merchant key and payout calls always use the payout
/// key.
#[derive(Clone, Copy, Debug, Default)]
pub struct SigningPolicy {
    pub payment_key: KeyRole,
    pub nonce: NoncePolicy,
}

impl SigningPolicy {
    #[must_use]
    pub const fn with_payment_key(mut self, role: KeyRole) -> Self {
        self.payment_key = role;
        self
    }

    #[must_use]
    pub const fn with_nonce(mut self, nonce: NoncePolicy) -> Self {
        self.nonce = nonce;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_role_parses_case_insensitively() {
        assert_eq!(KeyRole::parse(" Merchant ").expect("role"), KeyRole::Merchant);
        assert_eq!("PAYOUT".parse::<KeyRole>().expect("role"), KeyRole::Payout);
        KeyRole::parse("admin").unwrap_err();
    }

    #[test]
    fn defaults_sign_payments_with_merchant_key() {
        let policy = SigningPolicy::default();
        assert_eq!(policy.payment_key, KeyRole::Merchant);
        assert_eq!(policy.nonce, NoncePolicy::Random);

        let policy = policy.with_payment_key(KeyRole::Payout).with_nonce(NoncePolicy::Uuid);
        assert_eq!(policy.payment_key, KeyRole::Payout);
        assert_eq!(policy.nonce, NoncePolicy::Uuid);
        assert_eq!(policy.payment_key.to_string(), "payout");
    }
}
