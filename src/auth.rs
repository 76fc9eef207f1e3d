//! Request canonicalization and HMAC-SHA256 signing.
//!
//! A payload is signed by serializing it to a JSON object, dropping null
//! fields, sorting the remaining keys, rendering each pair as `key:value` and
//! joining the pairs with `|`. The lowercase hex HMAC-SHA256 of that string is
//! sent alongside the payload as its `sign` field.

use hmac::{Hmac, Mac as _};
use rand::Rng as _;
use rand::distr::Alphanumeric;
use secrecy::{ExposeSecret as _, SecretString};
use serde::Serialize;
use serde_json::Value;
use sha2::Sha256;
use uuid::Uuid;

use crate::Result;
use crate::error::Error;
use crate::gateway::NoncePolicy;

type HmacSha256 = Hmac<Sha256>;

const NONCE_LEN: usize = 12;
const SIGN_FIELD: &str = "sign";

/// A payload together with its signature, serialized as the payload's own
/// fields in declaration order followed by `sign`.
#[non_exhaustive]
#[derive(Clone, Debug, Serialize)]
pub struct SignedEnvelope<T> {
    #[serde(flatten)]
    pub payload: T,
    pub sign: String,
}

impl<T: Serialize> SignedEnvelope<T> {
    pub fn new(payload: T, secret: &SecretString) -> Result<Self> {
        let sign = sign(&payload, secret)?;
        Ok(Self { payload, sign })
    }
}

/// Renders `payload` in the canonical `k1:v1|k2:v2` form that gets signed.
///
/// Strings are written without quotes, numbers and booleans by their literal
/// form, and nested arrays or objects as compact JSON.
pub fn canonical_string<T: Serialize + ?Sized>(payload: &T) -> Result<String> {
    let Value::Object(fields) = serde_json::to_value(payload)? else {
        return Err(Error::validation(
            "signed payload must serialize to a JSON object",
        ));
    };

    // Map iteration order depends on serde_json's `preserve_order` feature.
    let mut pairs: Vec<(String, Value)> = fields
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .collect();
    pairs.sort_by(|(a, _), (b, _)| a.cmp(b));

    Ok(pairs
        .iter()
        .map(|(key, value)| format!("{key}:{}", render(value)))
        .collect::<Vec<_>>()
        .join("|"))
}

/// Signs `payload` with `secret`, returning the lowercase hex digest.
pub fn sign<T: Serialize + ?Sized>(payload: &T, secret: &SecretString) -> Result<String> {
    let canonical = canonical_string(payload)?;
    let mut mac = hmac(secret)?;
    mac.update(canonical.as_bytes());

    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks `signature` against `payload` in constant time.
///
/// A signature that is not valid hex is reported as a mismatch.
pub fn verify<T: Serialize + ?Sized>(
    payload: &T,
    signature: &str,
    secret: &SecretString,
) -> Result<bool> {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return Ok(false);
    };

    let canonical = canonical_string(payload)?;
    let mut mac = hmac(secret)?;
    mac.update(canonical.as_bytes());

    Ok(mac.verify_slice(&expected).is_ok())
}

/// Verifies a received JSON object that carries its signature in `sign`,
/// such as a gateway callback body.
pub fn verify_envelope(body: &Value, secret: &SecretString) -> Result<bool> {
    let Value::Object(fields) = body else {
        return Err(Error::validation("signed body must be a JSON object"));
    };
    let Some(Value::String(signature)) = fields.get(SIGN_FIELD) else {
        return Err(Error::validation("signed body has no `sign` field"));
    };

    let mut payload = fields.clone();
    payload.remove(SIGN_FIELD);
    verify(&payload, signature, secret)
}

/// Produces a replay-protection nonce according to `policy`.
#[must_use]
pub fn generate_nonce(policy: NoncePolicy) -> String {
    match policy {
        NoncePolicy::Random => rand::rng()
            .sample_iter(Alphanumeric)
            .take(NONCE_LEN)
            .map(char::from)
            .collect(),
        NoncePolicy::Uuid => Uuid::new_v4().simple().to_string(),
    }
}

fn hmac(secret: &SecretString) -> Result<HmacSha256> {
    HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| Error::validation(format!("invalid signing key: {e}")))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
