use secrecy::{ExposeSecret as _, SecretString};
use url::Url;

use crate::Result;
use crate::error::{Error, Operation};
use crate::gateway::policy::{KeyRole, SigningPolicy};

pub const DEFAULT_BASE_URL: &str = "https://api.oxapay.com";

pub const ENV_BASE_URL: &str = "OXAPAY_BASE_URL";
pub const ENV_MERCHANT_KEY: &str = "OXAPAY_MERCHANT_KEY";
pub const ENV_PAYOUT_KEY: &str = "OXAPAY_PAYOUT_KEY";
pub const ENV_CALLBACK_ORIGIN: &str = "OXAPAY_CALLBACK_ORIGIN";
pub const ENV_PAYMENT_KEY_ROLE: &str = "OXAPAY_PAYMENT_KEY_ROLE";

const CALLBACK_PATH: &str = "payment/callback";
const SUCCESS_PATH: &str = "payment/success";
const FAIL_PATH: &str = "payment/failed";

/// Gateway endpoint paths, resolved relative to the base URL.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Endpoints {
    pub payment: String,
    pub static_wallet: String,
    pub white_label: String,
    pub payout: String,
    pub payout_info: String,
    pub payout_history: String,
    pub server_ip: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            payment: "merchants/request".to_owned(),
            static_wallet: "merchants/request/staticaddress".to_owned(),
            white_label: "merchants/request/whitelabel".to_owned(),
            payout: "api/send".to_owned(),
            payout_info: "api/inquiry".to_owned(),
            payout_history: "api/list".to_owned(),
            server_ip: "api/myip".to_owned(),
        }
    }
}

impl Endpoints {
    /// Path serving `operation`.
    #[must_use]
    pub fn path(&self, operation: Operation) -> &str {
        match operation {
            Operation::CreatePayment => &self.payment,
            Operation::CreateStaticWallet => &self.static_wallet,
            Operation::CreateWhiteLabel => &self.white_label,
            Operation::CreatePayout => &self.payout,
            Operation::PayoutInfo => &self.payout_info,
            Operation::PayoutHistory => &self.payout_history,
            Operation::ServerIp => &self.server_ip,
        }
    }
}

/// Raw values typically read from the environment or app-level config.
#[derive(Clone, Debug)]
pub struct RawConfig {
    pub base_url: Option<String>,
    pub merchant_key: SecretString,
    pub payout_key: Option<SecretString>,
    pub callback_origin: String,
    pub payment_key_role: Option<String>,
}

impl RawConfig {
    /// Reads `OXAPAY_*` variables from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a raw config from any name-to-value lookup. Blank values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let merchant_key = get(ENV_MERCHANT_KEY)
            .ok_or_else(|| Error::validation(format!("{ENV_MERCHANT_KEY} is not set")))?;
        let callback_origin = get(ENV_CALLBACK_ORIGIN)
            .ok_or_else(|| Error::validation(format!("{ENV_CALLBACK_ORIGIN} is not set")))?;

        Ok(Self {
            base_url: get(ENV_BASE_URL),
            merchant_key: SecretString::from(merchant_key),
            payout_key: get(ENV_PAYOUT_KEY).map(SecretString::from),
            callback_origin,
            payment_key_role: get(ENV_PAYMENT_KEY_ROLE),
        })
    }
}

/// Client configuration.
///
/// Secrets are held as [`SecretString`] and never show up in `Debug` output.
#[derive(Clone, Debug)]
pub struct Config {
    pub base_url: Url,
    pub merchant_key: SecretString,
    pub payout_key: Option<SecretString>,
    /// Origin of the merchant deployment; callback and redirect URLs hang off it.
    pub callback_origin: Url,
    pub endpoints: Endpoints,
    pub policy: SigningPolicy,
}

impl Config {
    pub fn from_raw(raw: RawConfig) -> Result<Self> {
        let base_url = Url::parse(raw.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL))?;
        let callback_origin = Url::parse(&raw.callback_origin)?;
        let payment_key = raw
            .payment_key_role
            .as_deref()
            .map_or(Ok(KeyRole::default()), KeyRole::parse)?;

        Self::new(
            base_url,
            raw.merchant_key,
            raw.payout_key,
            callback_origin,
            SigningPolicy::default().with_payment_key(payment_key),
        )
    }

    pub fn from_env() -> Result<Self> {
        Self::from_raw(RawConfig::from_env()?)
    }

    pub fn new(
        base_url: Url,
        merchant_key: SecretString,
        payout_key: Option<SecretString>,
        callback_origin: Url,
        policy: SigningPolicy,
    ) -> Result<Self> {
        if merchant_key.expose_secret().trim().is_empty() {
            return Err(Error::validation("merchant key must not be empty"));
        }
        if payout_key
            .as_ref()
            .is_some_and(|key| key.expose_secret().trim().is_empty())
        {
            return Err(Error::validation(
                "payout key must not be empty when provided",
            ));
        }
        if policy.payment_key == KeyRole::Payout && payout_key.is_none() {
            return Err(Error::validation(
                "payment calls are configured to sign with the payout key, but no payout key is set",
            ));
        }

        Ok(Self {
            base_url: as_base(base_url, "base url")?,
            merchant_key,
            payout_key,
            callback_origin: as_base(callback_origin, "callback origin")?,
            endpoints: Endpoints::default(),
            policy,
        })
    }

    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub(crate) fn secret(&self, role: KeyRole) -> Result<&SecretString> {
        match role {
            KeyRole::Merchant => Ok(&self.merchant_key),
            KeyRole::Payout => self
                .payout_key
                .as_ref()
                .ok_or_else(|| Error::validation("payout key is not configured")),
        }
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    pub(crate) fn callback_urls(&self) -> Result<CallbackUrls> {
        Ok(CallbackUrls {
            callback: self.callback_origin.join(CALLBACK_PATH)?,
            success: self.callback_origin.join(SUCCESS_PATH)?,
            fail: self.callback_origin.join(FAIL_PATH)?,
        })
    }
}

/// Where the gateway notifies the merchant and redirects the payer.
#[derive(Clone, Debug)]
pub(crate) struct CallbackUrls {
    pub callback: Url,
    pub success: Url,
    pub fail: Url,
}

/// Requires an http(s) URL and makes its path end in `/` so relative paths
/// join beneath it.
fn as_base(mut url: Url, what: &str) -> Result<Url> {
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::validation(format!(
            "{what} must use http or https, got `{}`",
            url.scheme()
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret as _;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    fn raw(vars: &[(&str, &str)]) -> RawConfig {
        RawConfig::from_lookup(lookup(vars)).expect("raw config")
    }

    #[test]
    fn from_lookup_requires_merchant_key_and_origin() {
        let err = RawConfig::from_lookup(lookup(&[(ENV_CALLBACK_ORIGIN, "https://shop.test")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_MERCHANT_KEY), "{err}");

        let err = RawConfig::from_lookup(lookup(&[
            (ENV_MERCHANT_KEY, "m"),
            (ENV_CALLBACK_ORIGIN, "   "),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(ENV_CALLBACK_ORIGIN), "{err}");
    }

    #[test]
    fn from_raw_applies_defaults() {
        let config = Config::from_raw(raw(&[
            (ENV_MERCHANT_KEY, "merchant"),
            (ENV_CALLBACK_ORIGIN, "https://shop.test"),
        ]))
        .expect("config");

        assert_eq!(config.base_url.as_str(), "https://api.oxapay.com/");
        assert!(config.payout_key.is_none());
        assert_eq!(config.policy.payment_key, KeyRole::Merchant);
        assert_eq!(config.endpoints, Endpoints::default());
        assert_eq!(
            config.endpoint("merchants/request").expect("url").as_str(),
            "https://api.oxapay.com/merchants/request"
        );
    }

    #[test]
    fn base_url_with_path_keeps_prefix() {
        let config = Config::from_raw(raw(&[
            (ENV_BASE_URL, "http://127.0.0.1:9000/mock"),
            (ENV_MERCHANT_KEY, "merchant"),
            (ENV_CALLBACK_ORIGIN, "https://shop.test/store?x=1"),
        ]))
        .expect("config");

        assert_eq!(
            config.endpoint("/api/send").expect("url").as_str(),
            "http://127.0.0.1:9000/mock/api/send"
        );
        let urls = config.callback_urls().expect("callback urls");
        assert_eq!(urls.callback.as_str(), "https://shop.test/store/payment/callback");
        assert_eq!(urls.success.as_str(), "https://shop.test/store/payment/success");
        assert_eq!(urls.fail.as_str(), "https://shop.test/store/payment/failed");
    }

    #[test]
    fn payout_role_for_payments_requires_payout_key() {
        let err = Config::from_raw(raw(&[
            (ENV_MERCHANT_KEY, "merchant"),
            (ENV_CALLBACK_ORIGIN, "https://shop.test"),
            (ENV_PAYMENT_KEY_ROLE, "payout"),
        ]))
        .unwrap_err();
        assert_eq!(err.kind(), crate::error::Kind::Validation);

        let config = Config::from_raw(raw(&[
            (ENV_MERCHANT_KEY, "merchant"),
            (ENV_PAYOUT_KEY, "payout"),
            (ENV_CALLBACK_ORIGIN, "https://shop.test"),
            (ENV_PAYMENT_KEY_ROLE, "payout"),
        ]))
        .expect("config");
        assert_eq!(config.policy.payment_key, KeyRole::Payout);
        assert_eq!(
            config.secret(KeyRole::Payout).expect("secret").expose_secret(),
            "payout"
        );
    }

    #[test]
    fn missing_payout_key_fails_payout_role() {
        let config = Config::from_raw(raw(&[
            (ENV_MERCHANT_KEY, "merchant"),
            (ENV_CALLBACK_ORIGIN, "https://shop.test"),
        ]))
        .expect("config");

        config.secret(KeyRole::Payout).unwrap_err();
        assert_eq!(
            config.secret(KeyRole::Merchant).expect("secret").expose_secret(),
            "merchant"
        );
    }

    #[test]
    fn non_http_urls_are_rejected() {
        let err = Config::from_raw(raw(&[
            (ENV_BASE_URL, "ftp://api.oxapay.com"),
            (ENV_MERCHANT_KEY, "merchant"),
            (ENV_CALLBACK_ORIGIN, "https://shop.test"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("base url"), "{err}");
    }

    #[test]
    fn debug_output_hides_secrets() {
        let config = Config::from_raw(raw(&[
            (ENV_MERCHANT_KEY, "super-secret-merchant"),
            (ENV_PAYOUT_KEY, "super-secret-payout"),
            (ENV_CALLBACK_ORIGIN, "https://shop.test"),
        ]))
        .expect("config");

        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"), "{debug}");
    }
}
