//! Signed client for the Oxapay merchant and payout APIs.
//!
//! Covers the full gateway surface:
//! - hosted payments and white-label checkout pages
//! - static deposit wallets
//! - payouts, payout inquiry and payout history
//! - server IP lookup for allow-listing
//!
//! Payment-class calls are signed with the key chosen in [`SigningPolicy`];
//! payout-class calls always use the payout key.

mod client;
mod config;
mod policy;
mod types;

pub use client::Client;
pub use config::{
    Config, DEFAULT_BASE_URL, ENV_BASE_URL, ENV_CALLBACK_ORIGIN, ENV_MERCHANT_KEY,
    ENV_PAYMENT_KEY_ROLE, ENV_PAYOUT_KEY, Endpoints, RawConfig,
};
pub use policy::{KeyRole, NoncePolicy, SigningPolicy};
pub use types::{
    ApiResponse, DEFAULT_CURRENCY, Design, PaymentPayload, PaymentRequest, PayoutHistoryPayload,
    PayoutInfoPayload, PayoutPayload, PayoutRequest, RequestOverrides, StaticWalletPayload,
    StaticWalletRequest, Theme, WhiteLabelRequest,
};
