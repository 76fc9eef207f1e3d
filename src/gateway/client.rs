use chrono::Utc;
use reqwest::Client as ReqwestClient;
use reqwest::Method;
use secrecy::{ExposeSecret as _, SecretString};
use serde::Serialize;

use crate::auth::{self, SignedEnvelope};
use crate::error::{Error, Operation};
use crate::gateway::config::Config;
use crate::gateway::policy::KeyRole;
use crate::gateway::types::{
    ApiResponse, Design, PaymentPayload, PaymentRequest, PayoutHistoryPayload, PayoutInfoPayload,
    PayoutPayload, PayoutRequest, RequestOverrides, StaticWalletPayload, StaticWalletRequest,
    WhiteLabelRequest,
};
use crate::types::{CRYPTO_DECIMALS, FIAT_DECIMALS, format_amount};
use crate::{Result, Timestamp};

/// Oxapay gateway client.
///
/// Every signed call stamps its payload with the current timestamp and a
/// fresh nonce, signs it with the secret of the operation's key role and
/// posts it as JSON. Failures come back as [`Error`] attributed to the
/// operation that produced them.
#[derive(Clone, Debug)]
pub struct Client {
    config: Config,
    client: ReqwestClient,
}

impl Client {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self::with_client(config, ReqwestClient::new())
    }

    /// Creates a client on top of a caller-configured HTTP client, e.g. one
    /// with custom timeouts.
    #[must_use]
    pub fn with_client(config: Config, client: ReqwestClient) -> Self {
        Self { config, client }
    }

    /// Creates a client from `OXAPAY_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(Config::from_env()?))
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Creates a hosted payment. Succeeds only if the gateway answers with
    /// `status: success`.
    pub async fn create_payment(&self, request: &PaymentRequest) -> Result<ApiResponse> {
        let signed = self.sign_payment(request, RequestOverrides::default())?;
        self.post_signed(Operation::CreatePayment, &signed).await
    }

    /// Requests a persistent deposit address.
    pub async fn create_static_wallet(&self, request: &StaticWalletRequest) -> Result<ApiResponse> {
        let signed = self.sign_static_wallet(request, RequestOverrides::default())?;
        self.post_signed(Operation::CreateStaticWallet, &signed).await
    }

    /// Requests a white-label checkout page.
    pub async fn create_white_label(&self, request: &WhiteLabelRequest) -> Result<ApiResponse> {
        let signed = self.sign_white_label(request, RequestOverrides::default())?;
        self.post_signed(Operation::CreateWhiteLabel, &signed).await
    }

    /// Sends funds to an external address.
    pub async fn create_payout(&self, request: &PayoutRequest) -> Result<ApiResponse> {
        let signed = self.sign_payout(request, RequestOverrides::default())?;
        self.post_signed(Operation::CreatePayout, &signed).await
    }

    /// Fetches the status of a previously created payout.
    pub async fn payout_info(&self, txid: &str) -> Result<ApiResponse> {
        let signed = self.sign_payout_info(txid, RequestOverrides::default())?;
        self.post_signed(Operation::PayoutInfo, &signed).await
    }

    pub async fn payout_history(&self) -> Result<ApiResponse> {
        let signed = self.sign_payout_history(RequestOverrides::default())?;
        self.post_signed(Operation::PayoutHistory, &signed).await
    }

    /// Looks up the address the gateway sees for this host, for allow-listing
    /// payout API access. Unsigned.
    pub async fn server_ip(&self) -> Result<ApiResponse> {
        let operation = Operation::ServerIp;
        self.server_ip_inner(operation)
            .await
            .map_err(|e| fail(operation, e))
    }

    /// Builds and signs a payment creation body.
    pub fn sign_payment(
        &self,
        request: &PaymentRequest,
        overrides: RequestOverrides,
    ) -> Result<SignedEnvelope<PaymentPayload>> {
        let operation = Operation::CreatePayment;
        let build = || -> Result<SignedEnvelope<PaymentPayload>> {
            let secret = self.secret(self.config.policy.payment_key)?;
            let payload = self.payment_payload(request, None, overrides)?;
            SignedEnvelope::new(payload, secret)
        };

        build().map_err(|e| fail(operation, e))
    }

    /// Builds and signs a white-label creation body. Uses the same key role
    /// as payment creation.
    pub fn sign_white_label(
        &self,
        request: &WhiteLabelRequest,
        overrides: RequestOverrides,
    ) -> Result<SignedEnvelope<PaymentPayload>> {
        let operation = Operation::CreateWhiteLabel;
        let build = || -> Result<SignedEnvelope<PaymentPayload>> {
            let secret = self.secret(self.config.policy.payment_key)?;
            let payload =
                self.payment_payload(&request.payment, request.design.clone(), overrides)?;
            SignedEnvelope::new(payload, secret)
        };

        build().map_err(|e| fail(operation, e))
    }

    pub fn sign_static_wallet(
        &self,
        request: &StaticWalletRequest,
        overrides: RequestOverrides,
    ) -> Result<SignedEnvelope<StaticWalletPayload>> {
        let operation = Operation::CreateStaticWallet;
        let build = || -> Result<SignedEnvelope<StaticWalletPayload>> {
            require("currency", &request.currency)?;
            let (timestamp, nonce) = self.stamp(overrides);
            let payload = StaticWalletPayload {
                merchant: self.merchant_id(),
                currency: request.currency.clone(),
                callback_url: request.callback_url.to_string(),
                timestamp,
                nonce,
            };
            SignedEnvelope::new(payload, self.secret(KeyRole::Merchant)?)
        };

        build().map_err(|e| fail(operation, e))
    }

    /// Builds and signs a payout body; the amount is fixed at eight decimals.
    pub fn sign_payout(
        &self,
        request: &PayoutRequest,
        overrides: RequestOverrides,
    ) -> Result<SignedEnvelope<PayoutPayload>> {
        let operation = Operation::CreatePayout;
        let build = || -> Result<SignedEnvelope<PayoutPayload>> {
            let secret = self.secret(KeyRole::Payout)?;
            require("currency", &request.currency)?;
            require("address", &request.address)?;
            let amount = format_amount(request.amount, CRYPTO_DECIMALS)?;
            let (timestamp, nonce) = self.stamp(overrides);
            let payload = PayoutPayload {
                currency: request.currency.clone(),
                amount,
                address: request.address.clone(),
                network: request
                    .network
                    .clone()
                    .filter(|network| !network.trim().is_empty()),
                timestamp,
                nonce,
            };
            SignedEnvelope::new(payload, secret)
        };

        build().map_err(|e| fail(operation, e))
    }

    pub fn sign_payout_info(
        &self,
        txid: &str,
        overrides: RequestOverrides,
    ) -> Result<SignedEnvelope<PayoutInfoPayload>> {
        let operation = Operation::PayoutInfo;
        let build = || -> Result<SignedEnvelope<PayoutInfoPayload>> {
            let secret = self.secret(KeyRole::Payout)?;
            require("txid", txid)?;
            let (timestamp, nonce) = self.stamp(overrides);
            let payload = PayoutInfoPayload {
                txid: txid.to_owned(),
                timestamp,
                nonce,
            };
            SignedEnvelope::new(payload, secret)
        };

        build().map_err(|e| fail(operation, e))
    }

    pub fn sign_payout_history(
        &self,
        overrides: RequestOverrides,
    ) -> Result<SignedEnvelope<PayoutHistoryPayload>> {
        let operation = Operation::PayoutHistory;
        let build = || -> Result<SignedEnvelope<PayoutHistoryPayload>> {
            let secret = self.secret(KeyRole::Payout)?;
            let (timestamp, nonce) = self.stamp(overrides);
            SignedEnvelope::new(PayoutHistoryPayload { timestamp, nonce }, secret)
        };

        build().map_err(|e| fail(operation, e))
    }

    /// Posts an already-signed body to the endpoint serving `operation`.
    ///
    /// The response must not carry a non-`success` status; payment creation
    /// additionally requires the status to be present.
    pub async fn post_signed<T: Serialize>(
        &self,
        operation: Operation,
        signed: &SignedEnvelope<T>,
    ) -> Result<ApiResponse> {
        self.post_signed_inner(operation, signed)
            .await
            .map_err(|e| fail(operation, e))
    }

    async fn post_signed_inner<T: Serialize>(
        &self,
        operation: Operation,
        signed: &SignedEnvelope<T>,
    ) -> Result<ApiResponse> {
        if operation == Operation::ServerIp {
            return Err(Error::validation(format!(
                "{operation} is not a signed operation"
            )));
        }

        let url = self.config.endpoint(self.config.endpoints.path(operation))?;
        let request = self
            .client
            .request(Method::POST, url)
            .json(signed)
            .build()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(%operation, url = %request.url(), "sending signed gateway request");

        crate::request::<ApiResponse>(&self.client, request)
            .await?
            .ensure_success(operation == Operation::CreatePayment)
    }

    async fn server_ip_inner(&self, operation: Operation) -> Result<ApiResponse> {
        let url = self.config.endpoint(self.config.endpoints.path(operation))?;
        let request = self.client.request(Method::GET, url).build()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(%operation, url = %request.url(), "sending gateway request");

        crate::request::<ApiResponse>(&self.client, request)
            .await?
            .ensure_success(false)
    }

    fn payment_payload(
        &self,
        request: &PaymentRequest,
        design: Option<Design>,
        overrides: RequestOverrides,
    ) -> Result<PaymentPayload> {
        require("currency", &request.currency)?;
        require("order_id", &request.order_id)?;
        require("email", &request.email)?;

        let amount = format_amount(request.amount, FIAT_DECIMALS)?;
        let urls = self.config.callback_urls()?;
        let description = request
            .description
            .clone()
            .filter(|description| !description.trim().is_empty())
            .unwrap_or_else(|| format!("Payment for Order #{}", request.order_id));
        let (timestamp, nonce) = self.stamp(overrides);

        Ok(PaymentPayload {
            merchant: self.merchant_id(),
            amount,
            currency: request.currency.clone(),
            order_id: request.order_id.clone(),
            email: request.email.clone(),
            description,
            callback_url: urls.callback.to_string(),
            success_url: urls.success.to_string(),
            fail_url: urls.fail.to_string(),
            timestamp,
            nonce,
            design,
        })
    }

    fn secret(&self, role: KeyRole) -> Result<&SecretString> {
        self.config.secret(role)
    }

    /// The merchant key doubles as the merchant identifier in request bodies.
    fn merchant_id(&self) -> String {
        self.config.merchant_key.expose_secret().to_owned()
    }

    fn stamp(&self, overrides: RequestOverrides) -> (Timestamp, String) {
        let timestamp = overrides
            .timestamp
            .unwrap_or_else(|| Utc::now().timestamp());
        let nonce = overrides
            .nonce
            .unwrap_or_else(|| auth::generate_nonce(self.config.policy.nonce));

        (timestamp, nonce)
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Logs the underlying failure and attributes it to `operation`.
fn fail(operation: Operation, error: Error) -> Error {
    #[cfg(feature = "tracing")]
    tracing::error!(%operation, kind = ?error.kind(), error = %error, "gateway call failed");

    error.in_operation(operation)
}
