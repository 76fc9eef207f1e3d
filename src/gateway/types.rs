use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::error::Error;
use crate::types::Decimal;
use crate::{Result, Timestamp};

pub const DEFAULT_CURRENCY: &str = "USD";
pub const SUCCESS_STATUS: &str = "success";

/// Input values for a hosted payment.
#[non_exhaustive]
#[derive(Clone, Debug, bon::Builder)]
pub struct PaymentRequest {
    /// Fiat-denominated amount; sent with exactly two decimals.
    pub amount: Decimal,
    #[builder(into, default = DEFAULT_CURRENCY.to_owned())]
    pub currency: String,
    #[builder(into)]
    pub order_id: String,
    #[builder(into)]
    pub email: String,
    /// Defaults to `Payment for Order #<order_id>` when unset.
    #[builder(into)]
    pub description: Option<String>,
}

/// Color scheme of a white-label checkout page.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

#[non_exhaustive]
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Design {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Design {
    #[must_use]
    pub const fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }

    #[must_use]
    pub fn with_color<S: Into<String>>(mut self, color: S) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// A payment rendered on an embeddable, merchant-styled checkout page.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct WhiteLabelRequest {
    pub payment: PaymentRequest,
    pub design: Option<Design>,
}

impl WhiteLabelRequest {
    #[must_use]
    pub fn new(payment: PaymentRequest) -> Self {
        Self {
            payment,
            design: None,
        }
    }

    #[must_use]
    pub fn with_design(mut self, design: Design) -> Self {
        self.design = Some(design);
        self
    }
}

/// Request for a persistent deposit address.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct StaticWalletRequest {
    pub currency: String,
    pub callback_url: Url,
}

impl StaticWalletRequest {
    #[must_use]
    pub fn new<S: Into<String>>(currency: S, callback_url: Url) -> Self {
        Self {
            currency: currency.into(),
            callback_url,
        }
    }
}

/// Outbound cryptocurrency transfer.
#[non_exhaustive]
#[derive(Clone, Debug, bon::Builder)]
pub struct PayoutRequest {
    #[builder(into)]
    pub currency: String,
    /// Sent with exactly eight decimals.
    pub amount: Decimal,
    #[builder(into)]
    pub address: String,
    /// Chain to send on, for currencies available on several networks.
    #[builder(into)]
    pub network: Option<String>,
}

/// Per-call values that are otherwise generated at signing time.
#[derive(Clone, Debug, Default)]
pub struct RequestOverrides {
    pub timestamp: Option<Timestamp>,
    pub nonce: Option<String>,
}

impl RequestOverrides {
    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: Timestamp) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    #[must_use]
    pub fn with_nonce<S: Into<String>>(mut self, nonce: S) -> Self {
        self.nonce = Some(nonce.into());
        self
    }
}

/// Wire body of payment and white-label creation, in transmission order.
#[non_exhaustive]
#[derive(Clone, Debug, Serialize)]
pub struct PaymentPayload {
    pub merchant: String,
    pub amount: String,
    pub currency: String,
    pub order_id: String,
    pub email: String,
    pub description: String,
    pub callback_url: String,
    pub success_url: String,
    pub fail_url: String,
    pub timestamp: Timestamp,
    pub nonce: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub design: Option<Design>,
}

#[non_exhaustive]
#[derive(Clone, Debug, Serialize)]
pub struct StaticWalletPayload {
    pub merchant: String,
    pub currency: String,
    pub callback_url: String,
    pub timestamp: Timestamp,
    pub nonce: String,
}

#[non_exhaustive]
#[derive(Clone, Debug, Serialize)]
pub struct PayoutPayload {
    pub currency: String,
    pub amount: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    pub timestamp: Timestamp,
    pub nonce: String,
}

#[non_exhaustive]
#[derive(Clone, Debug, Serialize)]
pub struct PayoutInfoPayload {
    pub txid: String,
    pub timestamp: Timestamp,
    pub nonce: String,
}

#[non_exhaustive]
#[derive(Clone, Debug, Serialize)]
pub struct PayoutHistoryPayload {
    pub timestamp: Timestamp,
    pub nonce: String,
}

/// Gateway response. `status` and `message` are lifted out; every other
/// field is kept verbatim in `data`.
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl ApiResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|status| status.eq_ignore_ascii_case(SUCCESS_STATUS))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Fails when `status` is present and not `success`, or when it is absent
    /// and `require_status` is set.
    pub(crate) fn ensure_success(self, require_status: bool) -> Result<Self> {
        let accepted = if self.status.is_some() {
            self.is_success()
        } else {
            !require_status
        };

        if accepted {
            Ok(self)
        } else {
            Err(Error::rejected(self.status, self.message))
        }
    }
}

/// Accepts strings as-is and renders numbers or booleans as text.
fn lenient_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;
    use crate::error::{Kind, Rejected};

    #[test]
    fn payment_request_defaults() {
        let request = PaymentRequest::builder()
            .amount(dec!(12.5))
            .order_id("AB12CD34")
            .email("buyer@example.com")
            .build();

        assert_eq!(request.currency, DEFAULT_CURRENCY);
        assert!(request.description.is_none());
    }

    #[test]
    fn design_omits_unset_fields() {
        let design = Design::default().with_theme(Theme::Dark);
        assert_eq!(serde_json::to_value(&design).expect("json"), json!({"theme": "dark"}));

        let design = design.with_color("#112233");
        assert_eq!(
            serde_json::to_value(&design).expect("json"),
            json!({"theme": "dark", "color": "#112233"})
        );
    }

    #[test]
    fn payout_payload_omits_missing_network() {
        let payload = PayoutPayload {
            currency: "USDT".to_owned(),
            amount: "5.00000000".to_owned(),
            address: "TXYZ".to_owned(),
            network: None,
            timestamp: 1_700_000_000,
            nonce: "abc".to_owned(),
        };

        let body = serde_json::to_value(&payload).expect("json");
        assert!(body.get("network").is_none(), "{body}");
    }

    #[test]
    fn response_lifts_status_and_keeps_rest() {
        let response: ApiResponse = serde_json::from_value(json!({
            "status": "success",
            "message": "Operation completed successfully!",
            "trackId": "184747701",
            "payLink": "https://oxapay.com/mpay/184747701",
        }))
        .expect("response");

        assert!(response.is_success());
        assert_eq!(response.get_str("trackId"), Some("184747701"));
        assert_eq!(response.data.len(), 2);
    }

    #[test]
    fn numeric_status_is_tolerated() {
        let response: ApiResponse =
            serde_json::from_value(json!({"status": 200, "result": 100})).expect("response");

        assert_eq!(response.status.as_deref(), Some("200"));
        assert!(!response.is_success());
    }

    #[test]
    fn ensure_success_rules() {
        let ok = ApiResponse {
            status: Some("success".to_owned()),
            ..ApiResponse::default()
        };
        ok.clone().ensure_success(true).expect("success");

        ApiResponse::default().ensure_success(false).expect("no status, not required");
        let err = ApiResponse::default().ensure_success(true).unwrap_err();
        assert_eq!(err.kind(), Kind::Rejected);

        let err = ApiResponse {
            status: Some("error".to_owned()),
            message: Some("Invalid merchant API key".to_owned()),
            ..ApiResponse::default()
        }
        .ensure_success(false)
        .unwrap_err();
        let rejected = err.downcast_ref::<Rejected>().expect("rejected");
        assert_eq!(rejected.message.as_deref(), Some("Invalid merchant API key"));
    }
}
