#![cfg_attr(doc, doc = include_str!("../README.md"))]

pub mod auth;
pub mod error;
pub mod gateway;
pub mod types;

use reqwest::{Client as ReqwestClient, Request};
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::gateway::ApiResponse;

pub use crate::types::{OrderId, generate_order_id};

pub type Result<T> = std::result::Result<T, Error>;

/// Unix timestamp in seconds.
pub type Timestamp = i64;

/// Executes `request` and deserializes a 2xx JSON body into `Response`.
///
/// Non-2xx answers become [`error::Kind::Status`] errors carrying the body's
/// `message` field, or the raw body text when it is not gateway JSON.
pub(crate) async fn request<Response: DeserializeOwned>(
    client: &ReqwestClient,
    request: Request,
) -> Result<Response> {
    let method = request.method().clone();
    let path = request.url().path().to_owned();

    let response = client.execute(request).await?;
    let status_code = response.status();

    if !status_code.is_success() {
        let body = match response.text().await {
            Ok(body) => body,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(%method, %path, %status_code, error = %_e, "unable to read gateway error body");
                String::new()
            }
        };

        #[cfg(feature = "tracing")]
        tracing::warn!(%method, %path, %status_code, body = %body, "gateway returned an error status");

        return Err(Error::status(status_code, method, path, error_message(&body)));
    }

    let body = response.bytes().await?;
    deserialize(&body)
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiResponse>(body)
        .ok()
        .and_then(|response| response.message)
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        })
}

#[cfg(feature = "tracing")]
fn deserialize<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let deserializer = &mut serde_json::Deserializer::from_slice(body);

    serde_path_to_error::deserialize(deserializer).map_err(|e| {
        tracing::error!(path = %e.path(), "unable to deserialize gateway response: {e}");
        Error::with_source(error::Kind::Internal, e)
    })
}

#[cfg(not(feature = "tracing"))]
fn deserialize<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(body)?)
}
