use std::error::Error as StdError;
use std::fmt;

use reqwest::{Method, StatusCode};

/// Broad category of a failure.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    /// The gateway answered with a non-2xx HTTP status.
    Status,
    /// The gateway answered 2xx but reported a failure in its `status` field.
    Rejected,
    /// Invalid input or configuration, detected before anything is sent.
    Validation,
    /// Transport, URL or (de)serialization failure.
    Internal,
}

/// Gateway operation a failure is attributed to.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Eq, PartialEq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    CreatePayment,
    CreateStaticWallet,
    CreateWhiteLabel,
    CreatePayout,
    PayoutInfo,
    PayoutHistory,
    ServerIp,
}

impl Operation {
    /// Fixed, human-readable message reported when this operation fails.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Operation::CreatePayment => "Failed to create payment",
            Operation::CreateStaticWallet => "Failed to create static wallet",
            Operation::CreateWhiteLabel => "Failed to create white label payment",
            Operation::CreatePayout => "Failed to create payout",
            Operation::PayoutInfo => "Failed to get payout information",
            Operation::PayoutHistory => "Failed to get payout history",
            Operation::ServerIp => "Failed to get server IP",
        }
    }
}

/// The single error type surfaced by this crate.
///
/// Errors returned from [`crate::gateway::Client`] methods always carry the
/// [`Operation`] they came from; their `Display` output is the operation's
/// fixed message, followed by the gateway's own message when it sent one.
#[derive(Debug)]
pub struct Error {
    kind: Kind,
    operation: Option<Operation>,
    source: Box<dyn StdError + Send + Sync + 'static>,
}

impl Error {
    pub fn with_source<S: StdError + Send + Sync + 'static>(kind: Kind, source: S) -> Self {
        Self {
            kind,
            operation: None,
            source: Box::new(source),
        }
    }

    pub fn validation<S: Into<String>>(reason: S) -> Self {
        Validation {
            reason: reason.into(),
        }
        .into()
    }

    pub fn status<S: Into<String>>(
        status_code: StatusCode,
        method: Method,
        path: S,
        message: Option<String>,
    ) -> Self {
        Status {
            status_code,
            method,
            path: path.into(),
            message,
        }
        .into()
    }

    pub fn rejected(status: Option<String>, message: Option<String>) -> Self {
        Rejected { status, message }.into()
    }

    /// Attributes this error to `operation`, replacing any earlier attribution.
    #[must_use]
    pub(crate) fn in_operation(mut self, operation: Operation) -> Self {
        self.operation = Some(operation);
        self
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    #[must_use]
    pub fn operation(&self) -> Option<Operation> {
        self.operation
    }

    #[must_use]
    pub fn downcast_ref<E: StdError + 'static>(&self) -> Option<&E> {
        self.source.downcast_ref::<E>()
    }

    /// Human-readable detail from the gateway or from input validation, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self.kind {
            Kind::Status => self
                .downcast_ref::<Status>()
                .and_then(|s| s.message.as_deref()),
            Kind::Rejected => self
                .downcast_ref::<Rejected>()
                .and_then(|r| r.message.as_deref()),
            Kind::Validation => self
                .downcast_ref::<Validation>()
                .map(|v| v.reason.as_str()),
            Kind::Internal => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(operation) = self.operation else {
            return write!(f, "{}", self.source);
        };

        f.write_str(operation.failure_message())?;
        match self.detail() {
            Some(detail) if !detail.is_empty() => write!(f, ": {detail}"),
            _ => Ok(()),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Non-2xx HTTP response from the gateway.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct Status {
    pub status_code: StatusCode,
    pub method: Method,
    pub path: String,
    /// The `message` field of a JSON error body, or the raw body text.
    pub message: Option<String>,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} returned {}",
            self.method, self.path, self.status_code
        )?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

impl StdError for Status {}

/// 2xx response whose `status` field is missing or not `success`.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rejected {
    pub status: Option<String>,
    pub message: Option<String>,
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.status, &self.message) {
            (Some(status), Some(message)) => {
                write!(f, "gateway reported status `{status}`: {message}")
            }
            (Some(status), None) => write!(f, "gateway reported status `{status}`"),
            (None, Some(message)) => write!(f, "gateway response has no status: {message}"),
            (None, None) => f.write_str("gateway response has no status"),
        }
    }
}

impl StdError for Rejected {}

#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Validation {
    pub reason: String,
}

impl fmt::Display for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid input: {}", self.reason)
    }
}

impl StdError for Validation {}

impl From<Status> for Error {
    fn from(e: Status) -> Self {
        Error::with_source(Kind::Status, e)
    }
}

impl From<Rejected> for Error {
    fn from(e: Rejected) -> Self {
        Error::with_source(Kind::Rejected, e)
    }
}

impl From<Validation> for Error {
    fn from(e: Validation) -> Self {
        Error::with_source(Kind::Validation, e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::with_source(Kind::Internal, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_message_leads_display() {
        let err = Error::rejected(Some("error".to_owned()), Some("Invalid merchant".to_owned()))
            .in_operation(Operation::CreatePayment);

        assert_eq!(err.kind(), Kind::Rejected);
        assert_eq!(err.operation(), Some(Operation::CreatePayment));
        assert_eq!(err.to_string(), "Failed to create payment: Invalid merchant");
    }

    #[test]
    fn fixed_message_without_detail() {
        let err = Error::status(
            StatusCode::BAD_GATEWAY,
            Method::POST,
            "/api/send",
            None,
        )
        .in_operation(Operation::CreatePayout);

        assert_eq!(err.to_string(), "Failed to create payout");
        let status = err.downcast_ref::<Status>().expect("status source");
        assert_eq!(status.status_code, StatusCode::BAD_GATEWAY);
        assert_eq!(status.path, "/api/send");
    }

    #[test]
    fn unattributed_error_shows_source() {
        let err = Error::validation("amount must be positive");

        assert_eq!(err.kind(), Kind::Validation);
        assert_eq!(err.to_string(), "invalid input: amount must be positive");
        assert_eq!(err.detail(), Some("amount must be positive"));
    }

    #[test]
    fn operation_names_are_snake_case() {
        assert_eq!(Operation::CreateStaticWallet.to_string(), "create_static_wallet");
        assert_eq!(Operation::ServerIp.to_string(), "server_ip");
    }
}
