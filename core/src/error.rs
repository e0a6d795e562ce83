//! Error types for the guarded fetch operation.
//!
//! # Design
//! `ExpressionError` holds the only two failures this crate raises on
//! purpose: a completed request with a non-2xx status, and a URL rejected by
//! the configured filter before any network call. Both carry a stable `code`
//! so a host "try" facility can branch on it, and both serialize to plain
//! data.
//!
//! Everything else lands in `FetchError` unreinterpreted: bad parameters, URL
//! syntax errors, custom filter failures and transport or body-parse errors.
//! A body that fails to parse is a `TransportError` even when the status was
//! already an error status.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::body::ParsedBody;
use crate::http::ResponseLike;
use crate::response::{serializable_response, SerializableResponse};

pub const ERR_HTTP_ERROR_RESPONSE: &str = "ERR_HTTP_ERROR_RESPONSE";
pub const ERR_URL_NOT_ALLOWED: &str = "ERR_URL_NOT_ALLOWED";

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Structured failures, discriminated by `code` when serialized.
///
/// Variants are only built through `http_error_response` and
/// `url_not_allowed`, so `HttpErrorResponse` always carries a response with
/// `ok == false`:
///
/// ```compile_fail
/// use fetch_core::ExpressionError;
///
/// let _ = ExpressionError::UrlNotAllowed {
///     message: "URL not allowed x".to_string(),
///     url: "x".to_string(),
/// };
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "code")]
pub enum ExpressionError {
    /// The transport completed but the response status was not 2xx.
    #[serde(rename = "ERR_HTTP_ERROR_RESPONSE")]
    #[error("{message}")]
    #[non_exhaustive]
    HttpErrorResponse {
        message: String,
        response: Box<SerializableResponse>,
    },

    /// A URL filter refused the request. No network call was made.
    #[serde(rename = "ERR_URL_NOT_ALLOWED")]
    #[error("{message}")]
    #[non_exhaustive]
    UrlNotAllowed { message: String, url: String },
}

impl ExpressionError {
    /// Wrap an error response and its already-parsed body.
    ///
    /// `response` must not be `ok()`.
    pub fn http_error_response<R: ResponseLike>(response: &R, body: ParsedBody) -> Self {
        debug_assert!(!response.ok(), "HTTP error response built from a 2xx response");
        ExpressionError::HttpErrorResponse {
            message: format!(
                "HTTP Response Error: {} - {}",
                response.status(),
                response.status_text()
            ),
            response: Box::new(serializable_response(response, body)),
        }
    }

    pub fn url_not_allowed(url: &str) -> Self {
        ExpressionError::UrlNotAllowed {
            message: format!("URL not allowed {url}"),
            url: url.to_string(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ExpressionError::HttpErrorResponse { .. } => ERR_HTTP_ERROR_RESPONSE,
            ExpressionError::UrlNotAllowed { .. } => ERR_URL_NOT_ALLOWED,
        }
    }

    pub fn response(&self) -> Option<&SerializableResponse> {
        match self {
            ExpressionError::HttpErrorResponse { response, .. } => Some(&**response),
            ExpressionError::UrlNotAllowed { .. } => None,
        }
    }
}

/// Failures of the transport itself or of body materialization.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Request { url: String, source: BoxError },

    #[error("invalid json response body: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("failed to read response body: {0}")]
    Body(#[source] BoxError),
}

impl TransportError {
    pub fn request(url: &str, source: impl Into<BoxError>) -> Self {
        TransportError::Request {
            url: url.to_string(),
            source: source.into(),
        }
    }
}

/// Every way a fetch can fail.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// A parameter did not match its declared type. Raised before any side
    /// effect.
    #[error("{message}")]
    InvalidParameter { index: usize, message: String },

    #[error("Invalid URL: {url}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Raised by a caller-supplied URL filter.
    #[error("{0}")]
    Filter(#[source] BoxError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{operation} does not support synchronous evaluation")]
    SyncModeUnsupported { operation: &'static str },
}

impl FetchError {
    pub fn filter(source: impl Into<BoxError>) -> Self {
        FetchError::Filter(source.into())
    }

    /// The structured code, if this is one of the two structured kinds.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            FetchError::Expression(e) => Some(e.code()),
            _ => None,
        }
    }

    pub fn as_expression(&self) -> Option<&ExpressionError> {
        match self {
            FetchError::Expression(e) => Some(e),
            _ => None,
        }
    }

    /// Render as `{ error: true, message, ... }`, including `code` and the
    /// structured payload when there is one.
    pub fn to_error_value(&self) -> Value {
        let mut record = match self {
            FetchError::Expression(e) => match serde_json::to_value(e) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            },
            _ => Map::new(),
        };
        record.insert("error".to_string(), Value::Bool(true));
        record
            .entry("message".to_string())
            .or_insert_with(|| Value::String(self.to_string()));
        Value::Object(record)
    }
}
