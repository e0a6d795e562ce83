//! HTTP transport seams for the host-does-IO pattern.
//!
//! # Design
//! The core never opens a socket. The host hands `HttpFetch` a `Transport`
//! that performs the round-trip and returns something `ResponseLike`. Request
//! options travel as a plain `FetchInit` value whose fields are each
//! constrained to their own closed set of values, so a malformed init is
//! rejected while deserializing, before any transport call.
//!
//! `HttpResponse` is a fully buffered response described as plain data. Hosts
//! that already hold the whole body can return it directly from a transport.

use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::body::Blob;
use crate::error::TransportError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Connect,
    Options,
    Trace,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Connect => "CONNECT",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Patch => "PATCH",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    SameOrigin,
    NoCors,
    Cors,
    Navigate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestCredentials {
    Omit,
    SameOrigin,
    Include,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectPolicy {
    Follow,
    Error,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferrerPolicy {
    NoReferrer,
    NoReferrerWhenDowngrade,
    SameOrigin,
    Origin,
    StrictOrigin,
    OriginWhenCrossOrigin,
    StrictOriginWhenCrossOrigin,
    UnsafeUrl,
}

/// Transport options for a single request. Every field is optional.
///
/// `body` is passed through to the transport untouched; its interpretation
/// belongs to the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchInit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<HttpMethod>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<RequestMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<RequestCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<RedirectPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer_policy: Option<ReferrerPolicy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integrity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keepalive: Option<bool>,
}

impl FetchInit {
    /// Set a request header, replacing any previous value under the same name.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.to_string(), value.to_string());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()?
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A response produced by a `Transport`.
///
/// Metadata is readable at any time, including after the body has been
/// materialized. Only `array_buffer` is required; the other body formats are
/// derived from the raw bytes unless the implementor has a better way.
pub trait ResponseLike: Send {
    fn status(&self) -> u16;
    fn status_text(&self) -> &str;
    fn redirected(&self) -> bool;
    fn response_type(&self) -> Option<&str>;
    fn url(&self) -> &str;

    /// Header pairs as received. `None` when the transport exposes no header
    /// collection at all.
    fn headers(&self) -> Option<&[(String, String)]>;

    fn ok(&self) -> bool {
        (200..300).contains(&self.status())
    }

    fn array_buffer(&mut self) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;

    fn blob(&mut self) -> impl Future<Output = Result<Blob, TransportError>> + Send {
        let content_type = self
            .headers()
            .and_then(|headers| {
                headers
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            })
            .map(|(_, v)| v.to_ascii_lowercase())
            .unwrap_or_default();
        async move {
            let bytes = self.array_buffer().await?;
            Ok(Blob::new(content_type, bytes))
        }
    }

    fn json(&mut self) -> impl Future<Output = Result<serde_json::Value, TransportError>> + Send {
        async move {
            let bytes = self.array_buffer().await?;
            serde_json::from_slice(&bytes).map_err(TransportError::InvalidJson)
        }
    }

    fn text(&mut self) -> impl Future<Output = Result<String, TransportError>> + Send {
        async move {
            let bytes = self.array_buffer().await?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

/// Issues the actual network exchange for `HttpFetch`.
pub trait Transport: Send + Sync {
    type Response: ResponseLike;

    fn fetch(
        &self,
        url: &str,
        init: Option<&FetchInit>,
    ) -> impl Future<Output = Result<Self::Response, TransportError>> + Send;
}

/// Adapts an async function `(url, init) -> Result<R, TransportError>` into a
/// `Transport`.
#[derive(Debug, Clone)]
pub struct FnTransport<F>(pub F);

impl<F, Fut, R> Transport for FnTransport<F>
where
    F: Fn(String, Option<FetchInit>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, TransportError>> + Send,
    R: ResponseLike,
{
    type Response = R;

    fn fetch(
        &self,
        url: &str,
        init: Option<&FetchInit>,
    ) -> impl Future<Output = Result<R, TransportError>> + Send {
        (self.0)(url.to_string(), init.cloned())
    }
}

/// An HTTP response described as plain data, with its body fully buffered.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub redirected: bool,
    pub response_type: Option<String>,
    pub url: String,
    pub headers: Option<Vec<(String, String)>>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Build a response with the canonical reason phrase for `status` and an
    /// empty header list.
    pub fn new(status: u16, url: &str, body: impl Into<Vec<u8>>) -> Self {
        let status_text = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("")
            .to_string();
        Self {
            status,
            status_text,
            redirected: false,
            response_type: None,
            url: url.to_string(),
            headers: Some(Vec::new()),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .get_or_insert_with(Vec::new)
            .push((name.to_string(), value.to_string()));
        self
    }
}

impl ResponseLike for HttpResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn status_text(&self) -> &str {
        &self.status_text
    }

    fn redirected(&self) -> bool {
        self.redirected
    }

    fn response_type(&self) -> Option<&str> {
        self.response_type.as_deref()
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn headers(&self) -> Option<&[(String, String)]> {
        self.headers.as_deref()
    }

    async fn array_buffer(&mut self) -> Result<Vec<u8>, TransportError> {
        Ok(std::mem::take(&mut self.body))
    }
}
