//! The guarded `$httpFetch` operation.
//!
//! # Design
//! `HttpFetch` owns a host-supplied `Transport` plus two strategies fixed at
//! construction: the URL filter and the init transformer. It keeps no other
//! state, so one instance can serve any number of concurrent calls.
//!
//! A call runs strictly in order: filter the URL, transform the init, check
//! URL syntax, call the transport, materialize the body, then turn a non-2xx
//! response into `ExpressionError::HttpErrorResponse` built from that same
//! response and the body already read. The only suspension points are the
//! transport call and the body read.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::body::{read_body, BodyFormat, ParsedBody};
use crate::config::{FetchOptions, InitTransformer};
use crate::error::{ExpressionError, FetchError};
use crate::filter::{parse_url, UrlFilter};
use crate::http::{FetchInit, ResponseLike, Transport};
use crate::signature::{FetchParams, Signature, HTTP_FETCH};

pub struct HttpFetch<T> {
    transport: T,
    url_filter: UrlFilter,
    init: InitTransformer,
}

impl<T: fmt::Debug> fmt::Debug for HttpFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetch")
            .field("transport", &self.transport)
            .field("url_filter", &self.url_filter)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> HttpFetch<T> {
    /// An operation with no URL restriction and an identity init transformer.
    pub fn new(transport: T) -> Self {
        Self::with_options(transport, FetchOptions::default())
    }

    pub fn with_options(transport: T, options: FetchOptions) -> Self {
        Self {
            transport,
            url_filter: UrlFilter::from_config(options.url),
            init: options.init.unwrap_or_else(|| Arc::new(|init: Option<FetchInit>| init)),
        }
    }

    pub fn signature(&self) -> Signature {
        HTTP_FETCH
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run the request pipeline and return the body on a 2xx response.
    pub async fn fetch(
        &self,
        body_format: BodyFormat,
        url: &str,
        init: Option<FetchInit>,
    ) -> Result<ParsedBody, FetchError> {
        let url = self.url_filter.apply(url)?;
        let init = (self.init)(init);
        parse_url(&url)?;

        debug!(%url, %body_format, "dispatching request");
        let mut response = self.transport.fetch(&url, init.as_ref()).await?;
        let body = read_body(body_format, &mut response).await?;

        if response.ok() {
            debug!(%url, status = response.status(), "request succeeded");
            Ok(body)
        } else {
            debug!(%url, status = response.status(), "raising HTTP error response");
            Err(ExpressionError::http_error_response(&response, body).into())
        }
    }

    /// Engine entry point: validate raw parameters, then `fetch`.
    pub async fn evaluate(&self, params: &[Value]) -> Result<ParsedBody, FetchError> {
        let FetchParams {
            body_format,
            url,
            init,
        } = FetchParams::from_values(params)?;
        self.fetch(body_format, &url, init).await
    }

    /// Always fails: the operation has to await the network.
    pub fn evaluate_sync(&self, _params: &[Value]) -> Result<ParsedBody, FetchError> {
        Err(FetchError::SyncModeUnsupported {
            operation: HTTP_FETCH.name,
        })
    }
}
