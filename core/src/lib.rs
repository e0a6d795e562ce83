//! Guarded asynchronous HTTP fetch operation for expression engines.
//!
//! # Overview
//! `HttpFetch` exposes network access to untrusted expressions while
//! constraining which URLs may be reached, how request options are shaped,
//! and how results and failures are represented. The host supplies the
//! `Transport` that performs the round-trip (host-does-IO pattern); this
//! crate filters, validates, dispatches and normalizes.
//!
//! # Design
//! - URL filter and init transformer are fixed at construction; calls share
//!   no mutable state.
//! - Only two failures are manufactured here, both in `ExpressionError` with
//!   a stable `code`. Everything else propagates unchanged.
//! - Responses and errors normalize to plain serializable data.

pub mod body;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod response;
pub mod signature;

pub use body::{read_body, Blob, BodyFormat, ParsedBody};
pub use client::HttpFetch;
pub use config::{FetchOptions, InitTransformer, UrlFilterConfig};
pub use error::{
    ExpressionError, FetchError, TransportError, ERR_HTTP_ERROR_RESPONSE, ERR_URL_NOT_ALLOWED,
};
pub use filter::{Pattern, UrlCriteria, UrlFilter, UrlMatcher};
pub use http::{
    FetchInit, FnTransport, HttpMethod, HttpResponse, RedirectPolicy, ReferrerPolicy,
    RequestCredentials, RequestMode, ResponseLike, Transport,
};
pub use response::{serializable_headers, serializable_response, SerializableResponse};
pub use signature::{FetchParams, ParamType, Signature, HTTP_FETCH};
