//! Setup-time configuration for `HttpFetch`.
//!
//! # Design
//! The URL filter is chosen by the shape of its configuration: a list of
//! origins, a criteria object, or a closure. `UrlFilterConfig` makes that
//! choice an explicit variant, and declarative data (`null`, an array, an
//! object) deserializes straight into the matching variant. `HttpFetch::new`
//! resolves it once; nothing inspects the config per call.

use std::fmt;
use std::sync::Arc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::FetchError;
use crate::filter::{UrlCriteria, UrlMatcher};
use crate::http::FetchInit;

pub type CustomUrlFilter = Arc<dyn Fn(&str) -> Result<String, FetchError> + Send + Sync>;

/// Rewrites the init of every request, e.g. to attach credentials.
pub type InitTransformer = Arc<dyn Fn(Option<FetchInit>) -> Option<FetchInit> + Send + Sync>;

#[derive(Clone, Default)]
pub enum UrlFilterConfig {
    #[default]
    Passthrough,
    AllowOrigins(Vec<String>),
    Criteria(Arc<dyn UrlMatcher>),
    Custom(CustomUrlFilter),
}

impl fmt::Debug for UrlFilterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlFilterConfig::Passthrough => f.write_str("Passthrough"),
            UrlFilterConfig::AllowOrigins(origins) => {
                f.debug_tuple("AllowOrigins").field(origins).finish()
            }
            UrlFilterConfig::Criteria(_) => f.write_str("Criteria(..)"),
            UrlFilterConfig::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<Vec<String>> for UrlFilterConfig {
    fn from(origins: Vec<String>) -> Self {
        UrlFilterConfig::AllowOrigins(origins)
    }
}

impl From<UrlCriteria> for UrlFilterConfig {
    fn from(criteria: UrlCriteria) -> Self {
        UrlFilterConfig::Criteria(Arc::new(criteria))
    }
}

impl<'de> Deserialize<'de> for UrlFilterConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<Value>::deserialize(deserializer)? {
            None => Ok(UrlFilterConfig::Passthrough),
            Some(origins @ Value::Array(_)) => serde_json::from_value::<Vec<String>>(origins)
                .map(UrlFilterConfig::AllowOrigins)
                .map_err(D::Error::custom),
            Some(criteria @ Value::Object(_)) => serde_json::from_value::<UrlCriteria>(criteria)
                .map(Into::into)
                .map_err(D::Error::custom),
            Some(other) => Err(D::Error::custom(format!(
                "expected null, an array of origins or a criteria object, got {other}"
            ))),
        }
    }
}

#[derive(Clone, Default)]
pub struct FetchOptions {
    pub url: UrlFilterConfig,
    pub init: Option<InitTransformer>,
}

impl fmt::Debug for FetchOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOptions")
            .field("url", &self.url)
            .field("init", &self.init.as_ref().map(|_| ".."))
            .finish()
    }
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url_filter(mut self, config: impl Into<UrlFilterConfig>) -> Self {
        self.url = config.into();
        self
    }

    pub fn allow_origins<I, S>(self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.url_filter(UrlFilterConfig::AllowOrigins(
            origins.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn url_matcher(self, matcher: impl UrlMatcher + 'static) -> Self {
        self.url_filter(UrlFilterConfig::Criteria(Arc::new(matcher)))
    }

    pub fn url_filter_fn<F>(self, filter: F) -> Self
    where
        F: Fn(&str) -> Result<String, FetchError> + Send + Sync + 'static,
    {
        self.url_filter(UrlFilterConfig::Custom(Arc::new(filter)))
    }

    pub fn init_transformer<F>(mut self, transform: F) -> Self
    where
        F: Fn(Option<FetchInit>) -> Option<FetchInit> + Send + Sync + 'static,
    {
        self.init = Some(Arc::new(transform));
        self
    }
}
