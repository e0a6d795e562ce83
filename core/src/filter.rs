//! URL filter strategies.
//!
//! # Design
//! A `UrlFilter` is a shared closure built once from a `UrlFilterConfig`.
//! Every strategy returns the URL on success, rejects with
//! `ExpressionError::UrlNotAllowed` on a policy violation, and lets URL
//! syntax errors bubble up as `FetchError::InvalidUrl`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;
use url::Url;

use crate::config::UrlFilterConfig;
use crate::error::{ExpressionError, FetchError};

type FilterFn = dyn Fn(&str) -> Result<String, FetchError> + Send + Sync;

/// Decides whether a URL satisfies some matching criteria.
pub trait UrlMatcher: Send + Sync {
    fn matches(&self, url: &str) -> Result<bool, FetchError>;
}

#[derive(Clone)]
pub struct UrlFilter(Arc<FilterFn>);

impl fmt::Debug for UrlFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("UrlFilter(..)")
    }
}

impl Default for UrlFilter {
    fn default() -> Self {
        Self::passthrough()
    }
}

impl UrlFilter {
    pub fn passthrough() -> Self {
        Self(Arc::new(|url: &str| -> Result<String, FetchError> {
            Ok(url.to_string())
        }))
    }

    /// Accept only URLs whose origin is one of `origins`, compared as exact
    /// strings (e.g. `https://example.com`, no trailing slash).
    pub fn allow_origins(origins: Vec<String>) -> Self {
        Self(Arc::new(move |url: &str| -> Result<String, FetchError> {
            let origin = parse_url(url)?.origin().ascii_serialization();
            if !origins.iter().any(|allowed| *allowed == origin) {
                warn!(url, %origin, "origin not in allow-list");
                return Err(ExpressionError::url_not_allowed(url).into());
            }
            Ok(url.to_string())
        }))
    }

    pub fn matching(matcher: Arc<dyn UrlMatcher>) -> Self {
        Self(Arc::new(move |url: &str| -> Result<String, FetchError> {
            if !matcher.matches(url)? {
                warn!(url, "url does not match criteria");
                return Err(ExpressionError::url_not_allowed(url).into());
            }
            Ok(url.to_string())
        }))
    }

    pub fn custom<F>(filter: F) -> Self
    where
        F: Fn(&str) -> Result<String, FetchError> + Send + Sync + 'static,
    {
        Self(Arc::new(filter))
    }

    pub fn from_config(config: UrlFilterConfig) -> Self {
        match config {
            UrlFilterConfig::Passthrough => Self::passthrough(),
            UrlFilterConfig::AllowOrigins(origins) => Self::allow_origins(origins),
            UrlFilterConfig::Criteria(matcher) => Self::matching(matcher),
            UrlFilterConfig::Custom(filter) => Self(filter),
        }
    }

    pub fn apply(&self, url: &str) -> Result<String, FetchError> {
        (self.0)(url)
    }
}

pub(crate) fn parse_url(url: &str) -> Result<Url, FetchError> {
    Url::parse(url).map_err(|source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })
}

/// One accepted value or a list of accepted values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Pattern {
    One(String),
    AnyOf(Vec<String>),
}

impl Pattern {
    fn accepts(&self, candidate: &str) -> bool {
        match self {
            Pattern::One(expected) => expected == candidate,
            Pattern::AnyOf(expected) => expected.iter().any(|e| e == candidate),
        }
    }
}

impl From<&str> for Pattern {
    fn from(value: &str) -> Self {
        Pattern::One(value.to_string())
    }
}

/// Declarative URL criteria, keyed by URL component.
///
/// Components are rendered the way browsers expose them: `protocol` keeps its
/// trailing colon, `port` is empty for a scheme's default port, `search` and
/// `hash` keep their leading `?` / `#` and are empty when absent.
///
/// Only a map deserializes into criteria. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UrlCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<Pattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<Pattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Pattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<Pattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<Pattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<Pattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<Pattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<Pattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pathname: Option<Pattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<Pattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<Pattern>,
}

const CRITERIA_FIELDS: &[&str] = &[
    "href", "origin", "protocol", "username", "password", "host", "hostname", "port", "pathname",
    "search", "hash",
];

impl<'de> Deserialize<'de> for UrlCriteria {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = BTreeMap::<String, Option<Pattern>>::deserialize(deserializer)?;
        let mut criteria = UrlCriteria::default();
        for (key, pattern) in fields {
            let slot = match key.as_str() {
                "href" => &mut criteria.href,
                "origin" => &mut criteria.origin,
                "protocol" => &mut criteria.protocol,
                "username" => &mut criteria.username,
                "password" => &mut criteria.password,
                "host" => &mut criteria.host,
                "hostname" => &mut criteria.hostname,
                "port" => &mut criteria.port,
                "pathname" => &mut criteria.pathname,
                "search" => &mut criteria.search,
                "hash" => &mut criteria.hash,
                other => return Err(D::Error::unknown_field(other, CRITERIA_FIELDS)),
            };
            *slot = pattern;
        }
        Ok(criteria)
    }
}

impl UrlCriteria {
    fn matches_url(&self, url: &Url) -> bool {
        let hostname = url.host_str().unwrap_or_default();
        let port = url.port().map(|p| p.to_string()).unwrap_or_default();
        let host = if port.is_empty() {
            hostname.to_string()
        } else {
            format!("{hostname}:{port}")
        };
        let prefixed = |prefix: &str, part: Option<&str>| match part {
            Some(part) if !part.is_empty() => format!("{prefix}{part}"),
            _ => String::new(),
        };

        let checks: [(&Option<Pattern>, String); 11] = [
            (&self.href, url.as_str().to_string()),
            (&self.origin, url.origin().ascii_serialization()),
            (&self.protocol, format!("{}:", url.scheme())),
            (&self.username, url.username().to_string()),
            (&self.password, url.password().unwrap_or_default().to_string()),
            (&self.host, host),
            (&self.hostname, hostname.to_string()),
            (&self.port, port),
            (&self.pathname, url.path().to_string()),
            (&self.search, prefixed("?", url.query())),
            (&self.hash, prefixed("#", url.fragment())),
        ];

        checks.iter().all(|(pattern, actual)| match pattern {
            Some(p) => p.accepts(actual),
            None => true,
        })
    }
}

impl UrlMatcher for UrlCriteria {
    fn matches(&self, url: &str) -> Result<bool, FetchError> {
        Ok(self.matches_url(&parse_url(url)?))
    }
}
