//! Response body formats and the dispatcher that materializes them.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::TransportError;
use crate::http::ResponseLike;

/// How the caller wants the response body materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyFormat {
    ArrayBuffer,
    Blob,
    Json,
    Text,
}

impl BodyFormat {
    pub const ALL: [BodyFormat; 4] = [
        BodyFormat::ArrayBuffer,
        BodyFormat::Blob,
        BodyFormat::Json,
        BodyFormat::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BodyFormat::ArrayBuffer => "arrayBuffer",
            BodyFormat::Blob => "blob",
            BodyFormat::Json => "json",
            BodyFormat::Text => "text",
        }
    }
}

impl fmt::Display for BodyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownBodyFormat(pub String);

impl fmt::Display for UnknownBodyFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown body format `{}`", self.0)
    }
}

impl std::error::Error for UnknownBodyFormat {}

impl FromStr for BodyFormat {
    type Err = UnknownBodyFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BodyFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == s)
            .ok_or_else(|| UnknownBodyFormat(s.to_string()))
    }
}

/// Binary payload tagged with the media type it was served with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Blob {
    #[serde(rename = "type")]
    content_type: String,
    size: usize,
    bytes: Vec<u8>,
}

impl Blob {
    pub fn new(content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            size: bytes.len(),
            bytes,
        }
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A materialized response body. Plain data only, so it can ride inside
/// serialized error records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParsedBody {
    ArrayBuffer(Vec<u8>),
    Blob(Blob),
    Json(serde_json::Value),
    Text(String),
}

impl ParsedBody {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ParsedBody::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParsedBody::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Materialize the body of `response` in the requested format.
///
/// Parse failures surface as `TransportError` regardless of the response
/// status.
pub async fn read_body<R: ResponseLike>(
    format: BodyFormat,
    response: &mut R,
) -> Result<ParsedBody, TransportError> {
    Ok(match format {
        BodyFormat::ArrayBuffer => ParsedBody::ArrayBuffer(response.array_buffer().await?),
        BodyFormat::Blob => ParsedBody::Blob(response.blob().await?),
        BodyFormat::Json => ParsedBody::Json(response.json().await?),
        BodyFormat::Text => ParsedBody::Text(response.text().await?),
    })
}
