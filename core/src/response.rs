//! Plain-data projection of a transport response.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::body::ParsedBody;
use crate::http::ResponseLike;

/// A response plus its materialized body, holding no live handles.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializableResponse {
    pub headers: Option<BTreeMap<String, String>>,
    pub ok: bool,
    pub redirected: bool,
    pub status: u16,
    pub status_text: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub response_type: Option<String>,
    pub url: String,
    pub body: ParsedBody,
}

/// Lower-case every header name. Repeated names are joined with `", "`.
pub fn serializable_headers(headers: &[(String, String)]) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        out.entry(name.to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.clone());
    }
    out
}

pub fn serializable_response<R: ResponseLike>(
    response: &R,
    body: ParsedBody,
) -> SerializableResponse {
    SerializableResponse {
        headers: response.headers().map(serializable_headers),
        ok: response.ok(),
        redirected: response.redirected(),
        status: response.status(),
        status_text: response.status_text().to_string(),
        response_type: response.response_type().map(str::to_string),
        url: response.url().to_string(),
        body,
    }
}
