//! Canned HTTP responses for exercising the fetch pipeline over real sockets.

use std::collections::BTreeMap;

use axum::{
    extract::Path,
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;

pub const VALID_TOKEN: &str = "Bearer [VALID_TOKEN]";

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/data.json", get(data))
        .route("/status/{code}", get(status))
        .route("/invalid-json", get(invalid_json))
        .route("/authorization-token-required", get(authorization_required))
        .route("/echo", any(echo))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// `HTTP_ERR_<REASON>`, e.g. `HTTP_ERR_BAD_REQUEST` for 400.
pub fn error_code(status: StatusCode) -> String {
    let reason = status.canonical_reason().unwrap_or("unknown");
    format!("HTTP_ERR_{}", reason.to_uppercase().replace([' ', '-'], "_"))
}

fn sample() -> serde_json::Value {
    json!({ "key1": "value1", "key2": "value2" })
}

async fn data() -> Json<serde_json::Value> {
    Json(sample())
}

/// Error statuses only; any other code is served as 400.
async fn status(Path(code): Path<u16>) -> (StatusCode, Json<serde_json::Value>) {
    let status = StatusCode::from_u16(code)
        .ok()
        .filter(|s| s.is_client_error() || s.is_server_error())
        .unwrap_or(StatusCode::BAD_REQUEST);
    (status, Json(json!({ "code": error_code(status) })))
}

async fn invalid_json() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/html")],
        "<h1>Hello World!</h1>",
    )
}

async fn authorization_required(headers: HeaderMap) -> (StatusCode, Json<serde_json::Value>) {
    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == VALID_TOKEN);
    if authorized {
        (StatusCode::OK, Json(sample()))
    } else {
        let status = StatusCode::UNAUTHORIZED;
        (status, Json(json!({ "code": error_code(status) })))
    }
}

async fn echo(method: Method, headers: HeaderMap, body: String) -> Json<Echo> {
    let headers = headers
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();
    Json(Echo {
        method: method.to_string(),
        headers,
        body,
    })
}
