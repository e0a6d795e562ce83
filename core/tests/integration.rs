//! Run the fetch pipeline against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `HttpFetch` over real
//! HTTP with a ureq-backed transport. ureq is blocking, so each round-trip
//! runs on tokio's blocking pool.

use std::sync::atomic::{AtomicUsize, Ordering};

use fetch_core::{
    BodyFormat, FetchError, FetchInit, FetchOptions, HttpFetch, HttpMethod, HttpResponse,
    ParsedBody, Transport, TransportError, ERR_HTTP_ERROR_RESPONSE, ERR_URL_NOT_ALLOWED,
};
use mock_server::{Echo, VALID_TOKEN};
use serde_json::{json, Value};

struct UreqTransport {
    agent: ureq::Agent,
    calls: AtomicUsize,
}

impl UreqTransport {
    /// Disables ureq's status-code-as-error behavior so 4xx/5xx responses come
    /// back as data and the pipeline decides what they mean.
    fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self {
            agent,
            calls: AtomicUsize::new(0),
        }
    }
}

fn execute(agent: &ureq::Agent, url: &str, init: &FetchInit) -> Result<HttpResponse, TransportError> {
    let headers = init.headers.clone().unwrap_or_default();
    let body = match &init.body {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };

    let result = match init.method.unwrap_or(HttpMethod::Get) {
        HttpMethod::Get => {
            let mut req = agent.get(url);
            for (name, value) in &headers {
                req = req.header(name.as_str(), value.as_str());
            }
            req.call()
        }
        HttpMethod::Post => {
            let mut req = agent.post(url);
            for (name, value) in &headers {
                req = req.header(name.as_str(), value.as_str());
            }
            req.send(body.as_bytes())
        }
        other => panic!("test transport does not support {}", other.as_str()),
    };
    let mut response = result.map_err(|e| TransportError::request(url, e))?;

    let status = response.status();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();
    let body = response
        .body_mut()
        .read_to_vec()
        .map_err(|e| TransportError::Body(e.into()))?;

    Ok(HttpResponse {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_string(),
        redirected: false,
        response_type: None,
        url: url.to_string(),
        headers: Some(headers),
        body,
    })
}

impl Transport for UreqTransport {
    type Response = HttpResponse;

    async fn fetch(&self, url: &str, init: Option<&FetchInit>) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let agent = self.agent.clone();
        let owned_url = url.to_string();
        let init = init.cloned().unwrap_or_default();
        tokio::task::spawn_blocking(move || execute(&agent, &owned_url, &init))
            .await
            .map_err(|e| TransportError::request(url, e))?
    }
}

/// Start the mock server on a random port and return its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn fetcher(options: FetchOptions) -> HttpFetch<UreqTransport> {
    HttpFetch::with_options(UreqTransport::new(), options)
}

#[tokio::test]
async fn json_success() {
    let base = start_server();
    let fetch = fetcher(FetchOptions::new());

    let body = fetch
        .fetch(BodyFormat::Json, &format!("{base}/data.json"), None)
        .await
        .unwrap();
    assert_eq!(body, ParsedBody::Json(json!({ "key1": "value1", "key2": "value2" })));
}

#[tokio::test]
async fn error_status_over_the_wire() {
    let base = start_server();
    let fetch = fetcher(FetchOptions::new());
    let url = format!("{base}/status/400");

    let err = fetch
        .evaluate(&[json!("json"), json!(url), json!({})])
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ERR_HTTP_ERROR_RESPONSE));

    let response = err.as_expression().and_then(|e| e.response()).unwrap();
    assert_eq!(response.status, 400);
    assert_eq!(response.status_text, "Bad Request");
    assert_eq!(response.url, url);
    assert_eq!(
        response.headers.as_ref().unwrap()["content-type"],
        "application/json"
    );
    assert_eq!(
        response.body,
        ParsedBody::Json(json!({ "code": "HTTP_ERR_BAD_REQUEST" }))
    );
}

#[tokio::test]
async fn html_body_fails_json_parsing() {
    let base = start_server();
    let fetch = fetcher(FetchOptions::new());

    let err = fetch
        .fetch(BodyFormat::Json, &format!("{base}/invalid-json"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport(TransportError::InvalidJson(_))));

    let text = fetch
        .fetch(BodyFormat::Text, &format!("{base}/invalid-json"), None)
        .await
        .unwrap();
    assert_eq!(text.as_text(), Some("<h1>Hello World!</h1>"));
}

#[tokio::test]
async fn init_transformer_over_the_wire() {
    let base = start_server();
    let url = format!("{base}/authorization-token-required");

    let without = fetcher(FetchOptions::new());
    let err = without.fetch(BodyFormat::Json, &url, None).await.unwrap_err();
    let response = err.as_expression().and_then(|e| e.response()).unwrap();
    assert_eq!(response.status, 401);

    let with = fetcher(FetchOptions::new().init_transformer(|init| {
        Some(init.unwrap_or_default().with_header("Authorization", VALID_TOKEN))
    }));
    let body = with.fetch(BodyFormat::Json, &url, None).await.unwrap();
    assert_eq!(body.as_json().unwrap()["key2"], "value2");
}

#[tokio::test]
async fn init_reaches_the_server() {
    let base = start_server();
    let fetch = fetcher(FetchOptions::new());
    let init = FetchInit {
        method: Some(HttpMethod::Post),
        body: Some(json!("payload")),
        ..Default::default()
    }
    .with_header("X-Trace", "abc");

    let body = fetch
        .fetch(BodyFormat::Json, &format!("{base}/echo"), Some(init))
        .await
        .unwrap();
    let echo: Echo = serde_json::from_value(body.as_json().unwrap().clone()).unwrap();
    assert_eq!(echo.method, "POST");
    assert_eq!(echo.headers.get("x-trace").map(String::as_str), Some("abc"));
    assert_eq!(echo.body, "payload");
}

#[tokio::test]
async fn allow_list_blocks_before_dispatch() {
    let base = start_server();
    let fetch = fetcher(FetchOptions::new().allow_origins([base.clone()]));

    assert!(fetch
        .fetch(BodyFormat::Text, &format!("{base}/data.json"), None)
        .await
        .is_ok());

    let blocked = base.replace("127.0.0.1", "localhost");
    let err = fetch
        .fetch(BodyFormat::Text, &format!("{blocked}/data.json"), None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), Some(ERR_URL_NOT_ALLOWED));
    assert_eq!(fetch.transport().calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn connection_failure_is_a_transport_error() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let fetch = fetcher(FetchOptions::new());

    let err = fetch
        .fetch(BodyFormat::Text, &format!("http://{addr}/"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Transport(TransportError::Request { .. })));
    assert_eq!(err.code(), None);
}
