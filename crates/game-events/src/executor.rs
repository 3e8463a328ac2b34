//! Outbound HTTP execution against the game's REST API.
//!
//! The executor turns a definition's ordered requests into blocking HTTP
//! calls. Requests run strictly in declared order because later calls may
//! depend on side effects of earlier ones in the game process. Ordinary
//! HTTP-level failures are summarized into the returned outcome, never
//! raised; only client construction can fail.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Method;
use serde_json::{Map, Value};

use crate::definition::{value_to_string, GameEvent, PayloadMode, RequestSpec};

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 8765;

/// Timeout for GET and query-style requests.
const QUERY_TIMEOUT: Duration = Duration::from_secs(8);
/// Timeout for requests carrying a JSON body.
const JSON_TIMEOUT: Duration = Duration::from_secs(10);

/// Summaries longer than this are truncated.
const SUMMARY_LIMIT: usize = 160;

/// Errors surfaced while building the HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Structured result of a single executed request.
#[derive(Debug, Clone)]
pub struct RequestOutcome {
    /// False for HTTP-level errors and transport failures.
    pub ok: bool,
    /// HTTP status code; 0 when the host was unreachable.
    pub status: u16,
    /// Short human-readable summary of the response.
    pub summary: String,
    /// Error text for failed requests.
    pub error: Option<String>,
    /// Raw response body, empty on transport failure.
    pub body: String,
}

impl RequestOutcome {
    /// The one-line form used for chat feedback and failure heuristics.
    pub fn display(&self) -> String {
        match &self.error {
            Some(error) => error.clone(),
            None => self.summary.clone(),
        }
    }
}

/// Thin wrapper over a blocking HTTP client with the engine's request
/// building rules.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: Client,
}

impl RestClient {
    pub fn new() -> Result<Self, ExecutorError> {
        let client = Client::builder().build()?;
        Ok(Self { client })
    }

    /// Executes one request spec and returns a structured outcome.
    pub fn execute_detailed(
        &self,
        host: &str,
        port: u16,
        request: &RequestSpec,
        headers: Option<&BTreeMap<String, String>>,
    ) -> RequestOutcome {
        let safe_host = if host.trim().is_empty() {
            DEFAULT_HOST
        } else {
            host.trim()
        };
        let safe_port = if port == 0 { DEFAULT_PORT } else { port };

        let params = match request.payload {
            PayloadMode::Query => request.query.clone(),
            PayloadMode::Json => request
                .body
                .iter()
                .map(|(key, value)| (key.clone(), value_to_string(value)))
                .collect(),
        };
        let (rendered_path, remaining) = render_path(&request.path, params);
        let url = format!("http://{}:{}{}", safe_host, safe_port, rendered_path);

        let method = match Method::from_bytes(request.method.as_bytes()) {
            Ok(method) => method,
            Err(_) => {
                let error = format!("Invalid HTTP method: {}", request.method);
                return RequestOutcome {
                    ok: false,
                    status: 0,
                    summary: error.clone(),
                    error: Some(error),
                    body: String::new(),
                };
            }
        };

        let builder = self.build_request(method, &url, request.payload, remaining);
        let builder = apply_headers(builder, headers);

        match builder.send() {
            Ok(response) => {
                let status = response.status();
                let body = response.text().unwrap_or_default();
                let summary = summarize_body(&body);
                if status.is_success() {
                    RequestOutcome {
                        ok: true,
                        status: status.as_u16(),
                        summary,
                        error: None,
                        body,
                    }
                } else {
                    let reason = status.canonical_reason().unwrap_or("");
                    RequestOutcome {
                        ok: false,
                        status: status.as_u16(),
                        error: Some(format!(
                            "HTTP {} {}: {}",
                            status.as_u16(),
                            reason,
                            summary
                        )),
                        summary,
                        body,
                    }
                }
            }
            Err(error) => {
                let text = error.to_string();
                RequestOutcome {
                    ok: false,
                    status: 0,
                    summary: text.clone(),
                    error: Some(text),
                    body: String::new(),
                }
            }
        }
    }

    /// Executes one request spec and returns the short summary form.
    pub fn execute(
        &self,
        host: &str,
        port: u16,
        request: &RequestSpec,
        headers: Option<&BTreeMap<String, String>>,
    ) -> String {
        self.execute_detailed(host, port, request, headers).display()
    }

    fn build_request(
        &self,
        method: Method,
        url: &str,
        payload: PayloadMode,
        params: BTreeMap<String, String>,
    ) -> RequestBuilder {
        // GET never carries a body regardless of the declared payload mode.
        if method == Method::GET {
            let pairs: Vec<(String, String)> = params.into_iter().collect();
            return self
                .client
                .get(url)
                .query(&pairs)
                .timeout(QUERY_TIMEOUT);
        }

        if payload == PayloadMode::Json {
            let mut body = Map::with_capacity(params.len());
            for (key, value) in params {
                body.insert(key, coerce_scalar(&value));
            }
            return self
                .client
                .request(method, url)
                .json(&body)
                .timeout(JSON_TIMEOUT);
        }

        let pairs: Vec<(String, String)> = params.into_iter().collect();
        self.client
            .request(method, url)
            .query(&pairs)
            .body("")
            .timeout(QUERY_TIMEOUT)
    }
}

fn apply_headers(
    builder: RequestBuilder,
    headers: Option<&BTreeMap<String, String>>,
) -> RequestBuilder {
    let Some(headers) = headers else {
        return builder;
    };
    headers.iter().fold(builder, |builder, (name, value)| {
        builder.header(name.as_str(), value.as_str())
    })
}

/// Substitutes `{key}` placeholders in a path from the parameter map,
/// removing consumed keys.
fn render_path(
    path: &str,
    params: BTreeMap<String, String>,
) -> (String, BTreeMap<String, String>) {
    let mut rendered = path.to_string();
    let mut remaining = BTreeMap::new();
    for (key, value) in params {
        let placeholder = format!("{{{}}}", key);
        if rendered.contains(&placeholder) {
            rendered = rendered.replace(&placeholder, &value);
        } else {
            remaining.insert(key, value);
        }
    }
    (rendered, remaining)
}

/// Coerces a string parameter into a typed JSON scalar.
///
/// Precedence: "true"/"false" (case-insensitive) → bool; all digits →
/// integer; contains `.`, `e` or `E` and parses → float; else the original
/// string.
pub fn coerce_scalar(value: &str) -> Value {
    let trimmed = value.trim();
    let lowered = trimmed.to_ascii_lowercase();

    if lowered == "true" {
        return Value::Bool(true);
    }
    if lowered == "false" {
        return Value::Bool(false);
    }

    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(number) = trimmed.parse::<i64>() {
            return Value::from(number);
        }
    }

    if !trimmed.is_empty() && trimmed.contains(['.', 'e', 'E']) {
        if let Ok(number) = trimmed.parse::<f64>() {
            if let Some(number) = serde_json::Number::from_f64(number) {
                return Value::Number(number);
            }
        }
    }

    Value::String(value.to_string())
}

/// Produces a short human-readable summary of a response body.
pub fn summarize_body(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<Value>(body) {
        if let Some(object) = parsed.as_object() {
            if let Some(success) = object.get("success") {
                return format!("success: {}", value_to_string(success));
            }
            if let Some(error) = object.get("error") {
                return value_to_string(error);
            }
            if let Some(first) = object
                .get("errors")
                .and_then(Value::as_array)
                .and_then(|errors| errors.first())
            {
                return value_to_string(first);
            }
            if object.contains_key("data") {
                return "ok".to_string();
            }
        }
        if let Some(items) = parsed.as_array() {
            return format!("ok ({})", items.len());
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "Done".to_string();
    }
    if trimmed.chars().count() > SUMMARY_LIMIT {
        let cut: String = trimmed.chars().take(SUMMARY_LIMIT).collect();
        return format!("{}...", cut);
    }
    trimmed.to_string()
}

/// Executes every request of an event definition, in declared order.
///
/// Only the first request carries the notification headers; one user-visible
/// notification per triggered event regardless of how many calls it issues.
#[derive(Debug, Clone)]
pub struct EventExecutor {
    client: RestClient,
}

impl EventExecutor {
    pub fn new() -> Result<Self, ExecutorError> {
        Ok(Self {
            client: RestClient::new()?,
        })
    }

    pub fn with_client(client: RestClient) -> Self {
        Self { client }
    }

    /// Runs the definition's requests, returning one summary per request.
    pub fn execute(&self, host: &str, port: u16, definition: &GameEvent) -> Vec<String> {
        self.execute_detailed(host, port, definition)
            .into_iter()
            .map(|outcome| outcome.display())
            .collect()
    }

    /// Runs the definition's requests, returning structured outcomes.
    pub fn execute_detailed(
        &self,
        host: &str,
        port: u16,
        definition: &GameEvent,
    ) -> Vec<RequestOutcome> {
        let notification_headers = definition.notification.headers();
        let mut results = Vec::with_capacity(definition.requests.len());

        for (index, request) in definition.requests.iter().enumerate() {
            let headers = if index == 0 {
                Some(&notification_headers)
            } else {
                None
            };
            results.push(self.client.execute_detailed(host, port, request, headers));
        }
        results
    }
}
