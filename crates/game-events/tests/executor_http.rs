//! End-to-end executor tests against a minimal in-process HTTP server.
//!
//! The server captures incoming requests so the tests can assert on the
//! wire-level behavior: header placement, payload coercion and query
//! encoding.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use game_events::{EventExecutor, GameEvent};
use serde_json::json;

/// One captured HTTP request.
#[derive(Debug, Clone)]
struct CapturedRequest {
    method: String,
    target: String,
    /// Header names lowercased.
    headers: HashMap<String, String>,
    body: String,
}

/// Spawns a single-threaded test server answering every request with the
/// given status and body. Returns the bound port and the capture log.
fn spawn_server(status: u16, response_body: &'static str) -> (u16, Arc<Mutex<Vec<CapturedRequest>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test server");
    let port = listener.local_addr().unwrap().port();
    let captured = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&captured);

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { break };
            let mut reader = BufReader::new(stream);

            let mut request_line = String::new();
            if reader.read_line(&mut request_line).is_err() {
                continue;
            }
            let mut parts = request_line.split_whitespace();
            let method = parts.next().unwrap_or("").to_string();
            let target = parts.next().unwrap_or("").to_string();

            let mut headers = HashMap::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).is_err() || line.trim().is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    headers.insert(name.trim().to_lowercase(), value.trim().to_string());
                }
            }

            let content_length: usize = headers
                .get("content-length")
                .and_then(|value| value.parse().ok())
                .unwrap_or(0);
            let mut body = vec![0u8; content_length];
            if content_length > 0 {
                reader.read_exact(&mut body).ok();
            }

            log.lock().unwrap().push(CapturedRequest {
                method,
                target,
                headers,
                body: String::from_utf8_lossy(&body).to_string(),
            });

            let reason = match status {
                200 => "OK",
                500 => "Internal Server Error",
                _ => "Unknown",
            };
            let response = format!(
                "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                reason,
                response_body.len(),
                response_body
            );
            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).ok();
        }
    });

    (port, captured)
}

fn event(document: serde_json::Value) -> GameEvent {
    GameEvent::from_json(document.as_object().cloned().unwrap()).unwrap()
}

#[test]
fn notification_headers_only_on_first_request() {
    let (port, captured) = spawn_server(200, "{}");
    let executor = EventExecutor::new().unwrap();

    let definition = event(json!({
        "id": "raid",
        "label": "Raid",
        "notification": {"delivery": "letter", "severity": "urgent"},
        "requests": [
            {"method": "POST", "path": "/first", "body": {}},
            {"method": "POST", "path": "/second", "body": {}}
        ]
    }));

    let results = executor.execute("127.0.0.1", port, &definition);
    assert_eq!(results.len(), 2);

    let captured = captured.lock().unwrap();
    assert_eq!(captured.len(), 2);

    let first = &captured[0];
    assert_eq!(first.target, "/first");
    assert_eq!(first.headers.get("x-rest-notify-delivery").unwrap(), "letter");
    assert_eq!(first.headers.get("x-rest-notify-severity").unwrap(), "urgent");
    assert_eq!(first.headers.get("x-rest-notify-title").unwrap(), "Raid");
    assert_eq!(first.headers.get("x-rest-notify-message").unwrap(), "Raid");

    let second = &captured[1];
    assert_eq!(second.target, "/second");
    assert!(!second.headers.contains_key("x-rest-notify-delivery"));
    assert!(!second.headers.contains_key("x-rest-notify-severity"));
}

#[test]
fn suppressed_notification_omits_message_and_color() {
    let (port, captured) = spawn_server(200, "{}");
    let executor = EventExecutor::new().unwrap();

    let definition = event(json!({
        "id": "silent",
        "label": "Silent",
        "notification": {"delivery": "off", "color": "#123456"},
        "requests": [{"method": "POST", "path": "/x", "body": {}}]
    }));

    executor.execute("127.0.0.1", port, &definition);

    let captured = captured.lock().unwrap();
    let request = &captured[0];
    assert_eq!(request.headers.get("x-rest-notify-delivery").unwrap(), "none");
    assert!(request.headers.contains_key("x-rest-notify-severity"));
    assert!(!request.headers.contains_key("x-rest-notify-message"));
    assert!(!request.headers.contains_key("x-rest-notify-color"));
}

#[test]
fn json_payload_coerces_scalars() {
    let (port, captured) = spawn_server(200, "{}");
    let executor = EventExecutor::new().unwrap();

    let definition = event(json!({
        "id": "raid",
        "requests": [{
            "method": "POST", "path": "/raid", "payload": "json",
            "body": {"points": "350", "hostile": "true", "faction": "pirate", "scale": "1.5"}
        }]
    }));

    executor.execute("127.0.0.1", port, &definition);

    let captured = captured.lock().unwrap();
    let request = &captured[0];
    assert_eq!(request.method, "POST");
    assert!(request
        .headers
        .get("content-type")
        .unwrap()
        .starts_with("application/json"));

    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(body["points"], json!(350));
    assert_eq!(body["hostile"], json!(true));
    assert_eq!(body["faction"], json!("pirate"));
    assert_eq!(body["scale"], json!(1.5));
}

#[test]
fn query_payload_sends_verbatim_parameters() {
    let (port, captured) = spawn_server(200, "{}");
    let executor = EventExecutor::new().unwrap();

    let definition = event(json!({
        "id": "weather",
        "requests": [{
            "method": "GET", "path": "/weather", "payload": "query",
            "query": {"kind": "storm", "count": "3"}
        }]
    }));

    executor.execute("127.0.0.1", port, &definition);

    let captured = captured.lock().unwrap();
    let request = &captured[0];
    assert_eq!(request.method, "GET");
    assert!(request.target.starts_with("/weather?"));
    assert!(request.target.contains("kind=storm"));
    assert!(request.target.contains("count=3"));
    assert!(request.body.is_empty());
}

#[test]
fn http_error_is_summarized_not_raised() {
    let (port, _captured) = spawn_server(500, r#"{"error": "kaboom"}"#);
    let executor = EventExecutor::new().unwrap();

    let definition = event(json!({
        "id": "broken",
        "requests": [{"method": "POST", "path": "/x", "body": {}}]
    }));

    let outcomes = executor.execute_detailed("127.0.0.1", port, &definition);
    assert_eq!(outcomes.len(), 1);
    assert!(!outcomes[0].ok);
    assert_eq!(outcomes[0].status, 500);
    assert_eq!(outcomes[0].summary, "kaboom");
    assert_eq!(
        outcomes[0].error.as_deref(),
        Some("HTTP 500 Internal Server Error: kaboom")
    );
}

#[test]
fn unreachable_host_returns_error_outcome() {
    // Bind and immediately drop a listener to find a dead port.
    let dead_port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let executor = EventExecutor::new().unwrap();
    let definition = event(json!({
        "id": "ghost",
        "requests": [{"method": "POST", "path": "/x", "body": {}}]
    }));

    let outcomes = executor.execute_detailed("127.0.0.1", dead_port, &definition);
    assert_eq!(outcomes.len(), 1);
    assert!(!outcomes[0].ok);
    assert_eq!(outcomes[0].status, 0);
    assert!(outcomes[0].error.is_some());
    assert!(outcomes[0].body.is_empty());
}

#[test]
fn path_placeholders_render_from_body_parameters() {
    let (port, captured) = spawn_server(200, "{}");
    let executor = EventExecutor::new().unwrap();

    let definition = event(json!({
        "id": "targeted",
        "requests": [{
            "method": "POST", "path": "/maps/{mapId}/raid", "payload": "json",
            "body": {"mapId": "7", "points": "100"}
        }]
    }));

    executor.execute("127.0.0.1", port, &definition);

    let captured = captured.lock().unwrap();
    let request = &captured[0];
    assert_eq!(request.target, "/maps/7/raid");

    // The consumed placeholder key is not duplicated into the body.
    let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
    assert!(body.get("mapId").is_none());
    assert_eq!(body["points"], json!(100));
}
