//! Concrete event definitions and their HTTP request specs.
//!
//! A [`GameEvent`] is a ready-to-execute event: every value is literal and
//! every request can be issued as-is. Parameterized blueprints live in
//! [`crate::template`] and are instantiated into this type.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::loader::LoadError;
use crate::notification::{NotificationDocument, NotificationOptions};

/// How a request's parameters travel on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadMode {
    /// Parameters are coerced into a JSON object body.
    #[default]
    Json,
    /// Parameters are sent verbatim as query-string pairs.
    Query,
}

/// Raw request object as it appears in an event document.
#[derive(Debug, Clone, Deserialize)]
pub struct RequestDocument {
    #[serde(default = "default_method")]
    pub method: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub payload: PayloadMode,
    #[serde(default)]
    pub body: Map<String, Value>,
    #[serde(default)]
    pub query: Map<String, Value>,
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_path() -> String {
    "/".to_string()
}

/// A single outbound HTTP call of an event definition.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    /// Uppercase HTTP method name, validated at execution time.
    pub method: String,
    pub path: String,
    pub payload: PayloadMode,
    /// Body parameters for `payload = json`.
    pub body: BTreeMap<String, Value>,
    /// Query parameters for `payload = query`.
    pub query: BTreeMap<String, String>,
}

impl RequestSpec {
    /// Converts a parsed request document, normalizing method and path.
    pub fn from_document(document: RequestDocument) -> Self {
        let method = if document.method.trim().is_empty() {
            default_method()
        } else {
            document.method.trim().to_uppercase()
        };
        let path = if document.path.trim().is_empty() {
            default_path()
        } else {
            document.path.clone()
        };

        Self {
            method,
            path,
            payload: document.payload,
            body: document.body.into_iter().collect(),
            query: document
                .query
                .into_iter()
                .map(|(key, value)| (key, value_to_string(&value)))
                .collect(),
        }
    }
}

/// Renders a JSON scalar the way it should appear as a string parameter.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Raw event document as authored on disk.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDocument {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub cost: i64,
    #[serde(default = "default_probability")]
    pub probability: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub requests: Vec<RequestDocument>,
    #[serde(default)]
    pub user_message: Option<String>,
    #[serde(default)]
    pub notification: Option<NotificationDocument>,
    #[serde(default)]
    pub hidden: bool,
}

pub(crate) fn default_probability() -> f64 {
    1.0
}

/// A concrete, ready-to-execute event definition.
///
/// Immutable once constructed; catalog reloads replace whole instances.
#[derive(Debug, Clone, PartialEq)]
pub struct GameEvent {
    /// Unique identifier, used for purchase lookup and de-duplication.
    pub id: String,
    /// Display label; falls back to the id when absent.
    pub label: String,
    /// Silver cost to trigger; 0 means free.
    pub cost: i64,
    /// Relative weight for random selection.
    pub probability: f64,
    pub tags: Vec<String>,
    /// Ordered HTTP calls issued when the event fires.
    pub requests: Vec<RequestSpec>,
    /// Optional chat-facing message shown on purchase.
    pub user_message: Option<String>,
    pub notification: NotificationOptions,
    /// Hidden events are excluded from purchasable and poll listings.
    pub hidden: bool,
}

impl GameEvent {
    /// Validates and converts a parsed document into a definition.
    pub fn from_document(document: EventDocument) -> Result<Self, LoadError> {
        let id = document.id.trim().to_string();
        if id.is_empty() {
            return Err(LoadError::MissingId);
        }

        let label = {
            let trimmed = document.label.trim();
            if trimmed.is_empty() {
                id.clone()
            } else {
                trimmed.to_string()
            }
        };

        let tags: Vec<String> = document
            .tags
            .into_iter()
            .filter(|tag| !tag.trim().is_empty())
            .collect();

        let user_message = document
            .user_message
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        let fallback_message = user_message.as_deref().unwrap_or(&label).to_string();
        let notification = NotificationOptions::from_document(
            document.notification.as_ref(),
            &label,
            &fallback_message,
        );

        let requests = document
            .requests
            .into_iter()
            .map(RequestSpec::from_document)
            .collect();

        Ok(Self {
            id,
            label,
            cost: document.cost,
            probability: document.probability,
            tags,
            requests,
            user_message,
            notification,
            hidden: document.hidden,
        })
    }

    /// Parses a definition straight from a JSON object.
    pub fn from_json(document: Map<String, Value>) -> Result<Self, LoadError> {
        let parsed: EventDocument = serde_json::from_value(Value::Object(document))?;
        Self::from_document(parsed)
    }

    /// Text shown for this event as a poll option: the user message when
    /// present, otherwise the label.
    pub fn option_text(&self) -> &str {
        self.user_message.as_deref().unwrap_or(&self.label)
    }

    /// True when the tag set covers every requested tag.
    pub fn has_all_tags(&self, required: &[String]) -> bool {
        required
            .iter()
            .all(|tag| self.tags.iter().any(|own| own == tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::DeliveryMode;
    use serde_json::json;

    fn parse(document: serde_json::Value) -> Result<GameEvent, LoadError> {
        let object = document.as_object().cloned().expect("object document");
        GameEvent::from_json(object)
    }

    #[test]
    fn test_minimal_document() {
        let event = parse(json!({"id": "raid_small"})).unwrap();

        assert_eq!(event.id, "raid_small");
        assert_eq!(event.label, "raid_small");
        assert_eq!(event.cost, 0);
        assert_eq!(event.probability, 1.0);
        assert!(event.tags.is_empty());
        assert!(event.requests.is_empty());
        assert!(!event.hidden);
        assert_eq!(event.notification.delivery, DeliveryMode::Message);
    }

    #[test]
    fn test_missing_id_is_an_error() {
        assert!(matches!(parse(json!({"label": "Raid"})), Err(LoadError::MissingId)));
        assert!(matches!(parse(json!({"id": "  "})), Err(LoadError::MissingId)));
    }

    #[test]
    fn test_full_document() {
        let event = parse(json!({
            "id": "raid_big",
            "label": "Big Raid",
            "cost": 500,
            "probability": 0.25,
            "tags": ["raid", "  ", "combat"],
            "userMessage": "  A big raid! ",
            "hidden": true,
            "requests": [
                {"method": "post", "path": "/events/raid", "payload": "json",
                 "body": {"points": "1000"}},
                {"payload": "query", "query": {"count": 3}}
            ]
        }))
        .unwrap();

        assert_eq!(event.label, "Big Raid");
        assert_eq!(event.cost, 500);
        assert_eq!(event.tags, vec!["raid".to_string(), "combat".to_string()]);
        assert_eq!(event.user_message.as_deref(), Some("A big raid!"));
        assert!(event.hidden);

        assert_eq!(event.requests.len(), 2);
        assert_eq!(event.requests[0].method, "POST");
        assert_eq!(event.requests[0].path, "/events/raid");
        assert_eq!(event.requests[1].method, "POST");
        assert_eq!(event.requests[1].path, "/");
        assert_eq!(event.requests[1].payload, PayloadMode::Query);
        assert_eq!(event.requests[1].query.get("count").unwrap(), "3");
    }

    #[test]
    fn test_unknown_payload_mode_is_rejected() {
        let result = parse(json!({
            "id": "bad",
            "requests": [{"payload": "form"}]
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_notification_falls_back_to_user_message() {
        let event = parse(json!({
            "id": "cheer",
            "label": "Cheer",
            "userMessage": "Drinks all around",
            "notification": {"severity": "good"}
        }))
        .unwrap();

        assert_eq!(event.notification.severity, "good");
        assert_eq!(event.notification.title.as_deref(), Some("Cheer"));
        assert_eq!(
            event.notification.message.as_deref(),
            Some("Drinks all around")
        );
    }

    #[test]
    fn test_option_text_prefers_user_message() {
        let with_message = parse(json!({"id": "a", "userMessage": "Go!"})).unwrap();
        let without = parse(json!({"id": "b", "label": "Fallback"})).unwrap();

        assert_eq!(with_message.option_text(), "Go!");
        assert_eq!(without.option_text(), "Fallback");
    }

    #[test]
    fn test_has_all_tags() {
        let event = parse(json!({"id": "a", "tags": ["raid", "combat"]})).unwrap();

        assert!(event.has_all_tags(&[]));
        assert!(event.has_all_tags(&["raid".to_string()]));
        assert!(event.has_all_tags(&["raid".to_string(), "combat".to_string()]));
        assert!(!event.has_all_tags(&["weather".to_string()]));
    }
}
