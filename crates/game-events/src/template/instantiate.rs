//! Template instantiation: sampling plus resolution.
//!
//! Instantiation failures are per-template; callers running a poll or
//! catalog round treat a failed template as contributing nothing, never as a
//! fatal error.

use rand::Rng;
use serde_json::{Map, Value};

use crate::definition::{value_to_string, GameEvent, RequestSpec};
use crate::notification::{NotificationDocument, NotificationOptions};
use crate::template::distribution::{sample_distribution, SampleError};
use crate::template::resolver::{resolve, ResolveError};
use crate::template::EventTemplate;

/// Why a single instantiation attempt was aborted.
#[derive(Debug, thiserror::Error)]
pub enum InstantiateError {
    #[error("sampling parameter '{name}': {source}")]
    Sample {
        name: String,
        source: SampleError,
    },
    #[error("resolving template tree: {0}")]
    Resolve(#[from] ResolveError),
    #[error("resolved notification is invalid: {0}")]
    Notification(serde_json::Error),
}

/// Samples every declared parameter into a name → value map.
pub fn sample_parameters(
    template: &EventTemplate,
    rng: &mut impl Rng,
) -> Result<Map<String, Value>, InstantiateError> {
    let mut values = Map::with_capacity(template.parameters.len());
    for parameter in &template.parameters {
        let sampled = sample_distribution(&parameter.distribution, rng).map_err(|source| {
            InstantiateError::Sample {
                name: parameter.name.clone(),
                source,
            }
        })?;
        values.insert(parameter.name.clone(), sampled);
    }
    Ok(values)
}

/// Instantiates a template into a concrete definition using the thread RNG.
pub fn instantiate(template: &EventTemplate) -> Result<GameEvent, InstantiateError> {
    instantiate_with_rng(template, &mut rand::thread_rng())
}

/// Instantiates a template with a caller-provided RNG (deterministic tests).
pub fn instantiate_with_rng(
    template: &EventTemplate,
    rng: &mut impl Rng,
) -> Result<GameEvent, InstantiateError> {
    let values = sample_parameters(template, rng)?;
    instantiate_with_values(template, &values)
}

/// Resolves a template against an already-sampled value map.
pub fn instantiate_with_values(
    template: &EventTemplate,
    values: &Map<String, Value>,
) -> Result<GameEvent, InstantiateError> {
    let mut requests = Vec::with_capacity(template.requests.len());
    for request in &template.requests {
        let body = resolve(&request.body_template, values)?;
        let query = resolve(&request.query_template, values)?;

        let body_map = match body {
            Value::Object(map) => map.into_iter().collect(),
            _ => Default::default(),
        };
        let query_map = match query {
            Value::Object(map) => map
                .into_iter()
                .map(|(key, value)| (key, value_to_string(&value)))
                .collect(),
            _ => Default::default(),
        };

        requests.push(RequestSpec {
            method: request.method.clone(),
            path: request.path.clone(),
            payload: request.payload,
            body: body_map,
            query: query_map,
        });
    }

    let fallback_message = template
        .user_message
        .as_deref()
        .unwrap_or(&template.label)
        .to_string();

    let notification = match &template.notification_template {
        Some(tree) => {
            let resolved = resolve(tree, values)?;
            let document: Option<NotificationDocument> = match resolved {
                Value::Object(map) => Some(
                    serde_json::from_value(Value::Object(map))
                        .map_err(InstantiateError::Notification)?,
                ),
                _ => None,
            };
            NotificationOptions::from_document(
                document.as_ref(),
                &template.label,
                &fallback_message,
            )
        }
        None => NotificationOptions::from_document(None, &template.label, &fallback_message),
    };

    Ok(GameEvent {
        id: template.id.clone(),
        label: template.label.clone(),
        cost: template.cost,
        probability: template.probability,
        tags: template.tags.clone(),
        requests,
        user_message: template.user_message.clone(),
        notification,
        hidden: template.hidden,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::PayloadMode;
    use crate::notification::DeliveryMode;
    use serde_json::json;

    fn template(document: serde_json::Value) -> EventTemplate {
        EventTemplate::from_json(document.as_object().cloned().unwrap()).unwrap()
    }

    #[test]
    fn test_fixed_parameters_are_deterministic() {
        let template = template(json!({
            "id": "raid_points",
            "parameters": {
                "mapId": {"distribution": {"kind": "fixed", "value": 5}}
            },
            "requests": [
                {"path": "/raid", "body": {"mapId": {"$param": "mapId"}}}
            ]
        }));

        let event = instantiate(&template).unwrap();
        assert_eq!(event.requests.len(), 1);
        assert_eq!(event.requests[0].body.get("mapId").unwrap(), &json!(5));
    }

    #[test]
    fn test_instantiate_carries_template_identity() {
        let template = template(json!({
            "id": "raid_any",
            "label": "Any Raid",
            "cost": 250,
            "probability": 0.5,
            "tags": ["combat"],
            "hidden": true,
            "userMessage": "Raid incoming"
        }));

        let event = instantiate(&template).unwrap();
        assert_eq!(event.id, "raid_any");
        assert_eq!(event.label, "Any Raid");
        assert_eq!(event.cost, 250);
        assert_eq!(event.probability, 0.5);
        assert_eq!(event.tags, vec!["combat".to_string()]);
        assert!(event.hidden);
        assert_eq!(event.user_message.as_deref(), Some("Raid incoming"));
    }

    #[test]
    fn test_structured_parameter_with_dotted_references() {
        let template = template(json!({
            "id": "faction_raid",
            "parameters": {
                "faction": {"distribution": {"kind": "fixed",
                    "value": {"name": "Pirate", "hostile": true}}}
            },
            "requests": [
                {"path": "/raid",
                 "body": {"faction": {"$param": "faction.name"},
                          "hostile": {"$param": "faction.hostile"}}}
            ]
        }));

        let event = instantiate(&template).unwrap();
        let body = &event.requests[0].body;
        assert_eq!(body.get("faction").unwrap(), &json!("Pirate"));
        assert_eq!(body.get("hostile").unwrap(), &json!(true));
    }

    #[test]
    fn test_unresolvable_reference_aborts() {
        let template = template(json!({
            "id": "broken",
            "requests": [{"path": "/x", "body": {"value": {"$param": "ghost"}}}]
        }));

        assert!(matches!(
            instantiate(&template),
            Err(InstantiateError::Resolve(_))
        ));
    }

    #[test]
    fn test_empty_choice_aborts_with_parameter_name() {
        let template = template(json!({
            "id": "broken",
            "parameters": {"pick": {"distribution": {"kind": "choice", "values": []}}}
        }));

        match instantiate(&template) {
            Err(InstantiateError::Sample { name, .. }) => assert_eq!(name, "pick"),
            other => panic!("expected sample error, got {:?}", other),
        }
    }

    #[test]
    fn test_query_values_are_stringified() {
        let template = template(json!({
            "id": "query_event",
            "requests": [
                {"path": "/w", "payload": "query",
                 "query": {"count": {"$param": "count"}, "label": "storm"}}
            ],
            "parameters": {
                "count": {"distribution": {"kind": "fixed", "value": 3}}
            }
        }));

        let event = instantiate(&template).unwrap();
        let request = &event.requests[0];
        assert_eq!(request.payload, PayloadMode::Query);
        assert_eq!(request.query.get("count").unwrap(), "3");
        assert_eq!(request.query.get("label").unwrap(), "storm");
    }

    #[test]
    fn test_notification_template_resolves() {
        let template = template(json!({
            "id": "styled",
            "label": "Styled",
            "parameters": {
                "style": {"distribution": {"kind": "fixed",
                    "value": {"color": "#00ff00", "severity": "good"}}}
            },
            "notification": {
                "delivery": "letter",
                "severity": {"$param": "style.severity"},
                "color": {"$param": "style.color"}
            }
        }));

        let event = instantiate(&template).unwrap();
        assert_eq!(event.notification.delivery, DeliveryMode::Letter);
        assert_eq!(event.notification.severity, "good");
        assert_eq!(event.notification.color.as_deref(), Some("#00ff00"));
        // Message falls back to the label.
        assert_eq!(event.notification.message.as_deref(), Some("Styled"));
    }

    #[test]
    fn test_missing_notification_uses_defaults() {
        let template = template(json!({"id": "plain", "label": "Plain"}));
        let event = instantiate(&template).unwrap();
        assert_eq!(event.notification.delivery, DeliveryMode::Message);
        assert_eq!(event.notification.title.as_deref(), Some("Plain"));
    }

    #[test]
    fn test_non_object_body_resolution_collapses_to_empty() {
        let template = template(json!({
            "id": "odd",
            "parameters": {"v": {"distribution": {"kind": "fixed", "value": 7}}},
            "requests": [{"path": "/x", "body": {"$param": "v"}}]
        }));

        let event = instantiate(&template).unwrap();
        assert!(event.requests[0].body.is_empty());
    }
}
