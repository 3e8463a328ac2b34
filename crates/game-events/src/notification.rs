//! Notification metadata attached to triggered events.
//!
//! The game process renders a user-visible notification for a triggered
//! event. How it is delivered and what it says is carried as request headers
//! on the first HTTP call of the event (see [`crate::executor`]).

use std::collections::BTreeMap;

use serde::Deserialize;

/// How the game should surface a notification for a triggered event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryMode {
    /// Suppress the notification entirely.
    None,
    /// Transient on-screen message.
    #[default]
    Message,
    /// Persistent letter in the game's inbox.
    Letter,
}

impl DeliveryMode {
    /// Parses a delivery mode from free-form document text.
    ///
    /// "none", "off" and "hide" all canonicalize to [`DeliveryMode::None`];
    /// anything that is not "letter" falls back to message delivery.
    pub fn parse(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "none" | "off" | "hide" => DeliveryMode::None,
            "letter" => DeliveryMode::Letter,
            _ => DeliveryMode::Message,
        }
    }

    /// Canonical lowercase name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMode::None => "none",
            DeliveryMode::Message => "message",
            DeliveryMode::Letter => "letter",
        }
    }
}

/// Raw `notification` object as it appears in an event document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationDocument {
    #[serde(default)]
    pub delivery: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Resolved notification options for a concrete event definition.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationOptions {
    pub delivery: DeliveryMode,
    pub severity: String,
    pub title: Option<String>,
    pub message: Option<String>,
    pub color: Option<String>,
}

impl NotificationOptions {
    /// Default options: message delivery with the definition's label as title
    /// and its user message (or label) as body.
    pub fn default_for(fallback_title: &str, fallback_message: &str) -> Self {
        Self {
            delivery: DeliveryMode::Message,
            severity: "info".to_string(),
            title: non_blank(fallback_title),
            message: non_blank(fallback_message),
            color: None,
        }
    }

    /// Builds options from an optional document, applying the defaulting
    /// rules: when delivery is `none` the message is forced empty; otherwise
    /// a missing message falls back to the definition's user message or
    /// label, and a missing title falls back to the label.
    pub fn from_document(
        document: Option<&NotificationDocument>,
        fallback_title: &str,
        fallback_message: &str,
    ) -> Self {
        let Some(document) = document else {
            return Self::default_for(fallback_title, fallback_message);
        };

        let delivery = DeliveryMode::parse(document.delivery.as_deref().unwrap_or("message"));
        let severity = document
            .severity
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("info")
            .to_string();
        let title = document.title.as_deref().and_then(non_blank);
        let message = document.message.as_deref().and_then(non_blank);
        let color = document.color.as_deref().and_then(non_blank);

        if delivery == DeliveryMode::None {
            return Self {
                delivery,
                severity,
                title,
                message: None,
                color,
            };
        }

        Self {
            delivery,
            severity,
            title: title.or_else(|| non_blank(fallback_title)),
            message: message
                .or_else(|| non_blank(fallback_message))
                .or_else(|| non_blank(fallback_title)),
            color,
        }
    }

    /// Builds the `X-Rest-Notify-*` headers for the first request of an
    /// event. Delivery and severity are always present; message and color are
    /// omitted when delivery is `none`.
    pub fn headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        headers.insert(
            "X-Rest-Notify-Delivery".to_string(),
            self.delivery.as_str().to_string(),
        );
        headers.insert("X-Rest-Notify-Severity".to_string(), self.severity.clone());

        if let Some(title) = &self.title {
            headers.insert("X-Rest-Notify-Title".to_string(), title.clone());
        }

        if self.delivery != DeliveryMode::None {
            if let Some(message) = &self.message {
                headers.insert("X-Rest-Notify-Message".to_string(), message.clone());
            }
            if let Some(color) = &self.color {
                headers.insert("X-Rest-Notify-Color".to_string(), color.clone());
            }
        }

        headers
    }
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_parse_none_family() {
        assert_eq!(DeliveryMode::parse("none"), DeliveryMode::None);
        assert_eq!(DeliveryMode::parse("OFF"), DeliveryMode::None);
        assert_eq!(DeliveryMode::parse(" hide "), DeliveryMode::None);
    }

    #[test]
    fn test_delivery_parse_fallbacks() {
        assert_eq!(DeliveryMode::parse("letter"), DeliveryMode::Letter);
        assert_eq!(DeliveryMode::parse("Letter"), DeliveryMode::Letter);
        assert_eq!(DeliveryMode::parse("message"), DeliveryMode::Message);
        assert_eq!(DeliveryMode::parse("banner"), DeliveryMode::Message);
        assert_eq!(DeliveryMode::parse(""), DeliveryMode::Message);
    }

    #[test]
    fn test_defaults_use_label_fallbacks() {
        let options = NotificationOptions::from_document(None, "Raid", "Incoming raid!");
        assert_eq!(options.delivery, DeliveryMode::Message);
        assert_eq!(options.severity, "info");
        assert_eq!(options.title.as_deref(), Some("Raid"));
        assert_eq!(options.message.as_deref(), Some("Incoming raid!"));
    }

    #[test]
    fn test_none_delivery_forces_empty_message() {
        let document = NotificationDocument {
            delivery: Some("off".to_string()),
            message: Some("should vanish".to_string()),
            ..NotificationDocument::default()
        };
        let options = NotificationOptions::from_document(Some(&document), "Raid", "Raid");
        assert_eq!(options.delivery, DeliveryMode::None);
        assert_eq!(options.message, None);
    }

    #[test]
    fn test_headers_for_none_delivery() {
        let document = NotificationDocument {
            delivery: Some("off".to_string()),
            title: Some("Quiet".to_string()),
            color: Some("#ff0000".to_string()),
            ..NotificationDocument::default()
        };
        let options = NotificationOptions::from_document(Some(&document), "Raid", "Raid");
        let headers = options.headers();

        assert_eq!(headers.get("X-Rest-Notify-Delivery").unwrap(), "none");
        assert_eq!(headers.get("X-Rest-Notify-Severity").unwrap(), "info");
        assert_eq!(headers.get("X-Rest-Notify-Title").unwrap(), "Quiet");
        assert!(!headers.contains_key("X-Rest-Notify-Message"));
        assert!(!headers.contains_key("X-Rest-Notify-Color"));
    }

    #[test]
    fn test_headers_for_message_delivery() {
        let document = NotificationDocument {
            delivery: Some("letter".to_string()),
            severity: Some("urgent".to_string()),
            message: Some("A dragon approaches".to_string()),
            color: Some("#aa00ff".to_string()),
            ..NotificationDocument::default()
        };
        let options = NotificationOptions::from_document(Some(&document), "Dragon", "Dragon");
        let headers = options.headers();

        assert_eq!(headers.get("X-Rest-Notify-Delivery").unwrap(), "letter");
        assert_eq!(headers.get("X-Rest-Notify-Severity").unwrap(), "urgent");
        assert_eq!(headers.get("X-Rest-Notify-Title").unwrap(), "Dragon");
        assert_eq!(
            headers.get("X-Rest-Notify-Message").unwrap(),
            "A dragon approaches"
        );
        assert_eq!(headers.get("X-Rest-Notify-Color").unwrap(), "#aa00ff");
    }

    #[test]
    fn test_blank_severity_defaults_to_info() {
        let document = NotificationDocument {
            severity: Some("   ".to_string()),
            ..NotificationDocument::default()
        };
        let options = NotificationOptions::from_document(Some(&document), "Raid", "Raid");
        assert_eq!(options.severity, "info");
    }
}
