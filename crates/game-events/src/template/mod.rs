//! Parameterized event templates.
//!
//! A template is a blueprint: it declares named parameters with value
//! distributions and request trees containing `{"$param": "dotted.path"}`
//! reference nodes. Instantiation samples every parameter and resolves the
//! trees into a concrete [`GameEvent`](crate::definition::GameEvent).

pub mod distribution;
pub mod instantiate;
pub mod resolver;

pub use distribution::{sample_distribution, Distribution, SampleError, WeightedValue};
pub use instantiate::{
    instantiate, instantiate_with_rng, instantiate_with_values, sample_parameters,
    InstantiateError,
};
pub use resolver::{resolve, ResolveError};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::catalog::{dedupe_by_id, jsonc_files, normalize_tags};
use crate::loader::{load_document, LoadError};

/// A named template parameter and the rule for sampling its value.
#[derive(Debug, Clone)]
pub struct TemplateParameter {
    pub name: String,
    pub distribution: Distribution,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ParameterDocument {
    distribution: Distribution,
    #[serde(default)]
    description: String,
}

/// One request blueprint of a template; body and query are arbitrary trees
/// that may contain `$param` references.
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    pub method: String,
    pub path: String,
    pub payload: crate::definition::PayloadMode,
    pub body_template: Value,
    pub query_template: Value,
}

#[derive(Debug, Clone, Deserialize)]
struct RequestTemplateDocument {
    #[serde(default = "default_method")]
    method: String,
    #[serde(default = "default_path")]
    path: String,
    #[serde(default)]
    payload: crate::definition::PayloadMode,
    #[serde(default)]
    body: Value,
    #[serde(default)]
    query: Value,
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_path() -> String {
    "/".to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateDocument {
    id: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    cost: i64,
    #[serde(default = "crate::definition::default_probability")]
    probability: f64,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    user_message: Option<String>,
    #[serde(default)]
    notification: Option<Value>,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    parameters: BTreeMap<String, ParameterDocument>,
    #[serde(default)]
    requests: Vec<RequestTemplateDocument>,
}

/// A parameterized event blueprint as loaded from disk.
#[derive(Debug, Clone)]
pub struct EventTemplate {
    pub id: String,
    pub label: String,
    pub cost: i64,
    pub probability: f64,
    pub tags: Vec<String>,
    pub user_message: Option<String>,
    /// Untyped notification tree, resolved like any other template tree.
    pub notification_template: Option<Value>,
    pub hidden: bool,
    pub parameters: Vec<TemplateParameter>,
    pub requests: Vec<RequestTemplate>,
}

impl EventTemplate {
    /// Validates and converts a raw JSON object into a template.
    pub fn from_json(document: Map<String, Value>) -> Result<Self, LoadError> {
        let parsed: TemplateDocument = serde_json::from_value(Value::Object(document))?;

        let id = parsed.id.trim().to_string();
        if id.is_empty() {
            return Err(LoadError::MissingId);
        }

        let label = {
            let trimmed = parsed.label.trim();
            if trimmed.is_empty() {
                id.clone()
            } else {
                trimmed.to_string()
            }
        };

        let tags = parsed
            .tags
            .into_iter()
            .filter(|tag| !tag.trim().is_empty())
            .collect();

        let user_message = parsed
            .user_message
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        let notification_template = parsed.notification.filter(Value::is_object);

        let parameters = parsed
            .parameters
            .into_iter()
            .map(|(name, document)| TemplateParameter {
                name,
                distribution: document.distribution,
                description: document.description,
            })
            .collect();

        let requests = parsed
            .requests
            .into_iter()
            .map(|document| RequestTemplate {
                method: if document.method.trim().is_empty() {
                    default_method()
                } else {
                    document.method.trim().to_uppercase()
                },
                path: if document.path.trim().is_empty() {
                    default_path()
                } else {
                    document.path
                },
                payload: document.payload,
                body_template: document.body,
                query_template: document.query,
            })
            .collect();

        Ok(Self {
            id,
            label,
            cost: parsed.cost,
            probability: parsed.probability,
            tags,
            user_message,
            notification_template,
            hidden: parsed.hidden,
            parameters,
            requests,
        })
    }

    /// True when the tag set covers every requested tag.
    pub fn has_all_tags(&self, required: &[String]) -> bool {
        required
            .iter()
            .all(|tag| self.tags.iter().any(|own| own == tag))
    }
}

/// A loaded template together with its source file.
#[derive(Debug, Clone)]
pub struct TemplateEntry {
    pub template: EventTemplate,
    pub path: PathBuf,
}

/// Loads event templates from a directory of JSONC files.
#[derive(Debug, Clone)]
pub struct TemplateRepository {
    directory: PathBuf,
}

impl TemplateRepository {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Loads every parseable template; same skip/dedupe rules as the event
    /// repository.
    pub fn load_all(&self) -> Vec<TemplateEntry> {
        let mut entries = Vec::new();
        for path in jsonc_files(&self.directory) {
            match load_document(&path).and_then(EventTemplate::from_json) {
                Ok(template) => entries.push(TemplateEntry {
                    template,
                    path: path.clone(),
                }),
                Err(error) => {
                    tracing::warn!("Skipping template file {:?}: {}", path, error);
                }
            }
        }
        dedupe_by_id(entries, |entry| &entry.template.id)
    }
}

/// In-memory catalog of event templates.
#[derive(Debug)]
pub struct TemplateCatalog {
    repository: TemplateRepository,
    entries: RwLock<Vec<TemplateEntry>>,
}

impl TemplateCatalog {
    /// Creates a catalog and performs the initial load.
    pub fn new(repository: TemplateRepository) -> Self {
        let entries = repository.load_all();
        Self {
            repository,
            entries: RwLock::new(entries),
        }
    }

    /// Replaces the in-memory set from the backing directory.
    pub fn reload(&self) {
        let entries = self.repository.load_all();
        let mut guard = self.entries.write().unwrap_or_else(|e| e.into_inner());
        *guard = entries;
    }

    /// Snapshot of the loaded entries, including source paths.
    pub fn entries(&self) -> Vec<TemplateEntry> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// All loaded templates.
    pub fn all(&self) -> Vec<EventTemplate> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|entry| entry.template.clone())
            .collect()
    }

    /// Templates whose tag set covers every requested tag.
    pub fn by_tags(&self, tags: &[String]) -> Vec<EventTemplate> {
        let required = normalize_tags(tags);
        if required.is_empty() {
            return self.all();
        }
        self.all()
            .into_iter()
            .filter(|template| template.has_all_tags(&required))
            .collect()
    }

    /// Sorted set of every tag used by loaded templates.
    pub fn all_tags(&self) -> Vec<String> {
        let mut tags = std::collections::BTreeSet::new();
        for template in self.all() {
            for tag in &template.tags {
                if !tag.trim().is_empty() {
                    tags.insert(tag.clone());
                }
            }
        }
        tags.into_iter().collect()
    }

    /// First template of the tag-filtered pool, if any.
    pub fn pick_first(&self, tags: &[String]) -> Option<EventTemplate> {
        self.by_tags(tags).into_iter().next()
    }
}
