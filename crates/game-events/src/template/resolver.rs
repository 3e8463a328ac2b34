//! `$param` reference resolution inside template trees.
//!
//! A map node whose only key is `"$param"` is a reference; its value is a
//! dotted path into the sampled parameter map. Every other map resolves
//! value-wise, lists resolve element-wise, scalars pass through.

use serde_json::{Map, Value};

/// Errors raised while resolving a template tree.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("empty parameter name")]
    EmptyName,
    #[error("unknown parameter: {0}")]
    UnknownParameter(String),
    #[error("parameter path '{path}' expects an object at '{segment}'")]
    NotAnObject { path: String, segment: String },
    #[error("parameter path '{path}' missing key '{segment}'")]
    MissingKey { path: String, segment: String },
}

/// Resolves every `$param` reference in a template tree against the sampled
/// values.
pub fn resolve(template: &Value, values: &Map<String, Value>) -> Result<Value, ResolveError> {
    match template {
        Value::Object(object) => {
            if object.len() == 1 {
                if let Some(reference) = object.get("$param") {
                    let path = reference.as_str().unwrap_or("");
                    return resolve_path(path, values);
                }
            }

            let mut resolved = Map::with_capacity(object.len());
            for (key, value) in object {
                resolved.insert(key.clone(), resolve(value, values)?);
            }
            Ok(Value::Object(resolved))
        }
        Value::Array(items) => {
            let resolved: Result<Vec<Value>, ResolveError> =
                items.iter().map(|item| resolve(item, values)).collect();
            Ok(Value::Array(resolved?))
        }
        scalar => Ok(scalar.clone()),
    }
}

/// Looks up a dotted path, descending into nested objects segment by segment.
fn resolve_path(path: &str, values: &Map<String, Value>) -> Result<Value, ResolveError> {
    let segments: Vec<&str> = path
        .split('.')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect();

    let Some((root, rest)) = segments.split_first() else {
        return Err(ResolveError::EmptyName);
    };

    let mut current = values
        .get(*root)
        .ok_or_else(|| ResolveError::UnknownParameter(root.to_string()))?;

    for segment in rest {
        let object = current.as_object().ok_or_else(|| ResolveError::NotAnObject {
            path: path.to_string(),
            segment: segment.to_string(),
        })?;
        current = object.get(*segment).ok_or_else(|| ResolveError::MissingKey {
            path: path.to_string(),
            segment: segment.to_string(),
        })?;
    }

    Ok(current.clone())
}
