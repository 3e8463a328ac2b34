//! JSONC document loading.
//!
//! Event and template documents are authored as JSON with comments. The
//! loader strips `//` line comments and `/* */` block comments outside of
//! string literals, then parses the remainder with `serde_json`.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

/// Errors raised while loading a single document.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("document root must be an object: {0}")]
    RootNotObject(PathBuf),
    #[error("document missing required field 'id'")]
    MissingId,
}

/// Loads a JSONC file and returns its root object.
pub fn load_document(path: &Path) -> Result<Map<String, Value>, LoadError> {
    let text = std::fs::read_to_string(path)?;
    let cleaned = strip_jsonc_comments(&text);
    let parsed: Value = serde_json::from_str(&cleaned)?;
    match parsed {
        Value::Object(object) => Ok(object),
        _ => Err(LoadError::RootNotObject(path.to_path_buf())),
    }
}

/// Removes JSONC comments, leaving string contents untouched.
pub fn strip_jsonc_comments(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut result = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut index = 0;

    while index < chars.len() {
        let character = chars[index];
        let next = chars.get(index + 1).copied();

        if in_string {
            result.push(character);
            if escaped {
                escaped = false;
            } else if character == '\\' {
                escaped = true;
            } else if character == '"' {
                in_string = false;
            }
            index += 1;
            continue;
        }

        if character == '"' {
            in_string = true;
            result.push(character);
            index += 1;
            continue;
        }

        // Line comment: skip to end of line, keep the newline.
        if character == '/' && next == Some('/') {
            index += 2;
            while index < chars.len() && chars[index] != '\n' && chars[index] != '\r' {
                index += 1;
            }
            continue;
        }

        // Block comment.
        if character == '/' && next == Some('*') {
            index += 2;
            while index + 1 < chars.len() && !(chars[index] == '*' && chars[index + 1] == '/') {
                index += 1;
            }
            index = (index + 2).min(chars.len());
            continue;
        }

        result.push(character);
        index += 1;
    }

    result
}
