// src/sources.rs
use std::collections::HashSet;
use std::path::Path;

use serde_json::{Map, Value};

use crate::core::ConfigError;

// Registry exports are not consistent about key spelling.
const ID_KEYS: [&str; 4] = ["id", "Id", "ID", "code"];
const NAME_KEYS: [&str; 3] = ["name", "code", "location"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub id: String,
    pub name: String,
}

impl SourceDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

pub fn load_sources(path: &Path) -> Result<Vec<SourceDescriptor>, ConfigError> {
    let txt = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::with_context(format!("reading {}", path.display()), e))?;
    let sources = parse_sources(&txt)
        .map_err(|e| ConfigError::with_context(format!("parsing {}", path.display()), e))?;

    if sources.is_empty() {
        return Err(ConfigError::message(format!(
            "no cameras found in file: {}",
            path.display()
        )));
    }
    Ok(sources)
}

/// Accepts a bare array or an object wrapping the array under `value`.
pub fn parse_sources(txt: &str) -> Result<Vec<SourceDescriptor>, serde_json::Error> {
    let root: Value = serde_json::from_str(txt)?;

    let entries = match root {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("value") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let mut seen = HashSet::new();
    let mut sources = Vec::with_capacity(entries.len());

    for (idx, entry) in entries.iter().enumerate() {
        let Some(obj) = entry.as_object() else {
            log::warn!("[sources] entry #{} is not an object, skipped", idx);
            continue;
        };
        let Some(id) = first_field(obj, &ID_KEYS) else {
            log::warn!("[sources] entry #{} has no id, skipped", idx);
            continue;
        };
        if !seen.insert(id.clone()) {
            log::warn!("[sources] duplicate camera id '{}', keeping the first", id);
            continue;
        }
        let name = first_field(obj, &NAME_KEYS).unwrap_or_default();
        sources.push(SourceDescriptor { id, name });
    }

    Ok(sources)
}

fn first_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_array() {
        let sources = parse_sources(
            r#"[
                {"id": "5deb576d1dc17d7c5515ad03", "name": "Nam Kỳ Khởi Nghĩa - Nguyễn Đình Chiểu"},
                {"id": "56de42f611f398ec0c481291"}
            ]"#,
        )
        .unwrap();

        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].name, "Nam Kỳ Khởi Nghĩa - Nguyễn Đình Chiểu");
        assert_eq!(sources[1].id, "56de42f611f398ec0c481291");
        assert_eq!(sources[1].name, "");
    }

    #[test]
    fn test_value_wrapper_and_alternate_keys() {
        let sources = parse_sources(
            r#"{"value": [
                {"Id": "a1", "location": "Bridge"},
                {"ID": 42},
                {"code": "TD-7"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(
            sources,
            vec![
                SourceDescriptor::new("a1", "Bridge"),
                SourceDescriptor::new("42", ""),
                SourceDescriptor::new("TD-7", "TD-7"),
            ]
        );
    }

    #[test]
    fn test_skips_entries_without_id_and_duplicates() {
        let sources = parse_sources(
            r#"[{"name": "orphan"}, {"id": ""}, {"id": "x", "name": "first"}, {"id": "x", "name": "second"}, 7]"#,
        )
        .unwrap();

        assert_eq!(sources, vec![SourceDescriptor::new("x", "first")]);
    }

    #[test]
    fn test_unknown_shape_is_empty() {
        assert!(parse_sources(r#"{"cameras": []}"#).unwrap().is_empty());
        assert!(parse_sources("\"nope\"").unwrap().is_empty());
        assert!(parse_sources("not json").is_err());
    }

    #[test]
    fn test_load_empty_file_is_config_error() {
        let dir = crate::testing::scratch_dir("sources-empty");
        let path = dir.join("cameras.json");
        std::fs::write(&path, "[]").unwrap();

        let err = load_sources(&path).unwrap_err();
        assert!(err.to_string().contains("no cameras found"));

        assert!(load_sources(&dir.join("missing.json")).is_err());
    }
}
