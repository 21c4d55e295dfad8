// Rust guideline compliant 2026-08-01

//! The JSON envelope that flows through every queue in the pipeline.
//!
//! Raw alerts are schemaless key-value mappings of unknown depth. Rather than
//! define one queue payload type per stage, a single [`AlertEnvelope`] is
//! carried end to end and annotated in place, mirroring the Python original's
//! plain `dict` passed through every stage's `pipeline.py`.

use serde_json::{Map, Value};

/// A schemaless alert payload, threaded through every stage of the pipeline.
///
/// Each stage may add keys (`module2_business_match`, `module3_investigation`,
/// ...) but never removes what a previous stage wrote.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlertEnvelope(Map<String, Value>);

impl AlertEnvelope {
    /// Wrap an existing JSON object.
    #[must_use]
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Parse an envelope from a UTF-8 JSON string as read off a queue.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when `text` is not a JSON object.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(text)?;
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => {
                // Force a type-mismatch error through serde_json's own machinery
                // rather than hand-rolling a variant for "was not an object".
                let reparsed: Result<Map<String, Value>, _> = serde_json::from_value(other);
                reparsed.map(Self)
            }
        }
    }

    /// Serialize this envelope back to a compact JSON string for queue storage.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error on an unserializable value (practically
    /// unreachable since the map is built exclusively from valid JSON).
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }

    /// Borrow the underlying JSON object.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Insert or overwrite a top-level key.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Fetch a top-level key by exact name.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Path-based lookup trying each dotted path in `paths`, in order, against
    /// this envelope (and nested objects within it).
    #[must_use]
    pub fn lookup_path(&self, paths: &[&str]) -> Option<&Value> {
        for path in paths {
            if let Some(v) = lookup_dotted_map(&self.0, path) {
                return Some(v);
            }
        }
        None
    }
}

impl From<Map<String, Value>> for AlertEnvelope {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<AlertEnvelope> for Value {
    fn from(envelope: AlertEnvelope) -> Self {
        Value::Object(envelope.0)
    }
}

/// Extension trait providing dotted-path lookup with literal-key precedence,
/// the "typed path lookup helper" called for in the dynamic-value design note.
///
/// A literal top-level key equal to the whole dotted path wins before the
/// path is split and walked segment by segment through nested objects.
pub trait PathLookup {
    /// Resolve `path` (e.g. `"source.ip"`) against `self`.
    fn lookup_dotted(&self, path: &str) -> Option<&Value>;

    /// Try each path in `paths`, in order, returning the first hit.
    fn lookup_first(&self, paths: &[&str]) -> Option<&Value> {
        paths.iter().find_map(|p| self.lookup_dotted(p))
    }
}

impl PathLookup for Value {
    fn lookup_dotted(&self, path: &str) -> Option<&Value> {
        let map = self.as_object()?;
        lookup_dotted_map(map, path)
    }
}

fn lookup_dotted_map<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    // A literal top-level key matching the whole dotted path wins first.
    if let Some(v) = map.get(path) {
        return Some(v);
    }

    let mut segments = path.split('.');
    let mut current = map.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Coerce a JSON value to a trimmed owned string, or `None` for
/// null/missing/empty-after-trim values.
#[must_use]
pub fn value_as_trimmed_string(value: Option<&Value>) -> Option<String> {
    let s = match value? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}
