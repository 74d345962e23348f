//! Input variables passed on the command line with `-var`.
//!
//! Values are JSON values so callers can pass strings, numbers, lists and
//! maps alike. Complex values are rendered in the configuration language's
//! literal syntax, which the binary parses back into typed values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Named input values for a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Vars {
    values: BTreeMap<String, Value>,
}

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a variable.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Add a variable, replacing any previous value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Merge `other` into this set; its values win.
    pub fn merge(&mut self, other: &Vars) {
        for (k, v) in &other.values {
            self.values.insert(k.clone(), v.clone());
        }
    }

    /// Render as `-var name=value` argument pairs, sorted by name.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.values.len() * 2);
        for (name, value) in &self.values {
            args.push("-var".to_string());
            args.push(format!("{}={}", name, render(value, true)));
        }
        args
    }

    /// Parse a `name=value` pair as given on a command line. The value is
    /// always kept as a string.
    pub fn parse_assignment(raw: &str) -> Option<(String, Value)> {
        let (name, value) = raw.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some((name.to_string(), Value::String(value.to_string())))
    }
}

impl FromIterator<(String, Value)> for Vars {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Render a value in literal syntax. Top-level strings go through unquoted,
/// nested strings are quoted.
fn render(value: &Value, top_level: bool) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if top_level => s.clone(),
        Value::String(s) => quote(s),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(|v| render(v, false)).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let inner: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{} = {}", quote(k), render(&map[k], false)))
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

fn quote(s: &str) -> String {
    // JSON string escaping matches the configuration language for the
    // characters that matter here (quotes, backslashes, control chars).
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s))
}
