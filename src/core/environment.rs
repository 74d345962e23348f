//! Process environment for the infrastructure binary.
//!
//! Every invocation inherits the parent environment. The variables held here
//! are layered on top, for example provider credentials or `TF_LOG`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Variable set by every invocation so the binary skips interactive hints.
pub const AUTOMATION_VAR: &str = "TF_IN_AUTOMATION";

/// Extra environment variables passed to the infrastructure binary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a variable.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Add a variable, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// Get a variable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|s| s.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Merge another environment into this one.
    /// Variables from `other` override existing variables.
    pub fn merge(&mut self, other: &Environment) {
        for (k, v) in &other.vars {
            self.vars.insert(k.clone(), v.clone());
        }
    }

    /// Create a new environment by merging this one with another.
    pub fn merged_with(&self, other: &Environment) -> Self {
        let mut result = self.clone();
        result.merge(other);
        result
    }

    /// The variables handed to a child process: automation marker first, so
    /// callers can still override it.
    pub fn for_process(&self) -> Vec<(String, String)> {
        let mut out = Vec::with_capacity(self.vars.len() + 1);
        if !self.contains(AUTOMATION_VAR) {
            out.push((AUTOMATION_VAR.to_string(), "true".to_string()));
        }
        out.extend(self.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        out
    }

    /// Iterate over the variables in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.vars.iter()
    }
}

impl From<HashMap<String, String>> for Environment {
    fn from(map: HashMap<String, String>) -> Self {
        Self {
            vars: map.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for Environment {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}
