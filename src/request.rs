use chrono::NaiveDate;
use std::fmt;

use crate::cutoff;
use crate::error::{Error, Result};

/// Query string under construction.
///
/// Only values that were actually given end up here; `None` never turns into
/// an empty `key=` pair.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: &str, value: impl ToString) {
        self.pairs.push((key.to_string(), value.to_string()));
    }

    pub fn push_opt<V: ToString>(&mut self, key: &str, value: Option<V>) {
        if let Some(v) = value {
            self.push(key, v);
        }
    }

    /// Comma-joins `values`; an empty slice adds nothing.
    pub fn push_list<V: ToString>(&mut self, key: &str, values: &[V]) {
        if values.is_empty() {
            return;
        }
        let joined = values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.push(key, joined);
    }

    /// Sets `created_before`, letting an explicit value win over the cutoff.
    pub fn push_created_before(&mut self, explicit: Option<&str>, cutoff: NaiveDate) {
        match explicit {
            Some(value) => self.push("created_before", value),
            None => self.push("created_before", cutoff::created_before_param(cutoff)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> Vec<&str> {
        self.pairs.iter().map(|(k, _)| k.as_str()).collect()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Unencoded `k=v&k=v`, for logs.
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        f.write_str(&joined)
    }
}

pub fn describe(method: &str, path: &str, query: &Query) -> String {
    if query.is_empty() {
        format!("{} {}", method, path)
    } else {
        format!("{} {}?{}", method, path, query)
    }
}

/// Platform ids start at 1.
pub fn require_id(name: &str, id: u64) -> Result<u64> {
    if id == 0 {
        return Err(Error::validation(format!("{} must be a positive id", name)));
    }
    Ok(id)
}

pub fn optional_id(name: &str, id: Option<u64>) -> Result<Option<u64>> {
    id.map(|v| require_id(name, v)).transpose()
}

pub fn require_page(page: Option<u32>) -> Result<Option<u32>> {
    match page {
        Some(0) => Err(Error::validation("page numbers start at 1")),
        other => Ok(other),
    }
}

// ============================================================================
// Tests
// ============================================================================
