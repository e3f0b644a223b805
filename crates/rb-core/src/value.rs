// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `StoreValue`: the JSON-like tree that backs the store and the expression
//! evaluator (§9 design note "Store typed as JSON tree").
//!
//! Mappings preserve insertion order (`IndexMap`) because the evaluator
//! walks ordered fields deterministically — a `HashMap` would make
//! `toMap()` output (and therefore expression results) depend on hash seed.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoreValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Sequence(Vec<StoreValue>),
    Mapping(IndexMap<String, StoreValue>),
}

impl Default for StoreValue {
    fn default() -> Self {
        StoreValue::Null
    }
}

impl StoreValue {
    pub fn mapping() -> Self {
        StoreValue::Mapping(IndexMap::new())
    }

    pub fn as_mapping(&self) -> Option<&IndexMap<String, StoreValue>> {
        match self {
            StoreValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut IndexMap<String, StoreValue>> {
        match self {
            StoreValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[StoreValue]> {
        match self {
            StoreValue::Sequence(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StoreValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            StoreValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StoreValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StoreValue::Null)
    }

    /// Truthiness used by `if`/`until` evaluation when the expression
    /// evaluator hands back a raw value rather than a bool.
    pub fn is_truthy(&self) -> bool {
        match self {
            StoreValue::Null => false,
            StoreValue::Bool(b) => *b,
            StoreValue::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
            StoreValue::String(s) => !s.is_empty(),
            StoreValue::Sequence(s) => !s.is_empty(),
            StoreValue::Mapping(m) => !m.is_empty(),
        }
    }

    /// Look up a dotted path (`a.b.c`, with numeric segments indexing
    /// sequences) — the lookup primitive the built-in evaluator uses.
    pub fn get_path(&self, path: &str) -> Option<&StoreValue> {
        let mut cur = self;
        for seg in path.split('.') {
            if seg.is_empty() {
                continue;
            }
            cur = match cur {
                StoreValue::Mapping(m) => m.get(seg)?,
                StoreValue::Sequence(s) => {
                    let idx: usize = seg.parse().ok()?;
                    s.get(idx)?
                }
                _ => return None,
            };
        }
        Some(cur)
    }
}

impl fmt::Display for StoreValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreValue::Null => write!(f, "null"),
            StoreValue::Bool(b) => write!(f, "{b}"),
            StoreValue::Number(n) => write!(f, "{n}"),
            StoreValue::String(s) => write!(f, "{s}"),
            StoreValue::Sequence(_) | StoreValue::Mapping(_) => {
                write!(f, "{}", self.to_json())
            }
        }
    }
}

impl From<&str> for StoreValue {
    fn from(s: &str) -> Self {
        StoreValue::String(s.to_string())
    }
}

impl From<String> for StoreValue {
    fn from(s: String) -> Self {
        StoreValue::String(s)
    }
}

impl From<bool> for StoreValue {
    fn from(b: bool) -> Self {
        StoreValue::Bool(b)
    }
}

impl From<i64> for StoreValue {
    fn from(n: i64) -> Self {
        StoreValue::Number(n.into())
    }
}

impl StoreValue {
    pub fn to_json(&self) -> Json {
        match self {
            StoreValue::Null => Json::Null,
            StoreValue::Bool(b) => Json::Bool(*b),
            StoreValue::Number(n) => Json::Number(n.clone()),
            StoreValue::String(s) => Json::String(s.clone()),
            StoreValue::Sequence(items) => Json::Array(items.iter().map(Self::to_json).collect()),
            StoreValue::Mapping(m) => {
                Json::Object(m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
        }
    }

    pub fn from_json(v: Json) -> Self {
        match v {
            Json::Null => StoreValue::Null,
            Json::Bool(b) => StoreValue::Bool(b),
            Json::Number(n) => StoreValue::Number(n),
            Json::String(s) => StoreValue::String(s),
            Json::Array(items) => StoreValue::Sequence(items.into_iter().map(Self::from_json).collect()),
            Json::Object(m) => StoreValue::Mapping(
                m.into_iter().map(|(k, v)| (k, Self::from_json(v))).collect(),
            ),
        }
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
