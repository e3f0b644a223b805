// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-operator store (§3, §4.1): step history, bind vars, needs vars,
//! loop index, and the HTTP cookie jar. Feeds the expression evaluator
//! through `to_map()`.

use crate::StoreValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store is in map mode and no key was given")]
    MissingKey,
    #[error("store is in list mode but a key was given")]
    UnexpectedKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreMode {
    List,
    Map,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Success,
    Failure,
    Skipped,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
            Outcome::Skipped => "skipped",
        }
    }
}

#[derive(Debug, Clone)]
struct StepEntry {
    key: Option<String>,
    value: StoreValue,
}

/// Per-operator store: one `StepEntry` per executed (or skipped) step, plus
/// the three companion planes described in spec.md §3.
#[derive(Debug, Clone)]
pub struct Store {
    mode: StoreMode,
    step_history: Vec<StepEntry>,
    bind_vars: IndexMap<String, StoreValue>,
    needs_vars: IndexMap<String, Option<StoreValue>>,
    loop_index: Option<usize>,
    cookies: IndexMap<String, StoreValue>,
}

impl Store {
    pub fn new(mode: StoreMode) -> Self {
        Self {
            mode,
            step_history: Vec::new(),
            bind_vars: IndexMap::new(),
            needs_vars: IndexMap::new(),
            loop_index: None,
            cookies: IndexMap::new(),
        }
    }

    pub fn mode(&self) -> StoreMode {
        self.mode
    }

    /// List-mode append: one entry per step in index order.
    pub fn record_as_listed(&mut self, v: StoreValue) {
        self.step_history.push(StepEntry { key: None, value: v });
    }

    /// Map-mode insert: keyed by the step's declared key.
    pub fn record_as_mapped(&mut self, key: impl Into<String>, v: StoreValue) {
        self.step_history.push(StepEntry {
            key: Some(key.into()),
            value: v,
        });
    }

    /// Remove the most recently recorded entry (used by the loop driver's
    /// "ring of one" rewrite: delete-then-append on each iteration so only
    /// the terminal iteration persists — §4.1, P9).
    pub fn remove_latest_as_mapped(&mut self) -> bool {
        self.step_history.pop().is_some()
    }

    /// Set a field on the most recently recorded entry's value (used to
    /// attach the outcome after a step runs). Idempotent for the same key:
    /// re-setting the same key just overwrites it, no duplicate insert.
    pub fn record_to_latest(&mut self, k: &str, v: StoreValue) {
        if let Some(entry) = self.step_history.last_mut() {
            if let StoreValue::Mapping(m) = &mut entry.value {
                m.insert(k.to_string(), v);
            } else {
                let mut m = IndexMap::new();
                m.insert(k.to_string(), v);
                entry.value = StoreValue::Mapping(m);
            }
        }
    }

    pub fn record_to_cookie(&mut self, cookies: IndexMap<String, StoreValue>) {
        for (k, v) in cookies {
            self.cookies.insert(k, v);
        }
    }

    pub fn cookies(&self) -> &IndexMap<String, StoreValue> {
        &self.cookies
    }

    pub fn length(&self) -> usize {
        self.step_history.len()
    }

    pub fn clear_steps(&mut self) {
        self.step_history.clear();
    }

    pub fn previous(&self) -> Option<&StoreValue> {
        let n = self.step_history.len();
        if n < 2 {
            None
        } else {
            Some(&self.step_history[n - 2].value)
        }
    }

    pub fn latest(&self) -> Option<&StoreValue> {
        self.step_history.last().map(|e| &e.value)
    }

    pub fn set_bind_var(&mut self, k: impl Into<String>, v: StoreValue) {
        self.bind_vars.insert(k.into(), v);
    }

    pub fn bind_vars(&self) -> &IndexMap<String, StoreValue> {
        &self.bind_vars
    }

    pub fn set_needs_var(&mut self, alias: impl Into<String>, v: Option<StoreValue>) {
        self.needs_vars.insert(alias.into(), v);
    }

    pub fn set_loop_index(&mut self, idx: Option<usize>) {
        self.loop_index = idx;
    }

    pub fn loop_index(&self) -> Option<usize> {
        self.loop_index
    }

    /// Render the store for the evaluator: `steps` is a sequence in list
    /// mode and a mapping in map mode; `previous`/`current` mirror the
    /// second-to-last and last recorded entries.
    pub fn to_map(&self) -> StoreValue {
        let steps = match self.mode {
            StoreMode::List => {
                StoreValue::Sequence(self.step_history.iter().map(|e| e.value.clone()).collect())
            }
            StoreMode::Map => {
                let mut m = IndexMap::new();
                for entry in &self.step_history {
                    if let Some(k) = &entry.key {
                        m.insert(k.clone(), entry.value.clone());
                    }
                }
                StoreValue::Mapping(m)
            }
        };

        let mut root = IndexMap::new();
        root.insert("steps".to_string(), steps);
        root.insert(
            "previous".to_string(),
            self.previous().cloned().unwrap_or(StoreValue::Null),
        );
        root.insert(
            "current".to_string(),
            self.latest().cloned().unwrap_or(StoreValue::Null),
        );
        root.insert(
            "vars".to_string(),
            StoreValue::Mapping(self.bind_vars.clone()),
        );
        let needs = self
            .needs_vars
            .iter()
            .map(|(k, v)| (k.clone(), v.clone().unwrap_or(StoreValue::Null)))
            .collect();
        root.insert("needs".to_string(), StoreValue::Mapping(needs));
        root.insert(
            "loop".to_string(),
            match self.loop_index {
                Some(i) => StoreValue::from(i as i64),
                None => StoreValue::Null,
            },
        );
        root.insert(
            "cookies".to_string(),
            StoreValue::Mapping(self.cookies.clone()),
        );
        StoreValue::Mapping(root)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
