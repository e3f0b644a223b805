// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Book`: the parsed-but-not-yet-running runbook (§3).

use indexmap::IndexMap;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as Json;

/// Ordered (list) or keyed (map) body — the runbook author picks one form
/// per file; the chosen form determines the operator's store mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Steps {
    List(Vec<Step>),
    Map(IndexMap<String, Step>),
}

impl Steps {
    pub fn len(&self) -> usize {
        match self {
            Steps::List(v) => v.len(),
            Steps::Map(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate as `(index, key, step)` regardless of the chosen form.
    pub fn iter_indexed(&self) -> Box<dyn Iterator<Item = (usize, Option<&str>, &Step)> + '_> {
        match self {
            Steps::List(v) => Box::new(v.iter().enumerate().map(|(i, s)| (i, None, s))),
            Steps::Map(m) => Box::new(
                m.iter()
                    .enumerate()
                    .map(|(i, (k, s))| (i, Some(k.as_str()), s)),
            ),
        }
    }
}

/// The built-in runner kinds named in spec.md §4.2; anything else is a
/// named fallback resolved by a registered generic `runnerRunner` at run
/// time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerKind {
    Http,
    Db,
    Grpc,
    Cdp,
    Ssh,
    Exec,
    Include,
    Named(String),
}

impl RunnerKind {
    pub fn label(&self) -> &str {
        match self {
            RunnerKind::Http => "http",
            RunnerKind::Db => "db",
            RunnerKind::Grpc => "grpc",
            RunnerKind::Cdp => "cdp",
            RunnerKind::Ssh => "ssh",
            RunnerKind::Exec => "exec",
            RunnerKind::Include => "include",
            RunnerKind::Named(n) => n,
        }
    }

    fn from_key(key: &str) -> Self {
        match key {
            "http" => RunnerKind::Http,
            "db" => RunnerKind::Db,
            "grpc" => RunnerKind::Grpc,
            "cdp" => RunnerKind::Cdp,
            "ssh" => RunnerKind::Ssh,
            "exec" => RunnerKind::Exec,
            "include" => RunnerKind::Include,
            other => RunnerKind::Named(other.to_string()),
        }
    }
}

/// The runner a step invokes, plus its raw (unvalidated) payload. The
/// concrete interpretation of the payload belongs to `rb-runners`.
#[derive(Debug, Clone, Serialize)]
pub struct RunnerSpec {
    pub kind: RunnerKind,
    pub payload: Json,
}

/// One parsed step: condition, loop spec, chosen runner, and sub-runners.
#[derive(Debug, Clone, Serialize)]
pub struct Step {
    pub desc: Option<String>,
    pub if_cond: Option<String>,
    pub loop_spec: Option<LoopSpec>,
    pub runner: RunnerSpec,
    pub dump: Option<Json>,
    pub bind: Option<IndexMap<String, String>>,
    pub test: Option<String>,
}

/// Field names reserved by the step envelope — anything else left in the
/// flattened map is the runner selection (§4.2 step 4: "select one
/// runner by key").
const RESERVED_STEP_FIELDS: &[&str] = &["desc", "if", "loop", "dump", "bind", "test"];

impl<'de> Deserialize<'de> for Step {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut map = IndexMap::<String, Json>::deserialize(deserializer)?;

        let desc = map
            .shift_remove("desc")
            .map(|v| serde_json::from_value(v).map_err(DeError::custom))
            .transpose()?;
        let if_cond = map
            .shift_remove("if")
            .map(|v| serde_json::from_value(v).map_err(DeError::custom))
            .transpose()?;
        let loop_spec = map
            .shift_remove("loop")
            .map(|v| serde_json::from_value(v).map_err(DeError::custom))
            .transpose()?;
        let dump = map.shift_remove("dump");
        let bind = map
            .shift_remove("bind")
            .map(|v| serde_json::from_value(v).map_err(DeError::custom))
            .transpose()?;
        let test = map
            .shift_remove("test")
            .map(|v| serde_json::from_value(v).map_err(DeError::custom))
            .transpose()?;

        for reserved in RESERVED_STEP_FIELDS {
            map.shift_remove(*reserved);
        }

        let (key, payload) = match map.len() {
            1 => map.into_iter().next().expect("len checked above"),
            0 => return Err(DeError::custom("step has no runner selected")),
            _ => {
                let keys: Vec<_> = map.keys().cloned().collect();
                return Err(DeError::custom(format!(
                    "step selects more than one runner: {}",
                    keys.join(", ")
                )));
            }
        };

        Ok(Step {
            desc,
            if_cond,
            loop_spec,
            runner: RunnerSpec {
                kind: RunnerKind::from_key(&key),
                payload,
            },
            dump,
            bind,
            test,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncludeSpec {
    pub path: String,
    #[serde(default)]
    pub vars: IndexMap<String, Json>,
}

/// Loop spec attached to a step or to a whole runbook (§4.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopSpec {
    /// Expression yielding an integer cap, evaluated once per loop entry.
    pub count: String,
    #[serde(default)]
    pub until: Option<String>,
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(rename = "minInterval", default)]
    pub min_interval: Option<String>,
    #[serde(rename = "maxInterval", default)]
    pub max_interval: Option<String>,
}

impl LoopSpec {
    /// `retrySuccess = (until == "")` per §4.2: a loop with no `until`
    /// always runs to `count` and is judged successful on completion.
    pub fn retry_success(&self) -> bool {
        self.until.is_none()
    }
}

/// The full parsed runbook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub runners: IndexMap<String, Json>,
    /// alias -> relative path, resolved against the operator's root dir.
    #[serde(default)]
    pub needs: IndexMap<String, String>,
    #[serde(rename = "if", default)]
    pub if_cond: Option<String>,
    #[serde(rename = "loop", default)]
    pub loop_spec: Option<LoopSpec>,
    #[serde(default)]
    pub before: Vec<String>,
    #[serde(default)]
    pub after: Vec<String>,
    #[serde(default)]
    pub concurrency: Vec<String>,
    #[serde(rename = "waitTimeout", default)]
    pub wait_timeout: Option<String>,
    #[serde(rename = "failFast", default)]
    pub fail_fast: bool,
    #[serde(default)]
    pub force: bool,
    #[serde(rename = "skipTest", default)]
    pub skip_test: bool,
    #[serde(rename = "interval", default)]
    pub interval: Option<String>,
    pub steps: Steps,
}

impl Book {
    pub fn store_mode(&self) -> rb_core::StoreMode {
        match self.steps {
            Steps::List(_) => rb_core::StoreMode::List,
            Steps::Map(_) => rb_core::StoreMode::Map,
        }
    }
}

#[cfg(test)]
#[path = "book_tests.rs"]
mod tests;
