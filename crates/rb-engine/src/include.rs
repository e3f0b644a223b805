// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `include`: recursively constructs and runs a nested [`Operator`] from
//! a referenced Book path (§4.8). Lives here rather than in `rb-runners`
//! because it needs `Operator` itself, which already depends on
//! `rb-runners` — putting it there would be circular.

use std::sync::Arc;

use indexmap::IndexMap;
use rb_core::{Clock, OperatorId, StoreValue};
use rb_runbook::IncludeSpec;

use crate::operator::{NewOperator, Operator, RunResult};
use crate::waitmap::WaitMap;

/// Runs the runbook named by `spec.path` (resolved against `parent`'s
/// root dir) as a nested operator on the calling task, seeding its bind
/// vars from `spec.vars` first.
///
/// A nested operator gets a fresh, private `WaitMap`: it is never wired
/// into the parent planner's dependency graph, so an included runbook
/// that itself declares `needs:` will block forever waiting on a
/// dependency that can never publish. Included runbooks should not use
/// `needs:`.
pub async fn run_included<C: Clock>(parent: &Operator<C>, spec: &IncludeSpec) -> RunResult {
    let path = parent.root_dir().join(&spec.path);

    let loaded = match rb_runbook::load_book(&path) {
        Ok(loaded) => loaded,
        Err(e) => {
            return RunResult {
                id: path.display().to_string(),
                book_path: path.display().to_string(),
                desc: None,
                labels: Vec::new(),
                included: true,
                err: Some(e.to_string()),
                skipped: false,
                elapsed: std::time::Duration::ZERO,
                step_results: Vec::new(),
            };
        }
    };

    let operator = Operator::new(NewOperator {
        id: OperatorId::new(loaded.id.as_str()),
        book_path: loaded.path.display().to_string(),
        root_dir: loaded.root_dir,
        book: Arc::new(loaded.book),
        registry: parent.registry(),
        evaluator: parent.evaluator(),
        clock: parent.clock(),
        debugger: parent.debugger(),
        capturer: parent.capturer(),
        stopwatch: parent.stopwatch(),
        kv: parent.kv(),
        waitmap: Arc::new(WaitMap::new()),
        needs: IndexMap::new(),
        config: parent.config(),
        included: true,
    });

    for (k, v) in &spec.vars {
        operator.seed_var(k.clone(), StoreValue::from_json(v.clone())).await;
    }

    operator.run_collecting().await
}

#[cfg(test)]
#[path = "include_tests.rs"]
mod tests;
