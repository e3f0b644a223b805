// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use indexmap::IndexMap;
use rb_core::{OperatorId, SystemClock};
use rb_runbook::{Book, IncludeSpec, RunnerKind, RunnerSpec, Step, Steps};
use rb_runners::FakeRunner;
use std::io::Write;

fn write_book(dir: &std::path::Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut f = std::fs::File::create(&path).expect("create fixture book");
    f.write_all(contents.as_bytes()).expect("write fixture book");
    path
}

fn parent_operator(root_dir: std::path::PathBuf, registry: RunnerRegistry) -> Operator<SystemClock> {
    let step = Step {
        desc: None,
        if_cond: None,
        loop_spec: None,
        runner: RunnerSpec {
            kind: RunnerKind::Include,
            payload: serde_json::to_value(IncludeSpec {
                path: "child.yml".to_string(),
                vars: IndexMap::new(),
            })
            .expect("serialize include spec"),
        },
        dump: None,
        bind: None,
        test: None,
    };
    let book = Book {
        desc: None,
        labels: Vec::new(),
        runners: IndexMap::new(),
        needs: IndexMap::new(),
        if_cond: None,
        loop_spec: None,
        before: Vec::new(),
        after: Vec::new(),
        concurrency: Vec::new(),
        wait_timeout: None,
        fail_fast: false,
        force: false,
        skip_test: false,
        interval: None,
        steps: Steps::List(vec![step]),
    };
    Operator::standalone(
        OperatorId::new("parent"),
        "parent.yml".to_string(),
        root_dir,
        Arc::new(book),
        registry,
        OperatorConfig::default(),
    )
}

#[tokio::test]
async fn included_runbook_runs_and_attaches_its_result() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_book(
        dir.path(),
        "child.yml",
        "steps:\n  - desc: only step\n    fake: {}\n",
    );

    let mut registry = RunnerRegistry::new();
    registry.register("fake", Box::new(FakeRunner::succeeding(StoreValue::from(1))));
    let parent = parent_operator(dir.path().to_path_buf(), registry);

    let result = parent.run_collecting().await;

    assert!(result.err.is_none());
    assert_eq!(result.step_results.len(), 1);
    let nested = &result.step_results[0].included_run_results;
    assert_eq!(nested.len(), 1);
    assert!(nested[0].err.is_none());
    assert_eq!(nested[0].step_results.len(), 1);
}

#[tokio::test]
async fn included_runbook_seeds_vars_before_first_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_book(
        dir.path(),
        "child.yml",
        "steps:\n  - desc: check var\n    fake: {}\n    test: \"vars.greeting == 'hi'\"\n",
    );

    let step = Step {
        desc: None,
        if_cond: None,
        loop_spec: None,
        runner: RunnerSpec {
            kind: RunnerKind::Include,
            payload: serde_json::to_value(IncludeSpec {
                path: "child.yml".to_string(),
                vars: {
                    let mut v = IndexMap::new();
                    v.insert("greeting".to_string(), serde_json::json!("hi"));
                    v
                },
            })
            .expect("serialize include spec"),
        },
        dump: None,
        bind: None,
        test: None,
    };
    let book = Book {
        desc: None,
        labels: Vec::new(),
        runners: IndexMap::new(),
        needs: IndexMap::new(),
        if_cond: None,
        loop_spec: None,
        before: Vec::new(),
        after: Vec::new(),
        concurrency: Vec::new(),
        wait_timeout: None,
        fail_fast: false,
        force: false,
        skip_test: false,
        interval: None,
        steps: Steps::List(vec![step]),
    };
    let mut registry = RunnerRegistry::new();
    registry.register("fake", Box::new(FakeRunner::succeeding(StoreValue::from(1))));
    let parent = Operator::standalone(
        OperatorId::new("parent"),
        "parent.yml".to_string(),
        dir.path().to_path_buf(),
        Arc::new(book),
        registry,
        OperatorConfig::default(),
    );

    let result = parent.run_collecting().await;

    assert!(result.err.is_none());
    let nested = &result.step_results[0].included_run_results;
    assert!(nested[0].err.is_none());
}

#[tokio::test]
async fn missing_included_book_fails_without_panicking() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut registry = RunnerRegistry::new();
    registry.register("fake", Box::new(FakeRunner::succeeding(StoreValue::Null)));
    let parent = parent_operator(dir.path().to_path_buf(), registry);

    let result = parent.run_collecting().await;

    assert!(result.err.is_some());
    let nested = &result.step_results[0].included_run_results;
    assert_eq!(nested.len(), 1);
    assert!(nested[0].err.is_some());
}

