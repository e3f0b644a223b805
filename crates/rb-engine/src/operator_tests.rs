// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use indexmap::IndexMap;
use rb_core::{FakeClock, SystemClock};
use rb_runbook::{LoopSpec, RunnerKind, RunnerSpec, Step, Steps};
use rb_runners::FakeRunner;
use std::path::PathBuf;

/// A step dispatching to whatever `FakeRunner` is registered under
/// `"fake"` — the result it records comes from the registry, not from
/// this helper.
fn fake_step() -> Step {
    Step {
        desc: None,
        if_cond: None,
        loop_spec: None,
        runner: RunnerSpec {
            kind: RunnerKind::Named("fake".to_string()),
            payload: serde_json::Value::Null,
        },
        dump: None,
        bind: None,
        test: None,
    }
}

fn list_book(steps: Vec<Step>) -> Book {
    Book {
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
        steps: Steps::List(steps),
    }
}

fn registry_with_fake(runner: FakeRunner) -> RunnerRegistry {
    let mut r = RunnerRegistry::new();
    r.register("fake", Box::new(runner));
    r
}

fn operator(book: Book, registry: RunnerRegistry) -> Operator<SystemClock> {
    Operator::standalone(
        OperatorId::new("test-op"),
        "book.yml".to_string(),
        PathBuf::from("."),
        Arc::new(book),
        registry,
        OperatorConfig::default(),
    )
}

#[tokio::test]
async fn sequential_success_records_every_step() {
    let book = list_book(vec![fake_step(), fake_step()]);
    let registry = registry_with_fake(FakeRunner::succeeding(StoreValue::from(1)));
    let op = operator(book, registry);

    let result = op.run_collecting().await;

    assert!(result.err.is_none());
    assert!(!result.skipped);
    assert_eq!(result.step_results.len(), 2);
    assert!(result
        .step_results
        .iter()
        .all(|s| matches!(s.outcome, Outcome::Success)));
}

#[tokio::test]
async fn force_false_skips_steps_after_failure() {
    let book = list_book(vec![fake_step(), fake_step()]);
    let registry = registry_with_fake(FakeRunner::failing("boom"));
    let op = operator(book, registry);

    let result = op.run_collecting().await;

    assert!(result.err.is_some());
    assert_eq!(result.step_results.len(), 2);
    assert!(matches!(result.step_results[0].outcome, Outcome::Failure));
    assert!(result.step_results[1].skipped);
    assert!(matches!(result.step_results[1].outcome, Outcome::Skipped));
}

#[tokio::test]
async fn force_true_keeps_running_after_failure() {
    let mut book = list_book(vec![fake_step(), fake_step()]);
    book.force = true;
    let registry = registry_with_fake(FakeRunner::failing("boom"));
    let op = operator(book, registry);

    let result = op.run_collecting().await;

    assert!(result.err.is_some());
    assert!(!result.step_results[1].skipped);
}

#[tokio::test]
async fn top_level_if_false_skips_every_step_and_runs_no_hooks() {
    let mut book = list_book(vec![fake_step(), fake_step()]);
    book.if_cond = Some("false".to_string());
    book.before = vec!["this-should-never-run-12345".to_string()];
    let registry = registry_with_fake(FakeRunner::succeeding(StoreValue::Null));
    let op = operator(book, registry);

    let result = op.run_collecting().await;

    assert!(result.skipped);
    assert!(result.err.is_none());
    assert_eq!(result.step_results.len(), 2);
    assert!(result.step_results.iter().all(|s| s.skipped));
}

#[tokio::test]
async fn before_hook_failure_skips_every_step_and_does_not_run_after_hooks() {
    let marker = std::env::temp_dir().join(format!(
        "rb-after-hook-marker-{}-{}",
        std::process::id(),
        line!()
    ));
    let _ = std::fs::remove_file(&marker);

    let mut book = list_book(vec![fake_step(), fake_step()]);
    book.before = vec!["false".to_string()];
    book.after = vec![format!("touch {}", marker.display())];
    let registry = registry_with_fake(FakeRunner::succeeding(StoreValue::from(1)));
    let op = operator(book, registry);

    let result = op.run_collecting().await;

    assert!(result.err.is_some());
    assert!(!result.skipped);
    assert_eq!(result.step_results.len(), 2);
    assert!(result.step_results.iter().all(|s| s.skipped));
    assert!(result
        .step_results
        .iter()
        .all(|s| matches!(s.outcome, Outcome::Skipped)));
    assert!(!marker.exists(), "afterFuncs must not run when a beforeFunc fails");
}

#[tokio::test]
async fn step_loop_until_stops_as_soon_as_condition_is_true() {
    let mut step = fake_step();
    step.loop_spec = Some(LoopSpec {
        count: "5".to_string(),
        until: Some("current == 1".to_string()),
        interval: Some("0".to_string()),
        min_interval: None,
        max_interval: None,
    });
    let book = list_book(vec![step]);
    let registry = registry_with_fake(FakeRunner::succeeding(StoreValue::from(1)));

    let op = Operator::new(NewOperator {
        id: OperatorId::new("loop-op"),
        book_path: "loop.yml".to_string(),
        root_dir: PathBuf::from("."),
        book: Arc::new(book),
        registry,
        evaluator: Arc::new(crate::eval::BuiltinEvaluator),
        clock: FakeClock::new(),
        debugger: Arc::new(crate::debugger::NoopDebugger),
        capturer: Arc::new(crate::capture::NoopCapturer),
        stopwatch: Arc::new(Stopwatch::new()),
        kv: Kv::new(),
        waitmap: Arc::new(WaitMap::new()),
        needs: IndexMap::new(),
        config: OperatorConfig::default(),
        included: false,
    });

    let result = op.run_collecting().await;

    assert!(result.err.is_none());
    assert_eq!(result.step_results.len(), 1);
    assert!(matches!(result.step_results[0].outcome, Outcome::Success));
}

#[tokio::test]
async fn skipped_step_still_leaves_one_store_entry_per_step() {
    let mut book = list_book(vec![fake_step(), fake_step()]);
    book.steps = Steps::List(vec![
        {
            let mut s = fake_step();
            s.if_cond = Some("false".to_string());
            s
        },
        fake_step(),
    ]);
    let registry = registry_with_fake(FakeRunner::succeeding(StoreValue::from(2)));
    let op = operator(book, registry);

    let result = op.run_collecting().await;

    assert!(result.err.is_none());
    assert_eq!(result.step_results.len(), 2);
    assert!(result.step_results[0].skipped);
    assert!(!result.step_results[1].skipped);
}
