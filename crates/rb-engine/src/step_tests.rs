// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::eval::BuiltinEvaluator;
use rb_core::StoreValue;

#[test]
fn list_mode_name_has_no_key() {
    assert_eq!(
        format_step_name(Some("do thing"), None, 2, None),
        "\"do thing\".steps[2]"
    );
}

#[test]
fn map_mode_name_uses_key() {
    assert_eq!(
        format_step_name(Some("do thing"), Some("first"), 0, None),
        "\"do thing\".steps.first"
    );
}

#[test]
fn loop_index_appends_suffix() {
    assert_eq!(
        format_step_name(Some("retry"), None, 0, Some(3)),
        "\"retry\".steps[0].loop[3]"
    );
}

#[tokio::test]
async fn no_until_runs_exactly_count_iterations() {
    let spec = LoopSpec {
        count: "3".to_string(),
        until: None,
        interval: None,
        min_interval: None,
        max_interval: None,
    };
    let evaluator = BuiltinEvaluator;
    let runner = LoopRunner {
        spec: &spec,
        evaluator: &evaluator,
    };
    let mut seen = 0;
    let n = runner
        .run(
            "step",
            &StoreValue::Null,
            || StoreValue::Null,
            |_| async {},
            |_i| {
                seen += 1;
                async {}
            },
        )
        .await
        .expect("no until always succeeds");
    assert_eq!(n, 3);
    assert_eq!(seen, 3);
}

#[tokio::test]
async fn until_stops_on_first_true() {
    let spec = LoopSpec {
        count: "5".to_string(),
        until: Some("current.n >= 3".to_string()),
        interval: None,
        min_interval: None,
        max_interval: None,
    };
    let evaluator = BuiltinEvaluator;
    let runner = LoopRunner {
        spec: &spec,
        evaluator: &evaluator,
    };
    let counter = std::cell::Cell::new(0);
    let n = runner
        .run(
            "step",
            &StoreValue::Null,
            || {
                counter.set(counter.get() + 1);
                let mut m = indexmap::IndexMap::new();
                m.insert("n".to_string(), StoreValue::from(counter.get()));
                let mut current = indexmap::IndexMap::new();
                current.insert("current".to_string(), StoreValue::Mapping(m));
                StoreValue::Mapping(current)
            },
            |_| async {},
            |_i| async {},
        )
        .await
        .expect("until becomes true");
    assert_eq!(n, 3);
}

#[tokio::test]
async fn until_never_true_is_an_error_with_trace() {
    let spec = LoopSpec {
        count: "2".to_string(),
        until: Some("current.n >= 100".to_string()),
        interval: None,
        min_interval: None,
        max_interval: None,
    };
    let evaluator = BuiltinEvaluator;
    let runner = LoopRunner {
        spec: &spec,
        evaluator: &evaluator,
    };
    let err = runner
        .run(
            "step",
            &StoreValue::Null,
            || StoreValue::Null,
            |_| async {},
            |_i| async {},
        )
        .await
        .unwrap_err();
    let LoopError::UntilNeverTrue { count, .. } = err;
    assert_eq!(count, 2);
}
