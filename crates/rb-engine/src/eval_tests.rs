// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use indexmap::IndexMap;

fn env(pairs: &[(&str, StoreValue)]) -> StoreValue {
    let mut m = IndexMap::new();
    for (k, v) in pairs {
        m.insert(k.to_string(), v.clone());
    }
    StoreValue::Mapping(m)
}

#[test]
fn dotted_path_reads_nested_mapping() {
    let mut current = IndexMap::new();
    current.insert("n".to_string(), StoreValue::from(3_i64));
    let e = env(&[("current", StoreValue::Mapping(current))]);
    let evaluator = BuiltinEvaluator;
    assert!(evaluator.eval_cond("current.n == 3", &e).unwrap());
    assert!(!evaluator.eval_cond("current.n == 4", &e).unwrap());
}

#[test]
fn comparison_operators_cover_numeric_range() {
    let mut current = IndexMap::new();
    current.insert("n".to_string(), StoreValue::from(5_i64));
    let e = env(&[("current", StoreValue::Mapping(current))]);
    let evaluator = BuiltinEvaluator;
    assert!(evaluator.eval_cond("current.n >= 3", &e).unwrap());
    assert!(evaluator.eval_cond("current.n > 3 && current.n < 10", &e).unwrap());
    assert!(!evaluator.eval_cond("current.n < 3 || current.n > 10", &e).unwrap());
}

#[test]
fn not_negates_truthiness() {
    let e = env(&[]);
    let evaluator = BuiltinEvaluator;
    assert!(evaluator.eval_cond("!false", &e).unwrap());
    assert!(evaluator.eval_cond("not false", &e).unwrap());
}

#[test]
fn eval_count_parses_integer_literal_and_path() {
    let mut vars = IndexMap::new();
    vars.insert("cap".to_string(), StoreValue::from(5_i64));
    let e = env(&[("vars", StoreValue::Mapping(vars))]);
    let evaluator = BuiltinEvaluator;
    assert_eq!(evaluator.eval_count("5", &e).unwrap(), 5);
    assert_eq!(evaluator.eval_count("vars.cap", &e).unwrap(), 5);
}

#[test]
fn eval_expand_substitutes_whole_template_as_typed_value() {
    let mut vars = IndexMap::new();
    vars.insert("x".to_string(), StoreValue::from(1_i64));
    let e = env(&[("vars", StoreValue::Mapping(vars))]);
    let evaluator = BuiltinEvaluator;
    let input = StoreValue::String("{{ vars.x }}".to_string());
    assert_eq!(evaluator.eval_expand(&input, &e), StoreValue::from(1_i64));
}

#[test]
fn eval_expand_substitutes_embedded_templates_as_strings() {
    let mut vars = IndexMap::new();
    vars.insert("name".to_string(), StoreValue::from("world"));
    let e = env(&[("vars", StoreValue::Mapping(vars))]);
    let evaluator = BuiltinEvaluator;
    let input = StoreValue::String("hello {{ vars.name }}!".to_string());
    assert_eq!(
        evaluator.eval_expand(&input, &e),
        StoreValue::String("hello world!".to_string())
    );
}

#[test]
fn eval_expand_recurses_into_sequences_and_mappings() {
    let mut vars = IndexMap::new();
    vars.insert("x".to_string(), StoreValue::from(1_i64));
    let e = env(&[("vars", StoreValue::Mapping(vars))]);
    let evaluator = BuiltinEvaluator;
    let input = StoreValue::Sequence(vec![StoreValue::String("{{ vars.x }}".to_string())]);
    assert_eq!(
        evaluator.eval_expand(&input, &e),
        StoreValue::Sequence(vec![StoreValue::from(1_i64)])
    );
}

#[test]
fn eval_with_trace_reports_outcome() {
    let e = env(&[]);
    let evaluator = BuiltinEvaluator;
    let trace = evaluator.eval_with_trace("true", &e).unwrap();
    assert!(trace.output_as_bool());
    assert!(trace.format_trace_tree().contains("true"));
}
