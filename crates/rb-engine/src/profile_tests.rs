// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn single_entry_renders_as_one_root() {
    let sw = Stopwatch::new();
    sw.record("op1", Duration::from_millis(10));
    let json = sw.to_json();
    let roots = json.as_array().unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["id"], "op1");
}

#[test]
fn nested_path_builds_breakdown() {
    let sw = Stopwatch::new();
    sw.record("op1", Duration::from_millis(10));
    sw.record("op1/op1?step=0", Duration::from_millis(4));
    sw.record("op1/op1?step=1", Duration::from_millis(6));

    let json = sw.to_json();
    let roots = json.as_array().unwrap();
    assert_eq!(roots.len(), 1);
    let breakdown = roots[0]["breakdown"].as_array().unwrap();
    assert_eq!(breakdown.len(), 2);
    assert_eq!(breakdown[0]["id"], "op1?step=0");
    assert_eq!(breakdown[1]["id"], "op1?step=1");
}

#[test]
fn implicit_parent_gets_zero_elapsed_until_recorded() {
    let sw = Stopwatch::new();
    sw.record("op1/op1?step=0", Duration::from_millis(4));
    let json = sw.to_json();
    assert_eq!(json[0]["elapsed"], 0.0);
}
