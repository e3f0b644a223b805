// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::OperatorId;

#[test]
fn step_trail_includes_step_suffix() {
    let op = OperatorId::new("op1");
    let t = Trail::step(op.clone(), 2, Some("desc".into()));
    assert_eq!(t.to_string(), "op1?step=2");
}

#[test]
fn loop_index_appends_after_step() {
    let op = OperatorId::new("op1");
    let t = Trail::step(op, 0, None).with_loop_index(3);
    assert_eq!(t.to_string(), "op1?step=0&loop=3");
}

#[test]
fn trails_id_joins_with_slash() {
    let a = Trail::runbook(OperatorId::new("parent"));
    let b = Trail::step(OperatorId::new("child"), 1, None);
    let trails = Trails::new().push(a).push(b);
    assert_eq!(trails.id(), "parent/child?step=1");
}

#[test]
fn push_does_not_mutate_original() {
    let base = Trails::new().push(Trail::runbook(OperatorId::new("a")));
    let extended = base.push(Trail::runbook(OperatorId::new("b")));
    assert_eq!(base.0.len(), 1);
    assert_eq!(extended.0.len(), 2);
}
