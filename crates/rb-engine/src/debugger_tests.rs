// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rb_core::{OperatorId, Trail};

#[test]
fn noop_debugger_does_not_panic() {
    let trails = Trails(vec![Trail::runbook(OperatorId::new("op1"))]);
    NoopDebugger.attach(&trails, Some("first step"));
}
