// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for step, operator, and planner execution (§7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoopError {
    #[error("retry loop failed on {step}.loop (count: {count}, interval: {interval}): ({until}) is not true\n{trace}")]
    UntilNeverTrue {
        step: String,
        count: usize,
        interval: String,
        until: String,
        trace: String,
    },
}

#[derive(Debug, Error)]
#[error("before func failed: {0}")]
pub struct BeforeFuncError(pub String);

#[derive(Debug, Error)]
#[error("after func failed: {0}")]
pub struct AfterFuncError(pub String);

#[derive(Debug, Error)]
pub enum OperatorError {
    #[error("unknown runner key {key} in step {step} (no generic runnerRunner registered)")]
    UnknownRunner { step: String, key: String },

    #[error(transparent)]
    Runner(#[from] rb_runners::RunnerError),

    #[error(transparent)]
    Loop(#[from] LoopError),

    #[error(transparent)]
    BeforeFunc(#[from] BeforeFuncError),

    #[error(transparent)]
    AfterFunc(#[from] AfterFuncError),

    #[error("included runbook failed: {0}")]
    Included(String),

    #[error("wait for dependency {alias} cancelled")]
    WaitCancelled { alias: String },
}

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error(transparent)]
    Config(#[from] rb_runbook::ConfigError),

    #[error("needs cycle detected through {0}")]
    NeedsCycle(String),

    #[error("needs depth exceeds the maximum of {max} at {path}")]
    NeedsTooDeep { path: String, max: usize },

    #[error("operator {0} failed")]
    Operator(String),
}
