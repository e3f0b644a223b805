// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The CLI's own error taxonomy, composing the lower crates' errors via
//! `#[from]` the same way each of them composes its own.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Planner(#[from] rb_engine::PlannerError),

    #[error("no runbooks matched '{0}'")]
    NoMatch(String),

    #[error("{0} runbook(s) failed")]
    RunbooksFailed(usize),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Planner(_) => 2,
            CliError::NoMatch(_) | CliError::RunbooksFailed(_) => 1,
        }
    }
}
