// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `runnerRunner`: the generic fallback for a step that names a runner not
//! among the built-ins, resolved by registered name at run time (§4.8, §9
//! design note "Dynamic runner dispatch").

use async_trait::async_trait;
use rb_core::StoreValue;

use crate::{Runner, RunnerError, StepContext};

/// Holds an untyped payload and echoes it back as the step result. Real
/// deployments replace this with a purpose-built [`Runner`] registered
/// under the step's runner name; this is the default when none is
/// registered, matching the "no generic runnerRunner" error path in §7
/// only when a key is genuinely unknown — this type itself never errors.
pub struct GenericRunner {
    name: String,
}

impl GenericRunner {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Runner for GenericRunner {
    async fn run(&self, ctx: &mut StepContext) -> Result<(), RunnerError> {
        tracing::debug!(runner = %self.name, step = %ctx.step_name, "generic runner echoing payload");
        ctx.set_result(StoreValue::from_json(ctx.payload.clone()));
        Ok(())
    }

    fn target_is_empty(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "generic_tests.rs"]
mod tests;
