// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `exec`: runs a shell command via `tokio::process::Command` (§4.8).

use async_trait::async_trait;
use rb_core::StoreValue;
use serde::Deserialize;
use tokio::process::Command;

use crate::{Runner, RunnerError, StepContext};

#[derive(Debug, Deserialize)]
struct ExecPayload {
    command: String,
    #[serde(default)]
    shell: Option<String>,
    #[serde(default)]
    dir: Option<String>,
}

/// Runs `sh -c <command>` (or a configured shell) and binds
/// `{stdout, stderr, code}` on the context.
#[derive(Debug, Default)]
pub struct ExecRunner {
    target: Option<String>,
}

impl ExecRunner {
    pub fn new() -> Self {
        Self { target: None }
    }

    /// A target tag for diagnostics; an empty target marks this runner as
    /// test scaffolding (§5 Close semantics).
    pub fn with_target(target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
        }
    }
}

#[async_trait]
impl Runner for ExecRunner {
    async fn run(&self, ctx: &mut StepContext) -> Result<(), RunnerError> {
        let payload: ExecPayload =
            serde_json::from_value(ctx.payload.clone()).map_err(|e| RunnerError::Exec {
                step: ctx.step_name.clone(),
                cause: e.to_string(),
            })?;

        let shell = payload.shell.as_deref().unwrap_or("sh");
        let span = tracing::info_span!("exec", step = %ctx.step_name, command = %payload.command);
        let _guard = span.enter();

        let mut cmd = Command::new(shell);
        cmd.arg("-c").arg(&payload.command);
        if let Some(dir) = &payload.dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await.map_err(|e| RunnerError::Exec {
            step: ctx.step_name.clone(),
            cause: e.to_string(),
        })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let code = output.status.code().unwrap_or(-1);

        tracing::debug!(code, "exec completed");

        let mut mapping = indexmap::IndexMap::new();
        mapping.insert("stdout".to_string(), StoreValue::from(stdout));
        mapping.insert("stderr".to_string(), StoreValue::from(stderr));
        mapping.insert("code".to_string(), StoreValue::from(code as i64));
        ctx.set_result(StoreValue::Mapping(mapping));

        Ok(())
    }

    fn target_is_empty(&self) -> bool {
        self.target.is_none()
    }
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
