// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-step result bookkeeping, diagnostic name formatting, and the loop
//! driver shared by step-level and runbook-level `loop:` (§4.2).

use rb_core::Outcome;
use rb_core::StoreValue;
use rb_runbook::LoopSpec;
use std::time::Duration;

use crate::eval::Evaluator;
use crate::error::LoopError;
use crate::RunResult;

#[derive(Debug, Clone)]
pub struct StepResult {
    pub index: usize,
    pub key: Option<String>,
    pub desc: Option<String>,
    pub outcome: Outcome,
    pub err: Option<String>,
    pub skipped: bool,
    pub elapsed: Duration,
    pub included_run_results: Vec<RunResult>,
}

impl StepResult {
    pub fn skipped(index: usize, key: Option<String>, desc: Option<String>) -> Self {
        Self {
            index,
            key,
            desc,
            outcome: Outcome::Skipped,
            err: None,
            skipped: true,
            elapsed: Duration::ZERO,
            included_run_results: Vec::new(),
        }
    }
}

/// `"<desc>".steps[<i>]` (list mode) or `"<desc>".steps.<key>` (map mode),
/// with a `.loop[<j>]` suffix while inside a loop (§4.2).
pub fn format_step_name(
    desc: Option<&str>,
    key: Option<&str>,
    index: usize,
    loop_index: Option<usize>,
) -> String {
    let desc = desc.unwrap_or("");
    let mut name = match key {
        Some(key) => format!("\"{desc}\".steps.{key}"),
        None => format!("\"{desc}\".steps[{index}]"),
    };
    if let Some(j) = loop_index {
        name.push_str(&format!(".loop[{j}]"));
    }
    name
}

/// Drives `count`/`until`/`interval` semantics for a `loop:` attached to a
/// step or to a whole runbook (P8).
pub struct LoopRunner<'a> {
    pub spec: &'a LoopSpec,
    pub evaluator: &'a dyn Evaluator,
}

impl<'a> LoopRunner<'a> {
    /// Runs `body(iteration)` up to `count` times (evaluated once against
    /// `entry_env`), calling `sleep` between iterations and `after_env`
    /// after each iteration to evaluate `until`. Returns the number of
    /// iterations actually run.
    pub async fn run<B, Fut, S, SFut, E>(
        &self,
        name: &str,
        entry_env: &StoreValue,
        mut after_env: E,
        mut sleep: S,
        mut body: B,
    ) -> Result<usize, LoopError>
    where
        B: FnMut(usize) -> Fut,
        Fut: std::future::Future<Output = ()>,
        S: FnMut(Duration) -> SFut,
        SFut: std::future::Future<Output = ()>,
        E: FnMut() -> StoreValue,
    {
        let count = self
            .evaluator
            .eval_count(&self.spec.count, entry_env)
            .map(|c| c.max(0) as usize)
            .unwrap_or(1);

        let mut last_trace = String::new();
        for i in 0..count {
            if i > 0 {
                if let Some(secs) = self.interval_secs() {
                    sleep(Duration::from_secs_f64(secs)).await;
                }
            }
            body(i).await;

            if let Some(until) = &self.spec.until {
                let env = after_env();
                if let Ok(trace) = self.evaluator.eval_with_trace(until, &env) {
                    last_trace = trace.format_trace_tree();
                    if trace.output_as_bool() {
                        return Ok(i + 1);
                    }
                }
            }
        }

        if self.spec.retry_success() {
            Ok(count)
        } else {
            Err(LoopError::UntilNeverTrue {
                step: name.to_string(),
                count,
                interval: self.spec.interval.clone().unwrap_or_default(),
                until: self.spec.until.clone().unwrap_or_default(),
                trace: last_trace,
            })
        }
    }

    fn interval_secs(&self) -> Option<f64> {
        if let Some(interval) = &self.spec.interval {
            return interval.parse().ok();
        }
        let min = self.spec.min_interval.as_ref()?.parse::<f64>().ok()?;
        let max = self.spec.max_interval.as_ref()?.parse::<f64>().ok()?;
        if max <= min {
            return Some(min);
        }
        Some(min + rand::random::<f64>() * (max - min))
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
