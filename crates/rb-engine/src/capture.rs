// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Capturer`: a streaming observer over a running operator (§6). All
//! calls are fire-and-forget — a capturer must never fail a run.

use rb_core::Trails;

use crate::operator::RunResult;
use crate::step::StepResult;

pub trait Capturer: Send + Sync {
    fn capture_start(&self, trails: &Trails);
    fn capture_result_by_step(&self, trails: &Trails, result: &StepResult);
    fn capture_result(&self, trails: &Trails, result: &RunResult);
    fn capture_end(&self, trails: &Trails);
    fn set_current_trails(&self, trails: &Trails);
}

/// Discards everything. The default when no capturer is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCapturer;

impl Capturer for NoopCapturer {
    fn capture_start(&self, _trails: &Trails) {}
    fn capture_result_by_step(&self, _trails: &Trails, _result: &StepResult) {}
    fn capture_result(&self, _trails: &Trails, _result: &RunResult) {}
    fn capture_end(&self, _trails: &Trails) {}
    fn set_current_trails(&self, _trails: &Trails) {}
}

/// Mirrors each call into a `tracing` event at the level its payload
/// warrants. These events are emitted from inside the `runbook`/`step`
/// spans the operator opens around its work, so they inherit bookPath/id
/// and index/key/desc without repeating them here.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingCapturer;

impl Capturer for TracingCapturer {
    fn capture_start(&self, trails: &Trails) {
        tracing::debug!(trails = %trails, "run started");
    }

    fn capture_result_by_step(&self, trails: &Trails, result: &StepResult) {
        match &result.err {
            Some(err) => tracing::error!(trails = %trails, step = result.index, %err, "step failed"),
            None if result.skipped => {
                tracing::debug!(trails = %trails, step = result.index, "step skipped")
            }
            None => tracing::debug!(trails = %trails, step = result.index, "step succeeded"),
        }
    }

    fn capture_result(&self, trails: &Trails, result: &RunResult) {
        match &result.err {
            Some(err) => tracing::error!(trails = %trails, %err, "run failed"),
            None => tracing::info!(trails = %trails, elapsed = ?result.elapsed, "run finished"),
        }
    }

    fn capture_end(&self, trails: &Trails) {
        tracing::debug!(trails = %trails, "run ended");
    }

    fn set_current_trails(&self, trails: &Trails) {
        tracing::trace!(trails = %trails, "trails updated");
    }
}

#[cfg(test)]
#[path = "capture_tests.rs"]
mod tests;
