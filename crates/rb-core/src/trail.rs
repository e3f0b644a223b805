// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trail / Trails: the identifier path used both for profiling (as a key
//! into the stopwatch tree) and for diagnostics.

use crate::OperatorId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrailKind {
    Runbook,
    Loop,
    Step,
    BeforeFunc,
    AfterFunc,
}

/// One hop in a running unit's identifier path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trail {
    pub kind: TrailKind,
    pub runbook_id: OperatorId,
    pub loop_index: Option<usize>,
    pub step_index: Option<usize>,
    pub func_index: Option<usize>,
    pub desc: Option<String>,
}

impl Trail {
    pub fn runbook(runbook_id: OperatorId) -> Self {
        Self {
            kind: TrailKind::Runbook,
            runbook_id,
            loop_index: None,
            step_index: None,
            func_index: None,
            desc: None,
        }
    }

    pub fn step(runbook_id: OperatorId, step_index: usize, desc: Option<String>) -> Self {
        Self {
            kind: TrailKind::Step,
            runbook_id,
            loop_index: None,
            step_index: Some(step_index),
            func_index: None,
            desc,
        }
    }

    pub fn with_loop_index(mut self, idx: usize) -> Self {
        self.loop_index = Some(idx);
        self
    }

    pub fn before_func(runbook_id: OperatorId, func_index: usize) -> Self {
        Self {
            kind: TrailKind::BeforeFunc,
            runbook_id,
            loop_index: None,
            step_index: None,
            func_index: Some(func_index),
            desc: None,
        }
    }

    pub fn after_func(runbook_id: OperatorId, func_index: usize) -> Self {
        Self {
            kind: TrailKind::AfterFunc,
            runbook_id,
            loop_index: None,
            step_index: None,
            func_index: Some(func_index),
            desc: None,
        }
    }
}

impl fmt::Display for Trail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.runbook_id)?;
        if let Some(i) = self.step_index {
            write!(f, "?step={i}")?;
        }
        if let Some(i) = self.loop_index {
            write!(f, "&loop={i}")?;
        }
        if let Some(i) = self.func_index {
            let kind = match self.kind {
                TrailKind::BeforeFunc => "before",
                TrailKind::AfterFunc => "after",
                _ => "func",
            };
            write!(f, "?{kind}={i}")?;
        }
        Ok(())
    }
}

/// An ordered path of `Trail`s. Its serialization (`Display`) is the profile
/// id used as a key into the stopwatch tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trails(pub Vec<Trail>);

impl Trails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, trail: Trail) -> Self {
        let mut v = self.0.clone();
        v.push(trail);
        Trails(v)
    }

    pub fn id(&self) -> String {
        self.0
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for Trails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[cfg(test)]
#[path = "trail_tests.rs"]
mod tests;
