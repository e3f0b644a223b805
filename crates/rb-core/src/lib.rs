// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rb-core: data model shared by every crate in the workspace.
//!
//! Holds the pieces that have no business logic of their own: the
//! `StoreValue` tree, the per-runbook `Store`, the `Trail` identifier path,
//! the process-wide `Kv` table, ID newtypes, and a `Clock` abstraction for
//! deterministic tests.

pub mod clock;
pub mod id;
pub mod kv;
pub mod store;
pub mod trail;
pub mod value;

pub use clock::{Clock, FakeClock, SystemClock};
pub use id::{generate_random_id, id_from_path};
pub use kv::Kv;
pub use store::{Outcome, Store, StoreError, StoreMode};
pub use trail::{Trail, TrailKind, Trails};
pub use value::StoreValue;

define_id! {
    /// Identifies a single runbook (stable across re-parses of the same book).
    pub struct RunbookId;
}

define_id! {
    /// Identifies one runtime instance of a runbook (an `Operator`).
    pub struct OperatorId;
}

define_id! {
    /// Identifies a single step within a runbook body.
    pub struct StepId;
}
