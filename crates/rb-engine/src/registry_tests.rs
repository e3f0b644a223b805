// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use rb_runners::{FakeRunner, RunnerError, StepContext};

/// A runner with an empty target (test-scaffolding-style), so tests can
/// tell force and non-force `close_all` apart.
struct EmptyTargetRunner {
    closed: Arc<SyncMutex<bool>>,
}

#[async_trait]
impl rb_runners::Runner for EmptyTargetRunner {
    async fn run(&self, _ctx: &mut StepContext) -> Result<(), RunnerError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), RunnerError> {
        *self.closed.lock() = true;
        Ok(())
    }

    fn target_is_empty(&self) -> bool {
        true
    }
}

#[test]
fn resolves_by_named_kind_label() {
    let mut registry = RunnerRegistry::new();
    registry.register("exec", Box::new(FakeRunner::succeeding(rb_core::StoreValue::Null)));
    assert!(registry.resolve(&RunnerKind::Exec).is_some());
    assert!(registry.resolve(&RunnerKind::Http).is_none());
}

#[test]
fn falls_back_to_generic_for_unknown_names() {
    let mut registry = RunnerRegistry::new();
    registry.register_generic(Box::new(FakeRunner::succeeding(rb_core::StoreValue::Null)));
    assert!(registry
        .resolve(&RunnerKind::Named("myRunner".to_string()))
        .is_some());
}

#[test]
fn unregistered_kind_with_no_generic_resolves_to_none() {
    let registry = RunnerRegistry::new();
    assert!(registry.resolve(&RunnerKind::Db).is_none());
}

#[tokio::test]
async fn close_all_non_force_skips_empty_target_runners() {
    let closed = Arc::new(SyncMutex::new(false));
    let mut registry = RunnerRegistry::new();
    registry.register("fake", Box::new(EmptyTargetRunner { closed: closed.clone() }));

    registry.close_all(false).await;

    assert!(!*closed.lock());
}

#[tokio::test]
async fn close_all_force_closes_empty_target_runners_too() {
    let closed = Arc::new(SyncMutex::new(false));
    let mut registry = RunnerRegistry::new();
    registry.register("fake", Box::new(EmptyTargetRunner { closed: closed.clone() }));

    registry.close_all(true).await;

    assert!(*closed.lock());
}
