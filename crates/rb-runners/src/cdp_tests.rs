// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

struct EchoBackend;

#[async_trait]
impl CdpBackend for EchoBackend {
    async fn act(&self, payload: &serde_json::Value) -> Result<StoreValue, String> {
        Ok(StoreValue::from_json(payload.clone()))
    }
}

#[tokio::test]
async fn without_a_backend_run_fails() {
    let runner = CdpRunner::new();
    let mut ctx = StepContext::new("q", serde_json::json!({ "action": "click" }));
    assert!(matches!(
        runner.run(&mut ctx).await.unwrap_err(),
        RunnerError::Cdp { .. }
    ));
}

#[tokio::test]
async fn with_a_backend_records_its_result() {
    let runner = CdpRunner::with_backend("ws://localhost:9222", Box::new(EchoBackend));
    let mut ctx = StepContext::new("q", serde_json::json!({ "action": "click" }));
    runner.run(&mut ctx).await.expect("backend configured");
    assert!(ctx.take_result().is_some());
}
