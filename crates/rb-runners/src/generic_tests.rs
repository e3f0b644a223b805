// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn echoes_payload_as_result() {
    let runner = GenericRunner::new("myRunner");
    let mut ctx = StepContext::new("s0", serde_json::json!({ "foo": "bar" }));
    runner.run(&mut ctx).await.expect("never fails");
    let result = ctx.take_result().expect("result recorded");
    assert_eq!(result.get_path("foo").unwrap().as_str(), Some("bar"));
}

#[test]
fn target_is_always_empty() {
    assert!(GenericRunner::new("x").target_is_empty());
}
