// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[tokio::test]
async fn set_then_chan_resolves_immediately() {
    let map: WaitMap<i32> = WaitMap::new();
    map.set("a", 42).await;
    let v = tokio::time::timeout(Duration::from_millis(100), map.chan("a"))
        .await
        .expect("does not block")
        .expect("value present");
    assert_eq!(v, 42);
}

#[tokio::test]
async fn chan_before_set_blocks_until_set() {
    let map: Arc<WaitMap<i32>> = Arc::new(WaitMap::new());
    let waiter = {
        let map = map.clone();
        tokio::spawn(async move { map.chan("a").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    map.set("a", 7).await;
    let v = waiter.await.expect("task join").expect("value present");
    assert_eq!(v, 7);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn chan_before_set_resolves_even_when_set_fires_immediately() {
    // No artificial delay between spawning the waiter and calling `set`: the
    // waiter must already be registered with the `Notify` by the time its
    // first poll returns pending, or this hangs instead of resolving.
    let map: Arc<WaitMap<i32>> = Arc::new(WaitMap::new());
    let waiter = {
        let map = map.clone();
        tokio::spawn(async move { map.chan("a").await })
    };
    tokio::task::yield_now().await;
    map.set("a", 7).await;
    let v = tokio::time::timeout(Duration::from_millis(200), waiter)
        .await
        .expect("set wakes the waiter without waiting for close")
        .expect("task join")
        .expect("value present");
    assert_eq!(v, 7);
}

#[tokio::test]
async fn close_releases_waiters_with_no_value() {
    let map: Arc<WaitMap<i32>> = Arc::new(WaitMap::new());
    let waiter = {
        let map = map.clone();
        tokio::spawn(async move { map.chan("never-set").await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    map.close().await;
    let v = tokio::time::timeout(Duration::from_millis(200), waiter)
        .await
        .expect("close wakes the waiter")
        .expect("task join");
    assert!(v.is_none());
}
