// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide key/value table shared across every operator in one
//! planner (§4.4 `kv`). Mutation is safe under concurrent use.

use crate::StoreValue;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct Kv {
    inner: Arc<RwLock<HashMap<String, StoreValue>>>,
}

impl Kv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<StoreValue> {
        self.inner.read().get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: StoreValue) {
        self.inner.write().insert(key.into(), value);
    }

    pub fn remove(&self, key: &str) -> Option<StoreValue> {
        self.inner.write().remove(key)
    }

    pub fn to_map(&self) -> HashMap<String, StoreValue> {
        self.inner.read().clone()
    }
}

#[cfg(test)]
#[path = "kv_tests.rs"]
mod tests;
