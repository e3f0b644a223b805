// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stopwatch tree keyed by trail descriptor, rendered as the profile JSON
//! (§6 "Profile output").

use parking_lot::Mutex;
use std::time::Duration;

struct Node {
    id: String,
    elapsed: Duration,
    children: Vec<Node>,
}

impl Node {
    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "id": self.id,
            "elapsed": self.elapsed.as_secs_f64(),
            "breakdown": self.children.iter().map(Node::to_json).collect::<Vec<_>>(),
        })
    }
}

/// Written by multiple tasks concurrently (every operator and step
/// records its own span); reads happen once, at the end of a run.
#[derive(Default)]
pub struct Stopwatch {
    roots: Mutex<Vec<Node>>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `elapsed` under the trail path `id` (segments separated by
    /// `/`, matching `Trails::id()`).
    pub fn record(&self, id: &str, elapsed: Duration) {
        let segments: Vec<String> = id.split('/').map(str::to_string).collect();
        let mut roots = self.roots.lock();
        insert(&mut roots, &segments, elapsed);
    }

    pub fn to_json(&self) -> serde_json::Value {
        let roots = self.roots.lock();
        serde_json::Value::Array(roots.iter().map(Node::to_json).collect())
    }
}

fn insert(nodes: &mut Vec<Node>, segments: &[String], elapsed: Duration) {
    let (head, rest) = match segments.split_first() {
        Some(pair) => pair,
        None => return,
    };

    if let Some(existing) = nodes.iter_mut().find(|n| n.id == *head) {
        if rest.is_empty() {
            existing.elapsed = elapsed;
        } else {
            insert(&mut existing.children, rest, elapsed);
        }
        return;
    }

    if rest.is_empty() {
        nodes.push(Node {
            id: head.clone(),
            elapsed,
            children: Vec::new(),
        });
    } else {
        let mut node = Node {
            id: head.clone(),
            elapsed: Duration::ZERO,
            children: Vec::new(),
        };
        insert(&mut node.children, rest, elapsed);
        nodes.push(node);
    }
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
