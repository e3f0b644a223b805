// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn list_mode_records_in_order() {
    let mut s = Store::new(StoreMode::List);
    s.record_as_listed(StoreValue::from(1i64));
    s.record_as_listed(StoreValue::from(2i64));
    assert_eq!(s.length(), 2);
    let steps = s.to_map();
    let seq = steps
        .as_mapping()
        .unwrap()
        .get("steps")
        .unwrap()
        .as_sequence()
        .unwrap();
    assert_eq!(seq.len(), 2);
}

#[test]
fn map_mode_keys_entries_by_step_key() {
    let mut s = Store::new(StoreMode::Map);
    s.record_as_mapped("first", StoreValue::from(1i64));
    s.record_as_mapped("second", StoreValue::from(2i64));
    let root = s.to_map();
    let m = root.as_mapping().unwrap().get("steps").unwrap().as_mapping().unwrap();
    assert_eq!(m.get("first").and_then(|v| v.as_i64()), Some(1));
    assert_eq!(m.get("second").and_then(|v| v.as_i64()), Some(2));
}

#[test]
fn previous_and_current_track_last_two_entries() {
    let mut s = Store::new(StoreMode::List);
    assert!(s.previous().is_none());
    assert!(s.latest().is_none());
    s.record_as_listed(StoreValue::from("a"));
    assert!(s.previous().is_none());
    assert_eq!(s.latest().unwrap().as_str(), Some("a"));
    s.record_as_listed(StoreValue::from("b"));
    assert_eq!(s.previous().unwrap().as_str(), Some("a"));
    assert_eq!(s.latest().unwrap().as_str(), Some("b"));
}

#[test]
fn loop_iteration_overwrites_previous_entry_list_mode() {
    // P9: loop iteration k>0 replaces iteration k-1's entry.
    let mut s = Store::new(StoreMode::List);
    s.record_as_listed(StoreValue::from("step0"));
    for i in 0..3 {
        s.remove_latest_as_mapped();
        s.record_as_listed(StoreValue::from(format!("iter{i}")));
    }
    assert_eq!(s.length(), 1);
    assert_eq!(s.latest().unwrap().as_str(), Some("iter2"));
}

#[test]
fn loop_iteration_overwrites_previous_entry_map_mode() {
    let mut s = Store::new(StoreMode::Map);
    for i in 0..3 {
        if i > 0 {
            s.remove_latest_as_mapped();
        }
        s.record_as_mapped("loopy", StoreValue::from(i as i64));
    }
    assert_eq!(s.length(), 1);
    let root = s.to_map();
    let m = root.as_mapping().unwrap().get("steps").unwrap().as_mapping().unwrap();
    assert_eq!(m.get("loopy").and_then(|v| v.as_i64()), Some(2));
}

#[test]
fn record_to_latest_is_idempotent_for_same_key() {
    let mut s = Store::new(StoreMode::List);
    s.record_as_listed(StoreValue::mapping());
    s.record_to_latest("outcome", StoreValue::from("success"));
    s.record_to_latest("outcome", StoreValue::from("success"));
    let latest = s.latest().unwrap().as_mapping().unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest.get("outcome").unwrap().as_str(), Some("success"));
}

#[test]
fn needs_vars_surface_as_null_when_absent() {
    let mut s = Store::new(StoreMode::List);
    s.set_needs_var("a", None);
    s.set_needs_var("b", Some(StoreValue::from("token")));
    let root = s.to_map();
    let needs = root.as_mapping().unwrap().get("needs").unwrap().as_mapping().unwrap();
    assert!(needs.get("a").unwrap().is_null());
    assert_eq!(needs.get("b").unwrap().as_str(), Some("token"));
}

#[test]
fn clear_steps_resets_history_but_not_vars() {
    let mut s = Store::new(StoreMode::List);
    s.record_as_listed(StoreValue::from(1i64));
    s.set_bind_var("x", StoreValue::from(1i64));
    s.clear_steps();
    assert_eq!(s.length(), 0);
    assert!(s.bind_vars().contains_key("x"));
}
