// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rb_core::{StoreValue, SystemClock};
use rb_runners::FakeRunner;
use std::io::Write;

fn write_book(dir: &std::path::Path, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut f = std::fs::File::create(&path).expect("create fixture book");
    f.write_all(contents.as_bytes()).expect("write fixture book");
    path
}

fn registry_factory() -> RegistryFactory {
    Arc::new(|| {
        let mut r = RunnerRegistry::new();
        r.register("fake", Box::new(FakeRunner::succeeding(StoreValue::from(1))));
        r
    })
}

fn planner(config: PlannerConfig) -> Operators<SystemClock> {
    Operators::builder(config, registry_factory(), SystemClock, OperatorConfig::default())
}

#[tokio::test]
async fn load_runs_every_matched_book() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_book(dir.path(), "a.yml", "steps:\n  - desc: a\n    fake: {}\n");
    write_book(dir.path(), "b.yml", "steps:\n  - desc: b\n    fake: {}\n");

    let mut ops = planner(PlannerConfig::new(4));
    ops.load(
        &format!("{}/*.yml", dir.path().display()),
        &LoadOpts::default(),
    )
    .expect("load");

    let selected = ops.selected_operators().expect("select");
    assert_eq!(selected.len(), 2);

    let results = ops.run_n(selected).await;
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.err.is_none()));
}

#[tokio::test]
async fn needs_dependency_outside_glob_is_auto_loaded_and_ordered_first() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_book(
        dir.path(),
        "dep.yml",
        "steps:\n  - desc: dep\n    bind:\n      token: \"'T'\"\n    fake: {}\n",
    );
    write_book(
        dir.path(),
        "main.yml",
        "needs:\n  a: dep.yml\nsteps:\n  - desc: main\n    fake: {}\n",
    );

    let mut ops = planner(PlannerConfig::new(4));
    // Only `main.yml` matches the glob; `dep.yml` must still be pulled in
    // through `needs:` and ordered before it.
    ops.load(&format!("{}/main.yml", dir.path().display()), &LoadOpts::default())
        .expect("load");

    let selected = ops.selected_operators().expect("select");
    assert_eq!(selected.len(), 2);
    assert_eq!(selected[0].book_path(), format!("{}/dep.yml", dir.path().canonicalize().unwrap().display()));

    let results = ops.run_n(selected).await;
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.err.is_none()));
}

#[tokio::test]
async fn shard_selects_a_disjoint_subset() {
    let dir = tempfile::tempdir().expect("tempdir");
    for i in 0..4 {
        write_book(
            dir.path(),
            &format!("book{i}.yml"),
            "steps:\n  - desc: s\n    fake: {}\n",
        );
    }

    let mut config = PlannerConfig::new(4);
    config.shard_n = 2;
    config.shard_index = 0;
    let mut ops = planner(config);
    ops.load(&format!("{}/*.yml", dir.path().display()), &LoadOpts::default())
        .expect("load");

    let selected = ops.selected_operators().expect("select");
    assert_eq!(selected.len(), 2);
}

#[tokio::test]
async fn fail_fast_operator_does_not_block_unrelated_operators_from_completing() {
    let dir = tempfile::tempdir().expect("tempdir");
    write_book(
        dir.path(),
        "ok.yml",
        "steps:\n  - desc: ok\n    fake: {}\n",
    );
    write_book(
        dir.path(),
        "bad.yml",
        "failFast: true\nsteps:\n  - desc: bad\n    fake: {}\n    test: \"false\"\n",
    );

    let mut ops = planner(PlannerConfig::new(4));
    ops.load(&format!("{}/*.yml", dir.path().display()), &LoadOpts::default())
        .expect("load");

    let selected = ops.selected_operators().expect("select");
    let results = ops.run_n(selected).await;

    assert_eq!(results.len(), 2);
    let ok = results.iter().find(|r| r.book_path.ends_with("ok.yml")).expect("ok result");
    assert!(ok.err.is_none());
    let bad = results.iter().find(|r| r.book_path.ends_with("bad.yml")).expect("bad result");
    assert!(bad.err.is_some());
}
