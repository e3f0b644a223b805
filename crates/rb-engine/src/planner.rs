// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Operators`: the fleet-level planner (§4.4). Loads a set of runbooks,
//! resolves their `needs:` DAG (pulling in dependency books that the
//! selection pattern itself didn't match), applies the
//! shuffle/shard/sample/random selection pipeline, and runs the result
//! under a concurrency group.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rb_core::{Clock, Kv, OperatorId, Store};
use rb_runbook::{load_book, load_books, LoadOpts, LoadedBook};

use crate::capture::{Capturer, NoopCapturer};
use crate::concurrency::ConcurrencyGroup;
use crate::debugger::{Debugger, NoopDebugger};
use crate::error::PlannerError;
use crate::eval::{BuiltinEvaluator, Evaluator};
use crate::operator::{NewOperator, Operator, OperatorConfig, RunResult};
use crate::profile::Stopwatch;
use crate::registry::RunnerRegistry;
use crate::waitmap::WaitMap;

const MAX_NEEDS_DEPTH: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct PlannerConfig {
    pub concmax: usize,
    pub wait_timeout: Duration,
    pub shard_n: usize,
    pub shard_index: usize,
    pub sample: usize,
    pub random: usize,
    pub shuffle: bool,
    pub shuffle_seed: u64,
}

impl PlannerConfig {
    pub fn new(concmax: usize) -> Self {
        Self {
            concmax: concmax.max(1),
            wait_timeout: Duration::from_secs(30),
            ..Default::default()
        }
    }
}

fn canonical_key(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

/// A cheap, reusable factory for per-operator runner registries: every
/// fresh operator (including re-created ones in `selected_operators`)
/// gets its own registry built the same way, matching the teacher's
/// "construct adapters fresh per run" convention.
pub type RegistryFactory = Arc<dyn Fn() -> RunnerRegistry + Send + Sync>;

pub struct Operators<C: Clock> {
    config: PlannerConfig,
    registry_factory: RegistryFactory,
    evaluator: Arc<dyn Evaluator>,
    clock: C,
    debugger: Arc<dyn Debugger>,
    capturer: Arc<dyn Capturer>,
    kv: Kv,
    stopwatch: Arc<Stopwatch>,
    waitmap: Arc<WaitMap<Arc<Store>>>,
    /// Every book reachable from the initial selection, keyed by
    /// canonicalized path — includes pure `needs:` dependencies that the
    /// original glob pattern did not itself match.
    books: HashMap<String, LoadedBook>,
    /// Canonical paths of the books the selection filters actually chose
    /// (as opposed to ones pulled in only to satisfy `needs:`).
    selected_keys: Vec<String>,
    operator_config: OperatorConfig,
}

impl<C: Clock> Operators<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn builder(
        config: PlannerConfig,
        registry_factory: RegistryFactory,
        clock: C,
        operator_config: OperatorConfig,
    ) -> Self {
        Self {
            config,
            registry_factory,
            evaluator: Arc::new(BuiltinEvaluator),
            clock,
            debugger: Arc::new(NoopDebugger),
            capturer: Arc::new(NoopCapturer),
            kv: Kv::new(),
            stopwatch: Arc::new(Stopwatch::new()),
            waitmap: Arc::new(WaitMap::new()),
            books: HashMap::new(),
            selected_keys: Vec::new(),
            operator_config,
        }
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn Evaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_debugger(mut self, debugger: Arc<dyn Debugger>) -> Self {
        self.debugger = debugger;
        self
    }

    pub fn with_capturer(mut self, capturer: Arc<dyn Capturer>) -> Self {
        self.capturer = capturer;
        self
    }

    pub fn stopwatch(&self) -> Arc<Stopwatch> {
        self.stopwatch.clone()
    }

    /// §4.4 "Load": expand `path_pattern`, filter by `opts`, then
    /// recursively pull in every book reachable through `needs:` so
    /// dependents can resolve even when their dependency wasn't matched
    /// by the glob itself.
    pub fn load(&mut self, path_pattern: &str, opts: &LoadOpts) -> Result<(), PlannerError> {
        let selected = load_books(path_pattern, opts)?;
        self.books.clear();
        self.selected_keys.clear();

        for lb in &selected {
            let key = canonical_key(&lb.path);
            self.selected_keys.push(key.clone());
            self.books.insert(key, lb.clone());
        }

        for lb in selected {
            self.load_needs_recursive(&lb, &mut HashSet::new(), 0)?;
        }

        Ok(())
    }

    fn load_needs_recursive(
        &mut self,
        book: &LoadedBook,
        ancestry: &mut HashSet<String>,
        depth: usize,
    ) -> Result<(), PlannerError> {
        if depth > MAX_NEEDS_DEPTH {
            return Err(PlannerError::NeedsTooDeep {
                path: book.path.display().to_string(),
                max: MAX_NEEDS_DEPTH,
            });
        }

        let self_key = canonical_key(&book.path);
        if !ancestry.insert(self_key.clone()) {
            return Err(PlannerError::NeedsCycle(book.path.display().to_string()));
        }

        for relative in book.book.needs.values() {
            let dep_path = book.root_dir.join(relative);
            let dep_key = canonical_key(&dep_path);
            if self.books.contains_key(&dep_key) {
                continue;
            }
            let dep = load_book(&dep_path)?;
            self.books.insert(dep_key, dep.clone());
            self.load_needs_recursive(&dep, ancestry, depth + 1)?;
        }

        ancestry.remove(&self_key);
        Ok(())
    }

    fn build_operator(&self, book: &LoadedBook) -> Operator<C> {
        let needs = book
            .book
            .needs
            .iter()
            .map(|(alias, relative)| (alias.clone(), canonical_key(&book.root_dir.join(relative))))
            .collect::<IndexMap<_, _>>();

        let mut config = self.operator_config.clone();
        config.fail_fast = book.book.fail_fast || config.fail_fast;
        config.force = book.book.force || config.force;
        config.skip_test = book.book.skip_test || config.skip_test;

        Operator::new(NewOperator {
            id: OperatorId::new(book.id.as_str()),
            book_path: canonical_key(&book.path),
            root_dir: book.root_dir.clone(),
            book: Arc::new(book.book.clone()),
            registry: (self.registry_factory)(),
            evaluator: self.evaluator.clone(),
            clock: self.clock.clone(),
            debugger: self.debugger.clone(),
            capturer: self.capturer.clone(),
            stopwatch: self.stopwatch.clone(),
            kv: self.kv.clone(),
            waitmap: self.waitmap.clone(),
            needs,
            config,
            included: false,
        })
    }

    /// §4.4 "Selection pipeline": rebuild fresh operators from their Book
    /// on every call (so each run starts from clean state), then apply
    /// shuffle, shard, sample, and random in that order, finally
    /// linearizing the result (plus its `needs:` closure) with
    /// `sortWithNeeds`.
    pub fn selected_operators(&self) -> Result<Vec<Arc<Operator<C>>>, PlannerError> {
        let mut keys: Vec<String> = self.selected_keys.clone();

        if self.config.shuffle {
            let mut rng = rand::rngs::StdRng::seed_from_u64(self.config.shuffle_seed);
            keys.shuffle(&mut rng);
        }

        if self.config.shard_n > 0 {
            keys = keys
                .into_iter()
                .enumerate()
                .filter(|(i, _)| i % self.config.shard_n == self.config.shard_index)
                .map(|(_, k)| k)
                .collect();
        }

        if self.config.sample > 0 && self.config.sample < keys.len() {
            let mut rng = rand::thread_rng();
            keys = keys
                .choose_multiple(&mut rng, self.config.sample)
                .cloned()
                .collect();
        }

        if self.config.random > 0 {
            let mut rng = rand::thread_rng();
            let pool = keys.clone();
            keys = (0..self.config.random)
                .filter_map(|_| pool.choose(&mut rng).cloned())
                .collect();
        }

        let mut needed_keys: HashSet<String> = keys.iter().cloned().collect();
        let mut frontier: Vec<String> = keys.clone();
        let mut depth = 0;
        while !frontier.is_empty() {
            depth += 1;
            if depth > MAX_NEEDS_DEPTH {
                return Err(PlannerError::NeedsTooDeep {
                    path: frontier.join(", "),
                    max: MAX_NEEDS_DEPTH,
                });
            }
            let mut next = Vec::new();
            for key in &frontier {
                let Some(book) = self.books.get(key) else { continue };
                for relative in book.book.needs.values() {
                    let dep_key = canonical_key(&book.root_dir.join(relative));
                    if needed_keys.insert(dep_key.clone()) {
                        next.push(dep_key);
                    }
                }
            }
            frontier = next;
        }

        let operators: HashMap<String, Arc<Operator<C>>> = needed_keys
            .iter()
            .filter_map(|key| self.books.get(key).map(|b| (key.clone(), Arc::new(self.build_operator(b)))))
            .collect();

        sort_with_needs(&self.books, &operators, &needed_keys)
    }

    /// §4.4 "Scheduling": run `operators` under a concurrency group
    /// bounded by `concmax`, honoring each operator's own `concurrency`
    /// tags and its Book's `failFast` flag.
    pub async fn run_n(&self, operators: Vec<Arc<Operator<C>>>) -> Vec<RunResult> {
        let group = Arc::new(ConcurrencyGroup::new(self.config.concmax));
        let results = Arc::new(Mutex::new(Vec::new()));
        let abort = Arc::new(std::sync::atomic::AtomicBool::new(false));

        let mut set = tokio::task::JoinSet::new();
        for op in operators {
            let group = group.clone();
            let results = results.clone();
            let abort = abort.clone();
            let tags = op.concurrency_tags().to_vec();
            let fail_fast = op.config().fail_fast;
            set.spawn(async move {
                if abort.load(std::sync::atomic::Ordering::SeqCst) {
                    return;
                }
                let result = group.run(&tags, || op.run_collecting()).await;
                op.registry().close_all(false).await;
                if result.err.is_some() && fail_fast {
                    abort.store(true, std::sync::atomic::Ordering::SeqCst);
                }
                results.lock().push(result);
            });
        }

        let _ = tokio::time::timeout(self.config.wait_timeout, async {
            while set.join_next().await.is_some() {}
        })
        .await;

        self.waitmap.close().await;
        Arc::try_unwrap(results).map(Mutex::into_inner).unwrap_or_default()
    }
}

/// (P7) Topologically linearizes `keys` so every `needs:` dependency
/// precedes its dependent. Duplicate entries are not possible since the
/// input is a set.
fn sort_with_needs<C: Clock>(
    books: &HashMap<String, LoadedBook>,
    operators: &HashMap<String, Arc<Operator<C>>>,
    keys: &HashSet<String>,
) -> Result<Vec<Arc<Operator<C>>>, PlannerError> {
    let mut ordered = Vec::with_capacity(keys.len());
    let mut visited: HashSet<String> = HashSet::new();
    let mut visiting: HashSet<String> = HashSet::new();

    fn visit<C: Clock>(
        key: &str,
        books: &HashMap<String, LoadedBook>,
        operators: &HashMap<String, Arc<Operator<C>>>,
        visited: &mut HashSet<String>,
        visiting: &mut HashSet<String>,
        ordered: &mut Vec<Arc<Operator<C>>>,
        depth: usize,
    ) -> Result<(), PlannerError> {
        if visited.contains(key) {
            return Ok(());
        }
        if depth > MAX_NEEDS_DEPTH {
            return Err(PlannerError::NeedsTooDeep {
                path: key.to_string(),
                max: MAX_NEEDS_DEPTH,
            });
        }
        if !visiting.insert(key.to_string()) {
            return Err(PlannerError::NeedsCycle(key.to_string()));
        }

        if let Some(book) = books.get(key) {
            for relative in book.book.needs.values() {
                let dep_key = canonical_key(&book.root_dir.join(relative));
                visit(&dep_key, books, operators, visited, visiting, ordered, depth + 1)?;
            }
        }

        visiting.remove(key);
        visited.insert(key.to_string());
        if let Some(op) = operators.get(key) {
            ordered.push(op.clone());
        }
        Ok(())
    }

    let mut keys: Vec<&String> = keys.iter().collect();
    keys.sort();
    for key in keys {
        visit(key, books, operators, &mut visited, &mut visiting, &mut ordered, 0)?;
    }
    Ok(ordered)
}

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;
