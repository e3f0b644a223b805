// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Operator`: runs one runbook (§4.3). Sequences steps, evaluates
//! `if`/`loop`, records results into the store, and propagates failure
//! according to `force`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use rb_core::{Clock, Kv, Outcome, OperatorId, Store, StoreMode, StoreValue, Trail, Trails};
use rb_runbook::{Book, LoopSpec, RunnerKind};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;
use tracing::Instrument;

use crate::capture::{Capturer, NoopCapturer};
use crate::debugger::{Debugger, NoopDebugger};
use crate::error::{AfterFuncError, BeforeFuncError, LoopError, OperatorError};
use crate::eval::{BuiltinEvaluator, Evaluator};
use crate::include;
use crate::profile::Stopwatch;
use crate::registry::RunnerRegistry;
use crate::step::{format_step_name, LoopRunner, StepResult};
use crate::waitmap::WaitMap;

/// Run configuration derived from the Book plus planner-wide defaults
/// (§4.6).
#[derive(Debug, Clone)]
pub struct OperatorConfig {
    pub wait_timeout: Duration,
    pub fail_fast: bool,
    pub force: bool,
    pub skip_test: bool,
    pub interval: Option<Duration>,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::from_secs(30),
            fail_fast: false,
            force: false,
            skip_test: false,
            interval: None,
        }
    }
}

/// The stable, JSON-shaped outcome of one operator run (§6 "RunResult
/// JSON").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub id: String,
    pub book_path: String,
    pub desc: Option<String>,
    pub labels: Vec<String>,
    pub included: bool,
    pub err: Option<String>,
    pub skipped: bool,
    pub elapsed: Duration,
    pub step_results: Vec<StepResult>,
}

impl RunResult {
    fn failed_to_load(book_path: String, cause: String) -> Self {
        Self {
            id: book_path.clone(),
            book_path,
            desc: None,
            labels: Vec::new(),
            included: true,
            err: Some(cause),
            skipped: false,
            elapsed: Duration::ZERO,
            step_results: Vec::new(),
        }
    }
}

/// Everything needed to construct an `Operator`; grouped into one struct
/// because the field list is long and most callers (planner, include)
/// build it from shared, already-owned pieces.
pub struct NewOperator<C: Clock> {
    pub id: OperatorId,
    pub book_path: String,
    pub root_dir: PathBuf,
    pub book: Arc<Book>,
    pub registry: RunnerRegistry,
    pub evaluator: Arc<dyn Evaluator>,
    pub clock: C,
    pub debugger: Arc<dyn Debugger>,
    pub capturer: Arc<dyn Capturer>,
    pub stopwatch: Arc<Stopwatch>,
    pub kv: Kv,
    pub waitmap: Arc<WaitMap<Arc<Store>>>,
    /// alias -> resolved publish key of the dependency operator.
    pub needs: IndexMap<String, String>,
    pub config: OperatorConfig,
    pub included: bool,
}

pub struct Operator<C: Clock> {
    id: OperatorId,
    book_path: String,
    root_dir: PathBuf,
    book: Arc<Book>,
    registry: RunnerRegistry,
    evaluator: Arc<dyn Evaluator>,
    clock: C,
    debugger: Arc<dyn Debugger>,
    capturer: Arc<dyn Capturer>,
    stopwatch: Arc<Stopwatch>,
    kv: Kv,
    waitmap: Arc<WaitMap<Arc<Store>>>,
    needs: IndexMap<String, String>,
    config: OperatorConfig,
    included: bool,
    /// Doubles as the mutex that serializes re-entrant runs of the same
    /// operator (§4.3 step 2).
    store: AsyncMutex<Store>,
}

impl Operator<rb_core::SystemClock> {
    /// Convenience constructor for a standalone operator with the
    /// defaults a CLI invocation or a one-off test wants: a real clock, a
    /// no-op debugger/capturer, and a fresh stopwatch/waitmap.
    pub fn standalone(
        id: OperatorId,
        book_path: String,
        root_dir: PathBuf,
        book: Arc<Book>,
        registry: RunnerRegistry,
        config: OperatorConfig,
    ) -> Self {
        Self::new(NewOperator {
            id,
            book_path,
            root_dir,
            book,
            registry,
            evaluator: Arc::new(BuiltinEvaluator),
            clock: rb_core::SystemClock,
            debugger: Arc::new(NoopDebugger),
            capturer: Arc::new(NoopCapturer),
            stopwatch: Arc::new(Stopwatch::new()),
            kv: Kv::new(),
            waitmap: Arc::new(WaitMap::new()),
            needs: IndexMap::new(),
            config,
            included: false,
        })
    }
}

impl<C: Clock> Operator<C> {
    pub fn new(p: NewOperator<C>) -> Self {
        let mode = p.book.store_mode();
        Self {
            id: p.id,
            book_path: p.book_path,
            root_dir: p.root_dir,
            book: p.book,
            registry: p.registry,
            evaluator: p.evaluator,
            clock: p.clock,
            debugger: p.debugger,
            capturer: p.capturer,
            stopwatch: p.stopwatch,
            kv: p.kv,
            waitmap: p.waitmap,
            needs: p.needs,
            config: p.config,
            included: p.included,
            store: AsyncMutex::new(Store::new(mode)),
        }
    }

    pub fn id(&self) -> &OperatorId {
        &self.id
    }

    pub fn book_path(&self) -> &str {
        &self.book_path
    }

    /// Seeds a bind var before the first run — used by `include` to pass
    /// `vars:` into the nested operator.
    pub async fn seed_var(&self, key: impl Into<String>, value: StoreValue) {
        self.store.lock().await.set_bind_var(key, value);
    }

    pub(crate) fn root_dir(&self) -> &std::path::Path {
        &self.root_dir
    }

    pub(crate) fn evaluator(&self) -> Arc<dyn Evaluator> {
        self.evaluator.clone()
    }

    pub(crate) fn clock(&self) -> C {
        self.clock.clone()
    }

    pub(crate) fn debugger(&self) -> Arc<dyn Debugger> {
        self.debugger.clone()
    }

    pub(crate) fn capturer(&self) -> Arc<dyn Capturer> {
        self.capturer.clone()
    }

    pub(crate) fn stopwatch(&self) -> Arc<Stopwatch> {
        self.stopwatch.clone()
    }

    pub(crate) fn kv(&self) -> Kv {
        self.kv.clone()
    }

    pub(crate) fn registry(&self) -> RunnerRegistry {
        self.registry.clone()
    }

    pub(crate) fn config(&self) -> OperatorConfig {
        self.config.clone()
    }

    pub(crate) fn concurrency_tags(&self) -> &[String] {
        &self.book.concurrency
    }

    fn publish_key(&self) -> &str {
        if self.book_path.is_empty() {
            self.id.as_str()
        } else {
            &self.book_path
        }
    }

    fn trail_root(&self) -> Trails {
        Trails::new().push(Trail::runbook(self.id.clone()))
    }

    fn build_env(&self, store: &Store, last_included: &Option<StoreValue>) -> StoreValue {
        let mut root = match store.to_map() {
            StoreValue::Mapping(m) => m,
            _ => IndexMap::new(),
        };
        root.insert(
            "env".to_string(),
            StoreValue::Mapping(
                std::env::vars()
                    .map(|(k, v)| (k, StoreValue::String(v)))
                    .collect(),
            ),
        );
        root.insert(
            "kv".to_string(),
            StoreValue::Mapping(self.kv.to_map().into_iter().collect()),
        );
        root.insert(
            "included".to_string(),
            last_included.clone().unwrap_or(StoreValue::Null),
        );
        StoreValue::Mapping(root)
    }

    /// `run()`: waits on `needs:`, runs the operator body (once, or once
    /// per iteration when the whole runbook is `loop:`-wrapped), then
    /// publishes the resulting store exactly once.
    pub async fn run(&self) -> Result<(), OperatorError> {
        let result = self.run_collecting().await;
        match &result.err {
            Some(e) => Err(OperatorError::Included(e.clone())),
            None => Ok(()),
        }
    }

    pub async fn run_collecting(&self) -> RunResult {
        let span = tracing::info_span!("runbook", book_path = %self.book_path, id = %self.id);
        self.run_collecting_inner().instrument(span).await
    }

    async fn run_collecting_inner(&self) -> RunResult {
        for (alias, path_key) in &self.needs {
            match self.waitmap.chan(path_key).await {
                Some(dep_store) => {
                    let bind_vars = dep_store.bind_vars().clone();
                    let value = if bind_vars.is_empty() {
                        None
                    } else {
                        Some(StoreValue::Mapping(bind_vars))
                    };
                    self.store.lock().await.set_needs_var(alias.clone(), value);
                }
                None => {
                    let err = OperatorError::WaitCancelled {
                        alias: alias.clone(),
                    };
                    let mut result = RunResult::failed_to_load(self.book_path.clone(), err.to_string());
                    result.id = self.id.to_string();
                    result.included = self.included;
                    return result;
                }
            }
        }

        let result = match &self.book.loop_spec {
            Some(spec) => self.run_looped(spec).await,
            None => self.run_internal().await,
        };

        let snapshot = {
            let guard = self.store.lock().await;
            Arc::new(guard.clone())
        };
        self.waitmap.set(self.publish_key(), snapshot).await;
        result
    }

    async fn run_looped(&self, spec: &LoopSpec) -> RunResult {
        let runner = LoopRunner {
            spec,
            evaluator: self.evaluator.as_ref(),
        };
        let entry_env = {
            let guard = self.store.lock().await;
            self.build_env(&guard, &None)
        };
        let last_result: std::cell::RefCell<Option<RunResult>> = std::cell::RefCell::new(None);

        let outcome = runner
            .run(
                self.publish_key(),
                &entry_env,
                || {
                    self.store
                        .try_lock()
                        .map(|guard| self.build_env(&guard, &None))
                        .unwrap_or(StoreValue::Null)
                },
                |d| self.clock.sleep(d),
                |i| async move {
                    self.store.lock().await.set_loop_index(Some(i));
                    let r = self.run_internal().await;
                    *last_result.borrow_mut() = Some(r);
                },
            )
            .await;

        self.store.lock().await.set_loop_index(None);

        let mut result = last_result.into_inner().unwrap_or_else(|| RunResult {
            id: self.id.to_string(),
            book_path: self.book_path.clone(),
            desc: self.book.desc.clone(),
            labels: self.book.labels.clone(),
            included: self.included,
            err: None,
            skipped: false,
            elapsed: Duration::ZERO,
            step_results: Vec::new(),
        });

        if let Err(loop_err) = outcome {
            result.err = Some(loop_err.to_string());
        }
        result
    }

    async fn run_internal(&self) -> RunResult {
        let start = self.clock.now();
        self.store.lock().await.clear_steps();

        let trails = self.trail_root();
        self.capturer.capture_start(&trails);

        let top_env = {
            let guard = self.store.lock().await;
            self.build_env(&guard, &None)
        };
        let skip_whole = match &self.book.if_cond {
            Some(expr) => !self.evaluator.eval_cond(expr, &top_env).unwrap_or(false),
            None => false,
        };

        if skip_whole {
            let mut step_results = Vec::new();
            let mut guard = self.store.lock().await;
            for (index, key, step) in self.book.steps.iter_indexed() {
                self.record_skip(&mut guard, key);
                step_results.push(StepResult::skipped(index, key.map(str::to_string), step.desc.clone()));
            }
            drop(guard);
            let result = RunResult {
                id: self.id.to_string(),
                book_path: self.book_path.clone(),
                desc: self.book.desc.clone(),
                labels: self.book.labels.clone(),
                included: self.included,
                err: None,
                skipped: true,
                elapsed: self.clock.now().duration_since(start),
                step_results,
            };
            self.capturer.capture_result(&trails, &result);
            self.capturer.capture_end(&trails);
            return result;
        }

        let mut operator_err: Option<String> = None;
        for (i, cmd) in self.book.before.iter().enumerate() {
            if let Err(cause) = run_hook_command(cmd).await {
                operator_err = Some(OperatorError::BeforeFunc(BeforeFuncError(cause)).to_string());
                break;
            }
        }
        let before_failed = operator_err.is_some();

        let mut step_results = Vec::new();
        let mut failed = before_failed;
        // Shared (not `&mut`) so the loop-iteration closures passed to
        // `LoopRunner::run` (an `FnMut` called more than once) can each
        // borrow it without taking ownership.
        let last_included: std::cell::RefCell<Option<StoreValue>> = std::cell::RefCell::new(None);

        if before_failed {
            // A failed beforeFunc aborts the run outright: steps never run
            // and afterFuncs must not run either (§4.3 step 5). Still
            // record one skipped entry per step so stepHistory stays
            // complete.
            let mut guard = self.store.lock().await;
            for (index, key, step) in self.book.steps.iter_indexed() {
                self.record_skip(&mut guard, key);
                step_results.push(StepResult::skipped(index, key.map(str::to_string), step.desc.clone()));
            }
        } else {
            for (index, key, step) in self.book.steps.iter_indexed() {
                let step_trail = trails.push(Trail::step(self.id.clone(), index, step.desc.clone()));
                self.debugger.attach(&step_trail, step.desc.as_deref());

                if index > 0 {
                    if let Some(interval) = self.config.interval {
                        self.clock.sleep(interval).await;
                    }
                }

                if failed && !self.config.force {
                    let mut guard = self.store.lock().await;
                    self.record_skip(&mut guard, key);
                    drop(guard);
                    let result = StepResult::skipped(index, key.map(str::to_string), step.desc.clone());
                    self.capturer.capture_result_by_step(&step_trail, &result);
                    step_results.push(result);
                    continue;
                }

                let env = {
                    let guard = self.store.lock().await;
                    self.build_env(&guard, &last_included.borrow())
                };
                let if_ok = match &step.if_cond {
                    Some(expr) => self.evaluator.eval_cond(expr, &env).unwrap_or(false),
                    None => true,
                };

                if !if_ok {
                    tracing::debug!(step = index, "step skipped by if");
                    let mut guard = self.store.lock().await;
                    self.record_skip(&mut guard, key);
                    drop(guard);
                    let result = StepResult::skipped(index, key.map(str::to_string), step.desc.clone());
                    self.capturer.capture_result_by_step(&step_trail, &result);
                    step_results.push(result);
                    continue;
                }

                let step_start = self.clock.now();
                let name = format_step_name(step.desc.as_deref(), key, index, None);
                let included_results: std::cell::RefCell<Vec<RunResult>> =
                    std::cell::RefCell::new(Vec::new());
                let step_span = tracing::info_span!(
                    "step",
                    index,
                    key = key.unwrap_or(""),
                    desc = step.desc.as_deref().unwrap_or("")
                );
                let outcome = self
                    .run_step_body(index, key, step, &name, &last_included, &included_results)
                    .instrument(step_span)
                    .await;

                let elapsed = self.clock.now().duration_since(step_start);
                let result = match outcome {
                    Ok(()) => StepResult {
                        index,
                        key: key.map(str::to_string),
                        desc: step.desc.clone(),
                        outcome: Outcome::Success,
                        err: None,
                        skipped: false,
                        elapsed,
                        included_run_results: included_results.into_inner(),
                    },
                    Err(e) => {
                        failed = true;
                        if operator_err.is_none() {
                            operator_err = Some(e.clone());
                        }
                        StepResult {
                            index,
                            key: key.map(str::to_string),
                            desc: step.desc.clone(),
                            outcome: Outcome::Failure,
                            err: Some(e),
                            skipped: false,
                            elapsed,
                            included_run_results: included_results.into_inner(),
                        }
                    }
                };
                self.capturer.capture_result_by_step(&step_trail, &result);
                step_results.push(result);
            }
        }

        if !before_failed {
            for (i, cmd) in self.book.after.iter().enumerate() {
                if let Err(cause) = run_hook_command(cmd).await {
                    operator_err = Some(OperatorError::AfterFunc(AfterFuncError(cause)).to_string());
                    let _ = i;
                }
            }
        }

        let result = RunResult {
            id: self.id.to_string(),
            book_path: self.book_path.clone(),
            desc: self.book.desc.clone(),
            labels: self.book.labels.clone(),
            included: self.included,
            err: operator_err,
            skipped: false,
            elapsed: self.clock.now().duration_since(start),
            step_results,
        };
        self.capturer.capture_result(&trails, &result);
        self.capturer.capture_end(&trails);
        result
    }

    fn record_skip(&self, store: &mut Store, key: Option<&str>) {
        match (store.mode(), key) {
            (StoreMode::Map, Some(k)) => store.record_as_mapped(k.to_string(), StoreValue::Null),
            _ => store.record_as_listed(StoreValue::Null),
        }
    }

    /// Runs one step's chosen runner (plus `dump`/`bind`/`test`), wrapped
    /// in the step's own `loop:` if present. Returns the recorded error
    /// string, if any.
    #[allow(clippy::too_many_arguments)]
    async fn run_step_body(
        &self,
        index: usize,
        key: Option<&str>,
        step: &rb_runbook::Step,
        name: &str,
        last_included: &std::cell::RefCell<Option<StoreValue>>,
        included_results: &std::cell::RefCell<Vec<RunResult>>,
    ) -> Result<(), String> {
        match &step.loop_spec {
            None => {
                self.run_step_once(index, key, step, name, 0, last_included, included_results)
                    .await
            }
            Some(spec) => {
                let runner = LoopRunner {
                    spec,
                    evaluator: self.evaluator.as_ref(),
                };
                let entry_env = {
                    let guard = self.store.lock().await;
                    self.build_env(&guard, &last_included.borrow())
                };
                let err_cell: std::cell::RefCell<Option<String>> = std::cell::RefCell::new(None);
                let outcome = runner
                    .run(
                        name,
                        &entry_env,
                        || {
                            self.store
                                .try_lock()
                                .map(|guard| self.build_env(&guard, &last_included.borrow()))
                                .unwrap_or(StoreValue::Null)
                        },
                        |d| self.clock.sleep(d),
                        |i| async move {
                            self.store.lock().await.set_loop_index(Some(i));
                            if let Err(e) = self
                                .run_step_once(index, key, step, name, i, last_included, included_results)
                                .await
                            {
                                *err_cell.borrow_mut() = Some(e);
                            }
                        },
                    )
                    .await;
                self.store.lock().await.set_loop_index(None);
                if let Some(e) = err_cell.into_inner() {
                    return Err(e);
                }
                outcome.map(|_| ()).map_err(|e: LoopError| e.to_string())
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_step_once(
        &self,
        _index: usize,
        key: Option<&str>,
        step: &rb_runbook::Step,
        name: &str,
        loop_iteration: usize,
        last_included: &std::cell::RefCell<Option<StoreValue>>,
        included_results: &std::cell::RefCell<Vec<RunResult>>,
    ) -> Result<(), String> {
        let env = {
            let guard = self.store.lock().await;
            self.build_env(&guard, &last_included.borrow())
        };

        let value = match &step.runner.kind {
            RunnerKind::Include => {
                let spec: rb_runbook::IncludeSpec =
                    serde_json::from_value(step.runner.payload.clone())
                        .map_err(|e| format!("include failed on {name}: {e}"))?;
                let run_result = include::run_included(self, &spec).await;
                *last_included.borrow_mut() = Some(include_summary(&run_result));
                let err = run_result.err.clone();
                included_results.borrow_mut().push(run_result);
                if let Some(e) = err {
                    return Err(format!("include failed on {name}: {e}"));
                }
                StoreValue::Null
            }
            kind => {
                let expanded = self.evaluator.eval_expand(&StoreValue::from_json(step.runner.payload.clone()), &env);
                let mut ctx = rb_runners::StepContext::new(name.to_string(), expanded.to_json());
                let shared = self
                    .registry
                    .resolve(kind)
                    .ok_or_else(|| {
                        OperatorError::UnknownRunner {
                            step: name.to_string(),
                            key: kind.label().to_string(),
                        }
                        .to_string()
                    })?;
                let mut guard = shared.lock().await;
                guard.run(&mut ctx).await.map_err(|e| e.to_string())?;
                drop(guard);
                let cookies = ctx.take_cookies();
                if !cookies.is_empty() {
                    self.store.lock().await.record_to_cookie(cookies);
                }
                ctx.take_result().unwrap_or(StoreValue::Null)
            }
        };

        {
            let mut guard = self.store.lock().await;
            if loop_iteration > 0 {
                guard.remove_latest_as_mapped();
            }
            match (guard.mode(), key) {
                (StoreMode::Map, Some(k)) => guard.record_as_mapped(k.to_string(), value),
                _ => guard.record_as_listed(value),
            }
        }

        if let Some(dump) = &step.dump {
            let env = {
                let guard = self.store.lock().await;
                self.build_env(&guard, &last_included.borrow())
            };
            let rendered = self
                .evaluator
                .eval_expand(&StoreValue::from_json(dump.clone()), &env);
            tracing::info!(step = %name, dump = %rendered.to_json(), "dump");
        }

        if let Some(bind) = &step.bind {
            let env = {
                let guard = self.store.lock().await;
                self.build_env(&guard, &last_included.borrow())
            };
            let mut guard = self.store.lock().await;
            for (bind_key, expr) in bind {
                let evaluated = eval_bind_value(self.evaluator.as_ref(), expr, &env);
                guard.set_bind_var(bind_key.clone(), evaluated);
            }
        }

        if !self.config.skip_test {
            if let Some(test) = &step.test {
                let env = {
                    let guard = self.store.lock().await;
                    self.build_env(&guard, &last_included.borrow())
                };
                let ok = self
                    .evaluator
                    .eval_cond(test, &env)
                    .map_err(|e| format!("test failed on {name}: {e}"))?;
                if !ok {
                    return Err(format!("test failed on {name}: ({test}) is not true"));
                }
            }
        }

        Ok(())
    }
}

/// Evaluates a `bind:` expression to a typed value by routing it through
/// a whole-string template (§6 `EvalExpand`), which the built-in
/// evaluator resolves to the expression's native type rather than a
/// stringified one.
fn eval_bind_value(evaluator: &dyn Evaluator, expr: &str, env: &StoreValue) -> StoreValue {
    evaluator.eval_expand(&StoreValue::String(format!("{{{{ {expr} }}}}")), env)
}

fn include_summary(result: &RunResult) -> StoreValue {
    let mut m = IndexMap::new();
    m.insert("id".to_string(), StoreValue::from(result.id.clone()));
    m.insert("bookPath".to_string(), StoreValue::from(result.book_path.clone()));
    m.insert("skipped".to_string(), StoreValue::from(result.skipped));
    m.insert(
        "err".to_string(),
        result
            .err
            .clone()
            .map(StoreValue::from)
            .unwrap_or(StoreValue::Null),
    );
    StoreValue::Mapping(m)
}

/// Runs a `before:`/`after:` hook command through the same shell
/// subprocess path as the `exec` runner (§4.8).
async fn run_hook_command(command: &str) -> Result<(), String> {
    let output = tokio::process::Command::new("sh")
        .arg("-c")
        .arg(command)
        .output()
        .await
        .map_err(|e| e.to_string())?;
    if output.status.success() {
        Ok(())
    } else {
        Err(format!(
            "hook command `{command}` exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        ))
    }
}

#[cfg(test)]
#[path = "operator_tests.rs"]
mod tests;
