// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use rb_core::{StoreValue, SystemClock};
use rb_engine::{Operators, OperatorConfig, PlannerConfig, RegistryFactory, RunnerRegistry};
use rb_runbook::LoadOpts;
use rb_runners::{CdpRunner, DbRunner, ExecRunner, GenericRunner, GrpcRunner, HttpRunner, SshRunner};

use crate::error::CliError;
use crate::exit_error::ExitError;
use crate::output::{self, OutputFormat};

fn exit_error(err: CliError) -> anyhow::Error {
    anyhow::anyhow!(ExitError::new(err.exit_code(), err.to_string()))
}

#[derive(Args)]
pub struct RunArgs {
    /// Glob pattern selecting which runbooks to load
    pub path: String,

    /// Only run steps/runbooks whose key matches this regex
    #[arg(long = "run", env = "RUNN_RUN")]
    pub run_regex: Option<String>,

    /// Only run runbooks matching this label expression
    #[arg(long = "label", env = "RUNN_LABEL")]
    pub label_expr: Option<String>,

    /// Run only the runbooks whose id starts with one of these prefixes
    #[arg(long = "id", env = "RUNN_ID", value_delimiter = ',')]
    pub id_prefixes: Vec<String>,

    /// Restrict which named runners (http, exec, db, grpc, cdp, ssh) are
    /// registered; a step naming one outside this list fails as unknown.
    /// Unset means every built-in runner is visible.
    #[arg(long = "scopes", env = "RUNN_SCOPES", value_delimiter = ',')]
    pub scopes: Vec<String>,

    /// Maximum number of runbooks executed concurrently
    #[arg(long, default_value_t = 1)]
    pub concmax: usize,

    /// Split the selected runbooks into this many shards
    #[arg(long = "shard-count", default_value_t = 0)]
    pub shard_n: usize,

    /// Which shard (0-indexed) to run when --shard-count is set
    #[arg(long = "shard-index", default_value_t = 0)]
    pub shard_index: usize,

    /// Run a random subset of this size after shuffling/sharding
    #[arg(long, default_value_t = 0)]
    pub sample: usize,

    /// Run this many runbooks chosen independently with replacement
    #[arg(long, default_value_t = 0)]
    pub random: usize,

    /// Shuffle the selected runbooks before sharding/sampling
    #[arg(long)]
    pub shuffle: bool,

    /// Seed for --shuffle, for reproducible selection
    #[arg(long = "shuffle-seed", default_value_t = 0)]
    pub shuffle_seed: u64,

    /// Seconds to wait for a `needs:` dependency before giving up
    #[arg(long = "wait-timeout", default_value_t = 30)]
    pub wait_timeout_secs: u64,

    /// Stop a runbook's remaining steps on the first failure, even without `failFast:` set
    #[arg(long = "fail-fast")]
    pub fail_fast: bool,

    /// Keep running a runbook's steps after a failure, even without `force:` set
    #[arg(long)]
    pub force: bool,

    /// Skip `test:` evaluation on every step
    #[arg(long = "skip-test")]
    pub skip_test: bool,

    /// Seed a variable before the run (repeatable: --var key=value)
    #[arg(long = "var", value_parser = parse_key_value)]
    pub var: Vec<(String, String)>,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid input format '{}': must be key=value", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

/// Builds a fresh [`RunnerRegistry`] per operator, restricted to `scopes`
/// when non-empty (§4.6 `RUNN_SCOPES`: runner-visibility scopes).
fn scoped_registry_factory(scopes: Vec<String>) -> RegistryFactory {
    Arc::new(move || {
        let visible = |name: &str| scopes.is_empty() || scopes.iter().any(|s| s == name);
        let mut registry = RunnerRegistry::new();
        if visible("http") {
            registry.register("http", Box::new(HttpRunner::new()));
        }
        if visible("exec") {
            registry.register("exec", Box::new(ExecRunner::new()));
        }
        if visible("db") {
            registry.register("db", Box::new(DbRunner::new()));
        }
        if visible("grpc") {
            registry.register("grpc", Box::new(GrpcRunner::new()));
        }
        if visible("cdp") {
            registry.register("cdp", Box::new(CdpRunner::new()));
        }
        if visible("ssh") {
            registry.register("ssh", Box::new(SshRunner::new()));
        }
        if visible("generic") {
            registry.register_generic(Box::new(GenericRunner::new("generic")));
        }
        registry
    })
}

pub async fn run(args: RunArgs, format: OutputFormat) -> Result<()> {
    let mut planner_config = PlannerConfig::new(args.concmax);
    planner_config.wait_timeout = Duration::from_secs(args.wait_timeout_secs);
    planner_config.shard_n = args.shard_n;
    planner_config.shard_index = args.shard_index;
    planner_config.sample = args.sample;
    planner_config.random = args.random;
    planner_config.shuffle = args.shuffle;
    planner_config.shuffle_seed = args.shuffle_seed;

    let operator_config = OperatorConfig {
        wait_timeout: Duration::from_secs(args.wait_timeout_secs),
        fail_fast: args.fail_fast,
        force: args.force,
        skip_test: args.skip_test,
        interval: None,
    };

    let load_opts = LoadOpts {
        run_regex: args.run_regex.clone(),
        label_expr: args.label_expr.clone(),
        id_prefixes: args.id_prefixes.clone(),
    };

    let mut operators = Operators::<SystemClock>::builder(
        planner_config,
        scoped_registry_factory(args.scopes.clone()),
        SystemClock,
        operator_config,
    );
    operators
        .load(&args.path, &load_opts)
        .map_err(|e| exit_error(CliError::from(e)))?;

    let selected = operators
        .selected_operators()
        .map_err(|e| exit_error(CliError::from(e)))?;

    if selected.is_empty() {
        return Err(exit_error(CliError::NoMatch(args.path.clone())));
    }

    for op in &selected {
        for (key, value) in &args.var {
            op.seed_var(key.clone(), StoreValue::from(value.as_str())).await;
        }
    }

    let results = operators.run_n(selected).await;
    let failed = output::render(&results, format);

    if failed > 0 {
        return Err(exit_error(CliError::RunbooksFailed(failed)));
    }
    Ok(())
}
