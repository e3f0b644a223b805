// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! rb-engine: runs Books. `Operator` drives one runbook end to end;
//! `Operators` discovers, orders, and schedules a fleet of them. The
//! external seams a caller can swap in — runner dispatch, expression
//! evaluation, debugger attach, result capture — live here too.

pub mod capture;
pub mod concurrency;
pub mod debugger;
pub mod error;
pub mod eval;
pub mod include;
pub mod operator;
pub mod planner;
pub mod profile;
pub mod registry;
pub mod step;
pub mod waitmap;

pub use capture::{Capturer, NoopCapturer, TracingCapturer};
pub use concurrency::ConcurrencyGroup;
pub use debugger::{Debugger, NoopDebugger};
pub use error::{AfterFuncError, BeforeFuncError, LoopError, OperatorError, PlannerError};
pub use eval::{BuiltinEvaluator, EvalError, EvalTrace, Evaluator};
pub use operator::{NewOperator, Operator, OperatorConfig, RunResult};
pub use planner::{Operators, PlannerConfig, RegistryFactory};
pub use profile::Stopwatch;
pub use registry::RunnerRegistry;
pub use step::{format_step_name, LoopRunner, StepResult};
pub use waitmap::WaitMap;
