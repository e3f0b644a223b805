// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! rb-runners: the `Runner` trait and the concrete-but-minimal runner
//! bodies a step can select (§4.8).
//!
//! `include` is deliberately absent here — it recurses into a nested
//! `Operator`, which would make this crate depend on `rb-engine`, which
//! already depends on this crate. It lives in `rb-engine::include` instead
//! and is dispatched as a built-in before the generic registry is consulted.

mod cdp;
mod db;
mod error;
mod exec;
mod generic;
mod grpc;
mod http;
mod runner;
mod ssh;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeCdpBackend, FakeDbBackend, FakeGrpcBackend, FakeRunner, FakeSshBackend};

pub use db::{DbBackend, DbRunner};
pub use error::RunnerError;
pub use exec::ExecRunner;
pub use generic::GenericRunner;
pub use http::HttpRunner;
pub use runner::{Runner, StepContext};

pub use cdp::{CdpBackend, CdpRunner};
pub use grpc::{GrpcBackend, GrpcRunner};
pub use ssh::{SshBackend, SshRunner};
