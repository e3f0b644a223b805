// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RunnerError — `"<kind> failed on <stepName>: <cause>"` (§7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("exec command failed on {step}: {cause}")]
    Exec { step: String, cause: String },

    #[error("http request failed on {step}: {cause}")]
    Http { step: String, cause: String },

    #[error("db query failed on {step}: {cause}")]
    Db { step: String, cause: String },

    #[error("gRPC request failed on {step}: {cause}")]
    Grpc { step: String, cause: String },

    #[error("cdp action failed on {step}: {cause}")]
    Cdp { step: String, cause: String },

    #[error("ssh command failed on {step}: {cause}")]
    Ssh { step: String, cause: String },

    #[error("runner definition failed on {step}: {cause}")]
    Definition { step: String, cause: String },
}

impl RunnerError {
    pub fn step(&self) -> &str {
        match self {
            RunnerError::Exec { step, .. }
            | RunnerError::Http { step, .. }
            | RunnerError::Db { step, .. }
            | RunnerError::Grpc { step, .. }
            | RunnerError::Cdp { step, .. }
            | RunnerError::Ssh { step, .. }
            | RunnerError::Definition { step, .. } => step,
        }
    }
}
