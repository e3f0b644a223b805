// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ConfigError — errors in runbook structure, loading, or selection (§7).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read runbook {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse runbook {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid glob pattern {pattern}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("duplicate runner name: {0}")]
    DuplicateRunner(String),

    #[error("unknown runner key {key} in step {step} (no generic runnerRunner registered)")]
    UnknownRunner { step: String, key: String },

    #[error("invalid loop spec in step {step}: {message}")]
    InvalidLoop { step: String, message: String },

    #[error("invalid label expression: {0}")]
    InvalidLabelExpr(String),

    #[error("no runbooks matched RUNN_ID prefixes: {0}")]
    NoIdMatch(String),

    #[error("ambiguous RUNN_ID prefix {prefix}: matches {count} runbooks")]
    AmbiguousId { prefix: String, count: usize },

    #[error("invalid RUNN_RUN regex: {0}")]
    InvalidRunRegex(#[from] regex::Error),
}
