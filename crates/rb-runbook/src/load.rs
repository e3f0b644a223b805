// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runbook discovery and selection (§4.4 `Load`).

use std::fs;
use std::path::{Path, PathBuf};

use crate::{eval_label_expr, Book, ConfigError};
use rb_core::RunbookId;

/// A book tied to the file it was parsed from and the directory `needs`
/// paths and relative includes resolve against.
#[derive(Debug, Clone)]
pub struct LoadedBook {
    pub id: RunbookId,
    pub path: PathBuf,
    pub root_dir: PathBuf,
    pub book: Book,
}

/// Selection filters applied after expansion, mirroring the
/// `RUNN_RUN`/`RUNN_LABEL`/`RUNN_ID` environment conventions.
#[derive(Debug, Clone, Default)]
pub struct LoadOpts {
    pub run_regex: Option<String>,
    pub label_expr: Option<String>,
    pub id_prefixes: Vec<String>,
}

/// Parse a single runbook file, keyed by a stable id derived from its path.
pub fn load_book(path: impl AsRef<Path>) -> Result<LoadedBook, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let book: Book = serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
        path: path.display().to_string(),
        source,
    })?;
    let root_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let id = RunbookId::new(rb_core::id_from_path(&path.display().to_string()));
    Ok(LoadedBook {
        id,
        path: path.to_path_buf(),
        root_dir,
        book,
    })
}

/// Expand `path_pattern` into parsed, filtered, ordered runbooks.
pub fn load_books(path_pattern: &str, opts: &LoadOpts) -> Result<Vec<LoadedBook>, ConfigError> {
    let paths = glob::glob(path_pattern).map_err(|source| ConfigError::Glob {
        pattern: path_pattern.to_string(),
        source,
    })?;

    let mut loaded = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| ConfigError::Io {
            path: path_pattern.to_string(),
            source: e.into_error(),
        })?;
        if path.is_dir() {
            continue;
        }
        loaded.push(load_book(&path)?);
    }

    let run_regex = opts
        .run_regex
        .as_deref()
        .map(regex::Regex::new)
        .transpose()
        .map_err(ConfigError::InvalidRunRegex)?;

    let mut filtered = Vec::new();
    for lb in loaded {
        if let Some(re) = &run_regex {
            if !re.is_match(&lb.path.display().to_string()) {
                continue;
            }
        }
        let label_expr = opts.label_expr.as_deref().unwrap_or("");
        if !eval_label_expr(label_expr, &lb.book.labels)? {
            continue;
        }
        filtered.push(lb);
    }

    if opts.id_prefixes.is_empty() {
        filtered.sort_by(|a, b| a.path.cmp(&b.path));
        return Ok(filtered);
    }

    let mut ordered = Vec::with_capacity(opts.id_prefixes.len());
    for prefix in &opts.id_prefixes {
        let matches: Vec<&LoadedBook> = filtered
            .iter()
            .filter(|lb| lb.id.as_str().starts_with(prefix.as_str()))
            .collect();
        match matches.len() {
            0 => return Err(ConfigError::NoIdMatch(prefix.clone())),
            1 => ordered.push(matches[0].clone()),
            count => {
                return Err(ConfigError::AmbiguousId {
                    prefix: prefix.clone(),
                    count,
                })
            }
        }
    }
    Ok(ordered)
}

#[cfg(test)]
#[path = "load_tests.rs"]
mod tests;
