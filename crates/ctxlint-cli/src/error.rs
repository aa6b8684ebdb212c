// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Failures that stop a command before it produces a result.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("reading {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("walking {path}: {source}")]
    Walk { path: String, source: walkdir::Error },
    #[error("{0}: no such file or directory")]
    Missing(String),
    #[error("no .cs files found")]
    NoSources,
    #[error("unknown code `{0}` (run `ctxlint explain` to list codes)")]
    UnknownCode(String),
    #[error("serializing report: {0}")]
    Json(#[from] serde_json::Error),
}
