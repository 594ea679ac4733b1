//! Fatal translation errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostic::Diagnostic;
use crate::rewrite::edit::EditError;

/// Translation result type alias.
pub type TranslateResult<T> = Result<T, TranslateError>;

/// A condition that stops the translation of one input.
#[derive(Error, Debug)]
pub enum TranslateError {
    /// Lexing or parsing failed; the diagnostics say where.
    #[error("{file}: {} syntax error(s)", .diagnostics.len())]
    Parse {
        file: String,
        diagnostics: Vec<Diagnostic>,
    },

    /// No definition of the entry function to put setup and teardown in.
    #[error("entry point '{0}' not found: no function definition with that name")]
    MissingEntryPoint(String),

    /// Two rewrites claimed the same source text.
    #[error("internal error: {0}")]
    Edit(#[from] EditError),

    #[error("cannot access '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration '{}': {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

impl TranslateError {
    /// Diagnostics carried by the error, for rendering against the source.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            TranslateError::Parse { diagnostics, .. } => diagnostics,
            _ => &[],
        }
    }
}
