//! The translation core: classifies declarations, rewrites kernel bodies,
//! runtime API calls and launches into OpenCL, then assembles the result.
//!
//! All state of one translation lives in a [`Session`]. Sessions share
//! nothing, so independent inputs can be translated in parallel.

pub mod assemble;
pub mod classify;
pub mod edit;
pub mod host;
pub mod kernel;
pub mod launch;

use std::collections::{BTreeSet, HashSet};

use thiserror::Error;

use crate::ast::DeclId;
use crate::config::TranslateOptions;
use crate::diagnostic::Diagnostic;
use crate::resolve::SymbolTable;
use crate::span::Span;

pub use assemble::Translation;
use edit::{EditBuffer, EditError};

/// A per-call translation failure. The call is left untouched and the
/// rest of the program is still translated, except for `Edit`, which
/// signals a bug in the rewriters and aborts the run.
#[derive(Error, Debug)]
pub enum RewriteError {
    #[error("cannot resolve {operand} `{text}` of `{call}` to a variable")]
    UnresolvableOperand {
        call: String,
        operand: &'static str,
        text: String,
        span: Span,
    },

    #[error("unsupported launch configuration `{text}`")]
    UnsupportedShape { text: String, span: Span },

    #[error(transparent)]
    Edit(#[from] EditError),
}

impl RewriteError {
    pub fn into_diagnostic(self) -> Diagnostic {
        match self {
            RewriteError::UnresolvableOperand { span, .. } => {
                let message = self.to_string();
                Diagnostic::error(message, span)
                    .with_help("pass the variable directly, e.g. `&buf` or `buf`".to_string())
            }
            RewriteError::UnsupportedShape { span, .. } => {
                let message = self.to_string();
                Diagnostic::warning(message, span)
                    .with_note("launch left unmodified".to_string())
                    .with_help(
                        "use integer literals or `dim3(...)` with literal components".to_string(),
                    )
            }
            RewriteError::Edit(err) => Diagnostic::error(err.to_string(), Span::dummy()),
        }
    }
}

/// What a rewriter did with the construct it was handed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Rewritten,
    /// Reported and left as written.
    Unsupported,
}

/// The entry function's body, where setup and teardown go.
#[derive(Clone, Debug)]
pub struct EntryPoint {
    pub name: String,
    /// Span of the body, braces included.
    pub body: Span,
}

/// Translation state for one input program.
pub struct Session<'a> {
    pub source: &'a str,
    pub options: &'a TranslateOptions,
    pub symbols: &'a SymbolTable,
    pub edits: EditBuffer,
    /// Kernel names, kept sorted so generated code is reproducible.
    pub kernels: BTreeSet<String>,
    /// Host variables that now hold `cl_mem` handles.
    pub device_memory: HashSet<DeclId>,
    pub entry_point: Option<EntryPoint>,
    pub diagnostics: Vec<Diagnostic>,
}

impl<'a> Session<'a> {
    pub fn new(source: &'a str, options: &'a TranslateOptions, symbols: &'a SymbolTable) -> Self {
        Self {
            source,
            options,
            symbols,
            edits: EditBuffer::new(),
            kernels: BTreeSet::new(),
            device_memory: HashSet::new(),
            entry_point: None,
            diagnostics: Vec::new(),
        }
    }

    /// Original spelling of the source text under `span`.
    pub fn text(&self, span: Span) -> &'a str {
        span.text(self.source)
    }

    pub fn warn(&mut self, message: String, span: Span) {
        self.diagnostics.push(Diagnostic::warning(message, span));
    }

    /// Record a per-call failure; only edit conflicts propagate.
    pub fn report(&mut self, err: RewriteError) -> Result<Outcome, EditError> {
        match err {
            RewriteError::Edit(err) => Err(err),
            other => {
                self.diagnostics.push(other.into_diagnostic());
                Ok(Outcome::Unsupported)
            }
        }
    }
}
