//! The declaration pass: routes every top-level item of a file to the
//! rewriter that owns it.
//!
//! Device functions are registered as kernels and their bodies rewritten.
//! Host function bodies are walked in full; launches and runtime calls are
//! handed to their rewriters. A call that was rewritten is not descended
//! into, since its whole span is already replaced. A call left as written
//! is, so calls nested in its arguments are still found.

use tracing::{debug, trace};

use super::edit::EditError;
use super::{host, kernel, launch, EntryPoint, Outcome, Session};
use crate::ast::navigate::{walk_block, Visitor};
use crate::ast::{Expr, File, FnDef, Item};
use crate::span::Spanned;

/// Run the declaration pass over `file`.
pub fn classify(session: &mut Session, file: &File) -> Result<(), EditError> {
    for item in &file.items {
        let Item::Function(func) = &item.node else {
            trace!("skipping non-function item");
            continue;
        };
        if func.runs_on_device() {
            register_kernel(session, func)?;
        } else if let Some(body) = &func.body {
            let mut scanner = HostScanner {
                session: &mut *session,
                rewritten: 0,
                error: None,
            };
            walk_block(&mut scanner, &body.node);
            let rewritten = scanner.rewritten;
            if let Some(err) = scanner.error {
                return Err(err);
            }
            debug!(function = %func.name.node, rewritten, "scanned host function");
        }

        if func.name.node == session.options.entry_point {
            if let Some(body) = &func.body {
                if session.entry_point.is_some() {
                    debug!(name = %func.name.node, "entry point redefined, keeping the last one");
                }
                session.entry_point = Some(EntryPoint {
                    name: func.name.node.clone(),
                    body: body.span,
                });
            }
        }
    }
    Ok(())
}

fn register_kernel(session: &mut Session, func: &FnDef) -> Result<(), EditError> {
    if session.kernels.insert(func.name.node.clone()) {
        debug!(kernel = %func.name.node, "registered kernel");
    }
    kernel::rewrite_kernel(session, func)?;
    Ok(())
}

struct HostScanner<'s, 'a> {
    session: &'s mut Session<'a>,
    rewritten: usize,
    error: Option<EditError>,
}

impl HostScanner<'_, '_> {
    fn dispatch(&mut self, expr: &Spanned<Expr>) -> Option<Result<Outcome, EditError>> {
        match &expr.node {
            Expr::Launch { .. } => Some(launch::rewrite_launch(self.session, expr)),
            Expr::Call { .. } => {
                host::runtime_callee(&expr.node, &self.session.options.api_prefix)?;
                Some(host::rewrite_call(self.session, expr))
            }
            _ => None,
        }
    }
}

impl Visitor for HostScanner<'_, '_> {
    fn enter_expr(&mut self, expr: &Spanned<Expr>) -> bool {
        if self.error.is_some() {
            return false;
        }
        match self.dispatch(expr) {
            Some(Ok(Outcome::Rewritten)) => {
                self.rewritten += 1;
                false
            }
            Some(Ok(Outcome::Unsupported)) | None => true,
            Some(Err(err)) => {
                self.error = Some(err);
                false
            }
        }
    }
}
