//! Device-function bodies: built-in index accessors and the block barrier
//! become OpenCL work-item queries and `barrier(...)`.

use tracing::{debug, trace};

use super::edit::EditError;
use super::Session;
use crate::ast::navigate::{walk_block, Visitor};
use crate::ast::{Expr, FnDef, Resolution};
use crate::cuda::{Axis, Builtin};
use crate::opencl;
use crate::span::Spanned;

/// Rewrite every built-in accessor and barrier in `func`'s body.
/// Returns the number of substitutions recorded.
pub fn rewrite_kernel(session: &mut Session, func: &FnDef) -> Result<usize, EditError> {
    let Some(body) = &func.body else {
        return Ok(0);
    };
    let mut rewriter = KernelRewriter {
        session,
        rewritten: 0,
        error: None,
    };
    walk_block(&mut rewriter, &body.node);
    if let Some(err) = rewriter.error {
        return Err(err);
    }
    debug!(
        kernel = %func.name.node,
        substitutions = rewriter.rewritten,
        "rewrote device function body"
    );
    Ok(rewriter.rewritten)
}

/// OpenCL text for a device-side expression, if it has one.
///
/// Only unshadowed built-ins match: `threadIdx.x` where `threadIdx` is a
/// user variable is left alone.
pub fn device_replacement(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Member {
            base,
            member,
            arrow: false,
        } => {
            let Expr::Ident(ident) = &base.node else {
                return None;
            };
            let Resolution::Builtin(Builtin::Var(var)) = ident.resolution else {
                return None;
            };
            let axis = Axis::from_member(&member.node)?;
            Some(opencl::work_item_query(var, axis))
        }
        Expr::Call { callee, args } if args.is_empty() => match &callee.node {
            Expr::Ident(ident) if ident.resolution == Resolution::Builtin(Builtin::SyncThreads) => {
                Some(opencl::LOCAL_BARRIER.to_string())
            }
            _ => None,
        },
        _ => None,
    }
}

struct KernelRewriter<'s, 'a> {
    session: &'s mut Session<'a>,
    rewritten: usize,
    error: Option<EditError>,
}

impl Visitor for KernelRewriter<'_, '_> {
    fn enter_expr(&mut self, _expr: &Spanned<Expr>) -> bool {
        self.error.is_none()
    }

    fn leave_expr(&mut self, expr: &Spanned<Expr>) {
        let Some(text) = device_replacement(&expr.node) else {
            return;
        };
        trace!(
            from = self.session.text(expr.span),
            to = %text,
            "device substitution"
        );
        match self.session.edits.replace(expr.span, text) {
            Ok(()) => self.rewritten += 1,
            Err(err) => self.error = Some(err),
        }
    }
}
