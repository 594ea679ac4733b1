//! Kernel launches become argument bindings, work-size assignments and an
//! `clEnqueueNDRangeKernel` call.

use std::fmt::Write;

use tracing::debug;

use super::edit::EditError;
use super::{Outcome, RewriteError, Session};
use crate::ast::navigate::find_decl_ref;
use crate::ast::Expr;
use crate::cuda::LAUNCH_SHAPE_TYPE;
use crate::diagnostic::Diagnostic;
use crate::opencl;
use crate::span::Spanned;

/// Rewrite one `kernel<<<grid, block>>>(args)` expression.
pub fn rewrite_launch(session: &mut Session, launch: &Spanned<Expr>) -> Result<Outcome, EditError> {
    match translate_launch(session, launch) {
        Ok(outcome) => Ok(outcome),
        Err(err) => session.report(err),
    }
}

fn translate_launch(
    session: &mut Session,
    launch: &Spanned<Expr>,
) -> Result<Outcome, RewriteError> {
    let Expr::Launch {
        kernel,
        config,
        args,
    } = &launch.node
    else {
        return Ok(Outcome::Unsupported);
    };
    let Expr::Ident(kernel) = &kernel.node else {
        let message = format!(
            "cannot launch `{}`: only kernels named directly are supported",
            session.text(kernel.span)
        );
        session.warn(message, kernel.span);
        return Ok(Outcome::Unsupported);
    };
    let kernel = kernel.name.as_str();

    let [grid, block, extra @ ..] = config.as_slice() else {
        return Err(RewriteError::UnsupportedShape {
            text: session.text(launch.span).to_string(),
            span: launch.span,
        });
    };

    let mut text = String::new();
    for (index, arg) in args.iter().enumerate() {
        let ident = find_decl_ref(arg).ok_or_else(|| RewriteError::UnresolvableOperand {
            call: kernel.to_string(),
            operand: "argument",
            text: session.text(arg.span).to_string(),
            span: arg.span,
        })?;
        let declared = ident
            .variable()
            .filter(|id| !session.device_memory.contains(id))
            .and_then(|id| session.symbols.get(id));
        let size_type = match declared {
            Some(info) => info.ty.to_string(),
            None => opencl::BUFFER_TYPE.to_string(),
        };
        text.push_str(&opencl::set_kernel_arg(kernel, index, &size_type, &ident.name));
    }

    let groups = shape_of(session, grid)?;
    let items = shape_of(session, block)?;
    for (axis, value) in items.iter().enumerate() {
        text.push_str(&opencl::local_work_size(axis, *value));
    }
    for (axis, value) in groups.iter().enumerate() {
        text.push_str(&opencl::global_work_size(axis, *value));
    }
    text.push_str(&opencl::enqueue_kernel(kernel));

    if !extra.is_empty() {
        let first = extra[0].span;
        let span = extra.iter().fold(first, |acc, e| acc.merge(e.span));
        debug!(kernel, "ignoring shared-memory and stream launch operands");
        session.diagnostics.push(
            Diagnostic::warning(
                format!(
                    "shared-memory and stream operands of the `{}` launch are not translated",
                    kernel
                ),
                span,
            )
            .with_note("the launch is rewritten without them".to_string()),
        );
    }

    session.edits.replace(launch.span, text)?;
    debug!(
        kernel,
        grid = %format_shape(&groups),
        block = %format_shape(&items),
        args = args.len(),
        "rewrote kernel launch"
    );
    Ok(Outcome::Rewritten)
}

fn shape_of(session: &Session, expr: &Spanned<Expr>) -> Result<[u64; 3], RewriteError> {
    launch_shape(&expr.node).ok_or_else(|| RewriteError::UnsupportedShape {
        text: session.text(expr.span).to_string(),
        span: expr.span,
    })
}

/// Components of a literal launch shape, with omitted ones set to 1:
/// `4` and `dim3(4)` both give `[4, 1, 1]`.
pub fn launch_shape(expr: &Expr) -> Option<[u64; 3]> {
    match expr.unparen() {
        Expr::IntLit(value) => Some([*value, 1, 1]),
        Expr::Construct { ty, args }
            if ty.node.specifier() == Some(LAUNCH_SHAPE_TYPE)
                && !ty.node.is_pointer()
                && (1..=3).contains(&args.len()) =>
        {
            let mut shape = [1; 3];
            for (slot, arg) in shape.iter_mut().zip(args) {
                match arg.node.unparen() {
                    Expr::IntLit(value) => *slot = *value,
                    _ => return None,
                }
            }
            Some(shape)
        }
        _ => None,
    }
}

/// Human-readable shape, for diagnostics and logs.
pub fn format_shape(shape: &[u64; 3]) -> String {
    let mut out = String::from("{");
    for (i, v) in shape.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{}", v);
    }
    out.push('}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::navigate::{find_function, walk_block, Visitor};
    use crate::config::TranslateOptions;
    use crate::diagnostic::Severity;
    use crate::syntax::resolve::resolve;

    struct Launches<'s, 'a> {
        session: &'s mut Session<'a>,
        outcomes: Vec<Outcome>,
    }

    impl Visitor for Launches<'_, '_> {
        fn enter_expr(&mut self, expr: &Spanned<Expr>) -> bool {
            if matches!(expr.node, Expr::Launch { .. }) {
                self.outcomes.push(rewrite_launch(self.session, expr).unwrap());
                return false;
            }
            true
        }
    }

    fn run(source: &str, buffers: &[&str]) -> (String, Vec<Outcome>, Vec<Diagnostic>) {
        let mut file = crate::parse_source_silent(source, "test.cu").unwrap();
        let symbols = resolve(&mut file);
        let options = TranslateOptions::default();
        let mut session = Session::new(source, &options, &symbols);
        let main = find_function(&file, "main").unwrap();
        let body = &main.body.as_ref().unwrap().node;
        // Mark the named locals as allocated device buffers.
        for stmt in &body.stmts {
            if let crate::ast::Stmt::Decl(group) = &stmt.node {
                for var in &group.vars {
                    if buffers.contains(&var.name.node.as_str()) {
                        session.device_memory.insert(var.id);
                    }
                }
            }
        }
        let mut launches = Launches {
            session: &mut session,
            outcomes: Vec::new(),
        };
        walk_block(&mut launches, body);
        let outcomes = launches.outcomes;
        (session.edits.render(source).unwrap(), outcomes, session.diagnostics)
    }

    #[test]
    fn test_launch_shapes() {
        let file = crate::parse_source_silent(
            "void f() { a = 4; b = dim3(2, 3); c = dim3(2, 1, 8); d = n; e = dim3(n); }",
            "test.cu",
        )
        .unwrap();
        let func = find_function(&file, "f").unwrap();
        let shapes: Vec<Option<[u64; 3]>> = func
            .body
            .as_ref()
            .unwrap()
            .node
            .stmts
            .iter()
            .map(|stmt| match &stmt.node {
                crate::ast::Stmt::Expr(e) => match &e.node {
                    Expr::Assign { value, .. } => launch_shape(&value.node),
                    _ => None,
                },
                _ => None,
            })
            .collect();
        assert_eq!(
            shapes,
            vec![
                Some([4, 1, 1]),
                Some([2, 3, 1]),
                Some([2, 1, 8]),
                None,
                None
            ]
        );
    }

    #[test]
    fn test_work_sizes_count_items_not_groups() {
        let (out, outcomes, _) = run(
            "int main() { float *d; k<<<dim3(2, 1, 1), dim3(128, 1, 1)>>>(d); }",
            &["d"],
        );
        assert_eq!(outcomes, vec![Outcome::Rewritten]);
        assert_eq!(
            out,
            "int main() { float *d; clSetKernelArg(clKernel_k, 0, sizeof(cl_mem), &d);\n\
             localWorkSize[0] = 128;\n\
             localWorkSize[1] = 1;\n\
             localWorkSize[2] = 1;\n\
             globalWorkSize[0] = 2*localWorkSize[0];\n\
             globalWorkSize[1] = 1*localWorkSize[1];\n\
             globalWorkSize[2] = 1*localWorkSize[2];\n\
             clEnqueueNDRangeKernel(clCommandQueue, clKernel_k, 3, NULL, globalWorkSize, localWorkSize, 0, NULL, NULL); }"
        );
    }

    #[test]
    fn test_argument_sizes_follow_device_memory() {
        let (out, _, _) = run(
            "int main() { float *d_a; float *h_a; int n; k<<<1, 1>>>(d_a, h_a, n); }",
            &["d_a"],
        );
        assert!(out.contains("clSetKernelArg(clKernel_k, 0, sizeof(cl_mem), &d_a);\n"));
        assert!(out.contains("clSetKernelArg(clKernel_k, 1, sizeof(float *), &h_a);\n"));
        assert!(out.contains("clSetKernelArg(clKernel_k, 2, sizeof(int), &n);\n"));
    }

    #[test]
    fn test_variable_shape_is_unsupported() {
        let source = "int main() { dim3 grid(2); k<<<grid, 64>>>(); }";
        let (out, outcomes, diagnostics) = run(source, &[]);
        assert_eq!(out, source);
        assert_eq!(outcomes, vec![Outcome::Unsupported]);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
        assert!(diagnostics[0].message.contains("`grid`"));
    }

    #[test]
    fn test_unresolvable_argument() {
        let source = "int main() { k<<<1, 1>>>(42); }";
        let (out, outcomes, diagnostics) = run(source, &[]);
        assert_eq!(out, source);
        assert_eq!(outcomes, vec![Outcome::Unsupported]);
        assert!(diagnostics[0].is_error());
        assert!(diagnostics[0].message.contains("`42`"));
    }

    #[test]
    fn test_stream_operands_ignored_with_warning() {
        let (out, outcomes, diagnostics) = run("int main() { int n; k<<<1, 32, 0, s>>>(n); }", &[]);
        assert_eq!(outcomes, vec![Outcome::Rewritten]);
        assert!(out.contains("localWorkSize[0] = 32;\n"));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn test_format_shape() {
        assert_eq!(format_shape(&[256, 1, 1]), "{256,1,1}");
    }
}
