//! Runtime API calls in host code become OpenCL queue and buffer calls.
//!
//! Each supported call is replaced as a whole; its operands are copied
//! from the source text so the user's spelling survives. Allocation also
//! retypes the receiving variable to `cl_mem` and records it in the
//! session's device-memory set, which the launch rewriter consults when
//! sizing kernel arguments.

use tracing::{debug, trace};

use super::edit::EditError;
use super::{Outcome, RewriteError, Session};
use crate::ast::navigate::{children, find_decl_ref};
use crate::ast::{DeclId, Expr, Ident, Resolution};
use crate::cuda::{MemcpyKind, RuntimeCall};
use crate::diagnostic::Diagnostic;
use crate::opencl;
use crate::span::Spanned;

/// Name of the runtime function `expr` calls, if it is a direct call to a
/// name carrying `prefix` that is not a local variable.
pub fn runtime_callee<'e>(expr: &'e Expr, prefix: &str) -> Option<&'e str> {
    let ident = expr.callee_ident()?;
    if !ident.name.starts_with(prefix) || ident.name.len() == prefix.len() {
        return None;
    }
    match ident.resolution {
        Resolution::External | Resolution::Function => Some(&ident.name),
        _ => None,
    }
}

/// Translate one runtime call. Unsupported and unresolvable calls are
/// reported on the session and left as written.
pub fn rewrite_call(session: &mut Session, call: &Spanned<Expr>) -> Result<Outcome, EditError> {
    match translate_call(session, call) {
        Ok(outcome) => Ok(outcome),
        Err(err) => session.report(err),
    }
}

fn translate_call(session: &mut Session, call: &Spanned<Expr>) -> Result<Outcome, RewriteError> {
    let Expr::Call { args, .. } = &call.node else {
        return Ok(Outcome::Unsupported);
    };
    let Some(name) = runtime_callee(&call.node, &session.options.api_prefix) else {
        return Ok(Outcome::Unsupported);
    };
    let suffix = &name[session.options.api_prefix.len()..];
    let Some(runtime) = RuntimeCall::from_suffix(suffix) else {
        return Ok(unsupported(session, call, format!("unsupported runtime call `{}`", name)));
    };
    if args.len() != runtime.arity() {
        let message = format!(
            "`{}` expects {} argument(s), found {}",
            name,
            runtime.arity(),
            args.len()
        );
        return Ok(unsupported(session, call, message));
    }

    let replacement = match runtime {
        RuntimeCall::ThreadExit => opencl::RELEASE_CONTEXT.to_string(),
        RuntimeCall::ThreadSynchronize => opencl::FINISH_QUEUE.to_string(),
        RuntimeCall::SetDevice | RuntimeCall::Memset => {
            let message = format!("unsupported runtime call `{}`", name);
            return Ok(unsupported(session, call, message));
        }
        RuntimeCall::Malloc => {
            let (target, id) = operand_variable(session, name, "destination", &args[0])?;
            allocate(session, call, target, id, &args[1])?;
            return Ok(Outcome::Rewritten);
        }
        RuntimeCall::Free => {
            let (target, _) = operand_variable(session, name, "buffer", &args[0])?;
            opencl::release_buffer(&target.name)
        }
        RuntimeCall::Memcpy => {
            let Some(kind) = memcpy_kind(&args[3], &session.options.api_prefix) else {
                let message = format!(
                    "cannot determine the direction of `{}` from `{}`",
                    name,
                    session.text(args[3].span)
                );
                return Ok(unsupported(session, call, message));
            };
            let dst = session.text(args[0].span);
            let src = session.text(args[1].span);
            let count = session.text(args[2].span);
            match kind {
                MemcpyKind::HostToHost => opencl::host_copy(dst, src, count),
                MemcpyKind::HostToDevice => opencl::write_buffer(dst, src, count),
                MemcpyKind::DeviceToHost => opencl::read_buffer(dst, src, count),
                MemcpyKind::DeviceToDevice => opencl::copy_buffer(dst, src, count),
            }
        }
    };
    trace!(call = name, to = %replacement, "runtime call");
    session.edits.replace(call.span, replacement)?;
    debug!(call = name, "rewrote runtime call");
    Ok(Outcome::Rewritten)
}

/// `cudaMalloc(&p, size)` becomes `p = clCreateBuffer(...)` and `p`'s
/// declared type becomes `cl_mem`.
fn allocate(
    session: &mut Session,
    call: &Spanned<Expr>,
    target: &Ident,
    id: DeclId,
    size: &Spanned<Expr>,
) -> Result<(), RewriteError> {
    let replacement = opencl::create_buffer(&target.name, session.text(size.span));
    session.edits.replace(call.span, replacement)?;

    let symbols = session.symbols;
    match symbols.get(id) {
        Some(info) if info.shares_specifiers || info.type_span.is_empty() => {
            let message = format!(
                "cannot change the type of `{}` to `{}`: it shares its declaration with other variables",
                target.name,
                opencl::BUFFER_TYPE
            );
            session.diagnostics.push(
                Diagnostic::warning(message, info.span)
                    .with_help(format!("declare `{}` on its own line", target.name)),
            );
        }
        Some(info) => session.edits.replace(info.type_span, opencl::BUFFER_DECL)?,
        None => {}
    }
    session.device_memory.insert(id);
    debug!(variable = %target.name, "allocated device buffer");
    Ok(())
}

/// The variable an operand reduces to: `d_a` in `(void **)&d_a`.
fn operand_variable<'e>(
    session: &Session,
    call: &str,
    operand: &'static str,
    expr: &'e Spanned<Expr>,
) -> Result<(&'e Ident, DeclId), RewriteError> {
    find_decl_ref(expr)
        .and_then(|ident| ident.variable().map(|id| (ident, id)))
        .ok_or_else(|| RewriteError::UnresolvableOperand {
            call: call.to_string(),
            operand,
            text: session.text(expr.span).to_string(),
            span: expr.span,
        })
}

/// Copy direction named by the first non-variable identifier in `expr`,
/// which must carry the API prefix.
fn memcpy_kind(expr: &Spanned<Expr>, prefix: &str) -> Option<MemcpyKind> {
    fn first_symbol(expr: &Spanned<Expr>) -> Option<&Ident> {
        if let Expr::Ident(ident) = &expr.node {
            return match ident.resolution {
                Resolution::Variable(_) | Resolution::Unresolved => None,
                _ => Some(ident),
            };
        }
        children(&expr.node).into_iter().find_map(first_symbol)
    }
    first_symbol(expr)
        .and_then(|ident| ident.name.strip_prefix(prefix))
        .and_then(MemcpyKind::from_suffix)
}

fn unsupported(session: &mut Session, call: &Spanned<Expr>, message: String) -> Outcome {
    debug!(%message, "left runtime call unmodified");
    session.warn(message, call.span);
    Outcome::Unsupported
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::navigate::{find_function, walk_block, Visitor};
    use crate::config::TranslateOptions;
    use crate::diagnostic::Severity;
    use crate::syntax::resolve::resolve;

    struct Calls<'s, 'a> {
        session: &'s mut Session<'a>,
        outcomes: Vec<Outcome>,
    }

    impl Visitor for Calls<'_, '_> {
        fn enter_expr(&mut self, expr: &Spanned<Expr>) -> bool {
            if runtime_callee(&expr.node, &self.session.options.api_prefix).is_some() {
                self.outcomes.push(rewrite_call(self.session, expr).unwrap());
                return false;
            }
            true
        }
    }

    struct Run {
        output: String,
        outcomes: Vec<Outcome>,
        device_memory: Vec<String>,
        diagnostics: Vec<Diagnostic>,
    }

    fn run(source: &str) -> Run {
        let mut file = crate::parse_source_silent(source, "test.cu").unwrap();
        let symbols = resolve(&mut file);
        let options = TranslateOptions::default();
        let mut session = Session::new(source, &options, &symbols);
        let func = find_function(&file, "main").unwrap();
        let mut calls = Calls {
            session: &mut session,
            outcomes: Vec::new(),
        };
        walk_block(&mut calls, &func.body.as_ref().unwrap().node);
        let outcomes = calls.outcomes;
        let mut device_memory: Vec<String> = session
            .device_memory
            .iter()
            .filter_map(|id| symbols.get(*id).map(|info| info.name.clone()))
            .collect();
        device_memory.sort();
        Run {
            output: session.edits.render(source).unwrap(),
            outcomes,
            device_memory,
            diagnostics: session.diagnostics,
        }
    }

    #[test]
    fn test_malloc_retypes_and_tracks() {
        let run = run("int main() { float *d_a; cudaMalloc((void **)&d_a, n * sizeof(float)); }");
        assert_eq!(
            run.output,
            "int main() { cl_mem d_a; d_a = clCreateBuffer(clContext, CL_MEM_READ_WRITE, n * sizeof(float), NULL, NULL); }"
        );
        assert_eq!(run.outcomes, vec![Outcome::Rewritten]);
        assert_eq!(run.device_memory, vec!["d_a"]);
    }

    #[test]
    fn test_repeated_malloc_into_same_variable() {
        let run = run("int main() { float *d; cudaMalloc(&d, 4); cudaFree(d); cudaMalloc(&d, 8); }");
        assert!(run.output.starts_with("int main() { cl_mem d; d = clCreateBuffer("));
        assert!(run.output.contains("clReleaseMemObject(d);"));
        assert!(run.diagnostics.is_empty());
    }

    #[test]
    fn test_malloc_into_shared_declarator_warns() {
        let run = run("int main() { float *a, *b; cudaMalloc((void **)&b, 4); }");
        assert_eq!(
            run.output,
            "int main() { float *a, *b; b = clCreateBuffer(clContext, CL_MEM_READ_WRITE, 4, NULL, NULL); }"
        );
        assert_eq!(run.device_memory, vec!["b"]);
        assert_eq!(run.diagnostics.len(), 1);
        assert_eq!(run.diagnostics[0].severity, Severity::Warning);
        assert!(run.diagnostics[0].message.contains("`b`"));
    }

    #[test]
    fn test_malloc_into_first_declarator_keeps_group_type() {
        let run = run("int main() { float *a, *b; float *c, d; cudaMalloc(&a, 4); cudaMalloc(&c, 8); }");
        assert_eq!(
            run.output,
            "int main() { float *a, *b; float *c, d; \
             a = clCreateBuffer(clContext, CL_MEM_READ_WRITE, 4, NULL, NULL); \
             c = clCreateBuffer(clContext, CL_MEM_READ_WRITE, 8, NULL, NULL); }"
        );
        assert_eq!(run.outcomes, vec![Outcome::Rewritten; 2]);
        assert_eq!(run.device_memory, vec!["a", "c"]);
        assert_eq!(run.diagnostics.len(), 2);
        assert!(run.diagnostics.iter().all(|d| d.severity == Severity::Warning));
        assert!(run.diagnostics[0].message.contains("`a`"));
        assert!(run.diagnostics[1].message.contains("`c`"));
    }

    #[test]
    fn test_memcpy_directions() {
        let run = run(
            "int main() {\n\
             cudaMemcpy(d_a, h_a, n, cudaMemcpyHostToDevice);\n\
             cudaMemcpy(h_c, d_c, n, cudaMemcpyDeviceToHost);\n\
             cudaMemcpy(d_b, d_a, n, cudaMemcpyDeviceToDevice);\n\
             cudaMemcpy(h_b, h_a, n, cudaMemcpyHostToHost);\n\
             }",
        );
        assert_eq!(
            run.output,
            "int main() {\n\
             clEnqueueWriteBuffer(clCommandQueue, d_a, CL_TRUE, 0, n, h_a, 0, NULL, NULL);\n\
             clEnqueueReadBuffer(clCommandQueue, d_c, CL_TRUE, 0, n, h_c, 0, NULL, NULL);\n\
             clEnqueueCopyBuffer(clCommandQueue, d_a, d_b, 0, 0, n, 0, NULL, NULL);\n\
             memcpy(h_b, h_a, n);\n\
             }"
        );
    }

    #[test]
    fn test_memcpy_kind_in_variable_is_unsupported() {
        let source = "int main() { int kind = 1; cudaMemcpy(a, b, n, kind); }";
        let run = run(source);
        assert_eq!(run.output, source);
        assert_eq!(run.outcomes, vec![Outcome::Unsupported]);
        assert!(run.diagnostics[0].message.contains("direction"));
    }

    #[test]
    fn test_sync_and_exit() {
        let run = run("int main() { cudaThreadSynchronize(); cudaThreadExit(); return 0; }");
        assert_eq!(
            run.output,
            "int main() { clFinish(clCommandQueue); clReleaseContext(clContext); return 0; }"
        );
    }

    #[test]
    fn test_unsupported_calls_left_byte_for_byte() {
        let source = "int main() { cudaSetDevice( 0 ); cudaMemset(d, 0, n); cudaGetLastError(); }";
        let run = run(source);
        assert_eq!(run.output, source);
        assert_eq!(run.outcomes, vec![Outcome::Unsupported; 3]);
        assert_eq!(run.diagnostics.len(), 3);
        assert!(run.diagnostics[0].message.contains("cudaSetDevice"));
        assert!(run.diagnostics[2].message.contains("cudaGetLastError"));
    }

    #[test]
    fn test_wrong_arity_is_unsupported() {
        let source = "int main() { cudaFree(); }";
        let run = run(source);
        assert_eq!(run.output, source);
        assert!(run.diagnostics[0].message.contains("expects 1 argument"));
    }

    #[test]
    fn test_unresolvable_operand_is_contained() {
        let source = "int main() { float *d; cudaMalloc(make_ptr(), 4); cudaFree(d); }";
        let run = run(source);
        assert_eq!(
            run.output,
            "int main() { float *d; cudaMalloc(make_ptr(), 4); clReleaseMemObject(d); }"
        );
        assert_eq!(run.outcomes, vec![Outcome::Unsupported, Outcome::Rewritten]);
        assert_eq!(run.diagnostics.len(), 1);
        assert!(run.diagnostics[0].is_error());
        assert!(run.diagnostics[0].message.contains("make_ptr()"));
    }

    #[test]
    fn test_local_named_like_api_is_not_a_call() {
        let source = "int main() { int cudaFlag = 0; cudaFlag(); }";
        let run = run(source);
        assert!(run.outcomes.is_empty());
        assert_eq!(run.output, source);
    }
}
