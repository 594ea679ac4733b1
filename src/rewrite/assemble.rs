//! Final phase: wrap the entry point in OpenCL setup and teardown, put
//! the handle declarations on top, and render the edited host source.

use tracing::debug;

use super::{EntryPoint, Session};
use crate::diagnostic::{self, Diagnostic};
use crate::error::TranslateError;
use crate::opencl;
use crate::span::Span;

/// The result of translating one program.
#[derive(Clone, Debug)]
pub struct Translation {
    /// Host source with every rewrite applied.
    pub host_source: String,
    /// Registered kernels in handle order.
    pub kernels: Vec<String>,
    /// Non-fatal findings, in the order they were made.
    pub diagnostics: Vec<Diagnostic>,
    /// Rewrites made by the declaration pass, not counting the generated
    /// setup and teardown blocks.
    pub edit_count: usize,
}

impl Translation {
    pub fn has_errors(&self) -> bool {
        diagnostic::has_errors(&self.diagnostics)
    }
}

/// Consume the session and produce the translated host program.
pub fn assemble(session: Session) -> Result<Translation, TranslateError> {
    let Session {
        source,
        options,
        mut edits,
        kernels,
        entry_point,
        mut diagnostics,
        ..
    } = session;

    let Some(EntryPoint { name, body }) = entry_point else {
        return Err(TranslateError::MissingEntryPoint(options.entry_point.clone()));
    };

    let edit_count = edits.len();
    if edits.is_empty() {
        // Every session diagnostic comes from a runtime call or launch.
        let message = if kernels.is_empty() && diagnostics.is_empty() {
            "nothing to translate: no CUDA constructs found"
        } else {
            "no source edits: every CUDA construct was left as written"
        };
        diagnostics.push(
            Diagnostic::info(message.to_string(), Span::point(body.file_id, 0))
                .with_note("the output is the input plus OpenCL setup and teardown".to_string()),
        );
    }

    edits.insert_before(0, opencl::preamble(&kernels))?;
    edits.insert_before(
        body.start + 1,
        opencl::init_block(&kernels, &options.device_type, &options.program_source),
    )?;
    edits.insert_after(body.end.saturating_sub(1), opencl::cleanup_block(&kernels))?;
    let host_source = edits.render(source)?;

    debug!(
        entry = %name,
        kernels = kernels.len(),
        edits = edit_count,
        "assembled host program"
    );
    Ok(Translation {
        host_source,
        kernels: kernels.into_iter().collect(),
        diagnostics,
        edit_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranslateOptions;
    use crate::diagnostic::Severity;
    use crate::rewrite::classify::classify;
    use crate::syntax::resolve::resolve;

    fn assemble_source(source: &str, options: &TranslateOptions) -> Result<Translation, TranslateError> {
        let mut file = crate::parse_source_silent(source, "test.cu").unwrap();
        let symbols = resolve(&mut file);
        let mut session = Session::new(source, options, &symbols);
        classify(&mut session, &file).unwrap();
        assemble(session)
    }

    #[test]
    fn test_missing_entry_point_is_fatal() {
        let err = assemble_source("void helper() {}\n", &TranslateOptions::default()).unwrap_err();
        assert!(matches!(err, TranslateError::MissingEntryPoint(ref name) if name == "main"));
    }

    #[test]
    fn test_no_edits_is_reported_not_fatal() {
        let translation =
            assemble_source("int main() { return 0; }\n", &TranslateOptions::default()).unwrap();
        assert_eq!(translation.edit_count, 0);
        assert_eq!(translation.diagnostics.len(), 1);
        assert_eq!(translation.diagnostics[0].severity, Severity::Info);
        assert!(translation.diagnostics[0].message.starts_with("nothing to translate"));
        assert!(!translation.has_errors());
    }

    #[test]
    fn test_cuda_without_edits_is_not_reported_empty() {
        let options = TranslateOptions::default();
        let empty_kernel = assemble_source("__global__ void k() {}\nint main() { return 0; }\n", &options)
            .unwrap();
        assert_eq!(empty_kernel.edit_count, 0);
        assert_eq!(empty_kernel.kernels, vec!["k"]);
        assert_eq!(empty_kernel.diagnostics.len(), 1);
        assert!(empty_kernel.diagnostics[0].message.starts_with("no source edits"));

        let failed_call = assemble_source("int main() { cudaMalloc(make_ptr(), 4); }\n", &options).unwrap();
        assert_eq!(failed_call.edit_count, 0);
        assert!(failed_call.has_errors());
        let info = failed_call.diagnostics.last().unwrap();
        assert_eq!(info.severity, Severity::Info);
        assert!(info.message.starts_with("no source edits"));
    }

    #[test]
    fn test_setup_and_teardown_wrap_entry_body() {
        let source = "int main() { return 0; }\n";
        let translation = assemble_source(source, &TranslateOptions::default()).unwrap();
        let kernels = Default::default();
        let expected = format!(
            "{}int main() {{{} return 0; {}}}\n",
            opencl::preamble(&kernels),
            opencl::init_block(
                &kernels,
                opencl::DEFAULT_DEVICE_TYPE,
                &crate::config::ProgramSource::default()
            ),
            opencl::cleanup_block(&kernels),
        );
        assert_eq!(translation.host_source, expected);
    }

    #[test]
    fn test_empty_entry_body() {
        let translation = assemble_source("int main(){}", &TranslateOptions::default()).unwrap();
        let out = &translation.host_source;
        let init = out.find("clGetPlatformIDs").unwrap();
        let cleanup = out.find("clReleaseProgram").unwrap();
        assert!(init < cleanup);
        assert!(out.ends_with("clReleaseContext(clContext);\n}"));
    }

    #[test]
    fn test_configured_device_type_and_program_source() {
        let mut options = TranslateOptions::default();
        options.device_type = "CL_DEVICE_TYPE_CPU".to_string();
        options.program_source.strings = "kernel_src".to_string();
        let translation =
            assemble_source("__global__ void k() {}\nint main() {}\n", &options).unwrap();
        assert_eq!(translation.kernels, vec!["k"]);
        assert!(translation.host_source.contains("CL_DEVICE_TYPE_CPU"));
        assert!(translation
            .host_source
            .contains("clCreateProgramWithSource(clContext, count, kernel_src, lengths, NULL);"));
    }
}
