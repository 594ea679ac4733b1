pub mod check;
pub mod translate;

use std::path::{Path, PathBuf};

use clap::Args;
use rayon::prelude::*;
use tracing::debug;

use cudacl::diagnostic::render_diagnostics;
use cudacl::project::Project;
use cudacl::{TranslateError, TranslateOptions, Translation};

/// Flags that adjust how inputs are translated.
#[derive(Args, Clone, Debug, Default)]
pub struct TranslateFlags {
    /// Function that receives OpenCL setup and teardown (default: main)
    #[arg(long, value_name = "NAME")]
    pub entry: Option<String>,
    /// Configuration file (default: nearest cudacl.toml above the input)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// OpenCL device type passed to clGetDeviceIDs
    #[arg(long, value_name = "TYPE")]
    pub device_type: Option<String>,
}

/// Options for `input`: the config file's `[translate]` table, then flags.
pub fn resolve_options(
    input: &Path,
    flags: &TranslateFlags,
) -> Result<TranslateOptions, TranslateError> {
    let config = match &flags.config {
        Some(path) => Some(path.clone()),
        None => {
            let start = match input.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
                _ => PathBuf::from("."),
            };
            Project::find(&start.canonicalize().unwrap_or(start))
        }
    };
    let mut options = match config {
        Some(path) => {
            debug!(config = %path.display(), "using configuration");
            Project::load(&path)?.options
        }
        None => TranslateOptions::default(),
    };
    if let Some(entry) = &flags.entry {
        options.entry_point = entry.clone();
    }
    if let Some(device_type) = &flags.device_type {
        options.device_type = device_type.clone();
    }
    Ok(options)
}

/// One input file and what became of it.
pub struct Job {
    pub path: PathBuf,
    pub source: String,
    pub result: Result<Translation, TranslateError>,
}

impl Job {
    pub fn display_name(&self) -> String {
        self.path.display().to_string()
    }
}

fn run_job(path: &Path, flags: &TranslateFlags) -> Job {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(source) => {
            return Job {
                path: path.to_path_buf(),
                source: String::new(),
                result: Err(TranslateError::Io {
                    path: path.to_path_buf(),
                    source,
                }),
            }
        }
    };
    let result = resolve_options(path, flags)
        .and_then(|options| cudacl::translate(&source, &path.display().to_string(), &options));
    Job {
        path: path.to_path_buf(),
        source,
        result,
    }
}

/// Translate every input, in parallel. Results keep input order.
pub fn run_jobs(inputs: &[PathBuf], flags: &TranslateFlags) -> Vec<Job> {
    inputs.par_iter().map(|path| run_job(path, flags)).collect()
}

/// Render a job's diagnostics to stderr. Returns false if the job failed.
pub fn report(job: &Job) -> bool {
    let name = job.display_name();
    match &job.result {
        Ok(translation) => {
            render_diagnostics(&translation.diagnostics, &name, &job.source);
            true
        }
        Err(err) => {
            render_diagnostics(err.diagnostics(), &name, &job.source);
            eprintln!("error: {}", err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("cudacl.toml"),
            "[translate]\nentry_point = \"run\"\ndevice_type = \"CL_DEVICE_TYPE_CPU\"\n",
        )
        .unwrap();
        let input = dir.path().join("prog.cu");

        let options = resolve_options(&input, &TranslateFlags::default()).unwrap();
        assert_eq!(options.entry_point, "run");

        let flags = TranslateFlags {
            entry: Some("start".to_string()),
            ..TranslateFlags::default()
        };
        let options = resolve_options(&input, &flags).unwrap();
        assert_eq!(options.entry_point, "start");
        assert_eq!(options.device_type, "CL_DEVICE_TYPE_CPU");
    }

    #[test]
    fn test_jobs_keep_input_order_and_isolation() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.cu");
        let b = dir.path().join("b.cu");
        let missing = dir.path().join("missing.cu");
        fs::write(&a, "__global__ void ka() {}\nint main() { return 0; }\n").unwrap();
        fs::write(&b, "__global__ void kb() {}\nint main() { return 0; }\n").unwrap();

        let jobs = run_jobs(&[a.clone(), missing, b.clone()], &TranslateFlags::default());
        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[0].path, a);
        assert_eq!(jobs[0].result.as_ref().unwrap().kernels, vec!["ka"]);
        assert!(matches!(jobs[1].result, Err(TranslateError::Io { .. })));
        assert_eq!(jobs[2].result.as_ref().unwrap().kernels, vec!["kb"]);
    }
}
