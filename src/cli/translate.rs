use std::path::{Path, PathBuf};
use std::process;

use clap::Args;
use tracing::info;

use super::{report, run_jobs, TranslateFlags};

#[derive(Args)]
pub struct TranslateArgs {
    /// Input .cu files
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
    /// Directory for the translated files (default: next to each input)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,
    /// Print translated sources to stdout instead of writing files
    #[arg(long, conflicts_with = "output")]
    pub stdout: bool,
    #[command(flatten)]
    pub flags: TranslateFlags,
}

pub fn cmd_translate(args: TranslateArgs) {
    let TranslateArgs {
        inputs,
        output,
        stdout,
        flags,
    } = args;

    if let Some(dir) = &output {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("error: cannot create '{}': {}", dir.display(), e);
            process::exit(1);
        }
    }

    let mut failed = false;
    for job in run_jobs(&inputs, &flags) {
        if !report(&job) {
            failed = true;
            continue;
        }
        let Ok(translation) = &job.result else {
            continue;
        };
        if stdout {
            print!("{}", translation.host_source);
            continue;
        }
        let out_path = output_path(&job.path, output.as_deref());
        match std::fs::write(&out_path, &translation.host_source) {
            Ok(()) => {
                info!(output = %out_path.display(), "wrote");
                eprintln!("Translated: {} -> {}", job.path.display(), out_path.display());
            }
            Err(e) => {
                eprintln!("error: cannot write '{}': {}", out_path.display(), e);
                failed = true;
            }
        }
    }
    if failed {
        process::exit(1);
    }
}

/// Where the translation of `input` goes: `<stem>.c` in `out_dir` or
/// beside the input, never over the input itself.
pub fn output_path(input: &Path, out_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("out")
        .to_string();
    let dir = match out_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().unwrap_or(Path::new(".")).to_path_buf(),
    };
    let candidate = dir.join(format!("{}.c", stem));
    if candidate == input {
        dir.join(format!("{}.opencl.c", stem))
    } else {
        candidate
    }
}
