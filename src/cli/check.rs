use std::path::PathBuf;
use std::process;

use clap::Args;

use super::{report, run_jobs, TranslateFlags};

#[derive(Args)]
pub struct CheckArgs {
    /// Input .cu files
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
    #[command(flatten)]
    pub flags: TranslateFlags,
}

pub fn cmd_check(args: CheckArgs) {
    let CheckArgs { inputs, flags } = args;

    let mut failed = false;
    for job in run_jobs(&inputs, &flags) {
        if !report(&job) {
            failed = true;
            continue;
        }
        if let Ok(translation) = &job.result {
            let other = translation
                .diagnostics
                .iter()
                .filter(|d| !d.is_error())
                .count();
            let errors = translation.diagnostics.len() - other;
            eprintln!(
                "OK: {} ({} kernel(s), {} edit(s), {} error(s), {} other diagnostic(s))",
                job.path.display(),
                translation.kernels.len(),
                translation.edit_count,
                errors,
                other
            );
        }
    }
    if failed {
        process::exit(1);
    }
}
