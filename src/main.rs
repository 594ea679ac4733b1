use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cli;

use cli::check::CheckArgs;
use cli::translate::TranslateArgs;

#[derive(Parser)]
#[command(
    name = "cudacl",
    version,
    about = "Translate CUDA programs into OpenCL host programs"
)]
struct Cli {
    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Translate .cu files and write the OpenCL host programs
    Translate(TranslateArgs),
    /// Translate without writing anything; report what would change
    Check(CheckArgs),
}

fn setup_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Command::Translate(args) => cli::translate::cmd_translate(args),
        Command::Check(args) => cli::check::cmd_check(args),
    }
}
