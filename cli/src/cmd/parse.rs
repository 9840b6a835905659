use std::path::PathBuf;

use anyhow::Context as _;
use grader_core::surefire;

use super::{GlobalArgs, SubcmdResult};

/// Runs a captured test-runner log through the output parser and prints
/// the extracted records as JSON. Handy for checking what a submission's
/// output will grade as without touching any project.
#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg()] // positional argument
    pub log_file: PathBuf,
}

pub fn exec(args: &Args, _global_args: &GlobalArgs) -> SubcmdResult {
    let text = fsutil::read_to_string(&args.log_file)
        .with_context(|| format!("Cannot read log file {:?}", args.log_file))?;

    let records = surefire::parse(&text);
    let json = serde_json::to_string_pretty(&records).context("Cannot serialize records")?;
    println!("{}", json);
    Ok(())
}
