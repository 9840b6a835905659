use grader_core::{action, print_success, style};

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Parse and summarize only; write no report files.
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = global_args.load_config()?;
    cfg.preflight()?;

    let report = action::grade_all(&cfg).await?;
    style::print_report_summary(&report);

    if args.dry_run {
        return Ok(());
    }

    let saved = action::save_report(&report, &cfg)?;
    print_success!(
        "Saved grade report. (json: {}, csv: {})",
        saved.json_path.to_string_lossy(),
        saved.csv_path.to_string_lossy()
    );
    Ok(())
}
