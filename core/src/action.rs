pub mod error {
    #[allow(unused_imports)]
    pub(crate) use anyhow::{anyhow, bail, ensure, Context as _};
    pub use anyhow::{Error, Result};
}

use std::fmt::Write as _;
use std::time::Duration;

use error::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;
use crate::project::Project;
use crate::report::{ClassRecords, GradeReport, SavedReport};
use crate::runner::TestRunner;
use crate::surefire;
use crate::swap::ResourceSwap;

/// Drops an example `grader.toml` into `dir`, refusing to shadow one that
/// is already reachable from there.
pub fn init_grader_dir(dir: impl AsRef<std::path::Path>) -> Result<()> {
    let dir = dir.as_ref();
    if let Ok(config_filepath) = Config::find_file_in_ancestors(dir) {
        bail!(
            "Already a grader dir.\nIf that is intentional, remove {:?} and then try again.",
            config_filepath
        );
    }

    let config_filepath = dir.join(Config::FILENAME);
    fsutil::write_with_mkdir(config_filepath, Config::example_toml())?;
    Ok(())
}

/// Grades one project: swap the trusted resources in, run the test
/// command, parse its output, swap back out. The guard's drop performs the
/// swap-out, so the project returns to its original state even when the
/// invocation or the parse bails.
pub async fn grade_project(
    project: &Project,
    swap: &ResourceSwap,
    runner: &TestRunner,
) -> Result<ClassRecords> {
    let _guard = swap.engage(project);
    let output = runner.run(project.root()).await?;
    log::debug!(
        "'{}' exited with {:?} ({} bytes of output)",
        project.name(),
        output.status,
        output.text.len()
    );
    Ok(surefire::parse(&output.text))
}

/// Grades every project dir under `cfg.projects_dir`, one at a time in
/// name order. A failure in one project is logged and that project is left
/// out of the report; the batch always runs to completion.
pub async fn grade_all(cfg: &Config) -> Result<GradeReport> {
    let projects = Project::enumerate(&cfg.projects_dir, &cfg.project)
        .context("Failed to enumerate projects")?;
    if projects.is_empty() {
        log::warn!("No project dirs found in {:?}", cfg.projects_dir);
    }

    let swap = ResourceSwap::new(&cfg.resources.tests_dir, &cfg.resources.build_file);
    let mut runner = TestRunner::new(&cfg.test.command).shell(&cfg.test.shell);
    if let Some(sec) = cfg.test.timeout_sec {
        runner = runner.time_limit(Duration::from_secs(sec));
    }

    log::info!("Running: {}", runner.get_command());

    let bar = ProgressBar::new(projects.len() as u64).with_style(
        ProgressStyle::default_bar()
            .template("Grading projects: [{bar:60}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#."),
    );

    let mut report = GradeReport::new();
    for project in &projects {
        bar.set_message(project.name().to_owned());
        match grade_project(project, &swap, &runner).await {
            Ok(records) => {
                report.insert(project.name(), records);
            }
            Err(e) => {
                log::error!("Could not grade '{}': {:#}", project.name(), e);
            }
        }
        bar.inc(1);
    }
    bar.finish_with_message("done");

    Ok(report)
}

/// Writes the report as timestamped JSON and CSV into the grades dir.
pub fn save_report(report: &GradeReport, cfg: &Config) -> Result<SavedReport> {
    let mut stamp = String::new();
    write!(
        stamp,
        "{}",
        chrono::Local::now().format(&cfg.output_timestamp_format)
    )
    .with_context(|| {
        format!(
            "Invalid output_timestamp_format: {:?}",
            cfg.output_timestamp_format
        )
    })?;

    report
        .save(&cfg.grades_dir, &stamp)
        .context("Failed to write grade report")
}
