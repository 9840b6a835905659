use colored::Colorize;

use crate::report::{ClassRecords, GradeReport, MetricValue};

#[macro_export]
macro_rules! print_success {
    ($fmt:literal, $($e:tt)*) => {
        use ::colored::Colorize as _;
        println!("{}", format!($fmt, $($e)*).green())
    }
}

/// Surefire's aggregate pseudo-class, present whenever the run printed a
/// summary block.
const TOTALS_CLASS: &str = "Results:";

fn count(records: &ClassRecords, metric: &str) -> Option<i64> {
    match records.get(TOTALS_CLASS)?.get(metric)? {
        MetricValue::Count(n) => Some(*n),
        MetricValue::Text(_) => None,
    }
}

/// One line per project: totals when the run produced them, a shrug when
/// it did not.
pub fn print_report_summary(report: &GradeReport) {
    for (project, classes) in report.projects() {
        let line = if classes.is_empty() {
            "no test summaries in output".yellow()
        } else {
            let totals = (
                count(classes, "Tests run"),
                count(classes, "Failures"),
                count(classes, "Errors"),
            );
            match totals {
                (Some(run), Some(failures), Some(errors)) => {
                    let msg = format!(
                        "Tests run: {}, Failures: {}, Errors: {}",
                        run, failures, errors
                    );
                    if failures + errors == 0 {
                        msg.green()
                    } else {
                        msg.bright_red()
                    }
                }
                _ => format!("{} test classes", classes.len()).normal(),
            }
        };
        println!("{:<24} {}", project.bold(), line);
    }
}
