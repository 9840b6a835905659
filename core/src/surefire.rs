//! Extraction of per-class test metrics from the console output of
//! `mvn test` (surefire's summary block). The output was never meant for
//! machine consumption, so this is deliberately forgiving: decorated
//! separators and log tags are stripped, and anything that does not pair up
//! is discarded with a warning instead of failing the grading run.

use lazy_regex::{lazy_regex, Lazy, Regex};

use crate::report::{ClassRecord, ClassRecords, MetricValue};

/// Banner surefire prints before the per-class summaries.
pub const HEADER_MARKER: &str = "T E S T S";
/// Everything from this marker on belongs to maven, not to the tests.
pub const FOOTER_MARKER: &str = "BUILD SUCCESS";

/// Wall-clock metric; run-specific noise, dropped from every record.
const ELAPSED_METRIC: &str = "Time elapsed";

static RE_DECORATION: Lazy<Regex> = lazy_regex!(r"Running |\[INFO\] ?|-+");

/// Parses raw runner output into class name -> metric record.
///
/// A missing header marker yields an empty map: that is the normal outcome
/// for a project that failed to compile before any test ran.
pub fn parse(text: &str) -> ClassRecords {
    let Some(window) = extract_window(text) else {
        return ClassRecords::new();
    };

    let cleaned: Vec<String> = window
        .lines()
        .map(|line| RE_DECORATION.replace_all(line, "").trim().to_owned())
        .filter(|line| !line.is_empty())
        .collect();

    // The summary block lists a class-name line followed by its metrics
    // line, so pairing walks the list back-to-front: metrics first, then
    // the class name it belongs to.
    let mut records = ClassRecords::new();
    let mut rev = cleaned.iter().rev();
    loop {
        let Some(metrics_line) = rev.next() else {
            break;
        };
        let Some(name_line) = rev.next() else {
            log::warn!("Discarding unpaired summary line: {:?}", metrics_line);
            break;
        };
        let mut record = parse_metrics(metrics_line);
        record.remove(ELAPSED_METRIC);
        records.insert(name_line.clone(), record);
    }
    records
}

/// Returns the region between the header banner and the footer marker.
/// Without a footer (failed or truncated build) the window runs to the end
/// of the text.
fn extract_window(text: &str) -> Option<&str> {
    let header = text.find(HEADER_MARKER)?;
    let after_header = &text[header..];
    let start = header
        + after_header
            .find('\n')
            .map(|i| i + 1)
            .unwrap_or(after_header.len());

    let end = text[start..]
        .find(FOOTER_MARKER)
        .map(|i| start + i)
        .unwrap_or(text.len());
    Some(&text[start..end])
}

/// Parses a flat `key: value, key: value, ...` metrics line.
/// Purely numeric values become integers (`"45"` yes, `"-5"`/`"0.05 s"` no).
/// A field without a `": "` separator is skipped, not an error.
fn parse_metrics(line: &str) -> ClassRecord {
    let mut record = ClassRecord::new();
    for field in line.split(',') {
        let Some((name, value)) = field.split_once(": ") else {
            log::warn!("Skipping malformed metric field: {:?}", field.trim());
            continue;
        };
        let (name, value) = (name.trim(), value.trim());
        let value = match value.parse::<i64>() {
            Ok(n) if value.bytes().all(|b| b.is_ascii_digit()) => MetricValue::Count(n),
            _ => MetricValue::Text(value.to_owned()),
        };
        record.insert(name.to_owned(), value);
    }
    record
}

#[cfg(test)]
mod test {
    use maplit::btreemap;

    use super::*;

    const WELL_FORMED: &str = "\
[INFO] Scanning for projects...
[INFO] -------------------------------------------------------
[INFO]  T E S T S
[INFO] -------------------------------------------------------
[INFO] Running com.example.AppTest
[INFO] Tests run: 3, Failures: 1, Errors: 0, Skipped: 0, Time elapsed: 0.05 s - in com.example.AppTest
[INFO] Running com.example.UtilTest
[INFO] Tests run: 2, Failures: 0, Errors: 0, Skipped: 1, Time elapsed: 0.01 s - in com.example.UtilTest
[INFO]
[INFO] Results:
[INFO] Tests run: 5, Failures: 1, Errors: 0, Skipped: 1
[INFO]
[INFO] ------------------------------------------------------------------------
[INFO] BUILD SUCCESS
[INFO] ------------------------------------------------------------------------
[INFO] Total time:  2.718 s
";

    #[test]
    fn parses_every_class_and_the_results_total() {
        let records = parse(WELL_FORMED);
        assert_eq!(records.len(), 3);

        assert_eq!(
            records["com.example.AppTest"],
            btreemap! {
                "Tests run".to_owned() => MetricValue::from(3),
                "Failures".to_owned() => MetricValue::from(1),
                "Errors".to_owned() => MetricValue::from(0),
                "Skipped".to_owned() => MetricValue::from(0),
            }
        );
        assert_eq!(
            records["Results:"]["Tests run"],
            MetricValue::from(5),
        );
    }

    #[test]
    fn elapsed_time_never_survives() {
        let records = parse(WELL_FORMED);
        for record in records.values() {
            assert!(!record.contains_key(ELAPSED_METRIC));
        }
    }

    #[test]
    fn missing_header_yields_empty_map() {
        let out = "[ERROR] COMPILATION ERROR :\n[ERROR] missing semicolon\nBUILD FAILURE\n";
        assert!(parse(out).is_empty());
        assert!(parse("").is_empty());
    }

    #[test]
    fn missing_footer_still_parses_to_end() {
        let truncated = WELL_FORMED.split("BUILD SUCCESS").next().unwrap();
        let records = parse(truncated);
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn odd_line_count_discards_the_orphan() {
        let out = "\
 T E S T S
-------------------------------------------------------
Running com.example.OrphanTest
Running com.example.AppTest
Tests run: 1, Failures: 0
BUILD SUCCESS
";
        let records = parse(out);
        // OrphanTest has no metrics line; only the complete pair survives.
        assert_eq!(records.len(), 1);
        assert_eq!(records["com.example.AppTest"]["Tests run"], 1.into());
    }

    #[test]
    fn metric_fields_cast_integers_and_keep_text() {
        let record = parse_metrics("Tests run: 45, Failures: 0");
        assert_eq!(
            record,
            btreemap! {
                "Tests run".to_owned() => MetricValue::from(45),
                "Failures".to_owned() => MetricValue::from(0),
            }
        );

        let record = parse_metrics("Status: skipped");
        assert_eq!(record["Status"], MetricValue::from("skipped"));

        // isdigit-style casting: negative numbers stay textual
        let record = parse_metrics("Delta: -5");
        assert_eq!(record["Delta"], MetricValue::from("-5"));
    }

    #[test]
    fn malformed_metric_field_is_skipped() {
        let record = parse_metrics("Tests run: 2, garbage, Failures: 0");
        assert_eq!(record.len(), 2);
    }
}
