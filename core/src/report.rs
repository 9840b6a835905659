use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

/// One metric extracted from a test summary line.
/// Purely numeric values are kept as integers so that downstream consumers
/// can aggregate them; everything else stays text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Count(i64),
    Text(String),
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MetricValue::Count(n) => write!(f, "{}", n),
            MetricValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(n: i64) -> Self {
        MetricValue::Count(n)
    }
}

impl From<&str> for MetricValue {
    fn from(s: &str) -> Self {
        MetricValue::Text(s.to_owned())
    }
}

/// Metric name -> value, for one test class.
pub type ClassRecord = BTreeMap<String, MetricValue>;

/// Test class name -> record, for one project run.
pub type ClassRecords = BTreeMap<String, ClassRecord>;

/// Everything graded in one pass, keyed by project name.
/// BTreeMap keeps serialization order stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradeReport(BTreeMap<String, ClassRecords>);

#[derive(Debug, Clone)]
pub struct SavedReport {
    pub json_path: PathBuf,
    pub csv_path: PathBuf,
}

impl GradeReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, project: impl Into<String>, records: ClassRecords) {
        self.0.insert(project.into(), records);
    }

    pub fn get(&self, project: &str) -> Option<&ClassRecords> {
        self.0.get(project)
    }

    pub fn projects(&self) -> impl Iterator<Item = (&String, &ClassRecords)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Writes `<stamp>grades.json` and `<stamp>grades.csv` into `grades_dir`.
    pub fn save(&self, grades_dir: impl AsRef<Path>, stamp: &str) -> fsutil::Result<SavedReport> {
        let grades_dir = grades_dir.as_ref();
        let json_path = grades_dir.join(format!("{}grades.json", stamp));
        let csv_path = grades_dir.join(format!("{}grades.csv", stamp));

        fsutil::write_json_with_mkdir(&json_path, self)?;
        fsutil::write_with_mkdir(&csv_path, self.to_csv())?;

        Ok(SavedReport {
            json_path,
            csv_path,
        })
    }

    /// One row per (project, test class); columns are the union of all
    /// metric names seen in the report. Projects whose run yielded no
    /// summaries appear in the JSON only.
    fn to_csv(&self) -> String {
        let metric_names: BTreeSet<&str> = self
            .0
            .values()
            .flat_map(|classes| classes.values())
            .flat_map(|record| record.keys())
            .map(String::as_str)
            .collect();

        let mut out = String::from("project,test_class");
        for name in &metric_names {
            out.push(',');
            out.push_str(&csv_escape(name));
        }
        out.push('\n');

        for (project, classes) in &self.0 {
            for (class, record) in classes {
                out.push_str(&csv_escape(project));
                out.push(',');
                out.push_str(&csv_escape(class));
                for name in &metric_names {
                    out.push(',');
                    if let Some(v) = record.get(*name) {
                        out.push_str(&csv_escape(&v.to_string()));
                    }
                }
                out.push('\n');
            }
        }
        out
    }
}

fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}
