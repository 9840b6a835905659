use std::path::{Path, PathBuf};
use std::result::Result as StdResult;

use anyhow::{ensure, Context as _};
use rust_embed::RustEmbed;
use serde::Deserialize;

use crate::project::ProjectLayout;

/// Immutable grading-run configuration, constructed once at startup and
/// passed by reference into the actions. Every field has a default so an
/// empty `grader.toml` is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,

    #[serde(default = "Config::default_projects_dir")]
    pub projects_dir: PathBuf,

    #[serde(default = "Config::default_grades_dir")]
    pub grades_dir: PathBuf,

    #[serde(default = "Config::default_timestamp_format")]
    pub output_timestamp_format: String,

    #[serde(default)]
    pub project: ProjectLayout,

    #[serde(default)]
    pub resources: ResourceConfig,

    #[serde(default)]
    pub test: TestConfig,
}

/// Grader-owned trusted resources substituted into every project.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceConfig {
    #[serde(default = "ResourceConfig::default_tests_dir")]
    pub tests_dir: PathBuf,
    #[serde(default = "ResourceConfig::default_build_file")]
    pub build_file: PathBuf,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            tests_dir: Self::default_tests_dir(),
            build_file: Self::default_build_file(),
        }
    }
}

impl ResourceConfig {
    fn default_tests_dir() -> PathBuf {
        "./resources/test".into()
    }

    fn default_build_file() -> PathBuf {
        "./resources/pom.xml".into()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TestConfig {
    #[serde(default = "TestConfig::default_shell")]
    pub shell: PathBuf,
    #[serde(default = "TestConfig::default_command")]
    pub command: String,
    /// Kill the test command after this many seconds. Unset = no limit,
    /// an unresponsive command then stalls the whole run.
    #[serde(default)]
    pub timeout_sec: Option<u64>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            shell: Self::default_shell(),
            command: Self::default_command(),
            timeout_sec: None,
        }
    }
}

impl TestConfig {
    fn default_shell() -> PathBuf {
        "/bin/sh".into()
    }

    fn default_command() -> String {
        "mvn test".to_owned()
    }
}

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

impl Config {
    pub const FILENAME: &str = "grader.toml";

    fn default_projects_dir() -> PathBuf {
        "./projects".into()
    }

    fn default_grades_dir() -> PathBuf {
        "./grades".into()
    }

    fn default_timestamp_format() -> String {
        "%Y-%m-%d-%H-%M-%S_".to_owned()
    }

    pub fn example_toml() -> String {
        let file = Asset::get(Self::FILENAME).unwrap();
        std::str::from_utf8(file.data.as_ref()).unwrap().to_owned()
    }

    pub fn from_toml(s: &str) -> StdResult<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(filepath: PathBuf) -> anyhow::Result<Self> {
        let toml = fsutil::read_to_string(&filepath).context("Cannot read a file")?;
        let mut cfg = Self::from_toml(&toml)
            .with_context(|| format!("Invalid config TOML: {:?}", filepath))?;
        if let Some(dir) = filepath.parent() {
            cfg.resolve_paths(dir);
        }
        cfg.source_config_file = Some(filepath);
        Ok(cfg)
    }

    /// Find config file in ancestor dirs, including current dir.
    pub fn find_file_in_ancestors(cur_dir: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        let cur_dir = cur_dir.as_ref();
        cur_dir
            .ancestors()
            .map(|dir| dir.join(Self::FILENAME))
            .find(|path| path.is_file())
            .with_context(|| format!("Not in a grader dir: Cannot find '{}'", Self::FILENAME))
    }

    pub fn from_file_finding_in_ancestors(cur_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_filepath = Config::find_file_in_ancestors(cur_dir)?;
        Self::from_toml_file(config_filepath)
    }

    /// Relative paths in the file are meant relative to the file itself,
    /// not to wherever the grader happens to be invoked from.
    fn resolve_paths(&mut self, base: &Path) {
        let with_base = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(strip_prefix_dot(path));
            }
        };
        with_base(&mut self.projects_dir);
        with_base(&mut self.grades_dir);
        with_base(&mut self.resources.tests_dir);
        with_base(&mut self.resources.build_file);
    }

    /// Startup checks: a broken layout terminates the run before any
    /// project is touched.
    pub fn preflight(&self) -> anyhow::Result<()> {
        ensure!(
            self.projects_dir.is_dir(),
            "Projects directory does not exist or is misconfigured: {:?}",
            self.projects_dir
        );
        ensure!(
            self.resources.tests_dir.is_dir(),
            "Trusted test suite directory does not exist or is misconfigured: {:?}",
            self.resources.tests_dir
        );
        ensure!(
            self.resources.build_file.is_file(),
            "Trusted build file does not exist or is misconfigured: {:?}",
            self.resources.build_file
        );

        // Render once so a bad format string fails here, not mid-report.
        use std::fmt::Write as _;
        let mut rendered = String::new();
        write!(
            rendered,
            "{}",
            chrono::Local::now().format(&self.output_timestamp_format)
        )
        .with_context(|| {
            format!(
                "Invalid output_timestamp_format: {:?}",
                self.output_timestamp_format
            )
        })?;

        fsutil::mkdir_all(&self.grades_dir).context("Cannot create grades output dir")?;
        Ok(())
    }
}

fn strip_prefix_dot(path: &Path) -> &Path {
    path.strip_prefix(".").unwrap_or(path)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn example_toml_should_be_parsable() {
        let toml = Config::example_toml();
        let cfg = dbg!(Config::from_toml(&toml)).unwrap();

        let Config {
            source_config_file,
            projects_dir,
            grades_dir,
            output_timestamp_format,
            project,
            resources,
            test,
        } = cfg;

        assert_eq!(source_config_file, None);
        assert_eq!(projects_dir, Path::new("./projects"));
        assert_eq!(grades_dir, Path::new("./grades"));
        assert_eq!(output_timestamp_format, "%Y-%m-%d-%H-%M-%S_");

        assert_eq!(project.tests_dir, Path::new("src/test"));
        assert_eq!(project.build_file, Path::new("pom.xml"));

        assert_eq!(resources.tests_dir, Path::new("./resources/test"));
        assert_eq!(resources.build_file, Path::new("./resources/pom.xml"));

        assert_eq!(test.shell, Path::new("/bin/sh"));
        assert_eq!(test.command, "mvn test");
        assert_eq!(test.timeout_sec, None);
    }

    #[test]
    fn empty_toml_falls_back_to_defaults() {
        let cfg = Config::from_toml("").unwrap();
        let example = Config::from_toml(&Config::example_toml()).unwrap();
        assert_eq!(cfg, example);
    }

    #[test]
    fn relative_paths_resolve_against_config_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(Config::FILENAME);
        fsutil::write(&path, "projects_dir = \"./submissions\"\n").unwrap();

        let cfg = Config::from_toml_file(path).unwrap();
        assert_eq!(cfg.projects_dir, tmp.path().join("submissions"));
        assert_eq!(cfg.resources.tests_dir, tmp.path().join("resources/test"));
    }

    #[test]
    fn find_file_climbs_ancestors() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b");
        fsutil::mkdir_all(&nested).unwrap();
        fsutil::write(tmp.path().join(Config::FILENAME), "").unwrap();

        let found = Config::find_file_in_ancestors(&nested).unwrap();
        assert_eq!(found, tmp.path().join(Config::FILENAME));

        let missing = tempfile::tempdir().unwrap();
        assert!(Config::find_file_in_ancestors(missing.path()).is_err());
    }

    #[test]
    fn preflight_rejects_missing_projects_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join(Config::FILENAME);
        fsutil::write(&path, "").unwrap();

        let cfg = Config::from_toml_file(path).unwrap();
        let err = cfg.preflight().unwrap_err();
        assert!(err.to_string().contains("Projects directory"));
    }
}
