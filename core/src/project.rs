use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Prefix used to park a project's own resources out of the build tool's
/// sight while the trusted copies occupy the canonical paths.
pub const PARKED_PREFIX: &str = "original_";

/// Where the test resources and build descriptor live inside every
/// submission. Fixed per grading run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProjectLayout {
    #[serde(default = "ProjectLayout::default_tests_dir")]
    pub tests_dir: PathBuf,
    #[serde(default = "ProjectLayout::default_build_file")]
    pub build_file: PathBuf,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            tests_dir: Self::default_tests_dir(),
            build_file: Self::default_build_file(),
        }
    }
}

impl ProjectLayout {
    fn default_tests_dir() -> PathBuf {
        "src/test".into()
    }

    fn default_build_file() -> PathBuf {
        "pom.xml".into()
    }
}

/// One student submission: a directory tree identified by its dir name.
/// The grader mutates it in place and must hand it back untouched.
#[derive(Debug, Clone)]
pub struct Project {
    name: String,
    root: PathBuf,
    layout: ProjectLayout,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>, layout: ProjectLayout) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        Self { name, root, layout }
    }

    /// Lists the project dirs under `projects_dir`, lexicographic by name.
    /// Non-directory entries are ignored.
    pub fn enumerate(
        projects_dir: impl AsRef<Path>,
        layout: &ProjectLayout,
    ) -> fsutil::Result<Vec<Self>> {
        let mut projects = Vec::new();
        for entry in fsutil::read_dir(&projects_dir)?.filter_map(Result::ok) {
            let Ok(ft) = entry.file_type() else {
                continue;
            };
            if !ft.is_dir() {
                continue;
            }
            projects.push(Self::new(entry.path(), layout.clone()));
        }
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical path the build tool reads test resources from.
    pub fn tests_dir(&self) -> PathBuf {
        self.root.join(&self.layout.tests_dir)
    }

    /// Canonical path of the build descriptor.
    pub fn build_file(&self) -> PathBuf {
        self.root.join(&self.layout.build_file)
    }

    pub fn parked_tests_dir(&self) -> PathBuf {
        parked(&self.tests_dir())
    }

    pub fn parked_build_file(&self) -> PathBuf {
        parked(&self.build_file())
    }
}

/// `src/test` -> `src/original_test`, `pom.xml` -> `original_pom.xml`:
/// only the last segment changes, the parent dir stays.
fn parked(path: &Path) -> PathBuf {
    match path.file_name() {
        Some(name) => {
            path.with_file_name(format!("{}{}", PARKED_PREFIX, name.to_string_lossy()))
        }
        None => path.to_owned(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn canonical_and_parked_paths() {
        let p = Project::new("/work/projects/alice", ProjectLayout::default());
        assert_eq!(p.name(), "alice");
        assert_eq!(p.tests_dir(), Path::new("/work/projects/alice/src/test"));
        assert_eq!(p.build_file(), Path::new("/work/projects/alice/pom.xml"));
        assert_eq!(
            p.parked_tests_dir(),
            Path::new("/work/projects/alice/src/original_test")
        );
        assert_eq!(
            p.parked_build_file(),
            Path::new("/work/projects/alice/original_pom.xml")
        );
    }

    #[test]
    fn enumerate_sorts_by_name_and_skips_files() {
        let tmp = tempfile::tempdir().unwrap();
        fsutil::mkdir_all(tmp.path().join("zoe")).unwrap();
        fsutil::mkdir_all(tmp.path().join("alice")).unwrap();
        fsutil::write(tmp.path().join("README.md"), "not a project").unwrap();

        let projects = Project::enumerate(tmp.path(), &ProjectLayout::default()).unwrap();
        let names: Vec<_> = projects.iter().map(Project::name).collect();
        assert_eq!(names, ["alice", "zoe"]);
    }
}
