//! Reversible substitution of a project's own test resources with the
//! grader's trusted copies. Renames park the originals next to their
//! canonical paths, so the student's files survive byte-for-byte and a
//! crashed run can be repaired by hand if it ever comes to that.

use std::{fmt, path::PathBuf};

use crate::project::Project;

/// One step of the swap sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapOp {
    ParkTests,
    ParkBuildFile,
    CopyTests,
    CopyBuildFile,
    RemoveTests,
    RemoveBuildFile,
    UnparkTests,
    UnparkBuildFile,
}

impl fmt::Display for SwapOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use SwapOp::*;
        let s = match self {
            ParkTests => "park tests dir",
            ParkBuildFile => "park build file",
            CopyTests => "copy trusted tests dir",
            CopyBuildFile => "copy trusted build file",
            RemoveTests => "remove substituted tests dir",
            RemoveBuildFile => "remove substituted build file",
            UnparkTests => "unpark tests dir",
            UnparkBuildFile => "unpark build file",
        };
        write!(f, "{}", s)
    }
}

/// A swap step that did not go through. Local and non-fatal: a project
/// missing one of its resources degrades instead of halting the batch.
#[derive(Debug, thiserror::Error)]
#[error("Could not {op} for '{project}': {source}")]
pub struct SwapWarning {
    pub op: SwapOp,
    pub project: String,
    #[source]
    pub source: fsutil::Error,
}

impl SwapWarning {
    fn new(op: SwapOp, project: &Project, source: fsutil::Error) -> Self {
        Self {
            op,
            project: project.name().to_owned(),
            source,
        }
    }
}

pub fn report(warnings: &[SwapWarning]) {
    for w in warnings {
        log::warn!("{}", w);
    }
}

/// Swaps grader-owned resources in and out of project trees.
#[derive(Debug, Clone)]
pub struct ResourceSwap {
    trusted_tests_dir: PathBuf,
    trusted_build_file: PathBuf,
}

impl ResourceSwap {
    pub fn new(
        trusted_tests_dir: impl Into<PathBuf>,
        trusted_build_file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            trusted_tests_dir: trusted_tests_dir.into(),
            trusted_build_file: trusted_build_file.into(),
        }
    }

    /// Parks the project's own tests dir and build file under their
    /// `original_*` names so the build tool cannot pick them up.
    /// Each rename is independent; a missing path yields a warning and the
    /// other rename still proceeds.
    pub fn invalidate(&self, project: &Project) -> Vec<SwapWarning> {
        let mut warnings = Vec::new();
        if let Err(e) = fsutil::rename(project.tests_dir(), project.parked_tests_dir()) {
            warnings.push(SwapWarning::new(SwapOp::ParkTests, project, e));
        }
        if let Err(e) = fsutil::rename(project.build_file(), project.parked_build_file()) {
            warnings.push(SwapWarning::new(SwapOp::ParkBuildFile, project, e));
        }
        warnings
    }

    /// Copies the trusted resources to the canonical paths. The tree copy
    /// fails when the destination still exists (a parking step went wrong)
    /// or the trusted source is missing; both degrade to warnings, matching
    /// the per-operation isolation of `invalidate`.
    pub fn materialize(&self, project: &Project) -> Vec<SwapWarning> {
        let mut warnings = Vec::new();
        if let Err(e) = fsutil::copy_tree(&self.trusted_tests_dir, project.tests_dir()) {
            warnings.push(SwapWarning::new(SwapOp::CopyTests, project, e));
        }
        if let Err(e) = fsutil::copy_file(&self.trusted_build_file, project.build_file()) {
            warnings.push(SwapWarning::new(SwapOp::CopyBuildFile, project, e));
        }
        warnings
    }

    /// Removes the substituted copies from the canonical paths.
    pub fn dematerialize(&self, project: &Project) -> Vec<SwapWarning> {
        self.dematerialize_selected(project, true, true)
    }

    fn dematerialize_selected(
        &self,
        project: &Project,
        tests: bool,
        build_file: bool,
    ) -> Vec<SwapWarning> {
        let mut warnings = Vec::new();
        if tests {
            if let Err(e) = fsutil::remove_dir_all(project.tests_dir()) {
                warnings.push(SwapWarning::new(SwapOp::RemoveTests, project, e));
            }
        }
        if build_file {
            if let Err(e) = fsutil::remove_file(project.build_file()) {
                warnings.push(SwapWarning::new(SwapOp::RemoveBuildFile, project, e));
            }
        }
        warnings
    }

    /// Reverses `invalidate`. Running it on an already-restored project is
    /// harmless: both renames fail, two warnings, no state change.
    pub fn restore(&self, project: &Project) -> Vec<SwapWarning> {
        let mut warnings = Vec::new();
        if let Err(e) = fsutil::rename(project.parked_tests_dir(), project.tests_dir()) {
            warnings.push(SwapWarning::new(SwapOp::UnparkTests, project, e));
        }
        if let Err(e) = fsutil::rename(project.parked_build_file(), project.build_file()) {
            warnings.push(SwapWarning::new(SwapOp::UnparkBuildFile, project, e));
        }
        warnings
    }

    /// Swaps the trusted resources in and returns a guard whose drop swaps
    /// them back out. The drop runs on every exit path, so the project ends
    /// up restored even when the invocation or the parse step bails.
    ///
    /// A copy step that found the canonical path still occupied (the park
    /// rename must have failed, so the student's own files are sitting
    /// there) is remembered, and the drop skips the removal of that
    /// resource.
    pub fn engage<'a>(&'a self, project: &'a Project) -> SwapGuard<'a> {
        report(&self.invalidate(project));
        let copy_warnings = self.materialize(project);
        report(&copy_warnings);
        let occupied = |op: SwapOp| {
            copy_warnings
                .iter()
                .any(|w| w.op == op && matches!(w.source, fsutil::Error::CopyDestExists(_)))
        };
        SwapGuard {
            remove_tests: !occupied(SwapOp::CopyTests),
            remove_build_file: !occupied(SwapOp::CopyBuildFile),
            swap: self,
            project,
        }
    }
}

pub struct SwapGuard<'a> {
    swap: &'a ResourceSwap,
    project: &'a Project,
    remove_tests: bool,
    remove_build_file: bool,
}

impl Drop for SwapGuard<'_> {
    fn drop(&mut self) {
        report(&self.swap.dematerialize_selected(
            self.project,
            self.remove_tests,
            self.remove_build_file,
        ));
        report(&self.swap.restore(self.project));
    }
}
