use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use anyhow::{bail, Context};
use tokio::{io::AsyncReadExt, process::Command};

/// Full captured text of one test-command invocation. The text is the sole
/// contract surface; the exit status is recorded but never interpreted.
#[derive(Debug, Clone)]
pub struct RawRunOutput {
    pub status: Option<i32>,
    /// stdout followed by stderr.
    pub text: String,
}

/// Invokes the configured test command inside a project root.
#[derive(Debug, Clone)]
pub struct TestRunner {
    command: String,
    shell: PathBuf,
    time_limit: Option<Duration>,
}

impl TestRunner {
    const DEFAULT_SHELL: &str = "/bin/sh";

    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            shell: Self::DEFAULT_SHELL.into(),
            time_limit: None,
        }
    }

    pub fn shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn get_command(&self) -> &str {
        &self.command
    }

    /// Runs `shell -c command` with the working directory set to
    /// `project_root` and returns the combined output. Blocking from the
    /// pipeline's point of view; a single invocation, no retry.
    pub async fn run(&self, project_root: &Path) -> anyhow::Result<RawRunOutput> {
        let mut proc = Command::new(&self.shell)
            .args(["-c", &self.command])
            .current_dir(project_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| {
                format!(
                    "Failed to spawn '{} -c {}'",
                    self.shell.to_string_lossy(),
                    self.command
                )
            })?;
        let mut stdout = proc.stdout.take().context("Failed to open stdout")?;
        let mut stderr = proc.stderr.take().context("Failed to open stderr")?;

        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();

        let res = {
            let communicate = async {
                tokio::try_join!(
                    stdout.read_to_end(&mut stdout_buf),
                    stderr.read_to_end(&mut stderr_buf),
                    proc.wait(),
                )
                .context("Failed to communicate with subprocess")
            };

            match self.time_limit {
                Some(limit) => tokio::time::timeout(limit, communicate).await,
                None => Ok(communicate.await),
            }
        };

        let exit_status = match res {
            Err(_elapsed) => {
                proc.kill()
                    .await
                    .unwrap_or_else(|e| log::warn!("Failed to kill timed-out process: {:#}", e));
                bail!(
                    "Test command did not finish within {}s",
                    self.time_limit.unwrap_or_default().as_secs()
                );
            }
            Ok(r) => {
                let (_, _, exit_status) = r?;
                exit_status
            }
        };

        let mut text = String::from_utf8_lossy(&stdout_buf).into_owned();
        text.push_str(&String::from_utf8_lossy(&stderr_buf));

        Ok(RawRunOutput {
            status: exit_status.code(),
            text,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_then_stderr() {
        let tmp = tempfile::tempdir().unwrap();
        let runner = TestRunner::new("echo out; echo err >&2");
        let res = runner.run(tmp.path()).await.unwrap();
        assert_eq!(res.status, Some(0));
        assert_eq!(res.text, "out\nerr\n");
    }

    #[tokio::test]
    async fn runs_inside_the_project_root() {
        let tmp = tempfile::tempdir().unwrap();
        fsutil::write(tmp.path().join("marker.txt"), "here").unwrap();
        let res = TestRunner::new("cat marker.txt")
            .run(tmp.path())
            .await
            .unwrap();
        assert_eq!(res.text, "here");
    }

    #[tokio::test]
    async fn nonzero_exit_is_not_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let res = TestRunner::new("echo partial; exit 3")
            .run(tmp.path())
            .await
            .unwrap();
        assert_eq!(res.status, Some(3));
        assert_eq!(res.text, "partial\n");
    }

    #[tokio::test]
    async fn time_limit_kills_a_hung_command() {
        let tmp = tempfile::tempdir().unwrap();
        let res = TestRunner::new("sleep 5")
            .time_limit(Duration::from_millis(100))
            .run(tmp.path())
            .await;
        let err = res.unwrap_err();
        assert!(err.to_string().contains("did not finish"));
    }
}
