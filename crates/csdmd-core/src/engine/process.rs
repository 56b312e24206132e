use crate::engine::error::ScenarioError;
use std::ffi::OsStr;
use std::fs::File;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChildExit {
    pub code: Option<i32>,
    pub success: bool,
    pub timed_out: bool,
    pub elapsed: Duration,
}

/// Runs `program` to completion with stdout and stderr both written to `log_path`.
///
/// The log is truncated before the child starts. With a `timeout` the child is
/// killed once it expires and the exit is reported as timed out. On unix the
/// child leads its own process group, and the whole group is killed, so
/// processes it started cannot keep writing to the log.
pub(crate) async fn run_with_log<I, S>(
    program: &Path,
    args: I,
    log_path: &Path,
    timeout: Option<Duration>,
) -> Result<ChildExit, ScenarioError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let log_err = |source: std::io::Error| ScenarioError::LogFile {
        path: log_path.to_path_buf(),
        source,
    };
    let stdout = File::create(log_path).map_err(log_err)?;
    let stderr = stdout.try_clone().map_err(log_err)?;

    let started = Instant::now();
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .kill_on_drop(true);
    #[cfg(unix)]
    command.process_group(0);
    let mut child = command
        .spawn()
        .map_err(|source| ScenarioError::Launch {
            program: program.to_path_buf(),
            source,
        })?;
    debug!("Spawned {:?} (pid {:?}), logging to {:?}", program, child.id(), log_path);

    let waited = match timeout {
        Some(limit) => tokio::time::timeout(limit, child.wait()).await.ok(),
        None => Some(child.wait().await),
    };

    let exit = match waited {
        Some(status) => {
            let status = status.map_err(|source| ScenarioError::Launch {
                program: program.to_path_buf(),
                source,
            })?;
            ChildExit {
                code: status.code(),
                success: status.success(),
                timed_out: false,
                elapsed: started.elapsed(),
            }
        }
        None => {
            warn!("{:?} exceeded its time limit, killing it.", program);
            #[cfg(unix)]
            if let Some(pid) = child.id() {
                if let Err(e) = kill_process_group(pid).await {
                    warn!("Failed to kill process group {}: {}", pid, e);
                }
            }
            if let Err(e) = child.kill().await {
                warn!("Failed to kill timed-out child: {}", e);
            }
            ChildExit {
                code: None,
                success: false,
                timed_out: true,
                elapsed: started.elapsed(),
            }
        }
    };
    Ok(exit)
}

/// Sends SIGKILL to every process in the group led by `pgid`.
#[cfg(unix)]
async fn kill_process_group(pgid: u32) -> std::io::Result<()> {
    let status = Command::new("kill")
        .arg("-KILL")
        .arg("--")
        .arg(format!("-{}", pgid))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other(format!("kill exited with {}", status)))
    }
}

/// Polls until `path` exists. Returns `false` only if `limit` runs out first.
pub(crate) async fn wait_for_file(path: &Path, poll: Duration, limit: Option<Duration>) -> bool {
    let started = Instant::now();
    loop {
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            return true;
        }
        if limit.is_some_and(|l| started.elapsed() >= l) {
            return false;
        }
        tokio::time::sleep(poll).await;
    }
}
