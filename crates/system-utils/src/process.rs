use std::process::{Output, Stdio};

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::time::{timeout, Duration};

/// Spawns `cmd` with stdin closed and both output streams piped.
///
/// Kept separate from [`wait_with_output`] so callers can tell a process that
/// never started apart from one that ran and failed.
pub fn spawn_captured(cmd: &mut Command) -> std::io::Result<Child> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    cmd.spawn()
}

/// Waits for `child` to exit while draining stdout and stderr concurrently.
///
/// With `limit` unset the wait is unbounded.
pub async fn wait_with_output(
    mut child: Child,
    limit: Option<Duration>,
    label: &str,
) -> anyhow::Result<Output> {
    let stdout_task = tokio::spawn(read_all(child.stdout.take()));
    let stderr_task = tokio::spawn(read_all(child.stderr.take()));

    let status = match limit {
        Some(limit) => match timeout(limit, child.wait()).await {
            Ok(result) => result.with_context(|| format!("{label} failed"))?,
            Err(_) => {
                let _ = child.kill().await;
                let _ = child.wait().await;
                anyhow::bail!("{label} timed out after {}s", limit.as_secs())
            }
        },
        None => child
            .wait()
            .await
            .with_context(|| format!("{label} failed"))?,
    };

    let stdout = stdout_task
        .await
        .context("stdout task join")?
        .context("stdout read")?;
    let stderr = stderr_task
        .await
        .context("stderr task join")?
        .context("stderr read")?;
    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

async fn read_all<R>(pipe: Option<R>) -> std::io::Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}
