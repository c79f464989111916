use std::collections::BTreeMap;
use std::process::Stdio;

use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncRead;
use tokio::io::BufReader;
use tokio::process::Child;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;

use crate::Result;
use crate::SpawnError;

/// Spawn `args` with `env` and wait for a line containing `expected`.
pub async fn spawn_with_expect_with_env(
    args: &[String],
    env: &BTreeMap<String, String>,
    expected: &str,
) -> Result<()> {
    spawn_with_expects_with_env(args, env, &[expected]).await
}

/// Spawn `args` with `env` and match every entry of `expected`, in order,
/// against successive output lines.
pub async fn spawn_with_expects_with_env(
    args: &[String],
    env: &BTreeMap<String, String>,
    expected: &[&str],
) -> Result<()> {
    spawn_with_expects_cancellable(args, env, expected, &CancellationToken::new()).await
}

/// As [`spawn_with_expects_with_env`]; the child is killed once `cancel`
/// fires.
pub async fn spawn_with_expects_cancellable(
    args: &[String],
    env: &BTreeMap<String, String>,
    expected: &[&str],
    cancel: &CancellationToken,
) -> Result<()> {
    let (program, rest) = args.split_first().ok_or(SpawnError::EmptyCommand)?;
    info!("spawning: {}", args.join(" "));

    let mut child = Command::new(program)
        .args(rest)
        .envs(env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| SpawnError::Launch {
            program: program.clone(),
            source,
        })?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(forward_lines(stdout, tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward_lines(stderr, tx));
    }

    let mut output = String::new();
    for want in expected {
        loop {
            let line = tokio::select! {
                line = rx.recv() => line,
                _ = cancel.cancelled() => {
                    stop(&mut child).await;
                    return Err(SpawnError::Cancelled { program: program.clone() }.into());
                }
            };
            match line {
                Some(line) => {
                    output.push_str(&line);
                    output.push('\n');
                    if line.contains(want) {
                        break;
                    }
                }
                None => {
                    let status = child.wait().await?;
                    debug!("{} exited with {}", program, status);
                    return Err(SpawnError::ExpectNotFound {
                        expected: want.to_string(),
                        output,
                    }
                    .into());
                }
            }
        }
    }

    stop(&mut child).await;
    Ok(())
}

async fn forward_lines<R>(
    reader: R,
    tx: mpsc::UnboundedSender<String>,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).is_err() {
            break;
        }
    }
}

async fn stop(child: &mut Child) {
    if let Err(e) = child.kill().await {
        debug!("child already gone: {}", e);
    }
}
