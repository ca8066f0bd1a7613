//! Spawning external processes and streaming their output.
//!
//! A launched process is represented by a [`ProcessHandle`]: an ordered
//! stream of output lines plus exactly one [`ExecutionOutcome`]. Nothing
//! here blocks the caller; readers and the exit supervisor run as tokio tasks.

use std::collections::VecDeque;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::models::progress::{ExecutionOutcome, OutputLine, OutputStream};

/// Lines of stderr kept as the failure text.
pub const STDERR_TAIL_LINES: usize = 50;

/// How long readers may keep draining after the child is gone. A grandchild
/// (ffmpeg) can inherit the pipes and keep them open.
const READER_GRACE: Duration = Duration::from_secs(2);

/// How long a cancelled process tree gets to stop after SIGINT before it
/// is killed.
const KILL_GRACE: Duration = Duration::from_secs(3);

fn enhanced_path(bin_dir: &Path) -> String {
    let sep = if cfg!(windows) { ";" } else { ":" };
    let current = std::env::var("PATH").unwrap_or_default();
    format!("{}{}{}", bin_dir.display(), sep, current)
}

/// A command with the environment yt-dlp expects: managed bin dir first on
/// `PATH` and UTF-8 Python I/O.
pub fn command<S: AsRef<OsStr>>(program: S, bin_dir: Option<&Path>) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(program);
    #[cfg(target_os = "windows")]
    cmd.creation_flags(0x08000000);
    if let Some(dir) = bin_dir {
        cmd.env("PATH", enhanced_path(dir));
    }
    cmd.env("PYTHONIOENCODING", "utf-8");
    cmd.env("PYTHONUTF8", "1");
    cmd
}

/// Capability to start a named external program and stream its output.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    /// Never fails: a process that cannot start yields
    /// [`ExecutionOutcome::SpawnFailed`] and an already-closed line stream.
    async fn launch(
        &self,
        program: &Path,
        args: &[String],
        cancel: CancellationToken,
    ) -> ProcessHandle;
}

pub struct ProcessHandle {
    lines: mpsc::UnboundedReceiver<OutputLine>,
    outcome: oneshot::Receiver<ExecutionOutcome>,
    cancel: CancellationToken,
}

impl ProcessHandle {
    pub fn new(
        lines: mpsc::UnboundedReceiver<OutputLine>,
        outcome: oneshot::Receiver<ExecutionOutcome>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            lines,
            outcome,
            cancel,
        }
    }

    /// Next line in emission order; `None` once both pipes are closed.
    pub async fn next_line(&mut self) -> Option<OutputLine> {
        self.lines.recv().await
    }

    /// Kill the child. The outcome becomes [`ExecutionOutcome::Cancelled`].
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Discard remaining output and wait for the outcome.
    pub async fn wait(self) -> ExecutionOutcome {
        drop(self.lines);
        self.outcome
            .await
            .unwrap_or_else(|_| ExecutionOutcome::Failed {
                exit_code: None,
                stderr: "process supervisor stopped without reporting".to_string(),
            })
    }

    /// Drain every line, then wait for the outcome.
    pub async fn collect(mut self) -> (Vec<OutputLine>, ExecutionOutcome) {
        let mut lines = Vec::new();
        while let Some(line) = self.next_line().await {
            lines.push(line);
        }
        (lines, self.wait().await)
    }
}

/// Launches real processes on the tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct TokioLauncher {
    bin_dir: Option<PathBuf>,
}

impl TokioLauncher {
    pub fn new(bin_dir: Option<PathBuf>) -> Self {
        Self { bin_dir }
    }
}

#[async_trait]
impl ProcessLauncher for TokioLauncher {
    async fn launch(
        &self,
        program: &Path,
        args: &[String],
        cancel: CancellationToken,
    ) -> ProcessHandle {
        let mut cmd = command(program, self.bin_dir.as_deref());
        cmd.args(args);
        tracing::debug!("spawning {} {:?}", program.display(), args);
        spawn_streaming(cmd, &program.display().to_string(), cancel)
    }
}

fn spawn_streaming(
    mut cmd: tokio::process::Command,
    label: &str,
    cancel: CancellationToken,
) -> ProcessHandle {
    let (line_tx, line_rx) = mpsc::unbounded_channel();
    let (outcome_tx, outcome_rx) = oneshot::channel();

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    // Own process group, so cancelling reaches ffmpeg and the real
    // downloader behind a PyInstaller bootloader too.
    #[cfg(unix)]
    cmd.process_group(0);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            tracing::warn!("failed to start {}: {}", label, e);
            let _ = outcome_tx.send(ExecutionOutcome::SpawnFailed {
                message: e.to_string(),
            });
            return ProcessHandle::new(line_rx, outcome_rx, cancel);
        }
    };

    let stdout_task = child
        .stdout
        .take()
        .map(|out| tokio::spawn(pump_lines(out, OutputStream::Stdout, line_tx.clone())));
    let stderr_task = child
        .stderr
        .take()
        .map(|err| tokio::spawn(pump_lines(err, OutputStream::Stderr, line_tx.clone())));
    drop(line_tx);

    let pid = child.id();
    let token = cancel.clone();
    let label = label.to_string();
    tokio::spawn(async move {
        let started = std::time::Instant::now();
        let waited = tokio::select! {
            res = child.wait() => Some(res),
            _ = token.cancelled() => None,
        };

        let mut outcome = match waited {
            None => {
                terminate_tree(&mut child, pid, &label).await;
                ExecutionOutcome::Cancelled
            }
            Some(Ok(status)) if status.success() => ExecutionOutcome::Succeeded,
            Some(Ok(status)) => ExecutionOutcome::Failed {
                exit_code: status.code(),
                stderr: String::new(),
            },
            Some(Err(e)) => ExecutionOutcome::Failed {
                exit_code: None,
                stderr: e.to_string(),
            },
        };

        let _ = finish_reader(stdout_task).await;
        let stderr_tail = finish_reader(stderr_task).await;

        if let ExecutionOutcome::Failed { stderr, .. } = &mut outcome {
            if stderr.is_empty() {
                *stderr = stderr_tail.into_iter().collect::<Vec<_>>().join("\n");
            }
        }

        tracing::debug!("{} finished in {:?}: {:?}", label, started.elapsed(), outcome);
        let _ = outcome_tx.send(outcome);
    });

    ProcessHandle::new(line_rx, outcome_rx, cancel)
}

/// Stop the child and everything it started. On Unix the group gets
/// SIGINT first so yt-dlp can stop ffmpeg cleanly, then SIGKILL.
async fn terminate_tree(child: &mut tokio::process::Child, pid: Option<u32>, label: &str) {
    #[cfg(unix)]
    {
        if let Some(pid) = pid {
            signal_group("-INT", pid).await;
            if tokio::time::timeout(KILL_GRACE, child.wait()).await.is_err() {
                tracing::debug!("{} ignored SIGINT for {:?}", label, KILL_GRACE);
            }
            // Background children may outlive the group leader.
            signal_group("-KILL", pid).await;
        }
    }

    #[cfg(windows)]
    {
        if let Some(pid) = pid {
            let status = command("taskkill", None)
                .args(["/PID", &pid.to_string(), "/T", "/F"])
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;
            if let Err(e) = status {
                tracing::debug!("taskkill for {} failed: {}", label, e);
            }
        }
    }

    #[cfg(not(any(unix, windows)))]
    let _ = pid;

    if matches!(child.try_wait(), Ok(None)) {
        if let Err(e) = child.kill().await {
            tracing::warn!("failed to kill {}: {}", label, e);
        }
    }
}

#[cfg(unix)]
async fn signal_group(signal: &str, pgid: u32) {
    let status = tokio::process::Command::new("kill")
        .args([signal, "--", &format!("-{}", pgid)])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    // A non-zero exit means the group is already gone.
    if let Err(e) = status {
        tracing::warn!("could not run kill {} for group {}: {}", signal, pgid, e);
    }
}

async fn finish_reader(task: Option<JoinHandle<VecDeque<String>>>) -> VecDeque<String> {
    let Some(mut task) = task else {
        return VecDeque::new();
    };
    match tokio::time::timeout(READER_GRACE, &mut task).await {
        Ok(Ok(tail)) => tail,
        Ok(Err(e)) => {
            tracing::warn!("output reader failed: {}", e);
            VecDeque::new()
        }
        Err(_) => {
            tracing::debug!("output pipe still open after exit, closing stream");
            task.abort();
            VecDeque::new()
        }
    }
}

/// Forward complete lines (split on `\n` or `\r`) and keep the last few.
async fn pump_lines<R>(
    reader: R,
    stream: OutputStream,
    tx: mpsc::UnboundedSender<OutputLine>,
) -> VecDeque<String>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("{:?} read error: {}", stream, e);
                break;
            }
        }

        let text = String::from_utf8_lossy(&buf);
        for piece in text.split(['\r', '\n']) {
            let piece = piece.trim_end();
            if piece.trim().is_empty() {
                continue;
            }
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(piece.to_string());
            // The consumer may have stopped listening; keep draining the pipe anyway.
            let _ = tx.send(OutputLine {
                stream,
                text: piece.to_string(),
            });
        }
    }

    tail
}


#[cfg(all(test, unix))]
mod tests {
    use super::*;

    async fn sh(script: &str) -> ProcessHandle {
        TokioLauncher::default()
            .launch(
                Path::new("sh"),
                &["-c".to_string(), script.to_string()],
                CancellationToken::new(),
            )
            .await
    }

    fn texts(lines: &[OutputLine], stream: OutputStream) -> Vec<String> {
        lines
            .iter()
            .filter(|l| l.stream == stream)
            .map(|l| l.text.clone())
            .collect()
    }

    #[tokio::test]
    async fn streams_both_pipes_in_order() {
        let handle = sh("echo one; echo two; echo err1 >&2; echo three").await;
        let (lines, outcome) = handle.collect().await;

        assert_eq!(outcome, ExecutionOutcome::Succeeded);
        assert_eq!(texts(&lines, OutputStream::Stdout), ["one", "two", "three"]);
        assert_eq!(texts(&lines, OutputStream::Stderr), ["err1"]);
    }

    #[tokio::test]
    async fn non_zero_exit_carries_stderr() {
        let handle = sh("echo working; echo 'ERROR: oops' >&2; exit 3").await;
        let outcome = handle.wait().await;
        assert_eq!(
            outcome,
            ExecutionOutcome::Failed {
                exit_code: Some(3),
                stderr: "ERROR: oops".into(),
            }
        );
    }

    #[tokio::test]
    async fn missing_program_reports_spawn_failure() {
        let mut handle = TokioLauncher::default()
            .launch(
                Path::new("/definitely/not/a/real/yt-dlp"),
                &[],
                CancellationToken::new(),
            )
            .await;
        assert!(handle.next_line().await.is_none());
        assert!(matches!(
            handle.wait().await,
            ExecutionOutcome::SpawnFailed { .. }
        ));
    }

    #[tokio::test]
    async fn carriage_returns_split_lines() {
        let handle = sh("printf 'a\\rb\\nc\\n'").await;
        let (lines, outcome) = handle.collect().await;
        assert!(outcome.is_success());
        assert_eq!(texts(&lines, OutputStream::Stdout), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn cancel_kills_child_within_bound() {
        let mut handle = sh("echo started; sleep 30").await;
        let first = handle.next_line().await.map(|l| l.text);
        assert_eq!(first.as_deref(), Some("started"));

        handle.cancel();
        let outcome = tokio::time::timeout(Duration::from_secs(10), handle.collect())
            .await
            .expect("cancelled process must finish promptly");
        assert_eq!(outcome.1, ExecutionOutcome::Cancelled);
    }

    #[tokio::test]
    async fn external_token_cancels_too() {
        let token = CancellationToken::new();
        let handle = TokioLauncher::default()
            .launch(
                Path::new("sh"),
                &["-c".to_string(), "exec sleep 30".to_string()],
                token.clone(),
            )
            .await;
        token.cancel();
        let outcome = tokio::time::timeout(Duration::from_secs(10), handle.wait())
            .await
            .expect("cancelled process must finish promptly");
        assert_eq!(outcome, ExecutionOutcome::Cancelled);
    }

    #[tokio::test]
    async fn cancel_stops_background_children() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("written-after-cancel");
        let script = format!(
            "(sleep 3; touch '{}') & echo started; wait",
            marker.display()
        );
        let mut handle = sh(&script).await;
        let first = handle.next_line().await.map(|l| l.text);
        assert_eq!(first.as_deref(), Some("started"));

        handle.cancel();
        let (_, outcome) = tokio::time::timeout(Duration::from_secs(10), handle.collect())
            .await
            .expect("cancelled process must finish promptly");
        assert_eq!(outcome, ExecutionOutcome::Cancelled);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(!marker.exists(), "background child kept running after cancel");
    }

    #[tokio::test]
    async fn stderr_tail_is_bounded() {
        let handle = sh("i=0; while [ $i -lt 80 ]; do echo line$i >&2; i=$((i+1)); done; exit 1").await;
        match handle.wait().await {
            ExecutionOutcome::Failed { stderr, .. } => {
                let kept: Vec<&str> = stderr.lines().collect();
                assert_eq!(kept.len(), STDERR_TAIL_LINES);
                assert_eq!(kept.first(), Some(&"line30"));
                assert_eq!(kept.last(), Some(&"line79"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
