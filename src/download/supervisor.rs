//! Download process supervision
//!
//! Owns at most one live external download process. The process's combined
//! stdout/stderr is streamed line by line; every line is published verbatim
//! and scanned for a progress percentage. Cancellation is cooperative:
//! graceful termination first, a bounded wait, then a forced kill.

use crate::core::catalog::DownloadKind;
use crate::error::VdlError;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

lazy_static! {
    static ref PERCENT_RE: Regex = Regex::new(r"(\d+(?:\.\d+)?)%").unwrap();
}

/// How long a cancelled process may take to exit before being force-killed
const GRACEFUL_WAIT: Duration = Duration::from_secs(5);

/// One download attempt; exists only for the duration of the attempt
#[derive(Debug, Clone)]
pub struct DownloadJob {
    /// Source video URL
    pub url: String,
    /// Video or audio-only download
    pub kind: DownloadKind,
    /// Chosen format id from the catalog
    pub format_id: String,
    /// Existing directory the file is written into
    pub output_dir: PathBuf,
}

/// Event stream published while a job runs
#[derive(Debug, Clone)]
pub enum DownloadEvent {
    /// One verbatim output line from the tool
    Log(String),
    /// Updated progress fraction in `0.0..=1.0` and the line that set it
    Progress { fraction: f32, status: String },
    /// Terminal outcome; the supervisor is idle again once this arrives
    Finished(DownloadOutcome),
}

/// Terminal state of one download attempt
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadOutcome {
    Succeeded,
    Failed(String),
    Cancelled,
}

/// Extract a progress fraction from one output line
///
/// Lines without a percent token leave progress unchanged, which is why
/// this returns `None` rather than zero.
pub fn progress_fraction(line: &str) -> Option<f32> {
    if !line.contains('%') {
        return None;
    }
    PERCENT_RE
        .captures(line)
        .and_then(|caps| caps[1].parse::<f32>().ok())
        .map(|percent| percent / 100.0)
}

/// Build the tool argument vector for a job
pub fn build_args(job: &DownloadJob) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();

    match job.kind {
        DownloadKind::Video => {
            // Chosen video stream plus the best audio track as fallback.
            args.push("-f".to_string());
            args.push(format!("{}+bestaudio/best", job.format_id));
        }
        DownloadKind::Audio => {
            args.extend(
                ["-f", "bestaudio", "--extract-audio", "--audio-format", "mp3"]
                    .map(String::from),
            );
        }
    }

    args.extend(
        [
            "--newline",
            "--embed-subs",
            "--sub-langs",
            "all",
            "--embed-metadata",
            "--embed-thumbnail",
            "-o",
        ]
        .map(String::from),
    );
    args.push(
        job.output_dir
            .join("%(title)s.%(ext)s")
            .to_string_lossy()
            .into_owned(),
    );
    args.push(job.url.clone());
    args
}

struct ActiveDownload {
    cancel: CancellationToken,
}

/// Supervises a single external download process at a time
pub struct DownloadSupervisor {
    tool_path: PathBuf,
    active: Arc<Mutex<Option<ActiveDownload>>>,
}

impl DownloadSupervisor {
    /// Create a supervisor that spawns the tool at `tool_path`
    pub fn new(tool_path: PathBuf) -> Self {
        Self {
            tool_path,
            active: Arc::new(Mutex::new(None)),
        }
    }

    /// Check whether a job is currently running
    pub fn is_running(&self) -> bool {
        self.active.lock().unwrap().is_some()
    }

    /// Start a download; single-flight, so a running job rejects new starts
    ///
    /// Returns the event receiver for this job. The job terminates with a
    /// [`DownloadEvent::Finished`] after which the supervisor is idle again.
    pub fn start(
        &self,
        job: DownloadJob,
    ) -> Result<mpsc::UnboundedReceiver<DownloadEvent>, VdlError> {
        if job.format_id.is_empty() {
            return Err(VdlError::MissingFormat);
        }
        if !job.output_dir.is_dir() {
            return Err(VdlError::MissingOutputDir(job.output_dir.clone()));
        }

        let cancel = CancellationToken::new();
        {
            let mut active = self.active.lock().unwrap();
            if active.is_some() {
                return Err(VdlError::DownloadInProgress);
            }
            *active = Some(ActiveDownload {
                cancel: cancel.clone(),
            });
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let slot = Arc::clone(&self.active);
        let program = self.tool_path.clone();
        let args = build_args(&job);
        info!(
            "starting {} download, format {} into {:?}",
            job.kind.as_str(),
            job.format_id,
            job.output_dir
        );

        tokio::spawn(async move {
            let outcome = run_download(&program, &args, &tx, &cancel).await;
            // The handle is cleared on every terminal path, before the
            // terminal event is observable.
            slot.lock().unwrap().take();
            let _ = tx.send(DownloadEvent::Finished(outcome));
        });

        Ok(rx)
    }

    /// Request cancellation of the running job; no-op when idle
    pub fn cancel(&self) {
        if let Some(active) = self.active.lock().unwrap().as_ref() {
            info!("cancelling running download");
            active.cancel.cancel();
        }
    }
}

/// Spawn the process and pump its combined output until exit or cancel
async fn run_download(
    program: &Path,
    args: &[String],
    tx: &mpsc::UnboundedSender<DownloadEvent>,
    cancel: &CancellationToken,
) -> DownloadOutcome {
    let mut child = match Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return DownloadOutcome::Failed(format!("failed to start tool: {}", e)),
    };

    let stdout = match child.stdout.take() {
        Some(stdout) => stdout,
        None => return DownloadOutcome::Failed("failed to capture stdout".to_string()),
    };
    let stderr = match child.stderr.take() {
        Some(stderr) => stderr,
        None => return DownloadOutcome::Failed("failed to capture stderr".to_string()),
    };

    let mut out_lines = BufReader::new(stdout).lines();
    let mut err_lines = BufReader::new(stderr).lines();
    let mut out_done = false;
    let mut err_done = false;

    // Best-available diagnostics for the failure event.
    let mut error_line: Option<String> = None;
    let mut last_line: Option<String> = None;

    let mut handle_line = |line: String| {
        if let Some(fraction) = progress_fraction(&line) {
            let _ = tx.send(DownloadEvent::Progress {
                fraction,
                status: line.clone(),
            });
        }
        if !line.trim().is_empty() {
            if error_line.is_none() && line.contains("ERROR") {
                error_line = Some(line.clone());
            }
            last_line = Some(line.clone());
        }
        let _ = tx.send(DownloadEvent::Log(line));
    };

    while !(out_done && err_done) {
        tokio::select! {
            _ = cancel.cancelled() => {
                return terminate(child).await;
            }
            line = out_lines.next_line(), if !out_done => match line {
                Ok(Some(line)) => handle_line(line),
                Ok(None) => out_done = true,
                Err(e) => {
                    warn!("error reading tool stdout: {}", e);
                    out_done = true;
                }
            },
            line = err_lines.next_line(), if !err_done => match line {
                Ok(Some(line)) => handle_line(line),
                Ok(None) => err_done = true,
                Err(e) => {
                    warn!("error reading tool stderr: {}", e);
                    err_done = true;
                }
            },
        }
    }
    drop(handle_line);

    match child.wait().await {
        Ok(status) if status.success() => {
            let _ = tx.send(DownloadEvent::Progress {
                fraction: 1.0,
                status: "Download completed".to_string(),
            });
            DownloadOutcome::Succeeded
        }
        Ok(status) => {
            let diagnostic = error_line
                .or(last_line)
                .unwrap_or_else(|| "no output captured".to_string());
            DownloadOutcome::Failed(format!("tool exited with {}: {}", status, diagnostic))
        }
        Err(e) => DownloadOutcome::Failed(format!("failed to wait for tool: {}", e)),
    }
}

/// Graceful termination, bounded wait, then forced kill
async fn terminate(mut child: Child) -> DownloadOutcome {
    request_graceful_stop(&mut child);

    match tokio::time::timeout(GRACEFUL_WAIT, child.wait()).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => warn!("wait after termination request failed: {}", e),
        Err(_) => {
            warn!("process ignored termination request; force killing");
            if let Err(e) = child.kill().await {
                warn!("force kill failed: {}", e);
            }
        }
    }
    DownloadOutcome::Cancelled
}

#[cfg(unix)]
fn request_graceful_stop(child: &mut Child) {
    if let Some(pid) = child.id() {
        unsafe {
            libc::kill(pid as i32, libc::SIGTERM);
        }
    }
}

#[cfg(not(unix))]
fn request_graceful_stop(child: &mut Child) {
    let _ = child.start_kill();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(format_id: &str, output_dir: PathBuf) -> DownloadJob {
        DownloadJob {
            url: "https://example.com/watch?v=abc".to_string(),
            kind: DownloadKind::Video,
            format_id: format_id.to_string(),
            output_dir,
        }
    }

    #[test]
    fn test_progress_fraction() {
        let fraction = progress_fraction("[download]  42.7% of 10MiB at 1.2MiB/s").unwrap();
        assert!((fraction - 0.427).abs() < 1e-6);
        assert_eq!(progress_fraction("[download] 100% of 10MiB"), Some(1.0));
        assert_eq!(progress_fraction("[Merger] Merging formats"), None);
        assert_eq!(progress_fraction("stray % sign"), None);
    }

    #[test]
    fn test_build_args_video() {
        let args = build_args(&job("137", PathBuf::from("/tmp/out")));
        assert_eq!(args[0], "-f");
        assert_eq!(args[1], "137+bestaudio/best");
        assert!(args.contains(&"--embed-subs".to_string()));
        assert!(args.contains(&"--embed-thumbnail".to_string()));
        assert!(args.contains(&"/tmp/out/%(title)s.%(ext)s".to_string()));
        assert_eq!(args.last().unwrap(), "https://example.com/watch?v=abc");
    }

    #[test]
    fn test_build_args_audio() {
        let mut j = job("140", PathBuf::from("/tmp/out"));
        j.kind = DownloadKind::Audio;
        let args = build_args(&j);
        assert_eq!(&args[..5], &["-f", "bestaudio", "--extract-audio", "--audio-format", "mp3"]);
        assert!(args.contains(&"--embed-metadata".to_string()));
    }

    #[test]
    fn test_start_rejects_empty_format() {
        let supervisor = DownloadSupervisor::new(PathBuf::from("true"));
        let dir = tempfile::tempdir().unwrap();
        let result = supervisor.start(job("", dir.path().to_path_buf()));
        assert!(matches!(result, Err(VdlError::MissingFormat)));
    }

    #[test]
    fn test_start_rejects_missing_output_dir() {
        let supervisor = DownloadSupervisor::new(PathBuf::from("true"));
        let result = supervisor.start(job("137", PathBuf::from("/definitely/not/here")));
        assert!(matches!(result, Err(VdlError::MissingOutputDir(_))));
    }

    #[test]
    fn test_cancel_with_no_job_is_noop() {
        let supervisor = DownloadSupervisor::new(PathBuf::from("true"));
        supervisor.cancel();
        assert!(!supervisor.is_running());
    }

    #[cfg(unix)]
    fn fake_tool(dir: &std::path::Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-tool");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[cfg(unix)]
    async fn drain(mut rx: mpsc::UnboundedReceiver<DownloadEvent>) -> Vec<DownloadEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_successful_job_ends_at_full_progress() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(
            dir.path(),
            "printf '[download]  50.0%% of 10MiB\\n'; printf 'done\\n'; exit 0",
        );

        let supervisor = DownloadSupervisor::new(tool);
        let rx = supervisor.start(job("137", dir.path().to_path_buf())).unwrap();
        let events = drain(rx).await;

        let fractions: Vec<f32> = events
            .iter()
            .filter_map(|e| match e {
                DownloadEvent::Progress { fraction, .. } => Some(*fraction),
                _ => None,
            })
            .collect();
        assert_eq!(fractions, vec![0.5, 1.0]);
        assert!(matches!(
            events.last(),
            Some(DownloadEvent::Finished(DownloadOutcome::Succeeded))
        ));
        assert!(!supervisor.is_running());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_job_carries_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(
            dir.path(),
            "printf 'ERROR: video unavailable\\n' >&2; exit 3",
        );

        let supervisor = DownloadSupervisor::new(tool);
        let rx = supervisor.start(job("137", dir.path().to_path_buf())).unwrap();
        let events = drain(rx).await;

        match events.last() {
            Some(DownloadEvent::Finished(DownloadOutcome::Failed(message))) => {
                assert!(message.contains("video unavailable"));
            }
            other => panic!("expected failure outcome, got {:?}", other),
        }
        assert!(!supervisor.is_running());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_second_start_while_running_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(dir.path(), "sleep 30");

        let supervisor = DownloadSupervisor::new(tool);
        let rx = supervisor.start(job("137", dir.path().to_path_buf())).unwrap();
        assert!(supervisor.is_running());

        let second = supervisor.start(job("136", dir.path().to_path_buf()));
        assert!(matches!(second, Err(VdlError::DownloadInProgress)));
        assert!(supervisor.is_running());

        supervisor.cancel();
        let events = drain(rx).await;
        assert!(matches!(
            events.last(),
            Some(DownloadEvent::Finished(DownloadOutcome::Cancelled))
        ));
        assert!(!supervisor.is_running());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_escalates_to_forced_kill() {
        let dir = tempfile::tempdir().unwrap();
        // Ignores the graceful termination signal, forcing the escalation.
        let tool = fake_tool(dir.path(), "trap '' TERM\nsleep 30");

        let supervisor = DownloadSupervisor::new(tool);
        let rx = supervisor.start(job("137", dir.path().to_path_buf())).unwrap();

        // Give the process a moment to install its trap before cancelling.
        tokio::time::sleep(Duration::from_millis(300)).await;
        supervisor.cancel();

        let events = drain(rx).await;
        assert!(matches!(
            events.last(),
            Some(DownloadEvent::Finished(DownloadOutcome::Cancelled))
        ));
        assert!(!supervisor.is_running());
    }
}
