//! External validation commands
//!
//! A recipe may declare a `preInstall.requireAtDiscovery` command. It runs
//! through a shell with the host snapshot injected as environment variables,
//! and its exit status decides the recipe's fate:
//!
//! | Exit status | Result |
//! |---|---|
//! | 0 | [`ExecutionResult::Passed`] |
//! | [`DETECTED_EXIT_CODE`] | [`ExecutionResult::Detected`] |
//! | any other code | [`ExecutionResult::Rejected`] |
//! | spawn error, signal, cancellation, timeout | [`ExecutionResult::Failed`] |
//!
//! # Environment Variables
//!
//! - `PREFLIGHT_OS`, `PREFLIGHT_PLATFORM`, `PREFLIGHT_PLATFORM_VERSION`,
//!   `PREFLIGHT_KERNEL_ARCH`: host facts
//! - `PREFLIGHT_RECIPE_NAME`: the recipe being validated
//! - `PREFLIGHT_MATCHED_PROCESSES`: JSON array of processes matched by the
//!   recipe's patterns
//! - `PREFLIGHT_DISCOVERED_PROCESSES`: JSON array of every discovered process

use std::collections::BTreeMap;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use preflight_core::{DiscoveredProcess, FilterSettings, HostSnapshot, Recipe};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

pub use preflight_core::config::DEFAULT_DETECTED_EXIT_CODE as DETECTED_EXIT_CODE;

/// Bytes kept from each of stdout and stderr; the rest is read and discarded
pub const MAX_CAPTURED_BYTES: usize = 64 * 1024;

/// How long output is still read after the command exits
pub const DEFAULT_OUTPUT_GRACE: Duration = Duration::from_millis(500);

pub const ENV_OS: &str = "PREFLIGHT_OS";
pub const ENV_PLATFORM: &str = "PREFLIGHT_PLATFORM";
pub const ENV_PLATFORM_VERSION: &str = "PREFLIGHT_PLATFORM_VERSION";
pub const ENV_KERNEL_ARCH: &str = "PREFLIGHT_KERNEL_ARCH";
pub const ENV_RECIPE_NAME: &str = "PREFLIGHT_RECIPE_NAME";
pub const ENV_MATCHED_PROCESSES: &str = "PREFLIGHT_MATCHED_PROCESSES";
pub const ENV_DISCOVERED_PROCESSES: &str = "PREFLIGHT_DISCOVERED_PROCESSES";

/// Why a validation command could not produce a verdict
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("failed to start validation command: {0}")]
    Spawn(String),

    #[error("failed to wait for validation command: {0}")]
    Wait(String),

    #[error("validation command was terminated by a signal")]
    Terminated,

    #[error("validation was cancelled")]
    Cancelled,

    #[error("validation timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}

impl ValidationFailure {
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Classified result of running a validation command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionResult {
    /// Exit code 0, or no command declared
    Passed,
    /// The software is present but fails a stricter condition
    Detected { exit_code: i32, output: String },
    /// The host does not meet the prerequisites
    Rejected { exit_code: i32, output: String },
    /// The check itself broke
    Failed(ValidationFailure),
}

/// Host facts handed to a validation command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostContext {
    env: BTreeMap<String, String>,
}

impl HostContext {
    /// Build the context for one recipe
    pub fn new(recipe: &Recipe, host: &HostSnapshot, matched: &[&DiscoveredProcess]) -> Self {
        let mut env = BTreeMap::new();
        env.insert(ENV_OS.to_string(), host.os.clone());
        env.insert(ENV_PLATFORM.to_string(), host.platform.clone());
        env.insert(
            ENV_PLATFORM_VERSION.to_string(),
            host.platform_version.clone(),
        );
        env.insert(ENV_KERNEL_ARCH.to_string(), host.kernel_arch.clone());
        env.insert(ENV_RECIPE_NAME.to_string(), recipe.name.clone());
        env.insert(ENV_MATCHED_PROCESSES.to_string(), processes_json(matched));
        env.insert(
            ENV_DISCOVERED_PROCESSES.to_string(),
            processes_json(&host.discovered_processes),
        );

        Self { env }
    }

    /// Environment variables for the command
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.env.get(key).map(String::as_str)
    }
}

fn processes_json<T: serde::Serialize>(processes: &[T]) -> String {
    serde_json::to_string(processes).unwrap_or_else(|_| "[]".to_string())
}

/// Runs validation commands and classifies their exit status
#[derive(Debug, Clone)]
pub struct ValidationRunner {
    /// Shell program followed by its flags; the command is appended last
    shell: Vec<String>,

    /// Exit code classified as detected-but-unsupported
    detected_exit_code: i32,

    /// Optional bound on a single command
    timeout: Option<Duration>,

    /// Extra environment from configuration
    extra_env: BTreeMap<String, String>,

    /// Bound on reading output once the command has exited
    output_grace: Duration,
}

impl Default for ValidationRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationRunner {
    /// Create a runner with the platform's default shell
    pub fn new() -> Self {
        Self {
            shell: default_shell(),
            detected_exit_code: DETECTED_EXIT_CODE,
            timeout: None,
            extra_env: BTreeMap::new(),
            output_grace: DEFAULT_OUTPUT_GRACE,
        }
    }

    /// Create a runner from configuration
    pub fn from_settings(settings: &FilterSettings) -> Self {
        let mut runner = Self::new()
            .with_detected_exit_code(settings.detected_exit_code)
            .with_env(settings.env.clone());

        if let Some(shell) = &settings.shell {
            runner = runner.with_shell(shell.clone());
        }
        if let Some(timeout) = settings.validation_timeout() {
            runner = runner.with_timeout(timeout);
        }

        runner
    }

    pub fn with_detected_exit_code(mut self, code: i32) -> Self {
        self.detected_exit_code = code;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Use a different shell; ignored when empty
    pub fn with_shell(mut self, shell: Vec<String>) -> Self {
        if !shell.is_empty() {
            self.shell = shell;
        }
        self
    }

    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.extra_env.extend(env);
        self
    }

    pub fn with_output_grace(mut self, grace: Duration) -> Self {
        self.output_grace = grace;
        self
    }

    pub fn detected_exit_code(&self) -> i32 {
        self.detected_exit_code
    }

    /// Classify a process exit code
    pub fn classify(&self, exit_code: i32, output: String) -> ExecutionResult {
        if exit_code == 0 {
            ExecutionResult::Passed
        } else if exit_code == self.detected_exit_code {
            ExecutionResult::Detected { exit_code, output }
        } else {
            ExecutionResult::Rejected { exit_code, output }
        }
    }

    /// Run a validation command
    ///
    /// Returns promptly with [`ValidationFailure::Cancelled`] once `token` is
    /// cancelled; the command and anything it started are killed first.
    /// Output is read for at most the output grace period after the command
    /// exits, since a detached descendant may hold its pipes open.
    pub async fn run(
        &self,
        token: &CancellationToken,
        command: &str,
        context: &HostContext,
    ) -> ExecutionResult {
        let command = command.trim();
        if command.is_empty() {
            return ExecutionResult::Passed;
        }
        if token.is_cancelled() {
            return ExecutionResult::Failed(ValidationFailure::Cancelled);
        }

        let started = Instant::now();
        let mut child = match self.spawn(command, context) {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to spawn validation command: {}", e);
                return ExecutionResult::Failed(ValidationFailure::Spawn(e.to_string()));
            }
        };

        let mut output = OutputCapture::start(&mut child.inner);

        let status = tokio::select! {
            status = child.wait() => status,
            _ = token.cancelled() => {
                debug!("Validation cancelled, terminating command");
                child.terminate().await;
                output.abort();
                return ExecutionResult::Failed(ValidationFailure::Cancelled);
            }
            _ = deadline(self.timeout) => {
                warn!(
                    "Validation command timed out after {:?}",
                    self.timeout.unwrap_or_default()
                );
                child.terminate().await;
                output.abort();
                return self.timed_out();
            }
        };

        let status = match status {
            Ok(status) => status,
            Err(e) => {
                output.abort();
                return ExecutionResult::Failed(ValidationFailure::Wait(e.to_string()));
            }
        };

        let Some(exit_code) = status.code() else {
            output.abort();
            return ExecutionResult::Failed(ValidationFailure::Terminated);
        };

        let remaining = self
            .timeout
            .map(|timeout| timeout.saturating_sub(started.elapsed()));
        tokio::select! {
            _ = output.finish() => {}
            _ = token.cancelled() => {
                debug!("Validation cancelled while reading output");
                output.abort();
                return ExecutionResult::Failed(ValidationFailure::Cancelled);
            }
            _ = deadline(remaining) => {
                warn!("Validation output still open when the timeout expired");
                output.abort();
                return self.timed_out();
            }
            _ = tokio::time::sleep(self.output_grace) => {
                debug!(
                    "Output still open {:?} after exit, using what was captured",
                    self.output_grace
                );
                output.abort();
            }
        }

        debug!("Validation command exited with code {}", exit_code);
        self.classify(exit_code, output.message())
    }

    fn timed_out(&self) -> ExecutionResult {
        ExecutionResult::Failed(ValidationFailure::TimedOut(
            self.timeout.unwrap_or_default(),
        ))
    }

    fn spawn(&self, command: &str, context: &HostContext) -> std::io::Result<GuardedChild> {
        let (program, flags) = self
            .shell
            .split_first()
            .ok_or_else(|| std::io::Error::other("no shell configured"))?;

        let mut cmd = Command::new(program);
        cmd.args(flags)
            .arg(command)
            .envs(&self.extra_env)
            .envs(context.env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        debug!("Running validation command: {}", command);
        cmd.spawn().map(GuardedChild::new)
    }
}

fn default_shell() -> Vec<String> {
    if cfg!(windows) {
        vec![
            "powershell".to_string(),
            "-NoProfile".to_string(),
            "-NonInteractive".to_string(),
            "-Command".to_string(),
        ]
    } else {
        vec!["sh".to_string(), "-c".to_string()]
    }
}

async fn deadline(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending().await,
    }
}

/// Bytes retained from one pipe, shared with its reader task
#[derive(Debug, Clone, Default)]
struct CapturedBytes(Arc<Mutex<Vec<u8>>>);

impl CapturedBytes {
    /// Keep what fits under [`MAX_CAPTURED_BYTES`] and discard the rest
    fn append(&self, bytes: &[u8]) {
        let mut buf = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        let room = MAX_CAPTURED_BYTES.saturating_sub(buf.len());
        buf.extend_from_slice(&bytes[..bytes.len().min(room)]);
    }

    fn text(&self) -> String {
        let buf = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&buf).trim().to_string()
    }
}

/// Reads stdout and stderr of a running command in background tasks
struct OutputCapture {
    stdout: CapturedBytes,
    stderr: CapturedBytes,
    readers: Vec<JoinHandle<()>>,
}

impl OutputCapture {
    fn start(child: &mut Child) -> Self {
        let stdout = CapturedBytes::default();
        let stderr = CapturedBytes::default();
        let readers = vec![
            tokio::spawn(read_pipe(child.stdout.take(), stdout.clone())),
            tokio::spawn(read_pipe(child.stderr.take(), stderr.clone())),
        ];
        Self {
            stdout,
            stderr,
            readers,
        }
    }

    /// Wait for both pipes to reach EOF
    async fn finish(&mut self) {
        for reader in &mut self.readers {
            let _ = reader.await;
        }
    }

    fn abort(&self) {
        for reader in &self.readers {
            reader.abort();
        }
    }

    /// Operator message: stderr first, then stdout
    fn message(&self) -> String {
        let stderr = self.stderr.text();
        if stderr.is_empty() {
            self.stdout.text()
        } else {
            stderr
        }
    }
}

/// Drain a pipe to EOF so the writer never blocks on a full pipe
async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>, captured: CapturedBytes) {
    let Some(mut pipe) = pipe else {
        return;
    };
    let mut chunk = [0u8; 8192];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => captured.append(&chunk[..n]),
        }
    }
}

/// Child process that is leader of its own process group
///
/// The whole group is killed when the guard is dropped, so a dropped
/// validation future does not leave the command's descendants running.
/// The group is only ever signalled while the leader is unreaped, which
/// keeps the group id from being handed to another process.
struct GuardedChild {
    inner: Child,
    #[cfg(unix)]
    pgid: Option<i32>,
}

impl GuardedChild {
    fn new(inner: Child) -> Self {
        Self {
            #[cfg(unix)]
            pgid: inner.id().and_then(|id| i32::try_from(id).ok()),
            inner,
        }
    }

    /// Wait for the leader to exit, killing whatever it left in its group
    #[cfg(target_os = "linux")]
    async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        if let Some(pgid) = self.pgid {
            wait_exited(pgid).await?;
            // leader is a zombie here, so the group id is still ours
            self.kill_group();
        }
        self.inner.wait().await
    }

    /// Wait for the leader to exit
    ///
    /// Without a way to wait without reaping, leftovers in the group are
    /// not signalled after a normal exit.
    #[cfg(not(target_os = "linux"))]
    async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        let status = self.inner.wait().await;
        self.forget_group();
        status
    }

    /// Kill the process group and reap the leader
    async fn terminate(&mut self) {
        self.kill_group();
        let _ = self.inner.kill().await;
    }

    #[cfg(unix)]
    fn kill_group(&mut self) {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        if let Some(pgid) = self.pgid.take() {
            // ESRCH means the group is already gone
            let _ = killpg(Pid::from_raw(pgid), Signal::SIGKILL);
        }
    }

    #[cfg(not(unix))]
    fn kill_group(&mut self) {}

    #[cfg(all(unix, not(target_os = "linux")))]
    fn forget_group(&mut self) {
        self.pgid = None;
    }

    #[cfg(not(unix))]
    fn forget_group(&mut self) {}
}

impl Drop for GuardedChild {
    fn drop(&mut self) {
        self.kill_group();
    }
}

/// Resolve once `pid` has exited, leaving it unreaped
#[cfg(target_os = "linux")]
async fn wait_exited(pid: i32) -> std::io::Result<()> {
    use nix::errno::Errno;
    use nix::sys::wait::{waitid, Id, WaitPidFlag, WaitStatus};
    use nix::unistd::Pid;
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigchld = signal(SignalKind::child())?;
    let flags = WaitPidFlag::WEXITED | WaitPidFlag::WNOWAIT | WaitPidFlag::WNOHANG;
    loop {
        match waitid(Id::Pid(Pid::from_raw(pid)), flags) {
            Ok(WaitStatus::StillAlive) | Err(Errno::EINTR) => {}
            Ok(_) => return Ok(()),
            Err(e) => return Err(e.into()),
        }
        sigchld.recv().await;
    }
}
