//! Ollama process supervisor
//!
//! Guarantees a usable daemon at startup. If the daemon is already
//! reachable it is left alone; otherwise stale processes are cleared out, a
//! new daemon is spawned and polled until it answers. The supervisor is the
//! only owner of the spawned child.

use crate::config::SupervisorConfig;
use crate::error::AgentError;
use crate::inference::ConnectionProbe;
use crate::retry::{best_effort, Attempt, RetryError, RetryPolicy};
use crate::Result;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Child;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

pub mod command;
pub mod platform;

pub use command::NOISY_LOG_MARKER;
pub use platform::{CommandSpec, Platform, PlatformProfile};

use command::{pump_output, run_to_completion, CrashSlot, OutputStream};

/// A daemon process started by the supervisor. Dropping it kills the child.
pub struct DaemonHandle {
    child: Mutex<Child>,
    pid: Option<u32>,
    crash: CrashSlot,
}

impl DaemonHandle {
    fn spawn(spec: &CommandSpec) -> Result<Self> {
        let mut child = spec
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let crash = CrashSlot::default();

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pump_output(stdout, OutputStream::Stdout, crash.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump_output(stderr, OutputStream::Stderr, crash.clone()));
        }

        Ok(Self {
            pid: child.id(),
            child: Mutex::new(child),
            crash,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    async fn crash_report(&self) -> Option<String> {
        self.crash.read().await.clone()
    }

    async fn exit_status(&self) -> Option<ExitStatus> {
        self.child.lock().await.try_wait().ok().flatten()
    }

    async fn kill(&self) -> Result<()> {
        self.child.lock().await.kill().await?;
        Ok(())
    }

    /// SIGTERM first; kill once `grace` runs out
    async fn terminate(&self, grace: Duration) -> Result<()> {
        if self.exit_status().await.is_some() {
            return Ok(());
        }

        if self.request_stop() {
            let mut child = self.child.lock().await;
            if let Ok(status) = tokio::time::timeout(grace, child.wait()).await {
                let status = status?;
                debug!(%status, "Ollama exited after SIGTERM");
                return Ok(());
            }
        }

        warn!(pid = ?self.pid, "Ollama did not stop gracefully, killing it");
        self.kill().await
    }

    #[cfg(unix)]
    fn request_stop(&self) -> bool {
        let Some(pid) = self.pid else {
            return false;
        };

        // SAFETY: signals our own child, which is not reaped while we hold it
        let sent = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) } == 0;
        if !sent {
            debug!(error = %std::io::Error::last_os_error(), "Failed to send SIGTERM");
        }
        sent
    }

    #[cfg(not(unix))]
    fn request_stop(&self) -> bool {
        false
    }
}

pub struct ProcessSupervisor {
    profile: PlatformProfile,
    probe: Arc<dyn ConnectionProbe>,
    poll: RetryPolicy,
    shutdown_grace: Duration,
}

impl ProcessSupervisor {
    pub fn new(
        profile: PlatformProfile,
        probe: Arc<dyn ConnectionProbe>,
        config: &SupervisorConfig,
    ) -> Self {
        let profile = match &config.executable {
            Some(executable) => profile.with_executable(executable.clone()),
            None => profile,
        };

        Self {
            profile,
            probe,
            poll: config.poll,
            shutdown_grace: config.shutdown_grace,
        }
    }

    pub fn profile(&self) -> &PlatformProfile {
        &self.profile
    }

    /// `Ok(None)` when a daemon was already running (and is not ours to stop)
    pub async fn ensure_running(&self) -> Result<Option<DaemonHandle>> {
        if self.probe.verify_connection().await {
            info!("Ollama is already running, leaving it unsupervised");
            return Ok(None);
        }

        info!(platform = ?self.profile.platform, "Stopping existing Ollama processes...");
        self.release().await;

        info!(delay = ?self.profile.settle_delay, "Waiting for processes to clean up...");
        tokio::time::sleep(self.profile.settle_delay).await;

        info!(command = %self.profile.launch, "Starting new Ollama instance...");
        let handle = DaemonHandle::spawn(&self.profile.launch)?;
        debug!(pid = ?handle.pid(), "Ollama process spawned");

        let outcome = self
            .poll
            .run(|attempt| {
                let handle = &handle;
                async move { self.poll_once(handle, attempt).await }
            })
            .await;

        match outcome {
            Ok(()) => {
                info!(pid = ?handle.pid(), "Successfully connected to Ollama");
                Ok(Some(handle))
            }
            Err(RetryError::Exhausted { attempts }) => {
                error!(attempts, "Failed to connect to Ollama after multiple attempts");
                Err(AgentError::DaemonStartupTimeout { attempts })
            }
            Err(RetryError::Aborted(e)) => {
                error!(error = %e, "Server encountered an error");
                Err(e)
            }
        }
    }

    async fn poll_once(&self, handle: &DaemonHandle, attempt: u32) -> Attempt<(), AgentError> {
        if let Some(report) = handle.crash_report().await {
            return Attempt::Abort(AgentError::DaemonCrashed(report));
        }

        if self.probe.verify_connection().await {
            return Attempt::Ready(());
        }

        if let Some(status) = handle.exit_status().await {
            return Attempt::Abort(AgentError::DaemonCrashed(format!(
                "daemon exited early with {}",
                status
            )));
        }

        info!(
            attempt,
            max_attempts = self.poll.max_attempts,
            "Waiting for Ollama to be ready..."
        );
        Attempt::Pending
    }

    /// Stop an owned daemon and free its port. Never fails.
    pub async fn shutdown(&self, handle: Option<DaemonHandle>) {
        let Some(handle) = handle else {
            debug!("No supervised Ollama process to stop");
            return;
        };

        info!(pid = ?handle.pid(), "Stopping supervised Ollama process");
        if best_effort("stop daemon", handle.terminate(self.shutdown_grace))
            .await
            .is_none()
        {
            warn!(pid = ?handle.pid(), "Could not stop Ollama process directly");
        }
        drop(handle);

        self.release().await;
        tokio::time::sleep(self.shutdown_grace).await;
    }

    /// Run every termination step; "no such process" is expected
    async fn release(&self) {
        for step in &self.profile.termination {
            let label = step.to_string();
            best_effort(&label, run_to_completion(step)).await;
        }
    }
}
