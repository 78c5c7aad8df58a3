//! Running platform commands and wiring up daemon output

use super::platform::CommandSpec;
use crate::error::AgentError;
use crate::Result;
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Daemon output lines containing this are too chatty to log
pub const NOISY_LOG_MARKER: &str = "llama_";

/// First error line seen on the daemon's stderr
pub type CrashSlot = Arc<RwLock<Option<String>>>;

/// Run a command to completion, discarding its output
pub async fn run_to_completion(spec: &CommandSpec) -> Result<()> {
    let status = spec
        .to_command()
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await?;

    if status.success() {
        Ok(())
    } else {
        Err(AgentError::CommandFailed(format!("`{}` exited with {}", spec, status)))
    }
}

#[derive(Debug, Clone, Copy)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Log each line of a daemon stream; stderr error lines fill `crash`.
/// Reads until EOF so the child never blocks on a full pipe, even when a
/// line is not valid UTF-8.
pub async fn pump_output<R>(reader: R, stream: OutputStream, crash: CrashSlot)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(?stream, error = %e, "Stopped reading Ollama output");
                break;
            }
        }

        let line = String::from_utf8_lossy(&buf);
        let message = line.trim();
        if message.is_empty() || message.contains(NOISY_LOG_MARKER) {
            continue;
        }

        match stream {
            OutputStream::Stdout => info!(target: "ollama", "{}", message),
            OutputStream::Stderr if message.contains("error") => {
                error!(target: "ollama", "{}", message);
                crash.write().await.get_or_insert_with(|| message.to_string());
            }
            OutputStream::Stderr => debug!(target: "ollama", "{}", message),
        }
    }

    debug!(?stream, "Ollama output closed");
}
