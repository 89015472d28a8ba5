//! External transfer-agent invocation.
//!
//! The tool never moves bytes itself. A resolved target is handed to an
//! external process (aria2c) together with the headers the host expects;
//! only the process exit status is observed, progress output goes straight
//! to the operator's terminal.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, instrument};

use crate::resolver::ResolvedTarget;

/// Errors from invoking the transfer agent.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The agent process could not be spawned.
    #[error("failed to launch {program}: {source}")]
    Spawn {
        /// The agent binary name.
        program: String,
        /// The underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The agent exited with a failure status.
    #[error("{program} exited with {status} for {url}")]
    Failed {
        /// The agent binary name.
        program: String,
        /// The process exit status.
        status: std::process::ExitStatus,
        /// The URL whose transfer failed.
        url: String,
    },
}

/// Transfer-agent contract: fetch the resolved target into `dest_dir`.
///
/// Object-safe so the dispatcher can be exercised with stub agents.
#[async_trait]
pub trait DownloadAgent: Send + Sync {
    /// Transfers the target's bytes into `dest_dir`.
    async fn fetch(&self, target: &ResolvedTarget, dest_dir: &Path) -> Result<(), AgentError>;
}

/// aria2c-backed transfer agent.
#[derive(Debug, Clone)]
pub struct Aria2Agent {
    program: String,
    user_agent: String,
}

impl Aria2Agent {
    /// Creates an agent invoking `aria2c` from `PATH`.
    ///
    /// `user_agent` must match the one the resolution session used, or the
    /// host refuses the transfer.
    #[must_use]
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            program: "aria2c".to_string(),
            user_agent: user_agent.into(),
        }
    }

    /// Overrides the agent binary (tests use shell utilities).
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Argument vector for one transfer.
    ///
    /// `-c` resumes partial files. Certificate validation is disabled on
    /// purpose: the host's certificate chain is not trusted by stock agents.
    /// Revisit before pointing this at another host.
    fn build_args(&self, target: &ResolvedTarget, dest_dir: &Path) -> Vec<String> {
        let mut args = vec![
            target.final_url.clone(),
            "-c".to_string(),
            format!("--header=User-Agent: {}", self.user_agent),
            "--check-certificate=false".to_string(),
            format!("--dir={}", dest_dir.display()),
        ];
        if let Some(cookies) = target.cookie_header.as_deref()
            && !cookies.is_empty()
        {
            args.push(format!("--header=Cookie: {cookies}"));
        }
        args.push(format!("--header=Referer: {}", target.referer_url));
        args
    }
}

#[async_trait]
impl DownloadAgent for Aria2Agent {
    #[instrument(skip(self, target), fields(url = %target.final_url))]
    async fn fetch(&self, target: &ResolvedTarget, dest_dir: &Path) -> Result<(), AgentError> {
        let args = self.build_args(target, dest_dir);
        debug!(program = %self.program, "invoking transfer agent");
        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|source| AgentError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !status.success() {
            return Err(AgentError::Failed {
                program: self.program.clone(),
                status,
                url: target.final_url.clone(),
            });
        }
        Ok(())
    }
}
