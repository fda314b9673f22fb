//! Shutdown hook that runs an external command.

use async_trait::async_trait;
use tokio::process::Command;

use crate::host::{HookError, ShutdownHook};

/// Runs `program args...`; a non-zero exit status is a failed request.
#[derive(Debug, Clone)]
pub struct CommandShutdownHook {
    program: String,
    args: Vec<String>,
}

impl CommandShutdownHook {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Build from an argv list such as `hook.command`. Returns `None` when empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program.clone(), args.to_vec()))
    }
}

#[async_trait]
impl ShutdownHook for CommandShutdownHook {
    async fn request_proxy_shutdown(&self) -> Result<(), HookError> {
        tracing::info!(program = %self.program, args = ?self.args, "Running shutdown command");
        let status = Command::new(&self.program)
            .args(&self.args)
            // A timed-out hook drops this future; take the child down with it.
            .kill_on_drop(true)
            .status()
            .await?;

        if status.success() {
            Ok(())
        } else {
            Err(HookError::Rejected(format!("{} exited with {}", self.program, status)))
        }
    }
}
