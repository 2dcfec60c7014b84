//! Generator command invocation.

use crate::directive::Directive;
use crate::error::ExecError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tracing::{debug, warn};

/// External command behind a directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory: the directive's declaring directory
    pub dir: PathBuf,
    pub env: Vec<(String, String)>,
}

impl GeneratorCommand {
    /// Command for a directive, with the environment `go generate` provides.
    pub fn for_directive(directive: &Directive) -> Result<Self, ExecError> {
        let (program, args) = directive.command().ok_or(ExecError::EmptyCommand)?;
        let env = vec![
            ("GOFILE".to_string(), directive.file_name()),
            ("GOLINE".to_string(), directive.line.to_string()),
            (
                "GOPACKAGE".to_string(),
                directive.package.clone().unwrap_or_default(),
            ),
            ("DOLLAR".to_string(), "$".to_string()),
        ];
        Ok(Self {
            program,
            args,
            dir: directive.dir().to_path_buf(),
            env,
        })
    }
}

/// Runs generator commands. Success is the exit status alone.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &GeneratorCommand) -> Result<(), ExecError>;
}

/// Runs commands as child processes sharing the terminal.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill commands that run longer than `timeout`.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &GeneratorCommand) -> Result<(), ExecError> {
        debug!(program = %command.program, args = ?command.args, dir = %command.dir.display(), "Launching generator");
        let mut child = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .current_dir(&command.dir)
            .envs(command.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecError::Launch {
                program: command.program.clone(),
                reason: e.to_string(),
            })?;

        let waited = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(waited) => waited,
                Err(_) => {
                    warn!(program = %command.program, limit = ?limit, "Generator timed out; killing it");
                    let _ = child.kill().await;
                    return Err(ExecError::TimedOut {
                        program: command.program.clone(),
                        limit,
                    });
                }
            },
            None => child.wait().await,
        };

        let status = waited.map_err(|e| ExecError::Launch {
            program: command.program.clone(),
            reason: e.to_string(),
        })?;
        if status.success() {
            Ok(())
        } else {
            Err(ExecError::ExitStatus {
                program: command.program.clone(),
                status: status.to_string(),
            })
        }
    }
}
