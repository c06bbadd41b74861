use super::{CommandOutput, ExecutionEnvironment, Toolchain};
use crate::error::ProvisionError;
use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};

const READ_CHUNK: usize = 8 * 1024;

/// Runs the real toolchain binary as a child process.
#[derive(Debug, Clone)]
pub struct ProcessToolchain {
    program: String,
    step_timeout: Duration,
}

impl ProcessToolchain {
    pub fn new(program: impl Into<String>, step_timeout: Duration) -> Self {
        Self {
            program: program.into(),
            step_timeout,
        }
    }
}

#[async_trait]
impl Toolchain for ProcessToolchain {
    async fn run(&self, workdir: &Path, env: &ExecutionEnvironment, args: &[&str]) -> CommandOutput {
        let command_line = std::iter::once(self.program.as_str())
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");

        let spawned = Command::new(&self.program)
            .args(args)
            .current_dir(workdir)
            .env_clear()
            .envs(env.iter())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(source) => {
                tracing::error!(command = %command_line, error = %source, "failed to start toolchain");
                return CommandOutput::failure(
                    String::new(),
                    ProvisionError::ProcessStart {
                        program: self.program.clone(),
                        source,
                    },
                );
            }
        };

        let mut combined = Vec::new();
        let waited =
            tokio::time::timeout(self.step_timeout, collect_combined(&mut child, &mut combined))
                .await;
        let text = String::from_utf8_lossy(&combined).into_owned();

        let result = match waited {
            Ok(Ok(status)) if status.success() => Ok(()),
            Ok(Ok(status)) => Err(ProvisionError::NonZeroExit {
                command: command_line,
                status,
            }),
            Ok(Err(source)) => Err(ProvisionError::ProcessWait {
                command: command_line,
                source,
            }),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(command = %command_line, error = %e, "failed to kill timed out toolchain");
                }
                Err(ProvisionError::Timeout {
                    command: command_line,
                    seconds: self.step_timeout.as_secs(),
                })
            }
        };

        CommandOutput { text, result }
    }
}

/// Drain stdout and stderr into one buffer in arrival order, then reap the child.
async fn collect_combined(child: &mut Child, combined: &mut Vec<u8>) -> std::io::Result<ExitStatus> {
    let missing = |name: &str| std::io::Error::other(format!("child {name} was not captured"));
    let mut stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
    let mut stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;

    let mut out_buf = vec![0u8; READ_CHUNK];
    let mut err_buf = vec![0u8; READ_CHUNK];
    let (mut out_open, mut err_open) = (true, true);

    while out_open || err_open {
        tokio::select! {
            read = stdout.read(&mut out_buf), if out_open => match read? {
                0 => out_open = false,
                n => combined.extend_from_slice(&out_buf[..n]),
            },
            read = stderr.read(&mut err_buf), if err_open => match read? {
                0 => err_open = false,
                n => combined.extend_from_slice(&err_buf[..n]),
            },
        }
    }

    child.wait().await
}
