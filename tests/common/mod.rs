#![allow(dead_code)]

use async_trait::async_trait;
use planbox::error::ProvisionError;
use planbox::pipeline::Provisioner;
use planbox::render::DOCUMENT_FILE;
use planbox::sandbox::{CommandOutput, ExecutionEnvironment, Toolchain};
use planbox::template::TemplateRegistry;
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// What the fake saw on one invocation.
#[derive(Debug, Clone)]
pub struct Call {
    pub args: Vec<String>,
    pub workdir: PathBuf,
    pub env: BTreeMap<String, String>,
    pub document: Option<String>,
}

enum Scripted {
    Ok,
    ExitFailure,
    Error(ProvisionError),
}

/// Toolchain double that replays scripted outputs and records every call.
#[derive(Default)]
pub struct ScriptedToolchain {
    script: Mutex<VecDeque<(String, Scripted)>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_ok(self, text: &str) -> Self {
        self.push(text, Scripted::Ok)
    }

    /// Next run exits non-zero after printing `text`.
    pub fn then_fail(self, text: &str) -> Self {
        self.push(text, Scripted::ExitFailure)
    }

    /// Next run fails with exactly `error`.
    pub fn then_error(self, text: &str, error: ProvisionError) -> Self {
        self.push(text, Scripted::Error(error))
    }

    fn push(self, text: &str, outcome: Scripted) -> Self {
        self.script.lock().unwrap().push_back((text.to_string(), outcome));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn subcommands(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.args[0].clone()).collect()
    }
}

#[async_trait]
impl Toolchain for ScriptedToolchain {
    async fn run(&self, workdir: &Path, env: &ExecutionEnvironment, args: &[&str]) -> CommandOutput {
        self.calls.lock().unwrap().push(Call {
            args: args.iter().map(|a| a.to_string()).collect(),
            workdir: workdir.to_path_buf(),
            env: env.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            document: std::fs::read_to_string(workdir.join(DOCUMENT_FILE)).ok(),
        });

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some((text, Scripted::Ok)) => CommandOutput::success(text),
            Some((text, Scripted::ExitFailure)) => CommandOutput::failure(text, exit_failure(args)),
            Some((text, Scripted::Error(error))) => CommandOutput::failure(text, error),
            None => CommandOutput::success(""),
        }
    }
}

pub fn provisioner(toolchain: Arc<ScriptedToolchain>, workspace_root: &Path) -> Provisioner {
    let registry = Arc::new(TemplateRegistry::builtin().expect("builtin templates compile"));
    Provisioner::new(registry, toolchain, workspace_root)
        .with_base_env([("PATH", "/usr/bin:/bin"), ("HOME", "/home/planbox")])
}

pub fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[cfg(unix)]
fn exit_failure(args: &[&str]) -> ProvisionError {
    use std::os::unix::process::ExitStatusExt;
    ProvisionError::NonZeroExit {
        command: format!("terraform {}", args.join(" ")),
        status: std::process::ExitStatus::from_raw(1 << 8),
    }
}

#[cfg(not(unix))]
fn exit_failure(args: &[&str]) -> ProvisionError {
    ProvisionError::ProcessWait {
        command: format!("terraform {}", args.join(" ")),
        source: std::io::Error::other("scripted failure"),
    }
}
