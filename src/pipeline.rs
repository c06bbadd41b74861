//! Provider handler: workspace, render, credentials, then `init` and `plan`.

use crate::error::ProvisionError;
use crate::render::write_document;
use crate::request::{Provider, ProvisioningRequest};
use crate::sandbox::{ExecutionEnvironment, Toolchain, Workspace};
use crate::template::TemplateRegistry;
use crate::transcript::Transcript;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Toolchain subcommands, run in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Init,
    Plan,
}

impl Step {
    pub const SEQUENCE: [Step; 2] = [Step::Init, Step::Plan];

    pub fn label(&self) -> &'static str {
        match self {
            Step::Init => "Init",
            Step::Plan => "Plan",
        }
    }

    pub fn args(&self) -> &'static [&'static str] {
        match self {
            Step::Init => &["init", "-input=false", "-no-color"],
            Step::Plan => &["plan", "-input=false", "-no-color"],
        }
    }
}

/// A failed run, together with whatever output was collected before it.
#[derive(Debug)]
pub struct PlanFailure {
    pub transcript: Transcript,
    pub error: ProvisionError,
}

impl PlanFailure {
    fn before_any_step(error: ProvisionError) -> Self {
        Self {
            transcript: Transcript::new(),
            error,
        }
    }
}

pub struct Provisioner {
    registry: Arc<TemplateRegistry>,
    toolchain: Arc<dyn Toolchain>,
    workspace_root: PathBuf,
    base_env: Arc<Vec<(String, String)>>,
}

impl Provisioner {
    /// Captures the current process environment as the base for every run.
    pub fn new(
        registry: Arc<TemplateRegistry>,
        toolchain: Arc<dyn Toolchain>,
        workspace_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry,
            toolchain,
            workspace_root: workspace_root.into(),
            base_env: Arc::new(ExecutionEnvironment::ambient()),
        }
    }

    pub fn with_base_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.base_env = Arc::new(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Render the provider's document into a fresh workspace and plan it.
    ///
    /// Steps run strictly in sequence; a failed step ends the run and no
    /// later step is attempted. The workspace is removed before returning
    /// on every path.
    pub async fn plan(
        &self,
        provider: Provider,
        request: &ProvisioningRequest,
    ) -> Result<Transcript, PlanFailure> {
        let workspace =
            Workspace::acquire(&self.workspace_root).map_err(PlanFailure::before_any_step)?;

        let document = self
            .registry
            .render(provider, request)
            .map_err(PlanFailure::before_any_step)?;
        write_document(&workspace, &document).map_err(PlanFailure::before_any_step)?;

        let env = ExecutionEnvironment::build(
            self.base_env.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            provider,
            request,
        );

        let mut transcript = Transcript::new();
        for step in Step::SEQUENCE {
            tracing::info!(%provider, step = step.label(), workdir = %workspace.path().display(), "running toolchain step");
            let output = self.toolchain.run(workspace.path(), &env, step.args()).await;
            transcript.push(step.label(), output.text);

            if let Err(error) = output.result {
                tracing::warn!(%provider, step = step.label(), %error, "toolchain step failed");
                return Err(PlanFailure { transcript, error });
            }
        }

        drop(workspace);
        Ok(transcript)
    }
}
