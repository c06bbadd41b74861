use crate::error::ProvisionError;
use async_trait::async_trait;
use std::path::Path;

pub mod env;
pub mod runner;
pub mod workspace;

pub use env::ExecutionEnvironment;
pub use runner::ProcessToolchain;
pub use workspace::Workspace;

/// Combined stdout/stderr of one toolchain invocation, kept even on failure.
#[derive(Debug)]
pub struct CommandOutput {
    pub text: String,
    pub result: Result<(), ProvisionError>,
}

impl CommandOutput {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            result: Ok(()),
        }
    }

    pub fn failure(text: impl Into<String>, error: ProvisionError) -> Self {
        Self {
            text: text.into(),
            result: Err(error),
        }
    }
}

/// The external provisioning toolchain, invoked once per subcommand.
#[async_trait]
pub trait Toolchain: Send + Sync {
    async fn run(&self, workdir: &Path, env: &ExecutionEnvironment, args: &[&str]) -> CommandOutput;
}
