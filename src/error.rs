/// planbox error types and handling utilities
use axum::http::StatusCode;
use std::process::ExitStatus;

/// Main error type for a provisioning request
#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    /// Payload could not be decoded or is missing required fields
    #[error("malformed request: {0}")]
    BadRequest(String),
    /// Provider identifier is not one we know about
    #[error("unknown platform: {0}")]
    UnknownProvider(String),
    /// Ephemeral workspace directory could not be created
    #[error("failed to prepare workspace")]
    WorkspaceCreate(#[source] std::io::Error),
    /// Rendered document could not be written into the workspace
    #[error("failed to write {file} into workspace")]
    Write {
        file: String,
        #[source]
        source: std::io::Error,
    },
    /// Template rendering failed at request time
    #[error("failed to render {provider} template: {reason}")]
    Render { provider: String, reason: String },
    /// Toolchain binary could not be spawned
    #[error("failed to start `{program}`: {source}")]
    ProcessStart {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// I/O failure while collecting toolchain output
    #[error("lost contact with `{command}`: {source}")]
    ProcessWait {
        command: String,
        #[source]
        source: std::io::Error,
    },
    /// Toolchain exited unsuccessfully
    #[error("`{command}` failed ({status})")]
    NonZeroExit { command: String, status: ExitStatus },
    /// Toolchain did not finish within the step deadline
    #[error("`{command}` did not finish within {seconds}s")]
    Timeout { command: String, seconds: u64 },
    /// A template is invalid; only raised while building the registry
    #[error("template `{name}` is invalid: {reason}")]
    TemplateParse { name: String, reason: String },
}

impl ProvisionError {
    /// HTTP status the dispatcher answers with
    pub fn status(&self) -> StatusCode {
        match self {
            ProvisionError::BadRequest(_) | ProvisionError::UnknownProvider(_) => {
                StatusCode::BAD_REQUEST
            }
            ProvisionError::WorkspaceCreate(_)
            | ProvisionError::Write { .. }
            | ProvisionError::Render { .. }
            | ProvisionError::ProcessStart { .. }
            | ProvisionError::ProcessWait { .. }
            | ProvisionError::NonZeroExit { .. }
            | ProvisionError::Timeout { .. }
            | ProvisionError::TemplateParse { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True when the request itself was at fault (a 4xx status)
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}
