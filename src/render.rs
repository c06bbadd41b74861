use crate::error::ProvisionError;
use crate::request::Provider;
use crate::sandbox::workspace::Workspace;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Well-known name the toolchain picks the document up from.
pub const DOCUMENT_FILE: &str = "main.tf";

/// Template output for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDocument {
    provider: Provider,
    text: String,
}

impl RenderedDocument {
    pub fn new(provider: Provider, text: String) -> Self {
        Self { provider, text }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Write the document into a fresh workspace. Refuses to overwrite.
pub fn write_document(
    workspace: &Workspace,
    document: &RenderedDocument,
) -> Result<PathBuf, ProvisionError> {
    let path = workspace.path().join(DOCUMENT_FILE);
    let write_err = |source: std::io::Error| ProvisionError::Write {
        file: DOCUMENT_FILE.to_string(),
        source,
    };

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(write_err)?;
    file.write_all(document.text.as_bytes()).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;

    tracing::debug!(
        provider = %document.provider,
        bytes = document.text.len(),
        path = %path.display(),
        "document written"
    );
    Ok(path)
}
