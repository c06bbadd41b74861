use crate::config::Config;
use crate::error::ProvisionError;
use crate::pipeline::{PlanFailure, Provisioner};
use crate::request::{Provider, ProvisioningRequest, Wiring};
use crate::sandbox::ProcessToolchain;
use crate::template::TemplateRegistry;
use crate::transcript::Transcript;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use std::path::Path;
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

pub struct AppState {
    pub provisioner: Provisioner,
}

/// Terminal state of one request.
#[derive(Debug)]
pub enum Outcome {
    Succeeded(Transcript),
    /// Provider is declared but not wired; not an error.
    Placeholder(&'static str),
    Failed {
        transcript: Transcript,
        error: ProvisionError,
    },
}

impl Outcome {
    fn rejected(error: ProvisionError) -> Self {
        Outcome::Failed {
            transcript: Transcript::new(),
            error,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Outcome::Succeeded(_) | Outcome::Placeholder(_) => StatusCode::OK,
            Outcome::Failed { error, .. } => error.status(),
        }
    }

    /// Response text; failures keep the partial transcript ahead of the error.
    pub fn body(&self) -> String {
        match self {
            Outcome::Succeeded(transcript) => transcript.to_string(),
            Outcome::Placeholder(message) => (*message).to_string(),
            Outcome::Failed { transcript, error } => format!("{transcript}Error: {error}\n"),
        }
    }
}

impl From<PlanFailure> for Outcome {
    fn from(failure: PlanFailure) -> Self {
        Outcome::Failed {
            transcript: failure.transcript,
            error: failure.error,
        }
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        (
            self.status(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.body(),
        )
            .into_response()
    }
}

pub fn router(provisioner: Provisioner, static_root: &Path) -> Router {
    let state = Arc::new(AppState { provisioner });
    let plan = post(handle_plan).fallback(method_not_allowed);

    Router::new()
        .route("/api/plan", plan.clone())
        .route("/generate", plan)
        .fallback_service(ServeDir::new(static_root))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: Config) -> Result<()> {
    let registry =
        Arc::new(TemplateRegistry::builtin().context("failed to compile provider templates")?);
    let toolchain = Arc::new(ProcessToolchain::new(
        config.toolchain.clone(),
        config.step_timeout(),
    ));
    let provisioner = Provisioner::new(registry, toolchain, config.workspace_root());

    tracing::info!(
        addr = %config.bind,
        toolchain = %config.toolchain,
        workspace_root = %provisioner.workspace_root().display(),
        static_root = %config.static_root.display(),
        "planbox server starting"
    );
    let app = router(provisioner, &config.static_root);

    axum::Server::try_bind(&config.bind)
        .with_context(|| format!("failed to bind {}", config.bind))?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("planbox server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

async fn handle_plan(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    dispatch(&state.provisioner, &body).await.into_response()
}

async fn method_not_allowed() -> impl IntoResponse {
    (StatusCode::METHOD_NOT_ALLOWED, "Invalid request method")
}

/// Validate, route by provider and run the matching handler.
pub async fn dispatch(provisioner: &Provisioner, body: &[u8]) -> Outcome {
    tracing::debug!(bytes = body.len(), "request received");

    let (provider, request) = match validate(body) {
        Ok(validated) => validated,
        Err(error) => {
            tracing::warn!(%error, "request rejected");
            return Outcome::rejected(error);
        }
    };
    tracing::info!(%provider, ?request, "request validated");

    let outcome = match provider.wiring() {
        Wiring::Placeholder(message) => {
            tracing::info!(%provider, "provider not implemented, answering placeholder");
            Outcome::Placeholder(message)
        }
        Wiring::Toolchain => {
            tracing::info!(%provider, "request dispatched");
            match provisioner.plan(provider, &request).await {
                Ok(transcript) => Outcome::Succeeded(transcript),
                Err(failure) => failure.into(),
            }
        }
    };

    match &outcome {
        Outcome::Failed { error, transcript } => {
            tracing::error!(%provider, %error, steps = ?transcript.labels(), "request failed")
        }
        _ => tracing::info!(%provider, "request succeeded"),
    }
    outcome
}

fn validate(body: &[u8]) -> Result<(Provider, ProvisioningRequest), ProvisionError> {
    let request = ProvisioningRequest::from_slice(body)?;
    let provider = request.provider()?;
    if provider.wiring() == Wiring::Toolchain {
        request.validate(provider)?;
    }
    Ok((provider, request))
}
