use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// planbox server configuration; every flag can also come from the environment.
#[derive(Debug, Clone, Parser)]
#[command(name = "planbox", version, about)]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "PLANBOX_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Directory served for every non-API path
    #[arg(long, env = "PLANBOX_STATIC_ROOT", default_value = "static")]
    pub static_root: PathBuf,

    /// Toolchain executable, resolved through PATH
    #[arg(long, env = "PLANBOX_TOOLCHAIN", default_value = "terraform")]
    pub toolchain: String,

    /// Parent directory for per-request workspaces [default: OS temp dir]
    #[arg(long, env = "PLANBOX_WORKSPACE_ROOT")]
    pub workspace_root: Option<PathBuf>,

    /// Upper bound for a single toolchain step
    #[arg(long, env = "PLANBOX_STEP_TIMEOUT_SECS", default_value_t = 600)]
    pub step_timeout_secs: u64,

    #[arg(long, env = "PLANBOX_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    pub fn workspace_root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }
}
