pub mod config;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod request;
pub mod sandbox;
pub mod server;
pub mod telemetry;
pub mod template;
pub mod transcript;
