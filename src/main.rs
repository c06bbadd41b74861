use anyhow::Result;
use clap::Parser;
use planbox::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    planbox::telemetry::init(config.log_format);

    planbox::server::serve(config).await
}
