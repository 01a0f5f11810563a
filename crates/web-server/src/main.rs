use std::path::Path;
use tracing_subscriber::EnvFilter;

// Entry point for `cargo run -p web-server`. The `courtbook serve` command does
// the same with CLI flags and file logging on top.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = configuration::load_config(Path::new("config.toml"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_filter())),
        )
        .init();

    web_server::run_server(config).await
}
