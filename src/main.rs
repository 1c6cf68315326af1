use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use tabby::cats::CatsService;
use tabby::config::{AppConfig, DEFAULT_LOG_FILTER};
use tabby::{Server, app};

#[tokio::main]
async fn main() -> Result<(), tabby::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = AppConfig::default();
    let cats = Arc::new(CatsService::new());

    Server::from_config(&config).serve(app::app(cats)).await
}
