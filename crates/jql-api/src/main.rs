//! Binary entrypoint for the JQL API server.
use jql_api::{config::Config, logging, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();
    let config = Config::from_env()?;
    run(config).await
}
