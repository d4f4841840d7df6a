//! Dump Jira reference data into `DATA_DIR`.
use std::sync::Arc;
use std::time::Duration;

use jql_api::meta::MetadataFetcher;
use jql_api::{config::Config, jira_client, logging};
use jql_core::ExecutionContext;

const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init_tracing();
    let config = Config::from_env()?;
    let tracker = Arc::new(jira_client(&config)?);
    let ctx = ExecutionContext::new().with_timeout(FETCH_TIMEOUT);
    MetadataFetcher::new(tracker, &config.data_dir)
        .fetch_all(&ctx)
        .await?;
    Ok(())
}
