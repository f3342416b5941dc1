//! Standalone migration runner: applies all pending migrations against the
//! configured database and exits.

use matreq_api as api;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config()?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    info!(database_url = %cfg.database_url, "Running migrations");
    api::migrator::run_migration(&cfg.database_url).await?;

    Ok(())
}
