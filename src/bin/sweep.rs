use chrono::Utc;
use env_logger::Builder;
use log::info;
use std::error::Error;
use std::sync::Arc;

use reaction_sim::config::Settings;
use reaction_sim::db::{self, ScyllaStore};
use reaction_sim::sweeper;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let settings = Settings::from_env();

    Builder::new()
        .filter_level(settings.log_filter())
        .format_timestamp_secs()
        .init();

    info!("Starting orphan sweep...");

    // Connect to ScyllaDB
    let session = db::create_session(&settings.scylla_nodes, &settings.scylla_keyspace).await?;
    let store = ScyllaStore::new(Arc::new(session));

    let failed =
        sweeper::sweep_orphans(&store, settings.sweep_stale_after_secs, Utc::now()).await?;

    info!("Sweep completed, {} simulations marked failed", failed);
    Ok(())
}
