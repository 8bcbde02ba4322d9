//! Load both cities' CSVs, clean them and replace the `listings` and
//! `reviews` tables.

use anyhow::{Context, Result};
use futures::FutureExt;
use rentalstats::{
    config::{self, DbConfig, Paths},
    db::with_database,
    ingest::{self, InputLayout},
    telemetry,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    config::load_dotenv();

    let db_config = DbConfig::from_env().context("reading database settings")?;
    let paths = Paths::from_env();
    let layout = InputLayout::new(&paths.csv_dir);
    info!(csv_dir = %layout.dir.display(), "starting ingest");

    // 1) read and clean everything before touching the store
    let datasets = ingest::load_datasets(&layout)?;

    // 2) swap both tables in
    with_database(&db_config, move |db| {
        async move { ingest::persist(db, &datasets).await }.boxed()
    })
    .await?;

    println!("Data loaded successfully!");
    Ok(())
}
