//! Dump the stored `listings` and `reviews` tables to CSV.

use anyhow::{Context, Result};
use futures::FutureExt;
use rentalstats::{
    config::{self, DbConfig, Paths},
    db::{load_table, with_database},
    export::export_tables,
    table::{LISTINGS, REVIEWS},
    telemetry,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    config::load_dotenv();

    let db_config = DbConfig::from_env().context("reading database settings")?;
    let export_dir = Paths::from_env().export_dir;

    let (listings, reviews) = with_database(&db_config, |db| {
        async move {
            let listings = load_table(db, &LISTINGS).await?;
            let reviews = load_table(db, &REVIEWS).await?;
            Ok::<_, anyhow::Error>((listings, reviews))
        }
        .boxed()
    })
    .await?;

    let summary = export_tables(&listings, &reviews, &export_dir)?;
    info!(
        listings = summary.listings.rows,
        reviews = summary.reviews.rows,
        dir = %export_dir.display(),
        "export complete"
    );
    println!(
        "Exported {} listings to {}",
        summary.listings.rows,
        summary.listings.path.display()
    );
    println!(
        "Exported {} reviews to {}",
        summary.reviews.rows,
        summary.reviews.path.display()
    );
    Ok(())
}
