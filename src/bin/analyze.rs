//! Statistics and charts over the stored tables.

use anyhow::{Context, Result};
use futures::FutureExt;
use rentalstats::{
    analysis::{self, downtown::DowntownTable},
    config::{self, DbConfig, Paths},
    db::{load_table, with_database},
    table::{LISTINGS, REVIEWS},
    telemetry,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init();
    config::load_dotenv();

    let db_config = DbConfig::from_env().context("reading database settings")?;
    let paths = Paths::from_env();
    let downtown = DowntownTable::load(paths.downtown_table.as_deref())?;

    let (listings, reviews) = with_database(&db_config, |db| {
        async move {
            let listings = load_table(db, &LISTINGS).await?;
            let reviews = load_table(db, &REVIEWS).await?;
            Ok::<_, anyhow::Error>((listings, reviews))
        }
        .boxed()
    })
    .await?;

    let report = analysis::run(&listings, &reviews, &downtown, &paths.chart_dir)?;
    analysis::print_report(&report)?;
    info!(
        box_plots = %report.price_distribution_chart.display(),
        heatmap = %report.heatmap_chart.display(),
        "analysis complete"
    );
    Ok(())
}
