//! Descriptive statistics, hypothesis tests and charts over the two stored
//! tables.

pub mod charts;
pub mod describe;
pub mod downtown;
pub mod frame;
pub mod neighbourhood;
pub mod stats;

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing::{info, instrument, warn};

use crate::city::City;
use describe::{Overview, PriceSummary, ValueCounts};
use downtown::{DowntownTable, Location};
use frame::{listing_rows, prices_where, ListingRow};
use stats::{pearson, welch_t_test, TTest};

pub const PRIVATE_ROOM: &str = "Private Room";
pub const ENTIRE_HOME: &str = "Entire Home/Apt";

/// Everything printed in the console report.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub overview: Overview,
    /// Private room against entire home/apartment.
    pub room_type: TTest,
    /// Downtown against everything else.
    pub downtown: TTest,
    /// Berlin against Munich.
    pub city: TTest,
    /// Pearson r of price against number of reviews.
    pub correlation: f64,
    /// Listings whose city has no downtown entry; tested as non-downtown.
    pub unknown_city_listings: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub stats: Statistics,
    pub price_distribution_chart: PathBuf,
    pub heatmap_chart: PathBuf,
}

pub fn compute(rows: &[ListingRow], total_reviews: usize, downtown: &DowntownTable) -> Statistics {
    let overview = describe::describe(rows, total_reviews);

    let room_type = welch_t_test(
        &prices_where(rows, |r| r.room_type.as_deref() == Some(PRIVATE_ROOM)),
        &prices_where(rows, |r| r.room_type.as_deref() == Some(ENTIRE_HOME)),
    );

    let mut inside = Vec::new();
    let mut outside = Vec::new();
    let mut unknown_city_listings = 0;
    for r in rows {
        let loc = downtown.classify(r.city.as_deref(), r.neighbourhood.as_deref());
        if loc == Location::UnknownCity {
            unknown_city_listings += 1;
        }
        let Some(price) = r.price else { continue };
        if loc.is_downtown() {
            inside.push(price);
        } else {
            outside.push(price);
        }
    }

    let city = welch_t_test(
        &prices_where(rows, |r| r.city.as_deref() == Some(City::Berlin.label())),
        &prices_where(rows, |r| r.city.as_deref() == Some(City::Munich.label())),
    );

    let correlation = pearson(
        rows.iter()
            .map(|r| (r.price, r.number_of_reviews.map(|n| n as f64))),
    );

    Statistics {
        overview,
        room_type,
        downtown: welch_t_test(&inside, &outside),
        city,
        correlation,
        unknown_city_listings,
    }
}

/// Run the whole analysis over typed `listings` and `reviews` batches and
/// write both charts into `chart_dir`.
#[instrument(level = "info", skip(listings, reviews, downtown), fields(listings = listings.num_rows(), reviews = reviews.num_rows()))]
pub fn run(
    listings: &RecordBatch,
    reviews: &RecordBatch,
    downtown: &DowntownTable,
    chart_dir: &Path,
) -> Result<AnalysisReport> {
    let rows = listing_rows(listings).context("reading listings for analysis")?;
    let stats = compute(&rows, reviews.num_rows(), downtown);

    if stats.unknown_city_listings > 0 {
        warn!(
            listings = stats.unknown_city_listings,
            known = ?downtown.cities().collect::<Vec<_>>(),
            "listings in cities without a downtown entry counted as non-downtown"
        );
    }
    info!(
        room_type_p = stats.room_type.p_value,
        downtown_p = stats.downtown.p_value,
        city_p = stats.city.p_value,
        correlation = stats.correlation,
        "statistics computed"
    );

    std::fs::create_dir_all(chart_dir)
        .with_context(|| format!("creating {}", chart_dir.display()))?;
    let price_distribution_chart = chart_dir.join(charts::PRICE_DISTRIBUTION_FILE);
    charts::render_price_distribution(&rows, &price_distribution_chart)
        .context("rendering price distribution")?;

    let heatmap_chart = chart_dir.join(charts::HEATMAP_FILE);
    let groups = neighbourhood::heatmap_groups(&rows);
    charts::render_neighbourhood_heatmap(&groups, &heatmap_chart)
        .context("rendering neighbourhood heatmap")?;

    Ok(AnalysisReport {
        stats,
        price_distribution_chart,
        heatmap_chart,
    })
}

/// Fixed-precision float that prints NaN as `nan`.
fn num(v: f64, precision: usize) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else {
        format!("{v:.precision$}")
    }
}

fn write_counts<W: Write>(out: &mut W, title: &str, counts: &ValueCounts) -> io::Result<()> {
    writeln!(out, "{title}:")?;
    for (name, n) in &counts.0 {
        writeln!(out, "  {name:<24} {n}")?;
    }
    Ok(())
}

fn write_price_summary<W: Write>(out: &mut W, p: &PriceSummary) -> io::Result<()> {
    writeln!(out, "Price statistics:")?;
    writeln!(out, "  count  {}", p.count)?;
    for (label, v) in [
        ("mean", p.mean),
        ("std", p.std),
        ("min", p.min),
        ("25%", p.q25),
        ("50%", p.median),
        ("75%", p.q75),
        ("max", p.max),
    ] {
        writeln!(out, "  {label:<6} {}", num(v, 6))?;
    }
    Ok(())
}

fn write_t_test<W: Write>(out: &mut W, title: &str, t: &TTest) -> io::Result<()> {
    writeln!(out, "\n{title} T-Test:")?;
    writeln!(
        out,
        "T-stat: {}, P-value: {}",
        num(t.statistic, 4),
        num(t.p_value, 10)
    )
}

/// Render the console report.
pub fn write_report<W: Write>(out: &mut W, stats: &Statistics) -> io::Result<()> {
    let o = &stats.overview;
    writeln!(out, "\nData Overview:")?;
    writeln!(out, "Total listings: {}", o.total_listings)?;
    writeln!(out, "Total reviews: {}", o.total_reviews)?;
    writeln!(out, "Room types: {:?}", o.room_types)?;
    write_counts(out, "Room type counts", &o.room_type_counts)?;
    writeln!(out, "Cities: {:?}", o.cities)?;
    write_counts(out, "City counts", &o.city_counts)?;
    write_price_summary(out, &o.price)?;

    write_t_test(out, "Room Type", &stats.room_type)?;
    write_t_test(out, "Downtown vs Non-Downtown", &stats.downtown)?;
    write_t_test(out, "Berlin vs Munich", &stats.city)?;

    writeln!(
        out,
        "\nCorrelation between price and review count: {}",
        num(stats.correlation, 4)
    )?;
    Ok(())
}

pub fn print_report(report: &AnalysisReport) -> Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    write_report(&mut lock, &report.stats).context("writing report to stdout")?;
    lock.flush()?;
    Ok(())
}
