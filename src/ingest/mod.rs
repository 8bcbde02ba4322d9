// src/ingest/mod.rs
pub mod clean;
pub mod parse;
pub mod read;

use anyhow::{Context, Result};
use arrow::record_batch::RecordBatch;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::{
    city::City,
    db::{self, Database},
    table::{TableDef, LISTINGS, REVIEWS},
};

/// Where the four source files live: `<dir>/listings_<city>.csv` and
/// `<dir>/reviews_<city>.csv`.
#[derive(Debug, Clone)]
pub struct InputLayout {
    pub dir: PathBuf,
}

impl InputLayout {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn listings_path(&self, city: City) -> PathBuf {
        self.dir.join(format!("listings_{}.csv", city.slug()))
    }

    pub fn reviews_path(&self, city: City) -> PathBuf {
        self.dir.join(format!("reviews_{}.csv", city.slug()))
    }
}

/// Cleaned, city-tagged contents of both tables.
#[derive(Debug, Clone, PartialEq)]
pub struct Datasets {
    pub listings: RecordBatch,
    pub reviews: RecordBatch,
}

/// Read, tag, concatenate and clean both cities' files. Touches no database.
pub fn load_datasets(layout: &InputLayout) -> Result<Datasets> {
    let listings_raw = read_all_cities(&LISTINGS, |c| layout.listings_path(c))?;
    let reviews_raw = read_all_cities(&REVIEWS, |c| layout.reviews_path(c))?;

    let listings = clean::clean_listings(&listings_raw).context("cleaning listings")?;
    let reviews = clean::clean_reviews(&reviews_raw).context("cleaning reviews")?;
    info!(
        listings = listings.num_rows(),
        reviews = reviews.num_rows(),
        "datasets cleaned"
    );

    Ok(Datasets { listings, reviews })
}

fn read_all_cities<F>(table: &TableDef, path_for: F) -> Result<RecordBatch>
where
    F: Fn(City) -> PathBuf,
{
    let mut per_city = Vec::with_capacity(City::ALL.len());
    for city in City::ALL {
        per_city.push(read::read_city_table(path_for(city), table, city)?);
    }
    read::concat_tables(table, &per_city)
}

/// Replace both tables with `datasets`. Each table is swapped in its own
/// transaction.
pub async fn persist(db: &mut Database, datasets: &Datasets) -> Result<()> {
    db::replace_table(db, &LISTINGS, &datasets.listings).await?;
    db::replace_table(db, &REVIEWS, &datasets.reviews).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::describe::{describe, PriceSummary};
    use crate::analysis::frame::listing_rows;
    use std::fs;
    use tempfile::tempdir;

    const LISTINGS_HEADER: &str = "id,name,host_id,host_name,neighbourhood_group,neighbourhood,latitude,longitude,room_type,price,minimum_nights,number_of_reviews,last_review,reviews_per_month,calculated_host_listings_count,availability_365,number_of_reviews_ltm,license";

    fn write_inputs(dir: &Path) {
        fs::write(
            dir.join("listings_berlin.csv"),
            format!(
                "{LISTINGS_HEADER}\n\
                 1,Loft,100,Ann,Mitte,Mitte,52.52,13.40,entire home/apt,120,2,10,2023-05-01,0.5,1,200,3,\n\
                 2,Room,101,Ben,Neukölln,Neukölln,52.48,13.43,private room,45,1,,,,1,30,0,\n"
            ),
        )
        .unwrap();
        fs::write(
            dir.join("listings_munich.csv"),
            format!(
                "{LISTINGS_HEADER}\n\
                 3,Flat,200,Cem,,Maxvorstadt,48.15,11.57, Entire home/apt ,abc,3,7,bad-date,0.2,2,365,1,LIC-1\n"
            ),
        )
        .unwrap();
        fs::write(
            dir.join("reviews_berlin.csv"),
            "listing_id,date\n1,2023-05-01\n1,2023-04-01\n2,2022-12-24\n",
        )
        .unwrap();
        fs::write(dir.join("reviews_munich.csv"), "listing_id,date\n3,2023-01-15\n").unwrap();
    }

    #[test]
    fn layout_names_files_by_city() {
        let layout = InputLayout::new("CSVs");
        assert_eq!(
            layout.listings_path(City::Berlin),
            PathBuf::from("CSVs/listings_berlin.csv")
        );
        assert_eq!(
            layout.reviews_path(City::Munich),
            PathBuf::from("CSVs/reviews_munich.csv")
        );
    }

    #[test]
    fn loads_both_cities() -> Result<()> {
        let tmp = tempdir()?;
        write_inputs(tmp.path());

        let data = load_datasets(&InputLayout::new(tmp.path()))?;
        assert_eq!(data.listings.num_rows(), 3);
        assert_eq!(data.reviews.num_rows(), 4);

        let rows = listing_rows(&data.listings)?;
        assert_eq!(rows[0].city.as_deref(), Some("Berlin"));
        assert_eq!(rows[2].city.as_deref(), Some("Munich"));
        assert_eq!(rows[2].room_type.as_deref(), Some("Entire Home/Apt"));
        assert_eq!(rows[2].price, None);
        assert_eq!(rows[1].number_of_reviews, Some(0));
        Ok(())
    }

    #[test]
    fn loading_twice_is_identical() -> Result<()> {
        let tmp = tempdir()?;
        write_inputs(tmp.path());
        let layout = InputLayout::new(tmp.path());

        let first = load_datasets(&layout)?;
        let second = load_datasets(&layout)?;
        assert_eq!(first, second);

        let summary = |d: &Datasets| -> Result<PriceSummary> {
            Ok(describe(&listing_rows(&d.listings)?, d.reviews.num_rows()).price)
        };
        assert_eq!(summary(&first)?, summary(&second)?);
        Ok(())
    }

    #[test]
    fn missing_city_file_aborts() {
        let tmp = tempdir().unwrap();
        write_inputs(tmp.path());
        fs::remove_file(tmp.path().join("reviews_munich.csv")).unwrap();
        assert!(load_datasets(&InputLayout::new(tmp.path())).is_err());
    }
}
