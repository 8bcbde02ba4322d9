// src/export.rs
use anyhow::{Context, Result};
use arrow::{csv::WriterBuilder, record_batch::RecordBatch};
use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};
use tracing::{info, instrument};

pub const LISTINGS_FILE: &str = "listings_full.csv";
pub const REVIEWS_FILE: &str = "reviews_full.csv";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub listings: ExportedFile,
    pub reviews: ExportedFile,
}

/// Write `batch` verbatim as CSV with a header row, replacing any existing
/// file. Nulls become empty fields.
#[instrument(level = "info", skip(batch, path), fields(path = %path.as_ref().display()))]
pub fn write_csv<P: AsRef<Path>>(batch: &RecordBatch, path: P) -> Result<usize> {
    let path = path.as_ref();
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = WriterBuilder::new()
        .with_header(true)
        .with_timestamp_format(TIMESTAMP_FORMAT.to_string())
        .build(BufWriter::new(file));
    writer
        .write(batch)
        .with_context(|| format!("writing {}", path.display()))?;
    // flush the BufWriter before reporting success
    writer
        .into_inner()
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("flushing {}", path.display()))?;

    info!(rows = batch.num_rows(), "exported");
    Ok(batch.num_rows())
}

/// Export both tables into `dir`, creating it if needed.
pub fn export_tables<P: AsRef<Path>>(
    listings: &RecordBatch,
    reviews: &RecordBatch,
    dir: P,
) -> Result<ExportSummary> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let listings_path = dir.join(LISTINGS_FILE);
    let reviews_path = dir.join(REVIEWS_FILE);
    let listings_rows = write_csv(listings, &listings_path)?;
    let reviews_rows = write_csv(reviews, &reviews_path)?;

    Ok(ExportSummary {
        listings: ExportedFile {
            path: listings_path,
            rows: listings_rows,
        },
        reviews: ExportedFile {
            path: reviews_path,
            rows: reviews_rows,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ingest::{load_datasets, InputLayout},
        table::REVIEWS,
    };
    use arrow::array::{ArrayRef, Int64Array, StringArray, TimestampMillisecondArray};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn reviews(n: i64) -> RecordBatch {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from_iter_values(1..=n)),
            Arc::new(Int64Array::from_iter((1..=n).map(|i| (i % 3 != 0).then_some(i * 10)))),
            Arc::new(StringArray::from_iter_values((1..=n).map(|i| {
                if i % 2 == 0 {
                    "Berlin"
                } else {
                    "Munich"
                }
            }))),
            Arc::new(TimestampMillisecondArray::from_iter(
                (1..=n).map(|i| Some(1_672_531_200_000 + i * 86_400_000)),
            )),
        ];
        RecordBatch::try_new(REVIEWS.arrow_schema(), columns).unwrap()
    }

    fn count_records(path: &Path) -> usize {
        csv::Reader::from_path(path)
            .unwrap()
            .records()
            .map(|r| r.unwrap())
            .count()
    }

    #[test]
    fn row_counts_match_source() -> Result<()> {
        let tmp = tempdir()?;
        let batch = reviews(25);
        let path = tmp.path().join("reviews.csv");

        let written = write_csv(&batch, &path)?;
        assert_eq!(written, 25);
        assert_eq!(count_records(&path), 25);

        let text = fs::read_to_string(&path)?;
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("id,listing_id,city,date"));
        assert_eq!(lines.next(), Some("1,10,Munich,2023-01-02 00:00:00"));
        assert_eq!(lines.nth(1), Some("3,,Munich,2023-01-04 00:00:00"));
        Ok(())
    }

    #[test]
    fn empty_table_still_gets_a_header() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("empty.csv");
        write_csv(&RecordBatch::new_empty(REVIEWS.arrow_schema()), &path)?;
        assert_eq!(fs::read_to_string(&path)?.trim_end(), "id,listing_id,city,date");
        assert_eq!(count_records(&path), 0);
        Ok(())
    }

    #[test]
    fn export_creates_dir_and_is_repeatable() -> Result<()> {
        let tmp = tempdir()?;
        let dir = tmp.path().join("nested").join("exports");
        let batch = reviews(7);

        let first = export_tables(&batch, &batch, &dir)?;
        let bytes = fs::read(&first.reviews.path)?;
        let second = export_tables(&batch, &batch, &dir)?;

        assert_eq!(first, second);
        assert_eq!(fs::read(&second.reviews.path)?, bytes);
        assert_eq!(first.listings.path, dir.join(LISTINGS_FILE));
        Ok(())
    }

    #[test]
    fn cleaned_datasets_export_every_row() -> Result<()> {
        let tmp = tempdir()?;
        let input = tmp.path().join("CSVs");
        fs::create_dir_all(&input)?;
        for city in ["berlin", "munich"] {
            fs::write(
                input.join(format!("listings_{city}.csv")),
                format!("id,name,room_type,price\n{0}1,\"Cosy, bright\",private room,40\n{0}2,Flat,entire home/apt,\n",
                    if city == "berlin" { 1 } else { 2 }),
            )?;
            fs::write(
                input.join(format!("reviews_{city}.csv")),
                "listing_id,date\n11,2023-01-01\n12,bad\n21,2023-02-02\n",
            )?;
        }
        let data = load_datasets(&InputLayout::new(&input))?;
        let summary = export_tables(&data.listings, &data.reviews, tmp.path().join("exports"))?;

        assert_eq!(summary.listings.rows, data.listings.num_rows());
        assert_eq!(summary.reviews.rows, data.reviews.num_rows());
        assert_eq!(count_records(&summary.listings.path), 4);
        assert_eq!(count_records(&summary.reviews.path), 6);
        Ok(())
    }
}
