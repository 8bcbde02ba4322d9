use anyhow::{Context, Result};
use arrow::{
    array::{new_null_array, ArrayRef, StringArray},
    compute::concat_batches,
    csv::ReaderBuilder,
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use std::{fs::File, path::Path, sync::Arc};
use tracing::{debug, info, instrument, warn};

use crate::{
    city::City,
    table::{TableDef, CITY_COLUMN},
};

const BATCH_SIZE: usize = 8192;

/// Read one city's CSV as text columns projected onto `table`, and tag every
/// row with the city label.
#[instrument(level = "info", skip(path, table), fields(path = %path.as_ref().display(), table = table.name))]
pub fn read_city_table<P: AsRef<Path>>(path: P, table: &TableDef, city: City) -> Result<RecordBatch> {
    let path = path.as_ref();

    // 1) header row decides the file's own column layout
    let headers: Vec<String> = {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .with_context(|| format!("opening {}", path.display()))?;
        rdr.headers()
            .with_context(|| format!("reading header of {}", path.display()))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect()
    };
    debug!(columns = headers.len(), "read header");

    // 2) body as all-Utf8 batches
    let file_schema = Arc::new(Schema::new(
        headers
            .iter()
            .map(|h| Field::new(h, DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = ReaderBuilder::new(file_schema.clone())
        .with_header(true)
        .with_batch_size(BATCH_SIZE)
        .build(file)
        .with_context(|| format!("building CSV reader for {}", path.display()))?;
    let batches = reader
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("CSV parse error in {}", path.display()))?;
    let body = concat_batches(&file_schema, &batches)?;

    // 3) project onto the table layout, then tag
    let projected = project_columns(&body, table, city)?;
    info!(city = %city, rows = projected.num_rows(), "loaded");
    Ok(projected)
}

/// Reorder `body` into `table`'s column order. Columns the file lacks become
/// all-null; columns the table lacks are dropped. The city column is always
/// filled with `city`'s label.
pub fn project_columns(body: &RecordBatch, table: &TableDef, city: City) -> Result<RecordBatch> {
    let rows = body.num_rows();
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(table.columns.len());
    let mut absent = Vec::new();

    for def in table.columns {
        if def.name == CITY_COLUMN {
            let tagged: StringArray = std::iter::repeat(Some(city.label())).take(rows).collect();
            columns.push(Arc::new(tagged));
            continue;
        }
        match body.column_by_name(def.name) {
            Some(arr) => columns.push(arr.clone()),
            None => {
                absent.push(def.name);
                columns.push(new_null_array(&DataType::Utf8, rows));
            }
        }
    }
    if !absent.is_empty() {
        warn!(table = table.name, city = %city, columns = ?absent, "source lacks columns; filled with nulls");
    }

    RecordBatch::try_new(table.raw_schema(), columns).map_err(Into::into)
}

/// Stack per-city raw batches in the given order.
pub fn concat_tables(table: &TableDef, batches: &[RecordBatch]) -> Result<RecordBatch> {
    concat_batches(&table.raw_schema(), batches)
        .with_context(|| format!("concatenating {} batches", table.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{LISTINGS, REVIEWS};
    use arrow::array::Array;
    use std::fs;
    use tempfile::tempdir;

    fn text(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
        batch
            .column_by_name(name)
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap()
            .iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    #[test]
    fn reads_tags_and_projects() -> Result<()> {
        let tmp = tempdir()?;
        let path = tmp.path().join("reviews_munich.csv");
        fs::write(&path, "listing_id,date,comments\n10,2023-05-01,\"great, really\"\n11,,ok\n")?;

        let batch = read_city_table(&path, &REVIEWS, City::Munich)?;

        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema(), REVIEWS.raw_schema());
        assert_eq!(
            text(&batch, "listing_id"),
            vec![Some("10".to_string()), Some("11".to_string())]
        );
        assert_eq!(text(&batch, "city"), vec![Some("Munich".to_string()); 2]);
        assert_eq!(text(&batch, "date")[1], None);
        // no id column in the source
        assert_eq!(batch.column_by_name("id").unwrap().null_count(), 2);
        Ok(())
    }

    #[test]
    fn concat_keeps_city_order() -> Result<()> {
        let tmp = tempdir()?;
        let berlin = tmp.path().join("b.csv");
        let munich = tmp.path().join("m.csv");
        fs::write(&berlin, "id,room_type,price\n1,Private room,50\n")?;
        fs::write(&munich, "id,room_type,price\n2,Entire home/apt,90\n3,Private room,40\n")?;

        let batches = vec![
            read_city_table(&berlin, &LISTINGS, City::Berlin)?,
            read_city_table(&munich, &LISTINGS, City::Munich)?,
        ];
        let all = concat_tables(&LISTINGS, &batches)?;

        assert_eq!(all.num_rows(), 3);
        assert_eq!(
            text(&all, "city"),
            vec![
                Some("Berlin".to_string()),
                Some("Munich".to_string()),
                Some("Munich".to_string())
            ]
        );
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = tempdir().unwrap();
        let err = read_city_table(tmp.path().join("nope.csv"), &LISTINGS, City::Berlin).unwrap_err();
        assert!(err.to_string().contains("nope.csv"));
    }
}
