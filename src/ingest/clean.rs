use anyhow::{anyhow, Result};
use arrow::{
    array::{
        Array, ArrayRef, Float64Builder, Int64Array, Int64Builder, StringArray,
        TimestampMillisecondBuilder,
    },
    record_batch::RecordBatch,
};
use std::sync::Arc;
use tracing::debug;

use crate::{
    error::PipelineError,
    ingest::parse,
    table::{ColumnDef, ColumnKind, TableDef, LISTINGS, REVIEWS},
};

/// Normalize the combined raw listings:
/// - `price` → float, invalid → null
/// - `number_of_reviews` → int, missing → 0
/// - `last_review` → timestamp, invalid → null
/// - `room_type` → trimmed + title case
/// - `id` must be a valid integer
pub fn clean_listings(raw: &RecordBatch) -> Result<RecordBatch> {
    convert_table(raw, &LISTINGS, |def, arr| match def.name {
        "id" => required_ids(arr, LISTINGS.name),
        "number_of_reviews" => review_counts(arr),
        "room_type" => Ok(Arc::new(
            arr.iter()
                .map(|v| v.map(parse::title_case))
                .collect::<StringArray>(),
        ) as ArrayRef),
        _ => Ok(coerce(arr, def.kind)),
    })
}

/// Normalize the combined raw reviews: `date` → timestamp (invalid → null).
/// When the source had no `id` column at all, ids are the 1-based row
/// positions in the combined set.
pub fn clean_reviews(raw: &RecordBatch) -> Result<RecordBatch> {
    convert_table(raw, &REVIEWS, |def, arr| match def.name {
        "id" if arr.null_count() == arr.len() => {
            debug!(rows = arr.len(), "synthesizing review ids");
            Ok(Arc::new(Int64Array::from_iter_values(1..=arr.len() as i64)) as ArrayRef)
        }
        "id" => required_ids(arr, REVIEWS.name),
        _ => Ok(coerce(arr, def.kind)),
    })
}

fn convert_table<F>(raw: &RecordBatch, table: &TableDef, mut convert: F) -> Result<RecordBatch>
where
    F: FnMut(&ColumnDef, &StringArray) -> Result<ArrayRef>,
{
    let mut out = Vec::with_capacity(table.columns.len());
    for def in table.columns {
        let arr = raw
            .column_by_name(def.name)
            .ok_or_else(|| PipelineError::MissingColumn {
                table: table.name.to_string(),
                column: def.name.to_string(),
            })?;
        let sarr = arr
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| PipelineError::ColumnType {
                table: table.name.to_string(),
                column: def.name.to_string(),
                expected: "Utf8".to_string(),
                actual: arr.data_type().to_string(),
            })?;
        out.push(convert(def, sarr)?);
    }
    RecordBatch::try_new(table.arrow_schema(), out)
        .map_err(|e| anyhow!("building cleaned {} batch: {e}", table.name))
}

/// Text → declared kind; anything that does not parse becomes null.
fn coerce(arr: &StringArray, kind: ColumnKind) -> ArrayRef {
    match kind {
        ColumnKind::Text => Arc::new(arr.clone()) as ArrayRef,
        ColumnKind::Float => {
            let mut b = Float64Builder::with_capacity(arr.len());
            for opt in arr.iter() {
                b.append_option(opt.and_then(parse::parse_float));
            }
            Arc::new(b.finish()) as ArrayRef
        }
        ColumnKind::Int => {
            let mut b = Int64Builder::with_capacity(arr.len());
            for opt in arr.iter() {
                b.append_option(opt.and_then(parse::parse_int));
            }
            Arc::new(b.finish()) as ArrayRef
        }
        ColumnKind::Timestamp => {
            let mut b = TimestampMillisecondBuilder::with_capacity(arr.len());
            for opt in arr.iter() {
                b.append_option(opt.and_then(parse::parse_timestamp_millis));
            }
            Arc::new(b.finish()) as ArrayRef
        }
    }
}

fn required_ids(arr: &StringArray, table: &str) -> Result<ArrayRef> {
    let mut b = Int64Builder::with_capacity(arr.len());
    for (row, opt) in arr.iter().enumerate() {
        let id = opt
            .and_then(parse::parse_int)
            .ok_or_else(|| PipelineError::MissingIdentifier {
                table: table.to_string(),
                row,
                value: opt.map(str::to_string),
            })?;
        b.append_value(id);
    }
    Ok(Arc::new(b.finish()))
}

fn review_counts(arr: &StringArray) -> Result<ArrayRef> {
    let mut b = Int64Builder::with_capacity(arr.len());
    for (row, opt) in arr.iter().enumerate() {
        let count = match opt.map(parse::clean_str) {
            None | Some("") => 0,
            Some(s) => parse::parse_int(s).ok_or_else(|| PipelineError::InvalidReviewCount {
                row,
                value: s.to_string(),
            })?,
        };
        b.append_value(count);
    }
    Ok(Arc::new(b.finish()))
}
