use anyhow::{Context, Result};
use arrow::{
    array::{Array, Float64Array, Int64Array, StringArray, TimestampMillisecondArray},
    record_batch::RecordBatch,
};
use chrono::NaiveDateTime;
use sqlx::{query_builder::Separated, Connection, Postgres, QueryBuilder};
use std::time::Instant;
use tracing::{debug, info, instrument};

use super::Database;
use crate::{
    error::PipelineError,
    table::{ColumnKind, TableDef},
};

/// Rows per INSERT. PostgreSQL caps bind parameters at 65535 per statement;
/// 1000 rows × 19 columns stays well below.
const INSERT_CHUNK_ROWS: usize = 1000;

/// Typed view of one batch column, resolved once before binding rows.
enum ColumnData<'a> {
    Int(&'a Int64Array),
    Float(&'a Float64Array),
    Text(&'a StringArray),
    Timestamp(&'a TimestampMillisecondArray),
}

impl<'a> ColumnData<'a> {
    fn resolve(table: &TableDef, batch: &'a RecordBatch) -> Result<Vec<Self>> {
        table
            .columns
            .iter()
            .map(|def| -> Result<ColumnData<'a>> {
                let arr = batch
                    .column_by_name(def.name)
                    .ok_or_else(|| PipelineError::MissingColumn {
                        table: table.name.to_string(),
                        column: def.name.to_string(),
                    })?;
                let any = arr.as_any();
                let data = match def.kind {
                    ColumnKind::Int => any.downcast_ref().map(ColumnData::Int),
                    ColumnKind::Float => any.downcast_ref().map(ColumnData::Float),
                    ColumnKind::Text => any.downcast_ref().map(ColumnData::Text),
                    ColumnKind::Timestamp => any.downcast_ref().map(ColumnData::Timestamp),
                };
                let data = data.ok_or_else(|| PipelineError::ColumnType {
                    table: table.name.to_string(),
                    column: def.name.to_string(),
                    expected: def.kind.arrow_type().to_string(),
                    actual: arr.data_type().to_string(),
                })?;
                Ok(data)
            })
            .collect()
    }

    fn bind(&self, row: usize, b: &mut Separated<'_, '_, Postgres, &'static str>) {
        match self {
            ColumnData::Int(a) => {
                b.push_bind(a.is_valid(row).then(|| a.value(row)));
            }
            ColumnData::Float(a) => {
                b.push_bind(a.is_valid(row).then(|| a.value(row)));
            }
            ColumnData::Text(a) => {
                b.push_bind(a.is_valid(row).then(|| a.value(row).to_string()));
            }
            ColumnData::Timestamp(a) => {
                let ts: Option<NaiveDateTime> = if a.is_valid(row) {
                    a.value_as_datetime(row)
                } else {
                    None
                };
                b.push_bind(ts);
            }
        }
    }
}

/// Drop, recreate and fill `table` from `batch` inside one transaction.
/// On any failure the transaction rolls back and the previous table stays.
#[instrument(level = "info", skip(db, table, batch), fields(table = table.name, rows = batch.num_rows()))]
pub async fn replace_table(db: &mut Database, table: &TableDef, batch: &RecordBatch) -> Result<u64> {
    let start = Instant::now();
    let columns = ColumnData::resolve(table, batch)?;

    let mut tx = db
        .conn()
        .begin()
        .await
        .with_context(|| format!("starting transaction for {}", table.name))?;

    sqlx::query(&table.drop_sql())
        .execute(&mut *tx)
        .await
        .with_context(|| format!("dropping {}", table.name))?;
    sqlx::query(&table.create_sql())
        .execute(&mut *tx)
        .await
        .with_context(|| format!("creating {}", table.name))?;

    let mut inserted = 0u64;
    let mut offset = 0;
    while offset < batch.num_rows() {
        let end = (offset + INSERT_CHUNK_ROWS).min(batch.num_rows());
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(table.insert_prefix());
        qb.push_values(offset..end, |mut b, row| {
            for col in &columns {
                col.bind(row, &mut b);
            }
        });
        let result = qb
            .build()
            .execute(&mut *tx)
            .await
            .with_context(|| format!("inserting rows {offset}..{end} into {}", table.name))?;
        inserted += result.rows_affected();
        debug!(offset, end, "chunk inserted");
        offset = end;
    }

    tx.commit()
        .await
        .with_context(|| format!("committing {}", table.name))?;

    info!(inserted, elapsed = ?start.elapsed(), "table replaced");
    Ok(inserted)
}
