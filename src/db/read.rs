use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Float64Builder, Int64Builder, StringBuilder, TimestampMillisecondBuilder},
    record_batch::RecordBatch,
};
use chrono::NaiveDateTime;
use futures::TryStreamExt;
use sqlx::{postgres::PgRow, Row};
use std::sync::Arc;
use tracing::{info, instrument};

use super::Database;
use crate::table::{ColumnKind, TableDef};

enum ColumnBuilder {
    Int(Int64Builder),
    Float(Float64Builder),
    Text(StringBuilder),
    Timestamp(TimestampMillisecondBuilder),
}

impl ColumnBuilder {
    fn new(kind: ColumnKind) -> Self {
        match kind {
            ColumnKind::Int => ColumnBuilder::Int(Int64Builder::new()),
            ColumnKind::Float => ColumnBuilder::Float(Float64Builder::new()),
            ColumnKind::Text => ColumnBuilder::Text(StringBuilder::new()),
            ColumnKind::Timestamp => ColumnBuilder::Timestamp(TimestampMillisecondBuilder::new()),
        }
    }

    fn append(&mut self, row: &PgRow, idx: usize) -> Result<(), sqlx::Error> {
        match self {
            ColumnBuilder::Int(b) => b.append_option(row.try_get::<Option<i64>, _>(idx)?),
            ColumnBuilder::Float(b) => b.append_option(row.try_get::<Option<f64>, _>(idx)?),
            ColumnBuilder::Text(b) => b.append_option(row.try_get::<Option<String>, _>(idx)?),
            ColumnBuilder::Timestamp(b) => b.append_option(
                row.try_get::<Option<NaiveDateTime>, _>(idx)?
                    .map(|dt| dt.and_utc().timestamp_millis()),
            ),
        }
        Ok(())
    }

    fn finish(self) -> ArrayRef {
        match self {
            ColumnBuilder::Int(mut b) => Arc::new(b.finish()) as ArrayRef,
            ColumnBuilder::Float(mut b) => Arc::new(b.finish()) as ArrayRef,
            ColumnBuilder::Text(mut b) => Arc::new(b.finish()) as ArrayRef,
            ColumnBuilder::Timestamp(mut b) => Arc::new(b.finish()) as ArrayRef,
        }
    }
}

/// Read every declared column of `table`, ordered by primary key, into one
/// typed batch.
#[instrument(level = "info", skip(db, table), fields(table = table.name))]
pub async fn load_table(db: &mut Database, table: &TableDef) -> Result<RecordBatch> {
    let sql = table.select_sql();
    let mut builders: Vec<ColumnBuilder> = table
        .columns
        .iter()
        .map(|c| ColumnBuilder::new(c.kind))
        .collect();

    let mut rows = sqlx::query(&sql).fetch(db.conn());
    let mut count = 0usize;
    while let Some(row) = rows
        .try_next()
        .await
        .with_context(|| format!("reading {}", table.name))?
    {
        for (idx, b) in builders.iter_mut().enumerate() {
            b.append(&row, idx)
                .with_context(|| format!("{}.{}", table.name, table.columns[idx].name))?;
        }
        count += 1;
    }

    let columns: Vec<ArrayRef> = builders.into_iter().map(ColumnBuilder::finish).collect();
    let batch = RecordBatch::try_new(table.arrow_schema(), columns)?;
    info!(rows = count, "table loaded");
    Ok(batch)
}

pub async fn count_rows(db: &mut Database, table: &TableDef) -> Result<i64> {
    let (n,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", table.name))
        .fetch_one(db.conn())
        .await
        .with_context(|| format!("counting {}", table.name))?;
    Ok(n)
}
