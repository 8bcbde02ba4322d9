//! Column layouts for the `listings` and `reviews` tables.
//!
//! One definition drives the raw CSV projection, the cleaned arrow schema,
//! the PostgreSQL DDL and the read-back query, so the four never drift apart.

use std::sync::Arc;

use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    Float,
    Text,
    Timestamp,
}

impl ColumnKind {
    pub fn arrow_type(self) -> DataType {
        match self {
            ColumnKind::Int => DataType::Int64,
            ColumnKind::Float => DataType::Float64,
            ColumnKind::Text => DataType::Utf8,
            ColumnKind::Timestamp => DataType::Timestamp(TimeUnit::Millisecond, None),
        }
    }

    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnKind::Int => "BIGINT",
            ColumnKind::Float => "DOUBLE PRECISION",
            ColumnKind::Text => "TEXT",
            ColumnKind::Timestamp => "TIMESTAMP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn col(name: &'static str, kind: ColumnKind) -> ColumnDef {
    ColumnDef { name, kind }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    pub name: &'static str,
    pub columns: &'static [ColumnDef],
    pub primary_key: &'static str,
}

pub const LISTINGS: TableDef = TableDef {
    name: "listings",
    columns: &[
        col("id", ColumnKind::Int),
        col("name", ColumnKind::Text),
        col("host_id", ColumnKind::Int),
        col("host_name", ColumnKind::Text),
        col("neighbourhood_group", ColumnKind::Text),
        col("neighbourhood", ColumnKind::Text),
        col("latitude", ColumnKind::Float),
        col("longitude", ColumnKind::Float),
        col("room_type", ColumnKind::Text),
        col("price", ColumnKind::Float),
        col("minimum_nights", ColumnKind::Int),
        col("number_of_reviews", ColumnKind::Int),
        col("last_review", ColumnKind::Timestamp),
        col("reviews_per_month", ColumnKind::Float),
        col("calculated_host_listings_count", ColumnKind::Int),
        col("availability_365", ColumnKind::Int),
        col("number_of_reviews_ltm", ColumnKind::Int),
        col("license", ColumnKind::Text),
        col("city", ColumnKind::Text),
    ],
    primary_key: "id",
};

// `listing_id` points at `listings.id`, but the constraint is not declared:
// review dumps routinely reference listings missing from the summary file.
pub const REVIEWS: TableDef = TableDef {
    name: "reviews",
    columns: &[
        col("id", ColumnKind::Int),
        col("listing_id", ColumnKind::Int),
        col("city", ColumnKind::Text),
        col("date", ColumnKind::Timestamp),
    ],
    primary_key: "id",
};

pub const CITY_COLUMN: &str = "city";

impl TableDef {
    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Schema after cleaning: every column in its declared type.
    pub fn arrow_schema(&self) -> SchemaRef {
        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|c| Field::new(c.name, c.kind.arrow_type(), true))
            .collect();
        Arc::new(Schema::new(fields))
    }

    /// Schema straight off the CSV: every column as text.
    pub fn raw_schema(&self) -> SchemaRef {
        let fields: Vec<Field> = self
            .columns
            .iter()
            .map(|c| Field::new(c.name, DataType::Utf8, true))
            .collect();
        Arc::new(Schema::new(fields))
    }

    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS {} CASCADE", self.name)
    }

    pub fn create_sql(&self) -> String {
        let cols: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                let pk = if c.name == self.primary_key {
                    " PRIMARY KEY"
                } else {
                    ""
                };
                format!("    {} {}{}", c.name, c.kind.sql_type(), pk)
            })
            .collect();
        format!("CREATE TABLE {} (\n{}\n)", self.name, cols.join(",\n"))
    }

    pub fn insert_prefix(&self) -> String {
        format!(
            "INSERT INTO {} ({}) ",
            self.name,
            self.column_names().join(", ")
        )
    }

    pub fn select_sql(&self) -> String {
        format!(
            "SELECT {} FROM {} ORDER BY {}",
            self.column_names().join(", "),
            self.name,
            self.primary_key
        )
    }
}
