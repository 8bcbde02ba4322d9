use thiserror::Error;

/// Failures a caller may want to tell apart. Everything else travels as
/// `anyhow::Error` with context attached.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("missing environment variables: {}", .0.join(", "))]
    MissingEnv(Vec<String>),

    #[error("invalid DB_PORT {value:?}: {reason}")]
    InvalidPort { value: String, reason: String },

    #[error("table {table}: column {column} not found")]
    MissingColumn { table: String, column: String },

    #[error("table {table}: column {column} has type {actual}, expected {expected}")]
    ColumnType {
        table: String,
        column: String,
        expected: String,
        actual: String,
    },

    #[error("table {table}: row {row} has no usable id ({value:?})")]
    MissingIdentifier {
        table: String,
        row: usize,
        value: Option<String>,
    },

    #[error("listings row {row}: number_of_reviews {value:?} is not an integer")]
    InvalidReviewCount { row: usize, value: String },
}
