//! Listing and review ingestion, export and analysis for two cities'
//! short-term-rental datasets.
//!
//! The three binaries under `src/bin/` are thin drivers:
//! - `ingest`: CSV files → cleaned arrow batches → `listings` / `reviews` tables
//! - `export`: tables → `exports/*.csv`
//! - `analyze`: tables → console report + two PNG charts

pub mod analysis;
pub mod city;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod ingest;
pub mod table;
pub mod telemetry;

pub use city::City;
pub use error::PipelineError;
