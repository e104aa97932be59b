//! Pivot tables of benchmark timings: execution times per program,
//! data size, optimization level and source variant, and speedups of
//! source variants over a baseline.

pub mod catalog;
pub mod config;
pub mod config_file;
pub mod ingest;
pub mod pivot;
pub mod rank;
pub mod record;
pub mod report;
pub mod tables;
pub mod time_format;
pub mod utillib;
