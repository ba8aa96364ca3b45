//! atlas-common — Shared types, errors, and configuration used across all atlas crates.

pub mod config;
pub mod entities;
pub mod error;

// Re-export commonly used types
pub use config::DashboardConfig;
pub use entities::{
    DatasetRecord, EntitySize, HeatmapData, MatrixPayload, MatrixRow, StudyMetadata, Subject,
    TimeSeriesData, TimeSeriesPoint,
};
pub use error::{AtlasError, Result};
