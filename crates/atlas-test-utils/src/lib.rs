//! Shared fixtures for the workspace tests.

pub mod fixtures;

pub use fixtures::{mock_source, multi_study_catalog, scenario_catalog};
