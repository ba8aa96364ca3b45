//! HTTP handlers for all API routes.

pub mod catalog;
pub mod panels;
