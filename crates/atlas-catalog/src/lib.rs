//! atlas-catalog — The in-memory dataset catalog.
//!
//! The catalog is loaded once per session and never mutated. Every selector
//! option shown to the user is a projection of it: [`Catalog::filter_by`]
//! narrows the rows, [`unique_values`] projects a field and [`OptionSet`]
//! turns the projection into a sorted, deduplicated list for display.

pub mod catalog;
pub mod options;
pub mod token;

pub use catalog::{filter_by, unique_values, Catalog, CatalogState, Field};
pub use options::{OptionSet, SelectOption};
pub use token::normalize_token;
