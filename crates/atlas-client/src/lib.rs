//! atlas-client — Access to the external atlas data service.
//!
//! [`AtlasSource`] is the only seam between the dashboard core and the
//! network. [`HttpAtlasSource`] talks to the service over HTTP;
//! [`MockAtlasSource`] serves scripted responses for tests and can hold a
//! study's responses back until released.

pub mod http;
pub mod mock;
pub mod source;

pub use http::HttpAtlasSource;
pub use mock::{EndpointKind, HeatmapRequest, MockAtlasSource};
pub use source::{AtlasSource, HeatmapSelector};
