//! HTTP host for the phage/host dashboard.
//!
//! Every panel runs in its own task ([`host::spawn_panel`]) that owns the
//! [`atlas_views::Panel`] and serialises API commands with fetch outcomes.
//! Each change is pushed to `/api/events` subscribers as a panel snapshot.

pub mod error;
pub mod handlers;
pub mod host;
pub mod router;
pub mod sse;
pub mod state;
