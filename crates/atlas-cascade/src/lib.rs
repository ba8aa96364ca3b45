//! atlas-cascade — Linked selection fields and the variance range slider.
//!
//! The three selection fields of a panel (subject A, subject B, source) are
//! driven by a pure reducer: [`reduce`] maps a state and one
//! [`CascadeEvent`] to the settled next state plus the
//! [`CascadeEffect`]s the view layer must act on. [`initialize`] opens a
//! panel with its default or deep-linked selection. [`RangeSlider`] holds
//! one axis of the dual-handle variance filter.

pub mod initialize;
pub mod range;
pub mod reducer;
pub mod selection;
pub mod selector;

pub use initialize::{initialize, DeepLink};
pub use range::{Handle, RangeDomain, RangeEvent, RangePolicy, RangeSelection, RangeSlider};
pub use reducer::{reduce, CascadeEffect, CascadeEvent};
pub use selection::{ResolvedTriple, SelectionState, SelectionStatus};
pub use selector::{MemorySelector, Selector, SelectorBindings};
