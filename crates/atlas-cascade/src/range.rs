//! Dual-handle range slider over a variance rank domain.
//!
//! The two handles always keep `low + min_gap <= high` within the domain.
//! Drag and text input only move the handles; a [`RangeEvent::Commit`]
//! returns the selection the caller should fetch for. Without a known
//! domain the slider is hidden and ignores every event.

use atlas_common::config::RangeConfig;
use atlas_common::{AtlasError, Result, Subject};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Handle {
    Low,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RangeEvent {
    /// Continuous handle movement; visual only.
    Drag { handle: Handle, value: u32 },
    /// Text typed into the numeric field mirroring `handle`.
    Input { handle: Handle, text: String },
    /// Handle released or text field blurred.
    Commit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeDomain {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeSelection {
    pub low: u32,
    pub high: u32,
}

/// Where the low handle starts when a new domain arrives.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum RangePolicy {
    /// Low handle at `round(max * fraction)`: the most variant genes.
    TopVariant { fraction: f64 },
    /// Low handle at the domain minimum.
    FullRange,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RangeSlider {
    subject: Subject,
    min_gap: u32,
    policy: RangePolicy,
    domain: Option<RangeDomain>,
    selection: Option<RangeSelection>,
}

impl RangeSlider {
    pub fn new(subject: Subject, min_gap: u32, policy: RangePolicy) -> Self {
        Self { subject, min_gap, policy, domain: None, selection: None }
    }

    /// Slider for `subject` with the configured gap and default policy.
    pub fn from_config(subject: Subject, config: &RangeConfig) -> Self {
        let policy = if subject == config.top_variant_subject {
            RangePolicy::TopVariant { fraction: config.top_variant_fraction }
        } else {
            RangePolicy::FullRange
        };
        Self::new(subject, config.min_gap, policy)
    }

    pub fn subject(&self) -> Subject {
        self.subject
    }

    pub fn domain(&self) -> Option<RangeDomain> {
        self.domain
    }

    pub fn selection(&self) -> Option<RangeSelection> {
        self.selection
    }

    pub fn is_visible(&self) -> bool {
        self.domain.is_some()
    }

    pub fn hide(&mut self) {
        self.domain = None;
        self.selection = None;
    }

    /// Install the domain `[0, count]` for a newly selected study and reset
    /// both handles to the policy defaults. A domain narrower than the gap
    /// hides the slider.
    pub fn set_domain(&mut self, count: u32) -> Result<RangeSelection> {
        let domain = RangeDomain { min: 0, max: count };
        if domain.max - domain.min < self.min_gap {
            self.hide();
            return Err(AtlasError::InvalidDomain {
                min: domain.min,
                max: domain.max,
                min_gap: self.min_gap,
            });
        }

        let high = domain.max;
        let low = match self.policy {
            RangePolicy::TopVariant { fraction } => (domain.max as f64 * fraction).round() as u32,
            RangePolicy::FullRange => domain.min,
        };
        let selection = RangeSelection {
            low: low.clamp(domain.min, high - self.min_gap),
            high,
        };

        debug!(subject = %self.subject, max = domain.max, low = selection.low, "Range domain reset");
        self.domain = Some(domain);
        self.selection = Some(selection);
        Ok(selection)
    }

    /// Move the low handle, clamped to `[min, high - min_gap]`.
    pub fn set_low(&mut self, value: u32) -> Option<RangeSelection> {
        let domain = self.domain?;
        let selection = self.selection.as_mut()?;
        selection.low = value.clamp(domain.min, selection.high - self.min_gap);
        Some(*selection)
    }

    /// Move the high handle, clamped to `[low + min_gap, max]`.
    pub fn set_high(&mut self, value: u32) -> Option<RangeSelection> {
        let domain = self.domain?;
        let selection = self.selection.as_mut()?;
        selection.high = value.clamp(selection.low + self.min_gap, domain.max);
        Some(*selection)
    }

    /// Apply one event. Returns the selection to fetch for on commit.
    pub fn handle(&mut self, event: RangeEvent) -> Option<RangeSelection> {
        if !self.is_visible() {
            debug!(subject = %self.subject, ?event, "Hidden range slider ignored event");
            return None;
        }
        match event {
            RangeEvent::Drag { handle, value } => {
                self.move_handle(handle, value);
                None
            }
            RangeEvent::Input { handle, text } => {
                if let Some(value) = self.parse_input(handle, &text) {
                    self.move_handle(handle, value);
                }
                None
            }
            RangeEvent::Commit => self.selection,
        }
    }

    /// Handle positions as percentages of the domain, for the track fill.
    pub fn fill(&self) -> Option<(f64, f64)> {
        let domain = self.domain?;
        let selection = self.selection?;
        let span = (domain.max - domain.min) as f64;
        Some((
            (selection.low - domain.min) as f64 / span * 100.0,
            (selection.high - domain.min) as f64 / span * 100.0,
        ))
    }

    fn move_handle(&mut self, handle: Handle, value: u32) {
        match handle {
            Handle::Low => self.set_low(value),
            Handle::High => self.set_high(value),
        };
    }

    /// Empty text means the domain edge of that handle; junk is ignored.
    fn parse_input(&self, handle: Handle, text: &str) -> Option<u32> {
        let domain = self.domain?;
        let text = text.trim();
        if text.is_empty() {
            return Some(match handle {
                Handle::Low => domain.min,
                Handle::High => domain.max,
            });
        }
        match text.parse::<i64>() {
            Ok(v) => Some(v.clamp(0, u32::MAX as i64) as u32),
            Err(_) => {
                debug!(subject = %self.subject, text, "Ignored non-numeric range input");
                None
            }
        }
    }
}
