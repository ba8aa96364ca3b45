use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use atlas_common::{AtlasError, DatasetRecord};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::options::OptionSet;
use crate::token::normalize_token;

// ── Fields ────────────────────────────────────────────────────────────────────

/// The three linked selection fields, in filter priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    #[serde(alias = "phage")]
    SubjectA,
    #[serde(alias = "host")]
    SubjectB,
    #[serde(alias = "study")]
    Source,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::SubjectA, Field::SubjectB, Field::Source];

    pub fn project<'a>(&self, record: &'a DatasetRecord) -> &'a str {
        match self {
            Field::SubjectA => &record.subject_a,
            Field::SubjectB => &record.subject_b,
            Field::Source => &record.source,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::SubjectA => "subject_a",
            Field::SubjectB => "subject_b",
            Field::Source => "source",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Projections ───────────────────────────────────────────────────────────────

/// Records whose `field` has the same identity token as `value`.
pub fn filter_by<'a, I>(records: I, field: Field, value: &str) -> Vec<&'a DatasetRecord>
where
    I: IntoIterator<Item = &'a DatasetRecord>,
{
    let token = normalize_token(value);
    records
        .into_iter()
        .filter(|r| normalize_token(field.project(r)) == token)
        .collect()
}

/// Distinct projected values in first-occurrence order.
pub fn unique_values<'a, I>(records: I, field: Field) -> Vec<String>
where
    I: IntoIterator<Item = &'a DatasetRecord>,
{
    let mut seen = HashSet::new();
    let mut values = Vec::new();
    for record in records {
        let value = field.project(record);
        if seen.insert(value) {
            values.push(value.to_string());
        }
    }
    values
}

// ── Catalog ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<DatasetRecord>,
}

impl Catalog {
    /// Build a catalog from the overview response. Records repeating an
    /// existing `(subject_a, subject_b, source)` key are dropped.
    pub fn new(records: Vec<DatasetRecord>) -> Self {
        let mut keys = HashSet::new();
        let total = records.len();
        let records: Vec<DatasetRecord> = records
            .into_iter()
            .filter(|r| {
                let key = (
                    normalize_token(&r.subject_a),
                    normalize_token(&r.subject_b),
                    normalize_token(&r.source),
                );
                let fresh = keys.insert(key);
                if !fresh {
                    warn!(
                        subject_a = %r.subject_a,
                        subject_b = %r.subject_b,
                        source = %r.source,
                        "Duplicate dataset record dropped"
                    );
                }
                fresh
            })
            .collect();
        info!(records = records.len(), dropped = total - records.len(), "Catalog loaded");
        Self { records }
    }

    pub fn records(&self) -> &[DatasetRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn filter_by(&self, field: Field, value: &str) -> Vec<&DatasetRecord> {
        filter_by(&self.records, field, value)
    }

    /// Options for `field` across the whole catalog.
    pub fn options(&self, field: Field) -> OptionSet {
        OptionSet::from_labels(unique_values(&self.records, field))
    }

    /// The unique record for a resolved triple.
    pub fn find(&self, subject_a: &str, subject_b: &str, source: &str) -> Option<&DatasetRecord> {
        let (a, b, s) = (
            normalize_token(subject_a),
            normalize_token(subject_b),
            normalize_token(source),
        );
        self.records.iter().find(|r| {
            normalize_token(&r.subject_a) == a
                && normalize_token(&r.subject_b) == b
                && normalize_token(&r.source) == s
        })
    }

    /// First record of a study.
    pub fn study(&self, source: &str) -> Option<&DatasetRecord> {
        let token = normalize_token(source);
        self.records.iter().find(|r| normalize_token(&r.source) == token)
    }
}

/// Outcome of the one catalog load of a session.
#[derive(Debug, Clone)]
pub enum CatalogState {
    Available(Arc<Catalog>),
    Unavailable { reason: String },
}

impl CatalogState {
    pub fn from_result(result: atlas_common::Result<Vec<DatasetRecord>>) -> Self {
        match result {
            Ok(records) => CatalogState::Available(Arc::new(Catalog::new(records))),
            Err(e) => {
                warn!(error = %e, "Dataset catalog unavailable");
                CatalogState::Unavailable { reason: e.to_string() }
            }
        }
    }

    pub fn catalog(&self) -> atlas_common::Result<&Arc<Catalog>> {
        match self {
            CatalogState::Available(catalog) => Ok(catalog),
            CatalogState::Unavailable { reason } => {
                Err(AtlasError::CatalogUnavailable(reason.clone()))
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, CatalogState::Available(_))
    }
}
