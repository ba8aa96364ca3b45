use atlas_catalog::{Catalog, Field, OptionSet, SelectOption};
use serde::{Deserialize, Serialize};

/// Per-panel selection: three optional fields plus the option set each
/// field currently offers.
///
/// Outside of [`crate::reduce`] the option sets are always the canonical
/// projection of the catalog for the fields that are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    pub subject_a: Option<SelectOption>,
    pub subject_b: Option<SelectOption>,
    pub source: Option<SelectOption>,
    pub options_a: OptionSet,
    pub options_b: OptionSet,
    pub options_source: OptionSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SelectionStatus {
    Empty,
    PartiallySelected { set: Vec<Field> },
    FullySelected,
}

/// A fully resolved selection, by display label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedTriple {
    pub subject_a: String,
    pub subject_b: String,
    pub source: String,
}

impl SelectionState {
    /// Nothing selected; only subject A offers options.
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            options_a: catalog.options(Field::SubjectA),
            ..Self::default()
        }
    }

    pub fn get(&self, field: Field) -> Option<&SelectOption> {
        match field {
            Field::SubjectA => self.subject_a.as_ref(),
            Field::SubjectB => self.subject_b.as_ref(),
            Field::Source => self.source.as_ref(),
        }
    }

    pub fn options(&self, field: Field) -> &OptionSet {
        match field {
            Field::SubjectA => &self.options_a,
            Field::SubjectB => &self.options_b,
            Field::Source => &self.options_source,
        }
    }

    pub(crate) fn slot(&mut self, field: Field) -> &mut Option<SelectOption> {
        match field {
            Field::SubjectA => &mut self.subject_a,
            Field::SubjectB => &mut self.subject_b,
            Field::Source => &mut self.source,
        }
    }

    pub fn status(&self) -> SelectionStatus {
        let set: Vec<Field> = Field::ALL
            .into_iter()
            .filter(|f| self.get(*f).is_some())
            .collect();
        match set.len() {
            0 => SelectionStatus::Empty,
            3 => SelectionStatus::FullySelected,
            _ => SelectionStatus::PartiallySelected { set },
        }
    }

    pub fn resolved(&self) -> Option<ResolvedTriple> {
        match (&self.subject_a, &self.subject_b, &self.source) {
            (Some(a), Some(b), Some(s)) => Some(ResolvedTriple {
                subject_a: a.label.clone(),
                subject_b: b.label.clone(),
                source: s.label.clone(),
            }),
            _ => None,
        }
    }
}
