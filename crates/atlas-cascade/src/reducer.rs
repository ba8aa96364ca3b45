//! The cascade reducer.
//!
//! One event in, one settled state out. Per change of a field:
//!
//! 1. The new value must be one of the field's current options.
//! 2. Dependent selections are reset: a change of subject A clears B and
//!    Source, and setting B drops a Source that no longer matches. Clearing
//!    B keeps a set Source and takes B from that study again.
//! 3. Defaults are filled in (set events only): B without Source selects the
//!    Source when exactly one study qualifies, Source without B selects the
//!    study's B.
//! 4. Option sets are recomputed, subject A filtering first.
//! 5. The view effect is derived from the settled state.

use atlas_catalog::{filter_by, unique_values, Catalog, Field, OptionSet, SelectOption};
use atlas_common::{AtlasError, DatasetRecord, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::selection::{ResolvedTriple, SelectionState, SelectionStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CascadeEvent {
    /// Field set to a label or token, or cleared with `None`.
    FieldChanged { field: Field, value: Option<String> },
    /// Deselect all.
    Reset,
}

impl CascadeEvent {
    pub fn set(field: Field, value: impl Into<String>) -> Self {
        CascadeEvent::FieldChanged { field, value: Some(value.into()) }
    }

    pub fn clear(field: Field) -> Self {
        CascadeEvent::FieldChanged { field, value: None }
    }
}

/// Notification for the view layer, emitted after the state has settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "triple", rename_all = "snake_case")]
pub enum CascadeEffect {
    /// Blank every dependent view.
    ResetView,
    /// Fetch and render the views for a resolved selection.
    LoadView(ResolvedTriple),
}

pub fn reduce(
    catalog: &Catalog,
    state: &SelectionState,
    event: &CascadeEvent,
) -> Result<(SelectionState, Vec<CascadeEffect>)> {
    let mut next = state.clone();

    match event {
        CascadeEvent::Reset => {
            next.subject_a = None;
            next.subject_b = None;
            next.source = None;
        }
        CascadeEvent::FieldChanged { field, value } => {
            let chosen = match value {
                None => None,
                Some(v) => Some(
                    state
                        .options(*field)
                        .resolve(v)
                        .cloned()
                        .ok_or_else(|| AtlasError::InvalidOption {
                            field: field.to_string(),
                            value: v.clone(),
                        })?,
                ),
            };
            apply_change(catalog, &mut next, *field, chosen);
            if value.is_some() {
                apply_defaults(catalog, &mut next);
            }
        }
    }

    recompute_options(catalog, &mut next);

    let status = next.status();
    let effect = match next.resolved() {
        Some(triple) => CascadeEffect::LoadView(triple),
        None => CascadeEffect::ResetView,
    };
    debug!(?event, ?status, "Cascade settled");
    Ok((next, vec![effect]))
}

fn apply_change(catalog: &Catalog, next: &mut SelectionState, field: Field, chosen: Option<SelectOption>) {
    let changed = next.get(field) != chosen.as_ref();
    *next.slot(field) = chosen;
    if !changed {
        return;
    }

    match field {
        Field::SubjectA => {
            next.subject_b = None;
            next.source = None;
        }
        Field::SubjectB => {
            if next.subject_b.is_none() {
                if next.source.is_some() {
                    next.subject_b = study_host(catalog, next);
                }
            } else if next.source.is_some() && matching_rows(catalog, next).is_empty() {
                debug!("Source no longer matches subject B, cleared");
                next.source = None;
            }
        }
        Field::Source => {
            if next.subject_b.is_some() && matching_rows(catalog, next).is_empty() {
                next.subject_b = None;
            }
        }
    }
}

fn apply_defaults(catalog: &Catalog, next: &mut SelectionState) {
    if next.subject_a.is_none() {
        return;
    }
    match (next.subject_b.is_some(), next.source.is_some()) {
        (true, false) => {
            let sources = unique_values(matching_rows(catalog, next), Field::Source);
            if let [only] = sources.as_slice() {
                debug!(source = %only, "Single study for subject B, selected");
                next.source = Some(SelectOption::new(only.as_str()));
            }
        }
        (false, true) => next.subject_b = study_host(catalog, next),
        _ => {}
    }
}

/// First subject B, in catalog order, among the rows of the set fields.
fn study_host(catalog: &Catalog, state: &SelectionState) -> Option<SelectOption> {
    let hosts = unique_values(matching_rows(catalog, state), Field::SubjectB);
    if hosts.len() > 1 {
        debug!(candidates = hosts.len(), "Study maps to several subject B values, taking the first");
    }
    hosts.into_iter().next().map(|label| SelectOption::new(label.as_str()))
}

fn recompute_options(catalog: &Catalog, next: &mut SelectionState) {
    next.options_a = catalog.options(Field::SubjectA);

    let Some(a) = &next.subject_a else {
        next.options_b = OptionSet::empty();
        next.options_source = OptionSet::empty();
        return;
    };

    let rows_a = catalog.filter_by(Field::SubjectA, &a.value);
    next.options_b = OptionSet::from_labels(unique_values(rows_a.iter().copied(), Field::SubjectB));

    let rows_source = match &next.subject_b {
        Some(b) => filter_by(rows_a.iter().copied(), Field::SubjectB, &b.value),
        None => rows_a,
    };
    next.options_source = OptionSet::from_labels(unique_values(rows_source, Field::Source));
}

/// Rows matching every set field, subject A first.
fn matching_rows<'a>(catalog: &'a Catalog, state: &SelectionState) -> Vec<&'a DatasetRecord> {
    let mut rows: Vec<&DatasetRecord> = catalog.records().iter().collect();
    for field in Field::ALL {
        if let Some(option) = state.get(field) {
            rows = filter_by(rows, field, &option.value);
        }
    }
    rows
}

/// True when the set fields select at least one record.
pub fn is_consistent(catalog: &Catalog, state: &SelectionState) -> bool {
    state.status() == SelectionStatus::Empty || !matching_rows(catalog, state).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_test_utils::fixtures::{multi_study_catalog, record, scenario_catalog};
    use pretty_assertions::assert_eq;

    fn apply(catalog: &Catalog, state: SelectionState, event: CascadeEvent) -> (SelectionState, Vec<CascadeEffect>) {
        reduce(catalog, &state, &event).unwrap()
    }

    #[test]
    fn test_selecting_a_offers_sorted_b_and_leaves_source_unset() {
        let catalog = scenario_catalog();
        let (state, effects) = apply(&catalog, SelectionState::new(&catalog), CascadeEvent::set(Field::SubjectA, "T4"));
        assert_eq!(state.options_b.labels(), vec!["E.coli-B", "E.coli-K12"]);
        assert!(state.subject_b.is_none());
        assert!(state.source.is_none());
        assert_eq!(effects, vec![CascadeEffect::ResetView]);
    }

    #[test]
    fn test_b_with_single_study_auto_selects_source() {
        let catalog = scenario_catalog();
        let (state, _) = apply(&catalog, SelectionState::new(&catalog), CascadeEvent::set(Field::SubjectA, "T4"));
        let (state, effects) = apply(&catalog, state, CascadeEvent::set(Field::SubjectB, "E.coli-K12"));
        assert_eq!(state.source.as_ref().map(|s| s.label.as_str()), Some("Study1"));
        assert_eq!(
            effects,
            vec![CascadeEffect::LoadView(ResolvedTriple {
                subject_a: "T4".into(),
                subject_b: "E.coli-K12".into(),
                source: "Study1".into(),
            })]
        );
    }

    #[test]
    fn test_b_with_several_studies_leaves_source_unset() {
        let catalog = multi_study_catalog();
        let (state, _) = apply(&catalog, SelectionState::new(&catalog), CascadeEvent::set(Field::SubjectA, "T4"));
        let (state, effects) = apply(&catalog, state, CascadeEvent::set(Field::SubjectB, "E. coli K12"));
        assert!(state.source.is_none());
        assert_eq!(state.options_source.labels(), vec!["Study1", "Study4"]);
        assert_eq!(effects, vec![CascadeEffect::ResetView]);
    }

    #[test]
    fn test_source_without_b_selects_the_study_host() {
        let catalog = scenario_catalog();
        let (state, _) = apply(&catalog, SelectionState::new(&catalog), CascadeEvent::set(Field::SubjectA, "T4"));
        let (state, effects) = apply(&catalog, state, CascadeEvent::set(Field::Source, "Study2"));
        assert_eq!(state.subject_b.as_ref().map(|b| b.label.as_str()), Some("E.coli-B"));
        assert!(matches!(effects[0], CascadeEffect::LoadView(_)));
        // B options stay the full list under A.
        assert_eq!(state.options_b.labels(), vec!["E.coli-B", "E.coli-K12"]);
    }

    #[test]
    fn test_changing_a_resets_b_and_source() {
        let catalog = multi_study_catalog();
        let (state, _) = apply(&catalog, SelectionState::new(&catalog), CascadeEvent::set(Field::SubjectA, "T4"));
        let (state, _) = apply(&catalog, state, CascadeEvent::set(Field::Source, "Study2"));
        assert_eq!(state.status(), SelectionStatus::FullySelected);

        let (state, effects) = apply(&catalog, state, CascadeEvent::set(Field::SubjectA, "T7"));
        assert!(state.subject_b.is_none());
        assert!(state.source.is_none());
        assert_eq!(effects, vec![CascadeEffect::ResetView]);
    }

    #[test]
    fn test_changing_b_drops_mismatched_source_and_resets_views() {
        let catalog = multi_study_catalog();
        let (state, _) = apply(&catalog, SelectionState::new(&catalog), CascadeEvent::set(Field::SubjectA, "T4"));
        let (state, _) = apply(&catalog, state, CascadeEvent::set(Field::Source, "Study2"));
        let (state, effects) = apply(&catalog, state, CascadeEvent::set(Field::SubjectB, "E. coli K12"));
        assert_eq!(state.subject_b.as_ref().map(|b| b.value.as_str()), Some("E._coli_K12"));
        assert!(state.source.is_none());
        assert_eq!(effects, vec![CascadeEffect::ResetView]);
    }

    #[test]
    fn test_clearing_b_keeps_source_and_takes_b_from_the_study() {
        let catalog = scenario_catalog();
        let (state, _) = apply(&catalog, SelectionState::new(&catalog), CascadeEvent::set(Field::SubjectA, "T4"));
        let (state, _) = apply(&catalog, state, CascadeEvent::set(Field::Source, "Study2"));
        assert_eq!(state.subject_b.as_ref().map(|b| b.label.as_str()), Some("E.coli-B"));

        let (state, effects) = apply(&catalog, state, CascadeEvent::clear(Field::SubjectB));
        assert_eq!(state.subject_a.as_ref().map(|a| a.label.as_str()), Some("T4"));
        assert_eq!(state.source.as_ref().map(|s| s.label.as_str()), Some("Study2"));
        assert_eq!(state.subject_b.as_ref().map(|b| b.label.as_str()), Some("E.coli-B"));
        assert!(matches!(effects[0], CascadeEffect::LoadView(_)));
    }

    #[test]
    fn test_clearing_b_without_source_leaves_both_unset() {
        let catalog = multi_study_catalog();
        let (state, _) = apply(&catalog, SelectionState::new(&catalog), CascadeEvent::set(Field::SubjectA, "T4"));
        let (state, _) = apply(&catalog, state, CascadeEvent::set(Field::SubjectB, "E. coli K12"));
        assert!(state.source.is_none());

        let (state, effects) = apply(&catalog, state, CascadeEvent::clear(Field::SubjectB));
        assert!(state.subject_b.is_none());
        assert!(state.source.is_none());
        assert_eq!(state.options_source.labels(), vec!["Study1", "Study2", "Study4"]);
        assert_eq!(effects, vec![CascadeEffect::ResetView]);
    }

    #[test]
    fn test_study_with_several_hosts_takes_first_in_catalog_order() {
        let catalog = Catalog::new(vec![
            record(1, "T4", "E.coli-K12", "Shared"),
            record(2, "T4", "E.coli-B", "Shared"),
        ]);
        let (state, _) = apply(&catalog, SelectionState::new(&catalog), CascadeEvent::set(Field::SubjectA, "T4"));
        let (state, _) = apply(&catalog, state, CascadeEvent::set(Field::Source, "Shared"));
        assert_eq!(state.subject_b.as_ref().map(|b| b.label.as_str()), Some("E.coli-K12"));
    }

    #[test]
    fn test_clearing_source_keeps_user_chosen_b() {
        let catalog = scenario_catalog();
        let (state, _) = apply(&catalog, SelectionState::new(&catalog), CascadeEvent::set(Field::SubjectA, "T4"));
        let (state, _) = apply(&catalog, state, CascadeEvent::set(Field::SubjectB, "E.coli-K12"));
        let (state, effects) = apply(&catalog, state, CascadeEvent::clear(Field::Source));
        assert!(state.subject_b.is_some());
        assert!(state.source.is_none());
        assert_eq!(effects, vec![CascadeEffect::ResetView]);
    }

    #[test]
    fn test_value_outside_options_is_rejected_without_state_change() {
        let catalog = scenario_catalog();
        let state = SelectionState::new(&catalog);
        let err = reduce(&catalog, &state, &CascadeEvent::set(Field::SubjectB, "E.coli-K12")).unwrap_err();
        assert!(matches!(err, AtlasError::InvalidOption { .. }));
    }

    #[test]
    fn test_whitespace_labels_resolve_by_token() {
        let catalog = multi_study_catalog();
        let (state, _) = apply(&catalog, SelectionState::new(&catalog), CascadeEvent::set(Field::SubjectA, "T4"));
        let (state, _) = apply(&catalog, state, CascadeEvent::set(Field::SubjectB, "E._coli_K12"));
        let b = state.subject_b.unwrap();
        assert_eq!(b.label, "E. coli K12");
        assert_eq!(b.value, "E._coli_K12");
    }

    #[test]
    fn test_reset_returns_to_empty() {
        let catalog = scenario_catalog();
        let (state, _) = apply(&catalog, SelectionState::new(&catalog), CascadeEvent::set(Field::SubjectA, "T4"));
        let (state, _) = apply(&catalog, state, CascadeEvent::set(Field::SubjectB, "E.coli-K12"));
        let (state, effects) = apply(&catalog, state, CascadeEvent::Reset);
        assert_eq!(state.status(), SelectionStatus::Empty);
        assert!(state.options_b.is_empty());
        assert!(state.options_source.is_empty());
        assert_eq!(state.options_a.labels(), vec!["T4"]);
        assert_eq!(effects, vec![CascadeEffect::ResetView]);
    }

    #[test]
    fn test_reselecting_same_triple_loads_again() {
        let catalog = scenario_catalog();
        let (state, _) = apply(&catalog, SelectionState::new(&catalog), CascadeEvent::set(Field::SubjectA, "T4"));
        let (state, first) = apply(&catalog, state, CascadeEvent::set(Field::Source, "Study1"));
        let (again, second) = apply(&catalog, state.clone(), CascadeEvent::set(Field::Source, "Study1"));
        assert_eq!(first, second);
        assert_eq!(state, again);
    }

    #[test]
    fn test_settled_state_is_always_consistent() {
        let catalog = multi_study_catalog();
        let mut state = SelectionState::new(&catalog);
        let events = [
            CascadeEvent::set(Field::SubjectA, "T4"),
            CascadeEvent::set(Field::Source, "Study4"),
            CascadeEvent::set(Field::SubjectB, "E.coli-B"),
            CascadeEvent::set(Field::Source, "Study2"),
            CascadeEvent::clear(Field::SubjectB),
            CascadeEvent::set(Field::SubjectA, "T7"),
            CascadeEvent::set(Field::SubjectB, "E.coli-B"),
        ];
        for event in events {
            state = apply(&catalog, state, event).0;
            assert!(is_consistent(&catalog, &state), "inconsistent after {state:?}");
        }
    }
}
