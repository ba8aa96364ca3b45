use atlas_catalog::{unique_values, Catalog, Field};
use atlas_common::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::reducer::{reduce, CascadeEffect, CascadeEvent};
use crate::selection::SelectionState;

/// Selection handed over from the overview page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepLink {
    pub subject_a: Option<String>,
    pub subject_b: Option<String>,
    pub source: Option<String>,
}

impl DeepLink {
    fn complete(&self) -> Option<(&str, &str, &str)> {
        match (&self.subject_a, &self.subject_b, &self.source) {
            (Some(a), Some(b), Some(s)) => Some((a, b, s)),
            _ => None,
        }
    }
}

/// Open a panel. A complete deep link that names a catalog record wins;
/// otherwise subject A is the first A label, B the first B among A's
/// records and Source the first study among (A, B)'s records.
///
/// Every step runs through [`reduce`]; the returned effects are those of the
/// settled state.
pub fn initialize(
    catalog: &Catalog,
    deep_link: Option<&DeepLink>,
) -> Result<(SelectionState, Vec<CascadeEffect>)> {
    let mut state = SelectionState::new(catalog);
    let mut effects = vec![CascadeEffect::ResetView];

    let linked = deep_link.and_then(|link| {
        let triple = link.complete();
        let known = triple.and_then(|(a, b, s)| catalog.find(a, b, s));
        if known.is_none() {
            warn!(?link, "Deep link does not name a catalog record, using defaults");
        }
        known
    });

    let steps: Vec<(Field, String)> = match linked {
        Some(record) => {
            info!(source = %record.source, "Opening panel from deep link");
            vec![
                (Field::SubjectA, record.subject_a.clone()),
                (Field::SubjectB, record.subject_b.clone()),
                (Field::Source, record.source.clone()),
            ]
        }
        None => {
            let Some(a) = state.options_a.first().map(|o| o.label.clone()) else {
                return Ok((state, effects));
            };
            let rows_a = catalog.filter_by(Field::SubjectA, &a);
            let b = unique_values(rows_a.iter().copied(), Field::SubjectB)
                .into_iter()
                .next();
            let mut steps = vec![(Field::SubjectA, a)];
            if let Some(b) = b {
                let rows_ab = atlas_catalog::filter_by(rows_a.iter().copied(), Field::SubjectB, &b);
                let source = unique_values(rows_ab, Field::Source).into_iter().next();
                steps.push((Field::SubjectB, b));
                steps.extend(source.map(|s| (Field::Source, s)));
            }
            steps
        }
    };

    for (field, value) in steps {
        let (next, step_effects) = reduce(catalog, &state, &CascadeEvent::set(field, value))?;
        state = next;
        effects = step_effects;
    }
    Ok((state, effects))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::{ResolvedTriple, SelectionStatus};
    use atlas_test_utils::fixtures::{multi_study_catalog, scenario_catalog};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_pick_first_a_then_first_occurrence_b_and_source() {
        let catalog = scenario_catalog();
        let (state, effects) = initialize(&catalog, None).unwrap();
        assert_eq!(state.status(), SelectionStatus::FullySelected);
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
    fn test_complete_deep_link_wins() {
        let catalog = multi_study_catalog();
        let link = DeepLink {
            subject_a: Some("T7".into()),
            subject_b: Some("E.coli-B".into()),
            source: Some("Study2".into()),
        };
        let (state, _) = initialize(&catalog, Some(&link)).unwrap();
        assert_eq!(state.resolved().unwrap().subject_a, "T7");
    }

    #[test]
    fn test_inconsistent_deep_link_falls_back_to_defaults() {
        let catalog = scenario_catalog();
        let link = DeepLink {
            subject_a: Some("T4".into()),
            subject_b: Some("E.coli-B".into()),
            source: Some("Study1".into()),
        };
        let (state, _) = initialize(&catalog, Some(&link)).unwrap();
        assert_eq!(state.resolved().unwrap().source, "Study1");
        assert_eq!(state.resolved().unwrap().subject_b, "E.coli-K12");
    }

    #[test]
    fn test_partial_deep_link_is_ignored() {
        let catalog = scenario_catalog();
        let link = DeepLink { subject_a: Some("T4".into()), ..DeepLink::default() };
        let (state, _) = initialize(&catalog, Some(&link)).unwrap();
        assert_eq!(state.status(), SelectionStatus::FullySelected);
    }

    #[test]
    fn test_empty_catalog_opens_empty_panel() {
        let catalog = Catalog::new(Vec::new());
        let (state, effects) = initialize(&catalog, None).unwrap();
        assert_eq!(state.status(), SelectionStatus::Empty);
        assert_eq!(effects, vec![CascadeEffect::ResetView]);
    }
}
