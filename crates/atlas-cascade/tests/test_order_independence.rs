//! Different orders of selecting one final triple settle to the same state.

use atlas_cascade::{reduce, CascadeEffect, CascadeEvent, SelectionState, SelectionStatus};
use atlas_catalog::{Catalog, Field};
use atlas_test_utils::fixtures::{multi_study_catalog, scenario_catalog};
use pretty_assertions::assert_eq;

fn run(catalog: &Catalog, steps: &[(Field, &str)]) -> (SelectionState, Vec<CascadeEffect>) {
    let mut state = SelectionState::new(catalog);
    let mut effects = Vec::new();
    for (field, value) in steps {
        let (next, step) = reduce(catalog, &state, &CascadeEvent::set(*field, *value))
            .unwrap_or_else(|e| panic!("{field}={value}: {e}"));
        state = next;
        effects = step;
    }
    (state, effects)
}

fn assert_converges(catalog: &Catalog, orders: &[Vec<(Field, &str)>]) {
    let (reference, reference_effects) = run(catalog, &orders[0]);
    assert_eq!(reference.status(), SelectionStatus::FullySelected);
    for order in &orders[1..] {
        let (state, effects) = run(catalog, order);
        assert_eq!(state, reference, "order {order:?}");
        assert_eq!(effects, reference_effects, "order {order:?}");
    }
}

#[test]
fn test_scenario_catalog_orders_converge() {
    let catalog = scenario_catalog();
    let a = (Field::SubjectA, "T4");
    let b = (Field::SubjectB, "E.coli-K12");
    let s = (Field::Source, "Study1");
    assert_converges(&catalog, &[vec![a, b, s], vec![a, s, b], vec![a, b], vec![a, s], vec![a, s, b, s]]);
}

#[test]
fn test_multi_study_catalog_orders_converge() {
    let catalog = multi_study_catalog();
    let a = (Field::SubjectA, "T4");
    let b = (Field::SubjectB, "E. coli K12");
    let s = (Field::Source, "Study4");
    assert_converges(&catalog, &[vec![a, b, s], vec![a, s, b], vec![a, s], vec![a, b, s, b]]);
}

#[test]
fn test_detour_through_other_values_converges() {
    let catalog = multi_study_catalog();
    let direct = vec![(Field::SubjectA, "T4"), (Field::SubjectB, "E.coli-B"), (Field::Source, "Study2")];
    let detour = vec![
        (Field::SubjectA, "T7"),
        (Field::SubjectB, "E.coli-B"),
        (Field::SubjectA, "T4"),
        (Field::Source, "Study1"),
        (Field::SubjectB, "E.coli-B"),
        (Field::Source, "Study2"),
    ];
    assert_converges(&catalog, &[direct, detour]);
}
