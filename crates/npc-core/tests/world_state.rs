use npc_core::{FactKey, FactValue, WorldState};

const HUNGRY: FactKey<bool> = FactKey::new("hungry");
const FOOD_IN_VIEW: FactKey<Vec<u64>> = FactKey::new("food_in_view");
const HELD_ITEM: FactKey<Option<u64>> = FactKey::new("held_item");

#[test]
fn update_reports_change_only_for_new_values() {
    let mut state = WorldState::new();

    assert!(state.update(HUNGRY, true), "insert counts as a change");
    assert!(!state.update(HUNGRY, true), "equal value is a no-op");
    assert!(state.update(HUNGRY, false));

    assert_eq!(state.get(HUNGRY), Some(&false));
    assert_eq!(state.drain_changes(), vec!["hungry"]);
    assert!(!state.has_changes());

    assert!(!state.update(HUNGRY, false));
    assert!(state.drain_changes().is_empty());
}

#[test]
fn reference_equal_value_is_not_a_change() {
    let mut state = WorldState::new();
    let food = FactValue::new(vec![7u64, 9]);

    assert!(state.update_value("food_in_view", food.clone()));
    state.drain_changes();

    assert!(!state.update_value("food_in_view", food));
    assert!(!state.has_changes());
    assert_eq!(state.get(FOOD_IN_VIEW), Some(&vec![7, 9]));
}

#[test]
fn missing_fact_reads_as_none_and_flag_defaults_false() {
    let state = WorldState::new();
    assert_eq!(state.get(HELD_ITEM), None);
    assert!(!state.flag(HUNGRY));
    assert!(!state.contains(HUNGRY));
}

#[test]
fn iteration_is_ordered_by_fact_name() {
    let mut state = WorldState::new();
    state.update(HELD_ITEM, None);
    state.update(HUNGRY, true);
    state.update(FOOD_IN_VIEW, vec![]);

    let names: Vec<_> = state.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["food_in_view", "held_item", "hungry"]);
}

#[test]
fn rollback_restores_the_forked_state_exactly() {
    let mut live = WorldState::new();
    live.update(HUNGRY, true);
    live.update(HELD_ITEM, None);

    let mut fork = live.fork();
    assert!(fork.is_journaling());
    assert!(!live.is_journaling());
    let before = fork.clone();

    let cp = fork.checkpoint();
    fork.update(HELD_ITEM, Some(3));
    fork.update(HUNGRY, false);
    fork.update(FOOD_IN_VIEW, vec![3]);
    assert_ne!(fork, before);

    fork.rollback(cp);
    assert_eq!(fork, before);
    assert!(!fork.contains(FOOD_IN_VIEW), "facts inserted after the checkpoint are removed");

    // The live store never sees planning-time writes.
    assert_eq!(live.get(HELD_ITEM), Some(&None));
}

#[test]
fn nested_checkpoints_unwind_in_lifo_order() {
    let mut fork = WorldState::new().fork();
    fork.update(HELD_ITEM, None);

    let outer = fork.checkpoint();
    fork.update(HELD_ITEM, Some(1));
    let inner = fork.checkpoint();
    fork.update(HELD_ITEM, Some(2));

    fork.rollback(inner);
    assert_eq!(fork.get(HELD_ITEM), Some(&Some(1)));
    fork.rollback(outer);
    assert_eq!(fork.get(HELD_ITEM), Some(&None));
}

#[test]
fn no_op_updates_are_not_journaled() {
    let mut fork = WorldState::new().fork();
    fork.update(HUNGRY, true);
    let cp = fork.checkpoint();
    fork.update(HUNGRY, true);
    assert_eq!(fork.checkpoint(), cp);
}

#[test]
#[should_panic(expected = "type mismatch")]
fn reading_with_the_wrong_type_panics() {
    const HUNGRY_AS_NUMBER: FactKey<u32> = FactKey::new("hungry");

    let mut state = WorldState::new();
    state.update(HUNGRY, true);
    let _ = state.get(HUNGRY_AS_NUMBER);
}
