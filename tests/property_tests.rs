//! Property-based tests for the mapping utilities, the machine and the group.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use proptest::prelude::*;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::time::Duration;
use transition_group::builder::TransitionBuilder;
use transition_group::core::TransitionState;
use transition_group::group::{merge_child_mappings, Child, ChildMapping, Stage, TransitionGroup};
use transition_group::scheduler::ManualScheduler;

const KEYS: [u8; 6] = [0, 1, 2, 3, 4, 5];

prop_compose! {
    /// Distinct keys in arbitrary order.
    fn arbitrary_keys()(keys in prop::sample::subsequence(KEYS.to_vec(), 0..=KEYS.len())
        .prop_shuffle()) -> Vec<u8> {
        keys
    }
}

#[derive(Clone, Debug)]
enum Step {
    Present(bool),
    Advance(u64),
}

fn arbitrary_step() -> impl Strategy<Value = Step> {
    prop_oneof![
        any::<bool>().prop_map(Step::Present),
        (0..150u64).prop_map(Step::Advance),
    ]
}

fn children(keys: &[u8]) -> Vec<Child<u8, ()>> {
    keys.iter().map(|key| Child::new(*key, ())).collect()
}

fn mapping(keys: &[u8]) -> ChildMapping<u8, ()> {
    merge_child_mappings(children(keys), &ChildMapping::new()).unwrap()
}

/// `(key, anchor)` for every departed key, in iteration order. Entries
/// are `(key, present)`.
fn anchors(entries: impl Iterator<Item = (u8, bool)>) -> Vec<(u8, Option<u8>)> {
    let mut anchor = None;
    let mut departed = Vec::new();
    for (key, present) in entries {
        if present {
            anchor = Some(key);
        } else {
            departed.push((key, anchor));
        }
    }
    departed
}

proptest! {
    #[test]
    fn merge_keeps_requested_order(prev in arbitrary_keys(), next in arbitrary_keys()) {
        let merged = merge_child_mappings(children(&next), &mapping(&prev)).unwrap();
        let present: Vec<u8> = merged
            .iter()
            .filter(|record| record.directive.present)
            .map(|record| record.key)
            .collect();
        prop_assert_eq!(present, next);
    }

    #[test]
    fn merge_is_superset_without_duplicates(prev in arbitrary_keys(), next in arbitrary_keys()) {
        let merged = merge_child_mappings(children(&next), &mapping(&prev)).unwrap();
        let keys: Vec<u8> = merged.keys().copied().collect();
        let unique: HashSet<u8> = keys.iter().copied().collect();

        prop_assert_eq!(unique.len(), keys.len());
        for key in prev.iter().chain(next.iter()) {
            prop_assert!(unique.contains(key));
        }
    }

    #[test]
    fn departed_keys_follow_their_anchor(prev in arbitrary_keys(), next in arbitrary_keys()) {
        let merged = merge_child_mappings(children(&next), &mapping(&prev)).unwrap();

        // Anchor of a departed key: the last requested key before it.
        let anchors_in_prev = anchors(prev.iter().map(|key| (*key, next.contains(key))));
        let anchors_in_merged = anchors(
            merged.iter().map(|record| (record.key, record.directive.present)),
        );

        let mut expected = anchors_in_prev.clone();
        expected.sort_by_key(|(key, _)| *key);
        let mut actual = anchors_in_merged.clone();
        actual.sort_by_key(|(key, _)| *key);
        prop_assert_eq!(actual, expected);

        // Keys sharing an anchor keep their previous relative order.
        for anchor in next.iter().copied().map(Some).chain(std::iter::once(None)) {
            let followers = |list: &[(u8, Option<u8>)]| -> Vec<u8> {
                list.iter()
                    .filter(|(_, candidate)| *candidate == anchor)
                    .map(|(key, _)| *key)
                    .collect()
            };
            prop_assert_eq!(followers(&anchors_in_merged), followers(&anchors_in_prev));
        }
    }

    #[test]
    fn machine_completes_only_started_phases(
        steps in prop::collection::vec(arbitrary_step(), 1..30)
    ) {
        let clock = ManualScheduler::new();
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let record = |event: &'static str| {
            let log = log.clone();
            move |_: bool| log.borrow_mut().push(event)
        };
        let machine = TransitionBuilder::new()
            .timeout(Duration::from_millis(100))
            .on_enter(record("enter"))
            .on_entering(record("entering"))
            .on_entered(record("entered"))
            .on_exit(record("exit"))
            .on_exiting(record("exiting"))
            .on_exited(record("exited"))
            .build(Rc::new(clock.clone()))
            .unwrap();

        let mut last_presence = false;
        for step in steps {
            match step {
                Step::Present(present) => {
                    machine.update_presence(present);
                    last_presence = present;
                }
                Step::Advance(ms) => {
                    clock.advance(Duration::from_millis(ms));
                }
            }
        }
        clock.run_all_timers();

        let expected = if last_presence {
            TransitionState::Entered
        } else {
            TransitionState::Exited
        };
        prop_assert_eq!(machine.state(), expected);

        // Every completion belongs to the phase started most recently, and
        // no phase is started twice in a row.
        let mut started = None;
        for event in log.borrow().iter().copied() {
            match event {
                "enter" | "exit" => {
                    prop_assert_ne!(started, Some(event));
                    started = Some(event);
                }
                "entered" => prop_assert_eq!(started, Some("enter")),
                "exited" => prop_assert_eq!(started, Some("exit")),
                _ => {}
            }
        }

        let path = machine.history().get_path();
        for pair in path.windows(2) {
            prop_assert_ne!(pair[0], pair[1]);
        }
        if let Some(last) = path.last() {
            prop_assert_eq!(*last, machine.state());
        }
    }

    #[test]
    fn group_settles_on_the_last_request(
        updates in prop::collection::vec((arbitrary_keys(), 0..40u64), 1..8)
    ) {
        let clock = ManualScheduler::new();
        let stage: Stage<u8, ()> = Stage::new(Rc::new(clock.clone()), |_: &u8, _: &()| {
            TransitionBuilder::new().timeout(Duration::from_millis(25))
        });
        let group = TransitionGroup::new(stage.clone());

        let mut last = Vec::new();
        for (keys, ms) in updates {
            group.update(children(&keys)).unwrap();
            clock.advance(Duration::from_millis(ms));
            last = keys;
        }
        clock.run_all_timers();

        prop_assert_eq!(group.rendered_keys(), last.clone());
        prop_assert_eq!(stage.mounted_keys(), last.clone());
        for key in &last {
            prop_assert_eq!(stage.state_of(key), Some(TransitionState::Entered));
        }
    }
}
