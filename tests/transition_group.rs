//! End-to-end behaviour of groups driving one machine per child.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use transition_group::builder::TransitionBuilder;
use transition_group::core::TransitionState;
use transition_group::group::{
    Child, FirstChild, GroupPolicy, Lifecycle, RenderedChild, Stage, TransitionGroup,
};
use transition_group::scheduler::ManualScheduler;
use transition_group::TransitionError;

type Log = Rc<RefCell<Vec<String>>>;

/// Builder whose callbacks append `"<key>:<event>"` to `log`.
fn logging_builder(key: u32, log: &Log, timeout: Duration) -> TransitionBuilder {
    let entry = move |log: &Log, appearing_label: &'static str, label: &'static str| {
        let log = log.clone();
        move |appearing: bool| {
            let label = if appearing { appearing_label } else { label };
            log.borrow_mut().push(format!("{key}:{label}"));
        }
    };
    TransitionBuilder::new()
        .timeout(timeout)
        .on_enter(entry(log, "appear", "enter"))
        .on_entering(entry(log, "appearing", "entering"))
        .on_entered(entry(log, "appeared", "entered"))
        .on_exit(entry(log, "exit", "exit"))
        .on_exiting(entry(log, "exiting", "exiting"))
        .on_exited(entry(log, "exited", "exited"))
}

fn logging_stage(clock: &ManualScheduler, log: &Log, timeout: Duration) -> Stage<u32, ()> {
    let log = log.clone();
    Stage::new(Rc::new(clock.clone()), move |key: &u32, _: &()| {
        logging_builder(*key, &log, timeout)
    })
}

fn children(keys: &[u32]) -> Vec<Child<u32, ()>> {
    keys.iter().map(|key| Child::new(*key, ())).collect()
}

fn drain(log: &Log) -> Vec<String> {
    log.borrow_mut().drain(..).collect()
}

#[test]
fn counter_round_trip_fires_callbacks_in_order() {
    let clock = ManualScheduler::new();
    let log = Log::default();
    let stage = logging_stage(&clock, &log, Duration::ZERO);
    let group = TransitionGroup::with_policy(stage.clone(), GroupPolicy::default().appear(true));

    group.update(children(&[1])).unwrap();
    clock.run_all_timers();
    assert_eq!(drain(&log), ["1:appear", "1:appearing", "1:appeared"]);

    group.update(children(&[1, 2])).unwrap();
    clock.run_all_timers();
    assert_eq!(drain(&log), ["2:enter", "2:entering", "2:entered"]);

    group.update(children(&[1])).unwrap();
    clock.run_all_timers();
    assert_eq!(drain(&log), ["2:exit", "2:exiting", "2:exited"]);

    assert_eq!(group.rendered_keys(), vec![1]);
    assert_eq!(stage.mounted_keys(), vec![1]);
    assert_eq!(stage.state_of(&1), Some(TransitionState::Entered));
}

#[test]
fn removed_child_stays_rendered_until_exit_completes() {
    let clock = ManualScheduler::new();
    let log = Log::default();
    let stage = logging_stage(&clock, &log, Duration::ZERO);
    let group = TransitionGroup::new(stage.clone());

    group.update(children(&[1, 2])).unwrap();
    group.update(children(&[1])).unwrap();

    assert_eq!(group.rendered_keys(), vec![1, 2]);
    assert_eq!(group.lifecycle(&2), Some(Lifecycle::Exiting));
    assert_eq!(stage.state_of(&2), Some(TransitionState::Exiting));

    clock.run_all_timers();
    assert_eq!(group.rendered_keys(), vec![1]);
    assert!(stage.state_of(&2).is_none());
    assert_eq!(drain(&log), ["2:exit", "2:exiting", "2:exited"]);
}

#[test]
fn only_the_first_render_appears() {
    let seen: Rc<RefCell<Vec<Vec<(u32, Lifecycle)>>>> = Rc::default();
    let sink = seen.clone();
    let group = TransitionGroup::new(
        move |rendered: &[RenderedChild<u32, ()>]| -> Result<(), TransitionError> {
            sink.borrow_mut().push(
                rendered
                    .iter()
                    .map(|child| (child.key, child.props.lifecycle))
                    .collect(),
            );
            Ok(())
        },
    );

    group.update(children(&[1, 2])).unwrap();
    group.update(children(&[1, 2, 3])).unwrap();

    let seen = seen.borrow();
    assert_eq!(
        seen[0],
        vec![(1, Lifecycle::Appearing), (2, Lifecycle::Appearing)]
    );
    assert_eq!(
        seen[1],
        vec![
            (1, Lifecycle::Existing),
            (2, Lifecycle::Existing),
            (3, Lifecycle::Entering)
        ]
    );
}

#[test]
fn empty_first_update_counts_as_the_first_render() {
    let clock = ManualScheduler::new();
    let log = Log::default();
    let stage = logging_stage(&clock, &log, Duration::ZERO);
    let group = TransitionGroup::with_policy(stage.clone(), GroupPolicy::default().appear(true));

    group.update(Vec::new()).unwrap();
    assert!(group.is_empty());
    assert!(group.has_rendered_once());
    assert!(stage.is_empty());

    group.update(children(&[1])).unwrap();
    clock.run_all_timers();
    assert_eq!(group.lifecycle(&1), Some(Lifecycle::Entering));
    assert_eq!(drain(&log), ["1:enter", "1:entering", "1:entered"]);
}

#[test]
fn first_child_renders_nothing_for_an_empty_group() {
    let forwarded: Rc<RefCell<Vec<Vec<u32>>>> = Rc::default();
    let sink = forwarded.clone();
    let group = TransitionGroup::new(FirstChild::new(
        move |rendered: &[RenderedChild<u32, ()>]| -> Result<(), TransitionError> {
            sink.borrow_mut()
                .push(rendered.iter().map(|child| child.key).collect());
            Ok(())
        },
    ));

    group.update(Vec::new()).unwrap();
    group.update(children(&[7])).unwrap();
    group.update(children(&[8])).unwrap();

    assert_eq!(*forwarded.borrow(), vec![vec![], vec![7], vec![7]]);
    assert_eq!(group.rendered_keys(), vec![7, 8]);
}

#[test]
fn child_readded_mid_exit_reenters_in_place() {
    let clock = ManualScheduler::new();
    let log = Log::default();
    let mounts = Rc::new(RefCell::new(0));
    let counter = mounts.clone();
    let factory_log = log.clone();
    let stage = Stage::new(Rc::new(clock.clone()), move |key: &u32, _: &()| {
        *counter.borrow_mut() += 1;
        logging_builder(*key, &factory_log, Duration::from_millis(100))
    });
    let group = TransitionGroup::new(stage.clone());

    group.update(children(&[1, 2])).unwrap();
    group.update(children(&[2])).unwrap();
    clock.advance(Duration::from_millis(50));
    assert_eq!(stage.state_of(&1), Some(TransitionState::Exiting));

    group.update(children(&[1, 2])).unwrap();
    assert_eq!(stage.state_of(&1), Some(TransitionState::Entering));

    clock.run_all_timers();
    assert_eq!(stage.state_of(&1), Some(TransitionState::Entered));
    assert_eq!(group.rendered_keys(), vec![1, 2]);
    assert_eq!(*mounts.borrow(), 2);
    assert_eq!(
        drain(&log),
        ["1:exit", "1:exiting", "1:enter", "1:entering", "1:entered"]
    );
}

#[test]
fn reversing_an_enter_never_reports_entered() {
    let clock = ManualScheduler::new();
    let log = Log::default();
    let machine = logging_builder(1, &log, Duration::from_millis(100))
        .build(Rc::new(clock.clone()))
        .unwrap();

    machine.update_presence(true);
    clock.advance(Duration::from_millis(40));
    machine.update_presence(false);
    clock.run_all_timers();

    assert_eq!(machine.state(), TransitionState::Exited);
    assert_eq!(
        drain(&log),
        ["1:enter", "1:entering", "1:exit", "1:exiting", "1:exited"]
    );
}

#[test]
fn duplicate_keys_leave_the_group_untouched() {
    let clock = ManualScheduler::new();
    let log = Log::default();
    let stage = logging_stage(&clock, &log, Duration::ZERO);
    let group = TransitionGroup::new(stage.clone());

    group.update(children(&[1])).unwrap();
    let error = group.update(children(&[2, 2])).unwrap_err();

    assert!(matches!(error, TransitionError::DuplicateKey(_)));
    assert_eq!(group.rendered_keys(), vec![1]);
    assert_eq!(stage.mounted_keys(), vec![1]);
}

#[test]
fn missing_timeout_surfaces_from_the_renderer() {
    let clock = ManualScheduler::new();
    let stage: Stage<u32, ()> =
        Stage::new(Rc::new(clock.clone()), |_: &u32, _: &()| TransitionBuilder::new());
    let group = TransitionGroup::new(stage);

    let error = group.update(children(&[1])).unwrap_err();
    assert!(matches!(error, TransitionError::Configuration(_)));
}

/// Stage whose factory leaves key 3 without a timeout.
fn stage_failing_on_three(clock: &ManualScheduler, log: &Log) -> Stage<u32, ()> {
    let log = log.clone();
    Stage::new(Rc::new(clock.clone()), move |key: &u32, _: &()| {
        if *key == 3 {
            TransitionBuilder::new()
        } else {
            logging_builder(*key, &log, Duration::from_millis(10))
        }
    })
}

#[test]
fn failed_mount_does_not_hold_back_exits() {
    let clock = ManualScheduler::new();
    let log = Log::default();
    let stage = stage_failing_on_three(&clock, &log);
    let group = TransitionGroup::new(stage.clone());

    group.update(children(&[1, 2])).unwrap();
    let error = group.update(children(&[3])).unwrap_err();
    assert!(matches!(error, TransitionError::Configuration(_)));
    assert_eq!(stage.state_of(&1), Some(TransitionState::Exiting));
    assert_eq!(stage.state_of(&2), Some(TransitionState::Exiting));
    assert!(stage.state_of(&3).is_none());
    assert_eq!(stage.mounted_keys(), vec![1, 2]);

    clock.run_all_timers();
    assert_eq!(group.rendered_keys(), vec![3]);
    assert!(stage.is_empty());
    assert_eq!(
        drain(&log),
        ["1:exit", "1:exiting", "2:exit", "2:exiting", "1:exited", "2:exited"]
    );
}

#[test]
fn synchronous_exit_is_pruned_even_when_a_mount_fails() {
    let clock = ManualScheduler::new();
    let log = Log::default();
    let stage = stage_failing_on_three(&clock, &log);
    let group = TransitionGroup::with_policy(stage.clone(), GroupPolicy::default().exit(false));

    group.update(children(&[1])).unwrap();
    assert!(group.update(children(&[3])).is_err());

    assert_eq!(group.rendered_keys(), vec![3]);
    assert!(stage.is_empty());
    assert_eq!(drain(&log), ["1:exit", "1:exiting", "1:exited"]);
}
