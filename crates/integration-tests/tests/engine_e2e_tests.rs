//! End-to-end tests for the SDB execution coordinator
//!
//! These tests run mock script engines on their own threads against a shared
//! coordinator, with the test thread playing the debugger surface:
//! - Breakpoints suspend the script thread until the surface resumes it
//! - Step into, over and out land on the expected statements
//! - Teardown releases suspended script threads
//! - Concurrent scripts are dispatched one at a time

use std::{sync::Arc, thread, time::Duration};

use sdb_common::{BreakType, Breakpoint, ResumeAction, StepMode};
use sdb_engine::{Coordinator, CoordinatorConfig, DispatchState};
use sdb_integration_tests::test_utils::{
    engine::{MockEngine, MockScript},
    init,
    logging::capture_warnings,
    observer::{AutoObserver, ChannelObserver, ObserverEvent, ObserverEvents},
};
use tracing::info;

/// Long enough for a runnable thread to make progress, short enough to keep the suite quick.
const SETTLE: Duration = Duration::from_millis(100);

fn setup() -> (Arc<Coordinator>, ObserverEvents) {
    init::init_test_environment();
    let (observer, events) = ChannelObserver::channel();
    (Arc::new(Coordinator::new(CoordinatorConfig::default()).with_observer(observer)), events)
}

#[test]
fn test_breakpoint_blocks_until_continue() {
    let (coordinator, events) = setup();
    let script = MockScript::flat(10);
    let engine = MockEngine::new();
    coordinator.attach(&engine.handle());

    let session = coordinator.open_session(script.program());
    coordinator.add_breakpoint(session, Breakpoint::new(5, 0)).unwrap();

    let handle = engine.spawn(coordinator.clone(), script.clone());
    let (paused_in, line, reason) = events.expect_pause();
    assert_eq!((paused_in, line, reason), (session, 5, BreakType::Break));

    thread::sleep(SETTLE);
    assert_eq!(engine.executed(), vec![1, 2, 3, 4]);
    assert_eq!(coordinator.dispatch_state(), DispatchState::Dispatching(session));
    assert_eq!(engine.loaded_breakpoints(), vec![Breakpoint::new(5, 0)]);

    coordinator.continue_execution().unwrap();
    handle.join().unwrap();

    info!("Script finished after continue");
    assert_eq!(engine.executed(), script.lines());
    assert_eq!(coordinator.dispatch_state(), DispatchState::Idle);
    let pauses = events.drain().into_iter().filter(|e| matches!(e, ObserverEvent::Paused { .. })).count();
    assert_eq!(pauses, 0);
}

#[test]
fn test_breakpoint_in_function_hits_every_call() {
    let (coordinator, events) = setup();
    let script = MockScript::two_calls();
    let engine = MockEngine::new();
    coordinator.attach(&engine.handle());
    let session = coordinator.open_session(script.program());
    coordinator.add_breakpoint_at_line(session, 3).unwrap();

    let handle = engine.spawn(coordinator.clone(), script.clone());
    assert_eq!(events.expect_pause().1, 3);
    assert_eq!(engine.executed(), vec![5, 6, 2]);
    coordinator.continue_execution().unwrap();

    assert_eq!(events.expect_pause().1, 3);
    assert_eq!(engine.executed(), vec![5, 6, 2, 3, 7, 8, 2]);
    coordinator.continue_execution().unwrap();

    handle.join().unwrap();
    assert_eq!(engine.executed(), script.lines());
}

#[test]
fn test_step_over_skips_call() {
    let (coordinator, events) = setup();
    let script = MockScript::two_calls();
    let engine = MockEngine::new();
    coordinator.attach(&engine.handle());
    let session = coordinator.open_session(script.program());
    coordinator.add_breakpoint(session, Breakpoint::new(6, 0)).unwrap();

    let handle = engine.spawn(coordinator.clone(), script.clone());
    assert_eq!(events.expect_pause().1, 6);

    coordinator.step_over().unwrap();
    let (_, line, reason) = events.expect_pause();
    assert_eq!((line, reason), (7, BreakType::Step));
    assert_eq!(engine.executed(), vec![5, 6, 2, 3]);

    coordinator.step_over().unwrap();
    assert_eq!(events.expect_pause().1, 8);

    coordinator.continue_execution().unwrap();
    handle.join().unwrap();
    assert_eq!(engine.executed(), script.lines());
}

#[test]
fn test_step_into_then_out() {
    let (coordinator, events) = setup();
    let script = MockScript::two_calls();
    let engine = MockEngine::new();
    coordinator.attach(&engine.handle());
    let session = coordinator.open_session(script.program());
    coordinator.add_breakpoint(session, Breakpoint::new(6, 0)).unwrap();

    let handle = engine.spawn(coordinator.clone(), script.clone());
    assert_eq!(events.expect_pause().1, 6);

    coordinator.step_into().unwrap();
    assert_eq!(events.expect_pause().1, 2);

    coordinator.step_out().unwrap();
    assert_eq!(events.expect_pause().1, 7);
    assert_eq!(engine.executed(), vec![5, 6, 2, 3]);

    coordinator.continue_execution().unwrap();
    handle.join().unwrap();
}

#[test]
fn test_breakpoint_interrupts_step_over() {
    let (coordinator, events) = setup();
    let script = MockScript::two_calls();
    let engine = MockEngine::new();
    coordinator.attach(&engine.handle());
    let session = coordinator.open_session(script.program());
    coordinator.add_breakpoint(session, Breakpoint::new(6, 0)).unwrap();

    let handle = engine.spawn(coordinator.clone(), script.clone());
    assert_eq!(events.expect_pause().1, 6);

    // Set while paused: synced to the engine right away
    coordinator.add_breakpoint_at_line(session, 3).unwrap();
    assert_eq!(engine.loaded_breakpoints().len(), 2);

    coordinator.step_over().unwrap();
    assert_eq!(events.expect_pause(), (session, 3, BreakType::Break));

    // The breakpoint cancelled the step, so continue runs on to the second call
    coordinator.continue_execution().unwrap();
    assert_eq!(events.expect_pause().1, 3);
    assert_eq!(engine.executed(), vec![5, 6, 2, 3, 7, 8, 2]);
    assert!(coordinator.remove_breakpoint(session, &Breakpoint::new(3, 4)).unwrap());
    coordinator.continue_execution().unwrap();
    handle.join().unwrap();
    assert_eq!(engine.executed(), script.lines());
}

#[test]
fn test_close_session_releases_blocked_thread() {
    let (coordinator, events) = setup();
    let script = MockScript::flat(8);
    let engine = MockEngine::new();
    coordinator.attach(&engine.handle());
    let session = coordinator.open_session(script.program());
    coordinator.add_breakpoint(session, Breakpoint::new(5, 0)).unwrap();

    let handle = engine.spawn(coordinator.clone(), script.clone());
    assert_eq!(events.expect_pause().1, 5);

    let (result, capture) = capture_warnings(|| coordinator.close_session(session));
    result.unwrap();
    handle.join().unwrap();

    assert_eq!(engine.executed(), script.lines());
    assert!(capture.messages().iter().any(|m| m.contains("session closed")));
    assert!(events.drain().contains(&ObserverEvent::Closed(session)));
}

#[test]
fn test_dropping_coordinator_releases_blocked_thread() {
    init::init_test_environment();
    let (observer, events) = ChannelObserver::channel();
    let coordinator = Arc::new(Coordinator::default().with_observer(observer));
    coordinator.request_break();

    let script = MockScript::flat(3);
    let engine = MockEngine::new();
    let worker_coordinator = coordinator.clone();
    let worker_engine = engine.clone();
    let handle = thread::spawn(move || {
        let statement = &script.statements()[0];
        let continuation =
            worker_coordinator.notify(&worker_engine.handle(), script.info(statement), BreakType::Step);
        drop(worker_coordinator);
        continuation.wait();
        continuation.is_signaled()
    });

    assert_eq!(events.expect_pause().1, 1);
    drop(coordinator);
    assert!(handle.join().unwrap());
}

#[test]
fn test_second_script_waits_for_first() {
    let (coordinator, events) = setup();
    let first = MockScript::flat(6);
    let second = MockScript::new("one();\ntwo();").statement(1, &[]).statement(2, &[]);
    let (first_engine, second_engine) = (MockEngine::new(), MockEngine::new());
    coordinator.attach(&first_engine.handle());
    coordinator.attach(&second_engine.handle());

    let first_session = coordinator.open_session(first.program());
    let second_session = coordinator.open_session(second.program());
    coordinator.add_breakpoint(first_session, Breakpoint::new(3, 0)).unwrap();
    coordinator.add_breakpoint(second_session, Breakpoint::new(2, 0)).unwrap();

    let first_handle = first_engine.spawn(coordinator.clone(), first.clone());
    assert_eq!(events.expect_pause(), (first_session, 3, BreakType::Break));

    // Even a statement that would run freely waits for the dispatch to end
    let second_handle = second_engine.spawn(coordinator.clone(), second.clone());
    thread::sleep(SETTLE);
    assert!(second_engine.executed().is_empty());
    assert_eq!(coordinator.active_session(), Some(first_session));

    coordinator.continue_execution().unwrap();
    assert_eq!(events.expect_pause(), (second_session, 2, BreakType::Break));
    assert_eq!(second_engine.executed(), vec![1]);

    coordinator.continue_execution().unwrap();
    first_handle.join().unwrap();
    second_handle.join().unwrap();
    assert_eq!(first_engine.executed(), first.lines());
    assert_eq!(second_engine.executed(), second.lines());
    assert_eq!(coordinator.sessions(), vec![first_session, second_session]);
}

#[test]
fn test_same_text_shares_session_across_engines() {
    let (coordinator, events) = setup();
    let script = MockScript::flat(4);
    let session = coordinator.open_session(script.program());
    coordinator.add_breakpoint(session, Breakpoint::new(2, 0)).unwrap();

    for _ in 0..2 {
        let engine = MockEngine::new();
        coordinator.attach(&engine.handle());
        // Same text, separate allocation
        let rerun = MockScript::flat(4);
        let handle = engine.spawn(coordinator.clone(), rerun);
        assert_eq!(events.expect_pause(), (session, 2, BreakType::Break));
        assert_eq!(engine.loaded_breakpoints(), vec![Breakpoint::new(2, 0)]);
        coordinator.continue_execution().unwrap();
        handle.join().unwrap();
    }
    assert_eq!(coordinator.sessions(), vec![session]);
}

#[test]
fn test_detached_engine_never_notifies() {
    let (coordinator, events) = setup();
    let script = MockScript::flat(3);
    let engine = MockEngine::new();
    coordinator.attach(&engine.handle());
    coordinator.detach(&engine.handle());
    coordinator.request_break();

    engine.run(&coordinator, &script);
    assert_eq!(engine.executed(), script.lines());
    assert!(events.drain().is_empty());
    assert!(coordinator.is_break_requested());
}

#[test]
fn test_observer_resumes_from_callback() {
    init::init_test_environment();
    let observer = AutoObserver::new([
        ResumeAction::Step(StepMode::Into),
        ResumeAction::Step(StepMode::Over),
        ResumeAction::Step(StepMode::Out),
        ResumeAction::Continue,
    ]);
    let coordinator = Arc::new(Coordinator::default().with_observer(observer.clone()));
    observer.bind(&coordinator);

    let script = MockScript::two_calls();
    let engine = MockEngine::new();
    coordinator.attach(&engine.handle());
    let session = coordinator.open_session(script.program());
    coordinator.add_breakpoint(session, Breakpoint::new(6, 0)).unwrap();

    // Runs on the test thread: every pause is answered before the engine waits
    engine.run(&coordinator, &script);

    assert_eq!(
        observer.pauses(),
        vec![
            (6, BreakType::Break),
            (2, BreakType::Step),
            (3, BreakType::Step),
            (7, BreakType::Step),
        ]
    );
    assert_eq!(engine.executed(), script.lines());
}

#[test]
fn test_break_flag_changes_reach_subscriber() {
    init::init_test_environment();
    let observer = AutoObserver::new([ResumeAction::Step(StepMode::Over)]);
    let coordinator = Arc::new(Coordinator::default().with_observer(observer.clone()));
    observer.bind(&coordinator);

    let (sender, receiver) = std::sync::mpsc::channel();
    coordinator.subscribe_break_requested(move |requested| {
        let _ = sender.send(requested);
    });

    let script = MockScript::two_calls();
    let engine = MockEngine::new();
    coordinator.attach(&engine.handle());
    coordinator.request_break();
    engine.run(&coordinator, &script);

    // Break at 5, step over to 6, then run to the end
    assert_eq!(observer.pauses(), vec![(5, BreakType::Step), (6, BreakType::Step)]);
    assert_eq!(receiver.try_iter().collect::<Vec<_>>(), vec![true, false, true, false]);
}

#[test]
fn test_break_on_start_from_config() {
    init::init_test_environment();
    let (observer, events) = ChannelObserver::channel();
    let config = CoordinatorConfig::default().with_break_on_start(true);
    let coordinator = Arc::new(Coordinator::new(config).with_observer(observer));

    let script = MockScript::flat(2);
    let engine = MockEngine::new();
    coordinator.attach(&engine.handle());
    let handle = engine.spawn(coordinator.clone(), script.clone());

    let (session, line, reason) = events.expect_pause();
    assert_eq!((line, reason), (1, BreakType::Step));
    assert_eq!(coordinator.snapshot(session).unwrap().last_debug_information.unwrap().location().line, 1);

    coordinator.continue_execution().unwrap();
    handle.join().unwrap();
    assert!(engine.is_debugging());
}
