use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use thai_idcard::device::DeviceLifecycleState;
use thai_idcard::test_support::mock_coordinator;
use thai_idcard::{Error, Signal};

use crate::common::fixtures::{acs, sample_card};
use crate::common::{init_logger, wait_until};

const WAIT: Duration = Duration::from_secs(2);

#[test]
fn posted_signals_drive_the_state_machine() {
    init_logger();
    let (coord, host, _) = mock_coordinator(sample_card());
    host.plug(acs(), false);
    host.set_auto_reply(Some(true));
    let coord = Arc::new(coord);
    coord.spawn_event_loop().unwrap();

    let sender = coord.signal_sender();
    sender.post(Signal::Attached(acs()));
    assert!(wait_until(WAIT, || coord.state()
        == DeviceLifecycleState::Opened(acs())));

    sender.post(Signal::Detached(acs()));
    assert!(wait_until(WAIT, || coord.state()
        == DeviceLifecycleState::Detached(acs())));
    assert!(!coord.is_reader_open());
    coord.shutdown();
}

#[test]
fn event_loop_starts_once() {
    let (coord, _, _) = mock_coordinator(sample_card());
    let coord = Arc::new(coord);
    coord.spawn_event_loop().unwrap();
    assert!(matches!(coord.spawn_event_loop(), Err(Error::EventLoop(_))));
    // the queue now belongs to the loop thread
    assert_eq!(coord.run_pending(), 0);
    coord.shutdown();
}

#[test]
fn run_pending_drains_on_the_calling_thread() {
    let (coord, host, _) = mock_coordinator(sample_card());
    host.plug(acs(), false);
    host.set_auto_reply(Some(true));

    coord.dispatch(Signal::Attached(acs()));
    // the auto reply was queued, not dispatched
    assert_eq!(coord.state(), DeviceLifecycleState::AttachedUnpermitted(acs()));
    assert_eq!(coord.run_pending(), 1);
    assert_eq!(coord.state(), DeviceLifecycleState::Opened(acs()));
}

#[test]
fn newest_listener_replaces_the_previous_one() {
    let (coord, host, _) = mock_coordinator(sample_card());
    host.plug(acs(), true);
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    let f = Arc::clone(&first);
    coord.set_device_listener(move |_| {
        f.fetch_add(1, Ordering::SeqCst);
    });
    coord.dispatch(Signal::Attached(acs()));

    let s = Arc::clone(&second);
    coord.set_device_listener(move |_| {
        s.fetch_add(1, Ordering::SeqCst);
    });
    coord.dispatch(Signal::Detached(acs()));

    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[test]
fn events_without_listener_are_dropped() {
    let (coord, host, _) = mock_coordinator(sample_card());
    host.plug(acs(), true);
    coord.dispatch(Signal::Attached(acs()));

    let seen = Arc::new(AtomicUsize::new(0));
    let s = Arc::clone(&seen);
    coord.set_device_listener(move |_| {
        s.fetch_add(1, Ordering::SeqCst);
    });
    // nothing is replayed
    assert_eq!(seen.load(Ordering::SeqCst), 0);
}
