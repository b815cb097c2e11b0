use proptest::prelude::*;

use thai_idcard::device::DeviceLifecycleState;
use thai_idcard::events::ReaderEvent;
use thai_idcard::test_support::mock_coordinator;
use thai_idcard::{DeviceEvent, Error, Signal};

use crate::common;
use crate::common::fixtures::{Recorder, acs, foreign_reader, sample_card, second_acs_reader};

#[test]
fn attach_grant_detach_closes_the_reader() {
    common::init_logger();
    let (coord, host, opened) = mock_coordinator(sample_card());
    host.plug(acs(), false);
    let rec = Recorder::attach(&coord);

    coord.dispatch(Signal::Attached(acs()));
    assert_eq!(coord.state(), DeviceLifecycleState::AttachedUnpermitted(acs()));
    assert_eq!(host.permission_requests(), vec![acs().identifier]);

    coord.dispatch(Signal::PermissionResult {
        device: acs(),
        granted: true,
    });
    assert_eq!(coord.state(), DeviceLifecycleState::Opened(acs()));
    assert!(coord.is_reader_open());

    coord.dispatch(Signal::Detached(acs()));
    assert_eq!(coord.state(), DeviceLifecycleState::Detached(acs()));
    assert!(!coord.is_reader_open());
    assert!(opened.lock().unwrap()[0].lock().unwrap().is_closed());

    assert_eq!(
        rec.device_events(),
        vec![
            DeviceEvent::new(acs(), true, false),
            DeviceEvent::new(acs(), true, true),
            DeviceEvent::new(acs(), false, false),
        ]
    );
    assert_eq!(
        rec.reader_events(),
        vec![
            ReaderEvent::Bound { device: acs() },
            ReaderEvent::Released {
                identifier: acs().identifier
            },
        ]
    );
}

#[test]
fn attach_with_permission_does_not_prompt() {
    let (coord, host, opened) = mock_coordinator(sample_card());
    host.plug(acs(), true);
    let rec = Recorder::attach(&coord);

    coord.dispatch(Signal::Attached(acs()));
    assert_eq!(coord.state(), DeviceLifecycleState::AttachedPermitted(acs()));
    assert!(host.permission_requests().is_empty());
    assert!(opened.lock().unwrap().is_empty());
    assert_eq!(rec.device_events(), vec![DeviceEvent::new(acs(), true, true)]);
}

#[test]
fn unsupported_reader_stays_permitted_without_binding() {
    let (coord, host, opened) = mock_coordinator(sample_card());
    host.plug(foreign_reader(), false);
    let rec = Recorder::attach(&coord);

    coord.dispatch(Signal::Attached(foreign_reader()));
    coord.dispatch(Signal::PermissionResult {
        device: foreign_reader(),
        granted: true,
    });

    assert_eq!(
        coord.state(),
        DeviceLifecycleState::AttachedPermitted(foreign_reader())
    );
    assert!(!coord.is_reader_open());
    assert!(opened.lock().unwrap().is_empty());
    assert!(rec.reader_events().is_empty());
    assert_eq!(
        rec.device_events().last(),
        Some(&DeviceEvent::new(foreign_reader(), true, true))
    );
}

#[test]
fn opening_a_second_reader_closes_the_first() {
    let (coord, host, opened) = mock_coordinator(sample_card());
    host.plug(acs(), true);
    host.plug(second_acs_reader(), true);

    coord.open_device(&acs().identifier, true).unwrap();
    coord.open_device(&second_acs_reader().identifier, true).unwrap();

    let readers = opened.lock().unwrap();
    assert_eq!(readers.len(), 2);
    assert!(readers[0].lock().unwrap().is_closed());
    assert!(!readers[1].lock().unwrap().is_closed());
    assert_eq!(coord.bound_device(), Some(second_acs_reader()));
}

#[test]
fn replacing_a_reader_releases_it_before_binding_the_next() {
    let (coord, host, _) = mock_coordinator(sample_card());
    host.plug(acs(), true);
    host.plug(second_acs_reader(), true);
    let rec = Recorder::attach(&coord);

    coord.open_device(&acs().identifier, true).unwrap();
    coord.open_device(&second_acs_reader().identifier, true).unwrap();

    assert_eq!(coord.state(), DeviceLifecycleState::Opened(second_acs_reader()));
    assert_eq!(
        rec.reader_events(),
        vec![
            ReaderEvent::Bound { device: acs() },
            ReaderEvent::Released {
                identifier: acs().identifier
            },
            ReaderEvent::Bound {
                device: second_acs_reader()
            },
        ]
    );
}

#[test]
fn failed_open_of_unsupported_reader_keeps_the_open_one() {
    let (coord, host, opened) = mock_coordinator(sample_card());
    host.plug(acs(), true);
    host.plug(foreign_reader(), true);
    coord.open_device(&acs().identifier, true).unwrap();
    let rec = Recorder::attach(&coord);

    let err = coord.open_device(&foreign_reader().identifier, true);
    assert!(matches!(err, Err(Error::UnsupportedDevice { .. })));

    assert_eq!(coord.state(), DeviceLifecycleState::Opened(acs()));
    assert_eq!(coord.bound_device(), Some(acs()));
    assert!(coord.is_reader_open());
    let readers = opened.lock().unwrap();
    assert_eq!(readers.len(), 1);
    assert!(!readers[0].lock().unwrap().is_closed());
    assert!(rec.reader_events().is_empty());
}

#[test]
fn attach_of_another_reader_keeps_the_open_one() {
    let (coord, host, _) = mock_coordinator(sample_card());
    host.plug(acs(), true);
    host.plug(second_acs_reader(), false);
    coord.open_device(&acs().identifier, true).unwrap();

    coord.dispatch(Signal::Attached(second_acs_reader()));
    assert_eq!(coord.state(), DeviceLifecycleState::Opened(acs()));
    assert!(coord.is_reader_open());

    // detaching the untracked reader leaves the open one alone
    coord.dispatch(Signal::Detached(second_acs_reader()));
    assert_eq!(coord.state(), DeviceLifecycleState::Opened(acs()));
    assert_eq!(coord.bound_device(), Some(acs()));
}

#[test]
fn detach_without_attach_still_notifies() {
    let (coord, _, _) = mock_coordinator(sample_card());
    let rec = Recorder::attach(&coord);
    coord.dispatch(Signal::Detached(acs()));
    assert_eq!(coord.state(), DeviceLifecycleState::NotPresent);
    assert_eq!(rec.device_events(), vec![DeviceEvent::new(acs(), false, false)]);
    assert!(rec.reader_events().is_empty());
}

#[derive(Debug, Clone, Copy)]
enum Step {
    Attach,
    Grant,
    Deny,
    Detach,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::Attach),
        Just(Step::Grant),
        Just(Step::Deny),
        Just(Step::Detach),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn detach_always_leaves_no_open_handle(steps in prop::collection::vec(step_strategy(), 0..12)) {
        let (coord, host, opened) = mock_coordinator(sample_card());
        host.plug(acs(), false);

        for step in steps {
            let signal = match step {
                Step::Attach => Signal::Attached(acs()),
                Step::Grant => Signal::PermissionResult { device: acs(), granted: true },
                Step::Deny => Signal::PermissionResult { device: acs(), granted: false },
                Step::Detach => Signal::Detached(acs()),
            };
            coord.dispatch(signal);
        }
        coord.dispatch(Signal::Detached(acs()));

        let state = coord.state();
        prop_assert!(!state.is_attached());
        prop_assert!(!coord.is_reader_open());
        for reader in opened.lock().unwrap().iter() {
            prop_assert!(reader.lock().unwrap().is_closed());
        }
    }
}
