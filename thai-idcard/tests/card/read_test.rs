use std::collections::BTreeSet;

use thai_idcard::constants::{CID_LAYOUT, GENDER_LAYOUT};
use thai_idcard::events::ReaderEvent;
use thai_idcard::test_support::{
    ALTERNATE_ATR, STANDARD_ATR, SampleCard, mock_coordinator, mock_coordinator_with_atr,
};
use thai_idcard::transport::MockCard;
use thai_idcard::{Coordinator, Error, FieldName, StatusWord};

use crate::common;
use crate::common::fixtures::{Recorder, acs, sample_card};

fn opened(card: MockCard) -> Coordinator {
    let (coord, host, _) = mock_coordinator(card);
    host.plug(acs(), true);
    coord.open_device(&acs().identifier, true).unwrap();
    coord
}

#[test]
fn read_specific_returns_only_requested_fields() {
    common::init_logger();
    let coord = opened(sample_card());
    assert_eq!(coord.power_on().unwrap(), STANDARD_ATR.to_vec());

    let outcome = coord
        .read_specific(&["gender", "cid", "shoeSize", "cid"])
        .unwrap();
    assert!(outcome.is_complete());
    assert_eq!(
        outcome.record.fields(),
        BTreeSet::from([FieldName::Cid, FieldName::Gender])
    );
    assert_eq!(outcome.record.cid.as_deref(), Some("1101700203451"));
    assert_eq!(outcome.record.gender.as_deref(), Some("1"));
}

#[test]
fn empty_selection_reads_nothing() {
    let coord = opened(sample_card());
    let outcome = coord.read_specific::<&str>(&[]).unwrap();
    assert!(outcome.record.is_empty());
    assert!(outcome.failures.is_empty());
}

#[test]
fn read_all_is_repeatable() {
    let coord = opened(sample_card());
    let first = coord.read_all().unwrap();
    let second = coord.read_all().unwrap();
    assert!(first.is_complete());
    assert_eq!(first.record, second.record);
    assert_eq!(first.record.fields().len(), FieldName::ALL.len());
}

#[test]
fn read_all_without_power_on_brings_the_card_up() {
    let coord = opened(sample_card());
    let outcome = coord.read_all().unwrap();
    assert_eq!(
        outcome.record.name_th.as_ref().map(|n| n.full_name()),
        Some("นาย สมชาย ใจดี".to_string())
    );
}

#[test]
fn rejected_cid_aborts_a_full_read() {
    let mut card = sample_card();
    card.reject_offset(CID_LAYOUT.0, StatusWord::new(0x6A82));
    let coord = opened(card);

    match coord.read_all() {
        Err(Error::CardRejected { field, status_word }) => {
            assert_eq!(field, FieldName::Cid);
            assert_eq!(status_word, StatusWord::new(0x6A82));
        }
        other => panic!("unexpected result {:?}", other.map(|o| o.record)),
    }
}

#[test]
fn rejected_field_is_reported_in_a_selective_read() {
    let mut card = sample_card();
    card.reject_offset(CID_LAYOUT.0, StatusWord::new(0x6A82));
    card.reject_offset(GENDER_LAYOUT.0, StatusWord::new(0x6B00));
    let coord = opened(card);

    let outcome = coord.read_specific(&["cid", "gender", "birthdate"]).unwrap();
    assert_eq!(outcome.record.fields(), BTreeSet::from([FieldName::Birthdate]));
    assert_eq!(outcome.failures.len(), 2);
    assert!(matches!(
        outcome.failure(FieldName::Gender),
        Some(Error::CardRejected { status_word, .. }) if *status_word == StatusWord::new(0x6B00)
    ));
}

#[test]
fn foreign_card_is_not_recognized() {
    let coord = opened(MockCard::new(&[0xA0, 0x00, 0x00, 0x00, 0x03, 0x10, 0x10], vec![0; 32]));
    assert!(matches!(
        coord.read_all(),
        Err(Error::CardNotRecognized { .. })
    ));
    // power on still reports the ATR even though the applet is missing
    assert_eq!(coord.power_on().unwrap(), STANDARD_ATR.to_vec());
}

#[test]
fn alternate_batch_reads_with_p2_one() {
    let sample = SampleCard::default();
    let mut card = sample.mock_card();
    card.get_response_p2 = 0x01;
    let (coord, host, readers) = mock_coordinator_with_atr(card, ALTERNATE_ATR.to_vec());
    host.plug(acs(), true);
    coord.open_device(&acs().identifier, true).unwrap();

    let outcome = coord.read_all().unwrap();
    assert!(outcome.is_complete());
    assert_eq!(outcome.record.cid, Some(sample.cid));

    let reader = readers.lock().unwrap()[0].clone();
    let sent = reader.lock().unwrap().sent.clone();
    let get_responses: Vec<_> = sent.iter().filter(|a| a[1] == 0xC0).collect();
    assert!(!get_responses.is_empty());
    assert!(get_responses.iter().all(|a| a[3] == 0x01));
}

#[test]
fn reads_need_an_open_reader() {
    let (coord, _, _) = mock_coordinator(sample_card());
    assert!(matches!(coord.read_all(), Err(Error::ReaderUnavailable)));
    assert!(matches!(coord.power_on(), Err(Error::ReaderUnavailable)));
}

#[test]
fn power_off_releases_the_reader() {
    let coord = opened(sample_card());
    let rec = Recorder::attach(&coord);
    coord.power_on().unwrap();
    coord.power_off().unwrap();

    assert!(!coord.is_reader_open());
    assert_eq!(
        rec.reader_events(),
        vec![ReaderEvent::Released {
            identifier: acs().identifier
        }]
    );
    assert!(matches!(
        coord.read_specific(&["cid"]),
        Err(Error::ReaderUnavailable)
    ));
}
