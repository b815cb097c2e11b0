use thai_idcard::card::{self, ChunkLayout};
use thai_idcard::constants::{ACS_VENDOR_ID, PHOTO_OFFSET, PHOTO_TOTAL_LEN};
use thai_idcard::test_support::{STANDARD_ATR, SampleCard, acs_reader, sample_photo};
use thai_idcard::transport::{MockCard, MockDriver};
use thai_idcard::{Error, FieldName, ReaderConfig, ReaderSession, StatusWord};

fn read_binary_commands(sent: &[Vec<u8>]) -> Vec<(u16, u8)> {
    sent.iter()
        .filter(|a| a[0] == 0x80 && a[1] == 0xB0)
        .map(|a| (u16::from_be_bytes([a[2], a[3]]), a[6]))
        .collect()
}

fn session_for(card: MockCard, config: ReaderConfig) -> (ReaderSession, thai_idcard::transport::OpenedReaders) {
    let driver = MockDriver::new(vec![ACS_VENDOR_ID]).with_card(STANDARD_ATR.to_vec(), card);
    let opened = driver.opened_readers();
    let mut session = ReaderSession::new(Box::new(driver), config);
    session.open(&acs_reader()).unwrap();
    (session, opened)
}

#[test]
fn photo_is_read_in_twenty_chunks() {
    let sample = SampleCard::default();
    let (mut session, opened) = session_for(sample.mock_card(), ReaderConfig::default());

    let outcome = card::read_specific(&mut session, &["photo"]).unwrap();
    let photo = outcome.record.photo.unwrap();
    assert_eq!(photo.len(), PHOTO_TOTAL_LEN);
    assert_eq!(&photo[..2], &[0xFF, 0xD8]);
    assert_eq!(&photo[photo.len() - 2..], &[0xFF, 0xD9]);
    assert_eq!(photo, sample.photo);

    let reader = opened.lock().unwrap()[0].clone();
    let reads = read_binary_commands(&reader.lock().unwrap().sent);
    assert_eq!(reads.len(), 20);
    for (i, (offset, len)) in reads.iter().enumerate() {
        assert_eq!(*offset, PHOTO_OFFSET + (i as u16) * 255);
        assert_eq!(*len, 0xFF);
    }
}

#[test]
fn final_chunk_asks_only_for_the_remainder() {
    let mut sample = SampleCard::default();
    sample.photo = sample_photo(600);
    let config =
        ReaderConfig::default().with_photo_layout(ChunkLayout::new(PHOTO_OFFSET, 600, 255));
    let (mut session, opened) = session_for(sample.mock_card(), config);

    let outcome = card::read_specific(&mut session, &["photo"]).unwrap();
    assert_eq!(outcome.record.photo.as_deref(), Some(&sample.photo[..]));

    let reader = opened.lock().unwrap()[0].clone();
    let reads = read_binary_commands(&reader.lock().unwrap().sent);
    let lens: Vec<u8> = reads.iter().map(|(_, len)| *len).collect();
    assert_eq!(lens, vec![255, 255, 90]);
}

#[test]
fn failing_chunk_drops_the_whole_photo() {
    let sample = SampleCard::default();
    let mut mock = sample.mock_card();
    mock.reject_offset(PHOTO_OFFSET + 255 * 7, StatusWord::new(0x6F00));
    let (mut session, _) = session_for(mock, ReaderConfig::default());

    let outcome = card::read_specific(&mut session, &["cid", "photo", "gender"]).unwrap();
    assert!(outcome.record.photo.is_none());
    assert_eq!(outcome.record.cid.as_deref(), Some(sample.cid.as_str()));
    assert_eq!(outcome.record.gender.as_deref(), Some("1"));
    assert!(matches!(
        outcome.failure(FieldName::Photo),
        Some(Error::CardRejected {
            field: FieldName::Photo,
            ..
        })
    ));
}

#[test]
fn bad_layout_is_reported_as_a_photo_failure() {
    let config = ReaderConfig::default().with_photo_layout(ChunkLayout::new(PHOTO_OFFSET, 600, 0));
    let (mut session, _) = session_for(SampleCard::default().mock_card(), config);

    let outcome = card::read_specific(&mut session, &["photo"]).unwrap();
    assert!(matches!(
        outcome.failure(FieldName::Photo),
        Some(Error::InvalidLayout(_))
    ));
}
