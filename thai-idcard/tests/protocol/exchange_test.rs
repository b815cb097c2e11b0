use thai_idcard::card::operations::exchange;
use thai_idcard::protocol::{Command, GetResponseVariant};
use thai_idcard::test_support::session_with_reader;
use thai_idcard::transport::MockReader;
use thai_idcard::{Error, StatusWord};

#[test]
fn chained_get_response_collects_data() {
    let mut reader = MockReader::new(vec![0x3B, 0x68, 0x00, 0x00]);
    reader.push_response(vec![0x61, 0x03]);
    reader.push_response(vec![0x01, 0x02, 0x03, 0x90, 0x00]);
    let (mut session, shared) = session_with_reader(reader).unwrap();

    let resp = exchange(
        &mut session,
        GetResponseVariant::Standard,
        &Command::ReadBinary {
            offset: 0x00D9,
            length: 3,
        },
    )
    .unwrap();
    assert_eq!(resp.payload, vec![0x01, 0x02, 0x03]);

    let sent = shared.lock().unwrap().sent.clone();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1], hex::decode("00c0000003").unwrap());
}

#[test]
fn direct_status_skips_get_response() {
    let mut reader = MockReader::new(vec![0x3B, 0x68, 0x00, 0x00]);
    reader.push_response(vec![0x69, 0x82]);
    let (mut session, shared) = session_with_reader(reader).unwrap();

    let resp = exchange(
        &mut session,
        GetResponseVariant::Standard,
        &Command::ReadBinary {
            offset: 0x0004,
            length: 13,
        },
    )
    .unwrap();
    assert_eq!(resp.status_word, StatusWord::new(0x6982));
    assert_eq!(shared.lock().unwrap().sent.len(), 1);
}

#[test]
fn transport_failure_propagates() {
    let mut reader = MockReader::new(vec![0x3B, 0x68, 0x00, 0x00]);
    reader.push_response(vec![0x90, 0x00]);
    reader.transmit_failures = 1;
    let (mut session, _) = session_with_reader(reader).unwrap();

    let result = exchange(
        &mut session,
        GetResponseVariant::Standard,
        &Command::ReadBinary {
            offset: 0,
            length: 1,
        },
    );
    assert!(matches!(result, Err(Error::TransmitFailed(_))));
}
