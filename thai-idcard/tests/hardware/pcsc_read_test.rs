use serial_test::serial;
use thai_idcard::constants::ACS_VENDOR_ID;
use thai_idcard::transport::{PcscDriver, RusbHost};
use thai_idcard::{Coordinator, ReaderConfig};

// Reads a real Thai ID card through the first ACS reader. Run manually with:
//
// cargo test -p thai-idcard --test hardware --features usb,pcsc -- --ignored --nocapture

#[test]
#[ignore]
#[serial]
fn read_inserted_card() -> anyhow::Result<()> {
    let host = RusbHost::new()?.with_vendor_filter(ACS_VENDOR_ID);
    let coord = Coordinator::new(
        Box::new(host),
        Box::new(PcscDriver::new()?),
        ReaderConfig::default(),
    );

    let Some(first) = coord.device_list()?.into_iter().next() else {
        // no reader attached (CI)
        return Ok(());
    };
    let answer = coord.request_permission(&first.device.identifier)?;
    coord.open_device(&first.device.identifier, answer.has_permission)?;
    let atr = coord.power_on()?;
    println!("ATR {}", thai_idcard::apdu_hex(&atr));

    let outcome = coord.read_all()?;
    for failure in &outcome.failures {
        println!("{}: {}", failure.field, failure.error);
    }
    let cid = outcome.record.cid.unwrap_or_default();
    assert_eq!(cid.len(), 13);
    assert!(cid.chars().all(|c| c.is_ascii_digit()));
    coord.power_off()?;
    Ok(())
}
