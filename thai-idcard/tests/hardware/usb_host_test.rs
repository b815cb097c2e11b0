use serial_test::serial;
use thai_idcard::constants::ACS_VENDOR_ID;
use thai_idcard::transport::RusbHost;
use thai_idcard::{Result, UsbHost};

// Lists ACS readers on the bus. Run manually with:
//
// cargo test -p thai-idcard --test hardware --features usb -- --ignored

#[test]
#[ignore]
#[serial]
fn list_acs_readers() -> Result<()> {
    let host = RusbHost::new()?.with_vendor_filter(ACS_VENDOR_ID);
    for device in host.devices()? {
        assert_eq!(device.vendor_id, ACS_VENDOR_ID);
        assert!(device.identifier.starts_with("/dev/bus/usb/"));
        println!(
            "{} {:04x}:{:04x} permitted={}",
            device.identifier,
            device.vendor_id,
            device.product_id,
            host.has_permission(&device)
        );
    }
    Ok(())
}
