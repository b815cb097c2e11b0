//! Test support helpers intended for use by unit and integration tests.
//!
//! These helpers centralize the mock reader and sample card setup so tests
//! across the crate and the tests/ directory build the same fixtures.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use crate::config::ReaderConfig;
use crate::constants::{self, ACS_VENDOR_ID, THAI_ID_AID};
use crate::coordinator::Coordinator;
use crate::reader::ReaderSession;
use crate::transport::{MockCard, MockDriver, MockReader, MockUsbHost, OpenedReaders};
use crate::types::UsbDeviceDescriptor;
use crate::utils::encode_tis620;
use crate::{Error, Result};

/// ATR of the common card batch (standard GET RESPONSE).
pub const STANDARD_ATR: [u8; 12] = [
    0x3B, 0x68, 0x00, 0x00, 0x00, 0x73, 0xC8, 0x40, 0x12, 0x00, 0x90, 0x00,
];

/// ATR of the batch that wants P2 = 0x01 on GET RESPONSE.
pub const ALTERNATE_ATR: [u8; 11] = [
    0x3B, 0x67, 0x00, 0x00, 0x2D, 0x20, 0x36, 0x00, 0x78, 0x90, 0x00,
];

/// The ACS reader from the permission scenario: vendor 1839, product 8704.
#[doc(hidden)]
pub fn acs_reader() -> UsbDeviceDescriptor {
    UsbDeviceDescriptor::new("/dev/bus/usb/001/002", ACS_VENDOR_ID, 0x2200)
        .with_names(
            Some("ACS".to_string()),
            Some("ACR39U ICC Reader".to_string()),
        )
        .with_interface_count(1)
        .with_device_id(1002)
}

/// Citizen data written into a simulated card image.
#[derive(Debug, Clone)]
pub struct SampleCard {
    pub cid: String,
    pub name_th: String,
    pub name_en: String,
    pub birthdate: String,
    pub gender: String,
    pub issuer: String,
    pub issue_date: String,
    pub expire_date: String,
    pub address: String,
    pub photo: Vec<u8>,
}

impl Default for SampleCard {
    fn default() -> Self {
        Self {
            cid: "1101700203451".into(),
            name_th: "นาย#สมชาย##ใจดี".into(),
            name_en: "Mr.#Somchai##Jaidee".into(),
            birthdate: "25300115".into(),
            gender: "1".into(),
            issuer: "สำนักงานเขตบางรัก/กรุงเทพมหานคร".into(),
            issue_date: "25620301".into(),
            expire_date: "25700114".into(),
            address: "99/1#หมู่ที่ 2####ตำบลสีลม#อำเภอบางรัก#จังหวัดกรุงเทพมหานคร".into(),
            photo: sample_photo(constants::PHOTO_TOTAL_LEN),
        }
    }
}

/// JPEG-looking bytes: SOI marker, a counting body, EOI marker.
pub fn sample_photo(len: usize) -> Vec<u8> {
    let mut photo: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    if len >= 4 {
        photo[..2].copy_from_slice(&[0xFF, 0xD8]);
        photo[len - 2..].copy_from_slice(&[0xFF, 0xD9]);
    }
    photo
}

fn put_text(card: &mut MockCard, layout: (u16, u8), text: &str) {
    let mut bytes = encode_tis620(text);
    bytes.resize(usize::from(layout.1), 0x20);
    card.write(usize::from(layout.0), &bytes);
}

impl SampleCard {
    /// Card memory holding every field at its applet offset.
    pub fn mock_card(&self) -> MockCard {
        let mut card = MockCard::new(&THAI_ID_AID, Vec::new());
        put_text(&mut card, constants::CID_LAYOUT, &self.cid);
        put_text(&mut card, constants::NAME_TH_LAYOUT, &self.name_th);
        put_text(&mut card, constants::NAME_EN_LAYOUT, &self.name_en);
        put_text(&mut card, constants::BIRTHDATE_LAYOUT, &self.birthdate);
        put_text(&mut card, constants::GENDER_LAYOUT, &self.gender);
        put_text(&mut card, constants::ISSUER_LAYOUT, &self.issuer);
        put_text(&mut card, constants::ISSUE_DATE_LAYOUT, &self.issue_date);
        put_text(&mut card, constants::EXPIRE_DATE_LAYOUT, &self.expire_date);
        put_text(&mut card, constants::ADDRESS_LAYOUT, &self.address);
        card.write(usize::from(constants::PHOTO_OFFSET), &self.photo);
        card
    }
}

/// Open a session on `reader` (handed out by a mock driver) and bring the
/// card up. Returns the session and shared access to the reader.
#[doc(hidden)]
pub fn session_with_reader(reader: MockReader) -> Result<(ReaderSession, Arc<Mutex<MockReader>>)> {
    let driver = MockDriver::new(vec![ACS_VENDOR_ID]).with_reader(reader);
    let opened = driver.opened_readers();
    let mut session = ReaderSession::new(Box::new(driver), ReaderConfig::default());
    session.open(&acs_reader())?;
    session.ensure_ready()?;

    let shared = opened
        .lock()
        .map_err(|_| Error::OpenFailed("mock driver poisoned".into()))?
        .last()
        .cloned()
        .ok_or_else(|| Error::OpenFailed("mock driver opened nothing".into()))?;
    Ok((session, shared))
}

/// Session on a standard-ATR reader with `card` inserted.
#[doc(hidden)]
pub fn ready_session(card: MockCard) -> Result<(ReaderSession, Arc<Mutex<MockReader>>)> {
    session_with_reader(MockReader::new(STANDARD_ATR.to_vec()).with_card(card))
}

/// Coordinator over a mock USB host and a mock reader SDK whose readers
/// hold `card`. The host starts empty; plug devices through the returned
/// handle.
#[doc(hidden)]
pub fn mock_coordinator(card: MockCard) -> (Coordinator, MockUsbHost, OpenedReaders) {
    mock_coordinator_with_atr(card, STANDARD_ATR.to_vec())
}

#[doc(hidden)]
pub fn mock_coordinator_with_atr(
    card: MockCard,
    atr: Vec<u8>,
) -> (Coordinator, MockUsbHost, OpenedReaders) {
    let host = MockUsbHost::new();
    let driver = MockDriver::new(vec![ACS_VENDOR_ID]).with_card(atr, card);
    let opened = driver.opened_readers();
    let coord = Coordinator::new(
        Box::new(host.clone()),
        Box::new(driver),
        ReaderConfig::default(),
    );
    (coord, host, opened)
}
