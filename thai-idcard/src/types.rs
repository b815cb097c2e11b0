// thai-idcard/src/types.rs

use std::fmt;

use derive_more::Display;

/// Snapshot of a USB device taken at enumeration (or hotplug) time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct UsbDeviceDescriptor {
    pub identifier: String,
    pub vendor_id: u16,
    pub product_id: u16,
    pub manufacturer_name: Option<String>,
    pub product_name: Option<String>,
    pub interface_count: Option<u8>,
    pub device_id: u32,
}

impl UsbDeviceDescriptor {
    pub fn new(identifier: impl Into<String>, vendor_id: u16, product_id: u16) -> Self {
        Self {
            identifier: identifier.into(),
            vendor_id,
            product_id,
            manufacturer_name: None,
            product_name: None,
            interface_count: None,
            device_id: 0,
        }
    }

    pub fn with_names(mut self, manufacturer: Option<String>, product: Option<String>) -> Self {
        self.manufacturer_name = manufacturer;
        self.product_name = product;
        self
    }

    pub fn with_interface_count(mut self, count: u8) -> Self {
        self.interface_count = Some(count);
        self
    }

    pub fn with_device_id(mut self, device_id: u32) -> Self {
        self.device_id = device_id;
        self
    }

    /// Two snapshots refer to the same physical device when their platform
    /// identifiers match.
    pub fn same_device(&self, other: &UsbDeviceDescriptor) -> bool {
        self.identifier == other.identifier
    }
}

/// ISO/IEC 7816 status word (SW1 SW2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[display(fmt = "{:04X}", _0)]
pub struct StatusWord(u16);

impl StatusWord {
    pub const SUCCESS: Self = Self(0x9000);

    pub const fn new(sw: u16) -> Self {
        Self(sw)
    }

    pub fn from_bytes(sw1: u8, sw2: u8) -> Self {
        Self(u16::from_be_bytes([sw1, sw2]))
    }

    pub fn as_u16(&self) -> u16 {
        self.0
    }

    pub fn sw1(&self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub fn sw2(&self) -> u8 {
        (self.0 & 0xff) as u8
    }

    pub fn is_success(&self) -> bool {
        *self == Self::SUCCESS
    }

    /// `61xx`: the card holds `xx` response bytes for a GET RESPONSE.
    pub fn bytes_available(&self) -> Option<u8> {
        if self.sw1() == 0x61 {
            Some(self.sw2())
        } else {
            None
        }
    }
}

/// Logical reader channel index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct Slot(pub u8);

/// Transmission protocol negotiated with the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub enum Protocol {
    #[default]
    T0,
    T1,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::T0 => f.write_str("T=0"),
            Protocol::T1 => f.write_str("T=1"),
        }
    }
}

/// Power actions understood by reader transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub enum PowerAction {
    PowerDown,
    ColdReset,
    #[default]
    WarmReset,
}

/// Logical data fields of the Thai national ID applet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldName {
    Cid,
    NameTh,
    NameEn,
    Birthdate,
    Gender,
    Issuer,
    IssueDate,
    ExpireDate,
    Address,
    Photo,
}

impl FieldName {
    pub const ALL: [FieldName; 10] = [
        FieldName::Cid,
        FieldName::NameTh,
        FieldName::NameEn,
        FieldName::Birthdate,
        FieldName::Gender,
        FieldName::Issuer,
        FieldName::IssueDate,
        FieldName::ExpireDate,
        FieldName::Address,
        FieldName::Photo,
    ];

    /// Name used by host applications when selecting fields.
    pub fn wire_name(&self) -> &'static str {
        match self {
            FieldName::Cid => "cid",
            FieldName::NameTh => "nameTH",
            FieldName::NameEn => "nameEN",
            FieldName::Birthdate => "birthdate",
            FieldName::Gender => "gender",
            FieldName::Issuer => "issuer",
            FieldName::IssueDate => "issueDate",
            FieldName::ExpireDate => "expireDate",
            FieldName::Address => "address",
            FieldName::Photo => "photo",
        }
    }

    /// Parse a host-supplied field name. Unknown names yield `None`.
    pub fn from_wire_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.wire_name() == name)
    }

    /// The identity field; a failure here aborts a full read.
    pub fn is_mandatory(&self) -> bool {
        matches!(self, FieldName::Cid)
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}
