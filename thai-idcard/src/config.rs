// thai-idcard/src/config.rs
//! Reader and card configuration.

use crate::card::photo::ChunkLayout;
use crate::constants;
use crate::types::{PowerAction, Protocol, Slot};

/// Settings shared by the reader session and the APDU engine.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReaderConfig {
    /// Reader slot the card sits in.
    pub slot: Slot,
    /// Protocol requested after power-on.
    pub protocol: Protocol,
    /// Power action used by `power_on`.
    pub power_action: PowerAction,
    /// USB vendor ids the reader layer accepts.
    pub supported_vendors: Vec<u16>,
    /// Where the photo lives and how it is chunked.
    pub photo: ChunkLayout,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            slot: Slot(0),
            protocol: Protocol::T0,
            power_action: PowerAction::WarmReset,
            supported_vendors: vec![constants::ACS_VENDOR_ID],
            photo: ChunkLayout::thai_id_photo(),
        }
    }
}

impl ReaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_slot(mut self, slot: Slot) -> Self {
        self.slot = slot;
        self
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_power_action(mut self, action: PowerAction) -> Self {
        self.power_action = action;
        self
    }

    pub fn with_supported_vendors(mut self, vendors: Vec<u16>) -> Self {
        self.supported_vendors = vendors;
        self
    }

    pub fn with_photo_layout(mut self, layout: ChunkLayout) -> Self {
        self.photo = layout;
        self
    }

    pub fn supports_vendor(&self, vendor_id: u16) -> bool {
        self.supported_vendors.contains(&vendor_id)
    }
}
