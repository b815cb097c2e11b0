// thai-idcard/src/transport/pcsc.rs
//! PC/SC reader transport for desktop hosts.

use std::ffi::{CStr, CString};

use log::{debug, info};
use pcsc::{Card, Context, Disposition, Protocols, Scope, ShareMode};

use crate::constants::ACS_VENDOR_ID;
use crate::transport::traits::{ReaderDriver, ReaderTransport};
use crate::types::{PowerAction, Protocol, Slot, UsbDeviceDescriptor};
use crate::{Error, Result};

fn lost_or(e: pcsc::Error, other: impl FnOnce(String) -> Error) -> Error {
    match e {
        pcsc::Error::RemovedCard
        | pcsc::Error::ReaderUnavailable
        | pcsc::Error::UnknownReader
        | pcsc::Error::NoService => Error::DeviceLost,
        e => other(e.to_string()),
    }
}

fn to_pcsc_protocols(p: Protocol) -> Protocols {
    match p {
        Protocol::T0 => Protocols::T0,
        Protocol::T1 => Protocols::T1,
    }
}

/// Reader SDK over the PC/SC daemon. USB devices are matched to PC/SC
/// readers by product name; without a match the first reader is used.
pub struct PcscDriver {
    context: Context,
    vendors: Vec<u16>,
}

impl PcscDriver {
    pub fn new() -> Result<Self> {
        let context = Context::establish(Scope::User)
            .map_err(|e| Error::OpenFailed(format!("PC/SC context: {}", e)))?;
        Ok(Self {
            context,
            vendors: vec![ACS_VENDOR_ID],
        })
    }

    pub fn with_vendors(mut self, vendors: Vec<u16>) -> Self {
        self.vendors = vendors;
        self
    }

    pub fn reader_names(&self) -> Result<Vec<CString>> {
        let mut buf = [0u8; 2048];
        let readers = self
            .context
            .list_readers(&mut buf)
            .map_err(|e| Error::OpenFailed(format!("listing readers: {}", e)))?;
        Ok(readers.map(CStr::to_owned).collect())
    }

    fn pick_reader(&self, device: &UsbDeviceDescriptor) -> Result<CString> {
        let names = self.reader_names()?;
        let wanted = device.product_name.as_deref().unwrap_or_default();
        let matched = names
            .iter()
            .find(|n| !wanted.is_empty() && n.to_string_lossy().contains(wanted))
            .or_else(|| names.first())
            .cloned();
        matched.ok_or_else(|| Error::OpenFailed("no PC/SC reader available".into()))
    }
}

impl ReaderDriver for PcscDriver {
    fn is_supported(&self, device: &UsbDeviceDescriptor) -> bool {
        self.vendors.contains(&device.vendor_id)
    }

    fn open(&mut self, device: &UsbDeviceDescriptor) -> Result<Box<dyn ReaderTransport>> {
        let name = self.pick_reader(device)?;
        info!("{} -> PC/SC reader {}", device.identifier, name.to_string_lossy());
        Ok(Box::new(PcscReader {
            context: self.context.clone(),
            name,
            card: None,
        }))
    }
}

/// One PC/SC reader. The card connection is made on power-on.
pub struct PcscReader {
    context: Context,
    name: CString,
    card: Option<Card>,
}

impl PcscReader {
    fn card(&mut self) -> Result<&mut Card> {
        self.card
            .as_mut()
            .ok_or_else(|| Error::PowerFailed("card is not powered".into()))
    }

    fn atr(card: &Card) -> Result<Vec<u8>> {
        let status = card
            .status2_owned()
            .map_err(|e| lost_or(e, Error::PowerFailed))?;
        Ok(status.atr().to_vec())
    }
}

impl ReaderTransport for PcscReader {
    fn power(&mut self, _slot: Slot, action: PowerAction) -> Result<Vec<u8>> {
        match action {
            PowerAction::PowerDown => {
                if let Some(card) = self.card.take() {
                    card.disconnect(Disposition::UnpowerCard)
                        .map_err(|(_, e)| lost_or(e, Error::PowerFailed))?;
                }
                Ok(Vec::new())
            }
            PowerAction::ColdReset | PowerAction::WarmReset => {
                let disposition = if action == PowerAction::ColdReset {
                    Disposition::UnpowerCard
                } else {
                    Disposition::ResetCard
                };
                if self.card.is_none() {
                    let card = self
                        .context
                        .connect(&self.name, ShareMode::Shared, Protocols::ANY)
                        .map_err(|e| lost_or(e, Error::PowerFailed))?;
                    self.card = Some(card);
                } else {
                    self.card()?
                        .reconnect(ShareMode::Shared, Protocols::ANY, disposition)
                        .map_err(|e| lost_or(e, Error::PowerFailed))?;
                }
                let card = self.card()?;
                Self::atr(card)
            }
        }
    }

    fn set_protocol(&mut self, _slot: Slot, preferred: Protocol) -> Result<Protocol> {
        let card = self.card()?;
        card.reconnect(
            ShareMode::Shared,
            to_pcsc_protocols(preferred),
            Disposition::LeaveCard,
        )
        .map_err(|e| lost_or(e, Error::ProtocolNegotiationFailed))?;
        let status = card
            .status2_owned()
            .map_err(|e| lost_or(e, Error::ProtocolNegotiationFailed))?;
        match status.protocol2() {
            Some(pcsc::Protocol::T0) => Ok(Protocol::T0),
            Some(pcsc::Protocol::T1) => Ok(Protocol::T1),
            other => Err(Error::ProtocolNegotiationFailed(format!(
                "reader reports {:?}",
                other
            ))),
        }
    }

    fn transmit(
        &mut self,
        _slot: Slot,
        command: &[u8],
        max_response_len: usize,
    ) -> Result<Vec<u8>> {
        let card = self
            .card
            .as_ref()
            .ok_or_else(|| Error::TransmitFailed("card is not powered".into()))?;
        let mut buf = vec![0u8; max_response_len.max(2)];
        let resp = card
            .transmit(command, &mut buf)
            .map_err(|e| lost_or(e, Error::TransmitFailed))?;
        debug!("PC/SC {} bytes in", resp.len());
        Ok(resp.to_vec())
    }

    fn close(&mut self) -> Result<()> {
        if let Some(card) = self.card.take() {
            card.disconnect(Disposition::LeaveCard)
                .map_err(|(_, e)| Error::TransmitFailed(e.to_string()))?;
        }
        Ok(())
    }
}
