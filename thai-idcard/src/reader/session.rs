// thai-idcard/src/reader/session.rs

use log::{debug, info, warn};

use crate::config::ReaderConfig;
use crate::reader::link::Link;
use crate::transport::{ReaderDriver, ReaderTransport};
use crate::types::{PowerAction, Protocol, UsbDeviceDescriptor};
use crate::utils::apdu_hex;
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum CardState {
    Unpowered,
    Powered { atr: Vec<u8> },
    Ready { atr: Vec<u8>, protocol: Protocol },
}

/// The one open reader. Only the session creates or drops it.
pub struct ReaderHandle {
    transport: Box<dyn ReaderTransport>,
    device: UsbDeviceDescriptor,
    epoch: u64,
    card: CardState,
}

impl std::fmt::Debug for ReaderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderHandle")
            .field("device", &self.device.identifier)
            .field("epoch", &self.epoch)
            .field("card", &self.card)
            .finish()
    }
}

/// Owns at most one reader handle and everything done through it.
pub struct ReaderSession {
    driver: Box<dyn ReaderDriver>,
    handle: Option<ReaderHandle>,
    config: ReaderConfig,
    link: Link,
}

impl ReaderSession {
    pub fn new(driver: Box<dyn ReaderDriver>, config: ReaderConfig) -> Self {
        Self {
            driver,
            handle: None,
            config,
            link: Link::new(),
        }
    }

    /// Liveness token shared with the signal path.
    pub fn link(&self) -> Link {
        self.link.clone()
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    pub fn device(&self) -> Option<&UsbDeviceDescriptor> {
        self.handle.as_ref().map(|h| &h.device)
    }

    /// ATR of the powered card, if any.
    pub fn atr(&self) -> Option<&[u8]> {
        match self.handle.as_ref().map(|h| &h.card) {
            Some(CardState::Powered { atr }) | Some(CardState::Ready { atr, .. }) => Some(atr),
            _ => None,
        }
    }

    pub fn protocol(&self) -> Option<Protocol> {
        match self.handle.as_ref().map(|h| &h.card) {
            Some(CardState::Ready { protocol, .. }) => Some(*protocol),
            _ => None,
        }
    }

    pub fn is_supported(&self, device: &UsbDeviceDescriptor) -> bool {
        self.config.supports_vendor(device.vendor_id) && self.driver.is_supported(device)
    }

    /// Open a reader for `device`, closing any previous handle first.
    pub fn open(&mut self, device: &UsbDeviceDescriptor) -> Result<()> {
        if !self.is_supported(device) {
            return Err(Error::UnsupportedDevice {
                vendor_id: device.vendor_id,
                product_id: device.product_id,
            });
        }

        if let Err(e) = self.close() {
            warn!("closing previous reader failed: {}", e);
        }

        let transport = self.driver.open(device)?;
        let epoch = self.link.bind(&device.identifier);
        info!("reader opened for {}", device.identifier);
        self.handle = Some(ReaderHandle {
            transport,
            device: device.clone(),
            epoch,
            card: CardState::Unpowered,
        });
        Ok(())
    }

    /// Close the handle. Closing a closed session is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut handle) = self.handle.take() else {
            return Ok(());
        };
        if self.link.is_current(handle.epoch) {
            self.link.unbind();
        }
        info!("reader closed for {}", handle.device.identifier);
        handle.transport.close()
    }

    /// Close the handle only if it belongs to `device`. Returns whether a
    /// handle was closed.
    pub fn close_if(&mut self, device: &UsbDeviceDescriptor) -> Result<bool> {
        match self.device() {
            Some(d) if d.same_device(device) => self.close().map(|_| true),
            _ => Ok(false),
        }
    }

    fn live_handle(&mut self) -> Result<&mut ReaderHandle> {
        let handle = self.handle.as_mut().ok_or(Error::ReaderUnavailable)?;
        if !self.link.is_current(handle.epoch) {
            return Err(Error::DeviceLost);
        }
        Ok(handle)
    }

    /// Reset the card and return its ATR.
    pub fn power_on(&mut self) -> Result<Vec<u8>> {
        let slot = self.config.slot;
        let action = self.config.power_action;
        let handle = self.live_handle()?;
        let atr = handle.transport.power(slot, action)?;
        if atr.is_empty() {
            return Err(Error::PowerFailed("reader returned an empty ATR".into()));
        }
        debug!("ATR {}", apdu_hex(&atr));
        handle.card = CardState::Powered { atr: atr.clone() };
        Ok(atr)
    }

    /// Negotiate the transmission protocol. The card must be powered.
    pub fn set_protocol(&mut self, preferred: Protocol) -> Result<Protocol> {
        let slot = self.config.slot;
        let handle = self.live_handle()?;
        let atr = match &handle.card {
            CardState::Powered { atr } | CardState::Ready { atr, .. } => atr.clone(),
            CardState::Unpowered => {
                return Err(Error::ProtocolNegotiationFailed(
                    "card is not powered".into(),
                ));
            }
        };
        let negotiated = handle.transport.set_protocol(slot, preferred)?;
        if negotiated != preferred {
            return Err(Error::ProtocolNegotiationFailed(format!(
                "requested {}, reader chose {}",
                preferred, negotiated
            )));
        }
        debug!("protocol {} negotiated", negotiated);
        handle.card = CardState::Ready {
            atr,
            protocol: negotiated,
        };
        Ok(negotiated)
    }

    /// Power on and negotiate the configured protocol unless that was
    /// already done for this handle. Returns the ATR.
    pub fn ensure_ready(&mut self) -> Result<Vec<u8>> {
        let card = self.live_handle()?.card.clone();
        match card {
            CardState::Ready { atr, .. } => return Ok(atr),
            CardState::Powered { .. } => {}
            CardState::Unpowered => {
                self.power_on()?;
            }
        }
        let protocol = self.config.protocol;
        self.set_protocol(protocol)?;
        self.atr()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| Error::PowerFailed("card lost its ATR".into()))
    }

    /// Power the card down and release the reader.
    pub fn power_off(&mut self) -> Result<()> {
        let slot = self.config.slot;
        if let Some(handle) = self.handle.as_mut() {
            if let Err(e) = handle.transport.power(slot, PowerAction::PowerDown) {
                warn!("power down failed: {}", e);
            }
        }
        self.close()
    }

    /// Send one command APDU and return the raw response. Fails with
    /// `DeviceLost` when the handle was invalidated before or during the
    /// exchange; a response that raced a detach is discarded.
    pub fn transmit(&mut self, command: &[u8], expected_len: usize) -> Result<Vec<u8>> {
        let slot = self.config.slot;
        let link = self.link.clone();
        let handle = self.live_handle()?;
        if !matches!(handle.card, CardState::Ready { .. }) {
            return Err(Error::ProtocolNegotiationFailed(
                "no protocol negotiated for this handle".into(),
            ));
        }
        let epoch = handle.epoch;

        let result = handle.transport.transmit(slot, command, expected_len + 2);

        if !link.is_current(epoch) {
            debug!("handle invalidated during transmit");
            return Err(Error::DeviceLost);
        }
        result
    }
}

impl Drop for ReaderSession {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("closing reader on drop failed: {}", e);
        }
    }
}
