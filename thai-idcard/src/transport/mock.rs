// thai-idcard/src/transport/mock.rs

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::constants::{CLA_ISO, CLA_PROPRIETARY, INS_GET_RESPONSE, INS_READ_BINARY, INS_SELECT};
use crate::device::registry::UsbHost;
use crate::device::signal::{Signal, SignalSender};
use crate::transport::traits::{ReaderDriver, ReaderTransport};
use crate::types::{PowerAction, Protocol, Slot, StatusWord, UsbDeviceDescriptor};
use crate::{Error, Result};

/// Hook invoked with the 1-based transmit count before a mock answers.
pub type TransmitHook = Box<dyn FnMut(usize) + Send>;

/// Simulated card memory answering SELECT / READ BINARY / GET RESPONSE the
/// way the Thai ID applet does (`61xx` then GET RESPONSE).
#[derive(Debug, Clone)]
pub struct MockCard {
    pub aid: Vec<u8>,
    pub image: Vec<u8>,
    /// READ BINARY offsets that answer with a fixed status word.
    pub rejected: HashMap<u16, StatusWord>,
    /// Status returned for SELECT; `None` means the applet is present.
    pub select_status: Option<StatusWord>,
    /// P2 the card expects on GET RESPONSE.
    pub get_response_p2: u8,
    selected: bool,
    pending: Option<Vec<u8>>,
}

impl MockCard {
    pub fn new(aid: &[u8], image: Vec<u8>) -> Self {
        Self {
            aid: aid.to_vec(),
            image,
            rejected: HashMap::new(),
            select_status: None,
            get_response_p2: 0x00,
            selected: false,
            pending: None,
        }
    }

    /// Overwrite image bytes starting at `offset`, growing the image if needed.
    pub fn write(&mut self, offset: usize, bytes: &[u8]) {
        let end = offset + bytes.len();
        if self.image.len() < end {
            self.image.resize(end, 0x20);
        }
        self.image[offset..end].copy_from_slice(bytes);
    }

    pub fn reject_offset(&mut self, offset: u16, sw: StatusWord) {
        self.rejected.insert(offset, sw);
    }

    fn status(sw: u16) -> Vec<u8> {
        sw.to_be_bytes().to_vec()
    }

    /// Answer one command APDU.
    pub fn respond(&mut self, cmd: &[u8]) -> Vec<u8> {
        if cmd.len() < 4 {
            return Self::status(0x6700);
        }
        match (cmd[0], cmd[1]) {
            (CLA_ISO, INS_SELECT) => {
                if let Some(sw) = self.select_status {
                    self.selected = false;
                    return Self::status(sw.as_u16());
                }
                if cmd.get(5..) == Some(&self.aid[..]) {
                    self.selected = true;
                    self.pending = Some(vec![0x00; 10]);
                    vec![0x61, 0x0A]
                } else {
                    self.selected = false;
                    Self::status(0x6A82)
                }
            }
            (CLA_PROPRIETARY, INS_READ_BINARY) => {
                if !self.selected {
                    return Self::status(0x6986);
                }
                if cmd.len() != 7 {
                    return Self::status(0x6700);
                }
                let offset = u16::from_be_bytes([cmd[2], cmd[3]]);
                if let Some(sw) = self.rejected.get(&offset) {
                    return Self::status(sw.as_u16());
                }
                let len = cmd[6] as usize;
                let start = offset as usize;
                match self.image.get(start..start + len) {
                    Some(bytes) => {
                        self.pending = Some(bytes.to_vec());
                        vec![0x61, cmd[6]]
                    }
                    None => Self::status(0x6B00),
                }
            }
            (CLA_ISO, INS_GET_RESPONSE) => {
                if cmd[3] != self.get_response_p2 {
                    return Self::status(0x6A86);
                }
                match self.pending.take() {
                    Some(mut data) => {
                        let le = match cmd.get(4).copied().unwrap_or(0) {
                            0 => 256,
                            n => n as usize,
                        };
                        data.truncate(le);
                        data.extend_from_slice(&[0x90, 0x00]);
                        data
                    }
                    None => Self::status(0x6985),
                }
            }
            _ => Self::status(0x6D00),
        }
    }
}

/// Mock reader transport. It records sent APDUs and answers from queued
/// responses first, then from an inserted `MockCard`.
#[derive(Default)]
pub struct MockReader {
    pub sent: Vec<Vec<u8>>,
    pub responses: VecDeque<Vec<u8>>,
    pub card: Option<MockCard>,
    pub atr: Vec<u8>,
    pub power_calls: Vec<PowerAction>,
    /// Protocol the reader accepts; other requests are rejected.
    pub accepted_protocol: Option<Protocol>,
    /// Number of upcoming transmits that fail with `TransmitFailed`.
    pub transmit_failures: usize,
    /// Receive buffer size passed with each transmit.
    pub response_limits: Vec<usize>,
    on_transmit: Option<TransmitHook>,
    closed: bool,
}

impl std::fmt::Debug for MockReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockReader")
            .field("sent", &self.sent.len())
            .field("queued", &self.responses.len())
            .field("card", &self.card.is_some())
            .field("closed", &self.closed)
            .finish()
    }
}

impl MockReader {
    pub fn new(atr: Vec<u8>) -> Self {
        Self {
            atr,
            accepted_protocol: Some(Protocol::T0),
            ..Default::default()
        }
    }

    pub fn with_card(mut self, card: MockCard) -> Self {
        self.card = Some(card);
        self
    }

    pub fn push_response(&mut self, resp: Vec<u8>) {
        self.responses.push_back(resp);
    }

    pub fn set_on_transmit(&mut self, hook: TransmitHook) {
        self.on_transmit = Some(hook);
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn transmit_count(&self) -> usize {
        self.sent.len()
    }
}

impl ReaderTransport for MockReader {
    fn power(&mut self, _slot: Slot, action: PowerAction) -> Result<Vec<u8>> {
        if self.closed {
            return Err(Error::PowerFailed("reader closed".into()));
        }
        self.power_calls.push(action);
        match action {
            PowerAction::PowerDown => Ok(Vec::new()),
            _ if self.card.is_none() && self.responses.is_empty() => {
                Err(Error::PowerFailed("no card present".into()))
            }
            _ => Ok(self.atr.clone()),
        }
    }

    fn set_protocol(&mut self, _slot: Slot, preferred: Protocol) -> Result<Protocol> {
        match self.accepted_protocol {
            Some(p) if p == preferred => Ok(p),
            _ => Err(Error::ProtocolNegotiationFailed(format!(
                "reader refused {}",
                preferred
            ))),
        }
    }

    fn transmit(
        &mut self,
        _slot: Slot,
        command: &[u8],
        max_response_len: usize,
    ) -> Result<Vec<u8>> {
        if self.closed {
            return Err(Error::TransmitFailed("reader closed".into()));
        }
        self.sent.push(command.to_vec());
        self.response_limits.push(max_response_len);
        let count = self.sent.len();
        if let Some(hook) = self.on_transmit.as_mut() {
            hook(count);
        }
        if self.transmit_failures > 0 {
            self.transmit_failures -= 1;
            return Err(Error::TransmitFailed("simulated I/O error".into()));
        }
        if let Some(resp) = self.responses.pop_front() {
            return Ok(resp);
        }
        match self.card.as_mut() {
            Some(card) => Ok(card.respond(command)),
            None => Err(Error::TransmitFailed("no card present".into())),
        }
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Transport handed out by `MockDriver`; shares the reader with the test.
pub struct SharedReader(Arc<Mutex<MockReader>>);

impl SharedReader {
    fn with<T>(&self, f: impl FnOnce(&mut MockReader) -> Result<T>) -> Result<T> {
        let mut guard = self
            .0
            .lock()
            .map_err(|_| Error::TransmitFailed("mock reader poisoned".into()))?;
        f(&mut guard)
    }
}

impl ReaderTransport for SharedReader {
    fn power(&mut self, slot: Slot, action: PowerAction) -> Result<Vec<u8>> {
        self.with(|r| r.power(slot, action))
    }

    fn set_protocol(&mut self, slot: Slot, preferred: Protocol) -> Result<Protocol> {
        self.with(|r| r.set_protocol(slot, preferred))
    }

    fn transmit(
        &mut self,
        slot: Slot,
        command: &[u8],
        max_response_len: usize,
    ) -> Result<Vec<u8>> {
        self.with(|r| r.transmit(slot, command, max_response_len))
    }

    fn close(&mut self) -> Result<()> {
        self.with(|r| r.close())
    }
}

/// Every reader a `MockDriver` opened, oldest first.
pub type OpenedReaders = Arc<Mutex<Vec<Arc<Mutex<MockReader>>>>>;

/// Mock reader SDK. Each `open` creates a fresh `MockReader` from the
/// configured ATR and card; tests keep access to every reader it opened.
#[derive(Default)]
pub struct MockDriver {
    pub supported_vendors: Vec<u16>,
    pub atr: Vec<u8>,
    pub card: Option<MockCard>,
    pub fail_open: bool,
    prepared: VecDeque<MockReader>,
    opened: OpenedReaders,
}

impl MockDriver {
    pub fn new(supported_vendors: Vec<u16>) -> Self {
        Self {
            supported_vendors,
            atr: vec![0x3B, 0x68, 0x00, 0x00],
            ..Default::default()
        }
    }

    pub fn with_card(mut self, atr: Vec<u8>, card: MockCard) -> Self {
        self.atr = atr;
        self.card = Some(card);
        self
    }

    /// Hand out `reader` on the next `open` instead of a fresh one.
    pub fn with_reader(mut self, reader: MockReader) -> Self {
        self.prepared.push_back(reader);
        self
    }

    /// Handle on the list of opened readers that outlives the driver being
    /// moved into a session.
    pub fn opened_readers(&self) -> OpenedReaders {
        Arc::clone(&self.opened)
    }

    /// Most recently opened reader.
    pub fn last_opened(&self) -> Option<Arc<Mutex<MockReader>>> {
        let opened = self.opened.lock().unwrap_or_else(|e| e.into_inner());
        opened.last().cloned()
    }
}

impl ReaderDriver for MockDriver {
    fn is_supported(&self, device: &UsbDeviceDescriptor) -> bool {
        self.supported_vendors.contains(&device.vendor_id)
    }

    fn open(&mut self, device: &UsbDeviceDescriptor) -> Result<Box<dyn ReaderTransport>> {
        if self.fail_open {
            return Err(Error::OpenFailed(format!("{} is busy", device.identifier)));
        }
        let reader = self.prepared.pop_front().unwrap_or_else(|| {
            let mut reader = MockReader::new(self.atr.clone());
            reader.card = self.card.clone();
            reader
        });
        let shared = Arc::new(Mutex::new(reader));
        self.opened
            .lock()
            .map_err(|_| Error::OpenFailed("mock driver poisoned".into()))?
            .push(Arc::clone(&shared));
        Ok(Box::new(SharedReader(shared)))
    }
}

#[derive(Debug, Default)]
struct MockUsbState {
    devices: Vec<(UsbDeviceDescriptor, bool)>,
    permission_requests: Vec<String>,
    auto_reply: Option<bool>,
}

/// Mock USB host. Clones share state so a test can keep plugging devices
/// after the host was handed to a registry.
#[derive(Debug, Clone, Default)]
pub struct MockUsbHost {
    state: Arc<Mutex<MockUsbState>>,
}

impl MockUsbHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockUsbState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn plug(&self, device: UsbDeviceDescriptor, permitted: bool) {
        let mut st = self.state();
        st.devices.retain(|(d, _)| !d.same_device(&device));
        st.devices.push((device, permitted));
    }

    pub fn unplug(&self, identifier: &str) {
        self.state().devices.retain(|(d, _)| d.identifier != identifier);
    }

    pub fn set_permission(&self, identifier: &str, permitted: bool) {
        for (d, p) in self.state().devices.iter_mut() {
            if d.identifier == identifier {
                *p = permitted;
            }
        }
    }

    /// Answer every permission request immediately with `granted`.
    pub fn set_auto_reply(&self, granted: Option<bool>) {
        self.state().auto_reply = granted;
    }

    pub fn permission_requests(&self) -> Vec<String> {
        self.state().permission_requests.clone()
    }
}

impl UsbHost for MockUsbHost {
    fn devices(&self) -> Result<Vec<UsbDeviceDescriptor>> {
        Ok(self.state().devices.iter().map(|(d, _)| d.clone()).collect())
    }

    fn has_permission(&self, device: &UsbDeviceDescriptor) -> bool {
        self.state()
            .devices
            .iter()
            .any(|(d, p)| *p && d.same_device(device))
    }

    fn request_permission(
        &mut self,
        device: &UsbDeviceDescriptor,
        reply: &SignalSender,
    ) -> Result<()> {
        let auto = {
            let mut st = self.state();
            st.permission_requests.push(device.identifier.clone());
            st.auto_reply
        };
        if let Some(granted) = auto {
            self.set_permission(&device.identifier, granted);
            reply.post(Signal::PermissionResult {
                device: device.clone(),
                granted,
            });
        }
        Ok(())
    }
}
