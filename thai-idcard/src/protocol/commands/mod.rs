// thai-idcard/src/protocol/commands/mod.rs

pub mod get_response;
pub mod read;
pub mod select;

pub use get_response::{GetResponseVariant, encode_get_response};
pub use read::encode_read_binary;
pub use select::encode_select;

/// Command APDU template: header, optional body and the number of data
/// bytes the caller expects back once the exchange completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApduCommand {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: Vec<u8>,
    pub le: Option<u8>,
    pub expected_len: usize,
}

impl ApduCommand {
    pub fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Vec::new(),
            le: None,
            expected_len: 0,
        }
    }

    pub fn data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    pub fn le(mut self, le: u8) -> Self {
        self.le = Some(le);
        self
    }

    pub fn expect(mut self, len: usize) -> Self {
        self.expected_len = len;
        self
    }

    /// Short-form encoding: header, Lc + data when present, Le when present.
    pub fn encode(&self) -> Vec<u8> {
        let mut apdu = Vec::with_capacity(6 + self.data.len());
        apdu.extend_from_slice(&[self.cla, self.ins, self.p1, self.p2]);
        if !self.data.is_empty() {
            apdu.push(self.data.len() as u8);
            apdu.extend_from_slice(&self.data);
        }
        if let Some(le) = self.le {
            apdu.push(le);
        }
        apdu
    }
}

/// Commands the Thai ID applet understands. Per-command encoders live in
/// `protocol::commands::<name>.rs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SelectApplet { aid: Vec<u8> },
    ReadBinary { offset: u16, length: u8 },
    GetResponse { variant: GetResponseVariant, length: u8 },
}

impl Command {
    pub fn to_apdu(&self) -> ApduCommand {
        match self {
            Self::SelectApplet { aid } => encode_select(aid),
            Self::ReadBinary { offset, length } => encode_read_binary(*offset, *length),
            Self::GetResponse { variant, length } => encode_get_response(*variant, *length),
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        self.to_apdu().encode()
    }
}
