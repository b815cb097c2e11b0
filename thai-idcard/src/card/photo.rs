// thai-idcard/src/card/photo.rs

use crate::constants::{MAX_READ_LEN, PHOTO_CHUNK_LEN, PHOTO_OFFSET, PHOTO_TOTAL_LEN};
use crate::{Error, Result};

/// One READ BINARY of a chunked field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    pub offset: u16,
    pub len: u8,
}

/// Placement of a field that is too large for one READ BINARY.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
pub struct ChunkLayout {
    pub offset: u16,
    pub total_len: usize,
    pub chunk_len: usize,
}

impl ChunkLayout {
    pub fn new(offset: u16, total_len: usize, chunk_len: usize) -> Self {
        Self {
            offset,
            total_len,
            chunk_len,
        }
    }

    /// The JPEG portrait: 0x017B onwards, twenty 255-byte reads.
    pub fn thai_id_photo() -> Self {
        Self::new(PHOTO_OFFSET, PHOTO_TOTAL_LEN, PHOTO_CHUNK_LEN)
    }

    /// Reads at increasing offsets covering exactly `total_len` bytes. The
    /// last read asks only for what remains.
    pub fn chunks(&self) -> Result<Vec<Chunk>> {
        if self.chunk_len == 0 || self.chunk_len > MAX_READ_LEN {
            return Err(Error::InvalidLayout(format!(
                "chunk length {} outside 1..={}",
                self.chunk_len, MAX_READ_LEN
            )));
        }
        let end = usize::from(self.offset) + self.total_len;
        if end > usize::from(u16::MAX) + 1 {
            return Err(Error::InvalidLayout(format!(
                "{} bytes from {:#06x} run past the addressable range",
                self.total_len, self.offset
            )));
        }

        let mut chunks = Vec::with_capacity(self.total_len.div_ceil(self.chunk_len));
        let mut read = 0;
        while read < self.total_len {
            let len = self.chunk_len.min(self.total_len - read);
            chunks.push(Chunk {
                offset: (usize::from(self.offset) + read) as u16,
                len: len as u8,
            });
            read += len;
        }
        Ok(chunks)
    }
}

impl Default for ChunkLayout {
    fn default() -> Self {
        Self::thai_id_photo()
    }
}

/// Accumulates chunk payloads and refuses to finish short.
#[derive(Debug)]
pub struct PhotoAssembler {
    expected: usize,
    data: Vec<u8>,
}

impl PhotoAssembler {
    pub fn new(layout: &ChunkLayout) -> Self {
        Self {
            expected: layout.total_len,
            data: Vec::with_capacity(layout.total_len),
        }
    }

    pub fn push(&mut self, chunk: &Chunk, payload: &[u8]) -> Result<()> {
        if payload.len() != usize::from(chunk.len) {
            return Err(Error::MalformedResponse(format!(
                "photo chunk at {:#06x}: expected {} bytes, got {}",
                chunk.offset,
                chunk.len,
                payload.len()
            )));
        }
        self.data.extend_from_slice(payload);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn finish(self) -> Result<Vec<u8>> {
        if self.data.len() != self.expected {
            return Err(Error::InvalidLength {
                expected: self.expected,
                actual: self.data.len(),
            });
        }
        Ok(self.data)
    }
}
