//! Wire envelope: `[0x00][schema id: u32 BE][payload]`.

use crate::error::{CodecError, Result};

/// Leading byte of every schema-tagged value.
pub const MAGIC_BYTE: u8 = 0x00;

const HEADER_LEN: usize = 5;

/// A serialized event tagged with the id of the schema it was written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub schema_id: u32,
    pub payload: Vec<u8>,
}

impl Envelope {
    pub fn new(schema_id: u32, payload: Vec<u8>) -> Self {
        Self { schema_id, payload }
    }

    /// Encode into the registry wire format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.payload.len());
        bytes.push(MAGIC_BYTE);
        bytes.extend_from_slice(&self.schema_id.to_be_bytes());
        bytes.extend_from_slice(&self.payload);
        bytes
    }

    /// Parse the registry wire format.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(CodecError::Decode(format!(
                "value is {} bytes, shorter than the {HEADER_LEN}-byte schema header",
                bytes.len()
            )));
        }
        if bytes[0] != MAGIC_BYTE {
            return Err(CodecError::Decode(format!(
                "unknown magic byte 0x{:02x}",
                bytes[0]
            )));
        }
        let schema_id = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
        Ok(Self {
            schema_id,
            payload: bytes[HEADER_LEN..].to_vec(),
        })
    }
}
