//! Transport encoding of raw payloads into DA blobs.
//!
//! Every 32 byte word of a DA blob is interpreted as a BN254 scalar, so the payload is cut in
//! chunks of 31 bytes and each chunk is prefixed with a zero byte, which keeps every word below
//! the field modulus.

pub const BYTES_PER_FIELD_ELEMENT: usize = 32;
pub const MAX_ENCODING_CHUNK_SIZE: usize = BYTES_PER_FIELD_ELEMENT - 1;
pub const HEADER_SIZE: usize = BYTES_PER_FIELD_ELEMENT;
pub const DEFAULT_CODEC_VERSION: u8 = 0x00;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("blob too short: {0} bytes")]
    Truncated(usize),
    #[error("unsupported blob codec version {0:#04x}")]
    UnsupportedVersion(u8),
    #[error("invalid blob header")]
    InvalidHeader,
    #[error("payload of {0} bytes does not fit the codec length prefix")]
    PayloadTooLarge(usize),
    #[error("blob declares {declared} payload bytes but only {available} are present")]
    LengthMismatch { declared: usize, available: usize },
}

pub trait BlobCodec: Send + Sync {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;
    fn decode(&self, blob: &[u8]) -> Result<Vec<u8>, CodecError>;
}

/// Version 0 codec: `[0x00, version, len (u32 BE), 0...]` header word followed by the padded
/// payload.
#[derive(Copy, Clone, Debug, Default)]
pub struct DefaultBlobCodec;

impl DefaultBlobCodec {
    fn pad(data: &[u8]) -> Vec<u8> {
        let chunks = data.len().div_ceil(MAX_ENCODING_CHUNK_SIZE);
        let mut padded = Vec::with_capacity(chunks * BYTES_PER_FIELD_ELEMENT);
        for chunk in data.chunks(MAX_ENCODING_CHUNK_SIZE) {
            padded.push(0x00);
            padded.extend_from_slice(chunk);
        }
        padded
    }

    fn unpad(padded: &[u8]) -> Vec<u8> {
        padded
            .chunks(BYTES_PER_FIELD_ELEMENT)
            .flat_map(|word| word.iter().skip(1).copied())
            .collect()
    }
}

impl BlobCodec for DefaultBlobCodec {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        let len = u32::try_from(data.len()).map_err(|_| CodecError::PayloadTooLarge(data.len()))?;
        let mut blob = vec![0u8; HEADER_SIZE];
        blob[1] = DEFAULT_CODEC_VERSION;
        blob[2..6].copy_from_slice(&len.to_be_bytes());
        blob.extend(Self::pad(data));
        Ok(blob)
    }

    fn decode(&self, blob: &[u8]) -> Result<Vec<u8>, CodecError> {
        if blob.len() < HEADER_SIZE {
            return Err(CodecError::Truncated(blob.len()));
        }
        let (header, body) = blob.split_at(HEADER_SIZE);
        if header[0] != 0x00 {
            return Err(CodecError::InvalidHeader);
        }
        if header[1] != DEFAULT_CODEC_VERSION {
            return Err(CodecError::UnsupportedVersion(header[1]));
        }
        let mut len = [0u8; 4];
        len.copy_from_slice(&header[2..6]);
        let declared = u32::from_be_bytes(len) as usize;

        let mut payload = Self::unpad(body);
        if payload.len() < declared {
            return Err(CodecError::LengthMismatch {
                declared,
                available: payload.len(),
            });
        }
        payload.truncate(declared);
        Ok(payload)
    }
}
