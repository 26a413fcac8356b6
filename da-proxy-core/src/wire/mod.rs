//! Serializer for the binary key format.
// The certificate key is persisted by callers, so these options must never change in a way
// that breaks decoding of previously issued keys.
pub(crate) mod bincode;
pub mod errors;

// crates
use serde::de::DeserializeOwned;
use serde::Serialize;
// internal
use self::bincode::OPTIONS;
use ::bincode::Options;
// Exports
pub use errors::WireError;
pub use errors::WireError as Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Serialize an object directly into an owned buffer
pub fn serialize<T: Serialize>(item: &T) -> Result<Vec<u8>> {
    (*OPTIONS).serialize(item).map_err(Error::Serialize)
}

/// Deserialize an object directly
///
/// We only operate on in-memory slices. The whole slice must be consumed, trailing bytes are an
/// error.
pub fn deserialize<T: DeserializeOwned>(item: &[u8]) -> Result<T> {
    (*OPTIONS).deserialize(item).map_err(Error::Deserialize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_deserialize() {
        let tmp = (7u32, String::from("much wow, very cool"), vec![1u8, 2, 3]);
        let serialized = serialize(&tmp).unwrap();
        let deserialized: (u32, String, Vec<u8>) = deserialize(&serialized).unwrap();
        assert_eq!(tmp, deserialized);
    }

    #[test]
    fn integers_are_fixed_width_little_endian() {
        let serialized = serialize(&1u32).unwrap();
        assert_eq!(serialized, vec![1, 0, 0, 0]);
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut serialized = serialize(&42u64).unwrap();
        serialized.push(0);
        assert!(matches!(
            deserialize::<u64>(&serialized),
            Err(Error::Deserialize(_))
        ));
    }

    #[test]
    fn truncated_input_is_rejected() {
        let serialized = serialize(&vec![9u8; 16]).unwrap();
        assert!(deserialize::<Vec<u8>>(&serialized[..serialized.len() - 1]).is_err());
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        // a vector claiming u64::MAX elements must not be allocated
        let bogus = u64::MAX.to_le_bytes();
        assert!(deserialize::<Vec<u8>>(&bogus).is_err());
    }
}
