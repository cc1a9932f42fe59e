//! Record encoding for the key-value store.
//!
//! Records are `bincode`; ids are fixed-width big-endian so that they sort
//! numerically inside keys. Undecodable bytes were not written by this codec
//! and are reported as [`GameError::Corrupted`].

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::GameError;

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, GameError> {
    bincode::serialize(value).map_err(|e| GameError::Corrupted(format!("encode: {e}")))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, GameError> {
    bincode::deserialize(bytes).map_err(|e| GameError::Corrupted(format!("decode: {e}")))
}

pub fn encode_id(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

pub fn decode_id(bytes: &[u8]) -> Result<u64, GameError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| GameError::Corrupted(format!("id has {} bytes, expected 8", bytes.len())))?;
    Ok(u64::from_be_bytes(arr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tru_types::Coin;

    #[test]
    fn ids_sort_numerically() {
        assert!(encode_id(2) < encode_id(256));
        assert_eq!(decode_id(&encode_id(77)).unwrap(), 77);
    }

    #[test]
    fn garbage_is_corruption() {
        let err = decode::<Coin>(&[0xFF]).unwrap_err();
        assert!(matches!(err, GameError::Corrupted(_)));
        assert!(matches!(decode_id(&[1, 2, 3]), Err(GameError::Corrupted(_))));
    }
}
