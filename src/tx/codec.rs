use crate::tx::Transaction;
use thiserror::Error;

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to encode transaction: {0}")]
    EncodeError(String),

    #[error("Failed to decode transaction: {0}")]
    DecodeError(String),

    #[error("Invalid hex string: {0}")]
    InvalidHex(String),
}

/// Codec for the wire form of transactions (JSON)
pub struct TxCodec;

impl TxCodec {
    /// Encode a transaction to its wire JSON bytes
    pub fn encode(tx: &Transaction) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(tx).map_err(|e| CodecError::EncodeError(e.to_string()))
    }

    /// Decode a transaction from wire JSON bytes
    pub fn decode(bytes: &[u8]) -> Result<Transaction, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::DecodeError(e.to_string()))
    }

    /// Encode to a hex string (for embedding in text protocols)
    pub fn encode_hex(tx: &Transaction) -> Result<String, CodecError> {
        Ok(hex::encode(Self::encode(tx)?))
    }

    /// Decode from a hex string
    pub fn decode_hex(hex_str: &str) -> Result<Transaction, CodecError> {
        let bytes = hex::decode(hex_str).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        Self::decode(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;
    use crate::tx::TransactionBuilder;

    #[test]
    fn test_wire_roundtrip_preserves_digest() {
        let kp = Keypair::generate();
        let tx = TransactionBuilder::new()
            .sender(&kp)
            .recipient("44".repeat(32))
            .amount(7)
            .nonce(1)
            .build()
            .unwrap();

        let restored = TxCodec::decode(&TxCodec::encode(&tx).unwrap()).unwrap();
        assert_eq!(restored.digest().unwrap(), tx.digest().unwrap());
        assert!(restored.verify_signature());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(TxCodec::decode(b"not json").is_err());
        assert!(TxCodec::decode_hex("zz").is_err());
    }
}
