//! Minimal Solidity ABI codec for the verification contract
//!
//! Covers the static types `bytes32`, `bool`, `uint` and `address` plus
//! dynamic `string`. Every head slot is one 32-byte word; strings are
//! stored in the tail behind an offset word.

use sha3::{Digest, Keccak256};
use truthchain_core::MAX_SCORE;

use crate::record::VerificationRecord;
use crate::traits::LedgerError;

const WORD: usize = 32;

/// Write function recorded for each verdict
pub const VERIFY_CONTENT_SIGNATURE: &str = "verifyContent(bytes32,bool,uint8,string,string)";

/// Read function returning `(address,uint256,bool,uint8,string,string)`
pub const GET_VERIFICATION_SIGNATURE: &str = "getVerification(bytes32)";

/// A single ABI value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    FixedBytes(Vec<u8>),
    Bool(bool),
    Uint(u64),
    Address([u8; 20]),
    String(String),
}

/// First four bytes of the Keccak-256 of a function signature
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

fn uint_word(value: u64) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
    word
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

/// Head/tail encode a token list
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let mut head = Vec::with_capacity(tokens.len() * WORD);
    let mut tail = Vec::new();
    let head_len = tokens.len() * WORD;

    for token in tokens {
        match token {
            Token::FixedBytes(bytes) => {
                let mut word = [0u8; WORD];
                let n = bytes.len().min(WORD);
                word[..n].copy_from_slice(&bytes[..n]);
                head.extend_from_slice(&word);
            }
            Token::Bool(value) => head.extend_from_slice(&uint_word(*value as u64)),
            Token::Uint(value) => head.extend_from_slice(&uint_word(*value)),
            Token::Address(address) => {
                let mut word = [0u8; WORD];
                word[WORD - 20..].copy_from_slice(address);
                head.extend_from_slice(&word);
            }
            Token::String(value) => {
                head.extend_from_slice(&uint_word((head_len + tail.len()) as u64));
                let bytes = value.as_bytes();
                tail.extend_from_slice(&uint_word(bytes.len() as u64));
                tail.extend_from_slice(bytes);
                tail.resize(tail.len() + padded_len(bytes.len()) - bytes.len(), 0);
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// Selector followed by the encoded arguments
pub fn encode_call(signature: &str, tokens: &[Token]) -> Vec<u8> {
    let mut data = selector(signature).to_vec();
    data.extend_from_slice(&encode(tokens));
    data
}

/// `0x`-prefixed lowercase hex
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode hex with or without a `0x` prefix
pub fn from_hex(value: &str) -> Result<Vec<u8>, LedgerError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(digits)
        .map_err(|e| LedgerError::Decode(format!("invalid hex {}: {}", value, e)))
}

/// Parse a `0x`-prefixed 32-byte hash
pub fn parse_bytes32(value: &str) -> Result<Vec<u8>, LedgerError> {
    let bytes = from_hex(value)?;
    if bytes.len() != WORD {
        return Err(LedgerError::Decode(format!(
            "expected 32 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// Parse a `0x`-prefixed 20-byte address
pub fn parse_address(value: &str) -> Result<[u8; 20], LedgerError> {
    let bytes = from_hex(value)?;
    bytes
        .try_into()
        .map_err(|_| LedgerError::Decode(format!("invalid address: {}", value)))
}

fn word(data: &[u8], index: usize) -> Result<&[u8], LedgerError> {
    data.get(index * WORD..(index + 1) * WORD)
        .ok_or_else(|| LedgerError::Decode(format!("missing word {}", index)))
}

fn word_u64(data: &[u8], index: usize) -> Result<u64, LedgerError> {
    let w = word(data, index)?;
    if w[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(LedgerError::Decode(format!("word {} overflows u64", index)));
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&w[WORD - 8..]);
    Ok(u64::from_be_bytes(low))
}

fn word_string(data: &[u8], index: usize) -> Result<String, LedgerError> {
    let out_of_range = |what: &str| LedgerError::Decode(format!("string {} out of range", what));

    let offset = usize::try_from(word_u64(data, index)?).map_err(|_| out_of_range("offset"))?;
    let start = offset.checked_add(WORD).ok_or_else(|| out_of_range("offset"))?;
    let len_bytes = data
        .get(offset..start)
        .ok_or_else(|| out_of_range("offset"))?;
    let mut low = [0u8; 8];
    low.copy_from_slice(&len_bytes[WORD - 8..]);
    let len = usize::try_from(u64::from_be_bytes(low)).map_err(|_| out_of_range("length"))?;

    let end = start.checked_add(len).ok_or_else(|| out_of_range("length"))?;
    let bytes = data.get(start..end).ok_or_else(|| out_of_range("data"))?;
    String::from_utf8(bytes.to_vec()).map_err(|e| LedgerError::Decode(e.to_string()))
}

/// Call data for `verifyContent`
pub fn encode_verify_content(
    content_hash: &str,
    is_verified: bool,
    confidence_score: u8,
    content_type: &str,
    ai_model_used: &str,
) -> Result<Vec<u8>, LedgerError> {
    Ok(encode_call(
        VERIFY_CONTENT_SIGNATURE,
        &[
            Token::FixedBytes(parse_bytes32(content_hash)?),
            Token::Bool(is_verified),
            Token::Uint(confidence_score as u64),
            Token::String(content_type.to_string()),
            Token::String(ai_model_used.to_string()),
        ],
    ))
}

/// Call data for `getVerification`
pub fn encode_get_verification(content_hash: &str) -> Result<Vec<u8>, LedgerError> {
    Ok(encode_call(
        GET_VERIFICATION_SIGNATURE,
        &[Token::FixedBytes(parse_bytes32(content_hash)?)],
    ))
}

/// Decode the `getVerification` return tuple
pub fn decode_verification(data: &[u8]) -> Result<VerificationRecord, LedgerError> {
    let verifier = to_hex(&word(data, 0)?[WORD - 20..]);
    let timestamp = word_u64(data, 1)?;
    let is_verified = word_u64(data, 2)? != 0;
    let confidence_score = word_u64(data, 3)?.min(MAX_SCORE as u64) as u8;

    Ok(VerificationRecord {
        verifier,
        timestamp,
        is_verified,
        confidence_score,
        content_type: word_string(data, 4)?,
        ai_model_used: word_string(data, 5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470";

    #[test]
    fn test_selector() {
        assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
        assert_eq!(selector("balanceOf(address)"), [0x70, 0xa0, 0x82, 0x31]);
    }

    #[test]
    fn test_hex_helpers() {
        assert_eq!(to_hex(&[0x00, 0xab, 0xff]), "0x00abff");
        assert_eq!(from_hex("0x00abff").unwrap(), vec![0x00, 0xab, 0xff]);
        assert_eq!(from_hex("abff").unwrap(), vec![0xab, 0xff]);
        assert!(from_hex("0xabc").is_err());
        assert!(from_hex("0xzz").is_err());
        assert!(from_hex("0xé1").is_err());
        assert!(parse_bytes32("0x1234").is_err());
    }

    #[test]
    fn test_verify_content_layout() {
        let data = encode_verify_content(HASH, true, 85, "text", "Pattern Analysis (fallback)")
            .unwrap();
        let args = &data[4..];

        assert_eq!(&data[..4], &selector(VERIFY_CONTENT_SIGNATURE));
        assert_eq!(to_hex(&args[..32]), HASH);
        assert_eq!(word_u64(args, 1).unwrap(), 1);
        assert_eq!(word_u64(args, 2).unwrap(), 85);
        // Five head words, so the first string starts at 0xa0
        assert_eq!(word_u64(args, 3).unwrap(), 0xa0);
        // "text" takes a length word plus one padded data word
        assert_eq!(word_u64(args, 4).unwrap(), 0xe0);
        assert_eq!(word_u64(args, 5).unwrap(), 4);
        assert_eq!(&args[6 * 32..6 * 32 + 4], b"text");
        assert_eq!(word_string(args, 4).unwrap(), "Pattern Analysis (fallback)");
        assert_eq!(args.len() % 32, 0);
    }

    #[test]
    fn test_decode_verification() {
        let verifier = parse_address("0x1234567890abcdef1234567890abcdef12345678").unwrap();
        let encoded = encode(&[
            Token::Address(verifier),
            Token::Uint(1_700_000_000),
            Token::Bool(false),
            Token::Uint(37),
            Token::String("url".to_string()),
            Token::String("Google Gemini 2.0 Flash".to_string()),
        ]);

        let record = decode_verification(&encoded).unwrap();
        assert_eq!(record.verifier, "0x1234567890abcdef1234567890abcdef12345678");
        assert_eq!(record.timestamp, 1_700_000_000);
        assert!(!record.is_verified);
        assert_eq!(record.confidence_score, 37);
        assert_eq!(record.content_type, "url");
        assert_eq!(record.ai_model_used, "Google Gemini 2.0 Flash");
    }

    #[test]
    fn test_decode_empty_record() {
        let encoded = encode(&[
            Token::Address([0u8; 20]),
            Token::Uint(0),
            Token::Bool(false),
            Token::Uint(0),
            Token::String(String::new()),
            Token::String(String::new()),
        ]);
        let record = decode_verification(&encoded).unwrap();
        assert!(!record.exists());
    }

    #[test]
    fn test_decode_clamps_confidence() {
        let encoded = encode(&[
            Token::Address([0u8; 20]),
            Token::Uint(1),
            Token::Bool(true),
            Token::Uint(150),
            Token::String("text".to_string()),
            Token::String("m".to_string()),
        ]);
        assert_eq!(decode_verification(&encoded).unwrap().confidence_score, 100);
    }

    #[test]
    fn test_decode_out_of_range_string() {
        let mut data = vec![0u8; 6 * 32];
        // Offset word for the first string set to u64::MAX
        data[4 * 32 + 24..5 * 32].copy_from_slice(&u64::MAX.to_be_bytes());
        assert!(matches!(
            decode_verification(&data),
            Err(LedgerError::Decode(_))
        ));

        // Valid offset, but a length word of u64::MAX
        let mut data = vec![0u8; 7 * 32];
        data[4 * 32 + 24..5 * 32].copy_from_slice(&(6u64 * 32).to_be_bytes());
        data[6 * 32 + 24..7 * 32].copy_from_slice(&u64::MAX.to_be_bytes());
        assert!(matches!(
            decode_verification(&data),
            Err(LedgerError::Decode(_))
        ));
    }

    #[test]
    fn test_decode_truncated() {
        assert!(matches!(
            decode_verification(&[0u8; 64]),
            Err(LedgerError::Decode(_))
        ));
    }
}
