//! Hash augmentation.
//!
//! When a message carries a text `_hash` field, that text names another
//! field. The named field's text is digested and the base64 digest
//! overwrites `_hash` itself. The output slot is `_hash`, not `hash`.

use base64::Engine;
use sha2::{Digest, Sha256, Sha512};
use serde_json::Value;

use crate::error::RouterError;
use crate::message::{Message, HASH_FIELD};

/// Digest algorithm used when none is configured.
pub const DEFAULT_DIGEST_ALGORITHM: &str = "SHA-256";

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha256,
    Sha512,
}

impl DigestAlgorithm {
    /// Resolve an algorithm by name (`SHA-256`, `sha256`, `SHA-512`, ...).
    ///
    /// # Errors
    /// [`RouterError::DigestUnavailable`] for unknown names.
    pub fn from_name(name: &str) -> Result<Self, RouterError> {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(RouterError::DigestUnavailable(name.to_string())),
        }
    }

    pub fn digest(&self, bytes: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha256 => Sha256::digest(bytes).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(bytes).to_vec(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha512 => "SHA-512",
        }
    }
}

/// Standard padded base64.
pub fn encode_digest(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Apply hash augmentation to `message` in place.
///
/// A missing or non-text `_hash` leaves the message untouched. The digest
/// algorithm is resolved only when a message actually needs hashing.
///
/// # Errors
/// - [`RouterError::HashTarget`] if the named field is missing or not text
/// - [`RouterError::DigestUnavailable`] if `algorithm` cannot be resolved
pub fn augment_hash(message: &mut Message, algorithm: &str) -> Result<bool, RouterError> {
    let target = match message.get(HASH_FIELD) {
        Some(Value::String(target)) => target.clone(),
        _ => return Ok(false),
    };

    let text = match message.get(&target) {
        Some(Value::String(text)) => text,
        Some(_) => {
            return Err(RouterError::HashTarget {
                field: target,
                reason: "value is not text",
            })
        }
        None => {
            return Err(RouterError::HashTarget {
                field: target,
                reason: "field is missing",
            })
        }
    };

    let digest = DigestAlgorithm::from_name(algorithm)?.digest(text.as_bytes());
    message.insert(HASH_FIELD, Value::String(encode_digest(&digest)));
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const ABC_SHA256_B64: &str = "ungWv48Bz+pBQUDeXa4iI7ADYaOWF3qctBD/YfIAFa0=";

    #[test]
    fn test_from_name() {
        assert_eq!(DigestAlgorithm::from_name("SHA-256").unwrap(), DigestAlgorithm::Sha256);
        assert_eq!(DigestAlgorithm::from_name("sha256").unwrap(), DigestAlgorithm::Sha256);
        assert_eq!(DigestAlgorithm::from_name("sha_512").unwrap(), DigestAlgorithm::Sha512);
        assert!(matches!(
            DigestAlgorithm::from_name("MD5"),
            Err(RouterError::DigestUnavailable(name)) if name == "MD5"
        ));
    }

    #[test]
    fn test_digest_lengths() {
        assert_eq!(DigestAlgorithm::Sha256.digest(b"abc").len(), 32);
        assert_eq!(DigestAlgorithm::Sha512.digest(b"abc").len(), 64);
    }

    #[test]
    fn test_augment_overwrites_hash_field() {
        let mut message = Message::decode(r#"{"_hash":"secret","secret":"abc"}"#).unwrap();
        assert!(augment_hash(&mut message, DEFAULT_DIGEST_ALGORITHM).unwrap());

        assert_eq!(message.get(HASH_FIELD), Some(&json!(ABC_SHA256_B64)));
        assert_eq!(message.get("secret"), Some(&json!("abc")));
        assert!(!message.contains("hash"));
        // position of `_hash` is kept
        assert_eq!(message.iter().next().map(|(k, _)| k.as_str()), Some(HASH_FIELD));
    }

    #[test]
    fn test_augment_can_target_itself() {
        let mut message = Message::decode(r#"{"_hash":"_hash"}"#).unwrap();
        augment_hash(&mut message, DEFAULT_DIGEST_ALGORITHM).unwrap();
        let expected = encode_digest(&DigestAlgorithm::Sha256.digest(b"_hash"));
        assert_eq!(message.get(HASH_FIELD), Some(&json!(expected)));
    }

    #[test]
    fn test_augment_missing_target() {
        let mut message = Message::decode(r#"{"_hash":"abc"}"#).unwrap();
        let err = augment_hash(&mut message, DEFAULT_DIGEST_ALGORITHM).unwrap_err();
        assert!(matches!(err, RouterError::HashTarget { ref field, .. } if field == "abc"));
        assert_eq!(message.get(HASH_FIELD), Some(&json!("abc")));
    }

    #[test]
    fn test_augment_non_text_target() {
        let mut message = Message::decode(r#"{"_hash":"n","n":5}"#).unwrap();
        assert!(matches!(
            augment_hash(&mut message, DEFAULT_DIGEST_ALGORITHM),
            Err(RouterError::HashTarget { .. })
        ));
    }

    #[test]
    fn test_augment_skips_non_text_hash_field() {
        let mut message = Message::decode(r#"{"_hash":3}"#).unwrap();
        assert!(!augment_hash(&mut message, DEFAULT_DIGEST_ALGORITHM).unwrap());
        assert_eq!(message.get(HASH_FIELD), Some(&json!(3)));
    }

    #[test]
    fn test_augment_unknown_algorithm() {
        let mut message = Message::decode(r#"{"_hash":"a","a":"x"}"#).unwrap();
        assert!(matches!(
            augment_hash(&mut message, "WHIRLPOOL"),
            Err(RouterError::DigestUnavailable(_))
        ));
        assert_eq!(message.get(HASH_FIELD), Some(&json!("a")));
    }
}
