//! # Identifier Signer
//!
//! Derives the 40-character identifiers that authenticate resize requests,
//! and validates them on the inbound path.
//!
//! Identifiers are HMAC-SHA256 tags truncated to 160 bits and hex encoded.
//! Forging one requires the process secret; there is no other authorization
//! on the deferred endpoint.
//!
//! # Example
//! ```
//! use orgnk_imageresize::config::signing::SigningConfig;
//! use orgnk_imageresize::resize::signer::{IdentifierSigner, encode_message, is_valid_identifier};
//!
//! let signer = IdentifierSigner::new(&SigningConfig::from_secret("k"));
//! let url = "https://cdn.example.com/resized-uploads/a_resized_x.jpg";
//! let id = signer.sign(url);
//! assert!(is_valid_identifier(&id));
//! assert_eq!(signer.validate(&id, &encode_message(url)).unwrap(), url);
//! ```

use std::borrow::Cow;

use hmac::{Hmac, Mac};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::config::signing::SigningConfig;
use crate::error::resize::ResizeError;

type HmacSha256 = Hmac<Sha256>;

/// Length of an identifier in hex characters.
pub const IDENTIFIER_LEN: usize = 40;

/// Rounds of percent-decoding tried on an inbound message.
const MAX_DECODE_ROUNDS: usize = 2;

/// Signs and validates identifiers with the process secret.
#[derive(Clone)]
pub struct IdentifierSigner {
    key: [u8; 32],
}

impl IdentifierSigner {
    pub fn new(cfg: &SigningConfig) -> Self {
        Self { key: cfg.secret }
    }

    /// Returns the 40-character lowercase hex MAC of `message`.
    pub fn sign(&self, message: &str) -> String {
        hex::encode(self.tag(message))
    }

    /// Returns the decoded message iff `identifier` is well formed and is its MAC.
    ///
    /// `encoded` may arrive percent-encoded once, twice (routers re-encode
    /// slashes), or already decoded by the router; every form is tried.
    pub fn validate(&self, identifier: &str, encoded: &str) -> Result<String, ResizeError> {
        if !is_valid_identifier(identifier) {
            return Err(ResizeError::InvalidSignature);
        }
        let Ok(expected) = hex::decode(identifier) else {
            return Err(ResizeError::InvalidSignature);
        };

        decode_candidates(encoded)
            .into_iter()
            .find(|candidate| self.tag(candidate).ct_eq(&expected).unwrap_u8() == 1)
            .ok_or(ResizeError::InvalidSignature)
    }

    fn tag(&self, message: &str) -> [u8; IDENTIFIER_LEN / 2] {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC key");
        mac.update(message.as_bytes());
        let full = mac.finalize().into_bytes();
        let mut out = [0u8; IDENTIFIER_LEN / 2];
        out.copy_from_slice(&full[..IDENTIFIER_LEN / 2]);
        out
    }
}

/// `len == 40` and every character is lowercase hex, exactly as [`IdentifierSigner::sign`] emits.
pub fn is_valid_identifier(id: &str) -> bool {
    id.len() == IDENTIFIER_LEN && id.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Percent-encodes a message so it fits in a single path segment.
pub fn encode_message(message: &str) -> String {
    utf8_percent_encode(message, NON_ALPHANUMERIC).to_string()
}

fn decode_candidates(encoded: &str) -> Vec<String> {
    let mut out = Vec::with_capacity(MAX_DECODE_ROUNDS + 1);
    let mut current = encoded.to_string();
    for _ in 0..MAX_DECODE_ROUNDS {
        let decoded = match percent_decode_str(&current).decode_utf8() {
            Ok(Cow::Borrowed(s)) => s.to_string(),
            Ok(Cow::Owned(s)) => s,
            Err(_) => break,
        };
        if decoded == current {
            break;
        }
        out.push(decoded.clone());
        current = decoded;
    }
    out.push(encoded.to_string());
    out
}
