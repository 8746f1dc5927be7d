//! # Signing Configuration
//!
//! Holds the process-wide secret used to sign resize identifiers.
//!
//! The configuration reads from environment variables:
//! - `IMAGERESIZE_SECRET`: base string used to derive a 32-byte key
//!   (if missing, a random key is generated and signed URLs do not survive
//!   a restart)
//!
//! # Examples
//! ```rust
//! use orgnk_imageresize::config::signing::SigningConfig;
//!
//! let cfg = SigningConfig::from_env_with(|_| Some("s3cr3t".into()));
//! assert_eq!(cfg.secret.len(), 32);
//! assert!(!cfg.is_ephemeral());
//! ```

use std::env as std_env;

use rand::RngCore;
use sha2::{Digest, Sha256};

/// Secret key material for identifier signing.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningConfig {
    pub secret: [u8; 32],
    ephemeral: bool,
}

impl std::fmt::Debug for SigningConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningConfig")
            .field("secret", &"<redacted>")
            .field("ephemeral", &self.ephemeral)
            .finish()
    }
}

impl SigningConfig {
    /// Builds a configuration from a raw secret string.
    pub fn from_secret(secret: &str) -> Self {
        Self {
            secret: derive_secret_from_string(secret),
            ephemeral: false,
        }
    }

    /// Loads configuration from `IMAGERESIZE_SECRET`.
    pub fn from_env() -> Self {
        Self::from_env_with(|k| std_env::var(k).ok())
    }

    /// Loads configuration using a custom key provider (for testing/mocking).
    pub fn from_env_with<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        match get("IMAGERESIZE_SECRET").filter(|s| !s.trim().is_empty()) {
            Some(s) => Self::from_secret(&s),
            None => Self {
                secret: random_secret(),
                ephemeral: true,
            },
        }
    }

    /// Returns `true` when the key was generated for this process only.
    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral
    }
}

/// Derives a deterministic 32-byte key from a string.
pub fn derive_secret_from_string(s: &str) -> [u8; 32] {
    let digest = Sha256::digest(s.as_bytes());
    let mut key = [0u8; 32];
    key.copy_from_slice(&digest[..32]);
    key
}

/// Generates a new random 32-byte key.
pub fn random_secret() -> [u8; 32] {
    let mut key = [0u8; 32];
    rand::rng().fill_bytes(&mut key);
    key
}
