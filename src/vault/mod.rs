//! Encrypted-at-rest wallet storage.
//!
//! Private keys are stored as `<iv-hex>:<ciphertext-hex>` records, encrypted with
//! AES-256-CBC under a key derived from the operator secret.

mod cipher;
mod key;

pub use cipher::{decrypt, encrypt, encrypt_with_iv, IV_LEN};
pub use key::{derive, SymmetricKey, KEY_LEN};

use thiserror::Error;

/// Failure to turn an encrypted record back into a private key.
///
/// Every variant is a configuration problem (wrong secret, corrupted or
/// hand-edited wallet file); none of them is retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecryptionError {
    #[error("record is not in <iv>:<ciphertext> form")]
    MalformedRecord,

    #[error("record contains invalid hex: {0}")]
    InvalidHex(String),

    #[error("initialization vector must be {expected} bytes, got {actual}")]
    InvalidIv { expected: usize, actual: usize },

    #[error("ciphertext length {0} is not a positive multiple of the block size")]
    InvalidCiphertextLength(usize),

    #[error("padding check failed (wrong password or corrupted record)")]
    BadPadding,

    #[error("decrypted key is not valid UTF-8 (wrong password or corrupted record)")]
    InvalidUtf8,
}
