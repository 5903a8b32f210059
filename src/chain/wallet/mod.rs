mod keys;
mod signer;

pub use keys::{derive_address, to_checksum_address, EvmWallet};
pub use signer::{personal_message_hash, sign_personal_message, MessageSigner};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("invalid private key")]
    InvalidPrivateKey,

    #[error("signing failed: {0}")]
    Signing(String),
}
