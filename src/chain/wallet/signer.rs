use secp256k1::{Message, Secp256k1, SecretKey};

use super::keys::keccak256;
use super::WalletError;

/// Wallet capability used by the login handshake.
pub trait MessageSigner {
    /// Checksummed public address of the wallet.
    fn address(&self) -> &str;

    /// Sign an arbitrary message as an Ethereum personal message.
    /// Returns the `0x`-prefixed 65-byte signature in hex.
    fn sign_message(&self, message: &[u8]) -> Result<String, WalletError>;
}

/// Hash a message with the EIP-191 personal message prefix.
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", message.len());
    let mut data = Vec::with_capacity(prefix.len() + message.len());
    data.extend_from_slice(prefix.as_bytes());
    data.extend_from_slice(message);
    keccak256(&data)
}

/// Sign a personal message.
/// Returns 65-byte signature (r || s || v) with v in {27, 28}.
pub fn sign_personal_message(
    message: &[u8],
    private_key: &SecretKey,
) -> Result<[u8; 65], WalletError> {
    let hash = personal_message_hash(message);
    let message =
        Message::from_digest_slice(&hash).map_err(|e| WalletError::Signing(e.to_string()))?;

    let secp = Secp256k1::signing_only();
    let recoverable_sig = secp.sign_ecdsa_recoverable(&message, private_key);
    let (recovery_id, signature) = recoverable_sig.serialize_compact();

    let mut sig_bytes = [0u8; 65];
    sig_bytes[..64].copy_from_slice(&signature);
    sig_bytes[64] = (recovery_id.to_i32() % 2) as u8 + 27;
    Ok(sig_bytes)
}
