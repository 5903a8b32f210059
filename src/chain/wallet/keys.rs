use secp256k1::{PublicKey, Secp256k1, SecretKey};
use tiny_keccak::{Hasher, Keccak};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::signer::MessageSigner;
use super::WalletError;

/// An EVM wallet held in memory for a single pipeline pass.
/// The private key is wiped when the wallet is dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct EvmWallet {
    #[zeroize(skip)] // Public data doesn't need zeroizing
    pub address: String,

    private_key_bytes: [u8; 32],
}

impl EvmWallet {
    /// Build a wallet from a hex private key, with or without a `0x` prefix.
    pub fn from_private_key_hex(private_key: &str) -> Result<Self, WalletError> {
        let trimmed = private_key.trim();
        let stripped = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let mut raw = hex::decode(stripped).map_err(|_| WalletError::InvalidPrivateKey)?;
        if raw.len() != 32 {
            raw.zeroize();
            return Err(WalletError::InvalidPrivateKey);
        }

        let mut private_key_bytes = [0u8; 32];
        private_key_bytes.copy_from_slice(&raw);
        raw.zeroize();

        let secret_key =
            SecretKey::from_slice(&private_key_bytes).map_err(|_| WalletError::InvalidPrivateKey)?;
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);

        Ok(Self {
            address: derive_address(&public_key),
            private_key_bytes,
        })
    }

    /// Get the private key as a SecretKey (for signing)
    pub fn private_key(&self) -> Result<SecretKey, WalletError> {
        SecretKey::from_slice(&self.private_key_bytes).map_err(|_| WalletError::InvalidPrivateKey)
    }
}

impl std::fmt::Debug for EvmWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmWallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl MessageSigner for EvmWallet {
    fn address(&self) -> &str {
        &self.address
    }

    fn sign_message(&self, message: &[u8]) -> Result<String, WalletError> {
        let private_key = self.private_key()?;
        let signature = super::signer::sign_personal_message(message, &private_key)?;
        Ok(format!("0x{}", hex::encode(signature)))
    }
}

/// Keccak-256 helper shared by address derivation and message hashing.
pub(crate) fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut hash = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut hash);
    hash
}

/// Derive the EIP-55 checksummed address for a public key.
pub fn derive_address(public_key: &PublicKey) -> String {
    // Skip the 0x04 prefix byte, hash only the X,Y coordinates
    let pubkey_bytes = public_key.serialize_uncompressed();
    let hash = keccak256(&pubkey_bytes[1..]);
    to_checksum_address(&hash[12..])
}

/// EIP-55 mixed-case encoding of a 20-byte address.
pub fn to_checksum_address(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(2 + lower.len());
    out.push_str("0x");
    for (i, c) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}
