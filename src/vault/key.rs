use base64::Engine;
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// Symmetric key used to open wallet records.
///
/// The key material is the first 32 characters of the base64-encoded SHA-256
/// digest of the operator secret, taken as raw bytes. Wallet files produced by
/// the existing tooling depend on this exact construction.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey([u8; KEY_LEN]);

impl SymmetricKey {
    /// Derive the key from an operator secret. Empty secrets are accepted.
    pub fn derive(secret: &str) -> Self {
        let mut digest: [u8; 32] = Sha256::digest(secret.as_bytes()).into();
        let mut encoded = base64::engine::general_purpose::STANDARD.encode(digest);

        // 32 digest bytes always encode to 44 base64 characters
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&encoded.as_bytes()[..KEY_LEN]);

        digest.zeroize();
        encoded.zeroize();
        Self(key)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

/// Shorthand for [`SymmetricKey::derive`].
pub fn derive(secret: &str) -> SymmetricKey {
    SymmetricKey::derive(secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let a = derive("correct horse battery staple");
        let b = derive("correct horse battery staple");
        assert_eq!(a, b);
        assert_eq!(a.as_bytes().len(), KEY_LEN);
    }

    #[test]
    fn test_different_secrets_give_different_keys() {
        assert_ne!(derive("alpha"), derive("beta"));
    }

    #[test]
    fn test_empty_secret_matches_known_value() {
        // base64(sha256("")) = "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU="
        let key = derive("");
        assert_eq!(key.as_bytes(), b"47DEQpj8HBSa+/TImW+5JCeuQeRkm5NM");
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let key = derive("secret");
        let rendered = format!("{:?}", key);
        assert_eq!(rendered, "SymmetricKey(<redacted>)");
    }
}
