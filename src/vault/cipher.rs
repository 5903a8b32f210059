use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use zeroize::{Zeroize, Zeroizing};

use super::{DecryptionError, SymmetricKey};

type Aes256CbcDec = cbc::Decryptor<Aes256>;
type Aes256CbcEnc = cbc::Encryptor<Aes256>;

/// AES block and IV length in bytes.
pub const IV_LEN: usize = 16;

/// Decrypt an `<iv-hex>:<ciphertext-hex>` record into the plaintext private key.
///
/// Everything after the first colon is treated as ciphertext, which is read
/// up to its first non-hex character, so trailing `:` segments are ignored. No partial
/// plaintext is ever returned: a failed padding check or a non-UTF-8 result
/// is an error and the scratch buffer is wiped.
pub fn decrypt(record: &str, key: &SymmetricKey) -> Result<Zeroizing<String>, DecryptionError> {
    let (iv_hex, ciphertext_hex) = record
        .trim()
        .split_once(':')
        .ok_or(DecryptionError::MalformedRecord)?;

    let iv = hex::decode(iv_hex).map_err(|e| DecryptionError::InvalidHex(e.to_string()))?;
    if iv.len() != IV_LEN {
        return Err(DecryptionError::InvalidIv {
            expected: IV_LEN,
            actual: iv.len(),
        });
    }

    let ciphertext = hex::decode(leading_hex(ciphertext_hex))
        .map_err(|e| DecryptionError::InvalidHex(e.to_string()))?;
    if ciphertext.is_empty() || ciphertext.len() % IV_LEN != 0 {
        return Err(DecryptionError::InvalidCiphertextLength(ciphertext.len()));
    }

    let decryptor = Aes256CbcDec::new_from_slices(key.as_bytes(), &iv).map_err(|_| {
        DecryptionError::InvalidIv {
            expected: IV_LEN,
            actual: iv.len(),
        }
    })?;
    let plaintext = decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| DecryptionError::BadPadding)?;

    match String::from_utf8(plaintext) {
        Ok(text) => Ok(Zeroizing::new(text)),
        Err(e) => {
            let mut bytes = e.into_bytes();
            bytes.zeroize();
            Err(DecryptionError::InvalidUtf8)
        }
    }
}

// Longest even-length run of hex digits at the start of `s`.
fn leading_hex(s: &str) -> &str {
    let end = s.find(|c: char| !c.is_ascii_hexdigit()).unwrap_or(s.len());
    &s[..end - end % 2]
}

/// Encrypt a private key into the record format read by [`decrypt`], using a fresh random IV.
pub fn encrypt(plaintext: &str, key: &SymmetricKey) -> String {
    let iv: [u8; IV_LEN] = rand::random();
    encrypt_with_iv(plaintext, key, &iv)
}

/// Encrypt with a caller-chosen IV.
pub fn encrypt_with_iv(plaintext: &str, key: &SymmetricKey, iv: &[u8; IV_LEN]) -> String {
    let ciphertext = Aes256CbcEnc::new(key.as_bytes().into(), iv.into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());
    format!("{}:{}", hex::encode(iv), hex::encode(ciphertext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::derive;

    const PRIVATE_KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[test]
    fn test_round_trip() {
        let key = derive("hunter2");
        let record = encrypt(PRIVATE_KEY, &key);
        let decrypted = decrypt(&record, &key).unwrap();
        assert_eq!(decrypted.as_str(), PRIVATE_KEY);
    }

    #[test]
    fn test_round_trip_empty_and_block_sized_plaintexts() {
        let key = derive("");
        for plaintext in ["", "0123456789abcdef", "a"] {
            let record = encrypt(plaintext, &key);
            assert_eq!(decrypt(&record, &key).unwrap().as_str(), plaintext);
        }
    }

    #[test]
    fn test_record_format() {
        let key = derive("hunter2");
        let record = encrypt_with_iv(PRIVATE_KEY, &key, &[7u8; IV_LEN]);
        let (iv, ciphertext) = record.split_once(':').unwrap();
        assert_eq!(iv, "07".repeat(IV_LEN));
        // 66 bytes of plaintext pad up to 80 bytes of ciphertext
        assert_eq!(ciphertext.len(), 160);
    }

    #[test]
    fn test_wrong_key_fails() {
        let record = encrypt_with_iv(PRIVATE_KEY, &derive("right"), &[1u8; IV_LEN]);
        let result = decrypt(&record, &derive("wrong"));
        assert!(result.is_err());
    }

    #[test]
    fn test_truncated_iv_fails() {
        let key = derive("hunter2");
        let record = encrypt(PRIVATE_KEY, &key);
        let (iv, ciphertext) = record.split_once(':').unwrap();
        let truncated = format!("{}:{}", &iv[..20], ciphertext);
        assert_eq!(
            decrypt(&truncated, &key).unwrap_err(),
            DecryptionError::InvalidIv {
                expected: IV_LEN,
                actual: 10
            }
        );
    }

    #[test]
    fn test_bad_ciphertext_length_fails() {
        let key = derive("hunter2");
        let record = format!("{}:{}", "00".repeat(IV_LEN), "ab".repeat(17));
        assert_eq!(
            decrypt(&record, &key).unwrap_err(),
            DecryptionError::InvalidCiphertextLength(17)
        );
    }

    #[test]
    fn test_missing_separator_fails() {
        let key = derive("hunter2");
        assert_eq!(
            decrypt("deadbeef", &key).unwrap_err(),
            DecryptionError::MalformedRecord
        );
    }

    #[test]
    fn test_ciphertext_stops_at_first_colon() {
        let key = derive("hunter2");
        let record = encrypt(PRIVATE_KEY, &key);

        for suffix in [":", ":cdcd", ":zz:00"] {
            let extended = format!("{record}{suffix}");
            assert_eq!(decrypt(&extended, &key).unwrap().as_str(), PRIVATE_KEY);
        }
    }

    #[test]
    fn test_ciphertext_without_hex_prefix_is_empty() {
        let key = derive("hunter2");
        let record = format!("{}::{}", "00".repeat(IV_LEN), "ab".repeat(16));
        assert_eq!(
            decrypt(&record, &key).unwrap_err(),
            DecryptionError::InvalidCiphertextLength(0)
        );
    }

    #[test]
    fn test_non_hex_iv_is_rejected() {
        let key = derive("hunter2");
        let record = format!("{}zz:{}", "00".repeat(IV_LEN - 1), "ab".repeat(16));
        assert!(matches!(
            decrypt(&record, &key),
            Err(DecryptionError::InvalidHex(_))
        ));
    }
}
