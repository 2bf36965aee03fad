use anyhow::anyhow;
use base64::{prelude::BASE64_STANDARD, Engine};
use cipher::{block_padding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use md5::{Digest, Md5};

type AesCbcDec = cbc::Decryptor<aes::Aes256>;
type AesCbcEnc = cbc::Encryptor<aes::Aes256>;

const SALT_MAGIC: &[u8; 8] = b"Salted__";

/// OpenSSL `EVP_BytesToKey` with MD5, the derivation CryptoJS uses for
/// passphrase-keyed payloads.
fn derive_key_iv(secret: &str, salt: &[u8]) -> ([u8; 32], [u8; 16]) {
    let mut key = [0u8; 32];
    let mut iv = [0u8; 16];

    let mut digest: Vec<u8> = vec![];
    let mut material: Vec<u8> = vec![];

    while material.len() < key.len() + iv.len() {
        let mut hasher = Md5::new();
        hasher.update(&digest);
        hasher.update(secret.as_bytes());
        hasher.update(salt);
        digest = hasher.finalize().to_vec();
        material.extend_from_slice(&digest);
    }

    key.copy_from_slice(&material[..32]);
    iv.copy_from_slice(&material[32..48]);
    (key, iv)
}

/// Decrypts a base64 `Salted__` payload with the shared secret.
pub fn decrypt(ciphertext: &str, secret: &str) -> anyhow::Result<String> {
    let raw = BASE64_STANDARD.decode(ciphertext.trim())?;

    if raw.len() < 16 || &raw[..8] != SALT_MAGIC {
        return Err(anyhow!("payload is not in salted form"));
    }

    let (key, iv) = derive_key_iv(secret, &raw[8..16]);
    let cipher = AesCbcDec::new_from_slices(&key, &iv).map_err(|e| anyhow!(e))?;

    let pt = cipher
        .decrypt_padded_vec_mut::<block_padding::Pkcs7>(&raw[16..])
        .map_err(|e| anyhow!(e))?;

    Ok(String::from_utf8(pt)?)
}

pub fn encrypt(plaintext: &str, secret: &str, salt: &[u8; 8]) -> String {
    let (key, iv) = derive_key_iv(secret, salt);
    let cipher = AesCbcEnc::new_from_slices(&key, &iv).unwrap();

    let ct = cipher.encrypt_padded_vec_mut::<block_padding::Pkcs7>(plaintext.as_bytes());

    let mut raw = Vec::with_capacity(16 + ct.len());
    raw.extend_from_slice(SALT_MAGIC);
    raw.extend_from_slice(salt);
    raw.extend_from_slice(&ct);

    BASE64_STANDARD.encode(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_decrypt_salted_payload() {
        let ct = encrypt("[720p]https://x/video.mp4", "secret", b"\x01\x02\x03\x04\x05\x06\x07\x08");
        assert_eq!(decrypt(&ct, "secret").unwrap(), "[720p]https://x/video.mp4");
    }

    #[test]
    fn should_reject_unsalted_payload() {
        let ct = BASE64_STANDARD.encode(b"garbage without magic");
        assert!(decrypt(&ct, "secret").is_err());
    }

    #[test]
    fn should_reject_wrong_secret() {
        let ct = encrypt("text", "secret", b"\x01\x02\x03\x04\x05\x06\x07\x08");
        assert!(decrypt(&ct, "other").is_err());
    }
}
