//! At-rest encryption for CAS document passwords.

use aes::Aes256;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::{rngs::OsRng, RngCore};

use super::cas_model::EncryptedSecret;
use crate::constants::{DECRYPTION_FAILED_MESSAGE, VAULT_IV_LEN, VAULT_KEY_LEN};
use crate::errors::{Error, Result};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Encrypts and decrypts CAS passwords with AES-256-CBC.
///
/// There is no authentication tag: a wrong key is only noticed when the
/// padding or UTF-8 check fails after decryption.
pub struct CredentialVault {
    key: Option<[u8; VAULT_KEY_LEN]>,
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVault")
            .field("configured", &self.key.is_some())
            .finish()
    }
}

impl CredentialVault {
    /// Builds a vault from the configured key. A missing or blank key is not
    /// an error here; it surfaces as `Error::Config` on first use.
    pub fn new(encryption_key: Option<&str>) -> Self {
        let key = encryption_key
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(derive_key);
        Self { key }
    }

    pub fn is_configured(&self) -> bool {
        self.key.is_some()
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptedSecret> {
        let key = self.key()?;
        let mut iv = [0u8; VAULT_IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let cipher = Aes256CbcEnc::new_from_slices(key, &iv)
            .map_err(|e| Error::Config(format!("Invalid CAS encryption key: {e}")))?;
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        Ok(EncryptedSecret {
            ciphertext_hex: hex::encode(ciphertext),
            iv_hex: hex::encode(iv),
        })
    }

    pub fn decrypt(&self, secret: &EncryptedSecret) -> Result<String> {
        let key = self.key()?;
        let ciphertext = hex::decode(&secret.ciphertext_hex).map_err(|_| decryption_error())?;
        let iv = hex::decode(&secret.iv_hex).map_err(|_| decryption_error())?;

        let cipher = Aes256CbcDec::new_from_slices(key, &iv).map_err(|_| decryption_error())?;
        let plaintext = cipher
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| decryption_error())?;

        String::from_utf8(plaintext).map_err(|_| decryption_error())
    }

    fn key(&self) -> Result<&[u8; VAULT_KEY_LEN]> {
        self.key.as_ref().ok_or_else(|| {
            Error::Config("ADV_CAS_ENCRYPTION_KEY must be set to store CAS passwords".to_string())
        })
    }
}

fn decryption_error() -> Error {
    Error::Decryption(DECRYPTION_FAILED_MESSAGE.to_string())
}

/// A 64-character hex string is decoded; anything else is taken as raw bytes,
/// zero-padded or truncated to the key length.
fn derive_key(raw: &str) -> [u8; VAULT_KEY_LEN] {
    let mut key = [0u8; VAULT_KEY_LEN];
    if raw.len() == VAULT_KEY_LEN * 2 {
        if let Ok(decoded) = hex::decode(raw) {
            key.copy_from_slice(&decoded);
            return key;
        }
    }
    let bytes = raw.as_bytes();
    let len = bytes.len().min(VAULT_KEY_LEN);
    key[..len].copy_from_slice(&bytes[..len]);
    key
}
