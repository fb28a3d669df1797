//! Access token encryption using AES-256-GCM
//!
//! Platform access tokens for social accounts are stored encrypted. Each
//! ciphertext is bound to its account through additional authenticated data
//! built from the owner, platform and platform-side account id, so a token
//! copied onto another account row fails to decrypt.
//!
//! Layout: `version (1 byte) | nonce (12 bytes) | ciphertext + tag`.

#![allow(deprecated)]

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng, Payload},
};
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::models::Platform;
use crate::models::social_account::Model as SocialAccountModel;

const FORMAT_VERSION: u8 = 0x01;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = 1 + NONCE_LEN;

/// Crypto error types
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("encryption failed")]
    EncryptionFailed,
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("unsupported ciphertext version {0:#04x}")]
    UnsupportedVersion(u8),
    #[error("ciphertext is truncated")]
    Truncated,
    #[error("decrypted token is not valid UTF-8")]
    InvalidUtf8,
}

/// 32-byte AES key that is wiped from memory on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CryptoKey(Vec<u8>);

impl CryptoKey {
    pub fn new(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKeyLength(bytes.len()));
        }
        Ok(Self(bytes))
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.0))
    }
}

impl std::fmt::Debug for CryptoKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CryptoKey([REDACTED])")
    }
}

/// Associated data binding a ciphertext to one social account
pub fn account_aad(user_id: i64, platform: Platform, account_id: &str) -> Vec<u8> {
    format!("{}|{}|{}", user_id, platform, account_id).into_bytes()
}

/// Encrypt `plaintext` with a fresh random nonce
pub fn encrypt_bytes(key: &CryptoKey, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let sealed = key
        .cipher()
        .encrypt(&nonce, Payload { msg: plaintext, aad })
        .map_err(|_| CryptoError::EncryptionFailed)?;

    let mut out = Vec::with_capacity(HEADER_LEN + sealed.len());
    out.push(FORMAT_VERSION);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// Decrypt a payload produced by [`encrypt_bytes`]
pub fn decrypt_bytes(key: &CryptoKey, aad: &[u8], payload: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let (&version, rest) = payload.split_first().ok_or(CryptoError::Truncated)?;
    if version != FORMAT_VERSION {
        return Err(CryptoError::UnsupportedVersion(version));
    }
    if rest.len() < NONCE_LEN + TAG_LEN {
        return Err(CryptoError::Truncated);
    }

    let (nonce, sealed) = rest.split_at(NONCE_LEN);
    key.cipher()
        .decrypt(Nonce::from_slice(nonce), Payload { msg: sealed, aad })
        .map_err(|_| CryptoError::DecryptionFailed)
}

/// Encrypt an access token for the account identified by the AAD parts
pub fn encrypt_access_token(
    key: &CryptoKey,
    user_id: i64,
    platform: Platform,
    account_id: &str,
    token: &str,
) -> Result<Vec<u8>, CryptoError> {
    encrypt_bytes(
        key,
        &account_aad(user_id, platform, account_id),
        token.as_bytes(),
    )
}

/// Decrypt the stored access token of a social account, if any
pub fn decrypt_access_token(
    key: &CryptoKey,
    account: &SocialAccountModel,
) -> Result<Option<String>, CryptoError> {
    let Some(ciphertext) = account.access_token_ciphertext.as_deref() else {
        return Ok(None);
    };

    let aad = account_aad(account.user_id, account.platform, &account.account_id);
    let bytes = decrypt_bytes(key, &aad, ciphertext)?;
    String::from_utf8(bytes)
        .map(Some)
        .map_err(|_| CryptoError::InvalidUtf8)
}
