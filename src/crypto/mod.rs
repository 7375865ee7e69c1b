//! Crypto - AES-256-CBC with a PBKDF2-derived key
//!
//! Wire form of a ciphertext is `base64(iv || aes_cbc(plaintext))`. The 16-byte
//! IV doubles as the PBKDF2 salt, which keeps exports readable by every release
//! of the mobile app.
//!
//! ```text
//! password ──PBKDF2(hmac, iv, iterations)──→ 256-bit key
//!                                              │
//! plaintext ──────────── AES-256-CBC(key, iv) ─┴─→ iv || ciphertext ──→ base64
//! ```
//!
//! | Scheme | PRF | Default iterations | Envelope version |
//! |--------|-----|--------------------|------------------|
//! | `Legacy` | HMAC-SHA1 | 5 000 | 1 |
//! | `Sha256` | HMAC-SHA256 | 15 000 | 2 and later |

use aes::cipher::{
    block_padding::{NoPadding, Pkcs7},
    BlockDecryptMut, BlockEncryptMut, KeyIvInit,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha1::Sha1;
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const BLOCK_SIZE: usize = 16;
const KEY_SIZE: usize = 32;

pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 5_000;
pub const DEFAULT_PBKDF2_HMAC_SHA256_ITERATIONS: u32 = 15_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid base64: {0}")]
    InvalidBase64(String),

    #[error("Ciphertext too short: {0} bytes")]
    Truncated(usize),

    #[error("Bad padding (wrong password?)")]
    BadPadding,

    #[error("Plaintext is not UTF-8 (wrong password?)")]
    NotUtf8,

    #[error("Cipher init failed: {0}")]
    Init(String),
}

/// Key-derivation scheme. Selected from the envelope version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    /// PBKDF2-HMAC-SHA1
    Legacy,
    /// PBKDF2-HMAC-SHA256
    Sha256,
}

impl Scheme {
    /// Version 1 envelopes use the legacy scheme, everything else SHA-256.
    pub fn for_version(version: i64) -> Self {
        if version == 1 { Scheme::Legacy } else { Scheme::Sha256 }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Legacy => "pbkdf2-sha1",
            Scheme::Sha256 => "pbkdf2-sha256",
        }
    }
}

/// Symmetric cipher seam. The codec only ever talks to this trait.
pub trait Cipher: Send + Sync {
    fn encrypt(&self, plaintext: &str, password: &str, scheme: Scheme, iterations: u32) -> Result<String, CryptoError>;
    fn decrypt(&self, ciphertext: &str, password: &str, scheme: Scheme, iterations: u32) -> Result<String, CryptoError>;
}

/// Default cipher: AES-256-CBC, PKCS#7 on encrypt, length-byte unpad on decrypt.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesCipher;

impl AesCipher {
    pub fn new() -> Self { Self }

    /// Encrypt with a caller-chosen IV. Exposed for golden tests.
    pub fn encrypt_with_iv(
        &self,
        plaintext: &str,
        password: &str,
        scheme: Scheme,
        iterations: u32,
        iv: [u8; BLOCK_SIZE],
    ) -> Result<String, CryptoError> {
        let key = derive_key(password, &iv, scheme, iterations);
        let cipher = Aes256CbcEnc::new_from_slices(&key[..], &iv)
            .map_err(|e| CryptoError::Init(e.to_string()))?;
        let body = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext.as_bytes());

        let mut out = Vec::with_capacity(BLOCK_SIZE + body.len());
        out.extend_from_slice(&iv);
        out.extend_from_slice(&body);
        Ok(BASE64.encode(out))
    }
}

impl Cipher for AesCipher {
    fn encrypt(&self, plaintext: &str, password: &str, scheme: Scheme, iterations: u32) -> Result<String, CryptoError> {
        let mut iv = [0u8; BLOCK_SIZE];
        rand::thread_rng().fill_bytes(&mut iv);
        self.encrypt_with_iv(plaintext, password, scheme, iterations, iv)
    }

    fn decrypt(&self, ciphertext: &str, password: &str, scheme: Scheme, iterations: u32) -> Result<String, CryptoError> {
        let data = BASE64
            .decode(ciphertext.trim())
            .map_err(|e| CryptoError::InvalidBase64(e.to_string()))?;
        if data.len() < 2 * BLOCK_SIZE || data.len() % BLOCK_SIZE != 0 {
            return Err(CryptoError::Truncated(data.len()));
        }
        let (iv, body) = data.split_at(BLOCK_SIZE);

        let key = derive_key(password, iv, scheme, iterations);
        let cipher = Aes256CbcDec::new_from_slices(&key[..], iv)
            .map_err(|e| CryptoError::Init(e.to_string()))?;
        let mut plain = Zeroizing::new(
            cipher
                .decrypt_padded_vec_mut::<NoPadding>(body)
                .map_err(|_| CryptoError::BadPadding)?,
        );
        let len = unpad(&plain)?;
        plain.truncate(len);

        String::from_utf8(plain.to_vec()).map_err(|_| CryptoError::NotUtf8)
    }
}

fn derive_key(password: &str, salt: &[u8], scheme: Scheme, iterations: u32) -> Zeroizing<[u8; KEY_SIZE]> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    match scheme {
        Scheme::Legacy => pbkdf2_hmac::<Sha1>(password.as_bytes(), salt, iterations, &mut key[..]),
        Scheme::Sha256 => pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, &mut key[..]),
    }
    key
}

/// ISO 10126 / PKCS#7 compatible: the last byte carries the pad length.
fn unpad(block: &[u8]) -> Result<usize, CryptoError> {
    let n = *block.last().ok_or(CryptoError::BadPadding)? as usize;
    if n == 0 || n > BLOCK_SIZE || n > block.len() {
        return Err(CryptoError::BadPadding);
    }
    Ok(block.len() - n)
}
