//! Nominal card tokenization
//!
//! A token is `hex(nonce || AES-256-GCM(json(payload)))`. The payload holds
//! only the masked number and card metadata, never the clear number or CVV.
//! There is no vault: the token is self-contained and opened with the same
//! key.

use crate::card_validator::{CardBrand, ValidatedCard};
use crate::error::{Error, Result};
use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Card metadata carried inside a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    /// Unique token id
    pub token_id: Uuid,
    /// Brand
    pub brand: CardBrand,
    /// Masked card number
    pub masked_number: String,
    /// Expiry month
    pub expiry_month: u32,
    /// Expiry year
    pub expiry_year: i32,
    /// Cardholder name (sanitized)
    pub cardholder_name: String,
    /// Issue time
    pub created_at: DateTime<Utc>,
}

impl TokenPayload {
    /// Build a payload from a validated card
    pub fn from_card(card: &ValidatedCard, created_at: DateTime<Utc>) -> Self {
        Self {
            token_id: Uuid::new_v4(),
            brand: card.classification.brand,
            masked_number: card.classification.masked_number.clone(),
            expiry_month: card.expiry.month,
            expiry_year: card.expiry.year,
            cardholder_name: card.cardholder_name.clone(),
            created_at,
        }
    }
}

/// AES-256-GCM tokenizer
pub struct PaymentTokenizer {
    cipher: Aes256Gcm,
}

impl fmt::Debug for PaymentTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentTokenizer").finish_non_exhaustive()
    }
}

impl PaymentTokenizer {
    /// Create from a 32-byte key
    pub fn new(key: &[u8]) -> Result<Self> {
        if key.len() != KEY_LEN {
            return Err(Error::Config(format!(
                "token key must be {} bytes, got {}",
                KEY_LEN,
                key.len()
            )));
        }

        let key = Key::<Aes256Gcm>::from_slice(key);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Create from a hex-encoded 32-byte key
    pub fn from_hex_key(key_hex: &str) -> Result<Self> {
        let key = hex::decode(key_hex.trim())
            .map_err(|e| Error::Config(format!("token key is not valid hex: {}", e)))?;
        Self::new(&key)
    }

    /// Encrypt a payload into a token
    pub fn tokenize(&self, payload: &TokenPayload) -> Result<String> {
        let plaintext = serde_json::to_vec(payload)
            .map_err(|e| Error::Tokenization(format!("failed to encode payload: {}", e)))?;

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_ref())
            .map_err(|e| Error::Tokenization(format!("encryption failed: {}", e)))?;

        let mut token = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        token.extend_from_slice(&nonce);
        token.extend_from_slice(&ciphertext);

        Ok(hex::encode(token))
    }

    /// Open a token produced by [`tokenize`](Self::tokenize)
    pub fn detokenize(&self, token: &str) -> Result<TokenPayload> {
        let bytes = hex::decode(token)
            .map_err(|e| Error::Tokenization(format!("token is not valid hex: {}", e)))?;

        if bytes.len() <= NONCE_LEN {
            return Err(Error::Tokenization("token too short".to_string()));
        }

        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| Error::Tokenization("token could not be opened".to_string()))?;

        serde_json::from_slice(&plaintext)
            .map_err(|e| Error::Tokenization(format!("failed to decode payload: {}", e)))
    }
}
