//! Tenant App-Key encoding.
//!
//! Public endpoints identify the calling tenant application through an
//! `App-Key` header holding the application name encrypted with AES-128-CTR
//! and wrapped in base64. The key and IV are shared with the client apps
//! through configuration.

use aes::cipher::{KeyIvInit, StreamCipher};
use aes::Aes128;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ctr::Ctr128BE;
use thiserror::Error;

type Aes128Ctr = Ctr128BE<Aes128>;

#[derive(Debug, Error)]
pub enum AppKeyError {
    #[error("App-Key cipher requires a 16-byte key and a 16-byte IV")]
    InvalidKeyMaterial,

    #[error("App-Key is not valid base64")]
    InvalidEncoding,

    #[error("App-Key did not decrypt to valid UTF-8")]
    InvalidPlaintext,
}

/// Encrypt an application name into an `App-Key` header value.
pub fn encode_app_name(app_name: &str, key: &str, iv: &str) -> Result<String, AppKeyError> {
    let mut buf = app_name.as_bytes().to_vec();
    apply_keystream(&mut buf, key, iv)?;
    Ok(STANDARD.encode(buf))
}

/// Decrypt an `App-Key` header value back into the application name.
pub fn decode_app_name(encoded: &str, key: &str, iv: &str) -> Result<String, AppKeyError> {
    let mut buf = STANDARD
        .decode(encoded)
        .map_err(|_| AppKeyError::InvalidEncoding)?;
    apply_keystream(&mut buf, key, iv)?;
    String::from_utf8(buf).map_err(|_| AppKeyError::InvalidPlaintext)
}

fn apply_keystream(buf: &mut [u8], key: &str, iv: &str) -> Result<(), AppKeyError> {
    let mut cipher = Aes128Ctr::new_from_slices(key.as_bytes(), iv.as_bytes())
        .map_err(|_| AppKeyError::InvalidKeyMaterial)?;
    cipher.apply_keystream(buf);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "0123456789abcdef";
    const IV: &str = "1234567891011121";

    #[test]
    fn round_trips_app_name() {
        let encoded = encode_app_name("club_demo", KEY, IV).unwrap();
        assert_ne!(encoded, "club_demo");
        assert_eq!(decode_app_name(&encoded, KEY, IV).unwrap(), "club_demo");
    }

    #[test]
    fn rejects_short_key_material() {
        assert!(matches!(
            encode_app_name("club_demo", "short", IV),
            Err(AppKeyError::InvalidKeyMaterial)
        ));
    }

    #[test]
    fn rejects_garbage_header() {
        assert!(decode_app_name("not base64 !!!", KEY, IV).is_err());
    }

    #[test]
    fn wrong_key_does_not_decode_to_original() {
        let encoded = encode_app_name("club_demo", KEY, IV).unwrap();
        let decoded = decode_app_name(&encoded, "fedcba9876543210", IV);
        // Either invalid UTF-8 or a different string, never the original name.
        if let Ok(name) = decoded {
            assert_ne!(name, "club_demo");
        }
    }
}
