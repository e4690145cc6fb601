//! Encrypted single-blob link form.
//!
//! The blob is the AES-128-CBC encryption (fixed key and IV, PKCS#7
//! padding) of the pipe-delimited triple `scope|object|expiry`, wrapped in
//! URL-safe base64 so it survives as a single path segment.

use super::{CapabilityToken, TokenError};
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;
type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Encode a token into an encrypted blob path segment.
pub fn encode(token: &CapabilityToken, key: &[u8], iv: &[u8]) -> Result<String, TokenError> {
    let cipher = Aes128CbcEnc::new_from_slices(key, iv).map_err(|_| TokenError::InvalidKey)?;
    let plain = format!("{}|{}|{}", token.scope, token.object, token.expires_at);
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plain.as_bytes());
    Ok(URL_SAFE_NO_PAD.encode(ciphertext))
}

/// Decode an encrypted blob back into the token it carries.
///
/// Fails when the base64 wrapping, the padding, or the delimiter count is
/// wrong. Expiry is not checked here.
pub fn decode(blob: &str, key: &[u8], iv: &[u8]) -> Result<CapabilityToken, TokenError> {
    let ciphertext = URL_SAFE_NO_PAD.decode(blob).map_err(|_| TokenError::Encoding)?;
    let cipher = Aes128CbcDec::new_from_slices(key, iv).map_err(|_| TokenError::InvalidKey)?;
    let plain = cipher
        .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
        .map_err(|_| TokenError::Decrypt)?;
    let plain = String::from_utf8(plain).map_err(|_| TokenError::Payload)?;

    let mut fields = plain.split('|');
    match (fields.next(), fields.next(), fields.next(), fields.next()) {
        (Some(scope), Some(object), Some(expiry), None) => Ok(CapabilityToken {
            scope: scope.parse().map_err(|_| TokenError::Payload)?,
            object: object.parse().map_err(|_| TokenError::Payload)?,
            expires_at: expiry.parse().map_err(|_| TokenError::Payload)?,
        }),
        _ => Err(TokenError::Payload),
    }
}
