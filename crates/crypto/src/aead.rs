//! AEAD-Primitiven fuer die Stream-Verschluesselung
//!
//! Alle Stream-Pakete werden mit einem frischen 256-Bit-Schluessel und
//! einem frischen 12-Byte-Nonce verschluesselt.
//!
//! ## Format
//! ```text
//! [ciphertext + auth_tag(16)]
//! ```
//! Nonce und Schluessel-Transport liegen ausserhalb des Ciphertexts
//! (siehe Paket-Vertrag bzw. `wrap`).

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce as AesNonce,
};
use chacha20poly1305::{ChaCha20Poly1305, Key as ChaChaKey, Nonce as ChaChaNonce};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use fluester_protocol::StreamAlgorithm;

use crate::error::{CryptoError, CryptoResult};
use crate::types::SecretBytes;

/// Nonce-Laenge in Bytes (96 Bit, beide AEAD-Algorithmen)
pub const NONCE_LAENGE: usize = 12;

/// Schluessel-Laenge in Bytes (256 Bit)
pub const SCHLUESSEL_LAENGE: usize = 32;

/// Erzeugt einen frischen zufaelligen Stream-Schluessel (32 Bytes)
pub fn zufalls_schluessel() -> SecretBytes {
    let mut bytes = vec![0u8; SCHLUESSEL_LAENGE];
    OsRng.fill_bytes(&mut bytes);
    SecretBytes::new(bytes)
}

/// Erzeugt einen frischen zufaelligen Nonce (12 Bytes)
pub fn zufalls_nonce() -> [u8; NONCE_LAENGE] {
    let mut bytes = [0u8; NONCE_LAENGE];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Verschluesselt Nutzdaten mit dem angegebenen AEAD-Algorithmus
pub fn encrypt_payload(
    algorithm: StreamAlgorithm,
    key_bytes: &[u8],
    nonce_bytes: &[u8; NONCE_LAENGE],
    plaintext: &[u8],
) -> CryptoResult<Vec<u8>> {
    schluessel_laenge_pruefen(key_bytes)?;

    match algorithm {
        StreamAlgorithm::Aes256Gcm => {
            let key = Key::<Aes256Gcm>::from_slice(key_bytes);
            let cipher = Aes256Gcm::new(key);
            cipher
                .encrypt(AesNonce::from_slice(nonce_bytes), plaintext)
                .map_err(|e| CryptoError::Verschluesselung(e.to_string()))
        }
        StreamAlgorithm::ChaCha20Poly1305 => {
            let key = ChaChaKey::from_slice(key_bytes);
            let cipher = ChaCha20Poly1305::new(key);
            cipher
                .encrypt(ChaChaNonce::from_slice(nonce_bytes), plaintext)
                .map_err(|e| CryptoError::Verschluesselung(e.to_string()))
        }
    }
}

/// Entschluesselt Nutzdaten und prueft dabei den Auth-Tag
///
/// Ein fehlschlagender Tag (manipulierter Ciphertext, falscher Schluessel
/// oder falscher Nonce – AEAD unterscheidet das nicht) ergibt
/// [`CryptoError::Integritaet`].
pub fn decrypt_payload(
    algorithm: StreamAlgorithm,
    key_bytes: &[u8],
    nonce_bytes: &[u8; NONCE_LAENGE],
    ciphertext: &[u8],
) -> CryptoResult<Vec<u8>> {
    schluessel_laenge_pruefen(key_bytes)?;

    match algorithm {
        StreamAlgorithm::Aes256Gcm => {
            let key = Key::<Aes256Gcm>::from_slice(key_bytes);
            let cipher = Aes256Gcm::new(key);
            cipher
                .decrypt(AesNonce::from_slice(nonce_bytes), ciphertext)
                .map_err(|_| CryptoError::Integritaet("AEAD-Tag ungueltig".to_string()))
        }
        StreamAlgorithm::ChaCha20Poly1305 => {
            let key = ChaChaKey::from_slice(key_bytes);
            let cipher = ChaCha20Poly1305::new(key);
            cipher
                .decrypt(ChaChaNonce::from_slice(nonce_bytes), ciphertext)
                .map_err(|_| CryptoError::Integritaet("AEAD-Tag ungueltig".to_string()))
        }
    }
}

fn schluessel_laenge_pruefen(key_bytes: &[u8]) -> CryptoResult<()> {
    if key_bytes.len() != SCHLUESSEL_LAENGE {
        return Err(CryptoError::UngueltigeSchluesselLaenge {
            erwartet: SCHLUESSEL_LAENGE,
            erhalten: key_bytes.len(),
        });
    }
    Ok(())
}

/// HKDF-SHA256 Schluessel-Ableitung
pub fn hkdf_derive(ikm: &[u8], salt: &[u8], info: &[u8], len: usize) -> CryptoResult<Vec<u8>> {
    let hk = Hkdf::<Sha256>::new(Some(salt), ikm);
    let mut okm = vec![0u8; len];
    hk.expand(info, &mut okm)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(okm)
}

/// HMAC-SHA256 ueber beliebige Daten
pub fn hmac_sha256(key: &[u8], daten: &[u8]) -> CryptoResult<Vec<u8>> {
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(key)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    mac.update(daten);
    Ok(mac.finalize().into_bytes().to_vec())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
