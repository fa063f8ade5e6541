//! Hybrider Schluessel-Transport (ECIES ueber X25519)
//!
//! Der frische Stream-Schluessel wird pro Empfaenger einzeln verpackt:
//! 1. Ephemeres X25519-Schluessel-Paar generieren
//! 2. DH mit Empfaenger-Public-Key
//! 3. HKDF-SHA256 -> Wrapping Key
//! 4. AES-256-GCM verschluesseln
//!
//! ## Format
//! ```text
//! [ephemeral_public(32)] + [nonce(12)] + [ciphertext + auth_tag(16)]
//! ```

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey, StaticSecret};

use crate::aead::hkdf_derive;
use crate::error::{CryptoError, CryptoResult};
use crate::types::SecretBytes;

/// HKDF-Info-String der Wrap-Konstruktion (Versionswechsel = neuer String)
const KEY_WRAP_INFO: &[u8] = b"fluester-key-wrap-v1";

/// Verpackt einen Stream-Schluessel fuer einen Empfaenger
pub fn wrap_key_for_recipient(
    stream_key: &SecretBytes,
    recipient_public_key: &[u8; 32],
) -> CryptoResult<Vec<u8>> {
    // Ephemeres Schluessel-Paar
    let ephemeral_secret = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_public = X25519PublicKey::from(&ephemeral_secret);

    // DH-Austausch
    let recipient_pk = X25519PublicKey::from(*recipient_public_key);
    let dh_output = ephemeral_secret.diffie_hellman(&recipient_pk);

    // HKDF -> Wrapping Key (32 Bytes)
    let wrapping_key = hkdf_derive(dh_output.as_bytes(), recipient_public_key, KEY_WRAP_INFO, 32)?;

    // AES-256-GCM verschluesseln
    let cipher_key = Key::<Aes256Gcm>::from_slice(&wrapping_key);
    let cipher = Aes256Gcm::new(cipher_key);

    let mut nonce_bytes = [0u8; 12];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, stream_key.as_bytes())
        .map_err(|e| CryptoError::Verschluesselung(e.to_string()))?;

    // Output: [ephemeral_public(32)] + [nonce(12)] + [ciphertext]
    let mut out = Vec::with_capacity(32 + 12 + ciphertext.len());
    out.extend_from_slice(ephemeral_public.as_bytes());
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);

    Ok(out)
}

/// Entpackt einen Stream-Schluessel mit dem eigenen privaten X25519-Schluessel
pub fn unwrap_key_for_recipient(
    wrapped: &[u8],
    recipient_private_key: &[u8; 32],
) -> CryptoResult<SecretBytes> {
    if wrapped.len() < 32 + 12 + 16 {
        return Err(CryptoError::UngueltigeDaten(
            "Zu kurzer wrapped key".to_string(),
        ));
    }

    let ephemeral_pub_bytes: [u8; 32] = wrapped[0..32]
        .try_into()
        .map_err(|_| CryptoError::UngueltigeDaten("Ephemeral-Public fehlt".to_string()))?;
    let nonce_bytes: [u8; 12] = wrapped[32..44]
        .try_into()
        .map_err(|_| CryptoError::UngueltigeDaten("Nonce fehlt".to_string()))?;
    let ciphertext = &wrapped[44..];

    // DH mit dem empfaengerseitigen privaten Schluessel
    let private_key = StaticSecret::from(*recipient_private_key);
    let ephemeral_pub = X25519PublicKey::from(ephemeral_pub_bytes);
    let dh_output = private_key.diffie_hellman(&ephemeral_pub);

    // HKDF -> Wrapping Key
    let recipient_pub = X25519PublicKey::from(&private_key);
    let wrapping_key = hkdf_derive(
        dh_output.as_bytes(),
        recipient_pub.as_bytes(),
        KEY_WRAP_INFO,
        32,
    )?;

    // AES-256-GCM entschluesseln
    let cipher_key = Key::<Aes256Gcm>::from_slice(&wrapping_key);
    let cipher = Aes256Gcm::new(cipher_key);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::Integritaet("Wrapped Key nicht entpackbar".to_string()))?;

    Ok(SecretBytes::new(plaintext))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aead::zufalls_schluessel;

    fn empfaenger_schluessel_paar() -> ([u8; 32], [u8; 32]) {
        let mut priv_bytes = [0u8; 32];
        OsRng.fill_bytes(&mut priv_bytes);
        let public = X25519PublicKey::from(&StaticSecret::from(priv_bytes));
        (priv_bytes, public.to_bytes())
    }

    #[test]
    fn wrap_und_unwrap_roundtrip() {
        let (priv_bytes, pub_bytes) = empfaenger_schluessel_paar();
        let stream_key = zufalls_schluessel();

        let wrapped = wrap_key_for_recipient(&stream_key, &pub_bytes).unwrap();
        // 32 eph_pub + 12 nonce + 32 key + 16 tag
        assert_eq!(wrapped.len(), 32 + 12 + 32 + 16);

        let unwrapped = unwrap_key_for_recipient(&wrapped, &priv_bytes).unwrap();
        assert_eq!(unwrapped.as_bytes(), stream_key.as_bytes());
    }

    #[test]
    fn jeder_wrap_ist_einzigartig() {
        let (_, pub_bytes) = empfaenger_schluessel_paar();
        let stream_key = zufalls_schluessel();

        let a = wrap_key_for_recipient(&stream_key, &pub_bytes).unwrap();
        let b = wrap_key_for_recipient(&stream_key, &pub_bytes).unwrap();
        // Frischer ephemerer Schluessel + frischer Nonce pro Aufruf
        assert_ne!(a, b);
    }

    #[test]
    fn falscher_private_key_schlaegt_fehl() {
        let (_, pub_bytes) = empfaenger_schluessel_paar();
        let (falscher_priv, _) = empfaenger_schluessel_paar();
        let stream_key = zufalls_schluessel();

        let wrapped = wrap_key_for_recipient(&stream_key, &pub_bytes).unwrap();
        let err = unwrap_key_for_recipient(&wrapped, &falscher_priv);
        assert!(matches!(err, Err(CryptoError::Integritaet(_))));
    }

    #[test]
    fn manipulierter_wrap_schlaegt_fehl() {
        let (priv_bytes, pub_bytes) = empfaenger_schluessel_paar();
        let stream_key = zufalls_schluessel();

        let mut wrapped = wrap_key_for_recipient(&stream_key, &pub_bytes).unwrap();
        let letzter = wrapped.len() - 1;
        wrapped[letzter] ^= 0x01;

        let err = unwrap_key_for_recipient(&wrapped, &priv_bytes);
        assert!(matches!(err, Err(CryptoError::Integritaet(_))));
    }

    #[test]
    fn zu_kurzer_wrapped_key_schlaegt_fehl() {
        let (priv_bytes, _) = empfaenger_schluessel_paar();
        let err = unwrap_key_for_recipient(&[0u8; 10], &priv_bytes);
        assert!(matches!(err, Err(CryptoError::UngueltigeDaten(_))));
    }
}
