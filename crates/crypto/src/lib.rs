//! # fluester-crypto
//!
//! Kryptografie-Subsystem von Fluester.
//!
//! ## Module
//! - `aead` - AEAD-Primitiven, HKDF/HMAC und sichere Zufallswerte
//! - `wrap` - Hybrider Schluessel-Transport (ECIES ueber X25519)
//! - `key_manager` - Master-Schluessel, Benutzer-Paare, Stream-Verschluesselung
//! - `types` - Gemeinsame Typen (SecretBytes, Schluessel-Records)
//! - `error` - Fehlertypen

pub mod aead;
pub mod error;
pub mod key_manager;
pub mod types;
pub mod wrap;

// Bequeme Re-Exports
pub use error::{CryptoError, CryptoResult};
pub use types::{MasterKeyRecord, MasterKeyStatus, PublicKeyRecord, SecretBytes};

pub use aead::{
    decrypt_payload, encrypt_payload, hkdf_derive, hmac_sha256, zufalls_nonce,
    zufalls_schluessel, NONCE_LAENGE, SCHLUESSEL_LAENGE,
};
pub use key_manager::{
    StreamKeyManager, MASTER_KEY_EINTRAG, SERVER_EMPFAENGER_ID, USER_KEY_PRAEFIX,
};
pub use wrap::{unwrap_key_for_recipient, wrap_key_for_recipient};
