//! Gemeinsame Typen fuer das Kryptografie-Subsystem

use chrono::{DateTime, Utc};
use fluester_core::UserId;
use fluester_protocol::StreamAlgorithm;
use serde::{Deserialize, Serialize};

/// Sicherer Schluessel-Container (wird beim Drop genullt)
#[derive(Clone)]
pub struct SecretBytes(pub Vec<u8>);

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl std::fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretBytes([REDACTED] {} bytes)", self.0.len())
    }
}

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Persistierte Form des Master-Schluessels im Credential-Store
///
/// Der Schluessel verlaesst diesen Eintrag nie; nach aussen sichtbar
/// ist nur der [`MasterKeyStatus`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterKeyRecord {
    /// 256-Bit-Schluessel, URL-safe Base64
    pub schluessel_b64: String,
    /// Algorithmus fuer den der Schluessel erzeugt wurde
    pub algorithm: StreamAlgorithm,
    /// Erzeugungszeitpunkt
    pub erstellt_am: DateTime<Utc>,
}

/// Ergebnis der Master-Schluessel-Initialisierung
#[derive(Debug, Clone, Serialize)]
pub struct MasterKeyStatus {
    /// True wenn der Schluessel in diesem Aufruf erzeugt wurde
    pub neu_erstellt: bool,
    pub algorithm: StreamAlgorithm,
    pub erstellt_am: DateTime<Utc>,
}

/// Oeffentliche Haelfte eines Benutzer-Schluessel-Paars
///
/// Die private Haelfte bleibt im Credential-Store und taucht in keinem
/// Rueckgabewert auf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicKeyRecord {
    pub user_id: UserId,
    /// X25519-Public-Key (32 Bytes)
    pub public_key: Vec<u8>,
    pub erstellt_am: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_bytes_debug_ist_redacted() {
        let secret = SecretBytes::new(vec![1, 2, 3, 4]);
        let debug = format!("{:?}", secret);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains('1'), "Debug darf keine Schluessel-Bytes zeigen: {debug}");
        assert_eq!(secret.len(), 4);
        assert!(!secret.is_empty());
    }

    #[test]
    fn master_key_record_roundtrip() {
        let record = MasterKeyRecord {
            schluessel_b64: "AAAA".to_string(),
            algorithm: StreamAlgorithm::Aes256Gcm,
            erstellt_am: Utc::now(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("aes-256-gcm"));
        let zurueck: MasterKeyRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(zurueck.schluessel_b64, "AAAA");
    }
}
