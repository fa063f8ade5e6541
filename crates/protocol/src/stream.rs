//! Stream-Paket-Typen fuer Audio-Streams
//!
//! Das `EncryptedStreamPacket` ist der einzige Serialisierungs-Vertrag
//! dieses Subsystems: die Anwendungs-Shell und entfernte Gegenstellen
//! lesen genau diese JSON-Form. Die Feldnamen sind deshalb camelCase
//! und duerfen nicht umbenannt werden.

use std::collections::HashMap;

use fluester_core::UserId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// StreamAlgorithm
// ---------------------------------------------------------------------------

/// AEAD-Algorithmus fuer die Stream-Verschluesselung
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamAlgorithm {
    /// AES-256-GCM
    #[default]
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
    /// ChaCha20-Poly1305
    #[serde(rename = "chacha20-poly1305")]
    ChaCha20Poly1305,
}

impl StreamAlgorithm {
    /// Schluessellaenge in Bits (beide Algorithmen verwenden 256-Bit-Schluessel)
    pub fn key_size_bits(&self) -> u32 {
        256
    }
}

impl std::fmt::Display for StreamAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamAlgorithm::Aes256Gcm => write!(f, "aes-256-gcm"),
            StreamAlgorithm::ChaCha20Poly1305 => write!(f, "chacha20-poly1305"),
        }
    }
}

// ---------------------------------------------------------------------------
// StreamPacket
// ---------------------------------------------------------------------------

/// Metadaten eines verschluesselten Stream-Pakets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamMetadata {
    /// Verwendeter AEAD-Algorithmus
    pub algorithm: StreamAlgorithm,
    /// Schluessellaenge in Bits
    pub key_size_bits: u32,
    /// Erstellungszeitpunkt (Unix-ms)
    pub timestamp_ms: i64,
    /// Alle adressierten Empfaenger, auch solche ohne bekannten Schluessel
    pub recipient_user_ids: Vec<UserId>,
}

/// Verschluesseltes Stream-Paket
///
/// Der Stream-Schluessel selbst ist nie enthalten; `wrapped_keys` traegt
/// pro autorisiertem Empfaenger eine mit dessen oeffentlichem Schluessel
/// verpackte Kopie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedStreamPacket {
    /// AEAD-Ciphertext inklusive Auth-Tag
    pub ciphertext: Vec<u8>,
    /// Zufaelliger 12-Byte-Nonce dieses Pakets
    pub nonce: Vec<u8>,
    /// Map: Empfaenger -> verpackter Stream-Schluessel
    pub wrapped_keys: HashMap<UserId, Vec<u8>>,
    /// Paket-Metadaten
    pub metadata: StreamMetadata,
}

/// Stream-Paket, wie es das Subsystem verlaesst
///
/// Der `type`-Tag haelt Klartext-Pakete (Verschluesselung explizit
/// deaktiviert) von verschluesselten Paketen unterscheidbar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StreamPacket {
    /// Unverschluesselte Nutzdaten (Modus `disabled`)
    #[serde(rename = "plaintext")]
    Plaintext {
        /// Nutzdaten, Byte fuer Byte unveraendert
        payload: Vec<u8>,
    },
    /// Verschluesseltes Paket
    #[serde(rename = "end-to-end-encrypted")]
    Encrypted(EncryptedStreamPacket),
}

impl StreamPacket {
    /// True wenn das Paket verschluesselte Nutzdaten traegt
    pub fn ist_verschluesselt(&self) -> bool {
        matches!(self, StreamPacket::Encrypted(_))
    }

    /// Serialisiert das Paket in die JSON-Vertragsform
    pub fn als_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Liest ein Paket aus der JSON-Vertragsform
    pub fn aus_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
