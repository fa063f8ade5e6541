//! Fehlertypen fuer das Kryptografie-Subsystem

use thiserror::Error;

/// Fehler im Kryptografie-Subsystem
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Fatal: ohne funktionierenden Credential-Store und Master-Schluessel
    /// darf das Subsystem nicht starten
    #[error("Schluessel-Initialisierung fehlgeschlagen: {0}")]
    SchluesselInit(String),

    #[error("Schluessel-Generierung fehlgeschlagen: {0}")]
    SchluesselGenerierung(String),

    #[error("Verschluesselung fehlgeschlagen: {0}")]
    Verschluesselung(String),

    #[error("Integritaetspruefung fehlgeschlagen: {0}")]
    Integritaet(String),

    #[error("Kein privater Schluessel fuer Benutzer {user_id}")]
    SchluesselNichtGefunden { user_id: String },

    #[error("Benutzer {user_id} ist kein autorisierter Empfaenger dieses Pakets")]
    EmpfaengerNichtAutorisiert { user_id: String },

    #[error("Ungueltige Schluessel-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeSchluesselLaenge { erwartet: usize, erhalten: usize },

    #[error("Ungueltige Nonce-Laenge: erwartet {erwartet}, erhalten {erhalten}")]
    UngueltigeNonce { erwartet: usize, erhalten: usize },

    #[error("Ungueltige Daten: {0}")]
    UngueltigeDaten(String),

    #[error("Key Derivation fehlgeschlagen: {0}")]
    KeyDerivation(String),

    #[error("Base64-Dekodierung fehlgeschlagen: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Serialisierungs-Fehler: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Vault-Fehler: {0}")]
    Vault(#[from] fluester_vault::VaultError),
}

impl CryptoError {
    /// Sicherheitsrelevante Fehler gehoeren zusaetzlich ins Audit-Log
    pub fn ist_sicherheitsrelevant(&self) -> bool {
        matches!(
            self,
            CryptoError::Integritaet(_) | CryptoError::EmpfaengerNichtAutorisiert { .. }
        )
    }
}

pub type CryptoResult<T> = Result<T, CryptoError>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
