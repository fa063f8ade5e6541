//! Fehlertypen fuer den Auth-Service

use thiserror::Error;

/// Alle moeglichen Fehler im Auth-Service
#[derive(Debug, Error)]
pub enum AuthError {
    // --- Zwei-Faktor ---
    #[error("2FA-Methode nicht unterstuetzt: {0}")]
    MethodeNichtUnterstuetzt(String),

    #[error("Keine 2FA-Einrichtung fuer Benutzer '{user_id}'")]
    NichtEingerichtet { user_id: String },

    #[error("Methode '{methode}' benoetigt eine Kontaktadresse")]
    KontaktFehlt { methode: String },

    #[error("Ungueltiges TOTP-Secret: {0}")]
    UngueltigesSecret(String),

    // --- Hashing ---
    #[error("Backup-Code-Hashing fehlgeschlagen: {0}")]
    Hashing(String),

    // --- Policy ---
    #[error("Unbekanntes Policy-Feld: {0}")]
    UnbekanntesPolicyFeld(String),

    #[error("Ungueltiger Wert fuer Policy-Feld '{feld}': {grund}")]
    UngueltigerPolicyWert { feld: String, grund: String },

    // --- Persistenz ---
    #[error("Vault-Fehler: {0}")]
    Vault(#[from] fluester_vault::VaultError),

    #[error("Serialisierungsfehler: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result-Alias fuer den Auth-Service
pub type AuthResult<T> = Result<T, AuthError>;
