//! Fehlertypen der Security-Manager-Fassade

use thiserror::Error;

/// Alle moeglichen Fehler der Fassade
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Fatal: ohne Master-Key startet das Subsystem nicht
    #[error("Initialisierung fehlgeschlagen: {0}")]
    Initialisierung(String),

    #[error("Konto '{user_id}' ist gesperrt")]
    KontoGesperrt { user_id: String },

    #[error("Kryptografie-Fehler: {0}")]
    Crypto(#[from] fluester_crypto::CryptoError),

    #[error("Auth-Fehler: {0}")]
    Auth(#[from] fluester_auth::AuthError),

    #[error("Audit-Fehler: {0}")]
    Audit(#[from] fluester_audit::AuditError),

    #[error("Vault-Fehler: {0}")]
    Vault(#[from] fluester_vault::VaultError),
}

/// Result-Alias fuer die Fassade
pub type ManagerResult<T> = Result<T, ManagerError>;
