//! Fehlertypen fuer das Audit-Crate

use thiserror::Error;

/// Audit-Fehlertypen (nur Rotation und Archiv-Zugriff koennen fehlschlagen)
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Vault-Fehler: {0}")]
    Vault(#[from] fluester_vault::VaultError),

    #[error("Serialisierungs-Fehler: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AuditResult<T> = Result<T, AuditError>;
