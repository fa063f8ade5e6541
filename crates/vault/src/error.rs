//! Fehlertypen fuer das Vault-Crate

use thiserror::Error;

/// Vault-Fehlertypen
///
/// Ein fehlender Eintrag ist KEIN Fehler – `get` liefert dafuer
/// `Ok(None)`. Fehlervarianten bedeuten, dass der Speicher selbst
/// nicht funktioniert hat.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Ungueltiger Vault-Schluessel: {0}")]
    UngueltigerSchluessel(String),

    #[error("Korrupter Vault-Eintrag unter '{schluessel}': {grund}")]
    UngueltigerEintrag { schluessel: String, grund: String },

    #[error("IO-Fehler: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialisierungs-Fehler: {0}")]
    Json(#[from] serde_json::Error),
}

pub type VaultResult<T> = Result<T, VaultError>;
