//! Credential-Store-Trait
//!
//! Das `CredentialStore`-Trait abstrahiert den konkreten sicheren Speicher
//! (OS-Keychain, Datei-Fallback, In-Memory fuer Tests).

use serde::{Deserialize, Serialize};

use crate::error::{VaultError, VaultResult};

/// Ablage-Scope eines Vault-Eintrags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VaultScope {
    /// Geraetelokal und plattformgesichert (Keychain-Klasse)
    #[default]
    LocalSecure,
}

impl std::fmt::Display for VaultScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VaultScope::LocalSecure => write!(f, "local-secure"),
        }
    }
}

/// Abstrakter sicherer Speicher fuer Schluesselmaterial und Policies
///
/// Vertrag: `get` liefert `Ok(None)` fuer fehlende Eintraege; ein `Err`
/// bedeutet immer einen Speicherfehler. `delete` ist idempotent.
#[allow(async_fn_in_trait)]
pub trait CredentialStore: Send + Sync {
    /// Eintrag lesen
    async fn get(&self, key: &str) -> VaultResult<Option<Vec<u8>>>;

    /// Eintrag schreiben (ueberschreibt einen bestehenden Wert)
    async fn set(&self, key: &str, value: &[u8], scope: VaultScope) -> VaultResult<()>;

    /// Eintrag loeschen (fehlender Eintrag ist kein Fehler)
    async fn delete(&self, key: &str) -> VaultResult<()>;
}

/// Gemeinsame Schluessel-Validierung der Backends
pub(crate) fn schluessel_pruefen(key: &str) -> VaultResult<()> {
    if key.trim().is_empty() {
        return Err(VaultError::UngueltigerSchluessel(
            "leerer Schluessel".to_string(),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_serialisiert_als_kebab_case() {
        let json = serde_json::to_string(&VaultScope::LocalSecure).unwrap();
        assert_eq!(json, "\"local-secure\"");
        assert_eq!(VaultScope::LocalSecure.to_string(), "local-secure");
    }

    #[test]
    fn leerer_schluessel_wird_abgelehnt() {
        assert!(schluessel_pruefen("").is_err());
        assert!(schluessel_pruefen("   ").is_err());
        assert!(schluessel_pruefen("master-key").is_ok());
    }
}
