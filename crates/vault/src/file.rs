//! Datei-Backend fuer Plattformen ohne Keychain-Bruecke
//!
//! Jeder Eintrag liegt als eigene JSON-Huelle unter
//! `base_dir/<base64(key)>.json`. Der Dateiname ist URL-safe
//! Base64-kodiert, damit beliebige Schluessel (inkl. `/`) moeglich sind.

use std::path::PathBuf;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{VaultError, VaultResult};
use crate::store::{schluessel_pruefen, CredentialStore, VaultScope};

/// Persistierte Huelle eines Eintrags
#[derive(Debug, Serialize, Deserialize)]
struct FileEintrag {
    scope: VaultScope,
    wert_b64: String,
    aktualisiert_am: DateTime<Utc>,
}

/// Datei-basierter Credential-Store
///
/// Dev-Fallback: bietet keine Plattform-Verschluesselung, nur die
/// Vertragssemantik des Traits. Produktions-Deployments binden hier
/// den Keychain der Shell an.
#[derive(Debug, Clone)]
pub struct FileVault {
    base_dir: PathBuf,
}

impl FileVault {
    /// Neuen FileVault mit dem angegebenen Basisverzeichnis erstellen
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Dateipfad eines Eintrags berechnen
    fn eintrag_pfad(&self, key: &str) -> PathBuf {
        let name = URL_SAFE_NO_PAD.encode(key.as_bytes());
        self.base_dir.join(format!("{}.json", name))
    }
}

impl CredentialStore for FileVault {
    async fn get(&self, key: &str) -> VaultResult<Option<Vec<u8>>> {
        schluessel_pruefen(key)?;
        let pfad = self.eintrag_pfad(key);

        let roh = match tokio::fs::read(&pfad).await {
            Ok(roh) => roh,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let eintrag: FileEintrag = serde_json::from_slice(&roh)?;
        let wert = URL_SAFE_NO_PAD
            .decode(eintrag.wert_b64.as_bytes())
            .map_err(|e| VaultError::UngueltigerEintrag {
                schluessel: key.to_string(),
                grund: e.to_string(),
            })?;
        Ok(Some(wert))
    }

    async fn set(&self, key: &str, value: &[u8], scope: VaultScope) -> VaultResult<()> {
        schluessel_pruefen(key)?;
        let pfad = self.eintrag_pfad(key);

        if let Some(parent) = pfad.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let eintrag = FileEintrag {
            scope,
            wert_b64: URL_SAFE_NO_PAD.encode(value),
            aktualisiert_am: Utc::now(),
        };
        tokio::fs::write(&pfad, serde_json::to_vec_pretty(&eintrag)?).await?;
        tracing::debug!(key, bytes = value.len(), "Vault-Eintrag geschrieben");
        Ok(())
    }

    async fn delete(&self, key: &str) -> VaultResult<()> {
        schluessel_pruefen(key)?;
        let pfad = self.eintrag_pfad(key);

        match tokio::fs::remove_file(&pfad).await {
            Ok(()) => {
                tracing::debug!(key, "Vault-Eintrag geloescht");
                Ok(())
            }
            // Bereits geloescht – kein Fehler
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
