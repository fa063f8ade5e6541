//! In-Memory-Backend fuer Tests und fluechtige Laeufe

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::error::VaultResult;
use crate::store::{schluessel_pruefen, CredentialStore, VaultScope};

struct MemoryEintrag {
    scope: VaultScope,
    wert: Vec<u8>,
}

/// Fluechtiger Credential-Store ohne Persistenz
#[derive(Default)]
pub struct MemoryVault {
    eintraege: RwLock<HashMap<String, MemoryEintrag>>,
}

impl MemoryVault {
    /// Erstellt einen leeren MemoryVault
    pub fn new() -> Self {
        Self::default()
    }

    /// Anzahl der gespeicherten Eintraege
    pub async fn anzahl(&self) -> usize {
        self.eintraege.read().await.len()
    }

    /// Alle Schluessel (sortiert), fuer Assertions in Tests
    pub async fn schluessel_liste(&self) -> Vec<String> {
        let mut liste: Vec<String> = self.eintraege.read().await.keys().cloned().collect();
        liste.sort();
        liste
    }

    /// Scope eines Eintrags, falls vorhanden
    pub async fn scope_von(&self, key: &str) -> Option<VaultScope> {
        self.eintraege.read().await.get(key).map(|e| e.scope)
    }
}

impl CredentialStore for MemoryVault {
    async fn get(&self, key: &str) -> VaultResult<Option<Vec<u8>>> {
        schluessel_pruefen(key)?;
        Ok(self
            .eintraege
            .read()
            .await
            .get(key)
            .map(|e| e.wert.clone()))
    }

    async fn set(&self, key: &str, value: &[u8], scope: VaultScope) -> VaultResult<()> {
        schluessel_pruefen(key)?;
        self.eintraege.write().await.insert(
            key.to_string(),
            MemoryEintrag {
                scope,
                wert: value.to_vec(),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> VaultResult<()> {
        schluessel_pruefen(key)?;
        self.eintraege.write().await.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_und_get_roundtrip() {
        let vault = MemoryVault::new();
        vault
            .set("master-key", b"geheim", VaultScope::LocalSecure)
            .await
            .unwrap();

        let wert = vault.get("master-key").await.unwrap();
        assert_eq!(wert, Some(b"geheim".to_vec()));
        assert_eq!(vault.anzahl().await, 1);
        assert_eq!(
            vault.scope_von("master-key").await,
            Some(VaultScope::LocalSecure)
        );
    }

    #[tokio::test]
    async fn fehlender_eintrag_ist_none_kein_fehler() {
        let vault = MemoryVault::new();
        let wert = vault.get("gibt-es-nicht").await.unwrap();
        assert_eq!(wert, None);
    }

    #[tokio::test]
    async fn delete_ist_idempotent() {
        let vault = MemoryVault::new();
        vault
            .set("eintrag", b"wert", VaultScope::LocalSecure)
            .await
            .unwrap();

        vault.delete("eintrag").await.unwrap();
        vault.delete("eintrag").await.unwrap();
        assert_eq!(vault.get("eintrag").await.unwrap(), None);
    }

    #[tokio::test]
    async fn leerer_schluessel_ergibt_fehler() {
        let vault = MemoryVault::new();
        assert!(vault.get("").await.is_err());
        assert!(vault.set("", b"x", VaultScope::LocalSecure).await.is_err());
    }

    #[tokio::test]
    async fn set_ueberschreibt_bestehenden_wert() {
        let vault = MemoryVault::new();
        vault
            .set("eintrag", b"alt", VaultScope::LocalSecure)
            .await
            .unwrap();
        vault
            .set("eintrag", b"neu", VaultScope::LocalSecure)
            .await
            .unwrap();

        assert_eq!(vault.get("eintrag").await.unwrap(), Some(b"neu".to_vec()));
        assert_eq!(vault.anzahl().await, 1);
    }
}
