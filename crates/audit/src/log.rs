//! Append-only Audit-Log mit Abfrage und destruktiver Rotation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;
use uuid::Uuid;

use fluester_core::UserId;
use fluester_vault::{CredentialStore, VaultScope};

use crate::error::AuditResult;

/// Praefix der Archiv-Eintraege im Credential-Store
pub const ARCHIV_PRAEFIX: &str = "audit-archiv/";

/// Ereignis-Vokabular des Audit-Logs
///
/// Die Werte sind Teil des nach aussen sichtbaren Log-Formats und
/// bleiben deshalb englisch.
pub mod ereignis {
    /// Anmelde- und 2FA-Ereignisse
    pub const TYP_AUTHENTIFIZIERUNG: &str = "authentication";
    /// Stream-Verschluesselung und Schluessel-Verwaltung
    pub const TYP_VERSCHLUESSELUNG: &str = "encryption";
    /// Policy-Aenderungen
    pub const TYP_POLICY: &str = "policy";
    /// Sicherheitsvorfaelle und Systemereignisse
    pub const TYP_SICHERHEIT: &str = "security";

    pub const AKTION_2FA_AKTIVIERT: &str = "2fa_enabled";
    pub const AKTION_2FA_DEAKTIVIERT: &str = "2fa_disabled";
    pub const AKTION_2FA_VERIFIZIERT: &str = "2fa_verified";
    pub const AKTION_2FA_FEHLGESCHLAGEN: &str = "2fa_failed";
    pub const AKTION_AUTH_FEHLGESCHLAGEN: &str = "auth_failed";
    pub const AKTION_KONTO_GESPERRT: &str = "account_locked";
    pub const AKTION_POLICY_GEAENDERT: &str = "policy_updated";
    pub const AKTION_INTEGRITAET_VERLETZT: &str = "integrity_violation";
    pub const AKTION_EMPFAENGER_ABGELEHNT: &str = "recipient_rejected";
    pub const AKTION_AUDIT_ROTIERT: &str = "audit_rotated";
    pub const AKTION_SUBSYSTEM_GESTARTET: &str = "security_manager_started";
}

/// Ein einzelner Audit-Eintrag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEintrag {
    pub id: Uuid,
    /// Ereignis-Kategorie (siehe [`ereignis`])
    pub typ: String,
    /// Konkrete Aktion (siehe [`ereignis`])
    pub action: String,
    /// Betroffener Benutzer, falls zuordenbar
    pub user_id: Option<UserId>,
    /// Freie strukturierte Zusatzdaten
    pub details: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Konjunktive Abfrage-Filter (alle gesetzten Felder muessen passen)
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub typ: Option<String>,
    pub action: Option<String>,
    pub user_id: Option<UserId>,
    /// Untere Zeitgrenze (inklusiv)
    pub seit: Option<DateTime<Utc>>,
    /// Obere Zeitgrenze (inklusiv)
    pub bis: Option<DateTime<Utc>>,
    /// Maximale Anzahl, angewendet nach der Sortierung
    pub limit: Option<usize>,
}

/// Append-only Audit-Log
///
/// Eintraege werden nie veraendert oder einzeln geloescht; nur die
/// Rotation leert das Log als Ganzes, nachdem der Inhalt archiviert ist.
pub struct AuditLog {
    eintraege: RwLock<Vec<AuditEintrag>>,
    aktiviert: AtomicBool,
    archiv_schluessel: parking_lot::RwLock<Vec<String>>,
}

impl AuditLog {
    /// Erstellt ein leeres, aktives Audit-Log
    pub fn neu() -> Arc<Self> {
        Arc::new(Self {
            eintraege: RwLock::new(Vec::new()),
            aktiviert: AtomicBool::new(true),
            archiv_schluessel: parking_lot::RwLock::new(Vec::new()),
        })
    }

    /// Schaltet das Logging an oder aus (Policy-Flag `auditLogging`)
    pub fn setze_aktiv(&self, aktiv: bool) {
        self.aktiviert.store(aktiv, Ordering::Relaxed);
    }

    pub fn ist_aktiv(&self) -> bool {
        self.aktiviert.load(Ordering::Relaxed)
    }

    /// Haengt einen Eintrag an
    ///
    /// Bei deaktiviertem Logging passiert nichts und es kommt `None`
    /// zurueck.
    pub async fn protokollieren(
        &self,
        typ: &str,
        action: &str,
        user_id: Option<&UserId>,
        details: serde_json::Value,
    ) -> Option<AuditEintrag> {
        if !self.ist_aktiv() {
            return None;
        }

        let eintrag = AuditEintrag {
            id: Uuid::new_v4(),
            typ: typ.to_string(),
            action: action.to_string(),
            user_id: user_id.cloned(),
            details,
            timestamp: Utc::now(),
        };

        tracing::debug!(typ, action, user_id = ?eintrag.user_id, "Audit-Eintrag");
        self.eintraege.write().await.push(eintrag.clone());
        Some(eintrag)
    }

    /// Anzahl der Eintraege im Live-Log
    pub async fn anzahl(&self) -> usize {
        self.eintraege.read().await.len()
    }

    /// Fragt das Live-Log ab
    ///
    /// Ergebnis ist immer streng absteigend nach Zeitstempel sortiert,
    /// unabhaengig von der Einfuege-Reihenfolge.
    pub async fn abfragen(&self, filter: &AuditFilter) -> Vec<AuditEintrag> {
        let eintraege = self.eintraege.read().await;
        let mut ergebnis: Vec<AuditEintrag> = eintraege
            .iter()
            .filter(|e| {
                filter.typ.as_ref().is_none_or(|t| &e.typ == t)
                    && filter.action.as_ref().is_none_or(|a| &e.action == a)
                    && filter
                        .user_id
                        .as_ref()
                        .is_none_or(|u| e.user_id.as_ref() == Some(u))
                    && filter.seit.is_none_or(|s| e.timestamp >= s)
                    && filter.bis.is_none_or(|b| e.timestamp <= b)
            })
            .cloned()
            .collect();

        ergebnis.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(limit) = filter.limit {
            ergebnis.truncate(limit);
        }
        ergebnis
    }

    /// Die juengsten `n` Eintraege (fuer Status-Zusammenfassungen)
    pub async fn letzte(&self, n: usize) -> Vec<AuditEintrag> {
        self.abfragen(&AuditFilter {
            limit: Some(n),
            ..AuditFilter::default()
        })
        .await
    }

    /// Rotiert das Log in den Credential-Store
    ///
    /// Archiviert alle Eintraege unter einem datumsgestempelten Schluessel
    /// und leert das Live-Log danach. Das Leeren ist gewollt destruktiv;
    /// danach ist der Inhalt nur noch ueber den Archiv-Schluessel
    /// erreichbar. Ein leeres Log wird nicht rotiert.
    pub async fn rotieren<V: CredentialStore>(&self, vault: &V) -> AuditResult<Option<String>> {
        let mut eintraege = self.eintraege.write().await;
        if eintraege.is_empty() {
            return Ok(None);
        }

        // Millisekunden im Stempel, damit dicht aufeinanderfolgende
        // Rotationen sich nicht denselben Schluessel teilen
        let schluessel = format!(
            "{}{}",
            ARCHIV_PRAEFIX,
            Utc::now().format("%Y-%m-%dT%H-%M-%S%.3f")
        );
        let roh = serde_json::to_vec(&*eintraege)?;
        vault
            .set(&schluessel, &roh, VaultScope::LocalSecure)
            .await?;

        let anzahl = eintraege.len();
        eintraege.clear();
        drop(eintraege);

        self.archiv_schluessel.write().push(schluessel.clone());
        tracing::info!(anzahl, schluessel = %schluessel, "Audit-Log rotiert");

        // Das frische Log beginnt mit dem Rotations-Ereignis selbst
        self.protokollieren(
            ereignis::TYP_SICHERHEIT,
            ereignis::AKTION_AUDIT_ROTIERT,
            None,
            json!({ "archiv": schluessel, "eintraege": anzahl }),
        )
        .await;

        Ok(Some(schluessel))
    }

    /// Archiv-Schluessel, die in diesem Lauf erzeugt wurden
    pub fn archiv_liste(&self) -> Vec<String> {
        self.archiv_schluessel.read().clone()
    }

    /// Laedt ein rotiertes Archiv aus dem Credential-Store zurueck
    pub async fn archiv_laden<V: CredentialStore>(
        vault: &V,
        schluessel: &str,
    ) -> AuditResult<Vec<AuditEintrag>> {
        match vault.get(schluessel).await? {
            Some(roh) => Ok(serde_json::from_slice(&roh)?),
            None => Ok(Vec::new()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
