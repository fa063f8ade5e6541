//! Kontosperren nach wiederholten Fehlversuchen
//!
//! Zaehlt Fehlversuche pro Benutzer und sperrt das Konto beim
//! Erreichen der Policy-Schwelle. Sperren laufen lazy ab: erst die
//! naechste Pruefung nach Ablauf raeumt den Eintrag weg.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde_json::json;

use fluester_audit::{ereignis, AuditLog};
use fluester_core::UserId;
use fluester_vault::CredentialStore;

use crate::policy::PolicyStore;

/// Ergebnis eines gemeldeten Fehlversuchs
#[derive(Debug, Clone, PartialEq)]
pub enum LockoutStatus {
    /// Schwelle noch nicht erreicht
    Beobachtet { fehlversuche: u32 },
    /// Konto ist ab sofort gesperrt
    Gesperrt { bis: DateTime<Utc> },
}

pub struct LockoutService<V> {
    policies: Arc<PolicyStore<V>>,
    audit: Arc<AuditLog>,
    fehlversuche: DashMap<UserId, u32>,
    sperren: DashMap<UserId, DateTime<Utc>>,
}

impl<V: CredentialStore> LockoutService<V> {
    pub fn neu(policies: Arc<PolicyStore<V>>, audit: Arc<AuditLog>) -> Arc<Self> {
        Arc::new(Self {
            policies,
            audit,
            fehlversuche: DashMap::new(),
            sperren: DashMap::new(),
        })
    }

    /// Ist das Konto aktuell gesperrt?
    ///
    /// Eine abgelaufene Sperre wird dabei entfernt und der
    /// Fehlversuchszaehler zurueckgesetzt.
    pub fn ist_gesperrt(&self, user_id: &UserId) -> bool {
        self.ist_gesperrt_um(user_id, Utc::now())
    }

    fn ist_gesperrt_um(&self, user_id: &UserId, jetzt: DateTime<Utc>) -> bool {
        let abgelaufen = match self.sperren.get(user_id) {
            None => return false,
            Some(bis) => *bis <= jetzt,
        };

        if !abgelaufen {
            return true;
        }

        self.sperren.remove(user_id);
        self.fehlversuche.remove(user_id);
        tracing::debug!(user_id = %user_id, "Kontosperre abgelaufen");
        false
    }

    /// Wann laeuft die Sperre ab, falls eine aktiv ist?
    pub fn gesperrt_bis(&self, user_id: &UserId) -> Option<DateTime<Utc>> {
        if self.ist_gesperrt(user_id) {
            self.sperren.get(user_id).map(|bis| *bis)
        } else {
            None
        }
    }

    /// Meldet einen fehlgeschlagenen Anmelde- bzw. 2FA-Versuch
    pub async fn fehlversuch_melden(&self, user_id: &UserId) -> LockoutStatus {
        self.fehlversuch_melden_um(user_id, Utc::now()).await
    }

    async fn fehlversuch_melden_um(
        &self,
        user_id: &UserId,
        jetzt: DateTime<Utc>,
    ) -> LockoutStatus {
        let policy = self.policies.aktuelle().await;

        let versuche = {
            let mut zaehler = self.fehlversuche.entry(user_id.clone()).or_insert(0);
            *zaehler += 1;
            *zaehler
        };

        self.audit
            .protokollieren(
                ereignis::TYP_AUTHENTIFIZIERUNG,
                ereignis::AKTION_AUTH_FEHLGESCHLAGEN,
                Some(user_id),
                json!({ "fehlversuche": versuche }),
            )
            .await;

        if versuche < policy.max_failed_attempts {
            return LockoutStatus::Beobachtet {
                fehlversuche: versuche,
            };
        }

        let bis = jetzt + Duration::milliseconds(policy.lockout_duration_ms as i64);
        self.sperren.insert(user_id.clone(), bis);
        self.fehlversuche.remove(user_id);

        tracing::warn!(user_id = %user_id, bis = %bis, "Konto nach Fehlversuchen gesperrt");
        self.audit
            .protokollieren(
                ereignis::TYP_SICHERHEIT,
                ereignis::AKTION_KONTO_GESPERRT,
                Some(user_id),
                json!({ "bis": bis, "nach_fehlversuchen": versuche }),
            )
            .await;

        LockoutStatus::Gesperrt { bis }
    }

    /// Meldet einen erfolgreichen Versuch und setzt den Zaehler zurueck
    pub fn erfolg_melden(&self, user_id: &UserId) {
        if self.fehlversuche.remove(user_id).is_some() {
            tracing::debug!(user_id = %user_id, "Fehlversuchszaehler zurueckgesetzt");
        }
    }

    /// Anzahl aktuell gesperrter Konten
    pub fn gesperrte_anzahl(&self) -> usize {
        let jetzt = Utc::now();
        self.sperren.iter().filter(|e| *e.value() > jetzt).count()
    }

    /// Anzahl Konten mit offenen Fehlversuchen
    pub fn beobachtete_anzahl(&self) -> usize {
        self.fehlversuche.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
