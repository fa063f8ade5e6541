//! Sicherheits-Policy: Wire-Format, Validierung und Persistenz

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;

use fluester_audit::{ereignis, AuditLog};
use fluester_core::UserId;
use fluester_vault::{CredentialStore, VaultScope};

use crate::error::{AuthError, AuthResult};

/// Vault-Schluessel der gespeicherten Policy
pub const POLICY_EINTRAG: &str = "security-policy";

/// Die geltende Sicherheits-Policy
///
/// Die Feldnamen im Wire-Format sind camelCase und fuer Clients stabil.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityPolicy {
    /// Audio-Streams verschluesseln
    pub require_encryption: bool,
    /// 2FA fuer alle Anmeldungen erzwingen
    #[serde(rename = "require2FA")]
    pub require_2fa: bool,
    /// Gastzugaenge ohne Konto zulassen
    pub allow_guest_access: bool,
    /// Session-Laufzeit in Millisekunden
    pub session_timeout_ms: u64,
    /// Fehlversuche bis zur Kontosperre
    pub max_failed_attempts: u32,
    /// Sperrdauer in Millisekunden
    pub lockout_duration_ms: u64,
    /// Audit-Log aktiv
    pub audit_logging: bool,
}

impl Default for SecurityPolicy {
    fn default() -> Self {
        Self {
            require_encryption: true,
            require_2fa: false,
            allow_guest_access: false,
            session_timeout_ms: 30 * 60 * 1000,
            max_failed_attempts: 5,
            lockout_duration_ms: 15 * 60 * 1000,
            audit_logging: true,
        }
    }
}

impl SecurityPolicy {
    /// Liest den aktuellen Wert eines Feldes
    pub fn wert(&self, feld: PolicyFeld) -> PolicyWert {
        match feld {
            PolicyFeld::RequireEncryption => PolicyWert::Bool(self.require_encryption),
            PolicyFeld::Require2fa => PolicyWert::Bool(self.require_2fa),
            PolicyFeld::AllowGuestAccess => PolicyWert::Bool(self.allow_guest_access),
            PolicyFeld::SessionTimeoutMs => PolicyWert::Zahl(self.session_timeout_ms),
            PolicyFeld::MaxFailedAttempts => PolicyWert::Zahl(self.max_failed_attempts as u64),
            PolicyFeld::LockoutDurationMs => PolicyWert::Zahl(self.lockout_duration_ms),
            PolicyFeld::AuditLogging => PolicyWert::Bool(self.audit_logging),
        }
    }

    /// Setzt ein Feld, sofern der Wert zum Feldtyp passt
    pub fn anwenden(&mut self, feld: PolicyFeld, wert: PolicyWert) -> AuthResult<()> {
        let falscher_typ = |grund: &str| AuthError::UngueltigerPolicyWert {
            feld: feld.to_string(),
            grund: grund.to_string(),
        };

        match feld {
            PolicyFeld::RequireEncryption => {
                self.require_encryption =
                    wert.als_bool().ok_or_else(|| falscher_typ("boolescher Wert erwartet"))?;
            }
            PolicyFeld::Require2fa => {
                self.require_2fa =
                    wert.als_bool().ok_or_else(|| falscher_typ("boolescher Wert erwartet"))?;
            }
            PolicyFeld::AllowGuestAccess => {
                self.allow_guest_access =
                    wert.als_bool().ok_or_else(|| falscher_typ("boolescher Wert erwartet"))?;
            }
            PolicyFeld::SessionTimeoutMs => {
                self.session_timeout_ms =
                    wert.als_zahl().ok_or_else(|| falscher_typ("Zahl erwartet"))?;
            }
            PolicyFeld::MaxFailedAttempts => {
                let zahl = wert.als_zahl().ok_or_else(|| falscher_typ("Zahl erwartet"))?;
                self.max_failed_attempts = u32::try_from(zahl)
                    .map_err(|_| falscher_typ("ausserhalb des Wertebereichs"))?;
            }
            PolicyFeld::LockoutDurationMs => {
                self.lockout_duration_ms =
                    wert.als_zahl().ok_or_else(|| falscher_typ("Zahl erwartet"))?;
            }
            PolicyFeld::AuditLogging => {
                self.audit_logging =
                    wert.als_bool().ok_or_else(|| falscher_typ("boolescher Wert erwartet"))?;
            }
        }
        Ok(())
    }
}

/// Per `updateSecurityPolicy` aenderbare Felder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyFeld {
    RequireEncryption,
    Require2fa,
    AllowGuestAccess,
    SessionTimeoutMs,
    MaxFailedAttempts,
    LockoutDurationMs,
    AuditLogging,
}

impl PolicyFeld {
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::RequireEncryption => "requireEncryption",
            Self::Require2fa => "require2FA",
            Self::AllowGuestAccess => "allowGuestAccess",
            Self::SessionTimeoutMs => "sessionTimeoutMs",
            Self::MaxFailedAttempts => "maxFailedAttempts",
            Self::LockoutDurationMs => "lockoutDurationMs",
            Self::AuditLogging => "auditLogging",
        }
    }
}

impl fmt::Display for PolicyFeld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

impl FromStr for PolicyFeld {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requireEncryption" => Ok(Self::RequireEncryption),
            "require2FA" => Ok(Self::Require2fa),
            "allowGuestAccess" => Ok(Self::AllowGuestAccess),
            "sessionTimeoutMs" => Ok(Self::SessionTimeoutMs),
            "maxFailedAttempts" => Ok(Self::MaxFailedAttempts),
            "lockoutDurationMs" => Ok(Self::LockoutDurationMs),
            "auditLogging" => Ok(Self::AuditLogging),
            anderes => Err(AuthError::UnbekanntesPolicyFeld(anderes.to_string())),
        }
    }
}

/// Ein Policy-Wert im Wire-Format (JSON-Bool oder -Zahl)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolicyWert {
    Bool(bool),
    Zahl(u64),
}

impl PolicyWert {
    pub fn als_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Zahl(_) => None,
        }
    }

    pub fn als_zahl(&self) -> Option<u64> {
        match self {
            Self::Zahl(z) => Some(*z),
            Self::Bool(_) => None,
        }
    }
}

impl fmt::Display for PolicyWert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Zahl(z) => write!(f, "{z}"),
        }
    }
}

/// Ergebnis einer Policy-Aenderung
#[derive(Debug, Clone)]
pub struct PolicyAenderung {
    pub feld: PolicyFeld,
    pub alt: PolicyWert,
    pub neu: PolicyWert,
    /// Die komplette Policy nach der Aenderung
    pub policy: SecurityPolicy,
}

/// Persistenz und Cache der geltenden Policy
pub struct PolicyStore<V> {
    vault: Arc<V>,
    audit: Arc<AuditLog>,
    aktuell: RwLock<SecurityPolicy>,
}

impl<V: CredentialStore> PolicyStore<V> {
    pub fn neu(vault: Arc<V>, audit: Arc<AuditLog>) -> Arc<Self> {
        Arc::new(Self {
            vault,
            audit,
            aktuell: RwLock::new(SecurityPolicy::default()),
        })
    }

    /// Laedt die Policy aus dem Vault
    ///
    /// Fehlender oder unlesbarer Eintrag ergibt die Standardwerte; ein
    /// Vault-Fehler wird durchgereicht.
    pub async fn laden(&self) -> AuthResult<SecurityPolicy> {
        let policy = match self.vault.get(POLICY_EINTRAG).await? {
            Some(roh) => match serde_json::from_slice(&roh) {
                Ok(policy) => policy,
                Err(e) => {
                    tracing::warn!("Gespeicherte Policy unlesbar, verwende Standardwerte: {}", e);
                    SecurityPolicy::default()
                }
            },
            None => SecurityPolicy::default(),
        };

        self.audit.setze_aktiv(policy.audit_logging);
        *self.aktuell.write().await = policy.clone();
        Ok(policy)
    }

    /// Ersetzt die komplette Policy und persistiert sie
    pub async fn setzen(&self, policy: SecurityPolicy) -> AuthResult<()> {
        self.vault
            .set(POLICY_EINTRAG, &serde_json::to_vec(&policy)?, VaultScope::LocalSecure)
            .await?;
        self.audit.setze_aktiv(policy.audit_logging);
        *self.aktuell.write().await = policy;
        Ok(())
    }

    /// Laedt die Policy, beim allerersten Start mit optionaler Vorgabe
    ///
    /// Die Vorgabe greift nur, solange der Vault noch keinen Eintrag
    /// traegt; ein persistierter Stand gewinnt immer.
    pub async fn laden_mit_vorgabe(
        &self,
        vorgabe: Option<SecurityPolicy>,
    ) -> AuthResult<SecurityPolicy> {
        if let Some(vorgabe) = vorgabe {
            if self.vault.get(POLICY_EINTRAG).await?.is_none() {
                self.setzen(vorgabe.clone()).await?;
                return Ok(vorgabe);
            }
            tracing::info!("Persistierte Policy gefunden, Vorgabe bleibt unberuecksichtigt");
        }
        self.laden().await
    }

    /// Aktualisiert ein einzelnes Feld
    ///
    /// Persistiert die geaenderte Policy und auditiert die Aenderung mit
    /// altem und neuem Wert.
    pub async fn aktualisieren(
        &self,
        feld: &str,
        wert: PolicyWert,
        admin: Option<&UserId>,
    ) -> AuthResult<PolicyAenderung> {
        let feld: PolicyFeld = feld.parse()?;

        let mut aktuell = self.aktuell.write().await;
        let alt = aktuell.wert(feld);
        let mut neu = aktuell.clone();
        neu.anwenden(feld, wert)?;

        self.vault
            .set(POLICY_EINTRAG, &serde_json::to_vec(&neu)?, VaultScope::LocalSecure)
            .await?;
        *aktuell = neu.clone();
        drop(aktuell);

        // Der Schalter greift vor der Audit-Emission: das Einschalten
        // wird damit selbst protokolliert, das Ausschalten nicht mehr
        if feld == PolicyFeld::AuditLogging {
            self.audit.setze_aktiv(neu.audit_logging);
        }

        let aenderung = PolicyAenderung {
            feld,
            alt,
            neu: neu.wert(feld),
            policy: neu,
        };

        tracing::info!(feld = %feld, alt = %aenderung.alt, neu = %aenderung.neu, "Policy aktualisiert");
        self.audit
            .protokollieren(
                ereignis::TYP_POLICY,
                ereignis::AKTION_POLICY_GEAENDERT,
                admin,
                json!({
                    "feld": aenderung.feld.wire_name(),
                    "alt": aenderung.alt,
                    "neu": aenderung.neu,
                }),
            )
            .await;

        Ok(aenderung)
    }

    /// Die zuletzt geladene bzw. gesetzte Policy
    pub async fn aktuelle(&self) -> SecurityPolicy {
        self.aktuell.read().await.clone()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use fluester_audit::AuditFilter;
    use fluester_vault::MemoryVault;

    fn store_bauen() -> (Arc<PolicyStore<MemoryVault>>, Arc<AuditLog>) {
        let vault = Arc::new(MemoryVault::new());
        let audit = AuditLog::neu();
        (PolicyStore::neu(vault, audit.clone()), audit)
    }

    #[test]
    fn standardwerte() {
        let policy = SecurityPolicy::default();
        assert!(policy.require_encryption);
        assert!(!policy.require_2fa);
        assert!(!policy.allow_guest_access);
        assert_eq!(policy.session_timeout_ms, 1_800_000);
        assert_eq!(policy.max_failed_attempts, 5);
        assert_eq!(policy.lockout_duration_ms, 900_000);
        assert!(policy.audit_logging);
    }

    #[test]
    fn wire_format_ist_camel_case() {
        let json = serde_json::to_value(SecurityPolicy::default()).unwrap();
        let objekt = json.as_object().unwrap();

        for schluessel in [
            "requireEncryption",
            "require2FA",
            "allowGuestAccess",
            "sessionTimeoutMs",
            "maxFailedAttempts",
            "lockoutDurationMs",
            "auditLogging",
        ] {
            assert!(objekt.contains_key(schluessel), "Feld {schluessel} fehlt");
        }
        assert_eq!(objekt.len(), 7);
    }

    #[test]
    fn teilweise_json_ergaenzt_standardwerte() {
        let policy: SecurityPolicy = serde_json::from_str(r#"{ "require2FA": true }"#).unwrap();
        assert!(policy.require_2fa);
        assert!(policy.require_encryption);
        assert_eq!(policy.max_failed_attempts, 5);
    }

    #[test]
    fn feld_namen_parsen() {
        assert_eq!(
            "maxFailedAttempts".parse::<PolicyFeld>().unwrap(),
            PolicyFeld::MaxFailedAttempts
        );
        assert!(matches!(
            "max_failed_attempts".parse::<PolicyFeld>(),
            Err(AuthError::UnbekanntesPolicyFeld(_))
        ));
    }

    #[tokio::test]
    async fn aktualisieren_persistiert_und_auditiert() {
        let (store, audit) = store_bauen();
        let admin = UserId::new("admin");

        let aenderung = store
            .aktualisieren("maxFailedAttempts", PolicyWert::Zahl(3), Some(&admin))
            .await
            .unwrap();

        assert_eq!(aenderung.alt, PolicyWert::Zahl(5));
        assert_eq!(aenderung.neu, PolicyWert::Zahl(3));
        assert_eq!(aenderung.policy.max_failed_attempts, 3);
        assert_eq!(store.aktuelle().await.max_failed_attempts, 3);

        // Neu geladener Store sieht den persistierten Wert
        let geladen = store.laden().await.unwrap();
        assert_eq!(geladen.max_failed_attempts, 3);

        let eintraege = audit
            .abfragen(&AuditFilter {
                action: Some(ereignis::AKTION_POLICY_GEAENDERT.to_string()),
                ..AuditFilter::default()
            })
            .await;
        assert_eq!(eintraege.len(), 1);
        assert_eq!(eintraege[0].user_id, Some(admin));
        assert_eq!(eintraege[0].details["feld"], "maxFailedAttempts");
        assert_eq!(eintraege[0].details["alt"], 5);
        assert_eq!(eintraege[0].details["neu"], 3);
    }

    #[tokio::test]
    async fn unbekanntes_feld_wird_abgelehnt() {
        let (store, _) = store_bauen();
        let ergebnis = store
            .aktualisieren("selbstzerstoerung", PolicyWert::Bool(true), None)
            .await;
        assert!(matches!(
            ergebnis,
            Err(AuthError::UnbekanntesPolicyFeld(f)) if f == "selbstzerstoerung"
        ));
    }

    #[tokio::test]
    async fn falscher_werttyp_wird_abgelehnt() {
        let (store, _) = store_bauen();

        let ergebnis = store
            .aktualisieren("requireEncryption", PolicyWert::Zahl(1), None)
            .await;
        assert!(matches!(ergebnis, Err(AuthError::UngueltigerPolicyWert { .. })));

        let ergebnis = store
            .aktualisieren("maxFailedAttempts", PolicyWert::Bool(true), None)
            .await;
        assert!(matches!(ergebnis, Err(AuthError::UngueltigerPolicyWert { .. })));

        // Fehlgeschlagene Aenderung laesst die Policy unberuehrt
        assert_eq!(store.aktuelle().await, SecurityPolicy::default());
    }

    #[tokio::test]
    async fn laden_ohne_eintrag_ergibt_standardwerte() {
        let (store, _) = store_bauen();
        let policy = store.laden().await.unwrap();
        assert_eq!(policy, SecurityPolicy::default());
    }

    #[tokio::test]
    async fn kaputter_eintrag_ergibt_standardwerte() {
        let vault = Arc::new(MemoryVault::new());
        vault
            .set(POLICY_EINTRAG, b"{{{nicht json", VaultScope::LocalSecure)
            .await
            .unwrap();

        let store = PolicyStore::neu(vault, AuditLog::neu());
        let policy = store.laden().await.unwrap();
        assert_eq!(policy, SecurityPolicy::default());
    }

    #[tokio::test]
    async fn audit_schalter_folgt_der_policy() {
        let (store, audit) = store_bauen();

        // Ausschalten: die Aenderung selbst wird nicht mehr protokolliert
        store
            .aktualisieren("auditLogging", PolicyWert::Bool(false), None)
            .await
            .unwrap();
        assert!(!audit.ist_aktiv());
        assert_eq!(audit.anzahl().await, 0);

        // Weitere Aenderungen bleiben unprotokolliert
        store
            .aktualisieren("maxFailedAttempts", PolicyWert::Zahl(9), None)
            .await
            .unwrap();
        assert_eq!(audit.anzahl().await, 0);

        // Einschalten wird wieder protokolliert
        store
            .aktualisieren("auditLogging", PolicyWert::Bool(true), None)
            .await
            .unwrap();
        assert!(audit.ist_aktiv());
        assert_eq!(audit.anzahl().await, 1);
    }

    #[tokio::test]
    async fn setzen_ueberschreibt_komplett() {
        let (store, _) = store_bauen();
        let vorgabe = SecurityPolicy {
            require_2fa: true,
            max_failed_attempts: 2,
            ..SecurityPolicy::default()
        };

        store.setzen(vorgabe.clone()).await.unwrap();
        assert_eq!(store.laden().await.unwrap(), vorgabe);
    }

    #[tokio::test]
    async fn vorgabe_greift_nur_beim_ersten_start() {
        let (store, _) = store_bauen();
        let vorgabe = SecurityPolicy {
            max_failed_attempts: 2,
            ..SecurityPolicy::default()
        };

        // Leerer Vault: die Vorgabe wird uebernommen und persistiert
        let erste = store.laden_mit_vorgabe(Some(vorgabe.clone())).await.unwrap();
        assert_eq!(erste, vorgabe);

        // Der persistierte Stand gewinnt gegen jede spaetere Vorgabe
        let andere = SecurityPolicy {
            max_failed_attempts: 9,
            ..SecurityPolicy::default()
        };
        let zweite = store.laden_mit_vorgabe(Some(andere)).await.unwrap();
        assert_eq!(zweite, vorgabe);

        // Ohne Vorgabe wird schlicht geladen
        let dritte = store.laden_mit_vorgabe(None).await.unwrap();
        assert_eq!(dritte, vorgabe);
    }
}
