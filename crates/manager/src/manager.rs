//! Die Security-Manager-Fassade
//!
//! Buendelt Schluesselverwaltung, Zwei-Faktor, Policy, Lockout und
//! Audit hinter den nach aussen sichtbaren Operationen.

use std::sync::Arc;

use serde_json::json;

use fluester_audit::{ereignis, AuditEintrag, AuditFilter, AuditLog};
use fluester_auth::{
    ChallengeDelegat, EinmalcodeAusgabe, LockoutService, PolicyAenderung, PolicyFeld, PolicyStore,
    PolicyWert, SecurityPolicy, ZweiFaktorMethode, ZweiFaktorService, ZweiFaktorSetup,
};
use fluester_core::UserId;
use fluester_crypto::{CryptoError, PublicKeyRecord, StreamKeyManager};
use fluester_protocol::{EncryptionMode, StreamPacket};
use fluester_vault::CredentialStore;

use crate::error::{ManagerError, ManagerResult};
use crate::status::{
    AuditStatus, BedrohungsStatus, SecurityStatus, VerschluesselungsStatus, ZweiFaktorStatus,
};

/// Fassade ueber das gesamte Sicherheits-Subsystem
///
/// `V` ist der Credential-Store, `P` der Bestaetiger fuer
/// Challenge-basierte 2FA-Methoden.
pub struct SecurityManager<V: CredentialStore, P> {
    vault: Arc<V>,
    schluessel: Arc<StreamKeyManager<V>>,
    zwei_faktor: Arc<ZweiFaktorService<P>>,
    policies: Arc<PolicyStore<V>>,
    lockout: Arc<LockoutService<V>>,
    audit: Arc<AuditLog>,
    /// Gewuenschter Modus aus der Deployment-Konfiguration; wirksam nur
    /// solange die Policy Verschluesselung verlangt
    konfigurierter_modus: EncryptionMode,
    modus: parking_lot::RwLock<EncryptionMode>,
}

impl<V: CredentialStore, P: ChallengeDelegat> SecurityManager<V, P> {
    /// Errichtet das Subsystem mit Ende-zu-Ende-Verschluesselung
    pub async fn neu(
        vault: Arc<V>,
        delegat: Arc<P>,
        erste_policy: Option<SecurityPolicy>,
    ) -> ManagerResult<Arc<Self>> {
        Self::mit_modus(vault, delegat, erste_policy, EncryptionMode::EndToEnd).await
    }

    /// Errichtet das Subsystem mit explizit gewaehltem Stream-Modus
    ///
    /// Reihenfolge: erst den Master-Key sicherstellen (ohne ihn startet
    /// nichts), dann die Policy laden (eine Vorgabe greift nur, solange
    /// der Vault leer ist), dann die abhaengigen Dienste verdrahten.
    pub async fn mit_modus(
        vault: Arc<V>,
        delegat: Arc<P>,
        erste_policy: Option<SecurityPolicy>,
        gewuenschter_modus: EncryptionMode,
    ) -> ManagerResult<Arc<Self>> {
        let audit = AuditLog::neu();
        let schluessel = Arc::new(StreamKeyManager::new(vault.clone()));

        let master = schluessel
            .ensure_master_key()
            .await
            .map_err(|e| ManagerError::Initialisierung(e.to_string()))?;
        tracing::info!(
            neu_erstellt = master.neu_erstellt,
            algorithm = %master.algorithm,
            "Master-Key bereit"
        );

        let policies = PolicyStore::neu(vault.clone(), audit.clone());
        let policy = policies.laden_mit_vorgabe(erste_policy).await?;

        let modus = if policy.require_encryption {
            gewuenschter_modus
        } else {
            EncryptionMode::Disabled
        };
        let lockout = LockoutService::neu(policies.clone(), audit.clone());
        let zwei_faktor = ZweiFaktorService::neu(delegat, audit.clone());

        let manager = Arc::new(Self {
            vault,
            schluessel,
            zwei_faktor,
            policies,
            lockout,
            audit,
            konfigurierter_modus: gewuenschter_modus,
            modus: parking_lot::RwLock::new(modus),
        });

        manager
            .audit
            .protokollieren(
                ereignis::TYP_SICHERHEIT,
                ereignis::AKTION_SUBSYSTEM_GESTARTET,
                None,
                json!({ "modus": modus, "master_key_neu": master.neu_erstellt }),
            )
            .await;
        tracing::info!(modus = %modus, "Security-Manager bereit");
        Ok(manager)
    }

    // --- Streams -----------------------------------------------------------

    /// Verschluesselt einen Audio-Stream-Payload fuer die Empfaengerliste
    pub async fn audio_stream_verschluesseln(
        &self,
        payload: &[u8],
        empfaenger: &[UserId],
    ) -> ManagerResult<StreamPacket> {
        let modus = *self.modus.read();
        Ok(self
            .schluessel
            .encrypt_stream(payload, empfaenger, modus)
            .await?)
    }

    /// Entschluesselt ein Stream-Paket fuer einen Benutzer
    ///
    /// Sicherheitsrelevante Fehler (manipuliertes Paket, nicht
    /// autorisierter Empfaenger) landen zusaetzlich im Audit-Log.
    pub async fn audio_stream_entschluesseln(
        &self,
        paket: &StreamPacket,
        user_id: &UserId,
    ) -> ManagerResult<Vec<u8>> {
        match self.schluessel.decrypt_stream(paket, user_id).await {
            Ok(klartext) => Ok(klartext),
            Err(e) if e.ist_sicherheitsrelevant() => {
                let aktion = match &e {
                    CryptoError::EmpfaengerNichtAutorisiert { .. } => {
                        ereignis::AKTION_EMPFAENGER_ABGELEHNT
                    }
                    _ => ereignis::AKTION_INTEGRITAET_VERLETZT,
                };
                tracing::warn!(user_id = %user_id, fehler = %e, "Entschluesselung abgewiesen");
                self.audit
                    .protokollieren(
                        ereignis::TYP_SICHERHEIT,
                        aktion,
                        Some(user_id),
                        json!({ "fehler": e.to_string() }),
                    )
                    .await;
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    // --- Zwei-Faktor -------------------------------------------------------

    /// Richtet 2FA fuer einen Benutzer ein
    ///
    /// `methode` ist der Wire-Name (`totp`, `sms`, ...); `kontakt` ist
    /// nur fuer SMS/E-Mail Pflicht.
    pub async fn zwei_faktor_aktivieren(
        &self,
        user_id: &UserId,
        methode: &str,
        kontakt: Option<&str>,
    ) -> ManagerResult<ZweiFaktorSetup> {
        let methode: ZweiFaktorMethode = methode.parse()?;
        Ok(self.zwei_faktor.aktivieren(user_id, methode, kontakt).await?)
    }

    /// Entfernt die 2FA-Einrichtung eines Benutzers
    pub async fn zwei_faktor_deaktivieren(&self, user_id: &UserId) -> ManagerResult<()> {
        Ok(self.zwei_faktor.deaktivieren(user_id).await?)
    }

    /// Prueft einen Zweitfaktor
    ///
    /// `methode` ist der Wire-Name; `"backup_code"` loest einen
    /// Backup-Code ein. Ein gesperrtes Konto wird gar nicht erst
    /// geprueft, und das Ergebnis speist den Lockout-Zaehler.
    pub async fn zwei_faktor_verifizieren(
        &self,
        user_id: &UserId,
        methode: &str,
        code: &str,
    ) -> ManagerResult<bool> {
        if self.lockout.ist_gesperrt(user_id) {
            tracing::warn!(user_id = %user_id, "Verifikation fuer gesperrtes Konto abgewiesen");
            return Err(ManagerError::KontoGesperrt {
                user_id: user_id.to_string(),
            });
        }

        let gueltig = if methode == "backup_code" {
            self.zwei_faktor
                .backup_code_verifizieren(user_id, code)
                .await?
        } else {
            let methode: ZweiFaktorMethode = methode.parse()?;
            self.zwei_faktor.verifizieren(user_id, methode, code).await?
        };

        if gueltig {
            self.lockout.erfolg_melden(user_id);
        } else {
            self.lockout.fehlversuch_melden(user_id).await;
        }
        Ok(gueltig)
    }

    /// Stellt einen frischen Einmalcode fuer SMS/E-Mail-Benutzer aus
    pub async fn einmalcode_anfordern(
        &self,
        user_id: &UserId,
    ) -> ManagerResult<EinmalcodeAusgabe> {
        Ok(self.zwei_faktor.einmalcode_anfordern(user_id).await?)
    }

    // --- Policy ------------------------------------------------------------

    /// Aktualisiert ein Policy-Feld
    ///
    /// `requireEncryption` stellt sofort den Stream-Modus um,
    /// `auditLogging` schaltet das Audit-Log.
    pub async fn policy_aktualisieren(
        &self,
        feld: &str,
        wert: PolicyWert,
        admin: Option<&UserId>,
    ) -> ManagerResult<PolicyAenderung> {
        let aenderung = self.policies.aktualisieren(feld, wert, admin).await?;

        if aenderung.feld == PolicyFeld::RequireEncryption {
            let neuer_modus = if aenderung.policy.require_encryption {
                self.konfigurierter_modus
            } else {
                EncryptionMode::Disabled
            };
            *self.modus.write() = neuer_modus;
            tracing::info!(modus = %neuer_modus, "Stream-Modus folgt der Policy");
        }
        Ok(aenderung)
    }

    /// Die aktuell geltende Policy
    pub async fn aktuelle_policy(&self) -> SecurityPolicy {
        self.policies.aktuelle().await
    }

    // --- Status & Audit ----------------------------------------------------

    /// Momentaufnahme des gesamten Subsystems
    pub async fn sicherheitsstatus(&self) -> SecurityStatus {
        let policy = self.policies.aktuelle().await;
        let modus = *self.modus.read();

        SecurityStatus {
            verschluesselung: VerschluesselungsStatus {
                aktiv: modus.ist_aktiv(),
                modus,
                algorithm: self.schluessel.algorithm(),
                registrierte_schluessel: self.schluessel.registrierte_schluessel(),
            },
            zwei_faktor: ZweiFaktorStatus {
                erzwungen: policy.require_2fa,
                statistik: self.zwei_faktor.statistik().await,
            },
            policy,
            audit: AuditStatus {
                aktiv: self.audit.ist_aktiv(),
                eintraege_gesamt: self.audit.anzahl().await,
                letzte_eintraege: self.audit.letzte(10).await,
            },
            bedrohungen: BedrohungsStatus {
                gesperrte_konten: self.lockout.gesperrte_anzahl(),
                beobachtete_konten: self.lockout.beobachtete_anzahl(),
            },
        }
    }

    /// Gefilterte Sicht auf das Audit-Log
    pub async fn audit_abfragen(&self, filter: &AuditFilter) -> Vec<AuditEintrag> {
        self.audit.abfragen(filter).await
    }

    /// Rotiert das Audit-Log sofort in den Vault
    pub async fn audit_rotieren(&self) -> ManagerResult<Option<String>> {
        Ok(self.audit.rotieren(self.vault.as_ref()).await?)
    }

    /// Das Audit-Log selbst (fuer den Rotations-Task des Daemons)
    pub fn audit_log(&self) -> Arc<AuditLog> {
        self.audit.clone()
    }

    /// Der zugrunde liegende Credential-Store
    pub fn vault(&self) -> Arc<V> {
        self.vault.clone()
    }

    // --- Schluesselverwaltung ----------------------------------------------

    /// Erzeugt das X25519-Schluesselpaar eines Benutzers
    pub async fn benutzer_schluessel_erzeugen(
        &self,
        user_id: &UserId,
    ) -> ManagerResult<PublicKeyRecord> {
        Ok(self.schluessel.generate_user_keypair(user_id).await?)
    }

    /// Registriert den oeffentlichen Schluessel einer Gegenstelle
    pub fn oeffentlichen_schluessel_registrieren(
        &self,
        user_id: &UserId,
        public_key: &[u8],
    ) -> ManagerResult<()> {
        Ok(self.schluessel.register_public_key(user_id, public_key)?)
    }

    /// Setzt den Escrow-Schluessel fuer server-side/hybrid Deployments
    pub fn server_schluessel_setzen(&self, public_key: &[u8]) -> ManagerResult<()> {
        Ok(self.schluessel.set_server_public_key(public_key)?)
    }

    /// Der aktuell wirksame Stream-Modus
    pub fn verschluesselungs_modus(&self) -> EncryptionMode {
        *self.modus.read()
    }
}
