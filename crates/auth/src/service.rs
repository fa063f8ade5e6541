//! Zwei-Faktor-Service: Einrichtung, Verifikation und Backup-Codes
//!
//! Haelt den Einrichtungszustand pro Benutzer im Speicher. Falsche
//! Codes sind kein Fehler, sondern ein `Ok(false)`; Fehler stehen fuer
//! fehlende Einrichtung oder ungueltige Eingabedaten.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;

use fluester_audit::{ereignis, AuditLog};
use fluester_core::UserId;

use crate::backup_codes;
use crate::error::{AuthError, AuthResult};
use crate::method::ZweiFaktorMethode;
use crate::totp;

/// Gueltigkeit eines per SMS/E-Mail zugestellten Einmalcodes
const EINMALCODE_GUELTIGKEIT_MIN: i64 = 10;

/// Laenge der Registrierungs-Challenge in Bytes
const CHALLENGE_LAENGE: usize = 32;

/// Aussteller-Name in otpauth-URIs
const TOTP_AUSSTELLER: &str = "Fluester";

/// Bestaetigt Challenge-basierte Methoden (Push, Hardware-Key, Biometrie)
///
/// Die Geraetekommunikation liegt ausserhalb dieses Crates; der Delegat
/// entscheidet, ob eine Antwort fuer den Benutzer gilt.
#[allow(async_fn_in_trait)]
pub trait ChallengeDelegat: Send + Sync {
    async fn challenge_bestaetigen(
        &self,
        user_id: &UserId,
        methode: ZweiFaktorMethode,
        antwort: &str,
    ) -> bool;
}

/// Delegat ohne Geraeteanbindung: lehnt jede Challenge ab
pub struct AblehnenderDelegat;

impl ChallengeDelegat for AblehnenderDelegat {
    async fn challenge_bestaetigen(
        &self,
        _user_id: &UserId,
        _methode: ZweiFaktorMethode,
        _antwort: &str,
    ) -> bool {
        false
    }
}

/// Einrichtungszustand eines Benutzers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZweiFaktorEintrag {
    pub methode: ZweiFaktorMethode,
    pub aktiviert_am: DateTime<Utc>,
    /// Base32-Secret (nur bei TOTP)
    pub totp_secret: Option<String>,
    /// Zustelladresse (nur bei SMS/E-Mail)
    pub kontakt: Option<String>,
    /// Argon2id-Hashes der verbliebenen Backup-Codes
    pub backup_code_hashes: Vec<String>,
}

#[derive(Debug, Clone)]
struct EinmalCode {
    code: String,
    laeuft_ab: DateTime<Utc>,
}

/// Ergebnis der Einrichtung
///
/// Die Klartext-Backup-Codes sind NUR hier sichtbar und werden nicht
/// gespeichert.
#[derive(Debug, Clone, Serialize)]
pub struct ZweiFaktorSetup {
    pub methode: ZweiFaktorMethode,
    pub backup_codes: Vec<String>,
    pub details: SetupDetails,
}

/// Methodenspezifischer Teil des Einrichtungs-Ergebnisses
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "art", rename_all = "snake_case")]
pub enum SetupDetails {
    Totp {
        secret: String,
        otpauth_uri: String,
    },
    Einmalcode {
        ziel: String,
        code: String,
        laeuft_ab: DateTime<Utc>,
    },
    Challenge {
        challenge: String,
    },
}

/// Neu ausgestellter Einmalcode
#[derive(Debug, Clone)]
pub struct EinmalcodeAusgabe {
    pub ziel: String,
    pub code: String,
    pub laeuft_ab: DateTime<Utc>,
}

/// Zusammenfassung fuer den Sicherheitsstatus
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZweiFaktorStatistik {
    pub eingerichtete_benutzer: usize,
    /// Methode -> Anzahl Benutzer
    pub methoden: BTreeMap<String, usize>,
}

pub struct ZweiFaktorService<P> {
    delegat: Arc<P>,
    audit: Arc<AuditLog>,
    eintraege: RwLock<HashMap<UserId, ZweiFaktorEintrag>>,
    offene_codes: RwLock<HashMap<UserId, EinmalCode>>,
}

impl<P: ChallengeDelegat> ZweiFaktorService<P> {
    pub fn neu(delegat: Arc<P>, audit: Arc<AuditLog>) -> Arc<Self> {
        Arc::new(Self {
            delegat,
            audit,
            eintraege: RwLock::new(HashMap::new()),
            offene_codes: RwLock::new(HashMap::new()),
        })
    }

    /// Richtet 2FA fuer einen Benutzer ein
    ///
    /// Eine bestehende Einrichtung wird ersetzt. Die Methode ist sofort
    /// aktiv; `kontakt` ist nur fuer SMS/E-Mail Pflicht.
    pub async fn aktivieren(
        &self,
        user_id: &UserId,
        methode: ZweiFaktorMethode,
        kontakt: Option<&str>,
    ) -> AuthResult<ZweiFaktorSetup> {
        if methode.braucht_kontakt() && kontakt.is_none() {
            return Err(AuthError::KontaktFehlt {
                methode: methode.to_string(),
            });
        }
        let kontakt = kontakt.map(str::to_string);

        let klartext_codes = backup_codes::generieren();
        let backup_code_hashes = klartext_codes
            .iter()
            .map(|code| backup_codes::hashen(code))
            .collect::<AuthResult<Vec<_>>>()?;

        let mut eintrag = ZweiFaktorEintrag {
            methode,
            aktiviert_am: Utc::now(),
            totp_secret: None,
            kontakt: kontakt.clone(),
            backup_code_hashes,
        };

        // Offene Einmalcodes einer ersetzten Einrichtung verfallen
        self.offene_codes.write().await.remove(user_id);

        let details = match methode {
            ZweiFaktorMethode::Totp => {
                let secret = totp::secret_generieren();
                let otpauth_uri = totp::otpauth_uri(&secret, user_id.as_str(), TOTP_AUSSTELLER);
                eintrag.totp_secret = Some(secret.clone());
                SetupDetails::Totp {
                    secret,
                    otpauth_uri,
                }
            }
            ZweiFaktorMethode::Sms | ZweiFaktorMethode::Email => {
                let ziel = kontakt.clone().ok_or_else(|| AuthError::KontaktFehlt {
                    methode: methode.to_string(),
                })?;
                let (code, laeuft_ab) = self.einmalcode_ausstellen(user_id, Utc::now()).await;
                SetupDetails::Einmalcode {
                    ziel,
                    code,
                    laeuft_ab,
                }
            }
            ZweiFaktorMethode::Push
            | ZweiFaktorMethode::HardwareKey
            | ZweiFaktorMethode::Biometric => {
                let mut bytes = [0u8; CHALLENGE_LAENGE];
                rand::thread_rng().fill_bytes(&mut bytes);
                SetupDetails::Challenge {
                    challenge: base64::Engine::encode(
                        &base64::engine::general_purpose::STANDARD,
                        bytes,
                    ),
                }
            }
        };

        self.eintraege.write().await.insert(user_id.clone(), eintrag);

        tracing::info!(user_id = %user_id, methode = %methode, "2FA eingerichtet");
        self.audit
            .protokollieren(
                ereignis::TYP_AUTHENTIFIZIERUNG,
                ereignis::AKTION_2FA_AKTIVIERT,
                Some(user_id),
                json!({ "methode": methode }),
            )
            .await;

        Ok(ZweiFaktorSetup {
            methode,
            backup_codes: klartext_codes,
            details,
        })
    }

    /// Entfernt die Einrichtung eines Benutzers samt offener Codes
    pub async fn deaktivieren(&self, user_id: &UserId) -> AuthResult<()> {
        let entfernt = self.eintraege.write().await.remove(user_id);
        if entfernt.is_none() {
            return Err(AuthError::NichtEingerichtet {
                user_id: user_id.to_string(),
            });
        }
        self.offene_codes.write().await.remove(user_id);

        tracing::info!(user_id = %user_id, "2FA deaktiviert");
        self.audit
            .protokollieren(
                ereignis::TYP_AUTHENTIFIZIERUNG,
                ereignis::AKTION_2FA_DEAKTIVIERT,
                Some(user_id),
                json!({}),
            )
            .await;
        Ok(())
    }

    /// Prueft einen Code fuer die eingerichtete Methode
    ///
    /// Ein falscher Code oder eine nicht passende Methode ergibt
    /// `Ok(false)`; nur ein Benutzer ohne Einrichtung ist ein Fehler.
    pub async fn verifizieren(
        &self,
        user_id: &UserId,
        methode: ZweiFaktorMethode,
        code: &str,
    ) -> AuthResult<bool> {
        self.verifizieren_um(user_id, methode, code, Utc::now()).await
    }

    async fn verifizieren_um(
        &self,
        user_id: &UserId,
        methode: ZweiFaktorMethode,
        code: &str,
        jetzt: DateTime<Utc>,
    ) -> AuthResult<bool> {
        let eintraege = self.eintraege.read().await;
        let eintrag = eintraege
            .get(user_id)
            .ok_or_else(|| AuthError::NichtEingerichtet {
                user_id: user_id.to_string(),
            })?
            .clone();
        drop(eintraege);

        if eintrag.methode != methode {
            tracing::debug!(
                user_id = %user_id,
                eingerichtet = %eintrag.methode,
                angefragt = %methode,
                "2FA-Methode passt nicht zur Einrichtung"
            );
            self.fehlschlag_auditieren(user_id, &methode.to_string(), "methode_passt_nicht")
                .await;
            return Ok(false);
        }

        let gueltig = match methode {
            ZweiFaktorMethode::Totp => match &eintrag.totp_secret {
                Some(secret) => totp::code_pruefen(secret, code, jetzt.timestamp_millis())?,
                None => false,
            },
            ZweiFaktorMethode::Sms | ZweiFaktorMethode::Email => {
                self.einmalcode_pruefen(user_id, code, jetzt).await
            }
            ZweiFaktorMethode::Push
            | ZweiFaktorMethode::HardwareKey
            | ZweiFaktorMethode::Biometric => {
                self.delegat
                    .challenge_bestaetigen(user_id, methode, code)
                    .await
            }
        };

        if gueltig {
            self.audit
                .protokollieren(
                    ereignis::TYP_AUTHENTIFIZIERUNG,
                    ereignis::AKTION_2FA_VERIFIZIERT,
                    Some(user_id),
                    json!({ "methode": methode }),
                )
                .await;
        } else {
            self.fehlschlag_auditieren(user_id, &methode.to_string(), "code_ungueltig")
                .await;
        }
        Ok(gueltig)
    }

    /// Loest einen Backup-Code ein
    ///
    /// Pruefen und Entfernen laufen in einem kritischen Abschnitt, damit
    /// derselbe Code nicht zweimal akzeptiert werden kann.
    pub async fn backup_code_verifizieren(
        &self,
        user_id: &UserId,
        code: &str,
    ) -> AuthResult<bool> {
        let mut eintraege = self.eintraege.write().await;
        let eintrag = eintraege
            .get_mut(user_id)
            .ok_or_else(|| AuthError::NichtEingerichtet {
                user_id: user_id.to_string(),
            })?;

        let mut treffer = None;
        for (index, hash) in eintrag.backup_code_hashes.iter().enumerate() {
            match backup_codes::pruefen(code, hash) {
                Ok(true) => {
                    treffer = Some(index);
                    break;
                }
                Ok(false) => continue,
                Err(e) => {
                    tracing::warn!(user_id = %user_id, "Backup-Code-Hash unlesbar: {}", e);
                    continue;
                }
            }
        }

        let gueltig = match treffer {
            Some(index) => {
                eintrag.backup_code_hashes.remove(index);
                true
            }
            None => false,
        };
        let verbleibend = eintrag.backup_code_hashes.len();
        drop(eintraege);

        if gueltig {
            tracing::info!(user_id = %user_id, verbleibend, "Backup-Code eingeloest");
            self.audit
                .protokollieren(
                    ereignis::TYP_AUTHENTIFIZIERUNG,
                    ereignis::AKTION_2FA_VERIFIZIERT,
                    Some(user_id),
                    json!({ "methode": "backup_code", "verbleibend": verbleibend }),
                )
                .await;
        } else {
            self.fehlschlag_auditieren(user_id, "backup_code", "code_ungueltig")
                .await;
        }
        Ok(gueltig)
    }

    /// Stellt einen frischen Einmalcode fuer SMS/E-Mail-Benutzer aus
    ///
    /// Ersetzt einen eventuell noch offenen Code.
    pub async fn einmalcode_anfordern(&self, user_id: &UserId) -> AuthResult<EinmalcodeAusgabe> {
        let eintraege = self.eintraege.read().await;
        let eintrag = eintraege
            .get(user_id)
            .ok_or_else(|| AuthError::NichtEingerichtet {
                user_id: user_id.to_string(),
            })?;

        if !eintrag.methode.braucht_kontakt() {
            return Err(AuthError::MethodeNichtUnterstuetzt(
                eintrag.methode.to_string(),
            ));
        }
        let ziel = eintrag.kontakt.clone().ok_or_else(|| AuthError::KontaktFehlt {
            methode: eintrag.methode.to_string(),
        })?;
        drop(eintraege);

        let (code, laeuft_ab) = self.einmalcode_ausstellen(user_id, Utc::now()).await;
        tracing::debug!(user_id = %user_id, "Einmalcode ausgestellt");
        Ok(EinmalcodeAusgabe {
            ziel,
            code,
            laeuft_ab,
        })
    }

    pub async fn ist_eingerichtet(&self, user_id: &UserId) -> bool {
        self.eintraege.read().await.contains_key(user_id)
    }

    pub async fn methode_von(&self, user_id: &UserId) -> Option<ZweiFaktorMethode> {
        self.eintraege.read().await.get(user_id).map(|e| e.methode)
    }

    /// Wie viele Backup-Codes sind noch uneingeloest?
    pub async fn verbleibende_backup_codes(&self, user_id: &UserId) -> Option<usize> {
        self.eintraege
            .read()
            .await
            .get(user_id)
            .map(|e| e.backup_code_hashes.len())
    }

    pub async fn statistik(&self) -> ZweiFaktorStatistik {
        let eintraege = self.eintraege.read().await;
        let mut methoden: BTreeMap<String, usize> = BTreeMap::new();
        for eintrag in eintraege.values() {
            *methoden.entry(eintrag.methode.to_string()).or_insert(0) += 1;
        }
        ZweiFaktorStatistik {
            eingerichtete_benutzer: eintraege.len(),
            methoden,
        }
    }

    async fn einmalcode_ausstellen(
        &self,
        user_id: &UserId,
        jetzt: DateTime<Utc>,
    ) -> (String, DateTime<Utc>) {
        let code = format!("{:06}", rand::thread_rng().gen_range(0..1_000_000));
        let laeuft_ab = jetzt + Duration::minutes(EINMALCODE_GUELTIGKEIT_MIN);
        self.offene_codes.write().await.insert(
            user_id.clone(),
            EinmalCode {
                code: code.clone(),
                laeuft_ab,
            },
        );
        (code, laeuft_ab)
    }

    async fn einmalcode_pruefen(
        &self,
        user_id: &UserId,
        code: &str,
        jetzt: DateTime<Utc>,
    ) -> bool {
        let mut offene = self.offene_codes.write().await;
        let (abgelaufen, passt) = match offene.get(user_id) {
            None => return false,
            Some(offen) => (offen.laeuft_ab <= jetzt, offen.code == code.trim()),
        };

        // Eingeloest oder abgelaufen: der Code ist verbraucht
        if abgelaufen || passt {
            offene.remove(user_id);
        }
        !abgelaufen && passt
    }

    async fn fehlschlag_auditieren(&self, user_id: &UserId, methode: &str, grund: &str) {
        self.audit
            .protokollieren(
                ereignis::TYP_AUTHENTIFIZIERUNG,
                ereignis::AKTION_2FA_FEHLGESCHLAGEN,
                Some(user_id),
                json!({ "methode": methode, "grund": grund }),
            )
            .await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
