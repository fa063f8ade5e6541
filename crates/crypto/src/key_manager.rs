//! Stream-Schluessel-Verwaltung
//!
//! Verwaltet das Schluesselmaterial des Subsystems:
//! - Master-Schluessel-Bootstrap aus dem Credential-Store (idempotent)
//! - X25519-Schluessel-Paare pro Benutzer (private Haelfte nur im Vault)
//! - Verzeichnis bekannter oeffentlicher Schluessel
//! - Pro-Stream-Verschluesselung: frischer Schluessel, Einzelverpackung
//!   pro Empfaenger

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use rand::rngs::OsRng;
use rand::RngCore;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use fluester_core::UserId;
use fluester_protocol::{
    EncryptedStreamPacket, EncryptionMode, StreamAlgorithm, StreamMetadata, StreamPacket,
};
use fluester_vault::{CredentialStore, VaultScope};

use crate::aead::{encrypt_payload, decrypt_payload, zufalls_nonce, zufalls_schluessel, SCHLUESSEL_LAENGE};
use crate::error::{CryptoError, CryptoResult};
use crate::types::{MasterKeyRecord, MasterKeyStatus, PublicKeyRecord, SecretBytes};
use crate::wrap::{unwrap_key_for_recipient, wrap_key_for_recipient};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

/// Vault-Eintrag des Master-Schluessels
pub const MASTER_KEY_EINTRAG: &str = "master-key";

/// Praefix der privaten Benutzer-Schluessel im Vault
pub const USER_KEY_PRAEFIX: &str = "user-key/";

/// Reservierte Empfaenger-ID des Server-Escrow-Eintrags in `wrappedKeys`
pub const SERVER_EMPFAENGER_ID: &str = "server";

/// Verwaltet Schluessel-Paare und verschluesselt/entschluesselt Streams
pub struct StreamKeyManager<V: CredentialStore> {
    vault: Arc<V>,
    /// Verzeichnis bekannter oeffentlicher Schluessel (eigene und fremde)
    public_keys: DashMap<UserId, [u8; 32]>,
    /// Escrow-Schluessel fuer die Modi server-side und hybrid
    server_public_key: parking_lot::RwLock<Option<[u8; 32]>>,
    algorithm: StreamAlgorithm,
}

impl<V: CredentialStore> StreamKeyManager<V> {
    /// Erstellt einen Manager mit Standard-Algorithmus (AES-256-GCM)
    pub fn new(vault: Arc<V>) -> Self {
        Self::mit_algorithmus(vault, StreamAlgorithm::default())
    }

    /// Erstellt einen Manager mit explizitem AEAD-Algorithmus
    pub fn mit_algorithmus(vault: Arc<V>, algorithm: StreamAlgorithm) -> Self {
        Self {
            vault,
            public_keys: DashMap::new(),
            server_public_key: parking_lot::RwLock::new(None),
            algorithm,
        }
    }

    /// Konfigurierter AEAD-Algorithmus
    pub fn algorithm(&self) -> StreamAlgorithm {
        self.algorithm
    }

    fn user_key_eintrag(user_id: &UserId) -> String {
        format!("{}{}", USER_KEY_PRAEFIX, user_id.as_str())
    }

    /// Stellt sicher, dass ein Master-Schluessel existiert (idempotent)
    ///
    /// Jeder Fehler hier ist fatal: ohne lesbaren und beschreibbaren
    /// Credential-Store darf das Subsystem nicht starten.
    pub async fn ensure_master_key(&self) -> CryptoResult<MasterKeyStatus> {
        let vorhanden = self
            .vault
            .get(MASTER_KEY_EINTRAG)
            .await
            .map_err(|e| CryptoError::SchluesselInit(format!("Vault nicht lesbar: {}", e)))?;

        if let Some(roh) = vorhanden {
            let record: MasterKeyRecord = serde_json::from_slice(&roh).map_err(|e| {
                CryptoError::SchluesselInit(format!("Master-Schluessel-Eintrag korrupt: {}", e))
            })?;
            tracing::debug!(algorithm = %record.algorithm, "Master-Schluessel vorhanden");
            return Ok(MasterKeyStatus {
                neu_erstellt: false,
                algorithm: record.algorithm,
                erstellt_am: record.erstellt_am,
            });
        }

        let mut key_bytes = vec![0u8; SCHLUESSEL_LAENGE];
        OsRng.fill_bytes(&mut key_bytes);
        let key = SecretBytes::new(key_bytes);

        let record = MasterKeyRecord {
            schluessel_b64: URL_SAFE_NO_PAD.encode(key.as_bytes()),
            algorithm: self.algorithm,
            erstellt_am: Utc::now(),
        };
        let roh = serde_json::to_vec(&record)
            .map_err(|e| CryptoError::SchluesselInit(e.to_string()))?;
        self.vault
            .set(MASTER_KEY_EINTRAG, &roh, VaultScope::LocalSecure)
            .await
            .map_err(|e| CryptoError::SchluesselInit(format!("Vault nicht beschreibbar: {}", e)))?;

        tracing::info!(algorithm = %self.algorithm, "Master-Schluessel erzeugt und abgelegt");
        Ok(MasterKeyStatus {
            neu_erstellt: true,
            algorithm: record.algorithm,
            erstellt_am: record.erstellt_am,
        })
    }

    /// Erzeugt ein X25519-Schluessel-Paar fuer einen Benutzer
    ///
    /// Ersetzt ein bestehendes Paar vollstaendig: die private Haelfte im
    /// Vault und den Verzeichnis-Eintrag. Pro Benutzer ist immer genau
    /// ein Paar aktiv.
    pub async fn generate_user_keypair(&self, user_id: &UserId) -> CryptoResult<PublicKeyRecord> {
        let mut priv_bytes = [0u8; 32];
        OsRng.fill_bytes(&mut priv_bytes);
        let public = X25519PublicKey::from(&StaticSecret::from(priv_bytes));

        self.vault
            .set(
                &Self::user_key_eintrag(user_id),
                &priv_bytes,
                VaultScope::LocalSecure,
            )
            .await?;
        self.public_keys.insert(user_id.clone(), public.to_bytes());

        tracing::info!(user_id = %user_id, "Benutzer-Schluessel-Paar erzeugt");
        Ok(PublicKeyRecord {
            user_id: user_id.clone(),
            public_key: public.to_bytes().to_vec(),
            erstellt_am: Utc::now(),
        })
    }

    /// Registriert den oeffentlichen Schluessel einer Gegenstelle
    ///
    /// Wie die Schluessel verteilt werden, ist Sache der Anwendungs-Shell;
    /// hier landet nur das Ergebnis im Verzeichnis.
    pub fn register_public_key(&self, user_id: &UserId, public_key: &[u8]) -> CryptoResult<()> {
        let bytes = public_key_32(public_key)?;
        self.public_keys.insert(user_id.clone(), bytes);
        tracing::debug!(user_id = %user_id, "Oeffentlicher Schluessel registriert");
        Ok(())
    }

    /// Bekannter oeffentlicher Schluessel eines Benutzers
    pub fn known_public_key(&self, user_id: &UserId) -> Option<[u8; 32]> {
        self.public_keys.get(user_id).map(|e| *e)
    }

    /// Anzahl der registrierten oeffentlichen Schluessel
    pub fn registrierte_schluessel(&self) -> usize {
        self.public_keys.len()
    }

    /// Setzt den Escrow-Schluessel fuer server-side/hybrid Deployments
    pub fn set_server_public_key(&self, public_key: &[u8]) -> CryptoResult<()> {
        let bytes = public_key_32(public_key)?;
        *self.server_public_key.write() = Some(bytes);
        tracing::info!("Server-Escrow-Schluessel gesetzt");
        Ok(())
    }

    /// Verschluesselt einen Audio-Stream-Payload
    ///
    /// Im Modus `disabled` verlassen die Nutzdaten das Subsystem Byte fuer
    /// Byte unveraendert als Klartext-Paket. Sonst wird der Payload genau
    /// einmal mit einem frischen Schluessel verschluesselt und der
    /// Schluessel pro Ziel einzeln verpackt. Empfaenger ohne bekannten
    /// oeffentlichen Schluessel werden uebersprungen, nicht abgebrochen.
    pub async fn encrypt_stream(
        &self,
        payload: &[u8],
        empfaenger: &[UserId],
        mode: EncryptionMode,
    ) -> CryptoResult<StreamPacket> {
        if !mode.ist_aktiv() {
            return Ok(StreamPacket::Plaintext {
                payload: payload.to_vec(),
            });
        }

        let stream_key = zufalls_schluessel();
        let nonce = zufalls_nonce();
        let ciphertext = encrypt_payload(self.algorithm, stream_key.as_bytes(), &nonce, payload)?;

        let mut wrapped_keys = HashMap::new();

        if mode.verpackt_fuer_empfaenger() {
            for user_id in empfaenger {
                match self.known_public_key(user_id) {
                    Some(public_key) => {
                        let wrapped = wrap_key_for_recipient(&stream_key, &public_key)?;
                        wrapped_keys.insert(user_id.clone(), wrapped);
                    }
                    None => {
                        tracing::warn!(
                            user_id = %user_id,
                            "Kein oeffentlicher Schluessel bekannt, Empfaenger uebersprungen"
                        );
                    }
                }
            }
        }

        if mode.verpackt_fuer_server() {
            let server_key = *self.server_public_key.read();
            match server_key {
                Some(server_key) => {
                    let wrapped = wrap_key_for_recipient(&stream_key, &server_key)?;
                    wrapped_keys.insert(UserId::new(SERVER_EMPFAENGER_ID), wrapped);
                }
                None => {
                    tracing::warn!("Kein Server-Escrow-Schluessel gesetzt, Escrow uebersprungen");
                }
            }
        }

        Ok(StreamPacket::Encrypted(EncryptedStreamPacket {
            ciphertext,
            nonce: nonce.to_vec(),
            wrapped_keys,
            metadata: StreamMetadata {
                algorithm: self.algorithm,
                key_size_bits: self.algorithm.key_size_bits(),
                timestamp_ms: Utc::now().timestamp_millis(),
                recipient_user_ids: empfaenger.to_vec(),
            },
        }))
    }

    /// Entschluesselt ein Stream-Paket fuer einen Benutzer
    ///
    /// Klartext-Pakete werden unveraendert durchgereicht. Fuer
    /// verschluesselte Pakete gilt: kein eigener privater Schluessel ->
    /// [`CryptoError::SchluesselNichtGefunden`], kein eigener
    /// `wrappedKeys`-Eintrag -> [`CryptoError::EmpfaengerNichtAutorisiert`],
    /// manipulierte Daten -> [`CryptoError::Integritaet`].
    pub async fn decrypt_stream(
        &self,
        paket: &StreamPacket,
        user_id: &UserId,
    ) -> CryptoResult<Vec<u8>> {
        let paket = match paket {
            StreamPacket::Plaintext { payload } => return Ok(payload.clone()),
            StreamPacket::Encrypted(paket) => paket,
        };

        let priv_roh = self
            .vault
            .get(&Self::user_key_eintrag(user_id))
            .await?
            .map(SecretBytes::new)
            .ok_or_else(|| CryptoError::SchluesselNichtGefunden {
                user_id: user_id.to_string(),
            })?;
        let priv_bytes: [u8; 32] = priv_roh.as_bytes().try_into().map_err(|_| {
            CryptoError::UngueltigeSchluesselLaenge {
                erwartet: 32,
                erhalten: priv_roh.len(),
            }
        })?;

        let wrapped = paket.wrapped_keys.get(user_id).ok_or_else(|| {
            CryptoError::EmpfaengerNichtAutorisiert {
                user_id: user_id.to_string(),
            }
        })?;

        let stream_key = unwrap_key_for_recipient(wrapped, &priv_bytes)?;

        let nonce: [u8; 12] =
            paket
                .nonce
                .as_slice()
                .try_into()
                .map_err(|_| CryptoError::UngueltigeNonce {
                    erwartet: 12,
                    erhalten: paket.nonce.len(),
                })?;

        decrypt_payload(
            paket.metadata.algorithm,
            stream_key.as_bytes(),
            &nonce,
            &paket.ciphertext,
        )
    }
}

fn public_key_32(public_key: &[u8]) -> CryptoResult<[u8; 32]> {
    public_key
        .try_into()
        .map_err(|_| CryptoError::UngueltigeSchluesselLaenge {
            erwartet: 32,
            erhalten: public_key.len(),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
