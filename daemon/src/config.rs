//! Daemon-Konfiguration
//!
//! Wird beim Start aus einer TOML-Datei geladen. Alle Felder haben
//! sinnvolle Standardwerte, sodass der Daemon ohne Konfigurationsdatei
//! lauffaehig ist.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use fluester_auth::SecurityPolicy;
use fluester_observability::{log_format_gueltig, log_level_gueltig};
use fluester_protocol::EncryptionMode;

/// Vollstaendige Daemon-Konfiguration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct DaemonConfig {
    /// Vault-Einstellungen (Ablage fuer Schluesselmaterial und Policy)
    pub vault: VaultEinstellungen,
    /// Stream-Verschluesselung
    pub verschluesselung: VerschluesselungsEinstellungen,
    /// Policy-Vorgabe fuer den allerersten Start
    ///
    /// Greift nur, solange der Vault noch keine persistierte Policy
    /// traegt; danach gewinnt immer der persistierte Stand.
    pub policy: Option<SecurityPolicy>,
    /// Audit-Einstellungen
    pub audit: AuditEinstellungen,
    /// Logging-Einstellungen
    pub logging: LoggingEinstellungen,
}

/// Vault-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultEinstellungen {
    /// Basisverzeichnis des Datei-Backends
    pub pfad: String,
}

impl Default for VaultEinstellungen {
    fn default() -> Self {
        Self {
            pfad: "fluester-vault".into(),
        }
    }
}

/// Einstellungen fuer die Stream-Verschluesselung
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerschluesselungsEinstellungen {
    /// Modus: "disabled", "end-to-end", "server-side" oder "hybrid"
    pub modus: String,
    /// Oeffentlicher Escrow-Schluessel des Servers, Base64-kodiert
    /// (Pflicht fuer "server-side" und "hybrid")
    pub server_public_key: Option<String>,
}

impl Default for VerschluesselungsEinstellungen {
    fn default() -> Self {
        Self {
            modus: "end-to-end".into(),
            server_public_key: None,
        }
    }
}

/// Audit-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditEinstellungen {
    /// Rotationsintervall des Audit-Logs in Stunden (mindestens 1)
    pub rotation_intervall_stunden: u64,
}

impl Default for AuditEinstellungen {
    fn default() -> Self {
        Self {
            rotation_intervall_stunden: 24,
        }
    }
}

/// Logging-Einstellungen
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingEinstellungen {
    /// Log-Level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Format: "json" oder "text"
    pub format: String,
}

impl Default for LoggingEinstellungen {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "text".into(),
        }
    }
}

impl DaemonConfig {
    /// Laedt die Konfiguration aus einer TOML-Datei.
    /// Gibt die Standardkonfiguration zurueck wenn die Datei nicht existiert.
    pub fn laden(pfad: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(pfad) {
            Ok(inhalt) => {
                let config: Self = toml::from_str(&inhalt)
                    .map_err(|e| anyhow::anyhow!("Konfigurationsfehler in '{pfad}': {e}"))?;
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(
                    pfad = pfad,
                    "Konfigurationsdatei nicht gefunden, verwende Standardwerte"
                );
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::anyhow!(
                "Konfigurationsdatei '{pfad}' nicht lesbar: {e}"
            )),
        }
    }

    /// Prueft die Konfiguration auf Widersprueche
    pub fn pruefen(&self) -> anyhow::Result<()> {
        if !log_level_gueltig(&self.logging.level) {
            anyhow::bail!("Unbekannter Log-Level: '{}'", self.logging.level);
        }
        if !log_format_gueltig(&self.logging.format) {
            anyhow::bail!("Unbekanntes Log-Format: '{}'", self.logging.format);
        }
        if self.audit.rotation_intervall_stunden == 0 {
            anyhow::bail!("audit.rotation_intervall_stunden muss mindestens 1 sein");
        }

        let modus = self.modus()?;
        if modus.verpackt_fuer_server() && self.verschluesselung.server_public_key.is_none() {
            anyhow::bail!(
                "Modus '{}' braucht verschluesselung.server_public_key",
                modus
            );
        }
        self.server_schluessel()?;
        Ok(())
    }

    /// Der konfigurierte Stream-Modus
    pub fn modus(&self) -> anyhow::Result<EncryptionMode> {
        self.verschluesselung
            .modus
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
    }

    /// Der dekodierte Server-Escrow-Schluessel, falls konfiguriert
    pub fn server_schluessel(&self) -> anyhow::Result<Option<Vec<u8>>> {
        match &self.verschluesselung.server_public_key {
            None => Ok(None),
            Some(b64) => {
                let roh = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, b64)
                    .map_err(|e| {
                        anyhow::anyhow!("verschluesselung.server_public_key ist kein Base64: {e}")
                    })?;
                Ok(Some(roh))
            }
        }
    }

    /// Rotationsintervall des Audit-Logs als Duration
    pub fn rotations_intervall(&self) -> Duration {
        Duration::from_secs(self.audit.rotation_intervall_stunden * 60 * 60)
    }
}
