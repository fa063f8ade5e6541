//! fluester-daemon – Bibliotheks-Root
//!
//! Verdrahtet das Sicherheits-Subsystem aus der Konfiguration und
//! stellt den Einstiegspunkt fuer Integrationstests bereit.

pub mod config;

use std::sync::Arc;

use anyhow::Result;

use fluester_audit::rotation_starten;
use fluester_auth::AblehnenderDelegat;
use fluester_manager::SecurityManager;
use fluester_vault::FileVault;

use config::DaemonConfig;

/// Haelt den laufenden Daemon-Zustand zusammen
pub struct Daemon {
    pub config: DaemonConfig,
}

impl Daemon {
    /// Erstellt einen neuen Daemon aus der gegebenen Konfiguration
    pub fn neu(config: DaemonConfig) -> Self {
        Self { config }
    }

    /// Startet das Sicherheits-Subsystem und laeuft bis zum Shutdown-Signal
    ///
    /// Reihenfolge:
    /// 1. Vault oeffnen
    /// 2. Security-Manager errichten (Master-Key, Policy, Dienste)
    /// 3. Server-Escrow-Schluessel registrieren (falls konfiguriert)
    /// 4. Audit-Rotation starten
    /// 5. Auf Ctrl-C / SIGTERM warten
    pub async fn starten(self) -> Result<()> {
        self.config.pruefen()?;
        let modus = self.config.modus()?;

        tracing::info!(
            vault = %self.config.vault.pfad,
            modus = %modus,
            "Sicherheits-Subsystem startet"
        );

        let vault = Arc::new(FileVault::new(self.config.vault.pfad.clone()));

        // Die [policy]-Vorgabe greift nur, solange der Vault noch keine
        // persistierte Policy traegt
        let manager = SecurityManager::mit_modus(
            vault.clone(),
            Arc::new(AblehnenderDelegat),
            self.config.policy.clone(),
            modus,
        )
        .await?;

        if let Some(schluessel) = self.config.server_schluessel()? {
            manager.server_schluessel_setzen(&schluessel)?;
            tracing::info!("Server-Escrow-Schluessel registriert");
        }

        rotation_starten(
            manager.audit_log(),
            vault.clone(),
            self.config.rotations_intervall(),
        );
        tracing::info!(
            intervall_stunden = self.config.audit.rotation_intervall_stunden,
            "Audit-Rotation bereit"
        );

        tracing::info!("Daemon laeuft. Warte auf Shutdown-Signal (Ctrl-C)...");
        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown-Signal empfangen, Daemon wird beendet");

        // Restliche Audit-Eintraege vor dem Beenden in den Vault sichern
        if let Some(schluessel) = manager.audit_rotieren().await? {
            tracing::info!(schluessel = %schluessel, "Audit-Log beim Beenden archiviert");
        }

        Ok(())
    }
}
