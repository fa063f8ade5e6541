//! Fluester Sicherheits-Daemon – Einstiegspunkt
//!
//! Laedt die Konfiguration, initialisiert das Logging und startet das
//! Sicherheits-Subsystem.

use anyhow::Result;
use fluester_daemon::{config::DaemonConfig, Daemon};
use fluester_observability::logging_initialisieren;

#[tokio::main]
async fn main() -> Result<()> {
    // Konfigurationsdatei-Pfad aus Umgebungsvariable oder Standard
    let config_pfad =
        std::env::var("FLUESTER_CONFIG").unwrap_or_else(|_| "fluester.toml".into());

    // Konfiguration laden (Standardwerte falls Datei fehlt)
    let config = DaemonConfig::laden(&config_pfad)?;

    // Logging initialisieren
    logging_initialisieren(&config.logging.level, &config.logging.format);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_pfad,
        "Fluester Sicherheits-Daemon wird initialisiert"
    );

    // Subsystem starten
    let daemon = Daemon::neu(config);
    daemon.starten().await?;

    Ok(())
}
