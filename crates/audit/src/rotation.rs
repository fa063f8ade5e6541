//! Periodische Rotation des Audit-Logs

use std::sync::Arc;
use std::time::Duration;

use fluester_vault::CredentialStore;

use crate::log::AuditLog;

/// Standard-Rotationsintervall: 24 Stunden
pub const ROTATION_INTERVALL_STANDARD: Duration = Duration::from_secs(24 * 60 * 60);

/// Startet den periodischen Rotations-Task fuer das Audit-Log.
///
/// Muss innerhalb einer tokio-Runtime aufgerufen werden. Der Task laeuft
/// auf einem eigenen Thread, da async_fn_in_trait keine Send-Garantie
/// fuer die Vault-Futures bietet.
pub fn rotation_starten<V: CredentialStore + 'static>(
    log: Arc<AuditLog>,
    vault: Arc<V>,
    intervall: Duration,
) {
    let handle = tokio::runtime::Handle::current();
    std::thread::spawn(move || {
        handle.block_on(async move {
            loop {
                tokio::time::sleep(intervall).await;
                match log.rotieren(vault.as_ref()).await {
                    Ok(Some(schluessel)) => {
                        tracing::info!(schluessel = %schluessel, "Audit-Log archiviert");
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::error!("Fehler bei der Audit-Rotation: {}", e);
                    }
                }
            }
        });
    });
}
