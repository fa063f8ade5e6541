//! Zusammenfassender Sicherheitsstatus (`getSecurityStatus`)

use serde::Serialize;

use fluester_audit::AuditEintrag;
use fluester_auth::{SecurityPolicy, ZweiFaktorStatistik};
use fluester_protocol::{EncryptionMode, StreamAlgorithm};

/// Momentaufnahme des gesamten Sicherheits-Subsystems
#[derive(Debug, Clone, Serialize)]
pub struct SecurityStatus {
    pub verschluesselung: VerschluesselungsStatus,
    pub zwei_faktor: ZweiFaktorStatus,
    pub policy: SecurityPolicy,
    pub audit: AuditStatus,
    pub bedrohungen: BedrohungsStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerschluesselungsStatus {
    /// Werden Streams aktuell verschluesselt?
    pub aktiv: bool,
    pub modus: EncryptionMode,
    pub algorithm: StreamAlgorithm,
    /// Gegenstellen mit registriertem oeffentlichen Schluessel
    pub registrierte_schluessel: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZweiFaktorStatus {
    /// Verlangt die Policy 2FA fuer alle?
    pub erzwungen: bool,
    #[serde(flatten)]
    pub statistik: ZweiFaktorStatistik,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditStatus {
    pub aktiv: bool,
    pub eintraege_gesamt: usize,
    /// Die juengsten Eintraege, absteigend sortiert
    pub letzte_eintraege: Vec<AuditEintrag>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BedrohungsStatus {
    pub gesperrte_konten: usize,
    pub beobachtete_konten: usize,
}
