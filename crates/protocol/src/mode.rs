//! Verschluesselungsmodus fuer ausgehende Audio-Streams
//!
//! ## Design
//! - `Disabled`: explizites Opt-out, Pakete verlassen das Subsystem als Klartext
//! - `EndToEnd`: Stream-Schluessel wird pro Empfaenger einzeln verpackt
//! - `ServerSide` / `Hybrid`: Deployment-Hook, der zusaetzlich (oder
//!   ausschliesslich) fuer einen Server-Escrow-Schluessel verpackt.
//!   Das Paketformat bleibt in allen Modi identisch.

use serde::{Deserialize, Serialize};

/// Verschluesselungsmodus eines ausgehenden Audio-Streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EncryptionMode {
    /// Keine Verschluesselung (nur fuer Tests/Diagnose)
    Disabled,
    /// End-to-End Verschluesselung, Schluessel pro Empfaenger verpackt
    #[default]
    EndToEnd,
    /// Schluessel wird nur fuer den Server-Escrow verpackt
    ServerSide,
    /// End-to-End plus Server-Escrow
    Hybrid,
}

impl EncryptionMode {
    /// True wenn Pakete in diesem Modus verschluesselt werden
    pub fn ist_aktiv(&self) -> bool {
        !matches!(self, EncryptionMode::Disabled)
    }

    /// True wenn der Stream-Schluessel pro Empfaenger verpackt wird
    pub fn verpackt_fuer_empfaenger(&self) -> bool {
        matches!(self, EncryptionMode::EndToEnd | EncryptionMode::Hybrid)
    }

    /// True wenn der Stream-Schluessel fuer den Server-Escrow verpackt wird
    pub fn verpackt_fuer_server(&self) -> bool {
        matches!(self, EncryptionMode::ServerSide | EncryptionMode::Hybrid)
    }
}

impl std::fmt::Display for EncryptionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncryptionMode::Disabled => write!(f, "disabled"),
            EncryptionMode::EndToEnd => write!(f, "end-to-end"),
            EncryptionMode::ServerSide => write!(f, "server-side"),
            EncryptionMode::Hybrid => write!(f, "hybrid"),
        }
    }
}

impl std::str::FromStr for EncryptionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "disabled" => Ok(Self::Disabled),
            "end-to-end" => Ok(Self::EndToEnd),
            "server-side" => Ok(Self::ServerSide),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(format!("Unbekannter EncryptionMode: '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
