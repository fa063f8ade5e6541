//! Gemeinsame Identifikationstypen fuer Fluester
//!
//! Benutzer-IDs vergibt die Anwendungs-Shell als Strings. Das
//! Newtype-Pattern schliesst Verwechslungen mit anderen String-Werten
//! zur Compilezeit aus.

use serde::{Deserialize, Serialize};

/// Eindeutige Benutzer-ID
///
/// Dient unter anderem als Schluessel in der `wrappedKeys`-Map eines
/// verschluesselten Stream-Pakets und serialisiert deshalb als
/// blanker JSON-String.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Erstellt eine UserId aus einem beliebigen String-Wert
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Gibt die ID als &str zurueck
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
