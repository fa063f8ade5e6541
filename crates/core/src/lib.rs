//! fluester-core – Gemeinsame Typen
//!
//! Dieses Crate stellt die Bausteine bereit, die von allen anderen
//! Fluester-Crates gemeinsam genutzt werden.

pub mod types;

// Re-Exporte fuer bequemen Zugriff
pub use types::UserId;
