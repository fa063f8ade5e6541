//! fluester-audit – Append-only Audit-Log
//!
//! Sicherheitsrelevante Ereignisse landen in einem In-Memory-Log, das
//! abgefragt und periodisch destruktiv in den Credential-Store rotiert
//! wird. Der Langzeit-Speicher ist das Archiv, nicht das Live-Log.

pub mod error;
pub mod log;
pub mod rotation;

pub use error::{AuditError, AuditResult};
pub use log::{ereignis, AuditEintrag, AuditFilter, AuditLog, ARCHIV_PRAEFIX};
pub use rotation::{rotation_starten, ROTATION_INTERVALL_STANDARD};
