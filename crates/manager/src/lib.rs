//! fluester-manager – die Fassade ueber das Sicherheits-Subsystem
//!
//! Dieses Crate verdrahtet Vault, Stream-Verschluesselung, Zwei-Faktor,
//! Policy, Lockout und Audit-Log zu einer Oberflaeche mit den
//! Operationen, die die Anwendungs-Shell aufruft.

pub mod error;
pub mod manager;
pub mod status;

// Bequeme Re-Exporte
pub use error::{ManagerError, ManagerResult};
pub use manager::SecurityManager;
pub use status::{
    AuditStatus, BedrohungsStatus, SecurityStatus, VerschluesselungsStatus, ZweiFaktorStatus,
};
