//! fluester-auth – Zwei-Faktor-Authentifizierung und Sicherheits-Policy
//!
//! Dieses Crate implementiert:
//! - TOTP nach RFC 6238 (HMAC-SHA1, 30s-Schritt, 6 Stellen)
//! - Zwei-Faktor-Einrichtung und -Verifikation fuer sechs Methoden
//! - Einmal-Backup-Codes mit Argon2id-Hashing
//! - SecurityPolicy (Wire-Format, Validierung, Vault-Persistenz)
//! - LockoutService (Kontosperren nach Fehlversuchen)

pub mod backup_codes;
pub mod error;
pub mod lockout;
pub mod method;
pub mod policy;
pub mod service;
pub mod totp;

// Bequeme Re-Exporte
pub use error::{AuthError, AuthResult};
pub use lockout::{LockoutService, LockoutStatus};
pub use method::ZweiFaktorMethode;
pub use policy::{
    PolicyAenderung, PolicyFeld, PolicyStore, PolicyWert, SecurityPolicy, POLICY_EINTRAG,
};
pub use service::{
    AblehnenderDelegat, ChallengeDelegat, EinmalcodeAusgabe, SetupDetails, ZweiFaktorEintrag,
    ZweiFaktorService, ZweiFaktorSetup, ZweiFaktorStatistik,
};
