//! fluester-vault – Credential-Store-Abstraktion
//!
//! In Produktion liegt sicherheitskritisches Material (private Schluessel,
//! Policy, Audit-Archive) im plattformgesicherten Speicher der
//! Anwendungs-Shell (Keychain-Klasse). Dieses Crate definiert die
//! Schnittstelle dazu und liefert zwei Backends:
//!
//! - [`MemoryVault`] fuer Tests und fluechtige Laeufe
//! - [`FileVault`] als Datei-Fallback fuer Plattformen ohne Keychain-Bruecke

pub mod error;
pub mod file;
pub mod memory;
pub mod store;

pub use error::{VaultError, VaultResult};
pub use file::FileVault;
pub use memory::MemoryVault;
pub use store::{CredentialStore, VaultScope};
