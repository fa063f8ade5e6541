//! fluester-protocol – Paket-Vertrag des Sicherheits-Subsystems
//!
//! Dieses Crate definiert die Typen, die zwischen dem Sicherheits-Subsystem
//! und der Anwendungs-Shell ausgetauscht werden: Stream-Pakete und den
//! Verschluesselungsmodus.

pub mod mode;
pub mod stream;

pub use mode::EncryptionMode;
pub use stream::{EncryptedStreamPacket, StreamAlgorithm, StreamMetadata, StreamPacket};
