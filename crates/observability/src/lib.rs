//! # fluester-observability
//!
//! Structured Logging fuer Fluester via tracing-subscriber.
//!
//! Das Audit-Log des Sicherheits-Subsystems laeuft getrennt davon;
//! hier geht es nur um Betriebs-Logs.

pub mod logging;

pub use logging::{
    log_format_aus_env, log_format_gueltig, log_level_aus_env, log_level_gueltig,
    logging_initialisieren,
};
