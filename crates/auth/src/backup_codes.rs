//! Einmal-Backup-Codes fuer die Zwei-Faktor-Wiederherstellung
//!
//! Codes werden nur gehasht gespeichert (Argon2id); der Klartext ist
//! ausschliesslich im Einrichtungs-Ergebnis sichtbar.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params, Version,
};
use rand::Rng;

use crate::error::{AuthError, AuthResult};

/// Anzahl der Codes pro Einrichtung
pub const BACKUP_CODE_ANZAHL: usize = 10;

/// Zeichenvorrat ohne verwechselbare Zeichen (kein i, l, o, 0, 1)
const ALPHABET: &[u8] = b"abcdefghjkmnpqrstuvwxyz23456789";

/// Argon2id-Parameter fuer das Code-Hashing
///
/// Werte gemaess OWASP-Empfehlungen (Stand 2024):
/// - Speicher: 64 MiB
/// - Iterationen: 3
/// - Parallelismus: 1
fn argon2_instanz() -> Argon2<'static> {
    let params = Params::new(
        64 * 1024, // m_cost: 64 MiB
        3,         // t_cost: 3 Iterationen
        1,         // p_cost: 1 Thread
        None,      // output_len: Standard (32 Bytes)
    )
    .expect("Argon2-Parameter ungueltig");

    Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params)
}

/// Generiert einen Satz frischer Backup-Codes im Format `xxxx-xxxx`
pub fn generieren() -> Vec<String> {
    let mut rng = rand::thread_rng();
    (0..BACKUP_CODE_ANZAHL)
        .map(|_| {
            let zeichen: Vec<char> = (0..8)
                .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
                .collect();
            format!(
                "{}-{}",
                zeichen[..4].iter().collect::<String>(),
                zeichen[4..].iter().collect::<String>()
            )
        })
        .collect()
}

/// Hasht einen Backup-Code mit Argon2id und zufaelligem Salt
///
/// Gibt den PHC-String zurueck (inkl. Algorithmus, Parameter und Salt).
pub fn hashen(code: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    argon2_instanz()
        .hash_password(normalisieren(code).as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Prueft einen Code gegen einen gespeicherten PHC-Hash
pub fn pruefen(code: &str, hash: &str) -> AuthResult<bool> {
    let geparst =
        PasswordHash::new(hash).map_err(|e| AuthError::Hashing(format!("Ungueltiges Hash-Format: {e}")))?;

    match argon2_instanz().verify_password(normalisieren(code).as_bytes(), &geparst) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::Hashing(e.to_string())),
    }
}

/// Eingaben tolerant behandeln: Gross-/Kleinschreibung und Raender
fn normalisieren(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generieren_liefert_formatierte_codes() {
        let codes = generieren();
        assert_eq!(codes.len(), BACKUP_CODE_ANZAHL);

        for code in &codes {
            assert_eq!(code.len(), 9);
            assert_eq!(code.as_bytes()[4], b'-');
            for teil in code.split('-') {
                assert_eq!(teil.len(), 4);
                assert!(teil.bytes().all(|b| ALPHABET.contains(&b)));
            }
        }

        let eindeutig: HashSet<&String> = codes.iter().collect();
        assert_eq!(eindeutig.len(), codes.len(), "Codes muessen eindeutig sein");
    }

    #[test]
    fn hashen_und_pruefen() {
        let code = "abcd-ef23";
        let hash = hashen(code).expect("Hashing fehlgeschlagen");
        assert!(hash.starts_with("$argon2id$"));

        assert!(pruefen(code, &hash).unwrap());
        assert!(!pruefen("abcd-ef24", &hash).unwrap());
    }

    #[test]
    fn eingabe_wird_normalisiert() {
        let hash = hashen("abcd-ef23").unwrap();
        assert!(pruefen("  ABCD-EF23  ", &hash).unwrap());
    }

    #[test]
    fn gleicher_code_verschiedene_hashes() {
        let hash1 = hashen("abcd-ef23").unwrap();
        let hash2 = hashen("abcd-ef23").unwrap();
        assert_ne!(hash1, hash2, "Salt muss variieren");
    }

    #[test]
    fn kaputtes_hash_format_gibt_fehler() {
        let ergebnis = pruefen("abcd-ef23", "kein_phc_string");
        assert!(matches!(ergebnis, Err(AuthError::Hashing(_))));
    }
}
