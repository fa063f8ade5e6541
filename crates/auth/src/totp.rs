//! Zeitbasierte Einmalcodes nach RFC 6238 (TOTP)
//!
//! HMAC-SHA1 ueber den 30-Sekunden-Zeitschritt mit dynamischer
//! Truncation nach RFC 4226. Secrets sind Base32-kodiert, wie sie
//! Authenticator-Apps erwarten.

use hmac::{Hmac, Mac};
use rand::RngCore;
use sha1::Sha1;

use crate::error::{AuthError, AuthResult};

type HmacSha1 = Hmac<Sha1>;

/// Zeitschritt in Millisekunden
pub const TOTP_SCHRITT_MS: i64 = 30_000;

/// Anzahl der Code-Stellen
pub const TOTP_STELLEN: usize = 6;

/// Secret-Laenge in Bytes (160 Bit, wie von RFC 4226 empfohlen)
const SECRET_LAENGE: usize = 20;

/// Generiert ein frisches Base32-Secret
pub fn secret_generieren() -> String {
    let mut bytes = [0u8; SECRET_LAENGE];
    rand::thread_rng().fill_bytes(&mut bytes);
    data_encoding::BASE32_NOPAD.encode(&bytes)
}

/// Berechnet den Code fuer einen Zeitpunkt (Unix-Millisekunden)
pub fn code_berechnen(secret_b32: &str, unix_ms: i64) -> AuthResult<String> {
    let schluessel = secret_dekodieren(secret_b32)?;
    let schritt = unix_ms.div_euclid(TOTP_SCHRITT_MS) as u64;

    let mut mac = HmacSha1::new_from_slice(&schluessel)
        .map_err(|e| AuthError::UngueltigesSecret(e.to_string()))?;
    mac.update(&schritt.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    // Dynamische Truncation nach RFC 4226 Abschnitt 5.3
    let offset = (digest[19] & 0x0f) as usize;
    let binaer = u32::from_be_bytes([
        digest[offset] & 0x7f,
        digest[offset + 1],
        digest[offset + 2],
        digest[offset + 3],
    ]);
    let code = binaer % 10u32.pow(TOTP_STELLEN as u32);

    Ok(format!("{code:0stellen$}", stellen = TOTP_STELLEN))
}

/// Prueft einen Code mit einem Toleranzfenster von +/- einem Zeitschritt
pub fn code_pruefen(secret_b32: &str, code: &str, unix_ms: i64) -> AuthResult<bool> {
    let eingabe = code.trim();
    for versatz in [-1i64, 0, 1] {
        let erwartet = code_berechnen(secret_b32, unix_ms + versatz * TOTP_SCHRITT_MS)?;
        if erwartet == eingabe {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Baut die otpauth-URI fuer Authenticator-Apps
pub fn otpauth_uri(secret_b32: &str, konto: &str, aussteller: &str) -> String {
    format!(
        "otpauth://totp/{aussteller}:{konto}?secret={secret}&issuer={aussteller}&algorithm=SHA1&digits={stellen}&period=30",
        aussteller = url_kodieren(aussteller),
        konto = url_kodieren(konto),
        secret = secret_b32,
        stellen = TOTP_STELLEN,
    )
}

/// Dekodiert ein Base32-Secret (tolerant gegen Kleinschreibung,
/// Leerzeichen und Padding)
fn secret_dekodieren(secret_b32: &str) -> AuthResult<Vec<u8>> {
    let normalisiert: String = secret_b32
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    data_encoding::BASE32_NOPAD
        .decode(normalisiert.as_bytes())
        .map_err(|e| AuthError::UngueltigesSecret(e.to_string()))
}

fn url_kodieren(wert: &str) -> String {
    let mut kodiert = String::with_capacity(wert.len());
    for byte in wert.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                kodiert.push(byte as char);
            }
            _ => kodiert.push_str(&format!("%{byte:02X}")),
        }
    }
    kodiert
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
