//! Unterstuetzte Zwei-Faktor-Methoden

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Eine Zwei-Faktor-Methode
///
/// Die Wire-Namen sind snake_case und identisch zu den Strings, die
/// Clients bei `enable2FA`/`verify2FA` uebergeben.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZweiFaktorMethode {
    /// Zeitbasierte Einmalcodes (RFC 6238)
    Totp,
    /// Einmalcode per SMS
    Sms,
    /// Einmalcode per E-Mail
    Email,
    /// Bestaetigung auf einem gekoppelten Geraet
    Push,
    /// FIDO/U2F-Token
    HardwareKey,
    /// Plattform-Biometrie
    Biometric,
}

impl ZweiFaktorMethode {
    /// Alle Methoden in Wire-Reihenfolge
    pub fn alle() -> [ZweiFaktorMethode; 6] {
        [
            Self::Totp,
            Self::Sms,
            Self::Email,
            Self::Push,
            Self::HardwareKey,
            Self::Biometric,
        ]
    }

    /// Braucht die Methode bei der Einrichtung eine Kontaktadresse?
    pub fn braucht_kontakt(&self) -> bool {
        matches!(self, Self::Sms | Self::Email)
    }

    /// Wird die Verifikation an einen externen Bestaetiger delegiert?
    pub fn ist_challenge_basiert(&self) -> bool {
        matches!(self, Self::Push | Self::HardwareKey | Self::Biometric)
    }
}

impl fmt::Display for ZweiFaktorMethode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Totp => "totp",
            Self::Sms => "sms",
            Self::Email => "email",
            Self::Push => "push",
            Self::HardwareKey => "hardware_key",
            Self::Biometric => "biometric",
        };
        write!(f, "{name}")
    }
}

impl FromStr for ZweiFaktorMethode {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "totp" => Ok(Self::Totp),
            "sms" => Ok(Self::Sms),
            "email" => Ok(Self::Email),
            "push" => Ok(Self::Push),
            "hardware_key" => Ok(Self::HardwareKey),
            "biometric" => Ok(Self::Biometric),
            andere => Err(AuthError::MethodeNichtUnterstuetzt(andere.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_namen_stabil() {
        for methode in ZweiFaktorMethode::alle() {
            let json = serde_json::to_string(&methode).unwrap();
            assert_eq!(json, format!("\"{methode}\""));

            let geparst: ZweiFaktorMethode = methode.to_string().parse().unwrap();
            assert_eq!(geparst, methode);
        }
        assert_eq!(
            serde_json::to_string(&ZweiFaktorMethode::HardwareKey).unwrap(),
            "\"hardware_key\""
        );
    }

    #[test]
    fn unbekannte_methode_ergibt_fehler() {
        let ergebnis = "fingerabdruck".parse::<ZweiFaktorMethode>();
        assert!(matches!(
            ergebnis,
            Err(AuthError::MethodeNichtUnterstuetzt(m)) if m == "fingerabdruck"
        ));
    }

    #[test]
    fn kontakt_und_challenge_einteilung() {
        assert!(ZweiFaktorMethode::Sms.braucht_kontakt());
        assert!(ZweiFaktorMethode::Email.braucht_kontakt());
        assert!(!ZweiFaktorMethode::Totp.braucht_kontakt());

        assert!(ZweiFaktorMethode::Push.ist_challenge_basiert());
        assert!(ZweiFaktorMethode::HardwareKey.ist_challenge_basiert());
        assert!(ZweiFaktorMethode::Biometric.ist_challenge_basiert());
        assert!(!ZweiFaktorMethode::Sms.ist_challenge_basiert());
    }
}
