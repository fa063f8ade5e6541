//! Integration-Tests fuer Zwei-Faktor und Lockout ueber die Fassade

use std::sync::Arc;

use fluester_audit::{ereignis, AuditFilter};
use fluester_auth::{AblehnenderDelegat, AuthError, SecurityPolicy, SetupDetails};
use fluester_core::UserId;
use fluester_manager::{ManagerError, SecurityManager};
use fluester_vault::MemoryVault;

async fn manager_mit_schwelle(
    max_versuche: u32,
) -> Arc<SecurityManager<MemoryVault, AblehnenderDelegat>> {
    let vorgabe = SecurityPolicy {
        max_failed_attempts: max_versuche,
        ..SecurityPolicy::default()
    };
    SecurityManager::neu(
        Arc::new(MemoryVault::new()),
        Arc::new(AblehnenderDelegat),
        Some(vorgabe),
    )
    .await
    .expect("Manager konnte nicht erstellt werden")
}

fn totp_secret(setup: &fluester_auth::ZweiFaktorSetup) -> String {
    match &setup.details {
        SetupDetails::Totp { secret, .. } => secret.clone(),
        andere => panic!("TOTP-Details erwartet, bekam {andere:?}"),
    }
}

/// Sechs Ziffern, die in keinem der drei Zeitfenster gueltig sind
fn falscher_totp_code(secret: &str) -> String {
    let jetzt = chrono::Utc::now().timestamp_millis();
    let verboten: Vec<String> = [-1i64, 0, 1]
        .iter()
        .map(|d| {
            fluester_auth::totp::code_berechnen(
                secret,
                jetzt + d * fluester_auth::totp::TOTP_SCHRITT_MS,
            )
            .unwrap()
        })
        .collect();
    (0..1_000_000)
        .map(|n| format!("{n:06}"))
        .find(|kandidat| !verboten.contains(kandidat))
        .unwrap()
}

#[tokio::test]
async fn totp_einrichten_und_verifizieren() {
    let manager = manager_mit_schwelle(5).await;
    let alice = UserId::new("alice");

    let setup = manager
        .zwei_faktor_aktivieren(&alice, "totp", None)
        .await
        .unwrap();
    let secret = totp_secret(&setup);

    let code =
        fluester_auth::totp::code_berechnen(&secret, chrono::Utc::now().timestamp_millis())
            .unwrap();
    assert!(manager
        .zwei_faktor_verifizieren(&alice, "totp", &code)
        .await
        .unwrap());

    let verifiziert = manager
        .audit_abfragen(&AuditFilter {
            action: Some(ereignis::AKTION_2FA_VERIFIZIERT.to_string()),
            ..AuditFilter::default()
        })
        .await;
    assert_eq!(verifiziert.len(), 1);
}

#[tokio::test]
async fn totp_code_bleibt_im_fenster_gueltig() {
    let manager = manager_mit_schwelle(5).await;
    let alice = UserId::new("alice");

    let setup = manager
        .zwei_faktor_aktivieren(&alice, "totp", None)
        .await
        .unwrap();
    let secret = totp_secret(&setup);

    // Anders als Backup-Codes wird ein TOTP-Code nicht verbraucht;
    // erst der Fensterwechsel macht ihn wertlos
    let code =
        fluester_auth::totp::code_berechnen(&secret, chrono::Utc::now().timestamp_millis())
            .unwrap();
    assert!(manager
        .zwei_faktor_verifizieren(&alice, "totp", &code)
        .await
        .unwrap());
    assert!(manager
        .zwei_faktor_verifizieren(&alice, "totp", &code)
        .await
        .unwrap());
}

#[tokio::test]
async fn konto_wird_nach_fehlversuchen_gesperrt() {
    let manager = manager_mit_schwelle(3).await;
    let alice = UserId::new("alice");

    let setup = manager
        .zwei_faktor_aktivieren(&alice, "totp", None)
        .await
        .unwrap();
    let secret = totp_secret(&setup);

    for _ in 0..3 {
        let gueltig = manager
            .zwei_faktor_verifizieren(&alice, "totp", &falscher_totp_code(&secret))
            .await
            .unwrap();
        assert!(!gueltig);
    }

    // Ab jetzt wird gar nicht mehr geprueft, auch nicht mit dem
    // korrekten Code
    let code =
        fluester_auth::totp::code_berechnen(&secret, chrono::Utc::now().timestamp_millis())
            .unwrap();
    let ergebnis = manager.zwei_faktor_verifizieren(&alice, "totp", &code).await;
    assert!(matches!(
        ergebnis,
        Err(ManagerError::KontoGesperrt { user_id }) if user_id == "alice"
    ));

    let gesperrt = manager
        .audit_abfragen(&AuditFilter {
            action: Some(ereignis::AKTION_KONTO_GESPERRT.to_string()),
            ..AuditFilter::default()
        })
        .await;
    assert_eq!(gesperrt.len(), 1);

    let status = manager.sicherheitsstatus().await;
    assert_eq!(status.bedrohungen.gesperrte_konten, 1);
}

#[tokio::test]
async fn erfolg_setzt_fehlversuche_zurueck() {
    let manager = manager_mit_schwelle(3).await;
    let alice = UserId::new("alice");

    let setup = manager
        .zwei_faktor_aktivieren(&alice, "totp", None)
        .await
        .unwrap();
    let secret = totp_secret(&setup);

    manager
        .zwei_faktor_verifizieren(&alice, "totp", &falscher_totp_code(&secret))
        .await
        .unwrap();
    manager
        .zwei_faktor_verifizieren(&alice, "totp", &falscher_totp_code(&secret))
        .await
        .unwrap();

    let code =
        fluester_auth::totp::code_berechnen(&secret, chrono::Utc::now().timestamp_millis())
            .unwrap();
    assert!(manager
        .zwei_faktor_verifizieren(&alice, "totp", &code)
        .await
        .unwrap());

    let status = manager.sicherheitsstatus().await;
    assert_eq!(status.bedrohungen.beobachtete_konten, 0);
    assert_eq!(status.bedrohungen.gesperrte_konten, 0);
}

#[tokio::test]
async fn backup_code_ueber_wire_namen() {
    let manager = manager_mit_schwelle(5).await;
    let alice = UserId::new("alice");

    let setup = manager
        .zwei_faktor_aktivieren(&alice, "totp", None)
        .await
        .unwrap();
    let code = setup.backup_codes[0].clone();

    assert!(manager
        .zwei_faktor_verifizieren(&alice, "backup_code", &code)
        .await
        .unwrap());
    // Zweiter Versuch mit demselben Code zaehlt als Fehlversuch
    assert!(!manager
        .zwei_faktor_verifizieren(&alice, "backup_code", &code)
        .await
        .unwrap());
}

#[tokio::test]
async fn unbekannte_methode_wird_abgelehnt() {
    let manager = manager_mit_schwelle(5).await;
    let alice = UserId::new("alice");

    let ergebnis = manager
        .zwei_faktor_aktivieren(&alice, "rauchzeichen", None)
        .await;
    assert!(matches!(
        ergebnis,
        Err(ManagerError::Auth(AuthError::MethodeNichtUnterstuetzt(m))) if m == "rauchzeichen"
    ));
}

#[tokio::test]
async fn sms_einrichtung_braucht_kontakt() {
    let manager = manager_mit_schwelle(5).await;
    let bob = UserId::new("bob");

    let ergebnis = manager.zwei_faktor_aktivieren(&bob, "sms", None).await;
    assert!(matches!(
        ergebnis,
        Err(ManagerError::Auth(AuthError::KontaktFehlt { .. }))
    ));

    let setup = manager
        .zwei_faktor_aktivieren(&bob, "sms", Some("+4915112345678"))
        .await
        .unwrap();
    let code = match &setup.details {
        SetupDetails::Einmalcode { code, .. } => code.clone(),
        andere => panic!("Einmalcode-Details erwartet, bekam {andere:?}"),
    };
    assert!(manager
        .zwei_faktor_verifizieren(&bob, "sms", &code)
        .await
        .unwrap());
}

#[tokio::test]
async fn deaktivieren_ueber_die_fassade() {
    let manager = manager_mit_schwelle(5).await;
    let alice = UserId::new("alice");

    manager
        .zwei_faktor_aktivieren(&alice, "totp", None)
        .await
        .unwrap();
    manager.zwei_faktor_deaktivieren(&alice).await.unwrap();

    let ergebnis = manager
        .zwei_faktor_verifizieren(&alice, "totp", "123456")
        .await;
    assert!(matches!(
        ergebnis,
        Err(ManagerError::Auth(AuthError::NichtEingerichtet { .. }))
    ));
}

#[tokio::test]
async fn verifikation_ohne_einrichtung_ist_fehler() {
    let manager = manager_mit_schwelle(5).await;
    let ergebnis = manager
        .zwei_faktor_verifizieren(&UserId::new("niemand"), "totp", "123456")
        .await;
    assert!(matches!(
        ergebnis,
        Err(ManagerError::Auth(AuthError::NichtEingerichtet { .. }))
    ));
}
