use std::sync::Arc;

use chrono::{Duration, Utc};
use silica_authority::{AuthorityOptions, LicenseAuthority, Registration};
use silica_core::{AccountStore, AuthError};
use silica_storage_sqlite::SqliteAccountStore;
use tempfile::TempDir;

const ISSUER: &str = "Silica Client";
const SESSION_SECRET: &str = "test-session-secret-at-least-32-chars";

async fn setup() -> (LicenseAuthority<SqliteAccountStore>, Arc<SqliteAccountStore>, TempDir) {
    let tempdir = TempDir::new().unwrap();
    let db_path = tempdir.path().join("test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let store = Arc::new(SqliteAccountStore::connect(&db_url).await.unwrap());
    let authority = LicenseAuthority::new(
        Arc::clone(&store),
        AuthorityOptions {
            issuer: ISSUER.to_string(),
            session_secret: SESSION_SECRET.to_string(),
            session_ttl_hours: 24,
        },
    );
    (authority, store, tempdir)
}

fn otp(reg: &Registration) -> String {
    silica_crypto::current_code(&reg.totp_secret, ISSUER, &reg.email).unwrap()
}

/// Register + activate, the common test preamble.
async fn active_account(
    authority: &LicenseAuthority<SqliteAccountStore>,
    email: &str,
    days: i64,
) -> Registration {
    let reg = authority.register(email, None, None, None).await.unwrap();
    authority.activate(email, days).await.unwrap();
    reg
}

// ── Registration ────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_identity_rejected_case_insensitively() {
    let (authority, _store, _dir) = setup().await;
    authority
        .register("Alice@Example.com", None, None, None)
        .await
        .unwrap();
    let err = authority
        .register("  alice@example.COM ", None, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::DuplicateIdentity), "got: {err}");
}

#[tokio::test]
async fn registration_returns_secret_material_once() {
    let (authority, store, _dir) = setup().await;
    let reg = authority
        .register("new@test.com", Some("discord-7".into()), None, None)
        .await
        .unwrap();
    assert!(!reg.password.is_empty());
    assert!(!reg.totp_secret.is_empty());
    assert!(reg.otp_uri.starts_with("otpauth://totp/"));

    // Stored record holds only the hash, never the plaintext.
    let account = store.get_account("new@test.com").await.unwrap().unwrap();
    assert_ne!(account.password_hash, reg.password);
    assert!(account.password_hash.starts_with("$argon2"));
    assert!(!account.active, "new accounts default to pending");
}

#[tokio::test]
async fn invalid_identity_rejected() {
    let (authority, _store, _dir) = setup().await;
    let err = authority.register("not-an-email", None, None, None).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidArgument(_)));
}

#[tokio::test]
async fn admin_creation_path_activates_immediately() {
    let (authority, _store, _dir) = setup().await;
    let reg = authority
        .register("paid@test.com", None, None, Some(30))
        .await
        .unwrap();
    let token = authority
        .login("paid@test.com", &reg.password, &otp(&reg), Some("HW-1"))
        .await
        .unwrap();
    assert!(!token.is_empty());
}

#[tokio::test]
async fn check_external_ref_reports_existence() {
    let (authority, _store, _dir) = setup().await;
    authority
        .register("ref@test.com", Some("discord-99".into()), None, None)
        .await
        .unwrap();
    assert!(authority.check_external_ref("discord-99").await.unwrap());
    assert!(!authority.check_external_ref("discord-00").await.unwrap());
}

// ── Login gate order ────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_identity_is_invalid_credentials() {
    let (authority, _store, _dir) = setup().await;
    let err = authority
        .login("ghost@test.com", "pw", "000000", Some("HW"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn pending_account_fails_even_with_correct_credentials() {
    let (authority, _store, _dir) = setup().await;
    let reg = authority.register("pending@test.com", None, None, None).await.unwrap();
    let err = authority
        .login("pending@test.com", &reg.password, &otp(&reg), Some("HW"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotActivated));
}

#[tokio::test]
async fn expired_account_fails_before_credential_checks() {
    let (authority, store, _dir) = setup().await;
    let reg = active_account(&authority, "old@test.com", 10).await;
    store
        .update_expiry("old@test.com", Utc::now() - Duration::days(1))
        .await
        .unwrap();

    // Even wrong credentials surface Expired: the gate short-circuits.
    let err = authority
        .login("old@test.com", "wrong", "000000", Some("HW"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Expired));

    let err = authority
        .login("old@test.com", &reg.password, &otp(&reg), Some("HW"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Expired));
}

#[tokio::test]
async fn wrong_password_is_invalid_credentials() {
    let (authority, _store, _dir) = setup().await;
    let reg = active_account(&authority, "pw@test.com", 10).await;
    let err = authority
        .login("pw@test.com", "wrong-password", &otp(&reg), Some("HW"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn wrong_otp_is_invalid_second_factor() {
    let (authority, _store, _dir) = setup().await;
    let reg = active_account(&authority, "otp@test.com", 10).await;
    let err = authority
        .login("otp@test.com", &reg.password, "000000", Some("HW"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidSecondFactor));
}

#[tokio::test]
async fn activate_then_login_succeeds() {
    let (authority, store, _dir) = setup().await;
    let reg = active_account(&authority, "ok@test.com", 10).await;
    let token = authority
        .login("ok@test.com", &reg.password, &otp(&reg), Some("HW-A"))
        .await
        .unwrap();

    let identity = authority.validate_session(&token, "HW-A").await.unwrap();
    assert_eq!(identity, "ok@test.com");

    let account = store.get_account("ok@test.com").await.unwrap().unwrap();
    assert!(account.last_login.is_some());
}

// ── Hardware binding ────────────────────────────────────────────────────

#[tokio::test]
async fn first_login_binds_and_later_hardware_mismatch_rejected() {
    let (authority, store, _dir) = setup().await;
    let reg = active_account(&authority, "bind@test.com", 10).await;

    authority
        .login("bind@test.com", &reg.password, &otp(&reg), Some("HW-A"))
        .await
        .unwrap();
    let first_login = store
        .get_account("bind@test.com")
        .await
        .unwrap()
        .unwrap()
        .last_login
        .unwrap();

    let err = authority
        .login("bind@test.com", &reg.password, &otp(&reg), Some("HW-B"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::HardwareMismatch));

    // Matching hardware id succeeds again and refreshes last_login.
    authority
        .login("bind@test.com", &reg.password, &otp(&reg), Some("HW-A"))
        .await
        .unwrap();
    let account = store.get_account("bind@test.com").await.unwrap().unwrap();
    assert_eq!(account.hwid.as_deref(), Some("HW-A"));
    assert!(account.last_login.unwrap() >= first_login);
}

#[tokio::test]
async fn absent_hardware_id_does_not_bind() {
    let (authority, store, _dir) = setup().await;
    let reg = active_account(&authority, "nohw@test.com", 10).await;

    authority
        .login("nohw@test.com", &reg.password, &otp(&reg), None)
        .await
        .unwrap();
    let account = store.get_account("nohw@test.com").await.unwrap().unwrap();
    assert!(account.hwid.is_none(), "login without hardware id must not bind");

    // Empty string is treated the same as absent.
    authority
        .login("nohw@test.com", &reg.password, &otp(&reg), Some("  "))
        .await
        .unwrap();
    let account = store.get_account("nohw@test.com").await.unwrap().unwrap();
    assert!(account.hwid.is_none());

    // A later login with a real id binds normally.
    authority
        .login("nohw@test.com", &reg.password, &otp(&reg), Some("HW-X"))
        .await
        .unwrap();
    let account = store.get_account("nohw@test.com").await.unwrap().unwrap();
    assert_eq!(account.hwid.as_deref(), Some("HW-X"));
}

#[tokio::test]
async fn bound_account_rejects_absent_hardware_id() {
    let (authority, _store, _dir) = setup().await;
    let reg = active_account(&authority, "strict@test.com", 10).await;
    authority
        .login("strict@test.com", &reg.password, &otp(&reg), Some("HW-A"))
        .await
        .unwrap();
    let err = authority
        .login("strict@test.com", &reg.password, &otp(&reg), None)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::HardwareMismatch));
}

#[tokio::test]
async fn concurrent_first_logins_bind_exactly_once() {
    let (authority, store, _dir) = setup().await;
    let reg = active_account(&authority, "race@test.com", 10).await;
    let code = otp(&reg);

    let (a, b) = tokio::join!(
        authority.login("race@test.com", &reg.password, &code, Some("HW-A")),
        authority.login("race@test.com", &reg.password, &code, Some("HW-B")),
    );

    let bound = store
        .get_account("race@test.com")
        .await
        .unwrap()
        .unwrap()
        .hwid
        .expect("one binding must have won");
    assert!(bound == "HW-A" || bound == "HW-B");

    // The attempt matching the winning binding must have succeeded; the
    // other must have seen a clean mismatch, never a partial state.
    let (winner, loser) = if bound == "HW-A" { (a, b) } else { (b, a) };
    assert!(winner.is_ok(), "winning bind should log in: {winner:?}");
    match loser {
        Ok(_) => panic!("losing bind must not succeed with a different hardware id"),
        Err(err) => assert!(matches!(err, AuthError::HardwareMismatch), "got: {err}"),
    }
}

#[tokio::test]
async fn reset_hardware_allows_rebinding() {
    let (authority, store, _dir) = setup().await;
    let reg = active_account(&authority, "rebind@test.com", 10).await;
    authority
        .login("rebind@test.com", &reg.password, &otp(&reg), Some("HW-A"))
        .await
        .unwrap();

    authority.reset_hardware("rebind@test.com").await.unwrap();

    authority
        .login("rebind@test.com", &reg.password, &otp(&reg), Some("HW-B"))
        .await
        .unwrap();
    let account = store.get_account("rebind@test.com").await.unwrap().unwrap();
    assert_eq!(account.hwid.as_deref(), Some("HW-B"));
}

// ── Duration arithmetic ─────────────────────────────────────────────────

#[tokio::test]
async fn activate_overwrites_rather_than_accumulates() {
    let (authority, _store, _dir) = setup().await;
    authority.register("dur@test.com", None, None, None).await.unwrap();
    authority.activate("dur@test.com", 10).await.unwrap();
    let second = authority.activate("dur@test.com", 5).await.unwrap();

    let expected = Utc::now() + Duration::days(5);
    assert!((second - expected).num_seconds().abs() < 2);
}

#[tokio::test]
async fn activate_validates_input() {
    let (authority, _store, _dir) = setup().await;
    authority.register("val@test.com", None, None, None).await.unwrap();

    let err = authority.activate("val@test.com", 0).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidArgument(_)));
    let err = authority.activate("val@test.com", -3).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidArgument(_)));
    let err = authority.activate("ghost@test.com", 5).await.unwrap_err();
    assert!(matches!(err, AuthError::NotFound));
}

#[tokio::test]
async fn add_then_remove_duration_round_trips() {
    let (authority, _store, _dir) = setup().await;
    authority.register("round@test.com", None, None, None).await.unwrap();
    let original = authority.activate("round@test.com", 30).await.unwrap();

    let added = authority.add_duration("round@test.com", 5).await.unwrap();
    assert!((added.new_expiry - original - Duration::days(5)).num_seconds().abs() < 2);

    let removed = authority.remove_duration("round@test.com", 5).await.unwrap();
    assert!(
        (removed.new_expiry - original).num_milliseconds().abs() <= 1,
        "round trip should restore the original expiry"
    );
}

#[tokio::test]
async fn add_duration_without_expiry_extends_from_now() {
    let (authority, _store, _dir) = setup().await;
    authority.register("fresh@test.com", None, None, None).await.unwrap();
    let change = authority.add_duration("fresh@test.com", 7).await.unwrap();
    let expected = Utc::now() + Duration::days(7);
    assert!((change.new_expiry - expected).num_seconds().abs() < 2);
}

#[tokio::test]
async fn add_duration_does_not_activate() {
    let (authority, store, _dir) = setup().await;
    authority.register("still@test.com", None, None, None).await.unwrap();
    authority.add_duration("still@test.com", 7).await.unwrap();
    let account = store.get_account("still@test.com").await.unwrap().unwrap();
    assert!(!account.active);
}

#[tokio::test]
async fn remove_duration_clamps_at_now() {
    let (authority, _store, _dir) = setup().await;
    authority.register("clamp@test.com", None, None, None).await.unwrap();
    authority.activate("clamp@test.com", 1).await.unwrap();

    let change = authority.remove_duration("clamp@test.com", 100).await.unwrap();
    assert!((change.new_expiry - Utc::now()).num_seconds().abs() < 2);
}

#[tokio::test]
async fn remove_duration_requires_existing_expiry() {
    let (authority, _store, _dir) = setup().await;
    authority.register("noexp@test.com", None, None, None).await.unwrap();
    let err = authority.remove_duration("noexp@test.com", 5).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidArgument(_)));
}

#[tokio::test]
async fn duration_changes_surface_external_ref() {
    let (authority, _store, _dir) = setup().await;
    authority
        .register("notify@test.com", Some("discord-55".into()), None, None)
        .await
        .unwrap();
    authority.activate("notify@test.com", 10).await.unwrap();
    let change = authority.add_duration("notify@test.com", 5).await.unwrap();
    assert_eq!(change.external_ref.as_deref(), Some("discord-55"));
}

// ── Session validation ──────────────────────────────────────────────────

#[tokio::test]
async fn validate_session_is_a_pure_read() {
    let (authority, store, _dir) = setup().await;
    let reg = active_account(&authority, "pure@test.com", 10).await;
    let token = authority
        .login("pure@test.com", &reg.password, &otp(&reg), Some("HW-A"))
        .await
        .unwrap();

    let before = store.get_account("pure@test.com").await.unwrap().unwrap();
    authority.validate_session(&token, "HW-A").await.unwrap();
    let after = store.get_account("pure@test.com").await.unwrap().unwrap();
    assert_eq!(before.last_login, after.last_login, "validation must not touch last_login");
}

#[tokio::test]
async fn validate_session_rechecks_account_state() {
    let (authority, store, _dir) = setup().await;
    let reg = active_account(&authority, "recheck@test.com", 10).await;
    let token = authority
        .login("recheck@test.com", &reg.password, &otp(&reg), Some("HW-A"))
        .await
        .unwrap();

    // Wrong hardware id, no auto-binding on the validate path.
    let err = authority.validate_session(&token, "HW-B").await.unwrap_err();
    assert!(matches!(err, AuthError::HardwareMismatch));

    // License expiry is re-read on every validation.
    store
        .update_expiry("recheck@test.com", Utc::now() - Duration::days(1))
        .await
        .unwrap();
    let err = authority.validate_session(&token, "HW-A").await.unwrap_err();
    assert!(matches!(err, AuthError::Expired));
}

#[tokio::test]
async fn validate_session_fails_after_account_reset() {
    let (authority, _store, _dir) = setup().await;
    let reg = active_account(&authority, "gone@test.com", 10).await;
    let token = authority
        .login("gone@test.com", &reg.password, &otp(&reg), Some("HW-A"))
        .await
        .unwrap();

    authority.reset_account("gone@test.com").await.unwrap();

    let err = authority.validate_session(&token, "HW-A").await.unwrap_err();
    assert!(matches!(err, AuthError::NotFound));
}

#[tokio::test]
async fn session_from_hardware_less_login_validates_without_an_id() {
    let (authority, _store, _dir) = setup().await;
    let reg = active_account(&authority, "unbound@test.com", 10).await;
    let token = authority
        .login("unbound@test.com", &reg.password, &otp(&reg), None)
        .await
        .unwrap();

    // Unbound account: an empty presented id passes, a concrete one does
    // not, and validation still never binds.
    let identity = authority.validate_session(&token, "").await.unwrap();
    assert_eq!(identity, "unbound@test.com");
    let err = authority.validate_session(&token, "HW-A").await.unwrap_err();
    assert!(matches!(err, AuthError::HardwareMismatch));

    // Bound account: an empty presented id is a mismatch.
    authority
        .login("unbound@test.com", &reg.password, &otp(&reg), Some("HW-A"))
        .await
        .unwrap();
    let err = authority.validate_session(&token, "").await.unwrap_err();
    assert!(matches!(err, AuthError::HardwareMismatch));
    let identity = authority.validate_session(&token, "HW-A").await.unwrap();
    assert_eq!(identity, "unbound@test.com");
}

#[tokio::test]
async fn garbage_token_is_invalid() {
    let (authority, _store, _dir) = setup().await;
    let err = authority.validate_session("not-a-token", "HW").await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidToken));
}

// ── Admin resets & notes ────────────────────────────────────────────────

#[tokio::test]
async fn reset_account_returns_external_ref_and_deletes() {
    let (authority, store, _dir) = setup().await;
    authority
        .register("bye@test.com", Some("discord-11".into()), None, None)
        .await
        .unwrap();
    let external_ref = authority.reset_account("bye@test.com").await.unwrap();
    assert_eq!(external_ref.as_deref(), Some("discord-11"));
    assert!(store.get_account("bye@test.com").await.unwrap().is_none());

    let err = authority.reset_account("bye@test.com").await.unwrap_err();
    assert!(matches!(err, AuthError::NotFound));
}

#[tokio::test]
async fn reset_all_returns_every_account_to_pending() {
    let (authority, _store, _dir) = setup().await;
    let reg_a = active_account(&authority, "a@test.com", 10).await;
    let _reg_b = active_account(&authority, "b@test.com", 10).await;
    authority
        .login("a@test.com", &reg_a.password, &otp(&reg_a), Some("HW-A"))
        .await
        .unwrap();

    let affected = authority.reset_all_accounts().await.unwrap();
    assert_eq!(affected, 2);

    let err = authority
        .login("a@test.com", &reg_a.password, &otp(&reg_a), Some("HW-A"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NotActivated));
}

#[tokio::test]
async fn notes_do_not_affect_authentication() {
    let (authority, _store, _dir) = setup().await;
    let reg = active_account(&authority, "noted@test.com", 10).await;
    authority.set_note("noted@test.com", "priority support").await.unwrap();

    authority
        .login("noted@test.com", &reg.password, &otp(&reg), Some("HW"))
        .await
        .unwrap();

    let view = authority.user_info("noted@test.com").await.unwrap();
    assert_eq!(view.note.as_deref(), Some("priority support"));
}

#[tokio::test]
async fn views_never_carry_secret_material() {
    let (authority, _store, _dir) = setup().await;
    let reg = active_account(&authority, "view@test.com", 10).await;

    let view = authority.user_info("view@test.com").await.unwrap();
    let json = serde_json::to_value(&view).unwrap();
    let rendered = json.to_string();
    assert!(!rendered.contains(&reg.password));
    assert!(!rendered.contains(&reg.totp_secret));
    assert!(json.get("password_hash").is_none());
    assert!(json.get("totp_secret").is_none());

    let all = authority.list_accounts().await.unwrap();
    assert_eq!(all.len(), 1);
}
