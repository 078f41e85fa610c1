//! Behaviour tests for session key resolution at start-up.
//
// rstest-bdd generates guard variables with double underscores, which trips
// the non_snake_case lint under -D warnings.
#![allow(non_snake_case)]

use std::cell::RefCell;

use actix_web::cookie::Key;
use backend::server::{
    BuildMode, CivicSettings, SessionKeyError, SessionSettings, key_fingerprint, session_settings,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

const KEY_BYTE: u8 = b'k';

struct StartupWorld {
    dir: TempDir,
    settings: RefCell<CivicSettings>,
    mode: RefCell<BuildMode>,
    key_len: RefCell<Option<usize>>,
    outcome: RefCell<Option<Result<SessionSettings, SessionKeyError>>>,
}

impl StartupWorld {
    fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let settings = CivicSettings {
            session_key_file: Some(dir.path().join("session_key")),
            ..CivicSettings::default()
        };
        Self {
            dir,
            settings: RefCell::new(settings),
            mode: RefCell::new(BuildMode::Release),
            key_len: RefCell::new(None),
            outcome: RefCell::new(None),
        }
    }

    fn with_loaded<F>(&self, check: F)
    where
        F: FnOnce(&SessionSettings),
    {
        let outcome = self.outcome.borrow();
        match outcome.as_ref().expect("settings resolved") {
            Ok(settings) => check(settings),
            Err(err) => panic!("expected session settings, got {err}"),
        }
    }

    fn failed_with<F>(&self, expected: F) -> bool
    where
        F: Fn(&SessionKeyError) -> bool,
    {
        matches!(self.outcome.borrow().as_ref(), Some(Err(err)) if expected(err))
    }
}

#[fixture]
fn world() -> StartupWorld {
    StartupWorld::new()
}

#[given("a release build")]
fn a_release_build(world: &StartupWorld) {
    *world.mode.borrow_mut() = BuildMode::Release;
}

#[given("a debug build")]
fn a_debug_build(world: &StartupWorld) {
    *world.mode.borrow_mut() = BuildMode::Debug;
}

#[given("a session key file with {len} bytes")]
fn a_session_key_file_with_bytes(world: &StartupWorld, len: usize) {
    std::fs::write(world.dir.path().join("session_key"), vec![KEY_BYTE; len])
        .expect("write key file");
    *world.key_len.borrow_mut() = Some(len);
}

#[given("no session key file")]
fn no_session_key_file(world: &StartupWorld) {
    assert!(!world.dir.path().join("session_key").exists());
}

#[given("generated session keys are allowed")]
fn generated_session_keys_are_allowed(world: &StartupWorld) {
    world.settings.borrow_mut().allow_ephemeral_session_key = true;
}

#[given("secure cookies are switched off")]
fn secure_cookies_are_switched_off(world: &StartupWorld) {
    world.settings.borrow_mut().cookie_secure = false;
}

#[when("the session settings are resolved")]
fn the_session_settings_are_resolved(world: &StartupWorld) {
    let outcome = session_settings(&world.settings.borrow(), *world.mode.borrow());
    *world.outcome.borrow_mut() = Some(outcome);
}

#[then("the session settings load")]
fn the_session_settings_load(world: &StartupWorld) {
    world.with_loaded(|_| ());
}

#[then("session cookies are marked secure")]
fn session_cookies_are_marked_secure(world: &StartupWorld) {
    world.with_loaded(|settings| assert!(settings.cookie_secure));
}

#[then("session cookies are not marked secure")]
fn session_cookies_are_not_marked_secure(world: &StartupWorld) {
    world.with_loaded(|settings| assert!(!settings.cookie_secure));
}

#[then("the key fingerprint matches the key file")]
fn the_key_fingerprint_matches_the_key_file(world: &StartupWorld) {
    let len = world.key_len.borrow().expect("key file written");
    let expected = key_fingerprint(&Key::derive_from(&vec![KEY_BYTE; len]));
    world.with_loaded(|settings| assert_eq!(key_fingerprint(&settings.key), expected));
}

#[then("start-up fails because the key is too short")]
fn start_up_fails_because_the_key_is_too_short(world: &StartupWorld) {
    assert!(world.failed_with(|err| matches!(
        err,
        SessionKeyError::KeyTooShort { length: 32, .. }
    )));
}

#[then("start-up fails because generated keys are refused")]
fn start_up_fails_because_generated_keys_are_refused(world: &StartupWorld) {
    assert!(world.failed_with(|err| matches!(err, SessionKeyError::EphemeralNotAllowed)));
}

#[scenario(
    path = "tests/features/session_startup.feature",
    name = "Release builds accept a long key file"
)]
fn release_builds_accept_a_long_key_file(world: StartupWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session_startup.feature",
    name = "Release builds reject a short key file"
)]
fn release_builds_reject_a_short_key_file(world: StartupWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session_startup.feature",
    name = "Release builds refuse generated keys"
)]
fn release_builds_refuse_generated_keys(world: StartupWorld) {
    drop(world);
}

#[scenario(
    path = "tests/features/session_startup.feature",
    name = "Debug builds fall back to a generated key"
)]
fn debug_builds_fall_back_to_a_generated_key(world: StartupWorld) {
    drop(world);
}
