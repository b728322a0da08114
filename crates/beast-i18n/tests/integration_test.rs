//! Integration tests for beast-i18n crate.
//!
//! These tests run against the catalogues embedded into the crate.

use beast_common::test_utils::init_test_logging;
use beast_i18n::{Catalog, Locale};
use proptest::prelude::*;

fn catalog() -> Catalog {
    init_test_logging();
    Catalog::embedded(Locale::German).unwrap()
}

#[test]
fn test_embedded_catalogues_load() {
    let catalog = catalog();
    for locale in Locale::all() {
        assert!(catalog.has_message(locale, "fun-ping"));
        assert!(catalog.has_message(locale, "guard-cooldown"));
    }
    assert_eq!(catalog.fallback(), Locale::German);
}

#[test]
fn test_locales_define_the_same_messages() {
    let german = Catalog::message_ids(Locale::German);
    let english = Catalog::message_ids(Locale::English);
    assert!(!german.is_empty());
    assert_eq!(german, english);
}

#[test]
fn test_message_resolution() {
    let catalog = catalog();
    let args = [("seconds", "7".to_string())];
    assert_eq!(
        catalog.tr(Locale::German, "guard-cooldown", &args),
        "Bitte warte noch 7 Sekunden."
    );
    assert_eq!(
        catalog.tr(Locale::English, "guard-cooldown", &args),
        "Please wait 7 more seconds."
    );
}

#[test]
fn test_no_isolation_marks_around_arguments() {
    let catalog = catalog();
    let text = catalog.tr(Locale::English, "fun-hallo", &[("name", "Krampus".to_string())]);
    assert_eq!(text, "Hello Krampus! 👋");
    assert!(!text.contains('\u{2068}'));
}

#[test]
fn test_multiline_messages() {
    let catalog = catalog();
    let text = catalog.tr(
        Locale::German,
        "announce-message",
        &[("message", "Frohe Weihnachten".to_string())],
    );
    assert_eq!(text, "📢 Ankündigung vom Bot-Owner:\nFrohe Weihnachten");
}

#[test]
fn test_literal_braces_survive() {
    let catalog = catalog();
    let text = catalog.tr(Locale::English, "settings-welcome-message-set", &[]);
    assert!(text.ends_with("{user}, {server}"));
}

#[test]
fn test_missing_argument_falls_back_to_key() {
    let catalog = catalog();
    assert_eq!(catalog.tr(Locale::English, "fun-hallo", &[]), "fun-hallo");
}

#[test]
fn test_unknown_key_falls_back_to_key() {
    let catalog = catalog();
    assert_eq!(catalog.tr(Locale::German, "no-such-message", &[]), "no-such-message");
}

proptest! {
    #[test]
    fn test_unknown_keys_echo(key in "zz-[a-z]{1,12}") {
        let catalog = Catalog::embedded(Locale::English).unwrap();
        prop_assert_eq!(catalog.tr(Locale::German, &key, &[]), key);
    }
}
