use assert_matches::assert_matches;

use crunchy_downloader::domain::{AudioFilter, CreatorField, CreatorName, Identifier};
use crunchy_downloader::error::CrunchyError;

#[test]
fn sanitization_examples() {
    assert_eq!(
        CreatorName::sanitize("Umphreys McGee").as_str(),
        "Umphreys_McGee"
    );
    assert_eq!(
        CreatorName::sanitize("Grateful Dead").as_str(),
        "Grateful_Dead"
    );
    assert_eq!(
        CreatorName::sanitize("Medeski, Martin & Wood").as_str(),
        "Medeski_Martin__Wood"
    );
}

#[test]
fn sanitization_is_idempotent() {
    let names = ["Umphreys McGee", "Phil Lesh & Friends", "moe."];
    for name in names {
        let once = CreatorName::sanitize(name);
        let twice = CreatorName::sanitize(once.as_str());
        assert_eq!(once, twice);
    }
}

#[test]
fn list_valued_creator_resolves_to_first_element() {
    let field: CreatorField =
        serde_json::from_str(r#"["Phish", "Dead"]"#).unwrap();
    assert_eq!(field.resolve("SomeCollection").as_str(), "Phish");

    let field: CreatorField = serde_json::from_str(r#""Phish""#).unwrap();
    assert_eq!(field.resolve("SomeCollection").as_str(), "Phish");

    let field: CreatorField = serde_json::from_str("[]").unwrap();
    assert_eq!(field.resolve("SomeCollection").as_str(), "SomeCollection");
}

#[test]
fn identifier_rejects_path_like_values() {
    assert_matches!(
        "../escape".parse::<Identifier>(),
        Err(CrunchyError::InvalidIdentifier(_))
    );
    assert_matches!(
        "gd/1977".parse::<Identifier>(),
        Err(CrunchyError::InvalidIdentifier(_))
    );
    assert_matches!(
        "  ".parse::<Identifier>(),
        Err(CrunchyError::InvalidIdentifier(_))
    );
}

#[test]
fn audio_filter_accepts_configured_extension() {
    let filter = AudioFilter::new("flac");
    assert!(filter.matches("gd77-05-08d1t01.flac"));
    assert!(!filter.matches("gd77-05-08d1t01.mp3"));
}
