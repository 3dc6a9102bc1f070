use camino::Utf8PathBuf;

use crunchy_downloader::domain::{CreatorName, Identifier};
use crunchy_downloader::store::IdentifierStore;

#[test]
fn legacy_and_full_entries_coexist() {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().join("downloaded_shows.json")).unwrap();
    std::fs::write(
        path.as_std_path(),
        r#"[
            "gd1972-08-27.sbd.orf",
            {"identifier": "ph2003-07-15", "creator": "Phish", "downloaded_at": "2026-01-01T00:00:00+00:00"}
        ]"#,
    )
    .unwrap();

    let store = IdentifierStore::load(path);
    assert_eq!(store.len(), 2);
    assert!(store.contains(&"gd1972-08-27.sbd.orf".parse().unwrap()));
    assert!(store.contains(&"ph2003-07-15".parse().unwrap()));
}

#[test]
fn records_survive_a_persist_reload_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().join("downloaded_shows.json")).unwrap();

    let mut store = IdentifierStore::load(path.clone());
    let id: Identifier = "gd1989-07-07.sbd.miller".parse().unwrap();
    store.record(
        id.clone(),
        CreatorName::sanitize("Grateful Dead"),
        "2026-08-06T12:00:00+00:00".to_string(),
    );
    store.persist().unwrap();

    let reloaded = IdentifierStore::load(path);
    let record = reloaded.get(&id).unwrap();
    assert_eq!(record.creator.as_ref().unwrap().as_str(), "Grateful_Dead");
    assert_eq!(
        record.downloaded_at.as_deref(),
        Some("2026-08-06T12:00:00+00:00")
    );
}

#[test]
fn persisted_file_is_valid_json_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().join("downloaded_shows.json")).unwrap();

    let mut store = IdentifierStore::load(path.clone());
    store.record(
        "gd1990-03-29".parse().unwrap(),
        CreatorName::sanitize("Grateful Dead"),
        "2026-08-06T12:00:00+00:00".to_string(),
    );
    store.persist().unwrap();

    let content = std::fs::read_to_string(path.as_std_path()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 1);
    assert_eq!(parsed[0]["identifier"], "gd1990-03-29");
}
