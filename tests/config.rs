use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use crunchy_downloader::config::ConfigLoader;
use crunchy_downloader::error::CrunchyError;

fn temp_config(content: &str) -> (tempfile::TempDir, Utf8PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().join("config.yaml")).unwrap();
    std::fs::write(path.as_std_path(), content).unwrap();
    (dir, path)
}

#[test]
fn resolve_reads_collections_in_order() {
    let (_dir, path) = temp_config(
        "collections:\n  - GratefulDead\n  - PhilLeshAndFriends\n  - UmphreysMcGee\n",
    );
    let collections = ConfigLoader::resolve(&path).unwrap();
    assert_eq!(
        collections,
        vec!["GratefulDead", "PhilLeshAndFriends", "UmphreysMcGee"]
    );
}

#[test]
fn commented_out_entries_are_disabled() {
    let (_dir, path) = temp_config(
        "collections:\n  - GratefulDead\n  # - PhilLeshAndFriends\n",
    );
    let collections = ConfigLoader::resolve(&path).unwrap();
    assert_eq!(collections, vec!["GratefulDead"]);
}

#[test]
fn missing_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(dir.path().join("nope.yaml")).unwrap();
    let err = ConfigLoader::resolve(&path).unwrap_err();
    assert_matches!(err, CrunchyError::MissingConfig(_));
}

#[test]
fn empty_collection_list_is_a_config_error() {
    let (_dir, path) = temp_config("collections: []\n");
    let err = ConfigLoader::resolve(&path).unwrap_err();
    assert_matches!(err, CrunchyError::EmptyCollections(_));
}

#[test]
fn unparseable_yaml_is_a_config_error() {
    let (_dir, path) = temp_config("collections: [unterminated\n");
    let err = ConfigLoader::resolve(&path).unwrap_err();
    assert_matches!(err, CrunchyError::ConfigParse(_));
}
