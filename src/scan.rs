use std::collections::HashSet;
use std::fs;
use std::path::Path;

use camino::Utf8Path;
use tracing::{debug, warn};

use crate::domain::{AudioFilter, Identifier};

pub fn scan(download_root: &Utf8Path, filter: &AudioFilter) -> HashSet<Identifier> {
    let mut existing = HashSet::new();

    let creators = match fs::read_dir(download_root.as_std_path()) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(root = %download_root, %err, "download root not readable, nothing on disk yet");
            return existing;
        }
    };

    for creator in creators {
        let creator = match creator {
            Ok(entry) => entry,
            Err(err) => {
                warn!(root = %download_root, %err, "skipping unreadable directory entry");
                continue;
            }
        };
        if !creator.path().is_dir() {
            continue;
        }

        let shows = match fs::read_dir(creator.path()) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(dir = %creator.path().display(), %err, "skipping unreadable creator directory");
                continue;
            }
        };

        for show in shows {
            let show = match show {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(dir = %creator.path().display(), %err, "skipping unreadable show entry");
                    continue;
                }
            };
            let show_path = show.path();
            if !show_path.is_dir() || !dir_has_qualifying_file(&show_path, filter) {
                continue;
            }

            let name = show.file_name();
            match name.to_string_lossy().parse::<Identifier>() {
                Ok(identifier) => {
                    existing.insert(identifier);
                }
                Err(err) => {
                    debug!(dir = %show_path.display(), %err, "directory name is not a usable identifier");
                }
            }
        }
    }

    existing
}

pub fn has_qualifying_file(dir: &Utf8Path, filter: &AudioFilter) -> bool {
    dir_has_qualifying_file(dir.as_std_path(), filter)
}

fn dir_has_qualifying_file(dir: &Path, filter: &AudioFilter) -> bool {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return false,
    };

    for entry in entries.flatten() {
        if !entry.path().is_file() {
            continue;
        }
        if filter.matches(&entry.file_name().to_string_lossy()) {
            return true;
        }
    }
    false
}
