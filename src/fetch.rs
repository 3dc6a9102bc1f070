use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{error, info, warn};

use crate::archive::{ArchiveClient, ShowHit};
use crate::domain::AudioFilter;
use crate::scan;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Success,
    Skipped,
    Failed,
}

pub fn fetch_show<A: ArchiveClient + ?Sized>(
    client: &A,
    hit: &ShowHit,
    download_root: &Utf8Path,
    filter: &AudioFilter,
    retries: usize,
) -> FetchOutcome {
    let show_dir = download_root
        .join(hit.creator.as_str())
        .join(hit.identifier.as_str());

    // Two collections can surface the same identifier within one run.
    if scan::has_qualifying_file(&show_dir, filter) {
        info!(identifier = %hit.identifier, "show already exists on disk, skipping");
        return FetchOutcome::Skipped;
    }

    info!(identifier = %hit.identifier, creator = %hit.creator, "downloading");
    match client.fetch(&hit.identifier, &show_dir, filter, retries) {
        Ok(report) => {
            if report.files_written == 0 || !scan::has_qualifying_file(&show_dir, filter) {
                warn!(
                    identifier = %hit.identifier,
                    suffix = filter.suffix(),
                    "download produced no matching audio files"
                );
                remove_show_dir(&show_dir);
                return FetchOutcome::Failed;
            }
            info!(
                identifier = %hit.identifier,
                files = report.files_written,
                "download complete"
            );
            apply_permissions(&show_dir);
            FetchOutcome::Success
        }
        Err(err) => {
            error!(identifier = %hit.identifier, %err, "download failed");
            remove_show_dir(&show_dir);
            FetchOutcome::Failed
        }
    }
}

fn remove_show_dir(show_dir: &Utf8PathBuf) {
    if !show_dir.as_std_path().exists() {
        return;
    }
    match fs::remove_dir_all(show_dir.as_std_path()) {
        Ok(()) => info!(dir = %show_dir, "cleaned up partial download"),
        Err(err) => error!(dir = %show_dir, %err, "could not clean up partial download"),
    }
}

#[cfg(unix)]
fn apply_permissions(show_dir: &Utf8Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(err) =
        fs::set_permissions(show_dir.as_std_path(), fs::Permissions::from_mode(0o775))
    {
        warn!(dir = %show_dir, %err, "could not set directory permissions");
    }

    let entries = match fs::read_dir(show_dir.as_std_path()) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %show_dir, %err, "could not enumerate downloaded files");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if let Err(err) = fs::set_permissions(&path, fs::Permissions::from_mode(0o664)) {
            warn!(path = %path.display(), %err, "could not set file permissions");
        }
    }
}

#[cfg(not(unix))]
fn apply_permissions(_show_dir: &Utf8Path) {}
