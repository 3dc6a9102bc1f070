use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use serde::Serialize;
use tracing::{debug, error, info};

use crate::archive::{ArchiveClient, ShowHit};
use crate::cancel::CancelToken;
use crate::domain::{AudioFilter, Identifier};
use crate::fetch::{self, FetchOutcome};
use crate::scan;
use crate::store::IdentifierStore;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub download_root: Utf8PathBuf,
    pub max_shows: usize,
    pub workers: usize,
    pub retries: usize,
    pub dry_run: bool,
    pub audio_filter: AudioFilter,
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct RunSummary {
    pub discovered: usize,
    pub skipped: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub candidates: Vec<Identifier>,
    pub interrupted: bool,
    pub duration: Duration,
}

pub struct App<A: ArchiveClient> {
    store: IdentifierStore,
    client: A,
}

impl<A: ArchiveClient> App<A> {
    pub fn new(store: IdentifierStore, client: A) -> Self {
        Self { store, client }
    }

    pub fn store(&self) -> &IdentifierStore {
        &self.store
    }

    pub fn client(&self) -> &A {
        &self.client
    }

    pub fn run(
        &mut self,
        collections: &[String],
        options: &RunOptions,
        cancel: &CancelToken,
    ) -> RunSummary {
        let started = Instant::now();
        let mut summary = RunSummary::default();
        if options.dry_run {
            info!("dry run mode, no files will be downloaded");
        }
        info!(
            store = %self.store.path(),
            known = self.store.len(),
            "loaded identifier store"
        );

        let on_disk = scan::scan(&options.download_root, &options.audio_filter);
        if !on_disk.is_empty() {
            info!(count = on_disk.len(), "found completed shows on disk");
        }

        let mut dispatched: HashSet<Identifier> = HashSet::new();

        for collection in collections {
            if cancel.is_cancelled() {
                summary.interrupted = true;
                break;
            }
            info!(collection = %collection, "processing collection");

            let hits = match self.client.search(collection, options.max_shows) {
                Ok(hits) => hits,
                Err(err) => {
                    error!(collection = %collection, %err, "search failed, skipping collection");
                    continue;
                }
            };
            info!(collection = %collection, found = hits.len(), "search complete");
            summary.discovered += hits.len();

            let mut candidates = Vec::new();
            for hit in hits {
                if self.store.contains(&hit.identifier)
                    || on_disk.contains(&hit.identifier)
                    || dispatched.contains(&hit.identifier)
                {
                    debug!(identifier = %hit.identifier, "already downloaded, skipping");
                    summary.skipped += 1;
                    continue;
                }
                dispatched.insert(hit.identifier.clone());
                candidates.push(hit);
            }
            summary
                .candidates
                .extend(candidates.iter().map(|hit| hit.identifier.clone()));

            if options.dry_run {
                for hit in &candidates {
                    info!(
                        identifier = %hit.identifier,
                        creator = %hit.creator,
                        "dry run: would download"
                    );
                }
                continue;
            }

            dispatch_batch(
                &self.client,
                &mut self.store,
                candidates,
                options,
                cancel,
                &mut summary,
            );
        }

        if cancel.is_cancelled() {
            summary.interrupted = true;
        }

        if !options.dry_run {
            if let Err(err) = self.store.persist() {
                error!(
                    %err,
                    "identifier store was not saved; duplicate detection may re-fetch on the next run"
                );
            }
        }

        summary.duration = started.elapsed();
        info!(
            discovered = summary.discovered,
            succeeded = summary.succeeded,
            skipped = summary.skipped,
            failed = summary.failed,
            elapsed_secs = summary.duration.as_secs_f64(),
            interrupted = summary.interrupted,
            "run complete"
        );
        summary
    }
}

fn dispatch_batch<A: ArchiveClient>(
    client: &A,
    store: &mut IdentifierStore,
    candidates: Vec<ShowHit>,
    options: &RunOptions,
    cancel: &CancelToken,
    summary: &mut RunSummary,
) {
    if candidates.is_empty() {
        return;
    }

    let workers = options.workers.clamp(1, candidates.len());
    let queue = Mutex::new(candidates.into_iter().collect::<VecDeque<_>>());
    let (tx, rx) = mpsc::channel::<(ShowHit, FetchOutcome)>();

    thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let queue = &queue;
            scope.spawn(move || {
                loop {
                    if cancel.is_cancelled() {
                        break;
                    }
                    let next = queue.lock().ok().and_then(|mut pending| pending.pop_front());
                    let Some(hit) = next else {
                        break;
                    };
                    let outcome = fetch::fetch_show(
                        client,
                        &hit,
                        &options.download_root,
                        &options.audio_filter,
                        options.retries,
                    );
                    if tx.send((hit, outcome)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        // Workers only report outcomes; the store is mutated here, on the
        // control thread.
        for (hit, outcome) in rx {
            match outcome {
                FetchOutcome::Success => {
                    store.record(
                        hit.identifier,
                        hit.creator,
                        chrono::Utc::now().to_rfc3339(),
                    );
                    summary.succeeded += 1;
                }
                FetchOutcome::Skipped => summary.skipped += 1,
                FetchOutcome::Failed => summary.failed += 1,
            }
        }
    });
}
