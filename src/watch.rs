//! Change notification feed for source files.
//!
//! A subscription owns one polling thread. Every interval the thread
//! fingerprints the watched file (SHA-256 of its bytes) and sends a
//! [`ChangeEvent`] when the fingerprint differs from the last one seen.
//! Touching a file without changing its bytes is not a change.
//!
//! The state at subscription time is the baseline and is never replayed.
//! Dropping the [`ChangeSubscription`] stops the thread at its next tick; a
//! stopped feed cannot be restarted, subscribe again instead.

use crate::id::{ContentId, PathResolver, decode_variant_id};
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

/// Live feed of changes to one file.
///
/// Iterating blocks until the next change. The iterator only ends if the
/// polling thread dies.
pub struct ChangeSubscription {
    rx: Receiver<ChangeEvent>,
    stop: Arc<AtomicBool>,
}

impl ChangeSubscription {
    pub fn recv_timeout(&self, timeout: Duration) -> Result<ChangeEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

impl Iterator for ChangeSubscription {
    type Item = ChangeEvent;

    fn next(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().ok()
    }
}

impl Drop for ChangeSubscription {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

/// SHA-256 of the file's bytes, or `None` if it does not exist.
pub fn fingerprint(path: &Path) -> io::Result<Option<String>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(Some(format!("{:x}", Sha256::digest(&bytes)))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// What happened between two fingerprints, if anything.
pub fn classify(previous: Option<&str>, current: Option<&str>) -> Option<ChangeKind> {
    match (previous, current) {
        (None, Some(_)) => Some(ChangeKind::Created),
        (Some(_), None) => Some(ChangeKind::Removed),
        (Some(a), Some(b)) if a != b => Some(ChangeKind::Modified),
        _ => None,
    }
}

/// Subscribe to changes of a single file.
///
/// The file does not need to exist yet; its appearance is a `Created` event.
pub fn watch_path(path: impl Into<PathBuf>, interval: Duration) -> io::Result<ChangeSubscription> {
    let path = path.into();
    let baseline = fingerprint(&path)?;
    let (tx, rx) = mpsc::channel();
    let stop = Arc::new(AtomicBool::new(false));

    let thread_stop = Arc::clone(&stop);
    thread::Builder::new()
        .name("folio-watch".into())
        .spawn(move || poll(path, interval, baseline, tx, thread_stop))?;

    Ok(ChangeSubscription { rx, stop })
}

/// Subscribe to changes of the source file behind a content id.
///
/// Variant ids watch their original image, since that is what they are
/// rebuilt from.
pub fn content_watcher(
    resolver: &PathResolver,
    id: &ContentId,
    interval: Duration,
) -> io::Result<ChangeSubscription> {
    let source = match decode_variant_id(id) {
        Some((original, _)) => resolver.id_to_path(&original),
        None => resolver.id_to_path(id),
    };
    watch_path(source, interval)
}

fn poll(
    path: PathBuf,
    interval: Duration,
    mut last: Option<String>,
    tx: Sender<ChangeEvent>,
    stop: Arc<AtomicBool>,
) {
    debug!(path = %path.display(), "watching");
    loop {
        thread::sleep(interval);
        if stop.load(Ordering::Relaxed) {
            break;
        }
        let current = match fingerprint(&path) {
            Ok(fp) => fp,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to fingerprint watched file");
                continue;
            }
        };
        let Some(kind) = classify(last.as_deref(), current.as_deref()) else {
            continue;
        };
        let event = ChangeEvent {
            path: path.clone(),
            kind,
        };
        if tx.send(event).is_err() {
            break;
        }
        last = current;
    }
    debug!(path = %path.display(), "watch stopped");
}
