//! Request tracking for interactive callers.
//!
//! An editor re-runs the pipeline every time the image list, a crop, or the
//! target width changes. Only the newest run matters: a [`Session`] hands out
//! increasing [`Ticket`]s and reports results of older tickets as
//! [`Outcome::Superseded`] so the caller can drop them.
//!
//! # Snapshots
//!
//! Each run takes a slice of [`SourceImage`]s. Their pixels are `Arc`-shared,
//! so the caller clones its list (cheap) and hands the clone over; edits made
//! while the run is in flight never reach it.
//!
//! # Composite memo
//!
//! The session remembers the last composite, keyed by a **content-addressed**
//! fingerprint of the snapshot: SHA-256 over every image's identity, pixels,
//! dimensions, and crop, plus the target width. Changing any of them, or the
//! order, invalidates the memo. A repeated request (e.g. re-slicing with new
//! settings) skips the stitch.
//!
//! Hashing reads every pixel, so one-shot callers that never repeat a request
//! use [`Session::without_memo`] and skip the fingerprint entirely.

use crate::imaging::RasterBackend;
use crate::slice::{GeneratedSlice, SliceError, SliceSettings, slice_composite};
use crate::source::SourceImage;
use crate::stitch::{Composite, StitchError, stitch};
use chrono::NaiveDate;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Identifies one pipeline request. Later tickets supersede earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

/// Result of a tracked request.
#[derive(Debug)]
pub enum Outcome<T> {
    Ready(T),
    /// A newer request started before this one finished; discard.
    Superseded,
}

impl<T> Outcome<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Outcome::Ready(value) => Some(value),
            Outcome::Superseded => None,
        }
    }

    pub fn is_superseded(&self) -> bool {
        matches!(self, Outcome::Superseded)
    }
}

/// SHA-256 fingerprint of a stitch request, returned as a hex string.
///
/// Inputs: per image (in order) its id, name, dimensions, crop, and pixel
/// bytes, then the target width. Ids and names are part of the key because
/// the composite's placements carry them.
pub fn fingerprint(images: &[SourceImage], target_width: Option<u32>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"stitch\0");
    hasher.update((images.len() as u64).to_le_bytes());
    for img in images {
        for text in [&img.id, &img.name] {
            hasher.update((text.len() as u64).to_le_bytes());
            hasher.update(text.as_bytes());
        }
        let (w, h) = img.dimensions();
        hasher.update(w.to_le_bytes());
        hasher.update(h.to_le_bytes());
        for edge in [img.crop.top, img.crop.bottom, img.crop.left, img.crop.right] {
            hasher.update(edge.to_le_bytes());
        }
        hasher.update(img.pixels().as_raw());
    }
    match target_width.filter(|&w| w > 0) {
        Some(w) => {
            hasher.update(b"\x01");
            hasher.update(w.to_le_bytes());
        }
        None => {
            hasher.update(b"\x00");
        }
    }
    format!("{:x}", hasher.finalize())
}

/// Summary of memo performance over a session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoStats {
    pub hits: u32,
    pub misses: u32,
}

impl fmt::Display for MemoStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} reused, {} stitched ({} total)",
                self.hits,
                self.misses,
                self.hits + self.misses
            )
        } else {
            write!(f, "{} stitched", self.misses)
        }
    }
}

struct Memo {
    key: String,
    composite: Arc<Composite>,
}

/// Latest-request-wins wrapper around the stitch and slice stages.
pub struct Session<B> {
    backend: B,
    latest: AtomicU64,
    /// `None` when the session never memoizes.
    memo: Option<Mutex<Option<Memo>>>,
    stats: Mutex<MemoStats>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Writes are whole-value assignments; a poisoned value is still consistent.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<B: RasterBackend> Session<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            latest: AtomicU64::new(0),
            memo: Some(Mutex::new(None)),
            stats: Mutex::new(MemoStats::default()),
        }
    }

    /// A session that stitches every request from scratch.
    pub fn without_memo(backend: B) -> Self {
        Self {
            memo: None,
            ..Self::new(backend)
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Start a new request, superseding every earlier ticket.
    pub fn begin(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    pub fn stats(&self) -> MemoStats {
        *lock(&self.stats)
    }

    fn finish<T>(&self, ticket: Ticket, value: T) -> Outcome<T> {
        if self.is_current(ticket) {
            Outcome::Ready(value)
        } else {
            warn!(ticket = ticket.0, "discarding superseded result");
            Outcome::Superseded
        }
    }

    /// Stitch a snapshot. An empty snapshot yields `Ready(None)`: nothing to show.
    pub fn stitch(
        &self,
        ticket: Ticket,
        images: &[SourceImage],
        target_width: Option<u32>,
    ) -> Result<Outcome<Option<Arc<Composite>>>, StitchError> {
        if images.is_empty() {
            return Ok(self.finish(ticket, None));
        }

        let key = self
            .memo
            .as_ref()
            .map(|_| fingerprint(images, target_width));
        if let (Some(memo), Some(key)) = (&self.memo, &key) {
            let cached = lock(memo)
                .as_ref()
                .filter(|m| &m.key == key)
                .map(|m| Arc::clone(&m.composite));
            if let Some(composite) = cached {
                debug!(key = %key, "reusing composite");
                lock(&self.stats).hits += 1;
                return Ok(self.finish(ticket, Some(composite)));
            }
        }

        if !self.is_current(ticket) {
            return Ok(Outcome::Superseded);
        }

        let composite = match stitch(&self.backend, images, target_width) {
            Ok(composite) => Arc::new(composite),
            Err(_) if !self.is_current(ticket) => return Ok(Outcome::Superseded),
            Err(e) => return Err(e),
        };
        lock(&self.stats).misses += 1;
        if let (Some(memo), Some(key)) = (&self.memo, key) {
            *lock(memo) = Some(Memo {
                key,
                composite: Arc::clone(&composite),
            });
        }
        Ok(self.finish(ticket, Some(composite)))
    }

    /// Slice a composite produced by this or any other session.
    pub fn slice(
        &self,
        ticket: Ticket,
        composite: &Composite,
        settings: &SliceSettings,
        date: NaiveDate,
    ) -> Result<Outcome<Vec<GeneratedSlice>>, SliceError> {
        if !self.is_current(ticket) {
            return Ok(Outcome::Superseded);
        }
        match slice_composite(&self.backend, composite, settings, date) {
            Ok(slices) => Ok(self.finish(ticket, slices)),
            Err(_) if !self.is_current(ticket) => Ok(Outcome::Superseded),
            Err(e) => Err(e),
        }
    }
}
