use std::{fmt, ops::Bound, sync::Arc};

use tracing::{debug, warn};

use crate::{
    cursor::{CursorLatch, CursorState, ForwardCursor},
    memtable::MemTable,
    statistics::Statistics,
    transaction::snapshot::ViewPin,
    util::{KeyRange, Result, Slice, Status},
};

/// Cursor over the store's multi-version table at a pinned sequence number.
///
/// # Positioning
///
/// The cursor remembers the last user key it returned and re-seeks past it
/// on every `next`. Writes committed after the pin are invisible, and
/// compaction never drops a version the pin can see, so concurrent writers
/// and compaction do not disturb the scan.
///
/// # Failures
///
/// - a value whose checksum does not match latches `Corruption`
/// - a view dropped by the store (the store was closed) latches
///   `ViewInvalidated`
///
/// Both end the scan. `close` reports `ReleaseFailed` when the store already
/// dropped the view.
///
/// `close` gives up the table, the pin and the scan position, so a closed
/// cursor keeps nothing of the store alive.
pub struct SnapshotCursor {
    /// None once closed
    mem: Option<Arc<MemTable>>,
    /// None once closed
    pin: Option<ViewPin>,
    sequence: u64,
    range: KeyRange,
    last_key: Option<Slice>,
    verify_checksums: bool,
    statistics: Arc<Statistics>,
    latch: CursorLatch,
}

impl SnapshotCursor {
    pub(crate) fn new(
        mem: Arc<MemTable>,
        pin: ViewPin,
        range: KeyRange,
        verify_checksums: bool,
        statistics: Arc<Statistics>,
    ) -> Self {
        let latch = if range.is_empty() {
            CursorLatch::exhausted()
        } else {
            CursorLatch::new()
        };
        let sequence = pin.sequence();
        statistics.record_cursor_open();
        debug!(sequence, ?range, "cursor opened");

        SnapshotCursor {
            mem: Some(mem),
            pin: Some(pin),
            sequence,
            range,
            last_key: None,
            verify_checksums,
            statistics,
            latch,
        }
    }

    /// Sequence number of the view this cursor reads.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn range(&self) -> &KeyRange {
        &self.range
    }

    pub fn state(&self) -> CursorState {
        self.latch.state()
    }

    fn fail(&mut self, status: Status) {
        warn!(sequence = self.sequence, %status, "cursor read failed");
        if self.latch.fail(status) {
            self.statistics.record_cursor_read_error();
        }
    }
}

impl ForwardCursor for SnapshotCursor {
    fn next(&mut self) -> Option<(Slice, Slice)> {
        if !self.latch.can_advance() {
            return None;
        }
        let mem = match (&self.mem, &self.pin) {
            (Some(mem), Some(pin)) if pin.is_valid() => Some(Arc::clone(mem)),
            _ => None,
        };
        let Some(mem) = mem else {
            let sequence = self.sequence;
            self.fail(Status::view_invalidated(format!(
                "view at sequence {sequence} is no longer available"
            )));
            return None;
        };

        let from = match &self.last_key {
            Some(key) => Bound::Excluded(key.data()),
            None => self.range.start(),
        };
        let range = &self.range;
        let found = mem.next_visible(
            from,
            self.sequence,
            |key| range.is_past_end(key),
            self.verify_checksums,
        );

        match found {
            Ok(Some(entry)) => {
                self.statistics
                    .record_scan((entry.key.size() + entry.value.size()) as u64);
                self.last_key = Some(entry.key.clone());
                Some((entry.key, entry.value))
            },
            Ok(None) => {
                self.latch.exhaust();
                None
            },
            Err(status) => {
                self.fail(status);
                None
            },
        }
    }

    fn status(&self) -> Result<()> {
        self.latch.status()
    }

    fn close(&mut self) -> Result<()> {
        let mem = &mut self.mem;
        let pin = &mut self.pin;
        let last_key = &mut self.last_key;
        let sequence = self.sequence;
        let statistics = &self.statistics;
        self.latch.close_with(|| {
            statistics.record_cursor_close();
            mem.take();
            last_key.take();
            let released = match pin.take() {
                Some(pin) => pin.release(),
                None => Ok(()),
            };
            match &released {
                Ok(()) => debug!(sequence, "cursor closed"),
                Err(status) => {
                    statistics.record_release_failure();
                    warn!(sequence, %status, "cursor release failed");
                },
            }
            released
        })
    }
}

impl Drop for SnapshotCursor {
    fn drop(&mut self) {
        if !self.latch.is_closed() {
            self.statistics.record_cursor_dropped_open();
        }
    }
}

impl fmt::Debug for SnapshotCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotCursor")
            .field("sequence", &self.sequence)
            .field("range", &self.range)
            .field("last_key", &self.last_key)
            .field("state", &self.latch.state())
            .finish()
    }
}
