use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use parking_lot::Mutex;
use tracing::debug;

use crate::{
    cursor::SnapshotCursor,
    db::{DBOptions, ReadOptions, WriteOptions},
    memtable::MemTable,
    statistics::Statistics,
    transaction::{
        ReadTransaction, Snapshot, WriteBatch, WriteOp,
        snapshot::{SnapshotList, ViewPin},
    },
    util::{KeyRange, Result, Slice, Status},
};

/// In-memory, ordered, multi-version key-value store.
///
/// Every committed write gets a sequence number. Readers pin a sequence and
/// see the store exactly as it was when that sequence was the latest. Pins
/// come from snapshots, cursors and read transactions; compaction never
/// drops a version a live pin can see.
pub struct DB {
    mem: Arc<MemTable>,
    snapshots: Arc<SnapshotList>,
    /// Serializes writers, compaction and pinning of the latest sequence
    write_lock: Mutex<()>,
    /// Last sequence whose writes are fully applied
    last_sequence: AtomicU64,
    options: DBOptions,
    statistics: Arc<Statistics>,
}

impl DB {
    pub fn open(options: DBOptions) -> Result<Self> {
        options.validate()?;

        Ok(DB {
            mem: Arc::new(MemTable::new()),
            snapshots: Arc::new(SnapshotList::new()),
            write_lock: Mutex::new(()),
            last_sequence: AtomicU64::new(0),
            options,
            statistics: Arc::new(Statistics::new()),
        })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.snapshots.is_open() {
            Ok(())
        } else {
            Err(Status::shutdown_in_progress("store is closed"))
        }
    }

    #[inline]
    pub fn put(&self, options: &WriteOptions, key: Slice, value: Slice) -> Result<()> {
        let mut batch = WriteBatch::with_capacity(1);
        batch.put(key, value)?;
        self.write(options, &batch)
    }

    #[inline]
    pub fn delete(&self, options: &WriteOptions, key: Slice) -> Result<()> {
        let mut batch = WriteBatch::with_capacity(1);
        batch.delete(key)?;
        self.write(options, &batch)
    }

    /// Apply a write batch atomically
    ///
    /// The whole batch becomes visible at once: the published sequence moves
    /// only after every operation is in the table.
    pub fn write(&self, _options: &WriteOptions, batch: &WriteBatch) -> Result<()> {
        self.ensure_open()?;
        if batch.is_empty() {
            return Ok(());
        }

        let _guard = self.write_lock.lock();
        let mut sequence = self.last_sequence.load(Ordering::Acquire);
        for op in batch.ops() {
            sequence += 1;
            match op {
                WriteOp::Put { key, value } => {
                    self.mem.add(sequence, key, value);
                    self.statistics
                        .record_write((key.len() + value.len()) as u64);
                },
                WriteOp::Delete { key } => {
                    self.mem.delete(sequence, key);
                    self.statistics.record_delete();
                },
            }
        }
        self.last_sequence.store(sequence, Ordering::Release);

        Ok(())
    }

    pub fn get(&self, options: &ReadOptions, key: &Slice) -> Result<Option<Slice>> {
        self.ensure_open()?;
        // A read without a snapshot pins the latest sequence for the lookup
        // only, outside the `max_live_views` budget.
        let (sequence, _pin) = match &options.snapshot {
            Some(snapshot) => {
                self.check_snapshot(snapshot)?;
                (snapshot.sequence(), None)
            },
            None => {
                let pin = self.pin_latest_with_limit(None)?;
                (pin.sequence(), Some(pin))
            },
        };

        let value = self
            .mem
            .get(key.data(), sequence, self.verify_checksums(options))?;
        if let Some(v) = &value {
            self.statistics.record_read(v.size() as u64);
        }
        Ok(value)
    }

    /// Create a snapshot at the current sequence number
    pub fn get_snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot::new(self.pin_latest()?))
    }

    /// Create a cursor over `range`.
    ///
    /// The cursor reads at `options.snapshot`, or at the latest committed
    /// sequence when no snapshot is given, and holds its own pin on that
    /// view until closed. Fails instead of returning a cursor when no view
    /// can be established: the store is closed, the snapshot was
    /// invalidated or issued by another store, or `max_live_views` is
    /// reached.
    pub fn cursor(&self, options: &ReadOptions, range: KeyRange) -> Result<SnapshotCursor> {
        self.ensure_open()?;
        let pin = match &options.snapshot {
            Some(snapshot) => self.pin_snapshot(snapshot)?,
            None => self.pin_latest()?,
        };

        Ok(SnapshotCursor::new(
            Arc::clone(&self.mem),
            pin,
            range,
            self.verify_checksums(options),
            Arc::clone(&self.statistics),
        ))
    }

    /// Start a read-only transaction over the current state.
    pub fn begin_read(&self) -> Result<ReadTransaction<'_>> {
        Ok(ReadTransaction::new(self, self.get_snapshot()?))
    }

    /// Drop versions no live view can observe. Returns how many versions
    /// were removed.
    pub fn compact(&self) -> Result<usize> {
        self.ensure_open()?;
        let _guard = self.write_lock.lock();

        let latest = self.last_sequence.load(Ordering::Acquire);
        let horizon = self
            .snapshots
            .oldest()
            .map_or(latest, |oldest| oldest.min(latest));
        let removed = self.mem.garbage_collect(horizon);
        self.statistics.record_compaction(removed as u64);
        debug!(horizon, removed, "compacted");

        Ok(removed)
    }

    /// Close the store and invalidate every live view.
    ///
    /// Open cursors latch `ViewInvalidated` on their next read. Calling
    /// `close` again is a no-op.
    pub fn close(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        if !self.snapshots.is_open() {
            return Ok(());
        }
        let invalidated = self.snapshots.invalidate_all();
        debug!(invalidated, "store closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        !self.snapshots.is_open()
    }

    /// Number of views currently pinned by snapshots, cursors and read
    /// transactions.
    pub fn live_views(&self) -> usize {
        self.snapshots.live()
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence.load(Ordering::Acquire)
    }

    pub fn statistics(&self) -> &Arc<Statistics> {
        &self.statistics
    }

    pub fn options(&self) -> &DBOptions {
        &self.options
    }

    pub fn approximate_memory_usage(&self) -> usize {
        self.mem.approximate_memory_usage()
    }

    fn verify_checksums(&self, options: &ReadOptions) -> bool {
        options
            .verify_checksums
            .unwrap_or(self.options.verify_checksums)
    }

    /// Pins the latest sequence. Done under the write lock so compaction
    /// cannot move its horizon past the sequence between read and pin.
    fn pin_latest(&self) -> Result<ViewPin> {
        self.pin_latest_with_limit(self.options.max_live_views)
    }

    fn pin_latest_with_limit(&self, max_live: Option<usize>) -> Result<ViewPin> {
        let _guard = self.write_lock.lock();
        let sequence = self.last_sequence.load(Ordering::Acquire);
        self.snapshots.acquire(sequence, max_live)
    }

    /// A snapshot is usable only by the store that issued it, and only while
    /// that store is open.
    fn check_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        if !snapshot.is_issued_by(&self.snapshots) {
            return Err(Status::invalid_argument(format!(
                "snapshot at sequence {} was issued by another store",
                snapshot.sequence()
            )));
        }
        if !snapshot.is_valid() {
            return Err(Status::view_invalidated(format!(
                "snapshot at sequence {} is no longer available",
                snapshot.sequence()
            )));
        }
        Ok(())
    }

    fn pin_snapshot(&self, snapshot: &Snapshot) -> Result<ViewPin> {
        self.check_snapshot(snapshot)?;
        self.snapshots
            .acquire(snapshot.sequence(), self.options.max_live_views)
    }
}
