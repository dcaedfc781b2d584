use std::sync::atomic::{AtomicU64, Ordering};

/// Store-wide statistics
///
/// Thread-safe counters for writes, point reads and cursor lifecycles.
/// Uses atomic counters for lock-free updates.
#[derive(Debug, Default)]
pub struct Statistics {
    // Write path
    pub num_keys_written: AtomicU64,
    pub num_keys_deleted: AtomicU64,
    pub bytes_written: AtomicU64,

    // Point reads
    pub num_keys_read: AtomicU64,
    pub bytes_read: AtomicU64,

    // Cursor lifecycle
    pub cursors_opened: AtomicU64,
    pub cursors_closed: AtomicU64,
    pub cursors_dropped_open: AtomicU64,

    // Cursor data
    pub keys_scanned: AtomicU64,
    pub bytes_scanned: AtomicU64,

    // Failures
    pub cursor_read_errors: AtomicU64,
    pub release_failures: AtomicU64,

    // Compaction
    pub num_compactions: AtomicU64,
    pub versions_dropped: AtomicU64,
}

impl Statistics {
    pub fn new() -> Self {
        Statistics::default()
    }

    #[inline]
    pub fn record_write(&self, bytes: u64) {
        self.num_keys_written.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_delete(&self) {
        self.num_keys_deleted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_read(&self, bytes: u64) {
        self.num_keys_read.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_cursor_open(&self) {
        self.cursors_opened.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_cursor_close(&self) {
        self.cursors_closed.fetch_add(1, Ordering::Relaxed);
    }

    /// A cursor was dropped without `close`; its view was released by drop.
    #[inline]
    pub fn record_cursor_dropped_open(&self) {
        self.cursors_dropped_open.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_scan(&self, bytes: u64) {
        self.keys_scanned.fetch_add(1, Ordering::Relaxed);
        self.bytes_scanned.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_cursor_read_error(&self) {
        self.cursor_read_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_release_failure(&self) {
        self.release_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_compaction(&self, versions_dropped: u64) {
        self.num_compactions.fetch_add(1, Ordering::Relaxed);
        self.versions_dropped
            .fetch_add(versions_dropped, Ordering::Relaxed);
    }

    pub fn num_keys_written(&self) -> u64 {
        self.num_keys_written.load(Ordering::Relaxed)
    }

    pub fn num_keys_read(&self) -> u64 {
        self.num_keys_read.load(Ordering::Relaxed)
    }

    pub fn cursors_opened(&self) -> u64 {
        self.cursors_opened.load(Ordering::Relaxed)
    }

    pub fn cursors_closed(&self) -> u64 {
        self.cursors_closed.load(Ordering::Relaxed)
    }

    /// Cursors created but neither closed nor dropped yet.
    pub fn cursors_outstanding(&self) -> u64 {
        let opened = self.cursors_opened();
        let finished = self.cursors_closed() + self.cursors_dropped_open.load(Ordering::Relaxed);
        opened.saturating_sub(finished)
    }

    pub fn keys_scanned(&self) -> u64 {
        self.keys_scanned.load(Ordering::Relaxed)
    }

    pub fn bytes_scanned(&self) -> u64 {
        self.bytes_scanned.load(Ordering::Relaxed)
    }

    pub fn cursor_read_errors(&self) -> u64 {
        self.cursor_read_errors.load(Ordering::Relaxed)
    }

    pub fn release_failures(&self) -> u64 {
        self.release_failures.load(Ordering::Relaxed)
    }

    pub fn num_compactions(&self) -> u64 {
        self.num_compactions.load(Ordering::Relaxed)
    }

    pub fn versions_dropped(&self) -> u64 {
        self.versions_dropped.load(Ordering::Relaxed)
    }

    /// Average number of keys returned per opened cursor.
    pub fn keys_per_cursor(&self) -> f64 {
        let opened = self.cursors_opened();
        if opened == 0 {
            return 0.0;
        }
        self.keys_scanned() as f64 / opened as f64
    }

    pub fn reset(&self) {
        self.num_keys_written.store(0, Ordering::Relaxed);
        self.num_keys_deleted.store(0, Ordering::Relaxed);
        self.bytes_written.store(0, Ordering::Relaxed);
        self.num_keys_read.store(0, Ordering::Relaxed);
        self.bytes_read.store(0, Ordering::Relaxed);
        self.cursors_opened.store(0, Ordering::Relaxed);
        self.cursors_closed.store(0, Ordering::Relaxed);
        self.cursors_dropped_open.store(0, Ordering::Relaxed);
        self.keys_scanned.store(0, Ordering::Relaxed);
        self.bytes_scanned.store(0, Ordering::Relaxed);
        self.cursor_read_errors.store(0, Ordering::Relaxed);
        self.release_failures.store(0, Ordering::Relaxed);
        self.num_compactions.store(0, Ordering::Relaxed);
        self.versions_dropped.store(0, Ordering::Relaxed);
    }
}
