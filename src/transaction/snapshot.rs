use std::{
    collections::BTreeMap,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use parking_lot::Mutex;
use tracing::debug;

use crate::util::{Result, Status};

/// Registry of sequence numbers pinned by live point-in-time views.
///
/// The oldest pinned sequence bounds what compaction may drop. Closing the
/// registry invalidates every view at once.
pub(crate) struct SnapshotList {
    state: Mutex<SnapshotListState>,
}

struct SnapshotListState {
    /// sequence -> number of pins at that sequence
    pinned: BTreeMap<u64, usize>,
    open: bool,
}

impl SnapshotList {
    pub(crate) fn new() -> Self {
        SnapshotList {
            state: Mutex::new(SnapshotListState {
                pinned: BTreeMap::new(),
                open: true,
            }),
        }
    }

    /// Pin `sequence` until the returned [`ViewPin`] is released or dropped.
    pub(crate) fn acquire(
        self: &Arc<Self>,
        sequence: u64,
        max_live: Option<usize>,
    ) -> Result<ViewPin> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(Status::shutdown_in_progress(
                "store is closed, no view can be established",
            ));
        }
        if let Some(max) = max_live {
            let live: usize = state.pinned.values().sum();
            if live >= max {
                return Err(Status::busy(format!("{live} live views, limit is {max}")));
            }
        }
        *state.pinned.entry(sequence).or_default() += 1;
        debug!(sequence, "pinned view");

        Ok(ViewPin {
            sequence,
            list: Arc::clone(self),
            released: AtomicBool::new(false),
        })
    }

    fn release(&self, sequence: u64) -> Result<()> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(Status::release_failed(format!(
                "view at sequence {sequence} was dropped when the store closed"
            )));
        }
        match state.pinned.get_mut(&sequence) {
            Some(count) => {
                *count -= 1;
                if *count == 0 {
                    state.pinned.remove(&sequence);
                }
                debug!(sequence, "released view");
                Ok(())
            },
            None => Err(Status::release_failed(format!(
                "view at sequence {sequence} is not registered"
            ))),
        }
    }

    pub(crate) fn oldest(&self) -> Option<u64> {
        self.state.lock().pinned.keys().next().copied()
    }

    pub(crate) fn live(&self) -> usize {
        self.state.lock().pinned.values().sum()
    }

    pub(crate) fn is_open(&self) -> bool {
        self.state.lock().open
    }

    /// Drops every pin and refuses new ones. Returns how many pins were live.
    pub(crate) fn invalidate_all(&self) -> usize {
        let mut state = self.state.lock();
        state.open = false;
        let live = state.pinned.values().sum();
        state.pinned.clear();
        live
    }
}

/// One registration in a [`SnapshotList`].
///
/// Released explicitly with [`ViewPin::release`], or on drop.
pub(crate) struct ViewPin {
    sequence: u64,
    list: Arc<SnapshotList>,
    released: AtomicBool,
}

impl ViewPin {
    pub(crate) fn sequence(&self) -> u64 {
        self.sequence
    }

    /// False once released, or once the store dropped every view.
    pub(crate) fn is_valid(&self) -> bool {
        !self.released.load(Ordering::Acquire) && self.list.is_open()
    }

    /// True if this pin was issued by `list`.
    pub(crate) fn is_registered_in(&self, list: &Arc<SnapshotList>) -> bool {
        Arc::ptr_eq(&self.list, list)
    }

    /// Releases the pin. Only the first call touches the registry; later
    /// calls return `Ok(())`.
    pub(crate) fn release(&self) -> Result<()> {
        if self.released.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.list.release(self.sequence)
    }
}

impl Drop for ViewPin {
    fn drop(&mut self) {
        if let Err(status) = self.release() {
            debug!(sequence = self.sequence, %status, "view released on drop");
        }
    }
}

/// Snapshot provides a consistent point-in-time view of the database.
///
/// Clones share one registration; the view stays pinned until the last
/// clone is dropped.
#[derive(Clone)]
pub struct Snapshot {
    pin: Arc<ViewPin>,
}

impl Snapshot {
    pub(crate) fn new(pin: ViewPin) -> Self {
        Snapshot { pin: Arc::new(pin) }
    }

    /// Get the snapshot's sequence number
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.pin.sequence()
    }

    /// False once the store that issued the snapshot has been closed.
    pub fn is_valid(&self) -> bool {
        self.pin.is_valid()
    }

    pub(crate) fn is_issued_by(&self, list: &Arc<SnapshotList>) -> bool {
        self.pin.is_registered_in(list)
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("sequence", &self.sequence())
            .field("valid", &self.is_valid())
            .finish()
    }
}
