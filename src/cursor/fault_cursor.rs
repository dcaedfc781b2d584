use tracing::debug;

use crate::{
    cursor::{CursorLatch, CursorState, ForwardCursor},
    util::{Result, Slice, Status},
};

/// Wraps a cursor and injects failures at chosen points.
///
/// With [`FaultCursor::fail_after`], the first `n` pairs of the inner cursor
/// pass through and the next read latches the given status instead. With
/// [`FaultCursor::fail_release`], `close` still closes the inner cursor but
/// reports the given status.
pub struct FaultCursor<C> {
    inner: C,
    read_fault: Option<(usize, Status)>,
    release_fault: Option<Status>,
    returned: usize,
    latch: CursorLatch,
}

impl<C: ForwardCursor> FaultCursor<C> {
    pub fn new(inner: C) -> Self {
        FaultCursor {
            inner,
            read_fault: None,
            release_fault: None,
            returned: 0,
            latch: CursorLatch::new(),
        }
    }

    /// Latch `status` in place of pair number `n` (zero based).
    pub fn fail_after(mut self, n: usize, status: Status) -> Self {
        self.read_fault = Some((n, status));
        self
    }

    pub fn fail_release(mut self, status: Status) -> Self {
        self.release_fault = Some(status);
        self
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn state(&self) -> CursorState {
        self.latch.state()
    }

    /// Pairs passed through so far.
    pub fn returned(&self) -> usize {
        self.returned
    }
}

impl<C: ForwardCursor> ForwardCursor for FaultCursor<C> {
    fn next(&mut self) -> Option<(Slice, Slice)> {
        if !self.latch.can_advance() {
            return None;
        }
        let tripped = match &self.read_fault {
            Some((n, status)) if self.returned >= *n => Some(status.clone()),
            _ => None,
        };
        if let Some(status) = tripped {
            debug!(after = self.returned, %status, "injecting read fault");
            self.latch.fail(status);
            return None;
        }

        match self.inner.next() {
            Some(entry) => {
                self.returned += 1;
                Some(entry)
            },
            None => {
                match self.inner.status() {
                    Ok(()) => self.latch.exhaust(),
                    Err(status) => {
                        self.latch.fail(status);
                    },
                }
                None
            },
        }
    }

    fn status(&self) -> Result<()> {
        self.latch.status()
    }

    fn close(&mut self) -> Result<()> {
        let inner = &mut self.inner;
        let release_fault = &self.release_fault;
        self.latch.close_with(|| {
            let closed = inner.close();
            match release_fault {
                Some(status) => Err(status.clone()),
                None => closed,
            }
        })
    }
}
