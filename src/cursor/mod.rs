//! Forward cursors over an ordered key-value store
//!
//! A cursor is bound at creation to one key range of one point-in-time view
//! and hands out key/value pairs in strictly ascending key order.
//!
//! # Protocol
//!
//! Three operations, called in this order:
//!
//! ```text
//! next()*   -> Some((key, value)) ... None
//! status()  -> Ok(()) or the first terminal error
//! close()   -> releases the view; later calls repeat the first result
//! ```
//!
//! `next` carries no error. A read failure ends the sequence exactly like
//! exhaustion does, and only `status` tells the two apart. Callers that skip
//! `status` may mistake a failed scan for a complete scan over a prefix of
//! the range.
//!
//! ## State machine
//!
//! ```text
//!   Open --next (pair)--> Open
//!   Open --next (end or failure)--> Exhausted
//!   Open | Exhausted --close--> Closed
//! ```
//!
//! The error slot is orthogonal to the state and, once set, never clears.
//!
//! ## Ownership of returned bytes
//!
//! Every returned [`Slice`] owns its bytes (shared, reference counted). It
//! stays valid after further `next` calls, after `close`, and after the
//! store itself is closed.
//!
//! ## Guaranteed release
//!
//! Every backend releases its view when dropped, so early `return`, `?` and
//! `break` never leak it. [`CursorGuard`] additionally surfaces the
//! `close` result on the normal path and logs it on the others.

use crate::util::{Result, Slice};

mod fault_cursor;
mod guard;
mod latch;
mod snapshot_cursor;

pub use fault_cursor::FaultCursor;
pub use guard::CursorGuard;
pub use latch::{CursorLatch, CursorState};
pub use snapshot_cursor::SnapshotCursor;

/// Sequential, ascending reader over a bound key range.
///
/// Not safe for concurrent use of one instance; a cursor has a single owner.
pub trait ForwardCursor {
    /// Next pair in ascending key order, or `None` once the range is
    /// consumed or a terminal error occurred.
    ///
    /// After the first `None`, every later call returns `None`. May block on
    /// storage I/O.
    fn next(&mut self) -> Option<(Slice, Slice)>;

    /// The first terminal error met while advancing, or `Ok(())` if there
    /// was none so far. Repeated calls return the same result.
    fn status(&self) -> Result<()>;

    /// Releases everything held for this cursor.
    ///
    /// Only the first call releases; later calls return its result. A
    /// failed close still leaves the cursor released and must not be
    /// retried.
    fn close(&mut self) -> Result<()>;

    /// Borrows the cursor as a [`std::iter::Iterator`].
    ///
    /// The adapter yields exactly what `next` yields; `status` must still
    /// be checked after the loop.
    fn entries(&mut self) -> Entries<'_, Self>
    where
        Self: Sized,
    {
        Entries { cursor: self }
    }
}

impl<C: ForwardCursor + ?Sized> ForwardCursor for &mut C {
    fn next(&mut self) -> Option<(Slice, Slice)> {
        (**self).next()
    }

    fn status(&self) -> Result<()> {
        (**self).status()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

impl<C: ForwardCursor + ?Sized> ForwardCursor for Box<C> {
    fn next(&mut self) -> Option<(Slice, Slice)> {
        (**self).next()
    }

    fn status(&self) -> Result<()> {
        (**self).status()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Iterator adapter returned by [`ForwardCursor::entries`].
pub struct Entries<'a, C: ForwardCursor> {
    cursor: &'a mut C,
}

impl<C: ForwardCursor> Iterator for Entries<'_, C> {
    type Item = (Slice, Slice);

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.next()
    }
}

impl<C: ForwardCursor> std::iter::FusedIterator for Entries<'_, C> {}

/// Runs the full protocol: `next` until exhaustion, then `status`, then
/// `close`.
///
/// A read failure takes precedence over a release failure. The cursor is
/// closed in every case.
pub fn drain<C: ForwardCursor + ?Sized>(cursor: &mut C) -> Result<Vec<(Slice, Slice)>> {
    let mut entries = Vec::new();
    while let Some(entry) = cursor.next() {
        entries.push(entry);
    }
    let status = cursor.status();
    let closed = cursor.close();
    status?;
    closed?;
    Ok(entries)
}
