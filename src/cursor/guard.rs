use std::ops::{Deref, DerefMut};

use tracing::warn;

use crate::{cursor::ForwardCursor, util::Result};

/// Closes the wrapped cursor when the guard goes out of scope.
///
/// [`CursorGuard::finish`] is the normal exit: it checks `status`, closes,
/// and returns the first error. An early return or `?` closes on drop and
/// logs a failed release. While a panic unwinds the guard does not call
/// `close`; the cursor's own `Drop` releases what it holds.
///
/// ```ignore
/// let mut cursor = CursorGuard::new(db.cursor(&ReadOptions::default(), KeyRange::all())?);
/// while let Some((key, value)) = cursor.next() {
///     if key.starts_with(&stop) {
///         break;
///     }
///     handle(key, value)?;
/// }
/// cursor.finish()?;
/// ```
pub struct CursorGuard<C: ForwardCursor> {
    cursor: C,
    finished: bool,
}

impl<C: ForwardCursor> CursorGuard<C> {
    pub fn new(cursor: C) -> Self {
        CursorGuard {
            cursor,
            finished: false,
        }
    }

    /// `status`, then `close`. A read failure takes precedence.
    pub fn finish(mut self) -> Result<()> {
        self.finished = true;
        let status = self.cursor.status();
        let closed = self.cursor.close();
        status.and(closed)
    }
}

impl<C: ForwardCursor> Deref for CursorGuard<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.cursor
    }
}

impl<C: ForwardCursor> DerefMut for CursorGuard<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.cursor
    }
}

impl<C: ForwardCursor> Drop for CursorGuard<C> {
    fn drop(&mut self) {
        if self.finished || std::thread::panicking() {
            return;
        }
        if let Err(status) = self.cursor.close() {
            warn!(%status, "cursor release failed on scope exit");
        }
    }
}
