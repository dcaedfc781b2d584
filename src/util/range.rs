use std::ops::{Bound, RangeBounds};

/// A range of user keys, compared bytewise.
///
/// The common shape is half-open, `[start, end)`, built with
/// [`KeyRange::new`]. Any `RangeBounds` over byte-like keys converts through
/// [`KeyRange::from_bounds`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    start: Bound<Vec<u8>>,
    end: Bound<Vec<u8>>,
}

impl KeyRange {
    /// Every key in the store.
    pub fn all() -> Self {
        KeyRange {
            start: Bound::Unbounded,
            end: Bound::Unbounded,
        }
    }

    /// Keys `k` with `start <= k < end`.
    pub fn new(start: impl AsRef<[u8]>, end: impl AsRef<[u8]>) -> Self {
        KeyRange {
            start: Bound::Included(start.as_ref().to_vec()),
            end: Bound::Excluded(end.as_ref().to_vec()),
        }
    }

    /// Keys `k` with `start <= k`.
    pub fn starting_at(start: impl AsRef<[u8]>) -> Self {
        KeyRange {
            start: Bound::Included(start.as_ref().to_vec()),
            end: Bound::Unbounded,
        }
    }

    pub fn from_bounds<K, R>(range: R) -> Self
    where
        K: AsRef<[u8]> + ?Sized,
        R: RangeBounds<K>,
    {
        KeyRange {
            start: own_bound(range.start_bound()),
            end: own_bound(range.end_bound()),
        }
    }

    pub fn start(&self) -> Bound<&[u8]> {
        borrow_bound(&self.start)
    }

    pub fn end(&self) -> Bound<&[u8]> {
        borrow_bound(&self.end)
    }

    /// True if `key` sorts before the lower bound.
    pub fn is_before_start(&self, key: &[u8]) -> bool {
        match &self.start {
            Bound::Included(s) => key < s.as_slice(),
            Bound::Excluded(s) => key <= s.as_slice(),
            Bound::Unbounded => false,
        }
    }

    /// True if `key` and every key after it fall outside the range.
    pub fn is_past_end(&self, key: &[u8]) -> bool {
        match &self.end {
            Bound::Included(e) => key > e.as_slice(),
            Bound::Excluded(e) => key >= e.as_slice(),
            Bound::Unbounded => false,
        }
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        !self.is_before_start(key) && !self.is_past_end(key)
    }

    /// True when no byte string can satisfy both bounds.
    pub fn is_empty(&self) -> bool {
        match (&self.start, &self.end) {
            (Bound::Included(s), Bound::Included(e)) => s > e,
            (Bound::Included(s), Bound::Excluded(e))
            | (Bound::Excluded(s), Bound::Included(e))
            | (Bound::Excluded(s), Bound::Excluded(e)) => s >= e,
            _ => false,
        }
    }
}

impl Default for KeyRange {
    fn default() -> Self {
        Self::all()
    }
}

impl RangeBounds<[u8]> for KeyRange {
    fn start_bound(&self) -> Bound<&[u8]> {
        self.start()
    }

    fn end_bound(&self) -> Bound<&[u8]> {
        self.end()
    }
}

fn own_bound<K: AsRef<[u8]> + ?Sized>(bound: Bound<&K>) -> Bound<Vec<u8>> {
    match bound {
        Bound::Included(k) => Bound::Included(k.as_ref().to_vec()),
        Bound::Excluded(k) => Bound::Excluded(k.as_ref().to_vec()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

fn borrow_bound(bound: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    match bound {
        Bound::Included(k) => Bound::Included(k.as_slice()),
        Bound::Excluded(k) => Bound::Excluded(k.as_slice()),
        Bound::Unbounded => Bound::Unbounded,
    }
}
