use std::{
    cmp::Ordering as CmpOrdering,
    ops::Bound,
    sync::atomic::{AtomicUsize, Ordering},
};

use bytes::{BufMut, Bytes, BytesMut};
use crossbeam_skiplist::SkipMap;

use crate::util::{Result, Slice, Status};

const CHECKSUM_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Deletion,
    Value,
}

/// Versioned key stored in the skiplist.
///
/// Ordered by user key ascending, then by sequence descending, so the newest
/// version of a key is met first when scanning forward.
#[derive(Debug, Clone)]
pub struct InternalKey {
    user_key: Vec<u8>,
    sequence: u64,
    value_type: ValueType,
}

impl InternalKey {
    pub fn new(user_key: Vec<u8>, sequence: u64, value_type: ValueType) -> Self {
        InternalKey {
            user_key,
            sequence,
            value_type,
        }
    }

    /// Smallest internal key for `user_key` visible at `sequence`.
    pub fn lookup(user_key: &[u8], sequence: u64) -> Self {
        InternalKey::new(user_key.to_vec(), sequence, ValueType::Value)
    }

    /// Largest possible internal key for `user_key`. Everything strictly
    /// after it belongs to a greater user key.
    pub fn last_of(user_key: &[u8]) -> Self {
        InternalKey::new(user_key.to_vec(), 0, ValueType::Deletion)
    }

    pub fn user_key(&self) -> &[u8] {
        &self.user_key
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn is_deletion(&self) -> bool {
        self.value_type == ValueType::Deletion
    }
}

impl PartialEq for InternalKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == CmpOrdering::Equal
    }
}

impl Eq for InternalKey {}

impl PartialOrd for InternalKey {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for InternalKey {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.user_key
            .cmp(&other.user_key)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Value as stored: a CRC32 of the payload followed by the payload.
pub(crate) fn encode_value(value: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(CHECKSUM_LEN + value.len());
    buf.put_u32(crc32fast::hash(value));
    buf.put_slice(value);
    buf.freeze()
}

pub(crate) fn decode_value(raw: &Bytes, verify_checksum: bool) -> Result<Slice> {
    if raw.len() < CHECKSUM_LEN {
        return Err(Status::corruption("stored value shorter than its checksum"));
    }
    let payload = raw.slice(CHECKSUM_LEN..);
    if verify_checksum {
        let expected = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]);
        let actual = crc32fast::hash(&payload);
        if expected != actual {
            return Err(Status::corruption(format!(
                "value checksum mismatch: expected {expected:#010x}, got {actual:#010x}"
            )));
        }
    }
    Ok(Slice::from(payload))
}

/// One visible entry produced by [`MemTable::next_visible`].
#[derive(Debug)]
pub struct VisibleEntry {
    pub key: Slice,
    pub value: Slice,
}

/// Multi-version ordered table backing the store.
pub struct MemTable {
    map: SkipMap<InternalKey, Bytes>,
    approximate_memory: AtomicUsize,
}

impl MemTable {
    pub fn new() -> Self {
        MemTable {
            map: SkipMap::new(),
            approximate_memory: AtomicUsize::new(0),
        }
    }

    pub fn add(&self, sequence: u64, key: &[u8], value: &[u8]) {
        let encoded = encode_value(value);
        self.approximate_memory
            .fetch_add(key.len() + encoded.len(), Ordering::Relaxed);
        self.map.insert(
            InternalKey::new(key.to_vec(), sequence, ValueType::Value),
            encoded,
        );
    }

    pub fn delete(&self, sequence: u64, key: &[u8]) {
        self.approximate_memory
            .fetch_add(key.len(), Ordering::Relaxed);
        self.map.insert(
            InternalKey::new(key.to_vec(), sequence, ValueType::Deletion),
            Bytes::new(),
        );
    }

    /// Stores `raw` as-is, bypassing checksum encoding.
    #[cfg(test)]
    pub(crate) fn insert_raw(&self, sequence: u64, key: &[u8], raw: Bytes) {
        self.map.insert(
            InternalKey::new(key.to_vec(), sequence, ValueType::Value),
            raw,
        );
    }

    /// Newest value of `key` visible at `sequence`.
    pub fn get(&self, key: &[u8], sequence: u64, verify_checksum: bool) -> Result<Option<Slice>> {
        let lookup = InternalKey::lookup(key, sequence);
        let Some(entry) = self.map.range(lookup..).next() else {
            return Ok(None);
        };
        if entry.key().user_key() != key || entry.key().is_deletion() {
            return Ok(None);
        }
        decode_value(entry.value(), verify_checksum).map(Some)
    }

    /// First live user key at or after `from`, as visible at `sequence`.
    /// Stops with `None` once `past_end` accepts a user key.
    ///
    /// An excluded `from` names a user key already returned to the caller.
    /// Versions newer than `sequence` are invisible, and a tombstone hides
    /// every older version of its key.
    pub fn next_visible(
        &self,
        from: Bound<&[u8]>,
        sequence: u64,
        past_end: impl Fn(&[u8]) -> bool,
        verify_checksum: bool,
    ) -> Result<Option<VisibleEntry>> {
        let lower = match from {
            Bound::Included(k) => Bound::Included(InternalKey::lookup(k, u64::MAX)),
            Bound::Excluded(k) => Bound::Excluded(InternalKey::last_of(k)),
            Bound::Unbounded => Bound::Unbounded,
        };

        let mut deleted: Option<Vec<u8>> = None;
        for entry in self.map.range((lower, Bound::Unbounded)) {
            let ikey = entry.key();
            if past_end(ikey.user_key()) {
                return Ok(None);
            }
            if deleted.as_deref() == Some(ikey.user_key()) {
                continue;
            }
            if ikey.sequence() > sequence {
                continue;
            }
            if ikey.is_deletion() {
                deleted = Some(ikey.user_key().to_vec());
                continue;
            }

            let value = decode_value(entry.value(), verify_checksum)?;
            return Ok(Some(VisibleEntry {
                key: Slice::from_bytes(ikey.user_key()),
                value,
            }));
        }
        Ok(None)
    }

    /// Drops versions no reader at or above `horizon` can observe.
    ///
    /// For every user key, versions newer than `horizon` are kept along with
    /// the newest version at or below it. That version is dropped too when it
    /// is a tombstone. Returns the number of entries removed.
    ///
    /// Tombstones go last: until the versions a tombstone hides are gone, a
    /// concurrent reader must still find it.
    pub fn garbage_collect(&self, horizon: u64) -> usize {
        let mut removed = 0;
        let mut current_key: Option<Vec<u8>> = None;
        let mut kept_at_horizon = false;
        let mut tombstones = Vec::new();

        for entry in self.map.iter() {
            let ikey = entry.key();
            if current_key.as_deref() != Some(ikey.user_key()) {
                current_key = Some(ikey.user_key().to_vec());
                kept_at_horizon = false;
            }
            if ikey.sequence() > horizon {
                continue;
            }
            if kept_at_horizon {
                entry.remove();
                removed += 1;
                continue;
            }
            kept_at_horizon = true;
            if ikey.is_deletion() {
                tombstones.push(entry);
            }
        }
        for tombstone in tombstones {
            tombstone.remove();
            removed += 1;
        }
        removed
    }

    pub fn num_entries(&self) -> usize {
        self.map.len()
    }

    pub fn approximate_memory_usage(&self) -> usize {
        self.approximate_memory.load(Ordering::Relaxed)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for MemTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(mem: &MemTable, sequence: u64) -> Vec<(Slice, Slice)> {
        let mut out = Vec::new();
        let mut last: Option<Slice> = None;
        loop {
            let from = match &last {
                Some(k) => Bound::Excluded(k.data()),
                None => Bound::Unbounded,
            };
            match mem.next_visible(from, sequence, |_| false, true).unwrap() {
                Some(e) => {
                    last = Some(e.key.clone());
                    out.push((e.key, e.value));
                },
                None => return out,
            }
        }
    }

    #[test]
    fn test_memtable_put_get() {
        let mem = MemTable::new();
        mem.add(1, b"key1", b"value1");

        let value = mem.get(b"key1", 1, true).unwrap();
        assert_eq!(value, Some(Slice::from("value1")));
    }

    #[test]
    fn test_memtable_delete() {
        let mem = MemTable::new();
        mem.add(1, b"key1", b"value1");
        mem.delete(2, b"key1");

        assert_eq!(mem.get(b"key1", 2, true).unwrap(), None);
        assert_eq!(
            mem.get(b"key1", 1, true).unwrap(),
            Some(Slice::from("value1"))
        );
    }

    #[test]
    fn test_memtable_sequence_visibility() {
        let mem = MemTable::new();
        mem.add(1, b"key1", b"value1");
        mem.add(2, b"key1", b"value2");

        assert_eq!(
            mem.get(b"key1", 1, true).unwrap(),
            Some(Slice::from("value1"))
        );
        assert_eq!(
            mem.get(b"key1", 5, true).unwrap(),
            Some(Slice::from("value2"))
        );
        assert_eq!(mem.get(b"key1", 0, true).unwrap(), None);
    }

    #[test]
    fn test_internal_key_order() {
        let newer = InternalKey::new(b"a".to_vec(), 9, ValueType::Value);
        let older = InternalKey::new(b"a".to_vec(), 3, ValueType::Value);
        let other = InternalKey::new(b"a\x00".to_vec(), 100, ValueType::Value);

        assert!(newer < older);
        assert!(older < other);
        assert!(InternalKey::last_of(b"a") < other);
    }

    #[test]
    fn test_next_visible_skips_tombstones_and_future_versions() {
        let mem = MemTable::new();
        mem.add(1, b"a", b"1");
        mem.add(2, b"b", b"2");
        mem.delete(3, b"b");
        mem.add(4, b"c", b"3");
        mem.add(5, b"a", b"new");

        let at_4 = scan_all(&mem, 4);
        assert_eq!(
            at_4,
            vec![
                (Slice::from("a"), Slice::from("1")),
                (Slice::from("c"), Slice::from("3")),
            ]
        );

        let at_2 = scan_all(&mem, 2);
        assert_eq!(
            at_2,
            vec![
                (Slice::from("a"), Slice::from("1")),
                (Slice::from("b"), Slice::from("2")),
            ]
        );
    }

    #[test]
    fn test_checksum_mismatch_is_corruption() {
        let mem = MemTable::new();
        let mut raw = encode_value(b"payload").to_vec();
        raw[5] ^= 0xff;
        mem.insert_raw(1, b"k", Bytes::from(raw));

        let err = mem.get(b"k", 1, true).unwrap_err();
        assert!(err.is_corruption());

        // Without verification the damaged payload is returned untouched.
        assert!(mem.get(b"k", 1, false).unwrap().is_some());
    }

    #[test]
    fn test_truncated_value_is_corruption() {
        let mem = MemTable::new();
        mem.insert_raw(1, b"k", Bytes::from_static(b"ab"));
        assert!(mem.get(b"k", 1, false).unwrap_err().is_corruption());
    }

    #[test]
    fn test_garbage_collect_keeps_visible_versions() {
        let mem = MemTable::new();
        mem.add(1, b"a", b"v1");
        mem.add(2, b"a", b"v2");
        mem.add(3, b"a", b"v3");
        mem.add(1, b"b", b"b1");
        mem.delete(2, b"b");

        // A reader at 2 still needs a@2; a@1 and both versions of b go.
        let removed = mem.garbage_collect(2);
        assert_eq!(removed, 3);
        assert_eq!(mem.num_entries(), 2);

        assert_eq!(mem.get(b"a", 2, true).unwrap(), Some(Slice::from("v2")));
        assert_eq!(mem.get(b"a", 3, true).unwrap(), Some(Slice::from("v3")));
        assert_eq!(mem.get(b"b", 3, true).unwrap(), None);
    }

    #[test]
    fn test_memtable_memory_usage() {
        let mem = MemTable::new();
        assert_eq!(mem.approximate_memory_usage(), 0);

        mem.add(1, b"key1", b"value1");
        assert!(mem.approximate_memory_usage() > 0);
    }
}
