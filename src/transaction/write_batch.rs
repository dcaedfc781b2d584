use std::collections::HashMap;

use crate::util::{Result, Slice, Status};

/// Write operation type
#[derive(Debug, Clone)]
pub enum WriteOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

impl WriteOp {
    pub fn key(&self) -> &[u8] {
        match self {
            WriteOp::Put { key, .. } | WriteOp::Delete { key } => key,
        }
    }
}

/// WriteBatch accumulates multiple write operations for atomic execution.
///
/// All operations of a batch become visible to new views at once.
pub struct WriteBatch {
    /// Operations in insertion order
    ops: Vec<WriteOp>,
    /// key -> latest op index
    index: HashMap<Vec<u8>, usize>,
    /// Approximate memory usage in bytes
    data_size: usize,
}

impl WriteBatch {
    /// Create a new empty WriteBatch
    #[inline]
    pub fn new() -> Self {
        WriteBatch {
            ops: Vec::new(),
            index: HashMap::new(),
            data_size: 0,
        }
    }

    /// Create WriteBatch with reserved capacity
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        WriteBatch {
            ops: Vec::with_capacity(capacity),
            index: HashMap::new(),
            data_size: 0,
        }
    }

    /// Add a Put operation to the batch
    pub fn put(&mut self, key: Slice, value: Slice) -> Result<()> {
        if key.is_empty() {
            return Err(Status::invalid_argument("empty key"));
        }
        let key_vec = key.to_vec();
        let value_vec = value.to_vec();

        self.data_size += key_vec.len() + value_vec.len();

        self.index.insert(key_vec.clone(), self.ops.len());
        self.ops.push(WriteOp::Put {
            key: key_vec,
            value: value_vec,
        });

        Ok(())
    }

    /// Add a Delete operation to the batch
    pub fn delete(&mut self, key: Slice) -> Result<()> {
        if key.is_empty() {
            return Err(Status::invalid_argument("empty key"));
        }
        let key_vec = key.to_vec();

        self.data_size += key_vec.len();

        self.index.insert(key_vec.clone(), self.ops.len());
        self.ops.push(WriteOp::Delete { key: key_vec });

        Ok(())
    }

    /// Latest operation recorded for a key
    pub fn latest(&self, key: &[u8]) -> Option<&WriteOp> {
        self.index.get(key).and_then(|&idx| self.ops.get(idx))
    }

    #[inline]
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.index.contains_key(key)
    }

    #[inline]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Number of operations in the batch
    #[inline]
    pub fn count(&self) -> usize {
        self.ops.len()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
        self.index.clear();
        self.data_size = 0;
    }

    /// Approximate memory usage in bytes
    #[inline]
    pub fn data_size(&self) -> usize {
        self.data_size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl Default for WriteBatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_batch_basic() {
        let mut batch = WriteBatch::new();

        batch.put(Slice::from("key1"), Slice::from("value1")).unwrap();
        batch.put(Slice::from("key2"), Slice::from("value2")).unwrap();
        batch.delete(Slice::from("key3")).unwrap();

        assert_eq!(batch.count(), 3);
        assert_eq!(batch.data_size(), 4 + 6 + 4 + 6 + 4);
    }

    #[test]
    fn test_write_batch_index() {
        let mut batch = WriteBatch::new();

        batch.put(Slice::from("key1"), Slice::from("value1")).unwrap();
        batch.put(Slice::from("key1"), Slice::from("value2")).unwrap();

        match batch.latest(b"key1") {
            Some(WriteOp::Put { value, .. }) => assert_eq!(value, b"value2"),
            _ => panic!("Expected Put operation"),
        }
    }

    #[test]
    fn test_write_batch_delete_in_index() {
        let mut batch = WriteBatch::new();

        batch.put(Slice::from("key1"), Slice::from("value1")).unwrap();
        batch.delete(Slice::from("key1")).unwrap();

        match batch.latest(b"key1") {
            Some(WriteOp::Delete { .. }) => {},
            _ => panic!("Expected Delete operation"),
        }
    }

    #[test]
    fn test_write_batch_clear() {
        let mut batch = WriteBatch::new();

        batch.put(Slice::from("key1"), Slice::from("value1")).unwrap();
        assert_eq!(batch.count(), 1);

        batch.clear();
        assert!(batch.is_empty());
        assert_eq!(batch.data_size(), 0);
        assert!(!batch.contains_key(b"key1"));
    }

    #[test]
    fn test_write_batch_rejects_empty_key() {
        let mut batch = WriteBatch::new();
        let err = batch.put(Slice::empty(), Slice::from("v")).unwrap_err();
        assert_eq!(err.code(), &crate::util::Code::InvalidArgument);
        assert!(batch.delete(Slice::empty()).is_err());
    }
}
