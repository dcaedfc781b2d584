pub mod cursor;
pub mod db;
pub mod memtable;
pub mod mock;
pub mod statistics;
pub mod transaction;
pub mod util;

pub use cursor::{
    CursorGuard, CursorLatch, CursorState, Entries, FaultCursor, ForwardCursor, SnapshotCursor,
    drain,
};
pub use db::{DB, DBOptions, ReadOptions, WriteOptions};
pub use statistics::Statistics;
pub use transaction::{ReadTransaction, Snapshot, WriteBatch, WriteOp};
pub use util::{Code, KeyRange, Result, Slice, Status};
