mod read_transaction;
pub(crate) mod snapshot;
mod write_batch;

pub use read_transaction::ReadTransaction;
pub use snapshot::Snapshot;
pub use write_batch::{WriteBatch, WriteOp};
