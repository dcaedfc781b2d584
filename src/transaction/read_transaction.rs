use crate::{
    cursor::{SnapshotCursor, drain},
    db::{DB, ReadOptions},
    transaction::Snapshot,
    util::{KeyRange, Result, Slice},
};

/// Read-only transaction: one point-in-time view shared by every read
/// issued through it.
///
/// Each cursor opened here holds its own pin on the view, so a cursor may
/// outlive the transaction that created it. Dropping the transaction
/// releases the transaction's own pin.
pub struct ReadTransaction<'db> {
    db: &'db DB,
    snapshot: Snapshot,
}

impl<'db> ReadTransaction<'db> {
    pub(crate) fn new(db: &'db DB, snapshot: Snapshot) -> Self {
        ReadTransaction { db, snapshot }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn sequence(&self) -> u64 {
        self.snapshot.sequence()
    }

    pub fn get(&self, key: &Slice) -> Result<Option<Slice>> {
        self.db.get(&ReadOptions::at(&self.snapshot), key)
    }

    /// Open a cursor over `range` in this transaction's view.
    pub fn cursor(&self, range: KeyRange) -> Result<SnapshotCursor> {
        self.db.cursor(&ReadOptions::at(&self.snapshot), range)
    }

    /// Read every pair in `range`, checking for errors and closing the
    /// cursor.
    pub fn scan(&self, range: KeyRange) -> Result<Vec<(Slice, Slice)>> {
        let mut cursor = self.cursor(range)?;
        drain(&mut cursor)
    }
}
