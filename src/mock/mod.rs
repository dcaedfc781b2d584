//! Scripted test double for [`ForwardCursor`].
//!
//! Code that consumes cursors can be tested without a store: script the
//! results each operation should return, run the code under test, then
//! check the recorded call sequence and that every scripted result was used.
//!
//! ```ignore
//! let mock = MockCursor::new()
//!     .expect_entries([(Slice::from("a"), Slice::from("1"))])
//!     .expect_exhausted()
//!     .expect_status(Ok(()))
//!     .expect_close(Ok(()));
//! let handle = mock.handle();
//!
//! count_rows(Box::new(mock))?;
//!
//! assert_eq!(handle.calls(), vec![Call::Next, Call::Next, Call::Status, Call::Close]);
//! handle.verify();
//! ```
//!
//! A call with nothing scripted for it panics, failing the test at the
//! offending call.

use std::{collections::VecDeque, sync::Arc};

use parking_lot::Mutex;

use crate::{
    cursor::ForwardCursor,
    util::{Result, Slice},
};

/// One recorded call on a [`MockCursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Next,
    Status,
    Close,
}

#[derive(Default)]
struct MockState {
    next: VecDeque<Option<(Slice, Slice)>>,
    status: VecDeque<Result<()>>,
    close: VecDeque<Result<()>>,
    calls: Vec<Call>,
}

/// A [`ForwardCursor`] that returns scripted results.
///
/// Results are consumed in the order they were scripted, per operation.
pub struct MockCursor {
    state: Arc<Mutex<MockState>>,
}

/// Inspection handle that outlives the mock once it is moved into the code
/// under test.
#[derive(Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockCursor {
    pub fn new() -> Self {
        MockCursor {
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Script one result for `next`.
    pub fn expect_next(self, entry: Option<(Slice, Slice)>) -> Self {
        self.state.lock().next.push_back(entry);
        self
    }

    /// Script one `next` result per pair.
    pub fn expect_entries(self, entries: impl IntoIterator<Item = (Slice, Slice)>) -> Self {
        self.state
            .lock()
            .next
            .extend(entries.into_iter().map(Some));
        self
    }

    /// Script a `None` from `next`.
    pub fn expect_exhausted(self) -> Self {
        self.expect_next(None)
    }

    pub fn expect_status(self, result: Result<()>) -> Self {
        self.state.lock().status.push_back(result);
        self
    }

    pub fn expect_close(self, result: Result<()>) -> Self {
        self.state.lock().close.push_back(result);
        self
    }

    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: Arc::clone(&self.state),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.handle().calls()
    }

    pub fn verify(&self) {
        self.handle().verify()
    }
}

impl Default for MockCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHandle {
    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    /// Panics if any scripted result was never consumed.
    pub fn verify(&self) {
        let state = self.state.lock();
        assert!(
            state.next.is_empty(),
            "MockCursor: {} scripted next result(s) not consumed",
            state.next.len()
        );
        assert!(
            state.status.is_empty(),
            "MockCursor: {} scripted status result(s) not consumed",
            state.status.len()
        );
        assert!(
            state.close.is_empty(),
            "MockCursor: {} scripted close result(s) not consumed",
            state.close.len()
        );
    }
}

impl ForwardCursor for MockCursor {
    fn next(&mut self) -> Option<(Slice, Slice)> {
        let mut state = self.state.lock();
        state.calls.push(Call::Next);
        match state.next.pop_front() {
            Some(entry) => entry,
            None => panic!("MockCursor: unexpected call to next"),
        }
    }

    fn status(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(Call::Status);
        match state.status.pop_front() {
            Some(result) => result,
            None => panic!("MockCursor: unexpected call to status"),
        }
    }

    fn close(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(Call::Close);
        match state.close.pop_front() {
            Some(result) => result,
            None => panic!("MockCursor: unexpected call to close"),
        }
    }
}
