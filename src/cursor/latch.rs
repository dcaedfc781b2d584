use crate::util::{Result, Status};

/// Lifecycle position of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// More pairs may follow.
    Open,
    /// No further pair will be returned, because the range was consumed or
    /// because an error was latched.
    Exhausted,
    /// Released. Terminal.
    Closed,
}

/// Shared bookkeeping for cursor backends.
///
/// Holds the state, the monotonic error slot and the result of the first
/// close. Backends call [`CursorLatch::can_advance`] before touching storage
/// and route every failure through [`CursorLatch::fail`].
#[derive(Debug)]
pub struct CursorLatch {
    state: CursorState,
    error: Option<Status>,
    close_result: Option<Result<()>>,
}

impl CursorLatch {
    pub fn new() -> Self {
        CursorLatch {
            state: CursorState::Open,
            error: None,
            close_result: None,
        }
    }

    /// A latch for a cursor whose range holds nothing.
    pub fn exhausted() -> Self {
        CursorLatch {
            state: CursorState::Exhausted,
            ..Self::new()
        }
    }

    #[inline]
    pub fn state(&self) -> CursorState {
        self.state
    }

    #[inline]
    pub fn can_advance(&self) -> bool {
        self.state == CursorState::Open
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state == CursorState::Closed
    }

    #[inline]
    pub fn is_errored(&self) -> bool {
        self.error.is_some()
    }

    /// Open -> Exhausted. No effect in any other state.
    pub fn exhaust(&mut self) {
        if self.state == CursorState::Open {
            self.state = CursorState::Exhausted;
        }
    }

    /// Latches `status` unless an earlier error is already held, and stops
    /// further advancing.
    ///
    /// Returns `true` if `status` became the latched error.
    pub fn fail(&mut self, status: Status) -> bool {
        if self.state == CursorState::Closed {
            return false;
        }
        self.exhaust();
        if self.error.is_some() {
            return false;
        }
        self.error = Some(status);
        true
    }

    pub fn status(&self) -> Result<()> {
        match &self.error {
            Some(status) => Err(status.clone()),
            None => Ok(()),
        }
    }

    /// Runs `release` on the first call only and caches its result.
    pub fn close_with(&mut self, release: impl FnOnce() -> Result<()>) -> Result<()> {
        if let Some(result) = &self.close_result {
            return result.clone();
        }
        let result = release();
        self.state = CursorState::Closed;
        self.close_result = Some(result.clone());
        result
    }
}

impl Default for CursorLatch {
    fn default() -> Self {
        Self::new()
    }
}
