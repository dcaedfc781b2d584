use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Code {
    Ok,
    NotFound,
    Corruption,
    InvalidArgument,
    IOError,
    Busy,
    ShutdownInProgress,
    ViewInvalidated,
    ReleaseFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    code: Code,
    message: Option<String>,
}

impl Status {
    pub fn ok() -> Self {
        Status {
            code: Code::Ok,
            message: None,
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Status {
            code: Code::NotFound,
            message: Some(msg.into()),
        }
    }

    pub fn corruption(msg: impl Into<String>) -> Self {
        Status {
            code: Code::Corruption,
            message: Some(msg.into()),
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Status {
            code: Code::InvalidArgument,
            message: Some(msg.into()),
        }
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Status {
            code: Code::IOError,
            message: Some(msg.into()),
        }
    }

    pub fn busy(msg: impl Into<String>) -> Self {
        Status {
            code: Code::Busy,
            message: Some(msg.into()),
        }
    }

    pub fn shutdown_in_progress(msg: impl Into<String>) -> Self {
        Status {
            code: Code::ShutdownInProgress,
            message: Some(msg.into()),
        }
    }

    /// The point-in-time view a reader was bound to is gone.
    pub fn view_invalidated(msg: impl Into<String>) -> Self {
        Status {
            code: Code::ViewInvalidated,
            message: Some(msg.into()),
        }
    }

    /// Cleanup of a reader's resources failed. The resources must still be
    /// treated as released.
    pub fn release_failed(msg: impl Into<String>) -> Self {
        Status {
            code: Code::ReleaseFailed,
            message: Some(msg.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == Code::Ok
    }

    pub fn is_not_found(&self) -> bool {
        self.code == Code::NotFound
    }

    pub fn is_corruption(&self) -> bool {
        self.code == Code::Corruption
    }

    pub fn is_io_error(&self) -> bool {
        self.code == Code::IOError
    }

    pub fn is_busy(&self) -> bool {
        self.code == Code::Busy
    }

    pub fn is_view_invalidated(&self) -> bool {
        self.code == Code::ViewInvalidated
    }

    pub fn is_release_failed(&self) -> bool {
        self.code == Code::ReleaseFailed
    }

    /// Failures that end a scan: a storage read or decode error, or the loss
    /// of the bound view.
    pub fn is_terminal_read(&self) -> bool {
        matches!(
            self.code,
            Code::IOError | Code::Corruption | Code::ViewInvalidated
        )
    }

    pub fn code(&self) -> &Code {
        &self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{:?}: {}", self.code, msg),
            None => write!(f, "{:?}", self.code),
        }
    }
}

impl std::error::Error for Status {}

impl From<std::io::Error> for Status {
    fn from(err: std::io::Error) -> Self {
        Status::io_error(err.to_string())
    }
}

impl From<serde_json::Error> for Status {
    fn from(err: serde_json::Error) -> Self {
        Status::invalid_argument(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Status>;
