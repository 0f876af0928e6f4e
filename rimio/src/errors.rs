// SPDX-License-Identifier: MIT

use core::fmt;

/// Result type for RimIO operations.
pub type RimIOResult<T = ()> = core::result::Result<T, RimIOError>;

/// Error type for RimIO operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RimIOError {
    Other(&'static str),
    /// Caller passed arguments the backend cannot honour (bad buffer length, oversized struct).
    Invalid(&'static str),
    OutOfBounds,
    Unsupported,
    /// Underlying OS error, reduced to its kind so the error stays `Copy`.
    #[cfg(feature = "std")]
    Io(std::io::ErrorKind),
}

impl RimIOError {
    pub fn msg(&self) -> &'static str {
        match self {
            RimIOError::Other(msg) => msg,
            RimIOError::Invalid(msg) => msg,
            RimIOError::OutOfBounds => "Out of bounds",
            RimIOError::Unsupported => "Unsupported operation",
            #[cfg(feature = "std")]
            RimIOError::Io(_) => "I/O error",
        }
    }
}

impl From<&'static str> for RimIOError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        RimIOError::Other(msg)
    }
}

impl fmt::Display for RimIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            #[cfg(feature = "std")]
            RimIOError::Io(kind) => write!(f, "{}: {}", self.msg(), kind),
            _ => write!(f, "{}", self.msg()),
        }
    }
}

impl core::error::Error for RimIOError {}

#[cfg(feature = "std")]
impl From<std::io::Error> for RimIOError {
    #[cold]
    #[inline(never)]
    fn from(e: std::io::Error) -> Self {
        match e.kind() {
            std::io::ErrorKind::UnexpectedEof => RimIOError::OutOfBounds,
            kind => RimIOError::Io(kind),
        }
    }
}
