// SPDX-License-Identifier: MIT

use core::fmt;

use rimio::errors::*;

/// Error type for partition table reading and writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartError {
    IO(RimIOError),
    /// No partition table, or no entry of the requested type.
    NotFound,
    Invalid(&'static str),
    Other(&'static str),
}

impl PartError {
    pub fn msg(&self) -> &'static str {
        match self {
            PartError::IO(e) => e.msg(),
            PartError::NotFound => "No matching partition found",
            PartError::Invalid(msg) => msg,
            PartError::Other(msg) => msg,
        }
    }
}

impl From<&'static str> for PartError {
    fn from(s: &'static str) -> Self {
        PartError::Other(s)
    }
}

impl From<RimIOError> for PartError {
    fn from(e: RimIOError) -> Self {
        PartError::IO(e)
    }
}

impl fmt::Display for PartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartError::IO(e) => write!(f, "Partition IO error: {e}"),
            _ => write!(f, "{}", self.msg()),
        }
    }
}

impl core::error::Error for PartError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            PartError::IO(e) => Some(e),
            _ => None,
        }
    }
}

pub type PartResult<T = ()> = Result<T, PartError>;
