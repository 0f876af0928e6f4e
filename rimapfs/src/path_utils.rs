// SPDX-License-Identifier: MIT

//! Volume-relative path helpers (no_std + alloc).
//!
//! Paths inside a volume are always `/`-separated and relative to the root
//! directory; a leading `/` is accepted and ignored.

use alloc::vec::Vec;

/// Splits a path into its components, using `/` as separator.
///
/// Returns a Vec of non-empty components.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|part| !part.is_empty()).collect()
}
