// SPDX-License-Identifier: MIT

//! Little-endian, unaligned zerocopy views of the on-disk records.
//!
//! Blocks are kept as raw byte buffers and these structs are laid over them with
//! `ref_from_prefix` / `mut_from_prefix`, so patches land directly in the block.

mod btree;
mod fs;
mod object;
mod omap;
mod superblock;

pub use btree::*;
pub use fs::*;
pub use object::*;
pub use omap::*;
pub use superblock::*;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Borrows a `T` from the start of `buf`, or `None` when `buf` is too short.
#[inline]
pub fn view<T: FromBytes + KnownLayout + Immutable>(buf: &[u8]) -> Option<&T> {
    T::ref_from_prefix(buf).ok().map(|(v, _)| v)
}

#[inline]
pub fn view_mut<T: FromBytes + IntoBytes + KnownLayout>(buf: &mut [u8]) -> Option<&mut T> {
    T::mut_from_prefix(buf).ok().map(|(v, _)| v)
}
