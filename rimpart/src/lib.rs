// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
mod macros;
mod io_ext;

pub mod errors;
/// GUID Partition Table (GPT) reading and writing.
pub mod gpt;
/// Partition type GUIDs.
pub mod guids;

pub use io_ext::RimIOLbaExt;

pub const DEFAULT_SECTOR_SIZE: u64 = 512;
