// SPDX-License-Identifier: MIT

//! Directory record name hashing and filesystem key ordering.

use core::cmp::Ordering;

use crc::{CRC_32_ISCSI, Crc};
use unicode_normalization::UnicodeNormalization;

use crate::btree::KeyQuery;
use crate::constant::*;
use crate::errors::*;
use crate::types::*;

const CASTAGNOLI: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

/// 22-bit name hash stored in hashed directory record keys.
///
/// CRC-32C over the UTF-32LE code points of the lower-cased, NFD-normalized
/// name. The complement undoes the final XOR of the CRC, leaving the raw register.
pub fn drec_name_hash(name: &str) -> u32 {
    let mut digest = CASTAGNOLI.digest();
    for c in name.chars().flat_map(char::to_lowercase).nfd() {
        digest.update(&(c as u32).to_le_bytes());
    }
    !digest.finalize() & DREC_NAME_HASH_MASK
}

/// Orders two packed key headers by (object id, record type).
#[inline]
pub fn compare_fs_key_header(a: u64, b: u64) -> Ordering {
    let split = |h: u64| (h & OBJ_ID_MASK, h >> OBJ_TYPE_SHIFT);
    split(a).cmp(&split(b))
}

/// Name part of a directory record key. Names exclude the trailing NUL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrecName<'a> {
    Hashed { hash: u32, name: &'a [u8] },
    Plain { name: &'a [u8] },
}

impl<'a> DrecName<'a> {
    pub fn bytes(&self) -> &'a [u8] {
        match self {
            DrecName::Hashed { name, .. } | DrecName::Plain { name } => *name,
        }
    }
}

fn name_slice(key: &[u8], start: usize, len_with_nul: usize) -> ApfsResult<&[u8]> {
    let len = len_with_nul.saturating_sub(1);
    key.get(start..start + len)
        .ok_or(ApfsError::MalformedKey("directory record name overruns its key"))
}

/// How the directory record keys of one filesystem tree are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrecKeyFormat {
    /// Hashed when the upper 22 bits after the header are set, plain otherwise.
    #[default]
    Detect,
    /// Every key is a plain `j_drec_key_t`: volumes that are neither case- nor
    /// normalization-insensitive.
    Plain,
}

impl DrecKeyFormat {
    pub fn for_volume(hashed_names: bool) -> Self {
        if hashed_names {
            DrecKeyFormat::Detect
        } else {
            DrecKeyFormat::Plain
        }
    }
}

/// Header of a filesystem-tree key.
pub(crate) fn fs_key_header(key: &[u8]) -> ApfsResult<u64> {
    view::<JKey>(key)
        .map(|k| k.obj_id_and_type.get())
        .ok_or(ApfsError::MalformedKey("filesystem key shorter than its header"))
}

/// Parses the name of a directory record key (header included in `key`).
///
/// With [`DrecKeyFormat::Detect`] a hashed key is recognized by non-zero upper
/// 22 bits in the 4 bytes after the header; otherwise the key is read as a plain
/// one with a 2-byte length.
pub fn parse_drec_name(key: &[u8], format: DrecKeyFormat) -> ApfsResult<DrecName<'_>> {
    if format == DrecKeyFormat::Detect
        && let Some(k) = view::<JDrecHashedKey>(key)
    {
        let field = k.name_len_and_hash.get();
        if field & J_DREC_HASH_MASK != 0 {
            let hash = (field & J_DREC_HASH_MASK) >> J_DREC_HASH_SHIFT;
            let len = (field & J_DREC_LEN_MASK) as usize;
            let name = name_slice(key, size_of::<JDrecHashedKey>(), len)?;
            return Ok(DrecName::Hashed { hash, name });
        }
    }
    let k = view::<JDrecKey>(key).ok_or(ApfsError::MalformedKey(
        "directory record key shorter than its header",
    ))?;
    let name = name_slice(key, size_of::<JDrecKey>(), k.name_len.get() as usize)?;
    Ok(DrecName::Plain { name })
}

fn lowercase_cmp(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Directory lookup target: the entry named `name` in directory `parent`.
#[derive(Debug, Clone, Copy)]
pub struct DrecTarget<'n> {
    pub parent: u64,
    pub name: &'n str,
    pub hash: u32,
    pub format: DrecKeyFormat,
}

impl<'n> DrecTarget<'n> {
    pub fn new(parent: u64, name: &'n str) -> Self {
        Self {
            parent,
            name,
            hash: drec_name_hash(name),
            format: DrecKeyFormat::Detect,
        }
    }

    #[inline]
    pub fn with_format(mut self, format: DrecKeyFormat) -> Self {
        self.format = format;
        self
    }

    #[inline]
    pub fn header(&self) -> u64 {
        pack_key_header(self.parent, APFS_TYPE_DIR_REC)
    }
}

/// Orders a filesystem-tree key against a directory lookup target.
///
/// Headers decide first. Between directory records of the same parent, hashed
/// keys order by hash and then by case-insensitive name (raw bytes when the
/// stored name is not UTF-8); plain keys order by their raw name bytes.
pub fn compare_drec_key(key: &[u8], target: &DrecTarget<'_>) -> ApfsResult<Ordering> {
    let ord = compare_fs_key_header(fs_key_header(key)?, target.header());
    if ord != Ordering::Equal {
        return Ok(ord);
    }

    Ok(match parse_drec_name(key, target.format)? {
        DrecName::Hashed { hash, name } => {
            hash.cmp(&target.hash)
                .then_with(|| match core::str::from_utf8(name) {
                    Ok(name) => lowercase_cmp(name, target.name),
                    Err(_) => name.cmp(target.name.as_bytes()),
                })
        }
        DrecName::Plain { name } => name.cmp(target.name.as_bytes()),
    })
}

impl KeyQuery for DrecTarget<'_> {
    fn order(&self, key: &[u8]) -> ApfsResult<Ordering> {
        compare_drec_key(key, self)
    }

    /// Only the exact stored name matches; case variants sharing a hash are skipped.
    fn rank(&self, key: &[u8]) -> ApfsResult<Option<u64>> {
        if fs_key_header(key)? != self.header() {
            return Ok(None);
        }
        let name = parse_drec_name(key, self.format)?;
        Ok((name.bytes() == self.name.as_bytes()).then_some(0))
    }
}
