// SPDX-License-Identifier: MIT

#[macro_export]
/// Defines a table of GPT partition type GUIDs (stored mixed-endian, as on disk).
///
/// For each `NAME => "description", [bytes]` this generates:
/// - `pub const GPT_PARTITION_TYPE_<NAME>: [u8; 16]`
/// - `pub fn detect_<name>_partition_offset(io) -> PartResult<u64>`, the byte offset of the
///   first partition of that type (512-byte sectors)
/// - `pub fn is_<name>_partition(entry: &GptEntry) -> bool`
///
/// plus a `GptPartitionKind` enum with an `Unknown` fallback, `from_guid`, `as_guid` and `Display`.
///
/// # Example
/// ```rust,ignore
/// define_partition_types! {
///     ESP => "EFI System Partition", [0x28, 0x73, 0x2A, 0xC1, 0x1F, 0xF8, 0xD2, 0x11, 0xBA, 0x4B, 0x00, 0xA0, 0xC9, 0x3E, 0xC9, 0x3B],
/// }
/// ```
macro_rules! define_partition_types {
    (
        $(
            $name:ident => $desc:literal, $guid:expr
        ),+ $(,)?
    ) => {
        paste::paste! {
            $(
                #[doc = $desc]
                pub const [<GPT_PARTITION_TYPE_ $name:upper>]: [u8; 16] = $guid;

                #[doc = concat!("Returns the byte offset of the first GPT partition of type: ", $desc)]
                pub fn [<detect_ $name:lower _partition_offset>]<IO: rimio::prelude::RimIO + ?Sized>(
                    io: &mut IO,
                ) -> $crate::errors::PartResult<u64> {
                    $crate::gpt::find_partition_offset(
                        io,
                        &[<GPT_PARTITION_TYPE_ $name:upper>],
                        $crate::DEFAULT_SECTOR_SIZE,
                    )
                }

                #[doc = concat!("Checks if a GPT partition is of type: ", $desc)]
                pub fn [<is_ $name:lower _partition>](entry: &$crate::gpt::GptEntry) -> bool {
                    entry.type_guid == [<GPT_PARTITION_TYPE_ $name:upper>]
                }
            )+

            #[allow(non_camel_case_types)]
            #[derive(Debug, Clone, PartialEq, Eq)]
            pub enum GptPartitionKind {
                $($name,)+
                Unknown([u8; 16]),
            }

            impl GptPartitionKind {
                pub fn from_guid(guid: &[u8; 16]) -> Self {
                    match guid {
                        $(g if g == &[<GPT_PARTITION_TYPE_ $name:upper>] => Self::$name,)+
                        other => Self::Unknown(*other),
                    }
                }

                pub fn as_guid(&self) -> Option<&'static [u8; 16]> {
                    match self {
                        $(Self::$name => Some(&[<GPT_PARTITION_TYPE_ $name:upper>]),)+
                        Self::Unknown(_) => None,
                    }
                }
            }

            impl core::fmt::Display for GptPartitionKind {
                fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                    match self {
                        $(Self::$name => f.write_str($desc),)+
                        Self::Unknown(guid) => write!(f, "Unknown ({:02X?})", guid),
                    }
                }
            }
        }
    };
}
