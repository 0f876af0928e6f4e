// SPDX-License-Identifier: MIT

//! Partition type GUIDs an Apple or dual-boot disk image is likely to carry.

define_partition_types! {
    APFS => "APFS Container", [
        0xEF, 0x57, 0x34, 0x7C, 0x00, 0x00, 0xAA, 0x11,
        0xAA, 0x11, 0x00, 0x30, 0x65, 0x43, 0xEC, 0xAC,
    ],
    HFS_PLUS => "Apple HFS+", [
        0x00, 0x53, 0x46, 0x48, 0x00, 0x00, 0xAA, 0x11,
        0xAA, 0x11, 0x00, 0x30, 0x65, 0x43, 0xEC, 0xAC,
    ],
    APPLE_BOOT => "Apple Boot (Recovery HD)", [
        0x74, 0x6F, 0x6F, 0x42, 0x00, 0x00, 0xAA, 0x11,
        0xAA, 0x11, 0x00, 0x30, 0x65, 0x43, 0xEC, 0xAC,
    ],
    ESP => "EFI System Partition", [
        0x28, 0x73, 0x2A, 0xC1, 0x1F, 0xF8, 0xD2, 0x11,
        0xBA, 0x4B, 0x00, 0xA0, 0xC9, 0x3E, 0xC9, 0x3B,
    ],
    LINUX_FS => "Linux Filesystem", [
        0xAF, 0x3D, 0xC6, 0x0F, 0x83, 0x84, 0x72, 0x47,
        0x8E, 0x79, 0x3D, 0x69, 0xD8, 0x47, 0x7D, 0xE4,
    ],
}
