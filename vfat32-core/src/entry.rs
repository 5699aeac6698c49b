use alloc::string::String;

use bin_tools::{read_u16_le, read_u32_le, read_u8};
use bitflags::bitflags;

use crate::read_padded_str;

pub const DIRECTORY_ENTRY_SIZE: usize = 32;

/// First name byte of a slot whose entry was removed.
pub const DELETED_MARKER: u8 = 0xE5;

pub const ATTRIBUTES_OFFSET: usize = 0x0B;

pub const LFN_CHARACTERS_PER_SLOT: usize = 13;
pub const LFN_BYTES_PER_SLOT: usize = LFN_CHARACTERS_PER_SLOT * 2;

/// A long name holds at most 255 characters, so it never needs more than
/// 20 slots.
pub const MAX_LFN_SLOTS: usize = 20;
pub const MAX_NAME_LENGTH: usize = 255;

const LFN_ORDINAL_MASK: u8 = 0x3F;
const LFN_LAST_SLOT_FLAG: u8 = 0x40;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Attributes: u8 {
        const READ_ONLY = 0x01;
        const HIDDEN = 0x02;
        const SYSTEM = 0x04;
        const VOLUME_ID = 0x08;
        const DIRECTORY = 0x10;
        const ARCHIVE = 0x20;

        const LONG_NAME = Self::READ_ONLY.bits()
            | Self::HIDDEN.bits()
            | Self::SYSTEM.bits()
            | Self::VOLUME_ID.bits();
    }
}

impl Attributes {
    /// Long name slots set all four low bits.
    pub fn is_long_name(self) -> bool {
        self.contains(Self::LONG_NAME)
    }
}

/// How a raw 32 byte slot has to be treated while walking a directory.
#[derive(Debug, Clone, Copy)]
pub enum DirectoryEntry {
    End,
    Deleted,
    LFN(LongFileNameEntry),
    Real(ShortEntry),
}

impl DirectoryEntry {
    pub fn read(input: &[u8]) -> Self {
        if is_terminator(input) {
            Self::End
        } else if is_deleted(input) {
            Self::Deleted
        } else if is_long_name_slot(input) {
            Self::LFN(LongFileNameEntry::read(input))
        } else {
            Self::Real(ShortEntry::read(input))
        }
    }
}

/// The directory ends at the first slot whose name starts with a zero byte.
pub fn is_terminator(slot: &[u8]) -> bool {
    slot[0] == 0x00
}

pub fn is_deleted(slot: &[u8]) -> bool {
    slot[0] == DELETED_MARKER
}

pub fn is_long_name_slot(slot: &[u8]) -> bool {
    Attributes::from_bits_retain(slot[ATTRIBUTES_OFFSET]).is_long_name()
}

#[derive(Debug, Clone, Copy)]
pub struct LongFileNameEntry {
    /// offset 0x00
    sequence_number: u8,
    /// 5 - offset 0x01
    /// 6 - offset 0x0E
    /// 2 - offset 0x1C
    name: [u8; LFN_BYTES_PER_SLOT],
    /// offset 0x0D
    short_name_checksum: u8,
}

impl LongFileNameEntry {
    pub fn read(input: &[u8]) -> Self {
        Self {
            sequence_number: read_u8(input, 0x00),
            name: Self::read_name(input),
            short_name_checksum: read_u8(input, 0x0D),
        }
    }

    pub fn sequence_number(&self) -> u8 {
        self.sequence_number
    }

    /// Zero based position of this slot's characters within the name.
    ///
    /// `None` when the slot carries the invalid ordinal 0.
    pub fn ordinal(&self) -> Option<usize> {
        ((self.sequence_number & LFN_ORDINAL_MASK) as usize).checked_sub(1)
    }

    /// Set on the physically first slot, which holds the end of the name.
    pub fn is_last(&self) -> bool {
        (self.sequence_number & LFN_LAST_SLOT_FLAG) != 0
    }

    pub fn short_name_checksum(&self) -> u8 {
        self.short_name_checksum
    }

    /// The slot's 13 UTF-16LE characters, in order.
    pub fn name_bytes(&self) -> &[u8; LFN_BYTES_PER_SLOT] {
        &self.name
    }

    fn read_name(input: &[u8]) -> [u8; LFN_BYTES_PER_SLOT] {
        let name_1: [u8; 10] = read_padded_str(input, 0x01);
        let name_2: [u8; 12] = read_padded_str(input, 0x0E);
        let name_3: [u8; 4] = read_padded_str(input, 0x1C);

        let mut name = [0u8; LFN_BYTES_PER_SLOT];

        name[0..10].copy_from_slice(&name_1);
        name[10..22].copy_from_slice(&name_2);
        name[22..26].copy_from_slice(&name_3);

        name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DosDateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl DosDateTime {
    pub fn from_raw(date: u16, time: u16) -> Self {
        Self {
            year: 1980 + (date >> 9),
            month: ((date >> 5) & 0x0F) as u8,
            day: (date & 0x1F) as u8,
            hour: (time >> 11) as u8,
            minute: ((time >> 5) & 0x3F) as u8,
            second: ((time & 0x1F) * 2) as u8,
        }
    }
}

/// The canonical 8.3 entry that closes every directory record.
#[derive(Debug, Clone, Copy)]
pub struct ShortEntry {
    /// offset 0x00
    short_name: [u8; 11],
    /// offset 0x0B
    attributes: Attributes,
    /// offset 0x0C
    entry_case: u8,
    /// offset 0x14 (high half) and 0x1A (low half)
    cluster_number: u32,
    /// offset 0x16
    modified_time: u16,
    /// offset 0x18
    modified_date: u16,
    /// offset 0x1C
    file_size: u32,
}

impl ShortEntry {
    pub fn read(input: &[u8]) -> Self {
        let high_cluster_number = read_u16_le(input, 0x14);
        let lower_cluster_number = read_u16_le(input, 0x1A);

        Self {
            short_name: read_padded_str(input, 0x00),
            attributes: Attributes::from_bits_retain(read_u8(input, 0x0B)),
            entry_case: read_u8(input, 0x0C),
            cluster_number: ((high_cluster_number as u32) << 16) | (lower_cluster_number as u32),
            modified_time: read_u16_le(input, 0x16),
            modified_date: read_u16_le(input, 0x18),
            file_size: read_u32_le(input, 0x1C),
        }
    }

    pub fn start_cluster(&self) -> u32 {
        self.cluster_number
    }

    pub fn attributes(&self) -> Attributes {
        self.attributes
    }

    pub fn is_dir(&self) -> bool {
        self.attributes.contains(Attributes::DIRECTORY)
    }

    pub fn is_volume_label(&self) -> bool {
        self.attributes.contains(Attributes::VOLUME_ID) && !self.is_dir()
    }

    pub fn is_file(&self) -> bool {
        !self.attributes.intersects(Attributes::DIRECTORY | Attributes::VOLUME_ID)
    }

    /// The `.` and `..` records at the start of every subdirectory.
    pub fn is_dot_entry(&self) -> bool {
        &self.short_name == b".          " || &self.short_name == b"..         "
    }

    pub fn has_extension(&self) -> bool {
        &self.short_name[8..11] != b"   "
    }

    pub fn name_bytes(&self) -> &[u8; 11] {
        &self.short_name
    }

    pub fn is_name_lowercase(&self) -> bool {
        (self.entry_case & (1 << 3)) != 0
    }

    pub fn is_extension_lowercase(&self) -> bool {
        (self.entry_case & (1 << 4)) != 0
    }

    pub fn file_size(&self) -> u32 {
        self.file_size
    }

    pub fn modified(&self) -> DosDateTime {
        DosDateTime::from_raw(self.modified_date, self.modified_time)
    }

    /// The name as `NAME.EXT`, padding removed.
    pub fn display_name(&self) -> String {
        let mut name = String::with_capacity(12);

        push_padded(
            &mut name,
            &self.short_name[0..8],
            self.is_name_lowercase(),
        );

        if self.has_extension() {
            name.push('.');
            push_padded(
                &mut name,
                &self.short_name[8..11],
                self.is_extension_lowercase(),
            );
        }

        name
    }

    /// Checksum that every long name slot of this entry must carry.
    pub fn checksum(&self) -> u8 {
        self.short_name
            .iter()
            .fold(0u8, |sum, b| sum.rotate_right(1).wrapping_add(*b))
    }
}

fn push_padded(name: &mut String, bytes: &[u8], lowercase: bool) {
    let end = bytes.iter().rposition(|b| *b != b' ').map_or(0, |i| i + 1);

    for b in &bytes[..end] {
        // 0x05 stands in for a leading 0xE5 byte
        let b = if *b == 0x05 { DELETED_MARKER } else { *b };
        let c = if lowercase { b.to_ascii_lowercase() } else { b };
        name.push(char::from(c));
    }
}
