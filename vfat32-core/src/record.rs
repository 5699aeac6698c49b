use core::str;

use bin_tools::{read_u16_le, read_u32_le, read_u8};

use crate::{read_padded_str, Error};

/// Bytes of the boot sector that have to be present to decode a record.
pub const BOOT_RECORD_SIZE: usize = 0x52;

/// First cluster index that addresses the data region.
pub const FIRST_DATA_CLUSTER: u32 = 2;

/// FAT32 entries are 28 bit values stored in 32 bit slots.
pub const FAT_ENTRY_MASK: u32 = 0x0FFF_FFFF;

/// Smallest masked FAT value that marks the end of a chain.
pub const END_OF_CHAIN: u32 = 0x0FFF_FFF8;

pub const FAT_ENTRY_SIZE: u64 = 4;

/// True when `cluster` does not name a data cluster, i.e. the chain it was
/// read from has ended.
pub fn is_end_of_chain(cluster: u32) -> bool {
    cluster < FIRST_DATA_CLUSTER || cluster >= END_OF_CHAIN
}

/// Geometry of a FAT32 volume, decoded once from the boot sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootRecord {
    // ----- BIOS Parameter Block -----
    /// offset 0x0B
    bytes_per_sector: u16,
    /// offset 0x0D
    sectors_per_cluster: u8,
    /// offset 0x0E
    num_reserved_sectors: u16,
    /// offset 0x10
    num_file_allocation_tables: u8,
    /// offset 0x11
    num_root_directory_entries: u16,
    /// offset 0x13
    total_sectors: u16,
    /// offset 0x20
    large_total_sectors: u32,
    // ----- Extended Boot Record -----
    /// offset 0x24
    sectors_per_fat: u32,
    /// offset 0x2C
    root_directory_cluster: u32,
    /// offset 0x30
    fs_info_sector: u16,
    /// offset 0x42
    signature: u8, // 0x28 or 0x29
    /// offset 0x43
    volume_serial_number: u32,
    /// offset 0x47
    volume_label: [u8; 11],
}

impl BootRecord {
    /// Decodes and validates the boot sector held in `buffer`.
    pub fn read(buffer: &[u8]) -> Result<Self, Error> {
        if buffer.len() < BOOT_RECORD_SIZE {
            return Err(Error::BufferSizeTooSmall(buffer.len()));
        }

        let record = Self {
            bytes_per_sector: read_u16_le(buffer, 0x0B),
            sectors_per_cluster: read_u8(buffer, 0x0D),
            num_reserved_sectors: read_u16_le(buffer, 0x0E),
            num_file_allocation_tables: read_u8(buffer, 0x10),
            num_root_directory_entries: read_u16_le(buffer, 0x11),
            total_sectors: read_u16_le(buffer, 0x13),
            large_total_sectors: read_u32_le(buffer, 0x20),
            sectors_per_fat: read_u32_le(buffer, 0x24),
            root_directory_cluster: read_u32_le(buffer, 0x2C),
            fs_info_sector: read_u16_le(buffer, 0x30),
            signature: read_u8(buffer, 0x42),
            volume_serial_number: read_u32_le(buffer, 0x43),
            volume_label: read_padded_str(buffer, 0x47),
        };

        record.validate()?;

        Ok(record)
    }

    fn validate(&self) -> Result<(), Error> {
        // Only FAT12/16 keep a fixed-size root directory
        if self.num_root_directory_entries != 0 {
            return Err(Error::NotFat32(self.num_root_directory_entries));
        }
        if self.bytes_per_sector == 0 {
            return Err(Error::InvalidGeometry("zero bytes per sector"));
        }
        if self.sectors_per_cluster == 0 {
            return Err(Error::InvalidGeometry("zero sectors per cluster"));
        }
        if self.num_file_allocation_tables == 0 || self.sectors_per_fat == 0 {
            return Err(Error::InvalidGeometry("no file allocation table"));
        }

        Ok(())
    }

    pub fn bytes_per_sector(&self) -> u16 {
        self.bytes_per_sector
    }

    pub fn sectors_per_cluster(&self) -> u8 {
        self.sectors_per_cluster
    }

    pub fn num_reserved_sectors(&self) -> u16 {
        self.num_reserved_sectors
    }

    pub fn num_fats(&self) -> u8 {
        self.num_file_allocation_tables
    }

    pub fn num_root_directory_entries(&self) -> u16 {
        self.num_root_directory_entries
    }

    pub fn sectors_per_fat(&self) -> u32 {
        self.sectors_per_fat
    }

    pub fn num_sectors(&self) -> u32 {
        if self.total_sectors == 0 {
            self.large_total_sectors
        } else {
            self.total_sectors as u32
        }
    }

    pub fn root_directory_cluster(&self) -> u32 {
        self.root_directory_cluster
    }

    pub fn fs_info_sector(&self) -> u32 {
        self.fs_info_sector as u32
    }

    pub fn volume_serial_number(&self) -> Option<u32> {
        self.has_extended_fields().then_some(self.volume_serial_number)
    }

    /// The label stored in the boot sector, without its space padding.
    pub fn volume_label(&self) -> Option<&str> {
        if !self.has_extended_fields() {
            return None;
        }

        str::from_utf8(&self.volume_label)
            .ok()
            .map(|label| label.trim_end_matches(' '))
    }

    fn has_extended_fields(&self) -> bool {
        self.signature == 0x29
    }

    pub fn bytes_per_cluster(&self) -> u32 {
        self.bytes_per_sector as u32 * self.sectors_per_cluster as u32
    }

    pub fn first_fat_sector(&self) -> u64 {
        self.num_reserved_sectors as u64
    }

    pub fn first_data_sector(&self) -> u64 {
        self.first_fat_sector()
            + self.sectors_per_fat as u64 * self.num_file_allocation_tables as u64
    }

    /// First sector of `cluster`, or `None` if it is not a data cluster.
    pub fn cluster_to_sector(&self, cluster: u32) -> Option<u64> {
        let relative = cluster.checked_sub(FIRST_DATA_CLUSTER)?;

        Some(self.first_data_sector() + relative as u64 * self.sectors_per_cluster as u64)
    }

    /// Byte position of the first FAT's entry for `cluster`.
    pub fn fat_entry_offset(&self, cluster: u32) -> u64 {
        self.first_fat_sector() * self.bytes_per_sector as u64 + FAT_ENTRY_SIZE * cluster as u64
    }

    /// Number of clusters in the data region.
    pub fn cluster_count(&self) -> u32 {
        let data_sectors = (self.num_sectors() as u64).saturating_sub(self.first_data_sector());

        (data_sectors / self.sectors_per_cluster as u64) as u32
    }
}
