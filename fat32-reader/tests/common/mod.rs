#![allow(dead_code)]

use std::io::{Cursor, Write};

pub const END: u32 = 0x0FFF_FFFF;

/// Builds small FAT32 images byte by byte.
pub struct ImageBuilder {
    pub bytes_per_sector: u16,
    pub sectors_per_cluster: u8,
    pub reserved_sectors: u16,
    pub fats: u8,
    pub sectors_per_fat: u32,
    pub root_cluster: u32,
    image: Vec<u8>,
}

impl ImageBuilder {
    /// 512 byte sectors, one sector per cluster, 32 reserved sectors, two
    /// FATs of 100 sectors, root directory at cluster 2.
    pub fn new(clusters: u32) -> Self {
        Self::with_geometry(512, 1, 32, 2, 100, 2, clusters)
    }

    pub fn with_geometry(
        bytes_per_sector: u16,
        sectors_per_cluster: u8,
        reserved_sectors: u16,
        fats: u8,
        sectors_per_fat: u32,
        root_cluster: u32,
        clusters: u32,
    ) -> Self {
        let data_start = reserved_sectors as u64 + fats as u64 * sectors_per_fat as u64;
        let sectors = data_start + clusters as u64 * sectors_per_cluster as u64;
        let size = sectors as usize * bytes_per_sector as usize;

        let mut builder = Self {
            bytes_per_sector,
            sectors_per_cluster,
            reserved_sectors,
            fats,
            sectors_per_fat,
            root_cluster,
            image: vec![0u8; size],
        };

        builder.write_boot_sector(sectors as u32);
        builder.set_fat(0, 0x0FFF_FFF8);
        builder.set_fat(1, END);
        builder.set_fat(root_cluster, END);
        builder
    }

    fn write_boot_sector(&mut self, sectors: u32) {
        let boot = &mut self.image[..512];
        boot[0..3].copy_from_slice(&[0xEB, 0x58, 0x90]);
        boot[3..11].copy_from_slice(b"MSWIN4.1");
        boot[0x0B..0x0D].copy_from_slice(&self.bytes_per_sector.to_le_bytes());
        boot[0x0D] = self.sectors_per_cluster;
        boot[0x0E..0x10].copy_from_slice(&self.reserved_sectors.to_le_bytes());
        boot[0x10] = self.fats;
        boot[0x15] = 0xF8;
        boot[0x20..0x24].copy_from_slice(&sectors.to_le_bytes());
        boot[0x24..0x28].copy_from_slice(&self.sectors_per_fat.to_le_bytes());
        boot[0x2C..0x30].copy_from_slice(&self.root_cluster.to_le_bytes());
        boot[0x42] = 0x29;
        boot[0x47..0x52].copy_from_slice(b"SYNTHETIC  ");
        boot[0x1FE] = 0x55;
        boot[0x1FF] = 0xAA;
    }

    pub fn set_root_entry_count(&mut self, count: u16) -> &mut Self {
        self.image[0x11..0x13].copy_from_slice(&count.to_le_bytes());
        self
    }

    /// Writes `value` into every FAT copy.
    pub fn set_fat(&mut self, cluster: u32, value: u32) -> &mut Self {
        for fat in 0..self.fats as usize {
            let fat_start = (self.reserved_sectors as usize
                + fat * self.sectors_per_fat as usize)
                * self.bytes_per_sector as usize;
            let position = fat_start + cluster as usize * 4;
            self.image[position..position + 4].copy_from_slice(&value.to_le_bytes());
        }
        self
    }

    /// Links `clusters` into one chain that ends with an end marker.
    pub fn chain(&mut self, clusters: &[u32]) -> &mut Self {
        for pair in clusters.windows(2) {
            self.set_fat(pair[0], pair[1]);
        }
        if let Some(last) = clusters.last() {
            self.set_fat(*last, END);
        }
        self
    }

    pub fn bytes_per_cluster(&self) -> usize {
        self.bytes_per_sector as usize * self.sectors_per_cluster as usize
    }

    pub fn cluster_position(&self, cluster: u32) -> usize {
        let data_start = self.reserved_sectors as usize
            + self.fats as usize * self.sectors_per_fat as usize;
        (data_start + (cluster as usize - 2) * self.sectors_per_cluster as usize)
            * self.bytes_per_sector as usize
    }

    pub fn write_cluster(&mut self, cluster: u32, offset: usize, bytes: &[u8]) -> &mut Self {
        let position = self.cluster_position(cluster) + offset;
        self.image[position..position + bytes.len()].copy_from_slice(bytes);
        self
    }

    /// Lays `slots` out as one directory, spilling over `clusters` in order.
    pub fn write_directory(&mut self, clusters: &[u32], slots: &[[u8; 32]]) -> &mut Self {
        let per_cluster = self.bytes_per_cluster() / 32;
        for (index, slot) in slots.iter().enumerate() {
            let cluster = clusters[index / per_cluster];
            self.write_cluster(cluster, (index % per_cluster) * 32, slot);
        }
        self.chain(clusters)
    }

    pub fn build(&self) -> Vec<u8> {
        self.image.clone()
    }
}

pub fn short_entry(name: &[u8; 11], attributes: u8, cluster: u32, size: u32) -> [u8; 32] {
    let mut slot = [0u8; 32];
    slot[0..11].copy_from_slice(name);
    slot[11] = attributes;
    slot[0x14..0x16].copy_from_slice(&((cluster >> 16) as u16).to_le_bytes());
    slot[0x1A..0x1C].copy_from_slice(&(cluster as u16).to_le_bytes());
    slot[0x1C..0x20].copy_from_slice(&size.to_le_bytes());
    slot
}

pub fn checksum(short_name: &[u8; 11]) -> u8 {
    short_name
        .iter()
        .fold(0u8, |sum, b| sum.rotate_right(1).wrapping_add(*b))
}

/// Long name slots for `name`, in on-disk order (highest ordinal first).
pub fn lfn_slots(name: &str, short_name: &[u8; 11]) -> Vec<[u8; 32]> {
    let mut units: Vec<u16> = name.encode_utf16().collect();
    let count = units.len().div_ceil(13);
    if units.len() % 13 != 0 {
        units.push(0);
    }
    units.resize(count * 13, 0xFFFF);

    let checksum = checksum(short_name);
    let offsets = [1, 3, 5, 7, 9, 14, 16, 18, 20, 22, 24, 28, 30];

    (0..count)
        .rev()
        .map(|index| {
            let mut slot = [0u8; 32];
            slot[0] = (index + 1) as u8;
            if index + 1 == count {
                slot[0] |= 0x40;
            }
            slot[11] = 0x0F;
            slot[13] = checksum;
            for (i, offset) in offsets.iter().enumerate() {
                let unit = units[index * 13 + i];
                slot[*offset..*offset + 2].copy_from_slice(&unit.to_le_bytes());
            }
            slot
        })
        .collect()
}

/// A long name record: its slots followed by the short entry.
pub fn long_entry(
    name: &str,
    short_name: &[u8; 11],
    attributes: u8,
    cluster: u32,
    size: u32,
) -> Vec<[u8; 32]> {
    let mut slots = lfn_slots(name, short_name);
    slots.push(short_entry(short_name, attributes, cluster, size));
    slots
}

pub fn deleted(mut slot: [u8; 32]) -> [u8; 32] {
    slot[0] = 0xE5;
    slot
}

/// Formats a FAT32 image in memory with the `fatfs` crate.
///
/// `fatfs` only picks FAT32 when the volume has enough clusters, so the
/// image is 40 MiB.
pub fn fatfs_image() -> Vec<u8> {
    const SIZE: usize = 40 * 1024 * 1024;
    let mut cursor = Cursor::new(vec![0u8; SIZE]);
    fatfs::format_volume(
        &mut cursor,
        fatfs::FormatVolumeOptions::new().fat_type(fatfs::FatType::Fat32),
    )
    .expect("format_volume failed");
    cursor.into_inner()
}

/// Creates `files` (path, content) and `dirs` on a fresh `fatfs` image.
/// Directories are created before files.
pub fn fatfs_image_with(dirs: &[&str], files: &[(&str, &[u8])]) -> Vec<u8> {
    let mut image = fatfs_image();
    {
        let mut cursor = Cursor::new(&mut image);
        let fs = fatfs::FileSystem::new(&mut cursor, fatfs::FsOptions::new())
            .expect("FileSystem::new failed");
        let root = fs.root_dir();
        for dir in dirs {
            root.create_dir(dir).expect("create_dir failed");
        }
        for (path, content) in files {
            let mut file = root.create_file(path).expect("create_file failed");
            file.truncate().unwrap();
            file.write_all(content).unwrap();
        }
    }
    image
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
