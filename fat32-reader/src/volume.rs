use block_device::{Offset, OffsetRead};
use log::{debug, warn};
use vfat32_core::{
    fs_info::{FSInfo, FS_INFO_SIZE},
    record::{BootRecord, BOOT_RECORD_SIZE},
};

use crate::{
    error::{DeviceError, Error, Result},
    node::Node,
};

/// Settings applied when mounting a volume.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenOptions {
    partition_offset: u64,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Byte position of the volume's boot sector on the source. Use this to
    /// mount one partition of a whole-disk image.
    pub fn partition_offset(mut self, offset: u64) -> Self {
        self.partition_offset = offset;
        self
    }

    pub fn open<D>(self, device: D) -> Result<Volume<D>>
    where
        D: OffsetRead,
        D::Error: DeviceError,
    {
        Volume::open_with(device, self)
    }
}

/// A mounted FAT32 volume.
///
/// Owns the backing source until [`Volume::close`]. Every [`Node`] borrows
/// the volume, so no node can outlive it.
pub struct Volume<D> {
    device: Offset<D>,
    record: BootRecord,
}

impl<D> Volume<D>
where
    D: OffsetRead,
    D::Error: DeviceError,
{
    pub fn open(device: D) -> Result<Self> {
        Self::open_with(device, OpenOptions::new())
    }

    pub fn open_with(device: D, options: OpenOptions) -> Result<Self> {
        let device = Offset::new(device, options.partition_offset);

        let mut buffer = [0u8; BOOT_RECORD_SIZE];
        read_device(&device, 0, &mut buffer)?;

        let record = BootRecord::read(&buffer)?;

        debug!(
            "mounted FAT32 volume: {} bytes/sector, {} sectors/cluster, {} reserved, {} FATs of {} sectors, root cluster {}",
            record.bytes_per_sector(),
            record.sectors_per_cluster(),
            record.num_reserved_sectors(),
            record.num_fats(),
            record.sectors_per_fat(),
            record.root_directory_cluster(),
        );

        Ok(Self { device, record })
    }

    /// Releases the backing source.
    pub fn close(self) -> D {
        self.device.into_inner()
    }

    pub fn boot_record(&self) -> &BootRecord {
        &self.record
    }

    pub fn bytes_per_cluster(&self) -> u32 {
        self.record.bytes_per_cluster()
    }

    pub fn cluster_to_sector(&self, cluster: u32) -> Option<u64> {
        self.record.cluster_to_sector(cluster)
    }

    /// The pseudo-node standing for the root directory.
    pub fn root(&self) -> Node<'_, D> {
        Node::root(self)
    }

    /// Resolves a `/` separated path starting at the root directory.
    pub fn lookup(&self, path: &str) -> Result<Node<'_, D>> {
        self.root().lookup(path)
    }

    /// Reads the FSInfo sector. Returns `None` when the volume has none or
    /// its signatures do not check out.
    pub fn fs_info(&self) -> Result<Option<FSInfo>> {
        let sector = self.record.fs_info_sector();
        if sector == 0 || sector == 0xFFFF {
            return Ok(None);
        }

        let mut buffer = [0u8; FS_INFO_SIZE];
        let position = sector as u64 * self.record.bytes_per_sector() as u64;
        self.read_at(position, &mut buffer)?;

        let info = FSInfo::read(&buffer)?;
        if !info.is_valid() {
            warn!("FSInfo sector {sector} has bad signatures, ignoring it");
            return Ok(None);
        }

        Ok(Some(info))
    }

    pub(crate) fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<()> {
        read_device(&self.device, offset, buffer)
    }
}

fn read_device<D>(device: &Offset<D>, offset: u64, buffer: &mut [u8]) -> Result<()>
where
    D: OffsetRead,
    D::Error: DeviceError,
{
    let len = buffer.len();

    device
        .read_at(offset, buffer)
        .map_err(|source| Error::Device {
            offset,
            len,
            source: Box::new(source),
        })
}
