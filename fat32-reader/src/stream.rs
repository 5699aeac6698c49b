use block_device::OffsetRead;
use vfat32_core::record::is_end_of_chain;

use crate::{
    error::{DeviceError, Error, Result},
    volume::Volume,
};

/// A directory's entry bytes, addressed relative to a fixed origin.
///
/// All reads of directory records go through here, so following the
/// cluster chain across cluster boundaries happens in one place.
pub struct EntryStream<'v, D> {
    volume: &'v Volume<D>,
    cluster: u32,
    offset: u32,
}

impl<D> Clone for EntryStream<'_, D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for EntryStream<'_, D> {}

impl<'v, D> EntryStream<'v, D> {
    pub fn new(volume: &'v Volume<D>, cluster: u32, offset: u32) -> Self {
        Self {
            volume,
            cluster,
            offset,
        }
    }

    pub fn volume(&self) -> &'v Volume<D> {
        self.volume
    }

    pub fn cluster(&self) -> u32 {
        self.cluster
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }
}

impl<'v, D> EntryStream<'v, D>
where
    D: OffsetRead,
    D::Error: DeviceError,
{

    /// Fills `buffer` with the bytes found `relative_offset` bytes past the
    /// origin.
    pub fn read(&self, relative_offset: u32, buffer: &mut [u8]) -> Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }

        let bytes_per_cluster = self.volume.bytes_per_cluster();

        let mut cluster = self.cluster;
        let mut position = self.offset as u64 + relative_offset as u64;

        while position >= bytes_per_cluster as u64 {
            cluster = self.follow(cluster)?;
            position -= bytes_per_cluster as u64;
        }

        let mut current_offset = position as u32;
        let mut filled = 0;

        loop {
            let count = ((bytes_per_cluster - current_offset) as usize).min(buffer.len() - filled);

            self.volume
                .read_in_cluster(cluster, current_offset, &mut buffer[filled..filled + count])?;
            filled += count;

            if filled == buffer.len() {
                return Ok(());
            }

            // The rest continues at the start of the next cluster
            cluster = self.follow(cluster)?;
            current_offset = 0;
        }
    }

    /// The stream starting `bytes` further on, with its origin moved into
    /// the cluster that holds it. `None` when the chain ends first.
    pub fn advance(&self, bytes: u32) -> Result<Option<Self>> {
        let bytes_per_cluster = self.volume.bytes_per_cluster() as u64;

        let mut cluster = self.cluster;
        let mut position = self.offset as u64 + bytes as u64;

        while position >= bytes_per_cluster {
            let next = self.volume.next_cluster(cluster)?;
            if is_end_of_chain(next) {
                return Ok(None);
            }
            cluster = next;
            position -= bytes_per_cluster;
        }

        Ok(Some(Self::new(self.volume, cluster, position as u32)))
    }

    fn follow(&self, cluster: u32) -> Result<u32> {
        let next = self.volume.next_cluster(cluster)?;

        if is_end_of_chain(next) {
            return Err(Error::ChainTruncated { cluster });
        }

        Ok(next)
    }
}
