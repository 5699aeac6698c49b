use bin_tools::read_u32_le;
use block_device::OffsetRead;
use log::trace;
use vfat32_core::record::{is_end_of_chain, FAT_ENTRY_MASK, FAT_ENTRY_SIZE};

use crate::{
    error::{DeviceError, Error, Result},
    volume::Volume,
};

impl<D> Volume<D>
where
    D: OffsetRead,
    D::Error: DeviceError,
{
    /// Looks up the FAT entry that follows `cluster`.
    ///
    /// End-of-chain markers are returned as read; check them with
    /// [`is_end_of_chain`] before using the value as a cluster.
    pub fn next_cluster(&self, cluster: u32) -> Result<u32> {
        let position = self.boot_record().fat_entry_offset(cluster);

        let mut entry = [0u8; FAT_ENTRY_SIZE as usize];
        self.read_at(position, &mut entry)?;

        let next = read_u32_le(&entry, 0) & FAT_ENTRY_MASK;
        trace!("FAT[{cluster}] = {next:#010x}");

        Ok(next)
    }

    /// Reads `buffer.len()` bytes at `offset` inside one data cluster.
    pub fn read_in_cluster(&self, cluster: u32, offset: u32, buffer: &mut [u8]) -> Result<()> {
        let capacity = self.bytes_per_cluster();
        if offset as u64 + buffer.len() as u64 > capacity as u64 {
            return Err(Error::Range {
                offset,
                len: buffer.len(),
                capacity,
            });
        }

        if is_end_of_chain(cluster) {
            return Err(Error::InvalidCluster(cluster));
        }
        let sector = self
            .cluster_to_sector(cluster)
            .ok_or(Error::InvalidCluster(cluster))?;

        let position = sector * self.boot_record().bytes_per_sector() as u64 + offset as u64;

        self.read_at(position, buffer)
    }

    /// Iterates over the clusters of the chain starting at `start`.
    ///
    /// A chain visits each data cluster at most once, so one that runs longer
    /// than the volume has clusters ends with [`Error::ChainLoop`].
    pub fn chain(&self, start: u32) -> ClusterChain<'_, D> {
        ClusterChain {
            volume: self,
            start,
            next: Some(start),
            visited: 0,
            limit: self.boot_record().cluster_count() as u64,
        }
    }
}

pub struct ClusterChain<'v, D> {
    volume: &'v Volume<D>,
    start: u32,
    next: Option<u32>,
    visited: u64,
    limit: u64,
}

impl<D> Iterator for ClusterChain<'_, D>
where
    D: OffsetRead,
    D::Error: DeviceError,
{
    type Item = Result<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        let cluster = self.next.take()?;

        if is_end_of_chain(cluster) {
            return None;
        }

        if self.visited >= self.limit {
            return Some(Err(Error::ChainLoop { start: self.start }));
        }
        self.visited += 1;

        match self.volume.next_cluster(cluster) {
            Ok(next) => {
                self.next = Some(next);
                Some(Ok(cluster))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
