use std::io::Write;

use block_device::OffsetRead;
use vfat32_core::record::is_end_of_chain;

use crate::{
    error::{DeviceError, Error, Result},
    node::Node,
};

impl<D> Node<'_, D>
where
    D: OffsetRead,
    D::Error: DeviceError,
{
    /// Streams the file's content into `sink`, one cluster at a time.
    ///
    /// Returns the number of bytes written, which is always the size
    /// recorded in the directory entry.
    pub fn read_to<W: Write + ?Sized>(&self, sink: &mut W) -> Result<u64> {
        let entry = self.file_entry()?;
        let volume = self.volume();
        let bytes_per_cluster = volume.bytes_per_cluster() as u64;

        let mut buffer = vec![0u8; bytes_per_cluster as usize];
        let mut remaining = entry.file_size() as u64;
        let mut cluster = entry.start_cluster();
        let mut last_cluster = cluster;
        let mut written = 0;

        while remaining > 0 {
            if is_end_of_chain(cluster) {
                return Err(Error::ChainTruncated {
                    cluster: last_cluster,
                });
            }

            let count = bytes_per_cluster.min(remaining) as usize;
            volume.read_in_cluster(cluster, 0, &mut buffer[..count])?;
            sink.write_all(&buffer[..count])?;

            remaining -= count as u64;
            written += count as u64;
            last_cluster = cluster;

            if remaining > 0 {
                cluster = volume.next_cluster(cluster)?;
            }
        }

        Ok(written)
    }

    pub fn read_to_vec(&self) -> Result<Vec<u8>> {
        let mut content = Vec::with_capacity(self.file_size()? as usize);
        self.read_to(&mut content)?;

        Ok(content)
    }

    /// Reads file content starting at byte `offset` into `buffer`.
    ///
    /// Returns how many bytes were read; fewer than requested only at the
    /// end of the file.
    pub fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<usize> {
        let entry = self.file_entry()?;
        let volume = self.volume();
        let bytes_per_cluster = volume.bytes_per_cluster() as u64;

        let size = entry.file_size() as u64;
        if offset >= size || buffer.is_empty() {
            return Ok(0);
        }
        let wanted = (size - offset).min(buffer.len() as u64) as usize;

        let mut cluster = entry.start_cluster();
        let mut last_cluster = cluster;

        for _ in 0..offset / bytes_per_cluster {
            if is_end_of_chain(cluster) {
                break;
            }
            last_cluster = cluster;
            cluster = volume.next_cluster(cluster)?;
        }

        let mut cluster_offset = (offset % bytes_per_cluster) as u32;
        let mut filled = 0;

        while filled < wanted {
            if is_end_of_chain(cluster) {
                return Err(Error::ChainTruncated {
                    cluster: last_cluster,
                });
            }

            let count = (bytes_per_cluster as usize - cluster_offset as usize).min(wanted - filled);
            volume.read_in_cluster(cluster, cluster_offset, &mut buffer[filled..filled + count])?;

            filled += count;
            cluster_offset = 0;
            last_cluster = cluster;

            if filled < wanted {
                cluster = volume.next_cluster(cluster)?;
            }
        }

        Ok(filled)
    }
}
