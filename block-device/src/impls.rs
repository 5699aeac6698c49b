#![cfg(feature = "std")]

use std::{
    fs::File,
    io::{Read, Seek, SeekFrom},
    sync::Mutex,
    vec,
    vec::Vec,
};

use log::trace;

use crate::{BlockDevice, OffsetRead};

// Arbitrary, but reasonable
const FILE_BLOCK_SIZE: u64 = 512;

/// Exposes an image file as a device of 512 byte blocks.
pub struct FileBlockDevice {
    file: File,
}

impl FileBlockDevice {
    pub fn new(file: File) -> Self {
        Self { file }
    }
}

impl BlockDevice for FileBlockDevice {
    type Error = std::io::Error;

    fn block_size(&self) -> u64 {
        FILE_BLOCK_SIZE
    }

    fn read_block(&mut self, lba: u64, buffer: &mut [u8]) -> Result<(), Self::Error> {
        let byte_offset = lba * self.block_size();
        let len = buffer.len().min(FILE_BLOCK_SIZE as usize);

        self.file.seek(SeekFrom::Start(byte_offset))?;
        self.file.read_exact(&mut buffer[..len])?;

        Ok(())
    }
}

/// Serves byte-granular positional reads from a block device.
///
/// The device is behind a mutex, so concurrent callers are serialised and
/// each read sees a consistent device position.
pub struct BlockReader<D> {
    device: Mutex<D>,
    block_size: u64,
}

impl<D: BlockDevice> BlockReader<D> {
    pub fn new(device: D) -> Self {
        let block_size = device.block_size();

        Self {
            device: Mutex::new(device),
            block_size,
        }
    }

    pub fn into_inner(self) -> D {
        self.device
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<D: BlockDevice> OffsetRead for BlockReader<D> {
    type Error = D::Error;

    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<(), Self::Error> {
        let mut device = self
            .device
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let block_size = self.block_size;
        let mut block: Vec<u8> = vec![0; block_size as usize];

        let mut position = offset;
        let mut filled = 0;

        while filled < buffer.len() {
            let lba = position / block_size;
            let start = (position % block_size) as usize;
            let count = (block_size as usize - start).min(buffer.len() - filled);

            trace!("block read lba={lba} start={start} count={count}");
            device.read_block(lba, &mut block)?;

            buffer[filled..filled + count].copy_from_slice(&block[start..start + count]);

            filled += count;
            position += count as u64;
        }

        Ok(())
    }
}
