#![no_std]

extern crate alloc;

pub mod entry;
pub mod fs_info;
pub mod record;

/// Errors raised while decoding on-disk structures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("buffer size too small, was only {0} bytes")]
    BufferSizeTooSmall(usize),
    #[error("root directory entry count is {0}, the volume is not FAT32")]
    NotFat32(u16),
    #[error("invalid volume geometry: {0}")]
    InvalidGeometry(&'static str),
}

fn read_padded_str<const N: usize>(buffer: &[u8], offset: usize) -> [u8; N] {
    let mut label = [0; N];
    label.copy_from_slice(&buffer[offset..offset + N]);
    label
}
