#![no_std]

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

pub mod impls;

use alloc::vec::Vec;

/// A device addressed in fixed-size blocks.
pub trait BlockDevice {
    type Error;

    fn block_size(&self) -> u64;

    fn read_block(&mut self, lba: u64, buffer: &mut [u8]) -> Result<(), Self::Error>;
}

/// A byte source that serves reads at an explicit offset.
///
/// Reads never depend on a cursor left behind by a previous call, so a
/// source can be shared by reference for the lifetime of a volume.
pub trait OffsetRead {
    type Error;

    /// Fills `buffer` completely with the bytes starting at `offset`.
    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("read of {len} bytes at offset {offset} is outside a {size} byte source")]
pub struct OutOfBounds {
    pub offset: u64,
    pub len: usize,
    pub size: u64,
}

impl OffsetRead for [u8] {
    type Error = OutOfBounds;

    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<(), Self::Error> {
        let out_of_bounds = OutOfBounds {
            offset,
            len: buffer.len(),
            size: self.len() as u64,
        };

        let start = usize::try_from(offset).map_err(|_| out_of_bounds)?;
        let end = start.checked_add(buffer.len()).ok_or(out_of_bounds)?;
        let source = self.get(start..end).ok_or(out_of_bounds)?;

        buffer.copy_from_slice(source);

        Ok(())
    }
}

impl OffsetRead for Vec<u8> {
    type Error = OutOfBounds;

    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.as_slice().read_at(offset, buffer)
    }
}

impl<T: OffsetRead + ?Sized> OffsetRead for &T {
    type Error = T::Error;

    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read_at(offset, buffer)
    }
}

/// Shifts every read by a fixed base, e.g. to address one partition of a
/// whole-disk image.
#[derive(Debug, Clone)]
pub struct Offset<S> {
    inner: S,
    base: u64,
}

impl<S> Offset<S> {
    pub fn new(inner: S, base: u64) -> Self {
        Self { inner, base }
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: OffsetRead> OffsetRead for Offset<S> {
    type Error = S::Error;

    fn read_at(&self, offset: u64, buffer: &mut [u8]) -> Result<(), Self::Error> {
        self.inner.read_at(self.base + offset, buffer)
    }
}
