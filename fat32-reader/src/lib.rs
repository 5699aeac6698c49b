//! Read-only access to FAT32 volumes.
//!
//! A [`Volume`] is mounted over any [`OffsetRead`] source: an image held in
//! memory, or a block device through [`block_device::impls::BlockReader`].
//! Directories are walked through [`Node`]s, which borrow the volume.
//!
//! ```no_run
//! use std::fs::File;
//!
//! use block_device::impls::{BlockReader, FileBlockDevice};
//! use fat32_reader::Volume;
//!
//! let file = File::open("disk.img")?;
//! let volume = Volume::open(BlockReader::new(FileBlockDevice::new(file)))?;
//!
//! for child in volume.root().children()? {
//!     println!("{}", child.display_name());
//! }
//!
//! let readme = volume.lookup("/docs/readme.txt")?;
//! let mut stdout = std::io::stdout();
//! readme.read_to(&mut stdout)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod chain;
mod dir;
mod error;
mod file;
mod name;
mod node;
mod path;
mod stream;
mod volume;

pub use block_device::OffsetRead;
pub use chain::ClusterChain;
pub use error::{DeviceError, Error, Result};
pub use name::resolve_name;
pub use node::Node;
pub use stream::EntryStream;
pub use vfat32_core::{
    entry::{Attributes, DosDateTime, ShortEntry},
    fs_info::FSInfo,
    record::{is_end_of_chain, BootRecord, END_OF_CHAIN},
};
pub use volume::{OpenOptions, Volume};
