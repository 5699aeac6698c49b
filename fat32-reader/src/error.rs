use std::error::Error as StdError;

pub type Result<T> = core::result::Result<T, Error>;

/// Errors reported by a mounted volume.
///
/// Every error aborts the operation that raised it; the volume itself stays
/// usable.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid boot sector: {0}")]
    Format(#[from] vfat32_core::Error),
    #[error("read of {len} bytes at offset {offset} exceeds the {capacity} byte cluster")]
    Range {
        offset: u32,
        len: usize,
        capacity: u32,
    },
    #[error("cluster {0} is not a data cluster")]
    InvalidCluster(u32),
    #[error("cluster chain ends at cluster {cluster} before the data does")]
    ChainTruncated { cluster: u32 },
    #[error("cluster chain starting at cluster {start} does not terminate")]
    ChainLoop { start: u32 },
    #[error("long file name is missing its slot with ordinal {ordinal}")]
    LfnSequenceGap { ordinal: usize },
    #[error("name of {0} characters is longer than FAT32 allows")]
    NameTooLong(usize),
    #[error("the root directory has no directory entry")]
    RootHasNoEntry,
    #[error("not a directory")]
    NotADirectory,
    #[error("is a directory")]
    IsADirectory,
    #[error("no such file or directory: {0}")]
    NotFound(String),
    #[error("device read of {len} bytes at offset {offset} failed")]
    Device {
        offset: u64,
        len: usize,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Error types a backing source may report.
pub trait DeviceError: StdError + Send + Sync + 'static {}

impl<T: StdError + Send + Sync + 'static> DeviceError for T {}
