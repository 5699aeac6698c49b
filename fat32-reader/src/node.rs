use block_device::OffsetRead;
use vfat32_core::entry::{Attributes, ShortEntry, DIRECTORY_ENTRY_SIZE};

use crate::{
    dir::list_directory,
    error::{DeviceError, Error, Result},
    stream::EntryStream,
    volume::Volume,
};

const ROOT_NAME: &str = "/";

/// A file or directory on a mounted volume, or the root pseudo-node.
///
/// Nodes are cheap handles: fields of the directory entry are read from the
/// volume when asked for.
pub struct Node<'v, D> {
    volume: &'v Volume<D>,
    entry: Option<EntryRef<'v, D>>,
}

/// Where a node's directory record lives and what it is called.
struct EntryRef<'v, D> {
    stream: EntryStream<'v, D>,
    name: String,
    display_name: String,
    lfn_slots: u32,
}

impl<D> Clone for EntryRef<'_, D> {
    fn clone(&self) -> Self {
        Self {
            stream: self.stream,
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            lfn_slots: self.lfn_slots,
        }
    }
}

impl<D> Clone for Node<'_, D> {
    fn clone(&self) -> Self {
        Self {
            volume: self.volume,
            entry: self.entry.clone(),
        }
    }
}

impl<D> core::fmt::Debug for Node<'_, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.entry {
            None => f.write_str("Node(<root>)"),
            Some(entry) => f
                .debug_struct("Node")
                .field("name", &entry.name)
                .field("cluster", &entry.stream.cluster())
                .field("offset", &entry.stream.offset())
                .field("lfn_slots", &entry.lfn_slots)
                .finish(),
        }
    }
}

impl<'v, D> Node<'v, D>
where
    D: OffsetRead,
    D::Error: DeviceError,
{
    pub(crate) fn root(volume: &'v Volume<D>) -> Self {
        Self {
            volume,
            entry: None,
        }
    }

    /// A node for the record at `stream`, closed by `short_entry`.
    pub(crate) fn from_record(
        stream: EntryStream<'v, D>,
        name: String,
        lfn_slots: u32,
        short_entry: &ShortEntry,
    ) -> Self {
        let display_name = if lfn_slots == 0 {
            short_entry.display_name()
        } else {
            name.clone()
        };

        Self {
            volume: stream.volume(),
            entry: Some(EntryRef {
                stream,
                name,
                display_name,
                lfn_slots,
            }),
        }
    }

    pub fn volume(&self) -> &'v Volume<D> {
        self.volume
    }

    pub fn is_root(&self) -> bool {
        self.entry.is_none()
    }

    /// The long name, or the raw 11 byte short name when there is none.
    pub fn name(&self) -> &str {
        self.entry.as_ref().map_or(ROOT_NAME, |entry| &entry.name)
    }

    /// The long name, or the short name formatted as `NAME.EXT`.
    pub fn display_name(&self) -> &str {
        self.entry
            .as_ref()
            .map_or(ROOT_NAME, |entry| &entry.display_name)
    }

    pub fn lfn_slot_count(&self) -> u32 {
        self.entry.as_ref().map_or(0, |entry| entry.lfn_slots)
    }

    /// Slots taken by the record, long name slots included.
    pub fn slot_count(&self) -> u32 {
        self.entry.as_ref().map_or(0, |entry| 1 + entry.lfn_slots)
    }

    /// Cluster and in-cluster offset where the record's first slot begins.
    pub fn position(&self) -> Option<(u32, u32)> {
        self.entry
            .as_ref()
            .map(|entry| (entry.stream.cluster(), entry.stream.offset()))
    }

    /// Reads bytes of the node's directory record, starting
    /// `relative_offset` bytes into its first slot.
    pub fn read_entry_bytes(&self, relative_offset: u32, buffer: &mut [u8]) -> Result<()> {
        let entry = self.entry.as_ref().ok_or(Error::RootHasNoEntry)?;

        entry.stream.read(relative_offset, buffer)
    }

    /// The record's short entry. `None` for the root.
    pub fn short_entry(&self) -> Result<Option<ShortEntry>> {
        let Some(entry) = &self.entry else {
            return Ok(None);
        };

        let mut slot = [0u8; DIRECTORY_ENTRY_SIZE];
        let offset = entry.lfn_slots * DIRECTORY_ENTRY_SIZE as u32;
        entry.stream.read(offset, &mut slot)?;

        Ok(Some(ShortEntry::read(&slot)))
    }

    pub fn attributes(&self) -> Result<Attributes> {
        Ok(self
            .short_entry()?
            .map_or(Attributes::DIRECTORY, |entry| entry.attributes()))
    }

    pub fn is_dir(&self) -> Result<bool> {
        Ok(self.attributes()?.contains(Attributes::DIRECTORY))
    }

    pub fn is_volume_label(&self) -> Result<bool> {
        Ok(self
            .short_entry()?
            .is_some_and(|entry| entry.is_volume_label()))
    }

    pub fn is_dot_entry(&self) -> Result<bool> {
        Ok(self.short_entry()?.is_some_and(|entry| entry.is_dot_entry()))
    }

    /// Size of the file's content in bytes. Directories report 0.
    pub fn file_size(&self) -> Result<u32> {
        Ok(self.short_entry()?.map_or(0, |entry| entry.file_size()))
    }

    /// First cluster of the node's content.
    pub fn content_cluster(&self) -> Result<u32> {
        Ok(self
            .short_entry()?
            .map_or(self.volume.boot_record().root_directory_cluster(), |entry| {
                entry.start_cluster()
            }))
    }

    /// Lists the live records of this directory in on-disk order.
    pub fn children(&self) -> Result<Vec<Node<'v, D>>> {
        let first_cluster = match self.short_entry()? {
            None => self.volume.boot_record().root_directory_cluster(),
            Some(entry) if !entry.is_dir() => return Err(Error::NotADirectory),
            // `..` in a first level directory points at the root as cluster 0
            Some(entry) if entry.start_cluster() == 0 => {
                self.volume.boot_record().root_directory_cluster()
            }
            Some(entry) => entry.start_cluster(),
        };

        list_directory(self.volume, first_cluster)
    }

    /// The short entry of a node that has file content.
    pub(crate) fn file_entry(&self) -> Result<ShortEntry> {
        match self.short_entry()? {
            Some(entry) if !entry.is_dir() => Ok(entry),
            _ => Err(Error::IsADirectory),
        }
    }
}
