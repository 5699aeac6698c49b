use block_device::OffsetRead;
use log::{trace, warn};
use vfat32_core::{
    entry::{DirectoryEntry, DIRECTORY_ENTRY_SIZE},
    record::is_end_of_chain,
};

use crate::{
    error::{DeviceError, Error, Result},
    name::resolve_name,
    node::Node,
    stream::EntryStream,
    volume::Volume,
};

/// A directory never holds more than 65536 slots.
const MAX_DIRECTORY_SLOTS: u32 = 65536;

/// Collects the live records of the directory whose entries start at
/// `first_cluster`, in on-disk order.
pub(crate) fn list_directory<D>(volume: &Volume<D>, first_cluster: u32) -> Result<Vec<Node<'_, D>>>
where
    D: OffsetRead,
    D::Error: DeviceError,
{
    let mut children = Vec::new();

    if is_end_of_chain(first_cluster) {
        return Ok(children);
    }

    let mut cursor = Some(EntryStream::new(volume, first_cluster, 0));
    let mut slots_read = 0;

    while let Some(stream) = cursor {
        if slots_read >= MAX_DIRECTORY_SLOTS {
            return Err(Error::ChainLoop {
                start: first_cluster,
            });
        }

        let mut slot = [0u8; DIRECTORY_ENTRY_SIZE];
        stream.read(0, &mut slot)?;

        let slots = match DirectoryEntry::read(&slot) {
            DirectoryEntry::End => break,
            DirectoryEntry::Deleted => 1,
            DirectoryEntry::Real(entry) => {
                let (name, _) = resolve_name(&stream)?;
                trace!(
                    "entry {name:?} at cluster {} offset {}",
                    stream.cluster(),
                    stream.offset()
                );

                children.push(Node::from_record(stream, name, 0, &entry));
                1
            }
            DirectoryEntry::LFN(_) => {
                let (name, lfn_slots) = resolve_name(&stream)?;

                let mut short_slot = [0u8; DIRECTORY_ENTRY_SIZE];
                stream.read(lfn_slots * DIRECTORY_ENTRY_SIZE as u32, &mut short_slot)?;

                match DirectoryEntry::read(&short_slot) {
                    DirectoryEntry::End => break,
                    // The whole record was removed, only its long name survived
                    DirectoryEntry::Deleted => 1 + lfn_slots,
                    DirectoryEntry::LFN(_) => {
                        warn!("long name {name:?} has no short entry, skipping it");
                        lfn_slots
                    }
                    DirectoryEntry::Real(entry) => {
                        trace!(
                            "entry {name:?} at cluster {} offset {} ({lfn_slots} long name slots)",
                            stream.cluster(),
                            stream.offset()
                        );

                        children.push(Node::from_record(stream, name, lfn_slots, &entry));
                        1 + lfn_slots
                    }
                }
            }
        };

        slots_read += slots;
        cursor = stream.advance(slots * DIRECTORY_ENTRY_SIZE as u32)?;
    }

    Ok(children)
}
