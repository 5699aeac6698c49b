use bin_tools::text::decode_utf16_le;
use block_device::OffsetRead;
use log::warn;
use vfat32_core::entry::{
    Attributes, DirectoryEntry, ATTRIBUTES_OFFSET, DIRECTORY_ENTRY_SIZE,
    LFN_BYTES_PER_SLOT, MAX_LFN_SLOTS, MAX_NAME_LENGTH,
};

use crate::{
    error::{DeviceError, Error, Result},
    stream::EntryStream,
};

/// Reads the name of the record starting at the stream's origin.
///
/// Returns the name and the number of long name slots in front of the
/// record's short entry. Records without a long name are named by their raw
/// 11 byte short name field.
pub fn resolve_name<D>(stream: &EntryStream<'_, D>) -> Result<(String, u32)>
where
    D: OffsetRead,
    D::Error: DeviceError,
{
    let mut attributes = [0u8; 1];
    stream.read(ATTRIBUTES_OFFSET as u32, &mut attributes)?;

    if Attributes::from_bits_retain(attributes[0]).is_long_name() {
        resolve_long_name(stream)
    } else {
        let mut short_name = [0u8; 11];
        stream.read(0, &mut short_name)?;

        Ok((short_name.iter().map(|b| char::from(*b)).collect(), 0))
    }
}

fn resolve_long_name<D>(stream: &EntryStream<'_, D>) -> Result<(String, u32)>
where
    D: OffsetRead,
    D::Error: DeviceError,
{
    let mut utf16_name = vec![0u8; MAX_LFN_SLOTS * LFN_BYTES_PER_SLOT];
    let mut seen = [false; MAX_LFN_SLOTS];
    let mut highest = 0;
    let mut checksum = None;

    // Slots come highest ordinal first; ordinal 0 sits right before the
    // short entry and ends the run
    for index in 0..MAX_LFN_SLOTS {
        let mut slot = [0u8; DIRECTORY_ENTRY_SIZE];
        stream.read((index * DIRECTORY_ENTRY_SIZE) as u32, &mut slot)?;

        let DirectoryEntry::LFN(entry) = DirectoryEntry::read(&slot) else {
            return Err(sequence_gap(&seen, highest));
        };

        let Some(ordinal) = entry.ordinal().filter(|o| *o < MAX_LFN_SLOTS) else {
            return Err(sequence_gap(&seen, highest));
        };

        if index == 0 {
            // The run has to open with the flagged, highest ordinal slot
            if !entry.is_last() {
                return Err(Error::LfnSequenceGap {
                    ordinal: ordinal + 1,
                });
            }
            highest = ordinal;
        } else if ordinal >= highest || seen[ordinal] {
            return Err(sequence_gap(&seen, highest));
        }

        seen[ordinal] = true;
        checksum.get_or_insert(entry.short_name_checksum());

        let start = ordinal * LFN_BYTES_PER_SLOT;
        utf16_name[start..start + LFN_BYTES_PER_SLOT].copy_from_slice(entry.name_bytes());

        if ordinal == 0 {
            if let Some(missing) = seen[..=highest].iter().position(|s| !s) {
                return Err(Error::LfnSequenceGap { ordinal: missing });
            }

            let name = decode_utf16_le(&utf16_name);
            let length = name.encode_utf16().count();
            if length > MAX_NAME_LENGTH {
                return Err(Error::NameTooLong(length));
            }

            let slots = index + 1;
            check_short_name(stream, slots, checksum, &name)?;

            return Ok((name, slots as u32));
        }
    }

    Err(sequence_gap(&seen, highest))
}

/// The gap reported when the run breaks off: the highest ordinal below
/// `highest` that has not turned up yet.
fn sequence_gap(seen: &[bool], highest: usize) -> Error {
    let missing = (0..highest).rev().find(|o| !seen[*o]).unwrap_or(0);

    Error::LfnSequenceGap { ordinal: missing }
}

fn check_short_name<D>(
    stream: &EntryStream<'_, D>,
    slots: usize,
    checksum: Option<u8>,
    name: &str,
) -> Result<()>
where
    D: OffsetRead,
    D::Error: DeviceError,
{
    let mut slot = [0u8; DIRECTORY_ENTRY_SIZE];
    stream.read((slots * DIRECTORY_ENTRY_SIZE) as u32, &mut slot)?;

    // Deleted or missing short entries are dealt with by the lister
    let DirectoryEntry::Real(short_entry) = DirectoryEntry::read(&slot) else {
        return Ok(());
    };

    let expected = short_entry.checksum();
    if checksum != Some(expected) {
        warn!(
            "long name {name:?} carries checksum {:#04x}, its short entry hashes to {expected:#04x}",
            checksum.unwrap_or_default()
        );
    }

    Ok(())
}
