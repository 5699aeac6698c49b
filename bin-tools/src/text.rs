use alloc::string::String;

use crate::read_u16_le;

/// Unit used by FAT to pad the unused tail of a long name slot.
pub const UTF16_PADDING: u16 = 0xFFFF;

/// Transcodes a UTF-16LE buffer into a `String`.
///
/// Decoding stops at the first NUL unit. Padding units are dropped and
/// unpaired surrogates become U+FFFD, so the result is always valid text.
pub fn decode_utf16_le(buffer: &[u8]) -> String {
    let units = (0..buffer.len() / 2)
        .map(|i| read_u16_le(buffer, i * 2))
        .take_while(|unit| *unit != 0)
        .filter(|unit| *unit != UTF16_PADDING);

    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
