#![no_std]

extern crate alloc;

pub mod text;

pub fn read_u8(input: &[u8], offset: usize) -> u8 {
    input[offset]
}

pub fn read_u16_le(input: &[u8], offset: usize) -> u16 {
    let mut buffer: [u8; 2] = [0; 2];
    buffer.copy_from_slice(&input[offset..offset + 2]);
    u16::from_le_bytes(buffer)
}

pub fn read_u32_le(input: &[u8], offset: usize) -> u32 {
    let mut buffer: [u8; 4] = [0; 4];
    buffer.copy_from_slice(&input[offset..offset + 4]);
    u32::from_le_bytes(buffer)
}

pub fn read_u16_be(input: &[u8], offset: usize) -> u16 {
    let mut buffer: [u8; 2] = [0; 2];
    buffer.copy_from_slice(&input[offset..offset + 2]);
    u16::from_be_bytes(buffer)
}

pub fn read_u32_be(input: &[u8], offset: usize) -> u32 {
    let mut buffer: [u8; 4] = [0; 4];
    buffer.copy_from_slice(&input[offset..offset + 4]);
    u32::from_be_bytes(buffer)
}
