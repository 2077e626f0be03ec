//! Shared winnow-based parsing and byteorder-based writing utilities used by
//! the trailing editor chunks.
//!
//! Chunk fields are little-endian. Strings use a 7-bit variable-length byte
//! count followed by UTF-8 bytes.

use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use winnow::Parser;
use winnow::binary::{le_i16, le_i32, le_u8};
use winnow::error::{ContextError, ErrMode};
use winnow::token::take;

use crate::game_types::{Fix, FixAngles, FixVector};

/// Common result type for winnow parsers.
pub type WResult<T> = Result<T, ErrMode<ContextError>>;

fn cut<T>() -> WResult<T> {
    Err(ErrMode::Cut(ContextError::new()))
}

/// Parse a 7-bit encoded length (at most five bytes).
pub fn parse_7bit_len(input: &mut &[u8]) -> WResult<usize> {
    let mut value: u32 = 0;
    for shift in (0..35).step_by(7) {
        let byte = le_u8.parse_next(input)?;
        value |= ((byte & 0x7F) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok(value as usize);
        }
    }
    cut()
}

/// Parse a length-prefixed UTF-8 string.
pub fn parse_prefixed_string(input: &mut &[u8]) -> WResult<String> {
    let len = parse_7bit_len(input)?;
    let bytes = take(len).parse_next(input)?;
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s.to_owned()),
        Err(_) => cut(),
    }
}

/// Parse `count` length-prefixed strings.
pub fn parse_string_list(input: &mut &[u8], count: usize) -> WResult<Vec<String>> {
    let mut out = Vec::with_capacity(count.min(input.len()));
    for _ in 0..count {
        out.push(parse_prefixed_string(input)?);
    }
    Ok(out)
}

/// Parse a one-byte boolean. Any non-zero byte is `true`.
pub fn parse_bool(input: &mut &[u8]) -> WResult<bool> {
    Ok(le_u8.parse_next(input)? != 0)
}

pub fn parse_fix_vector(input: &mut &[u8]) -> WResult<FixVector> {
    let x = le_i32.parse_next(input)?;
    let y = le_i32.parse_next(input)?;
    let z = le_i32.parse_next(input)?;
    Ok(FixVector::from_raw(x, y, z))
}

pub fn parse_fix_angles(input: &mut &[u8]) -> WResult<FixAngles> {
    let p = le_i16.parse_next(input)?;
    let b = le_i16.parse_next(input)?;
    let h = le_i16.parse_next(input)?;
    Ok(FixAngles { p, b, h })
}

/// Write a 7-bit encoded length.
pub fn write_7bit_len(out: &mut impl Write, len: usize) -> io::Result<()> {
    let mut value = len as u32;
    while value >= 0x80 {
        out.write_u8((value as u8) | 0x80)?;
        value >>= 7;
    }
    out.write_u8(value as u8)
}

/// Write a length-prefixed UTF-8 string.
pub fn write_prefixed_string(out: &mut impl Write, s: &str) -> io::Result<()> {
    write_7bit_len(out, s.len())?;
    out.write_all(s.as_bytes())
}

pub fn write_fix(out: &mut impl Write, value: Fix) -> io::Result<()> {
    out.write_i32::<LittleEndian>(value.0)
}

pub fn write_fix_vector(out: &mut impl Write, v: &FixVector) -> io::Result<()> {
    write_fix(out, v.x)?;
    write_fix(out, v.y)?;
    write_fix(out, v.z)
}

pub fn write_fix_angles(out: &mut impl Write, a: &FixAngles) -> io::Result<()> {
    out.write_i16::<LittleEndian>(a.p)?;
    out.write_i16::<LittleEndian>(a.b)?;
    out.write_i16::<LittleEndian>(a.h)
}
