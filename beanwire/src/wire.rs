// Copyright (C) 2026 beanwire contributors
//
// This file is part of beanwire.
//
// beanwire is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// beanwire is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with beanwire.  If not, see <http://www.gnu.org/licenses/>.
//! wire
//!
//! # Introduction
//!
//! The byte-oriented primitives the rest of the codec is built on: all
//! integers big-endian, strings length-prefixed with a `u16` byte count
//! (the "modified UTF-8" convention from the wire spec, minus Java's
//! CESU-8 surrogate-pair encoding-- this crate writes plain UTF-8 under
//! that same length prefix).
//!
//! This plays the role the teacher's raw `read_exact`-into-a-fixed-buffer-
//! then-`from_le_bytes` blocks play in `fields::NdeFieldBase::new`, just
//! flipped to big-endian and factored through one macro instead of
//! repeated by hand per primitive.

use crate::error::{Cause, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// Read a single flag byte (0 or 1) and return it as a `bool`. Any other
/// byte value is accepted as "truthy" (matches the wire spec's "flag = 1
/// byte, value 0 or 1" without being brittle about a stray nonzero byte).
pub fn read_flag<R: Read>(r: &mut R) -> Result<bool> {
    Ok(r.read_u8()? != 0)
}

pub fn write_flag<W: Write>(w: &mut W, v: bool) -> Result<()> {
    w.write_u8(if v { 1 } else { 0 })?;
    Ok(())
}

macro_rules! primitive_rw {
    ($read_name:ident, $write_name:ident, $t:ty, $read_m:ident, $write_m:ident) => {
        pub fn $read_name<R: Read>(r: &mut R) -> Result<$t> {
            Ok(r.$read_m::<BigEndian>()?)
        }
        pub fn $write_name<W: Write>(w: &mut W, v: $t) -> Result<()> {
            w.$write_m::<BigEndian>(v)?;
            Ok(())
        }
    };
}

primitive_rw!(read_i16, write_i16, i16, read_i16, write_i16);
primitive_rw!(read_u16, write_u16, u16, read_u16, write_u16);
primitive_rw!(read_i32, write_i32, i32, read_i32, write_i32);
primitive_rw!(read_i64, write_i64, i64, read_i64, write_i64);
primitive_rw!(read_u64, write_u64, u64, read_u64, write_u64);
primitive_rw!(read_f32, write_f32, f32, read_f32, write_f32);
primitive_rw!(read_f64, write_f64, f64, read_f64, write_f64);

pub fn read_u8<R: Read>(r: &mut R) -> Result<u8> {
    Ok(r.read_u8()?)
}

pub fn write_u8<W: Write>(w: &mut W, v: u8) -> Result<()> {
    w.write_u8(v)?;
    Ok(())
}

pub fn read_i8<R: Read>(r: &mut R) -> Result<i8> {
    Ok(r.read_i8()?)
}

pub fn write_i8<W: Write>(w: &mut W, v: i8) -> Result<()> {
    w.write_i8(v)?;
    Ok(())
}

pub fn read_bool<R: Read>(r: &mut R) -> Result<bool> {
    Ok(r.read_u8()? != 0)
}

pub fn write_bool<W: Write>(w: &mut W, v: bool) -> Result<()> {
    w.write_u8(if v { 1 } else { 0 })?;
    Ok(())
}

pub fn read_char<R: Read>(r: &mut R) -> Result<char> {
    let cp = r.read_u16::<BigEndian>()?;
    Ok(char::from_u32(cp as u32).unwrap_or('\u{FFFD}'))
}

pub fn write_char<W: Write>(w: &mut W, v: char) -> Result<()> {
    let cp = v as u32;
    let cp = if cp > u16::MAX as u32 { 0xFFFD } else { cp };
    w.write_u16::<BigEndian>(cp as u16)?;
    Ok(())
}

/// Read a `u16`-length-prefixed UTF string.
pub fn read_utf<R: Read>(r: &mut R) -> Result<String> {
    let cb = r.read_u16::<BigEndian>()? as usize;
    let mut buf = vec![0u8; cb];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|_| crate::error::Error::new(Cause::BadUtf))
}

/// Write a string with a `u16` byte-length prefix.
pub fn write_utf<W: Write>(w: &mut W, s: &str) -> Result<()> {
    let bytes = s.as_bytes();
    if bytes.len() > u16::MAX as usize {
        return Err(crate::error::Error::new(Cause::BadUtf));
    }
    w.write_u16::<BigEndian>(bytes.len() as u16)?;
    w.write_all(bytes)?;
    Ok(())
}

/// Read a 4-byte big-endian length prefix, as used by every length-dynamic
/// variant (`Externalizable`, `ExternalizableArray`, `ExternalizableArrayArray`)
/// and by the CLI's record-framing convention.
pub fn read_length_prefix<R: Read>(r: &mut R) -> Result<u32> {
    Ok(r.read_u32::<BigEndian>()?)
}

pub fn write_length_prefix<W: Write>(w: &mut W, v: u32) -> Result<()> {
    w.write_u32::<BigEndian>(v)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn utf_round_trip() {
        let mut buf: Vec<u8> = Vec::new();
        write_utf(&mut buf, "hi").unwrap();
        assert_eq!(buf, vec![0x00, 0x02, 0x68, 0x69]);
        let mut cur = Cursor::new(buf);
        assert_eq!(read_utf(&mut cur).unwrap(), "hi");
    }

    #[test]
    fn primitive_big_endian() {
        let mut buf: Vec<u8> = Vec::new();
        write_i32(&mut buf, -1).unwrap();
        assert_eq!(buf, vec![0xFF, 0xFF, 0xFF, 0xFF]);
    }
}
