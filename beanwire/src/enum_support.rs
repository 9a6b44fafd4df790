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
//! enum_support
//!
//! # Introduction
//!
//! [`WireEnum`] is the trait a plain Rust enum implements (directly, or
//! via `#[derive(WireEnum)]`) to be usable in an `Enum` or `EnumSet`
//! field. The wire stores the writer's *declaration-order ordinal*, not
//! the variant's name-- adding variants at the end is safe, reordering or
//! removing one is not. This is a known hazard inherited as-is (see
//! `DESIGN.md`); `name()` exists so a future name-keyed mode could be
//! layered on without changing today's wire format, but no such mode
//! ships.

use crate::error::{Cause, Error, Result};

pub trait WireEnum: Sized {
    /// Declaration-order ordinal, starting at zero. This is exactly what
    /// gets written to the wire for the `Enum` variant and folded into
    /// the bitset for `EnumSet`.
    fn to_ordinal(&self) -> i32;

    /// Reconstruct a variant from a writer's ordinal. Returns `None` if
    /// the ordinal is out of range for *this* reader's enum-- e.g. the
    /// writer's enum had more variants than the reader currently knows
    /// about.
    fn from_ordinal(ordinal: i32) -> Option<Self>;

    /// Total number of declared variants. An `EnumSet` over an enum with
    /// more than 64 variants cannot be represented by the 8-byte bitset
    /// the wire format uses.
    fn variant_count() -> usize;

    /// The variant's own name, for diagnostics and potential future
    /// name-keyed encoding-- never consulted by the default wire format.
    fn name(&self) -> &'static str;
}

/// Pack a set of enum ordinals into the 8-byte bitset `EnumSet` uses.
/// Fails if the enum has more than 64 declared variants. Takes borrowed
/// values, not owned ones, since the derived accessor packs straight out
/// of a `&HashSet<E>` field without consuming it.
pub fn pack_enum_set<'a, E: WireEnum + 'a>(values: impl IntoIterator<Item = &'a E>) -> Result<u64> {
    if E::variant_count() > 64 {
        return Err(Error::new(Cause::TooManyEnumValues(
            std::any::type_name::<E>().to_string(),
        )));
    }
    let mut bits: u64 = 0;
    for v in values {
        bits |= 1u64 << v.to_ordinal();
    }
    Ok(bits)
}

/// Unpack a bitset into the set of ordinals present, each mapped back to
/// `E` via [`WireEnum::from_ordinal`]. Ordinals the reader's enum does
/// not recognize are silently dropped (the same "reader may not recognize
/// everything the writer wrote" posture the rest of the codec takes).
pub fn unpack_enum_set<E: WireEnum>(bits: u64) -> Vec<E> {
    let mut out = Vec::new();
    for ordinal in 0..64 {
        if bits & (1u64 << ordinal) != 0 {
            if let Some(v) = E::from_ordinal(ordinal) {
                out.push(v);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Eq)]
    enum Color {
        Red,
        Green,
        Blue,
    }

    impl WireEnum for Color {
        fn to_ordinal(&self) -> i32 {
            match self {
                Color::Red => 0,
                Color::Green => 1,
                Color::Blue => 2,
            }
        }
        fn from_ordinal(ordinal: i32) -> Option<Self> {
            match ordinal {
                0 => Some(Color::Red),
                1 => Some(Color::Green),
                2 => Some(Color::Blue),
                _ => None,
            }
        }
        fn variant_count() -> usize {
            3
        }
        fn name(&self) -> &'static str {
            match self {
                Color::Red => "Red",
                Color::Green => "Green",
                Color::Blue => "Blue",
            }
        }
    }

    #[test]
    fn pack_and_unpack() {
        let values = vec![Color::Red, Color::Blue];
        let bits = pack_enum_set(values.iter()).unwrap();
        assert_eq!(bits, 0b101);
        let mut back = unpack_enum_set::<Color>(bits);
        back.sort_by_key(|c| c.to_ordinal());
        assert_eq!(back, vec![Color::Red, Color::Blue]);
    }

    #[derive(Debug)]
    enum Big {}

    impl WireEnum for Big {
        fn to_ordinal(&self) -> i32 {
            unreachable!()
        }
        fn from_ordinal(_: i32) -> Option<Self> {
            None
        }
        fn variant_count() -> usize {
            65
        }
        fn name(&self) -> &'static str {
            unreachable!()
        }
    }

    #[test]
    fn too_many_enum_values_rejected() {
        let empty: Vec<Big> = Vec::new();
        assert!(pack_enum_set(empty.iter()).is_err());
    }
}
