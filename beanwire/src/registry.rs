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
//! registry
//!
//! # Introduction
//!
//! [`WireVariant`] enumerates the closed set of wire encodings this codec
//! understands (the table in the wire-format section of the spec this
//! crate implements), together with the frozen tag-id <-> variant mapping
//! and the "is this variant's payload length-prefixed?" predicate that
//! lets a reader skip a field it does not recognize.
//!
//! This plays the role `fields::FieldType` plays in the teacher: a closed,
//! numbered enumeration of on-disk field shapes, with a `from(u8)`
//! constructor for the reverse lookup. Here the table is an order of
//! magnitude larger (41 rows instead of 16), so the reverse lookup is
//! driven by a `match` arm per tag rather than hand-copied twice.

use crate::error::{Cause, Error, Result};

/// One entry per row of the wire variant table: a closed set of 41
/// specialized encodings (tags 0..40), plus the generic object fallback.
/// Adding a new variant is a protocol-breaking change and must not be
/// done outside of a major version bump of this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum WireVariant {
    PInt = 0,
    PBoolean = 1,
    PByte = 2,
    PChar = 3,
    PDouble = 4,
    PFloat = 5,
    PLong = 6,
    PShort = 7,
    StringT = 8,
    DateT = 9,
    IntegerT = 10,
    BooleanT = 11,
    ByteT = 12,
    CharacterT = 13,
    DoubleT = 14,
    FloatT = 15,
    LongT = 16,
    ShortT = 17,
    Externalizable = 18,
    StringArray = 19,
    DateArray = 20,
    PIntArray = 21,
    PByteArray = 22,
    PDoubleArray = 23,
    PFloatArray = 24,
    PLongArray = 25,
    ListOfExternalizables = 26,
    ExternalizableArray = 27,
    ExternalizableArrayArray = 28,
    Object = 29,
    Uuid = 30,
    StringArrayArray = 31,
    DateArrayArray = 32,
    PIntArrayArray = 33,
    PByteArrayArray = 34,
    PDoubleArrayArray = 35,
    PFloatArrayArray = 36,
    PLongArrayArray = 37,
    Enum = 38,
    EnumSet = 39,
    ListOfStrings = 40,
}

impl WireVariant {
    pub fn tag_id(self) -> u8 {
        self as u8
    }

    /// Reverse lookup by the single tag byte that precedes every field's
    /// payload on the wire.
    pub fn from_tag_id(id: u8) -> Result<WireVariant> {
        use WireVariant::*;
        Ok(match id {
            0 => PInt,
            1 => PBoolean,
            2 => PByte,
            3 => PChar,
            4 => PDouble,
            5 => PFloat,
            6 => PLong,
            7 => PShort,
            8 => StringT,
            9 => DateT,
            10 => IntegerT,
            11 => BooleanT,
            12 => ByteT,
            13 => CharacterT,
            14 => DoubleT,
            15 => FloatT,
            16 => LongT,
            17 => ShortT,
            18 => Externalizable,
            19 => StringArray,
            20 => DateArray,
            21 => PIntArray,
            22 => PByteArray,
            23 => PDoubleArray,
            24 => PFloatArray,
            25 => PLongArray,
            26 => ListOfExternalizables,
            27 => ExternalizableArray,
            28 => ExternalizableArrayArray,
            29 => Object,
            30 => Uuid,
            31 => StringArrayArray,
            32 => DateArrayArray,
            33 => PIntArrayArray,
            34 => PByteArrayArray,
            35 => PDoubleArrayArray,
            36 => PFloatArrayArray,
            37 => PLongArrayArray,
            38 => Enum,
            39 => EnumSet,
            40 => ListOfStrings,
            other => return Err(Error::new(Cause::UnrecognizedTag(other, 0))),
        })
    }

    /// True iff this variant's payload is preceded by a 4-byte length
    /// prefix, which is exactly the set of variants a reader may skip
    /// blindly without understanding their payload at all. Frozen at
    /// `{Externalizable, ExternalizableArray, ExternalizableArrayArray}`;
    /// every other variant is either fixed-width or recursively composed
    /// of primitives with an inline element count, and must be either
    /// fully recognized or rejected, never guessed at.
    pub fn is_length_dynamic(self) -> bool {
        matches!(
            self,
            WireVariant::Externalizable
                | WireVariant::ExternalizableArray
                | WireVariant::ExternalizableArrayArray
        )
    }
}

/// A stable, wire-visible name for a record type or element type, used
/// wherever the wire format spells out a class name explicitly (the
/// `Externalizable` variant's class-name slot, a non-default list's
/// concrete-class slot, a list's default-element-class slot). Kept
/// distinct from `std::any::type_name`, which is explicitly documented as
/// unstable and unsuitable for a wire contract-- callers choose their own
/// stable name via [`register`].
pub type TypeName = &'static str;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_ids_are_stable() {
        assert_eq!(WireVariant::PInt.tag_id(), 0);
        assert_eq!(WireVariant::Enum.tag_id(), 38);
        assert_eq!(WireVariant::ListOfStrings.tag_id(), 40);
    }

    #[test]
    fn round_trip_every_tag() {
        for id in 0u8..=40 {
            let v = WireVariant::from_tag_id(id).unwrap();
            assert_eq!(v.tag_id(), id);
        }
    }

    #[test]
    fn unknown_tag_rejected() {
        assert!(WireVariant::from_tag_id(41).is_err());
        assert!(WireVariant::from_tag_id(255).is_err());
    }

    #[test]
    fn length_dynamic_set_is_frozen() {
        let dynamic: Vec<WireVariant> = (0u8..=40)
            .map(|id| WireVariant::from_tag_id(id).unwrap())
            .filter(|v| v.is_length_dynamic())
            .collect();
        assert_eq!(
            dynamic,
            vec![
                WireVariant::Externalizable,
                WireVariant::ExternalizableArray,
                WireVariant::ExternalizableArrayArray,
            ]
        );
    }
}
