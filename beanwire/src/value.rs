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
//! value
//!
//! # Introduction
//!
//! [`FieldValue`] is the type-erased carrier a [`crate::accessor::FieldAccessor`]
//! hands the encoder a value through (and the decoder hands a value back
//! through). One arm per row of the wire variant table-- the same idea as
//! the teacher's own `fields::FieldValue` (`pub enum FieldValue { Unknown,
//! Column((i32, String)), String(String), Integer(i32), ... }`), just
//! covering this codec's full 41-variant table instead of NDE's handful of
//! field kinds.
//!
//! Keeping the wire-level encode/decode routines in `codec.rs` operating
//! purely on `FieldValue` (never on the record type directly) is what lets
//! those routines be written once instead of once per record type: the
//! accessor is the only place that knows how to get a `FieldValue` out of,
//! or back into, a concrete struct field.

use crate::date::Date;
use crate::externalizable::Externalizable;
use uuid::Uuid;

/// How a list-valued field's concrete collection type is spelled out on
/// the wire: the built-in resizable array needs no name (`ArrayList`);
/// anything else names itself explicitly so the reader can reconstruct
/// the same concrete kind. Owned rather than `TypeName` because a
/// decoded list's name comes from the wire at run time, not from a
/// compile-time constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListKind {
    Vec,
    Named(String),
}

/// A list of `Externalizable` elements, for the `ListOfExternalizables`
/// variant.
#[derive(Debug)]
pub struct ExternalizableList {
    pub kind: ListKind,
    pub default_element_class: String,
    pub items: Vec<Option<Box<dyn Externalizable>>>,
}

/// Hand-written because `Box<dyn Externalizable>` cannot derive `Clone`;
/// goes through [`Externalizable::clone_box`] per item instead.
impl Clone for ExternalizableList {
    fn clone(&self) -> Self {
        ExternalizableList {
            kind: self.kind.clone(),
            default_element_class: self.default_element_class.clone(),
            items: self
                .items
                .iter()
                .map(|it| it.as_ref().map(|b| b.clone_box()))
                .collect(),
        }
    }
}

/// A list of (possibly absent) strings, for the `ListOfStrings` variant.
#[derive(Debug, Clone)]
pub struct StringList {
    pub kind: ListKind,
    pub items: Vec<Option<String>>,
}

/// A type-erased field value, one arm per row of the wire variant table.
/// Primitive variants (tags 0..7) are never null on the wire and so carry
/// a bare value; every other variant carries an `Option` because its wire
/// encoding begins with a not-null flag byte.
#[derive(Debug)]
pub enum FieldValue {
    PInt(i32),
    PBoolean(bool),
    PByte(i8),
    PChar(char),
    PDouble(f64),
    PFloat(f32),
    PLong(i64),
    PShort(i16),
    StringV(Option<String>),
    DateV(Option<Date>),
    IntegerV(Option<i32>),
    BooleanV(Option<bool>),
    ByteV(Option<i8>),
    CharacterV(Option<char>),
    DoubleV(Option<f64>),
    FloatV(Option<f32>),
    LongV(Option<i64>),
    ShortV(Option<i16>),
    ExternalizableV(Option<Box<dyn Externalizable>>),
    StringArrayV(Option<Vec<String>>),
    DateArrayV(Option<Vec<Date>>),
    PIntArrayV(Option<Vec<i32>>),
    PByteArrayV(Option<Vec<i8>>),
    PDoubleArrayV(Option<Vec<f64>>),
    PFloatArrayV(Option<Vec<f32>>),
    PLongArrayV(Option<Vec<i64>>),
    ListOfExternalizablesV(Option<ExternalizableList>),
    ExternalizableArrayV(Option<Vec<Option<Box<dyn Externalizable>>>>),
    ExternalizableArrayArrayV(Option<Vec<Option<Vec<Option<Box<dyn Externalizable>>>>>>),
    ObjectV(Option<serde_json::Value>),
    UuidV(Option<Uuid>),
    StringArrayArrayV(Option<Vec<Option<Vec<String>>>>),
    DateArrayArrayV(Option<Vec<Option<Vec<Date>>>>),
    PIntArrayArrayV(Option<Vec<Option<Vec<i32>>>>),
    PByteArrayArrayV(Option<Vec<Option<Vec<i8>>>>),
    PDoubleArrayArrayV(Option<Vec<Option<Vec<f64>>>>),
    PFloatArrayArrayV(Option<Vec<Option<Vec<f32>>>>),
    PLongArrayArrayV(Option<Vec<Option<Vec<i64>>>>),
    EnumV(Option<i32>),
    EnumSetV(Option<u64>),
    ListOfStringsV(Option<StringList>),
}
