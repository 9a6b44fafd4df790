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
//! beanwire
//!
//! # Introduction
//!
//! A compact, self-describing binary record codec for user-defined "bean"
//! record types. A record is written as a field count byte followed by
//! `(field index, wire variant tag, [length], payload)` tuples in ascending
//! index order; a reader walks the same tuples and, for any field index it
//! does not recognize, either skips a length-prefixed payload outright or
//! decodes-and-discards one of the closed set of 41 wire variants (see
//! [`registry::WireVariant`]). That is what makes the format tolerant of a
//! writer and a reader built from different versions of the same record
//! type: fields can be added or removed across versions, as long as an
//! existing field's index is never reassigned to a different meaning.
//!
//! This is not a re-implementation of Java's `Externalizable`/
//! `ObjectOutputStream` machinery-- it borrows the name and the field-index
//! discipline, not the object graph/handle-table semantics of Java
//! serialization. There is no cycle detection and no shared-reference
//! preservation; a record graph is written depth-first exactly once.
//!
//! # Discussion
//!
//! ## Getting a record type onto the wire
//!
//! Most callers should reach for the derive facility rather than hand-write
//! field access:
//!
//! ```ignore
//! #[derive(Debug, Default, Clone, beanwire_derive::Externalizable)]
//! struct Point {
//!     #[beanwire(index = 0)]
//!     x: i32,
//!     #[beanwire(index = 1)]
//!     y: i32,
//!     #[beanwire(index = 2)]
//!     label: Option<String>,
//! }
//! ```
//!
//! `#[derive(Externalizable)]` reads the `#[beanwire(index = N)]` attribute
//! on each field, classifies the field's declared type against the wire
//! variant table, and emits the [`externalizable::Externalizable`] impl plus
//! the field-list thunk [`descriptor::for_type`] builds a
//! [`descriptor::ClassDescriptor`] from on first use. See
//! `beanwire-derive`'s crate docs for the full set of supported field
//! shapes.
//!
//! A record whose graph contains another record type reachable only via
//! `Box<dyn Externalizable>` (a polymorphic field, array, or list whose
//! runtime type is not always the field's declared default) must register
//! every concrete type that can appear there with [`externalizable::register`]
//! before decoding, so the reader can turn a wire class name back into a
//! fresh instance to decode into.
//!
//! ## Module map
//!
//! - [`wire`]: big-endian primitive read/write helpers over `std::io::{Read,
//!   Write}`.
//! - [`registry`]: the closed, frozen `WireVariant` tag table.
//! - [`error`]: the `Cause`/`Error` pair every fallible operation in this
//!   crate returns.
//! - [`value`]: [`value::FieldValue`], the type-erased carrier a field's
//!   value passes through the encoder/decoder as.
//! - [`accessor`]: [`accessor::FieldAccessor`], the capability a descriptor
//!   reads/writes a single field through.
//! - [`externalizable`]: the [`externalizable::Externalizable`] trait and
//!   its process-wide class-name registry.
//! - [`date`], [`enum_support`]: the `Date` newtype and the `WireEnum`/
//!   `EnumSet` support a derived enum field needs.
//! - [`scratch`]: the per-thread scratch buffer length-dynamic variants
//!   stage their payload into before the length prefix can be written.
//! - [`descriptor`]: [`descriptor::ClassDescriptor`], built once per type and
//!   cached for the process's lifetime.
//! - [`codec`]: `encode_record`/`decode_record`, the actual wire format.
//!
//! This crate never initializes a logger-- it only calls [`log`]'s macros.
//! A binary embedding it (see `beanwire-dump`) decides how `log` output is
//! rendered.

pub mod accessor;
pub mod codec;
pub mod date;
pub mod descriptor;
pub mod enum_support;
pub mod error;
pub mod externalizable;
pub mod registry;
pub mod scratch;
pub mod value;
pub mod wire;

// `beanwire-derive`'s generated code refers to this crate by its published
// name (`::beanwire::...`) so that downstream crates depending on
// `beanwire` can use the derive unmodified. The `demos` module below
// dogfoods the same derive from inside this crate, which only resolves
// `::beanwire::...` paths if the crate also answers to its own name.
extern crate self as beanwire;

pub mod demos;
