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
//! accessor
//!
//! # Introduction
//!
//! [`FieldAccessor`] is the capability the encoder/decoder drives a
//! single field through: get a [`FieldValue`] out of a record instance,
//! or set one back into it. Two ways to obtain one:
//!
//! - `#[derive(Externalizable)]` emits a [`ClosureAccessor`] per field,
//!   capturing a plain `field: ty` read/write closure pair-- the
//!   "direct memory accessor" of the spec this crate implements, minus
//!   any actual pointer arithmetic (Rust has no reflection, so the
//!   closure *is* the direct access).
//! - Implementing [`FieldAccessor`] by hand gives you the "method-pair
//!   accessor" variant, for fields that are really a getter/setter pair
//!   over a private representation rather than a plain struct field.
//!
//! Either way, the encoder/decoder only ever sees `&dyn FieldAccessor<T>`,
//! so it is polymorphic over the two exactly as the spec requires.

use crate::error::Result;
use crate::value::FieldValue;

/// Capability over a single field of a record type `T`: read it out as a
/// [`FieldValue`], or write one back in.
pub trait FieldAccessor<T>: Send + Sync {
    fn get(&self, rec: &T) -> Result<FieldValue>;
    fn set(&self, rec: &mut T, value: FieldValue) -> Result<()>;
}

/// A [`FieldAccessor`] built from a pair of plain closures. What
/// `#[derive(Externalizable)]` emits for every field; also usable
/// directly for hand-rolled property-style accessors (closures over a
/// getter/setter pair instead of a bare struct field).
///
/// `get_fn` returns a `Result` (rather than a bare `FieldValue`) because
/// packing an `EnumSet` field can fail when the enum has more than 64
/// variants-- that check can only be made once the concrete enum type is
/// known, i.e. inside the closure the derive macro generates for that one
/// field.
pub struct ClosureAccessor<T> {
    get_fn: Box<dyn Fn(&T) -> Result<FieldValue> + Send + Sync>,
    set_fn: Box<dyn Fn(&mut T, FieldValue) -> Result<()> + Send + Sync>,
}

impl<T> ClosureAccessor<T> {
    pub fn new(
        get_fn: impl Fn(&T) -> Result<FieldValue> + Send + Sync + 'static,
        set_fn: impl Fn(&mut T, FieldValue) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        ClosureAccessor {
            get_fn: Box::new(get_fn),
            set_fn: Box::new(set_fn),
        }
    }
}

impl<T> FieldAccessor<T> for ClosureAccessor<T> {
    fn get(&self, rec: &T) -> Result<FieldValue> {
        (self.get_fn)(rec)
    }
    fn set(&self, rec: &mut T, value: FieldValue) -> Result<()> {
        (self.set_fn)(rec, value)
    }
}
