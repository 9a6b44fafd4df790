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
//! descriptor
//!
//! # Introduction
//!
//! The per-record-class frozen table that drives encode and decode: one
//! [`FieldDescriptor`] per externalized field, sorted ascending by field
//! index, built once per type and cached in a process-wide map keyed by
//! `TypeId`.
//!
//! # Discussion
//!
//! The source spec's "process-wide mutable descriptor cache" becomes a
//! `once_cell`-backed `RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>`
//! here: writes (descriptor install) take the write lock only on the
//! first encode/decode of a given type, reads take the read lock. Two
//! threads racing to build the same type's descriptor for the first time
//! is accepted as benign (both builds are structurally equal; the loser's
//! `Arc` is simply dropped once the winner installs)-- this crate does
//! not reach for a compute-if-absent primitive to close that race, since
//! the spec this implements explicitly calls the race out as tolerable.

use crate::accessor::FieldAccessor;
use crate::error::{Cause, Error, Result};
use crate::registry::{TypeName, WireVariant};
use once_cell::sync::Lazy;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

/// One field's entry in a [`ClassDescriptor`]: its stable index, the wire
/// variant it is encoded as, the declared element type used for class-id
/// elision on array/list/externalizable fields, and the accessor that
/// reads/writes it on a record instance.
pub struct FieldDescriptor<T> {
    pub field_index: u8,
    pub variant: WireVariant,
    pub default_element_type: TypeName,
    pub accessor: Box<dyn FieldAccessor<T>>,
}

impl<T> FieldDescriptor<T> {
    pub fn new(
        field_index: u8,
        variant: WireVariant,
        default_element_type: TypeName,
        accessor: Box<dyn FieldAccessor<T>>,
    ) -> Self {
        FieldDescriptor {
            field_index,
            variant,
            default_element_type,
            accessor,
        }
    }
}

/// The frozen, sorted field table for one record type `T`. Immutable
/// after construction; safe to share across threads as encode/decode's
/// concurrent readers.
pub struct ClassDescriptor<T> {
    pub type_name: TypeName,
    pub fields: Vec<FieldDescriptor<T>>,
}

impl<T> ClassDescriptor<T> {
    fn build(type_name: TypeName, mut fields: Vec<FieldDescriptor<T>>) -> Result<Self> {
        if fields.is_empty() {
            return Err(Error::new(Cause::NoFields(type_name.to_string())));
        }
        let mut seen: HashSet<u8> = HashSet::new();
        for f in &fields {
            if !seen.insert(f.field_index) {
                return Err(Error::new(Cause::DuplicateFieldIndex(
                    f.field_index,
                    type_name.to_string(),
                )));
            }
        }
        fields.sort_by_key(|f| f.field_index);
        Ok(ClassDescriptor { type_name, fields })
    }

    /// Locate the descriptor entry for `field_index`, if this type
    /// declares that field. Used by the decoder's sorted-merge cursor.
    pub fn find(&self, field_index: u8) -> Option<&FieldDescriptor<T>> {
        // `fields` is sorted and small (<=128 entries per the one-byte
        // index space), so a linear scan from a remembered cursor (done
        // by the caller in codec.rs) is preferable to a binary search
        // that would re-pay log(n) on every field; this method itself is
        // also used standalone by callers that don't keep a cursor.
        self.fields.iter().find(|f| f.field_index == field_index)
    }
}

type DescriptorCache = RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

static CACHE: Lazy<DescriptorCache> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Look up (or build and install) the [`ClassDescriptor`] for `T`. `build`
/// is called at most once per type unless an earlier build failed (a
/// failed build is not cached-- there is nothing useful to cache, and
/// retrying costs nothing more than the first attempt did).
pub fn for_type<T: 'static>(
    type_name: TypeName,
    build: impl FnOnce() -> Vec<FieldDescriptor<T>>,
) -> Result<Arc<ClassDescriptor<T>>> {
    let type_id = TypeId::of::<T>();
    if let Some(existing) = CACHE.read().unwrap().get(&type_id) {
        return Ok(existing
            .clone()
            .downcast::<ClassDescriptor<T>>()
            .expect("TypeId uniquely identifies T"));
    }

    log::debug!("descriptor cache miss for {type_name}-- building");
    let desc = Arc::new(ClassDescriptor::build(type_name, build())?);
    let mut cache = CACHE.write().unwrap();
    let installed = cache
        .entry(type_id)
        .or_insert_with(|| desc.clone() as Arc<dyn Any + Send + Sync>)
        .clone();
    Ok(installed
        .downcast::<ClassDescriptor<T>>()
        .expect("TypeId uniquely identifies T"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor::ClosureAccessor;
    use crate::value::FieldValue;

    #[derive(Default)]
    struct Dummy {
        a: i32,
    }

    fn fields() -> Vec<FieldDescriptor<Dummy>> {
        vec![FieldDescriptor::new(
            3,
            WireVariant::PInt,
            "i32",
            Box::new(ClosureAccessor::new(
                |r: &Dummy| Ok(FieldValue::PInt(r.a)),
                |r: &mut Dummy, v| {
                    if let FieldValue::PInt(n) = v {
                        r.a = n;
                    }
                    Ok(())
                },
            )),
        )]
    }

    #[test]
    fn builds_and_caches() {
        let d1 = for_type::<Dummy>("Dummy", fields).unwrap();
        let d2 = for_type::<Dummy>("Dummy", fields).unwrap();
        assert!(Arc::ptr_eq(&d1, &d2));
        assert_eq!(d1.fields[0].field_index, 3);
    }

    struct Empty;
    fn no_fields() -> Vec<FieldDescriptor<Empty>> {
        Vec::new()
    }

    #[test]
    fn empty_descriptor_is_rejected() {
        assert!(for_type::<Empty>("Empty", no_fields).is_err());
    }

    struct Dup;
    fn dup_fields() -> Vec<FieldDescriptor<Dup>> {
        vec![
            FieldDescriptor::new(
                1,
                WireVariant::PInt,
                "i32",
                Box::new(ClosureAccessor::new(
                    |_: &Dup| Ok(FieldValue::PInt(0)),
                    |_: &mut Dup, _| Ok(()),
                )),
            ),
            FieldDescriptor::new(
                1,
                WireVariant::PBoolean,
                "bool",
                Box::new(ClosureAccessor::new(
                    |_: &Dup| Ok(FieldValue::PBoolean(false)),
                    |_: &mut Dup, _| Ok(()),
                )),
            ),
        ]
    }

    #[test]
    fn duplicate_field_index_is_rejected() {
        assert!(for_type::<Dup>("Dup", dup_fields).is_err());
    }

    struct Racy {
        a: i32,
    }

    fn racy_fields() -> Vec<FieldDescriptor<Racy>> {
        vec![FieldDescriptor::new(
            0,
            WireVariant::PInt,
            "i32",
            Box::new(ClosureAccessor::new(
                |r: &Racy| Ok(FieldValue::PInt(r.a)),
                |r: &mut Racy, v| {
                    if let FieldValue::PInt(n) = v {
                        r.a = n;
                    }
                    Ok(())
                },
            )),
        )]
    }

    /// Two threads racing to build `Racy`'s descriptor for the first time
    /// must both succeed and end up sharing the same cached `Arc`-- the
    /// benign-race posture documented in this module's introduction.
    #[test]
    fn concurrent_first_use_installs_once() {
        let (d1, d2) = std::thread::scope(|scope| {
            let h1 = scope.spawn(|| for_type::<Racy>("Racy", racy_fields));
            let h2 = scope.spawn(|| for_type::<Racy>("Racy", racy_fields));
            (h1.join().unwrap(), h2.join().unwrap())
        });
        let d1 = d1.unwrap();
        let d2 = d2.unwrap();
        assert!(Arc::ptr_eq(&d1, &d2));
    }
}
