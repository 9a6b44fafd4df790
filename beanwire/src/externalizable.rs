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
//! externalizable
//!
//! # Introduction
//!
//! [`Externalizable`] is the trait a record type implements (directly, or
//! via `#[derive(Externalizable)]`) to participate in this codec: any
//! type recursively serializable by this protocol. It is intentionally
//! object-safe-- `Vec<Box<dyn Externalizable>>` is how the codec
//! represents a heterogeneous array or list whose elements are not all
//! the field's declared default element type (the `ExternalizableArray`,
//! `ExternalizableArrayArray` and `ListOfExternalizables` wire variants all
//! need this).
//!
//! This mirrors the shape of the teacher's own `fields::NdeField` trait:
//! `#[typetag::serde] pub trait NdeField: std::fmt::Display { fn id(&self)
//! -> i32; ... }` is already dyn-compatible and stored as `Box<dyn
//! NdeField>`. `Externalizable` plays the same role here, generalized from
//! NDE's closed set of ~10 field kinds to this codec's 41-variant wire
//! table.
//!
//! # Discussion
//!
//! Resolving a class name read off the wire back into a concrete Rust
//! type requires a registry, since Rust has no runtime reflection over
//! arbitrary type names (design note: "Runtime class lookup by fully-
//! qualified name ... requires a registry: a process-wide mapping from
//! stable name to constructor"). [`register`] populates that registry;
//! callers typically do this once at startup for every concrete
//! `Externalizable` type they expect to see named explicitly on the wire
//! (i.e. every non-default-element-type subclass that can appear in a
//! polymorphic array or list).

use crate::error::{Cause, Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::RwLock;

/// Any record type recursively serializable by this codec.
pub trait Externalizable: std::fmt::Debug {
    /// Serialize `self` to `w` per this type's class descriptor.
    fn write_external(&self, w: &mut dyn Write) -> Result<()>;
    /// Populate `self` (already default-constructed) from `r`.
    fn read_external(&mut self, r: &mut dyn Read) -> Result<()>;
    /// The stable wire name registered for this type via [`register`].
    /// Used to decide whether an `Externalizable` value is "the default
    /// class" for its field (in which case the name is elided on the
    /// wire) or must be spelled out.
    fn class_name(&self) -> TypeName;
    /// Clone this value behind the trait object. A `FieldAccessor::get`
    /// hands the encoder an owned `FieldValue` without consuming the
    /// record it read from, and `Box<dyn Externalizable>` cannot derive
    /// `Clone` (it isn't object-safe), so every implementor supplies its
    /// own-- `#[derive(Externalizable)]` emits `Box::new(self.clone())`,
    /// which in turn requires the type to also derive `Clone`.
    fn clone_box(&self) -> Box<dyn Externalizable>;
}

pub type TypeName = crate::registry::TypeName;

type Factory = Box<dyn Fn() -> Box<dyn Externalizable> + Send + Sync>;

static FACTORIES: Lazy<RwLock<HashMap<TypeName, Factory>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Register `T` under `name` so that a record or array reading a class
/// name of `name` off the wire can construct a fresh `T::default()` to
/// decode into. `T` must be registered exactly once per distinct `name`;
/// re-registering the same name with a different type silently replaces
/// the earlier registration (last writer wins-- same benign-race posture
/// the descriptor cache takes for concurrent first use).
pub fn register<T>(name: TypeName)
where
    T: Externalizable + Default + 'static,
{
    let factory: Factory = Box::new(|| Box::new(T::default()));
    FACTORIES.write().unwrap().insert(name, factory);
}

/// Construct a fresh, default-valued instance of the type registered
/// under `name`, or `Cause::UnknownClassName` if nothing is registered.
pub fn construct(name: &str) -> Result<Box<dyn Externalizable>> {
    let factories = FACTORIES.read().unwrap();
    match factories.get(name) {
        Some(f) => Ok(f()),
        None => Err(Error::new(Cause::UnknownClassName(name.to_string()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone)]
    struct Leaf {
        n: i32,
    }

    impl Externalizable for Leaf {
        fn write_external(&self, w: &mut dyn Write) -> Result<()> {
            crate::wire::write_i32(w, self.n)
        }
        fn read_external(&mut self, r: &mut dyn Read) -> Result<()> {
            self.n = crate::wire::read_i32(r)?;
            Ok(())
        }
        fn class_name(&self) -> TypeName {
            "beanwire::test::Leaf"
        }
        fn clone_box(&self) -> Box<dyn Externalizable> {
            Box::new(self.clone())
        }
    }

    #[test]
    fn register_and_construct() {
        register::<Leaf>("beanwire::test::Leaf");
        let mut inst = construct("beanwire::test::Leaf").unwrap();
        let mut buf: Vec<u8> = Vec::new();
        crate::wire::write_i32(&mut buf, 42).unwrap();
        inst.read_external(&mut buf.as_slice()).unwrap();
        let mut out: Vec<u8> = Vec::new();
        inst.write_external(&mut out).unwrap();
        assert_eq!(out, buf);
    }

    #[test]
    fn unknown_class_name_rejected() {
        assert!(construct("does::not::Exist").is_err());
    }
}
