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
//! demos
//!
//! A small set of record types exercising most of the `#[derive(Externalizable)]`
//! field shapes, used by `beanwire-dump`'s static type table (a binary only
//! knows how to decode the record types it was compiled against-- there is
//! no runtime plugin loading) and as worked examples in this crate's own
//! tests.

use beanwire_derive::{Externalizable, WireEnum};
use serde::{Serialize, Serializer};
use std::collections::HashSet;

/// A membership tier, stored on the wire as an `Enum` (writer's
/// declaration-order ordinal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, WireEnum)]
pub enum Tier {
    Free,
    Plus,
    Pro,
}

/// A permission flag, stored as part of an `EnumSet` bitset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, WireEnum)]
pub enum Permission {
    Read,
    Write,
    Admin,
}

/// A postal address, nested inside [`Person`] via the `Externalizable`
/// variant.
#[derive(Debug, Default, Clone, Serialize, Externalizable)]
pub struct Address {
    #[beanwire(index = 0)]
    pub street: Option<String>,
    #[beanwire(index = 1)]
    pub city: Option<String>,
    #[beanwire(index = 2)]
    pub postal_code: Option<String>,
}

/// A contact record exercising primitives, boxed primitives, a `String`, a
/// nested `Externalizable`, a primitive array, an enum, and an enum set.
#[derive(Debug, Default, Clone, Externalizable)]
pub struct Person {
    #[beanwire(index = 0)]
    pub id: i32,
    #[beanwire(index = 1)]
    pub name: Option<String>,
    #[beanwire(index = 2)]
    pub age: Option<i32>,
    #[beanwire(index = 3, default = "beanwire::demos::Address")]
    pub home: Option<Box<dyn beanwire::externalizable::Externalizable>>,
    #[beanwire(index = 4)]
    pub nicknames: Option<Vec<String>>,
    #[beanwire(index = 5)]
    pub tier: Option<Tier>,
    #[beanwire(index = 6)]
    pub permissions: Option<HashSet<Permission>>,
}

/// `Box<dyn Externalizable>` does not (and cannot cheaply) implement
/// `Serialize`, so `home` is rendered as its wire class name rather than a
/// full nested object-- good enough for `beanwire-dump`'s JSON output,
/// which only ever needs the top-level record's shape.
impl Serialize for Person {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("Person", 7)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("name", &self.name)?;
        s.serialize_field("age", &self.age)?;
        s.serialize_field(
            "home",
            &self
                .home
                .as_ref()
                .map(|h| beanwire::externalizable::Externalizable::class_name(h.as_ref())),
        )?;
        s.serialize_field("nicknames", &self.nicknames)?;
        s.serialize_field("tier", &self.tier)?;
        s.serialize_field("permissions", &self.permissions)?;
        s.end()
    }
}

/// A record exercising `ExternalizableArrayArray`: an array of arrays of
/// externalized instances, each inner array independently nullable.
#[derive(Debug, Default, Clone, Externalizable)]
pub struct Neighborhood {
    #[beanwire(index = 0)]
    pub name: Option<String>,
    #[beanwire(index = 1, default = "beanwire::demos::Address")]
    pub blocks: Option<Vec<Option<Vec<Option<Box<dyn beanwire::externalizable::Externalizable>>>>>>,
}

/// Registers every concrete `Externalizable` type this module declares
/// under a stable wire name, so a reader can resolve a class name read off
/// the wire back into a constructor. Call once at process start before
/// decoding anything that might carry one of these types polymorphically.
pub fn register_demo_types() {
    beanwire::externalizable::register::<Address>("beanwire::demos::Address");
    beanwire::externalizable::register::<Person>("beanwire::demos::Person");
    beanwire::externalizable::register::<Neighborhood>("beanwire::demos::Neighborhood");
}

#[cfg(test)]
mod tests {
    use super::*;
    use beanwire::externalizable::Externalizable;

    #[test]
    fn person_round_trips() {
        register_demo_types();
        let mut permissions = HashSet::new();
        permissions.insert(Permission::Read);
        permissions.insert(Permission::Write);

        let person = Person {
            id: 7,
            name: Some("Ada".to_string()),
            age: Some(36),
            home: Some(Box::new(Address {
                street: Some("1 Analytical Engine Way".to_string()),
                city: Some("London".to_string()),
                postal_code: None,
            })),
            nicknames: Some(vec!["Countess".to_string()]),
            tier: Some(Tier::Pro),
            permissions: Some(permissions),
        };

        let mut bytes = Vec::new();
        person.write_external(&mut bytes).unwrap();

        let mut decoded = Person::default();
        decoded.read_external(&mut bytes.as_slice()).unwrap();

        assert_eq!(decoded.id, 7);
        assert_eq!(decoded.name, Some("Ada".to_string()));
        assert_eq!(decoded.age, Some(36));
        assert_eq!(decoded.nicknames, Some(vec!["Countess".to_string()]));
        assert_eq!(decoded.tier, Some(Tier::Pro));
        assert_eq!(
            decoded.permissions,
            Some(HashSet::from([Permission::Read, Permission::Write]))
        );
        let home = decoded.home.expect("home address present");
        assert_eq!(home.class_name(), "beanwire::demos::Address");
    }

    #[test]
    fn neighborhood_externalizable_array_array_round_trips() {
        register_demo_types();
        let block_a = vec![
            Some(Address {
                street: Some("1 Analytical Engine Way".to_string()),
                city: Some("London".to_string()),
                postal_code: None,
            }),
            None,
        ];
        let block_b: Vec<Address> = Vec::new();
        let neighborhood = Neighborhood {
            name: Some("Bloomsbury".to_string()),
            blocks: Some(vec![
                Some(
                    block_a
                        .into_iter()
                        .map(|a| a.map(|a| Box::new(a) as Box<dyn Externalizable>))
                        .collect(),
                ),
                None,
                Some(
                    block_b
                        .into_iter()
                        .map(|a| Some(Box::new(a) as Box<dyn Externalizable>))
                        .collect(),
                ),
            ]),
        };

        let mut bytes = Vec::new();
        neighborhood.write_external(&mut bytes).unwrap();

        let mut decoded = Neighborhood::default();
        decoded.read_external(&mut bytes.as_slice()).unwrap();

        assert_eq!(decoded.name, Some("Bloomsbury".to_string()));
        let blocks = decoded.blocks.expect("blocks present");
        assert_eq!(blocks.len(), 3);
        let first_block = blocks[0].as_ref().expect("first block present");
        assert_eq!(first_block.len(), 2);
        assert_eq!(
            first_block[0].as_ref().expect("first address present").class_name(),
            "beanwire::demos::Address"
        );
        assert!(first_block[1].is_none());
        assert!(blocks[1].is_none());
        assert_eq!(blocks[2].as_ref().expect("third block present").len(), 0);
    }

    #[test]
    fn missing_optional_fields_round_trip_as_none() {
        register_demo_types();
        let person = Person {
            id: 1,
            name: None,
            age: None,
            home: None,
            nicknames: None,
            tier: None,
            permissions: None,
        };
        let mut bytes = Vec::new();
        person.write_external(&mut bytes).unwrap();

        let mut decoded = Person::default();
        decoded.read_external(&mut bytes.as_slice()).unwrap();
        assert_eq!(decoded.id, 1);
        assert!(decoded.name.is_none());
        assert!(decoded.home.is_none());
        assert!(decoded.permissions.is_none());
    }
}
