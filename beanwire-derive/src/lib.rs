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
//! beanwire-derive
//!
//! # Introduction
//!
//! Two derive macros that save a `beanwire` record type from hand-writing
//! its own [`beanwire::externalizable::Externalizable`] impl and field
//! accessors:
//!
//! - `#[derive(Externalizable)]`, driven by one `#[beanwire(index = N, ...)]`
//!   attribute per field, builds the `write_external`/`read_external` pair
//!   plus the field-list thunk that `beanwire::descriptor::for_type` consumes
//!   on first use.
//! - `#[derive(WireEnum)]`, for plain fieldless enums used in `Enum`/`EnumSet`
//!   fields, builds the ordinal <-> variant mapping from declaration order.
//!
//! This plays the role a code-generation or derive facility is asked to play
//! wherever the originating design calls for "generated or derived
//! accessors" in place of a reflection-over-fields field list: the
//! descriptor ends up a static table, built once, exactly as that design
//! note asks for.

use proc_macro::TokenStream;

mod externalizable;
mod wire_enum;

/// See the crate-level docs and `externalizable::derive` for the attribute
/// grammar and supported field shapes.
#[proc_macro_derive(Externalizable, attributes(beanwire))]
pub fn derive_externalizable(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as syn::DeriveInput);
    externalizable::derive(ast)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derives [`beanwire::enum_support::WireEnum`] for a fieldless enum, using
/// declaration order as the ordinal. Adding variants at the end is safe;
/// reordering or removing one changes every ordinal after it, which is a
/// wire-breaking change for any reader whose enum predates the change.
#[proc_macro_derive(WireEnum)]
pub fn derive_wire_enum(input: TokenStream) -> TokenStream {
    let ast = syn::parse_macro_input!(input as syn::DeriveInput);
    wire_enum::derive(ast)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
