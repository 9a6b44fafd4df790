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
//! wire_enum
//!
//! `#[derive(WireEnum)]`: declaration-order ordinal <-> variant mapping for
//! a plain, fieldless enum.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields};

pub fn derive(ast: DeriveInput) -> syn::Result<TokenStream> {
    let ident = &ast.ident;
    let data = match &ast.data {
        Data::Enum(e) => e,
        _ => {
            return Err(syn::Error::new_spanned(
                &ast,
                "WireEnum can only be derived for an enum",
            ))
        }
    };

    let mut to_ordinal_arms = Vec::with_capacity(data.variants.len());
    let mut from_ordinal_arms = Vec::with_capacity(data.variants.len());
    let mut name_arms = Vec::with_capacity(data.variants.len());

    for (ordinal, variant) in data.variants.iter().enumerate() {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "WireEnum variants must not carry data-- the wire format stores only the ordinal",
            ));
        }
        let ordinal = ordinal as i32;
        let vident = &variant.ident;
        let vname = vident.to_string();
        to_ordinal_arms.push(quote! { Self::#vident => #ordinal, });
        from_ordinal_arms.push(quote! { #ordinal => Some(Self::#vident), });
        name_arms.push(quote! { Self::#vident => #vname, });
    }
    let variant_count = data.variants.len();

    Ok(quote! {
        impl ::beanwire::enum_support::WireEnum for #ident {
            fn to_ordinal(&self) -> i32 {
                match self {
                    #(#to_ordinal_arms)*
                }
            }

            fn from_ordinal(ordinal: i32) -> Option<Self> {
                match ordinal {
                    #(#from_ordinal_arms)*
                    _ => None,
                }
            }

            fn variant_count() -> usize {
                #variant_count
            }

            fn name(&self) -> &'static str {
                match self {
                    #(#name_arms)*
                }
            }
        }
    })
}
