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
//! `#[derive(Externalizable)]`: reads one `#[beanwire(index = N)]` (plus an
//! optional `default = "name"`) attribute per field, classifies the field's
//! declared Rust type against the closed set of wire variants, and emits:
//!
//! - a `Self::__beanwire_fields()` thunk returning the struct's
//!   `Vec<FieldDescriptor<Self>>`, consumed by `beanwire::descriptor::for_type`
//!   on first use (the "class descriptor construction" step),
//! - the `Externalizable` impl itself, wiring `write_external`/`read_external`
//!   through `beanwire::codec::{encode_record, decode_record}`.
//!
//! # Discussion
//!
//! Field-type classification is purely syntactic (matching the last path
//! segment of the field's declared type against a closed set of shapes), the
//! same kind of type-directed code generation `collo-ml-derive`'s
//! `ViewObject` macro performs over its own closed set of supported field
//! shapes (`i32`, `bool`, object-id types, `Vec<T>`).
//!
//! The one piece of information that cannot be recovered from a field's
//! Rust type alone is the *wire name* of an externalizable field's default
//! (no-class-name-written) element type, because `Box<dyn Externalizable>`
//! erases it. Fields of that shape require an explicit
//! `#[beanwire(index = N, default = "registered::name")]`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    Data, DeriveInput, Field, Fields, GenericArgument, LitInt, LitStr, PathArguments, Type,
    TypeParamBound,
};

struct FieldAttr {
    index: u8,
    default: Option<String>,
}

fn parse_field_attr(field: &Field) -> syn::Result<FieldAttr> {
    let mut index: Option<u8> = None;
    let mut default: Option<String> = None;
    for attr in &field.attrs {
        if !attr.path().is_ident("beanwire") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("index") {
                let lit: LitInt = meta.value()?.parse()?;
                index = Some(lit.base10_parse()?);
                Ok(())
            } else if meta.path.is_ident("default") {
                let lit: LitStr = meta.value()?.parse()?;
                default = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unrecognized beanwire field attribute-- expected `index` or `default`"))
            }
        })?;
    }
    let index = index.ok_or_else(|| {
        syn::Error::new_spanned(field, "every externalized field needs #[beanwire(index = N)]")
    })?;
    Ok(FieldAttr { index, default })
}

fn require_default(attr: &FieldAttr, field: &Field, kind: &str) -> syn::Result<String> {
    attr.default.clone().ok_or_else(|| {
        syn::Error::new_spanned(
            field,
            format!(
                "a {kind} field needs #[beanwire(index = {}, default = \"...\")] naming the \
                 registered wire name of its default element type",
                attr.index
            ),
        )
    })
}

fn last_ident(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(p) => p.path.segments.last().map(|s| s.ident.to_string()),
        _ => None,
    }
}

fn first_type_arg(ty: &Type) -> Option<&Type> {
    let seg = match ty {
        Type::Path(p) => p.path.segments.last()?,
        _ => return None,
    };
    match &seg.arguments {
        PathArguments::AngleBracketed(ab) => ab.args.iter().find_map(|a| match a {
            GenericArgument::Type(t) => Some(t),
            _ => None,
        }),
        _ => None,
    }
}

fn is_externalizable_box(ty: &Type) -> bool {
    if last_ident(ty).as_deref() != Some("Box") {
        return false;
    }
    match first_type_arg(ty) {
        Some(Type::TraitObject(to)) => to.bounds.iter().any(|b| match b {
            TypeParamBound::Trait(tb) => tb
                .path
                .segments
                .last()
                .map(|s| s.ident == "Externalizable")
                .unwrap_or(false),
            _ => false,
        }),
        _ => false,
    }
}

/// `(Rust element type ident, wire variant name)` for the seven element
/// types `StringArray`/`DateArray`/`pIntArray`/... are built from.
const ARRAY_ELEMENTS: &[(&str, &str)] = &[
    ("String", "StringArray"),
    ("Date", "DateArray"),
    ("i32", "PIntArray"),
    ("i8", "PByteArray"),
    ("f64", "PDoubleArray"),
    ("f32", "PFloatArray"),
    ("i64", "PLongArray"),
];

/// `(Rust scalar type ident, wire variant base name)` for the eight boxed-
/// primitive wrapper variants (`Integer`, `Boolean`, ...).
const SCALAR_ELEMENTS: &[(&str, &str)] = &[
    ("i32", "Integer"),
    ("bool", "Boolean"),
    ("i8", "Byte"),
    ("char", "Character"),
    ("f64", "Double"),
    ("f32", "Float"),
    ("i64", "Long"),
    ("i16", "Short"),
];

fn array_variant_for_elem(elem_ident: &str) -> Option<&'static str> {
    ARRAY_ELEMENTS
        .iter()
        .find(|(e, _)| *e == elem_ident)
        .map(|(_, v)| *v)
}

struct Codec {
    variant: TokenStream,
    default_type: TokenStream,
    get_body: TokenStream,
    set_body: TokenStream,
}

fn wire_variant(name: &str) -> TokenStream {
    let ident = format_ident!("{}", name);
    quote! { ::beanwire::registry::WireVariant::#ident }
}

fn field_value_ctor(name: &str) -> proc_macro2::Ident {
    format_ident!("{}V", name)
}

fn plan_required_primitive(ident: &str, field: &syn::Ident) -> Option<Codec> {
    let (wire_name, fv_ident) = match ident {
        "i32" => ("PInt", format_ident!("PInt")),
        "bool" => ("PBoolean", format_ident!("PBoolean")),
        "i8" => ("PByte", format_ident!("PByte")),
        "char" => ("PChar", format_ident!("PChar")),
        "f64" => ("PDouble", format_ident!("PDouble")),
        "f32" => ("PFloat", format_ident!("PFloat")),
        "i64" => ("PLong", format_ident!("PLong")),
        "i16" => ("PShort", format_ident!("PShort")),
        _ => return None,
    };
    let variant = wire_variant(wire_name);
    Some(Codec {
        variant,
        default_type: quote! { "" },
        get_body: quote! { ::beanwire::value::FieldValue::#fv_ident(r.#field) },
        set_body: quote! {
            if let ::beanwire::value::FieldValue::#fv_ident(x) = v {
                r.#field = x;
            }
        },
    })
}

fn plan_array(elem_ident: &str, field: &syn::Ident) -> Option<Codec> {
    let name = array_variant_for_elem(elem_ident)?;
    let variant = wire_variant(name);
    let fv = field_value_ctor(name);
    Some(Codec {
        variant,
        default_type: quote! { "" },
        get_body: quote! { ::beanwire::value::FieldValue::#fv(r.#field.clone()) },
        set_body: quote! {
            if let ::beanwire::value::FieldValue::#fv(x) = v {
                r.#field = x;
            }
        },
    })
}

fn plan_array_array(elem_ident: &str, field: &syn::Ident) -> Option<Codec> {
    let base = array_variant_for_elem(elem_ident)?;
    let name = format!("{base}Array");
    let variant = wire_variant(&name);
    let fv = field_value_ctor(&name);
    Some(Codec {
        variant,
        default_type: quote! { "" },
        get_body: quote! { ::beanwire::value::FieldValue::#fv(r.#field.clone()) },
        set_body: quote! {
            if let ::beanwire::value::FieldValue::#fv(x) = v {
                r.#field = x;
            }
        },
    })
}

fn plan_scalar(elem_ident: &str, field: &syn::Ident) -> Option<Codec> {
    let (_, base) = SCALAR_ELEMENTS.iter().find(|(e, _)| *e == elem_ident)?;
    let wire_name = format!("{base}T");
    let variant = wire_variant(&wire_name);
    let fv = field_value_ctor(base);
    Some(Codec {
        variant,
        default_type: quote! { "" },
        get_body: quote! { ::beanwire::value::FieldValue::#fv(r.#field.clone()) },
        set_body: quote! {
            if let ::beanwire::value::FieldValue::#fv(x) = v {
                r.#field = x;
            }
        },
    })
}

#[allow(clippy::too_many_lines)]
fn plan_for_field(field: &Field, field_name: &syn::Ident, attr: &FieldAttr) -> syn::Result<Codec> {
    let ty = &field.ty;

    if last_ident(ty).as_deref() != Some("Option") {
        // The only field shapes that are not wire-nullable are the eight
        // bare primitives (tags 0..7); everything else begins with a
        // not-null flag byte on the wire and must be `Option<..>`.
        if let Some(name) = last_ident(ty) {
            if let Some(codec) = plan_required_primitive(&name, field_name) {
                return Ok(codec);
            }
        }
        return Err(syn::Error::new_spanned(
            ty,
            "field type must be one of i32/bool/i8/char/f64/f32/i64/i16, or `Option<..>` for \
             every other wire variant",
        ));
    }

    let inner = first_type_arg(ty).ok_or_else(|| {
        syn::Error::new_spanned(ty, "Option<..> field needs an explicit inner type")
    })?;
    let inner_name = last_ident(inner);

    if is_externalizable_box(inner) {
        let default = require_default(attr, field, "single-Externalizable")?;
        return Ok(Codec {
            variant: wire_variant("Externalizable"),
            default_type: quote! { #default },
            get_body: quote! {
                ::beanwire::value::FieldValue::ExternalizableV(
                    r.#field_name.as_ref().map(|b| {
                        ::beanwire::externalizable::Externalizable::clone_box(&**b)
                    })
                )
            },
            set_body: quote! {
                if let ::beanwire::value::FieldValue::ExternalizableV(x) = v {
                    r.#field_name = x;
                }
            },
        });
    }

    match inner_name.as_deref() {
        Some("String") => {
            return Ok(Codec {
                variant: wire_variant("StringT"),
                default_type: quote! { "" },
                get_body: quote! { ::beanwire::value::FieldValue::StringV(r.#field_name.clone()) },
                set_body: quote! {
                    if let ::beanwire::value::FieldValue::StringV(x) = v {
                        r.#field_name = x;
                    }
                },
            });
        }
        Some("Date") => {
            return Ok(Codec {
                variant: wire_variant("DateT"),
                default_type: quote! { "" },
                get_body: quote! { ::beanwire::value::FieldValue::DateV(r.#field_name.clone()) },
                set_body: quote! {
                    if let ::beanwire::value::FieldValue::DateV(x) = v {
                        r.#field_name = x;
                    }
                },
            });
        }
        Some("Uuid") => {
            return Ok(Codec {
                variant: wire_variant("Uuid"),
                default_type: quote! { "" },
                get_body: quote! { ::beanwire::value::FieldValue::UuidV(r.#field_name.clone()) },
                set_body: quote! {
                    if let ::beanwire::value::FieldValue::UuidV(x) = v {
                        r.#field_name = x;
                    }
                },
            });
        }
        Some("Value") => {
            return Ok(Codec {
                variant: wire_variant("Object"),
                default_type: quote! { "" },
                get_body: quote! { ::beanwire::value::FieldValue::ObjectV(r.#field_name.clone()) },
                set_body: quote! {
                    if let ::beanwire::value::FieldValue::ObjectV(x) = v {
                        r.#field_name = x;
                    }
                },
            });
        }
        Some("ExternalizableList") => {
            let _default = require_default(attr, field, "ListOfExternalizables")?;
            return Ok(Codec {
                variant: wire_variant("ListOfExternalizables"),
                default_type: quote! { "" },
                get_body: quote! {
                    ::beanwire::value::FieldValue::ListOfExternalizablesV(r.#field_name.clone())
                },
                set_body: quote! {
                    if let ::beanwire::value::FieldValue::ListOfExternalizablesV(x) = v {
                        r.#field_name = x;
                    }
                },
            });
        }
        Some("StringList") => {
            return Ok(Codec {
                variant: wire_variant("ListOfStrings"),
                default_type: quote! { "" },
                get_body: quote! {
                    ::beanwire::value::FieldValue::ListOfStringsV(r.#field_name.clone())
                },
                set_body: quote! {
                    if let ::beanwire::value::FieldValue::ListOfStringsV(x) = v {
                        r.#field_name = x;
                    }
                },
            });
        }
        Some("HashSet") => {
            let elem = first_type_arg(inner).ok_or_else(|| {
                syn::Error::new_spanned(inner, "HashSet<..> field needs an explicit element type")
            })?;
            return Ok(Codec {
                variant: wire_variant("EnumSet"),
                default_type: quote! { "" },
                get_body: quote! {
                    match &r.#field_name {
                        Some(set) => ::beanwire::value::FieldValue::EnumSetV(Some(
                            ::beanwire::enum_support::pack_enum_set::<#elem>(set.iter())?
                        )),
                        None => ::beanwire::value::FieldValue::EnumSetV(None),
                    }
                },
                set_body: quote! {
                    if let ::beanwire::value::FieldValue::EnumSetV(x) = v {
                        r.#field_name = x.map(|bits| {
                            ::beanwire::enum_support::unpack_enum_set::<#elem>(bits)
                                .into_iter()
                                .collect()
                        });
                    }
                },
            });
        }
        Some("Vec") => {
            let elem = first_type_arg(inner).ok_or_else(|| {
                syn::Error::new_spanned(inner, "Vec<..> field needs an explicit element type")
            })?;
            if let Some(elem_ident) = last_ident(elem) {
                if elem_ident == "Option" {
                    let sub = first_type_arg(elem).ok_or_else(|| {
                        syn::Error::new_spanned(elem, "Vec<Option<..>> needs an explicit inner type")
                    })?;
                    if is_externalizable_box(sub) {
                        let default = require_default(attr, field, "ExternalizableArray")?;
                        return Ok(Codec {
                            variant: wire_variant("ExternalizableArray"),
                            default_type: quote! { #default },
                            get_body: quote! {
                                ::beanwire::value::FieldValue::ExternalizableArrayV(
                                    r.#field_name.as_ref().map(|items| {
                                        items.iter().map(|it| {
                                            it.as_ref().map(|b| {
                                                ::beanwire::externalizable::Externalizable::clone_box(&**b)
                                            })
                                        }).collect()
                                    })
                                )
                            },
                            set_body: quote! {
                                if let ::beanwire::value::FieldValue::ExternalizableArrayV(x) = v {
                                    r.#field_name = x;
                                }
                            },
                        });
                    }
                    if let Some(sub_ident) = last_ident(sub) {
                        if sub_ident == "Vec" {
                            let subelem = first_type_arg(sub).ok_or_else(|| {
                                syn::Error::new_spanned(sub, "Vec<..> needs an explicit element type")
                            })?;
                            // Vec<Option<Vec<Option<Box<dyn Externalizable>>>>>: the
                            // natural shape for a nested array of arrays of
                            // externalized instances (ExternalizableArrayArray).
                            if last_ident(subelem).as_deref() == Some("Option") {
                                let leaf = first_type_arg(subelem).ok_or_else(|| {
                                    syn::Error::new_spanned(
                                        subelem,
                                        "Vec<Option<..>> needs an explicit inner type",
                                    )
                                })?;
                                if is_externalizable_box(leaf) {
                                    let default =
                                        require_default(attr, field, "ExternalizableArrayArray")?;
                                    return Ok(Codec {
                                        variant: wire_variant("ExternalizableArrayArray"),
                                        default_type: quote! { #default },
                                        get_body: quote! {
                                            ::beanwire::value::FieldValue::ExternalizableArrayArrayV(
                                                r.#field_name.as_ref().map(|outer| {
                                                    outer.iter().map(|inner| {
                                                        inner.as_ref().map(|items| {
                                                            items.iter().map(|it| {
                                                                it.as_ref().map(|b| {
                                                                    ::beanwire::externalizable::Externalizable::clone_box(&**b)
                                                                })
                                                            }).collect()
                                                        })
                                                    }).collect()
                                                })
                                            )
                                        },
                                        set_body: quote! {
                                            if let ::beanwire::value::FieldValue::ExternalizableArrayArrayV(x) = v {
                                                r.#field_name = x;
                                            }
                                        },
                                    });
                                }
                            }
                            if let Some(subelem_ident) = last_ident(subelem) {
                                if let Some(codec) = plan_array_array(&subelem_ident, field_name) {
                                    return Ok(codec);
                                }
                            }
                        }
                    }
                    return Err(syn::Error::new_spanned(
                        ty,
                        "unsupported Vec<Option<..>> element shape-- expected Vec<Option<Vec<T>>> \
                         (a 2D primitive/String/Date array), Vec<Option<Box<dyn Externalizable>>>, \
                         or Vec<Option<Vec<Option<Box<dyn Externalizable>>>>>",
                    ));
                }
                if let Some(codec) = plan_array(&elem_ident, field_name) {
                    return Ok(codec);
                }
            }
            return Err(syn::Error::new_spanned(
                ty,
                "unsupported Vec<..> element type-- expected String, Date, i32, i8, f64, f32 or i64",
            ));
        }
        Some(scalar) if SCALAR_ELEMENTS.iter().any(|(e, _)| *e == scalar) => {
            if let Some(codec) = plan_scalar(scalar, field_name) {
                return Ok(codec);
            }
        }
        _ => {}
    }

    // Anything else is taken to be a user enum implementing `WireEnum` via
    // `#[derive(WireEnum)]` or by hand-- this is the one shape that cannot
    // be told apart from an unsupported type by syntax alone, so it is the
    // catch-all rather than the first thing tried.
    Ok(Codec {
        variant: wire_variant("Enum"),
        default_type: quote! { "" },
        get_body: quote! {
            ::beanwire::value::FieldValue::EnumV(
                r.#field_name.as_ref().map(::beanwire::enum_support::WireEnum::to_ordinal)
            )
        },
        set_body: quote! {
            if let ::beanwire::value::FieldValue::EnumV(x) = v {
                r.#field_name = x.and_then(<#inner as ::beanwire::enum_support::WireEnum>::from_ordinal);
            }
        },
    })
}

pub fn derive(ast: DeriveInput) -> syn::Result<TokenStream> {
    let ident = &ast.ident;
    let data = match &ast.data {
        Data::Struct(s) => s,
        _ => {
            return Err(syn::Error::new_spanned(
                &ast,
                "Externalizable can only be derived for a struct",
            ))
        }
    };
    let named = match &data.fields {
        Fields::Named(n) => n,
        _ => {
            return Err(syn::Error::new_spanned(
                &data.fields,
                "Externalizable requires a struct with named fields",
            ))
        }
    };

    let mut seen_indices = std::collections::HashSet::new();
    let mut field_tokens = Vec::with_capacity(named.named.len());
    for field in &named.named {
        let field_name = field.ident.as_ref().expect("named field has an identifier");
        let attr = parse_field_attr(field)?;
        if !seen_indices.insert(attr.index) {
            return Err(syn::Error::new_spanned(
                field,
                format!("duplicate beanwire field index {}", attr.index),
            ));
        }
        let codec = plan_for_field(field, field_name, &attr)?;
        let index = attr.index;
        let Codec {
            variant,
            default_type,
            get_body,
            set_body,
        } = codec;
        field_tokens.push(quote! {
            ::beanwire::descriptor::FieldDescriptor::new(
                #index,
                #variant,
                #default_type,
                ::std::boxed::Box::new(::beanwire::accessor::ClosureAccessor::new(
                    move |r: &Self| -> ::beanwire::error::Result<::beanwire::value::FieldValue> {
                        Ok(#get_body)
                    },
                    move |r: &mut Self, v: ::beanwire::value::FieldValue| -> ::beanwire::error::Result<()> {
                        #set_body
                        Ok(())
                    },
                )),
            )
        });
    }

    if field_tokens.is_empty() {
        return Err(syn::Error::new_spanned(
            &ast,
            "Externalizable requires at least one #[beanwire(index = N)] field",
        ));
    }

    // A bare `ident.to_string()` would collide across modules (two
    // `Person` structs in different modules would both claim the wire
    // name "Person") and would not match a fully-qualified name a caller
    // chose for `externalizable::register`. `module_path!()` expands at
    // the derive's call site-- the annotated struct's own module-- so
    // `concat!(module_path!(), "::", stringify!(Foo))` reproduces exactly
    // the fully-qualified name callers write by hand when registering a
    // type, without this macro needing to know the crate's module tree.
    let type_name_expr = quote! { concat!(module_path!(), "::", stringify!(#ident)) };

    Ok(quote! {
        #[doc(hidden)]
        const _: () = {
            impl #ident {
                fn __beanwire_fields() -> ::std::vec::Vec<::beanwire::descriptor::FieldDescriptor<Self>> {
                    vec![ #(#field_tokens),* ]
                }
            }

            impl ::beanwire::externalizable::Externalizable for #ident {
                fn write_external(&self, w: &mut dyn ::std::io::Write) -> ::beanwire::error::Result<()> {
                    let desc = ::beanwire::descriptor::for_type::<Self>(#type_name_expr, Self::__beanwire_fields)?;
                    ::beanwire::codec::encode_record(self, w, &desc)
                }

                fn read_external(&mut self, r: &mut dyn ::std::io::Read) -> ::beanwire::error::Result<()> {
                    let desc = ::beanwire::descriptor::for_type::<Self>(#type_name_expr, Self::__beanwire_fields)?;
                    ::beanwire::codec::decode_record(self, r, &desc)
                }

                fn class_name(&self) -> ::beanwire::registry::TypeName {
                    #type_name_expr
                }

                fn clone_box(&self) -> ::std::boxed::Box<dyn ::beanwire::externalizable::Externalizable> {
                    ::std::boxed::Box::new(::std::clone::Clone::clone(self))
                }
            }
        };
    })
}
