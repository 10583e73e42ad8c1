//! Rendering of resolved types and default values into Rust tokens, for use by code templates.
//!
//! Native types render to plain Rust types (`u32`, `String`, `Vec<T>`, ...). Wire types render
//! to the `zvariant` wrappers that keep their signature.

use heck::{CamelCase, SnakeCase};
use proc_macro2::{Span, TokenStream};
use quote::{quote, ToTokens, TokenStreamExt};
use syn::Ident;

use dbus_signature::{Primitive, ResolvedType, Value};

/// Type hint of a resolved type, usable directly inside `quote!`
#[derive(Debug, Clone, Copy)]
pub struct TypeHint<'a>(pub &'a ResolvedType);

impl ToTokens for TypeHint<'_> {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.append_all(type_hint(self.0));
    }
}

/// Expression constructing a value, usable directly inside `quote!`
#[derive(Debug, Clone, Copy)]
pub struct Literal<'a>(pub &'a Value);

impl ToTokens for Literal<'_> {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.append_all(literal(self.0));
    }
}

pub fn type_hint(ty: &ResolvedType) -> TokenStream {
    match ty {
        ResolvedType::Boolean => quote!(bool),
        ResolvedType::Integer(primitive) => primitive_hint(*primitive),
        ResolvedType::Double => quote!(f64),
        ResolvedType::Text(_) => quote!(String),
        ResolvedType::Bytes => quote!(Vec<u8>),
        ResolvedType::Any => quote!(zvariant::OwnedValue),
        ResolvedType::Sequence(element) => {
            let element = type_hint(element);
            quote!(Vec<#element>)
        }
        ResolvedType::Mapping(key, value) => {
            let key = type_hint(key);
            let value = type_hint(value);
            quote!(std::collections::HashMap<#key, #value>)
        }
        ResolvedType::Tuple(members) => {
            let members = members.iter().map(type_hint);
            quote!((#(#members,)*))
        }
        ResolvedType::Wire { inner, .. } => wire_type_hint(inner),
    }
}

#[rustfmt::skip]
fn primitive_hint(primitive: Primitive) -> TokenStream {
    use Primitive::*;

    match primitive {
        Boolean    => quote!(bool),
        Byte       => quote!(u8),
        Int16      => quote!(i16),
        UInt16     => quote!(u16),
        Int32      => quote!(i32),
        UInt32     => quote!(u32),
        Int64      => quote!(i64),
        UInt64     => quote!(u64),
        Double     => quote!(f64),
        String     => quote!(String),
        ObjectPath => quote!(zvariant::OwnedObjectPath),
        Signature  => quote!(zvariant::OwnedSignature),
        UnixFd     => quote!(zvariant::OwnedFd),
        Variant    => quote!(zvariant::OwnedValue),
    }
}

fn wire_type_hint(inner: &ResolvedType) -> TokenStream {
    match inner {
        ResolvedType::Integer(primitive) | ResolvedType::Text(primitive) => {
            primitive_hint(*primitive)
        }
        ResolvedType::Sequence(_) => quote!(zvariant::Array<'static>),
        ResolvedType::Mapping(..) => quote!(zvariant::Dict<'static, 'static>),
        ResolvedType::Tuple(_) => quote!(zvariant::Structure<'static>),
        other => type_hint(other),
    }
}

pub fn literal(value: &Value) -> TokenStream {
    match value {
        Value::Boolean(value) => quote!(#value),
        Value::Integer(value) => proc_macro2::Literal::i64_unsuffixed(*value).into_token_stream(),
        Value::Double(value) => proc_macro2::Literal::f64_unsuffixed(*value).into_token_stream(),
        Value::Text(text) if text.is_empty() => quote!(String::new()),
        Value::Text(text) => quote!(String::from(#text)),
        Value::Bytes(bytes) if bytes.is_empty() => quote!(Vec::<u8>::new()),
        Value::Bytes(bytes) => quote!(vec![#(#bytes),*]),
        Value::Variant(inner) => {
            let inner = literal(inner);
            quote!(zvariant::OwnedValue::from(zvariant::Value::from(#inner)))
        }
        Value::Sequence { element, items } if items.is_empty() => {
            let element = type_hint(element);
            quote!(Vec::<#element>::new())
        }
        Value::Sequence { items, .. } => {
            let items = items.iter().map(literal);
            quote!(vec![#(#items),*])
        }
        Value::Mapping { key, value, entries } => {
            let key = type_hint(key);
            let value = type_hint(value);
            if entries.is_empty() {
                return quote!(std::collections::HashMap::<#key, #value>::new());
            }

            let keys = entries.iter().map(|(k, _)| literal(k));
            let values = entries.iter().map(|(_, v)| literal(v));
            quote! {
                vec![#((#keys, #values)),*]
                    .into_iter()
                    .collect::<std::collections::HashMap<#key, #value>>()
            }
        }
        Value::Tuple(items) => {
            let items = items.iter().map(literal);
            quote!((#(#items,)*))
        }
        Value::Wire { signature, value } => wire_literal(signature, value),
    }
}

fn wire_literal(signature: &str, value: &Value) -> TokenStream {
    match value {
        Value::Integer(value) => wire_integer(signature, *value),
        Value::Text(_) if signature != "s" => {
            let primitive = signature.chars().next().and_then(Primitive::from_code);
            let hint = primitive.map_or_else(|| quote!(String), primitive_hint);
            quote!(<#hint>::default())
        }
        Value::Sequence { element, .. } => {
            let element = element.signature().unwrap_or(&signature[1..]);
            quote!(zvariant::Array::new(zvariant::Signature::from_static_str_unchecked(#element)))
        }
        Value::Mapping { key, value, .. } => {
            let key = key.signature().unwrap_or_default();
            let value = value.signature().unwrap_or_default();
            quote! {
                zvariant::Dict::new(
                    zvariant::Signature::from_static_str_unchecked(#key),
                    zvariant::Signature::from_static_str_unchecked(#value),
                )
            }
        }
        Value::Tuple(members) => {
            let members = members.iter().map(literal);
            quote!(zvariant::StructureBuilder::new()#(.add_field(#members))*.build())
        }
        other => literal(other),
    }
}

#[rustfmt::skip]
fn wire_integer(signature: &str, value: i64) -> TokenStream {
    use proc_macro2::Literal;

    let literal = match signature {
        "y" => Literal::u8_suffixed(value as u8),
        "n" => Literal::i16_suffixed(value as i16),
        "q" => Literal::u16_suffixed(value as u16),
        "i" => Literal::i32_suffixed(value as i32),
        "u" => Literal::u32_suffixed(value as u32),
        "x" => Literal::i64_suffixed(value),
        "t" => Literal::u64_suffixed(value as u64),
        _   => Literal::i64_unsuffixed(value),
    };
    literal.into_token_stream()
}

/// Identifier for a method, signal, property or arg name, e.g. `GetAll` -> `get_all`
pub fn member_ident(name: &str) -> Ident {
    make_ident(name.to_snake_case())
}

/// Identifier for the type generated from an interface, e.g. `org.example.FooBar` -> `FooBar`
pub fn type_ident(interface_name: &str) -> Ident {
    let last = interface_name.rsplit('.').next().unwrap_or(interface_name);
    make_ident(last.to_camel_case())
}

fn make_ident(mut name: String) -> Ident {
    if name.is_empty() {
        name.push_str("unnamed");
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    // Keywords get a trailing underscore, e.g. `type` -> `type_`
    if syn::parse_str::<Ident>(&name).is_err() {
        name.push('_');
    }
    Ident::new(&name, Span::call_site())
}
