//! Mapping of parsed type descriptors to target types

use crate::{
    signature::{parse, Primitive, TypeDescriptor},
    Error, Result,
};

/// Selects what a descriptor resolves to
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Mode {
    /// Plain logical types (integers, text, sequences, ...)
    Native,

    /// Typed wrappers that keep the exact signature each value was generated from
    Wire,
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Native
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum ResolvedType {
    Boolean,

    /// Any integer type, the primitive records the width on the wire
    Integer(Primitive),

    Double,

    /// Strings, object paths, signatures and unix fds
    Text(Primitive),

    /// An array of bytes
    Bytes,

    /// A variant, can hold a value of any type
    Any,

    Sequence(Box<ResolvedType>),
    Mapping(Box<ResolvedType>, Box<ResolvedType>),
    Tuple(Vec<ResolvedType>),

    /// A wire mode type, `inner` is resolved in wire mode as well
    Wire { signature: String, inner: Box<ResolvedType> },
}

impl ResolvedType {
    /// The generating signature of a wire mode type
    pub fn signature(&self) -> Option<&str> {
        match self {
            ResolvedType::Wire { signature, .. } => Some(signature.as_str()),
            _ => None,
        }
    }

    /// Strips the wire wrapper, if any
    pub fn kind(&self) -> &ResolvedType {
        match self {
            ResolvedType::Wire { inner, .. } => &**inner,
            other => other,
        }
    }
}

pub fn resolve(descriptor: &TypeDescriptor, mode: Mode) -> Result<ResolvedType> {
    match mode {
        Mode::Native => Ok(native(descriptor)),
        Mode::Wire => wire(descriptor, false),
    }
}

/// Parses `signature` and resolves every complete type in it.
pub fn resolve_signature(signature: &str, mode: Mode) -> Result<Vec<ResolvedType>> {
    parse(signature)?.iter().map(|descriptor| resolve(descriptor, mode)).collect()
}

#[rustfmt::skip]
fn primitive(primitive: Primitive) -> ResolvedType {
    use Primitive::*;

    match primitive {
        Boolean => ResolvedType::Boolean,
        Byte | Int16 | UInt16 | Int32 | UInt32 | Int64 | UInt64 => ResolvedType::Integer(primitive),
        Double => ResolvedType::Double,
        String | ObjectPath | Signature | UnixFd => ResolvedType::Text(primitive),
        Variant => ResolvedType::Any,
    }
}

fn is_byte(descriptor: &TypeDescriptor) -> bool {
    *descriptor == TypeDescriptor::Primitive(Primitive::Byte)
}

fn native(descriptor: &TypeDescriptor) -> ResolvedType {
    match descriptor {
        TypeDescriptor::Primitive(p) => primitive(*p),
        TypeDescriptor::Array(element) if is_byte(element) => ResolvedType::Bytes,
        TypeDescriptor::Array(element) => ResolvedType::Sequence(Box::new(native(element))),
        TypeDescriptor::Dictionary(key, value) => {
            ResolvedType::Mapping(Box::new(native(key)), Box::new(native(value)))
        }
        TypeDescriptor::Struct(members) => {
            ResolvedType::Tuple(members.iter().map(native).collect())
        }
    }
}

// A lone byte has no wire representation with a default value. Inside an array or dictionary
// nothing is ever instantiated, so bytes are accepted there at any depth.
fn wire(descriptor: &TypeDescriptor, in_container: bool) -> Result<ResolvedType> {
    let inner = match descriptor {
        TypeDescriptor::Primitive(Primitive::Byte) if !in_container => {
            return Err(Error::NonInstantiableType { signature: descriptor.to_string() });
        }
        TypeDescriptor::Primitive(p) => primitive(*p),
        TypeDescriptor::Array(element) if is_byte(element) => ResolvedType::Bytes,
        TypeDescriptor::Array(element) => ResolvedType::Sequence(Box::new(wire(element, true)?)),
        TypeDescriptor::Dictionary(key, value) => {
            ResolvedType::Mapping(Box::new(wire(key, true)?), Box::new(wire(value, true)?))
        }
        TypeDescriptor::Struct(members) => ResolvedType::Tuple(
            members.iter().map(|member| wire(member, in_container)).collect::<Result<_>>()?,
        ),
    };

    Ok(ResolvedType::Wire { signature: descriptor.to_string(), inner: Box::new(inner) })
}
