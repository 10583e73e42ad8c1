//! Builds a typed model of D-Bus introspection documents for binding generators.
//!
//! Every method, signal and property carries its type hints and default values, resolved from the
//! wire signatures of its arguments, ready to be rendered into code.

mod document;
mod introspect_def;
mod merge;
mod node;
mod options;
mod tokens;

#[cfg(test)]
mod tests;

use std::io::Read;

pub use dbus_signature::{Mode, ResolvedType, Value};

pub use crate::{
    document::Element,
    merge::merge,
    node::{
        build, Annotated, Annotation, Arg, Direction, Interface, Member, Method, Property, Signal,
        UNNAMED_NODE,
    },
    options::{MergePolicy, Options},
    tokens::{literal, member_ident, type_hint, type_ident, Literal, TypeHint},
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("<{tag} name={node:?}> is missing the required attribute {attribute:?}")]
    MissingAttribute { tag: &'static str, node: String, attribute: &'static str },

    #[error("property {property:?} has an invalid access specifier {access:?}")]
    InvalidAccessSpecifier { property: String, access: String },

    #[error("arg {arg:?} has an invalid direction {direction:?}")]
    InvalidDirection { arg: String, direction: String },

    #[error("{node}: {source}")]
    Signature {
        node: String,
        #[source]
        source: dbus_signature::Error,
    },

    #[error("interface {0:?} is defined more than once")]
    DuplicateInterface(String),

    #[error("failed to parse introspection XML: {0}")]
    Xml(#[from] serde_xml_rs::Error),

    #[error("failed to parse options: {0}")]
    Options(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Loads the document tree of an introspection XML string.
pub fn load(xml: &str) -> Result<Element> {
    load_reader(xml.as_bytes())
}

pub fn load_reader<R: Read>(reader: R) -> Result<Element> {
    let root = introspect_def::parse(reader)?;
    tracing::debug!(children = root.children.len(), "loaded introspection document");
    Ok(root)
}

/// Loads an introspection XML string and builds all interfaces declared in it.
pub fn parse_document(xml: &str, options: &Options) -> Result<Vec<Interface>> {
    build(&load(xml)?, options)
}
