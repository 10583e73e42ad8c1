//! Code for parsing introspection data from an XML file

use std::{fmt, io::Read};

use serde::de::{Deserialize, Deserializer, EnumAccess, IgnoredAny, VariantAccess, Visitor};

use crate::document::Element;

#[derive(Debug, serde::Deserialize)]
pub struct Tag {
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub type_: Option<String>,

    pub direction: Option<String>,
    pub access: Option<String>,
    pub value: Option<String>,

    #[serde(rename = "$value", default)]
    pub children: Vec<Child>,
}

/// Tags of the introspection format. Anything else, e.g. `<doc:doc>`, is skipped.
const TAGS: &[&str] = &["node", "interface", "method", "signal", "property", "arg", "annotation"];

#[derive(Debug)]
pub enum Child {
    Known(&'static str, Tag),
    Ignored,
}

impl<'de> Deserialize<'de> for Child {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_enum("Child", TAGS, ChildVisitor)
    }
}

struct ChildVisitor;

impl<'de> Visitor<'de> for ChildVisitor {
    type Value = Child;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an introspection element")
    }

    fn visit_enum<A: EnumAccess<'de>>(self, data: A) -> Result<Child, A::Error> {
        let (name, variant): (String, _) = data.variant()?;
        match TAGS.iter().find(|tag| **tag == name) {
            Some(tag) => variant.newtype_variant().map(|value| Child::Known(*tag, value)),
            None => {
                tracing::trace!(tag = %name, "skipping unknown element");
                variant.newtype_variant::<IgnoredAny>().map(|_| Child::Ignored)
            }
        }
    }
}

impl Child {
    fn into_element(self) -> Option<Element> {
        match self {
            Child::Known(name, tag) => Some(tag.into_element(name)),
            Child::Ignored => None,
        }
    }
}

impl Tag {
    pub fn into_element(self, tag: &str) -> Element {
        let mut element = Element::new(tag);

        let attributes = [
            ("name", self.name),
            ("type", self.type_),
            ("direction", self.direction),
            ("access", self.access),
            ("value", self.value),
        ];
        for (name, value) in attributes.iter() {
            if let Some(value) = value {
                element.attributes.insert((*name).to_owned(), value.clone());
            }
        }

        element.children = self.children.into_iter().filter_map(Child::into_element).collect();
        element
    }
}

/// Parses the root `<node>` of an introspection document.
pub fn parse<R: Read>(reader: R) -> Result<Element, serde_xml_rs::Error> {
    let root: Tag = serde_xml_rs::from_reader(reader)?;
    Ok(root.into_element("node"))
}
