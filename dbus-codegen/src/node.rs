//! The introspection node hierarchy: interfaces and their methods, signals, properties, args and
//! annotations.
//!
//! The tree is built once from a document tree and never changes afterwards. Type hints and
//! default values are resolved while building, so a malformed signature anywhere in a document
//! fails the whole build.

use std::{collections::HashSet, fmt};

use dbus_signature::{
    instantiate, instantiate_signature, parse_single, resolve, Mode, ResolvedType, Value,
};

use crate::{document::Element, Error, Options, Result};

/// Name given to nodes without a `name` attribute
pub const UNNAMED_NODE: &str = "<unnamed>";

const DEPRECATED: &str = "org.freedesktop.DBus.Deprecated";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    fn parse(value: &str) -> Option<Direction> {
        match value {
            "in" => Some(Direction::In),
            "out" => Some(Direction::Out),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nodes that can carry annotations
pub trait Annotated {
    fn annotations(&self) -> &[Annotation];

    fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations().iter().find(|annotation| annotation.name == name)
    }

    fn deprecated(&self) -> bool {
        self.annotation(DEPRECATED).map_or(false, |annotation| annotation.value == "true")
    }
}

/// Methods and signals: named members with an ordered list of args
pub trait Member {
    fn name(&self) -> &str;

    fn args(&self) -> &[Arg];

    /// Whether `arg` is part of the signature in `direction`
    fn includes(&self, arg: &Arg, direction: Direction) -> bool {
        arg.direction == direction
    }

    /// The concatenated types of all args in `direction`, in document order
    fn signature(&self, direction: Direction) -> String {
        self.args()
            .iter()
            .filter(|arg| self.includes(arg, direction))
            .map(|arg| arg.ty.as_str())
            .collect()
    }

    fn args_in(&self, direction: Direction) -> Vec<&Arg> {
        self.args().iter().filter(|arg| self.includes(arg, direction)).collect()
    }

    fn type_hints(&self, direction: Direction) -> Vec<&ResolvedType> {
        self.args_in(direction).into_iter().map(|arg| &arg.resolved).collect()
    }

    /// Names of the in args. Unnamed args are named `a`, `b`, ... in order, skipping names
    /// already taken by another in arg.
    fn arg_names(&self) -> Vec<String> {
        let args = self.args_in(Direction::In);
        let taken: HashSet<&str> = args
            .iter()
            .map(|arg| arg.name.as_str())
            .filter(|name| *name != UNNAMED_NODE)
            .collect();

        let mut generated = (0..)
            .map(|n| match n {
                n if n < 26 => ((b'a' + n as u8) as char).to_string(),
                n => format!("arg{}", n),
            })
            .filter(|name| !taken.contains(name.as_str()));

        args.iter()
            .map(|arg| match arg.name.as_str() {
                UNNAMED_NODE => generated.next().unwrap_or_default(),
                name => name.to_owned(),
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Interface {
    pub name: String,
    pub interface_name: String,
    pub annotations: Vec<Annotation>,
    pub interfaces: Vec<Interface>,
    pub methods: Vec<Method>,
    pub properties: Vec<Property>,
    pub signals: Vec<Signal>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Method {
    pub name: String,
    pub interface_name: String,
    pub annotations: Vec<Annotation>,
    pub args: Vec<Arg>,

    /// Default values of the in args, for stub bodies
    pub defaults: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Signal {
    pub name: String,
    pub interface_name: String,
    pub annotations: Vec<Annotation>,
    pub args: Vec<Arg>,

    /// Default values of all args
    pub defaults: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Arg {
    pub name: String,
    pub interface_name: String,
    pub annotations: Vec<Annotation>,

    /// A single complete type
    pub ty: String,

    pub direction: Direction,
    pub resolved: ResolvedType,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    pub name: String,
    pub interface_name: String,
    pub annotations: Vec<Annotation>,
    pub ty: String,
    pub resolved: ResolvedType,
    pub value: Value,
    pub access: String,
    pub read: bool,
    pub write: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Annotation {
    pub name: String,
    pub interface_name: String,
    pub value: String,
}

/// Builds every `<interface>` directly under `root`.
pub fn build(root: &Element, options: &Options) -> Result<Vec<Interface>> {
    children(root, "interface", |element| Interface::build(element, options))
}

struct Context<'a> {
    interface_name: &'a str,
    options: &'a Options,
}

impl Context<'_> {
    fn path(&self, name: &str) -> String {
        format!("{}.{}", self.interface_name, name)
    }
}

fn node_name(element: &Element) -> String {
    element.attribute("name").unwrap_or(UNNAMED_NODE).to_owned()
}

fn required(element: &Element, tag: &'static str, attribute: &'static str) -> Result<String> {
    match element.attribute(attribute) {
        Some(value) => Ok(value.to_owned()),
        None => Err(Error::MissingAttribute { tag, node: node_name(element), attribute }),
    }
}

fn children<T, F>(element: &Element, tag: &str, build: F) -> Result<Vec<T>>
where
    F: FnMut(&Element) -> Result<T>,
{
    element.children_named(tag).map(build).collect()
}

fn signature_error(node: String) -> impl FnOnce(dbus_signature::Error) -> Error {
    move |source| Error::Signature { node, source }
}

impl Interface {
    fn build(element: &Element, options: &Options) -> Result<Self> {
        let name = node_name(element);
        let cx = Context { interface_name: &name, options };

        let annotations = children(element, "annotation", |e| Annotation::build(e, &cx))?;
        let interfaces = children(element, "interface", |e| Interface::build(e, options))?;
        let methods = children(element, "method", |e| Method::build(e, &cx))?;
        let properties = children(element, "property", |e| Property::build(e, &cx))?;
        let signals = children(element, "signal", |e| Signal::build(e, &cx))?;

        tracing::debug!(
            interface = %name,
            methods = methods.len(),
            properties = properties.len(),
            signals = signals.len(),
            "built interface"
        );

        Ok(Interface {
            interface_name: name.clone(),
            name,
            annotations,
            interfaces,
            methods,
            properties,
            signals,
        })
    }
}

/// Builds the parts shared by methods and signals, with the default values of the included args.
fn build_member(
    element: &Element,
    cx: &Context,
    includes: impl Fn(&Arg) -> bool,
) -> Result<(String, Vec<Annotation>, Vec<Arg>, Vec<Value>)> {
    let name = node_name(element);
    let annotations = children(element, "annotation", |e| Annotation::build(e, cx))?;
    let args = children(element, "arg", |e| Arg::build(e, cx))?;

    let signature: String =
        args.iter().filter(|&arg| includes(arg)).map(|arg| arg.ty.as_str()).collect();
    let defaults = instantiate_signature(&signature, cx.options.mode)
        .map_err(signature_error(cx.path(&name)))?;

    Ok((name, annotations, args, defaults))
}

impl Method {
    fn build(element: &Element, cx: &Context) -> Result<Self> {
        let (name, annotations, args, defaults) =
            build_member(element, cx, |arg| arg.direction == Direction::In)?;
        let interface_name = cx.interface_name.to_owned();
        Ok(Method { name, interface_name, annotations, args, defaults })
    }
}

impl Signal {
    fn build(element: &Element, cx: &Context) -> Result<Self> {
        let (name, annotations, args, defaults) = build_member(element, cx, |_| true)?;
        let interface_name = cx.interface_name.to_owned();
        Ok(Signal { name, interface_name, annotations, args, defaults })
    }
}

impl Arg {
    fn build(element: &Element, cx: &Context) -> Result<Self> {
        let name = node_name(element);
        let ty = required(element, "arg", "type")?;

        let direction = match element.attribute("direction") {
            None => Direction::In,
            Some(value) => Direction::parse(value).ok_or_else(|| Error::InvalidDirection {
                arg: cx.path(&name),
                direction: value.to_owned(),
            })?,
        };

        let resolved = parse_single(&ty)
            .and_then(|descriptor| resolve(&descriptor, cx.options.mode))
            .map_err(signature_error(cx.path(&name)))?;

        Ok(Arg {
            annotations: children(element, "annotation", |e| Annotation::build(e, cx))?,
            name,
            interface_name: cx.interface_name.to_owned(),
            ty,
            direction,
            resolved,
        })
    }
}

impl Property {
    fn build(element: &Element, cx: &Context) -> Result<Self> {
        let name = node_name(element);
        let ty = required(element, "property", "type")?;
        let access = required(element, "property", "access")?;

        let read = access.contains("read");
        let write = access.contains("write");
        if !read && !write {
            return Err(Error::InvalidAccessSpecifier { property: cx.path(&name), access });
        }

        // Properties are always native, whatever mode the members use
        let resolved = parse_single(&ty)
            .and_then(|descriptor| resolve(&descriptor, Mode::Native))
            .map_err(signature_error(cx.path(&name)))?;
        let value = instantiate(&resolved).map_err(signature_error(cx.path(&name)))?;

        Ok(Property {
            annotations: children(element, "annotation", |e| Annotation::build(e, cx))?,
            name,
            interface_name: cx.interface_name.to_owned(),
            ty,
            resolved,
            value,
            access,
            read,
            write,
        })
    }
}

impl Annotation {
    fn build(element: &Element, cx: &Context) -> Result<Self> {
        Ok(Annotation {
            name: node_name(element),
            interface_name: cx.interface_name.to_owned(),
            value: required(element, "annotation", "value")?,
        })
    }
}

impl Member for Method {
    fn name(&self) -> &str {
        &self.name
    }

    fn args(&self) -> &[Arg] {
        &self.args
    }
}

impl Member for Signal {
    fn name(&self) -> &str {
        &self.name
    }

    fn args(&self) -> &[Arg] {
        &self.args
    }

    // Signals have no direction split, all args are emitted
    fn includes(&self, _: &Arg, _: Direction) -> bool {
        true
    }
}

macro_rules! impl_annotated {
    ($($node:ty),*) => {
        $(
            impl Annotated for $node {
                fn annotations(&self) -> &[Annotation] {
                    &self.annotations
                }
            }
        )*
    };
}

impl_annotated!(Interface, Method, Signal, Arg, Property);

fn write_indented(f: &mut fmt::Formatter, child: &dyn fmt::Display) -> fmt::Result {
    for line in child.to_string().lines() {
        writeln!(f, "  {}", line)?;
    }
    Ok(())
}

fn write_all<T: fmt::Display>(f: &mut fmt::Formatter, children: &[T]) -> fmt::Result {
    children.iter().try_for_each(|child| write_indented(f, child))
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "interface {}", self.name)?;
        writeln!(f, "  interface_name: {}", self.interface_name)?;
        write_all(f, &self.annotations)?;
        write_all(f, &self.interfaces)?;
        write_all(f, &self.methods)?;
        write_all(f, &self.properties)?;
        write_all(f, &self.signals)
    }
}

fn write_member(
    f: &mut fmt::Formatter,
    kind: &str,
    member: &dyn Member,
    interface_name: &str,
    defaults: &[Value],
) -> fmt::Result {
    writeln!(f, "{} {}", kind, member.name())?;
    writeln!(f, "  interface_name: {}", interface_name)?;
    for direction in [Direction::In, Direction::Out].iter() {
        let signature = member.signature(*direction);
        if !signature.is_empty() {
            writeln!(f, "  signature {}: {}", direction, signature)?;
        }
    }
    if !defaults.is_empty() {
        writeln!(f, "  defaults: {:?}", defaults)?;
    }
    write_all(f, member.args())
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_member(f, "method", self, &self.interface_name, &self.defaults)?;
        write_all(f, &self.annotations)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_member(f, "signal", self, &self.interface_name, &self.defaults)?;
        write_all(f, &self.annotations)
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "arg {}", self.name)?;
        writeln!(f, "  interface_name: {}", self.interface_name)?;
        writeln!(f, "  type: {}", self.ty)?;
        writeln!(f, "  direction: {}", self.direction)?;
        writeln!(f, "  resolved: {:?}", self.resolved)?;
        write_all(f, &self.annotations)
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "property {}", self.name)?;
        writeln!(f, "  interface_name: {}", self.interface_name)?;
        writeln!(f, "  type: {}", self.ty)?;
        writeln!(f, "  access: {}", self.access)?;
        if self.read {
            writeln!(f, "  read: true")?;
        }
        if self.write {
            writeln!(f, "  write: true")?;
        }
        writeln!(f, "  resolved: {:?}", self.resolved)?;
        writeln!(f, "  value: {:?}", self.value)?;
        write_all(f, &self.annotations)
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "annotation {}", self.name)?;
        writeln!(f, "  interface_name: {}", self.interface_name)?;
        if !self.value.is_empty() {
            writeln!(f, "  value: {}", self.value)?;
        }
        Ok(())
    }
}
