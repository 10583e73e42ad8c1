use pretty_assertions::assert_eq;
use quote::quote;

use dbus_signature::Primitive;

use crate::{
    build, literal, load, member_ident, merge, parse_document, type_hint, type_ident, Annotated,
    Direction, Element, Error, Interface, Member, MergePolicy, Mode, Options, ResolvedType, Value,
    UNNAMED_NODE,
};

fn arg(name: &str, ty: &str, direction: &str) -> Element {
    Element::new("arg")
        .with_attribute("name", name)
        .with_attribute("type", ty)
        .with_attribute("direction", direction)
}

fn property(name: &str, ty: &str, access: &str) -> Element {
    Element::new("property")
        .with_attribute("name", name)
        .with_attribute("type", ty)
        .with_attribute("access", access)
}

fn interface(name: &str) -> Element {
    Element::new("interface").with_attribute("name", name)
}

fn document(interfaces: Vec<Element>) -> Element {
    interfaces.into_iter().fold(Element::new("node"), Element::with_child)
}

fn build_one(interface: Element) -> crate::Result<Interface> {
    build(&document(vec![interface]), &Options::default()).map(|mut x| x.remove(0))
}

fn echo_interface() -> Element {
    interface("org.example.Echo")
        .with_child(
            Element::new("method")
                .with_attribute("name", "Ping")
                .with_child(arg("msg", "s", "in"))
                .with_child(arg("count", "i", "out")),
        )
        .with_child(
            Element::new("method")
                .with_attribute("name", "Echo")
                .with_child(arg("text", "s", "in"))
                .with_child(arg("length", "i", "out")),
        )
}

#[test]
fn methods_keep_document_order() {
    let echo = build_one(echo_interface()).unwrap();

    let names: Vec<_> = echo.methods.iter().map(|x| x.name.as_str()).collect();
    assert_eq!(names, vec!["Ping", "Echo"]);

    for method in &echo.methods {
        assert_eq!(method.signature(Direction::In), "s");
        assert_eq!(method.signature(Direction::Out), "i");
        assert_eq!(method.defaults, vec![Value::Text(String::new())]);
        assert_eq!(
            method.type_hints(Direction::Out),
            vec![&ResolvedType::Integer(Primitive::Int32)]
        );
    }
}

#[test]
fn method_signature_concatenates_args() {
    let method = Element::new("method")
        .with_attribute("name", "Configure")
        .with_child(arg("options", "a{sv}", "in"))
        .with_child(arg("ok", "b", "out"))
        .with_child(arg("targets", "ao", "in"))
        .with_child(arg("timeout", "(tu)", "in"));
    let iface = build_one(interface("org.example.Config").with_child(method)).unwrap();

    let configure = &iface.methods[0];
    assert_eq!(configure.signature(Direction::In), "a{sv}ao(tu)");
    assert_eq!(configure.signature(Direction::Out), "b");
    assert_eq!(configure.arg_names(), vec!["options", "targets", "timeout"]);
    assert_eq!(configure.defaults.len(), 3);
    assert_eq!(
        configure.defaults[2],
        Value::Tuple(vec![Value::Integer(0), Value::Integer(0)])
    );
}

#[test]
fn arg_direction_defaults_to_in() {
    let method = Element::new("method")
        .with_attribute("name", "Notify")
        .with_child(Element::new("arg").with_attribute("name", "x").with_attribute("type", "u"));
    let iface = build_one(interface("org.example.Notify").with_child(method)).unwrap();

    assert_eq!(iface.methods[0].args[0].direction, Direction::In);
    assert_eq!(iface.methods[0].signature(Direction::In), "u");
}

#[test]
fn invalid_direction() {
    let method =
        Element::new("method").with_attribute("name", "M").with_child(arg("x", "u", "sideways"));
    let err = build_one(interface("org.example.Bad").with_child(method)).unwrap_err();

    match err {
        Error::InvalidDirection { arg, direction } => {
            assert_eq!(arg, "org.example.Bad.x");
            assert_eq!(direction, "sideways");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn unnamed_args_get_letters() {
    let method = Element::new("method")
        .with_attribute("name", "Add")
        .with_child(Element::new("arg").with_attribute("type", "i"))
        .with_child(arg("named", "i", "in"))
        .with_child(Element::new("arg").with_attribute("type", "i"))
        .with_child(
            Element::new("arg").with_attribute("type", "i").with_attribute("direction", "out"),
        );
    let iface = build_one(interface("org.example.Calc").with_child(method)).unwrap();

    let add = &iface.methods[0];
    assert_eq!(add.args[0].name, UNNAMED_NODE);
    assert_eq!(add.arg_names(), vec!["a", "named", "b"]);
}

#[test]
fn unnamed_args_skip_taken_names() {
    let method = Element::new("method")
        .with_attribute("name", "Add")
        .with_child(Element::new("arg").with_attribute("type", "i"))
        .with_child(arg("a", "i", "in"))
        .with_child(Element::new("arg").with_attribute("type", "i"));
    let iface = build_one(interface("org.example.Calc").with_child(method)).unwrap();

    assert_eq!(iface.methods[0].arg_names(), vec!["b", "a", "c"]);
}

#[test]
fn signal_includes_all_args() {
    let signal = Element::new("signal")
        .with_attribute("name", "Changed")
        .with_child(arg("key", "s", "in"))
        .with_child(arg("values", "a{sv}", "out"));
    let iface = build_one(interface("org.example.Watch").with_child(signal)).unwrap();

    let changed = &iface.signals[0];
    assert_eq!(changed.signature(Direction::In), "sa{sv}");
    assert_eq!(changed.signature(Direction::Out), "sa{sv}");
    assert_eq!(changed.defaults.len(), 2);
    assert_eq!(changed.args_in(Direction::Out).len(), 2);
}

#[test]
fn property_access() {
    let iface = build_one(
        interface("org.example.Props")
            .with_child(property("A", "s", "read"))
            .with_child(property("B", "s", "readwrite"))
            .with_child(property("C", "s", "write")),
    )
    .unwrap();

    let flags: Vec<_> = iface.properties.iter().map(|x| (x.read, x.write)).collect();
    assert_eq!(flags, vec![(true, false), (true, true), (false, true)]);
}

#[test]
fn property_invalid_access() {
    let err = build_one(interface("org.example.Props").with_child(property("A", "s", "bogus")))
        .unwrap_err();

    match err {
        Error::InvalidAccessSpecifier { property, access } => {
            assert_eq!(property, "org.example.Props.A");
            assert_eq!(access, "bogus");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn property_resolves_type_and_default() {
    let iface = build_one(
        interface("org.example.Props")
            .with_child(property("Metadata", "a{sv}", "read"))
            .with_child(property("Position", "(ii)", "read"))
            .with_child(property("Icon", "ay", "read")),
    )
    .unwrap();

    let metadata = &iface.properties[0];
    assert_eq!(
        metadata.resolved,
        ResolvedType::Mapping(
            Box::new(ResolvedType::Text(Primitive::String)),
            Box::new(ResolvedType::Any)
        )
    );
    assert_eq!(
        metadata.value,
        Value::Mapping {
            key: ResolvedType::Text(Primitive::String),
            value: ResolvedType::Any,
            entries: vec![],
        }
    );
    assert_eq!(iface.properties[1].value, Value::Tuple(vec![Value::Integer(0), Value::Integer(0)]));
    assert_eq!(iface.properties[2].value, Value::Bytes(vec![]));
}

#[test]
fn property_requires_single_type() {
    let err = build_one(interface("org.example.Props").with_child(property("A", "ss", "read")))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Signature { source: dbus_signature::Error::InvalidSignature { .. }, .. }
    ));
}

#[test]
fn missing_attributes() {
    let method = Element::new("method")
        .with_attribute("name", "M")
        .with_child(Element::new("arg").with_attribute("name", "x"));
    match build_one(interface("org.example.Bad").with_child(method)).unwrap_err() {
        Error::MissingAttribute { tag, node, attribute } => {
            assert_eq!((tag, node.as_str(), attribute), ("arg", "x", "type"));
        }
        other => panic!("unexpected error: {}", other),
    }

    let no_access =
        Element::new("property").with_attribute("name", "P").with_attribute("type", "s");
    assert!(matches!(
        build_one(interface("org.example.Bad").with_child(no_access)),
        Err(Error::MissingAttribute { attribute: "access", .. })
    ));

    let no_value = Element::new("annotation").with_attribute("name", "org.example.Hint");
    assert!(matches!(
        build_one(interface("org.example.Bad").with_child(no_value)),
        Err(Error::MissingAttribute { attribute: "value", .. })
    ));
}

#[test]
fn malformed_signature_aborts_build() {
    let good = echo_interface();
    let bad = interface("org.example.Broken").with_child(
        Element::new("method").with_attribute("name", "M").with_child(arg("x", "(ii", "in")),
    );
    let err = build(&document(vec![good, bad]), &Options::default()).unwrap_err();

    match err {
        Error::Signature { node, source } => {
            assert_eq!(node, "org.example.Broken.x");
            assert!(matches!(source, dbus_signature::Error::InvalidSignature { position: 3, .. }));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn unnamed_interface() {
    let iface = build_one(Element::new("interface")).unwrap();
    assert_eq!(iface.name, UNNAMED_NODE);
    assert_eq!(iface.interface_name, UNNAMED_NODE);
}

#[test]
fn interface_name_propagates() {
    let nested = interface("org.example.Inner").with_child(property("Depth", "u", "read"));
    let outer = echo_interface()
        .with_child(nested)
        .with_child(
            Element::new("annotation").with_attribute("name", "x").with_attribute("value", "y"),
        );
    let iface = build_one(outer).unwrap();

    assert_eq!(iface.interface_name, "org.example.Echo");
    assert_eq!(iface.annotations[0].interface_name, "org.example.Echo");
    for method in &iface.methods {
        assert_eq!(method.interface_name, "org.example.Echo");
        assert!(method.args.iter().all(|x| x.interface_name == "org.example.Echo"));
    }

    let inner = &iface.interfaces[0];
    assert_eq!(inner.interface_name, "org.example.Inner");
    assert_eq!(inner.properties[0].interface_name, "org.example.Inner");
}

#[test]
fn annotations() {
    let deprecated = Element::new("annotation")
        .with_attribute("name", "org.freedesktop.DBus.Deprecated")
        .with_attribute("value", "true");
    let method = Element::new("method").with_attribute("name", "Old").with_child(deprecated);
    let iface = build_one(interface("org.example.Legacy").with_child(method)).unwrap();

    let old = &iface.methods[0];
    assert!(old.deprecated());
    assert_eq!(old.annotation("org.freedesktop.DBus.Deprecated").unwrap().value, "true");
    assert!(old.annotation("org.example.Missing").is_none());
    assert!(!iface.deprecated());
}

#[test]
fn wire_mode_members() {
    let options = Options { mode: Mode::Wire, ..Options::default() };

    let bytes = interface("org.example.Blob").with_child(
        Element::new("method").with_attribute("name", "Put").with_child(arg("data", "ay", "in")),
    );
    let iface = build(&document(vec![bytes]), &options).unwrap().remove(0);
    assert_eq!(iface.methods[0].defaults[0].signature(), Some("ay"));

    let byte = interface("org.example.Blob").with_child(
        Element::new("method").with_attribute("name", "Put").with_child(arg("data", "y", "in")),
    );
    let err = build(&document(vec![byte]), &options).unwrap_err();
    assert!(matches!(
        err,
        Error::Signature { source: dbus_signature::Error::NonInstantiableType { .. }, .. }
    ));
}

#[test]
fn wire_mode_properties_stay_native() {
    let options = Options { mode: Mode::Wire, ..Options::default() };
    let iface = interface("org.example.Device")
        .with_child(property("Level", "y", "read"))
        .with_child(property("Label", "s", "readwrite"))
        .with_child(Element::new("method").with_attribute("name", "Rename").with_child(arg(
            "to", "s", "in",
        )));
    let iface = build(&document(vec![iface]), &options).unwrap().remove(0);

    assert_eq!(iface.properties[0].resolved, ResolvedType::Integer(Primitive::Byte));
    assert_eq!(iface.properties[0].value, Value::Integer(0));
    assert_eq!(iface.properties[1].resolved, ResolvedType::Text(Primitive::String));
    assert_eq!(iface.properties[1].value, Value::Text(String::new()));
    assert_eq!(iface.methods[0].defaults[0].signature(), Some("s"));
}

fn merged(documents: Vec<Vec<Interface>>, merge: MergePolicy) -> crate::Result<Vec<Interface>> {
    crate::merge(documents, &Options { merge, ..Options::default() })
}

#[test]
fn merge_policies() {
    let first =
        build(&document(vec![echo_interface(), interface("org.example.A")]), &Options::default())
            .unwrap();
    let second = build(
        &document(vec![interface("org.example.Echo"), interface("org.example.B")]),
        &Options::default(),
    )
    .unwrap();

    let err = merged(vec![first.clone(), second.clone()], MergePolicy::Reject).unwrap_err();
    assert!(matches!(err, Error::DuplicateInterface(ref name) if name == "org.example.Echo"));

    let kept = merged(vec![first.clone(), second.clone()], MergePolicy::KeepFirst).unwrap();
    let names: Vec<_> = kept.iter().map(|x| x.name.as_str()).collect();
    assert_eq!(names, vec!["org.example.Echo", "org.example.A", "org.example.B"]);
    assert_eq!(kept[0].methods.len(), 2);

    let replaced = merged(vec![first, second], MergePolicy::KeepLast).unwrap();
    let names: Vec<_> = replaced.iter().map(|x| x.name.as_str()).collect();
    assert_eq!(names, vec!["org.example.Echo", "org.example.A", "org.example.B"]);
    assert!(replaced[0].methods.is_empty());
}

#[test]
fn merge_follows_options_from_toml() {
    let documents = vec![
        build(&document(vec![echo_interface()]), &Options::default()).unwrap(),
        build(&document(vec![interface("org.example.Echo")]), &Options::default()).unwrap(),
    ];

    let err = merge(documents.clone(), &Options::default()).unwrap_err();
    assert!(matches!(err, Error::DuplicateInterface(_)));

    let options = Options::from_toml("merge = \"keep-last\"\n").unwrap();
    let replaced = merge(documents, &options).unwrap();
    assert_eq!(replaced.len(), 1);
    assert!(replaced[0].methods.is_empty());
}

#[test]
fn options_from_toml() {
    assert_eq!(Options::from_toml("").unwrap(), Options::default());
    assert_eq!(Options::default().mode, Mode::Native);
    assert_eq!(Options::default().merge, MergePolicy::Reject);

    let options = Options::from_toml("mode = \"wire\"\nmerge = \"keep-last\"\n").unwrap();
    assert_eq!(options, Options { mode: Mode::Wire, merge: MergePolicy::KeepLast });

    assert!(matches!(Options::from_toml("mode = \"python\""), Err(Error::Options(_))));
    assert!(matches!(Options::from_toml("template = \"x\""), Err(Error::Options(_))));
}

const ECHO_XML: &str = r#"<node>
  <interface name="org.example.Echo">
    <method name="Ping">
      <arg name="msg" type="s" direction="in"/>
      <arg name="count" type="i" direction="out"/>
    </method>
    <signal name="Pinged">
      <arg name="count" type="u"/>
    </signal>
    <property name="Volume" type="d" access="readwrite">
      <annotation name="org.freedesktop.DBus.Property.EmitsChangedSignal" value="true"/>
    </property>
  </interface>
  <interface name="org.example.Empty"/>
</node>"#;

#[test_log::test]
fn load_xml_document() {
    let root = load(ECHO_XML).unwrap();
    assert_eq!(root.tag, "node");
    assert_eq!(root.children_named("interface").count(), 2);

    let interfaces = parse_document(ECHO_XML, &Options::default()).unwrap();
    assert_eq!(interfaces.len(), 2);

    let echo = &interfaces[0];
    assert_eq!(echo.methods[0].name, "Ping");
    assert_eq!(echo.methods[0].signature(Direction::In), "s");
    assert_eq!(echo.methods[0].signature(Direction::Out), "i");
    assert_eq!(echo.signals[0].signature(Direction::In), "u");
    assert_eq!(echo.properties[0].value, Value::Double(0.0));
    assert!(echo.properties[0].read && echo.properties[0].write);
    assert_eq!(echo.properties[0].annotations[0].value, "true");
    assert_eq!(interfaces[1].name, "org.example.Empty");
}

#[test_log::test]
fn load_skips_documentation_elements() {
    let xml = r#"
        <node xmlns:doc="http://www.freedesktop.org/dbus/1.0/doc.dtd">
          <interface name="org.example.Doc">
            <doc:doc><doc:summary>An interface</doc:summary></doc:doc>
            <method name="Lookup">
              <doc:doc>
                <doc:description><doc:para>Finds a name</doc:para></doc:description>
              </doc:doc>
              <arg name="key" type="s" direction="in"/>
              <arg name="found" type="b" direction="out"/>
            </method>
          </interface>
        </node>
    "#;

    let root = load(xml).unwrap();
    let iface = root.children_named("interface").next().unwrap();
    assert_eq!(iface.children.len(), 1);

    let interfaces = parse_document(xml, &Options::default()).unwrap();
    let lookup = &interfaces[0].methods[0];
    assert_eq!(lookup.args.len(), 2);
    assert_eq!(lookup.signature(Direction::In), "s");
    assert_eq!(lookup.signature(Direction::Out), "b");
}

#[test]
fn load_malformed_xml() {
    assert!(matches!(load("<node><interface></node>"), Err(Error::Xml(_))));
}

#[test]
fn native_type_hints() {
    let iface = build_one(
        interface("org.example.Props")
            .with_child(property("Metadata", "a{sv}", "read"))
            .with_child(property("Points", "a(dd)", "read"))
            .with_child(property("Path", "o", "read")),
    )
    .unwrap();

    let hints: Vec<_> =
        iface.properties.iter().map(|x| type_hint(&x.resolved).to_string()).collect();
    assert_eq!(
        hints,
        vec![
            quote!(std::collections::HashMap<String, zvariant::OwnedValue>).to_string(),
            quote!(Vec<(f64, f64,)>).to_string(),
            quote!(String).to_string(),
        ]
    );

    let values: Vec<_> = iface.properties.iter().map(|x| literal(&x.value).to_string()).collect();
    assert_eq!(
        values,
        vec![
            quote!(std::collections::HashMap::<String, zvariant::OwnedValue>::new()).to_string(),
            quote!(Vec::<(f64, f64,)>::new()).to_string(),
            quote!(String::new()).to_string(),
        ]
    );
}

#[test]
fn wire_type_hints() {
    let options = Options { mode: Mode::Wire, ..Options::default() };
    let method = Element::new("method")
        .with_attribute("name", "Call")
        .with_child(arg("id", "q", "in"))
        .with_child(arg("items", "as", "in"))
        .with_child(arg("pair", "(ob)", "in"));
    let iface = build(&document(vec![interface("org.example.W").with_child(method)]), &options)
        .unwrap()
        .remove(0);

    let call = &iface.methods[0];
    let hints: Vec<_> =
        call.type_hints(Direction::In).into_iter().map(|x| type_hint(x).to_string()).collect();
    assert_eq!(
        hints,
        vec![
            quote!(u16).to_string(),
            quote!(zvariant::Array<'static>).to_string(),
            quote!(zvariant::Structure<'static>).to_string(),
        ]
    );

    let values: Vec<_> = call.defaults.iter().map(|x| literal(x).to_string()).collect();
    assert_eq!(values[0], quote!(0u16).to_string());
    assert_eq!(
        values[1],
        quote!(zvariant::Array::new(zvariant::Signature::from_static_str_unchecked("s")))
            .to_string()
    );
    assert_eq!(
        values[2],
        quote!(zvariant::StructureBuilder::new()
            .add_field(<zvariant::OwnedObjectPath>::default())
            .add_field(false)
            .build())
        .to_string()
    );
}

#[test]
fn identifiers() {
    assert_eq!(member_ident("GetAll").to_string(), "get_all");
    assert_eq!(member_ident("Type").to_string(), "type_");
    assert_eq!(member_ident(UNNAMED_NODE).to_string(), "unnamed");
    assert_eq!(type_ident("org.example.Echo").to_string(), "Echo");
    assert_eq!(type_ident("org.example.media_player").to_string(), "MediaPlayer");
}

#[test]
fn debug_dump() {
    let iface = build_one(echo_interface().with_child(property("Volume", "d", "read"))).unwrap();
    let dump = iface.to_string();

    assert!(dump.starts_with("interface org.example.Echo\n  interface_name: org.example.Echo\n"));
    assert!(dump.contains(concat!(
        "\n  method Ping\n",
        "    interface_name: org.example.Echo\n",
        "    signature in: s\n",
        "    signature out: i\n",
        "    defaults: [Text(\"\")]\n",
    )));
    assert!(dump.contains(concat!(
        "\n    arg msg\n",
        "      interface_name: org.example.Echo\n",
        "      type: s\n",
        "      direction: in\n",
        "      resolved: Text(String)\n",
    )));
    assert!(dump.contains(concat!(
        "\n  property Volume\n",
        "    interface_name: org.example.Echo\n",
        "    type: d\n",
        "    access: read\n",
        "    read: true\n",
        "    resolved: Double\n",
        "    value: Double(0.0)\n",
    )));
    assert!(!dump.contains("write: true"));
}
