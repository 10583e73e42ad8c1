//! Default values for resolved types

use crate::{
    resolve::{resolve_signature, Mode, ResolvedType},
    signature::Primitive,
    Error, Result,
};

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Variant(Box<Value>),

    /// A sequence, `element` is kept so that an empty sequence is still typed
    Sequence { element: ResolvedType, items: Vec<Value> },

    Mapping { key: ResolvedType, value: ResolvedType, entries: Vec<(Value, Value)> },
    Tuple(Vec<Value>),

    /// A wire mode value along with the signature needed to encode it again
    Wire { signature: String, value: Box<Value> },
}

impl Value {
    pub fn signature(&self) -> Option<&str> {
        match self {
            Value::Wire { signature, .. } => Some(signature.as_str()),
            _ => None,
        }
    }
}

/// Returns the canonical default value of `resolved`.
pub fn instantiate(resolved: &ResolvedType) -> Result<Value> {
    let value = match resolved {
        ResolvedType::Boolean => Value::Boolean(false),
        ResolvedType::Integer(_) => Value::Integer(0),
        ResolvedType::Double => Value::Double(0.0),
        ResolvedType::Text(_) => Value::Text(String::new()),
        ResolvedType::Bytes => Value::Bytes(vec![]),
        ResolvedType::Any => Value::Variant(Box::new(Value::Text(String::new()))),
        ResolvedType::Sequence(element) => {
            Value::Sequence { element: (**element).clone(), items: vec![] }
        }
        ResolvedType::Mapping(key, value) => Value::Mapping {
            key: (**key).clone(),
            value: (**value).clone(),
            entries: vec![],
        },
        ResolvedType::Tuple(members) => {
            Value::Tuple(members.iter().map(instantiate).collect::<Result<_>>()?)
        }
        ResolvedType::Wire { signature, inner } => {
            if let ResolvedType::Integer(Primitive::Byte) = **inner {
                return Err(Error::NonInstantiableType { signature: signature.clone() });
            }
            Value::Wire { signature: signature.clone(), value: Box::new(instantiate(inner)?) }
        }
    };

    Ok(value)
}

/// Returns the default value of every complete type in `signature`.
pub fn instantiate_signature(signature: &str, mode: Mode) -> Result<Vec<Value>> {
    resolve_signature(signature, mode)?.iter().map(instantiate).collect()
}
