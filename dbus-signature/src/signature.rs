//! Recursive descent parser for wire type signatures.
//!
//! A signature is a concatenation of zero or more complete types. Each complete type is either
//! a single primitive code, an array (`a` followed by one complete type), a dictionary
//! (`a{` key value `}`) or a struct (`(` one or more complete types `)`).

use std::fmt;

use crate::{Error, Result};

/// Longest signature accepted by the wire protocol
pub const MAX_SIGNATURE_LEN: usize = 255;

/// Maximum nesting of arrays, and separately of structs and dictionary entries
pub const MAX_DEPTH: usize = 32;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Primitive {
    Boolean,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Double,
    String,
    ObjectPath,
    Signature,
    UnixFd,
    Variant,
}

impl Primitive {
    #[rustfmt::skip]
    pub fn from_code(code: char) -> Option<Primitive> {
        use Primitive::*;

        let primitive = match code {
            'b' => Boolean,
            'y' => Byte,
            'n' => Int16,
            'q' => UInt16,
            'i' => Int32,
            'u' => UInt32,
            'x' => Int64,
            't' => UInt64,
            'd' => Double,
            's' => String,
            'o' => ObjectPath,
            'g' => Signature,
            'h' => UnixFd,
            'v' => Variant,
            _   => return None,
        };

        Some(primitive)
    }

    #[rustfmt::skip]
    pub fn code(self) -> char {
        use Primitive::*;

        match self {
            Boolean    => 'b',
            Byte       => 'y',
            Int16      => 'n',
            UInt16     => 'q',
            Int32      => 'i',
            UInt32     => 'u',
            Int64      => 'x',
            UInt64     => 't',
            Double     => 'd',
            String     => 's',
            ObjectPath => 'o',
            Signature  => 'g',
            UnixFd     => 'h',
            Variant    => 'v',
        }
    }

    /// Basic types are the ones allowed as dictionary keys
    pub fn is_basic(self) -> bool {
        self != Primitive::Variant
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum TypeDescriptor {
    Primitive(Primitive),
    Array(Box<TypeDescriptor>),

    /// A dictionary, the key is always a basic primitive
    Dictionary(Box<TypeDescriptor>, Box<TypeDescriptor>),

    /// A struct with at least one member
    Struct(Vec<TypeDescriptor>),
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypeDescriptor::Primitive(primitive) => write!(f, "{}", primitive.code()),
            TypeDescriptor::Array(element) => write!(f, "a{}", element),
            TypeDescriptor::Dictionary(key, value) => write!(f, "a{{{}{}}}", key, value),
            TypeDescriptor::Struct(members) => {
                f.write_str("(")?;
                for member in members {
                    write!(f, "{}", member)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Parses `signature` into one descriptor per complete type, in order.
pub fn parse(signature: &str) -> Result<Vec<TypeDescriptor>> {
    let mut parser = Parser::new(signature);
    if signature.len() > MAX_SIGNATURE_LEN {
        parser.pos = MAX_SIGNATURE_LEN;
        return Err(parser.invalid("signature exceeds 255 bytes"));
    }

    let mut types = vec![];
    while parser.peek().is_some() {
        types.push(parser.complete_type()?);
    }

    tracing::trace!(signature, count = types.len(), "parsed signature");
    Ok(types)
}

/// Parses a signature that must hold exactly one complete type.
pub fn parse_single(signature: &str) -> Result<TypeDescriptor> {
    let mut types = parse(signature)?;
    if types.len() != 1 {
        return Err(Error::InvalidSignature {
            signature: signature.to_owned(),
            position: 0,
            reason: "expected exactly one complete type",
        });
    }
    Ok(types.remove(0))
}

struct Parser<'a> {
    signature: &'a str,
    pos: usize,
    arrays: usize,
    structs: usize,
}

impl<'a> Parser<'a> {
    fn new(signature: &'a str) -> Self {
        Self { signature, pos: 0, arrays: 0, structs: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.signature.as_bytes().get(self.pos).copied()
    }

    fn invalid(&self, reason: &'static str) -> Error {
        Error::InvalidSignature {
            signature: self.signature.to_owned(),
            position: self.pos,
            reason,
        }
    }

    fn complete_type(&mut self) -> Result<TypeDescriptor> {
        let code = match self.peek() {
            Some(code) => code,
            None => return Err(self.invalid("expected a complete type, found end of signature")),
        };

        match code {
            b'a' => self.array(),
            b'(' => self.structure(),
            b')' => Err(self.invalid("unbalanced ')'")),
            b'}' => Err(self.invalid("unbalanced '}'")),
            b'{' => Err(self.invalid("dictionary entry outside of an array")),
            _ => self.primitive(),
        }
    }

    fn primitive(&mut self) -> Result<TypeDescriptor> {
        // Index by char so that non-ascii input is reported as a whole character
        let code = self.signature[self.pos..].chars().next().unwrap_or_default();
        match Primitive::from_code(code) {
            Some(primitive) => {
                self.pos += 1;
                Ok(TypeDescriptor::Primitive(primitive))
            }
            None => Err(Error::UnknownTypeCode {
                signature: self.signature.to_owned(),
                position: self.pos,
                code,
            }),
        }
    }

    fn array(&mut self) -> Result<TypeDescriptor> {
        self.arrays += 1;
        if self.arrays > MAX_DEPTH {
            return Err(self.invalid("arrays nested too deeply"));
        }
        self.pos += 1;

        let result = match self.peek() {
            Some(b'{') => self.dict_entry(),
            _ => Ok(TypeDescriptor::Array(Box::new(self.complete_type()?))),
        };

        self.arrays -= 1;
        result
    }

    fn dict_entry(&mut self) -> Result<TypeDescriptor> {
        self.structs += 1;
        if self.structs > MAX_DEPTH {
            return Err(self.invalid("structs nested too deeply"));
        }
        self.pos += 1;

        if self.peek() == Some(b'}') {
            return Err(self.invalid("empty dictionary entry"));
        }
        let key_pos = self.pos;
        let key = self.complete_type()?;
        match key {
            TypeDescriptor::Primitive(primitive) if primitive.is_basic() => {}
            _ => {
                self.pos = key_pos;
                return Err(self.invalid("dictionary key must be a basic type"));
            }
        }

        if self.peek() == Some(b'}') {
            return Err(self.invalid("dictionary entry is missing a value type"));
        }
        let value = self.complete_type()?;

        match self.peek() {
            Some(b'}') => self.pos += 1,
            Some(_) => return Err(self.invalid("dictionary entry must hold exactly two types")),
            None => return Err(self.invalid("unbalanced '{': missing '}'")),
        }

        self.structs -= 1;
        Ok(TypeDescriptor::Dictionary(Box::new(key), Box::new(value)))
    }

    fn structure(&mut self) -> Result<TypeDescriptor> {
        self.structs += 1;
        if self.structs > MAX_DEPTH {
            return Err(self.invalid("structs nested too deeply"));
        }
        self.pos += 1;

        if self.peek() == Some(b')') {
            return Err(self.invalid("empty struct"));
        }

        let mut members = vec![];
        loop {
            match self.peek() {
                Some(b')') => {
                    self.pos += 1;
                    break;
                }
                None => return Err(self.invalid("unbalanced '(': missing ')'")),
                Some(_) => members.push(self.complete_type()?),
            }
        }

        self.structs -= 1;
        Ok(TypeDescriptor::Struct(members))
    }
}
