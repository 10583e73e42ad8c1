//! Wire type signatures: parsing, resolution to target types, and default values.

mod resolve;
mod signature;
mod value;


pub use crate::{
    resolve::{resolve, resolve_signature, Mode, ResolvedType},
    signature::{parse, parse_single, Primitive, TypeDescriptor, MAX_DEPTH, MAX_SIGNATURE_LEN},
    value::{instantiate, instantiate_signature, Value},
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid signature {signature:?} at position {position}: {reason}")]
    InvalidSignature { signature: String, position: usize, reason: &'static str },

    #[error("unknown type code {code:?} in signature {signature:?} at position {position}")]
    UnknownTypeCode { signature: String, position: usize, code: char },

    #[error("{signature:?} has no default value outside of an array")]
    NonInstantiableType { signature: String },
}

pub type Result<T> = std::result::Result<T, Error>;
