//! Crate-level error type aggregating the per-concern errors.

use thiserror::Error;

use crate::codec::{ParseError, SerializeError};
use crate::registry::RegistryError;
use crate::resolve::PathError;
use crate::value::TypeError;

/// Any error the tree engine can raise. The per-concern types stay the
/// primary API; this enum exists for call sites (decoders, application
/// glue) that mix several of them.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Type(#[from] TypeError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Serialize(#[from] SerializeError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
