//! The decoder/encoder registry: an extension point mapping tree nodes
//! to arbitrary host types and back.
//!
//! Lookups are keyed by the destination Rust type, not by anything
//! stored in the tree — a node carries no type tag, so the same shape
//! may decode into different host types at different call sites. The
//! registry is an explicit context object; there is no global state.
//! Built-in scalar decoders/encoders for `bool`, `i64`, `f64`, and
//! `String` are pre-registered and pass straight through value
//! coercion; registering for one of those types shadows the built-in.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use crate::error::Error;
use crate::node::{NodeId, Tree};
use crate::value::FromValue;

/// Error raised when no decoder or encoder is registered for the
/// requested type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no decoder registered for type {0}")]
    NoDecoder(&'static str),
    #[error("no encoder registered for type {0}")]
    NoEncoder(&'static str),
}

type DecodeFn<T> = Rc<dyn Fn(&Tree, NodeId) -> Result<T, Error>>;
type EncodeFn<T> = Rc<dyn Fn(&T) -> Result<Tree, Error>>;

/// A scoped table of decode/encode functions keyed by target type.
pub struct Registry {
    decoders: HashMap<TypeId, Box<dyn Any>>,
    encoders: HashMap<TypeId, Box<dyn Any>>,
}

impl Registry {
    /// A registry with the built-in scalar decoders and encoders.
    pub fn new() -> Self {
        let mut registry = Registry::empty();
        registry.register_scalar::<bool>();
        registry.register_scalar::<i64>();
        registry.register_scalar::<f64>();
        registry.register_scalar::<String>();
        registry
    }

    /// A registry with no registrations at all, for callers that want a
    /// fully explicit type universe.
    pub fn empty() -> Self {
        Registry {
            decoders: HashMap::new(),
            encoders: HashMap::new(),
        }
    }

    fn register_scalar<T>(&mut self)
    where
        T: FromValue + Into<crate::Value> + Clone + 'static,
    {
        self.register_decoder(|tree: &Tree, id: NodeId| {
            let value: T = tree.value(id).to()?;
            Ok(value)
        });
        self.register_encoder(|value: &T| {
            let mut tree = Tree::new("");
            tree.set_value(tree.root(), value.clone());
            Ok(tree)
        });
    }

    /// Register a decoder for `T`, shadowing any previous registration.
    pub fn register_decoder<T: 'static>(
        &mut self,
        decode: impl Fn(&Tree, NodeId) -> Result<T, Error> + 'static,
    ) {
        let boxed: DecodeFn<T> = Rc::new(decode);
        self.decoders.insert(TypeId::of::<T>(), Box::new(boxed));
    }

    /// Register an encoder for `T`, shadowing any previous registration.
    pub fn register_encoder<T: 'static>(
        &mut self,
        encode: impl Fn(&T) -> Result<Tree, Error> + 'static,
    ) {
        let boxed: EncodeFn<T> = Rc::new(encode);
        self.encoders.insert(TypeId::of::<T>(), Box::new(boxed));
    }

    /// Decode the subtree rooted at `id` into a `T`, propagating any
    /// error the decoder raises.
    pub fn decode<T: 'static>(&self, tree: &Tree, id: NodeId) -> Result<T, Error> {
        let decode = self
            .decoders
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.downcast_ref::<DecodeFn<T>>())
            .ok_or(RegistryError::NoDecoder(std::any::type_name::<T>()))?;
        decode(tree, id)
    }

    /// Encode a `T` into a freshly rooted tree.
    pub fn encode<T: 'static>(&self, value: &T) -> Result<Tree, Error> {
        let encode = self
            .encoders
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.downcast_ref::<EncodeFn<T>>())
            .ok_or(RegistryError::NoEncoder(std::any::type_name::<T>()))?;
        encode(value)
    }

    pub fn has_decoder<T: 'static>(&self) -> bool {
        self.decoders.contains_key(&TypeId::of::<T>())
    }

    pub fn has_encoder<T: 'static>(&self) -> bool {
        self.encoders.contains_key(&TypeId::of::<T>())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[derive(Debug, PartialEq)]
    struct Endpoint {
        host: String,
        port: i64,
    }

    fn endpoint_decoder(tree: &Tree, id: NodeId) -> Result<Endpoint, Error> {
        Ok(Endpoint {
            host: tree.value_at(id, "host")?.as_str()?,
            port: tree.value_or(id, "port", 80)?.as_int()?,
        })
    }

    #[test]
    fn test_builtin_scalars() {
        let registry = Registry::new();
        let mut tree = Tree::new("");
        tree.set_value(tree.root(), 42);
        assert_eq!(registry.decode::<i64>(&tree, tree.root()).unwrap(), 42);
        assert_eq!(
            registry.decode::<String>(&tree, tree.root()).unwrap(),
            "42"
        );
        assert!(registry.decode::<bool>(&tree, tree.root()).is_err());
    }

    #[test]
    fn test_builtin_encode() {
        let registry = Registry::new();
        let tree = registry.encode(&3.5f64).unwrap();
        assert_eq!(tree.value(tree.root()).as_float().unwrap(), 3.5);
    }

    #[test]
    fn test_custom_decoder() {
        let mut registry = Registry::new();
        registry.register_decoder(endpoint_decoder);

        let mut tree = Tree::new("");
        let root = tree.root();
        tree.set(root, "host", "example.org").unwrap();

        let ep = registry.decode::<Endpoint>(&tree, root).unwrap();
        assert_eq!(
            ep,
            Endpoint {
                host: "example.org".into(),
                port: 80
            }
        );
    }

    #[test]
    fn test_missing_registration() {
        let registry = Registry::new();
        let tree = Tree::new("");
        let err = registry.decode::<Endpoint>(&tree, tree.root());
        assert!(matches!(
            err,
            Err(Error::Registry(RegistryError::NoDecoder(_)))
        ));
        assert!(matches!(
            registry.encode(&Endpoint { host: "h".into(), port: 1 }),
            Err(Error::Registry(RegistryError::NoEncoder(_)))
        ));
    }

    #[test]
    fn test_shadowing_builtin() {
        let mut registry = Registry::new();
        registry.register_decoder(|_: &Tree, _: NodeId| Ok(99i64));
        let tree = Tree::new("");
        assert_eq!(registry.decode::<i64>(&tree, tree.root()).unwrap(), 99);
    }

    #[test]
    fn test_empty_registry() {
        let registry = Registry::empty();
        assert!(!registry.has_decoder::<i64>());
        let tree = Tree::new("");
        assert!(registry.decode::<i64>(&tree, tree.root()).is_err());
    }
}
