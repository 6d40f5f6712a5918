//! A self-describing tree engine: named nodes carrying tagged scalar
//! values, ordered attributes, and implicit arrays (repeated child
//! names), addressed by path expressions and serialized through
//! pluggable text codecs.
//!
//! The same tree reads and writes as three formats with identical
//! semantics: the native compact KTF format ([`codec::ktf`]), XML
//! ([`codec::xml`]), and JSON ([`codec::json`]). On top of the tree sit
//! a typed decoder/encoder [`Registry`], a pre-order [`walk`]er, a
//! literal [`TreeBuilder`], and a tabular projection ([`Table`]).
//!
//! # Example
//!
//! ```
//! use keytree::Tree;
//!
//! let tree = Tree::from_ktf_str(
//!     "Title = \"Demo\"\n\
//!      Fibonacci[0] = 1\n\
//!      Fibonacci[1] = 1\n\
//!      server {\n\
//!        @secure = true\n\
//!        port = 8080\n\
//!      }\n",
//! )?;
//! let root = tree.root();
//!
//! assert_eq!(tree.value_at(root, "Title")?.as_str()?, "Demo");
//! assert_eq!(tree.value_at(root, "server/port")?.as_int()?, 8080);
//! assert!(tree.value_at(root, "server@secure")?.as_bool()?);
//! assert_eq!(tree.count(root, "Fibonacci"), 2);
//! # Ok::<(), keytree::Error>(())
//! ```

pub mod builder;
pub mod codec;
mod error;
pub mod node;
pub mod print;
pub mod registry;
mod resolve;
pub mod table;
pub mod value;
pub mod walk;

pub use builder::TreeBuilder;
pub use codec::{CodecOptions, ParseError, SerializeError};
pub use error::Error;
pub use node::{Node, NodeId, Tree};
pub use print::print_node;
pub use registry::{Registry, RegistryError};
pub use resolve::{PathError, Target};
pub use table::Table;
pub use value::{Kind, TypeError, Value};
pub use walk::{walk, Visit, Visitor};

pub use keytree_path as path;

impl Tree {
    /// Parse a KTF document with default [`CodecOptions`]. Works the
    /// same for embedded sources (string literals compiled in) and
    /// file contents.
    pub fn from_ktf_str(text: &str) -> Result<Tree, ParseError> {
        codec::ktf::read_str(text, &CodecOptions::default())
    }

    /// Parse an XML document with default [`CodecOptions`].
    pub fn from_xml_str(text: &str) -> Result<Tree, ParseError> {
        codec::xml::read_str(text, &CodecOptions::default())
    }

    /// Parse a JSON document with default [`CodecOptions`].
    pub fn from_json_str(text: &str) -> Result<Tree, ParseError> {
        codec::json::read_str(text, &CodecOptions::default())
    }

    /// Serialize as KTF with default [`CodecOptions`].
    pub fn to_ktf_string(&self) -> Result<String, SerializeError> {
        codec::ktf::write_string(self, &CodecOptions::default())
    }

    /// Serialize as XML with default [`CodecOptions`].
    pub fn to_xml_string(&self) -> Result<String, SerializeError> {
        codec::xml::write_string(self, &CodecOptions::default())
    }

    /// Serialize as JSON with default [`CodecOptions`].
    pub fn to_json_string(&self) -> Result<String, SerializeError> {
        codec::json::write_string(self, &CodecOptions::default())
    }
}
