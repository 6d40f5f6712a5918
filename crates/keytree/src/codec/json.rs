//! JSON codec.
//!
//! Objects map to nodes with named children, arrays to repeated
//! same-named children (the name comes from the enclosing key; a bare
//! top-level array becomes anonymous, positionally addressed children),
//! scalars map to value cells, and `null` to the absent cell. JSON has
//! no attribute concept, so two key conventions are reserved:
//!
//! - a key starting with `@` is an attribute of the enclosing node
//!   (mirroring `@name` path addressing);
//! - the key `#value` carries the node's own value when the node also
//!   has children or attributes.
//!
//! The tree has no distinct array container, only repetition, so the
//! writer normalizes degenerate arrays under a key: a one-element array
//! reads as a single child and writes back as a plain value
//! (`{"k":[1]}` becomes `{"k":1}`), and an empty array leaves no trace
//! at all. Tree -> text -> tree is the lossless direction.
//!
//! With `preserve_root` the writer wraps the document in a single-key
//! object named after the root, and the reader unwraps such an object
//! back into a named root. Object key order is preserved both ways.

use indexmap::IndexMap;
use serde_json::Value as Json;

use crate::codec::{CodecOptions, ParseError, SerializeError};
use crate::node::{NodeId, Tree};
use crate::value::Value;

/// Reserved key for a node's own value.
pub const VALUE_KEY: &str = "#value";

/// Read a JSON document into a tree.
pub fn read_str(text: &str, options: &CodecOptions) -> Result<Tree, ParseError> {
    let value: Json = serde_json::from_str(text)
        .map_err(|e| ParseError::new(e.line(), e.column(), e.to_string()))?;
    let mut tree = Tree::new("");
    let root = tree.root();

    if options.preserve_root {
        if let Json::Object(map) = &value {
            if map.len() == 1 {
                if let Some((name, body)) = map.iter().next() {
                    tree.set_name(root, name.clone());
                    graft(&mut tree, root, body)?;
                    return Ok(tree);
                }
            }
        }
    }

    graft(&mut tree, root, &value)?;
    Ok(tree)
}

/// Read a JSON document from an I/O source.
pub fn read_from(
    mut source: impl std::io::Read,
    options: &CodecOptions,
) -> Result<Tree, ParseError> {
    let mut text = String::new();
    source
        .read_to_string(&mut text)
        .map_err(|e| ParseError::new(0, 0, format!("i/o: {e}")))?;
    read_str(&text, options)
}

/// Graft a JSON value onto an existing node: objects populate children
/// and attributes, arrays become anonymous children, scalars become the
/// node's value. Shared with the KTF codec's inline-JSON detection.
pub(crate) fn graft(tree: &mut Tree, id: NodeId, value: &Json) -> Result<(), ParseError> {
    match value {
        Json::Object(map) => {
            for (key, entry) in map {
                if let Some(attr) = key.strip_prefix('@') {
                    let scalar = scalar_of(entry).ok_or_else(|| {
                        ParseError::new(0, 0, format!("attribute {key:?} must be a scalar"))
                    })?;
                    tree.set_attr(id, attr, scalar);
                } else if key == VALUE_KEY {
                    let scalar = scalar_of(entry).ok_or_else(|| {
                        ParseError::new(0, 0, format!("{VALUE_KEY:?} must be a scalar"))
                    })?;
                    tree.set_value(id, scalar);
                } else if let Json::Array(items) = entry {
                    for item in items {
                        let child = tree.push_child(id, key.clone());
                        graft(tree, child, item)?;
                    }
                } else {
                    let child = tree.push_child(id, key.clone());
                    graft(tree, child, entry)?;
                }
            }
        }
        Json::Array(items) => {
            for item in items {
                let child = tree.push_child(id, "");
                graft(tree, child, item)?;
            }
        }
        scalar => {
            // scalar_of only fails on containers, handled above.
            if let Some(value) = scalar_of(scalar) {
                tree.set_value(id, value);
            }
        }
    }
    Ok(())
}

fn scalar_of(value: &Json) -> Option<Value> {
    match value {
        Json::Null => Some(Value::Absent),
        Json::Bool(b) => Some(Value::Bool(*b)),
        Json::Number(n) => Some(match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
        }),
        Json::String(s) => Some(Value::Str(s.clone())),
        _ => None,
    }
}

/// Serialize a tree to a JSON string.
pub fn write_string(tree: &Tree, options: &CodecOptions) -> Result<String, SerializeError> {
    let body = to_json(tree, tree.root(), "")?;
    let name = tree.name(tree.root());
    let document = if options.preserve_root && !name.is_empty() {
        let mut map = serde_json::Map::new();
        map.insert(name.to_string(), body);
        Json::Object(map)
    } else {
        body
    };
    Ok(serde_json::to_string(&document)?)
}

/// Serialize a tree to a JSON sink.
pub fn write(
    tree: &Tree,
    sink: &mut impl std::io::Write,
    options: &CodecOptions,
) -> Result<(), SerializeError> {
    let text = write_string(tree, options)?;
    sink.write_all(text.as_bytes())?;
    Ok(())
}

fn to_json(tree: &Tree, id: NodeId, path: &str) -> Result<Json, SerializeError> {
    let node = tree.node(id);

    if node.attr_count() == 0 && node.children().is_empty() {
        return scalar_to_json(node.value(), path);
    }

    // A value-less, attribute-less node whose children are all
    // anonymous serializes as a bare array.
    let children = node.children();
    if node.value().is_absent()
        && node.attr_count() == 0
        && !children.is_empty()
        && children.iter().all(|&c| tree.name(c).is_empty())
    {
        let mut items = Vec::with_capacity(children.len());
        for (i, &child) in children.iter().enumerate() {
            items.push(to_json(tree, child, &format!("{path}/[{i}]"))?);
        }
        return Ok(Json::Array(items));
    }

    let mut map = serde_json::Map::new();
    for (name, value) in node.attrs() {
        let attr_path = format!("{path}/@{name}");
        map.insert(format!("@{name}"), scalar_to_json(value, &attr_path)?);
    }
    if !node.value().is_absent() {
        map.insert(VALUE_KEY.to_string(), scalar_to_json(node.value(), path)?);
    }

    let mut groups: IndexMap<&str, Vec<NodeId>> = IndexMap::new();
    for &child in children {
        groups.entry(tree.name(child)).or_default().push(child);
    }
    for (name, ids) in groups {
        let child_path = format!("{path}/{name}");
        if ids.len() == 1 {
            map.insert(name.to_string(), to_json(tree, ids[0], &child_path)?);
        } else {
            let mut items = Vec::with_capacity(ids.len());
            for (i, &cid) in ids.iter().enumerate() {
                items.push(to_json(tree, cid, &format!("{child_path}[{i}]"))?);
            }
            map.insert(name.to_string(), Json::Array(items));
        }
    }
    Ok(Json::Object(map))
}

fn scalar_to_json(value: &Value, path: &str) -> Result<Json, SerializeError> {
    match value {
        Value::Absent => Ok(Json::Null),
        Value::Bool(b) => Ok(Json::Bool(*b)),
        Value::Int(n) => Ok(Json::Number((*n).into())),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .ok_or_else(|| SerializeError::Unrepresentable {
                path: path.to_string(),
            }),
        Value::Str(s) => Ok(Json::String(s.clone())),
    }
}
