//! XML codec.
//!
//! Elements map to nodes, XML attributes to attributes, text content to
//! the node's value. Scalar inference runs over text and attribute
//! content (`true`/`false`, integer, float, else string) so typed trees
//! survive a round trip; the price is that a *string* that looks like a
//! number reads back as a number. Comments, CDATA sections, the XML
//! declaration, processing instructions, and a DOCTYPE line are handled;
//! namespaces are not interpreted (a prefixed name is just a name).
//!
//! By default the document element becomes the tree root. With
//! [`CodecOptions::preserve_root`] the reader instead keeps it as the
//! single child of an anonymous root. The writer needs no flag for the
//! inverse: a named root is written as the document element, and an
//! anonymous root with exactly one child unwraps to that child. Any
//! other anonymous root has no XML form and fails with
//! [`SerializeError::Unrepresentable`].

use std::fmt::Write as _;

use crate::codec::{json, CodecOptions, ParseError, SerializeError};
use crate::node::{NodeId, Tree};
use crate::value::{format_float, Value};

/// Read an XML document into a tree.
pub fn read_str(text: &str, options: &CodecOptions) -> Result<Tree, ParseError> {
    let mut parser = Parser {
        src: text,
        pos: 0,
        line: 1,
        col: 1,
        options,
    };
    parser.skip_misc()?;
    if !parser.starts_with("<") {
        return Err(parser.err("expected a document element"));
    }
    let mut tree = Tree::new("");
    if options.preserve_root {
        let child = tree.push_child(tree.root(), "");
        parser.element_into(&mut tree, child)?;
    } else {
        let root = tree.root();
        parser.element_into(&mut tree, root)?;
    }
    parser.skip_misc()?;
    if parser.peek().is_some() {
        return Err(parser.err("trailing content after the document element"));
    }
    Ok(tree)
}

/// Read an XML document from an I/O source.
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

struct Parser<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    col: usize,
    options: &'a CodecOptions,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.src[self.pos..].starts_with(prefix)
    }

    fn eat(&mut self, prefix: &str) -> bool {
        if !self.starts_with(prefix) {
            return false;
        }
        for _ in prefix.chars() {
            self.bump();
        }
        true
    }

    fn expect(&mut self, prefix: &str) -> Result<(), ParseError> {
        if self.eat(prefix) {
            Ok(())
        } else {
            Err(self.err(format!("expected {prefix:?}")))
        }
    }

    fn err(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(self.line, self.col, message)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn skip_until(&mut self, end: &str) -> Result<(), ParseError> {
        while !self.starts_with(end) {
            if self.bump().is_none() {
                return Err(self.err(format!("unterminated section, expected {end:?}")));
            }
        }
        self.eat(end);
        Ok(())
    }

    /// Skip whitespace, comments, processing instructions, the XML
    /// declaration, and a DOCTYPE between markup of interest.
    fn skip_misc(&mut self) -> Result<(), ParseError> {
        loop {
            self.skip_ws();
            if self.starts_with("<!--") {
                self.eat("<!--");
                self.skip_until("-->")?;
            } else if self.starts_with("<?") {
                self.eat("<?");
                self.skip_until("?>")?;
            } else if self.starts_with("<!DOCTYPE") {
                self.eat("<!DOCTYPE");
                self.skip_until(">")?;
            } else {
                return Ok(());
            }
        }
    }

    fn name(&mut self) -> Result<String, ParseError> {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, '>' | '/' | '=' | '<') {
                break;
            }
            out.push(c);
            self.bump();
        }
        if out.is_empty() {
            return Err(self.err("expected a name"));
        }
        Ok(out)
    }

    /// Parse one element, positioned at its `<`, into an existing node.
    fn element_into(&mut self, tree: &mut Tree, id: NodeId) -> Result<(), ParseError> {
        self.expect("<")?;
        let name = self.name()?;
        tree.set_name(id, name.clone());

        loop {
            self.skip_ws();
            if self.eat("/>") {
                return Ok(());
            }
            if self.eat(">") {
                break;
            }
            let attr = self.name()?;
            self.skip_ws();
            self.expect("=")?;
            self.skip_ws();
            let quote = match self.bump() {
                Some(c @ ('"' | '\'')) => c,
                _ => return Err(self.err("expected a quoted attribute value")),
            };
            let mut raw = String::new();
            loop {
                match self.peek() {
                    None => return Err(self.err("unterminated attribute value")),
                    Some(c) if c == quote => {
                        self.bump();
                        break;
                    }
                    Some('&') => raw.push(self.entity()?),
                    Some(c) => {
                        raw.push(c);
                        self.bump();
                    }
                }
            }
            tree.set_attr(id, attr, infer_scalar(&raw));
        }

        let mut text = String::new();
        loop {
            match self.peek() {
                None => return Err(self.err(format!("unterminated element <{name}>"))),
                Some('<') => {
                    if self.starts_with("<!--") {
                        self.eat("<!--");
                        self.skip_until("-->")?;
                    } else if self.starts_with("<![CDATA[") {
                        self.eat("<![CDATA[");
                        while !self.starts_with("]]>") {
                            match self.bump() {
                                Some(c) => text.push(c),
                                None => return Err(self.err("unterminated CDATA section")),
                            }
                        }
                        self.eat("]]>");
                    } else if self.starts_with("<?") {
                        self.eat("<?");
                        self.skip_until("?>")?;
                    } else if self.starts_with("</") {
                        self.eat("</");
                        let end = self.name()?;
                        if end != name {
                            return Err(
                                self.err(format!("mismatched closing tag </{end}>, expected </{name}>"))
                            );
                        }
                        self.skip_ws();
                        self.expect(">")?;
                        break;
                    } else {
                        let child = tree.push_child(id, "");
                        self.element_into(tree, child)?;
                    }
                }
                Some('&') => text.push(self.entity()?),
                Some(c) => {
                    text.push(c);
                    self.bump();
                }
            }
        }
        self.finish_text(tree, id, text)
    }

    fn finish_text(&self, tree: &mut Tree, id: NodeId, raw: String) -> Result<(), ParseError> {
        if raw.trim().is_empty() {
            if !raw.is_empty() && self.options.preserve_whitespace_nodes {
                tree.set_value(id, Value::Str(raw));
            }
            return Ok(());
        }
        let text = if self.options.trim_whitespace {
            raw.trim()
        } else {
            raw.as_str()
        };
        if self.options.inline_json && (text.starts_with('{') || text.starts_with('[')) {
            if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(text) {
                return json::graft(tree, id, &parsed);
            }
        }
        tree.set_value(id, infer_scalar(text));
        Ok(())
    }

    /// Decode one entity, positioned at its `&`.
    fn entity(&mut self) -> Result<char, ParseError> {
        self.eat("&");
        let mut body = String::new();
        loop {
            match self.bump() {
                Some(';') => break,
                Some(c) if body.len() < 10 => body.push(c),
                _ => return Err(self.err("malformed entity")),
            }
        }
        match body.as_str() {
            "amp" => Ok('&'),
            "lt" => Ok('<'),
            "gt" => Ok('>'),
            "quot" => Ok('"'),
            "apos" => Ok('\''),
            _ => {
                let code = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                    u32::from_str_radix(hex, 16).ok()
                } else if let Some(dec) = body.strip_prefix('#') {
                    dec.parse::<u32>().ok()
                } else {
                    None
                };
                code.and_then(char::from_u32)
                    .ok_or_else(|| self.err(format!("unknown entity &{body};")))
            }
        }
    }
}

fn infer_scalar(text: &str) -> Value {
    match text {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(n) = text.parse::<i64>() {
        return Value::Int(n);
    }
    let numeric = text.bytes().any(|b| b.is_ascii_digit())
        && text
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'+' | b'-' | b'.' | b'e' | b'E'));
    if numeric {
        if let Ok(f) = text.parse::<f64>() {
            return Value::Float(f);
        }
    }
    Value::Str(text.to_string())
}

/// Serialize a tree as compact XML (no added indentation, so a reread
/// produces no whitespace-only text).
pub fn write_string(tree: &Tree, _options: &CodecOptions) -> Result<String, SerializeError> {
    let root = tree.root();
    let doc = if tree.name(root).is_empty() {
        let node = tree.node(root);
        if node.value().is_absent() && node.attr_count() == 0 && node.children().len() == 1 {
            node.children()[0]
        } else {
            return Err(SerializeError::Unrepresentable {
                path: String::new(),
            });
        }
    } else {
        root
    };
    let mut out = String::new();
    write_element(tree, doc, "", &mut out)?;
    Ok(out)
}

/// Serialize a tree as XML into an I/O sink.
pub fn write(
    tree: &Tree,
    sink: &mut impl std::io::Write,
    options: &CodecOptions,
) -> Result<(), SerializeError> {
    let text = write_string(tree, options)?;
    sink.write_all(text.as_bytes())?;
    Ok(())
}

fn write_element(
    tree: &Tree,
    id: NodeId,
    path: &str,
    out: &mut String,
) -> Result<(), SerializeError> {
    let node = tree.node(id);
    let name = node.name();
    check_name(name, path)?;
    let _ = write!(out, "<{name}");
    for (attr, value) in node.attrs() {
        check_name(attr, path)?;
        let text = text_of(value, &format!("{path}@{attr}"))?;
        let _ = write!(out, " {attr}=\"{}\"", escape_attr(&text));
    }
    if node.value().is_absent() && node.children().is_empty() {
        out.push_str("/>");
        return Ok(());
    }
    out.push('>');
    if !node.value().is_absent() {
        let text = text_of(node.value(), path)?;
        out.push_str(&escape_text(&text));
    }
    let mut seen: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for &child in node.children() {
        let child_name = tree.name(child);
        let ord = seen.entry(child_name).or_insert(0);
        let child_path = format!("{path}/{child_name}[{ord}]");
        *ord += 1;
        write_element(tree, child, &child_path, out)?;
    }
    let _ = write!(out, "</{name}>");
    Ok(())
}

fn text_of(value: &Value, path: &str) -> Result<String, SerializeError> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(n) => Ok(n.to_string()),
        Value::Float(f) if f.is_finite() => Ok(format_float(*f)),
        _ => Err(SerializeError::Unrepresentable {
            path: path.to_string(),
        }),
    }
}

fn check_name(name: &str, path: &str) -> Result<(), SerializeError> {
    let valid = !name.is_empty()
        && !name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '<' | '>' | '&' | '"' | '\'' | '=' | '/'));
    if valid {
        Ok(())
    } else {
        Err(SerializeError::Unrepresentable {
            path: format!("{path}/{name}"),
        })
    }
}

fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

fn escape_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::TreeBuilder;

    fn opts() -> CodecOptions {
        CodecOptions::default()
    }

    #[test]
    fn test_read_document() {
        let text = r#"<?xml version="1.0"?>
<!-- demo -->
<config>
  <title>Demo</title>
  <server secure="true">
    <port>8080</port>
  </server>
</config>"#;
        let tree = read_str(text, &opts()).unwrap();
        let root = tree.root();
        assert_eq!(tree.name(root), "config");
        assert_eq!(tree.value_at(root, "title").unwrap().as_str().unwrap(), "Demo");
        assert!(tree
            .value_at(root, "server@secure")
            .unwrap()
            .as_bool()
            .unwrap());
        assert_eq!(
            tree.value_at(root, "server/port").unwrap().as_int().unwrap(),
            8080
        );
    }

    #[test]
    fn test_preserve_root_keeps_wrapper() {
        let mut options = opts();
        options.preserve_root = true;
        let tree = read_str("<a><b>1</b></a>", &options).unwrap();
        let root = tree.root();
        assert_eq!(tree.name(root), "");
        assert_eq!(tree.value_at(root, "a/b").unwrap().as_int().unwrap(), 1);
    }

    #[test]
    fn test_repeated_elements_form_arrays() {
        let tree = read_str("<r><item>1</item><item>2</item></r>", &opts()).unwrap();
        let root = tree.root();
        assert_eq!(tree.count(root, "item"), 2);
        assert_eq!(tree.value_at(root, "item[1]").unwrap().as_int().unwrap(), 2);
    }

    #[test]
    fn test_entities_and_cdata() {
        let tree = read_str("<a>x &amp; y &#65;</a>", &opts()).unwrap();
        assert_eq!(tree.value(tree.root()).as_str().unwrap(), "x & y A");

        let tree = read_str("<a><![CDATA[<raw> & stuff]]></a>", &opts()).unwrap();
        assert_eq!(tree.value(tree.root()).as_str().unwrap(), "<raw> & stuff");
    }

    #[test]
    fn test_self_closing_and_empty() {
        let tree = read_str("<r><a/><b></b></r>", &opts()).unwrap();
        let root = tree.root();
        assert!(tree.value_at(root, "a").unwrap().is_absent());
        assert!(tree.value_at(root, "b").unwrap().is_absent());
    }

    #[test]
    fn test_whitespace_text_dropped_by_default() {
        let tree = read_str("<a>\n  <b>1</b>\n</a>", &opts()).unwrap();
        assert!(tree.value(tree.root()).is_absent());

        let mut options = opts();
        options.preserve_whitespace_nodes = true;
        let tree = read_str("<a>\n  <b>1</b>\n</a>", &options).unwrap();
        assert_eq!(tree.value(tree.root()).as_str().unwrap(), "\n  \n");
    }

    #[test]
    fn test_trim_whitespace_flag() {
        let tree = read_str("<a>  pad  </a>", &opts()).unwrap();
        assert_eq!(tree.value(tree.root()).as_str().unwrap(), "pad");

        let mut options = opts();
        options.trim_whitespace = false;
        let tree = read_str("<a>  pad  </a>", &options).unwrap();
        assert_eq!(tree.value(tree.root()).as_str().unwrap(), "  pad  ");
    }

    #[test]
    fn test_inline_json_in_text() {
        let tree = read_str(r#"<cfg>{"a":[1,2]}</cfg>"#, &opts()).unwrap();
        assert_eq!(
            tree.value_at(tree.root(), "a[1]").unwrap().as_int().unwrap(),
            2
        );
    }

    #[test]
    fn test_scalar_inference_caveat() {
        // A string that looks numeric reads back as a number.
        let tree = read_str("<a>42</a>", &opts()).unwrap();
        assert_eq!(tree.value(tree.root()), &Value::Int(42));
        let tree = read_str("<a>4.5</a>", &opts()).unwrap();
        assert_eq!(tree.value(tree.root()), &Value::Float(4.5));
    }

    #[test]
    fn test_parse_errors_carry_position() {
        let err = read_str("<a>\n<b>1</c>\n</a>", &opts()).unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("mismatched closing tag"));

        let err = read_str("<a><b>1</b>", &opts()).unwrap_err();
        assert!(err.message.contains("unterminated element"));

        let err = read_str("<a>1</a><b/>", &opts()).unwrap_err();
        assert!(err.message.contains("trailing content"));
    }

    #[test]
    fn test_write_document() {
        let tree = TreeBuilder::new()
            .key("title", "Demo")
            .node(
                "server",
                TreeBuilder::new().attr("secure", true).key("port", 8080),
            )
            .build_named("config");
        assert_eq!(
            write_string(&tree, &opts()).unwrap(),
            r#"<config><title>Demo</title><server secure="true"><port>8080</port></server></config>"#
        );
    }

    #[test]
    fn test_write_unwraps_anonymous_root() {
        let tree = TreeBuilder::new()
            .node("doc", TreeBuilder::new().key("k", 1))
            .build();
        assert_eq!(
            write_string(&tree, &opts()).unwrap(),
            "<doc><k>1</k></doc>"
        );
    }

    #[test]
    fn test_write_rejects_wide_anonymous_root() {
        let tree = TreeBuilder::new().key("a", 1).key("b", 2).build();
        assert!(matches!(
            write_string(&tree, &opts()),
            Err(SerializeError::Unrepresentable { .. })
        ));
    }

    #[test]
    fn test_write_escapes() {
        let tree = TreeBuilder::new()
            .node(
                "doc",
                TreeBuilder::new()
                    .attr("q", "say \"hi\" & go")
                    .value("a < b & c"),
            )
            .build();
        assert_eq!(
            write_string(&tree, &opts()).unwrap(),
            r#"<doc q="say &quot;hi&quot; &amp; go">a &lt; b &amp; c</doc>"#
        );
    }

    #[test]
    fn test_roundtrip_typed_tree() {
        let tree = TreeBuilder::new()
            .key("s", "plain text")
            .key("b", false)
            .key("i", -7)
            .key("f", 2.5)
            .array("row", [1i64, 2, 3])
            .build_named("doc");
        let text = write_string(&tree, &opts()).unwrap();
        let back = read_str(&text, &opts()).unwrap();
        assert_eq!(back, tree);
    }

    #[test]
    fn test_float_roundtrip_keeps_type() {
        let tree = TreeBuilder::new().key("x", 1.0).build_named("d");
        let text = write_string(&tree, &opts()).unwrap();
        assert_eq!(text, "<d><x>1.0</x></d>");
        let back = read_str(&text, &opts()).unwrap();
        assert_eq!(
            back.value_at(back.root(), "x").unwrap(),
            Value::Float(1.0)
        );
    }
}
