//! KTF, the native compact text format.
//!
//! Line oriented: `#` comments and blank lines are ignored, indentation
//! is decorative. The left-hand side of an assignment is a full path
//! expression, so nested creation, implicit arrays, and attributes all
//! work from a flat key:
//!
//! ```text
//! Title = "Demo"              # quoted string
//! Fibonacci[0] = 1            # indexed key -> implicit array
//! server/host = "local"      # path key -> nested creation
//! window {                    # nested block (always a new child)
//!   @role = "main"            # attribute of the enclosing block node
//!   width = 800
//! }
//! users [                     # array block: repeated "users" children
//!   { name = "ana" }
//!   { name = "bo" }
//! ]
//! ```
//!
//! Scalars are quoted strings, `true`/`false`, integers, and floats;
//! any other unquoted text falls back to a string. Bare scalars are
//! trimmed by default; with [`CodecOptions::trim_whitespace`] off they
//! keep their surrounding whitespace verbatim. With
//! [`CodecOptions::inline_json`] a value starting with `{` or `[` that
//! parses as JSON is grafted as a subtree. `. = value` assigns the
//! enclosing block node's own value. With
//! [`CodecOptions::preserve_root`] the writer wraps the document in a
//! root-named block and the reader promotes a single top block back to
//! the root.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::codec::{json, CodecOptions, ParseError, SerializeError};
use crate::node::{NodeId, Tree};
use crate::resolve::Target;
use crate::value::{format_float, Value};

const INDENT: &str = "  ";

// Characters that cannot appear in a name the writer can express.
const RESERVED: &[char] = &['/', '[', ']', '@', '=', '{', '}', '"', '#'];

#[derive(Clone)]
enum Ctx {
    Block(NodeId),
    Array { parent: NodeId, name: String },
}

/// Read a KTF document into a tree. This is also the embedded-source
/// interface: the source is any in-memory string, file-backed or not.
pub fn read_str(text: &str, options: &CodecOptions) -> Result<Tree, ParseError> {
    let mut tree = Tree::new("");
    let mut stack: Vec<Ctx> = vec![Ctx::Block(tree.root())];
    let mut line_no = 0;

    for (idx, raw) in text.lines().enumerate() {
        line_no = idx + 1;
        let stripped = strip_comment(raw);
        let line = stripped.trim();
        if line.is_empty() {
            continue;
        }
        let ctx = match stack.last() {
            Some(ctx) => ctx.clone(),
            None => break,
        };
        match ctx {
            Ctx::Array { parent, name } => read_array_line(
                &mut tree, &mut stack, parent, &name, line, stripped, line_no, options,
            )?,
            Ctx::Block(cur) => {
                read_block_line(&mut tree, &mut stack, cur, line, stripped, line_no, options)?
            }
        }
    }

    if stack.len() != 1 {
        return Err(ParseError::new(line_no, 1, "unterminated block"));
    }

    if options.preserve_root {
        let root = tree.root();
        let is_wrapper = tree.value(root).is_absent()
            && tree.node(root).attr_count() == 0
            && tree.children(root).len() == 1;
        if is_wrapper {
            let only = tree.children(root)[0];
            if let Ok(promoted) = tree.detach(only) {
                return Ok(promoted);
            }
        }
    }
    Ok(tree)
}

/// Read a KTF document from an I/O source. An I/O failure aborts the
/// read; the partially built tree is discarded.
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

#[allow(clippy::too_many_arguments)]
fn read_array_line(
    tree: &mut Tree,
    stack: &mut Vec<Ctx>,
    parent: NodeId,
    name: &str,
    line: &str,
    raw: &str,
    line_no: usize,
    options: &CodecOptions,
) -> Result<(), ParseError> {
    if line == "]" {
        stack.pop();
        return Ok(());
    }
    if line == "{" {
        let child = tree.push_child(parent, name);
        stack.push(Ctx::Block(child));
        return Ok(());
    }
    if line == "}" {
        return Err(ParseError::new(line_no, 1, "unexpected '}' in array block"));
    }
    if options.inline_json && (line.starts_with('{') || line.starts_with('[')) {
        let parsed: serde_json::Value = serde_json::from_str(line)
            .map_err(|e| ParseError::new(line_no, e.column(), "malformed inline JSON element"))?;
        let child = tree.push_child(parent, name);
        json::graft(tree, child, &parsed)
            .map_err(|e| ParseError::new(line_no, 1, e.message))?;
        return Ok(());
    }
    let value =
        parse_scalar(value_text(raw, options)).map_err(|msg| ParseError::new(line_no, 1, msg))?;
    let child = tree.push_child(parent, name);
    tree.set_value(child, value);
    Ok(())
}

fn read_block_line(
    tree: &mut Tree,
    stack: &mut Vec<Ctx>,
    cur: NodeId,
    line: &str,
    raw: &str,
    line_no: usize,
    options: &CodecOptions,
) -> Result<(), ParseError> {
    if line == "}" {
        if stack.len() == 1 {
            return Err(ParseError::new(line_no, 1, "unexpected '}' at top level"));
        }
        stack.pop();
        return Ok(());
    }
    if line == "{" {
        let child = tree.push_child(cur, "");
        stack.push(Ctx::Block(child));
        return Ok(());
    }

    if let Some(eq) = find_unquoted(raw, '=') {
        let key = raw[..eq].trim();
        let raw_value = value_text(&raw[eq + 1..], options);

        if options.inline_json && (raw_value.starts_with('{') || raw_value.starts_with('[')) {
            let parsed: serde_json::Value = serde_json::from_str(raw_value).map_err(|e| {
                ParseError::new(line_no, eq + 1 + e.column(), "malformed inline JSON value")
            })?;
            let target = tree
                .ensure(cur, key)
                .map_err(|e| ParseError::new(line_no, 1, e.to_string()))?;
            return match target {
                Target::Node(id) => json::graft(tree, id, &parsed)
                    .map_err(|e| ParseError::new(line_no, 1, e.message)),
                Target::Attr(..) => Err(ParseError::new(
                    line_no,
                    1,
                    "an attribute cannot hold an inline JSON structure",
                )),
            };
        }

        let value =
            parse_scalar(raw_value).map_err(|msg| ParseError::new(line_no, eq + 2, msg))?;
        tree.set(cur, key, value)
            .map_err(|e| ParseError::new(line_no, 1, e.to_string()))?;
        return Ok(());
    }

    if let Some(key) = line.strip_suffix('{') {
        let name = header_name(key.trim())
            .map_err(|msg| ParseError::new(line_no, 1, msg))?;
        let child = tree.push_child(cur, name);
        stack.push(Ctx::Block(child));
        return Ok(());
    }
    if let Some(key) = line.strip_suffix('[') {
        let name = header_name(key.trim())
            .map_err(|msg| ParseError::new(line_no, 1, msg))?;
        stack.push(Ctx::Array { parent: cur, name });
        return Ok(());
    }

    Err(ParseError::new(
        line_no,
        1,
        "expected 'key = value', 'key {', or 'key ['",
    ))
}

/// Block and array headers take a plain name; nesting goes through
/// block structure or path keys, not header paths.
fn header_name(key: &str) -> Result<String, String> {
    if key == "." || key == ".." || key.contains(RESERVED) {
        return Err(format!("invalid block name {key:?}"));
    }
    Ok(key.to_string())
}

/// Byte index of the first `needle` outside double quotes.
fn find_unquoted(line: &str, needle: char) -> Option<usize> {
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            c if c == needle && !in_string => return Some(i),
            _ => {}
        }
    }
    None
}

fn strip_comment(line: &str) -> &str {
    match find_unquoted(line, '#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Extract the value text of an assignment or array element from the
/// comment-stripped line. Quoted strings and inline structures delimit
/// themselves; bare scalars keep trailing whitespace when
/// `trim_whitespace` is off.
fn value_text<'a>(raw: &'a str, options: &CodecOptions) -> &'a str {
    if options.trim_whitespace {
        return raw.trim();
    }
    let lead = raw.trim_start();
    if lead.starts_with(['"', '{', '[']) {
        raw.trim()
    } else {
        lead
    }
}

fn parse_scalar(text: &str) -> Result<Value, String> {
    if text.is_empty() {
        return Ok(Value::Str(String::new()));
    }
    if text.starts_with('"') {
        return unquote(text).map(Value::Str);
    }
    match text {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        _ => {}
    }
    if let Ok(n) = text.parse::<i64>() {
        return Ok(Value::Int(n));
    }
    if looks_numeric(text) {
        if let Ok(f) = text.parse::<f64>() {
            return Ok(Value::Float(f));
        }
    }
    Ok(Value::Str(text.to_string()))
}

fn looks_numeric(text: &str) -> bool {
    text.bytes().any(|b| b.is_ascii_digit())
        && text
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'+' | b'-' | b'.' | b'e' | b'E'))
}

fn unquote(text: &str) -> Result<String, String> {
    let mut out = String::new();
    let mut chars = text[1..].chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                return if chars.next().is_none() {
                    Ok(out)
                } else {
                    Err("trailing characters after closing quote".to_string())
                };
            }
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => return Err(format!("invalid escape '\\{other}'")),
                None => return Err("unterminated string".to_string()),
            },
            c => out.push(c),
        }
    }
    Err("unterminated string".to_string())
}

/// Serialize a tree as KTF.
pub fn write_string(tree: &Tree, options: &CodecOptions) -> Result<String, SerializeError> {
    let mut out = String::new();
    let root = tree.root();
    let root_name = tree.name(root);
    if options.preserve_root && !root_name.is_empty() {
        check_name(root_name, "")?;
        let _ = writeln!(out, "{root_name} {{");
        write_body(tree, root, 1, root_name, &mut out)?;
        out.push_str("}\n");
    } else {
        write_body(tree, root, 0, "", &mut out)?;
    }
    Ok(out)
}

/// Serialize a tree as KTF into an I/O sink.
pub fn write(
    tree: &Tree,
    sink: &mut impl std::io::Write,
    options: &CodecOptions,
) -> Result<(), SerializeError> {
    let text = write_string(tree, options)?;
    sink.write_all(text.as_bytes())?;
    Ok(())
}

fn write_body(
    tree: &Tree,
    id: NodeId,
    depth: usize,
    path: &str,
    out: &mut String,
) -> Result<(), SerializeError> {
    let pad = INDENT.repeat(depth);
    let node = tree.node(id);

    for (name, value) in node.attrs() {
        check_name(name, path)?;
        let lit = literal(value, &format!("{path}@{name}"))?;
        let _ = writeln!(out, "{pad}@{name} = {lit}");
    }
    if !node.value().is_absent() {
        let lit = literal(node.value(), path)?;
        let _ = writeln!(out, "{pad}. = {lit}");
    }

    let children = node.children();
    let totals = name_totals(tree, children);
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut i = 0;
    while i < children.len() {
        let child = children[i];
        let name = tree.name(child);
        check_name(name, path)?;
        let ord = seen.entry(name).or_insert(0);

        if is_scalar_leaf(tree, child) {
            let child_path = format!("{path}/{name}[{ord}]");
            let lit = literal(tree.value(child), &child_path)?;
            if name.is_empty() {
                let _ = writeln!(out, "{pad}[{ord}] = {lit}");
            } else if totals[name] > 1 {
                let _ = writeln!(out, "{pad}{name}[{ord}] = {lit}");
            } else {
                let _ = writeln!(out, "{pad}{name} = {lit}");
            }
            *ord += 1;
            i += 1;
            continue;
        }

        // A run of two or more same-named block children becomes an
        // array block; single blocks and anonymous nodes stand alone.
        let mut run = 1;
        while !name.is_empty()
            && i + run < children.len()
            && tree.name(children[i + run]) == name
            && !is_scalar_leaf(tree, children[i + run])
        {
            run += 1;
        }

        if !name.is_empty() && run > 1 {
            let _ = writeln!(out, "{pad}{name} [");
            for k in 0..run {
                let child_path = format!("{path}/{name}[{}]", *ord + k);
                let _ = writeln!(out, "{pad}{INDENT}{{");
                write_body(tree, children[i + k], depth + 2, &child_path, out)?;
                let _ = writeln!(out, "{pad}{INDENT}}}");
            }
            let _ = writeln!(out, "{pad}]");
            *ord += run;
            i += run;
        } else {
            let child_path = format!("{path}/{name}[{ord}]");
            if name.is_empty() {
                let _ = writeln!(out, "{pad}{{");
            } else {
                let _ = writeln!(out, "{pad}{name} {{");
            }
            write_body(tree, child, depth + 1, &child_path, out)?;
            let _ = writeln!(out, "{pad}}}");
            *ord += 1;
            i += 1;
        }
    }
    Ok(())
}

fn name_totals<'a>(tree: &'a Tree, children: &[NodeId]) -> HashMap<&'a str, usize> {
    let mut totals: HashMap<&str, usize> = HashMap::new();
    for &child in children {
        *totals.entry(tree.name(child)).or_insert(0) += 1;
    }
    totals
}

/// A node expressible as a single `key = value` line.
fn is_scalar_leaf(tree: &Tree, id: NodeId) -> bool {
    let node = tree.node(id);
    !node.value().is_absent() && node.attr_count() == 0 && node.children().is_empty()
}

fn check_name(name: &str, path: &str) -> Result<(), SerializeError> {
    if name == "." || name == ".." || name.contains(RESERVED) || name.trim() != name {
        return Err(SerializeError::Unrepresentable {
            path: format!("{path}/{name}"),
        });
    }
    Ok(())
}

fn literal(value: &Value, path: &str) -> Result<String, SerializeError> {
    match value {
        Value::Str(s) => Ok(quote(s)),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(n) => Ok(n.to_string()),
        Value::Float(f) if f.is_finite() => Ok(format_float(*f)),
        _ => Err(SerializeError::Unrepresentable {
            path: path.to_string(),
        }),
    }
}

fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
