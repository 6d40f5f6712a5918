//! Cross-format behavior: the same logical document authored in each
//! syntax produces the same tree, and trees convert between formats
//! without loss.

use std::io::Cursor;

use keytree::codec::{ktf, xml, CodecOptions};
use keytree::{Error, NodeId, Registry, Tree};

const KTF_DOC: &str = r#"
config {
  title = "Demo"
  server {
    @secure = true
    host = "localhost"
    port = 8080
  }
  fib[0] = 1
  fib[1] = 1
  fib[2] = 2
}
"#;

const XML_DOC: &str = r#"<?xml version="1.0"?>
<config>
  <title>Demo</title>
  <server secure="true">
    <host>localhost</host>
    <port>8080</port>
  </server>
  <fib>1</fib>
  <fib>1</fib>
  <fib>2</fib>
</config>"#;

const JSON_DOC: &str = r#"{
  "config": {
    "title": "Demo",
    "server": { "@secure": true, "host": "localhost", "port": 8080 },
    "fib": [1, 1, 2]
  }
}"#;

#[test]
fn test_three_syntaxes_one_tree() {
    let from_ktf = Tree::from_ktf_str(KTF_DOC).unwrap();
    let from_json = Tree::from_json_str(JSON_DOC).unwrap();

    let mut options = CodecOptions::default();
    options.preserve_root = true;
    let from_xml = xml::read_str(XML_DOC, &options).unwrap();

    assert_eq!(from_ktf, from_json);
    assert_eq!(from_ktf, from_xml);
}

#[test]
fn test_convert_ktf_to_json_and_back() {
    let tree = Tree::from_ktf_str(KTF_DOC).unwrap();
    let json = tree.to_json_string().unwrap();
    let back = Tree::from_json_str(&json).unwrap();
    assert_eq!(back, tree);
}

#[test]
fn test_convert_ktf_to_xml_and_back() {
    let tree = Tree::from_ktf_str(KTF_DOC).unwrap();
    let xml_text = tree.to_xml_string().unwrap();
    // The anonymous root unwraps to the document element on write, so
    // reading with preserve_root restores the same shape.
    let mut options = CodecOptions::default();
    options.preserve_root = true;
    let back = xml::read_str(&xml_text, &options).unwrap();
    assert_eq!(back, tree);
}

#[test]
fn test_embedded_source_equals_stream_source() {
    let options = CodecOptions::default();
    let embedded = ktf::read_str(KTF_DOC, &options).unwrap();
    let streamed = ktf::read_from(Cursor::new(KTF_DOC.as_bytes()), &options).unwrap();
    assert_eq!(embedded, streamed);
}

#[test]
fn test_write_to_sink() {
    let tree = Tree::from_ktf_str("k = 1\n").unwrap();
    let mut sink = Vec::new();
    ktf::write(&tree, &mut sink, &CodecOptions::default()).unwrap();
    assert_eq!(String::from_utf8(sink).unwrap(), "k = 1\n");
}

#[derive(Debug, PartialEq)]
struct Server {
    host: String,
    port: i64,
    secure: bool,
}

fn server_decoder(tree: &Tree, id: NodeId) -> Result<Server, Error> {
    Ok(Server {
        host: tree.value_at(id, "host")?.as_str()?,
        port: tree.value_or(id, "port", 80)?.as_int()?,
        secure: tree.value_or(id, "@secure", false)?.as_bool()?,
    })
}

#[test]
fn test_decode_parsed_document() {
    let tree = Tree::from_ktf_str(KTF_DOC).unwrap();
    let mut registry = Registry::new();
    registry.register_decoder(server_decoder);

    let node = tree.get(tree.root(), "config/server").unwrap();
    let server = registry.decode::<Server>(&tree, node).unwrap();
    assert_eq!(
        server,
        Server {
            host: "localhost".into(),
            port: 8080,
            secure: true,
        }
    );
}
