use keytree_path::{parse, validate, Path, PathSyntaxError, Step};

#[test]
fn test_parse_display_roundtrip() {
    for text in [
        "",
        ".",
        "..",
        "a",
        "a/b/c",
        "a[2]",
        "a/b[0]/c",
        "a@attr",
        "a/b[3]@attr",
        "@attr",
        "[2]",
        "a/[1]/b",
        "../sibling",
        "../../a[1]@x",
        "./a",
    ] {
        let path: Path = text.parse().unwrap();
        assert_eq!(path.to_string(), text, "display mismatch for {text:?}");
    }
}

#[test]
fn test_step_shapes() {
    let path = parse("a/b[2]/../c@id").unwrap();
    assert_eq!(
        path.steps,
        vec![
            Step::Child {
                name: "a".to_string(),
                index: None
            },
            Step::Child {
                name: "b".to_string(),
                index: Some(2)
            },
            Step::Up,
            Step::Child {
                name: "c".to_string(),
                index: None
            },
        ]
    );
    assert_eq!(path.attr.as_deref(), Some("id"));
}

#[test]
fn test_empty_path_is_here() {
    let path = parse("").unwrap();
    assert!(path.is_here());
    assert!(path.steps.is_empty());
    assert!(path.attr.is_none());
}

#[test]
fn test_anonymous_indexed_segment() {
    let path = parse("[3]").unwrap();
    assert_eq!(
        path.steps,
        vec![Step::Child {
            name: String::new(),
            index: Some(3)
        }]
    );
}

#[test]
fn test_syntax_errors() {
    assert_eq!(validate("/a"), Err(PathSyntaxError::LeadingSlash));
    assert!(matches!(
        validate("a@x/b"),
        Err(PathSyntaxError::AttrNotLast(_))
    ));
    assert_eq!(validate("a@"), Err(PathSyntaxError::EmptyAttr));
    assert!(matches!(
        validate("a[2"),
        Err(PathSyntaxError::UnterminatedIndex(_))
    ));
    assert!(matches!(
        validate("a[x]"),
        Err(PathSyntaxError::InvalidIndex(_))
    ));
    assert!(matches!(
        validate("a[-1]"),
        Err(PathSyntaxError::InvalidIndex(_))
    ));
    assert!(matches!(
        validate("a[1]b"),
        Err(PathSyntaxError::TrailingAfterIndex(_))
    ));
    assert!(matches!(
        validate("..[1]"),
        Err(PathSyntaxError::DecoratedDots(_))
    ));
    assert!(matches!(
        validate(".@x"),
        Err(PathSyntaxError::DecoratedDots(_))
    ));
}

#[test]
fn test_no_escape_syntax() {
    // There is no escaping: every '/' separates, every '@' starts an
    // attribute, so these parse as structure rather than literal names.
    let path = parse("a\\/b").unwrap();
    assert_eq!(path.steps.len(), 2);
}
