use camino::{Utf8Path, Utf8PathBuf};
use settle_schema::{Format, LoadError, LogicalType, load, parse};

fn fixture(name: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

#[test]
fn test_load_json_fixture() {
    let loaded = load(&fixture("shop.json")).expect("fixture should load");

    assert_eq!(loaded.schema.databases.len(), 1);
    let shop = &loaded.schema.databases[0];
    assert_eq!(shop.name, "my_shop");

    // "orders" has no columns and is skipped
    assert_eq!(shop.tables.len(), 1);
    let widgets = &shop.tables[0];
    assert_eq!(widgets.name, "widgets");
    assert!(widgets.tagging);
    assert_eq!(widgets.columns.len(), 3);
    assert_eq!(widgets.columns[2].datatype, LogicalType::Enum);
    assert_eq!(
        widgets.columns[2].values.iter().map(String::as_str).collect::<Vec<_>>(),
        ["red", "green", "blue"]
    );

    let descriptors = widgets.descriptors.as_ref().expect("descriptors");
    assert_eq!(descriptors[0].name, "size");
    assert_eq!(descriptors[0].columns.len(), 2);

    // one for the nameless database, two for "orders"
    assert_eq!(loaded.diagnostics.len(), 3, "{:?}", loaded.diagnostics);
}

#[test]
fn test_load_yaml_fixture() {
    let loaded = load(&fixture("shop.yml")).expect("fixture should load");
    assert!(loaded.diagnostics.is_empty(), "{:?}", loaded.diagnostics);

    let shop = &loaded.schema.databases[0];
    assert_eq!(shop.name, "my_shop");
    let widgets = &shop.tables[0];
    assert_eq!(widgets.name, "widgets");
    assert!(widgets.tagging);
    assert!(!widgets.columns[0].optional);
    assert_eq!(widgets.columns[1].values.len(), 3);
}

#[test]
fn test_wrong_shaped_table_leaves_its_siblings() {
    let loaded = load(&fixture("mixed-shape.json")).expect("fixture should load");

    let names: Vec<_> = loaded.schema.databases.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["shop"]);
    let shop = &loaded.schema.databases[0];
    assert_eq!(shop.tables.len(), 1);
    assert_eq!(shop.tables[0].name, "good");

    let locations: Vec<_> = loaded
        .diagnostics
        .iter()
        .map(|d| d.location.as_str())
        .collect();
    assert_eq!(locations, ["shop/bad", "shop/worse", "broken"]);
    assert!(loaded.diagnostics[0].message.contains("wrong shape"));
}

#[test]
fn test_unsupported_extension() {
    let err = load(Utf8Path::new("schema.toml")).unwrap_err();
    assert!(matches!(err, LoadError::UnsupportedFormat { .. }));
}

#[test]
fn test_missing_file() {
    let err = load(Utf8Path::new("/definitely/not/here.json")).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}

#[test]
fn test_wrong_shaped_database_is_a_diagnostic() {
    let (document, diagnostics) =
        parse(r#"{ "data": [ { "dbname": "x", "tables": 3 } ] }"#, Format::Json)
            .expect("the document itself is readable");
    assert!(document.data.is_empty());
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].location, "x");
}

#[test]
fn test_unreadable_document_is_a_parse_error() {
    assert!(parse(r#"{ "data": 3 }"#, Format::Json).is_err());
    assert!(parse("{ not json", Format::Json).is_err());
}

#[test]
fn test_format_from_path() {
    assert_eq!(Format::from_path(Utf8Path::new("a.styx")), Some(Format::Styx));
    assert_eq!(Format::from_path(Utf8Path::new("a.json")), Some(Format::Json));
    assert_eq!(Format::from_path(Utf8Path::new("a.yml")), Some(Format::Yaml));
    assert_eq!(Format::from_path(Utf8Path::new("a.yaml")), Some(Format::Yaml));
    assert_eq!(Format::from_path(Utf8Path::new("a")), None);
}
