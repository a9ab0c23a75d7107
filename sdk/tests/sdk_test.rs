use std::io::Write;

use regex::Regex;
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use xidl::{compile_file, compile_to_json, to_json, Layout, RenderOptions, Source, XidlError};
use xidl_schema::{
    BaseType, CallBuilder, EnumBuilder, FieldBuilder, ObjectBuilder, SchemaBuilder,
    ServiceBuilder,
};

fn geometry() -> Vec<u8> {
    SchemaBuilder::new()
        .enumeration(EnumBuilder::new("com.example.Color").value("RED", 0))
        .object(
            ObjectBuilder::new("com.example.Point")
                .field(FieldBuilder::new("x", BaseType::Int))
                .field(FieldBuilder::new("color", BaseType::UByte).index(0)),
        )
        .service(
            ServiceBuilder::new("com.example.Geometry")
                .attribute("type", "interface")
                .call(
                    CallBuilder::new("distance")
                        .attribute("type", "procedure")
                        .request("com.example.Point"),
                ),
        )
        .finish()
}

fn schema_file(data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_compile_file_records_source() {
    let file = schema_file(&geometry());
    let schema = compile_file(file.path()).unwrap();

    assert_eq!(schema.meta.filename, file.path().to_string_lossy());
    assert_eq!(
        schema.meta.filepath,
        std::path::absolute(file.path()).unwrap().to_string_lossy()
    );
    assert_eq!(schema.services.len(), 1);
}

#[cfg(unix)]
#[test]
fn test_compile_file_keeps_symlink_path() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("target.bfbs");
    let link = dir.path().join("link.bfbs");
    std::fs::write(&target, geometry()).unwrap();
    std::os::unix::fs::symlink(&target, &link).unwrap();

    let schema = compile_file(&link).unwrap();
    assert_eq!(schema.meta.filename, link.to_string_lossy());
    assert!(schema.meta.filepath.ends_with("link.bfbs"));
    assert_eq!(schema.services.len(), 1);
}

#[test]
fn test_compile_file_missing() {
    let dir = tempfile::tempdir().unwrap();
    let result = compile_file(dir.path().join("missing.bfbs"));
    assert!(matches!(result, Err(XidlError::Io(_))));
}

#[test]
fn test_compile_file_malformed() {
    let file = schema_file(b"not a schema");
    assert!(matches!(compile_file(file.path()), Err(XidlError::MalformedSchema(_))));
}

#[test]
fn test_compact_uri_document() {
    let json = compile_to_json(&geometry(), &Source::new("g.bfbs", "/g.bfbs")).unwrap();
    assert!(!json.contains('\n'));
    assert!(!json.contains(": "));

    let value: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["meta"]["filename"], "g.bfbs");
    assert_eq!(value["uri"]["com.example.Point"]["fields"]["color"]["referenced_type"], "com.example.Color");
    assert_eq!(value["uri"]["com.example.Geometry"]["slots"]["distance"]["in"], "com.example.Point");
    assert_eq!(value["uri"]["com.example.Geometry"]["slots"]["distance"]["out"], json!(null));
}

#[test]
fn test_pretty_listing() {
    let schema = xidl::compile(&geometry(), &Source::default()).unwrap();
    let options = RenderOptions {
        layout: Layout::Listing,
        pretty: true,
        only:   None,
    };
    let json = to_json(&schema, &options).unwrap();
    assert!(json.contains('\n'));

    let value: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["enums"][0]["name"], "com.example.Color");
    assert_eq!(value["tables"][0]["name"], "com.example.Point");
    assert_eq!(value["services"][0]["name"], "com.example.Geometry");
    assert!(value.get("uri").is_none());
}

#[test]
fn test_only_filter() {
    let schema = xidl::compile(&geometry(), &Source::default()).unwrap();

    let options = RenderOptions {
        only: Some(Regex::new(r"\.(Point|Color)$").unwrap()),
        ..RenderOptions::default()
    };
    let value: Value = serde_json::from_str(&to_json(&schema, &options).unwrap()).unwrap();
    let names: Vec<_> = value["uri"].as_object().unwrap().keys().cloned().collect();
    assert_eq!(names, ["com.example.Color", "com.example.Point"]);

    let options = RenderOptions {
        layout: Layout::Listing,
        only:   Some(Regex::new("Geometry").unwrap()),
        ..RenderOptions::default()
    };
    let value: Value = serde_json::from_str(&to_json(&schema, &options).unwrap()).unwrap();
    assert_eq!(value["enums"], json!([]));
    assert_eq!(value["tables"], json!([]));
    assert_eq!(value["services"][0]["name"], "com.example.Geometry");
}

#[test]
fn test_layout_from_str() {
    assert_eq!("uri".parse::<Layout>(), Ok(Layout::Uri));
    assert_eq!("listing".parse::<Layout>(), Ok(Layout::Listing));
    assert!("tree".parse::<Layout>().is_err());
}
