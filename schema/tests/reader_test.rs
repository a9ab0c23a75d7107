use xidl_schema::{
    BaseType, ByteBufferMut, CallBuilder, EnumBuilder, FieldBuilder, MalformedSchema,
    ObjectBuilder, Schema, SchemaBuilder, ServiceBuilder,
};

fn geometry() -> Vec<u8> {
    SchemaBuilder::new()
        .file_ident("GEOM")
        .file_ext("geom")
        .enumeration(
            EnumBuilder::new("Color")
                .doc("  Colors of a point.  ")
                .value("RED", 0)
                .documented_value("GREEN", 1, &[" the green one "])
                .value("BLUE", 2),
        )
        .object(
            ObjectBuilder::new("Point")
                .doc("A point.")
                .field(FieldBuilder::new("x", BaseType::Int))
                .field(FieldBuilder::new("y", BaseType::Int))
                .field(
                    FieldBuilder::new("color", BaseType::UByte)
                        .index(0)
                        .attribute("deprecated", "0")
                        .attribute("priority", "high"),
                ),
        )
        .object(
            ObjectBuilder::new("Polygon")
                .field(FieldBuilder::new("points", BaseType::Vector).element(BaseType::Obj).index(0)),
        )
        .root_table(1)
        .service(
            ServiceBuilder::new("Geometry")
                .attribute("type", "interface")
                .doc(" Geometry procedures.")
                .call(
                    CallBuilder::new("distance")
                        .request("Point")
                        .response("wamp.Void")
                        .attribute("type", "procedure"),
                ),
        )
        .finish()
}

#[test]
fn open_rejects_short_buffer() {
    assert_eq!(Schema::open(&[1, 2, 3]).unwrap_err(), MalformedSchema::TooShort(3));
}

#[test]
fn open_rejects_missing_identifier() {
    let mut data = geometry();
    data[4..8].copy_from_slice(b"FLAT");
    assert_eq!(Schema::open(&data).unwrap_err(), MalformedSchema::MissingIdentifier);
}

#[test]
fn open_rejects_bad_root_offset() {
    let mut data = geometry();
    let len = data.len() as u32;
    data[0..4].copy_from_slice(&(len + 16).to_le_bytes());
    assert_eq!(
        Schema::open(&data).unwrap_err(),
        MalformedSchema::BadRootOffset(len + 16)
    );

    let mut bb = ByteBufferMut::new();
    bb.write_u32(8);
    bb.write_bytes(b"BFBS");
    bb.write_i32(-4000);
    assert_eq!(
        Schema::open(&bb.data()).unwrap_err(),
        MalformedSchema::BadRootOffset(8)
    );
}

#[test]
fn top_level_vectors() {
    let data = geometry();
    let schema = Schema::open(&data).unwrap();
    assert_eq!(schema.file_ident(), "GEOM");
    assert_eq!(schema.file_ext(), "geom");
    assert_eq!(schema.enums().len(), 1);
    assert_eq!(schema.objects().len(), 2);
    assert_eq!(schema.services().len(), 1);
    assert_eq!(schema.root_table().unwrap().name(), "Polygon");

    let names: Vec<_> = schema.objects().iter().map(|o| o.name().into_owned()).collect();
    assert_eq!(names, ["Point", "Polygon"]);
}

#[test]
fn absent_strings_read_as_empty() {
    let data = SchemaBuilder::new().finish();
    let schema = Schema::open(&data).unwrap();
    assert_eq!(schema.file_ident(), "");
    assert_eq!(schema.file_ext(), "");
    assert!(schema.root_table().is_none());
    assert!(schema.enums().is_empty());
    assert!(schema.services().is_empty());
}

#[test]
fn enum_values_and_documentation() {
    let data = geometry();
    let schema = Schema::open(&data).unwrap();
    let color = schema.enums().get(0);
    assert_eq!(color.name(), "Color");
    assert_eq!(color.underlying_type().unwrap().base_type(), Some(BaseType::Byte));
    assert_eq!(color.documentation().collect::<Vec<_>>(), ["Colors of a point."]);

    let values: Vec<_> = color.values().iter().map(|v| (v.name().into_owned(), v.value())).collect();
    assert_eq!(
        values,
        [("RED".to_owned(), 0), ("GREEN".to_owned(), 1), ("BLUE".to_owned(), 2)]
    );
    let green = color.values().get(1);
    assert_eq!(green.documentation().collect::<Vec<_>>(), ["the green one"]);
    assert_eq!(color.values().get(0).documentation().count(), 0);
}

#[test]
fn documentation_is_restartable() {
    let data = geometry();
    let schema = Schema::open(&data).unwrap();
    let service = schema.services().get(0);
    let first: Vec<_> = service.documentation().collect();
    let second: Vec<_> = service.documentation().collect();
    assert_eq!(first, ["Geometry procedures."]);
    assert_eq!(first, second);
}

#[test]
fn field_types_and_defaults() {
    let data = geometry();
    let schema = Schema::open(&data).unwrap();
    let point = schema.objects().get(0);
    let fields = point.fields();
    assert_eq!(fields.len(), 3);

    let x = fields.get(0);
    let ty = x.type_().unwrap();
    assert_eq!(ty.base_type(), Some(BaseType::Int));
    assert_eq!(ty.element(), Some(BaseType::None));
    assert_eq!(ty.index(), -1);
    assert_eq!((x.id(), x.offset()), (0, 4));
    assert!(!x.deprecated());

    let color = fields.get(2);
    assert_eq!((color.id(), color.offset()), (2, 8));
    assert_eq!(color.type_().unwrap().index(), 0);

    let points = schema.objects().get(1).fields().get(0);
    let ty = points.type_().unwrap();
    assert_eq!(ty.base_type(), Some(BaseType::Vector));
    assert_eq!(ty.element(), Some(BaseType::Obj));
}

#[test]
fn attribute_zero_reads_as_absent() {
    let data = geometry();
    let schema = Schema::open(&data).unwrap();
    let color = schema.objects().get(0).fields().get(2);
    let attrs = color.attribute_map();
    assert_eq!(attrs.len(), 2);
    assert_eq!(attrs["deprecated"], None);
    assert_eq!(attrs["priority"].as_deref(), Some("high"));
    assert_eq!(
        attrs.keys().map(String::as_str).collect::<Vec<_>>(),
        ["deprecated", "priority"]
    );
}

#[test]
fn rpc_call_references() {
    let data = geometry();
    let schema = Schema::open(&data).unwrap();
    let service = schema.services().get(0);
    assert_eq!(service.attribute_map()["type"].as_deref(), Some("interface"));
    let call = service.calls().get(0);
    assert_eq!(call.name(), "distance");
    assert_eq!(call.request().unwrap().name(), "Point");
    assert_eq!(call.response().unwrap().name(), "wamp.Void");
}

#[test]
fn unknown_base_type_code() {
    let data = SchemaBuilder::new()
        .object(ObjectBuilder::new("Fixed").field(FieldBuilder::new("raw", BaseType::Int).codes(17, 0)))
        .finish();
    let schema = Schema::open(&data).unwrap();
    let ty = schema.objects().get(0).fields().get(0).type_().unwrap();
    assert_eq!(ty.base_type_code(), 17);
    assert_eq!(ty.base_type(), None);
}

#[test]
#[should_panic(expected = "out of range")]
fn vector_index_past_end_panics() {
    let data = geometry();
    let schema = Schema::open(&data).unwrap();
    schema.enums().get(1);
}
