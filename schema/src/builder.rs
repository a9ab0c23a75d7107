//! Serializer for reflection schemas.
//!
//! Buffers are laid out front to back: every table is written with
//! placeholder offsets, then its strings, sub-tables and vectors are appended
//! and the placeholders patched. Offsets therefore always point forward, which
//! is all the reader requires. Scalars equal to their schema default are
//! omitted from the vtable, as the reference schema compiler does.

use crate::bb::ByteBufferMut;
use crate::reflection::{BaseType, FILE_IDENTIFIER};

enum Slot {
    Bool(bool),
    I8(i8),
    U16(u16),
    I32(i32),
    I64(i64),
    Str(String),
    Table(TableNode),
    Tables(Vec<TableNode>),
    Strings(Vec<String>),
}

impl Slot {
    fn inline_width(&self) -> usize {
        match self {
            Slot::Bool(_) | Slot::I8(_) => 1,
            Slot::U16(_) => 2,
            Slot::I64(_) => 8,
            Slot::I32(_) | Slot::Str(_) | Slot::Table(_) | Slot::Tables(_) | Slot::Strings(_) => 4,
        }
    }
}

#[derive(Default)]
struct TableNode {
    slots: Vec<(u16, Slot)>,
}

impl TableNode {
    fn set(mut self, slot: u16, value: Slot) -> Self {
        self.slots.push((slot, value));
        self
    }

    fn set_if(self, present: bool, slot: u16, value: Slot) -> Self {
        if present {
            self.set(slot, value)
        } else {
            self
        }
    }

    fn set_opt_str(self, slot: u16, value: &Option<String>) -> Self {
        match value {
            Some(s) => self.set(slot, Slot::Str(s.clone())),
            None => self,
        }
    }

    fn set_docs(self, slot: u16, docs: &[String]) -> Self {
        self.set_if(!docs.is_empty(), slot, Slot::Strings(docs.to_vec()))
    }

    fn set_attributes(self, slot: u16, attributes: &[(String, String)]) -> Self {
        let tables = attributes
            .iter()
            .map(|(key, value)| {
                TableNode::default()
                    .set(0, Slot::Str(key.clone()))
                    .set(1, Slot::Str(value.clone()))
            })
            .collect::<Vec<_>>();
        self.set_if(!tables.is_empty(), slot, Slot::Tables(tables))
    }
}

fn write_table(out: &mut ByteBufferMut, node: &TableNode) -> usize {
    let entries = node
        .slots
        .iter()
        .map(|(slot, _)| *slot as usize + 1)
        .max()
        .unwrap_or(0);

    let mut field_offsets = vec![0u16; entries];
    let mut table_size = 4;
    for (slot, value) in &node.slots {
        field_offsets[*slot as usize] = table_size as u16;
        table_size += value.inline_width();
    }

    let vtable_pos = out.len();
    out.write_u16((4 + 2 * entries) as u16);
    out.write_u16(table_size as u16);
    for offset in field_offsets {
        out.write_u16(offset);
    }

    let table_pos = out.len();
    out.write_i32((table_pos - vtable_pos) as i32);

    let mut deferred = Vec::new();
    for (_, value) in &node.slots {
        let at = out.len();
        match value {
            Slot::Bool(v) => out.write_bool(*v),
            Slot::I8(v) => out.write_u8(*v as u8),
            Slot::U16(v) => out.write_u16(*v),
            Slot::I32(v) => out.write_i32(*v),
            Slot::I64(v) => out.write_i64(*v),
            Slot::Str(_) | Slot::Table(_) | Slot::Tables(_) | Slot::Strings(_) => {
                out.write_u32(0);
                deferred.push((at, value));
            }
        }
    }

    for (at, value) in deferred {
        let target = match value {
            Slot::Str(s) => write_string(out, s),
            Slot::Table(t) => write_table(out, t),
            Slot::Tables(ts) => write_vector(out, ts.as_slice(), write_table),
            Slot::Strings(ss) => write_vector(out, ss.as_slice(), |out, s: &String| write_string(out, s)),
            _ => unreachable!("only offset slots are deferred"),
        };
        out.patch_u32(at, (target - at) as u32);
    }

    table_pos
}

fn write_string(out: &mut ByteBufferMut, value: &str) -> usize {
    let pos = out.len();
    out.write_string(value);
    pos
}

fn write_vector<T>(
    out: &mut ByteBufferMut,
    items: &[T],
    write_item: impl Fn(&mut ByteBufferMut, &T) -> usize,
) -> usize {
    let pos = out.len();
    out.write_u32(items.len() as u32);
    let elements = out.len();
    for _ in items {
        out.write_u32(0);
    }
    for (i, item) in items.iter().enumerate() {
        let target = write_item(out, item);
        let at = elements + 4 * i;
        out.patch_u32(at, (target - at) as u32);
    }
    pos
}

fn type_table(base: i8, element: i8, index: i32) -> TableNode {
    TableNode::default()
        .set_if(base != 0, 0, Slot::I8(base))
        .set_if(element != 0, 1, Slot::I8(element))
        .set_if(index != -1, 2, Slot::I32(index))
}

/// Minimal object table carrying only a name, as referenced by RPC calls.
fn named_object(name: &str) -> TableNode {
    TableNode::default()
        .set(0, Slot::Str(name.to_owned()))
        .set(1, Slot::Tables(Vec::new()))
}

/// Builds a reflection schema buffer that [`crate::Schema::open`] accepts.
///
/// ```
/// use xidl_schema::{BaseType, EnumBuilder, FieldBuilder, ObjectBuilder, Schema, SchemaBuilder};
///
/// let data = SchemaBuilder::new()
///     .enumeration(EnumBuilder::new("Color").value("RED", 0))
///     .object(ObjectBuilder::new("Point").field(FieldBuilder::new("x", BaseType::Int)))
///     .finish();
///
/// let schema = Schema::open(&data).unwrap();
/// assert_eq!(schema.enums().get(0).name(), "Color");
/// assert_eq!(schema.objects().get(0).fields().get(0).name(), "x");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    objects:    Vec<ObjectBuilder>,
    enums:      Vec<EnumBuilder>,
    services:   Vec<ServiceBuilder>,
    file_ident: Option<String>,
    file_ext:   Option<String>,
    root_table: Option<usize>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_ident(mut self, ident: &str) -> Self {
        self.file_ident = Some(ident.to_owned());
        self
    }

    pub fn file_ext(mut self, ext: &str) -> Self {
        self.file_ext = Some(ext.to_owned());
        self
    }

    /// Declare the object at position `index` as the root type.
    pub fn root_table(mut self, index: usize) -> Self {
        self.root_table = Some(index);
        self
    }

    pub fn object(mut self, object: ObjectBuilder) -> Self {
        self.objects.push(object);
        self
    }

    pub fn enumeration(mut self, enumeration: EnumBuilder) -> Self {
        self.enums.push(enumeration);
        self
    }

    pub fn service(mut self, service: ServiceBuilder) -> Self {
        self.services.push(service);
        self
    }

    pub fn finish(&self) -> Vec<u8> {
        let root = TableNode::default()
            .set(0, Slot::Tables(self.objects.iter().map(ObjectBuilder::node).collect()))
            .set(1, Slot::Tables(self.enums.iter().map(EnumBuilder::node).collect()))
            .set_opt_str(2, &self.file_ident)
            .set_opt_str(3, &self.file_ext);
        let root = match self.root_table.and_then(|i| self.objects.get(i)) {
            Some(object) => root.set(4, Slot::Table(object.node())),
            None => root,
        };
        let root = root.set_if(
            !self.services.is_empty(),
            5,
            Slot::Tables(self.services.iter().map(ServiceBuilder::node).collect()),
        );

        let mut out = ByteBufferMut::new();
        out.write_u32(0);
        out.write_bytes(FILE_IDENTIFIER);
        let root_pos = write_table(&mut out, &root);
        out.patch_u32(0, root_pos as u32);
        out.data()
    }
}

#[derive(Debug, Clone)]
pub struct EnumBuilder {
    name:       String,
    values:     Vec<(String, i64, Vec<String>)>,
    is_union:   bool,
    underlying: BaseType,
    attributes: Vec<(String, String)>,
    docs:       Vec<String>,
}

impl EnumBuilder {
    pub fn new(name: &str) -> Self {
        EnumBuilder {
            name:       name.to_owned(),
            values:     Vec::new(),
            is_union:   false,
            underlying: BaseType::Byte,
            attributes: Vec::new(),
            docs:       Vec::new(),
        }
    }

    pub fn value(self, name: &str, value: i64) -> Self {
        self.documented_value(name, value, &[])
    }

    pub fn documented_value(mut self, name: &str, value: i64, docs: &[&str]) -> Self {
        let docs = docs.iter().map(|d| d.to_string()).collect();
        self.values.push((name.to_owned(), value, docs));
        self
    }

    pub fn union(mut self) -> Self {
        self.is_union = true;
        self.underlying = BaseType::UType;
        self
    }

    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.push((key.to_owned(), value.to_owned()));
        self
    }

    pub fn doc(mut self, line: &str) -> Self {
        self.docs.push(line.to_owned());
        self
    }

    fn node(&self) -> TableNode {
        let values = self
            .values
            .iter()
            .map(|(name, value, docs)| {
                TableNode::default()
                    .set(0, Slot::Str(name.clone()))
                    .set_if(*value != 0, 1, Slot::I64(*value))
                    .set_docs(4, docs)
            })
            .collect();
        TableNode::default()
            .set(0, Slot::Str(self.name.clone()))
            .set(1, Slot::Tables(values))
            .set_if(self.is_union, 2, Slot::Bool(true))
            .set(3, Slot::Table(type_table(self.underlying.code(), 0, -1)))
            .set_attributes(4, &self.attributes)
            .set_docs(5, &self.docs)
    }
}

#[derive(Debug, Clone)]
pub struct FieldBuilder {
    name:       String,
    base:       i8,
    element:    i8,
    index:      i32,
    id:         Option<u16>,
    offset:     Option<u16>,
    required:   bool,
    deprecated: bool,
    attributes: Vec<(String, String)>,
    docs:       Vec<String>,
}

impl FieldBuilder {
    pub fn new(name: &str, base: BaseType) -> Self {
        FieldBuilder {
            name:       name.to_owned(),
            base:       base.code(),
            element:    0,
            index:      -1,
            id:         None,
            offset:     None,
            required:   false,
            deprecated: false,
            attributes: Vec::new(),
            docs:       Vec::new(),
        }
    }

    pub fn element(mut self, element: BaseType) -> Self {
        self.element = element.code();
        self
    }

    /// Set raw base and element codes, including ones outside [`BaseType`].
    pub fn codes(mut self, base: i8, element: i8) -> Self {
        self.base = base;
        self.element = element;
        self
    }

    /// Position of the referenced enum or object.
    pub fn index(mut self, index: i32) -> Self {
        self.index = index;
        self
    }

    pub fn id(mut self, id: u16) -> Self {
        self.id = Some(id);
        self
    }

    pub fn offset(mut self, offset: u16) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.push((key.to_owned(), value.to_owned()));
        self
    }

    pub fn doc(mut self, line: &str) -> Self {
        self.docs.push(line.to_owned());
        self
    }

    fn node(&self, position: usize) -> TableNode {
        let id = self.id.unwrap_or(position as u16);
        let offset = self.offset.unwrap_or(4 + 2 * id);
        TableNode::default()
            .set(0, Slot::Str(self.name.clone()))
            .set(1, Slot::Table(type_table(self.base, self.element, self.index)))
            .set_if(id != 0, 2, Slot::U16(id))
            .set_if(offset != 0, 3, Slot::U16(offset))
            .set_if(self.deprecated, 6, Slot::Bool(true))
            .set_if(self.required, 7, Slot::Bool(true))
            .set_attributes(9, &self.attributes)
            .set_docs(10, &self.docs)
    }
}

#[derive(Debug, Clone)]
pub struct ObjectBuilder {
    name:       String,
    fields:     Vec<FieldBuilder>,
    is_struct:  bool,
    attributes: Vec<(String, String)>,
    docs:       Vec<String>,
}

impl ObjectBuilder {
    pub fn new(name: &str) -> Self {
        ObjectBuilder {
            name:       name.to_owned(),
            fields:     Vec::new(),
            is_struct:  false,
            attributes: Vec::new(),
            docs:       Vec::new(),
        }
    }

    /// Append a field. Unless set explicitly, its id is its position.
    pub fn field(mut self, field: FieldBuilder) -> Self {
        self.fields.push(field);
        self
    }

    pub fn is_struct(mut self) -> Self {
        self.is_struct = true;
        self
    }

    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.push((key.to_owned(), value.to_owned()));
        self
    }

    pub fn doc(mut self, line: &str) -> Self {
        self.docs.push(line.to_owned());
        self
    }

    fn node(&self) -> TableNode {
        let fields = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| f.node(i))
            .collect();
        TableNode::default()
            .set(0, Slot::Str(self.name.clone()))
            .set(1, Slot::Tables(fields))
            .set_if(self.is_struct, 2, Slot::Bool(true))
            .set_attributes(5, &self.attributes)
            .set_docs(6, &self.docs)
    }
}

#[derive(Debug, Clone)]
pub struct CallBuilder {
    name:       String,
    request:    Option<String>,
    response:   Option<String>,
    attributes: Vec<(String, String)>,
    docs:       Vec<String>,
}

impl CallBuilder {
    pub fn new(name: &str) -> Self {
        CallBuilder {
            name:       name.to_owned(),
            request:    None,
            response:   None,
            attributes: Vec::new(),
            docs:       Vec::new(),
        }
    }

    pub fn request(mut self, type_name: &str) -> Self {
        self.request = Some(type_name.to_owned());
        self
    }

    pub fn response(mut self, type_name: &str) -> Self {
        self.response = Some(type_name.to_owned());
        self
    }

    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.push((key.to_owned(), value.to_owned()));
        self
    }

    pub fn doc(mut self, line: &str) -> Self {
        self.docs.push(line.to_owned());
        self
    }

    fn node(&self) -> TableNode {
        let node = TableNode::default().set(0, Slot::Str(self.name.clone()));
        let node = match &self.request {
            Some(name) => node.set(1, Slot::Table(named_object(name))),
            None => node,
        };
        let node = match &self.response {
            Some(name) => node.set(2, Slot::Table(named_object(name))),
            None => node,
        };
        node.set_attributes(3, &self.attributes).set_docs(4, &self.docs)
    }
}

#[derive(Debug, Clone)]
pub struct ServiceBuilder {
    name:       String,
    calls:      Vec<CallBuilder>,
    attributes: Vec<(String, String)>,
    docs:       Vec<String>,
}

impl ServiceBuilder {
    pub fn new(name: &str) -> Self {
        ServiceBuilder {
            name:       name.to_owned(),
            calls:      Vec::new(),
            attributes: Vec::new(),
            docs:       Vec::new(),
        }
    }

    pub fn call(mut self, call: CallBuilder) -> Self {
        self.calls.push(call);
        self
    }

    pub fn attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.push((key.to_owned(), value.to_owned()));
        self
    }

    pub fn doc(mut self, line: &str) -> Self {
        self.docs.push(line.to_owned());
        self
    }

    fn node(&self) -> TableNode {
        TableNode::default()
            .set(0, Slot::Str(self.name.clone()))
            .set_if(
                !self.calls.is_empty(),
                1,
                Slot::Tables(self.calls.iter().map(CallBuilder::node).collect()),
            )
            .set_attributes(2, &self.attributes)
            .set_docs(3, &self.docs)
    }
}
