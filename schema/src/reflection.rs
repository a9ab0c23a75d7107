//! Typed views over the tables of a binary reflection schema (`.bfbs`).
//!
//! Every view is a `Copy` handle bound to a position in the borrowed buffer.
//! Nothing is decoded until an accessor asks for it, and absent slots read as
//! their schema defaults.

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

use crate::bb::ByteBuffer;
use crate::table::{Follow, Table, Vector, VectorIter};

/// Four-byte marker stored right after the root offset.
pub const FILE_IDENTIFIER: &[u8; 4] = b"BFBS";

/// Size of the buffer header: root offset plus file identifier.
pub const HEADER_SIZE: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedSchema {
    #[error("buffer is {0} bytes, too short for a reflection schema header")]
    TooShort(usize),

    #[error("missing \"BFBS\" file identifier")]
    MissingIdentifier,

    #[error("root table offset {0} is out of bounds")]
    BadRootOffset(u32),
}

/// The closed set of field base types understood by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum BaseType {
    None,
    UType,
    Bool,
    Byte,
    UByte,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    String,
    Vector,
    Obj,
    Union,
}

impl BaseType {
    pub const ALL: [BaseType; 17] = [
        BaseType::None,
        BaseType::UType,
        BaseType::Bool,
        BaseType::Byte,
        BaseType::UByte,
        BaseType::Short,
        BaseType::UShort,
        BaseType::Int,
        BaseType::UInt,
        BaseType::Long,
        BaseType::ULong,
        BaseType::Float,
        BaseType::Double,
        BaseType::String,
        BaseType::Vector,
        BaseType::Obj,
        BaseType::Union,
    ];

    /// Decode the wire code; codes outside the known set yield `None`.
    pub fn from_code(code: i8) -> Option<BaseType> {
        usize::try_from(code).ok().and_then(|i| Self::ALL.get(i).copied())
    }

    pub fn code(self) -> i8 {
        self as i8
    }

    /// Scalar and string kinds, the ones whose type index names an enum.
    pub fn is_scalar_or_string(self) -> bool {
        !matches!(
            self,
            BaseType::None | BaseType::Vector | BaseType::Obj | BaseType::Union
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            BaseType::None   => "None",
            BaseType::UType  => "UType",
            BaseType::Bool   => "Bool",
            BaseType::Byte   => "Byte",
            BaseType::UByte  => "UByte",
            BaseType::Short  => "Short",
            BaseType::UShort => "UShort",
            BaseType::Int    => "Int",
            BaseType::UInt   => "UInt",
            BaseType::Long   => "Long",
            BaseType::ULong  => "ULong",
            BaseType::Float  => "Float",
            BaseType::Double => "Double",
            BaseType::String => "String",
            BaseType::Vector => "Vector",
            BaseType::Obj    => "Obj",
            BaseType::Union  => "Union",
        }
    }
}

impl fmt::Display for BaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn trim_line(line: Cow<'_, str>) -> Cow<'_, str> {
    match line {
        Cow::Borrowed(s) => Cow::Borrowed(s.trim()),
        Cow::Owned(s) => Cow::Owned(s.trim().to_owned()),
    }
}

/// Documentation lines of an entity, trimmed as they are produced.
///
/// Each call to a `documentation()` accessor starts a fresh walk over the
/// buffer, so the sequence can be consumed any number of times.
pub struct Documentation<'a> {
    inner: VectorIter<'a, Cow<'a, str>>,
}

impl<'a> Iterator for Documentation<'a> {
    type Item = Cow<'a, str>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(trim_line)
    }
}

macro_rules! view {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug)]
        pub struct $name<'a> {
            table: Table<'a>,
        }

        impl<'a> Follow<'a> for $name<'a> {
            fn follow(bb: ByteBuffer<'a>, pos: usize) -> Self {
                $name { table: Table::follow(bb, pos) }
            }
        }

        impl<'a> $name<'a> {
            pub fn from_table(table: Table<'a>) -> Self {
                $name { table }
            }
        }
    };
}

macro_rules! documented {
    ($name:ident, $slot:expr) => {
        impl<'a> $name<'a> {
            pub fn documentation(&self) -> Documentation<'a> {
                Documentation {
                    inner: self.table.get_vector::<Cow<'a, str>>($slot).iter(),
                }
            }
        }
    };
}

macro_rules! attributed {
    ($name:ident, $slot:expr) => {
        impl<'a> $name<'a> {
            pub fn attributes(&self) -> Vector<'a, KeyValue<'a>> {
                self.table.get_vector($slot)
            }

            /// Attributes collected by key, in declaration order. A repeated
            /// key keeps its first position and its last value.
            pub fn attribute_map(&self) -> IndexMap<String, Option<String>> {
                self.attributes()
                    .iter()
                    .map(|kv| (kv.key().into_owned(), kv.value().map(Cow::into_owned)))
                    .collect()
            }
        }
    };
}

view!(
    /// Root of a reflection schema.
    Schema
);

impl<'a> Schema<'a> {
    /// Validate the header and bind the root table. Nothing beyond the root
    /// table header is inspected.
    pub fn open(data: &'a [u8]) -> Result<Schema<'a>, MalformedSchema> {
        if data.len() < HEADER_SIZE {
            return Err(MalformedSchema::TooShort(data.len()));
        }
        if &data[4..HEADER_SIZE] != FILE_IDENTIFIER {
            return Err(MalformedSchema::MissingIdentifier);
        }
        let bb = ByteBuffer::new(data);
        let root = bb.read_u32(0).unwrap_or(0);
        let pos = root as usize;
        if pos < HEADER_SIZE || pos >= data.len() {
            return Err(MalformedSchema::BadRootOffset(root));
        }
        let table = Table::new(bb, pos).ok_or(MalformedSchema::BadRootOffset(root))?;
        Ok(Schema { table })
    }

    pub fn objects(&self) -> Vector<'a, Object<'a>> {
        self.table.get_vector(0)
    }

    pub fn enums(&self) -> Vector<'a, Enum<'a>> {
        self.table.get_vector(1)
    }

    pub fn file_ident(&self) -> Cow<'a, str> {
        self.table.get_str(2)
    }

    pub fn file_ext(&self) -> Cow<'a, str> {
        self.table.get_str(3)
    }

    pub fn root_table(&self) -> Option<Object<'a>> {
        self.table.get_table(4).map(Object::from_table)
    }

    pub fn services(&self) -> Vector<'a, Service<'a>> {
        self.table.get_vector(5)
    }
}

view!(
    /// `key = value` attribute attached to a declaration.
    KeyValue
);

impl<'a> KeyValue<'a> {
    pub fn key(&self) -> Cow<'a, str> {
        self.table.get_str(0)
    }

    /// The attribute value. The literal `"0"`, which is what the schema
    /// compiler writes for a valueless attribute, reads as `None`.
    pub fn value(&self) -> Option<Cow<'a, str>> {
        let value = self.table.get_str(1);
        (value != "0").then_some(value)
    }
}

view!(Type);

impl<'a> Type<'a> {
    pub fn base_type_code(&self) -> i8 {
        self.table.get_i8(0, 0)
    }

    pub fn element_code(&self) -> i8 {
        self.table.get_i8(1, 0)
    }

    pub fn base_type(&self) -> Option<BaseType> {
        BaseType::from_code(self.base_type_code())
    }

    pub fn element(&self) -> Option<BaseType> {
        BaseType::from_code(self.element_code())
    }

    /// Position of the referenced enum or object, `-1` when none.
    pub fn index(&self) -> i32 {
        self.table.get_i32(2, -1)
    }
}

view!(EnumVal);
documented!(EnumVal, 4);

impl<'a> EnumVal<'a> {
    pub fn name(&self) -> Cow<'a, str> {
        self.table.get_str(0)
    }

    pub fn value(&self) -> i64 {
        self.table.get_i64(1, 0)
    }

    pub fn union_type(&self) -> Option<Type<'a>> {
        self.table.get_table(3).map(Type::from_table)
    }
}

view!(Enum);
attributed!(Enum, 4);
documented!(Enum, 5);

impl<'a> Enum<'a> {
    pub fn name(&self) -> Cow<'a, str> {
        self.table.get_str(0)
    }

    pub fn values(&self) -> Vector<'a, EnumVal<'a>> {
        self.table.get_vector(1)
    }

    pub fn is_union(&self) -> bool {
        self.table.get_bool(2, false)
    }

    pub fn underlying_type(&self) -> Option<Type<'a>> {
        self.table.get_table(3).map(Type::from_table)
    }
}

view!(Field);
attributed!(Field, 9);
documented!(Field, 10);

impl<'a> Field<'a> {
    pub fn name(&self) -> Cow<'a, str> {
        self.table.get_str(0)
    }

    pub fn type_(&self) -> Option<Type<'a>> {
        self.table.get_table(1).map(Type::from_table)
    }

    pub fn id(&self) -> u16 {
        self.table.get_u16(2, 0)
    }

    pub fn offset(&self) -> u16 {
        self.table.get_u16(3, 0)
    }

    pub fn default_integer(&self) -> i64 {
        self.table.get_i64(4, 0)
    }

    pub fn default_real(&self) -> f64 {
        self.table.get_f64(5, 0.0)
    }

    pub fn deprecated(&self) -> bool {
        self.table.get_bool(6, false)
    }

    pub fn required(&self) -> bool {
        self.table.get_bool(7, false)
    }

    pub fn key(&self) -> bool {
        self.table.get_bool(8, false)
    }
}

view!(Object);
attributed!(Object, 5);
documented!(Object, 6);

impl<'a> Object<'a> {
    pub fn name(&self) -> Cow<'a, str> {
        self.table.get_str(0)
    }

    pub fn fields(&self) -> Vector<'a, Field<'a>> {
        self.table.get_vector(1)
    }

    pub fn is_struct(&self) -> bool {
        self.table.get_bool(2, false)
    }

    pub fn minalign(&self) -> i32 {
        self.table.get_i32(3, 0)
    }

    pub fn bytesize(&self) -> i32 {
        self.table.get_i32(4, 0)
    }
}

view!(RpcCall);
attributed!(RpcCall, 3);
documented!(RpcCall, 4);

impl<'a> RpcCall<'a> {
    pub fn name(&self) -> Cow<'a, str> {
        self.table.get_str(0)
    }

    pub fn request(&self) -> Option<Object<'a>> {
        self.table.get_table(1).map(Object::from_table)
    }

    pub fn response(&self) -> Option<Object<'a>> {
        self.table.get_table(2).map(Object::from_table)
    }
}

view!(Service);
attributed!(Service, 2);
documented!(Service, 3);

impl<'a> Service<'a> {
    pub fn name(&self) -> Cow<'a, str> {
        self.table.get_str(0)
    }

    pub fn calls(&self) -> Vector<'a, RpcCall<'a>> {
        self.table.get_vector(1)
    }
}
