//! xidl
//!
//! Entry points for turning a binary reflection schema (`.bfbs`) into a
//! normalized interface document.
//!
//! - `compile_file` reads and compiles a schema from disk
//! - `to_json` renders a compiled schema in one of the [`Layout`]s

use std::{fs, path::Path, str::FromStr};

use regex::Regex;
use serde::Serialize;

pub use xidl_compiler::{compile, XidlError};
pub use xidl_compiler::types::{
    CallDef, Definition, Document, EnumDef, Meta, NormalizedSchema, ObjectDef, Reference,
    ServiceDef, Source, UnresolvedReference,
};
pub use xidl_schema::{BaseType, Schema};

/// How a compiled schema is laid out as JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Layout {
    /// `{"meta": ..., "uri": {"<name>": {...}}}`
    #[default]
    Uri,
    /// `{"meta": ..., "enums": [...], "tables": [...], "services": [...]}`
    Listing,
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uri" => Ok(Layout::Uri),
            "listing" => Ok(Layout::Listing),
            other => Err(format!("unknown layout \"{other}\", expected \"uri\" or \"listing\"")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub layout: Layout,
    pub pretty: bool,
    /// Keep only definitions whose qualified name matches.
    pub only:   Option<Regex>,
}

/// Read and compile the schema at `path`. The meta block records `path` as
/// given and its absolute form, with symlinks left unresolved.
pub fn compile_file(path: impl AsRef<Path>) -> Result<NormalizedSchema, XidlError> {
    let path = path.as_ref();
    let buffer = fs::read(path)?;
    let filepath = std::path::absolute(path)?;

    compile(
        &buffer,
        &Source::new(path.to_string_lossy(), filepath.to_string_lossy()),
    )
}

#[derive(Serialize)]
struct Listing<'a> {
    meta:     &'a Meta,
    enums:    Vec<&'a EnumDef>,
    tables:   Vec<&'a ObjectDef>,
    services: Vec<&'a ServiceDef>,
}

/// Render a compiled schema as a JSON string.
pub fn to_json(schema: &NormalizedSchema, options: &RenderOptions) -> Result<String, XidlError> {
    let keep = |name: &str| options.only.as_ref().map_or(true, |re| re.is_match(name));

    let json = match options.layout {
        Layout::Uri => {
            let mut document = schema.document();
            document.retain(keep);
            write(&document, options.pretty)?
        }
        Layout::Listing => {
            let listing = Listing {
                meta:     &schema.meta,
                enums:    schema.enums.iter().filter(|e| keep(&e.name)).collect(),
                tables:   schema.objects.iter().filter(|o| keep(&o.name)).collect(),
                services: schema.services.iter().filter(|s| keep(&s.name)).collect(),
            };
            write(&listing, options.pretty)?
        }
    };
    Ok(json)
}

fn write<T: Serialize>(value: &T, pretty: bool) -> Result<String, XidlError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

/// Compile a `.bfbs` buffer straight to the default compact `uri` document.
pub fn compile_to_json(buffer: &[u8], source: &Source) -> Result<String, XidlError> {
    let schema = compile(buffer, source)?;
    to_json(&schema, &RenderOptions::default())
}

pub mod error {
    pub use xidl_compiler::error::XidlError;
}

pub mod schema {
    pub use xidl_schema::{Enum, Field, Object, RpcCall, Schema, Service};
}
