use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use xidl_schema::BaseType;

/// Where the compiled buffer came from. Only used to fill in [`Meta`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Source {
    pub filename: String,
    pub filepath: String,
}

impl Source {
    pub fn new(filename: impl Into<String>, filepath: impl Into<String>) -> Self {
        Source {
            filename: filename.into(),
            filepath: filepath.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Meta {
    pub filename:   String,
    pub filepath:   String,
    pub file_ident: String,
    pub file_ext:   String,
    pub root:       Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumValueDef {
    pub name: String,
    pub docs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumDef {
    pub name:   String,
    pub docs:   Vec<String>,
    pub values: IndexMap<String, EnumValueDef>,
}

/// Which top-level vector a type index addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Enum,
    Object,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Enum => f.write_str("enum"),
            Target::Object => f.write_str("object"),
        }
    }
}

/// A field's resolved type reference.
///
/// An index that falls outside its vector does not fail the compile; it is
/// kept as `Unresolved` and serializes as a visible placeholder string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Resolved(String),
    Unresolved { target: Target, index: i32 },
}

impl Reference {
    /// Qualified name of the referenced type, if it was resolved.
    pub fn name(&self) -> Option<&str> {
        match self {
            Reference::Resolved(name) => Some(name),
            Reference::Unresolved { .. } => None,
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::Resolved(name) => f.write_str(name),
            Reference::Unresolved { target, index } => write!(f, "<unresolved {target} #{index}>"),
        }
    }
}

impl Serialize for Reference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDef {
    pub name:            String,
    pub id:              u16,
    pub offset:          u16,
    pub base_type:       BaseType,
    pub element:         Option<BaseType>,
    pub index:           i32,
    pub referenced_type: Option<Reference>,
    pub docs:            Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attrs:           Option<IndexMap<String, Option<String>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectDef {
    pub name:      String,
    pub docs:      Vec<String>,
    pub is_struct: bool,
    pub fields:    IndexMap<String, FieldDef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    Interface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Procedure,
    Topic,
}

impl MemberKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberKind::Procedure => "procedure",
            MemberKind::Topic => "topic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stream {
    In,
    Out,
    InOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallDef {
    pub name:     String,
    #[serde(rename = "type")]
    pub kind:     MemberKind,
    /// Request payload type; `None` means no payload.
    #[serde(rename = "in")]
    pub request:  Option<String>,
    #[serde(rename = "out")]
    pub response: Option<String>,
    pub stream:   Option<Stream>,
    pub docs:     Vec<String>,
    pub attrs:    IndexMap<String, Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceDef {
    pub name:  String,
    #[serde(skip)]
    pub kind:  ServiceKind,
    pub uuid:  Option<String>,
    pub docs:  Vec<String>,
    pub attrs: IndexMap<String, Option<String>>,
    #[serde(rename = "slots")]
    pub calls: IndexMap<String, CallDef>,
}

/// Non-fatal defect found while resolving a field's type index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedReference {
    pub object: String,
    pub field:  String,
    pub target: Target,
    pub index:  i32,
}

impl fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} index {} of field \"{}\" in \"{}\" does not resolve",
            self.target, self.index, self.field, self.object
        )
    }
}

/// Position of a definition in one of the sorted collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionRef {
    Enum(usize),
    Object(usize),
    Service(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Definition<'a> {
    #[serde(rename = "enum")]
    Enum(&'a EnumDef),
    #[serde(rename = "table")]
    Object(&'a ObjectDef),
    #[serde(rename = "interface")]
    Service(&'a ServiceDef),
}

impl Definition<'_> {
    pub fn name(&self) -> &str {
        match self {
            Definition::Enum(def) => &def.name,
            Definition::Object(def) => &def.name,
            Definition::Service(def) => &def.name,
        }
    }
}

/// The compiled schema. Serializes as a listing of the sorted collections;
/// see [`NormalizedSchema::document`] for the by-name rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedSchema {
    pub meta:     Meta,
    pub enums:    Vec<EnumDef>,
    #[serde(rename = "tables")]
    pub objects:  Vec<ObjectDef>,
    pub services: Vec<ServiceDef>,
    #[serde(skip)]
    pub by_qualified_name: IndexMap<String, DefinitionRef>,
    #[serde(skip)]
    pub anomalies: Vec<UnresolvedReference>,
}

impl NormalizedSchema {
    pub fn get(&self, name: &str) -> Option<Definition<'_>> {
        self.by_qualified_name.get(name).map(|def| self.resolve(*def))
    }

    fn resolve(&self, def: DefinitionRef) -> Definition<'_> {
        match def {
            DefinitionRef::Enum(i) => Definition::Enum(&self.enums[i]),
            DefinitionRef::Object(i) => Definition::Object(&self.objects[i]),
            DefinitionRef::Service(i) => Definition::Service(&self.services[i]),
        }
    }

    pub fn definitions(&self) -> impl Iterator<Item = Definition<'_>> + '_ {
        self.by_qualified_name.values().map(|def| self.resolve(*def))
    }

    pub fn document(&self) -> Document<'_> {
        Document {
            meta: &self.meta,
            uri:  self
                .by_qualified_name
                .iter()
                .map(|(name, def)| (name.as_str(), self.resolve(*def)))
                .collect(),
        }
    }
}

/// `{"meta": ..., "uri": {"<qualified name>": {"type": ..., ...}}}`
#[derive(Debug, Clone, Serialize)]
pub struct Document<'a> {
    pub meta: &'a Meta,
    pub uri:  IndexMap<&'a str, Definition<'a>>,
}

impl Document<'_> {
    /// Keep only the definitions whose qualified name satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.uri.retain(|name, _| keep(*name));
    }
}
