use indexmap::{map::Entry, IndexMap};
use xidl_schema::{BaseType, Documentation, Field, Schema};

use crate::{
    error::XidlError,
    types::{
        CallDef, DefinitionRef, EnumDef, EnumValueDef, FieldDef, Meta, NormalizedSchema,
        ObjectDef, Reference, ServiceDef, Source, Target, UnresolvedReference,
    },
    verifier::{
        attribute, member_kind, payload_type, restrict_attributes, service_kind,
        stream_modifier, CALL_ATTRIBUTES, SERVICE_ATTRIBUTES,
    },
};

/// Compile a binary reflection schema into a [`NormalizedSchema`].
///
/// Enums are processed first, then objects, then services. Any validation
/// failure aborts the whole compile; the only tolerated defect is a type index
/// outside its vector, which is recorded in `anomalies`.
pub fn compile(buffer: &[u8], source: &Source) -> Result<NormalizedSchema, XidlError> {
    let schema = Schema::open(buffer)?;
    let mut normalizer = Normalizer::default();

    let enums = normalizer.enums(&schema)?;
    let enum_names: Vec<String> = enums.iter().map(|e| e.name.clone()).collect();
    let objects = normalizer.objects(&schema, &enum_names)?;
    let services = normalizer.services(&schema)?;

    let meta = Meta {
        filename:   source.filename.clone(),
        filepath:   source.filepath.clone(),
        file_ident: schema.file_ident().into_owned(),
        file_ext:   schema.file_ext().into_owned(),
        root:       schema.root_table().map(|root| root.name().into_owned()),
    };

    Ok(normalizer.finish(meta, enums, objects, services))
}

fn docs(lines: Documentation<'_>) -> Vec<String> {
    lines.map(|line| line.into_owned()).collect()
}

fn type_name(code: i8) -> String {
    match BaseType::from_code(code) {
        Some(base_type) => base_type.name().to_owned(),
        None => format!("#{code}"),
    }
}

/// Accumulators for one compile call.
#[derive(Default)]
struct Normalizer {
    /// Kind and position (in declaration order) of every qualified name.
    by_qualified_name: IndexMap<String, DefinitionRef>,
    anomalies:         Vec<UnresolvedReference>,
}

impl Normalizer {
    fn register(&mut self, name: &str, def: DefinitionRef) -> Result<(), XidlError> {
        match self.by_qualified_name.entry(name.to_owned()) {
            Entry::Occupied(_) => Err(XidlError::DuplicateDefinition {
                name:   name.to_owned(),
                within: None,
            }),
            Entry::Vacant(slot) => {
                slot.insert(def);
                Ok(())
            }
        }
    }

    fn enums(&mut self, schema: &Schema<'_>) -> Result<Vec<EnumDef>, XidlError> {
        let mut enums = Vec::with_capacity(schema.enums().len());

        for (i, enumeration) in schema.enums().iter().enumerate() {
            let name = enumeration.name().into_owned();

            let mut values = IndexMap::new();
            for value in enumeration.values() {
                let value_name = value.name().into_owned();
                if values.contains_key(&value_name) {
                    return Err(XidlError::DuplicateDefinition {
                        name:   value_name,
                        within: Some(name),
                    });
                }
                values.insert(
                    value_name.clone(),
                    EnumValueDef {
                        name: value_name,
                        docs: docs(value.documentation()),
                    },
                );
            }
            values.sort_keys();

            self.register(&name, DefinitionRef::Enum(i))?;
            enums.push(EnumDef {
                name,
                docs: docs(enumeration.documentation()),
                values,
            });
        }

        Ok(enums)
    }

    fn objects(
        &mut self,
        schema: &Schema<'_>,
        enum_names: &[String],
    ) -> Result<Vec<ObjectDef>, XidlError> {
        // Type indices address the objects vector by position, so every name
        // must be known before the first field is resolved.
        let object_names: Vec<String> = schema
            .objects()
            .iter()
            .map(|object| object.name().into_owned())
            .collect();

        let mut objects = Vec::with_capacity(object_names.len());
        for (i, object) in schema.objects().iter().enumerate() {
            let name = object_names[i].clone();

            let mut fields = IndexMap::new();
            for field in object.fields() {
                let def = self.field(&name, field, enum_names, &object_names)?;
                // A repeated field name replaces the earlier definition.
                fields.insert(def.name.clone(), def);
            }

            self.register(&name, DefinitionRef::Object(i))?;
            objects.push(ObjectDef {
                name,
                docs: docs(object.documentation()),
                is_struct: object.is_struct(),
                fields,
            });
        }

        Ok(objects)
    }

    fn field(
        &mut self,
        object: &str,
        field: Field<'_>,
        enum_names: &[String],
        object_names: &[String],
    ) -> Result<FieldDef, XidlError> {
        let name = field.name().into_owned();
        let (base_code, element_code, index) = match field.type_() {
            Some(ty) => (ty.base_type_code(), ty.element_code(), ty.index()),
            None => (0, 0, -1),
        };

        let unhandled = |element: Option<String>| XidlError::UnhandledFieldType {
            object: object.to_owned(),
            field: name.clone(),
            base_type: type_name(base_code),
            element,
            index,
        };

        let base_type = BaseType::from_code(base_code).ok_or_else(|| unhandled(None))?;
        let element = if base_type == BaseType::Vector {
            match BaseType::from_code(element_code) {
                Some(BaseType::None) => None,
                Some(element) => Some(element),
                None => return Err(unhandled(Some(type_name(element_code)))),
            }
        } else {
            None
        };

        let referenced_type = if index == -1 {
            None
        } else if base_type == BaseType::Obj || element == Some(BaseType::Obj) {
            Some(self.reference(object, &name, Target::Object, object_names, index))
        } else if base_type.is_scalar_or_string() {
            Some(self.reference(object, &name, Target::Enum, enum_names, index))
        } else {
            return Err(unhandled(element.map(|e| e.name().to_owned())));
        };

        let attrs = field.attribute_map();
        Ok(FieldDef {
            id: field.id(),
            offset: field.offset(),
            base_type,
            element,
            index,
            referenced_type,
            docs: docs(field.documentation()),
            attrs: (!attrs.is_empty()).then_some(attrs),
            name,
        })
    }

    fn reference(
        &mut self,
        object: &str,
        field: &str,
        target: Target,
        names: &[String],
        index: i32,
    ) -> Reference {
        match usize::try_from(index).ok().and_then(|i| names.get(i)) {
            Some(name) => Reference::Resolved(name.clone()),
            None => {
                self.anomalies.push(UnresolvedReference {
                    object: object.to_owned(),
                    field: field.to_owned(),
                    target,
                    index,
                });
                Reference::Unresolved { target, index }
            }
        }
    }

    fn services(&mut self, schema: &Schema<'_>) -> Result<Vec<ServiceDef>, XidlError> {
        let mut services = Vec::with_capacity(schema.services().len());

        for (i, service) in schema.services().iter().enumerate() {
            let name = service.name().into_owned();
            let attrs = restrict_attributes(&name, service.attribute_map(), &SERVICE_ATTRIBUTES)?;
            let kind = service_kind(&name, attribute(&attrs, "type"))?;

            let mut calls = IndexMap::new();
            for call in service.calls() {
                let call_name = call.name().into_owned();
                let call_attrs = restrict_attributes(
                    &format!("{name}.{call_name}"),
                    call.attribute_map(),
                    &CALL_ATTRIBUTES,
                )?;
                let def = CallDef {
                    kind:     member_kind(&name, &call_name, attribute(&call_attrs, "type"))?,
                    stream:   stream_modifier(&name, &call_name, attribute(&call_attrs, "stream"))?,
                    request:  payload_type(call.request().map(|r| r.name()).as_deref()),
                    response: payload_type(call.response().map(|r| r.name()).as_deref()),
                    docs:     docs(call.documentation()),
                    attrs:    call_attrs,
                    name:     call_name,
                };
                calls.insert(def.name.clone(), def);
            }

            let uuid = attribute(&attrs, "uuid").map(str::to_owned);
            self.register(&name, DefinitionRef::Service(i))?;
            services.push(ServiceDef {
                uuid,
                docs: docs(service.documentation()),
                attrs,
                name,
                kind,
                calls,
            });
        }

        Ok(services)
    }

    /// Sort the collections by name and repoint the qualified-name index at
    /// the sorted positions.
    fn finish(
        self,
        meta: Meta,
        mut enums: Vec<EnumDef>,
        mut objects: Vec<ObjectDef>,
        mut services: Vec<ServiceDef>,
    ) -> NormalizedSchema {
        enums.sort_by(|a, b| a.name.cmp(&b.name));
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        services.sort_by(|a, b| a.name.cmp(&b.name));

        let by_qualified_name = self
            .by_qualified_name
            .into_iter()
            .filter_map(|(name, def)| {
                let sorted = match def {
                    DefinitionRef::Enum(_) => enums
                        .binary_search_by(|e| e.name.as_str().cmp(&name))
                        .ok()
                        .map(DefinitionRef::Enum),
                    DefinitionRef::Object(_) => objects
                        .binary_search_by(|o| o.name.as_str().cmp(&name))
                        .ok()
                        .map(DefinitionRef::Object),
                    DefinitionRef::Service(_) => services
                        .binary_search_by(|s| s.name.as_str().cmp(&name))
                        .ok()
                        .map(DefinitionRef::Service),
                };
                sorted.map(|def| (name, def))
            })
            .collect();

        NormalizedSchema {
            meta,
            enums,
            objects,
            services,
            by_qualified_name,
            anomalies: self.anomalies,
        }
    }
}
