use indexmap::IndexMap;
use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::XidlError,
    types::{MemberKind, ServiceKind, Stream},
};

lazy_static! {
    static ref VOID_TYPE:   Regex = Regex::new(r"^(?:wamp\.)?Void$").unwrap();
    static ref NULL_STREAM: Regex = Regex::new(r"^(?:[Nn]one|[Nn]ull)$").unwrap();
}

pub const SERVICE_ATTRIBUTES: [&str; 2] = ["type", "uuid"];
pub const CALL_ATTRIBUTES:    [&str; 2] = ["type", "stream"];

pub type Attributes = IndexMap<String, Option<String>>;

/// Returns the attributes unchanged if every key is in `allowed`.
pub fn restrict_attributes(
    entity: &str,
    attributes: Attributes,
    allowed: &[&str],
) -> Result<Attributes, XidlError> {
    if let Some(key) = attributes.keys().find(|key| !allowed.contains(&key.as_str())) {
        return Err(XidlError::InvalidAttribute {
            entity:  entity.to_owned(),
            key:     key.clone(),
            allowed: allowed.iter().map(|a| a.to_string()).collect(),
        });
    }
    Ok(attributes)
}

/// Value of `key`, with valueless attributes folded into absence.
pub fn attribute<'a>(attributes: &'a Attributes, key: &str) -> Option<&'a str> {
    attributes.get(key).and_then(|value| value.as_deref())
}

pub fn service_kind(service: &str, value: Option<&str>) -> Result<ServiceKind, XidlError> {
    match value {
        Some("interface") => Ok(ServiceKind::Interface),
        other => Err(XidlError::InvalidServiceType {
            service: service.to_owned(),
            value:   other.map(str::to_owned),
        }),
    }
}

pub fn member_kind(service: &str, call: &str, value: Option<&str>) -> Result<MemberKind, XidlError> {
    match value {
        Some("procedure") => Ok(MemberKind::Procedure),
        Some("topic") => Ok(MemberKind::Topic),
        other => Err(XidlError::InvalidMemberType {
            service: service.to_owned(),
            call:    call.to_owned(),
            value:   other.map(str::to_owned),
        }),
    }
}

pub fn stream_modifier(
    service: &str,
    call: &str,
    value: Option<&str>,
) -> Result<Option<Stream>, XidlError> {
    match value {
        None => Ok(None),
        Some(v) if NULL_STREAM.is_match(v) => Ok(None),
        Some("in") => Ok(Some(Stream::In)),
        Some("out") => Ok(Some(Stream::Out)),
        Some("inout") => Ok(Some(Stream::InOut)),
        Some(other) => Err(XidlError::InvalidStreamModifier {
            service: service.to_owned(),
            call:    call.to_owned(),
            value:   other.to_owned(),
        }),
    }
}

/// Payload type of a call. `Void`, `wamp.Void` and an empty name all mean
/// the call carries no payload in that direction.
pub fn payload_type(name: Option<&str>) -> Option<String> {
    match name {
        Some(name) if !name.is_empty() && !VOID_TYPE.is_match(name) => Some(name.to_owned()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, Option<&str>)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_owned)))
            .collect()
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        let err = restrict_attributes(
            "Geometry",
            attrs(&[("type", Some("interface")), ("color", Some("red"))]),
            &SERVICE_ATTRIBUTES,
        )
        .unwrap_err();
        match err {
            XidlError::InvalidAttribute { entity, key, allowed } => {
                assert_eq!(entity, "Geometry");
                assert_eq!(key, "color");
                assert_eq!(allowed, ["type", "uuid"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn service_type_must_be_interface() {
        assert_eq!(service_kind("S", Some("interface")).unwrap(), ServiceKind::Interface);
        assert!(matches!(
            service_kind("S", Some("workflow")),
            Err(XidlError::InvalidServiceType { value: Some(v), .. }) if v == "workflow"
        ));
        assert!(matches!(
            service_kind("S", None),
            Err(XidlError::InvalidServiceType { value: None, .. })
        ));
    }

    #[test]
    fn member_types() {
        assert_eq!(member_kind("S", "c", Some("procedure")).unwrap(), MemberKind::Procedure);
        assert_eq!(member_kind("S", "c", Some("topic")).unwrap(), MemberKind::Topic);
        assert!(member_kind("S", "c", Some("event")).is_err());
        assert!(member_kind("S", "c", None).is_err());
    }

    #[test]
    fn stream_spellings() {
        for null in ["none", "None", "null", "Null"] {
            assert_eq!(stream_modifier("S", "c", Some(null)).unwrap(), None);
        }
        assert_eq!(stream_modifier("S", "c", None).unwrap(), None);
        assert_eq!(stream_modifier("S", "c", Some("in")).unwrap(), Some(Stream::In));
        assert_eq!(stream_modifier("S", "c", Some("out")).unwrap(), Some(Stream::Out));
        assert_eq!(stream_modifier("S", "c", Some("inout")).unwrap(), Some(Stream::InOut));
        assert!(matches!(
            stream_modifier("S", "c", Some("NONE")),
            Err(XidlError::InvalidStreamModifier { value, .. }) if value == "NONE"
        ));
    }

    #[test]
    fn void_payloads() {
        assert_eq!(payload_type(Some("Void")), None);
        assert_eq!(payload_type(Some("wamp.Void")), None);
        assert_eq!(payload_type(Some("")), None);
        assert_eq!(payload_type(None), None);
        assert_eq!(payload_type(Some("com.Void")).as_deref(), Some("com.Void"));
        assert_eq!(payload_type(Some("Voidable")).as_deref(), Some("Voidable"));
    }
}
