use thiserror::Error;
use xidl_schema::MalformedSchema;

use crate::utils::{quote, quote_opt};

#[derive(Debug, Error)]
pub enum XidlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed schema: {0}")]
    MalformedSchema(#[from] MalformedSchema),

    #[error("Duplicate definition for {}{}", quote(.name), within_suffix(.within))]
    DuplicateDefinition {
        name:   String,
        within: Option<String>,
    },

    #[error(
        "Unhandled type for field {} of {}: base type {base_type}, element {}, index {index}",
        quote(.field), quote(.object), .element.as_deref().unwrap_or("None")
    )]
    UnhandledFieldType {
        object:    String,
        field:     String,
        base_type: String,
        element:   Option<String>,
        index:     i32,
    },

    #[error("Invalid attribute {} on {}, allowed: {}", quote(.key), quote(.entity), .allowed.join(", "))]
    InvalidAttribute {
        entity:  String,
        key:     String,
        allowed: Vec<String>,
    },

    #[error("Invalid type {} for service {}, expected \"interface\"", quote_opt(.value), quote(.service))]
    InvalidServiceType {
        service: String,
        value:   Option<String>,
    },

    #[error(
        "Invalid member type {} for {}.{}, expected \"procedure\" or \"topic\"",
        quote_opt(.value), .service, .call
    )]
    InvalidMemberType {
        service: String,
        call:    String,
        value:   Option<String>,
    },

    #[error(
        "Invalid stream modifier {} for {}.{}, expected \"in\", \"out\" or \"inout\"",
        quote(.value), .service, .call
    )]
    InvalidStreamModifier {
        service: String,
        call:    String,
        value:   String,
    },
}

fn within_suffix(within: &Option<String>) -> String {
    match within {
        Some(scope) => format!(" in {}", quote(scope)),
        None => String::new(),
    }
}
