//! xidl-compiler
//!
//! Turns a binary FlatBuffers reflection schema into a validated,
//! self-contained description of its enums, tables and WAMP interfaces:
//!  1) enums, objects and services are read in that order through
//!     `xidl-schema` views,
//!  2) type indices are resolved against the fully loaded vectors,
//!  3) service and call attributes are checked against the interface grammar
//!     (`verifier`),
//!  4) the result is a [`NormalizedSchema`] that owns all of its data.

pub mod error;
pub mod types;
pub mod utils;
pub mod verifier;
pub mod compiler;

pub use compiler::compile;
pub use error::XidlError;
pub use types::*;
