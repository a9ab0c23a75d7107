//! Read-only access to binary reflection schemas, the self-describing `.bfbs`
//! blobs that enumerate a schema's enums, objects and RPC services.
//!
//! ```
//! use xidl_schema::*;
//!
//! let data = SchemaBuilder::new()
//!     .file_ident("XIDL")
//!     .service(ServiceBuilder::new("Geometry").attribute("type", "interface"))
//!     .finish();
//!
//! let schema = Schema::open(&data).unwrap();
//! assert_eq!(schema.file_ident(), "XIDL");
//! assert_eq!(schema.file_ext(), "");
//! assert_eq!(schema.services().get(0).name(), "Geometry");
//! assert!(Schema::open(b"not a schema").is_err());
//! ```

pub mod bb;
pub mod builder;
pub mod reflection;
pub mod table;

pub use bb::*;
pub use builder::*;
pub use reflection::*;
pub use table::{Follow, Table, Vector, VectorIter};
