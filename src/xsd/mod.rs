//! Schema reader
//!
//! Parses XSD text with roxmltree into an owned attributed tree and indexes
//! it for the grammar compiler. Only the content-model and attribute
//! declarations are read; simple-type facets are not interpreted.

pub mod schema;
pub mod tree;

pub use schema::{AttributeDecl, XsdSchema};
pub use tree::XsdTree;
