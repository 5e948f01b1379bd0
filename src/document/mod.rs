//! Document nodes built on the content engine
//!
//! `XmlElement` is the element handle applications build documents with.
//! Reading goes through roxmltree, writing through quick-xml.

pub mod element;
pub mod errors;
pub mod reader;
pub mod writer;

pub use element::{ChildHandle, XmlElement};
pub use errors::{DocumentError, Result};
