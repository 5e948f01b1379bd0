//! MusicXML content-model engine
//!
//! Compiles XSD complex types into content-model grammars and uses them to
//! place the children of document elements in schema order: callers add
//! children in any order, and the engine decides where each one goes,
//! enforces occurrence bounds and choice exclusivity, and reports what is
//! still missing.
//!
//! ```ignore
//! let registry = Arc::new(Registry::from_schema(&XsdSchema::from_path("musicxml.xsd")?)?);
//! let mut note = XmlElement::with_registry(&registry, "note")?;
//! note.append("duration")?.set_value(4);
//! note.append("pitch")?.append_value("step", "C")?;
//! println!("{}", note.to_xml_string()?);
//! ```

pub mod content;
pub mod diagnostics;
pub mod document;
pub mod models;
pub mod registry;
pub mod settings;
pub mod xsd;

// Re-export commonly used types
pub use content::{CompileError, ContainerTree, ContentError, GrammarCompiler, LeafId};
pub use document::{ChildHandle, DocumentError, XmlElement};
pub use models::{Bound, GrammarNode, MaxOccurs};
pub use registry::{Registry, TypeDescriptor};
pub use settings::EngineSettings;
pub use xsd::XsdSchema;
