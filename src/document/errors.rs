//! Error types for document nodes

use thiserror::Error;

use crate::content::errors::{CompileError, ContentError};

/// Errors raised while building, reading or writing documents
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// The content model refused a child
    #[error(transparent)]
    Content(#[from] ContentError),

    /// The schema failed to compile
    #[error(transparent)]
    Compile(#[from] CompileError),

    /// Tag has no element declaration in the registry
    #[error("Unknown element: <{0}>")]
    UnknownElement(String),

    /// Attribute not declared for the element's type
    #[error("Unknown attribute '{attribute}' on <{element}>")]
    UnknownAttribute { element: String, attribute: String },

    /// Handle does not name a child of this element
    #[error("No such child")]
    NoSuchChild,

    /// Required children are missing, even after resolving choices
    #[error("<{element}> is incomplete, missing: {}", .missing.join(", "))]
    IncompleteContent { element: String, missing: Vec<String> },

    /// Required attributes are missing
    #[error("<{element}> is missing required attributes: {}", .missing.join(", "))]
    MissingAttributes { element: String, missing: Vec<String> },

    /// Input document is not well-formed XML
    #[error("XML parse error: {0}")]
    Xml(String),

    /// Writing failed
    #[error("XML write error: {0}")]
    Write(String),

    /// No process-wide registry has been installed
    #[error("No element registry installed")]
    RegistryNotInstalled,

    /// A process-wide registry is already installed
    #[error("An element registry is already installed")]
    AlreadyInstalled,
}

pub type Result<T> = std::result::Result<T, DocumentError>;
