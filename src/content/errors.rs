//! Error types for grammar compilation and child attachment
//!
//! `CompileError` is fatal for the schema type being compiled and is raised
//! once at schema load. `ContentError` is recoverable: every failing
//! operation leaves the container tree exactly as it was.

use thiserror::Error;

/// Fatal grammar compilation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Schema text could not be parsed
    #[error("Invalid schema XML: {0}")]
    Xml(String),

    /// `xs:group ref` names a group that is not defined
    #[error("Unresolved group reference: {0}")]
    UnresolvedGroup(String),

    /// A complex type name is not defined
    #[error("Unresolved type: {0}")]
    UnresolvedType(String),

    /// Group references form a cycle (path lists the groups involved)
    #[error("Cyclic group reference: {}", .0.join(" -> "))]
    CyclicGroup(Vec<String>),

    /// `minOccurs` / `maxOccurs` is unparsable or min exceeds max
    #[error("Invalid {attribute}: {value}")]
    InvalidOccurs { attribute: String, value: String },

    /// Element declaration without `name` (or resolvable `ref`)
    #[error("Element declaration without a name")]
    MissingElementName,

    /// Schema construct the engine does not model
    #[error("Unsupported schema construct: {0}")]
    UnsupportedConstruct(String),
}

/// Recoverable errors from the attachment engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    /// No reachable leaf accepts the tag
    #[error("No slot for <{tag}> in this content model")]
    NoMatchingSlot { tag: String },

    /// Leaves for the tag exist but are all full
    #[error("No free slot for <{tag}>: all matching slots hold their maximum of {max}")]
    SlotSaturated { tag: String, max: u32 },

    /// `remove` referenced a child that is not attached
    #[error("Child is not attached to this container")]
    NotAttached,

    /// `replace` referenced a child that is not attached
    #[error("Child to replace was not found")]
    NotFound,
}

impl ContentError {
    /// True for `NoMatchingSlot` and its saturated subcase
    pub fn is_no_slot(&self) -> bool {
        matches!(self, ContentError::NoMatchingSlot { .. } | ContentError::SlotSaturated { .. })
    }
}

pub type CompileResult<T> = std::result::Result<T, CompileError>;
pub type ContentResult<T> = std::result::Result<T, ContentError>;
