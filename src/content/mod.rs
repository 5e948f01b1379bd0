//! Content-model tree engine
//!
//! Pipeline:
//! 1. **Compile**: `GrammarCompiler` turns a schema fragment into an
//!    immutable `GrammarNode` tree (once per type, memoized)
//! 2. **Instantiate**: every document node clones its type's grammar into a
//!    `ContainerTree`
//! 3. **Attach**: `add` / `remove` / `replace` mutate the tree; queries report
//!    which tags fit now (`possible_names`) and what is still missing
//!    (`required_names`)
//! 4. **Resolve**: before writing, greedy choice commitments may be re-laid
//!    out (`resolve_choices`)

pub mod attach;
pub mod compiler;
pub mod errors;
pub mod reflow;
pub mod requirements;
pub mod tree;

pub use compiler::{FragmentKind, FragmentSource, GrammarCompiler, SchemaFragment};
pub use errors::{CompileError, CompileResult, ContentError, ContentResult};
pub use tree::{ContainerTree, Leaf, LeafId, NodeId, RepetitionSnapshot, TreeSnapshot};
