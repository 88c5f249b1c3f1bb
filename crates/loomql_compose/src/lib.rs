//! Schema composition for loomql.
//!
//! This crate turns ordered SDL fragments and a resolver map into one
//! validated, immutable schema:
//! - `compose`: The entry point and builder
//! - `fold`: Two-pass folding of declarations and extensions
//! - `graph`: The folded type graph and its entries
//! - `rules`: Validation rules over the graph
//! - `resolver`: Resolver map and resolver traits
//! - `schema`: The executable schema handed back on success
//! - `print`: Rendering a graph back to SDL
//! - `error`: Violations and the composition error

pub mod compose;
pub mod error;
pub mod fold;
pub mod graph;
pub mod print;
pub mod resolver;
pub mod rules;
pub mod schema;

pub use compose::{compose, Composer};
pub use error::{ComposeError, Violation};
pub use fold::fold;
pub use graph::{
    DeclarationKind, DirectiveEntry, EnumEntry, EnumValueEntry, FieldEntry, InputFieldEntry,
    InputObjectEntry, InterfaceEntry, ObjectEntry, ScalarEntry, TypeEntry, TypeGraph, TypeRef,
    UnionEntry,
};
pub use print::render;
pub use resolver::{
    AsyncFnResolver, BoxedResolver, FnResolver, Resolver, ResolverArgs, ResolverError,
    ResolverFuture, ResolverMap, ResolverResult,
};
pub use rules::{check_resolver_targets, validate};
pub use schema::ExecutableSchema;
