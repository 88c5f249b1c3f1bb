//! The composed, immutable schema.

use crate::graph::{DirectiveEntry, ObjectEntry, TypeEntry, TypeGraph};
use crate::print;
use crate::resolver::{Resolver, ResolverMap};

/// A validated schema with its resolvers attached.
///
/// Only [`compose`](crate::compose) produces one, so holding an
/// `ExecutableSchema` means every reference resolved, every interface
/// obligation was met, and every resolver targets a declared field.
/// The schema never changes after composition.
#[derive(Debug)]
pub struct ExecutableSchema {
    graph: TypeGraph,
    resolvers: ResolverMap,
}

impl ExecutableSchema {
    pub(crate) fn new(graph: TypeGraph, resolvers: ResolverMap) -> Self {
        Self { graph, resolvers }
    }

    /// The underlying type graph.
    pub fn graph(&self) -> &TypeGraph {
        &self.graph
    }

    /// Looks up a type by name, built-ins included.
    pub fn get_type(&self, name: &str) -> Option<&TypeEntry> {
        self.graph.get_type(name)
    }

    /// Looks up a directive declaration by name, built-ins included.
    pub fn directive(&self, name: &str) -> Option<&DirectiveEntry> {
        self.graph.get_directive(name)
    }

    /// The object serving query operations.
    pub fn query_type(&self) -> Option<&ObjectEntry> {
        self.root_object(self.graph.query_type.as_deref())
    }

    /// The object serving mutation operations, if bound.
    pub fn mutation_type(&self) -> Option<&ObjectEntry> {
        self.root_object(self.graph.mutation_type.as_deref())
    }

    /// The object serving subscription operations, if bound.
    pub fn subscription_type(&self) -> Option<&ObjectEntry> {
        self.root_object(self.graph.subscription_type.as_deref())
    }

    /// The resolver registered for `type_name.field_name`, if any.
    pub fn resolver(&self, type_name: &str, field_name: &str) -> Option<&dyn Resolver> {
        self.resolvers.get(type_name, field_name)
    }

    /// Concrete object types reachable from a union or interface.
    pub fn possible_types(&self, name: &str) -> Vec<&str> {
        self.graph.possible_types(name)
    }

    /// Renders the schema back to SDL.
    pub fn to_sdl(&self) -> String {
        print::render(&self.graph)
    }

    fn root_object(&self, name: Option<&str>) -> Option<&ObjectEntry> {
        match self.graph.get_type(name?) {
            Some(TypeEntry::Object(obj)) => Some(obj),
            _ => None,
        }
    }
}
