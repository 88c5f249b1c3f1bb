//! Composition entry point.

use loomql_core::{Diagnostic, FragmentId, Interner};
use tracing::debug;

use crate::error::ComposeError;
use crate::fold;
use crate::resolver::{ResolverArgs, ResolverMap, ResolverResult};
use crate::rules;
use crate::schema::ExecutableSchema;

/// Composes ordered SDL fragments and a resolver map into an
/// executable schema.
///
/// Runs once, synchronously: parse every fragment, fold declarations
/// and extensions into one graph, then validate. Problems never stop
/// the run early; the error carries every syntax error or every
/// violation found across all fragments.
pub fn compose<S: AsRef<str>>(
    fragments: &[S],
    resolvers: ResolverMap,
) -> Result<ExecutableSchema, ComposeError> {
    let interner = Interner::new();

    let mut documents = Vec::with_capacity(fragments.len());
    let mut syntax_errors: Vec<Diagnostic> = Vec::new();
    for (index, fragment) in fragments.iter().enumerate() {
        let result = loomql_syntax::parse(
            fragment.as_ref(),
            FragmentId::new(index as u32),
            &interner,
        );
        syntax_errors.extend(result.diagnostics.errors().cloned());
        documents.push(result.document);
    }
    if !syntax_errors.is_empty() {
        return Err(ComposeError::Syntax {
            diagnostics: syntax_errors,
        });
    }

    let (graph, mut violations) = fold::fold(&documents, &interner);
    rules::validate(&graph, &documents, &interner, &mut violations);
    rules::check_resolver_targets(&graph, &resolvers, &mut violations);
    if !violations.is_empty() {
        return Err(ComposeError::Invalid { violations });
    }

    debug!(
        fragments = fragments.len(),
        types = graph.types.len(),
        directives = graph.directives.len(),
        resolvers = resolvers.len(),
        "composed schema"
    );
    Ok(ExecutableSchema::new(graph, resolvers))
}

/// Builder-style front for [`compose`].
#[derive(Debug, Default)]
pub struct Composer {
    fragments: Vec<String>,
    resolvers: ResolverMap,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment. Order matters only for reporting: later
    /// fragments may extend or collide with earlier ones either way.
    #[must_use]
    pub fn fragment(mut self, source: impl Into<String>) -> Self {
        self.fragments.push(source.into());
        self
    }

    /// Replaces the resolver map wholesale.
    #[must_use]
    pub fn resolvers(mut self, resolvers: ResolverMap) -> Self {
        self.resolvers = resolvers;
        self
    }

    /// Registers a single synchronous resolver.
    #[must_use]
    pub fn resolver<F>(mut self, type_name: &str, field_name: &str, f: F) -> Self
    where
        F: Fn(&serde_json::Value, &ResolverArgs) -> ResolverResult + Send + Sync + 'static,
    {
        self.resolvers.register_fn(type_name, field_name, f);
        self
    }

    pub fn finish(self) -> Result<ExecutableSchema, ComposeError> {
        compose(&self.fragments, self.resolvers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_minimal() {
        let schema = compose(&["type Query { ok: Boolean }"], ResolverMap::new())
            .expect("should compose");
        assert!(schema.query_type().is_some());
        assert!(schema.get_type("Boolean").is_some());
    }

    #[test]
    fn test_compose_collects_syntax_errors_across_fragments() {
        let err = compose(
            &["type Query { ok: Boolean", "type ???"],
            ResolverMap::new(),
        )
        .expect_err("should fail to parse");
        match err {
            ComposeError::Syntax { diagnostics } => {
                assert!(diagnostics.len() >= 2);
                assert!(diagnostics
                    .iter()
                    .any(|d| d.primary_location().map(|l| l.fragment) == Some(FragmentId::new(1))));
            }
            other => panic!("expected syntax error, got {other}"),
        }
    }

    #[test]
    fn test_compose_reports_violations_not_schema() {
        let err = compose(&["type Query { foo: Missing }"], ResolverMap::new())
            .expect_err("should fail validation");
        assert_eq!(err.violations().len(), 1);
    }

    #[test]
    fn test_composer_builder() {
        let schema = Composer::new()
            .fragment("type Query { greeting: String }")
            .resolver("Query", "greeting", |_, _| {
                Ok(serde_json::Value::String("hello".into()))
            })
            .finish()
            .expect("should compose");
        assert!(schema.resolver("Query", "greeting").is_some());
        assert!(schema.resolver("Query", "missing").is_none());
    }

    #[test]
    fn test_empty_input_is_missing_query() {
        let err = compose::<&str>(&[], ResolverMap::new()).expect_err("should fail");
        assert_eq!(err.violations().len(), 1);
    }
}
