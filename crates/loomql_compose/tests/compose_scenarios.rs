//! Integration tests for schema composition.

use loomql_compose::{
    compose, ComposeError, DeclarationKind, ResolverArgs, ResolverMap, TypeEntry, Violation,
};

const QUERY: &str = "type Query { foo: String }";
const DIRECTIVE: &str = "directive @foo on SCHEMA | UNION";
const INTERFACE: &str = "interface Fooer { foo: String }";
const MUT: &str = "type Mut implements Fooer { foo: String }";
const EXTEND_MUT: &str = "extend type Mut implements Fooer { bar: String }";

/// Test that an empty union is the only problem reported for an
/// otherwise valid set of fragments.
#[test]
fn test_empty_union_rejected() {
    let err = compose(
        &[QUERY, DIRECTIVE, INTERFACE, MUT, EXTEND_MUT, "union Foo"],
        ResolverMap::new(),
    )
    .expect_err("empty union should fail");

    let violations = err.violations();
    assert_eq!(violations.len(), 1);
    assert!(matches!(
        &violations[0],
        Violation::EmptyUnion { name, .. } if name == "Foo"
    ));
}

/// Test that one fragment holding every definition behaves no
/// differently from many.
#[test]
fn test_all_definitions_in_one_fragment() {
    let block = r"
        type Query {
            foo: String
        }

        directive @foo on SCHEMA | UNION

        interface Fooer {
            foo: String
        }

        type Mut implements Fooer {
            foo: String
        }

        extend type Mut implements Fooer {
            bar: String
        }

        union Foo
    ";

    let err = compose(&[block], ResolverMap::new()).expect_err("empty union should fail");
    let violations = err.violations();
    assert_eq!(violations.len(), 1);
    assert!(matches!(
        &violations[0],
        Violation::EmptyUnion { name, .. } if name == "Foo"
    ));
}

/// Test that giving the union a member makes the same fragments
/// compose, with the extension folded in.
#[test]
fn test_populated_union_composes() {
    let schema = compose(
        &[QUERY, DIRECTIVE, INTERFACE, MUT, EXTEND_MUT, "union Foo = Mut"],
        ResolverMap::new(),
    )
    .expect("should compose");

    let Some(TypeEntry::Object(mut_type)) = schema.get_type("Mut") else {
        panic!("expected Mut to be an object type");
    };
    assert!(mut_type.fields.contains_key("foo"));
    assert!(mut_type.fields.contains_key("bar"));
    assert_eq!(mut_type.implements, vec!["Fooer".to_string()]);
    assert_eq!(schema.possible_types("Foo"), vec!["Mut"]);
    assert_eq!(schema.possible_types("Fooer"), vec!["Mut"]);
}

/// Test composing without the extension: the extended field is gone,
/// everything else stands.
#[test]
fn test_compose_without_extension() {
    let schema = compose(
        &[QUERY, DIRECTIVE, INTERFACE, MUT, "union Foo = Mut"],
        ResolverMap::new(),
    )
    .expect("should compose");

    let Some(TypeEntry::Object(mut_type)) = schema.get_type("Mut") else {
        panic!("expected Mut to be an object type");
    };
    assert!(mut_type.fields.contains_key("foo"));
    assert!(!mut_type.fields.contains_key("bar"));
}

/// Test that an extension naming an undeclared type is the only
/// problem reported, and nothing of it leaks into the graph.
#[test]
fn test_dangling_extension_rejected() {
    let err = compose(
        &[
            QUERY,
            DIRECTIVE,
            INTERFACE,
            MUT,
            "extend type Other implements Fooer { bar: String }",
            "union Foo = Mut",
        ],
        ResolverMap::new(),
    )
    .expect_err("dangling extension should fail");

    let violations = err.violations();
    assert_eq!(violations.len(), 1);
    assert!(matches!(
        &violations[0],
        Violation::DanglingExtension { kind: DeclarationKind::Object, name, .. }
            if name == "Other"
    ));
    assert_eq!(
        violations[0].to_string(),
        "extend type `Other` does not match any type declaration"
    );
}

/// Test that an extension may arrive before the declaration it
/// extends.
#[test]
fn test_extension_order_is_irrelevant() {
    let forward = compose(&[QUERY, INTERFACE, MUT, EXTEND_MUT], ResolverMap::new())
        .expect("should compose");
    let reversed = compose(&[EXTEND_MUT, QUERY, INTERFACE, MUT], ResolverMap::new())
        .expect("should compose");
    assert_eq!(forward.to_sdl(), reversed.to_sdl());
}

/// Test that an extension may precede its declaration inside a single
/// fragment too.
#[test]
fn test_extension_before_declaration_in_one_fragment() {
    let inline = r"
        extend type Mut implements Fooer {
            bar: String
        }

        type Mut implements Fooer {
            foo: String
        }
    ";
    let schema = compose(&[QUERY, INTERFACE, inline], ResolverMap::new())
        .expect("should compose");

    let Some(TypeEntry::Object(mut_type)) = schema.get_type("Mut") else {
        panic!("expected Mut to be an object type");
    };
    assert!(mut_type.fields.contains_key("foo"));
    assert!(mut_type.fields.contains_key("bar"));

    let forward = compose(&[QUERY, INTERFACE, MUT, EXTEND_MUT], ResolverMap::new())
        .expect("should compose");
    assert_eq!(schema.to_sdl(), forward.to_sdl());
}

/// Test that composing the same fragments twice yields identical
/// results.
#[test]
fn test_composition_is_deterministic() {
    let fragments = [QUERY, DIRECTIVE, INTERFACE, MUT, EXTEND_MUT, "union Foo = Mut"];
    let first = compose(&fragments, ResolverMap::new()).expect("should compose");
    let second = compose(&fragments, ResolverMap::new()).expect("should compose");
    assert_eq!(first.graph(), second.graph());
    assert_eq!(first.to_sdl(), second.to_sdl());
}

/// Test that every violation across all fragments lands in one error.
#[test]
fn test_all_violations_reported_together() {
    let err = compose(
        &[
            "type Query { foo: Missing }",
            "union Foo",
            "extend type Other { bar: String }",
            "interface Fooer { foo: String }",
            "type Mut implements Fooer { other: Int }",
        ],
        ResolverMap::new(),
    )
    .expect_err("should fail");

    let violations = err.violations();
    assert_eq!(violations.len(), 4);
    assert!(violations
        .iter()
        .any(|v| matches!(v, Violation::DanglingExtension { .. })));
    assert!(violations
        .iter()
        .any(|v| matches!(v, Violation::UndefinedTypeReference { .. })));
    assert!(violations
        .iter()
        .any(|v| matches!(v, Violation::EmptyUnion { .. })));
    assert!(violations
        .iter()
        .any(|v| matches!(v, Violation::IncompleteInterfaceImplementation { .. })));
}

/// Test that a second declaration of a name is rejected whatever kind
/// it claims to be.
#[test]
fn test_duplicate_declarations_rejected() {
    let err = compose(
        &[QUERY, "type Mut { a: Int }", "union Mut = Query"],
        ResolverMap::new(),
    )
    .expect_err("should fail");

    let violations = err.violations();
    assert_eq!(violations.len(), 1);
    assert!(matches!(
        &violations[0],
        Violation::DuplicateDeclaration { kind: DeclarationKind::Object, name, .. }
            if name == "Mut"
    ));
}

/// Test that directives and types occupy separate namespaces.
#[test]
fn test_directive_and_type_share_a_name() {
    let schema = compose(
        &[QUERY, "directive @Query on FIELD_DEFINITION"],
        ResolverMap::new(),
    )
    .expect("should compose");
    assert!(schema.get_type("Query").is_some());
    assert!(schema.directive("Query").is_some());
}

/// Test explicit root bindings via a schema block.
#[test]
fn test_schema_block_binds_roots() {
    let schema = compose(
        &[
            "schema { query: Root mutation: Mut }",
            "type Root { ok: Boolean }",
            "type Mut { go: Boolean }",
        ],
        ResolverMap::new(),
    )
    .expect("should compose");

    assert_eq!(schema.query_type().map(|t| t.name.as_str()), Some("Root"));
    assert_eq!(schema.mutation_type().map(|t| t.name.as_str()), Some("Mut"));
    assert!(schema.subscription_type().is_none());
}

/// Test that fragments with no query root at all are rejected.
#[test]
fn test_missing_query_root_rejected() {
    let err = compose(&["type Mut { go: Boolean }"], ResolverMap::new())
        .expect_err("should fail");
    let violations = err.violations();
    assert_eq!(violations.len(), 1);
    assert!(matches!(&violations[0], Violation::MissingQueryType));
}

/// Test that directive applications are held to their declared
/// locations.
#[test]
fn test_directive_placement_enforced() {
    let err = compose(
        &[DIRECTIVE, "type Query @foo { foo: String }"],
        ResolverMap::new(),
    )
    .expect_err("@foo is not allowed on objects");
    assert!(matches!(
        &err.violations()[0],
        Violation::MisplacedDirective { name, .. } if name == "foo"
    ));

    let allowed = compose(
        &[DIRECTIVE, QUERY, "type A { x: Int }", "union U @foo = A"],
        ResolverMap::new(),
    );
    assert!(allowed.is_ok());
}

/// Test that resolvers must target declared fields.
#[test]
fn test_unknown_resolver_target_rejected() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "nope", |_, _| Ok(serde_json::Value::Null));

    let err = compose(&[QUERY], resolvers).expect_err("should fail");
    let violations = err.violations();
    assert_eq!(violations.len(), 1);
    assert!(matches!(
        &violations[0],
        Violation::UnknownResolverTarget { key } if key == "Query.nope"
    ));
}

/// Test that a resolver may target a field an extension added.
#[test]
fn test_resolver_on_extended_field() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Mut", "bar", |_, _| Ok(serde_json::Value::Null));

    let schema = compose(&[QUERY, INTERFACE, MUT, EXTEND_MUT], resolvers)
        .expect("should compose");
    assert!(schema.resolver("Mut", "bar").is_some());
    assert!(schema.resolver("Mut", "foo").is_none());
}

/// Test invoking an attached resolver after composition.
#[tokio::test]
async fn test_resolver_invocation() {
    let mut resolvers = ResolverMap::new();
    resolvers.register_fn("Query", "foo", |_, _| {
        Ok(serde_json::Value::String("bar".to_string()))
    });

    let schema = compose(&[QUERY], resolvers).expect("should compose");
    let resolver = schema.resolver("Query", "foo").expect("resolver attached");

    let parent = serde_json::Value::Null;
    let args = ResolverArgs::new();
    let value = resolver.resolve(&parent, &args).await.expect("resolves");
    assert_eq!(value, serde_json::Value::String("bar".to_string()));
}

/// Test that rendered SDL recomposes to the same rendering.
#[test]
fn test_sdl_round_trip() {
    let schema = compose(
        &[QUERY, DIRECTIVE, INTERFACE, MUT, EXTEND_MUT, "union Foo = Mut"],
        ResolverMap::new(),
    )
    .expect("should compose");

    let sdl = schema.to_sdl();
    let again = compose(&[sdl.as_str()], ResolverMap::new())
        .expect("rendered SDL should compose");
    assert_eq!(sdl, again.to_sdl());
}

/// Test that malformed fragments surface as syntax errors rather than
/// violations.
#[test]
fn test_syntax_errors_reported() {
    let err = compose(&["type Query { foo: String", INTERFACE], ResolverMap::new())
        .expect_err("should fail to parse");
    match err {
        ComposeError::Syntax { diagnostics } => assert!(!diagnostics.is_empty()),
        other => panic!("expected syntax error, got {other}"),
    }
}

/// Test the one-line error summary.
#[test]
fn test_error_display_counts_violations() {
    let err = compose(&["type Mut { go: Boolean }", "union Foo"], ResolverMap::new())
        .expect_err("should fail");
    assert_eq!(err.violations().len(), 2);
    assert_eq!(err.to_string(), "schema composition found 2 violation(s)");
}
