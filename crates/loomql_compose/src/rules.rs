//! Validation rules.
//!
//! Rules run over the folded graph (and, for directive usage, back over
//! the parsed documents, since applied directives are not folded into
//! graph entries). Every rule appends to the shared violation list and
//! none of them stop early.

use indexmap::IndexMap;
use loomql_core::{FragmentId, Interner, Location};
use loomql_syntax::{ast, DirectiveLocation};

use crate::error::Violation;
use crate::graph::{FieldEntry, TypeEntry, TypeGraph, TypeRef, UnionEntry};
use crate::resolver::ResolverMap;

/// Runs every graph rule, collecting violations in order: dangling
/// references, interface conformance, empty unions, root bindings, then
/// directive usage per fragment.
pub fn validate(
    graph: &TypeGraph,
    documents: &[ast::Document],
    interner: &Interner,
    violations: &mut Vec<Violation>,
) {
    let mut checker = Checker {
        graph,
        interner,
        violations,
    };
    checker.check_type_references();
    checker.check_interface_conformance();
    checker.check_unions();
    checker.check_roots();
    for (index, document) in documents.iter().enumerate() {
        checker.check_directive_usage(FragmentId::new(index as u32), document);
    }
}

/// Rejects resolver map entries that name a type or field the schema
/// does not declare. Reported in key order so the output does not
/// depend on map iteration order.
pub fn check_resolver_targets(
    graph: &TypeGraph,
    resolvers: &ResolverMap,
    violations: &mut Vec<Violation>,
) {
    let mut unknown: Vec<String> = Vec::new();
    for (type_name, field_name) in resolvers.targets() {
        let fields = match graph.get_type(type_name) {
            Some(TypeEntry::Object(obj)) => Some(&obj.fields),
            Some(TypeEntry::Interface(iface)) => Some(&iface.fields),
            _ => None,
        };
        let known = fields.is_some_and(|fields| fields.contains_key(field_name));
        if !known {
            unknown.push(format!("{type_name}.{field_name}"));
        }
    }
    unknown.sort();
    for key in unknown {
        violations.push(Violation::UnknownResolverTarget { key });
    }
}

struct Checker<'a> {
    graph: &'a TypeGraph,
    interner: &'a Interner,
    violations: &'a mut Vec<Violation>,
}

impl Checker<'_> {
    fn check_type_references(&mut self) {
        for (name, entry) in self.graph.types() {
            match entry {
                TypeEntry::Object(obj) => {
                    self.check_fields(name, &obj.fields);
                    self.check_implements(name, &obj.implements, entry.location());
                }
                TypeEntry::Interface(iface) => {
                    self.check_fields(name, &iface.fields);
                    self.check_implements(name, &iface.implements, entry.location());
                }
                TypeEntry::Union(un) => self.check_members(un),
                TypeEntry::InputObject(input) => {
                    for field in input.fields.values() {
                        self.check_reference(
                            field.ty.named_type(),
                            format!("input field `{name}.{}`", field.name),
                            entry.location(),
                        );
                    }
                }
                TypeEntry::Enum(_) | TypeEntry::Scalar(_) => {}
            }
        }

        for (name, directive) in self.graph.directives() {
            if directive.builtin {
                continue;
            }
            for arg in directive.arguments.values() {
                self.check_reference(
                    arg.ty.named_type(),
                    format!("argument `@{name}({}:)`", arg.name),
                    directive.location,
                );
            }
        }

        self.check_root_binding("query", self.graph.query_type.as_deref());
        self.check_root_binding("mutation", self.graph.mutation_type.as_deref());
        self.check_root_binding("subscription", self.graph.subscription_type.as_deref());
    }

    fn check_fields(&mut self, owner: &str, fields: &IndexMap<String, FieldEntry>) {
        for field in fields.values() {
            self.check_reference(
                field.ty.named_type(),
                format!("field `{owner}.{}`", field.name),
                field.location,
            );
            for arg in field.arguments.values() {
                self.check_reference(
                    arg.ty.named_type(),
                    format!("argument `{owner}.{}({}:)`", field.name, arg.name),
                    field.location,
                );
            }
        }
    }

    fn check_reference(&mut self, name: &str, referenced_by: String, location: Option<Location>) {
        if self.graph.get_type(name).is_none() {
            self.violations.push(Violation::UndefinedTypeReference {
                name: name.to_string(),
                referenced_by,
                problem: "which is not declared".to_string(),
                location,
            });
        }
    }

    fn check_implements(
        &mut self,
        owner: &str,
        implements: &[String],
        location: Option<Location>,
    ) {
        for interface in implements {
            let problem = match self.graph.get_type(interface) {
                Some(TypeEntry::Interface(_)) => continue,
                Some(_) => "which is not an interface",
                None => "which is not declared",
            };
            self.violations.push(Violation::UndefinedTypeReference {
                name: interface.clone(),
                referenced_by: format!("type `{owner}`"),
                problem: problem.to_string(),
                location,
            });
        }
    }

    fn check_members(&mut self, un: &UnionEntry) {
        for member in &un.members {
            let problem = match self.graph.get_type(member) {
                Some(TypeEntry::Object(_)) => continue,
                Some(_) => "which is not an object type",
                None => "which is not declared",
            };
            self.violations.push(Violation::UndefinedTypeReference {
                name: member.clone(),
                referenced_by: format!("union `{}`", un.name),
                problem: problem.to_string(),
                location: un.location,
            });
        }
    }

    fn check_root_binding(&mut self, operation: &str, target: Option<&str>) {
        let Some(target) = target else { return };
        let problem = match self.graph.get_type(target) {
            Some(TypeEntry::Object(_)) => return,
            Some(_) => "which is not an object type",
            None => "which is not declared",
        };
        self.violations.push(Violation::UndefinedTypeReference {
            name: target.to_string(),
            referenced_by: format!("schema {operation} binding"),
            problem: problem.to_string(),
            location: self.graph.schema_location,
        });
    }

    fn check_interface_conformance(&mut self) {
        for (_, entry) in self.graph.types() {
            let (type_name, fields, implements) = match entry {
                TypeEntry::Object(obj) => (obj.name.as_str(), &obj.fields, &obj.implements),
                TypeEntry::Interface(iface) => {
                    (iface.name.as_str(), &iface.fields, &iface.implements)
                }
                _ => continue,
            };
            for interface_name in implements {
                let Some(TypeEntry::Interface(iface)) = self.graph.get_type(interface_name)
                else {
                    // The reference rule already reported this target.
                    continue;
                };
                for required in iface.fields.values() {
                    match fields.get(&required.name) {
                        None => self.violations.push(
                            Violation::IncompleteInterfaceImplementation {
                                type_name: type_name.to_string(),
                                interface: interface_name.clone(),
                                reason: format!(
                                    "missing field `{}: {}`",
                                    required.name, required.ty
                                ),
                                location: entry.location(),
                            },
                        ),
                        Some(actual) if !satisfies(self.graph, &actual.ty, &required.ty) => {
                            self.violations.push(
                                Violation::IncompleteInterfaceImplementation {
                                    type_name: type_name.to_string(),
                                    interface: interface_name.clone(),
                                    reason: format!(
                                        "field `{}` has type `{}` but the interface requires `{}`",
                                        required.name, actual.ty, required.ty
                                    ),
                                    location: actual.location,
                                },
                            );
                        }
                        Some(_) => {}
                    }
                }
            }
        }
    }

    fn check_unions(&mut self) {
        for (_, entry) in self.graph.types() {
            if let TypeEntry::Union(un) = entry {
                if un.members.is_empty() {
                    self.violations.push(Violation::EmptyUnion {
                        name: un.name.clone(),
                        location: un.location,
                    });
                }
            }
        }
    }

    fn check_roots(&mut self) {
        if self.graph.query_type.is_none() {
            self.violations.push(Violation::MissingQueryType);
        }
    }

    fn check_directive_usage(&mut self, fragment: FragmentId, document: &ast::Document) {
        for definition in &document.definitions {
            match definition {
                ast::Definition::Schema(schema) => {
                    self.check_applied(fragment, &schema.directives, DirectiveLocation::Schema);
                }
                ast::Definition::Type(def) => self.check_type_directives(fragment, def),
                ast::Definition::Extension(ext) => self.check_extension_directives(fragment, ext),
                ast::Definition::Directive(def) => {
                    self.check_argument_directives(fragment, &def.arguments);
                }
            }
        }
    }

    fn check_type_directives(&mut self, fragment: FragmentId, def: &ast::TypeDefinition) {
        match def {
            ast::TypeDefinition::Object(obj) => {
                self.check_applied(fragment, &obj.directives, DirectiveLocation::Object);
                self.check_field_directives(fragment, &obj.fields);
            }
            ast::TypeDefinition::Interface(iface) => {
                self.check_applied(fragment, &iface.directives, DirectiveLocation::Interface);
                self.check_field_directives(fragment, &iface.fields);
            }
            ast::TypeDefinition::Union(un) => {
                self.check_applied(fragment, &un.directives, DirectiveLocation::Union);
            }
            ast::TypeDefinition::Enum(en) => {
                self.check_applied(fragment, &en.directives, DirectiveLocation::Enum);
                for value in &en.values {
                    self.check_applied(fragment, &value.directives, DirectiveLocation::EnumValue);
                }
            }
            ast::TypeDefinition::Input(input) => {
                self.check_applied(fragment, &input.directives, DirectiveLocation::InputObject);
                for field in &input.fields {
                    self.check_applied(
                        fragment,
                        &field.directives,
                        DirectiveLocation::InputFieldDefinition,
                    );
                }
            }
            ast::TypeDefinition::Scalar(scalar) => {
                self.check_applied(fragment, &scalar.directives, DirectiveLocation::Scalar);
            }
        }
    }

    fn check_extension_directives(&mut self, fragment: FragmentId, ext: &ast::TypeExtension) {
        match ext {
            ast::TypeExtension::Object(x) => {
                self.check_applied(fragment, &x.directives, DirectiveLocation::Object);
                self.check_field_directives(fragment, &x.fields);
            }
            ast::TypeExtension::Interface(x) => {
                self.check_applied(fragment, &x.directives, DirectiveLocation::Interface);
                self.check_field_directives(fragment, &x.fields);
            }
            ast::TypeExtension::Union(x) => {
                self.check_applied(fragment, &x.directives, DirectiveLocation::Union);
            }
            ast::TypeExtension::Enum(x) => {
                self.check_applied(fragment, &x.directives, DirectiveLocation::Enum);
                for value in &x.values {
                    self.check_applied(fragment, &value.directives, DirectiveLocation::EnumValue);
                }
            }
            ast::TypeExtension::Input(x) => {
                self.check_applied(fragment, &x.directives, DirectiveLocation::InputObject);
                for field in &x.fields {
                    self.check_applied(
                        fragment,
                        &field.directives,
                        DirectiveLocation::InputFieldDefinition,
                    );
                }
            }
        }
    }

    fn check_field_directives(&mut self, fragment: FragmentId, fields: &[ast::FieldDefinition]) {
        for field in fields {
            self.check_applied(fragment, &field.directives, DirectiveLocation::FieldDefinition);
            self.check_argument_directives(fragment, &field.arguments);
        }
    }

    fn check_argument_directives(
        &mut self,
        fragment: FragmentId,
        arguments: &[ast::InputValueDefinition],
    ) {
        for arg in arguments {
            self.check_applied(fragment, &arg.directives, DirectiveLocation::ArgumentDefinition);
        }
    }

    fn check_applied(
        &mut self,
        fragment: FragmentId,
        directives: &[ast::Directive],
        placement: DirectiveLocation,
    ) {
        for directive in directives {
            let name = self.interner.get(directive.name.value);
            let location = Some(Location::new(fragment, directive.span));
            match self.graph.get_directive(&name) {
                None => self
                    .violations
                    .push(Violation::UndefinedDirective { name, location }),
                Some(entry) if !entry.locations.contains(&placement) => {
                    self.violations.push(Violation::MisplacedDirective {
                        name,
                        placement,
                        location,
                    });
                }
                Some(_) => {}
            }
        }
    }
}

/// Whether `actual` may stand in where `required` is demanded.
///
/// Mirrors the GraphQL covariance rule: equal types, stripping
/// non-null on the actual side only, element-wise for lists, and for
/// named types an object standing in for a union it belongs to or a
/// type standing in for an interface it implements.
fn satisfies(graph: &TypeGraph, actual: &TypeRef, required: &TypeRef) -> bool {
    if actual == required {
        return true;
    }
    match (actual, required) {
        (TypeRef::NonNull(a), TypeRef::NonNull(r)) => satisfies(graph, a, r),
        (TypeRef::NonNull(a), _) => satisfies(graph, a, required),
        (TypeRef::List(a), TypeRef::List(r)) => satisfies(graph, a, r),
        (TypeRef::Named(a), TypeRef::Named(r)) => match graph.get_type(r) {
            Some(TypeEntry::Union(un)) => un.members.iter().any(|m| m == a),
            Some(TypeEntry::Interface(_)) => match graph.get_type(a) {
                Some(TypeEntry::Object(obj)) => obj.implements.iter().any(|i| i == r),
                Some(TypeEntry::Interface(iface)) => iface.implements.iter().any(|i| i == r),
                _ => false,
            },
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fold::fold;
    use crate::graph::DeclarationKind;

    fn check(sources: &[&str]) -> Vec<Violation> {
        let interner = Interner::new();
        let documents: Vec<_> = sources
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let result = loomql_syntax::parse(s, FragmentId::new(i as u32), &interner);
                assert!(
                    !result.diagnostics.has_errors(),
                    "fixture should parse cleanly"
                );
                result.document
            })
            .collect();
        let (graph, mut violations) = fold(&documents, &interner);
        validate(&graph, &documents, &interner, &mut violations);
        violations
    }

    #[test]
    fn test_undefined_field_type() {
        let violations = check(&["type Query { foo: Missing }"]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::UndefinedTypeReference { name, referenced_by, .. }
                if name == "Missing" && referenced_by == "field `Query.foo`"
        ));
    }

    #[test]
    fn test_undefined_argument_type() {
        let violations = check(&["type Query { find(filter: Missing): String }"]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::UndefinedTypeReference { referenced_by, .. }
                if referenced_by == "argument `Query.find(filter:)`"
        ));
    }

    #[test]
    fn test_undefined_type_behind_wrappers() {
        let violations = check(&["type Query { foo: [Missing!]! }"]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::UndefinedTypeReference { name, .. } if name == "Missing"
        ));
    }

    #[test]
    fn test_implements_undeclared_interface() {
        let violations = check(&["type Query implements Fooer { foo: String }"]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::UndefinedTypeReference { name, referenced_by, problem, .. }
                if name == "Fooer"
                    && referenced_by == "type `Query`"
                    && problem == "which is not declared"
        ));
    }

    #[test]
    fn test_implements_non_interface() {
        let violations = check(&[
            "type A { x: Int }",
            "type Query implements A { x: Int }",
        ]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::UndefinedTypeReference { problem, .. } if problem == "which is not an interface"
        ));
    }

    #[test]
    fn test_union_member_not_object() {
        let violations = check(&[
            "type Query { ok: Boolean }",
            "interface Fooer { foo: String }",
            "union U = Fooer",
        ]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::UndefinedTypeReference { name, referenced_by, problem, .. }
                if name == "Fooer"
                    && referenced_by == "union `U`"
                    && problem == "which is not an object type"
        ));
    }

    #[test]
    fn test_missing_interface_field() {
        let violations = check(&[
            "interface Fooer { foo: String }",
            "type Query implements Fooer { other: Int }",
        ]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::IncompleteInterfaceImplementation { type_name, interface, reason, .. }
                if type_name == "Query"
                    && interface == "Fooer"
                    && reason == "missing field `foo: String`"
        ));
    }

    #[test]
    fn test_incompatible_interface_field() {
        let violations = check(&[
            "interface Fooer { foo: String }",
            "type Query implements Fooer { foo: Int }",
        ]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::IncompleteInterfaceImplementation { reason, .. }
                if reason == "field `foo` has type `Int` but the interface requires `String`"
        ));
    }

    #[test]
    fn test_nonnull_narrowing_satisfies_interface() {
        let violations = check(&[
            "interface Fooer { foo: String }",
            "type Query implements Fooer { foo: String! }",
        ]);
        assert!(violations.is_empty());
    }

    #[test]
    fn test_nonnull_widening_rejected() {
        let violations = check(&[
            "interface Fooer { foo: String! }",
            "type Query implements Fooer { foo: String }",
        ]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::IncompleteInterfaceImplementation { .. }
        ));
    }

    #[test]
    fn test_union_member_satisfies_interface() {
        let violations = check(&[
            "type A { x: Int }",
            "type B { y: Int }",
            "union Thing = A | B",
            "interface HasThing { thing: Thing }",
            "type Query implements HasThing { thing: A }",
        ]);
        assert!(violations.is_empty());
    }

    #[test]
    fn test_list_covariance() {
        let violations = check(&[
            "interface Node { id: ID }",
            "type A implements Node { id: ID }",
            "interface Listing { items: [Node] }",
            "type Query implements Listing { items: [A] }",
        ]);
        assert!(violations.is_empty());
    }

    #[test]
    fn test_empty_union() {
        let violations = check(&["type Query { ok: Boolean } union Foo"]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::EmptyUnion { name, location: Some(_) } if name == "Foo"
        ));
    }

    #[test]
    fn test_missing_query_type() {
        let violations = check(&["type Mut { x: Int }"]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(&violations[0], Violation::MissingQueryType));
    }

    #[test]
    fn test_schema_binding_to_missing_type() {
        let violations = check(&["schema { query: Nope }"]);
        // The dangling binding is the whole story: no missing-root
        // violation on top of it.
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::UndefinedTypeReference { name, referenced_by, .. }
                if name == "Nope" && referenced_by == "schema query binding"
        ));
    }

    #[test]
    fn test_schema_binding_to_non_object() {
        let violations = check(&[
            "schema { query: Thing }",
            "type A { x: Int }",
            "union Thing = A",
        ]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::UndefinedTypeReference { referenced_by, problem, .. }
                if referenced_by == "schema query binding"
                    && problem == "which is not an object type"
        ));
    }

    #[test]
    fn test_undefined_directive() {
        let violations = check(&["type Query @nope { ok: Boolean }"]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::UndefinedDirective { name, location: Some(_) } if name == "nope"
        ));
    }

    #[test]
    fn test_misplaced_directive() {
        let violations = check(&[
            "directive @foo on SCHEMA | UNION",
            "type Query @foo { ok: Boolean }",
        ]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::MisplacedDirective { name, placement: DirectiveLocation::Object, .. }
                if name == "foo"
        ));
    }

    #[test]
    fn test_directive_on_allowed_placement() {
        let violations = check(&[
            "directive @foo on SCHEMA | UNION",
            "type Query { ok: Boolean }",
            "union U @foo = Query",
        ]);
        assert!(violations.is_empty());
    }

    #[test]
    fn test_builtin_deprecated_is_usable() {
        let violations = check(&[
            r#"type Query { old: String @deprecated(reason: "gone") new: String }"#,
        ]);
        assert!(violations.is_empty());
    }

    #[test]
    fn test_deprecated_misplaced_on_type() {
        let violations = check(&["type Query @deprecated { ok: Boolean }"]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::MisplacedDirective { name, placement: DirectiveLocation::Object, .. }
                if name == "deprecated"
        ));
    }

    #[test]
    fn test_directive_usage_in_extension() {
        let violations = check(&[
            "type Query { ok: Boolean }",
            "extend type Query @mystery { more: Int }",
        ]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::UndefinedDirective { name, .. } if name == "mystery"
        ));
    }

    #[test]
    fn test_resolver_targets_unknown_are_sorted() {
        let interner = Interner::new();
        let result = loomql_syntax::parse(
            "type Query { ok: Boolean }",
            FragmentId::new(0),
            &interner,
        );
        let (graph, mut violations) = fold(&[result.document], &interner);
        assert!(violations.is_empty());

        let mut resolvers = ResolverMap::new();
        resolvers.register_fn("Zed", "x", |_, _| Ok(serde_json::Value::Null));
        resolvers.register_fn("Alpha", "y", |_, _| Ok(serde_json::Value::Null));
        resolvers.register_fn("Query", "ok", |_, _| Ok(serde_json::Value::Bool(true)));
        check_resolver_targets(&graph, &resolvers, &mut violations);

        let keys: Vec<_> = violations
            .iter()
            .map(|v| match v {
                Violation::UnknownResolverTarget { key } => key.clone(),
                other => panic!("unexpected violation: {other}"),
            })
            .collect();
        assert_eq!(keys, vec!["Alpha.y".to_string(), "Zed.x".to_string()]);
    }

    #[test]
    fn test_resolver_target_on_missing_field() {
        let interner = Interner::new();
        let result = loomql_syntax::parse(
            "type Query { ok: Boolean }",
            FragmentId::new(0),
            &interner,
        );
        let (graph, mut violations) = fold(&[result.document], &interner);

        let mut resolvers = ResolverMap::new();
        resolvers.register_fn("Query", "nope", |_, _| Ok(serde_json::Value::Null));
        check_resolver_targets(&graph, &resolvers, &mut violations);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::UnknownResolverTarget { key } if key == "Query.nope"
        ));
    }

    #[test]
    fn test_duplicate_and_reference_reported_together() {
        let violations = check(&[
            "type Query { foo: Missing }",
            "type Query { bar: Int }",
        ]);
        assert_eq!(violations.len(), 2);
        assert!(matches!(
            &violations[0],
            Violation::DuplicateDeclaration { kind: DeclarationKind::Object, .. }
        ));
        assert!(matches!(
            &violations[1],
            Violation::UndefinedTypeReference { .. }
        ));
    }
}
