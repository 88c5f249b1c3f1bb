//! Fragment folding.
//!
//! Folding runs in two passes over the ordered fragments. Pass 1
//! registers every base declaration; pass 2 applies extensions, which
//! may appear in an earlier fragment than the declaration they extend.
//! Folding always yields a graph; every problem found along the way is
//! collected as a [`Violation`] for the caller to judge.

use indexmap::IndexMap;
use loomql_core::{FragmentId, Interner, Location};
use loomql_syntax::ast;

use crate::error::Violation;
use crate::graph::{
    DeclarationKind, DirectiveEntry, EnumEntry, EnumValueEntry, FieldEntry, InputFieldEntry,
    InputObjectEntry, InterfaceEntry, ObjectEntry, ScalarEntry, TypeEntry, TypeGraph, TypeRef,
    UnionEntry,
};

/// Folds parsed fragments into a type graph.
///
/// Fragment ids are positions in `documents`, matching the ids the
/// documents were parsed under.
pub fn fold(documents: &[ast::Document], interner: &Interner) -> (TypeGraph, Vec<Violation>) {
    let mut folder = Folder {
        graph: TypeGraph::new(),
        interner,
        violations: Vec::new(),
    };

    for (index, document) in documents.iter().enumerate() {
        let fragment = FragmentId::new(index as u32);
        for definition in &document.definitions {
            match definition {
                ast::Definition::Schema(schema) => folder.register_schema(fragment, schema),
                ast::Definition::Type(def) => folder.register_type(fragment, def),
                ast::Definition::Directive(def) => folder.register_directive(fragment, def),
                ast::Definition::Extension(_) => {}
            }
        }
    }

    for (index, document) in documents.iter().enumerate() {
        let fragment = FragmentId::new(index as u32);
        for definition in &document.definitions {
            if let ast::Definition::Extension(ext) = definition {
                folder.apply_extension(fragment, ext);
            }
        }
    }

    folder.finalize();
    (folder.graph, folder.violations)
}

struct Folder<'a> {
    graph: TypeGraph,
    interner: &'a Interner,
    violations: Vec<Violation>,
}

impl Folder<'_> {
    fn register_schema(&mut self, fragment: FragmentId, schema: &ast::SchemaDefinition) {
        let location = Location::new(fragment, schema.span);
        if let Some(previous) = self.graph.schema_location {
            self.violations.push(Violation::DuplicateDeclaration {
                kind: DeclarationKind::Schema,
                name: "schema".to_string(),
                location: Some(location),
                previous: Some(previous),
            });
            return;
        }
        self.graph.schema_location = Some(location);

        for op in &schema.operations {
            let target = Some(self.interner.get(op.type_name.value));
            match op.operation {
                ast::OperationType::Query => self.graph.query_type = target,
                ast::OperationType::Mutation => self.graph.mutation_type = target,
                ast::OperationType::Subscription => self.graph.subscription_type = target,
            }
        }
    }

    fn register_type(&mut self, fragment: FragmentId, def: &ast::TypeDefinition) {
        let name = self.interner.get(def.name().value);
        let location = Location::new(fragment, def.name().span);

        if let Some(existing) = self.graph.types.get(&name) {
            self.violations.push(Violation::DuplicateDeclaration {
                kind: existing.kind(),
                name,
                location: Some(location),
                previous: existing.location(),
            });
            return;
        }

        let entry = match def {
            ast::TypeDefinition::Object(obj) => {
                let mut fields = IndexMap::new();
                merge_fields(
                    self.interner,
                    &mut self.violations,
                    fragment,
                    &name,
                    &obj.fields,
                    &mut fields,
                );
                let mut implements = Vec::new();
                merge_implements(self.interner, &obj.implements, &mut implements);
                TypeEntry::Object(ObjectEntry {
                    name: name.clone(),
                    description: description_of(&obj.description),
                    fields,
                    implements,
                    location: Some(location),
                })
            }
            ast::TypeDefinition::Interface(iface) => {
                let mut fields = IndexMap::new();
                merge_fields(
                    self.interner,
                    &mut self.violations,
                    fragment,
                    &name,
                    &iface.fields,
                    &mut fields,
                );
                let mut implements = Vec::new();
                merge_implements(self.interner, &iface.implements, &mut implements);
                TypeEntry::Interface(InterfaceEntry {
                    name: name.clone(),
                    description: description_of(&iface.description),
                    fields,
                    implements,
                    location: Some(location),
                })
            }
            ast::TypeDefinition::Union(un) => {
                let mut members = Vec::new();
                merge_members(
                    self.interner,
                    &mut self.violations,
                    fragment,
                    &un.members,
                    &mut members,
                );
                TypeEntry::Union(UnionEntry {
                    name: name.clone(),
                    description: description_of(&un.description),
                    members,
                    location: Some(location),
                })
            }
            ast::TypeDefinition::Enum(en) => {
                let mut values = IndexMap::new();
                merge_enum_values(
                    self.interner,
                    &mut self.violations,
                    fragment,
                    &name,
                    &en.values,
                    &mut values,
                );
                TypeEntry::Enum(EnumEntry {
                    name: name.clone(),
                    description: description_of(&en.description),
                    values,
                    location: Some(location),
                })
            }
            ast::TypeDefinition::Input(input) => {
                let mut fields = IndexMap::new();
                merge_input_fields(
                    self.interner,
                    &mut self.violations,
                    fragment,
                    &name,
                    &input.fields,
                    &mut fields,
                );
                TypeEntry::InputObject(InputObjectEntry {
                    name: name.clone(),
                    description: description_of(&input.description),
                    fields,
                    location: Some(location),
                })
            }
            ast::TypeDefinition::Scalar(scalar) => TypeEntry::Scalar(ScalarEntry {
                name: name.clone(),
                description: description_of(&scalar.description),
                builtin: false,
                location: Some(location),
            }),
        };

        self.graph.types.insert(name, entry);
    }

    fn register_directive(&mut self, fragment: FragmentId, def: &ast::DirectiveDefinition) {
        let name = self.interner.get(def.name.value);
        let location = Location::new(fragment, def.name.span);

        if let Some(existing) = self.graph.directives.get(&name) {
            self.violations.push(Violation::DuplicateDeclaration {
                kind: DeclarationKind::Directive,
                name,
                location: Some(location),
                previous: existing.location,
            });
            return;
        }

        let entry = DirectiveEntry {
            name: name.clone(),
            description: description_of(&def.description),
            arguments: argument_entries(self.interner, &def.arguments),
            locations: def.locations.clone(),
            repeatable: def.repeatable,
            builtin: false,
            location: Some(location),
        };
        self.graph.directives.insert(name, entry);
    }

    fn apply_extension(&mut self, fragment: FragmentId, ext: &ast::TypeExtension) {
        let name = self.interner.get(ext.name().value);
        let location = Location::new(fragment, ext.name().span);

        // Field-level borrows: the entry being extended and the violation
        // list live side by side.
        let interner = self.interner;
        let Self {
            graph, violations, ..
        } = self;

        match ext {
            ast::TypeExtension::Object(x) => {
                if let Some(TypeEntry::Object(obj)) = graph.types.get_mut(&name) {
                    merge_implements(interner, &x.implements, &mut obj.implements);
                    merge_fields(interner, violations, fragment, &name, &x.fields, &mut obj.fields);
                } else {
                    violations.push(dangling(DeclarationKind::Object, name, location));
                }
            }
            ast::TypeExtension::Interface(x) => {
                if let Some(TypeEntry::Interface(iface)) = graph.types.get_mut(&name) {
                    merge_implements(interner, &x.implements, &mut iface.implements);
                    merge_fields(
                        interner,
                        violations,
                        fragment,
                        &name,
                        &x.fields,
                        &mut iface.fields,
                    );
                } else {
                    violations.push(dangling(DeclarationKind::Interface, name, location));
                }
            }
            ast::TypeExtension::Union(x) => {
                if let Some(TypeEntry::Union(un)) = graph.types.get_mut(&name) {
                    merge_members(interner, violations, fragment, &x.members, &mut un.members);
                } else {
                    violations.push(dangling(DeclarationKind::Union, name, location));
                }
            }
            ast::TypeExtension::Enum(x) => {
                if let Some(TypeEntry::Enum(en)) = graph.types.get_mut(&name) {
                    merge_enum_values(
                        interner,
                        violations,
                        fragment,
                        &name,
                        &x.values,
                        &mut en.values,
                    );
                } else {
                    violations.push(dangling(DeclarationKind::Enum, name, location));
                }
            }
            ast::TypeExtension::Input(x) => {
                if let Some(TypeEntry::InputObject(input)) = graph.types.get_mut(&name) {
                    merge_input_fields(
                        interner,
                        violations,
                        fragment,
                        &name,
                        &x.fields,
                        &mut input.fields,
                    );
                } else {
                    violations.push(dangling(DeclarationKind::InputObject, name, location));
                }
            }
        }
    }

    /// Applies the conventional root bindings for objects named after the
    /// three operations when no schema block bound them explicitly.
    fn finalize(&mut self) {
        if self.graph.query_type.is_none() && self.is_object("Query") {
            self.graph.query_type = Some("Query".to_string());
        }
        if self.graph.mutation_type.is_none() && self.is_object("Mutation") {
            self.graph.mutation_type = Some("Mutation".to_string());
        }
        if self.graph.subscription_type.is_none() && self.is_object("Subscription") {
            self.graph.subscription_type = Some("Subscription".to_string());
        }
    }

    fn is_object(&self, name: &str) -> bool {
        matches!(self.graph.types.get(name), Some(TypeEntry::Object(_)))
    }
}

fn dangling(kind: DeclarationKind, name: String, location: Location) -> Violation {
    Violation::DanglingExtension {
        kind,
        name,
        location: Some(location),
    }
}

fn description_of(description: &Option<ast::Description>) -> Option<String> {
    description.as_ref().map(|d| d.value.clone())
}

fn type_ref(interner: &Interner, ty: &ast::Type) -> TypeRef {
    match ty {
        ast::Type::Named(named) => TypeRef::named(interner.get(named.name)),
        ast::Type::List(inner, _) => TypeRef::list(type_ref(interner, inner)),
        ast::Type::NonNull(inner, _) => TypeRef::non_null(type_ref(interner, inner)),
    }
}

/// Extracts a folded `@deprecated` marker from a directive list.
fn deprecation(interner: &Interner, directives: &[ast::Directive]) -> (bool, Option<String>) {
    for directive in directives {
        if interner.get(directive.name.value) == "deprecated" {
            let reason = directive.arguments.iter().find_map(|arg| {
                if interner.get(arg.name.value) == "reason" {
                    match &arg.value {
                        ast::Value::String(s, _) => Some(s.clone()),
                        _ => None,
                    }
                } else {
                    None
                }
            });
            return (true, reason);
        }
    }
    (false, None)
}

fn field_entry(interner: &Interner, fragment: FragmentId, def: &ast::FieldDefinition) -> FieldEntry {
    let (deprecated, deprecation_reason) = deprecation(interner, &def.directives);
    FieldEntry {
        name: interner.get(def.name.value),
        description: description_of(&def.description),
        ty: type_ref(interner, &def.ty),
        arguments: argument_entries(interner, &def.arguments),
        deprecated,
        deprecation_reason,
        location: Some(Location::new(fragment, def.name.span)),
    }
}

fn input_field_entry(interner: &Interner, def: &ast::InputValueDefinition) -> InputFieldEntry {
    InputFieldEntry {
        name: interner.get(def.name.value),
        description: description_of(&def.description),
        ty: type_ref(interner, &def.ty),
        default_value: def
            .default_value
            .as_ref()
            .map(|v| render_value(interner, v)),
    }
}

/// Builds an argument map. First declaration of a name wins.
fn argument_entries(
    interner: &Interner,
    defs: &[ast::InputValueDefinition],
) -> IndexMap<String, InputFieldEntry> {
    let mut map = IndexMap::new();
    for def in defs {
        let entry = input_field_entry(interner, def);
        map.entry(entry.name.clone()).or_insert(entry);
    }
    map
}

fn merge_fields(
    interner: &Interner,
    violations: &mut Vec<Violation>,
    fragment: FragmentId,
    owner: &str,
    defs: &[ast::FieldDefinition],
    map: &mut IndexMap<String, FieldEntry>,
) {
    for def in defs {
        let entry = field_entry(interner, fragment, def);
        if let Some(previous) = map.get(&entry.name) {
            violations.push(Violation::DuplicateDeclaration {
                kind: DeclarationKind::Field,
                name: format!("{owner}.{}", entry.name),
                location: entry.location,
                previous: previous.location,
            });
            continue;
        }
        map.insert(entry.name.clone(), entry);
    }
}

fn merge_input_fields(
    interner: &Interner,
    violations: &mut Vec<Violation>,
    fragment: FragmentId,
    owner: &str,
    defs: &[ast::InputValueDefinition],
    map: &mut IndexMap<String, InputFieldEntry>,
) {
    for def in defs {
        let entry = input_field_entry(interner, def);
        if map.contains_key(&entry.name) {
            violations.push(Violation::DuplicateDeclaration {
                kind: DeclarationKind::Field,
                name: format!("{owner}.{}", entry.name),
                location: Some(Location::new(fragment, def.name.span)),
                previous: None,
            });
            continue;
        }
        map.insert(entry.name.clone(), entry);
    }
}

fn merge_members(
    interner: &Interner,
    violations: &mut Vec<Violation>,
    fragment: FragmentId,
    defs: &[ast::Name],
    members: &mut Vec<String>,
) {
    for def in defs {
        let name = interner.get(def.value);
        if members.contains(&name) {
            violations.push(Violation::DuplicateDeclaration {
                kind: DeclarationKind::Member,
                name,
                location: Some(Location::new(fragment, def.span)),
                previous: None,
            });
            continue;
        }
        members.push(name);
    }
}

fn merge_enum_values(
    interner: &Interner,
    violations: &mut Vec<Violation>,
    fragment: FragmentId,
    owner: &str,
    defs: &[ast::EnumValueDefinition],
    map: &mut IndexMap<String, EnumValueEntry>,
) {
    for def in defs {
        let name = interner.get(def.name.value);
        if map.contains_key(&name) {
            violations.push(Violation::DuplicateDeclaration {
                kind: DeclarationKind::EnumValue,
                name: format!("{owner}.{name}"),
                location: Some(Location::new(fragment, def.name.span)),
                previous: None,
            });
            continue;
        }
        let (deprecated, deprecation_reason) = deprecation(interner, &def.directives);
        map.insert(
            name.clone(),
            EnumValueEntry {
                name,
                description: description_of(&def.description),
                deprecated,
                deprecation_reason,
            },
        );
    }
}

/// Re-declaring an already implemented interface is tolerated, so an
/// extension can restate the base type's clause.
fn merge_implements(interner: &Interner, defs: &[ast::Name], list: &mut Vec<String>) {
    for def in defs {
        let name = interner.get(def.value);
        if !list.contains(&name) {
            list.push(name);
        }
    }
}

/// Renders a constant value back to SDL for storage as a default.
fn render_value(interner: &Interner, value: &ast::Value) -> String {
    match value {
        ast::Value::Int(v, _) => v.to_string(),
        ast::Value::Float(v, _) => v.to_string(),
        ast::Value::String(v, _) => format!("{v:?}"),
        ast::Value::Boolean(v, _) => v.to_string(),
        ast::Value::Null(_) => "null".to_string(),
        ast::Value::Enum(name) => interner.get(name.value),
        ast::Value::List(items, _) => {
            let inner: Vec<String> = items.iter().map(|v| render_value(interner, v)).collect();
            format!("[{}]", inner.join(", "))
        }
        ast::Value::Object(fields, _) => {
            let inner: Vec<String> = fields
                .iter()
                .map(|(name, v)| {
                    format!("{}: {}", interner.get(name.value), render_value(interner, v))
                })
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::DeclarationKind;

    fn fold_sources(sources: &[&str]) -> (TypeGraph, Vec<Violation>) {
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
        fold(&documents, &interner)
    }

    #[test]
    fn test_fold_basic() {
        let (graph, violations) = fold_sources(&[
            "type Query { foo: String }",
            "interface Fooer { foo: String }",
        ]);
        assert!(violations.is_empty());
        assert!(matches!(graph.get_type("Query"), Some(TypeEntry::Object(_))));
        assert!(matches!(
            graph.get_type("Fooer"),
            Some(TypeEntry::Interface(_))
        ));
        assert_eq!(graph.query_type.as_deref(), Some("Query"));
    }

    #[test]
    fn test_fold_extension_before_base() {
        let (graph, violations) = fold_sources(&[
            "extend type Mut { bar: String }",
            "type Query { ok: Boolean }",
            "type Mut { foo: String }",
        ]);
        assert!(violations.is_empty());
        let Some(TypeEntry::Object(obj)) = graph.get_type("Mut") else {
            panic!("expected object entry");
        };
        assert!(obj.fields.contains_key("foo"));
        assert!(obj.fields.contains_key("bar"));
    }

    #[test]
    fn test_fold_dangling_extension() {
        let (_, violations) =
            fold_sources(&["type Query { ok: Boolean }", "extend type Other { x: Int }"]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::DanglingExtension { kind: DeclarationKind::Object, name, .. } if name == "Other"
        ));
    }

    #[test]
    fn test_fold_kind_mismatch_extension_is_dangling() {
        let (_, violations) = fold_sources(&[
            "type Query { ok: Boolean } union Foo = Query",
            "extend type Foo { x: Int }",
        ]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::DanglingExtension { kind: DeclarationKind::Object, name, .. } if name == "Foo"
        ));
    }

    #[test]
    fn test_fold_duplicate_type() {
        let (_, violations) =
            fold_sources(&["type Query { a: Int }", "type Query { b: Int }"]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::DuplicateDeclaration { kind: DeclarationKind::Object, name, previous: Some(_), .. }
                if name == "Query"
        ));
    }

    #[test]
    fn test_fold_duplicate_across_kinds() {
        let (_, violations) = fold_sources(&[
            "type Query { ok: Boolean }",
            "union Thing = Query",
            "type Thing { x: Int }",
        ]);
        assert_eq!(violations.len(), 1);
        // The message names the kind that got there first.
        assert!(matches!(
            &violations[0],
            Violation::DuplicateDeclaration { kind: DeclarationKind::Union, name, .. } if name == "Thing"
        ));
    }

    #[test]
    fn test_fold_builtin_scalar_collision() {
        let (_, violations) = fold_sources(&["type Query { ok: Boolean } scalar Int"]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::DuplicateDeclaration { kind: DeclarationKind::Scalar, name, previous: None, .. }
                if name == "Int"
        ));
    }

    #[test]
    fn test_fold_directive_namespace_is_separate() {
        let (graph, violations) = fold_sources(&[
            "type Query { ok: Boolean }",
            "directive @Query on OBJECT",
        ]);
        assert!(violations.is_empty());
        assert!(graph.get_type("Query").is_some());
        assert!(graph.get_directive("Query").is_some());
    }

    #[test]
    fn test_fold_duplicate_directive() {
        let (_, violations) = fold_sources(&[
            "type Query { ok: Boolean }",
            "directive @foo on SCHEMA",
            "directive @foo on UNION",
        ]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::DuplicateDeclaration { kind: DeclarationKind::Directive, name, .. } if name == "foo"
        ));
    }

    #[test]
    fn test_fold_extension_duplicate_field() {
        let (_, violations) = fold_sources(&[
            "type Query { foo: String }",
            "extend type Query { foo: Int }",
        ]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::DuplicateDeclaration { kind: DeclarationKind::Field, name, previous: Some(_), .. }
                if name == "Query.foo"
        ));
    }

    #[test]
    fn test_fold_repeated_implements_tolerated() {
        let (graph, violations) = fold_sources(&[
            "type Query { ok: Boolean }",
            "interface Fooer { foo: String }",
            "type Mut implements Fooer { foo: String }",
            "extend type Mut implements Fooer { bar: String }",
        ]);
        assert!(violations.is_empty());
        let Some(TypeEntry::Object(obj)) = graph.get_type("Mut") else {
            panic!("expected object entry");
        };
        assert_eq!(obj.implements, vec!["Fooer".to_string()]);
        assert_eq!(obj.fields.len(), 2);
    }

    #[test]
    fn test_fold_deprecated_marker() {
        let (graph, violations) = fold_sources(&[
            r#"type Query { old: String @deprecated(reason: "use new") new: String }"#,
        ]);
        assert!(violations.is_empty());
        let Some(TypeEntry::Object(obj)) = graph.get_type("Query") else {
            panic!("expected object entry");
        };
        let old = &obj.fields["old"];
        assert!(old.deprecated);
        assert_eq!(old.deprecation_reason.as_deref(), Some("use new"));
        assert!(!obj.fields["new"].deprecated);
    }

    #[test]
    fn test_fold_schema_block_binding() {
        let (graph, violations) = fold_sources(&[
            "schema { query: Root } type Root { ok: Boolean } type Query { hidden: Int }",
        ]);
        assert!(violations.is_empty());
        // Explicit binding wins over the conventional name.
        assert_eq!(graph.query_type.as_deref(), Some("Root"));
    }

    #[test]
    fn test_fold_duplicate_schema_block() {
        let (_, violations) = fold_sources(&[
            "schema { query: Query } type Query { ok: Boolean }",
            "schema { query: Query }",
        ]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::DuplicateDeclaration { kind: DeclarationKind::Schema, .. }
        ));
    }

    #[test]
    fn test_fold_root_defaults() {
        let (graph, violations) = fold_sources(&[
            "type Query { ok: Boolean } type Mutation { go: Boolean } type Sub { x: Int }",
        ]);
        assert!(violations.is_empty());
        assert_eq!(graph.query_type.as_deref(), Some("Query"));
        assert_eq!(graph.mutation_type.as_deref(), Some("Mutation"));
        assert!(graph.subscription_type.is_none());
    }

    #[test]
    fn test_fold_duplicate_union_member() {
        let (_, violations) = fold_sources(&[
            "type Query { ok: Boolean } type A { x: Int } union U = A | A",
        ]);
        assert_eq!(violations.len(), 1);
        assert!(matches!(
            &violations[0],
            Violation::DuplicateDeclaration { kind: DeclarationKind::Member, name, .. } if name == "A"
        ));
    }

    #[test]
    fn test_fold_input_defaults_rendered() {
        let (graph, violations) = fold_sources(&[
            r#"type Query { ok: Boolean } input F { limit: Int = 10 tag: String = "x" }"#,
        ]);
        assert!(violations.is_empty());
        let Some(TypeEntry::InputObject(input)) = graph.get_type("F") else {
            panic!("expected input object entry");
        };
        assert_eq!(input.fields["limit"].default_value.as_deref(), Some("10"));
        assert_eq!(
            input.fields["tag"].default_value.as_deref(),
            Some("\"x\"")
        );
    }
}
