//! The composed type graph.
//!
//! A [`TypeGraph`] holds every declaration after fragment folding: base
//! definitions with their extensions merged in, plus the built-in scalars
//! and directives every schema carries. Insertion order is preserved so
//! rendered output follows declaration order.

use indexmap::IndexMap;
use loomql_core::Location;
use loomql_syntax::DirectiveLocation;
use serde::{Deserialize, Serialize};

/// The kind of a declaration, used in duplicate and extension reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    Directive,
    Schema,
    Field,
    EnumValue,
    Member,
}

impl DeclarationKind {
    /// The SDL-flavored keyword for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::Object => "type",
            Self::Interface => "interface",
            Self::Union => "union",
            Self::Enum => "enum",
            Self::InputObject => "input",
            Self::Directive => "directive",
            Self::Schema => "schema",
            Self::Field => "field",
            Self::EnumValue => "enum value",
            Self::Member => "union member",
        }
    }
}

impl std::fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A resolved type reference in standard notation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRef {
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn list(inner: TypeRef) -> Self {
        Self::List(Box::new(inner))
    }

    pub fn non_null(inner: TypeRef) -> Self {
        Self::NonNull(Box::new(inner))
    }

    /// The innermost named type.
    pub fn named_type(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::List(inner) | Self::NonNull(inner) => inner.named_type(),
        }
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::List(inner) => write!(f, "[{inner}]"),
            Self::NonNull(inner) => write!(f, "{inner}!"),
        }
    }
}

/// Scalar type entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarEntry {
    pub name: String,
    pub description: Option<String>,
    pub builtin: bool,
    pub location: Option<Location>,
}

/// Object type entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldEntry>,
    pub implements: Vec<String>,
    pub location: Option<Location>,
}

/// Interface type entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceEntry {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldEntry>,
    pub implements: Vec<String>,
    pub location: Option<Location>,
}

/// Union type entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnionEntry {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
    pub location: Option<Location>,
}

/// Enum type entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumEntry {
    pub name: String,
    pub description: Option<String>,
    pub values: IndexMap<String, EnumValueEntry>,
    pub location: Option<Location>,
}

/// Enum value entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValueEntry {
    pub name: String,
    pub description: Option<String>,
    pub deprecated: bool,
    pub deprecation_reason: Option<String>,
}

/// Input object type entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputObjectEntry {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, InputFieldEntry>,
    pub location: Option<Location>,
}

/// Field entry on an object or interface type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub arguments: IndexMap<String, InputFieldEntry>,
    pub deprecated: bool,
    pub deprecation_reason: Option<String>,
    pub location: Option<Location>,
}

/// Argument or input object field entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputFieldEntry {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<String>,
}

/// Directive declaration entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveEntry {
    pub name: String,
    pub description: Option<String>,
    pub arguments: IndexMap<String, InputFieldEntry>,
    pub locations: Vec<DirectiveLocation>,
    pub repeatable: bool,
    pub builtin: bool,
    pub location: Option<Location>,
}

/// A type entry of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeEntry {
    Scalar(ScalarEntry),
    Object(ObjectEntry),
    Interface(InterfaceEntry),
    Union(UnionEntry),
    Enum(EnumEntry),
    InputObject(InputObjectEntry),
}

impl TypeEntry {
    /// The declared name.
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(s) => &s.name,
            Self::Object(o) => &o.name,
            Self::Interface(i) => &i.name,
            Self::Union(u) => &u.name,
            Self::Enum(e) => &e.name,
            Self::InputObject(i) => &i.name,
        }
    }

    /// The declaration kind.
    pub fn kind(&self) -> DeclarationKind {
        match self {
            Self::Scalar(_) => DeclarationKind::Scalar,
            Self::Object(_) => DeclarationKind::Object,
            Self::Interface(_) => DeclarationKind::Interface,
            Self::Union(_) => DeclarationKind::Union,
            Self::Enum(_) => DeclarationKind::Enum,
            Self::InputObject(_) => DeclarationKind::InputObject,
        }
    }

    /// Where the base declaration appeared, if user-declared.
    pub fn location(&self) -> Option<Location> {
        match self {
            Self::Scalar(s) => s.location,
            Self::Object(o) => o.location,
            Self::Interface(i) => i.location,
            Self::Union(u) => u.location,
            Self::Enum(e) => e.location,
            Self::InputObject(i) => i.location,
        }
    }
}

/// The composed type graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeGraph {
    pub query_type: Option<String>,
    pub mutation_type: Option<String>,
    pub subscription_type: Option<String>,
    pub types: IndexMap<String, TypeEntry>,
    pub directives: IndexMap<String, DirectiveEntry>,
    /// Where an explicit `schema { ... }` block appeared, if any.
    pub schema_location: Option<Location>,
}

impl TypeGraph {
    /// Creates a graph pre-populated with the built-in scalars and
    /// directives.
    pub fn new() -> Self {
        let mut graph = Self {
            query_type: None,
            mutation_type: None,
            subscription_type: None,
            types: IndexMap::new(),
            directives: IndexMap::new(),
            schema_location: None,
        };

        for name in ["Int", "Float", "String", "Boolean", "ID"] {
            graph.types.insert(
                name.to_string(),
                TypeEntry::Scalar(ScalarEntry {
                    name: name.to_string(),
                    description: Some(format!("Built-in {name} scalar")),
                    builtin: true,
                    location: None,
                }),
            );
        }

        for directive in builtin_directives() {
            graph.directives.insert(directive.name.clone(), directive);
        }

        graph
    }

    /// Gets a type by name.
    pub fn get_type(&self, name: &str) -> Option<&TypeEntry> {
        self.types.get(name)
    }

    /// Gets a directive declaration by name.
    pub fn get_directive(&self, name: &str) -> Option<&DirectiveEntry> {
        self.directives.get(name)
    }

    /// Returns all types.
    pub fn types(&self) -> impl Iterator<Item = (&String, &TypeEntry)> {
        self.types.iter()
    }

    /// Returns all directive declarations.
    pub fn directives(&self) -> impl Iterator<Item = (&String, &DirectiveEntry)> {
        self.directives.iter()
    }

    /// Returns the concrete object types reachable from an abstract type:
    /// union members, or objects implementing an interface.
    pub fn possible_types(&self, name: &str) -> Vec<&str> {
        match self.types.get(name) {
            Some(TypeEntry::Union(u)) => u.members.iter().map(String::as_str).collect(),
            Some(TypeEntry::Interface(_)) => self
                .types
                .values()
                .filter_map(|entry| match entry {
                    TypeEntry::Object(obj) if obj.implements.iter().any(|i| i == name) => {
                        Some(obj.name.as_str())
                    }
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl Default for TypeGraph {
    fn default() -> Self {
        Self::new()
    }
}

fn arg(name: &str, ty: TypeRef, default_value: Option<&str>) -> (String, InputFieldEntry) {
    (
        name.to_string(),
        InputFieldEntry {
            name: name.to_string(),
            description: None,
            ty,
            default_value: default_value.map(str::to_string),
        },
    )
}

/// The four directives every schema carries.
fn builtin_directives() -> Vec<DirectiveEntry> {
    vec![
        DirectiveEntry {
            name: "skip".to_string(),
            description: Some(
                "Directs the executor to skip this field or fragment when the `if` argument is true."
                    .to_string(),
            ),
            arguments: [arg(
                "if",
                TypeRef::non_null(TypeRef::named("Boolean")),
                None,
            )]
            .into_iter()
            .collect(),
            locations: vec![
                DirectiveLocation::Field,
                DirectiveLocation::FragmentSpread,
                DirectiveLocation::InlineFragment,
            ],
            repeatable: false,
            builtin: true,
            location: None,
        },
        DirectiveEntry {
            name: "include".to_string(),
            description: Some(
                "Directs the executor to include this field or fragment only when the `if` argument is true."
                    .to_string(),
            ),
            arguments: [arg(
                "if",
                TypeRef::non_null(TypeRef::named("Boolean")),
                None,
            )]
            .into_iter()
            .collect(),
            locations: vec![
                DirectiveLocation::Field,
                DirectiveLocation::FragmentSpread,
                DirectiveLocation::InlineFragment,
            ],
            repeatable: false,
            builtin: true,
            location: None,
        },
        DirectiveEntry {
            name: "deprecated".to_string(),
            description: Some(
                "Marks an element of a GraphQL schema as no longer supported.".to_string(),
            ),
            arguments: [arg(
                "reason",
                TypeRef::named("String"),
                Some("\"No longer supported\""),
            )]
            .into_iter()
            .collect(),
            locations: vec![
                DirectiveLocation::FieldDefinition,
                DirectiveLocation::ArgumentDefinition,
                DirectiveLocation::InputFieldDefinition,
                DirectiveLocation::EnumValue,
            ],
            repeatable: false,
            builtin: true,
            location: None,
        },
        DirectiveEntry {
            name: "specifiedBy".to_string(),
            description: Some(
                "Exposes a URL that specifies the behavior of this scalar.".to_string(),
            ),
            arguments: [arg("url", TypeRef::non_null(TypeRef::named("String")), None)]
                .into_iter()
                .collect(),
            locations: vec![DirectiveLocation::Scalar],
            repeatable: false,
            builtin: true,
            location: None,
        },
    ]
}
