//! AST node definitions for SDL type-system documents.
//!
//! Nodes are fully owned. Names carry an interned [`Text`] plus the span
//! of the occurrence, so later passes can point at the exact site of a
//! problem without re-scanning the source.

use crate::token::DirectiveLocation;
use loomql_core::{Span, Text};

/// A parsed schema fragment.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    pub definitions: Vec<Definition>,
    pub span: Span,
}

/// A top-level definition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Definition {
    Schema(SchemaDefinition),
    Type(TypeDefinition),
    Extension(TypeExtension),
    Directive(DirectiveDefinition),
}

/// A name occurrence with its source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Name {
    pub value: Text,
    pub span: Span,
}

impl Name {
    pub const fn new(value: Text, span: Span) -> Self {
        Self { value, span }
    }
}

/// A description string attached to a definition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Description {
    pub value: String,
    pub span: Span,
}

/// `schema { query: Query ... }`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchemaDefinition {
    pub description: Option<Description>,
    pub directives: Vec<Directive>,
    pub operations: Vec<OperationTypeDefinition>,
    pub span: Span,
}

/// One `query: TypeName` binding inside a schema definition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OperationTypeDefinition {
    pub operation: OperationType,
    pub type_name: Name,
    pub span: Span,
}

/// The three root operation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        }
    }
}

/// A type definition of any kind.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeDefinition {
    Object(ObjectTypeDefinition),
    Interface(InterfaceTypeDefinition),
    Union(UnionTypeDefinition),
    Enum(EnumTypeDefinition),
    Input(InputObjectTypeDefinition),
    Scalar(ScalarTypeDefinition),
}

impl TypeDefinition {
    /// The defined name.
    pub fn name(&self) -> Name {
        match self {
            Self::Object(def) => def.name,
            Self::Interface(def) => def.name,
            Self::Union(def) => def.name,
            Self::Enum(def) => def.name,
            Self::Input(def) => def.name,
            Self::Scalar(def) => def.name,
        }
    }

    /// A human-readable kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Object(_) => "type",
            Self::Interface(_) => "interface",
            Self::Union(_) => "union",
            Self::Enum(_) => "enum",
            Self::Input(_) => "input",
            Self::Scalar(_) => "scalar",
        }
    }
}

/// `type Name implements A & B { ... }`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectTypeDefinition {
    pub description: Option<Description>,
    pub name: Name,
    pub implements: Vec<Name>,
    pub directives: Vec<Directive>,
    pub fields: Vec<FieldDefinition>,
    pub span: Span,
}

/// `interface Name { ... }`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterfaceTypeDefinition {
    pub description: Option<Description>,
    pub name: Name,
    pub implements: Vec<Name>,
    pub directives: Vec<Directive>,
    pub fields: Vec<FieldDefinition>,
    pub span: Span,
}

/// `union Name = A | B`
///
/// A union with no `=` clause parses successfully with zero members.
/// Whether that is acceptable is not the parser's concern.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnionTypeDefinition {
    pub description: Option<Description>,
    pub name: Name,
    pub directives: Vec<Directive>,
    pub members: Vec<Name>,
    pub span: Span,
}

/// `enum Name { A B }`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnumTypeDefinition {
    pub description: Option<Description>,
    pub name: Name,
    pub directives: Vec<Directive>,
    pub values: Vec<EnumValueDefinition>,
    pub span: Span,
}

/// One value inside an enum definition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnumValueDefinition {
    pub description: Option<Description>,
    pub name: Name,
    pub directives: Vec<Directive>,
    pub span: Span,
}

/// `input Name { field: Type = default }`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputObjectTypeDefinition {
    pub description: Option<Description>,
    pub name: Name,
    pub directives: Vec<Directive>,
    pub fields: Vec<InputValueDefinition>,
    pub span: Span,
}

/// `scalar Name`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScalarTypeDefinition {
    pub description: Option<Description>,
    pub name: Name,
    pub directives: Vec<Directive>,
    pub span: Span,
}

/// A type extension of any kind.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeExtension {
    Object(ObjectTypeExtension),
    Interface(InterfaceTypeExtension),
    Union(UnionTypeExtension),
    Enum(EnumTypeExtension),
    Input(InputObjectTypeExtension),
}

impl TypeExtension {
    /// The extended name.
    pub fn name(&self) -> Name {
        match self {
            Self::Object(ext) => ext.name,
            Self::Interface(ext) => ext.name,
            Self::Union(ext) => ext.name,
            Self::Enum(ext) => ext.name,
            Self::Input(ext) => ext.name,
        }
    }

    /// A human-readable kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Object(_) => "type",
            Self::Interface(_) => "interface",
            Self::Union(_) => "union",
            Self::Enum(_) => "enum",
            Self::Input(_) => "input",
        }
    }
}

/// `extend type Name implements A { ... }`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectTypeExtension {
    pub name: Name,
    pub implements: Vec<Name>,
    pub directives: Vec<Directive>,
    pub fields: Vec<FieldDefinition>,
    pub span: Span,
}

/// `extend interface Name { ... }`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterfaceTypeExtension {
    pub name: Name,
    pub implements: Vec<Name>,
    pub directives: Vec<Directive>,
    pub fields: Vec<FieldDefinition>,
    pub span: Span,
}

/// `extend union Name = A | B`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnionTypeExtension {
    pub name: Name,
    pub directives: Vec<Directive>,
    pub members: Vec<Name>,
    pub span: Span,
}

/// `extend enum Name { C }`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnumTypeExtension {
    pub name: Name,
    pub directives: Vec<Directive>,
    pub values: Vec<EnumValueDefinition>,
    pub span: Span,
}

/// `extend input Name { field: Type }`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputObjectTypeExtension {
    pub name: Name,
    pub directives: Vec<Directive>,
    pub fields: Vec<InputValueDefinition>,
    pub span: Span,
}

/// `directive @name(args) repeatable on LOCATION | LOCATION`
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DirectiveDefinition {
    pub description: Option<Description>,
    pub name: Name,
    pub arguments: Vec<InputValueDefinition>,
    pub repeatable: bool,
    pub locations: Vec<DirectiveLocation>,
    pub span: Span,
}

/// A field in an object or interface type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDefinition {
    pub description: Option<Description>,
    pub name: Name,
    pub arguments: Vec<InputValueDefinition>,
    pub ty: Type,
    pub directives: Vec<Directive>,
    pub span: Span,
}

/// An argument or input-object field definition.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InputValueDefinition {
    pub description: Option<Description>,
    pub name: Name,
    pub ty: Type,
    pub default_value: Option<Value>,
    pub directives: Vec<Directive>,
    pub span: Span,
}

/// A type reference: `Name`, `[T]`, or `T!`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Type {
    Named(NamedType),
    List(Box<Type>, Span),
    NonNull(Box<Type>, Span),
}

impl Type {
    /// The full span of this reference.
    pub fn span(&self) -> Span {
        match self {
            Self::Named(named) => named.span,
            Self::List(_, span) | Self::NonNull(_, span) => *span,
        }
    }

    /// The innermost named type.
    pub fn named_type(&self) -> &NamedType {
        match self {
            Self::Named(named) => named,
            Self::List(inner, _) | Self::NonNull(inner, _) => inner.named_type(),
        }
    }
}

/// A bare type name inside a type reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NamedType {
    pub name: Text,
    pub span: Span,
}

/// A directive application: `@name(arg: value)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Directive {
    pub name: Name,
    pub arguments: Vec<Argument>,
    pub span: Span,
}

/// One `name: value` pair inside a directive application.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Argument {
    pub name: Name,
    pub value: Value,
    pub span: Span,
}

/// A constant value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Int(i64, Span),
    Float(f64, Span),
    String(String, Span),
    Boolean(bool, Span),
    Null(Span),
    Enum(Name),
    List(Vec<Value>, Span),
    Object(Vec<(Name, Value)>, Span),
}

impl Value {
    /// The span of this value.
    pub fn span(&self) -> Span {
        match self {
            Self::Int(_, span)
            | Self::Float(_, span)
            | Self::String(_, span)
            | Self::Boolean(_, span)
            | Self::Null(span)
            | Self::List(_, span)
            | Self::Object(_, span) => *span,
            Self::Enum(name) => name.span,
        }
    }
}
