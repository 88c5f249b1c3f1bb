//! Composition failure taxonomy.

use crate::graph::DeclarationKind;
use loomql_core::{Diagnostic, Location};
use loomql_syntax::DirectiveLocation;
use thiserror::Error;

/// A single rule violation found during composition.
///
/// Validation never stops at the first problem: every violation in the
/// input is collected and reported together.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    /// A declaration refers to a name with no matching declaration, or to
    /// a declaration of the wrong kind for the position.
    #[error("{referenced_by} references `{name}`, {problem}")]
    UndefinedTypeReference {
        name: String,
        referenced_by: String,
        problem: String,
        location: Option<Location>,
    },

    /// An implementor is missing an interface field, or declares it with
    /// an incompatible type.
    #[error("type `{type_name}` does not fully implement interface `{interface}`: {reason}")]
    IncompleteInterfaceImplementation {
        type_name: String,
        interface: String,
        reason: String,
        location: Option<Location>,
    },

    /// A union ended composition with no members.
    #[error("union `{name}` has no members")]
    EmptyUnion {
        name: String,
        location: Option<Location>,
    },

    /// Two declarations claimed the same name in the same namespace.
    #[error("{kind} `{name}` is already declared")]
    DuplicateDeclaration {
        kind: DeclarationKind,
        name: String,
        location: Option<Location>,
        previous: Option<Location>,
    },

    /// An extension whose target was never declared, or was declared as a
    /// different kind.
    #[error("extend {kind} `{name}` does not match any {kind} declaration")]
    DanglingExtension {
        kind: DeclarationKind,
        name: String,
        location: Option<Location>,
    },

    /// The composed schema has no query root type.
    #[error("schema has no query root type")]
    MissingQueryType,

    /// A directive was applied without a matching declaration.
    #[error("directive `@{name}` is not declared")]
    UndefinedDirective {
        name: String,
        location: Option<Location>,
    },

    /// A directive was applied somewhere its declaration does not allow.
    #[error("directive `@{name}` is not allowed on {placement}")]
    MisplacedDirective {
        name: String,
        placement: DirectiveLocation,
        location: Option<Location>,
    },

    /// A resolver key names a type or field the schema does not declare.
    #[error("resolver `{key}` does not match any schema field")]
    UnknownResolverTarget { key: String },
}

impl Violation {
    /// A stable code for this violation category.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::UndefinedTypeReference { .. } => "E0201",
            Self::IncompleteInterfaceImplementation { .. } => "E0202",
            Self::EmptyUnion { .. } => "E0203",
            Self::DuplicateDeclaration { .. } => "E0204",
            Self::DanglingExtension { .. } => "E0205",
            Self::MissingQueryType => "E0206",
            Self::UndefinedDirective { .. } => "E0207",
            Self::MisplacedDirective { .. } => "E0208",
            Self::UnknownResolverTarget { .. } => "E0209",
        }
    }

    /// Where the violation points, when one site is attributable.
    #[must_use]
    pub fn location(&self) -> Option<Location> {
        match self {
            Self::UndefinedTypeReference { location, .. }
            | Self::IncompleteInterfaceImplementation { location, .. }
            | Self::EmptyUnion { location, .. }
            | Self::DuplicateDeclaration { location, .. }
            | Self::DanglingExtension { location, .. }
            | Self::UndefinedDirective { location, .. }
            | Self::MisplacedDirective { location, .. } => *location,
            Self::MissingQueryType | Self::UnknownResolverTarget { .. } => None,
        }
    }
}

/// Why composition failed.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// One or more fragments failed to parse. Folding never ran.
    #[error("schema fragments contain {} syntax error(s)", .diagnostics.len())]
    Syntax { diagnostics: Vec<Diagnostic> },

    /// The folded schema broke composition rules.
    #[error("schema composition found {} violation(s)", .violations.len())]
    Invalid { violations: Vec<Violation> },
}

impl ComposeError {
    /// The rule violations, if composition reached validation.
    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Invalid { violations } => violations,
            Self::Syntax { .. } => &[],
        }
    }
}
