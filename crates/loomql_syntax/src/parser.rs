//! Recursive descent parser for SDL type-system documents.

use crate::ast::*;
use crate::lexer::Lexer;
use crate::token::{DirectiveLocation, Token, TokenKind};
use loomql_core::{diagnostics::codes, DiagnosticBag, FragmentId, Interner, Location, Span, Text};

/// Parser over one schema fragment.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    #[allow(dead_code)]
    source: &'a str,
    interner: &'a Interner,
    fragment: FragmentId,
    current: Token,
    diagnostics: DiagnosticBag,
}

/// Result of parsing.
pub struct ParseResult {
    pub document: Document,
    pub diagnostics: DiagnosticBag,
}

/// Parses a source string into a document.
///
/// The parser never fails outright. Malformed input produces a partial
/// document plus error diagnostics located in `fragment`.
pub fn parse(source: &str, fragment: FragmentId, interner: &Interner) -> ParseResult {
    let mut parser = Parser::new(source, fragment, interner);
    let document = parser.parse_document();
    ParseResult {
        document,
        diagnostics: parser.diagnostics,
    }
}

impl<'a> Parser<'a> {
    /// Creates a new parser.
    pub fn new(source: &'a str, fragment: FragmentId, interner: &'a Interner) -> Self {
        let mut lexer = Lexer::new(source, interner);
        let current = lexer.next_token();
        Self {
            lexer,
            source,
            interner,
            fragment,
            current,
            diagnostics: DiagnosticBag::new(),
        }
    }

    /// Returns the current token kind.
    #[inline]
    fn at(&self) -> TokenKind {
        self.current.kind
    }

    /// Returns true if at the given kind.
    #[inline]
    fn at_kind(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    /// Expects a specific token kind.
    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.at_kind(kind) {
            self.advance();
            true
        } else {
            self.error_expected(kind);
            false
        }
    }

    /// Gets the text of the current token.
    fn current_text(&self) -> &'a str {
        self.lexer.span_text(self.current.span)
    }

    /// Interns the current token's text.
    fn intern_current(&self) -> Text {
        self.lexer.intern_span(self.current.span)
    }

    /// Locates a span within this parser's fragment.
    fn location(&self, span: Span) -> Location {
        Location::new(self.fragment, span)
    }

    /// Reports an error at the current token.
    fn error(&mut self, message: &str) {
        let code = if self.current.is_eof() {
            codes::UNEXPECTED_EOF
        } else {
            codes::INVALID_SYNTAX
        };
        self.diagnostics.error(
            code,
            message,
            self.location(self.current.span),
            message.to_string(),
        );
    }

    /// Reports an expected token error.
    fn error_expected(&mut self, expected: TokenKind) {
        let code = if self.current.is_eof() {
            codes::UNEXPECTED_EOF
        } else {
            codes::UNEXPECTED_TOKEN
        };
        self.diagnostics.error(
            code,
            "unexpected token",
            self.location(self.current.span),
            format!("expected {}, found {}", expected, self.at()),
        );
    }

    /// Skips to the next plausible definition start after a failed
    /// definition. Descriptions count as starts since they may lead one.
    fn recover(&mut self) {
        loop {
            match self.at() {
                TokenKind::Eof
                | TokenKind::Schema
                | TokenKind::Type
                | TokenKind::Interface
                | TokenKind::Union
                | TokenKind::Enum
                | TokenKind::Input
                | TokenKind::Scalar
                | TokenKind::Directive
                | TokenKind::Extend
                | TokenKind::StringLiteral
                | TokenKind::BlockStringLiteral => break,
                _ => self.advance(),
            }
        }
    }

    /// Parses a document.
    pub fn parse_document(&mut self) -> Document {
        let start = self.current.span.start;
        let mut definitions = Vec::new();

        while !self.at_kind(TokenKind::Eof) {
            let before = self.current.span.start;
            if let Some(def) = self.parse_definition() {
                definitions.push(def);
            } else {
                if self.current.span.start == before {
                    // Nothing was consumed, so the current token itself is
                    // the problem.
                    self.advance();
                }
                self.recover();
            }
        }

        let end = self.current.span.end;
        Document {
            definitions,
            span: Span::new(start, end),
        }
    }

    /// Parses a definition.
    fn parse_definition(&mut self) -> Option<Definition> {
        let description = self.try_parse_description();

        match self.at() {
            TokenKind::Schema => Some(Definition::Schema(
                self.parse_schema_definition(description),
            )),
            TokenKind::Type => Some(Definition::Type(TypeDefinition::Object(
                self.parse_object_type(description),
            ))),
            TokenKind::Interface => Some(Definition::Type(TypeDefinition::Interface(
                self.parse_interface_type(description),
            ))),
            TokenKind::Union => Some(Definition::Type(TypeDefinition::Union(
                self.parse_union_type(description),
            ))),
            TokenKind::Enum => Some(Definition::Type(TypeDefinition::Enum(
                self.parse_enum_type(description),
            ))),
            TokenKind::Input => Some(Definition::Type(TypeDefinition::Input(
                self.parse_input_object_type(description),
            ))),
            TokenKind::Scalar => Some(Definition::Type(TypeDefinition::Scalar(
                self.parse_scalar_type(description),
            ))),
            TokenKind::Directive => Some(Definition::Directive(
                self.parse_directive_definition(description),
            )),
            TokenKind::Extend => {
                if description.is_some() {
                    self.error("extensions cannot carry a description");
                }
                self.parse_type_extension().map(Definition::Extension)
            }
            _ => {
                self.error("expected definition");
                None
            }
        }
    }

    fn try_parse_description(&mut self) -> Option<Description> {
        if matches!(
            self.at(),
            TokenKind::StringLiteral | TokenKind::BlockStringLiteral
        ) {
            let span = self.current.span;
            let value = decode_string(self.current_text());
            self.advance();
            Some(Description { value, span })
        } else {
            None
        }
    }

    /// Parses a name. Keywords are accepted since GraphQL keywords are
    /// soft.
    fn parse_name(&mut self) -> Name {
        let span = self.current.span;
        let value = self.intern_current();
        if self.at_kind(TokenKind::Ident) || self.at().is_keyword() {
            self.advance();
        } else {
            self.error("expected name");
        }
        Name::new(value, span)
    }

    /// Parses a schema definition.
    fn parse_schema_definition(&mut self, description: Option<Description>) -> SchemaDefinition {
        let start = self.current.span.start;
        self.advance(); // schema

        let directives = self.parse_directives();
        self.expect(TokenKind::LBrace);

        let mut operations = Vec::new();
        while !self.at_kind(TokenKind::RBrace) && !self.at_kind(TokenKind::Eof) {
            let op_start = self.current.span.start;
            let operation = match self.at() {
                TokenKind::Query => {
                    self.advance();
                    OperationType::Query
                }
                TokenKind::Mutation => {
                    self.advance();
                    OperationType::Mutation
                }
                TokenKind::Subscription => {
                    self.advance();
                    OperationType::Subscription
                }
                _ => {
                    self.error("expected operation type");
                    self.advance();
                    continue;
                }
            };
            self.expect(TokenKind::Colon);
            let type_name = self.parse_name();
            let op_end = self.current.span.start;
            operations.push(OperationTypeDefinition {
                operation,
                type_name,
                span: Span::new(op_start, op_end),
            });
        }
        self.expect(TokenKind::RBrace);

        let end = self.current.span.start;
        SchemaDefinition {
            description,
            directives,
            operations,
            span: Span::new(start, end),
        }
    }

    /// Parses an object type definition.
    fn parse_object_type(&mut self, description: Option<Description>) -> ObjectTypeDefinition {
        let start = self.current.span.start;
        self.advance(); // type

        let name = self.parse_name();
        let implements = self.parse_implements();
        let directives = self.parse_directives();
        let fields = self.parse_optional_field_block();

        let end = self.current.span.start;
        ObjectTypeDefinition {
            description,
            name,
            implements,
            directives,
            fields,
            span: Span::new(start, end),
        }
    }

    /// Parses an interface type definition.
    fn parse_interface_type(
        &mut self,
        description: Option<Description>,
    ) -> InterfaceTypeDefinition {
        let start = self.current.span.start;
        self.advance(); // interface

        let name = self.parse_name();
        let implements = self.parse_implements();
        let directives = self.parse_directives();
        let fields = self.parse_optional_field_block();

        let end = self.current.span.start;
        InterfaceTypeDefinition {
            description,
            name,
            implements,
            directives,
            fields,
            span: Span::new(start, end),
        }
    }

    /// Parses a union type definition. The member clause is optional, so
    /// `union Foo` parses with zero members.
    fn parse_union_type(&mut self, description: Option<Description>) -> UnionTypeDefinition {
        let start = self.current.span.start;
        self.advance(); // union

        let name = self.parse_name();
        let directives = self.parse_directives();
        let members = self.parse_union_members();

        let end = self.current.span.start;
        UnionTypeDefinition {
            description,
            name,
            directives,
            members,
            span: Span::new(start, end),
        }
    }

    fn parse_union_members(&mut self) -> Vec<Name> {
        let mut members = Vec::new();
        if self.at_kind(TokenKind::Eq) {
            self.advance();
            if self.at_kind(TokenKind::Pipe) {
                self.advance();
            }
            members.push(self.parse_name());
            while self.at_kind(TokenKind::Pipe) {
                self.advance();
                members.push(self.parse_name());
            }
        }
        members
    }

    /// Parses an enum type definition.
    fn parse_enum_type(&mut self, description: Option<Description>) -> EnumTypeDefinition {
        let start = self.current.span.start;
        self.advance(); // enum

        let name = self.parse_name();
        let directives = self.parse_directives();

        let values = if self.at_kind(TokenKind::LBrace) {
            self.advance();
            let values = self.parse_enum_values();
            self.expect(TokenKind::RBrace);
            values
        } else {
            Vec::new()
        };

        let end = self.current.span.start;
        EnumTypeDefinition {
            description,
            name,
            directives,
            values,
            span: Span::new(start, end),
        }
    }

    /// Parses enum values.
    fn parse_enum_values(&mut self) -> Vec<EnumValueDefinition> {
        let mut values = Vec::new();
        while !self.at_kind(TokenKind::RBrace) && !self.at_kind(TokenKind::Eof) {
            let before = self.current.span.start;
            let description = self.try_parse_description();
            let value_start = self.current.span.start;
            let name = self.parse_name();
            let directives = self.parse_directives();
            let value_end = self.current.span.start;

            values.push(EnumValueDefinition {
                description,
                name,
                directives,
                span: Span::new(value_start, value_end),
            });

            if self.current.span.start == before {
                // No progress means a malformed token. Skip it.
                self.advance();
            }
        }
        values
    }

    /// Parses an input object type definition.
    fn parse_input_object_type(
        &mut self,
        description: Option<Description>,
    ) -> InputObjectTypeDefinition {
        let start = self.current.span.start;
        self.advance(); // input

        let name = self.parse_name();
        let directives = self.parse_directives();

        let fields = if self.at_kind(TokenKind::LBrace) {
            self.advance();
            let fields = self.parse_input_value_definitions();
            self.expect(TokenKind::RBrace);
            fields
        } else {
            Vec::new()
        };

        let end = self.current.span.start;
        InputObjectTypeDefinition {
            description,
            name,
            directives,
            fields,
            span: Span::new(start, end),
        }
    }

    /// Parses a scalar type definition.
    fn parse_scalar_type(&mut self, description: Option<Description>) -> ScalarTypeDefinition {
        let start = self.current.span.start;
        self.advance(); // scalar

        let name = self.parse_name();
        let directives = self.parse_directives();

        let end = self.current.span.start;
        ScalarTypeDefinition {
            description,
            name,
            directives,
            span: Span::new(start, end),
        }
    }

    /// Parses a directive definition.
    fn parse_directive_definition(
        &mut self,
        description: Option<Description>,
    ) -> DirectiveDefinition {
        let start = self.current.span.start;
        self.advance(); // directive
        self.expect(TokenKind::At);

        let name = self.parse_name();
        let arguments = if self.at_kind(TokenKind::LParen) {
            self.advance();
            let args = self.parse_input_value_definitions();
            self.expect(TokenKind::RParen);
            args
        } else {
            Vec::new()
        };

        let repeatable = if self.at_kind(TokenKind::Repeatable) {
            self.advance();
            true
        } else {
            false
        };

        self.expect(TokenKind::On);

        let mut locations = Vec::new();
        if self.at_kind(TokenKind::Pipe) {
            self.advance();
        }
        loop {
            if let Some(loc) = DirectiveLocation::parse(self.current_text()) {
                locations.push(loc);
                self.advance();
            } else {
                self.error("expected directive location");
                break;
            }
            if self.at_kind(TokenKind::Pipe) {
                self.advance();
            } else {
                break;
            }
        }

        let end = self.current.span.start;
        DirectiveDefinition {
            description,
            name,
            arguments,
            repeatable,
            locations,
            span: Span::new(start, end),
        }
    }

    /// Parses a type extension.
    fn parse_type_extension(&mut self) -> Option<TypeExtension> {
        let start = self.current.span.start;
        self.advance(); // extend

        match self.at() {
            TokenKind::Type => Some(TypeExtension::Object(self.parse_object_extension(start))),
            TokenKind::Interface => Some(TypeExtension::Interface(
                self.parse_interface_extension(start),
            )),
            TokenKind::Union => Some(TypeExtension::Union(self.parse_union_extension(start))),
            TokenKind::Enum => Some(TypeExtension::Enum(self.parse_enum_extension(start))),
            TokenKind::Input => Some(TypeExtension::Input(self.parse_input_extension(start))),
            TokenKind::Scalar => {
                let keyword_span = self.current.span;
                self.advance();
                let name = self.parse_name();
                let _ = self.parse_directives();
                self.diagnostics.error(
                    codes::UNSUPPORTED,
                    "scalar extensions are not supported",
                    self.location(keyword_span.merge(name.span)),
                    format!("cannot extend scalar `{}`", self.interner.get(name.value)),
                );
                None
            }
            _ => {
                self.error("expected a type kind after `extend`");
                None
            }
        }
    }

    fn parse_object_extension(&mut self, start: u32) -> ObjectTypeExtension {
        self.advance(); // type
        let name = self.parse_name();
        let implements = self.parse_implements();
        let directives = self.parse_directives();
        let fields = self.parse_optional_field_block();
        let end = self.current.span.start;
        ObjectTypeExtension {
            name,
            implements,
            directives,
            fields,
            span: Span::new(start, end),
        }
    }

    fn parse_interface_extension(&mut self, start: u32) -> InterfaceTypeExtension {
        self.advance(); // interface
        let name = self.parse_name();
        let implements = self.parse_implements();
        let directives = self.parse_directives();
        let fields = self.parse_optional_field_block();
        let end = self.current.span.start;
        InterfaceTypeExtension {
            name,
            implements,
            directives,
            fields,
            span: Span::new(start, end),
        }
    }

    fn parse_union_extension(&mut self, start: u32) -> UnionTypeExtension {
        self.advance(); // union
        let name = self.parse_name();
        let directives = self.parse_directives();
        let members = self.parse_union_members();
        let end = self.current.span.start;
        UnionTypeExtension {
            name,
            directives,
            members,
            span: Span::new(start, end),
        }
    }

    fn parse_enum_extension(&mut self, start: u32) -> EnumTypeExtension {
        self.advance(); // enum
        let name = self.parse_name();
        let directives = self.parse_directives();
        let values = if self.at_kind(TokenKind::LBrace) {
            self.advance();
            let values = self.parse_enum_values();
            self.expect(TokenKind::RBrace);
            values
        } else {
            Vec::new()
        };
        let end = self.current.span.start;
        EnumTypeExtension {
            name,
            directives,
            values,
            span: Span::new(start, end),
        }
    }

    fn parse_input_extension(&mut self, start: u32) -> InputObjectTypeExtension {
        self.advance(); // input
        let name = self.parse_name();
        let directives = self.parse_directives();
        let fields = if self.at_kind(TokenKind::LBrace) {
            self.advance();
            let fields = self.parse_input_value_definitions();
            self.expect(TokenKind::RBrace);
            fields
        } else {
            Vec::new()
        };
        let end = self.current.span.start;
        InputObjectTypeExtension {
            name,
            directives,
            fields,
            span: Span::new(start, end),
        }
    }

    /// Parses an implements clause.
    fn parse_implements(&mut self) -> Vec<Name> {
        let mut implements = Vec::new();
        if self.at_kind(TokenKind::Implements) {
            self.advance();
            if self.at_kind(TokenKind::Amp) {
                self.advance();
            }
            implements.push(self.parse_name());
            while self.at_kind(TokenKind::Amp) {
                self.advance();
                implements.push(self.parse_name());
            }
        }
        implements
    }

    /// Parses a brace-delimited field block if one is present. GraphQL
    /// allows object and interface definitions without one.
    fn parse_optional_field_block(&mut self) -> Vec<FieldDefinition> {
        if self.at_kind(TokenKind::LBrace) {
            self.advance();
            let fields = self.parse_field_definitions();
            self.expect(TokenKind::RBrace);
            fields
        } else {
            Vec::new()
        }
    }

    /// Parses field definitions.
    fn parse_field_definitions(&mut self) -> Vec<FieldDefinition> {
        let mut fields = Vec::new();
        while !self.at_kind(TokenKind::RBrace) && !self.at_kind(TokenKind::Eof) {
            let before = self.current.span.start;
            let description = self.try_parse_description();
            fields.push(self.parse_field_definition(description));
            if self.current.span.start == before {
                // No progress means a malformed token. Skip it.
                self.advance();
            }
        }
        fields
    }

    /// Parses a field definition.
    fn parse_field_definition(&mut self, description: Option<Description>) -> FieldDefinition {
        let start = self.current.span.start;
        let name = self.parse_name();

        let arguments = if self.at_kind(TokenKind::LParen) {
            self.advance();
            let args = self.parse_input_value_definitions();
            self.expect(TokenKind::RParen);
            args
        } else {
            Vec::new()
        };

        self.expect(TokenKind::Colon);
        let ty = self.parse_type();
        let directives = self.parse_directives();

        let end = self.current.span.start;
        FieldDefinition {
            description,
            name,
            arguments,
            ty,
            directives,
            span: Span::new(start, end),
        }
    }

    /// Parses input value definitions.
    fn parse_input_value_definitions(&mut self) -> Vec<InputValueDefinition> {
        let mut fields = Vec::new();
        while !self.at_kind(TokenKind::RParen)
            && !self.at_kind(TokenKind::RBrace)
            && !self.at_kind(TokenKind::Eof)
        {
            let before = self.current.span.start;
            let description = self.try_parse_description();
            fields.push(self.parse_input_value_definition(description));
            if self.current.span.start == before {
                // No progress means a malformed token. Skip it.
                self.advance();
            }
        }
        fields
    }

    /// Parses an input value definition.
    fn parse_input_value_definition(
        &mut self,
        description: Option<Description>,
    ) -> InputValueDefinition {
        let start = self.current.span.start;
        let name = self.parse_name();
        self.expect(TokenKind::Colon);
        let ty = self.parse_type();

        let default_value = if self.at_kind(TokenKind::Eq) {
            self.advance();
            Some(self.parse_value())
        } else {
            None
        };

        let directives = self.parse_directives();

        let end = self.current.span.start;
        InputValueDefinition {
            description,
            name,
            ty,
            default_value,
            directives,
            span: Span::new(start, end),
        }
    }

    /// Parses a type reference: `Name`, `[T]`, or `T!`.
    fn parse_type(&mut self) -> Type {
        let start = self.current.span.start;

        let base = if self.at_kind(TokenKind::LBracket) {
            self.advance();
            let inner = self.parse_type();
            self.expect(TokenKind::RBracket);
            let end = self.current.span.start;
            Type::List(Box::new(inner), Span::new(start, end))
        } else {
            let name = self.parse_name();
            Type::Named(NamedType {
                name: name.value,
                span: name.span,
            })
        };

        if self.at_kind(TokenKind::Bang) {
            self.advance();
            let end = self.current.span.start;
            Type::NonNull(Box::new(base), Span::new(start, end))
        } else {
            base
        }
    }

    /// Parses directives.
    fn parse_directives(&mut self) -> Vec<Directive> {
        let mut directives = Vec::new();
        while self.at_kind(TokenKind::At) {
            directives.push(self.parse_directive());
        }
        directives
    }

    /// Parses a directive.
    fn parse_directive(&mut self) -> Directive {
        let start = self.current.span.start;
        self.advance(); // @

        let name = self.parse_name();
        let arguments = if self.at_kind(TokenKind::LParen) {
            self.advance();
            let args = self.parse_arguments();
            self.expect(TokenKind::RParen);
            args
        } else {
            Vec::new()
        };

        let end = self.current.span.start;
        Directive {
            name,
            arguments,
            span: Span::new(start, end),
        }
    }

    /// Parses arguments.
    fn parse_arguments(&mut self) -> Vec<Argument> {
        let mut args = Vec::new();
        while !self.at_kind(TokenKind::RParen) && !self.at_kind(TokenKind::Eof) {
            let before = self.current.span.start;
            args.push(self.parse_argument());
            if self.current.span.start == before {
                // No progress means a malformed token. Skip it.
                self.advance();
            }
        }
        args
    }

    /// Parses an argument.
    fn parse_argument(&mut self) -> Argument {
        let start = self.current.span.start;
        let name = self.parse_name();
        self.expect(TokenKind::Colon);
        let value = self.parse_value();
        let end = self.current.span.start;
        Argument {
            name,
            value,
            span: Span::new(start, end),
        }
    }

    /// Parses a constant value.
    fn parse_value(&mut self) -> Value {
        let start = self.current.span.start;

        match self.at() {
            TokenKind::IntLiteral => {
                let text = self.current_text();
                let value = text.parse().unwrap_or(0);
                self.advance();
                Value::Int(value, Span::new(start, self.current.span.start))
            }
            TokenKind::FloatLiteral => {
                let text = self.current_text();
                let value = text.parse().unwrap_or(0.0);
                self.advance();
                Value::Float(value, Span::new(start, self.current.span.start))
            }
            TokenKind::StringLiteral | TokenKind::BlockStringLiteral => {
                let value = decode_string(self.current_text());
                self.advance();
                Value::String(value, Span::new(start, self.current.span.start))
            }
            TokenKind::True => {
                self.advance();
                Value::Boolean(true, Span::new(start, self.current.span.start))
            }
            TokenKind::False => {
                self.advance();
                Value::Boolean(false, Span::new(start, self.current.span.start))
            }
            TokenKind::Null => {
                self.advance();
                Value::Null(Span::new(start, self.current.span.start))
            }
            TokenKind::LBracket => {
                self.advance();
                let mut values = Vec::new();
                while !self.at_kind(TokenKind::RBracket) && !self.at_kind(TokenKind::Eof) {
                    values.push(self.parse_value());
                }
                self.expect(TokenKind::RBracket);
                Value::List(values, Span::new(start, self.current.span.start))
            }
            TokenKind::LBrace => {
                self.advance();
                let mut fields = Vec::new();
                while !self.at_kind(TokenKind::RBrace) && !self.at_kind(TokenKind::Eof) {
                    let before = self.current.span.start;
                    let name = self.parse_name();
                    self.expect(TokenKind::Colon);
                    let value = self.parse_value();
                    fields.push((name, value));
                    if self.current.span.start == before {
                        self.advance();
                    }
                }
                self.expect(TokenKind::RBrace);
                Value::Object(fields, Span::new(start, self.current.span.start))
            }
            TokenKind::Ident => {
                let name = self.parse_name();
                Value::Enum(name)
            }
            _ => {
                self.error("expected value");
                self.advance();
                Value::Null(Span::new(start, self.current.span.start))
            }
        }
    }
}

/// Decodes a string token's raw text into its value.
fn decode_string(text: &str) -> String {
    if let Some(inner) = text.strip_prefix("\"\"\"") {
        block_string_value(inner.strip_suffix("\"\"\"").unwrap_or(inner))
    } else {
        let inner = text.strip_prefix('"').unwrap_or(text);
        let inner = inner.strip_suffix('"').unwrap_or(inner);
        string_value(inner)
    }
}

fn string_value(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let code: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&code, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&code);
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Strips the common indentation and surrounding blank lines from a
/// block string, per the BlockStringValue algorithm.
fn block_string_value(inner: &str) -> String {
    let lines: Vec<&str> = inner.split('\n').collect();

    let mut common: Option<usize> = None;
    for line in lines.iter().skip(1) {
        let indent = line.len() - line.trim_start().len();
        if indent < line.len() {
            common = Some(common.map_or(indent, |c| c.min(indent)));
        }
    }

    let mut stripped: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                *line
            } else {
                let cut = common.unwrap_or(0).min(line.len());
                &line[cut..]
            }
        })
        .collect();
    while stripped.first().is_some_and(|l| l.trim().is_empty()) {
        stripped.remove(0);
    }
    while stripped.last().is_some_and(|l| l.trim().is_empty()) {
        stripped.pop();
    }

    stripped.join("\n").replace("\\\"\"\"", "\"\"\"")
}
