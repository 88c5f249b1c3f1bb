//! Syntax layer for loomql.
//!
//! This crate provides:
//! - `token`: Token kinds and token structures
//! - `lexer`: Tokenization
//! - `ast`: Abstract syntax tree for type-system documents
//! - `parser`: Recursive descent parser
//!
//! Only type-system documents are covered: type definitions, type
//! extensions, directive definitions, and schema definitions. Executable
//! documents (operations, selection sets) are outside this crate's scope.

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::*;
pub use lexer::Lexer;
pub use parser::{parse, ParseResult};
pub use token::{DirectiveLocation, Token, TokenKind};
