//! Core utilities for loomql.
//!
//! This crate provides foundational types used throughout loomql:
//! - `span`: Source location tracking across schema fragments
//! - `text`: String interning
//! - `diagnostics`: Error reporting

pub mod diagnostics;
pub mod span;
pub mod text;

pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticSeverity, Label};
pub use span::{FragmentId, Location, Span};
pub use text::{Interner, Text};
