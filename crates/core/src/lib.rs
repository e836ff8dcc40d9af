//! astbuild-core: combinator engine and tree lifter.
//!
//! Turns the part stream produced by lexing and operator grouping into an
//! AST. A grammar is a set of named [`Combinator`]s in a [`Productions`]
//! registry; applying one emits a flat trace of [`Event`]s which [`lift()`]
//! folds into [`Tree`]s.
//!
//! # Public API
//!
//! Key types are re-exported at the crate root for convenience:
//!
//! - [`build_tree()`] -- apply a grammar per a [`BuildConfig`]
//! - [`Productions`] -- the grammar registry and its `apply`
//! - [`Combinator`] -- the combinator algebra; [`dsl`] has shorthand constructors
//! - [`lift()`] -- events to trees
//! - [`EngineError`] -- internal-consistency failures
//! - [`LogSink`] -- where diagnostics for unparsable input go
//! - Input types: [`Part`], [`CstToken`], [`Paren`], [`Comment`], [`CommentIndex`]
//! - Output types: [`Tree`], [`Value`], [`Name`]

pub mod ast;
pub mod build;
pub mod combinator;
pub mod comments;
pub mod config;
pub mod diagnostics;
pub mod dsl;
pub mod error;
pub mod event;
pub mod lift;
pub mod part;
pub mod productions;
pub mod source;

// ── Convenience re-exports: key types ────────────────────────────────

pub use ast::{BuiltinFn, InnerTreeType, LeafTreeType, Name, Tree, TreeType, Value};
pub use combinator::{Combinator, Context, CounterOwner, Garbage};
pub use comments::{Comment, CommentIndex, CommentType, Side};
pub use config::BuildConfig;
pub use diagnostics::{
    Diagnostic, ListBackedLogSink, LogSink, MessageTemplate, Severity, TracingLogSink,
};
pub use error::EngineError;
pub use event::{Event, FinishedType, LeafEvent};
pub use part::{CstToken, OperatorType, Paren, Part, TokenType};
pub use source::{CodeLocation, Position};

// ── Convenience re-exports: entry points ─────────────────────────────

pub use build::build_tree;
pub use lift::lift;
pub use productions::Productions;
