//! Semantic passes for the Keel compiler.
//!
//! Three passes run over an immutable declaration tree, in order:
//! top-level resolution binds imports and type signatures, expression
//! resolution gives every expression a type, and error checking
//! enforces visibility, mutability, ownership moves, and unsafe
//! discipline. Each pass writes its results into [`Annotations`] side
//! tables keyed by node id; the tree itself is never rewritten.
//!
//! The caller drives the passes through a [`SemaContext`], which also
//! accumulates the diagnostic log and the memo state that keeps the
//! passes idempotent.

pub mod annot;
pub mod checker;
pub mod context;
pub mod expr_resolver;
pub mod fit;
pub mod generics;
pub mod operators;
pub mod resolver;
pub mod top_level;

pub use annot::{Annotations, ExprInfo, Resolution};
pub use checker::ErrorChecker;
pub use context::SemaContext;
pub use expr_resolver::ExprResolver;
pub use fit::{ConvertKind, Fit, TypeKey};
pub use generics::SpecializationCache;
pub use operators::Operator;
pub use resolver::{Frame, Lookup, TypeResolver};
pub use top_level::TopLevelResolver;
