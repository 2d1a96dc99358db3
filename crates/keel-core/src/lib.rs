//! Core types shared by every stage of the Keel compiler.
//!
//! This crate holds the leaf vocabulary of the semantic pipeline: source
//! locations, declaration modifier flags, and the diagnostic types that
//! every pass reports through.

pub mod error;
pub mod flags;
pub mod loc;

pub use error::{CompileError, CompilerLog, LoadError};
pub use flags::DeclFlags;
pub use loc::Loc;
