//! Keel semantic core.
//!
//! The resolution and validation pipeline for the Keel language:
//! ownership-typed structs, traits, enums, and generics, compiled
//! ahead of time to C++. This crate takes a parsed declaration tree,
//! resolves every name and type across file and module boundaries,
//! instantiates generics with identity-stable caching, and enforces
//! the ownership, mutability, visibility, and unsafe rules. Lexing,
//! parsing, and the C++ emitter live outside; they feed trees in and
//! read annotations out.
//!
//! The [`Compiler`] in [`compiler`] drives the three passes and the
//! on-demand compilation of dependency modules. The building blocks
//! re-exported here come from the member crates: `keel-core` for
//! diagnostics and declaration flags, `keel-ast` for the arena-backed
//! tree, `keel-sema` for the passes themselves.

pub mod compiler;

pub use compiler::{Compiler, ModuleLoader, NoLoader};

pub mod prelude {
    pub use crate::compiler::{Compiler, ModuleLoader, NoLoader};
    pub use keel_ast::{
        Builtin, Depend, EnumDef, Expr, ExprKind, FieldDef, FileUnit, FuncDef, FuncPrototype,
        GenericParamDef, Hir, Import, Literal, Module, Owner, ParamDef, PointerAttr, Scope,
        StructDef, Symbol, TraitDef, TypeAlias, TypeDef, TypeDetail, TypeRef,
    };
    pub use keel_core::{CompileError, CompilerLog, DeclFlags, LoadError, Loc};
    pub use keel_sema::{Annotations, SemaContext};
}
