//! Declaration tree for the Keel semantic core.
//!
//! The external parser targets this crate: it allocates modules,
//! files, declarations, statements, and expressions into the [`Hir`]
//! arenas and hands the result to the semantic passes. Nothing in the
//! tree is mutated after construction; resolution results live in side
//! tables inside the sema crate, keyed by the ids defined here.

pub mod builtin;
pub mod decl;
pub mod expr;
pub mod hir;
pub mod ids;
pub mod scope;
pub mod stmt;
pub mod types;

pub use builtin::Builtin;
pub use decl::{
    Depend, EnumDef, FieldDef, FileUnit, FuncDef, FuncPrototype, GenericParamDef, Import, Module,
    Owner, ParamDef, StructDef, TraitDef, TypeAlias, TypeDef,
};
pub use expr::{AssignOp, BinaryOp, CallArg, Expr, ExprKind, Literal, UnaryOp};
pub use hir::Hir;
pub use ids::{
    AliasId, ExprId, FieldId, FuncId, ModuleId, ParamId, StmtId, TypeDefId, TypeRefId, UnitId,
};
pub use scope::{Scope, Symbol};
pub use stmt::{Stmt, StmtKind, SwitchCase};
pub use types::{PointerAttr, TypeDetail, TypeRef};
