//! Typed arena handles.
//!
//! Every node in the declaration tree lives in one of the [`Hir`] arenas
//! and is addressed by a small copyable id. Cross-module references are
//! plain ids because the arenas are workspace-global. Pass outputs are
//! keyed by these ids, which is what keeps the tree itself immutable
//! after construction.
//!
//! [`Hir`]: crate::hir::Hir

use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Create an id with the given arena index.
            #[inline]
            pub const fn new(index: u32) -> Self {
                Self(index)
            }

            /// Get the underlying arena index.
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }

        impl From<u32> for $name {
            fn from(index: u32) -> Self {
                Self::new(index)
            }
        }
    };
}

define_id! {
    /// A compiled module.
    ModuleId, "module"
}
define_id! {
    /// A source file inside a module.
    UnitId, "unit"
}
define_id! {
    /// A struct, enum, trait, or generic-parameter definition.
    TypeDefId, "type"
}
define_id! {
    /// A function or method definition.
    FuncId, "func"
}
define_id! {
    /// A field definition; local variables reuse this node shape.
    FieldId, "field"
}
define_id! {
    /// A type alias definition.
    AliasId, "alias"
}
define_id! {
    /// A function parameter definition.
    ParamId, "param"
}
define_id! {
    /// An expression node.
    ExprId, "expr"
}
define_id! {
    /// A statement node.
    StmtId, "stmt"
}
define_id! {
    /// One occurrence of a type in source or one synthesized during
    /// resolution. Occurrences are never shared: resolving the same
    /// spelling in two places can produce different answers.
    TypeRefId, "tref"
}
