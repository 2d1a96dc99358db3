//! Expression nodes.
//!
//! Expressions arrive from the parser untyped; the resolver assigns
//! every node a type (and, where it applies, a declaration and an
//! operator method) through side tables keyed by [`ExprId`].
//!
//! [`ExprId`]: crate::ids::ExprId

use keel_core::Loc;

use crate::ids::{ExprId, ParamId, StmtId, TypeRefId};

/// Literal payloads.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Binary operators surfaced by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    /// Logical `&&`.
    And,
    /// Logical `||`.
    Or,
}

impl BinaryOp {
    /// Source spelling, for diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }

    /// Whether this operator compares its operands.
    pub const fn is_compare(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge
        )
    }

    /// Whether this operator is logical and/or.
    pub const fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or)
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Numeric negation.
    Neg,
    /// Logical not.
    Not,
    /// Ownership transfer out of a local slot.
    Move,
    /// Pointer dereference.
    Deref,
    /// Address-of; yields a raw pointer to the operand.
    AddrOf,
}

impl UnaryOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::Move => "move",
            UnaryOp::Deref => "*",
            UnaryOp::AddrOf => "&",
        }
    }
}

/// Compound and plain assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
}

impl AssignOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
        }
    }

    /// Whether this is a compound form (`+=` etc).
    pub const fn is_compound(self) -> bool {
        !matches!(self, AssignOp::Assign)
    }
}

/// One call or init-block argument, optionally named.
#[derive(Debug, Clone)]
pub struct CallArg {
    pub name: Option<String>,
    pub value: ExprId,
}

impl CallArg {
    pub fn positional(value: ExprId) -> Self {
        Self { name: None, value }
    }

    pub fn named(name: impl Into<String>, value: ExprId) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }
}

/// Expression shapes.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// A name, optionally qualified: `x`, `pod::x`, `Color::Red`.
    /// The namespace is itself an `Id` expression.
    Id { ns: Option<ExprId>, name: String },
    /// The receiver inside a method.
    This,
    Literal(Literal),
    /// Member access `a.b`.
    Access { target: ExprId, name: String },
    Unary { op: UnaryOp, operand: ExprId },
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    Assign {
        op: AssignOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    Call { callee: ExprId, args: Vec<CallArg> },
    Index { target: ExprId, index: ExprId },
    /// Explicit generic application `T<Args>` in expression position.
    GenericInstance {
        target: ExprId,
        args: Vec<TypeRefId>,
    },
    /// Construction `T{...}` for structs and arrays.
    InitBlock { target: ExprId, args: Vec<CallArg> },
    /// Runtime pointer test `x is T`.
    Is { expr: ExprId, ty: TypeRefId },
    /// Runtime pointer cast `x as T`.
    As { expr: ExprId, ty: TypeRefId },
    /// `cond ? then : else`.
    Ternary {
        cond: ExprId,
        then: ExprId,
        els: ExprId,
    },
    /// A type used in value position; resolves to the meta-type.
    TypeExpr { ty: TypeRefId },
    Closure {
        params: Vec<ParamId>,
        ret: TypeRefId,
        body: StmtId,
    },
}

/// An expression node.
#[derive(Debug, Clone)]
pub struct Expr {
    pub loc: Loc,
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(kind: ExprKind, loc: Loc) -> Self {
        Self { loc, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_spellings() {
        assert_eq!(BinaryOp::Add.as_str(), "+");
        assert_eq!(BinaryOp::Le.as_str(), "<=");
        assert_eq!(UnaryOp::Move.as_str(), "move");
        assert_eq!(AssignOp::DivAssign.as_str(), "/=");
    }

    #[test]
    fn compare_predicate() {
        assert!(BinaryOp::Eq.is_compare());
        assert!(BinaryOp::Ge.is_compare());
        assert!(!BinaryOp::Add.is_compare());
        assert!(!BinaryOp::And.is_compare());
    }

    #[test]
    fn compound_assign_predicate() {
        assert!(AssignOp::AddAssign.is_compound());
        assert!(!AssignOp::Assign.is_compound());
    }
}
