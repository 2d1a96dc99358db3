//! Statement nodes.

use keel_core::Loc;

use crate::ids::{ExprId, FieldId, StmtId};

/// One arm of a switch statement.
#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub label: ExprId,
    pub body: StmtId,
}

/// Statement shapes.
#[derive(Debug, Clone)]
pub enum StmtKind {
    Block(Vec<StmtId>),
    Expr(ExprId),
    /// A local variable declaration; the field node carries the
    /// declared type and initializer.
    LocalVar(FieldId),
    If {
        cond: ExprId,
        then: StmtId,
        els: Option<StmtId>,
    },
    While { cond: ExprId, body: StmtId },
    For {
        init: Option<StmtId>,
        cond: Option<ExprId>,
        update: Option<ExprId>,
        body: StmtId,
    },
    Switch {
        cond: ExprId,
        cases: Vec<SwitchCase>,
        default: Option<StmtId>,
    },
    Return(Option<ExprId>),
    Break,
    Continue,
    /// Lexical unsafe region.
    Unsafe(StmtId),
}

/// A statement node.
#[derive(Debug, Clone)]
pub struct Stmt {
    pub loc: Loc,
    pub kind: StmtKind,
}

impl Stmt {
    pub fn new(kind: StmtKind, loc: Loc) -> Self {
        Self { loc, kind }
    }
}
