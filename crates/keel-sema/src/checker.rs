//! Third pass: error checking.
//!
//! Runs after every expression has a type and consumes only the side
//! tables, so it never looks names up. Declaration shapes, visibility,
//! mutability, ownership moves, and unsafe discipline are all enforced
//! here; anything that made it through the first two passes without a
//! diagnostic is structurally sound, and this pass decides whether it
//! is allowed.

use keel_ast::{
    AssignOp, Builtin, CallArg, ExprId, ExprKind, FieldId, FuncId, Hir, ModuleId, Owner,
    PointerAttr, StmtId, StmtKind, Symbol, TypeDef, TypeDefId, TypeDetail, TypeRefId, UnaryOp,
};
use keel_core::{CompileError, CompilerLog, DeclFlags, Loc};

use crate::annot::Annotations;
use crate::context::{member_flags, symbol_module, SemaContext};
use crate::fit::{self, Fit};
use crate::operators::Operator;

// ============================================================================
// ErrorChecker
// ============================================================================

/// The checking pass over one module.
pub struct ErrorChecker<'a> {
    hir: &'a Hir,
    builtin: &'a Builtin,
    annot: &'a mut Annotations,
    log: &'a mut CompilerLog,
    cur_module: ModuleId,
    cur_type: Option<TypeDefId>,
    /// Enclosing functions: declared return type, declared unsafe.
    funcs: Vec<(TypeRefId, bool)>,
    unsafe_depth: u32,
}

impl<'a> ErrorChecker<'a> {
    /// Check every declaration and body in `module`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(hir: &'a Hir, builtin: &'a Builtin, ctx: &'a mut SemaContext, module: ModuleId) {
        let mut this = ErrorChecker {
            hir,
            builtin,
            annot: &mut ctx.annot,
            log: &mut ctx.log,
            cur_module: module,
            cur_type: None,
            funcs: Vec::new(),
            unsafe_depth: 0,
        };
        for unit in &hir.module(module).units {
            let u = hir.unit(*unit);
            for field in &u.fields {
                this.check_top_field(*field);
            }
            for func in &u.funcs {
                this.check_func(*func);
            }
            for def in &u.type_defs {
                this.check_type_def(*def);
            }
        }
    }

    fn in_unsafe(&self) -> bool {
        self.unsafe_depth > 0 || self.funcs.last().is_some_and(|(_, u)| *u)
    }

    fn slot_type(&self, f: FieldId) -> Option<TypeRefId> {
        self.annot.field_type(f).or(self.hir.field(f).ty)
    }

    // ------------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------------

    fn check_top_field(&mut self, f: FieldId) {
        let fd = self.hir.field(f);
        if !fd.flags.contains(DeclFlags::CONST) && !fd.flags.contains(DeclFlags::UNSAFE) {
            self.log.push(CompileError::NonConstStatic {
                name: fd.name.clone(),
                loc: fd.loc.clone(),
            });
        }
        if let Some(init) = fd.init {
            self.check_expr(init);
        }
        self.check_field_init(f, false);
    }

    /// Initializer fit and uninitialized-pointer rules shared by
    /// top-level variables, members, and locals.
    fn check_field_init(&mut self, f: FieldId, member: bool) {
        let fd = self.hir.field(f);
        let Some(slot) = self.slot_type(f) else {
            return;
        };
        match fd.init {
            Some(init) => self.check_assign_fit(init, slot),
            None => {
                if member {
                    return;
                }
                let slot_ref = self.hir.type_ref(slot);
                if slot_ref.detail.is_pointer() && !slot_ref.is_nullable() {
                    self.log.push(CompileError::UninitPointer {
                        name: fd.name.clone(),
                        loc: fd.loc.clone(),
                    });
                }
            }
        }
    }

    /// Whether a value expression satisfies a slot, recording the
    /// conversion hint and demanding `move` where ownership transfers.
    fn check_assign_fit(&mut self, value: ExprId, slot: TypeRefId) {
        let Some(vty) = self.annot.expr_type(value) else {
            return;
        };
        match fit::fit(self.hir, self.annot, self.builtin, vty, slot) {
            Fit::Yes => self.check_move_requirement(value),
            Fit::Convert(k) => self.annot.set_expr_convert(value, k),
            Fit::No => self.log.push(CompileError::TypeMismatch {
                expected: self.hir.type_display(slot),
                found: self.hir.type_display(vty),
                loc: self.hir.expr(value).loc.clone(),
            }),
        }
    }

    /// A non-copyable value read out of a named slot must be moved.
    fn check_move_requirement(&mut self, value: ExprId) {
        let Some(vty) = self.annot.expr_type(value) else {
            return;
        };
        if fit::is_copyable(self.hir, self.annot, vty) {
            return;
        }
        match &self.hir.expr(value).kind {
            ExprKind::Unary {
                op: UnaryOp::Move, ..
            } => {}
            ExprKind::Id { .. } | ExprKind::Access { .. } => {
                if matches!(
                    self.annot.expr_def(value),
                    Some(Symbol::Field(_)) | Some(Symbol::Param(_))
                ) {
                    self.log.push(CompileError::MissMoveKeyword {
                        loc: self.hir.expr(value).loc.clone(),
                    });
                }
            }
            _ => {}
        }
    }

    fn check_type_def(&mut self, d: TypeDefId) {
        match self.hir.type_def(d) {
            TypeDef::Struct(s) => {
                if s.generic_from.is_some() {
                    return;
                }
                self.cur_type = Some(d);
                self.check_inherits(&s.inherits);
                for field in &s.fields {
                    self.check_member_field(*field);
                }
                for func in &s.funcs {
                    self.check_func(*func);
                }
                self.cur_type = None;
            }
            TypeDef::Enum(e) => {
                for field in &e.fields {
                    let fd = self.hir.field(*field);
                    if let Some(init) = fd.init {
                        self.check_expr(init);
                        let is_int = self
                            .annot
                            .expr_type(init)
                            .and_then(|t| self.annot.resolved_def(t))
                            .is_some_and(|def| def == self.builtin.int_def);
                        if !is_int {
                            self.log.push(CompileError::MustBeInt {
                                loc: self.hir.expr(init).loc.clone(),
                            });
                        }
                    }
                }
            }
            TypeDef::Trait(t) => {
                for func in &t.funcs {
                    self.check_func(*func);
                }
            }
            TypeDef::GenericParam(_) => {}
        }
    }

    fn check_inherits(&mut self, inherits: &[TypeRefId]) {
        let mut struct_bases = 0usize;
        for inherit in inherits {
            let Some(base) = self.annot.resolved_def(*inherit) else {
                continue;
            };
            let loc = self.hir.type_ref(*inherit).loc.clone();
            match self.hir.type_def(base) {
                TypeDef::Struct(b) => {
                    struct_bases += 1;
                    if struct_bases > 1 {
                        self.log.push(CompileError::MultipleBaseStructs { loc });
                        continue;
                    }
                    if !b.flags.allows_inheritance() {
                        self.log.push(CompileError::BaseNotVirtual {
                            name: b.name.clone(),
                            loc,
                        });
                    }
                }
                TypeDef::Trait(_) => {}
                other => {
                    self.log.push(CompileError::InvalidInherit {
                        name: other.name().to_string(),
                        loc,
                    });
                }
            }
        }
    }

    fn check_member_field(&mut self, f: FieldId) {
        let fd = self.hir.field(f);
        if fd.flags.contains(DeclFlags::STATIC)
            && !fd.flags.contains(DeclFlags::CONST)
            && !fd.flags.contains(DeclFlags::UNSAFE)
        {
            self.log.push(CompileError::NonConstStatic {
                name: fd.name.clone(),
                loc: fd.loc.clone(),
            });
        }
        if let Some(init) = fd.init {
            self.check_expr(init);
        }
        self.check_field_init(f, true);
    }

    fn check_func(&mut self, f: FuncId) {
        let fd = self.hir.func(f);
        if fd.generic_from.is_some() {
            return;
        }
        let is_method = matches!(fd.owner, Owner::Type(_));
        let in_trait = matches!(
            fd.owner,
            Owner::Type(t) if matches!(self.hir.type_def(t), TypeDef::Trait(_))
        );
        let struct_flags = match fd.owner {
            Owner::Type(t) => match self.hir.type_def(t) {
                TypeDef::Struct(s) => Some(s.flags),
                _ => None,
            },
            _ => None,
        };

        self.check_func_flags(f, is_method, struct_flags);
        if fd.body.is_none()
            && !fd.flags.contains(DeclFlags::ABSTRACT)
            && !in_trait
        {
            self.log.push(CompileError::MissingBody {
                name: fd.name.clone(),
                loc: fd.loc.clone(),
            });
        }
        self.check_param_positions(f);
        if fd.flags.contains(DeclFlags::OPERATOR) && is_method {
            self.check_operator_shape(f);
        }

        self.funcs
            .push((fd.prototype.ret, fd.flags.contains(DeclFlags::UNSAFE)));
        for p in &fd.prototype.params {
            let pd = self.hir.param(*p);
            if let Some(default) = pd.default {
                self.check_expr(default);
                self.check_assign_fit(default, pd.ty);
            }
        }
        if let Some(body) = fd.body {
            self.check_stmt(body);
        }
        self.funcs.pop();
    }

    fn check_func_flags(&mut self, f: FuncId, is_method: bool, struct_flags: Option<DeclFlags>) {
        let fd = self.hir.func(f);
        let flags = fd.flags;
        let mut invalid = |detail: &str, log: &mut CompilerLog| {
            log.push(CompileError::InvalidFlags {
                detail: detail.to_string(),
                loc: fd.loc.clone(),
            });
        };
        if flags.contains(DeclFlags::READONLY) {
            invalid("readonly on a function", self.log);
        }
        if !is_method {
            if flags.contains(DeclFlags::OPERATOR) {
                invalid("operator on a free function", self.log);
            }
            if flags.contains(DeclFlags::VIRTUAL) {
                invalid("virtual on a free function", self.log);
            }
            if flags.contains(DeclFlags::ABSTRACT) {
                invalid("abstract on a free function", self.log);
            }
            if flags.contains(DeclFlags::STATIC) {
                invalid("static on a free function", self.log);
            }
            return;
        }
        if let Some(owner) = struct_flags {
            if flags.contains(DeclFlags::VIRTUAL) && !owner.allows_inheritance() {
                invalid("virtual method on a sealed struct", self.log);
            }
            if flags.contains(DeclFlags::ABSTRACT) && !owner.contains(DeclFlags::ABSTRACT) {
                invalid("abstract method on a non-abstract struct", self.log);
            }
        }
        if flags.contains(DeclFlags::ABSTRACT) && fd.body.is_some() {
            invalid("abstract function with a body", self.log);
        }
        if flags.contains(DeclFlags::ABSTRACT) && flags.contains(DeclFlags::STATIC) {
            invalid("abstract static function", self.log);
        }
        if flags.contains(DeclFlags::STATIC) && fd.is_mutable() {
            invalid("static mutable function", self.log);
        }
    }

    fn check_param_positions(&mut self, f: FuncId) {
        let fd = self.hir.func(f);
        let params = &fd.prototype.params;
        let mut seen_default = false;
        for (i, p) in params.iter().enumerate() {
            let pd = self.hir.param(*p);
            if pd.default.is_some() {
                seen_default = true;
            } else if seen_default && !self.is_vararg(pd.ty) {
                self.log.push(CompileError::DefaultParamPosition {
                    loc: pd.loc.clone(),
                });
            }
            if self.is_vararg(pd.ty) && i + 1 != params.len() {
                self.log
                    .push(CompileError::VarargPosition { loc: pd.loc.clone() });
            }
        }
    }

    fn is_vararg(&self, ty: TypeRefId) -> bool {
        self.annot.resolved_def(ty) == Some(self.builtin.vararg_def)
    }

    fn check_operator_shape(&mut self, f: FuncId) {
        let fd = self.hir.func(f);
        let Some(op) = Operator::from_method_name(&fd.name) else {
            self.log.push(CompileError::InvalidOperator {
                name: fd.name.clone(),
                detail: "unknown operator method",
                loc: fd.loc.clone(),
            });
            return;
        };
        if fd.prototype.params.len() != op.param_count() {
            self.log.push(CompileError::InvalidOperator {
                name: fd.name.clone(),
                detail: op.arity_detail(),
                loc: fd.loc.clone(),
            });
        }
        let ret_def = self.annot.resolved_def(fd.prototype.ret);
        if op.needs_return() && ret_def == Some(self.builtin.void_def) {
            self.log.push(CompileError::InvalidOperator {
                name: fd.name.clone(),
                detail: "must return a value",
                loc: fd.loc.clone(),
            });
        }
        if op == Operator::Compare && ret_def.is_some_and(|d| d != self.builtin.int_def) {
            self.log.push(CompileError::InvalidOperator {
                name: fd.name.clone(),
                detail: "must return Int",
                loc: fd.loc.clone(),
            });
        }
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    fn check_stmt(&mut self, s: StmtId) {
        let stmt = self.hir.stmt(s);
        match &stmt.kind {
            StmtKind::Block(stmts) => {
                for inner in stmts {
                    self.check_stmt(*inner);
                }
            }
            StmtKind::Expr(e) => self.check_expr(*e),
            StmtKind::LocalVar(f) => {
                if let Some(init) = self.hir.field(*f).init {
                    self.check_expr(init);
                }
                self.check_field_init(*f, false);
            }
            StmtKind::If { cond, then, els } => {
                self.check_expr(*cond);
                self.verify_bool(*cond);
                self.check_stmt(*then);
                if let Some(els) = els {
                    self.check_stmt(*els);
                }
            }
            StmtKind::While { cond, body } => {
                self.check_expr(*cond);
                self.verify_bool(*cond);
                self.check_stmt(*body);
            }
            StmtKind::For {
                init,
                cond,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.check_stmt(*init);
                }
                if let Some(cond) = cond {
                    self.check_expr(*cond);
                    self.verify_bool(*cond);
                }
                if let Some(update) = update {
                    self.check_expr(*update);
                }
                self.check_stmt(*body);
            }
            StmtKind::Switch {
                cond,
                cases,
                default,
            } => {
                self.check_expr(*cond);
                self.verify_int(*cond);
                for case in cases {
                    self.check_expr(case.label);
                    self.verify_int(case.label);
                    self.check_stmt(case.body);
                }
                if let Some(default) = default {
                    self.check_stmt(*default);
                }
            }
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.check_expr(*value);
                    if let Some((ret, _)) = self.funcs.last().copied() {
                        if let Some(vty) = self.annot.expr_type(*value) {
                            if fit::fit(self.hir, self.annot, self.builtin, vty, ret) == Fit::Yes {
                                self.check_move_requirement(*value);
                            }
                        }
                    }
                }
            }
            StmtKind::Break | StmtKind::Continue => {}
            StmtKind::Unsafe(inner) => {
                self.unsafe_depth += 1;
                self.check_stmt(*inner);
                self.unsafe_depth -= 1;
            }
        }
    }

    fn verify_bool(&mut self, e: ExprId) {
        let def = self
            .annot
            .expr_type(e)
            .and_then(|t| self.annot.resolved_def(t));
        if def.is_some_and(|d| d != self.builtin.bool_def) {
            self.log.push(CompileError::MustBeBool {
                loc: self.hir.expr(e).loc.clone(),
            });
        }
    }

    fn verify_int(&mut self, e: ExprId) {
        let def = self
            .annot
            .expr_type(e)
            .and_then(|t| self.annot.resolved_def(t));
        if def.is_some_and(|d| d != self.builtin.int_def) {
            self.log.push(CompileError::MustBeInt {
                loc: self.hir.expr(e).loc.clone(),
            });
        }
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    fn check_expr(&mut self, e: ExprId) {
        let expr = self.hir.expr(e);
        match &expr.kind {
            ExprKind::Id { .. } => self.check_use(e, &expr.loc),
            ExprKind::This | ExprKind::Literal(_) | ExprKind::TypeExpr { .. } => {}
            ExprKind::Access { target, name } => {
                self.check_expr(*target);
                self.check_member_access(e, *target, name, &expr.loc);
            }
            ExprKind::Unary { op, operand } => {
                self.check_expr(*operand);
                match op {
                    UnaryOp::Move => self.check_move_legality(*operand, &expr.loc),
                    UnaryOp::Deref => self.check_raw_deref(*operand, &expr.loc),
                    UnaryOp::Not => self.verify_bool(*operand),
                    UnaryOp::Neg | UnaryOp::AddrOf => {}
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.check_expr(*lhs);
                self.check_expr(*rhs);
                if op.is_logical() {
                    self.verify_bool(*lhs);
                    self.verify_bool(*rhs);
                }
            }
            ExprKind::Assign { op, lhs, rhs } => {
                self.check_expr(*lhs);
                self.check_expr(*rhs);
                self.check_assign(e, *op, *lhs, *rhs, &expr.loc);
            }
            ExprKind::Call { callee, args } => {
                self.check_expr(*callee);
                for arg in args {
                    self.check_expr(arg.value);
                }
                self.check_call(*callee, args, &expr.loc);
            }
            ExprKind::Index { target, index } => {
                self.check_expr(*target);
                self.check_expr(*index);
                let is_array = self
                    .annot
                    .expr_type(*target)
                    .is_some_and(|t| matches!(self.hir.type_ref(t).detail, TypeDetail::Array { .. }));
                if is_array {
                    self.verify_int(*index);
                }
            }
            ExprKind::GenericInstance { .. } => {}
            ExprKind::InitBlock { target, args } => {
                for arg in args {
                    self.check_expr(arg.value);
                }
                self.check_init_block(e, *target, args, &expr.loc);
            }
            ExprKind::Is { expr: inner, .. } | ExprKind::As { expr: inner, .. } => {
                self.check_expr(*inner);
            }
            ExprKind::Ternary { cond, then, els } => {
                self.check_expr(*cond);
                self.verify_bool(*cond);
                self.check_expr(*then);
                self.check_expr(*els);
            }
            ExprKind::Closure { ret, body, .. } => {
                self.funcs.push((*ret, false));
                self.check_stmt(*body);
                self.funcs.pop();
            }
        }
    }

    /// Use-site rules for an unqualified or qualified name.
    fn check_use(&mut self, e: ExprId, loc: &Loc) {
        let Some(sym) = self.annot.expr_def(e) else {
            return;
        };
        let (flags, name, top_level) = match sym {
            Symbol::Field(f) => {
                let fd = self.hir.field(f);
                (fd.flags, fd.name.clone(), matches!(fd.owner, Owner::Unit(_)))
            }
            Symbol::Func(f) => {
                let fd = self.hir.func(f);
                (fd.flags, fd.name.clone(), matches!(fd.owner, Owner::Unit(_)))
            }
            Symbol::Type(d) => {
                let td = self.hir.type_def(d);
                (
                    td.flags(),
                    td.name().to_string(),
                    matches!(td.owner(), Owner::Unit(_)),
                )
            }
            _ => return,
        };
        if flags.contains(DeclFlags::UNSAFE) && !self.in_unsafe() {
            self.log
                .push(CompileError::MissingUnsafe { loc: loc.clone() });
        }
        if top_level && flags.is_module_scoped() {
            let home = symbol_module(self.hir, sym);
            if home.is_some_and(|m| m != self.cur_module) {
                self.log.push(CompileError::ModuleScopedAccess {
                    name,
                    loc: loc.clone(),
                });
            }
        }
    }

    /// Visibility and unsafe rules for `target.name`.
    fn check_member_access(&mut self, e: ExprId, target: ExprId, name: &str, loc: &Loc) {
        // Reading through a raw pointer is unsafe, except through this.
        let target_raw = self
            .annot
            .expr_type(target)
            .is_some_and(|t| self.hir.type_ref(t).pointer_attr() == Some(PointerAttr::Raw));
        let through_this = matches!(self.hir.expr(target).kind, ExprKind::This);
        if target_raw && !through_this && !self.in_unsafe() {
            self.log
                .push(CompileError::MissingUnsafe { loc: loc.clone() });
        }

        let Some(sym) = self.annot.expr_def(e) else {
            return;
        };
        let Some(flags) = member_flags(self.hir, sym) else {
            return;
        };
        let owner = match sym {
            Symbol::Field(f) => self.hir.field(f).owner,
            Symbol::Func(f) => self.hir.func(f).owner,
            _ => return,
        };
        let Owner::Type(declared_in) = owner else {
            return;
        };
        if flags.contains(DeclFlags::UNSAFE) && !self.in_unsafe() {
            self.log
                .push(CompileError::MissingUnsafe { loc: loc.clone() });
        }
        if flags.contains(DeclFlags::PRIVATE) && self.cur_type != Some(declared_in) {
            self.log.push(CompileError::PrivateAccess {
                name: name.to_string(),
                loc: loc.clone(),
            });
            return;
        }
        if flags.contains(DeclFlags::PROTECTED) {
            let allowed = match self.cur_type {
                Some(ct) => {
                    ct == declared_in || fit::inherits_from(self.hir, self.annot, ct, declared_in)
                }
                None => false,
            };
            if !allowed {
                self.log.push(CompileError::ProtectedAccess {
                    name: name.to_string(),
                    loc: loc.clone(),
                });
            }
        }
    }

    fn check_move_legality(&mut self, operand: ExprId, loc: &Loc) {
        match self.annot.expr_def(operand) {
            Some(Symbol::Field(f)) => {
                if !self.hir.field(f).is_local {
                    self.log.push(CompileError::InvalidMove { loc: loc.clone() });
                }
            }
            Some(Symbol::Param(_)) => {}
            _ => {
                self.log.push(CompileError::CannotMove { loc: loc.clone() });
            }
        }
    }

    fn check_raw_deref(&mut self, operand: ExprId, loc: &Loc) {
        let raw = self
            .annot
            .expr_type(operand)
            .is_some_and(|t| self.hir.type_ref(t).pointer_attr() == Some(PointerAttr::Raw));
        if raw && !self.in_unsafe() {
            self.log
                .push(CompileError::MissingUnsafe { loc: loc.clone() });
        }
    }

    // ------------------------------------------------------------------------
    // Assignment
    // ------------------------------------------------------------------------

    fn check_assign(&mut self, _e: ExprId, op: AssignOp, lhs: ExprId, rhs: ExprId, loc: &Loc) {
        if !self.is_assignable(lhs) {
            self.log.push(CompileError::NotAssignable { loc: loc.clone() });
            return;
        }
        if !op.is_compound() && self.same_slot(lhs, rhs) {
            self.log.push(CompileError::SelfAssign { loc: loc.clone() });
        }

        let Some(lty) = self.annot.expr_type(lhs) else {
            return;
        };
        if self.hir.type_ref(lty).imutable {
            self.log
                .push(CompileError::ImmutableWrite { loc: loc.clone() });
        }
        if let Some(Symbol::Field(f)) = self.annot.expr_def(lhs) {
            let fd = self.hir.field(f);
            if fd.flags.contains(DeclFlags::READONLY) {
                let declared_in = match fd.owner {
                    Owner::Type(d) => Some(d),
                    _ => None,
                };
                if declared_in != self.cur_type {
                    self.log.push(CompileError::ReadonlyWrite {
                        name: fd.name.clone(),
                        loc: loc.clone(),
                    });
                }
            }
        }

        if op.is_compound() {
            // Non-numeric compound forms dispatched to an operator
            // method during resolution; here a numeric left side demands
            // the same numeric type on the right. No silent narrowing.
            let l_def = self.annot.resolved_def(lty);
            let l_num = l_def.is_some_and(|d| self.builtin.is_num_def(d));
            let r_def = self
                .annot
                .expr_type(rhs)
                .and_then(|t| self.annot.resolved_def(t));
            if l_num && r_def.is_some() && r_def != l_def {
                if let Some(rty) = self.annot.expr_type(rhs) {
                    self.log.push(CompileError::InvalidOperation {
                        op: op.as_str().to_string(),
                        type_name: self.hir.type_display(rty),
                        loc: loc.clone(),
                    });
                }
            }
            return;
        }
        self.check_assign_fit(rhs, lty);
    }

    fn is_assignable(&self, lhs: ExprId) -> bool {
        match &self.hir.expr(lhs).kind {
            ExprKind::Id { .. } => matches!(
                self.annot.expr_def(lhs),
                Some(Symbol::Field(_)) | Some(Symbol::Param(_))
            ),
            ExprKind::Access { .. } => {
                matches!(self.annot.expr_def(lhs), Some(Symbol::Field(_)))
            }
            ExprKind::Index { .. } => true,
            ExprKind::Unary {
                op: UnaryOp::Deref, ..
            } => true,
            _ => false,
        }
    }

    /// Whether two expressions name the same storage.
    fn same_slot(&self, a: ExprId, b: ExprId) -> bool {
        let (ea, eb) = (&self.hir.expr(a).kind, &self.hir.expr(b).kind);
        match (ea, eb) {
            (ExprKind::This, ExprKind::This) => true,
            (ExprKind::Id { .. }, ExprKind::Id { .. }) => {
                let (da, db) = (self.annot.expr_def(a), self.annot.expr_def(b));
                da.is_some() && da == db
            }
            (
                ExprKind::Access { target: ta, name: na },
                ExprKind::Access { target: tb, name: nb },
            ) => na == nb && self.same_slot(*ta, *tb),
            // x and this.x are the same slot inside a method.
            (ExprKind::Id { .. }, ExprKind::Access { target, .. })
            | (ExprKind::Access { target, .. }, ExprKind::Id { .. }) => {
                let (da, db) = (self.annot.expr_def(a), self.annot.expr_def(b));
                matches!(self.hir.expr(*target).kind, ExprKind::This)
                    && da.is_some()
                    && da == db
            }
            _ => false,
        }
    }

    // ------------------------------------------------------------------------
    // Calls
    // ------------------------------------------------------------------------

    fn check_call(&mut self, callee: ExprId, args: &[CallArg], loc: &Loc) {
        match self.annot.expr_def(callee) {
            Some(Symbol::Func(f)) => self.check_func_call(f, callee, args, loc),
            _ => self.check_value_call(callee, args, loc),
        }
    }

    fn check_func_call(&mut self, f: FuncId, callee: ExprId, args: &[CallArg], loc: &Loc) {
        let fd = self.hir.func(f);
        let params = &fd.prototype.params;
        let has_vararg = params
            .last()
            .is_some_and(|p| self.is_vararg(self.hir.param(*p).ty));
        let fixed = if has_vararg {
            params.len() - 1
        } else {
            params.len()
        };
        let required = params[..fixed]
            .iter()
            .filter(|p| self.hir.param(**p).default.is_none())
            .count();

        if args.len() < required || (!has_vararg && args.len() > params.len()) {
            self.log.push(CompileError::ArgCountMismatch {
                expected: required,
                found: args.len(),
                loc: loc.clone(),
            });
            return;
        }

        for (i, arg) in args.iter().enumerate() {
            if i >= fixed {
                break;
            }
            let pd = self.hir.param(params[i]);
            if let Some(name) = &arg.name {
                if *name != pd.name {
                    self.log.push(CompileError::ArgNameMismatch {
                        expected: pd.name.clone(),
                        found: name.clone(),
                        loc: self.hir.expr(arg.value).loc.clone(),
                    });
                    continue;
                }
            }
            self.check_assign_fit(arg.value, pd.ty);
        }

        // Mutable methods need a mutable receiver.
        if fd.is_mutable() {
            if let ExprKind::Access { target, .. } = &self.hir.expr(callee).kind {
                let imutable = self
                    .annot
                    .expr_type(*target)
                    .is_some_and(|t| self.hir.type_ref(t).imutable);
                if imutable {
                    self.log.push(CompileError::MutableCall {
                        name: fd.name.clone(),
                        loc: loc.clone(),
                    });
                }
            }
        }
    }

    /// A call through a function-typed value.
    fn check_value_call(&mut self, callee: ExprId, args: &[CallArg], loc: &Loc) {
        let Some(cty) = self.annot.expr_type(callee) else {
            return;
        };
        let TypeDetail::Func { params, .. } = &self.hir.type_ref(cty).detail else {
            return;
        };
        if args.len() != params.len() {
            self.log.push(CompileError::ArgCountMismatch {
                expected: params.len(),
                found: args.len(),
                loc: loc.clone(),
            });
            return;
        }
        for (arg, pty) in args.iter().zip(params.iter().copied()) {
            self.check_assign_fit(arg.value, pty);
        }
    }

    // ------------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------------

    fn check_init_block(&mut self, e: ExprId, _target: ExprId, args: &[CallArg], loc: &Loc) {
        let Some(ty) = self.annot.expr_type(e) else {
            return;
        };
        let tref = self.hir.type_ref(ty);
        if let TypeDetail::Array { size } = tref.detail {
            for arg in args {
                if arg.name.is_some() {
                    self.log
                        .push(CompileError::NamedArrayInit { loc: loc.clone() });
                    break;
                }
            }
            if let Some(elem) = tref.elem() {
                for arg in args {
                    self.check_assign_fit(arg.value, elem);
                }
            }
            if size.is_some_and(|n| n as usize != args.len()) {
                self.log.push(CompileError::ArgCountMismatch {
                    expected: size.unwrap_or(0) as usize,
                    found: args.len(),
                    loc: loc.clone(),
                });
            }
            return;
        }

        let Some(Symbol::Type(d)) = self.annot.expr_def(e) else {
            return;
        };
        let TypeDef::Struct(s) = self.hir.type_def(d) else {
            return;
        };
        if s.flags.contains(DeclFlags::ABSTRACT) {
            self.log.push(CompileError::AbstractInit {
                name: s.name.clone(),
                loc: loc.clone(),
            });
            return;
        }

        // Construction covers the struct's own instance fields.
        let fields: Vec<FieldId> = s
            .fields
            .iter()
            .copied()
            .filter(|f| !self.hir.field(*f).flags.contains(DeclFlags::STATIC))
            .collect();
        let mut covered = vec![false; fields.len()];
        let mut next_positional = 0usize;
        for arg in args {
            let slot = match &arg.name {
                Some(name) => {
                    let Some(idx) = fields
                        .iter()
                        .position(|f| self.hir.field(*f).name == *name)
                    else {
                        self.log.push(CompileError::UnknownField {
                            name: name.clone(),
                            loc: self.hir.expr(arg.value).loc.clone(),
                        });
                        continue;
                    };
                    idx
                }
                None => {
                    let idx = next_positional;
                    next_positional += 1;
                    if idx >= fields.len() {
                        self.log.push(CompileError::ArgCountMismatch {
                            expected: fields.len(),
                            found: args.len(),
                            loc: loc.clone(),
                        });
                        break;
                    }
                    idx
                }
            };
            if covered[slot] {
                self.log.push(CompileError::DuplicateInitField {
                    name: self.hir.field(fields[slot]).name.clone(),
                    loc: self.hir.expr(arg.value).loc.clone(),
                });
                continue;
            }
            covered[slot] = true;
            if let Some(fty) = self.slot_type(fields[slot]) {
                self.check_assign_fit(arg.value, fty);
            }
        }
        for (idx, field) in fields.iter().enumerate() {
            let fd = self.hir.field(*field);
            if !covered[idx] && fd.init.is_none() {
                self.log.push(CompileError::FieldNotInit {
                    name: fd.name.clone(),
                    loc: loc.clone(),
                });
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
