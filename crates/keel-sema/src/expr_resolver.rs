//! Second pass: expression type resolution.
//!
//! Walks every initializer and function body, assigning each
//! expression a type, a declaration where one applies, and an operator
//! method where an operation lowers to one. Results land in the side
//! tables; the tree itself is never touched.
//!
//! The pass resolves types and shapes. Legality of what the expressions
//! do with them (mutability, visibility, moves, unsafe) is the error
//! checker's job, so most rules here produce a type even when the
//! checker will later reject the use.
//!
//! Every expression a body reaches either gets a type or produces a
//! diagnostic. A resolution that dies silently is itself reported, so
//! nothing downstream has to guess why a type is missing.

use keel_ast::{
    AssignOp, BinaryOp, CallArg, ExprId, ExprKind, FieldId, FuncId, Literal, ModuleId, ParamId,
    PointerAttr, Scope, StmtId, StmtKind, Symbol, TypeDef, TypeDefId, TypeDetail, TypeRef,
    TypeRefId, UnaryOp,
};
use keel_ast::{Builtin, Hir};
use keel_core::{CompileError, DeclFlags, Loc};

use crate::annot::Resolution;
use crate::context::SemaContext;
use crate::fit::{self, Fit};
use crate::generics;
use crate::operators::Operator;
use crate::resolver::{field_type, generic_param_count, Frame, Lookup, TypeResolver};

/// Enclosing function state while a body is walked.
struct FnFrame {
    ret: TypeRefId,
    is_static: bool,
    is_mutable: bool,
}

/// What a `::` qualifier resolved to.
enum NsTarget {
    Module(ModuleId),
    Type(TypeDefId),
}

// ============================================================================
// ExprResolver
// ============================================================================

/// The expression pass over one module.
pub struct ExprResolver<'a> {
    r: TypeResolver<'a>,
    cur_type: Option<TypeDefId>,
    funcs: Vec<FnFrame>,
    loop_depth: u32,
    /// Loops and switches; break targets both.
    break_depth: u32,
}

impl<'a> ExprResolver<'a> {
    /// Resolve every expression in `module`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(hir: &'a mut Hir, builtin: &'a Builtin, ctx: &'a mut SemaContext, module: ModuleId) {
        let units = hir.module(module).units.clone();
        let mut this = ExprResolver {
            r: TypeResolver::new(hir, builtin, ctx),
            cur_type: None,
            funcs: Vec::new(),
            loop_depth: 0,
            break_depth: 0,
        };
        for unit in units {
            let u = this.r.hir.unit(unit).clone();
            this.r.stack.clear();
            this.r.push_unit_frames(unit);
            for field in &u.fields {
                this.visit_top_field(*field);
            }
            for func in &u.funcs {
                this.visit_func(*func);
            }
            for def in &u.type_defs {
                this.visit_type_def(*def);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------------

    fn visit_top_field(&mut self, f: FieldId) {
        let fd = self.r.hir.field(f).clone();
        if let Some(init) = fd.init {
            self.visit_expr(init);
        }
        if fd.ty.is_none() {
            if let Some(ty) = fd.init.and_then(|e| self.r.ctx.annot.expr_type(e)) {
                self.r.ctx.annot.set_field_type(f, ty);
            }
        }
    }

    fn visit_type_def(&mut self, d: TypeDefId) {
        let def = self.r.hir.type_def(d).clone();
        match def {
            TypeDef::Struct(s) => {
                // Specializations share their bodies with the generic;
                // those bodies are resolved once, here, in terms of the
                // generic's own parameters.
                if s.generic_from.is_some() {
                    return;
                }
                self.cur_type = Some(d);
                if s.is_generic() {
                    self.r.push(Frame::GenericParams(d));
                }
                self.r.push(Frame::TypeInherit(d));
                self.r.push(Frame::TypeOwn(d));
                for field in &s.fields {
                    self.visit_top_field(*field);
                }
                for func in &s.funcs {
                    self.visit_func(*func);
                }
                self.r.pop();
                self.r.pop();
                if s.is_generic() {
                    self.r.pop();
                }
                self.cur_type = None;
            }
            TypeDef::Enum(e) => {
                self.cur_type = Some(d);
                self.r.push(Frame::TypeOwn(d));
                for field in &e.fields {
                    if let Some(init) = self.r.hir.field(*field).init {
                        self.visit_expr(init);
                    }
                }
                self.r.pop();
                self.cur_type = None;
            }
            TypeDef::Trait(t) => {
                self.cur_type = Some(d);
                self.r.push(Frame::TypeOwn(d));
                for func in &t.funcs {
                    self.visit_func(*func);
                }
                self.r.pop();
                self.cur_type = None;
            }
            TypeDef::GenericParam(_) => {}
        }
    }

    fn visit_func(&mut self, f: FuncId) {
        let fd = self.r.hir.func(f).clone();
        if fd.generic_from.is_some() {
            return;
        }
        self.r.ensure_func_signature(f);
        if fd.is_generic() {
            self.r.push(Frame::FuncGenerics(f));
        }
        self.funcs.push(FnFrame {
            ret: fd.prototype.ret,
            is_static: fd.is_static(),
            is_mutable: fd.is_mutable(),
        });
        let mut params = Scope::new();
        for p in &fd.prototype.params {
            let pd = self.r.hir.param(*p).clone();
            if let Some(default) = pd.default {
                self.visit_expr(default);
            }
            params.put(pd.name, Symbol::Param(*p));
        }
        self.r.push(Frame::Locals(params));
        if let Some(body) = fd.body {
            self.visit_stmt(body);
        }
        self.r.pop();
        self.funcs.pop();
        if fd.is_generic() {
            self.r.pop();
        }
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    fn visit_stmt(&mut self, s: StmtId) {
        let stmt = self.r.hir.stmt(s).clone();
        match stmt.kind {
            StmtKind::Block(stmts) => {
                self.r.push(Frame::Locals(Scope::new()));
                for inner in stmts {
                    self.visit_stmt(inner);
                }
                self.r.pop();
            }
            StmtKind::Expr(e) => self.visit_expr(e),
            StmtKind::LocalVar(field) => self.visit_local(field),
            StmtKind::If { cond, then, els } => {
                self.visit_expr(cond);
                self.visit_stmt(then);
                if let Some(els) = els {
                    self.visit_stmt(els);
                }
            }
            StmtKind::While { cond, body } => {
                self.visit_expr(cond);
                self.loop_depth += 1;
                self.break_depth += 1;
                self.visit_stmt(body);
                self.break_depth -= 1;
                self.loop_depth -= 1;
            }
            StmtKind::For {
                init,
                cond,
                update,
                body,
            } => {
                self.r.push(Frame::Locals(Scope::new()));
                if let Some(init) = init {
                    self.visit_stmt(init);
                }
                if let Some(cond) = cond {
                    self.visit_expr(cond);
                }
                if let Some(update) = update {
                    self.visit_expr(update);
                }
                self.loop_depth += 1;
                self.break_depth += 1;
                self.visit_stmt(body);
                self.break_depth -= 1;
                self.loop_depth -= 1;
                self.r.pop();
            }
            StmtKind::Switch {
                cond,
                cases,
                default,
            } => {
                self.visit_expr(cond);
                self.break_depth += 1;
                for case in &cases {
                    self.visit_expr(case.label);
                    self.visit_stmt(case.body);
                }
                if let Some(default) = default {
                    self.visit_stmt(default);
                }
                self.break_depth -= 1;
            }
            StmtKind::Return(value) => self.visit_return(value, &stmt.loc),
            StmtKind::Break => {
                if self.break_depth == 0 {
                    self.r.ctx.log.push(CompileError::BreakOutsideLoop {
                        loc: stmt.loc.clone(),
                    });
                }
            }
            StmtKind::Continue => {
                if self.loop_depth == 0 {
                    self.r.ctx.log.push(CompileError::ContinueOutsideLoop {
                        loc: stmt.loc.clone(),
                    });
                }
            }
            StmtKind::Unsafe(inner) => self.visit_stmt(inner),
        }
    }

    fn visit_local(&mut self, f: FieldId) {
        let fd = self.r.hir.field(f).clone();
        if let Some(ty) = fd.ty {
            self.r.resolve_type_ref(ty);
        }
        if let Some(init) = fd.init {
            self.visit_expr(init);
        }
        if fd.ty.is_none() {
            if let Some(ty) = fd.init.and_then(|e| self.r.ctx.annot.expr_type(e)) {
                self.r.ctx.annot.set_field_type(f, ty);
            }
        }
        self.r.declare_local(fd.name, Symbol::Field(f));
    }

    fn visit_return(&mut self, value: Option<ExprId>, loc: &Loc) {
        let Some(frame) = self.funcs.last() else {
            return;
        };
        let ret = frame.ret;
        match value {
            Some(e) => {
                self.visit_expr(e);
                let Some(ty) = self.r.ctx.annot.expr_type(e) else {
                    return;
                };
                match fit::fit(self.r.hir, &self.r.ctx.annot, self.r.builtin, ty, ret) {
                    Fit::Yes => {}
                    Fit::Convert(k) => self.r.ctx.annot.set_expr_convert(e, k),
                    Fit::No => self
                        .r
                        .ctx
                        .log
                        .push(CompileError::ReturnTypeMismatch { loc: loc.clone() }),
                }
            }
            None => {
                let ret_def = self.r.ctx.annot.resolved_def(ret);
                if ret_def.is_some_and(|d| d != self.r.builtin.void_def) {
                    self.r
                        .ctx
                        .log
                        .push(CompileError::ReturnTypeMismatch { loc: loc.clone() });
                }
            }
        }
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    /// Resolve one expression, reporting a failure that produced no
    /// diagnostic of its own.
    fn visit_expr(&mut self, e: ExprId) {
        if self.r.ctx.annot.is_expr_resolved(e) {
            return;
        }
        let before = self.r.ctx.log.len();
        self.resolve_expr(e);
        if !self.r.ctx.annot.is_expr_resolved(e) && self.r.ctx.log.len() == before {
            let loc = self.r.hir.expr(e).loc.clone();
            self.r.ctx.log.push(CompileError::ResolveFailed { loc });
        }
    }

    fn resolve_expr(&mut self, e: ExprId) {
        let expr = self.r.hir.expr(e).clone();
        let loc = expr.loc;
        match expr.kind {
            ExprKind::Literal(lit) => self.resolve_literal(e, &lit, &loc),
            ExprKind::Id { ns, name } => self.resolve_id(e, ns, &name, &loc),
            ExprKind::This => self.resolve_this(e, &loc),
            ExprKind::Access { target, name } => self.resolve_access(e, target, &name, &loc),
            ExprKind::Unary { op, operand } => self.resolve_unary(e, op, operand, &loc),
            ExprKind::Binary { op, lhs, rhs } => self.resolve_binary(e, op, lhs, rhs, &loc),
            ExprKind::Assign { op, lhs, rhs } => self.resolve_assign(e, op, lhs, rhs, &loc),
            ExprKind::Call { callee, args } => self.resolve_call(e, callee, &args, &loc),
            ExprKind::Index { target, index } => self.resolve_index(e, target, index, &loc),
            ExprKind::GenericInstance { target, args } => {
                self.resolve_generic_instance(e, target, &args, &loc)
            }
            ExprKind::InitBlock { target, args } => self.resolve_init_block(e, target, &args, &loc),
            ExprKind::Is { expr, ty } => self.resolve_is(e, expr, ty, &loc),
            ExprKind::As { expr, ty } => self.resolve_as(e, expr, ty, &loc),
            ExprKind::Ternary { cond, then, els } => self.resolve_ternary(e, cond, then, els, &loc),
            ExprKind::TypeExpr { ty } => {
                if self.r.resolve_type_ref(ty).is_some() {
                    let meta = self.r.synth_meta(ty, loc);
                    self.r.ctx.annot.set_expr_type(e, meta);
                }
            }
            ExprKind::Closure { params, ret, body } => {
                self.resolve_closure(e, &params, ret, body, &loc)
            }
        }
    }

    fn resolve_literal(&mut self, e: ExprId, lit: &Literal, loc: &Loc) {
        let ty = match lit {
            Literal::Null => {
                let void = self.r.synth_named("Void", self.r.builtin.void_def, loc.clone());
                self.r
                    .synth_pointer(PointerAttr::Raw, true, void, loc.clone())
            }
            Literal::Bool(_) => self.r.synth_named("Bool", self.r.builtin.bool_def, loc.clone()),
            Literal::Int(_) => self.r.synth_num(32, false, loc.clone()),
            Literal::Float(_) => self.r.synth_num(64, true, loc.clone()),
            Literal::Str(_) => {
                let elem = self.r.synth_num(8, false, loc.clone());
                let ptr = self
                    .r
                    .synth_pointer(PointerAttr::Raw, false, elem, loc.clone());
                self.r.synth_imutable(ptr)
            }
        };
        self.r.ctx.annot.set_expr_type(e, ty);
    }

    fn resolve_id(&mut self, e: ExprId, ns: Option<ExprId>, name: &str, loc: &Loc) {
        let sym = match ns {
            None => match self.r.lookup(name, loc) {
                Lookup::Found(sym) => sym,
                Lookup::Ambiguous => return,
                Lookup::Missing => {
                    self.r.ctx.log.push(CompileError::UnknownSymbol {
                        name: name.to_string(),
                        loc: loc.clone(),
                    });
                    return;
                }
            },
            Some(ns_expr) => {
                let Some(target) = self.resolve_ns(ns_expr) else {
                    return;
                };
                let found = match target {
                    NsTarget::Module(m) => self.r.lookup_in_module(m, name, loc),
                    NsTarget::Type(d) => self.r.lookup_member(d, name, loc, false),
                };
                match found {
                    Lookup::Found(sym) => sym,
                    Lookup::Ambiguous => return,
                    Lookup::Missing => {
                        self.r.ctx.log.push(CompileError::UnknownSymbol {
                            name: name.to_string(),
                            loc: loc.clone(),
                        });
                        return;
                    }
                }
            }
        };
        self.bind_symbol(e, sym, name, loc);
    }

    /// Resolve the qualifier of a `::` path.
    fn resolve_ns(&mut self, ns: ExprId) -> Option<NsTarget> {
        let expr = self.r.hir.expr(ns).clone();
        let ExprKind::Id { ns: inner, name } = &expr.kind else {
            return None;
        };
        let sym = match inner {
            None => match self.r.lookup(name, &expr.loc) {
                Lookup::Found(sym) => sym,
                Lookup::Ambiguous => return None,
                Lookup::Missing => {
                    self.r.ctx.log.push(CompileError::UnknownSymbol {
                        name: name.clone(),
                        loc: expr.loc.clone(),
                    });
                    return None;
                }
            },
            Some(deeper) => {
                let found = match self.resolve_ns(*deeper)? {
                    NsTarget::Module(m) => self.r.lookup_in_module(m, name, &expr.loc),
                    NsTarget::Type(_) => Lookup::Missing,
                };
                match found {
                    Lookup::Found(sym) => sym,
                    Lookup::Ambiguous => return None,
                    Lookup::Missing => {
                        self.r.ctx.log.push(CompileError::UnknownSymbol {
                            name: name.clone(),
                            loc: expr.loc.clone(),
                        });
                        return None;
                    }
                }
            }
        };
        self.r.ctx.annot.set_expr_def(ns, sym);
        match sym {
            Symbol::Module(m) => Some(NsTarget::Module(m)),
            Symbol::Type(d) => Some(NsTarget::Type(d)),
            Symbol::Alias(a) => {
                let def = self.r.resolve_alias(a)?;
                Some(NsTarget::Type(def))
            }
            _ => {
                self.r.ctx.log.push(CompileError::NotAScope {
                    name: name.clone(),
                    loc: expr.loc.clone(),
                });
                None
            }
        }
    }

    fn bind_symbol(&mut self, e: ExprId, sym: Symbol, name: &str, loc: &Loc) {
        self.r.ctx.annot.set_expr_def(e, sym);
        match sym {
            Symbol::Field(_) | Symbol::Param(_) | Symbol::Func(_) => {
                if let Some(ty) = self.slot_type(sym) {
                    self.r.ctx.annot.set_expr_type(e, ty);
                }
            }
            Symbol::Type(d) => {
                if generic_param_count(self.r.hir, d) > 0 && !self.r.in_definition_of(d) {
                    self.r.ctx.log.push(CompileError::MissingGenericArgs {
                        name: name.to_string(),
                        loc: loc.clone(),
                    });
                    return;
                }
                let inner = self.r.synth_named(name, d, loc.clone());
                let meta = self.r.synth_meta(inner, loc.clone());
                self.r.ctx.annot.set_expr_type(e, meta);
            }
            Symbol::Alias(a) => {
                if let Some(def) = self.r.resolve_alias(a) {
                    let final_name = self.r.hir.type_def(def).name().to_string();
                    let inner = self.r.synth_named(final_name, def, loc.clone());
                    let meta = self.r.synth_meta(inner, loc.clone());
                    self.r.ctx.annot.set_expr_type(e, meta);
                }
            }
            Symbol::Module(_) => {}
        }
    }

    /// Type of a value-producing symbol.
    fn slot_type(&mut self, sym: Symbol) -> Option<TypeRefId> {
        match sym {
            Symbol::Field(f) => {
                let ty = field_type(self.r.hir, self.r.ctx, f)?;
                if self.r.hir.field(f).flags.contains(DeclFlags::CONST) {
                    Some(self.r.synth_imutable(ty))
                } else {
                    Some(ty)
                }
            }
            Symbol::Param(p) => Some(self.r.hir.param(p).ty),
            Symbol::Func(f) => {
                self.r.ensure_func_signature(f);
                let fd = self.r.hir.func(f).clone();
                let params: Vec<TypeRefId> = fd
                    .prototype
                    .params
                    .iter()
                    .map(|p| self.r.hir.param(*p).ty)
                    .collect();
                Some(self.r.synth_func_type(params, fd.prototype.ret, fd.loc))
            }
            _ => None,
        }
    }

    fn resolve_this(&mut self, e: ExprId, loc: &Loc) {
        let Some(cur) = self.cur_type else {
            self.r
                .ctx
                .log
                .push(CompileError::ThisOutsideStruct { loc: loc.clone() });
            return;
        };
        if self.funcs.last().is_some_and(|f| f.is_static) {
            self.r
                .ctx
                .log
                .push(CompileError::ThisInStatic { loc: loc.clone() });
            return;
        }
        let name = self.r.hir.type_def(cur).name().to_string();
        let inner = self.r.synth_named(name, cur, loc.clone());
        let mut ptr = self
            .r
            .synth_pointer(PointerAttr::Raw, false, inner, loc.clone());
        if !self.funcs.last().is_some_and(|f| f.is_mutable) {
            ptr = self.r.synth_imutable(ptr);
        }
        self.r.ctx.annot.set_expr_type(e, ptr);
    }

    fn resolve_access(&mut self, e: ExprId, target: ExprId, name: &str, loc: &Loc) {
        self.visit_expr(target);
        let Some(tty) = self.r.ctx.annot.expr_type(target) else {
            return;
        };
        let Some((owner, imutable)) = self.access_owner(tty) else {
            self.r.ctx.log.push(CompileError::UnknownSymbol {
                name: name.to_string(),
                loc: loc.clone(),
            });
            return;
        };
        match self.r.lookup_member(owner, name, loc, true) {
            Lookup::Found(sym) => {
                self.r.ctx.annot.set_expr_def(e, sym);
                if let Some(mut ty) = self.slot_type(sym) {
                    if imutable {
                        ty = self.r.synth_imutable(ty);
                    }
                    self.r.ctx.annot.set_expr_type(e, ty);
                }
            }
            Lookup::Ambiguous => {}
            Lookup::Missing => {
                self.r.ctx.log.push(CompileError::UnknownSymbol {
                    name: name.to_string(),
                    loc: loc.clone(),
                });
            }
        }
    }

    /// The definition whose members an access target exposes, and
    /// whether the view is immutable.
    ///
    /// Pointers access their pointee, meta-types their inner type, and
    /// generic parameters the trait they are bounded by.
    fn access_owner(&mut self, tty: TypeRefId) -> Option<(TypeDefId, bool)> {
        let tref = self.r.hir.type_ref(tty).clone();
        let mut imutable = tref.imutable;
        let def = if tref.detail.is_pointer() {
            let elem = tref.elem()?;
            imutable |= self.r.hir.type_ref(elem).imutable;
            self.r.ctx.annot.resolved_def(elem)?
        } else {
            let def = self.r.ctx.annot.resolved_def(tty)?;
            if def == self.r.builtin.meta_def {
                let inner = *tref.args.first()?;
                self.r.ctx.annot.resolved_def(inner)?
            } else {
                def
            }
        };
        if let TypeDef::GenericParam(gp) = self.r.hir.type_def(def) {
            let bound = gp.bound;
            return Some((self.r.ctx.annot.resolved_def(bound)?, imutable));
        }
        Some((def, imutable))
    }

    fn resolve_unary(&mut self, e: ExprId, op: UnaryOp, operand: ExprId, loc: &Loc) {
        self.visit_expr(operand);
        let Some(oty) = self.r.ctx.annot.expr_type(operand) else {
            return;
        };
        match op {
            UnaryOp::Move => {
                self.r.ctx.annot.set_expr_type(e, oty);
            }
            UnaryOp::Neg => {
                let def = self.r.ctx.annot.resolved_def(oty);
                if def.is_some_and(|d| self.r.builtin.is_num_def(d)) || def.is_none() {
                    self.r.ctx.annot.set_expr_type(e, oty);
                } else {
                    self.r.ctx.log.push(CompileError::InvalidOperation {
                        op: op.as_str().to_string(),
                        type_name: self.r.hir.type_display(oty),
                        loc: loc.clone(),
                    });
                }
            }
            UnaryOp::Not => {
                let ty = self
                    .r
                    .synth_named("Bool", self.r.builtin.bool_def, loc.clone());
                self.r.ctx.annot.set_expr_type(e, ty);
            }
            UnaryOp::Deref => {
                let tref = self.r.hir.type_ref(oty).clone();
                if !tref.detail.is_pointer() {
                    self.r.ctx.log.push(CompileError::InvalidOperation {
                        op: op.as_str().to_string(),
                        type_name: self.r.hir.type_display(oty),
                        loc: loc.clone(),
                    });
                    return;
                }
                if let Some(mut elem) = tref.elem() {
                    if tref.imutable {
                        elem = self.r.synth_imutable(elem);
                    }
                    self.r.ctx.annot.set_expr_type(e, elem);
                }
            }
            UnaryOp::AddrOf => {
                let ptr = self
                    .r
                    .synth_pointer(PointerAttr::Raw, false, oty, loc.clone());
                self.r.ctx.annot.set_expr_type(e, ptr);
            }
        }
    }

    fn resolve_binary(&mut self, e: ExprId, op: BinaryOp, lhs: ExprId, rhs: ExprId, loc: &Loc) {
        self.visit_expr(lhs);
        self.visit_expr(rhs);
        if op.is_logical() {
            let ty = self
                .r
                .synth_named("Bool", self.r.builtin.bool_def, loc.clone());
            self.r.ctx.annot.set_expr_type(e, ty);
            return;
        }
        let (Some(lty), Some(rty)) = (
            self.r.ctx.annot.expr_type(lhs),
            self.r.ctx.annot.expr_type(rhs),
        ) else {
            return;
        };
        let l_def = self.r.ctx.annot.resolved_def(lty);
        let r_def = self.r.ctx.annot.resolved_def(rty);

        if op.is_compare() {
            let pointers = self.r.hir.type_ref(lty).detail.is_pointer()
                && self.r.hir.type_ref(rty).detail.is_pointer();
            let nums = l_def.is_some_and(|d| self.r.builtin.is_num_def(d))
                && r_def.is_some_and(|d| self.r.builtin.is_num_def(d));
            let identity_ok = matches!(op, BinaryOp::Eq | BinaryOp::Ne) && pointers;
            if !identity_ok && !nums {
                // Lowers to a three-way compare method.
                if let Some(def) = l_def {
                    self.dispatch_operator(e, op.as_str(), lty, def, Operator::Compare, &[rhs], loc);
                }
            }
            let ty = self
                .r
                .synth_named("Bool", self.r.builtin.bool_def, loc.clone());
            self.r.ctx.annot.set_expr_type(e, ty);
            return;
        }

        // Arithmetic.
        let l_num = l_def.is_some_and(|d| self.r.builtin.is_num_def(d));
        let r_num = r_def.is_some_and(|d| self.r.builtin.is_num_def(d));
        if l_num && r_num {
            let ty = if r_def == Some(self.r.builtin.float_def) {
                rty
            } else {
                lty
            };
            self.r.ctx.annot.set_expr_type(e, ty);
            return;
        }
        let Some(def) = l_def else {
            self.r.ctx.annot.set_expr_type(e, lty);
            return;
        };
        let operator = match Operator::from_binary(op) {
            Some(operator) => operator,
            None => return,
        };
        if let Some(ret) = self.dispatch_operator(e, op.as_str(), lty, def, operator, &[rhs], loc) {
            self.r.ctx.annot.set_expr_type(e, ret);
        }
    }

    /// Find and record the operator method an operation lowers to.
    /// Returns the method's declared return type.
    fn dispatch_operator(
        &mut self,
        e: ExprId,
        op_str: &str,
        recv_ty: TypeRefId,
        recv_def: TypeDefId,
        op: Operator,
        args: &[ExprId],
        loc: &Loc,
    ) -> Option<TypeRefId> {
        let sym = match self.r.lookup_member(recv_def, op.method_name(), loc, true) {
            Lookup::Found(sym) => sym,
            Lookup::Ambiguous => return None,
            Lookup::Missing => {
                self.r.ctx.log.push(CompileError::InvalidOperation {
                    op: op_str.to_string(),
                    type_name: self.r.hir.type_display(recv_ty),
                    loc: loc.clone(),
                });
                return None;
            }
        };
        let Symbol::Func(method) = sym else {
            self.r.ctx.log.push(CompileError::NotAnOperator {
                name: op.method_name().to_string(),
                loc: loc.clone(),
            });
            return None;
        };
        let fd = self.r.hir.func(method).clone();
        if !fd.flags.contains(DeclFlags::OPERATOR) {
            self.r.ctx.log.push(CompileError::NotAnOperator {
                name: fd.name.clone(),
                loc: loc.clone(),
            });
            return None;
        }
        self.r.ensure_func_signature(method);
        if fd.prototype.params.len() != op.param_count() {
            self.r.ctx.log.push(CompileError::InvalidOperator {
                name: fd.name.clone(),
                detail: op.arity_detail(),
                loc: loc.clone(),
            });
            return None;
        }
        for (arg, param) in args.iter().zip(&fd.prototype.params) {
            let Some(aty) = self.r.ctx.annot.expr_type(*arg) else {
                continue;
            };
            let pty = self.r.hir.param(*param).ty;
            match fit::fit(self.r.hir, &self.r.ctx.annot, self.r.builtin, aty, pty) {
                Fit::Yes => {}
                Fit::Convert(k) => self.r.ctx.annot.set_expr_convert(*arg, k),
                Fit::No => self.r.ctx.log.push(CompileError::TypeMismatch {
                    expected: self.r.hir.type_display(pty),
                    found: self.r.hir.type_display(aty),
                    loc: self.r.hir.expr(*arg).loc.clone(),
                }),
            }
        }
        self.r.ctx.annot.set_expr_operator(e, method);
        Some(fd.prototype.ret)
    }

    fn resolve_assign(&mut self, e: ExprId, op: AssignOp, lhs: ExprId, rhs: ExprId, loc: &Loc) {
        self.visit_expr(lhs);
        self.visit_expr(rhs);
        let Some(lty) = self.r.ctx.annot.expr_type(lhs) else {
            return;
        };
        self.r.ctx.annot.set_expr_type(e, lty);

        let l_def = self.r.ctx.annot.resolved_def(lty);
        let l_num = l_def.is_some_and(|d| self.r.builtin.is_num_def(d));

        if let Some(operator) = Operator::from_compound(op) {
            if !l_num {
                if let Some(def) = l_def {
                    self.dispatch_operator(e, op.as_str(), lty, def, operator, &[rhs], loc);
                }
            }
            return;
        }

        // A write through an index on a non-array lowers to `set`.
        if let ExprKind::Index { target, index } = self.r.hir.expr(lhs).kind.clone() {
            let Some(tty) = self.r.ctx.annot.expr_type(target) else {
                return;
            };
            let tref = self.r.hir.type_ref(tty).clone();
            let is_array = matches!(tref.detail, TypeDetail::Array { .. });
            if !is_array {
                let owner = self.access_owner(tty).map(|(d, _)| d);
                if let Some(def) = owner {
                    self.dispatch_operator(
                        e,
                        "[]",
                        tty,
                        def,
                        Operator::Set,
                        &[index, rhs],
                        loc,
                    );
                }
            }
        }
    }

    fn resolve_call(&mut self, e: ExprId, callee: ExprId, args: &[CallArg], loc: &Loc) {
        self.visit_expr(callee);
        for arg in args {
            self.visit_expr(arg.value);
        }
        let Some(cty) = self.r.ctx.annot.expr_type(callee) else {
            return;
        };
        let tref = self.r.hir.type_ref(cty).clone();
        match &tref.detail {
            TypeDetail::Func { ret, .. } => {
                self.r.ctx.annot.set_expr_type(e, *ret);
            }
            _ => {
                self.r.ctx.log.push(CompileError::NotCallable {
                    found: self.r.hir.type_display(cty),
                    loc: loc.clone(),
                });
            }
        }
    }

    fn resolve_index(&mut self, e: ExprId, target: ExprId, index: ExprId, loc: &Loc) {
        self.visit_expr(target);
        self.visit_expr(index);
        let Some(tty) = self.r.ctx.annot.expr_type(target) else {
            return;
        };
        let tref = self.r.hir.type_ref(tty).clone();
        if matches!(tref.detail, TypeDetail::Array { .. }) {
            if let Some(mut elem) = tref.elem() {
                if tref.imutable {
                    elem = self.r.synth_imutable(elem);
                }
                self.r.ctx.annot.set_expr_type(e, elem);
            }
            return;
        }
        let Some((def, _)) = self.access_owner(tty) else {
            self.r.ctx.log.push(CompileError::InvalidOperation {
                op: "[]".to_string(),
                type_name: self.r.hir.type_display(tty),
                loc: loc.clone(),
            });
            return;
        };
        if let Some(ret) = self.dispatch_operator(e, "[]", tty, def, Operator::Get, &[index], loc) {
            self.r.ctx.annot.set_expr_type(e, ret);
        }
    }

    fn resolve_generic_instance(
        &mut self,
        e: ExprId,
        target: ExprId,
        args: &[TypeRefId],
        loc: &Loc,
    ) {
        for arg in args {
            self.r.resolve_type_ref(*arg);
        }
        let texpr = self.r.hir.expr(target).clone();
        let ExprKind::Id { ns, name } = &texpr.kind else {
            return;
        };
        let sym = match ns {
            None => match self.r.lookup(name, &texpr.loc) {
                Lookup::Found(sym) => sym,
                Lookup::Ambiguous => return,
                Lookup::Missing => {
                    self.r.ctx.log.push(CompileError::UnknownSymbol {
                        name: name.clone(),
                        loc: texpr.loc.clone(),
                    });
                    return;
                }
            },
            Some(ns_expr) => {
                let Some(NsTarget::Module(m)) = self.resolve_ns(*ns_expr) else {
                    return;
                };
                match self.r.lookup_in_module(m, name, &texpr.loc) {
                    Lookup::Found(sym) => sym,
                    Lookup::Ambiguous => return,
                    Lookup::Missing => {
                        self.r.ctx.log.push(CompileError::UnknownSymbol {
                            name: name.clone(),
                            loc: texpr.loc.clone(),
                        });
                        return;
                    }
                }
            }
        };
        match sym {
            Symbol::Type(d) => {
                let expected = generic_param_count(self.r.hir, d);
                if expected == 0 {
                    self.r.ctx.log.push(CompileError::NotGeneric {
                        name: name.clone(),
                        loc: loc.clone(),
                    });
                    return;
                }
                if expected != args.len() {
                    self.r.ctx.log.push(CompileError::GenericArgsMismatch {
                        name: name.clone(),
                        expected,
                        found: args.len(),
                        loc: loc.clone(),
                    });
                    return;
                }
                let Some(spec) = generics::specialize_type(&mut self.r, d, args, loc) else {
                    return;
                };
                self.r.ctx.annot.set_expr_def(target, Symbol::Type(spec));
                self.r.ctx.annot.set_expr_def(e, Symbol::Type(spec));
                let inner = self.r.synth_named(name.clone(), spec, loc.clone());
                let meta = self.r.synth_meta(inner, loc.clone());
                self.r.ctx.annot.set_expr_type(target, meta);
                self.r.ctx.annot.set_expr_type(e, meta);
            }
            Symbol::Func(f) => {
                let expected = self.r.hir.func(f).generic_params.len();
                if expected == 0 {
                    self.r.ctx.log.push(CompileError::NotGeneric {
                        name: name.clone(),
                        loc: loc.clone(),
                    });
                    return;
                }
                if expected != args.len() {
                    self.r.ctx.log.push(CompileError::GenericArgsMismatch {
                        name: name.clone(),
                        expected,
                        found: args.len(),
                        loc: loc.clone(),
                    });
                    return;
                }
                let Some(spec) = generics::specialize_func(&mut self.r, f, args) else {
                    return;
                };
                self.r.ctx.annot.set_expr_def(e, Symbol::Func(spec));
                if let Some(ty) = self.slot_type(Symbol::Func(spec)) {
                    self.r.ctx.annot.set_expr_type(e, ty);
                }
            }
            _ => {
                self.r.ctx.log.push(CompileError::NotGeneric {
                    name: name.clone(),
                    loc: loc.clone(),
                });
            }
        }
    }

    fn resolve_init_block(&mut self, e: ExprId, target: ExprId, args: &[CallArg], loc: &Loc) {
        self.visit_expr(target);
        for arg in args {
            self.visit_expr(arg.value);
        }
        let Some(tty) = self.r.ctx.annot.expr_type(target) else {
            return;
        };
        let tref = self.r.hir.type_ref(tty).clone();
        let meta = self.r.ctx.annot.resolved_def(tty) == Some(self.r.builtin.meta_def);
        let Some(inner) = (if meta { tref.args.first().copied() } else { None }) else {
            self.r.ctx.log.push(CompileError::InvalidOperation {
                op: "{}".to_string(),
                type_name: self.r.hir.type_display(tty),
                loc: loc.clone(),
            });
            return;
        };
        let inner_ref = self.r.hir.type_ref(inner).clone();
        if let TypeDetail::Array { size } = inner_ref.detail {
            // Construction sizes an open array by its element count.
            let ty = if size.is_none() {
                let elem = match inner_ref.elem() {
                    Some(elem) => elem,
                    None => return,
                };
                let sized = self.r.hir.alloc_type_ref(TypeRef::array(
                    Some(args.len() as u32),
                    elem,
                    loc.clone(),
                ));
                let base = self.r.builtin.array_def;
                if let Some(def) = generics::specialize_type(&mut self.r, base, &[elem], loc) {
                    self.r
                        .ctx
                        .annot
                        .resolve_type(sized, Resolution::direct(def));
                }
                sized
            } else {
                inner
            };
            self.r.ctx.annot.set_expr_type(e, ty);
            return;
        }
        let Some(def) = self.r.ctx.annot.resolved_def(inner) else {
            return;
        };
        match self.r.hir.type_def(def) {
            TypeDef::Struct(s) => {
                let name = s.name.clone();
                let ty = self.r.synth_named(name, def, loc.clone());
                self.r.ctx.annot.set_expr_def(e, Symbol::Type(def));
                self.r.ctx.annot.set_expr_type(e, ty);
            }
            _ => {
                self.r.ctx.log.push(CompileError::InvalidOperation {
                    op: "{}".to_string(),
                    type_name: self.r.hir.type_display(inner),
                    loc: loc.clone(),
                });
            }
        }
    }

    fn resolve_is(&mut self, e: ExprId, expr: ExprId, ty: TypeRefId, loc: &Loc) {
        self.visit_expr(expr);
        self.r.resolve_type_ref(ty);
        let pointers = self
            .r
            .ctx
            .annot
            .expr_type(expr)
            .is_some_and(|t| self.r.hir.type_ref(t).detail.is_pointer())
            && self.r.hir.type_ref(ty).detail.is_pointer();
        if !pointers {
            self.r
                .ctx
                .log
                .push(CompileError::CastRequiresPointer { loc: loc.clone() });
        }
        let bool_ty = self
            .r
            .synth_named("Bool", self.r.builtin.bool_def, loc.clone());
        self.r.ctx.annot.set_expr_type(e, bool_ty);
    }

    fn resolve_as(&mut self, e: ExprId, expr: ExprId, ty: TypeRefId, loc: &Loc) {
        self.visit_expr(expr);
        self.r.resolve_type_ref(ty);
        let from = self.r.ctx.annot.expr_type(expr);
        let from_ptr = from.is_some_and(|t| self.r.hir.type_ref(t).detail.is_pointer());
        let to_ref = self.r.hir.type_ref(ty).clone();
        if !from_ptr || !to_ref.detail.is_pointer() {
            self.r
                .ctx
                .log
                .push(CompileError::CastRequiresPointer { loc: loc.clone() });
            self.r.ctx.annot.set_expr_type(e, ty);
            return;
        }
        let from_ty = match from {
            Some(t) => t,
            None => {
                self.r.ctx.annot.set_expr_type(e, ty);
                return;
            }
        };
        let from_attr = self.r.hir.type_ref(from_ty).pointer_attr();
        let to_attr = to_ref.pointer_attr();
        if let (Some(fa), Some(ta)) = (from_attr, to_attr) {
            if fa != ta {
                match fit::convert_kind(fa, ta) {
                    Some(k) => self.r.ctx.annot.set_expr_convert(e, k),
                    None => self.r.ctx.log.push(CompileError::UnknownConvert {
                        from: self.r.hir.type_display(from_ty),
                        to: self.r.hir.type_display(ty),
                        loc: loc.clone(),
                    }),
                }
            }
        }
        self.r.ctx.annot.set_expr_type(e, ty);
    }

    fn resolve_ternary(&mut self, e: ExprId, cond: ExprId, then: ExprId, els: ExprId, loc: &Loc) {
        self.visit_expr(cond);
        self.visit_expr(then);
        self.visit_expr(els);
        let (Some(then_ty), Some(els_ty)) = (
            self.r.ctx.annot.expr_type(then),
            self.r.ctx.annot.expr_type(els),
        ) else {
            return;
        };
        if !fit::equals(self.r.hir, &self.r.ctx.annot, then_ty, els_ty) {
            self.r
                .ctx
                .log
                .push(CompileError::BranchTypeMismatch { loc: loc.clone() });
        }
        self.r.ctx.annot.set_expr_type(e, then_ty);
    }

    fn resolve_closure(
        &mut self,
        e: ExprId,
        params: &[ParamId],
        ret: TypeRefId,
        body: StmtId,
        loc: &Loc,
    ) {
        let mut scope = Scope::new();
        let mut param_tys = Vec::with_capacity(params.len());
        for p in params {
            let pd = self.r.hir.param(*p).clone();
            self.r.resolve_type_ref(pd.ty);
            param_tys.push(pd.ty);
            scope.put(pd.name, Symbol::Param(*p));
        }
        self.r.resolve_type_ref(ret);
        let (is_static, is_mutable) = self
            .funcs
            .last()
            .map(|f| (f.is_static, f.is_mutable))
            .unwrap_or((true, false));
        self.funcs.push(FnFrame {
            ret,
            is_static,
            is_mutable,
        });
        self.r.push(Frame::Locals(scope));
        self.visit_stmt(body);
        self.r.pop();
        self.funcs.pop();
        let ty = self.r.synth_func_type(param_tys, ret, loc.clone());
        self.r.ctx.annot.set_expr_type(e, ty);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use keel_ast::{
        Expr, FieldDef, FileUnit, FuncDef, FuncPrototype, Module, Owner, ParamDef, Stmt, StructDef,
        UnitId,
    };

    fn loc() -> Loc {
        Loc::new("main.ke", 1, 1, 0)
    }

    struct Fixture {
        hir: Hir,
        builtin: Builtin,
        ctx: SemaContext,
        module: ModuleId,
        unit: UnitId,
    }

    fn fixture() -> Fixture {
        let mut hir = Hir::new();
        let builtin = Builtin::install(&mut hir);
        let module = hir.alloc_module(Module::new("main", "1.0"));
        let unit = hir.alloc_unit(FileUnit::new("main.ke", module));
        let mut ctx = SemaContext::new();
        ctx.set_import_scope(unit, Scope::new());
        Fixture {
            hir,
            builtin,
            ctx,
            module,
            unit,
        }
    }

    fn int_lit(fx: &mut Fixture, v: i64) -> ExprId {
        fx.hir
            .alloc_expr(Expr::new(ExprKind::Literal(Literal::Int(v)), loc()))
    }

    /// Wrap statements into `fun test(): Void { ... }`.
    fn func_with_body(fx: &mut Fixture, stmts: Vec<StmtId>) -> FuncId {
        let ret = fx.hir.alloc_type_ref(TypeRef::named("Void", loc()));
        let body = fx.hir.alloc_stmt(Stmt::new(StmtKind::Block(stmts), loc()));
        let mut def = FuncDef::new(
            "test",
            loc(),
            DeclFlags::empty(),
            Owner::Unit(fx.unit),
            FuncPrototype::new(Vec::new(), ret),
        );
        def.body = Some(body);
        fx.hir.define_func(fx.unit, def)
    }

    fn run(fx: &mut Fixture) {
        ExprResolver::run(&mut fx.hir, &fx.builtin, &mut fx.ctx, fx.module);
    }

    #[test]
    fn local_type_is_inferred_from_init() {
        let mut fx = fixture();
        let init = int_lit(&mut fx, 1);
        let mut local = FieldDef::local("a", loc(), Owner::Unit(fx.unit), None);
        local.init = Some(init);
        let field = fx.hir.alloc_field(local);
        let decl = fx
            .hir
            .alloc_stmt(Stmt::new(StmtKind::LocalVar(field), loc()));
        func_with_body(&mut fx, vec![decl]);

        run(&mut fx);
        assert!(fx.ctx.log.is_empty(), "log: {}", fx.ctx.log);
        let ty = fx.ctx.annot.field_type(field).unwrap();
        assert_eq!(fx.ctx.annot.resolved_def(ty), Some(fx.builtin.int_def));
    }

    #[test]
    fn arithmetic_promotes_toward_float() {
        let mut fx = fixture();
        let l = int_lit(&mut fx, 1);
        let r = fx
            .hir
            .alloc_expr(Expr::new(ExprKind::Literal(Literal::Float(2.0)), loc()));
        let sum = fx.hir.alloc_expr(Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Add,
                lhs: l,
                rhs: r,
            },
            loc(),
        ));
        let stmt = fx.hir.alloc_stmt(Stmt::new(StmtKind::Expr(sum), loc()));
        func_with_body(&mut fx, vec![stmt]);

        run(&mut fx);
        assert!(fx.ctx.log.is_empty(), "log: {}", fx.ctx.log);
        let ty = fx.ctx.annot.expr_type(sum).unwrap();
        assert_eq!(fx.ctx.annot.resolved_def(ty), Some(fx.builtin.float_def));
    }

    #[test]
    fn comparison_types_as_bool() {
        let mut fx = fixture();
        let l = int_lit(&mut fx, 1);
        let r = int_lit(&mut fx, 2);
        let cmp = fx.hir.alloc_expr(Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Lt,
                lhs: l,
                rhs: r,
            },
            loc(),
        ));
        let stmt = fx.hir.alloc_stmt(Stmt::new(StmtKind::Expr(cmp), loc()));
        func_with_body(&mut fx, vec![stmt]);

        run(&mut fx);
        let ty = fx.ctx.annot.expr_type(cmp).unwrap();
        assert_eq!(fx.ctx.annot.resolved_def(ty), Some(fx.builtin.bool_def));
    }

    #[test]
    fn binary_on_struct_lowers_to_operator_method() {
        let mut fx = fixture();
        // struct Vec2 { operator fun plus(o: Vec2): Vec2 }
        let d = fx.hir.define_type(
            fx.unit,
            TypeDef::Struct(StructDef::new(
                "Vec2",
                loc(),
                DeclFlags::empty(),
                Owner::Unit(fx.unit),
            )),
        );
        let o_ty = fx.hir.alloc_type_ref(TypeRef::named("Vec2", loc()));
        let o = fx
            .hir
            .alloc_param(ParamDef::new("o", o_ty, loc()));
        let ret = fx.hir.alloc_type_ref(TypeRef::named("Vec2", loc()));
        let plus = fx.hir.add_method(
            d,
            FuncDef::new(
                "plus",
                loc(),
                DeclFlags::OPERATOR,
                Owner::Type(d),
                FuncPrototype::new(vec![o], ret),
            ),
        );

        // a: Vec2; b: Vec2; a + b
        let a_ty = fx.hir.alloc_type_ref(TypeRef::named("Vec2", loc()));
        let a = fx
            .hir
            .alloc_field(FieldDef::local("a", loc(), Owner::Unit(fx.unit), Some(a_ty)));
        let b_ty = fx.hir.alloc_type_ref(TypeRef::named("Vec2", loc()));
        let b = fx
            .hir
            .alloc_field(FieldDef::local("b", loc(), Owner::Unit(fx.unit), Some(b_ty)));
        let decl_a = fx.hir.alloc_stmt(Stmt::new(StmtKind::LocalVar(a), loc()));
        let decl_b = fx.hir.alloc_stmt(Stmt::new(StmtKind::LocalVar(b), loc()));
        let a_use = fx.hir.alloc_expr(Expr::new(
            ExprKind::Id {
                ns: None,
                name: "a".into(),
            },
            loc(),
        ));
        let b_use = fx.hir.alloc_expr(Expr::new(
            ExprKind::Id {
                ns: None,
                name: "b".into(),
            },
            loc(),
        ));
        let sum = fx.hir.alloc_expr(Expr::new(
            ExprKind::Binary {
                op: BinaryOp::Add,
                lhs: a_use,
                rhs: b_use,
            },
            loc(),
        ));
        let stmt = fx.hir.alloc_stmt(Stmt::new(StmtKind::Expr(sum), loc()));
        func_with_body(&mut fx, vec![decl_a, decl_b, stmt]);

        run(&mut fx);
        assert!(fx.ctx.log.is_empty(), "log: {}", fx.ctx.log);
        assert_eq!(fx.ctx.annot.expr_operator(sum), Some(plus));
        let ty = fx.ctx.annot.expr_type(sum).unwrap();
        assert_eq!(fx.ctx.annot.resolved_def(ty), Some(d));
    }

    #[test]
    fn unknown_name_reports_once_without_a_cascade() {
        let mut fx = fixture();
        let bad = fx.hir.alloc_expr(Expr::new(
            ExprKind::Id {
                ns: None,
                name: "ghost".into(),
            },
            loc(),
        ));
        let neg = fx.hir.alloc_expr(Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Neg,
                operand: bad,
            },
            loc(),
        ));
        let stmt = fx.hir.alloc_stmt(Stmt::new(StmtKind::Expr(neg), loc()));
        func_with_body(&mut fx, vec![stmt]);

        run(&mut fx);
        assert_eq!(fx.ctx.log.len(), 1);
        assert!(fx
            .ctx
            .log
            .iter()
            .next()
            .unwrap()
            .to_string()
            .contains("Unknown symbol 'ghost'"));
    }

    #[test]
    fn this_outside_a_struct_is_reported() {
        let mut fx = fixture();
        let this = fx.hir.alloc_expr(Expr::new(ExprKind::This, loc()));
        let stmt = fx.hir.alloc_stmt(Stmt::new(StmtKind::Expr(this), loc()));
        func_with_body(&mut fx, vec![stmt]);

        run(&mut fx);
        assert_eq!(fx.ctx.log.len(), 1);
        assert!(fx
            .ctx
            .log
            .iter()
            .next()
            .unwrap()
            .to_string()
            .contains("outside a struct"));
    }

    #[test]
    fn ternary_branches_must_agree() {
        let mut fx = fixture();
        let cond = fx
            .hir
            .alloc_expr(Expr::new(ExprKind::Literal(Literal::Bool(true)), loc()));
        let then = int_lit(&mut fx, 1);
        let els = fx
            .hir
            .alloc_expr(Expr::new(ExprKind::Literal(Literal::Float(1.0)), loc()));
        let pick = fx.hir.alloc_expr(Expr::new(
            ExprKind::Ternary { cond, then, els },
            loc(),
        ));
        let stmt = fx.hir.alloc_stmt(Stmt::new(StmtKind::Expr(pick), loc()));
        func_with_body(&mut fx, vec![stmt]);

        run(&mut fx);
        assert_eq!(fx.ctx.log.len(), 1);
        assert!(fx
            .ctx
            .log
            .iter()
            .next()
            .unwrap()
            .to_string()
            .contains("Branch types"));
    }

    #[test]
    fn break_outside_a_loop_is_reported() {
        let mut fx = fixture();
        let brk = fx.hir.alloc_stmt(Stmt::new(StmtKind::Break, loc()));
        func_with_body(&mut fx, vec![brk]);

        run(&mut fx);
        assert_eq!(fx.ctx.log.len(), 1);
        assert!(fx
            .ctx
            .log
            .iter()
            .next()
            .unwrap()
            .to_string()
            .contains("Break outside loop"));
    }
}
