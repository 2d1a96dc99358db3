//! Scope-chain name resolution.
//!
//! [`TypeResolver`] carries the frame stack every pass walks: lookups
//! probe frames innermost-first and stop at the first frame that knows
//! the name. A frame owning two candidates for the name is a hard
//! failure; the lookup reports the ambiguity and yields nothing rather
//! than guessing.
//!
//! Frames are descriptors, not scope copies. The heavyweight scopes
//! (module unions, type members, inherited members) live in the
//! [`SemaContext`] caches and are materialized on first probe.
//!
//! Signature resolution is on-demand and memoized: any reference to a
//! type may trigger [`TypeResolver::ensure_type_signature`], so
//! declaration order across files never matters.

use keel_ast::{
    Builtin, Hir, ModuleId, Owner, PointerAttr, Scope, Symbol, TypeDef, TypeDefId, TypeRef,
    TypeRefId, UnitId,
};
use keel_ast::{AliasId, FieldId, FuncId};
use keel_core::{CompileError, Loc};

use crate::annot::Resolution;
use crate::context::{owner_unit, SemaContext};
use crate::generics;

// ============================================================================
// Frames
// ============================================================================

/// One layer of the lookup chain.
#[derive(Debug)]
pub enum Frame {
    /// The builtin pseudo-module.
    Builtin,
    /// Top-level declarations of a module.
    Module(ModuleId),
    /// Names a file pulled in through its imports.
    Imports(UnitId),
    /// A type's own members.
    TypeOwn(TypeDefId),
    /// Members inherited by a type, private excluded.
    TypeInherit(TypeDefId),
    /// Generic parameters of a struct definition.
    GenericParams(TypeDefId),
    /// Generic parameters of a function definition.
    FuncGenerics(FuncId),
    /// Locals and parameters; owned by the frame itself.
    Locals(Scope),
}

/// Outcome of one lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Found(Symbol),
    /// Several candidates in the winning frame; already reported.
    Ambiguous,
    /// No frame knows the name; not reported yet.
    Missing,
}

// ============================================================================
// TypeResolver
// ============================================================================

/// Shared resolution machinery for all passes.
pub struct TypeResolver<'a> {
    pub hir: &'a mut Hir,
    pub builtin: &'a Builtin,
    pub ctx: &'a mut SemaContext,
    pub stack: Vec<Frame>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(hir: &'a mut Hir, builtin: &'a Builtin, ctx: &'a mut SemaContext) -> Self {
        Self {
            hir,
            builtin,
            ctx,
            stack: Vec::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Frame stack
    // ------------------------------------------------------------------------

    pub fn push(&mut self, frame: Frame) {
        self.stack.push(frame);
    }

    pub fn pop(&mut self) {
        self.stack.pop();
    }

    /// Push the outer frames every file shares: builtin, module, imports.
    pub fn push_unit_frames(&mut self, unit: UnitId) {
        let module = self.hir.unit(unit).module;
        self.stack.push(Frame::Builtin);
        self.stack.push(Frame::Module(module));
        self.stack.push(Frame::Imports(unit));
    }

    /// Run with a fresh stack rooted at another file's frames, then
    /// restore the current stack.
    pub fn with_unit_frames<T>(&mut self, unit: UnitId, f: impl FnOnce(&mut Self) -> T) -> T {
        let saved = std::mem::take(&mut self.stack);
        self.push_unit_frames(unit);
        let out = f(self);
        self.stack = saved;
        out
    }

    /// Declare a local into the innermost locals frame.
    pub fn declare_local(&mut self, name: impl Into<String>, sym: Symbol) {
        for frame in self.stack.iter_mut().rev() {
            if let Frame::Locals(scope) = frame {
                scope.put(name, sym);
                return;
            }
        }
    }

    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    fn frame_candidates(&mut self, idx: usize, name: &str) -> Vec<Symbol> {
        match &self.stack[idx] {
            Frame::Locals(scope) => scope.lookup(name).to_vec(),
            Frame::Builtin => self.builtin.scope.lookup(name).to_vec(),
            Frame::Module(m) => {
                let m = *m;
                self.ctx.module_scope(self.hir, m).lookup(name).to_vec()
            }
            Frame::Imports(u) => self
                .ctx
                .import_scope(*u)
                .map(|s| s.lookup(name).to_vec())
                .unwrap_or_default(),
            Frame::TypeOwn(t) => {
                let t = *t;
                self.ctx.type_scope(self.hir, t).lookup(name).to_vec()
            }
            Frame::TypeInherit(t) => {
                let t = *t;
                self.ctx.inherit_scope(self.hir, t).lookup(name).to_vec()
            }
            Frame::GenericParams(t) => match self.hir.type_def(*t) {
                TypeDef::Struct(s) => s
                    .generic_params
                    .iter()
                    .filter(|gp| self.hir.type_def(**gp).name() == name)
                    .map(|gp| Symbol::Type(*gp))
                    .collect(),
                _ => Vec::new(),
            },
            Frame::FuncGenerics(f) => self
                .hir
                .func(*f)
                .generic_params
                .iter()
                .filter(|gp| self.hir.type_def(**gp).name() == name)
                .map(|gp| Symbol::Type(*gp))
                .collect(),
        }
    }

    /// Walk the frame stack innermost-first for an unqualified name.
    pub fn lookup(&mut self, name: &str, loc: &Loc) -> Lookup {
        for idx in (0..self.stack.len()).rev() {
            let candidates = self.frame_candidates(idx, name);
            match candidates.len() {
                0 => continue,
                1 => return Lookup::Found(candidates[0]),
                _ => {
                    self.report_ambiguity(name, &candidates, loc);
                    return Lookup::Ambiguous;
                }
            }
        }
        Lookup::Missing
    }

    /// Like [`lookup`], reporting an unknown name.
    ///
    /// [`lookup`]: Self::lookup
    pub fn lookup_symbol(&mut self, name: &str, loc: &Loc) -> Option<Symbol> {
        match self.lookup(name, loc) {
            Lookup::Found(sym) => Some(sym),
            Lookup::Ambiguous => None,
            Lookup::Missing => {
                self.ctx.log.push(CompileError::UnknownSymbol {
                    name: name.to_string(),
                    loc: loc.clone(),
                });
                None
            }
        }
    }

    /// Member lookup on a type: own scope first, then inherited.
    pub fn lookup_member(
        &mut self,
        def: TypeDefId,
        name: &str,
        loc: &Loc,
        inherited: bool,
    ) -> Lookup {
        self.ensure_type_signature(def);
        let candidates = member_candidates(self.hir, self.ctx, def, name, inherited);
        match candidates.len() {
            0 => Lookup::Missing,
            1 => Lookup::Found(candidates[0]),
            _ => {
                self.report_ambiguity(name, &candidates, loc);
                Lookup::Ambiguous
            }
        }
    }

    /// Lookup in another module's top-level scope.
    pub fn lookup_in_module(&mut self, m: ModuleId, name: &str, loc: &Loc) -> Lookup {
        let candidates = self.ctx.module_scope(self.hir, m).lookup(name).to_vec();
        match candidates.len() {
            0 => Lookup::Missing,
            1 => Lookup::Found(candidates[0]),
            _ => {
                self.report_ambiguity(name, &candidates, loc);
                Lookup::Ambiguous
            }
        }
    }

    fn report_ambiguity(&mut self, name: &str, candidates: &[Symbol], loc: &Loc) {
        self.ctx.log.push(CompileError::AmbiguousSymbol {
            name: name.to_string(),
            first: self.symbol_loc(candidates[0]),
            second: self.symbol_loc(candidates[1]),
            loc: loc.clone(),
        });
    }

    /// Declaration site of a symbol, for diagnostics.
    pub fn symbol_loc(&self, sym: Symbol) -> Loc {
        match sym {
            Symbol::Type(d) => self.hir.type_def(d).loc().clone(),
            Symbol::Func(f) => self.hir.func(f).loc.clone(),
            Symbol::Field(f) => self.hir.field(f).loc.clone(),
            Symbol::Alias(a) => self.hir.alias(a).loc.clone(),
            Symbol::Param(p) => self.hir.param(p).loc.clone(),
            Symbol::Module(_) => Loc::synthetic(),
        }
    }

    // ------------------------------------------------------------------------
    // Type reference resolution
    // ------------------------------------------------------------------------

    /// Resolve one type reference to a definition, recording the result.
    ///
    /// Failures are memoized too, so a bad reference reports once no
    /// matter how many times it is queried.
    pub fn resolve_type_ref(&mut self, id: TypeRefId) -> Option<TypeDefId> {
        if let Some(def) = self.ctx.annot.resolved_def(id) {
            return Some(def);
        }
        if self.ctx.failed_refs.contains(&id) {
            return None;
        }
        let out = self.resolve_type_ref_inner(id);
        if out.is_none() {
            self.ctx.failed_refs.insert(id);
        }
        out
    }

    fn resolve_type_ref_inner(&mut self, id: TypeRefId) -> Option<TypeDefId> {
        let t = self.hir.type_ref(id).clone();
        match &t.detail {
            keel_ast::TypeDetail::Pointer { .. } | keel_ast::TypeDetail::Array { .. } => {
                let elem = t.elem()?;
                self.resolve_type_ref(elem)?;
                let base = if t.detail.is_pointer() {
                    self.builtin.pointer_def
                } else {
                    self.builtin.array_def
                };
                let def = generics::specialize_type(self, base, &[elem], &t.loc)?;
                self.ctx.annot.resolve_type(id, Resolution::direct(def));
                Some(def)
            }
            keel_ast::TypeDetail::Func { params, ret } => {
                let mut ok = true;
                for p in params {
                    ok &= self.resolve_type_ref(*p).is_some();
                }
                ok &= self.resolve_type_ref(*ret).is_some();
                if !ok {
                    return None;
                }
                let def = self.builtin.functype_def;
                self.ctx.annot.resolve_type(id, Resolution::direct(def));
                Some(def)
            }
            keel_ast::TypeDetail::None | keel_ast::TypeDetail::Num { .. } => {
                self.resolve_named_ref(id, &t)
            }
        }
    }

    fn resolve_named_ref(&mut self, id: TypeRefId, t: &TypeRef) -> Option<TypeDefId> {
        let sym = match self.lookup(&t.name, &t.loc) {
            Lookup::Found(sym) => sym,
            Lookup::Ambiguous => return None,
            Lookup::Missing => {
                self.ctx.log.push(CompileError::UnknownSymbol {
                    name: t.name.clone(),
                    loc: t.loc.clone(),
                });
                return None;
            }
        };

        let (def, chain) = match sym {
            Symbol::Type(d) => (d, Vec::new()),
            Symbol::Alias(a) => {
                let final_def = self.resolve_alias(a)?;
                let target = self.hir.alias(a).target;
                let mut chain = vec![target];
                if let Some(res) = self.ctx.annot.type_resolution(target) {
                    chain.extend(res.alias.iter().copied());
                }
                (final_def, chain)
            }
            _ => {
                self.ctx.log.push(CompileError::NotAType {
                    name: t.name.clone(),
                    loc: t.loc.clone(),
                });
                return None;
            }
        };

        let expected = generic_param_count(self.hir, def);
        if t.args.is_empty() {
            if expected > 0 && !self.in_definition_of(def) {
                self.ctx.log.push(CompileError::MissingGenericArgs {
                    name: t.name.clone(),
                    loc: t.loc.clone(),
                });
                return None;
            }
            self.ctx.annot.resolve_type(id, Resolution { def, alias: chain });
            return Some(def);
        }
        if expected == 0 {
            self.ctx.log.push(CompileError::NotGeneric {
                name: t.name.clone(),
                loc: t.loc.clone(),
            });
            return None;
        }
        if t.args.len() != expected {
            self.ctx.log.push(CompileError::GenericArgsMismatch {
                name: t.name.clone(),
                expected,
                found: t.args.len(),
                loc: t.loc.clone(),
            });
            return None;
        }
        for arg in &t.args {
            self.resolve_type_ref(*arg);
        }
        let spec = generics::specialize_type(self, def, &t.args, &t.loc)?;
        self.ctx.annot.resolve_type(
            id,
            Resolution {
                def: spec,
                alias: chain,
            },
        );
        Some(spec)
    }

    /// Whether the stack is currently inside the definition of a
    /// generic, where its bare name is legal.
    pub(crate) fn in_definition_of(&self, def: TypeDefId) -> bool {
        self.ctx.sig_running.contains(&def)
            || self
                .stack
                .iter()
                .any(|f| matches!(f, Frame::GenericParams(d) if *d == def))
    }

    // ------------------------------------------------------------------------
    // On-demand signature resolution
    // ------------------------------------------------------------------------

    /// Resolve a type's declared signature: generic bounds, inheritance
    /// list, field types, method prototypes. Memoized and re-entrant.
    pub fn ensure_type_signature(&mut self, d: TypeDefId) {
        if self.ctx.sig_done.contains(&d) || self.ctx.sig_running.contains(&d) {
            return;
        }
        let is_spec = matches!(
            self.hir.type_def(d),
            TypeDef::Struct(s) if s.generic_from.is_some()
        );
        if is_spec {
            // Substitution resolved everything already.
            self.ctx.sig_done.insert(d);
            return;
        }
        self.ctx.sig_running.insert(d);
        let unit = owner_unit(self.hir, self.hir.type_def(d).owner());
        let def = self.hir.type_def(d).clone();
        self.with_unit_frames(unit, |r| match def {
            TypeDef::Struct(s) => {
                r.push(Frame::GenericParams(d));
                for gp in &s.generic_params {
                    if let TypeDef::GenericParam(g) = r.hir.type_def(*gp) {
                        let bound = g.bound;
                        r.resolve_type_ref(bound);
                    }
                }
                for inherit in &s.inherits {
                    r.resolve_type_ref(*inherit);
                }
                for field in &s.fields {
                    if let Some(ty) = r.hir.field(*field).ty {
                        r.resolve_type_ref(ty);
                    }
                }
                for func in &s.funcs {
                    r.ensure_func_signature(*func);
                }
            }
            TypeDef::Enum(e) => {
                // Constants take the enum itself as their type.
                let self_ref = r.synth_named(e.name.clone(), d, e.loc.clone());
                for field in &e.fields {
                    r.ctx.annot.set_field_type(*field, self_ref);
                }
            }
            TypeDef::Trait(t) => {
                for func in &t.funcs {
                    r.ensure_func_signature(*func);
                }
            }
            TypeDef::GenericParam(g) => {
                r.resolve_type_ref(g.bound);
            }
        });
        self.ctx.sig_running.remove(&d);
        self.ctx.sig_done.insert(d);
    }

    /// Resolve a function's prototype. Memoized.
    pub fn ensure_func_signature(&mut self, f: FuncId) {
        if !self.ctx.func_sig_done.insert(f) {
            return;
        }
        let fd = self.hir.func(f).clone();
        if fd.generic_from.is_some() {
            return;
        }
        let unit = owner_unit(self.hir, fd.owner);
        self.with_unit_frames(unit, |r| {
            if let Owner::Type(t) = fd.owner {
                r.push(Frame::GenericParams(t));
            }
            if fd.is_generic() {
                r.push(Frame::FuncGenerics(f));
            }
            for gp in &fd.generic_params {
                if let TypeDef::GenericParam(g) = r.hir.type_def(*gp) {
                    let bound = g.bound;
                    r.resolve_type_ref(bound);
                }
            }
            for p in &fd.prototype.params {
                let ty = r.hir.param(*p).ty;
                r.resolve_type_ref(ty);
            }
            r.resolve_type_ref(fd.prototype.ret);
        });
    }

    /// Unwrap an alias to its final definition. Memoized; a cycle
    /// reports once and resolves to nothing.
    pub fn resolve_alias(&mut self, a: AliasId) -> Option<TypeDefId> {
        if let Some(done) = self.ctx.alias_done.get(&a) {
            return *done;
        }
        if !self.ctx.alias_running.insert(a) {
            let al = self.hir.alias(a).clone();
            self.ctx.log.push(CompileError::UnknownSymbol {
                name: al.name,
                loc: al.loc,
            });
            return None;
        }
        let al = self.hir.alias(a).clone();
        let unit = owner_unit(self.hir, al.owner);
        let def = self.with_unit_frames(unit, |r| r.resolve_type_ref(al.target));
        self.ctx.alias_running.remove(&a);
        self.ctx.alias_done.insert(a, def);
        def
    }

    // ------------------------------------------------------------------------
    // Synthesized references
    // ------------------------------------------------------------------------

    /// A named occurrence pre-resolved to a definition.
    pub fn synth_named(
        &mut self,
        name: impl Into<String>,
        def: TypeDefId,
        loc: Loc,
    ) -> TypeRefId {
        let id = self.hir.alloc_type_ref(TypeRef::named(name, loc));
        self.ctx.annot.resolve_type(id, Resolution::direct(def));
        id
    }

    /// A numeric occurrence pre-resolved to Int or Float.
    pub fn synth_num(&mut self, bits: u8, float: bool, loc: Loc) -> TypeRefId {
        let (name, def) = if float {
            ("Float", self.builtin.float_def)
        } else {
            ("Int", self.builtin.int_def)
        };
        let id = self.hir.alloc_type_ref(TypeRef::num(name, bits, float, loc));
        self.ctx.annot.resolve_type(id, Resolution::direct(def));
        id
    }

    /// A pointer occurrence around an element, resolved through the
    /// pointer pseudo-type's specialization.
    pub fn synth_pointer(
        &mut self,
        attr: PointerAttr,
        nullable: bool,
        elem: TypeRefId,
        loc: Loc,
    ) -> TypeRefId {
        let id = self
            .hir
            .alloc_type_ref(TypeRef::pointer(attr, nullable, elem, loc.clone()));
        let base = self.builtin.pointer_def;
        if let Some(def) = generics::specialize_type(self, base, &[elem], &loc) {
            self.ctx.annot.resolve_type(id, Resolution::direct(def));
        }
        id
    }

    /// A function-type occurrence.
    pub fn synth_func_type(
        &mut self,
        params: Vec<TypeRefId>,
        ret: TypeRefId,
        loc: Loc,
    ) -> TypeRefId {
        let id = self.hir.alloc_type_ref(TypeRef::func(params, ret, loc));
        let def = self.builtin.functype_def;
        self.ctx.annot.resolve_type(id, Resolution::direct(def));
        id
    }

    /// The meta-type of a type occurrence.
    pub fn synth_meta(&mut self, inner: TypeRefId, loc: Loc) -> TypeRefId {
        let id = self
            .hir
            .alloc_type_ref(TypeRef::applied("Type", vec![inner], loc));
        let def = self.builtin.meta_def;
        self.ctx.annot.resolve_type(id, Resolution::direct(def));
        id
    }

    /// An immutable view of an occurrence, sharing its resolution.
    pub fn synth_imutable(&mut self, ty: TypeRefId) -> TypeRefId {
        let t = self.hir.type_ref(ty).clone();
        if t.imutable {
            return ty;
        }
        let res = self.ctx.annot.type_resolution(ty).cloned();
        let id = self.hir.alloc_type_ref(TypeRef { imutable: true, ..t });
        if let Some(res) = res {
            self.ctx.annot.resolve_type(id, res);
        }
        id
    }
}

/// Member candidates on a type: own scope first, inherited only when
/// the own scope is silent.
pub fn member_candidates(
    hir: &Hir,
    ctx: &mut SemaContext,
    def: TypeDefId,
    name: &str,
    inherited: bool,
) -> Vec<Symbol> {
    let own = ctx.type_scope(hir, def).lookup(name).to_vec();
    if !own.is_empty() || !inherited {
        return own;
    }
    ctx.inherit_scope(hir, def).lookup(name).to_vec()
}

/// Number of generic parameters a definition declares.
pub fn generic_param_count(hir: &Hir, def: TypeDefId) -> usize {
    match hir.type_def(def) {
        TypeDef::Struct(s) => s.generic_params.len(),
        _ => 0,
    }
}

/// Declared (or inferred) type of a field, if known.
pub fn field_type(hir: &Hir, ctx: &SemaContext, f: FieldId) -> Option<TypeRefId> {
    ctx.annot.field_type(f).or(hir.field(f).ty)
}

// ============================================================================
// Tests
// ============================================================================
