//! Shared state of one resolver pipeline run.
//!
//! [`SemaContext`] owns the side tables, the diagnostic log, and the
//! lazily built scope caches. All three passes thread the same context,
//! so a scope built for the first pass is reused by the others, and a
//! dependency module resolved earlier keeps its annotations warm for
//! every dependent compiled after it.

use keel_ast::{AliasId, FuncId, Hir, ModuleId, Scope, Symbol, TypeDef, TypeDefId, TypeRefId, UnitId};
use keel_core::{CompilerLog, DeclFlags};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::annot::Annotations;
use crate::generics::SpecializationCache;

/// State shared by every pass over one [`Hir`].
#[derive(Debug, Default)]
pub struct SemaContext {
    pub annot: Annotations,
    pub log: CompilerLog,
    pub spec: SpecializationCache,

    module_scopes: FxHashMap<ModuleId, Scope>,
    import_scopes: FxHashMap<UnitId, Scope>,
    type_scopes: FxHashMap<TypeDefId, Scope>,
    inherit_scopes: FxHashMap<TypeDefId, Scope>,

    /// Type definitions whose signatures are fully resolved.
    pub sig_done: FxHashSet<TypeDefId>,
    /// Type definitions whose signature resolution is on the stack.
    /// A generic may reference itself while in here.
    pub sig_running: FxHashSet<TypeDefId>,
    /// Functions whose prototypes are fully resolved.
    pub func_sig_done: FxHashSet<FuncId>,
    /// Memoized alias targets; `None` records a failed resolution.
    pub alias_done: FxHashMap<AliasId, Option<TypeDefId>>,
    /// Aliases currently being unwrapped, for cycle detection.
    pub alias_running: FxHashSet<AliasId>,
    /// References that already failed to resolve and reported.
    pub failed_refs: FxHashSet<TypeRefId>,
}

impl SemaContext {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // Scope caches
    // ------------------------------------------------------------------------

    /// The union of every top-level declaration in a module.
    pub fn module_scope(&mut self, hir: &Hir, m: ModuleId) -> &Scope {
        self.module_scopes
            .entry(m)
            .or_insert_with(|| build_module_scope(hir, m))
    }

    /// The scope a file's imports resolved to. Built by the top-level
    /// pass; absent until then.
    pub fn import_scope(&self, unit: UnitId) -> Option<&Scope> {
        self.import_scopes.get(&unit)
    }

    pub fn set_import_scope(&mut self, unit: UnitId, scope: Scope) {
        self.import_scopes.insert(unit, scope);
    }

    /// A type's own members: generic params, fields, methods.
    pub fn type_scope(&mut self, hir: &Hir, def: TypeDefId) -> &Scope {
        self.type_scopes
            .entry(def)
            .or_insert_with(|| build_type_scope(hir, def))
    }

    /// Everything a type sees through its inheritance list, private
    /// members excluded at every level.
    pub fn inherit_scope(&mut self, hir: &Hir, def: TypeDefId) -> &Scope {
        if !self.inherit_scopes.contains_key(&def) {
            let mut out = Scope::new();
            let mut seen = FxHashSet::default();
            seen.insert(def);
            self.collect_inherited(hir, def, &mut out, &mut seen);
            self.inherit_scopes.insert(def, out);
        }
        &self.inherit_scopes[&def]
    }

    fn collect_inherited(
        &mut self,
        hir: &Hir,
        def: TypeDefId,
        out: &mut Scope,
        seen: &mut FxHashSet<TypeDefId>,
    ) {
        let inherits = match hir.type_def(def) {
            TypeDef::Struct(s) => s.inherits.clone(),
            _ => return,
        };
        for inherit in inherits {
            let Some(base) = self.annot.resolved_def(inherit) else {
                continue;
            };
            if !seen.insert(base) {
                continue;
            }
            let entries: Vec<(String, Symbol)> = self
                .type_scope(hir, base)
                .iter()
                .flat_map(|(name, syms)| syms.iter().map(move |s| (name.to_string(), *s)))
                .collect();
            for (name, sym) in entries {
                // A base's generic params are not member names.
                if matches!(sym, Symbol::Type(_)) {
                    continue;
                }
                if member_flags(hir, sym).is_some_and(|f| f.contains(DeclFlags::PRIVATE)) {
                    continue;
                }
                out.put(name, sym);
            }
            self.collect_inherited(hir, base, out, seen);
        }
    }
}

fn build_module_scope(hir: &Hir, m: ModuleId) -> Scope {
    let mut scope = Scope::new();
    for unit in &hir.module(m).units {
        let u = hir.unit(*unit);
        for t in &u.type_defs {
            scope.put(hir.type_def(*t).name(), Symbol::Type(*t));
        }
        for f in &u.funcs {
            scope.put(hir.func(*f).name.clone(), Symbol::Func(*f));
        }
        for f in &u.fields {
            scope.put(hir.field(*f).name.clone(), Symbol::Field(*f));
        }
        for a in &u.aliases {
            scope.put(hir.alias(*a).name.clone(), Symbol::Alias(*a));
        }
    }
    scope
}

fn build_type_scope(hir: &Hir, def: TypeDefId) -> Scope {
    let mut scope = Scope::new();
    match hir.type_def(def) {
        TypeDef::Struct(s) => {
            for gp in &s.generic_params {
                scope.put(hir.type_def(*gp).name(), Symbol::Type(*gp));
            }
            for f in &s.fields {
                scope.put(hir.field(*f).name.clone(), Symbol::Field(*f));
            }
            for f in &s.funcs {
                scope.put(hir.func(*f).name.clone(), Symbol::Func(*f));
            }
        }
        TypeDef::Enum(e) => {
            for f in &e.fields {
                scope.put(hir.field(*f).name.clone(), Symbol::Field(*f));
            }
        }
        TypeDef::Trait(t) => {
            for f in &t.funcs {
                scope.put(hir.func(*f).name.clone(), Symbol::Func(*f));
            }
        }
        TypeDef::GenericParam(_) => {}
    }
    scope
}

/// Modifier flags of a member symbol, where the kind has them.
pub fn member_flags(hir: &Hir, sym: Symbol) -> Option<DeclFlags> {
    match sym {
        Symbol::Field(f) => Some(hir.field(f).flags),
        Symbol::Func(f) => Some(hir.func(f).flags),
        _ => None,
    }
}

/// The module a symbol was declared in, walking owner links upward.
pub fn symbol_module(hir: &Hir, sym: Symbol) -> Option<ModuleId> {
    let owner = match sym {
        Symbol::Type(d) => hir.type_def(d).owner(),
        Symbol::Func(f) => hir.func(f).owner,
        Symbol::Field(f) => hir.field(f).owner,
        Symbol::Alias(a) => hir.alias(a).owner,
        Symbol::Param(_) => return None,
        Symbol::Module(m) => return Some(m),
    };
    owner_module(hir, owner)
}

/// The module an owner chain roots in.
pub fn owner_module(hir: &Hir, owner: keel_ast::Owner) -> Option<ModuleId> {
    match owner {
        keel_ast::Owner::Unit(u) => Some(hir.unit(u).module),
        keel_ast::Owner::Type(t) => owner_module(hir, hir.type_def(t).owner()),
        keel_ast::Owner::Func(f) => owner_module(hir, hir.func(f).owner),
    }
}

/// The file unit an owner chain roots in.
pub fn owner_unit(hir: &Hir, owner: keel_ast::Owner) -> UnitId {
    match owner {
        keel_ast::Owner::Unit(u) => u,
        keel_ast::Owner::Type(t) => owner_unit(hir, hir.type_def(t).owner()),
        keel_ast::Owner::Func(f) => owner_unit(hir, hir.func(f).owner),
    }
}

// ============================================================================
// Tests
// ============================================================================
