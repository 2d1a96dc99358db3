//! Generic specialization.
//!
//! A specialization is a fresh definition cloned from a generic with
//! every generic-parameter occurrence substituted by the argument
//! reference. The cache keys on the generic's id plus the canonical
//! [`TypeKey`] of each argument, so every spelling of `List<Int>`
//! lands on the same definition and type identity stays nominal.
//!
//! The shell is cached before its members are filled in, which is what
//! lets self-referential generics (`Node<T>` holding a pointer to
//! `Node<T>`) terminate: the recursive occurrence hits the cache.

use keel_ast::{FuncId, Owner, StructDef, TypeDef, TypeDefId, TypeDetail, TypeRef, TypeRefId};
use keel_core::Loc;
use rustc_hash::FxHashMap;

use crate::annot::Resolution;
use crate::fit::TypeKey;
use crate::resolver::TypeResolver;

// ============================================================================
// Cache
// ============================================================================

/// Memoized specializations, keyed by canonical argument identity.
#[derive(Debug, Default)]
pub struct SpecializationCache {
    types: FxHashMap<(TypeDefId, Vec<TypeKey>), TypeDefId>,
    funcs: FxHashMap<(FuncId, Vec<TypeKey>), FuncId>,
}

impl SpecializationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct type specializations created so far.
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Number of distinct function specializations created so far.
    pub fn func_count(&self) -> usize {
        self.funcs.len()
    }
}

// ============================================================================
// Type specialization
// ============================================================================

/// Specialize a generic struct for the given argument references.
///
/// Arguments must already be resolved; an unkeyable argument yields
/// nothing (the failure was reported where the argument failed).
/// Passing the generic's own parameters back in returns the generic
/// itself, which keeps self-references inside a generic definition
/// from spawning specializations.
pub fn specialize_type(
    r: &mut TypeResolver,
    generic: TypeDefId,
    args: &[TypeRefId],
    use_loc: &Loc,
) -> Option<TypeDefId> {
    let mut keys = Vec::with_capacity(args.len());
    for arg in args {
        keys.push(TypeKey::of(r.hir, &r.ctx.annot, *arg)?);
    }

    let gps = match r.hir.type_def(generic) {
        TypeDef::Struct(s) => s.generic_params.clone(),
        _ => return None,
    };
    if gps.len() != args.len() {
        return None;
    }
    let identity = args
        .iter()
        .zip(&gps)
        .all(|(arg, gp)| r.ctx.annot.resolved_def(*arg) == Some(*gp));
    if identity {
        return Some(generic);
    }

    if let Some(done) = r.ctx.spec.types.get(&(generic, keys.clone())) {
        return Some(*done);
    }

    r.ensure_type_signature(generic);
    let source = match r.hir.type_def(generic) {
        TypeDef::Struct(s) => s.clone(),
        _ => return None,
    };

    let shell = StructDef {
        name: source.name.clone(),
        loc: use_loc.clone(),
        flags: source.flags,
        owner: source.owner,
        generic_params: Vec::new(),
        inherits: Vec::new(),
        fields: Vec::new(),
        funcs: Vec::new(),
        generic_from: Some(generic),
    };
    let spec = r.hir.alloc_type_def(TypeDef::Struct(shell));
    r.ctx.spec.types.insert((generic, keys), spec);
    r.ctx.sig_done.insert(spec);

    let mapping: FxHashMap<TypeDefId, TypeRefId> =
        gps.iter().copied().zip(args.iter().copied()).collect();

    let inherits: Vec<TypeRefId> = source
        .inherits
        .iter()
        .map(|i| subst_ref(r, *i, &mapping))
        .collect();

    let mut fields = Vec::with_capacity(source.fields.len());
    for field in &source.fields {
        let mut fd = r.hir.field(*field).clone();
        fd.owner = Owner::Type(spec);
        fd.ty = fd.ty.map(|ty| subst_ref(r, ty, &mapping));
        fields.push(r.hir.alloc_field(fd));
    }

    let mut funcs = Vec::with_capacity(source.funcs.len());
    for func in &source.funcs {
        funcs.push(specialize_owned_func(r, *func, spec, &mapping));
    }

    if let TypeDef::Struct(s) = r.hir.type_def_mut(spec) {
        s.inherits = inherits;
        s.fields = fields;
        s.funcs = funcs;
    }
    Some(spec)
}

/// Clone a method into a specialization, substituting its prototype.
/// The body statement is shared with the generic original.
fn specialize_owned_func(
    r: &mut TypeResolver,
    func: FuncId,
    owner: TypeDefId,
    mapping: &FxHashMap<TypeDefId, TypeRefId>,
) -> FuncId {
    let mut fd = r.hir.func(func).clone();
    fd.owner = Owner::Type(owner);
    fd.generic_from = Some(func);
    let mut params = Vec::with_capacity(fd.prototype.params.len());
    for p in &fd.prototype.params {
        let mut pd = r.hir.param(*p).clone();
        pd.ty = subst_ref(r, pd.ty, mapping);
        params.push(r.hir.alloc_param(pd));
    }
    fd.prototype.params = params;
    fd.prototype.ret = subst_ref(r, fd.prototype.ret, mapping);
    let id = r.hir.alloc_func(fd);
    r.ctx.func_sig_done.insert(id);
    id
}

// ============================================================================
// Function specialization
// ============================================================================

/// Specialize a generic function for explicit argument references.
pub fn specialize_func(
    r: &mut TypeResolver,
    generic: FuncId,
    args: &[TypeRefId],
) -> Option<FuncId> {
    let mut keys = Vec::with_capacity(args.len());
    for arg in args {
        keys.push(TypeKey::of(r.hir, &r.ctx.annot, *arg)?);
    }

    let gps = r.hir.func(generic).generic_params.clone();
    if gps.is_empty() || gps.len() != args.len() {
        return None;
    }
    let identity = args
        .iter()
        .zip(&gps)
        .all(|(arg, gp)| r.ctx.annot.resolved_def(*arg) == Some(*gp));
    if identity {
        return Some(generic);
    }

    if let Some(done) = r.ctx.spec.funcs.get(&(generic, keys.clone())) {
        return Some(*done);
    }

    r.ensure_func_signature(generic);
    let mapping: FxHashMap<TypeDefId, TypeRefId> =
        gps.iter().copied().zip(args.iter().copied()).collect();

    let mut fd = r.hir.func(generic).clone();
    fd.generic_from = Some(generic);
    fd.generic_params = Vec::new();
    let mut params = Vec::with_capacity(fd.prototype.params.len());
    for p in &fd.prototype.params {
        let mut pd = r.hir.param(*p).clone();
        pd.ty = subst_ref(r, pd.ty, &mapping);
        params.push(r.hir.alloc_param(pd));
    }
    fd.prototype.params = params;
    fd.prototype.ret = subst_ref(r, fd.prototype.ret, &mapping);
    let spec = r.hir.alloc_func(fd);
    r.ctx.func_sig_done.insert(spec);
    r.ctx.spec.funcs.insert((generic, keys), spec);
    Some(spec)
}

// ============================================================================
// Substitution
// ============================================================================

/// Rewrite a type reference under a generic-parameter mapping.
///
/// Returns the same id when nothing underneath mentions a mapped
/// parameter, so unrelated references stay shared. New references are
/// allocated resolved.
pub fn subst_ref(
    r: &mut TypeResolver,
    id: TypeRefId,
    mapping: &FxHashMap<TypeDefId, TypeRefId>,
) -> TypeRefId {
    let t = r.hir.type_ref(id).clone();
    let res = r.ctx.annot.type_resolution(id).cloned();

    // A bare parameter occurrence becomes the argument reference.
    if t.args.is_empty() && matches!(t.detail, TypeDetail::None) {
        if let Some(res) = &res {
            if let Some(arg) = mapping.get(&res.def) {
                return *arg;
            }
        }
        return id;
    }

    match &t.detail {
        TypeDetail::Pointer { .. } | TypeDetail::Array { .. } => {
            let elem = match t.elem() {
                Some(e) => e,
                None => return id,
            };
            let new_elem = subst_ref(r, elem, mapping);
            if new_elem == elem {
                return id;
            }
            let new_id = r.hir.alloc_type_ref(TypeRef {
                args: vec![new_elem],
                ..t.clone()
            });
            let base = if t.detail.is_pointer() {
                r.builtin.pointer_def
            } else {
                r.builtin.array_def
            };
            if let Some(def) = specialize_type(r, base, &[new_elem], &t.loc) {
                r.ctx.annot.resolve_type(new_id, Resolution::direct(def));
            }
            new_id
        }
        TypeDetail::Func { params, ret } => {
            let new_params: Vec<TypeRefId> =
                params.iter().map(|p| subst_ref(r, *p, mapping)).collect();
            let new_ret = subst_ref(r, *ret, mapping);
            if new_ret == *ret && new_params.as_slice() == params.as_slice() {
                return id;
            }
            let new_id = r.hir.alloc_type_ref(TypeRef {
                detail: TypeDetail::Func {
                    params: new_params,
                    ret: new_ret,
                },
                ..t.clone()
            });
            let def = r.builtin.functype_def;
            r.ctx.annot.resolve_type(new_id, Resolution::direct(def));
            new_id
        }
        TypeDetail::Num { .. } => id,
        TypeDetail::None => {
            // Named application: substitute the arguments.
            let new_args: Vec<TypeRefId> =
                t.args.iter().map(|a| subst_ref(r, *a, mapping)).collect();
            if new_args.as_slice() == t.args.as_slice() {
                return id;
            }
            let new_id = r.hir.alloc_type_ref(TypeRef {
                args: new_args.clone(),
                ..t.clone()
            });
            if let Some(res) = res {
                let base = match r.hir.type_def(res.def) {
                    TypeDef::Struct(s) => s.generic_from.unwrap_or(res.def),
                    _ => res.def,
                };
                if let Some(spec) = specialize_type(r, base, &new_args, &t.loc) {
                    r.ctx.annot.resolve_type(new_id, Resolution::direct(spec));
                }
            }
            new_id
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
