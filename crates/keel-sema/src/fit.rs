//! Type identity and compatibility.
//!
//! Two questions come up everywhere downstream: are two types the same
//! ([`equals`]), and does a value of one type satisfy a slot of another
//! ([`fit`])? Identity is canonical, not textual: a [`TypeKey`] folds a
//! reference down to its resolved definition plus the shape details
//! that matter, so two spellings of `own* Int` from different files
//! compare equal and `own* Int` never equals `raw*? Int`.
//!
//! Fit is identity plus a short list of sanctioned widenings: the
//! pointer attribute matrix (`own`/`ref`/`weak` narrow to `raw`, `own`
//! to `ref`), pointer upcasts along the inheritance chain, `null` into
//! any nullable pointer, and values boxing into owning pointers.

use std::fmt;

use keel_ast::{Builtin, Hir, PointerAttr, TypeDef, TypeDefId, TypeDetail, TypeRefId};
use keel_core::DeclFlags;
use rustc_hash::FxHashSet;

use crate::annot::Annotations;

// ============================================================================
// Implicit pointer conversions
// ============================================================================

/// An implicit conversion between pointer attributes.
///
/// The tag names are part of the output contract; the backend keys its
/// conversion helpers off them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConvertKind {
    OwnToRef,
    OwnToRaw,
    RefToRaw,
    WeakToRaw,
}

impl ConvertKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ConvertKind::OwnToRef => "ownToRef",
            ConvertKind::OwnToRaw => "ownToRaw",
            ConvertKind::RefToRaw => "refToRaw",
            ConvertKind::WeakToRaw => "weakToRaw",
        }
    }
}

impl fmt::Display for ConvertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The implicit conversion between two pointer attributes, if one exists.
pub const fn convert_kind(from: PointerAttr, to: PointerAttr) -> Option<ConvertKind> {
    Some(match (from, to) {
        (PointerAttr::Own, PointerAttr::Ref) => ConvertKind::OwnToRef,
        (PointerAttr::Own, PointerAttr::Raw) => ConvertKind::OwnToRaw,
        (PointerAttr::Ref, PointerAttr::Raw) => ConvertKind::RefToRaw,
        (PointerAttr::Weak, PointerAttr::Raw) => ConvertKind::WeakToRaw,
        _ => return None,
    })
}

// ============================================================================
// Canonical type identity
// ============================================================================

/// Canonical identity of a resolved type reference.
///
/// Mutability is deliberately absent (write legality is checked at the
/// slot, not in the type), and numeric widths collapse (`Int8` and
/// `Int32` share a definition; width only matters to the backend).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeKey {
    pub def: TypeDefId,
    pub detail: KeyDetail,
}

/// Shape component of a [`TypeKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyDetail {
    Plain,
    Pointer {
        attr: PointerAttr,
        nullable: bool,
        elem: Box<TypeKey>,
    },
    Array {
        size: Option<u32>,
        elem: Box<TypeKey>,
    },
    Func {
        params: Vec<TypeKey>,
        ret: Box<TypeKey>,
    },
}

impl TypeKey {
    /// Fold a reference to its canonical key. `None` while the
    /// reference (or any part of it) is unresolved.
    pub fn of(hir: &Hir, annot: &Annotations, id: TypeRefId) -> Option<TypeKey> {
        let def = annot.resolved_def(id)?;
        let t = hir.type_ref(id);
        let detail = match &t.detail {
            TypeDetail::None | TypeDetail::Num { .. } => KeyDetail::Plain,
            TypeDetail::Pointer { attr, nullable } => KeyDetail::Pointer {
                attr: *attr,
                nullable: *nullable,
                elem: Box::new(TypeKey::of(hir, annot, t.elem()?)?),
            },
            TypeDetail::Array { size } => KeyDetail::Array {
                size: *size,
                elem: Box::new(TypeKey::of(hir, annot, t.elem()?)?),
            },
            TypeDetail::Func { params, ret } => KeyDetail::Func {
                params: params
                    .iter()
                    .map(|p| TypeKey::of(hir, annot, *p))
                    .collect::<Option<Vec<_>>>()?,
                ret: Box::new(TypeKey::of(hir, annot, *ret)?),
            },
        };
        Some(TypeKey { def, detail })
    }
}

/// Whether two references name the same type.
///
/// Lenient on unresolved input: a reference that failed to resolve has
/// already been reported, so it compares equal to anything rather than
/// cascading.
pub fn equals(hir: &Hir, annot: &Annotations, a: TypeRefId, b: TypeRefId) -> bool {
    match (TypeKey::of(hir, annot, a), TypeKey::of(hir, annot, b)) {
        (Some(ka), Some(kb)) => ka == kb,
        _ => true,
    }
}

// ============================================================================
// Fit
// ============================================================================

/// Result of a fit query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fit {
    /// No conversion path; the assignment is a type error.
    No,
    /// Fits as-is.
    Yes,
    /// Fits through an implicit pointer conversion.
    Convert(ConvertKind),
}

impl Fit {
    pub fn is_ok(self) -> bool {
        !matches!(self, Fit::No)
    }
}

/// Whether a reference is the type of the `null` literal.
pub fn is_null_ref(hir: &Hir, annot: &Annotations, builtin: &Builtin, id: TypeRefId) -> bool {
    let t = hir.type_ref(id);
    t.is_nullable()
        && t.elem()
            .and_then(|e| annot.resolved_def(e))
            .is_some_and(|d| d == builtin.void_def)
}

/// Whether a value of `from` satisfies a slot of type `to`.
pub fn fit(
    hir: &Hir,
    annot: &Annotations,
    builtin: &Builtin,
    from: TypeRefId,
    to: TypeRefId,
) -> Fit {
    if from == to {
        return Fit::Yes;
    }
    // Unresolved references were already reported; let them pass.
    let (Some(from_def), Some(to_def)) = (annot.resolved_def(from), annot.resolved_def(to)) else {
        return Fit::Yes;
    };
    if to_def == builtin.vararg_def {
        return Fit::Yes;
    }
    if is_null_ref(hir, annot, builtin, from) {
        return if hir.type_ref(to).is_nullable() {
            Fit::Yes
        } else {
            Fit::No
        };
    }

    let ft = hir.type_ref(from);
    let tt = hir.type_ref(to);
    match (&ft.detail, &tt.detail) {
        (
            TypeDetail::Pointer {
                attr: fa,
                nullable: fnull,
            },
            TypeDetail::Pointer {
                attr: ta,
                nullable: tnull,
            },
        ) => {
            if *fnull && !*tnull {
                return Fit::No;
            }
            let (Some(fe), Some(te)) = (ft.elem(), tt.elem()) else {
                return Fit::No;
            };
            let elem_ok = equals(hir, annot, fe, te)
                || match (annot.resolved_def(fe), annot.resolved_def(te)) {
                    (Some(sub), Some(sup)) => inherits_from(hir, annot, sub, sup),
                    _ => false,
                };
            if !elem_ok {
                return Fit::No;
            }
            if fa == ta {
                Fit::Yes
            } else {
                match convert_kind(*fa, *ta) {
                    Some(k) => Fit::Convert(k),
                    None => Fit::No,
                }
            }
        }
        (TypeDetail::Pointer { .. }, _) => Fit::No,
        // A plain value boxes into an owning slot when it fits the pointee.
        (
            _,
            TypeDetail::Pointer {
                attr: PointerAttr::Own | PointerAttr::Ref,
                ..
            },
        ) => match tt.elem() {
            Some(te) if fit(hir, annot, builtin, from, te).is_ok() => Fit::Yes,
            _ => Fit::No,
        },
        (_, TypeDetail::Pointer { .. }) => Fit::No,
        (TypeDetail::Array { size: fs }, TypeDetail::Array { size: ts }) => {
            let (Some(fe), Some(te)) = (ft.elem(), tt.elem()) else {
                return Fit::No;
            };
            if !equals(hir, annot, fe, te) {
                return Fit::No;
            }
            if ts.is_none() || fs == ts {
                Fit::Yes
            } else {
                Fit::No
            }
        }
        (TypeDetail::Func { .. }, TypeDetail::Func { .. }) => {
            if equals(hir, annot, from, to) {
                Fit::Yes
            } else {
                Fit::No
            }
        }
        // Numeric widths unify; Int still never fits Float.
        (TypeDetail::Num { .. }, _) | (_, TypeDetail::Num { .. }) => {
            if from_def == to_def {
                Fit::Yes
            } else {
                Fit::No
            }
        }
        _ => {
            if from_def == to_def {
                Fit::Yes
            } else {
                Fit::No
            }
        }
    }
}

/// Whether `sub` transitively inherits `sup` (a struct base or trait).
pub fn inherits_from(hir: &Hir, annot: &Annotations, sub: TypeDefId, sup: TypeDefId) -> bool {
    if sub == sup {
        return true;
    }
    let mut seen = FxHashSet::default();
    inherits_walk(hir, annot, sub, sup, &mut seen)
}

fn inherits_walk(
    hir: &Hir,
    annot: &Annotations,
    sub: TypeDefId,
    sup: TypeDefId,
    seen: &mut FxHashSet<TypeDefId>,
) -> bool {
    if !seen.insert(sub) {
        return false;
    }
    let Some(s) = hir.type_def(sub).as_struct() else {
        return false;
    };
    for inherit in &s.inherits {
        let Some(base) = annot.resolved_def(*inherit) else {
            continue;
        };
        if base == sup || inherits_walk(hir, annot, base, sup, seen) {
            return true;
        }
    }
    false
}

// ============================================================================
// Copyability
// ============================================================================

/// Whether values of this type copy freely out of slots.
///
/// Owning pointers never copy; a struct flagged noncopyable never
/// copies; a struct copies only if all its fields do.
pub fn is_copyable(hir: &Hir, annot: &Annotations, ty: TypeRefId) -> bool {
    let mut seen = FxHashSet::default();
    copyable_walk(hir, annot, ty, &mut seen)
}

fn copyable_walk(
    hir: &Hir,
    annot: &Annotations,
    ty: TypeRefId,
    seen: &mut FxHashSet<TypeDefId>,
) -> bool {
    let t = hir.type_ref(ty);
    match &t.detail {
        TypeDetail::Pointer { attr, .. } => !matches!(attr, PointerAttr::Own),
        TypeDetail::Array { .. } => match t.elem() {
            Some(e) => copyable_walk(hir, annot, e, seen),
            None => true,
        },
        TypeDetail::Func { .. } | TypeDetail::Num { .. } => true,
        TypeDetail::None => {
            let Some(def) = annot.resolved_def(ty) else {
                return true;
            };
            if !seen.insert(def) {
                // Already on the walk; recursion through a value field
                // cannot make the type less copyable than its pointers do.
                return true;
            }
            match hir.type_def(def) {
                TypeDef::Struct(s) => {
                    if s.flags.contains(DeclFlags::NONCOPYABLE) {
                        return false;
                    }
                    s.fields.iter().all(|f| match hir.field(*f).ty {
                        Some(fty) => copyable_walk(hir, annot, fty, seen),
                        None => true,
                    })
                }
                TypeDef::Enum(_) | TypeDef::Trait(_) | TypeDef::GenericParam(_) => true,
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
