//! Type references.
//!
//! A [`TypeRef`] is one occurrence of a type: a spelling in a signature,
//! or a node synthesized during resolution (literal types, function
//! types, specialization arguments). Pointer and array types reuse the
//! generic-argument slot for their element type, so `own* Int` is the
//! pseudo-type `*` applied to `Int` with a pointer detail attached.

use std::fmt;

use keel_core::Loc;

use crate::ids::TypeRefId;

/// Ownership attribute of a pointer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerAttr {
    /// Unique owning pointer; copying one out of a slot demands `move`.
    Own,
    /// Shared pointer, tracked by the runtime.
    Ref,
    /// Non-owning pointer that may dangle.
    Weak,
    /// Unmanaged pointer; every use needs an unsafe context.
    Raw,
}

impl PointerAttr {
    /// Keyword spelling, as used in diagnostics and convert tags.
    pub const fn as_str(self) -> &'static str {
        match self {
            PointerAttr::Own => "own",
            PointerAttr::Ref => "ref",
            PointerAttr::Weak => "weak",
            PointerAttr::Raw => "raw",
        }
    }
}

impl fmt::Display for PointerAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape information beyond the bare identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDetail {
    /// A plain named type.
    None,
    /// Pointer; the element type is the single generic argument.
    Pointer { attr: PointerAttr, nullable: bool },
    /// Fixed-size array; the element type is the single generic
    /// argument. `size` stays `None` until inferred from an init block.
    Array { size: Option<u32> },
    /// Function type: parameter types plus return type.
    Func {
        params: Vec<TypeRefId>,
        ret: TypeRefId,
    },
    /// Numeric primitive with an explicit width.
    Num { bits: u8, float: bool },
}

impl TypeDetail {
    /// Whether this is a pointer shape.
    pub fn is_pointer(&self) -> bool {
        matches!(self, TypeDetail::Pointer { .. })
    }

    /// Whether this is a numeric shape.
    pub fn is_num(&self) -> bool {
        matches!(self, TypeDetail::Num { .. })
    }
}

/// One occurrence of a type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    pub loc: Loc,
    /// Identifier as written; pseudo-types use their symbol names
    /// (`*`, `[]`, `=>`, `...`).
    pub name: String,
    /// Generic arguments, if any; pointer/array element types live here.
    pub args: Vec<TypeRefId>,
    pub detail: TypeDetail,
    /// Whether values of this type refuse mutation.
    pub imutable: bool,
}

impl TypeRef {
    /// A plain named occurrence.
    pub fn named(name: impl Into<String>, loc: Loc) -> Self {
        Self {
            loc,
            name: name.into(),
            args: Vec::new(),
            detail: TypeDetail::None,
            imutable: false,
        }
    }

    /// A named occurrence with generic arguments.
    pub fn applied(name: impl Into<String>, args: Vec<TypeRefId>, loc: Loc) -> Self {
        Self {
            loc,
            name: name.into(),
            args,
            detail: TypeDetail::None,
            imutable: false,
        }
    }

    /// A pointer occurrence around an element type.
    pub fn pointer(attr: PointerAttr, nullable: bool, elem: TypeRefId, loc: Loc) -> Self {
        Self {
            loc,
            name: "*".into(),
            args: vec![elem],
            detail: TypeDetail::Pointer { attr, nullable },
            imutable: false,
        }
    }

    /// An array occurrence around an element type.
    pub fn array(size: Option<u32>, elem: TypeRefId, loc: Loc) -> Self {
        Self {
            loc,
            name: "[]".into(),
            args: vec![elem],
            detail: TypeDetail::Array { size },
            imutable: false,
        }
    }

    /// A function-type occurrence.
    pub fn func(params: Vec<TypeRefId>, ret: TypeRefId, loc: Loc) -> Self {
        Self {
            loc,
            name: "=>".into(),
            args: Vec::new(),
            detail: TypeDetail::Func { params, ret },
            imutable: false,
        }
    }

    /// A numeric occurrence (`Int`/`Float` with a width).
    pub fn num(name: impl Into<String>, bits: u8, float: bool, loc: Loc) -> Self {
        Self {
            loc,
            name: name.into(),
            args: Vec::new(),
            detail: TypeDetail::Num { bits, float },
            imutable: false,
        }
    }

    /// Mark this occurrence immutable.
    pub fn imutable(mut self) -> Self {
        self.imutable = true;
        self
    }

    /// The element type of a pointer or array occurrence.
    pub fn elem(&self) -> Option<TypeRefId> {
        match self.detail {
            TypeDetail::Pointer { .. } | TypeDetail::Array { .. } => self.args.first().copied(),
            _ => None,
        }
    }

    /// Pointer attribute, if this is a pointer occurrence.
    pub fn pointer_attr(&self) -> Option<PointerAttr> {
        match self.detail {
            TypeDetail::Pointer { attr, .. } => Some(attr),
            _ => None,
        }
    }

    /// Whether this is a nullable pointer occurrence.
    pub fn is_nullable(&self) -> bool {
        matches!(self.detail, TypeDetail::Pointer { nullable: true, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pointer_attr_spelling() {
        assert_eq!(PointerAttr::Own.as_str(), "own");
        assert_eq!(PointerAttr::Raw.to_string(), "raw");
    }

    #[test]
    fn pointer_elem_is_first_arg() {
        let elem = TypeRefId::new(7);
        let ptr = TypeRef::pointer(PointerAttr::Own, false, elem, Loc::synthetic());
        assert_eq!(ptr.elem(), Some(elem));
        assert_eq!(ptr.pointer_attr(), Some(PointerAttr::Own));
        assert!(!ptr.is_nullable());
        assert_eq!(ptr.name, "*");
    }

    #[test]
    fn named_ref_has_no_elem() {
        let named = TypeRef::named("Point", Loc::synthetic());
        assert_eq!(named.elem(), None);
        assert_eq!(named.pointer_attr(), None);
        assert!(!named.detail.is_pointer());
    }

    #[test]
    fn imutable_builder() {
        let named = TypeRef::named("Point", Loc::synthetic()).imutable();
        assert!(named.imutable);
    }
}
