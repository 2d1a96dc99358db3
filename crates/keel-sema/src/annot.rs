//! Resolution side tables.
//!
//! The resolver passes never write into syntax nodes. Everything they
//! learn about a node is keyed by its id and stored here: which
//! definition a type reference names, which type an expression has,
//! which overloaded operator a binary picked, and which implicit
//! pointer conversion an assignment needs. Later passes and consumers
//! read the tables through [`Annotations`].

use keel_ast::{ExprId, FieldId, FuncId, Symbol, TypeDefId, TypeRefId};
use rustc_hash::FxHashMap;

use crate::fit::ConvertKind;

// ============================================================================
// Type reference resolution
// ============================================================================

/// Outcome of resolving one type reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The definition the reference names, after alias unwrapping and
    /// generic specialization.
    pub def: TypeDefId,
    /// Alias hops taken on the way to `def`, outermost first. Empty for
    /// direct references.
    pub alias: Vec<TypeRefId>,
}

impl Resolution {
    pub fn direct(def: TypeDefId) -> Self {
        Resolution { def, alias: Vec::new() }
    }
}

// ============================================================================
// Expression annotations
// ============================================================================

/// Everything the expression resolver records about one expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExprInfo {
    /// Resolved type of the expression. `None` while resolution of this
    /// node failed; downstream checks skip such nodes.
    pub ty: Option<TypeRefId>,
    /// The named definition an identifier or member access landed on.
    pub def: Option<Symbol>,
    /// Operator method selected for this expression (`plus`, `compare`,
    /// `get`, `set`, ...).
    pub operator: Option<FuncId>,
    /// Implicit pointer conversion required at this position.
    pub convert: Option<ConvertKind>,
    /// Set when the expression crosses pointer representations and the
    /// backend must emit a conversion rather than a plain copy.
    pub is_pointer_convert: bool,
}

// ============================================================================
// Annotations
// ============================================================================

/// Side tables produced by the resolver pipeline.
#[derive(Debug, Default)]
pub struct Annotations {
    type_refs: FxHashMap<TypeRefId, Resolution>,
    exprs: FxHashMap<ExprId, ExprInfo>,
    /// Types for fields that carry no declared type: inferred locals and
    /// enum constants.
    field_types: FxHashMap<FieldId, TypeRefId>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // Type references
    // ------------------------------------------------------------------------

    pub fn resolve_type(&mut self, id: TypeRefId, res: Resolution) {
        self.type_refs.insert(id, res);
    }

    pub fn type_resolution(&self, id: TypeRefId) -> Option<&Resolution> {
        self.type_refs.get(&id)
    }

    /// Definition a reference resolved to, if resolution succeeded.
    pub fn resolved_def(&self, id: TypeRefId) -> Option<TypeDefId> {
        self.type_refs.get(&id).map(|r| r.def)
    }

    pub fn is_resolved(&self, id: TypeRefId) -> bool {
        self.type_refs.contains_key(&id)
    }

    // ------------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------------

    pub fn expr_info(&self, id: ExprId) -> Option<&ExprInfo> {
        self.exprs.get(&id)
    }

    pub fn expr_type(&self, id: ExprId) -> Option<TypeRefId> {
        self.exprs.get(&id).and_then(|i| i.ty)
    }

    pub fn expr_def(&self, id: ExprId) -> Option<Symbol> {
        self.exprs.get(&id).and_then(|i| i.def)
    }

    pub fn expr_operator(&self, id: ExprId) -> Option<FuncId> {
        self.exprs.get(&id).and_then(|i| i.operator)
    }

    pub fn set_expr_type(&mut self, id: ExprId, ty: TypeRefId) {
        self.exprs.entry(id).or_default().ty = Some(ty);
    }

    pub fn set_expr_def(&mut self, id: ExprId, def: Symbol) {
        self.exprs.entry(id).or_default().def = Some(def);
    }

    pub fn set_expr_operator(&mut self, id: ExprId, func: FuncId) {
        self.exprs.entry(id).or_default().operator = Some(func);
    }

    pub fn set_expr_convert(&mut self, id: ExprId, kind: ConvertKind) {
        let info = self.exprs.entry(id).or_default();
        info.convert = Some(kind);
        info.is_pointer_convert = true;
    }

    pub fn set_pointer_convert(&mut self, id: ExprId) {
        self.exprs.entry(id).or_default().is_pointer_convert = true;
    }

    /// An expression counts as resolved once it has a type.
    pub fn is_expr_resolved(&self, id: ExprId) -> bool {
        self.expr_type(id).is_some()
    }

    // ------------------------------------------------------------------------
    // Inferred field types
    // ------------------------------------------------------------------------

    pub fn set_field_type(&mut self, id: FieldId, ty: TypeRefId) {
        self.field_types.insert(id, ty);
    }

    pub fn field_type(&self, id: FieldId) -> Option<TypeRefId> {
        self.field_types.get(&id).copied()
    }

    pub fn type_ref_count(&self) -> usize {
        self.type_refs.len()
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }
}

// ============================================================================
// Tests
// ============================================================================
