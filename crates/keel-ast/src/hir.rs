//! The arena store for one compilation.
//!
//! All modules share a single [`Hir`], so a cross-module reference is
//! just an id. The external parser builds the tree through the `alloc`
//! and `define` methods here; the semantic passes read it and push
//! synthesized nodes (literal types, function types, specializations),
//! but never rewrite an existing node.

use crate::decl::{
    FieldDef, FileUnit, FuncDef, GenericParamDef, Module, Owner, TypeAlias, TypeDef,
};
use crate::expr::Expr;
use crate::ids::{
    AliasId, ExprId, FieldId, FuncId, ModuleId, ParamId, StmtId, TypeDefId, TypeRefId, UnitId,
};
use crate::stmt::Stmt;
use crate::types::{TypeDetail, TypeRef};
use keel_core::Loc;

use crate::decl::ParamDef;

/// Owns every node arena.
#[derive(Debug, Default)]
pub struct Hir {
    modules: Vec<Module>,
    units: Vec<FileUnit>,
    type_defs: Vec<TypeDef>,
    funcs: Vec<FuncDef>,
    fields: Vec<FieldDef>,
    aliases: Vec<TypeAlias>,
    params: Vec<ParamDef>,
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
    type_refs: Vec<TypeRef>,
}

impl Hir {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    pub fn alloc_module(&mut self, module: Module) -> ModuleId {
        let id = ModuleId::new(self.modules.len() as u32);
        self.modules.push(module);
        id
    }

    /// Allocate a file unit and link it into its module.
    pub fn alloc_unit(&mut self, unit: FileUnit) -> UnitId {
        let id = UnitId::new(self.units.len() as u32);
        let module = unit.module;
        self.units.push(unit);
        self.modules[module.index()].units.push(id);
        id
    }

    pub fn alloc_type_def(&mut self, def: TypeDef) -> TypeDefId {
        let id = TypeDefId::new(self.type_defs.len() as u32);
        self.type_defs.push(def);
        id
    }

    pub fn alloc_func(&mut self, def: FuncDef) -> FuncId {
        let id = FuncId::new(self.funcs.len() as u32);
        self.funcs.push(def);
        id
    }

    pub fn alloc_field(&mut self, def: FieldDef) -> FieldId {
        let id = FieldId::new(self.fields.len() as u32);
        self.fields.push(def);
        id
    }

    pub fn alloc_alias(&mut self, def: TypeAlias) -> AliasId {
        let id = AliasId::new(self.aliases.len() as u32);
        self.aliases.push(def);
        id
    }

    pub fn alloc_param(&mut self, def: ParamDef) -> ParamId {
        let id = ParamId::new(self.params.len() as u32);
        self.params.push(def);
        id
    }

    pub fn alloc_expr(&mut self, expr: Expr) -> ExprId {
        let id = ExprId::new(self.exprs.len() as u32);
        self.exprs.push(expr);
        id
    }

    pub fn alloc_stmt(&mut self, stmt: Stmt) -> StmtId {
        let id = StmtId::new(self.stmts.len() as u32);
        self.stmts.push(stmt);
        id
    }

    pub fn alloc_type_ref(&mut self, ty: TypeRef) -> TypeRefId {
        let id = TypeRefId::new(self.type_refs.len() as u32);
        self.type_refs.push(ty);
        id
    }

    // ========================================================================
    // Top-level definition helpers
    // ========================================================================

    /// Allocate a type definition and register it in its file unit.
    pub fn define_type(&mut self, unit: UnitId, def: TypeDef) -> TypeDefId {
        let id = self.alloc_type_def(def);
        self.units[unit.index()].type_defs.push(id);
        id
    }

    /// Allocate a free function and register it in its file unit.
    pub fn define_func(&mut self, unit: UnitId, def: FuncDef) -> FuncId {
        let id = self.alloc_func(def);
        self.units[unit.index()].funcs.push(id);
        id
    }

    /// Allocate a file-scope field and register it in its file unit.
    pub fn define_field(&mut self, unit: UnitId, def: FieldDef) -> FieldId {
        let id = self.alloc_field(def);
        self.units[unit.index()].fields.push(id);
        id
    }

    /// Allocate a type alias and register it in its file unit.
    pub fn define_alias(&mut self, unit: UnitId, def: TypeAlias) -> AliasId {
        let id = self.alloc_alias(def);
        self.units[unit.index()].aliases.push(id);
        id
    }

    /// Allocate a method and register it on its owning struct or trait.
    pub fn add_method(&mut self, owner: TypeDefId, def: FuncDef) -> FuncId {
        let id = self.alloc_func(def);
        match &mut self.type_defs[owner.index()] {
            TypeDef::Struct(s) => s.funcs.push(id),
            TypeDef::Trait(t) => t.funcs.push(id),
            _ => {}
        }
        id
    }

    /// Allocate a member field (or enum constant) on its owning type.
    pub fn add_field(&mut self, owner: TypeDefId, def: FieldDef) -> FieldId {
        let id = self.alloc_field(def);
        match &mut self.type_defs[owner.index()] {
            TypeDef::Struct(s) => s.fields.push(id),
            TypeDef::Enum(e) => e.fields.push(id),
            _ => {}
        }
        id
    }

    /// Declare a generic parameter on a struct definition.
    pub fn add_generic_param(
        &mut self,
        owner: TypeDefId,
        name: impl Into<String>,
        bound: TypeRefId,
        loc: Loc,
    ) -> TypeDefId {
        let index = match &self.type_defs[owner.index()] {
            TypeDef::Struct(s) => s.generic_params.len(),
            _ => 0,
        };
        let id = self.alloc_type_def(TypeDef::GenericParam(GenericParamDef {
            name: name.into(),
            loc,
            owner: Owner::Type(owner),
            bound,
            index,
        }));
        if let TypeDef::Struct(s) = &mut self.type_defs[owner.index()] {
            s.generic_params.push(id);
        }
        id
    }

    /// Declare a generic parameter on a function definition.
    pub fn add_func_generic_param(
        &mut self,
        owner: FuncId,
        name: impl Into<String>,
        bound: TypeRefId,
        loc: Loc,
    ) -> TypeDefId {
        let index = self.funcs[owner.index()].generic_params.len();
        let id = self.alloc_type_def(TypeDef::GenericParam(GenericParamDef {
            name: name.into(),
            loc,
            owner: Owner::Func(owner),
            bound,
            index,
        }));
        self.funcs[owner.index()].generic_params.push(id);
        id
    }

    // ========================================================================
    // Access
    // ========================================================================

    pub fn module(&self, id: ModuleId) -> &Module {
        &self.modules[id.index()]
    }

    pub fn module_mut(&mut self, id: ModuleId) -> &mut Module {
        &mut self.modules[id.index()]
    }

    pub fn unit(&self, id: UnitId) -> &FileUnit {
        &self.units[id.index()]
    }

    pub fn unit_mut(&mut self, id: UnitId) -> &mut FileUnit {
        &mut self.units[id.index()]
    }

    pub fn type_def(&self, id: TypeDefId) -> &TypeDef {
        &self.type_defs[id.index()]
    }

    pub fn type_def_mut(&mut self, id: TypeDefId) -> &mut TypeDef {
        &mut self.type_defs[id.index()]
    }

    pub fn func(&self, id: FuncId) -> &FuncDef {
        &self.funcs[id.index()]
    }

    pub fn func_mut(&mut self, id: FuncId) -> &mut FuncDef {
        &mut self.funcs[id.index()]
    }

    pub fn field(&self, id: FieldId) -> &FieldDef {
        &self.fields[id.index()]
    }

    pub fn field_mut(&mut self, id: FieldId) -> &mut FieldDef {
        &mut self.fields[id.index()]
    }

    pub fn alias(&self, id: AliasId) -> &TypeAlias {
        &self.aliases[id.index()]
    }

    pub fn param(&self, id: ParamId) -> &ParamDef {
        &self.params[id.index()]
    }

    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }

    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }

    pub fn type_ref(&self, id: TypeRefId) -> &TypeRef {
        &self.type_refs[id.index()]
    }

    /// Ids of all modules, in allocation order.
    pub fn module_ids(&self) -> impl Iterator<Item = ModuleId> {
        (0..self.modules.len() as u32).map(ModuleId::new)
    }

    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    pub fn type_def_count(&self) -> usize {
        self.type_defs.len()
    }

    pub fn expr_count(&self) -> usize {
        self.exprs.len()
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Render a type occurrence for diagnostics, e.g. `own* Int`,
    /// `[]Point`, `List<Int>`, `fun(Int): Void`.
    pub fn type_display(&self, id: TypeRefId) -> String {
        let t = self.type_ref(id);
        let mut out = String::new();
        if t.imutable {
            out.push_str("const ");
        }
        match &t.detail {
            TypeDetail::Pointer { attr, nullable } => {
                out.push_str(attr.as_str());
                out.push('*');
                if *nullable {
                    out.push('?');
                }
                out.push(' ');
                if let Some(elem) = t.elem() {
                    out.push_str(&self.type_display(elem));
                }
            }
            TypeDetail::Array { size } => {
                out.push('[');
                if let Some(n) = size {
                    out.push_str(&n.to_string());
                }
                out.push(']');
                if let Some(elem) = t.elem() {
                    out.push_str(&self.type_display(elem));
                }
            }
            TypeDetail::Func { params, ret } => {
                out.push_str("fun(");
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&self.type_display(*p));
                }
                out.push_str("): ");
                out.push_str(&self.type_display(*ret));
            }
            TypeDetail::None | TypeDetail::Num { .. } => {
                out.push_str(&t.name);
                if !t.args.is_empty() {
                    out.push('<');
                    for (i, a) in t.args.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        out.push_str(&self.type_display(*a));
                    }
                    out.push('>');
                }
            }
        }
        out
    }
}
