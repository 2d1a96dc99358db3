//! The builtin environment.
//!
//! Primitives and type constructors are ordinary definitions in a
//! synthetic `builtin` module, looked up through the outermost scope
//! like anything else. Pointer (`*`) and array (`[]`) are *generic*
//! pseudo-structs: a pointer occurrence resolves by specializing `*`
//! with its element type, which is what gives two spellings of
//! `own* Int` the same resolved definition and makes pointer
//! compatibility an identity test.

use keel_core::{DeclFlags, Loc};

use crate::decl::{FileUnit, FuncDef, FuncPrototype, Module, Owner, ParamDef, StructDef, TypeDef};
use crate::hir::Hir;
use crate::ids::{FuncId, ModuleId, TypeDefId, UnitId};
use crate::scope::{Scope, Symbol};
use crate::types::TypeRef;

/// Handles to the builtin definitions.
#[derive(Debug)]
pub struct Builtin {
    pub module: ModuleId,
    pub unit: UnitId,
    /// The outermost scope of every lookup chain.
    pub scope: Scope,
    pub int_def: TypeDefId,
    pub bool_def: TypeDefId,
    pub float_def: TypeDefId,
    pub void_def: TypeDefId,
    /// The `[]` array constructor, generic over the element.
    pub array_def: TypeDefId,
    /// The `*` pointer constructor, generic over the pointee.
    pub pointer_def: TypeDefId,
    /// The `...` vararg marker type.
    pub vararg_def: TypeDefId,
    /// The `=>` function-type marker.
    pub functype_def: TypeDefId,
    /// The meta-type of type names in expression position.
    pub meta_def: TypeDefId,
    pub sizeof_func: FuncId,
    pub offsetof_func: FuncId,
}

impl Builtin {
    /// Install the builtin module into a store and collect the handles.
    pub fn install(hir: &mut Hir) -> Self {
        let module = hir.alloc_module(Module::new("builtin", "1.0"));
        let unit = hir.alloc_unit(FileUnit::new("<builtin>", module));

        let int_def = plain_struct(hir, unit, "Int");
        let bool_def = plain_struct(hir, unit, "Bool");
        let float_def = plain_struct(hir, unit, "Float");
        let void_def = plain_struct(hir, unit, "Void");
        let array_def = generic_struct(hir, unit, "[]");
        let pointer_def = generic_struct(hir, unit, "*");
        let vararg_def = plain_struct(hir, unit, "...");
        let functype_def = plain_struct(hir, unit, "=>");
        let meta_def = plain_struct(hir, unit, "Type");

        let sizeof_func = intrinsic(hir, unit, "sizeof", &["type"]);
        let offsetof_func = intrinsic(hir, unit, "offsetof", &["type", "field"]);

        let mut scope = Scope::new();
        for (name, id) in [
            ("Int", int_def),
            ("Bool", bool_def),
            ("Float", float_def),
            ("Void", void_def),
            ("[]", array_def),
            ("*", pointer_def),
            ("...", vararg_def),
            ("=>", functype_def),
            ("Type", meta_def),
        ] {
            scope.put(name, Symbol::Type(id));
        }
        scope.put("sizeof", Symbol::Func(sizeof_func));
        scope.put("offsetof", Symbol::Func(offsetof_func));

        Self {
            module,
            unit,
            scope,
            int_def,
            bool_def,
            float_def,
            void_def,
            array_def,
            pointer_def,
            vararg_def,
            functype_def,
            meta_def,
            sizeof_func,
            offsetof_func,
        }
    }

    /// Whether a definition is one of the numeric primitives.
    pub fn is_num_def(&self, id: TypeDefId) -> bool {
        id == self.int_def || id == self.float_def
    }
}

fn plain_struct(hir: &mut Hir, unit: UnitId, name: &str) -> TypeDefId {
    hir.define_type(
        unit,
        TypeDef::Struct(StructDef::new(
            name,
            Loc::synthetic(),
            DeclFlags::empty(),
            Owner::Unit(unit),
        )),
    )
}

fn generic_struct(hir: &mut Hir, unit: UnitId, name: &str) -> TypeDefId {
    let def = plain_struct(hir, unit, name);
    let bound = hir.alloc_type_ref(TypeRef::named("Void", Loc::synthetic()));
    hir.add_generic_param(def, "T", bound, Loc::synthetic());
    def
}

/// `sizeof(type: Type): Int` and friends. Parameters take the
/// meta-type so that bare type names type-check as arguments.
fn intrinsic(hir: &mut Hir, unit: UnitId, name: &str, params: &[&str]) -> FuncId {
    let loc = Loc::synthetic();
    let param_ids = params
        .iter()
        .map(|p| {
            let ty = hir.alloc_type_ref(TypeRef::named("Type", loc.clone()));
            hir.alloc_param(ParamDef::new(*p, ty, loc.clone()))
        })
        .collect();
    let ret = hir.alloc_type_ref(TypeRef::num("Int", 32, false, loc.clone()));
    hir.define_func(
        unit,
        FuncDef::new(
            name,
            loc,
            DeclFlags::empty(),
            Owner::Unit(unit),
            FuncPrototype::new(param_ids, ret),
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_registers_all_names() {
        let mut hir = Hir::new();
        let builtin = Builtin::install(&mut hir);

        for name in ["Int", "Bool", "Float", "Void", "[]", "*", "...", "=>", "Type"] {
            assert!(builtin.scope.contains(name), "missing builtin {name}");
        }
        assert!(builtin.scope.contains("sizeof"));
        assert!(builtin.scope.contains("offsetof"));
    }

    #[test]
    fn pointer_and_array_are_generic() {
        let mut hir = Hir::new();
        let builtin = Builtin::install(&mut hir);

        let ptr = hir.type_def(builtin.pointer_def).as_struct().unwrap();
        assert!(ptr.is_generic());
        assert_eq!(ptr.generic_params.len(), 1);

        let arr = hir.type_def(builtin.array_def).as_struct().unwrap();
        assert!(arr.is_generic());
    }

    #[test]
    fn primitives_are_not_generic() {
        let mut hir = Hir::new();
        let builtin = Builtin::install(&mut hir);
        assert!(!hir.type_def(builtin.int_def).as_struct().unwrap().is_generic());
        assert!(builtin.is_num_def(builtin.int_def));
        assert!(builtin.is_num_def(builtin.float_def));
        assert!(!builtin.is_num_def(builtin.bool_def));
    }

    #[test]
    fn intrinsics_take_meta_typed_params() {
        let mut hir = Hir::new();
        let builtin = Builtin::install(&mut hir);

        let sizeof = hir.func(builtin.sizeof_func);
        assert_eq!(sizeof.prototype.params.len(), 1);
        let p = hir.param(sizeof.prototype.params[0]);
        assert_eq!(hir.type_ref(p.ty).name, "Type");

        let offsetof = hir.func(builtin.offsetof_func);
        assert_eq!(offsetof.prototype.params.len(), 2);
    }
}
