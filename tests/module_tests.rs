//! Cross-module tests: imports, the loader seam, and module-scoped
//! visibility, driven through [`Compiler`] with closure loaders.

use keel::prelude::*;
use keel_ast::{ExprId, ModuleId, Stmt, StmtId, StmtKind, TypeRefId, UnitId};

// =============================================================================
// Program construction helpers
// =============================================================================

fn at(line: u32, col: u32) -> Loc {
    Loc::new("main.ke", line, col, 0)
}

fn loc() -> Loc {
    at(1, 1)
}

fn messages(log: &CompilerLog) -> Vec<String> {
    log.iter().map(|e| e.to_string()).collect()
}

fn main_module(hir: &mut Hir, depends: &[&str]) -> (ModuleId, UnitId) {
    let module = hir.alloc_module(Module::new("main", "1.0"));
    let unit = hir.alloc_unit(FileUnit::new("main.ke", module));
    for dep in depends {
        hir.module_mut(module).depends.push(Depend::new(*dep, "1.0"));
    }
    (module, unit)
}

fn import(
    hir: &mut Hir,
    unit: UnitId,
    module: &str,
    item: Option<&str>,
    alias: Option<&str>,
    star: bool,
) {
    hir.unit_mut(unit).imports.push(Import {
        loc: loc(),
        module: module.into(),
        item: item.map(Into::into),
        alias: alias.map(Into::into),
        star,
    });
}

fn ident(hir: &mut Hir, name: &str) -> ExprId {
    hir.alloc_expr(Expr::new(
        ExprKind::Id {
            ns: None,
            name: name.into(),
        },
        loc(),
    ))
}

fn declare_local(
    hir: &mut Hir,
    unit: UnitId,
    name: &str,
    ty: TypeRefId,
    init: Option<ExprId>,
) -> StmtId {
    let mut def = FieldDef::local(name, loc(), Owner::Unit(unit), Some(ty));
    def.init = init;
    let f = hir.alloc_field(def);
    hir.alloc_stmt(Stmt::new(StmtKind::LocalVar(f), loc()))
}

fn define_fn(hir: &mut Hir, unit: UnitId, stmts: Vec<StmtId>) {
    let ret = hir.alloc_type_ref(TypeRef::named("Void", loc()));
    let body = hir.alloc_stmt(Stmt::new(StmtKind::Block(stmts), loc()));
    let mut def = FuncDef::new(
        "f",
        loc(),
        DeclFlags::empty(),
        Owner::Unit(unit),
        FuncPrototype::new(Vec::new(), ret),
    );
    def.body = Some(body);
    hir.define_func(unit, def);
}

/// The fixture dependency: two structs plus two top-level constants,
/// one of them module-private.
fn build_geom(hir: &mut Hir) -> ModuleId {
    let gloc = Loc::new("geom.ke", 1, 1, 0);
    let module = hir.alloc_module(Module::new("geom", "1.0"));
    let unit = hir.alloc_unit(FileUnit::new("geom.ke", module));
    for name in ["Vec2", "Scalar"] {
        let s = hir.define_type(
            unit,
            TypeDef::Struct(StructDef::new(
                name,
                gloc.clone(),
                DeclFlags::empty(),
                Owner::Unit(unit),
            )),
        );
        let ty = hir.alloc_type_ref(TypeRef::num("Int", 32, false, gloc.clone()));
        hir.add_field(
            s,
            FieldDef::new("v", gloc.clone(), DeclFlags::empty(), Owner::Type(s), Some(ty)),
        );
    }
    for (name, flags) in [
        ("ORIGIN", DeclFlags::CONST),
        ("SECRET", DeclFlags::CONST | DeclFlags::PRIVATE),
    ] {
        let ty = hir.alloc_type_ref(TypeRef::num("Int", 32, false, gloc.clone()));
        let zero = hir.alloc_expr(Expr::new(ExprKind::Literal(Literal::Int(0)), gloc.clone()));
        let mut def = FieldDef::new(name, gloc.clone(), flags, Owner::Unit(unit), Some(ty));
        def.init = Some(zero);
        hir.define_field(unit, def);
    }
    module
}

fn geom_compiler() -> Compiler<impl ModuleLoader> {
    Compiler::with_loader(|hir: &mut Hir, name: &str, _version: &str| {
        if name == "geom" {
            Ok(Some(build_geom(hir)))
        } else {
            Ok(None)
        }
    })
}

// =============================================================================
// Imports
// =============================================================================

#[test]
fn import_alias_replaces_the_original_name() {
    let mut c = geom_compiler();
    let (module, unit) = main_module(&mut c.hir, &["geom"]);
    import(&mut c.hir, unit, "geom", Some("Vec2"), Some("Point"), false);

    // v: Point; w: Vec2;
    let v_ty = c.hir.alloc_type_ref(TypeRef::named("Point", loc()));
    let decl_v = declare_local(&mut c.hir, unit, "v", v_ty, None);
    let w_ty = c.hir.alloc_type_ref(TypeRef::named("Vec2", at(3, 12)));
    let decl_w = declare_local(&mut c.hir, unit, "w", w_ty, None);
    define_fn(&mut c.hir, unit, vec![decl_v, decl_w]);

    c.compile(module).unwrap();
    assert_eq!(
        messages(c.log()),
        vec!["Unknown symbol 'Vec2' at main.ke:3:12"]
    );
}

#[test]
fn star_import_pulls_the_whole_module() {
    let mut c = geom_compiler();
    let (module, unit) = main_module(&mut c.hir, &["geom"]);
    import(&mut c.hir, unit, "geom", None, None, true);

    let v_ty = c.hir.alloc_type_ref(TypeRef::named("Vec2", loc()));
    let decl_v = declare_local(&mut c.hir, unit, "v", v_ty, None);
    let s_ty = c.hir.alloc_type_ref(TypeRef::named("Scalar", loc()));
    let decl_s = declare_local(&mut c.hir, unit, "s", s_ty, None);
    define_fn(&mut c.hir, unit, vec![decl_v, decl_s]);

    c.compile(module).unwrap();
    assert!(c.log().is_empty(), "log: {}", c.ctx.log);
}

#[test]
fn star_import_with_a_named_item_is_rejected() {
    let mut c = geom_compiler();
    let (module, unit) = main_module(&mut c.hir, &["geom"]);
    import(&mut c.hir, unit, "geom", Some("Vec2"), None, true);

    c.compile(module).unwrap();
    assert_eq!(
        messages(c.log()),
        vec!["Wildcard import needs a module, got 'Vec2' at main.ke:1:1"]
    );
}

#[test]
fn missing_import_item_is_reported() {
    let mut c = geom_compiler();
    let (module, unit) = main_module(&mut c.hir, &["geom"]);
    import(&mut c.hir, unit, "geom", Some("Ghost"), None, false);

    c.compile(module).unwrap();
    assert_eq!(messages(c.log()), vec!["Unknown symbol 'Ghost' at main.ke:1:1"]);
}

#[test]
fn qualified_access_through_a_module_import() {
    let mut c = geom_compiler();
    let (module, unit) = main_module(&mut c.hir, &["geom"]);
    import(&mut c.hir, unit, "geom", None, None, false);

    // x: Int = geom::ORIGIN;
    let x_ty = c.hir.alloc_type_ref(TypeRef::num("Int", 32, false, loc()));
    let ns = ident(&mut c.hir, "geom");
    let origin = c.hir.alloc_expr(Expr::new(
        ExprKind::Id {
            ns: Some(ns),
            name: "ORIGIN".into(),
        },
        loc(),
    ));
    let decl = declare_local(&mut c.hir, unit, "x", x_ty, Some(origin));
    define_fn(&mut c.hir, unit, vec![decl]);

    c.compile(module).unwrap();
    assert!(c.log().is_empty(), "log: {}", c.ctx.log);
}

// =============================================================================
// Module-scoped visibility
// =============================================================================

#[test]
fn module_scoped_constants_stay_home() {
    let mut c = geom_compiler();
    let (module, unit) = main_module(&mut c.hir, &["geom"]);
    import(&mut c.hir, unit, "geom", Some("SECRET"), None, false);

    // x: Int = SECRET;
    let x_ty = c.hir.alloc_type_ref(TypeRef::num("Int", 32, false, loc()));
    let secret = ident(&mut c.hir, "SECRET");
    let decl = declare_local(&mut c.hir, unit, "x", x_ty, Some(secret));
    define_fn(&mut c.hir, unit, vec![decl]);

    c.compile(module).unwrap();
    assert_eq!(c.log().len(), 1, "log: {}", c.ctx.log);
    assert!(c.log().has_message("private or protected to its module"));
}

// =============================================================================
// Loader behavior
// =============================================================================

#[test]
fn cached_dependencies_resolve_for_later_importers() {
    let mut loads = 0usize;
    {
        let mut c = Compiler::with_loader(|hir: &mut Hir, name: &str, _version: &str| {
            if name == "geom" {
                loads += 1;
                Ok(Some(build_geom(hir)))
            } else {
                Ok(None)
            }
        });

        for name in ["main_a", "main_b"] {
            let module = c.hir.alloc_module(Module::new(name, "1.0"));
            let unit = c
                .hir
                .alloc_unit(FileUnit::new(format!("{name}.ke"), module));
            c.hir.module_mut(module).depends.push(Depend::new("geom", "1.0"));
            import(&mut c.hir, unit, "geom", Some("Vec2"), None, false);
            let v_ty = c.hir.alloc_type_ref(TypeRef::named("Vec2", loc()));
            let decl = declare_local(&mut c.hir, unit, "v", v_ty, None);
            define_fn(&mut c.hir, unit, vec![decl]);
            c.compile(module).unwrap();
        }
        assert!(c.log().is_empty(), "log: {}", c.ctx.log);
    }
    assert_eq!(loads, 1);
}
