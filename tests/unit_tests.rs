//! Acceptance tests for the semantic pipeline.
//!
//! Each test hand-builds the declaration tree an external parser would
//! produce for a small program, runs the full pipeline through
//! [`Compiler`], and checks the diagnostic log and the annotations the
//! downstream generator would read.

use keel::prelude::*;
use keel_ast::{
    AssignOp, BinaryOp, ExprId, FuncId, ModuleId, Stmt, StmtId, StmtKind, TypeRefId, UnaryOp,
    UnitId,
};
use keel_sema::{ExprResolver, TopLevelResolver};
use rustc_hash::FxHashMap;

// =============================================================================
// Program construction helpers
// =============================================================================

fn at(line: u32, col: u32) -> Loc {
    Loc::new("test.ke", line, col, 0)
}

fn loc() -> Loc {
    at(1, 1)
}

fn program() -> (Compiler, ModuleId, UnitId) {
    let mut c = Compiler::new();
    let module = c.hir.alloc_module(Module::new("test", "1.0"));
    let unit = c.hir.alloc_unit(FileUnit::new("test.ke", module));
    (c, module, unit)
}

fn messages(c: &Compiler) -> Vec<String> {
    c.log().iter().map(|e| e.to_string()).collect()
}

fn named(c: &mut Compiler, name: &str) -> TypeRefId {
    c.hir.alloc_type_ref(TypeRef::named(name, loc()))
}

fn own_int(c: &mut Compiler) -> TypeRefId {
    let elem = named(c, "Int");
    c.hir
        .alloc_type_ref(TypeRef::pointer(PointerAttr::Own, false, elem, loc()))
}

fn ident(c: &mut Compiler, name: &str, l: Loc) -> ExprId {
    c.hir.alloc_expr(Expr::new(
        ExprKind::Id {
            ns: None,
            name: name.into(),
        },
        l,
    ))
}

fn int(c: &mut Compiler, value: i64) -> ExprId {
    c.hir
        .alloc_expr(Expr::new(ExprKind::Literal(Literal::Int(value)), loc()))
}

fn declare_local(
    c: &mut Compiler,
    unit: UnitId,
    name: &str,
    ty: Option<TypeRefId>,
    init: Option<ExprId>,
) -> StmtId {
    let mut def = FieldDef::local(name, loc(), Owner::Unit(unit), ty);
    def.init = init;
    let f = c.hir.alloc_field(def);
    c.hir.alloc_stmt(Stmt::new(StmtKind::LocalVar(f), loc()))
}

fn expr_stmt(c: &mut Compiler, e: ExprId) -> StmtId {
    c.hir.alloc_stmt(Stmt::new(StmtKind::Expr(e), loc()))
}

fn define_fn(c: &mut Compiler, unit: UnitId, name: &str, stmts: Vec<StmtId>) -> FuncId {
    define_fn_flagged(c, unit, name, DeclFlags::empty(), stmts)
}

fn define_fn_flagged(
    c: &mut Compiler,
    unit: UnitId,
    name: &str,
    flags: DeclFlags,
    stmts: Vec<StmtId>,
) -> FuncId {
    let ret = named(c, "Void");
    let body = c.hir.alloc_stmt(Stmt::new(StmtKind::Block(stmts), loc()));
    let mut def = FuncDef::new(
        name,
        loc(),
        flags,
        Owner::Unit(unit),
        FuncPrototype::new(Vec::new(), ret),
    );
    def.body = Some(body);
    c.hir.define_func(unit, def)
}

/// struct P { x: Int; }
fn define_point(c: &mut Compiler, unit: UnitId) -> keel_ast::TypeDefId {
    let p = c.hir.define_type(
        unit,
        TypeDef::Struct(StructDef::new(
            "P",
            loc(),
            DeclFlags::empty(),
            Owner::Unit(unit),
        )),
    );
    let x_ty = c.hir.alloc_type_ref(TypeRef::num("Int", 32, false, loc()));
    c.hir.add_field(
        p,
        FieldDef::new("x", loc(), DeclFlags::empty(), Owner::Type(p), Some(x_ty)),
    );
    p
}

/// fun f(): Void { a: own* Int = 1; b: own* Int = a; }
///
/// With `use_move`, b's initializer is move(a) instead.
fn own_pointer_program(use_move: bool) -> (Compiler, ModuleId) {
    let (mut c, module, unit) = program();
    let a_ty = own_int(&mut c);
    let one = int(&mut c, 1);
    let decl_a = declare_local(&mut c, unit, "a", Some(a_ty), Some(one));

    let b_ty = own_int(&mut c);
    let a_use = ident(&mut c, "a", at(2, 19));
    let init = if use_move {
        c.hir.alloc_expr(Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Move,
                operand: a_use,
            },
            at(2, 19),
        ))
    } else {
        a_use
    };
    let decl_b = declare_local(&mut c, unit, "b", Some(b_ty), Some(init));
    define_fn(&mut c, unit, "f", vec![decl_a, decl_b]);
    (c, module)
}

// =============================================================================
// Resolution and typing
// =============================================================================

#[test]
fn plain_struct_member_write_is_clean() {
    let (mut c, module, unit) = program();
    define_point(&mut c, unit);

    // p: P; p.x = 1;
    let p_ty = named(&mut c, "P");
    let decl = declare_local(&mut c, unit, "p", Some(p_ty), None);
    let p_use = ident(&mut c, "p", loc());
    let access = c.hir.alloc_expr(Expr::new(
        ExprKind::Access {
            target: p_use,
            name: "x".into(),
        },
        loc(),
    ));
    let one = int(&mut c, 1);
    let assign = c.hir.alloc_expr(Expr::new(
        ExprKind::Assign {
            op: AssignOp::Assign,
            lhs: access,
            rhs: one,
        },
        loc(),
    ));
    let stmt = expr_stmt(&mut c, assign);
    define_fn(&mut c, unit, "f", vec![decl, stmt]);

    c.compile(module).unwrap();
    assert!(c.log().is_empty(), "log: {}", c.ctx.log);
}

#[test]
fn generic_specializations_share_identity() {
    let (mut c, module, unit) = program();

    // struct Box<T> { value: T; }
    let boxd = c.hir.define_type(
        unit,
        TypeDef::Struct(StructDef::new(
            "Box",
            loc(),
            DeclFlags::empty(),
            Owner::Unit(unit),
        )),
    );
    let bound = named(&mut c, "Void");
    c.hir.add_generic_param(boxd, "T", bound, loc());
    let value_ty = named(&mut c, "T");
    c.hir.add_field(
        boxd,
        FieldDef::new(
            "value",
            loc(),
            DeclFlags::empty(),
            Owner::Type(boxd),
            Some(value_ty),
        ),
    );

    // a: Box<Int>; b: Box<Int>; c: Box<Float>;
    let int_a = named(&mut c, "Int");
    let a_ty = c
        .hir
        .alloc_type_ref(TypeRef::applied("Box", vec![int_a], loc()));
    let int_b = named(&mut c, "Int");
    let b_ty = c
        .hir
        .alloc_type_ref(TypeRef::applied("Box", vec![int_b], loc()));
    let float_c = named(&mut c, "Float");
    let c_ty = c
        .hir
        .alloc_type_ref(TypeRef::applied("Box", vec![float_c], loc()));
    let decl_a = declare_local(&mut c, unit, "a", Some(a_ty), None);
    let decl_b = declare_local(&mut c, unit, "b", Some(b_ty), None);
    let decl_c = declare_local(&mut c, unit, "c", Some(c_ty), None);
    define_fn(&mut c, unit, "f", vec![decl_a, decl_b, decl_c]);

    c.compile(module).unwrap();
    assert!(c.log().is_empty(), "log: {}", c.ctx.log);

    let da = c.ctx.annot.resolved_def(a_ty).unwrap();
    let db = c.ctx.annot.resolved_def(b_ty).unwrap();
    let dc = c.ctx.annot.resolved_def(c_ty).unwrap();
    assert_eq!(da, db);
    assert_ne!(da, dc);
    assert_eq!(c.ctx.spec.type_count(), 2);
}

#[test]
fn enum_constant_carries_the_enum_type() {
    let (mut c, module, unit) = program();
    let color = c.hir.define_type(
        unit,
        TypeDef::Enum(EnumDef::new(
            "Color",
            loc(),
            DeclFlags::empty(),
            Owner::Unit(unit),
        )),
    );
    c.hir.add_field(
        color,
        FieldDef::new("Red", loc(), DeclFlags::CONST, Owner::Type(color), None),
    );
    c.hir.add_field(
        color,
        FieldDef::new("Green", loc(), DeclFlags::CONST, Owner::Type(color), None),
    );

    // chosen: Color = Color::Red;
    let color_ty = named(&mut c, "Color");
    let ns = ident(&mut c, "Color", loc());
    let red = c.hir.alloc_expr(Expr::new(
        ExprKind::Id {
            ns: Some(ns),
            name: "Red".into(),
        },
        loc(),
    ));
    let decl = declare_local(&mut c, unit, "chosen", Some(color_ty), Some(red));
    define_fn(&mut c, unit, "pick", vec![decl]);

    c.compile(module).unwrap();
    assert!(c.log().is_empty(), "log: {}", c.ctx.log);
    let ty = c.ctx.annot.expr_type(red).unwrap();
    assert_eq!(c.ctx.annot.resolved_def(ty), Some(color));
}

#[test]
fn operator_method_drives_struct_arithmetic() {
    let (mut c, module, unit) = program();
    let vec2 = define_point(&mut c, unit);

    // fun plus(o: P): P operator { return o; }
    let o_ty = named(&mut c, "P");
    let o = c.hir.alloc_param(ParamDef::new("o", o_ty, loc()));
    let ret = named(&mut c, "P");
    let o_use = ident(&mut c, "o", loc());
    let ret_stmt = c
        .hir
        .alloc_stmt(Stmt::new(StmtKind::Return(Some(o_use)), loc()));
    let body = c
        .hir
        .alloc_stmt(Stmt::new(StmtKind::Block(vec![ret_stmt]), loc()));
    let mut plus = FuncDef::new(
        "plus",
        loc(),
        DeclFlags::OPERATOR,
        Owner::Type(vec2),
        FuncPrototype::new(vec![o], ret),
    );
    plus.body = Some(body);
    let plus_id = c.hir.add_method(vec2, plus);

    // s: P = a + b;
    let a_ty = named(&mut c, "P");
    let decl_a = declare_local(&mut c, unit, "a", Some(a_ty), None);
    let b_ty = named(&mut c, "P");
    let decl_b = declare_local(&mut c, unit, "b", Some(b_ty), None);
    let a_use = ident(&mut c, "a", loc());
    let b_use = ident(&mut c, "b", loc());
    let sum = c.hir.alloc_expr(Expr::new(
        ExprKind::Binary {
            op: BinaryOp::Add,
            lhs: a_use,
            rhs: b_use,
        },
        loc(),
    ));
    let s_ty = named(&mut c, "P");
    let decl_s = declare_local(&mut c, unit, "s", Some(s_ty), Some(sum));
    define_fn(&mut c, unit, "f", vec![decl_a, decl_b, decl_s]);

    c.compile(module).unwrap();
    assert!(c.log().is_empty(), "log: {}", c.ctx.log);
    assert_eq!(c.ctx.annot.expr_operator(sum), Some(plus_id));
}

#[test]
fn alias_resolves_to_its_target() {
    let (mut c, module, unit) = program();
    let target = named(&mut c, "Int");
    c.hir.define_alias(
        unit,
        TypeAlias::new("Name", loc(), DeclFlags::empty(), Owner::Unit(unit), target),
    );

    // n: Name = 3;
    let n_ty = named(&mut c, "Name");
    let three = int(&mut c, 3);
    let decl = declare_local(&mut c, unit, "n", Some(n_ty), Some(three));
    define_fn(&mut c, unit, "f", vec![decl]);

    c.compile(module).unwrap();
    assert!(c.log().is_empty(), "log: {}", c.ctx.log);
    assert_eq!(c.ctx.annot.resolved_def(n_ty), Some(c.builtin.int_def));
}

#[test]
fn inherited_members_reach_the_derived_struct() {
    let (mut c, module, unit) = program();

    // virtual struct Base { hp: Int; }
    let base = c.hir.define_type(
        unit,
        TypeDef::Struct(StructDef::new(
            "Base",
            loc(),
            DeclFlags::VIRTUAL,
            Owner::Unit(unit),
        )),
    );
    let hp_ty = c.hir.alloc_type_ref(TypeRef::num("Int", 32, false, loc()));
    c.hir.add_field(
        base,
        FieldDef::new(
            "hp",
            loc(),
            DeclFlags::empty(),
            Owner::Type(base),
            Some(hp_ty),
        ),
    );

    // trait Show { fun show(): Void; }
    let show = c.hir.define_type(
        unit,
        TypeDef::Trait(TraitDef::new(
            "Show",
            loc(),
            DeclFlags::empty(),
            Owner::Unit(unit),
        )),
    );
    let show_ret = named(&mut c, "Void");
    c.hir.add_method(
        show,
        FuncDef::new(
            "show",
            loc(),
            DeclFlags::empty(),
            Owner::Type(show),
            FuncPrototype::new(Vec::new(), show_ret),
        ),
    );

    // struct Derived: Base, Show {}
    let derived = c.hir.define_type(
        unit,
        TypeDef::Struct(StructDef::new(
            "Derived",
            loc(),
            DeclFlags::empty(),
            Owner::Unit(unit),
        )),
    );
    let base_ref = named(&mut c, "Base");
    let show_ref = named(&mut c, "Show");
    if let TypeDef::Struct(s) = c.hir.type_def_mut(derived) {
        s.inherits.push(base_ref);
        s.inherits.push(show_ref);
    }

    // d: Derived; d.hp = 7;
    let d_ty = named(&mut c, "Derived");
    let decl = declare_local(&mut c, unit, "d", Some(d_ty), None);
    let d_use = ident(&mut c, "d", loc());
    let access = c.hir.alloc_expr(Expr::new(
        ExprKind::Access {
            target: d_use,
            name: "hp".into(),
        },
        loc(),
    ));
    let seven = int(&mut c, 7);
    let assign = c.hir.alloc_expr(Expr::new(
        ExprKind::Assign {
            op: AssignOp::Assign,
            lhs: access,
            rhs: seven,
        },
        loc(),
    ));
    let stmt = expr_stmt(&mut c, assign);
    define_fn(&mut c, unit, "f", vec![decl, stmt]);

    c.compile(module).unwrap();
    assert!(c.log().is_empty(), "log: {}", c.ctx.log);
}

// =============================================================================
// Ownership and policy checks
// =============================================================================

#[test]
fn own_pointer_rebinding_requires_move() {
    let (mut c, module) = own_pointer_program(false);
    c.compile(module).unwrap();
    assert_eq!(messages(&c), vec!["Miss move keyword at test.ke:2:19"]);
}

#[test]
fn moving_the_source_clears_the_diagnostic() {
    let (mut c, module) = own_pointer_program(true);
    c.compile(module).unwrap();
    assert!(c.log().is_empty(), "log: {}", c.ctx.log);
}

#[test]
fn non_bool_condition_is_flagged_at_the_site() {
    let (mut c, module, unit) = program();
    let cond = c
        .hir
        .alloc_expr(Expr::new(ExprKind::Literal(Literal::Int(1)), at(3, 9)));
    let then = c
        .hir
        .alloc_stmt(Stmt::new(StmtKind::Block(Vec::new()), loc()));
    let iff = c.hir.alloc_stmt(Stmt::new(
        StmtKind::If {
            cond,
            then,
            els: None,
        },
        loc(),
    ));
    define_fn(&mut c, unit, "f", vec![iff]);

    c.compile(module).unwrap();
    assert_eq!(messages(&c), vec!["Must be Bool at test.ke:3:9"]);
}

#[test]
fn private_field_is_sealed_outside_its_struct() {
    let (mut c, module, unit) = program();
    let p = c.hir.define_type(
        unit,
        TypeDef::Struct(StructDef::new(
            "P",
            loc(),
            DeclFlags::empty(),
            Owner::Unit(unit),
        )),
    );
    let x_ty = c.hir.alloc_type_ref(TypeRef::num("Int", 32, false, loc()));
    c.hir.add_field(
        p,
        FieldDef::new("x", loc(), DeclFlags::PRIVATE, Owner::Type(p), Some(x_ty)),
    );

    let p_ty = named(&mut c, "P");
    let decl = declare_local(&mut c, unit, "p", Some(p_ty), None);
    let p_use = ident(&mut c, "p", loc());
    let access = c.hir.alloc_expr(Expr::new(
        ExprKind::Access {
            target: p_use,
            name: "x".into(),
        },
        loc(),
    ));
    let stmt = expr_stmt(&mut c, access);
    define_fn(&mut c, unit, "f", vec![decl, stmt]);

    c.compile(module).unwrap();
    assert_eq!(c.log().len(), 1, "log: {}", c.ctx.log);
    assert!(c.log().has_message("private"));
}

#[test]
fn private_field_is_open_to_its_own_methods() {
    let (mut c, module, unit) = program();
    let p = c.hir.define_type(
        unit,
        TypeDef::Struct(StructDef::new(
            "P",
            loc(),
            DeclFlags::empty(),
            Owner::Unit(unit),
        )),
    );
    let x_ty = c.hir.alloc_type_ref(TypeRef::num("Int", 32, false, loc()));
    c.hir.add_field(
        p,
        FieldDef::new("x", loc(), DeclFlags::PRIVATE, Owner::Type(p), Some(x_ty)),
    );

    // fun read(): Int { return x; }
    let x_use = ident(&mut c, "x", loc());
    let ret_stmt = c
        .hir
        .alloc_stmt(Stmt::new(StmtKind::Return(Some(x_use)), loc()));
    let body = c
        .hir
        .alloc_stmt(Stmt::new(StmtKind::Block(vec![ret_stmt]), loc()));
    let ret_ty = c.hir.alloc_type_ref(TypeRef::num("Int", 32, false, loc()));
    let mut read = FuncDef::new(
        "read",
        loc(),
        DeclFlags::empty(),
        Owner::Type(p),
        FuncPrototype::new(Vec::new(), ret_ty),
    );
    read.body = Some(body);
    c.hir.add_method(p, read);

    c.compile(module).unwrap();
    assert!(c.log().is_empty(), "log: {}", c.ctx.log);
}

#[test]
fn raw_pointer_deref_needs_unsafe() {
    let (mut c, module, unit) = program();
    let elem = named(&mut c, "Int");
    let p_ty = c
        .hir
        .alloc_type_ref(TypeRef::pointer(PointerAttr::Raw, true, elem, loc()));
    let decl = declare_local(&mut c, unit, "p", Some(p_ty), None);
    let p_use = ident(&mut c, "p", loc());
    let deref = c.hir.alloc_expr(Expr::new(
        ExprKind::Unary {
            op: UnaryOp::Deref,
            operand: p_use,
        },
        loc(),
    ));
    let stmt = expr_stmt(&mut c, deref);
    define_fn(&mut c, unit, "f", vec![decl, stmt]);

    c.compile(module).unwrap();
    assert_eq!(c.log().len(), 1, "log: {}", c.ctx.log);
    assert!(c.log().has_message("unsafe"));
}

#[test]
fn unsafe_function_opens_a_region() {
    let (mut c, module, unit) = program();
    let elem = named(&mut c, "Int");
    let p_ty = c
        .hir
        .alloc_type_ref(TypeRef::pointer(PointerAttr::Raw, true, elem, loc()));
    let decl = declare_local(&mut c, unit, "p", Some(p_ty), None);
    let p_use = ident(&mut c, "p", loc());
    let deref = c.hir.alloc_expr(Expr::new(
        ExprKind::Unary {
            op: UnaryOp::Deref,
            operand: p_use,
        },
        loc(),
    ));
    let stmt = expr_stmt(&mut c, deref);
    define_fn_flagged(&mut c, unit, "f", DeclFlags::UNSAFE, vec![decl, stmt]);

    c.compile(module).unwrap();
    assert!(c.log().is_empty(), "log: {}", c.ctx.log);
}

// =============================================================================
// Pipeline properties
// =============================================================================

#[test]
fn identical_programs_resolve_identically() {
    let (mut first, m1) = own_pointer_program(false);
    first.compile(m1).unwrap();
    let (mut second, m2) = own_pointer_program(false);
    second.compile(m2).unwrap();

    assert_eq!(messages(&first), messages(&second));
}

#[test]
fn resolution_is_idempotent() {
    let (mut c, module, unit) = program();
    define_point(&mut c, unit);
    let p_ty = named(&mut c, "P");
    let decl = declare_local(&mut c, unit, "p", Some(p_ty), None);
    define_fn(&mut c, unit, "f", vec![decl]);

    c.compile(module).unwrap();
    assert!(c.log().is_empty(), "log: {}", c.ctx.log);
    let first = c.ctx.annot.resolved_def(p_ty).unwrap();

    // Running the passes again must change nothing.
    let mut deps = FxHashMap::default();
    deps.insert("test".to_string(), module);
    TopLevelResolver::run(&mut c.hir, &c.builtin, &mut c.ctx, module, &deps);
    ExprResolver::run(&mut c.hir, &c.builtin, &mut c.ctx, module);

    assert!(c.log().is_empty(), "log: {}", c.ctx.log);
    assert_eq!(c.ctx.annot.resolved_def(p_ty), Some(first));
}
