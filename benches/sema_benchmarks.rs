//! Performance benchmarks for the semantic pipeline.
//!
//! The suite builds declaration trees of increasing size in memory and
//! runs the full pipeline over them:
//! - Module sizes: flat modules of N structs with methods and callers
//! - Generics: repeated instantiation hitting the specialization cache
//! - Ownership: long chains of owning-pointer rebinds
//!
//! ## Profiling with Puffin
//!
//! Run with the `profile-with-puffin` feature to collect per-pass timings:
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use keel::prelude::*;
use keel_ast::{AssignOp, ExprId, ModuleId, Stmt, StmtId, StmtKind, TypeRefId, UnaryOp, UnitId};
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

// =============================================================================
// Program builders
// =============================================================================

fn loc() -> Loc {
    Loc::new("bench.ke", 1, 1, 0)
}

fn program() -> (Compiler, ModuleId, UnitId) {
    let mut c = Compiler::new();
    let module = c.hir.alloc_module(Module::new("bench", "1.0"));
    let unit = c.hir.alloc_unit(FileUnit::new("bench.ke", module));
    (c, module, unit)
}

fn named(c: &mut Compiler, name: &str) -> TypeRefId {
    c.hir.alloc_type_ref(TypeRef::named(name, loc()))
}

fn int_lit(c: &mut Compiler, value: i64) -> ExprId {
    c.hir
        .alloc_expr(Expr::new(ExprKind::Literal(Literal::Int(value)), loc()))
}

fn ident(c: &mut Compiler, name: &str) -> ExprId {
    c.hir.alloc_expr(Expr::new(
        ExprKind::Id {
            ns: None,
            name: name.into(),
        },
        loc(),
    ))
}

fn declare_local(
    c: &mut Compiler,
    unit: UnitId,
    name: &str,
    ty: TypeRefId,
    init: Option<ExprId>,
) -> StmtId {
    let mut def = FieldDef::local(name, loc(), Owner::Unit(unit), Some(ty));
    def.init = init;
    let f = c.hir.alloc_field(def);
    c.hir.alloc_stmt(Stmt::new(StmtKind::LocalVar(f), loc()))
}

fn define_fn(c: &mut Compiler, unit: UnitId, name: &str, stmts: Vec<StmtId>) {
    let ret = named(c, "Void");
    let body = c.hir.alloc_stmt(Stmt::new(StmtKind::Block(stmts), loc()));
    let mut def = FuncDef::new(
        name,
        loc(),
        DeclFlags::empty(),
        Owner::Unit(unit),
        FuncPrototype::new(Vec::new(), ret),
    );
    def.body = Some(body);
    c.hir.define_func(unit, def);
}

/// A flat module of `count` structs, each with two fields and a getter,
/// plus a free function per struct that writes both fields.
fn wide_module(count: usize) -> (Compiler, ModuleId) {
    let (mut c, module, unit) = program();
    for i in 0..count {
        let s = c.hir.define_type(
            unit,
            TypeDef::Struct(StructDef::new(
                format!("S{i}"),
                loc(),
                DeclFlags::empty(),
                Owner::Unit(unit),
            )),
        );
        let x_ty = c.hir.alloc_type_ref(TypeRef::num("Int", 32, false, loc()));
        c.hir.add_field(
            s,
            FieldDef::new("x", loc(), DeclFlags::empty(), Owner::Type(s), Some(x_ty)),
        );
        let y_ty = c.hir.alloc_type_ref(TypeRef::num("Int", 32, false, loc()));
        c.hir.add_field(
            s,
            FieldDef::new("y", loc(), DeclFlags::empty(), Owner::Type(s), Some(y_ty)),
        );

        // fun total(): Int { return x; }
        let x_use = ident(&mut c, "x");
        let ret_stmt = c
            .hir
            .alloc_stmt(Stmt::new(StmtKind::Return(Some(x_use)), loc()));
        let body = c
            .hir
            .alloc_stmt(Stmt::new(StmtKind::Block(vec![ret_stmt]), loc()));
        let ret_ty = c.hir.alloc_type_ref(TypeRef::num("Int", 32, false, loc()));
        let mut total = FuncDef::new(
            "total",
            loc(),
            DeclFlags::empty(),
            Owner::Type(s),
            FuncPrototype::new(Vec::new(), ret_ty),
        );
        total.body = Some(body);
        c.hir.add_method(s, total);

        // fun use{i}(): Void { v: S{i}; v.x = 1; v.y = 2; }
        let v_ty = named(&mut c, &format!("S{i}"));
        let decl = declare_local(&mut c, unit, "v", v_ty, None);
        let mut stmts = vec![decl];
        for (field, value) in [("x", 1), ("y", 2)] {
            let v_use = ident(&mut c, "v");
            let access = c.hir.alloc_expr(Expr::new(
                ExprKind::Access {
                    target: v_use,
                    name: field.into(),
                },
                loc(),
            ));
            let rhs = int_lit(&mut c, value);
            let assign = c.hir.alloc_expr(Expr::new(
                ExprKind::Assign {
                    op: AssignOp::Assign,
                    lhs: access,
                    rhs,
                },
                loc(),
            ));
            let stmt = c.hir.alloc_stmt(Stmt::new(StmtKind::Expr(assign), loc()));
            stmts.push(stmt);
        }
        define_fn(&mut c, unit, &format!("use{i}"), stmts);
    }
    (c, module)
}

/// One generic container instantiated `count` times, alternating between
/// two argument types so the cache sees both hits and misses.
fn generics_module(count: usize) -> (Compiler, ModuleId) {
    let (mut c, module, unit) = program();
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

    let mut stmts = Vec::with_capacity(count);
    for i in 0..count {
        let arg = if i % 2 == 0 { "Int" } else { "Float" };
        let inner = named(&mut c, arg);
        let ty = c
            .hir
            .alloc_type_ref(TypeRef::applied("Box", vec![inner], loc()));
        stmts.push(declare_local(&mut c, unit, &format!("b{i}"), ty, None));
    }
    define_fn(&mut c, unit, "f", stmts);
    (c, module)
}

/// A chain of owning-pointer locals, each moved out of the previous one.
fn ownership_module(count: usize) -> (Compiler, ModuleId) {
    let (mut c, module, unit) = program();
    let first_elem = named(&mut c, "Int");
    let first_ty = c
        .hir
        .alloc_type_ref(TypeRef::pointer(PointerAttr::Own, false, first_elem, loc()));
    let one = int_lit(&mut c, 1);
    let mut stmts = vec![declare_local(&mut c, unit, "a0", first_ty, Some(one))];
    for i in 1..count {
        let elem = named(&mut c, "Int");
        let ty = c
            .hir
            .alloc_type_ref(TypeRef::pointer(PointerAttr::Own, false, elem, loc()));
        let prev = ident(&mut c, &format!("a{}", i - 1));
        let moved = c.hir.alloc_expr(Expr::new(
            ExprKind::Unary {
                op: UnaryOp::Move,
                operand: prev,
            },
            loc(),
        ));
        stmts.push(declare_local(&mut c, unit, &format!("a{i}"), ty, Some(moved)));
    }
    define_fn(&mut c, unit, "f", stmts);
    (c, module)
}

fn compile_clean(c: &mut Compiler, module: ModuleId) -> usize {
    c.compile(module).unwrap();
    assert!(c.log().is_empty(), "benchmark program must be clean");
    c.log().len()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn module_size_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("sema/module_sizes");

    for count in [4usize, 32, 256] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("structs_{count}"), |b| {
            b.iter(|| {
                let (mut compiler, module) = wide_module(black_box(count));
                let out = compile_clean(&mut compiler, module);
                end_profiling_frame();
                black_box(out)
            });
        });
    }

    group.finish();
}

fn specialization_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("sema/generics");

    for count in [16usize, 128] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("instantiations_{count}"), |b| {
            b.iter(|| {
                let (mut compiler, module) = generics_module(black_box(count));
                let out = compile_clean(&mut compiler, module);
                end_profiling_frame();
                black_box(out)
            });
        });
    }

    group.finish();
}

fn ownership_benchmarks(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("sema/ownership");

    for count in [64usize, 512] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("moves_{count}"), |b| {
            b.iter(|| {
                let (mut compiler, module) = ownership_module(black_box(count));
                let out = compile_clean(&mut compiler, module);
                end_profiling_frame();
                black_box(out)
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    module_size_benchmarks,
    specialization_benchmarks,
    ownership_benchmarks
);

criterion_main!(benches);
