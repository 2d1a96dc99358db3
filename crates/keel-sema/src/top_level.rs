//! First pass: top-level signature resolution.
//!
//! Builds each file's import scope, then resolves every declared
//! signature in the module: type definitions, aliases, function
//! prototypes, and the declared types of top-level variables. Bodies
//! and initializers are untouched; they belong to the expression pass.
//!
//! Because signature resolution is on-demand, this pass mostly drives
//! the memoized machinery in declaration order so that every signature
//! is resolved and every signature-level diagnostic is reported even
//! when nothing else refers to the declaration.

use keel_ast::{Builtin, Hir, ModuleId, Scope, Symbol, UnitId};
use keel_core::CompileError;
use rustc_hash::FxHashMap;

use crate::context::SemaContext;
use crate::resolver::TypeResolver;

/// The signature pass over one module.
pub struct TopLevelResolver;

impl TopLevelResolver {
    /// Resolve all top-level signatures of `module`.
    ///
    /// `deps` maps dependency names the module declares to the modules
    /// already compiled for them; imports of any other module were
    /// reported before this pass ran.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(
        hir: &mut Hir,
        builtin: &Builtin,
        ctx: &mut SemaContext,
        module: ModuleId,
        deps: &FxHashMap<String, ModuleId>,
    ) {
        let units = hir.module(module).units.clone();
        for unit in &units {
            let scope = build_import_scope(hir, ctx, *unit, deps);
            ctx.set_import_scope(*unit, scope);
        }

        let mut r = TypeResolver::new(hir, builtin, ctx);
        for unit in &units {
            let u = r.hir.unit(*unit).clone();
            for def in &u.type_defs {
                r.ensure_type_signature(*def);
            }
            for alias in &u.aliases {
                r.resolve_alias(*alias);
            }
            for func in &u.funcs {
                r.ensure_func_signature(*func);
            }
            r.with_unit_frames(*unit, |r| {
                for field in &u.fields {
                    if let Some(ty) = r.hir.field(*field).ty {
                        r.resolve_type_ref(ty);
                    }
                }
            });
        }
    }
}

/// Resolve one file's import list into a scope.
fn build_import_scope(
    hir: &Hir,
    ctx: &mut SemaContext,
    unit: UnitId,
    deps: &FxHashMap<String, ModuleId>,
) -> Scope {
    let mut scope = Scope::new();
    let imports = hir.unit(unit).imports.clone();
    for import in &imports {
        let Some(&dep) = deps.get(&import.module) else {
            // Unknown dependency, reported by the driver.
            continue;
        };
        if import.star {
            if let Some(item) = &import.item {
                ctx.log.push(CompileError::WildcardImport {
                    name: item.clone(),
                    loc: import.loc.clone(),
                });
                continue;
            }
            let dep_scope = ctx.module_scope(hir, dep).clone();
            scope.add_all(&dep_scope);
        } else if let Some(item) = &import.item {
            let candidates = ctx.module_scope(hir, dep).lookup(item).to_vec();
            if candidates.is_empty() {
                ctx.log.push(CompileError::UnknownSymbol {
                    name: item.clone(),
                    loc: import.loc.clone(),
                });
                continue;
            }
            let local = import.alias.as_deref().unwrap_or(item);
            for sym in candidates {
                scope.put(local, sym);
            }
        } else {
            let local = import.alias.as_deref().unwrap_or(&import.module);
            scope.put(local, Symbol::Module(dep));
        }
    }
    scope
}

// ============================================================================
// Tests
// ============================================================================
