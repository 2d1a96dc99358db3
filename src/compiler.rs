//! Pipeline driver.
//!
//! Owns the declaration tree and the semantic context, and runs the
//! three passes over a module in order, stopping at the first stage
//! that produced diagnostics. Dependencies compile recursively before
//! the module that needs them: the first import of a dependency
//! triggers its full pipeline, and the result is cached so every
//! module compiles exactly once per [`Compiler`]. A dependency chain
//! that loops back onto a module still being compiled is reported as
//! a cycle instead of recursing forever.
//!
//! Parsing stays outside this crate. The embedder parses sources into
//! [`Hir`] directly and hands dependency loading to a [`ModuleLoader`],
//! which is free to parse lazily when a module is first requested.

use keel_ast::{Builtin, Hir, ModuleId};
use keel_core::{CompileError, CompilerLog, LoadError, Loc};
use keel_sema::{ErrorChecker, ExprResolver, SemaContext, TopLevelResolver};
use rustc_hash::{FxHashMap, FxHashSet};

// ============================================================================
// ModuleLoader
// ============================================================================

/// Fetches a dependency module on first use.
///
/// Returns `Ok(None)` when no module by that name exists on the search
/// path; `Err` is reserved for faults where the loader found the module
/// but could not produce it.
pub trait ModuleLoader {
    fn load(
        &mut self,
        hir: &mut Hir,
        name: &str,
        version: &str,
    ) -> Result<Option<ModuleId>, LoadError>;
}

impl<F> ModuleLoader for F
where
    F: FnMut(&mut Hir, &str, &str) -> Result<Option<ModuleId>, LoadError>,
{
    fn load(
        &mut self,
        hir: &mut Hir,
        name: &str,
        version: &str,
    ) -> Result<Option<ModuleId>, LoadError> {
        self(hir, name, version)
    }
}

/// Loader for programs with no external dependencies.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLoader;

impl ModuleLoader for NoLoader {
    fn load(
        &mut self,
        _hir: &mut Hir,
        _name: &str,
        _version: &str,
    ) -> Result<Option<ModuleId>, LoadError> {
        Ok(None)
    }
}

// ============================================================================
// Compiler
// ============================================================================

/// The semantic pipeline over one declaration tree.
pub struct Compiler<L = NoLoader> {
    pub hir: Hir,
    pub builtin: Builtin,
    pub ctx: SemaContext,
    loader: L,
    /// Modules that already ran the pipeline, by name.
    compiled: FxHashMap<String, ModuleId>,
    /// Modules whose pipeline is on the stack right now.
    in_progress: FxHashSet<String>,
}

impl Compiler<NoLoader> {
    /// A compiler for self-contained programs.
    pub fn new() -> Self {
        Self::with_loader(NoLoader)
    }
}

impl Default for Compiler<NoLoader> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: ModuleLoader> Compiler<L> {
    pub fn with_loader(loader: L) -> Self {
        let mut hir = Hir::new();
        let builtin = Builtin::install(&mut hir);
        Compiler {
            hir,
            builtin,
            ctx: SemaContext::new(),
            loader,
            compiled: FxHashMap::default(),
            in_progress: FxHashSet::default(),
        }
    }

    /// The accumulated diagnostics.
    pub fn log(&self) -> &CompilerLog {
        &self.ctx.log
    }

    /// Run the pipeline over `module` and everything it depends on.
    ///
    /// Diagnostics land in the log; `Err` only surfaces loader faults.
    /// A module compiles once, no matter how many times it is asked
    /// for.
    pub fn compile(&mut self, module: ModuleId) -> Result<(), LoadError> {
        let name = self.hir.module(module).name.clone();
        if self.compiled.contains_key(&name) {
            return Ok(());
        }
        self.in_progress.insert(name.clone());
        let result = self.compile_module(module);
        self.in_progress.remove(&name);
        self.compiled.insert(name, module);
        result
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    fn compile_module(&mut self, module: ModuleId) -> Result<(), LoadError> {
        let baseline = self.ctx.log.len();

        let deps = self.load_dependencies(module)?;
        self.scan_imports(module);
        if self.ctx.log.len() > baseline {
            return Ok(());
        }

        TopLevelResolver::run(&mut self.hir, &self.builtin, &mut self.ctx, module, &deps);
        if self.ctx.log.len() > baseline {
            return Ok(());
        }

        ExprResolver::run(&mut self.hir, &self.builtin, &mut self.ctx, module);
        if self.ctx.log.len() > baseline {
            return Ok(());
        }

        ErrorChecker::run(&self.hir, &self.builtin, &mut self.ctx, module);
        Ok(())
    }

    /// Compile every declared dependency, returning name -> module for
    /// the ones that exist. The module's own name maps to itself so
    /// that file-local imports resolve through the same path.
    fn load_dependencies(
        &mut self,
        module: ModuleId,
    ) -> Result<FxHashMap<String, ModuleId>, LoadError> {
        let mut map = FxHashMap::default();
        map.insert(self.hir.module(module).name.clone(), module);

        let depends = self.hir.module(module).depends.clone();
        for dep in depends {
            if let Some(&id) = self.compiled.get(&dep.name) {
                map.insert(dep.name.clone(), id);
                continue;
            }
            if self.in_progress.contains(&dep.name) {
                let loc = self.first_import_loc(module, &dep.name);
                self.ctx.log.push(CompileError::CircularDependency {
                    name: dep.name.clone(),
                    loc,
                });
                continue;
            }
            match self.loader.load(&mut self.hir, &dep.name, &dep.version)? {
                Some(id) => {
                    self.compile(id)?;
                    map.insert(dep.name.clone(), id);
                }
                None => {
                    let loc = self.first_import_loc(module, &dep.name);
                    self.ctx.log.push(CompileError::UnknownModule {
                        name: dep.name.clone(),
                        loc,
                    });
                }
            }
        }
        Ok(map)
    }

    /// Report imports whose module is neither a declared dependency nor
    /// the module itself.
    fn scan_imports(&mut self, module: ModuleId) {
        let m = self.hir.module(module);
        let mut declared: FxHashSet<&str> = m.depends.iter().map(|d| d.name.as_str()).collect();
        declared.insert(&m.name);

        let mut unknown = Vec::new();
        for unit in &m.units {
            for import in &self.hir.unit(*unit).imports {
                if !declared.contains(import.module.as_str()) {
                    unknown.push((import.module.clone(), import.loc.clone()));
                }
            }
        }
        for (name, loc) in unknown {
            self.ctx.log.push(CompileError::UnknownModule { name, loc });
        }
    }

    /// Location of the first import naming `dep`, for diagnostics about
    /// the dependency itself.
    fn first_import_loc(&self, module: ModuleId, dep: &str) -> Loc {
        for unit in &self.hir.module(module).units {
            for import in &self.hir.unit(*unit).imports {
                if import.module == dep {
                    return import.loc.clone();
                }
            }
        }
        Loc::synthetic()
    }
}

// ============================================================================
// Tests
// ============================================================================
