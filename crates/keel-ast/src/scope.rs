//! Symbol tables.
//!
//! A scope maps a name to the *list* of declarations answering to it.
//! Keeping the list instead of a single winner defers ambiguity
//! detection to lookup time: merging two wildcard imports that both
//! define `X` is fine until somebody actually says `X`.

use rustc_hash::FxHashMap;

use crate::ids::{AliasId, FieldId, FuncId, ModuleId, ParamId, TypeDefId};

/// Anything a name can resolve to.
///
/// Closed set on purpose: qualified lookup (`ns::name`) dispatches over
/// this union to find the scope owned by `ns`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Type(TypeDefId),
    Func(FuncId),
    Field(FieldId),
    Alias(AliasId),
    Param(ParamId),
    Module(ModuleId),
}

impl Symbol {
    /// Short kind word for diagnostics.
    pub const fn kind_name(self) -> &'static str {
        match self {
            Symbol::Type(_) => "type",
            Symbol::Func(_) => "function",
            Symbol::Field(_) => "field",
            Symbol::Alias(_) => "alias",
            Symbol::Param(_) => "parameter",
            Symbol::Module(_) => "module",
        }
    }

    pub fn as_type(self) -> Option<TypeDefId> {
        match self {
            Symbol::Type(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_func(self) -> Option<FuncId> {
        match self {
            Symbol::Func(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_field(self) -> Option<FieldId> {
        match self {
            Symbol::Field(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_module(self) -> Option<ModuleId> {
        match self {
            Symbol::Module(id) => Some(id),
            _ => None,
        }
    }
}

/// A name → candidate-list symbol table.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    symbols: FxHashMap<String, Vec<Symbol>>,
}

impl Scope {
    /// Create a new empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a symbol under a name. Re-adding the same symbol is a no-op;
    /// a *different* symbol under the same name becomes a second
    /// candidate, surfaced as an ambiguity at lookup time.
    pub fn put(&mut self, name: impl Into<String>, symbol: Symbol) {
        let list = self.symbols.entry(name.into()).or_default();
        if !list.contains(&symbol) {
            list.push(symbol);
        }
    }

    /// All candidates for a name, in insertion order.
    pub fn lookup(&self, name: &str) -> &[Symbol] {
        self.symbols.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The candidate for a name, if it is unique.
    pub fn get_unique(&self, name: &str) -> Option<Symbol> {
        match self.lookup(name) {
            [single] => Some(*single),
            _ => None,
        }
    }

    /// Whether any candidate exists for a name.
    pub fn contains(&self, name: &str) -> bool {
        !self.lookup(name).is_empty()
    }

    /// Merge every entry of another scope into this one.
    pub fn add_all(&mut self, other: &Scope) {
        for (name, list) in &other.symbols {
            for symbol in list {
                self.put(name.clone(), *symbol);
            }
        }
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the scope has no entries.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Iterate over (name, candidates) pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Symbol])> {
        self.symbols.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}
