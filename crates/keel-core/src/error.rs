//! Diagnostic types for the semantic pipeline.
//!
//! Every language-level problem is a [`CompileError`] appended to a
//! [`CompilerLog`]; passes never unwind on them. Resolution degrades
//! locally instead: the failing node stays unannotated and dependents
//! guard on that. [`LoadError`] is the one embedder-level fault (a
//! module loader that cannot do its job) and travels by `Result`.

use thiserror::Error;

use crate::Loc;

// ============================================================================
// Compile Errors
// ============================================================================

/// A semantic diagnostic: a message tied to a source location.
///
/// There are no machine-readable codes and no warning tier; any logged
/// entry blocks code generation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    // === Name resolution ===
    /// No declaration with this name is in scope.
    #[error("Unknown symbol '{name}' at {loc}")]
    UnknownSymbol { name: String, loc: Loc },

    /// More than one declaration answers to this name.
    #[error("Ambiguous symbol '{name}' at {loc}: candidates at {first} and {second}")]
    AmbiguousSymbol {
        name: String,
        first: Loc,
        second: Loc,
        loc: Loc,
    },

    /// `::` applied to something that owns no scope.
    #[error("Cannot use '::' on '{name}' at {loc}")]
    NotAScope { name: String, loc: Loc },

    /// A non-type declaration used in type position.
    #[error("Not a type: '{name}' at {loc}")]
    NotAType { name: String, loc: Loc },

    /// Generic arguments applied to a non-generic declaration.
    #[error("'{name}' is not generic at {loc}")]
    NotGeneric { name: String, loc: Loc },

    /// Wrong number of generic arguments.
    #[error("Generic args mismatch for '{name}' at {loc}: expected {expected}, found {found}")]
    GenericArgsMismatch {
        name: String,
        expected: usize,
        found: usize,
        loc: Loc,
    },

    /// A generic type used without arguments outside its own definition.
    #[error("Missing generic args for '{name}' at {loc}")]
    MissingGenericArgs { name: String, loc: Loc },

    /// An import names a module the loader cannot find.
    #[error("Unknown module '{name}' at {loc}")]
    UnknownModule { name: String, loc: Loc },

    /// A module dependency chain loops back on itself.
    #[error("Circular module dependency on '{name}' at {loc}")]
    CircularDependency { name: String, loc: Loc },

    /// `::*` applied to something other than a module.
    #[error("Wildcard import needs a module, got '{name}' at {loc}")]
    WildcardImport { name: String, loc: Loc },

    /// Catch-all for an expression left unresolved with no earlier report.
    #[error("Resolution failed at {loc}")]
    ResolveFailed { loc: Loc },

    // === Type system ===
    /// A value does not fit the type the context demands.
    #[error("Type mismatch at {loc}: expected {expected}, found {found}")]
    TypeMismatch {
        expected: String,
        found: String,
        loc: Loc,
    },

    /// No implicit conversion path between two pointer shapes.
    #[error("Unknown conversion from {from} to {to} at {loc}")]
    UnknownConvert { from: String, to: String, loc: Loc },

    /// `is`/`as` on non-pointer operands.
    #[error("Cast requires pointer operands at {loc}")]
    CastRequiresPointer { loc: Loc },

    /// No built-in rule and no operator method for this operand type.
    #[error("No '{op}' operator on type {type_name} at {loc}")]
    InvalidOperation {
        op: String,
        type_name: String,
        loc: Loc,
    },

    /// A method found by operator dispatch that is not flagged `operator`.
    #[error("Method '{name}' is not an operator at {loc}")]
    NotAnOperator { name: String, loc: Loc },

    /// An operator method whose signature breaks the required shape.
    #[error("Invalid operator '{name}' at {loc}: {detail}")]
    InvalidOperator {
        name: String,
        detail: &'static str,
        loc: Loc,
    },

    /// Call target is not function-typed.
    #[error("Cannot call non-function type {found} at {loc}")]
    NotCallable { found: String, loc: Loc },

    /// Call-site argument count does not match the prototype.
    #[error("Argument count mismatch at {loc}: expected {expected}, found {found}")]
    ArgCountMismatch {
        expected: usize,
        found: usize,
        loc: Loc,
    },

    /// Named call-site argument does not match the parameter name.
    #[error("Argument name mismatch at {loc}: expected '{expected}', found '{found}'")]
    ArgNameMismatch {
        expected: String,
        found: String,
        loc: Loc,
    },

    /// Returned value does not fit the active prototype.
    #[error("Return type does not fit function at {loc}")]
    ReturnTypeMismatch { loc: Loc },

    /// Ternary branches with different types.
    #[error("Branch types must match at {loc}")]
    BranchTypeMismatch { loc: Loc },

    /// Condition of if/while/for/ternary is not Bool.
    #[error("Must be Bool at {loc}")]
    MustBeBool { loc: Loc },

    /// Switch condition or case label is not Int.
    #[error("Must be Int at {loc}")]
    MustBeInt { loc: Loc },

    // === Ownership and policy ===
    /// A non-copyable value read out of a slot without `move`.
    #[error("Miss move keyword at {loc}")]
    MissMoveKeyword { loc: Loc },

    /// `move` applied to an expression that is not a slot.
    #[error("Cannot move this expression at {loc}")]
    CannotMove { loc: Loc },

    /// `move` applied to a slot that is not a local variable.
    #[error("Only local variables can be moved at {loc}")]
    InvalidMove { loc: Loc },

    /// Raw-pointer use or unsafe-flagged declaration outside unsafe context.
    #[error("Expected unsafe context at {loc}")]
    MissingUnsafe { loc: Loc },

    /// Static variable whose type is not const.
    #[error("Static variable '{name}' must be const at {loc}")]
    NonConstStatic { name: String, loc: Loc },

    /// Non-nullable pointer local declared without an initializer.
    #[error("Non-nullable pointer '{name}' must be initialized at {loc}")]
    UninitPointer { name: String, loc: Loc },

    /// Private member touched from outside its declaring type.
    #[error("'{name}' is private at {loc}")]
    PrivateAccess { name: String, loc: Loc },

    /// Protected member touched from outside the inheritance chain.
    #[error("'{name}' is protected at {loc}")]
    ProtectedAccess { name: String, loc: Loc },

    /// Module-scoped declaration touched from another module.
    #[error("'{name}' is private or protected to its module at {loc}")]
    ModuleScopedAccess { name: String, loc: Loc },

    /// Readonly field written from outside its declaring type.
    #[error("'{name}' is readonly at {loc}")]
    ReadonlyWrite { name: String, loc: Loc },

    /// Write through an immutable-typed expression.
    #[error("Cannot mutate immutable value at {loc}")]
    ImmutableWrite { loc: Loc },

    /// Mutable method invoked on an immutable receiver.
    #[error("Cannot call mutable method '{name}' on immutable value at {loc}")]
    MutableCall { name: String, loc: Loc },

    /// Assignment target is not a field/local/param/index slot.
    #[error("Not assignable at {loc}")]
    NotAssignable { loc: Loc },

    /// `x = x`.
    #[error("Self assignment at {loc}")]
    SelfAssign { loc: Loc },

    // === Declaration structure ===
    /// Modifier combination illegal for this declaration kind.
    #[error("Invalid flags at {loc}: {detail}")]
    InvalidFlags { detail: String, loc: Loc },

    /// Non-abstract function without a body outside a trait.
    #[error("Function '{name}' has no body at {loc}")]
    MissingBody { name: String, loc: Loc },

    /// Defaulted parameter followed by an undefaulted one.
    #[error("Default parameters must be trailing at {loc}")]
    DefaultParamPosition { loc: Loc },

    /// Vararg parameter not in last position.
    #[error("Vararg parameter must be last at {loc}")]
    VarargPosition { loc: Loc },

    /// Struct base that is neither abstract nor virtual.
    #[error("Base struct '{name}' must be abstract or virtual at {loc}")]
    BaseNotVirtual { name: String, loc: Loc },

    /// More than one struct in an inheritance list.
    #[error("Multiple struct inheritance at {loc}")]
    MultipleBaseStructs { loc: Loc },

    /// Inheritance target that is not a struct or trait.
    #[error("Cannot inherit from '{name}' at {loc}")]
    InvalidInherit { name: String, loc: Loc },

    /// Init block for an abstract struct.
    #[error("Cannot construct abstract struct '{name}' at {loc}")]
    AbstractInit { name: String, loc: Loc },

    /// Init block missing a required field.
    #[error("Field not initialized: '{name}' at {loc}")]
    FieldNotInit { name: String, loc: Loc },

    /// Init block naming a field the struct does not have.
    #[error("Unknown field '{name}' at {loc}")]
    UnknownField { name: String, loc: Loc },

    /// Init block naming the same field twice.
    #[error("Field initialized twice: '{name}' at {loc}")]
    DuplicateInitField { name: String, loc: Loc },

    /// Named argument inside an array init block.
    #[error("Array init cannot use named arguments at {loc}")]
    NamedArrayInit { loc: Loc },

    /// `this` outside any struct method.
    #[error("Use of 'this' outside a struct at {loc}")]
    ThisOutsideStruct { loc: Loc },

    /// `this` inside a static function.
    #[error("No 'this' in a static function at {loc}")]
    ThisInStatic { loc: Loc },

    /// `break` outside a loop body.
    #[error("Break outside loop at {loc}")]
    BreakOutsideLoop { loc: Loc },

    /// `continue` outside a loop body.
    #[error("Continue outside loop at {loc}")]
    ContinueOutsideLoop { loc: Loc },
}

impl CompileError {
    /// Get the source location this diagnostic points at.
    pub fn loc(&self) -> &Loc {
        match self {
            CompileError::UnknownSymbol { loc, .. } => loc,
            CompileError::AmbiguousSymbol { loc, .. } => loc,
            CompileError::NotAScope { loc, .. } => loc,
            CompileError::NotAType { loc, .. } => loc,
            CompileError::NotGeneric { loc, .. } => loc,
            CompileError::GenericArgsMismatch { loc, .. } => loc,
            CompileError::MissingGenericArgs { loc, .. } => loc,
            CompileError::UnknownModule { loc, .. } => loc,
            CompileError::CircularDependency { loc, .. } => loc,
            CompileError::WildcardImport { loc, .. } => loc,
            CompileError::ResolveFailed { loc } => loc,
            CompileError::TypeMismatch { loc, .. } => loc,
            CompileError::UnknownConvert { loc, .. } => loc,
            CompileError::CastRequiresPointer { loc } => loc,
            CompileError::InvalidOperation { loc, .. } => loc,
            CompileError::NotAnOperator { loc, .. } => loc,
            CompileError::InvalidOperator { loc, .. } => loc,
            CompileError::NotCallable { loc, .. } => loc,
            CompileError::ArgCountMismatch { loc, .. } => loc,
            CompileError::ArgNameMismatch { loc, .. } => loc,
            CompileError::ReturnTypeMismatch { loc } => loc,
            CompileError::BranchTypeMismatch { loc } => loc,
            CompileError::MustBeBool { loc } => loc,
            CompileError::MustBeInt { loc } => loc,
            CompileError::MissMoveKeyword { loc } => loc,
            CompileError::CannotMove { loc } => loc,
            CompileError::InvalidMove { loc } => loc,
            CompileError::MissingUnsafe { loc } => loc,
            CompileError::NonConstStatic { loc, .. } => loc,
            CompileError::UninitPointer { loc, .. } => loc,
            CompileError::PrivateAccess { loc, .. } => loc,
            CompileError::ProtectedAccess { loc, .. } => loc,
            CompileError::ModuleScopedAccess { loc, .. } => loc,
            CompileError::ReadonlyWrite { loc, .. } => loc,
            CompileError::ImmutableWrite { loc } => loc,
            CompileError::MutableCall { loc, .. } => loc,
            CompileError::NotAssignable { loc } => loc,
            CompileError::SelfAssign { loc } => loc,
            CompileError::InvalidFlags { loc, .. } => loc,
            CompileError::MissingBody { loc, .. } => loc,
            CompileError::DefaultParamPosition { loc } => loc,
            CompileError::VarargPosition { loc } => loc,
            CompileError::BaseNotVirtual { loc, .. } => loc,
            CompileError::MultipleBaseStructs { loc } => loc,
            CompileError::InvalidInherit { loc, .. } => loc,
            CompileError::AbstractInit { loc, .. } => loc,
            CompileError::FieldNotInit { loc, .. } => loc,
            CompileError::UnknownField { loc, .. } => loc,
            CompileError::DuplicateInitField { loc, .. } => loc,
            CompileError::NamedArrayInit { loc } => loc,
            CompileError::ThisOutsideStruct { loc } => loc,
            CompileError::ThisInStatic { loc } => loc,
            CompileError::BreakOutsideLoop { loc } => loc,
            CompileError::ContinueOutsideLoop { loc } => loc,
        }
    }
}

// ============================================================================
// Compiler Log
// ============================================================================

/// Append-only collection of diagnostics for one compilation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilerLog {
    errors: Vec<CompileError>,
}

impl CompilerLog {
    /// Create a new empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic.
    pub fn push(&mut self, error: CompileError) {
        self.errors.push(error);
    }

    /// Check if any diagnostic has been logged.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of diagnostics.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over the diagnostics in log order.
    pub fn iter(&self) -> impl Iterator<Item = &CompileError> {
        self.errors.iter()
    }

    /// Move another log's diagnostics onto the end of this one.
    pub fn append(&mut self, other: &mut CompilerLog) {
        self.errors.append(&mut other.errors);
    }

    /// Check whether any diagnostic's message contains the given text.
    pub fn has_message(&self, needle: &str) -> bool {
        self.errors.iter().any(|e| e.to_string().contains(needle))
    }

    /// Convert to a Vec of diagnostics.
    pub fn into_vec(self) -> Vec<CompileError> {
        self.errors
    }

    /// Convert to a Result, returning Ok(()) if empty or Err with the first entry.
    pub fn into_result(self) -> Result<(), CompileError> {
        if let Some(first) = self.errors.into_iter().next() {
            Err(first)
        } else {
            Ok(())
        }
    }
}

impl IntoIterator for CompilerLog {
    type Item = CompileError;
    type IntoIter = std::vec::IntoIter<CompileError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a CompilerLog {
    type Item = &'a CompileError;
    type IntoIter = std::slice::Iter<'a, CompileError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl From<CompileError> for CompilerLog {
    fn from(error: CompileError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl std::fmt::Display for CompilerLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompilerLog {}

// ============================================================================
// Loader Faults
// ============================================================================

/// An embedder-level failure while fetching a dependency module.
///
/// Distinct from [`CompileError::UnknownModule`]: the loader looked but
/// could not answer at all (I/O, corrupt archive, ...). The pipeline
/// surfaces this through `Result` instead of the diagnostic log.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Failed to load module '{name}': {detail}")]
pub struct LoadError {
    pub name: String,
    pub detail: String,
}

impl LoadError {
    /// Create a new loader fault.
    pub fn new(name: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc() -> Loc {
        Loc::new("main.ke", 2, 7, 30)
    }

    #[test]
    fn error_message_includes_location() {
        let err = CompileError::UnknownSymbol {
            name: "foo".into(),
            loc: loc(),
        };
        assert_eq!(format!("{err}"), "Unknown symbol 'foo' at main.ke:2:7");
        assert_eq!(err.loc(), &loc());
    }

    #[test]
    fn pinned_messages() {
        let miss = CompileError::MissMoveKeyword { loc: loc() };
        assert!(format!("{miss}").contains("Miss move keyword"));

        let cond = CompileError::MustBeBool { loc: loc() };
        assert!(format!("{cond}").contains("Must be Bool"));

        let vis = CompileError::PrivateAccess {
            name: "x".into(),
            loc: loc(),
        };
        assert!(format!("{vis}").contains("private"));
    }

    #[test]
    fn log_accumulates_in_order() {
        let mut log = CompilerLog::new();
        assert!(log.is_empty());

        log.push(CompileError::MustBeBool { loc: loc() });
        log.push(CompileError::SelfAssign { loc: loc() });

        assert_eq!(log.len(), 2);
        let kinds: Vec<_> = log.iter().map(|e| e.to_string()).collect();
        assert!(kinds[0].contains("Must be Bool"));
        assert!(kinds[1].contains("Self assignment"));
    }

    #[test]
    fn log_display_one_line_per_error() {
        let mut log = CompilerLog::new();
        log.push(CompileError::MustBeBool { loc: loc() });
        log.push(CompileError::MustBeInt { loc: loc() });
        let text = log.to_string();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn log_message_query() {
        let mut log = CompilerLog::new();
        log.push(CompileError::MustBeBool { loc: loc() });
        assert!(log.has_message("Must be Bool"));
        assert!(!log.has_message("private"));
    }

    #[test]
    fn log_into_result() {
        let ok = CompilerLog::new();
        assert!(ok.into_result().is_ok());

        let bad: CompilerLog = CompileError::SelfAssign { loc: loc() }.into();
        assert!(bad.into_result().is_err());
    }
}
