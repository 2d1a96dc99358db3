//! Declaration nodes.
//!
//! The tree is Module → FileUnit → {TypeDef, FieldDef, FuncDef,
//! TypeAlias}. Nodes reference each other and their parents by arena id
//! only; walks toward the root go through [`Owner`] links instead of
//! back-pointers.

use keel_core::{DeclFlags, Loc};

use crate::ids::{AliasId, ExprId, FieldId, FuncId, ModuleId, ParamId, StmtId, TypeDefId, UnitId};
use crate::ids::TypeRefId;

/// Parent link for a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// Declared at the top level of a file.
    Unit(UnitId),
    /// Declared inside a struct, enum, or trait.
    Type(TypeDefId),
    /// Declared inside a function body (locals, closure params).
    Func(FuncId),
}

// ============================================================================
// Modules and files
// ============================================================================

/// A named dependency of a module.
///
/// The compiled result is memoized by the pipeline driver, not stored
/// here; the declaration tree stays immutable across compiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Depend {
    pub name: String,
    pub version: String,
}

impl Depend {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// One compiled module: a name/version plus its source files.
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub version: String,
    pub units: Vec<UnitId>,
    pub depends: Vec<Depend>,
}

impl Module {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            units: Vec::new(),
            depends: Vec::new(),
        }
    }
}

/// An import at the top of a file.
///
/// `module` names a dependency (or the module itself for pod-local
/// imports); `item` narrows to one declaration; `star` pulls the whole
/// target scope in.
#[derive(Debug, Clone)]
pub struct Import {
    pub loc: Loc,
    pub module: String,
    pub item: Option<String>,
    pub alias: Option<String>,
    pub star: bool,
}

/// A single source file's declarations.
#[derive(Debug, Clone)]
pub struct FileUnit {
    /// Source file name, as reported in diagnostics.
    pub name: String,
    pub module: ModuleId,
    pub imports: Vec<Import>,
    pub type_defs: Vec<TypeDefId>,
    pub fields: Vec<FieldId>,
    pub funcs: Vec<FuncId>,
    pub aliases: Vec<AliasId>,
}

impl FileUnit {
    pub fn new(name: impl Into<String>, module: ModuleId) -> Self {
        Self {
            name: name.into(),
            module,
            imports: Vec::new(),
            type_defs: Vec::new(),
            fields: Vec::new(),
            funcs: Vec::new(),
            aliases: Vec::new(),
        }
    }
}

// ============================================================================
// Type definitions
// ============================================================================

/// A struct definition.
///
/// `inherits` mixes at most one struct base with any number of traits.
/// `generic_params` point at [`TypeDef::GenericParam`] entries in the
/// same arena. A specialization produced from this definition records
/// the definition it came from in `generic_from`.
#[derive(Debug, Clone)]
pub struct StructDef {
    pub name: String,
    pub loc: Loc,
    pub flags: DeclFlags,
    pub owner: Owner,
    pub generic_params: Vec<TypeDefId>,
    pub inherits: Vec<TypeRefId>,
    pub fields: Vec<FieldId>,
    pub funcs: Vec<FuncId>,
    pub generic_from: Option<TypeDefId>,
}

impl StructDef {
    pub fn new(name: impl Into<String>, loc: Loc, flags: DeclFlags, owner: Owner) -> Self {
        Self {
            name: name.into(),
            loc,
            flags,
            owner,
            generic_params: Vec::new(),
            inherits: Vec::new(),
            fields: Vec::new(),
            funcs: Vec::new(),
            generic_from: None,
        }
    }

    /// Whether this definition still has unsubstituted generic params.
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }
}

/// An enum definition: ordered named constants.
///
/// Constant slots are field nodes whose optional init expression is the
/// explicit value.
#[derive(Debug, Clone)]
pub struct EnumDef {
    pub name: String,
    pub loc: Loc,
    pub flags: DeclFlags,
    pub owner: Owner,
    pub fields: Vec<FieldId>,
}

impl EnumDef {
    pub fn new(name: impl Into<String>, loc: Loc, flags: DeclFlags, owner: Owner) -> Self {
        Self {
            name: name.into(),
            loc,
            flags,
            owner,
            fields: Vec::new(),
        }
    }
}

/// A trait definition: method signatures only.
#[derive(Debug, Clone)]
pub struct TraitDef {
    pub name: String,
    pub loc: Loc,
    pub flags: DeclFlags,
    pub owner: Owner,
    pub funcs: Vec<FuncId>,
}

impl TraitDef {
    pub fn new(name: impl Into<String>, loc: Loc, flags: DeclFlags, owner: Owner) -> Self {
        Self {
            name: name.into(),
            loc,
            flags,
            owner,
            funcs: Vec::new(),
        }
    }
}

/// A generic parameter of a struct or function.
///
/// Usable in type position while the owning definition's parameter
/// scope is in effect; member lookup through it goes to the bound.
#[derive(Debug, Clone)]
pub struct GenericParamDef {
    pub name: String,
    pub loc: Loc,
    pub owner: Owner,
    /// Upper bound; lookups through the parameter see this type.
    pub bound: TypeRefId,
    /// Position in the owning definition's parameter list.
    pub index: usize,
}

/// Any definition that can answer a type-position lookup.
#[derive(Debug, Clone)]
pub enum TypeDef {
    Struct(StructDef),
    Enum(EnumDef),
    Trait(TraitDef),
    GenericParam(GenericParamDef),
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            TypeDef::Struct(d) => &d.name,
            TypeDef::Enum(d) => &d.name,
            TypeDef::Trait(d) => &d.name,
            TypeDef::GenericParam(d) => &d.name,
        }
    }

    pub fn loc(&self) -> &Loc {
        match self {
            TypeDef::Struct(d) => &d.loc,
            TypeDef::Enum(d) => &d.loc,
            TypeDef::Trait(d) => &d.loc,
            TypeDef::GenericParam(d) => &d.loc,
        }
    }

    pub fn flags(&self) -> DeclFlags {
        match self {
            TypeDef::Struct(d) => d.flags,
            TypeDef::Enum(d) => d.flags,
            TypeDef::Trait(d) => d.flags,
            TypeDef::GenericParam(_) => DeclFlags::empty(),
        }
    }

    pub fn owner(&self) -> Owner {
        match self {
            TypeDef::Struct(d) => d.owner,
            TypeDef::Enum(d) => d.owner,
            TypeDef::Trait(d) => d.owner,
            TypeDef::GenericParam(d) => d.owner,
        }
    }

    pub fn as_struct(&self) -> Option<&StructDef> {
        match self {
            TypeDef::Struct(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumDef> {
        match self {
            TypeDef::Enum(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_trait(&self) -> Option<&TraitDef> {
        match self {
            TypeDef::Trait(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_generic_param(&self) -> Option<&GenericParamDef> {
        match self {
            TypeDef::GenericParam(d) => Some(d),
            _ => None,
        }
    }
}

// ============================================================================
// Functions, fields, aliases
// ============================================================================

/// A function parameter.
#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: String,
    pub loc: Loc,
    pub ty: TypeRefId,
    pub default: Option<ExprId>,
}

impl ParamDef {
    pub fn new(name: impl Into<String>, ty: TypeRefId, loc: Loc) -> Self {
        Self {
            name: name.into(),
            loc,
            ty,
            default: None,
        }
    }
}

/// A function signature: parameters, return type, postfix flags.
///
/// Postfix flags hold the receiver qualifiers (`mutable`, `const`)
/// written after the parameter list.
#[derive(Debug, Clone)]
pub struct FuncPrototype {
    pub params: Vec<ParamId>,
    pub ret: TypeRefId,
    pub post_flags: DeclFlags,
}

impl FuncPrototype {
    pub fn new(params: Vec<ParamId>, ret: TypeRefId) -> Self {
        Self {
            params,
            ret,
            post_flags: DeclFlags::empty(),
        }
    }
}

/// A function or method definition.
#[derive(Debug, Clone)]
pub struct FuncDef {
    pub name: String,
    pub loc: Loc,
    pub flags: DeclFlags,
    pub owner: Owner,
    pub prototype: FuncPrototype,
    pub generic_params: Vec<TypeDefId>,
    pub body: Option<StmtId>,
    pub generic_from: Option<FuncId>,
}

impl FuncDef {
    pub fn new(
        name: impl Into<String>,
        loc: Loc,
        flags: DeclFlags,
        owner: Owner,
        prototype: FuncPrototype,
    ) -> Self {
        Self {
            name: name.into(),
            loc,
            flags,
            owner,
            prototype,
            generic_params: Vec::new(),
            body: None,
            generic_from: None,
        }
    }

    /// Whether this definition still has unsubstituted generic params.
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }

    /// Whether this is a static method or free function.
    pub fn is_static(&self) -> bool {
        match self.owner {
            Owner::Type(_) => self.flags.contains(DeclFlags::STATIC),
            _ => true,
        }
    }

    /// Whether the receiver may be mutated.
    pub fn is_mutable(&self) -> bool {
        self.flags.contains(DeclFlags::MUTABLE)
            || self.prototype.post_flags.contains(DeclFlags::MUTABLE)
    }
}

/// A field, enum constant, or local variable.
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub name: String,
    pub loc: Loc,
    pub flags: DeclFlags,
    pub owner: Owner,
    /// Declared type; locals may omit it and take the initializer's.
    pub ty: Option<TypeRefId>,
    pub init: Option<ExprId>,
    /// Set for locals declared inside a function body.
    pub is_local: bool,
}

impl FieldDef {
    pub fn new(
        name: impl Into<String>,
        loc: Loc,
        flags: DeclFlags,
        owner: Owner,
        ty: Option<TypeRefId>,
    ) -> Self {
        Self {
            name: name.into(),
            loc,
            flags,
            owner,
            ty,
            init: None,
            is_local: false,
        }
    }

    pub fn local(
        name: impl Into<String>,
        loc: Loc,
        owner: Owner,
        ty: Option<TypeRefId>,
    ) -> Self {
        Self {
            name: name.into(),
            loc,
            flags: DeclFlags::empty(),
            owner,
            ty,
            init: None,
            is_local: true,
        }
    }
}

/// A type alias.
#[derive(Debug, Clone)]
pub struct TypeAlias {
    pub name: String,
    pub loc: Loc,
    pub flags: DeclFlags,
    pub owner: Owner,
    pub target: TypeRefId,
}

impl TypeAlias {
    pub fn new(
        name: impl Into<String>,
        loc: Loc,
        flags: DeclFlags,
        owner: Owner,
        target: TypeRefId,
    ) -> Self {
        Self {
            name: name.into(),
            loc,
            flags,
            owner,
            target,
        }
    }
}
