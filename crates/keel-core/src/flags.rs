//! Declaration modifier flags.

use bitflags::bitflags;

bitflags! {
    /// Modifier flags carried by every declaration node.
    ///
    /// Parsed modifiers land here unchanged; the checker pass decides
    /// which combinations are legal for which declaration kind.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DeclFlags: u32 {
        /// Type or method that cannot be instantiated/called directly.
        const ABSTRACT = 1 << 0;
        /// Method dispatched through a vtable; struct that permits inheritance.
        const VIRTUAL = 1 << 1;
        /// Member that belongs to the type, not to instances.
        const STATIC = 1 << 2;
        /// Value fixed at initialization.
        const CONST = 1 << 3;
        /// Method that may mutate its receiver.
        const MUTABLE = 1 << 4;
        /// Field writable only inside the declaring type.
        const READONLY = 1 << 5;
        /// Use requires an unsafe context; on statics, lifts the const rule.
        const UNSAFE = 1 << 6;
        /// Visible only inside the declaring type or module.
        const PRIVATE = 1 << 7;
        /// Visible inside the declaring type and its descendants.
        const PROTECTED = 1 << 8;
        /// Explicitly public.
        const PUBLIC = 1 << 9;
        /// Values of this type cannot be copied, only moved.
        const NONCOPYABLE = 1 << 10;
        /// Method usable by operator dispatch (plus/minus/compare/...).
        const OPERATOR = 1 << 11;
    }
}

impl DeclFlags {
    /// Whether this declaration is visible outside its declaring type.
    pub fn is_type_visible(self) -> bool {
        !self.intersects(DeclFlags::PRIVATE | DeclFlags::PROTECTED)
    }

    /// Whether this declaration hides itself from other modules.
    pub fn is_module_scoped(self) -> bool {
        self.intersects(DeclFlags::PRIVATE | DeclFlags::PROTECTED)
    }

    /// Whether a struct with these flags may serve as an inheritance base.
    pub fn allows_inheritance(self) -> bool {
        self.intersects(DeclFlags::ABSTRACT | DeclFlags::VIRTUAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        assert_eq!(DeclFlags::default(), DeclFlags::empty());
    }

    #[test]
    fn visibility_predicates() {
        assert!(DeclFlags::empty().is_type_visible());
        assert!(DeclFlags::PUBLIC.is_type_visible());
        assert!(!DeclFlags::PRIVATE.is_type_visible());
        assert!(!DeclFlags::PROTECTED.is_type_visible());
        assert!((DeclFlags::PRIVATE | DeclFlags::STATIC).is_module_scoped());
    }

    #[test]
    fn inheritance_bases() {
        assert!(DeclFlags::ABSTRACT.allows_inheritance());
        assert!(DeclFlags::VIRTUAL.allows_inheritance());
        assert!(!DeclFlags::CONST.allows_inheritance());
    }
}
