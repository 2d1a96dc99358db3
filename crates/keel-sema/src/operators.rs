//! Operator method dispatch.
//!
//! Structs overload operators by declaring methods with reserved names
//! and the `operator` modifier. Binary arithmetic maps one-to-one onto
//! a method; every comparison lowers to the single three-way `compare`
//! method; indexing maps to `get` in read position and `set` in write
//! position.

use keel_ast::{AssignOp, BinaryOp};

/// The reserved operator methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Plus,
    Minus,
    Mult,
    Div,
    /// Three-way comparison; all of `< > <= >= == !=` lower to this.
    Compare,
    /// Index read `a[i]`.
    Get,
    /// Index write `a[i] = v`.
    Set,
}

impl Operator {
    /// The reserved method name.
    pub const fn method_name(self) -> &'static str {
        match self {
            Operator::Plus => "plus",
            Operator::Minus => "minus",
            Operator::Mult => "mult",
            Operator::Div => "div",
            Operator::Compare => "compare",
            Operator::Get => "get",
            Operator::Set => "set",
        }
    }

    /// Reverse mapping from a declared method name.
    pub fn from_method_name(name: &str) -> Option<Operator> {
        Some(match name {
            "plus" => Operator::Plus,
            "minus" => Operator::Minus,
            "mult" => Operator::Mult,
            "div" => Operator::Div,
            "compare" => Operator::Compare,
            "get" => Operator::Get,
            "set" => Operator::Set,
            _ => return None,
        })
    }

    /// The method a binary operator dispatches to when neither built-in
    /// rule applies. Logical and/or never dispatch.
    pub const fn from_binary(op: BinaryOp) -> Option<Operator> {
        Some(match op {
            BinaryOp::Add => Operator::Plus,
            BinaryOp::Sub => Operator::Minus,
            BinaryOp::Mul => Operator::Mult,
            BinaryOp::Div => Operator::Div,
            BinaryOp::Eq
            | BinaryOp::Ne
            | BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::Le
            | BinaryOp::Ge => Operator::Compare,
            BinaryOp::And | BinaryOp::Or => return None,
        })
    }

    /// The method a compound assignment dispatches to.
    pub const fn from_compound(op: AssignOp) -> Option<Operator> {
        Some(match op {
            AssignOp::AddAssign => Operator::Plus,
            AssignOp::SubAssign => Operator::Minus,
            AssignOp::MulAssign => Operator::Mult,
            AssignOp::DivAssign => Operator::Div,
            AssignOp::Assign => return None,
        })
    }

    /// Required parameter count, receiver excluded.
    pub const fn param_count(self) -> usize {
        match self {
            Operator::Set => 2,
            _ => 1,
        }
    }

    /// Whether the method must return a value.
    pub const fn needs_return(self) -> bool {
        !matches!(self, Operator::Set)
    }

    /// Shape complaint for a wrong parameter count.
    pub const fn arity_detail(self) -> &'static str {
        match self {
            Operator::Set => "expects two parameters",
            _ => "expects one parameter",
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_round_trip() {
        for op in [
            Operator::Plus,
            Operator::Minus,
            Operator::Mult,
            Operator::Div,
            Operator::Compare,
            Operator::Get,
            Operator::Set,
        ] {
            assert_eq!(Operator::from_method_name(op.method_name()), Some(op));
        }
        assert_eq!(Operator::from_method_name("add"), None);
    }

    #[test]
    fn every_comparison_lowers_to_compare() {
        for op in [
            BinaryOp::Eq,
            BinaryOp::Ne,
            BinaryOp::Lt,
            BinaryOp::Gt,
            BinaryOp::Le,
            BinaryOp::Ge,
        ] {
            assert_eq!(Operator::from_binary(op), Some(Operator::Compare));
        }
    }

    #[test]
    fn logical_ops_never_dispatch() {
        assert_eq!(Operator::from_binary(BinaryOp::And), None);
        assert_eq!(Operator::from_binary(BinaryOp::Or), None);
    }

    #[test]
    fn compound_assign_mapping() {
        assert_eq!(
            Operator::from_compound(AssignOp::AddAssign),
            Some(Operator::Plus)
        );
        assert_eq!(Operator::from_compound(AssignOp::Assign), None);
    }

    #[test]
    fn set_takes_two_params_and_no_return() {
        assert_eq!(Operator::Set.param_count(), 2);
        assert!(!Operator::Set.needs_return());
        assert_eq!(Operator::Get.param_count(), 1);
        assert!(Operator::Get.needs_return());
    }
}
