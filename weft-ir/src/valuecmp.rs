//! Symbolic-or-concrete value comparison for bound and guard simplification.
//!
//! Every query here is proof-oriented: `false` means "not proved", never
//! "disproved". Callers must not negate results.

use crate::ir::{match_constant_int, Value};
use num::BigInt;
use std::cmp::Ordering;

/// Either a resolved integer constant or an unresolved symbolic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueOrInt<'a> {
    Resolved(i64),
    Symbolic(Value<'a>),
}

impl<'a> ValueOrInt<'a> {
    /// Constant-folds a host value; falls back to holding the handle.
    pub fn from_value(value: Value<'a>) -> Self {
        match match_constant_int(value) {
            Some(constant) => ValueOrInt::Resolved(constant),
            None => ValueOrInt::Symbolic(value),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ValueOrInt::Resolved(_))
    }
}

impl<'a> From<i64> for ValueOrInt<'a> {
    fn from(value: i64) -> Self {
        ValueOrInt::Resolved(value)
    }
}

impl<'a> PartialEq<i64> for ValueOrInt<'a> {
    fn eq(&self, other: &i64) -> bool {
        match self {
            ValueOrInt::Resolved(value) => value == other,
            ValueOrInt::Symbolic(_) => false,
        }
    }
}

impl<'a> PartialOrd<i64> for ValueOrInt<'a> {
    /// `None` for symbolic values, so every relational operator against an
    /// integer answers `false` rather than guessing.
    fn partial_cmp(&self, other: &i64) -> Option<Ordering> {
        match self {
            ValueOrInt::Resolved(value) => value.partial_cmp(other),
            ValueOrInt::Symbolic(_) => None,
        }
    }
}

impl<'a> PartialEq<BigInt> for ValueOrInt<'a> {
    fn eq(&self, other: &BigInt) -> bool {
        match self {
            ValueOrInt::Resolved(value) => BigInt::from(*value) == *other,
            ValueOrInt::Symbolic(_) => false,
        }
    }
}

impl<'a> PartialOrd<BigInt> for ValueOrInt<'a> {
    fn partial_cmp(&self, other: &BigInt) -> Option<Ordering> {
        match self {
            ValueOrInt::Resolved(value) => BigInt::from(*value).partial_cmp(other),
            ValueOrInt::Symbolic(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cmp {
    Eq,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Cmp {
    fn apply(self, lhs: i64, rhs: i64) -> bool {
        match self {
            Cmp::Eq => lhs == rhs,
            Cmp::Lt => lhs < rhs,
            Cmp::Le => lhs <= rhs,
            Cmp::Gt => lhs > rhs,
            Cmp::Ge => lhs >= rhs,
        }
    }
}

/// Whether `cmp` provably holds between `lhs` and `val`.
pub fn value_cmp<'a>(cmp: Cmp, lhs: Value<'a>, val: &ValueOrInt<'a>) -> bool {
    match ValueOrInt::from_value(lhs) {
        ValueOrInt::Resolved(lhs) => match val {
            ValueOrInt::Resolved(rhs) => cmp.apply(lhs, *rhs),
            ValueOrInt::Symbolic(_) => false,
        },
        ValueOrInt::Symbolic(lhs) => match val {
            // A value relates to itself under the non-strict relations.
            ValueOrInt::Symbolic(rhs) if lhs == *rhs => {
                matches!(cmp, Cmp::Eq | Cmp::Le | Cmp::Ge)
            }
            _ => false,
        },
    }
}

/// A bounded affine expression over dimension and symbol positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AffineExpr {
    Constant(i64),
    /// The `usize`-th dimension operand.
    Dim(usize),
    /// The `usize`-th symbol operand, substituted after the dimensions.
    Symbol(usize),
    Add(Box<AffineExpr>, Box<AffineExpr>),
    Mul(Box<AffineExpr>, Box<AffineExpr>),
}

impl AffineExpr {
    pub fn add(lhs: AffineExpr, rhs: AffineExpr) -> Self {
        AffineExpr::Add(Box::new(lhs), Box::new(rhs))
    }

    pub fn mul(lhs: AffineExpr, rhs: AffineExpr) -> Self {
        AffineExpr::Mul(Box::new(lhs), Box::new(rhs))
    }

    /// Folds the expression to an integer by substituting `operands`.
    /// `None` on any unresolved operand, out-of-range position, or overflow.
    fn fold(&self, num_dims: usize, operands: &[Value<'_>]) -> Option<i64> {
        match self {
            AffineExpr::Constant(constant) => Some(*constant),
            AffineExpr::Dim(position) => {
                if *position >= num_dims {
                    return None;
                }
                match_constant_int(*operands.get(*position)?)
            }
            AffineExpr::Symbol(position) => {
                match_constant_int(*operands.get(num_dims.checked_add(*position)?)?)
            }
            AffineExpr::Add(lhs, rhs) => lhs
                .fold(num_dims, operands)?
                .checked_add(rhs.fold(num_dims, operands)?),
            AffineExpr::Mul(lhs, rhs) => lhs
                .fold(num_dims, operands)?
                .checked_mul(rhs.fold(num_dims, operands)?),
        }
    }
}

/// Whether `cmp` provably holds between an affine expression, folded under a
/// symbol substitution, and `val`.
pub fn value_cmp_affine<'a>(
    cmp: Cmp,
    expr: &AffineExpr,
    num_dims: usize,
    operands: &[Value<'a>],
    val: &ValueOrInt<'a>,
) -> bool {
    let Some(lhs) = expr.fold(num_dims, operands) else {
        return false;
    };
    match val {
        ValueOrInt::Resolved(rhs) => cmp.apply(lhs, *rhs),
        ValueOrInt::Symbolic(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IrBuilder;
    use bumpalo::Bump;
    use proptest::prelude::*;
    use weft_core::Literal;

    #[test]
    fn test_constant_folding() {
        let bump = Bump::new();
        let builder = IrBuilder::new(&bump);

        let c = builder.constant(Literal::Index(12));
        assert_eq!(ValueOrInt::from_value(c.result(0)), ValueOrInt::Resolved(12));

        let alloc = builder.alloc();
        let v = ValueOrInt::from_value(alloc.result(0));
        assert!(!v.is_resolved());
    }

    #[test]
    fn test_resolved_comparisons() {
        let v = ValueOrInt::from(5);
        assert!(v == 5);
        assert!(!(v == 6));
        assert!(v < 6);
        assert!(v <= 5);
        assert!(v > 4);
        assert!(v >= 5);
        assert!(!(v < 5));
    }

    #[test]
    fn test_symbolic_is_conservative_false() {
        let bump = Bump::new();
        let builder = IrBuilder::new(&bump);

        let alloc = builder.alloc();
        let v = ValueOrInt::from_value(alloc.result(0));
        for k in [i64::MIN, -1, 0, 1, i64::MAX] {
            assert!(!(v == k));
            assert!(!(v < k));
            assert!(!(v <= k));
            assert!(!(v > k));
            assert!(!(v >= k));
        }
    }

    #[test]
    fn test_bigint_comparisons() {
        let v = ValueOrInt::from(-3);
        assert!(v == BigInt::from(-3));
        assert!(v < BigInt::from(0));
        assert!(v >= BigInt::from(-3));

        // Beyond i64 range on the right-hand side.
        let huge = BigInt::from(i64::MAX) * 2;
        assert!(v < huge);
        assert!(!(v > huge));
    }

    #[test]
    fn test_value_cmp_reflexive_symbolic() {
        let bump = Bump::new();
        let builder = IrBuilder::new(&bump);

        let a = builder.alloc();
        let b = builder.alloc();
        let sym_a = ValueOrInt::Symbolic(a.result(0));
        let sym_b = ValueOrInt::Symbolic(b.result(0));

        assert!(value_cmp(Cmp::Eq, a.result(0), &sym_a));
        assert!(value_cmp(Cmp::Le, a.result(0), &sym_a));
        assert!(value_cmp(Cmp::Ge, a.result(0), &sym_a));
        assert!(!value_cmp(Cmp::Lt, a.result(0), &sym_a));
        assert!(!value_cmp(Cmp::Gt, a.result(0), &sym_a));
        assert!(!value_cmp(Cmp::Eq, a.result(0), &sym_b));
        assert!(!value_cmp(Cmp::Eq, a.result(0), &ValueOrInt::from(0)));
    }

    #[test]
    fn test_value_cmp_resolved() {
        let bump = Bump::new();
        let builder = IrBuilder::new(&bump);

        let c = builder.constant(Literal::Index(7));
        assert!(value_cmp(Cmp::Eq, c.result(0), &ValueOrInt::from(7)));
        assert!(value_cmp(Cmp::Lt, c.result(0), &ValueOrInt::from(8)));
        assert!(!value_cmp(Cmp::Gt, c.result(0), &ValueOrInt::from(8)));
    }

    #[test]
    fn test_affine_fold() {
        let bump = Bump::new();
        let builder = IrBuilder::new(&bump);

        let c2 = builder.constant(Literal::Index(2));
        let c3 = builder.constant(Literal::Index(3));
        let operands = [c2.result(0), c3.result(0)];

        // 4 * d0 + s0 = 4 * 2 + 3 = 11
        let expr = AffineExpr::add(
            AffineExpr::mul(AffineExpr::Constant(4), AffineExpr::Dim(0)),
            AffineExpr::Symbol(0),
        );
        assert!(value_cmp_affine(Cmp::Eq, &expr, 1, &operands, &ValueOrInt::from(11)));
        assert!(value_cmp_affine(Cmp::Le, &expr, 1, &operands, &ValueOrInt::from(11)));
        assert!(!value_cmp_affine(Cmp::Lt, &expr, 1, &operands, &ValueOrInt::from(11)));
    }

    #[test]
    fn test_affine_unresolved_operand() {
        let bump = Bump::new();
        let builder = IrBuilder::new(&bump);

        let sym = builder.alloc();
        let operands = [sym.result(0)];
        let expr = AffineExpr::Dim(0);
        for cmp in [Cmp::Eq, Cmp::Lt, Cmp::Le, Cmp::Gt, Cmp::Ge] {
            assert!(!value_cmp_affine(cmp, &expr, 1, &operands, &ValueOrInt::from(0)));
        }
    }

    #[test]
    fn test_affine_out_of_range_and_overflow() {
        let bump = Bump::new();
        let builder = IrBuilder::new(&bump);

        let c = builder.constant(Literal::Index(2));
        let operands = [c.result(0)];

        // Dim position beyond num_dims is not a dimension.
        assert!(!value_cmp_affine(
            Cmp::Eq,
            &AffineExpr::Dim(1),
            1,
            &operands,
            &ValueOrInt::from(2),
        ));

        // Overflow folds to unknown.
        let overflow = AffineExpr::mul(
            AffineExpr::Constant(i64::MAX),
            AffineExpr::Constant(2),
        );
        assert!(!value_cmp_affine(Cmp::Gt, &overflow, 0, &[], &ValueOrInt::from(0)));

        // Comparison against a symbolic target never holds.
        let sym = builder.alloc();
        assert!(!value_cmp_affine(
            Cmp::Eq,
            &AffineExpr::Constant(2),
            0,
            &[],
            &ValueOrInt::Symbolic(sym.result(0)),
        ));
    }

    proptest! {
        #[test]
        fn prop_resolved_matches_integer_math(a in any::<i64>(), b in any::<i64>()) {
            let v = ValueOrInt::from(a);
            prop_assert_eq!(v == b, a == b);
            prop_assert_eq!(v < b, a < b);
            prop_assert_eq!(v <= b, a <= b);
            prop_assert_eq!(v > b, a > b);
            prop_assert_eq!(v >= b, a >= b);
        }

        #[test]
        fn prop_resolved_matches_bigint_math(a in any::<i64>(), b in any::<i64>()) {
            let v = ValueOrInt::from(a);
            let big = BigInt::from(b);
            prop_assert_eq!(v == big.clone(), a == b);
            prop_assert_eq!(v < big.clone(), a < b);
            prop_assert_eq!(v >= big, a >= b);
        }
    }
}
