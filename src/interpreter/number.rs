// ©2024 Otmar Klenk
#![allow(non_camel_case_types)]

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

pub(crate) const DIVISION_BY_ZERO: &str = "Division by zero";

/// Numeric cell: two non-Real operands stay Integer, any Real operand
/// promotes the result to Real. Booleans coerce through their integer value
/// except for the bitwise operators, which keep Boolean when both sides are.
#[derive(Clone, Debug, PartialEq)]
pub enum Number {
    BOOLEAN(bool),
    INTEGER(i64),
    REAL(f64),
}

impl Number {
    #[inline(always)]
    pub(crate) fn is_boolean(&self) -> bool {
        matches!(self, Number::BOOLEAN(_))
    }
    #[inline(always)]
    pub(crate) fn is_integer(&self) -> bool {
        matches!(self, Number::INTEGER(_))
    }
    #[inline(always)]
    pub(crate) fn is_real(&self) -> bool {
        matches!(self, Number::REAL(_))
    }

    #[inline]
    pub(crate) fn boolean(&self) -> bool {
        match self {
            Number::BOOLEAN(b)  => *b,
            Number::INTEGER(i)  => *i != 0,
            Number::REAL(r)     => *r != 0.0,
        }
    }
    #[inline]
    pub(crate) fn integer(&self) -> i64 {
        match self {
            Number::BOOLEAN(b)  => *b as i64,
            Number::INTEGER(i)  => *i,
            Number::REAL(r)     => *r as i64,
        }
    }
    #[inline]
    pub(crate) fn real(&self) -> f64 {
        match self {
            Number::BOOLEAN(b)  => *b as i64 as f64,
            Number::INTEGER(i)  => *i as f64,
            Number::REAL(r)     => *r,
        }
    }

    pub(crate) fn divide(self, other: Number) -> Result<Number, String> {
        if ! self.is_real() && ! other.is_real() {
            if other.integer() == 0 {
                return Err(DIVISION_BY_ZERO.to_string());
            }
            Ok(Number::INTEGER(self.integer().wrapping_div(other.integer())))
        }
        else {
            Ok(Number::REAL(self.real() / other.real()))
        }
    }

    // truncated remainder: a - b*trunc(a/b), in both branches
    pub(crate) fn modulo(self, other: Number) -> Result<Number, String> {
        if ! self.is_real() && ! other.is_real() {
            let (a, b) = (self.integer(), other.integer());
            if b == 0 {
                return Err(DIVISION_BY_ZERO.to_string());
            }
            let factor = a.wrapping_div(b);
            Ok(Number::INTEGER(a.wrapping_sub(b.wrapping_mul(factor))))
        }
        else {
            let (a, b) = (self.real(), other.real());
            let factor = (a / b).trunc();
            Ok(Number::REAL(a - b * factor))
        }
    }

    pub(crate) fn min_of(self, other: Number) -> Number {
        if Number::cmp(&self, &other) <= 0 { self } else { other }
    }
    pub(crate) fn max_of(self, other: Number) -> Number {
        if Number::cmp(&self, &other) >= 0 { self } else { other }
    }

    pub(crate) fn and(self, other: Number) -> Number {
        Number::bool_op(self, other, |a, b| a & b)
    }
    pub(crate) fn or(self, other: Number) -> Number {
        Number::bool_op(self, other, |a, b| a | b)
    }
    pub(crate) fn xor(self, other: Number) -> Number {
        Number::bool_op(self, other, |a, b| a ^ b)
    }

    #[inline]
    fn bool_op(n1: Number, n2: Number, f: fn(i64, i64) -> i64) -> Number {
        if n1.is_boolean() && n2.is_boolean() {
            Number::BOOLEAN(f(n1.integer(), n2.integer()) != 0)
        }
        else {
            Number::INTEGER(f(n1.integer(), n2.integer()))
        }
    }

    pub(crate) fn not(self) -> Number {
        match self {
            Number::BOOLEAN(b)  => Number::BOOLEAN(! b),
            _                   => Number::INTEGER(! self.integer()),
        }
    }

    pub(crate) fn abs(self) -> Number {
        if ! self.is_real() {
            Number::INTEGER(self.integer().wrapping_abs())
        }
        else {
            Number::REAL(self.real().abs())
        }
    }

    pub(crate) fn cmp(n1: &Number, n2: &Number) -> i32 {
        if ! n1.is_real() && ! n2.is_real() {
            let (i1, i2) = (n1.integer(), n2.integer());
            if i1 > i2 { 1 } else if i1 < i2 { -1 } else { 0 }
        }
        else {
            let (r1, r2) = (n1.real(), n2.real());
            if r1 > r2 { 1 } else if r1 < r2 { -1 } else { 0 }
        }
    }

    pub(crate) fn inc(&mut self, n: &Number) {
        if ! self.is_real() && ! n.is_real() {
            *self = Number::INTEGER(self.integer().wrapping_add(n.integer()));
        }
        else {
            *self = Number::REAL(self.real() + n.real());
        }
    }
}

macro_rules! num_op {  // Integer stays Integer, Real promotes
    ($n1: expr, $n2: expr, $iop: ident, $rop: expr) => {{
        if ! $n1.is_real() && ! $n2.is_real() {
            Number::INTEGER($n1.integer().$iop($n2.integer()))
        }
        else {
            Number::REAL(($rop)($n1.real(), $n2.real()))
        }
    }}
}

impl Add<Number> for Number {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        num_op!(self, other, wrapping_add, |a, b| a + b)
    }
}
impl Sub<Number> for Number {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        num_op!(self, other, wrapping_sub, |a, b| a - b)
    }
}
impl Mul<Number> for Number {
    type Output = Self;
    fn mul(self, other: Self) -> Self {
        num_op!(self, other, wrapping_mul, |a, b| a * b)
    }
}
impl Neg for Number {
    type Output = Number;
    fn neg(self) -> <Number as Neg>::Output {
        if ! self.is_real() {
            Number::INTEGER(self.integer().wrapping_neg())
        }
        else {
            Number::REAL(-self.real())
        }
    }
}

impl From<bool> for Number {
    fn from(b: bool) -> Number {
        Number::BOOLEAN(b)
    }
}
impl From<i64> for Number {
    fn from(i: i64) -> Number {
        Number::INTEGER(i)
    }
}
impl From<f64> for Number {
    fn from(r: f64) -> Number {
        Number::REAL(r)
    }
}

impl fmt::Display for Number {  // base-10 rendition; radix handled by the caller
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Number::BOOLEAN(b)  => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Number::INTEGER(i)  => write!(f, "{}", i),
            Number::REAL(r)     => write!(f, "{}", r),
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_operands_stay_integer() {
        assert_eq!(Number::from(10) + Number::from(20), Number::INTEGER(30));
        assert_eq!(Number::from(10) * Number::from(20), Number::INTEGER(200));
        assert_eq!(Number::from(10).divide(Number::from(3)), Ok(Number::INTEGER(3)));
    }

    #[test]
    fn real_operand_promotes() {
        assert_eq!(Number::from(10) + Number::from(0.5), Number::REAL(10.5));
        assert_eq!(Number::from(1.0).divide(Number::from(4)), Ok(Number::REAL(0.25)));
    }

    #[test]
    fn booleans_coerce_through_integer() {
        assert_eq!(Number::from(true) + Number::from(2), Number::INTEGER(3));
        assert_eq!(Number::from(true).and(Number::from(false)), Number::BOOLEAN(false));
        assert_eq!(Number::from(true).or(Number::from(false)), Number::BOOLEAN(true));
        assert_eq!(Number::from(6).and(Number::from(3)), Number::INTEGER(2));
        assert_eq!(Number::from(6).xor(Number::from(3)), Number::INTEGER(5));
    }

    #[test]
    fn modulo_truncates_toward_zero() {
        assert_eq!(Number::from(7).modulo(Number::from(3)), Ok(Number::INTEGER(1)));
        assert_eq!(Number::from(-7).modulo(Number::from(3)), Ok(Number::INTEGER(-1)));
        assert_eq!(Number::from(7).modulo(Number::from(-3)), Ok(Number::INTEGER(1)));
        assert_eq!(Number::from(7.5).modulo(Number::from(2.0)), Ok(Number::REAL(1.5)));
    }

    #[test]
    fn zero_divisor_reports() {
        assert_eq!(Number::from(1).divide(Number::from(0)), Err(DIVISION_BY_ZERO.to_string()));
        assert_eq!(Number::from(1).modulo(Number::from(0)), Err(DIVISION_BY_ZERO.to_string()));
    }

    #[test]
    fn not_distinguishes_boolean_from_integer() {
        assert_eq!(Number::from(true).not(), Number::BOOLEAN(false));
        assert_eq!(Number::from(0).not(), Number::INTEGER(-1));
    }

    #[test]
    fn cmp_orders_mixed_operands() {
        assert_eq!(Number::cmp(&Number::from(1), &Number::from(2)), -1);
        assert_eq!(Number::cmp(&Number::from(2.5), &Number::from(2)), 1);
        assert_eq!(Number::cmp(&Number::from(3), &Number::from(3)), 0);
    }

    #[test]
    fn display_uses_forth_booleans() {
        assert_eq!(Number::from(true).to_string(), "TRUE");
        assert_eq!(Number::from(false).to_string(), "FALSE");
        assert_eq!(Number::from(42).to_string(), "42");
    }
}
