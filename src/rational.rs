//  RATIONAL.rs
//    by Lut99
//
//  Created:
//    18 Mar 2025, 09:52:10
//  Last edited:
//    04 Jul 2025, 14:22:31
//  Auto updated?
//    Yes
//
//  Description:
//!   Exact rational arithmetic.
//!
//!   Every numeric value in the system (fluent values, probabilities, rewards) is a
//!   [`Rational`]: an immutable reduced fraction with a positive denominator. Addition and
//!   subtraction go through least-common-multiple multipliers rather than naive
//!   cross-multiplication to bound intermediate magnitude.
//

use std::fmt::{Display, Formatter, Result as FResult};
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

use crate::errors::{Error, Result};


/***** HELPER FUNCTIONS *****/
/// Returns the greatest common divisor of the two integers.
#[inline]
fn gcd(n: i64, m: i64) -> i64 {
    let mut a: i64 = n.abs();
    let mut b: i64 = m.abs();
    while b > 0 {
        let c: i64 = b;
        b = a % b;
        a = c;
    }
    a
}

/// Returns the least common multiple of the two integers.
#[inline]
fn lcm(n: i64, m: i64) -> i64 { n / gcd(n, m) * m }





/***** LIBRARY *****/
/// An exact rational number, always stored in lowest terms with a positive denominator.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Rational {
    /// The (sign-carrying) numerator.
    num: i64,
    /// The denominator. Invariant: strictly positive, coprime with `num`.
    den: i64,
}

// Constructors
impl Rational {
    /// The rational number 0.
    pub const ZERO: Self = Self { num: 0, den: 1 };
    /// The rational number 1.
    pub const ONE: Self = Self { num: 1, den: 1 };

    /// Constructs a new Rational from a numerator and a denominator.
    ///
    /// The fraction is reduced and the denominator normalized to be positive.
    ///
    /// # Arguments
    /// - `num`: The numerator.
    /// - `den`: The denominator.
    ///
    /// # Errors
    /// Fails with [`Error::DivisionByZero`] if `den` is 0.
    pub fn new(num: i64, den: i64) -> Result<Self> {
        if den == 0 {
            return Err(Error::DivisionByZero);
        }
        let d: i64 = gcd(num, den);
        let (mut num, mut den): (i64, i64) = (num / d, den / d);
        if den < 0 {
            num = -num;
            den = -den;
        }
        Ok(Self { num, den })
    }
}

// Accessors & arithmetic
impl Rational {
    /// Returns the numerator.
    #[inline]
    pub fn numerator(&self) -> i64 { self.num }

    /// Returns the denominator (always positive).
    #[inline]
    pub fn denominator(&self) -> i64 { self.den }

    /// Returns the pair of factors that bring `n` and `m` to their least common multiple.
    ///
    /// # Returns
    /// `(f / n, f / m)` where `f = lcm(n, m)`.
    #[inline]
    pub fn multipliers(n: i64, m: i64) -> (i64, i64) {
        let f: i64 = lcm(n, m);
        (f / n, f / m)
    }

    /// Divides this rational by another.
    ///
    /// # Errors
    /// Fails with [`Error::DivisionByZero`] if `other` is 0.
    pub fn checked_div(self, other: Self) -> Result<Self> {
        if other.num == 0 {
            return Err(Error::DivisionByZero);
        }
        let d1: i64 = gcd(self.num, other.num);
        let d2: i64 = gcd(other.den, self.den);
        // Cross-reduced product with the divisor flipped; the sign moves to the numerator.
        let mut num: i64 = (self.num / d1) * (other.den / d2);
        let mut den: i64 = (self.den / d2) * (other.num / d1);
        if den < 0 {
            num = -num;
            den = -den;
        }
        Ok(Self { num, den })
    }
}

impl Add for Rational {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        let (m1, m2): (i64, i64) = Self::multipliers(self.den, other.den);
        // The sum over the common denominator may not be reduced; `new` cannot fail here.
        let num: i64 = self.num * m1 + other.num * m2;
        let den: i64 = self.den * m1;
        let d: i64 = gcd(num, den);
        Self { num: num / d, den: den / d }
    }
}
impl Sub for Rational {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self { self + (-other) }
}
impl Mul for Rational {
    type Output = Self;

    #[inline]
    fn mul(self, other: Self) -> Self {
        let d1: i64 = gcd(self.num, other.den);
        let d2: i64 = gcd(other.num, self.den);
        Self { num: (self.num / d1) * (other.num / d2), den: (self.den / d2) * (other.den / d1) }
    }
}
impl Neg for Rational {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self { Self { num: -self.num, den: self.den } }
}

impl PartialOrd for Rational {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> { Some(self.cmp(other)) }
}
impl Ord for Rational {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        let (m1, m2): (i64, i64) = Self::multipliers(self.den, other.den);
        (self.num * m1).cmp(&(other.num * m2))
    }
}

impl From<i64> for Rational {
    #[inline]
    fn from(value: i64) -> Self { Self { num: value, den: 1 } }
}

impl FromStr for Rational {
    type Err = Error;

    /// Parses an optional sign, an integer part, and either a `/denominator` suffix or a
    /// `.fractional` (decimal fixed-point) suffix.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidRational(s.into());
        let (sign, rest): (i64, &str) = match s.strip_prefix('-') {
            Some(rest) => (-1, rest),
            None => (1, s),
        };
        if rest.is_empty() {
            return Err(invalid());
        }

        if let Some((int_part, den_part)) = rest.split_once('/') {
            let num: i64 = int_part.parse().map_err(|_| invalid())?;
            let den: i64 = den_part.parse().map_err(|_| invalid())?;
            if den == 0 {
                return Err(Error::DivisionByZero);
            }
            Self::new(sign * num, den)
        } else if let Some((int_part, frac_part)) = rest.split_once('.') {
            let int: i64 = if int_part.is_empty() { 0 } else { int_part.parse().map_err(|_| invalid())? };
            let mut num: i64 = 0;
            let mut den: i64 = 1;
            for c in frac_part.chars() {
                let digit: i64 = c.to_digit(10).ok_or_else(invalid)? as i64;
                num = 10 * num + digit;
                den *= 10;
            }
            Self::new(sign * (int * den + num), den)
        } else {
            let num: i64 = rest.parse().map_err(|_| invalid())?;
            Ok(Self::from(sign * num))
        }
    }
}

impl Display for Rational {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        write!(f, "{}", self.num)?;
        if self.den != 1 {
            write!(f, "/{}", self.den)?;
        }
        Ok(())
    }
}





/***** TESTS *****/
