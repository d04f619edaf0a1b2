//! Integer helpers shared by the solver.
//!
//! Everything here is exact integer arithmetic. The solver never touches
//! floating point, so rounding lives in these few functions.

/// Greatest common divisor of two values (Euclid).
///
/// `gcd(0, n) == n`, which makes `0` a neutral seed for folds.
#[inline]
pub const fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a
}

/// Greatest common divisor of a whole slice.
///
/// Returns `None` for an empty slice.
///
/// # Examples
/// ```
/// use packwise::numeric::gcd_all;
///
/// assert_eq!(gcd_all(&[250, 500, 1000]), Some(250));
/// assert_eq!(gcd_all(&[23, 31, 53]), Some(1));
/// assert_eq!(gcd_all(&[]), None);
/// ```
pub fn gcd_all(values: &[u64]) -> Option<u64> {
    let (first, rest) = values.split_first()?;
    Some(rest.iter().fold(*first, |acc, &v| gcd(acc, v)))
}

/// Ceiling division of two positive integers, `(a + b - 1) / b`.
///
/// Returns `None` when `b` is zero or the numerator overflows.
#[inline]
pub fn ceil_div(a: u64, b: u64) -> Option<u64> {
    if b == 0 {
        return None;
    }
    a.checked_add(b - 1).map(|n| n / b)
}
