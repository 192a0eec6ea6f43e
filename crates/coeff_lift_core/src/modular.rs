//! Scalar arithmetic over Z_q
//!
//! Residues are stored as `u32` in `[0, q)` and multiplied through `u64`
//! intermediates. Signed "small" representatives only appear at the
//! reporting boundary via [`to_centered_mod`].

use num_integer::Integer;

/// Falcon modulus, the default for every entry point in this crate.
pub const DEFAULT_MODULUS: u32 = 12289;

/// Reduce any integer into `[0, q)`.
#[inline]
pub fn reduce_mod(x: i64, q: u32) -> u32 {
    x.mod_floor(&(q as i64)) as u32
}

/// Modular inverse using the extended Euclidean algorithm
///
/// Negative inputs are reduced first. Returns `None` when `a ≡ 0 (mod q)`,
/// when `gcd(a, q) != 1`, or when `q < 2`.
pub fn modinv(a: i64, q: u32) -> Option<u32> {
    if q < 2 {
        return None;
    }
    let a = reduce_mod(a, q);
    if a == 0 {
        return None;
    }

    let mut t: i64 = 0;
    let mut new_t: i64 = 1;
    let mut r = q as i64;
    let mut new_r = a as i64;

    while new_r != 0 {
        let quotient = r / new_r;
        let tmp_t = t - quotient * new_t;
        t = new_t;
        new_t = tmp_t;
        let tmp_r = r - quotient * new_r;
        r = new_r;
        new_r = tmp_r;
    }

    if r > 1 {
        return None;
    }

    if t < 0 {
        t += q as i64;
    }

    Some(t as u32)
}

/// Map `x` to its centered representative in `(-q/2, q/2]`
///
/// Reduces into `[0, q)` first, then subtracts `q` from anything above
/// `q / 2` (integer division).
#[inline]
pub fn to_centered_mod(x: i64, q: u32) -> i64 {
    let r = reduce_mod(x, q);
    if r > q / 2 {
        r as i64 - q as i64
    } else {
        r as i64
    }
}

#[inline]
pub fn mul_mod(a: u32, b: u32, q: u32) -> u32 {
    ((a as u64 * b as u64) % q as u64) as u32
}

#[inline]
pub fn add_mod(a: u32, b: u32, q: u32) -> u32 {
    ((a as u64 + b as u64) % q as u64) as u32
}

/// `a - b mod q` for residues already in `[0, q)`.
#[inline]
pub fn sub_mod(a: u32, b: u32, q: u32) -> u32 {
    if a >= b {
        a - b
    } else {
        q - (b - a)
    }
}
