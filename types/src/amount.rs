//! Token amounts and the integer helpers every engine shares.
//!
//! Amounts are plain `u128` smallest-unit integers. There is no floating
//! point anywhere in the core: every ratio is an integer multiply followed by
//! an explicitly rounded divide, and every intermediate product is checked.

/// A token amount in the token's smallest unit.
pub type Amount = u128;

/// A fee or tolerance expressed in basis points (1 bps = 0.01%).
pub type BasisPoints = u32;

/// 100% in basis points.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// `a * b / c`, rounded down. `None` on overflow or when `c == 0`.
pub fn mul_div_floor(a: u128, b: u128, c: u128) -> Option<u128> {
    a.checked_mul(b)?.checked_div(c)
}

/// Integer square root, rounded down (Newton's method).
pub fn isqrt(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    // Initial guess 2^ceil(bits/2) is always >= sqrt(n).
    let bits = 128 - n.leading_zeros();
    let mut x = 1u128 << bits.div_ceil(2);
    loop {
        let y = (x + n / x) / 2;
        if y >= x {
            return x;
        }
        x = y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn isqrt_small_values() {
        assert_eq!(isqrt(0), 0);
        assert_eq!(isqrt(1), 1);
        assert_eq!(isqrt(3), 1);
        assert_eq!(isqrt(4), 2);
        assert_eq!(isqrt(100), 10);
        assert_eq!(isqrt(99), 9);
    }

    #[test]
    fn isqrt_of_max_does_not_overflow() {
        let r = isqrt(u128::MAX);
        assert_eq!(r, u64::MAX as u128);
    }

    #[test]
    fn mul_div_rounds_down() {
        assert_eq!(mul_div_floor(10, 10, 3), Some(33));
        assert_eq!(mul_div_floor(10, 10, 5), Some(20));
        assert_eq!(mul_div_floor(1, 1, 0), None);
        assert_eq!(mul_div_floor(u128::MAX, 2, 1), None);
    }
}
