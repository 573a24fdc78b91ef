use crate::constants::{MAX_VALUE, MIN_VALUE};

/// Which two adjacent sequence items to show and how much of the upper one
/// to blend over the lower one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blend {
    pub index_low: usize,
    pub index_high: usize,
    pub weight: f64,
}

/// Map a control value in [MIN_VALUE, MAX_VALUE] onto a sequence of `n` items.
///
/// With fewer than 2 items there is nothing to blend and the result is
/// degenerate. Callers are responsible for clamping `value` into the domain
/// before calling; this function does not clamp.
pub fn map(value: f64, n: usize) -> Blend {
    if n < 2 {
        return Blend { index_low: 0, index_high: 0, weight: 0.0 };
    }

    // Normalize value from [MIN_VALUE, MAX_VALUE] to a continuous position
    // in [0, n - 1].
    let p = (value - MIN_VALUE) / (MAX_VALUE - MIN_VALUE) * (n - 1) as f64;

    let index_low = p.floor() as usize;
    let index_high = (p.ceil() as usize).min(n - 1);
    let weight = p - p.floor();

    Blend { index_low, index_high, weight }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn endpoints_are_exact() {
        for n in 2..=16 {
            assert_eq!(map(1.0, n), Blend { index_low: 0, index_high: 0, weight: 0.0 });
            assert_eq!(
                map(10.0, n),
                Blend { index_low: n - 1, index_high: n - 1, weight: 0.0 }
            );
        }
    }

    #[test]
    fn degenerate_sequences_never_blend() {
        for v in [1.0, 3.7, 5.5, 10.0] {
            assert_eq!(map(v, 0), Blend { index_low: 0, index_high: 0, weight: 0.0 });
            assert_eq!(map(v, 1), Blend { index_low: 0, index_high: 0, weight: 0.0 });
        }
    }

    #[test]
    fn midpoint_of_ten_images() {
        // value 5.5 over 10 images lands exactly between images 4 and 5
        let b = map(5.5, 10);
        assert_eq!(b.index_low, 4);
        assert_eq!(b.index_high, 5);
        assert!((b.weight - 0.5).abs() < 1e-9);
    }

    #[test]
    fn integer_positions_have_zero_weight() {
        // 10 images: every whole value lands exactly on one image
        for v in 1..=10 {
            let b = map(v as f64, 10);
            assert_eq!(b.index_low, b.index_high);
            assert!(b.weight.abs() < 1e-9);
        }
    }

    proptest! {
        #[test]
        fn indices_are_ordered_and_in_range(v in 1.0f64..=10.0, n in 2usize..64) {
            let b = map(v, n);
            prop_assert!(b.index_low <= b.index_high);
            prop_assert!(b.index_high <= n - 1);
            prop_assert!((0.0..=1.0).contains(&b.weight));
        }

        #[test]
        fn monotonic_in_value(a in 1.0f64..=10.0, b in 1.0f64..=10.0, n in 2usize..64) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let first = map(lo, n);
            let second = map(hi, n);
            prop_assert!(first.index_low <= second.index_low);
            prop_assert!(first.index_high <= second.index_high);
        }
    }
}
