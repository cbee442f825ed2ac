// SPDX-License-Identifier: Apache-2.0

use analogcast_engine::{dtw, Dtw};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::Config;

fn series() -> impl Strategy<Value = Vec<f64>> {
    vec(-100.0_f64..100.0, 1..16)
}

proptest! {
    #![proptest_config(Config::with_cases(256))]

    #[test]
    fn unconstrained_dtw_is_exactly_symmetric(a in series(), b in series()) {
        prop_assert_eq!(dtw(&a, &b).expect("ab"), dtw(&b, &a).expect("ba"));
    }

    #[test]
    fn identity_has_zero_distance(a in series(), band in proptest::option::of(0_usize..4)) {
        prop_assert_eq!(Dtw::new(band).distance(&a, &a).expect("aa"), 0.0);
    }

    #[test]
    fn shared_trailing_padding_never_increases_distance(
        a in series(),
        b in series(),
        pad in vec(-100.0_f64..100.0, 1..4),
    ) {
        let base = dtw(&a, &b).expect("base");
        let mut a2 = a.clone();
        let mut b2 = b.clone();
        a2.extend_from_slice(&pad);
        b2.extend_from_slice(&pad);
        prop_assert!(dtw(&a2, &b2).expect("padded") <= base);
    }

    #[test]
    fn distance_is_bounded_by_the_lockstep_path(a in vec(-100.0_f64..100.0, 1..16)) {
        let b: Vec<f64> = a.iter().map(|v| v + 1.0).collect();
        let lockstep: f64 = a.iter().zip(&b).map(|(x, y)| (x - y).abs()).sum();
        let d = dtw(&a, &b).expect("dtw");
        prop_assert!(d >= 0.0);
        prop_assert!(d <= lockstep + 1e-9);
    }

    #[test]
    fn banded_distance_is_never_below_unconstrained(
        a in series(),
        b in series(),
        band in 0_usize..4,
    ) {
        let free = dtw(&a, &b).expect("free");
        let banded = Dtw::new(Some(band)).distance(&a, &b).expect("banded");
        prop_assert!(banded >= free);
        prop_assert!(banded.is_finite());
    }

    #[test]
    fn alignment_path_is_monotone_and_contiguous(a in series(), b in series()) {
        let al = Dtw::default().alignment(&a, &b).expect("align");
        prop_assert_eq!(al.path.first().copied(), Some((0, 0)));
        prop_assert_eq!(al.path.last().copied(), Some((a.len() - 1, b.len() - 1)));
        for w in al.path.windows(2) {
            let (di, dj) = (w[1].0 - w[0].0, w[1].1 - w[0].1);
            prop_assert!(di <= 1 && dj <= 1 && di + dj >= 1);
        }
        let cost: f64 = al.path.iter().map(|(i, j)| (a[*i] - b[*j]).abs()).sum();
        prop_assert!((cost - al.distance).abs() <= 1e-9 * (1.0 + al.distance));
    }
}
