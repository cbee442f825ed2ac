// SPDX-License-Identifier: Apache-2.0

use analogcast_model::{HorizonKey, Month};
use proptest::prelude::*;
use proptest::test_runner::Config;

proptest! {
    #![proptest_config(Config::with_cases(128))]
    #[test]
    fn month_display_parse_roundtrip(year in 1000_i32..=9999, month in 1_u32..=12) {
        let m = Month::new(year, month).expect("month");
        let raw = format!("{year:04}-{month:02}");
        prop_assert_eq!(m.to_string(), raw.clone());
        prop_assert_eq!(Month::parse(&raw).expect("parse"), m);
    }

    #[test]
    fn month_offsets_are_inverse(year in 1100_i32..=9800, month in 1_u32..=12, delta in -1000_i32..1000) {
        let m = Month::new(year, month).expect("month");
        let moved = m.add_months(delta);
        prop_assert_eq!(m.months_until(moved), delta);
        prop_assert_eq!(moved.add_months(-delta), m);
        prop_assert!((1..=12).contains(&moved.month()));
    }

    #[test]
    fn horizon_key_roundtrip(months in 1_u32..=120) {
        let key = HorizonKey::new(months).expect("key");
        prop_assert_eq!(key.to_string().parse::<HorizonKey>().expect("parse"), key);
    }
}
