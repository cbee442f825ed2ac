// SPDX-License-Identifier: Apache-2.0

use analogcast_core::canonical;
use proptest::prelude::*;
use serde_json::json;

proptest! {
    #[test]
    fn stable_hash_bytes_is_deterministic(payload in proptest::collection::vec(any::<u8>(), 0..256)) {
        let h1 = analogcast_core::sha256_hex(&payload);
        let h2 = analogcast_core::sha256_hex(&payload);
        prop_assert_eq!(h1, h2);
    }

    #[test]
    fn stable_json_bytes_are_independent_of_object_key_order(
        a in "[a-z0-9_-]{1,32}",
        b in "[a-z0-9_-]{1,32}",
        av in any::<u32>(),
        bv in any::<u32>(),
    ) {
        prop_assume!(a != b);

        let left = json!({a.clone(): av, b.clone(): bv});
        let right = json!({b: bv, a: av});

        let left_bytes = canonical::stable_json_bytes(&left).expect("canonical left");
        let right_bytes = canonical::stable_json_bytes(&right).expect("canonical right");

        prop_assert_eq!(left_bytes, right_bytes);
    }
}
