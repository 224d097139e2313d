//! Property tests for the encoding primitives.

use proptest::prelude::*;
use x_client_txid::{
   Cubic,
   TokenContext,
   base64_decode,
   base64_encode,
   half_up_round,
   xor_mask,
};

proptest! {
   #[test]
   fn base64_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..=128)) {
      let encoded = base64_encode(&bytes);
      prop_assert_eq!(base64_decode(&encoded).unwrap(), bytes);
   }

   #[test]
   fn xor_mask_is_an_involution(bytes in proptest::collection::vec(any::<u8>(), 0..=64), mask in any::<u8>()) {
      let masked = xor_mask(&bytes, mask).collect::<Vec<_>>();
      let restored = xor_mask(&masked, mask).collect::<Vec<_>>();
      prop_assert_eq!(restored, bytes);
   }

   #[test]
   fn token_is_deterministic_for_fixed_mask(
      key_bytes in proptest::collection::vec(any::<u8>(), 0..=48),
      time in 0_i64..=i64::from(u32::MAX),
      mask in any::<u8>(),
      path in "/[a-z0-9/]{0,32}",
   ) {
      let context = TokenContext::default();
      let first = context.encode("GET", &path, time, &key_bytes, "ff100100100", mask);
      let second = context.encode("GET", &path, time, &key_bytes, "ff100100100", mask);
      prop_assert_eq!(&first, &second);

      let padding = "=".repeat((4 - first.len() % 4) % 4);
      let raw = base64_decode(&format!("{first}{padding}")).unwrap();
      prop_assert_eq!(raw.len(), 1 + key_bytes.len() + 4 + 16 + 1);
      prop_assert_eq!(raw[0], mask);
   }

   #[test]
   fn half_up_round_is_sign_symmetric(value in -1.0e9_f64..1.0e9) {
      let rounded = half_up_round(value);
      prop_assert!((half_up_round(-value) + rounded).abs() < f64::EPSILON);
      prop_assert!((rounded - value).abs() <= 0.5);
      prop_assert!((rounded - rounded.trunc()).abs() < f64::EPSILON);
   }

   #[test]
   fn cubic_stays_in_unit_range(
      x1 in 0.0_f64..=1.0,
      y1 in 0.0_f64..=1.0,
      x2 in 0.0_f64..=1.0,
      y2 in 0.0_f64..=1.0,
      time in 0.0_f64..=1.0,
   ) {
      let value = Cubic::new([x1, y1, x2, y2]).value(time);
      prop_assert!((-0.0001..=1.0001).contains(&value));
   }
}
