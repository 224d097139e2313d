//! Encoding and numeric utilities.

use std::sync::LazyLock;

use data_encoding::{
   BASE64,
   Encoding,
};

/// Standard alphabet without padding, accepting URL-safe symbols and ignoring
/// non-zero trailing bits.
static LENIENT_BASE64: LazyLock<Encoding> = LazyLock::new(|| {
   let mut spec = BASE64.specification();
   spec.padding = None;
   spec.check_trailing_bits = false;
   spec.translate.from.push_str("-_");
   spec.translate.to.push_str("+/");
   spec.encoding().expect("lenient base64 specification is valid")
});

/// Returns -1.0 for odd numbers, 0.0 for even. Used as the lower bound when
/// scaling bezier control points.
pub const fn odd_coefficient(num: usize) -> f64 {
   if num % 2 == 1 { -1.0 } else { 0.0 }
}

/// Rounds using JavaScript's `Math.round()` semantics.
///
/// JavaScript rounds -0.5 to 0 (toward positive infinity), while Rust rounds
/// -0.5 to -1 (away from zero). This matches JavaScript.
#[expect(clippy::float_cmp, reason = "checking for exact -0.5 boundary case")]
pub fn js_round(num: f64) -> f64 {
   let decimal_part = num - num.trunc();
   if decimal_part == -0.5 {
      num.ceil()
   } else {
      num.round()
   }
}

/// Sign-symmetric half-up rounding used for the frame time.
///
/// A magnitude with a fractional part of at least one half rounds away from
/// zero, anything smaller truncates toward zero: `0.5 -> 1`, `-0.5 -> -1`.
pub fn half_up_round(num: f64) -> f64 {
   let magnitude = num.abs();
   let floor = magnitude.floor();
   let rounded = if magnitude - floor >= 0.5 {
      magnitude.ceil()
   } else {
      floor
   };
   num.signum() * rounded
}

/// Scales a byte-range value into `[min_val, max_val]`.
///
/// With `rounding` the result is floored, otherwise it is rounded to two
/// decimal places.
pub fn solve(value: f64, min_val: f64, max_val: f64, rounding: bool) -> f64 {
   let result = value * (max_val - min_val) / 255.0 + min_val;
   if rounding {
      result.floor()
   } else {
      js_round(result * 100.0) / 100.0
   }
}

/// Formats a non-negative float in base 16 (e.g. 10.0 -> "A", 0.5 -> ".8").
///
/// The integer part has no leading zero, so zero formats as an empty string.
/// At most ten fractional digits are produced.
#[expect(
   clippy::cast_possible_truncation,
   reason = "working with small display values"
)]
#[expect(clippy::cast_sign_loss, reason = "digits are always in 0..16")]
#[expect(
   clippy::cast_precision_loss,
   reason = "acceptable for display purposes"
)]
#[expect(
   clippy::while_float,
   reason = "intentionally iterating on diminishing fraction"
)]
pub fn float_to_hex(value: f64) -> String {
   const MAX_FRACTION_DIGITS: usize = 10;

   let digit_to_char = |digit: i64| -> char {
      char::from_digit(digit as u32, 16).map_or('?', |chr| chr.to_ascii_uppercase())
   };

   let mut quotient = value.floor() as i64;
   let mut fraction = value - quotient as f64;
   let mut result = String::new();

   while quotient > 0 {
      result.insert(0, digit_to_char(quotient % 16));
      quotient /= 16;
   }

   if fraction <= 0.0 {
      return result;
   }

   result.push('.');
   let mut digits = 0;
   while fraction > 0.0 && digits < MAX_FRACTION_DIGITS {
      fraction *= 16.0;
      let integer_part = fraction.floor() as i64;
      fraction -= integer_part as f64;
      result.push(digit_to_char(integer_part));
      digits += 1;
   }

   result
}

pub fn base64_encode(data: &[u8]) -> String {
   BASE64.encode(data)
}

pub fn base64_decode(input: &str) -> Result<Vec<u8>, data_encoding::DecodeError> {
   BASE64.decode(input.as_bytes())
}

/// Decodes base64 without ever failing.
///
/// Well-formed input decodes strictly. Otherwise decoding stops at the first
/// `=`, symbols outside the alphabet are skipped, URL-safe symbols are
/// accepted and a dangling final symbol is dropped.
pub fn base64_decode_lenient(input: &str) -> Vec<u8> {
   if let Ok(bytes) = BASE64.decode(input.as_bytes()) {
      return bytes;
   }

   let mut symbols = input
      .bytes()
      .take_while(|&byte| byte != b'=')
      .filter(|&byte| byte.is_ascii_alphanumeric() || matches!(byte, b'+' | b'/' | b'-' | b'_'))
      .collect::<Vec<u8>>();

   if symbols.len() % 4 == 1 {
      symbols.pop();
   }

   LENIENT_BASE64.decode(&symbols).unwrap_or_default()
}
