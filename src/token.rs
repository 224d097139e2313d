//! Transaction token encoding.

use std::time::{
   SystemTime,
   UNIX_EPOCH,
};

use hmac_sha256::Hash;
use tracing::trace;

use crate::utils::base64_encode;

/// Secret salt from X's client-side JavaScript.
pub const DEFAULT_KEYWORD: &str = "obfiowerehiring";

/// Trailing payload byte, read by the server as a protocol version.
pub const ADDITIONAL_RANDOM_NUMBER: u8 = 3;

/// X's custom epoch: 2023-05-01 00:00:00 UTC, in milliseconds.
const X_EPOCH_MILLIS: i64 = 1_682_924_400_000;

/// Per-client constants mixed into the hash input and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenContext {
   random_keyword: String,
   random_number:  u8,
}

impl Default for TokenContext {
   fn default() -> Self {
      Self {
         random_keyword: DEFAULT_KEYWORD.to_owned(),
         random_number:  ADDITIONAL_RANDOM_NUMBER,
      }
   }
}

impl TokenContext {
   pub fn new() -> Self {
      Self::default()
   }

   /// Overrides the hash salt, e.g. to replay historical captures.
   #[must_use]
   pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
      self.random_keyword = keyword.into();
      self
   }

   /// Overrides the trailing payload byte.
   #[must_use]
   pub const fn with_number(mut self, number: u8) -> Self {
      self.random_number = number;
      self
   }

   pub fn keyword(&self) -> &str {
      &self.random_keyword
   }

   pub const fn number(&self) -> u8 {
      self.random_number
   }

   /// Builds the token for one request.
   ///
   /// The payload is `key_bytes ‖ time (LE u32) ‖ sha256(...)[..16] ‖ number`,
   /// XOR-ed with `mask` and prefixed by it, then base64-encoded without
   /// padding.
   #[expect(clippy::cast_possible_truncation, reason = "time wraps to 32 bits on the wire")]
   #[expect(clippy::cast_sign_loss, reason = "two's complement bytes are intended")]
   pub fn encode(
      &self,
      method: &str,
      path: &str,
      time: i64,
      key_bytes: &[u8],
      animation_key: &str,
      mask: u8,
   ) -> String {
      let hash_input = format!("{method}!{path}!{time}{}{animation_key}", self.random_keyword);
      let digest = Hash::hash(hash_input.as_bytes());
      let time_bytes = (time as u32).to_le_bytes();

      let mut payload = Vec::with_capacity(key_bytes.len() + 4 + 16 + 1);
      payload.extend_from_slice(key_bytes);
      payload.extend_from_slice(&time_bytes);
      payload.extend_from_slice(&digest[..16]);
      payload.push(self.random_number);

      trace!(time, mask, payload_len = payload.len(), "encoding transaction token");

      let mut out = Vec::with_capacity(payload.len() + 1);
      out.push(mask);
      out.extend(xor_mask(&payload, mask));

      base64_encode(&out).trim_end_matches('=').to_owned()
   }
}

/// Source of the per-token mask byte.
pub trait MaskSource {
   fn mask_byte(&self) -> u8;
}

/// Uniformly random mask bytes from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomMask;

impl MaskSource for RandomMask {
   fn mask_byte(&self) -> u8 {
      rand::random()
   }
}

/// The same mask byte every time, for reproducible tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedMask(pub u8);

impl MaskSource for FixedMask {
   fn mask_byte(&self) -> u8 {
      self.0
   }
}

impl<F: Fn() -> u8> MaskSource for F {
   fn mask_byte(&self) -> u8 {
      self()
   }
}

/// Per-call overrides for [`ClientTransaction`](crate::ClientTransaction).
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenOptions<'a> {
   /// Seconds since X's epoch. Defaults to now.
   pub time:          Option<i64>,
   /// Verification key string, decoded like the page's key.
   pub key:           Option<&'a str>,
   pub animation_key: Option<&'a str>,
}

/// XORs every byte with `mask`. Applying it twice restores the input.
pub fn xor_mask(bytes: &[u8], mask: u8) -> impl Iterator<Item = u8> + '_ {
   bytes.iter().map(move |&byte| byte ^ mask)
}

/// Seconds elapsed since X's epoch, floored.
pub fn current_time() -> i64 {
   let now_millis = SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .map_or(0, |duration| i64::try_from(duration.as_millis()).unwrap_or(i64::MAX));
   (now_millis - X_EPOCH_MILLIS).div_euclid(1000)
}

#[cfg(test)]
mod tests {
   use super::*;
   use crate::utils::base64_decode;

   fn decode(token: &str) -> Vec<u8> {
      let padding = "=".repeat((4 - token.len() % 4) % 4);
      base64_decode(&format!("{token}{padding}")).unwrap()
   }

   #[test]
   fn token_layout() {
      let context = TokenContext::new();
      let key_bytes = [1, 2, 3, 4, 5, 6];
      let token = context.encode("GET", "/i/api/x", 0x0102_0304, &key_bytes, "abc", 0x5A);
      assert!(!token.contains('='));

      let raw = decode(&token);
      assert_eq!(raw.len(), 1 + key_bytes.len() + 4 + 16 + 1);
      assert_eq!(raw[0], 0x5A);

      let payload = xor_mask(&raw[1..], raw[0]).collect::<Vec<_>>();
      assert_eq!(&payload[..6], key_bytes);
      assert_eq!(&payload[6..10], [4, 3, 2, 1]);

      let digest = Hash::hash(b"GET!/i/api/x!16909060obfiowerehiringabc");
      assert_eq!(&payload[10..26], &digest[..16]);
      assert_eq!(payload[26], ADDITIONAL_RANDOM_NUMBER);
   }

   #[test]
   fn zero_mask_leaves_payload_plain() {
      let token = TokenContext::new().encode("POST", "/p", 7, &[], "k", 0);
      let raw = decode(&token);
      assert_eq!(raw[0], 0);
      assert_eq!(&raw[1..5], [7, 0, 0, 0]);
   }

   #[test]
   fn context_overrides_change_token() {
      let base = TokenContext::new().encode("GET", "/", 1, &[9], "k", 1);
      let keyword = TokenContext::new()
         .with_keyword("other")
         .encode("GET", "/", 1, &[9], "k", 1);
      let number = TokenContext::new().with_number(4).encode("GET", "/", 1, &[9], "k", 1);
      assert_ne!(base, keyword);
      assert_ne!(base, number);

      let raw = decode(&number);
      assert_eq!(raw.last().copied(), Some(4 ^ 1));
   }

   #[test]
   fn negative_time_wraps_to_32_bits() {
      let raw = decode(&TokenContext::new().encode("GET", "/", -1, &[], "k", 0));
      assert_eq!(&raw[1..5], [0xFF; 4]);
   }

   #[test]
   fn mask_sources() {
      assert_eq!(FixedMask(7).mask_byte(), 7);
      assert_eq!((|| 42_u8).mask_byte(), 42);
      let _ = RandomMask.mask_byte();
   }

   #[test]
   fn current_time_is_after_epoch() {
      assert!(current_time() > 0);
   }
}
