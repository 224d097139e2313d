//! Animation key derived from one sampled frame of the loading animation.

use std::{
   fmt,
   iter,
};

use tracing::debug;

use crate::{
   cubic_curve::CurveSpec,
   error::Error,
   frames::FrameTable,
   indices::IndicesSpec,
   interpolate::interpolate,
   rotation::rotation_matrix,
   utils::{
      float_to_hex,
      half_up_round,
      js_round,
      solve,
   },
};

const TOTAL_ANIMATION_TIME: f64 = 4096.0;
const ROW_INDEX_MODULUS: u8 = 16;
/// Three start color channels, three end channels, one rotation, four curve values.
const MIN_FRAME_VALUES: usize = 11;

/// Key material string mixed into every transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnimationKey(String);

impl AnimationKey {
   /// Samples the frame row selected by the key bytes at the key-derived time.
   ///
   /// Deterministic: the same inputs always produce the same key.
   pub fn derive(key_bytes: &[u8], indices: &IndicesSpec, frames: &FrameTable) -> Result<Self, Error> {
      let row_selector = key_bytes
         .get(indices.row_index())
         .ok_or_else(|| Error::Parse("key too short for row selection".into()))?;
      let row_index = usize::from(row_selector % ROW_INDEX_MODULUS);

      let frame_time = frame_time(key_bytes, indices.key_byte_indices())?;
      let target_time = frame_time / TOTAL_ANIMATION_TIME;

      let row = frames
         .row(row_index)
         .ok_or_else(|| Error::Parse(format!("row index {row_index} out of bounds")))?;

      debug!(row_index, frame_time, target_time, "sampling animation frame");
      Self::animate(row, target_time)
   }

   /// Blends the row's colors and rotation at `target_time` and formats the
   /// result as hex.
   #[expect(
      clippy::cast_possible_truncation,
      reason = "color values are clamped to 0-255"
   )]
   pub fn animate(frame: &[i32], target_time: f64) -> Result<Self, Error> {
      if frame.len() < MIN_FRAME_VALUES {
         return Err(Error::Parse(format!(
            "frame has {} values, need at least {MIN_FRAME_VALUES}",
            frame.len()
         )));
      }

      let channels = |values: &[i32]| {
         values
            .iter()
            .map(|&val| f64::from(val))
            .chain(iter::once(1.0))
            .collect::<Vec<f64>>()
      };
      let from_color = channels(&frame[..3]);
      let to_color = channels(&frame[3..6]);

      let from_rotation = [0.0];
      let to_rotation = [solve(f64::from(frame[6]), 60.0, 360.0, true)];

      let progress = CurveSpec::from_values(&frame[7..])?.cubic().value(target_time);
      debug!(progress, "evaluated easing curve");

      let color = interpolate(&from_color, &to_color, progress)?
         .into_iter()
         .map(|val| val.clamp(0.0, 255.0))
         .collect::<Vec<_>>();

      let rotation = interpolate(&from_rotation, &to_rotation, progress)?;
      let matrix = rotation_matrix(rotation[0]);

      let mut parts = Vec::with_capacity(9);

      for val in &color[..color.len() - 1] {
         parts.push(format!("{:x}", js_round(*val) as i64));
      }

      for val in matrix {
         let rounded = (js_round(val * 100.0) / 100.0).abs();
         let hex = float_to_hex(rounded).to_lowercase();

         if hex.starts_with('.') {
            parts.push(format!("0{hex}"));
         } else if hex.is_empty() {
            parts.push("0".to_owned());
         } else {
            parts.push(hex);
         }
      }

      parts.push("0".to_owned());
      parts.push("0".to_owned());

      Ok(Self(parts.concat().replace(['.', '-'], "")))
   }

   pub fn as_str(&self) -> &str {
      &self.0
   }
}

impl From<String> for AnimationKey {
   fn from(key: String) -> Self {
      Self(key)
   }
}

impl fmt::Display for AnimationKey {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(&self.0)
   }
}

/// Product of `key_bytes[i] % 16` over the indices, rounded half-up to the
/// nearest multiple of ten.
pub fn frame_time(key_bytes: &[u8], key_byte_indices: &[usize]) -> Result<f64, Error> {
   let product = key_byte_indices
      .iter()
      .map(|&index| {
         key_bytes
            .get(index)
            .map(|&byte| f64::from(byte % ROW_INDEX_MODULUS))
            .ok_or_else(|| Error::Parse(format!("key too short for index {index}")))
      })
      .try_fold(1.0, |acc, factor| factor.map(|factor| acc * factor))?;

   Ok(half_up_round(product / 10.0) * 10.0)
}

#[cfg(test)]
mod tests {
   use super::*;

   /// Frame whose curve ends flat at y = 1 and whose rotation solves to 90 degrees.
   const ROW: [i32; 11] = [255, 16, 0, 0x12, 0xab, 0, 26, 51, 0, 204, 255];

   #[test]
   fn frame_time_rounds_product() {
      let key_bytes = [0x10, 6, 8, 15];
      assert!((frame_time(&key_bytes, &[]).unwrap() - 0.0).abs() < f64::EPSILON);
      // 6 * 8 = 48 -> 50
      assert!((frame_time(&key_bytes, &[1, 2]).unwrap() - 50.0).abs() < f64::EPSILON);
      // 0x10 % 16 = 0
      assert!((frame_time(&key_bytes, &[1, 0]).unwrap() - 0.0).abs() < f64::EPSILON);
      // 15^4 = 50625 -> 50630
      assert!((frame_time(&key_bytes, &[3, 3, 3, 3]).unwrap() - 50630.0).abs() < f64::EPSILON);
   }

   #[test]
   fn frame_time_rejects_short_key() {
      let err = frame_time(&[1, 2], &[5]).unwrap_err();
      assert!(matches!(err, Error::Parse(_)));
   }

   #[test]
   fn animate_at_start_uses_start_color() {
      let key = AnimationKey::animate(&ROW, 0.0).unwrap();
      assert_eq!(key.as_str(), "ff100100100");
   }

   #[test]
   fn animate_past_end_uses_end_color_and_rotation() {
      let key = AnimationKey::animate(&ROW, 12.36).unwrap();
      assert_eq!(key.as_str(), "12ab0011000");
   }

   #[test]
   fn animate_midway_has_fractional_matrix() {
      let key = AnimationKey::animate(&ROW, 0.5).unwrap();
      assert!(key.as_str().chars().all(|chr| chr.is_ascii_hexdigit()));
      assert!(key.as_str().ends_with("00"));
      assert_eq!(key, AnimationKey::animate(&ROW, 0.5).unwrap());
   }

   #[test]
   fn animate_formats_fractional_matrix_entries() {
      // the curve dips below zero; sin rounds to -0.01 and prints as ten hex digits
      let row = [213, 12, 87, 239, 36, 93, 250, 244, 19, 27, 86];
      let key = AnimationKey::animate(&row, 0.002_441_406_25).unwrap();
      assert_eq!(key.as_str(), "d5c5710028f5c28f50028f5c28f5100");

      // sin rounds to -0.03, cos to exactly 1
      let row = [125, 253, 96, 249, 17, 48, 154, 207, 66, 19, 182];
      let key = AnimationKey::animate(&row, 0.012_207_031_25).unwrap();
      assert_eq!(key.as_str(), "7cff601007ae147ae1007ae147ae1100");
   }

   #[test]
   fn animate_insufficient_frames() {
      let err = AnimationKey::animate(&[1, 2, 3], 0.5).unwrap_err();
      assert!(matches!(err, Error::Parse(_)));
   }

   #[test]
   fn derive_selects_row_by_key_byte() {
      let frames = FrameTable::parse_path(&format!(
         "M 10,30 C{}C{}",
         "0 0 0 0 0 0 0 0 0 0 0",
         ROW.map(|val| val.to_string()).join(" ")
      ))
      .unwrap();
      let indices = IndicesSpec::extract("(a[0], 16)(a[1], 16)").unwrap();

      // row = 0x11 % 16 = 1, frame time = 0
      let key = AnimationKey::derive(&[0x11, 0x20], &indices, &frames).unwrap();
      assert_eq!(key.as_str(), "ff100100100");

      let err = AnimationKey::derive(&[0x12, 0x20], &indices, &frames).unwrap_err();
      assert!(matches!(err, Error::Parse(_)));
   }
}
