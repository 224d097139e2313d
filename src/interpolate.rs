//! Linear interpolation.

use crate::error::Error;

/// Interpolates between two slices element-wise. No clamping is applied.
pub fn interpolate(from: &[f64], to: &[f64], factor: f64) -> Result<Vec<f64>, Error> {
   if from.len() != to.len() {
      return Err(Error::MismatchedArguments);
   }

   Ok(from
      .iter()
      .zip(to)
      .map(|(&from_val, &to_val)| lerp(from_val, to_val, factor))
      .collect())
}

/// Lerp between two values: `from + (to - from) * factor`.
pub fn lerp(from: f64, to: f64, factor: f64) -> f64 {
   from + (to - from) * factor
}
