//! Cubic bezier easing curve for animation timing.

use crate::{
   error::Error,
   utils::{
      odd_coefficient,
      solve,
   },
};

/// Easing control points `(x1, y1, x2, y2)` scaled from a frame row.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveSpec {
   control_points: Vec<[f64; 4]>,
}

impl CurveSpec {
   /// Scales raw byte values into control points. Even positions map into
   /// `[0, 1]`, odd positions into `[-1, 1]`, both rounded to two decimals.
   ///
   /// Values are grouped in fours; a trailing partial group is dropped.
   pub fn from_values(values: &[i32]) -> Result<Self, Error> {
      let scaled = values
         .iter()
         .enumerate()
         .map(|(idx, &val)| solve(f64::from(val), odd_coefficient(idx), 1.0, false))
         .collect::<Vec<f64>>();

      let control_points = scaled
         .chunks_exact(4)
         .map(|chunk| [chunk[0], chunk[1], chunk[2], chunk[3]])
         .collect::<Vec<_>>();

      if control_points.is_empty() {
         return Err(Error::Parse(format!(
            "curve needs 4 control values, got {}",
            values.len()
         )));
      }

      Ok(Self { control_points })
   }

   pub fn control_points(&self) -> &[[f64; 4]] {
      &self.control_points
   }

   /// The easing curve. Only the first control-point tuple shapes it.
   pub fn cubic(&self) -> Cubic {
      Cubic::new(self.control_points[0])
   }
}

/// Tolerance on the x coordinate when searching for a curve parameter.
const X_TOLERANCE: f64 = 0.00001;

/// Cubic bezier curve, like CSS `cubic-bezier()`.
///
/// The curve runs from `(0, 0)` to `(1, 1)` with control points
/// `(x1, y1)` and `(x2, y2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cubic {
   curves: [f64; 4],
}

impl Cubic {
   pub const fn new(curves: [f64; 4]) -> Self {
      Self { curves }
   }

   /// Eases `time`. Outside `(0, 1)` the curve continues as a straight line
   /// through the nearer anchor.
   pub fn value(&self, time: f64) -> f64 {
      if time <= 0.0 {
         return self.start_slope() * time;
      }
      if time >= 1.0 {
         return 1.0 + self.end_slope() * (time - 1.0);
      }

      let [_, y1, _, y2] = self.curves;
      coordinate(y1, y2, self.param_at(time))
   }

   /// Slope of the chord from `(0, 0)` to the first control point with a
   /// positive x. Zero if neither qualifies.
   #[expect(clippy::float_cmp, reason = "a control point exactly on the anchor")]
   fn start_slope(&self) -> f64 {
      let [x1, y1, x2, y2] = self.curves;
      let origin = (0.0, 0.0);

      if x1 > 0.0 {
         chord_slope(origin, (x1, y1))
      } else if y1 == 0.0 && x2 > 0.0 {
         chord_slope(origin, (x2, y2))
      } else {
         0.0
      }
   }

   /// Slope of the chord from the second control point to `(1, 1)`, falling
   /// back to the first when the second sits on `x = 1`.
   #[expect(clippy::float_cmp, reason = "a control point exactly on x = 1")]
   fn end_slope(&self) -> f64 {
      let [x1, y1, x2, y2] = self.curves;
      let end = (1.0, 1.0);

      if x2 < 1.0 {
         chord_slope(end, (x2, y2))
      } else if x2 == 1.0 && x1 < 1.0 {
         chord_slope(end, (x1, y1))
      } else {
         0.0
      }
   }

   /// Bisects for the parameter whose x coordinate is `time`.
   fn param_at(&self, time: f64) -> f64 {
      let [x1, _, x2, _] = self.curves;
      let (mut low, mut high) = (0.0_f64, 1.0_f64);

      loop {
         let param = f64::midpoint(low, high);
         let estimate = coordinate(x1, x2, param);

         if (time - estimate).abs() < X_TOLERANCE || high - low < f64::EPSILON {
            return param;
         }

         if estimate < time {
            low = param;
         } else {
            high = param;
         }
      }
   }
}

/// One coordinate of the curve at `param`, with anchors fixed at 0 and 1.
fn coordinate(c1: f64, c2: f64, param: f64) -> f64 {
   let rest = 1.0 - param;
   3.0 * c1 * rest * rest * param + 3.0 * c2 * rest * param * param + param * param * param
}

fn chord_slope(anchor: (f64, f64), point: (f64, f64)) -> f64 {
   (point.1 - anchor.1) / (point.0 - anchor.0)
}
