//! 2D rotation matrix.

/// Converts degrees to a 2x2 rotation matrix: `[cos, -sin, sin, cos]`.
pub fn rotation_matrix(degrees: f64) -> [f64; 4] {
   let radians = degrees * std::f64::consts::PI / 180.0;
   let (sin, cos) = radians.sin_cos();
   [cos, -sin, sin, cos]
}
