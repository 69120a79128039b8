use serde::Serialize;

/// Scene layout of the radar needle.
#[derive(Debug, Clone, Copy)]
pub struct NeedleGeometry {
    pub radius: f32,
    /// half the needle's angular width, radians
    pub half_width: f32,
    pub center: (f32, f32),
}

impl Default for NeedleGeometry {
    fn default() -> Self {
        Self { radius: 445.0, half_width: 0.05, center: (505.0, 495.0) }
    }
}

/// Triangle drawn for the needle: upper tip, center, lower tip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NeedlePolygon(pub [(f32, f32); 3]);

impl NeedleGeometry {
    // Scene y grows downward, hence the negated sine.
    pub fn polygon(&self, angle_deg: f32) -> NeedlePolygon {
        let rad = angle_deg.to_radians();
        let (cx, cy) = self.center;
        let tip = |t: f32| (self.radius * t.cos() + cx, -self.radius * t.sin() + cy);
        NeedlePolygon([tip(rad + self.half_width), (cx, cy), tip(rad - self.half_width)])
    }
}
