use anyhow::{ensure, Result};
use glam::Vec3;

/// Waypoint polyline promoted to a curve: centripetal Catmull-Rom
/// (alpha = 0.5) through the control points, ends clamped. The curve passes
/// through every waypoint and never extrapolates past the ends.
#[derive(Debug, Clone)]
pub struct Track {
    points: Vec<Vec3>,
}

impl Track {
    pub fn new(points: Vec<Vec3>) -> Result<Self> {
        ensure!(points.len() >= 2, "a track needs at least 2 control points, got {}", points.len());
        Ok(Self { points })
    }

    pub fn control_points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn first_point(&self) -> Vec3 {
        self.points[0]
    }

    pub fn last_point(&self) -> Vec3 {
        *self.points.last().expect("track holds at least 2 points")
    }

    /// Interpolated position at `t`, clamped to [0, 1]. `t = 0` and `t = 1`
    /// return the first/last control point exactly.
    pub fn point_at(&self, t: f32) -> Vec3 {
        if t <= 0.0 {
            return self.first_point();
        }
        if t >= 1.0 {
            return self.last_point();
        }
        let segments = self.points.len() - 1;
        let scaled = t * segments as f32;
        let index = (scaled.floor() as usize).min(segments - 1);
        let local = scaled - index as f32;

        let prev = if index == 0 { 0 } else { index - 1 };
        let next = (index + 2).min(self.points.len() - 1);
        catmull_rom_centripetal(
            self.points[prev],
            self.points[index],
            self.points[index + 1],
            self.points[next],
            local,
        )
    }

    /// Normalized direction of travel at `t`, for look-ahead orientation.
    pub fn tangent_at(&self, t: f32) -> Vec3 {
        const H: f32 = 1e-3;
        let t = t.clamp(0.0, 1.0);
        let ahead = self.point_at((t + H).min(1.0));
        let behind = self.point_at((t - H).max(0.0));
        let delta = ahead - behind;
        if delta.length_squared() <= f32::EPSILON {
            return Vec3::NEG_Z;
        }
        delta.normalize()
    }

    /// Evenly-parametrized sample list for debug visualization of the curve.
    pub fn sample_polyline(&self, samples_per_segment: usize) -> Vec<Vec3> {
        let total = (self.points.len() - 1) * samples_per_segment.max(1);
        (0..=total).map(|i| self.point_at(i as f32 / total as f32)).collect()
    }
}

/// Scripted camera motion evaluates a position track and a look-at track at
/// the same parametric `t`, so aim never lags position.
#[derive(Debug, Clone)]
pub struct TrackPair {
    pub position: Track,
    pub target: Track,
}

impl TrackPair {
    pub fn new(position: Track, target: Track) -> Self {
        Self { position, target }
    }

    pub fn sample(&self, t: f32) -> (Vec3, Vec3) {
        (self.position.point_at(t), self.target.point_at(t))
    }
}

fn catmull_rom_centripetal(p0: Vec3, p1: Vec3, p2: Vec3, p3: Vec3, u: f32) -> Vec3 {
    // Knot spacing uses sqrt of chord length (alpha = 0.5). Clamped end
    // anchors duplicate points, so knot deltas need a floor to stay finite.
    const MIN_DELTA: f32 = 1e-5;
    let t0 = 0.0;
    let t1 = t0 + p0.distance(p1).sqrt().max(MIN_DELTA);
    let t2 = t1 + p1.distance(p2).sqrt().max(MIN_DELTA);
    let t3 = t2 + p2.distance(p3).sqrt().max(MIN_DELTA);
    let t = t1 + u.clamp(0.0, 1.0) * (t2 - t1);

    let a1 = p0.lerp(p1, (t - t0) / (t1 - t0));
    let a2 = p1.lerp(p2, (t - t1) / (t2 - t1));
    let a3 = p2.lerp(p3, (t - t2) / (t3 - t2));
    let b1 = a1.lerp(a2, (t - t0) / (t2 - t0));
    let b2 = a2.lerp(a3, (t - t1) / (t3 - t1));
    b1.lerp(b2, (t - t1) / (t2 - t1))
}
