//! Save-point scheduling.

/// Ordered list of simulation times at which a frame should be saved.
///
/// `due(t)` fires once per crossing: every save point `≤ t` is consumed
/// together, so a large step that jumps over several points saves once.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveSchedule {
    points: Vec<f64>,
    next: usize,
}

impl SaveSchedule {
    /// Tolerance used when comparing a time with a save point.
    const EPS: f64 = 1e-12;

    /// Save points from explicit times (sorted on construction).
    pub fn new(mut points: Vec<f64>) -> Self {
        points.retain(|t| t.is_finite());
        points.sort_by(f64::total_cmp);
        Self { points, next: 0 }
    }

    /// Evenly spaced save points `t0, t0 + 1/fps, ...` up to `t_end`
    /// inclusive. A non-positive `fps` saves only at `t0`.
    pub fn from_fps(t0: f64, t_end: f64, fps: f64) -> Self {
        if fps <= 0.0 || !fps.is_finite() || t_end < t0 {
            return Self::new(vec![t0]);
        }
        let interval = 1.0 / fps;
        let count = ((t_end - t0) / interval + Self::EPS).floor() as usize;
        Self::new((0..=count).map(|k| t0 + k as f64 * interval).collect())
    }

    /// Returns `true` when `t` has reached the next save point, consuming
    /// every point up to `t`.
    pub fn due(&mut self, t: f64) -> bool {
        let mut fired = false;
        while self.next < self.points.len() && self.points[self.next] <= t + Self::EPS {
            self.next += 1;
            fired = true;
        }
        fired
    }

    /// Save points not yet reached.
    pub fn remaining(&self) -> &[f64] {
        &self.points[self.next..]
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.points.len()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
