//! Route followed by every enemy.

use merge_defence_config::MapConfig;
use merge_defence_core::Vec2;

/// Vertical inset of the route's start and end points from the map edges.
const ENDPOINT_INSET: f32 = 10.0;

/// Parametric route that enemies traverse from `t = 0` to `t = 1`.
pub trait Path {
    /// World position at the normalised progress `t`, clamped to `[0, 1]`.
    fn point_at(&self, t: f32) -> Vec2;

    /// Total length of the route in world units.
    fn length(&self) -> f32;
}

/// Piecewise linear route through a list of waypoints.
#[derive(Clone, Debug, PartialEq)]
pub struct PolylinePath {
    waypoints: Vec<Vec2>,
    cumulative: Vec<f32>,
    length: f32,
}

impl PolylinePath {
    /// Builds a route through the provided waypoints in order.
    #[must_use]
    pub fn new(waypoints: Vec<Vec2>) -> Self {
        let mut cumulative = Vec::with_capacity(waypoints.len());
        let mut length = 0.0;
        for (index, point) in waypoints.iter().enumerate() {
            if index > 0 {
                length += point.distance(waypoints[index - 1]);
            }
            cumulative.push(length);
        }
        Self {
            waypoints,
            cumulative,
            length,
        }
    }

    /// Builds the snaking route used by the standard map.
    ///
    /// The route starts near the top-left corner, sweeps through the centre of
    /// each horizontal band in alternating directions, steps down one band
    /// between sweeps and finishes just above the bottom edge.
    #[must_use]
    pub fn serpentine(map: &MapConfig) -> Self {
        let rows = map.path_rows.max(1);
        let band = map.height / rows as f32;
        let left = map.x + map.path_margin;
        let right = map.x + map.width - map.path_margin;

        let mut waypoints = vec![Vec2::new(left, map.y + ENDPOINT_INSET)];
        for row in 0..rows {
            let centre = map.y + band * row as f32 + band / 2.0;
            let side = if row % 2 == 0 { right } else { left };
            waypoints.push(Vec2::new(side, centre));
            if row + 1 < rows {
                waypoints.push(Vec2::new(side, centre + band));
            }
        }
        let last_side = if (rows - 1) % 2 == 0 { right } else { left };
        waypoints.push(Vec2::new(last_side, map.y + map.height - ENDPOINT_INSET));

        Self::new(waypoints)
    }

    /// Waypoints in travel order.
    #[must_use]
    pub fn waypoints(&self) -> &[Vec2] {
        &self.waypoints
    }

    /// Samples `samples + 1` evenly spaced points from start to end inclusive.
    #[must_use]
    pub fn sample(&self, samples: u32) -> Vec<Vec2> {
        let samples = samples.max(1);
        (0..=samples)
            .map(|step| self.point_at(step as f32 / samples as f32))
            .collect()
    }
}

impl Path for PolylinePath {
    fn point_at(&self, t: f32) -> Vec2 {
        let Some(first) = self.waypoints.first().copied() else {
            return Vec2::ZERO;
        };
        if self.length <= 0.0 {
            return first;
        }

        let travelled = t.clamp(0.0, 1.0) * self.length;
        let segment = self
            .cumulative
            .partition_point(|distance| *distance < travelled)
            .clamp(1, self.waypoints.len() - 1);
        let start = self.waypoints[segment - 1];
        let end = self.waypoints[segment];
        let span = self.cumulative[segment] - self.cumulative[segment - 1];
        if span <= 0.0 {
            return end;
        }
        let fraction = (travelled - self.cumulative[segment - 1]) / span;
        start.lerp(end, fraction)
    }

    fn length(&self) -> f32 {
        self.length
    }
}
