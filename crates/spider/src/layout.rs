//! Spider layout solver.
//!
//! Turns a member count into pixel offsets around a cluster center: a single
//! circle for small clusters, an outward spiral once the count passes the
//! switchover. The solver is pure and deterministic, so the same inputs always
//! yield bit-identical offsets.

use std::f64::consts::PI;

use foundation::math::Vec2;
use serde::Serialize;

use crate::options::SpiderOptions;

/// Per-index angle increment that keeps spiral arms from lining up across turns.
pub const SPIRAL_ANGLE_JITTER: f64 = 0.0005;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    Circle,
    Spiral,
}

/// Picks the arrangement for `count` members.
pub fn layout_mode(count: usize, circle_spiral_switchover: usize) -> LayoutMode {
    if count > circle_spiral_switchover {
        LayoutMode::Spiral
    } else {
        LayoutMode::Circle
    }
}

/// Geometry inputs of the solver.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayoutParams {
    pub circle_spiral_switchover: usize,
    pub min_circle_length: f64,
    pub min_spiral_angle_separation: f64,
    pub spiral_distance_factor: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self::from(&SpiderOptions::default())
    }
}

impl From<&SpiderOptions> for LayoutParams {
    fn from(o: &SpiderOptions) -> Self {
        Self {
            circle_spiral_switchover: o.circle_spiral_switchover,
            min_circle_length: o.min_circle_length,
            min_spiral_angle_separation: o.min_spiral_angle_separation,
            spiral_distance_factor: o.spiral_distance_factor,
        }
    }
}

/// One member's placement relative to the center.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Leg {
    /// Radians from the +x axis (clockwise on screen, since pixel y grows downwards).
    pub angle: f64,
    /// Distance from the center, in pixels.
    pub length: f64,
    pub offset: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpiderLayout {
    pub mode: LayoutMode,
    pub center: Vec2,
    /// Index-aligned with the member order given to the solver.
    pub legs: Vec<Leg>,
}

impl SpiderLayout {
    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    pub fn offsets(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.legs.iter().map(|l| l.offset)
    }

    /// Absolute pixel positions, `center + offset`.
    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.legs.iter().map(|l| self.center + l.offset)
    }
}

/// Lays out `count` members around `center`.
///
/// `count == 0` yields an empty layout; callers should not expand empty clusters.
pub fn compute_layout(center: Vec2, count: usize, params: &LayoutParams) -> SpiderLayout {
    let mode = layout_mode(count, params.circle_spiral_switchover);
    let legs = match mode {
        LayoutMode::Circle => circle_legs(count, params),
        LayoutMode::Spiral => spiral_legs(count, params),
    };
    SpiderLayout { mode, center, legs }
}

fn circle_legs(count: usize, params: &LayoutParams) -> Vec<Leg> {
    if count == 0 {
        return Vec::new();
    }

    let n = count as f64;
    let step_angle = 2.0 * PI / n;

    // Arc length between neighbours approximates the distance factor.
    let mut length = (params.spiral_distance_factor / step_angle / PI / 2.0) * n;
    if length < params.min_circle_length {
        length = params.min_circle_length;
    }

    (0..count)
        .map(|i| {
            let angle = step_angle * i as f64;
            Leg {
                angle,
                length,
                offset: Vec2::from_polar(length, angle),
            }
        })
        .collect()
}

fn spiral_legs(count: usize, params: &LayoutParams) -> Vec<Leg> {
    let step_length = 2.0 * PI * params.spiral_distance_factor;
    let mut length = params.min_circle_length / PI;
    let mut angle = 0.0;

    let mut legs = Vec::with_capacity(count);
    for i in 0..count {
        angle += params.min_spiral_angle_separation / length + i as f64 * SPIRAL_ANGLE_JITTER;
        length += step_length / angle;
        legs.push(Leg {
            angle,
            length,
            offset: Vec2::from_polar(length, angle),
        });
    }
    legs
}

#[cfg(test)]
mod tests {
    use super::{LayoutMode, LayoutParams, compute_layout, layout_mode};
    use foundation::math::Vec2;
    use std::f64::consts::PI;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn mode_switches_after_threshold() {
        let p = LayoutParams::default();
        let at = compute_layout(Vec2::ZERO, p.circle_spiral_switchover, &p);
        let past = compute_layout(Vec2::ZERO, p.circle_spiral_switchover + 1, &p);
        assert_eq!(at.mode, LayoutMode::Circle);
        assert_eq!(past.mode, LayoutMode::Spiral);
        assert_eq!(layout_mode(0, 1), LayoutMode::Circle);
    }

    #[test]
    fn returns_one_leg_per_member() {
        let p = LayoutParams::default();
        for n in [0, 1, 2, 6, 7, 50, 100] {
            assert_eq!(compute_layout(Vec2::new(10.0, 20.0), n, &p).len(), n);
        }
    }

    #[test]
    fn identical_inputs_give_identical_bits() {
        let p = LayoutParams::default();
        let a = compute_layout(Vec2::new(400.0, 300.0), 37, &p);
        let b = compute_layout(Vec2::new(400.0, 300.0), 37, &p);
        let bits = |l: &super::SpiderLayout| -> Vec<(u64, u64)> {
            l.offsets().map(|o| (o.x.to_bits(), o.y.to_bits())).collect()
        };
        assert_eq!(bits(&a), bits(&b));
    }

    #[test]
    fn circle_radius_never_below_minimum() {
        let p = LayoutParams {
            circle_spiral_switchover: 1_000,
            ..LayoutParams::default()
        };
        for n in 1..=200 {
            let layout = compute_layout(Vec2::ZERO, n, &p);
            for leg in &layout.legs {
                assert!(leg.length >= p.min_circle_length, "n={n} length={}", leg.length);
            }
        }
    }

    #[test]
    fn circle_grows_past_minimum_for_large_counts() {
        let p = LayoutParams {
            circle_spiral_switchover: 1_000,
            ..LayoutParams::default()
        };
        // (5 / (2π/n) / π / 2) * n = 5n² / 4π², which passes 30 at n = 16.
        let layout = compute_layout(Vec2::ZERO, 16, &p);
        let expected = 5.0 * 256.0 / (4.0 * PI * PI);
        assert_close(layout.legs[0].length, expected, 1e-9);
    }

    #[test]
    fn single_member_sits_at_angle_zero() {
        let layout = compute_layout(Vec2::new(100.0, 100.0), 1, &LayoutParams::default());
        assert_eq!(layout.mode, LayoutMode::Circle);
        assert_eq!(layout.legs[0].angle, 0.0);
        assert_eq!(layout.legs[0].offset, Vec2::new(30.0, 0.0));
        assert_eq!(layout.positions().next(), Some(Vec2::new(130.0, 100.0)));
    }

    #[test]
    fn circle_is_evenly_spaced() {
        let layout = compute_layout(Vec2::ZERO, 4, &LayoutParams::default());
        let angles: Vec<f64> = layout.legs.iter().map(|l| l.angle).collect();
        assert_eq!(angles, vec![0.0, PI / 2.0, PI, 3.0 * PI / 2.0]);
        assert_close(layout.legs[1].offset.x, 0.0, 1e-9);
        assert_close(layout.legs[1].offset.y, 30.0, 1e-9);
    }

    #[test]
    fn spiral_first_leg_matches_closed_form() {
        let p = LayoutParams::default();
        let layout = compute_layout(Vec2::ZERO, 7, &p);

        let start = p.min_circle_length / PI;
        let angle = p.min_spiral_angle_separation / start;
        let length = start + 2.0 * PI * p.spiral_distance_factor / angle;
        assert_close(layout.legs[0].angle, angle, 1e-12);
        assert_close(layout.legs[0].length, length, 1e-12);
    }

    #[test]
    fn spiral_moves_outward() {
        let layout = compute_layout(Vec2::ZERO, 100, &LayoutParams::default());
        for pair in layout.legs.windows(2) {
            assert!(pair[1].length > pair[0].length);
            assert!(pair[1].angle > pair[0].angle);
        }
    }

    #[test]
    fn positions_are_center_plus_offset() {
        let center = Vec2::new(-5.0, 12.5);
        let layout = compute_layout(center, 9, &LayoutParams::default());
        for (pos, off) in layout.positions().zip(layout.offsets()) {
            assert_eq!(pos, center + off);
        }
    }
}
