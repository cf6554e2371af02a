use std::f64::consts::PI;

use super::{Position, Vec2};

/// Edge length of the world at zoom 0, in pixels.
pub const TILE_SIZE: f64 = 512.0;

/// A Web Mercator camera frame: what is centered, how far in, and how big the canvas is.
///
/// Pixel coordinates are relative to the top-left corner of the canvas.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub center: Position,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(center: Position, zoom: f64, width: f64, height: f64) -> Self {
        Self {
            center,
            zoom,
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn world_size(&self) -> f64 {
        TILE_SIZE * self.zoom.exp2()
    }

    pub fn project(&self, position: Position) -> Vec2 {
        let size = self.world_size();
        let half = Vec2::new(self.width * 0.5, self.height * 0.5);
        mercator_world(position, size) - mercator_world(self.center, size) + half
    }

    pub fn unproject(&self, pixel: Vec2) -> Position {
        let size = self.world_size();
        let half = Vec2::new(self.width * 0.5, self.height * 0.5);
        let world = pixel - half + mercator_world(self.center, size);
        mercator_position(world, size)
    }
}

fn mercator_world(position: Position, size: f64) -> Vec2 {
    let p = position.clamped();
    let x = (p.lon + 180.0) / 360.0 * size;
    let lat = p.lat.to_radians();
    let y = (1.0 - (PI * 0.25 + lat * 0.5).tan().ln() / PI) * 0.5 * size;
    Vec2::new(x, y)
}

fn mercator_position(world: Vec2, size: f64) -> Position {
    let lon = world.x / size * 360.0 - 180.0;
    let n = PI * (1.0 - 2.0 * world.y / size);
    let lat = n.sinh().atan().to_degrees();
    Position::new(lon, lat)
}

#[cfg(test)]
mod tests {
    use super::{TILE_SIZE, Viewport};
    use crate::math::{Position, Vec2};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn center_projects_to_canvas_middle() {
        let vp = Viewport::new(Position::new(-122.33, 47.6), 12.0, 800.0, 600.0);
        let px = vp.project(vp.center);
        assert_close(px.x, 400.0, 1e-6);
        assert_close(px.y, 300.0, 1e-6);
    }

    #[test]
    fn zoom_zero_world_spans_one_tile() {
        let vp = Viewport::new(Position::new(0.0, 0.0), 0.0, TILE_SIZE, TILE_SIZE);
        let west = vp.project(Position::new(-180.0, 0.0));
        let east = vp.project(Position::new(180.0, 0.0));
        assert_close(east.x - west.x, TILE_SIZE, 1e-9);
    }

    #[test]
    fn pixel_round_trip() {
        let vp = Viewport::new(Position::new(11.57, 48.14), 17.5, 1024.0, 768.0);
        for offset in [Vec2::new(30.0, 0.0), Vec2::new(-12.5, 44.0), Vec2::new(250.0, -300.0)] {
            let px = Vec2::new(512.0, 384.0) + offset;
            let back = vp.project(vp.unproject(px));
            assert_close(back.x, px.x, 1e-6);
            assert_close(back.y, px.y, 1e-6);
        }
    }

    #[test]
    fn north_is_up() {
        let vp = Viewport::new(Position::new(0.0, 0.0), 3.0, 512.0, 512.0);
        let north = vp.project(Position::new(0.0, 10.0));
        assert!(north.y < 256.0);
    }
}
