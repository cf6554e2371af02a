use foundation::math::{Position, Vec2, Viewport};

/// Geographic ↔ screen-pixel conversion supplied by the host camera.
///
/// Both directions must describe the same camera frame for the duration of one
/// layout build; a camera change in between places members at wrong positions.
pub trait Projection {
    fn to_pixel(&self, position: Position) -> Vec2;
    fn to_position(&self, pixel: Vec2) -> Position;
}

impl Projection for Viewport {
    fn to_pixel(&self, position: Position) -> Vec2 {
        self.project(position)
    }

    fn to_position(&self, pixel: Vec2) -> Position {
        self.unproject(pixel)
    }
}

/// Converts every absolute pixel position back to geographic space.
pub fn to_positions<P, I>(projection: &P, pixels: I) -> Vec<Position>
where
    P: Projection + ?Sized,
    I: IntoIterator<Item = Vec2>,
{
    pixels.into_iter().map(|px| projection.to_position(px)).collect()
}
