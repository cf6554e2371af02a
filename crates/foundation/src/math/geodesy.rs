/// Latitude limit of the square Web Mercator world (degrees).
pub const MERCATOR_MAX_LAT: f64 = 85.051_128_779_806_59;

/// Geographic position in degrees, GeoJSON axis order (longitude first).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Position {
    pub lon: f64,
    pub lat: f64,
}

impl Position {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn as_array(self) -> [f64; 2] {
        [self.lon, self.lat]
    }

    /// Same position with latitude clamped into the Mercator range.
    pub fn clamped(self) -> Self {
        Self::new(self.lon, self.lat.clamp(-MERCATOR_MAX_LAT, MERCATOR_MAX_LAT))
    }
}

impl From<[f64; 2]> for Position {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

#[cfg(test)]
mod tests {
    use super::{MERCATOR_MAX_LAT, Position};

    #[test]
    fn clamps_polar_latitudes() {
        let p = Position::new(10.0, 89.0).clamped();
        assert_eq!(p.lat, MERCATOR_MAX_LAT);
        assert_eq!(p.lon, 10.0);
    }
}
