//! Great-circle distance on a spherical Earth

/// Mean Earth radius used for all distances, in meters
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Anything with a latitude and longitude in decimal degrees
pub trait LatLon {
    fn latitude(&self) -> f64;
    fn longitude(&self) -> f64;
}

impl LatLon for (f64, f64) {
    fn latitude(&self) -> f64 {
        self.0
    }

    fn longitude(&self) -> f64 {
        self.1
    }
}

/// Haversine distance between two coordinates, in meters.
pub fn haversine_distance<A: LatLon + ?Sized, B: LatLon + ?Sized>(p1: &A, p2: &B) -> f64 {
    let d_lat = (p2.latitude() - p1.latitude()).to_radians();
    let d_lon = (p2.longitude() - p1.longitude()).to_radians();
    let lat1 = p1.latitude().to_radians();
    let lat2 = p2.latitude().to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Total length of a path: the left-to-right sum of consecutive segments.
///
/// Paths with fewer than two points have length zero.
pub fn path_distance<P: LatLon>(path: &[P]) -> f64 {
    path.windows(2)
        .fold(0.0, |total, pair| total + haversine_distance(&pair[0], &pair[1]))
}

/// Running path length that only measures the newest segment on each push.
///
/// Adds segments in the same order as [`path_distance`], so after pushing the
/// points of a path one by one, [`DistanceAccumulator::total`] is bit-for-bit
/// equal to `path_distance` over that path.
#[derive(Debug, Clone, Default)]
pub struct DistanceAccumulator {
    last: Option<(f64, f64)>,
    total: f64,
}

impl DistanceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a point and return the updated total
    pub fn push<P: LatLon + ?Sized>(&mut self, point: &P) -> f64 {
        let current = (point.latitude(), point.longitude());
        if let Some(last) = self.last {
            self.total += haversine_distance(&last, &current);
        }
        self.last = Some(current);
        self.total
    }

    pub fn total(&self) -> f64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_fixture() {
        let d = haversine_distance(&(0.0, 0.0), &(0.0, 0.001));
        assert!((d - 111.19).abs() < 0.01, "got {}", d);
    }

    #[test]
    fn test_symmetry_and_identity() {
        let a = (37.4275, -122.1697);
        let b = (37.3318, -122.0312);

        assert_eq!(haversine_distance(&a, &b), haversine_distance(&b, &a));
        assert_eq!(haversine_distance(&a, &a), 0.0);
    }

    #[test]
    fn test_short_paths_have_zero_length() {
        let empty: [(f64, f64); 0] = [];
        assert_eq!(path_distance(&empty), 0.0);
        assert_eq!(path_distance(&[(10.0, 20.0)]), 0.0);
    }

    #[test]
    fn test_path_distance_sums_segments() {
        let path = [(0.0, 0.0), (0.0, 0.001), (0.0, 0.002)];
        let expected = haversine_distance(&path[0], &path[1]) + haversine_distance(&path[1], &path[2]);
        assert_eq!(path_distance(&path), expected);
    }

    #[test]
    fn test_accumulator_matches_full_recompute() {
        let path = [
            (48.8566, 2.3522),
            (48.8570, 2.3530),
            (48.8581, 2.3549),
            (48.8579, 2.3561),
            (48.8566, 2.3522),
        ];

        let mut acc = DistanceAccumulator::new();
        for (i, point) in path.iter().enumerate() {
            let running = acc.push(point);
            assert_eq!(running, path_distance(&path[..=i]));
        }
        assert_eq!(acc.total(), path_distance(&path));
    }
}
