pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub const METERS_PER_FOOT: f64 = 0.3048;

fn to_radians(degrees: f64) -> f64 {
    degrees * std::f64::consts::PI / 180.0
}

fn to_degrees(radians: f64) -> f64 {
    radians * 180.0 / std::f64::consts::PI
}

pub fn meters_to_feet(meters: f64) -> f64 {
    meters / METERS_PER_FOOT
}

/// Returns `((min_lat, min_lon), (max_lat, max_lon))` of the box containing
/// every point within `radius_km` of the given point.
pub fn calculate_bounding_box(
    lat: f64,
    lon: f64,
    radius_km: f64,
) -> ((f64, f64), (f64, f64)) {
    // Convert latitude and longitude from degrees to radians
    let lat_rad = to_radians(lat);
    let lon_rad = to_radians(lon);

    // Latitude bounds
    let min_lat = lat_rad - radius_km / EARTH_RADIUS_KM;
    let max_lat = lat_rad + radius_km / EARTH_RADIUS_KM;

    // Longitude bounds (adjusted by latitude)
    let lon_delta = radius_km / (EARTH_RADIUS_KM * lat_rad.cos().abs().max(1e-12));
    let min_lon = lon_rad - lon_delta;
    let max_lon = lon_rad + lon_delta;

    (
        (to_degrees(min_lat), to_degrees(min_lon)),
        (to_degrees(max_lat), to_degrees(max_lon)),
    )
}

/// Great circle distance in kilometers.
pub fn haversine_distance(
    latitude_1: f64,
    longitude_1: f64,
    latitude_2: f64,
    longitude_2: f64,
) -> f64 {
    let lat1_rad = to_radians(latitude_1);
    let lon1_rad = to_radians(longitude_1);
    let lat2_rad = to_radians(latitude_2);
    let lon2_rad = to_radians(longitude_2);

    let dlat = lat2_rad - lat1_rad;
    let dlon = lon2_rad - lon1_rad;

    let a = (dlat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Projects a point onto a local plane (meters) centered at `origin`.
/// Good enough for the few hundred meters a route corridor spans.
fn local_meters(origin: (f64, f64), point: (f64, f64)) -> (f64, f64) {
    let meters_per_degree = to_radians(1.0) * EARTH_RADIUS_KM * 1000.0;
    let x = (point.1 - origin.1) * meters_per_degree * to_radians(origin.0).cos();
    let y = (point.0 - origin.0) * meters_per_degree;
    (x, y)
}

/// Distance in meters from `point` to the segment `start`-`end`, together
/// with the fraction along the segment (0..=1) of the closest point.
/// All coordinates are `(latitude, longitude)` in degrees.
pub fn distance_to_segment(
    point: (f64, f64),
    start: (f64, f64),
    end: (f64, f64),
) -> (f64, f64) {
    let (px, py) = local_meters(point, point);
    let (ax, ay) = local_meters(point, start);
    let (bx, by) = local_meters(point, end);

    let (dx, dy) = (bx - ax, by - ay);
    let length_squared = dx * dx + dy * dy;
    let fraction = if length_squared == 0.0 {
        0.0
    } else {
        (((px - ax) * dx + (py - ay) * dy) / length_squared).clamp(0.0, 1.0)
    };

    let (cx, cy) = (ax + fraction * dx, ay + fraction * dy);
    (((px - cx).powi(2) + (py - cy).powi(2)).sqrt(), fraction)
}

pub fn interpolate(start: (f64, f64), end: (f64, f64), fraction: f64) -> (f64, f64) {
    (
        start.0 + (end.0 - start.0) * fraction,
        start.1 + (end.1 - start.1) * fraction,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn haversine_of_one_degree_latitude() {
        let distance = haversine_distance(0.0, 0.0, 1.0, 0.0);
        assert!((distance - 111.19).abs() < 0.01, "{distance}");
    }

    #[test]
    fn bounding_box_contains_center() {
        let ((min_lat, min_lon), (max_lat, max_lon)) =
            calculate_bounding_box(54.32, 10.13, 1.0);
        assert!(min_lat < 54.32 && 54.32 < max_lat);
        assert!(min_lon < 10.13 && 10.13 < max_lon);
    }

    #[test]
    fn distance_to_segment_projects_inside() {
        // ~111 m north of the middle of an east-west segment
        let (distance, fraction) =
            distance_to_segment((0.001, 0.005), (0.0, 0.0), (0.0, 0.01));
        assert!((distance - 111.19).abs() < 0.5, "{distance}");
        assert!((fraction - 0.5).abs() < 1e-6);
    }

    #[test]
    fn distance_to_segment_clamps_to_endpoint() {
        let (distance, fraction) =
            distance_to_segment((0.0, -0.001), (0.0, 0.0), (0.0, 0.01));
        assert_eq!(fraction, 0.0);
        assert!((distance - 111.19).abs() < 0.5, "{distance}");
    }

    #[test]
    fn feet_conversion() {
        assert!((meters_to_feet(100.0) - 328.084).abs() < 0.001);
    }
}
