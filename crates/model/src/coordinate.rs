use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::geo;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True if both axes differ by at most `epsilon` degrees.
    pub fn equal_dx_dy(&self, other: &Coordinate, epsilon: f64) -> bool {
        (self.latitude - other.latitude).abs() <= epsilon
            && (self.longitude - other.longitude).abs() <= epsilon
    }

    pub fn distance_m(&self, other: &Coordinate) -> f64 {
        geo::haversine_distance(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        ) * 1000.0
    }

    pub(crate) fn as_tuple(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}

/// Axis aligned rectangle in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeoRect {
    pub min: Coordinate,
    pub max: Coordinate,
}

impl GeoRect {
    /// Smallest rect containing all points, `None` for an empty iterator.
    pub fn bounding<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut rect = GeoRect {
            min: *first,
            max: *first,
        };
        for point in points {
            rect.add(point);
        }
        Some(rect)
    }

    /// Rect containing every point within `radius_m` of `center`.
    pub fn around(center: &Coordinate, radius_m: f64) -> Self {
        let (min, max) = geo::calculate_bounding_box(
            center.latitude,
            center.longitude,
            radius_m / 1000.0,
        );
        GeoRect {
            min: min.into(),
            max: max.into(),
        }
    }

    pub fn add(&mut self, point: &Coordinate) {
        self.min.latitude = self.min.latitude.min(point.latitude);
        self.min.longitude = self.min.longitude.min(point.longitude);
        self.max.latitude = self.max.latitude.max(point.latitude);
        self.max.longitude = self.max.longitude.max(point.longitude);
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min.latitude + self.max.latitude) / 2.0,
            (self.min.longitude + self.max.longitude) / 2.0,
        )
    }

    /// Scales the rect around its center.
    pub fn scaled(&self, factor: f64) -> Self {
        let center = self.center();
        let half_lat = (self.max.latitude - self.min.latitude) / 2.0 * factor;
        let half_lon = (self.max.longitude - self.min.longitude) / 2.0 * factor;
        GeoRect {
            min: Coordinate::new(center.latitude - half_lat, center.longitude - half_lon),
            max: Coordinate::new(center.latitude + half_lat, center.longitude + half_lon),
        }
    }

    pub fn intersects(&self, other: &GeoRect) -> bool {
        self.min.latitude <= other.max.latitude
            && other.min.latitude <= self.max.latitude
            && self.min.longitude <= other.max.longitude
            && other.min.longitude <= self.max.longitude
    }
}
