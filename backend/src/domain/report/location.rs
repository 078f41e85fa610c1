//! Geographic coordinates attached to reports.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ReportValidationError;

/// Latitude/longitude pair in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "RawPoint", into = "RawPoint")]
pub struct GeoPoint {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawPoint {
    lat: f64,
    lng: f64,
}

impl GeoPoint {
    /// Validate and construct a point.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::GeoPoint;
    ///
    /// let point = GeoPoint::new(12.97, 77.59).expect("valid coordinates");
    /// assert_eq!(point.lat(), 12.97);
    /// assert!(GeoPoint::new(91.0, 0.0).is_err());
    /// ```
    pub fn new(lat: f64, lng: f64) -> Result<Self, ReportValidationError> {
        let lat_ok = lat.is_finite() && (-90.0..=90.0).contains(&lat);
        let lng_ok = lng.is_finite() && (-180.0..=180.0).contains(&lng);
        if !(lat_ok && lng_ok) {
            return Err(ReportValidationError::InvalidCoordinates { lat, lng });
        }
        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    /// Planar distance in raw degrees.
    pub fn degree_distance(&self, other: &GeoPoint) -> f64 {
        (self.lat - other.lat).hypot(self.lng - other.lng)
    }

    /// Coordinate label used wherever a street address is unavailable.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::GeoPoint;
    ///
    /// let point = GeoPoint::new(12.5, -0.25).expect("valid coordinates");
    /// assert_eq!(point.coordinate_label(), "Location: 12.500000, -0.250000");
    /// ```
    pub fn coordinate_label(&self) -> String {
        format!("Location: {:.6}, {:.6}", self.lat, self.lng)
    }
}

impl TryFrom<RawPoint> for GeoPoint {
    type Error = ReportValidationError;

    fn try_from(value: RawPoint) -> Result<Self, Self::Error> {
        Self::new(value.lat, value.lng)
    }
}

impl From<GeoPoint> for RawPoint {
    fn from(value: GeoPoint) -> Self {
        Self {
            lat: value.lat,
            lng: value.lng,
        }
    }
}

/// Point plus the human-readable address shown to citizens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Location {
    #[serde(flatten)]
    pub point: GeoPoint,
    pub address: String,
}
