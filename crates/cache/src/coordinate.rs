use crate::error::{ErrorKind, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Slack added on top of the matching tolerance so that coordinates exactly
/// one tolerance apart still match despite floating point rounding.
pub const TOLERANCE_EPSILON: f64 = 1e-10;

/// A validated WGS84 latitude/longitude pair, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Validates and constructs a coordinate.
    ///
    /// # Errors
    /// [`ErrorKind::InvalidCoordinate`] when either value is not finite or the
    /// pair falls outside `[-90, 90]` × `[-180, 180]`.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !valid {
            exn::bail!(ErrorKind::InvalidCoordinate { latitude, longitude });
        }
        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Canonical cache key: both components at 6 decimal places.
    pub fn key(&self) -> String {
        format!("{:.6},{:.6}", self.latitude, self.longitude)
    }

    /// Both components differ by at most `tolerance` (plus [`TOLERANCE_EPSILON`]).
    ///
    /// This is a per-axis box test in degrees, not a geodesic distance.
    pub fn is_within(&self, other: &Coordinate, tolerance: f64) -> bool {
        let limit = tolerance + TOLERANCE_EPSILON;
        (self.latitude - other.latitude).abs() <= limit && (self.longitude - other.longitude).abs() <= limit
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}
