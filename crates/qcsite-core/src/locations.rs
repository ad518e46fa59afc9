//! Candidate warehouse locations.
//!
//! The registry is fixed for the lifetime of the process: it is built once
//! at startup, either from the built-in list or from a YAML file, and is
//! never mutated afterwards.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A named candidate geography evaluated for warehouse placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Unique key across the registry (compared case-insensitively).
    pub name: String,
    pub city: String,
    pub state: String,
    pub coordinates: Coordinates,
}

impl Location {
    #[must_use]
    pub fn new(name: &str, city: &str, state: &str, lat: f64, lng: f64) -> Self {
        Self {
            name: name.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            coordinates: Coordinates { lat, lng },
        }
    }
}

/// The ordered, validated set of locations a collection cycle walks.
#[derive(Debug, Clone)]
pub struct LocationRegistry {
    locations: Vec<Location>,
}

impl LocationRegistry {
    /// Builds a registry, rejecting empty lists, blank or duplicate names,
    /// and coordinates outside the valid lat/lng range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] describing the first violation.
    pub fn new(locations: Vec<Location>) -> Result<Self, ConfigError> {
        validate_locations(&locations)?;
        Ok(Self { locations })
    }

    /// Registry order is the order a cycle visits locations in.
    #[must_use]
    pub fn iter(&self) -> std::slice::Iter<'_, Location> {
        self.locations.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Case-insensitive lookup by location name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Location> {
        let name = name.trim();
        self.locations
            .iter()
            .find(|loc| loc.name.eq_ignore_ascii_case(name))
    }
}

impl Default for LocationRegistry {
    fn default() -> Self {
        Self {
            locations: default_locations(),
        }
    }
}

impl<'a> IntoIterator for &'a LocationRegistry {
    type Item = &'a Location;
    type IntoIter = std::slice::Iter<'a, Location>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// The built-in registry of nine cities across Indian states.
#[must_use]
pub fn default_locations() -> Vec<Location> {
    vec![
        Location::new("Nellore", "Nellore", "Andhra Pradesh", 14.4426, 79.9865),
        Location::new("Guntur", "Guntur", "Andhra Pradesh", 16.2991, 80.4575),
        Location::new("Vijayawada", "Vijayawada", "Andhra Pradesh", 16.5062, 80.6480),
        Location::new(
            "Visakhapatnam",
            "Visakhapatnam",
            "Andhra Pradesh",
            17.6868,
            83.2185,
        ),
        Location::new("Hyderabad", "Hyderabad", "Telangana", 17.3850, 78.4867),
        Location::new("Bangalore", "Bangalore", "Karnataka", 12.9716, 77.5946),
        Location::new("Chennai", "Chennai", "Tamil Nadu", 13.0827, 80.2707),
        Location::new("Mumbai", "Mumbai", "Maharashtra", 19.0760, 72.8777),
        Location::new("Delhi", "Delhi", "Delhi", 28.7041, 77.1025),
    ]
}

#[derive(Debug, Deserialize)]
struct LocationsFile {
    locations: Vec<Location>,
}

/// Load and validate a location registry from a YAML file.
///
/// ```yaml
/// locations:
///   - name: Nellore
///     city: Nellore
///     state: Andhra Pradesh
///     coordinates: { lat: 14.4426, lng: 79.9865 }
/// ```
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_locations(path: &Path) -> Result<LocationRegistry, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LocationsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_locations(&content)
}

fn parse_locations(content: &str) -> Result<LocationRegistry, ConfigError> {
    let file: LocationsFile = serde_yaml::from_str(content)?;
    LocationRegistry::new(file.locations)
}

fn validate_locations(locations: &[Location]) -> Result<(), ConfigError> {
    if locations.is_empty() {
        return Err(ConfigError::Validation(
            "location registry must contain at least one location".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();

    for location in locations {
        if location.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "location name must be non-empty".to_string(),
            ));
        }

        let Coordinates { lat, lng } = location.coordinates;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(ConfigError::Validation(format!(
                "location '{}' has out-of-range coordinates ({lat}, {lng})",
                location.name
            )));
        }

        if !seen_names.insert(location.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate location name: '{}'",
                location.name
            )));
        }
    }

    Ok(())
}
