//! Named bounding boxes for the regions the logger covers.

use serde::Serialize;

use crate::error::{MassError, Result};
use crate::BoundingBox;

/// A named region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct City {
    pub name: &'static str,
    pub bounds: BoundingBox,
}

const fn city(name: &'static str, min_lat: f64, max_lat: f64, min_lng: f64, max_lng: f64) -> City {
    City {
        name,
        bounds: BoundingBox {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        },
    }
}

/// Built-in presets.
pub const PRESETS: &[City] = &[
    city("world", -90.0, 90.0, -180.0, 180.0),
    city("germany", 47.2, 55.1, 5.9, 15.2),
    city("hamburg", 53.3, 53.8, 9.6, 10.35),
    city("berlin", 52.3, 52.7, 13.0, 13.8),
    city("brussels", 50.8, 50.9, 4.3, 4.4),
    city("zurich", 47.3, 47.4, 8.5, 8.6),
    city("cologne", 50.82, 51.02, 6.75, 7.16),
    city("munich", 48.05, 48.25, 11.45, 11.65),
];

impl City {
    /// Look up a preset by name, case-insensitively.
    ///
    /// # Example
    /// ```
    /// use critmass::City;
    /// let hh = City::preset("Hamburg").unwrap();
    /// assert!(hh.bounds.contains(53.55, 9.99));
    /// ```
    pub fn preset(name: &str) -> Result<City> {
        PRESETS
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .copied()
            .ok_or_else(|| MassError::UnknownCity {
                name: name.to_string(),
                available: City::names().join(", "),
            })
    }

    /// Preset names, sorted.
    pub fn names() -> Vec<&'static str> {
        let mut names: Vec<&'static str> = PRESETS.iter().map(|c| c.name).collect();
        names.sort_unstable();
        names
    }
}
