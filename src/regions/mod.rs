//! Region name to map-center coordinate lookup.
//!
//! Consumed by the presentation layer to center the zoomed map on a
//! picked state; never consulted by the retrieval flow.

/// Longitude/latitude pair for centering a region on the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

/// Center of the contiguous United States; used for unrecognized names.
pub const DEFAULT_CENTER: Coordinates = Coordinates {
    longitude: -95.7129,
    latitude: 37.0902,
};

/// Look up the map center for a region name.
///
/// Unrecognized names fall back to [`DEFAULT_CENTER`] rather than
/// failing; a missing entry only degrades the zoom, not the session.
pub fn lookup(region: &str) -> Coordinates {
    let (longitude, latitude) = match region {
        "California" => (-119.4179, 36.7783),
        "New York" => (-75.0152, 43.2994),
        "Texas" => (-99.9018, 31.9686),
        "Florida" => (-81.5158, 27.6648),
        "Illinois" => (-89.3985, 40.6331),
        "Washington" => (-120.7401, 47.7511),
        "Pennsylvania" => (-77.1945, 41.2033),
        "Ohio" => (-82.7755, 40.4173),
        "Michigan" => (-84.5603, 44.3148),
        _ => return DEFAULT_CENTER,
    };

    Coordinates {
        longitude,
        latitude,
    }
}
