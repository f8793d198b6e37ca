use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// WGS84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Amenity {
    FreeInternet,
    WaterTrashIncluded,
    InUnitLaundry,
    GasIncluded,
}

impl Amenity {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::FreeInternet,
            Self::WaterTrashIncluded,
            Self::InUnitLaundry,
            Self::GasIncluded,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FreeInternet => "Free Internet",
            Self::WaterTrashIncluded => "Water/Trash Included",
            Self::InUnitLaundry => "In-Unit Washer/Dryer",
            Self::GasIncluded => "Gas Included",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ordered()
            .into_iter()
            .find(|amenity| amenity.label().eq_ignore_ascii_case(label))
    }
}

/// Flags and extras advertised next to a unit's price.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingFeatures {
    pub remodeled: bool,
    pub balcony: bool,
    pub patio: bool,
    pub parking: bool,
    pub split_floor_plan: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parking_cost_yearly: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub amenities: Vec<Amenity>,
}

/// One rentable unit (or whole property) found in a source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub address: String,
    pub unit_id: Option<String>,
    pub price: Option<f64>,
    pub bedrooms: Option<u8>,
    pub bathrooms: Option<f32>,
    pub available_on: Option<NaiveDate>,
    pub property_management: String,
    pub property_management_url: Option<String>,
    pub features: ListingFeatures,
    pub description: String,
}

impl Listing {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            unit_id: None,
            price: None,
            bedrooms: None,
            bathrooms: None,
            available_on: None,
            property_management: String::new(),
            property_management_url: None,
            features: ListingFeatures::default(),
            description: String::new(),
        }
    }

    pub fn key(&self) -> ListingKey {
        ListingKey {
            address: self.address.clone(),
            unit_id: self.unit_id.clone(),
        }
    }
}

/// Dataset identity of a listing. `None` units order before any unit id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListingKey {
    pub address: String,
    pub unit_id: Option<String>,
}

/// Geospatial fields that exist only together with coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoMetrics {
    pub coordinates: Coordinates,
    pub distance_to_campus_km: f64,
    pub walk_time_to_campus_min: f64,
    pub noise_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedListing {
    pub listing: Listing,
    pub geo: Option<GeoMetrics>,
    pub price_per_bedroom: Option<f64>,
}

impl EnrichedListing {
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.geo.map(|geo| geo.coordinates)
    }

    pub fn distance_to_campus_km(&self) -> Option<f64> {
        self.geo.map(|geo| geo.distance_to_campus_km)
    }

    pub fn walk_time_to_campus_min(&self) -> Option<f64> {
        self.geo.map(|geo| geo.walk_time_to_campus_min)
    }

    pub fn noise_score(&self) -> Option<f64> {
        self.geo.map(|geo| geo.noise_score)
    }
}
