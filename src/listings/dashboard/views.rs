use super::filter::{FilterState, SortKey};
use crate::listings::domain::{Coordinates, EnrichedListing};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBand {
    UnderBudget,
    Moderate,
    Premium,
    Unknown,
}

impl PriceBand {
    pub const MODERATE_FROM: f64 = 2800.0;
    pub const PREMIUM_FROM: f64 = 3500.0;

    pub fn for_price(price: Option<f64>) -> Self {
        match price {
            Some(price) if price < Self::MODERATE_FROM => Self::UnderBudget,
            Some(price) if price < Self::PREMIUM_FROM => Self::Moderate,
            Some(_) => Self::Premium,
            None => Self::Unknown,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::UnderBudget => "Under $2,800",
            Self::Moderate => "$2,800 to $3,499",
            Self::Premium => "$3,500 and up",
            Self::Unknown => "Price unavailable",
        }
    }

    pub const fn color(self) -> &'static str {
        match self {
            Self::UnderBudget => "green",
            Self::Moderate => "orange",
            Self::Premium => "red",
            Self::Unknown => "gray",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MarkerView {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub price: Option<f64>,
    pub bedrooms: Option<u8>,
    pub price_band: PriceBand,
    pub price_band_label: &'static str,
    pub color: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingRow {
    pub address: String,
    pub unit_id: Option<String>,
    pub price: Option<f64>,
    pub bedrooms: Option<u8>,
    pub bathrooms: Option<f32>,
    pub available_on: Option<NaiveDate>,
    pub price_per_bedroom: Option<f64>,
    pub distance_to_campus_km: Option<f64>,
    pub walk_time_to_campus_min: Option<f64>,
    pub noise_score: Option<f64>,
    pub remodeled: bool,
    pub parking: bool,
    pub balcony: bool,
    pub patio: bool,
    pub amenities: Vec<&'static str>,
    pub property_management: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_management_url: Option<String>,
}

impl From<&EnrichedListing> for ListingRow {
    fn from(record: &EnrichedListing) -> Self {
        let listing = &record.listing;
        Self {
            address: listing.address.clone(),
            unit_id: listing.unit_id.clone(),
            price: listing.price,
            bedrooms: listing.bedrooms,
            bathrooms: listing.bathrooms,
            available_on: listing.available_on,
            price_per_bedroom: record.price_per_bedroom,
            distance_to_campus_km: record.distance_to_campus_km(),
            walk_time_to_campus_min: record.walk_time_to_campus_min(),
            noise_score: record.noise_score(),
            remodeled: listing.features.remodeled,
            parking: listing.features.parking,
            balcony: listing.features.balcony,
            patio: listing.features.patio,
            amenities: listing
                .features
                .amenities
                .iter()
                .map(|amenity| amenity.label())
                .collect(),
            property_management: listing.property_management.clone(),
            property_management_url: listing.property_management_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub listings: usize,
    pub buildings: usize,
    pub average_price: Option<f64>,
    pub average_walk_time_min: Option<f64>,
    pub average_noise_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

/// One listing in a price scatter plot; `x` depends on the series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_id: Option<String>,
    pub x: f64,
    pub price: f64,
    pub bedrooms: Option<u8>,
    pub noise_score: f64,
    pub walk_time_to_campus_min: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub price_histogram: Vec<HistogramBin>,
    pub bedrooms: Vec<CategoryCount>,
    pub availability_by_month: Vec<CategoryCount>,
    /// `x` is the noise score.
    pub noise_vs_price: Vec<ScatterPoint>,
    /// `x` is the distance to campus in kilometres.
    pub distance_vs_price: Vec<ScatterPoint>,
}

/// Fixed map features drawn under the listing markers.
#[derive(Debug, Clone, Serialize)]
pub struct MapReference {
    pub center: Coordinates,
    pub campus: Coordinates,
    pub noise_corridor: Vec<Coordinates>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub filter: FilterState,
    pub total_listings: usize,
    pub summary: SummaryMetrics,
    pub markers: Vec<MarkerView>,
    pub rows: Vec<ListingRow>,
    pub charts: ChartSeries,
    pub map: MapReference,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SortOption {
    pub key: SortKey,
    pub label: &'static str,
}

/// Control ranges derived from the whole dataset, independent of any filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub bedrooms: Vec<u8>,
    pub bathrooms: Vec<f32>,
    pub earliest_available: Option<NaiveDate>,
    pub latest_available: Option<NaiveDate>,
    pub sort_keys: Vec<SortOption>,
}
