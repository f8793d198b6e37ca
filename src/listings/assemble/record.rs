use crate::listings::domain::{
    Amenity, Coordinates, EnrichedListing, GeoMetrics, Listing, ListingFeatures,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const AMENITY_SEPARATOR: &str = "; ";

/// One flat CSV row; column order is the dataset header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct DatasetRow {
    address: String,
    unit_id: Option<String>,
    price: Option<f64>,
    bedrooms: Option<u8>,
    bathrooms: Option<f32>,
    available_on: Option<NaiveDate>,
    property_management: Option<String>,
    property_management_url: Option<String>,
    remodeled: bool,
    balcony: bool,
    patio: bool,
    parking: bool,
    split_floor_plan: bool,
    parking_cost_yearly: Option<f64>,
    amenities: Option<String>,
    description: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    distance_to_campus_km: Option<f64>,
    walk_time_to_campus_min: Option<f64>,
    noise_score: Option<f64>,
    price_per_bedroom: Option<f64>,
}

impl From<&EnrichedListing> for DatasetRow {
    fn from(record: &EnrichedListing) -> Self {
        let listing = &record.listing;
        let features = &listing.features;
        let amenities = features
            .amenities
            .iter()
            .map(|amenity| amenity.label())
            .collect::<Vec<_>>()
            .join(AMENITY_SEPARATOR);

        Self {
            address: listing.address.clone(),
            unit_id: listing.unit_id.clone(),
            price: listing.price,
            bedrooms: listing.bedrooms,
            bathrooms: listing.bathrooms,
            available_on: listing.available_on,
            property_management: non_empty(&listing.property_management),
            property_management_url: listing.property_management_url.clone(),
            remodeled: features.remodeled,
            balcony: features.balcony,
            patio: features.patio,
            parking: features.parking,
            split_floor_plan: features.split_floor_plan,
            parking_cost_yearly: features.parking_cost_yearly,
            amenities: non_empty(&amenities),
            description: non_empty(&listing.description),
            latitude: record.geo.map(|geo| geo.coordinates.latitude),
            longitude: record.geo.map(|geo| geo.coordinates.longitude),
            distance_to_campus_km: record.distance_to_campus_km(),
            walk_time_to_campus_min: record.walk_time_to_campus_min(),
            noise_score: record.noise_score(),
            price_per_bedroom: record.price_per_bedroom,
        }
    }
}

impl DatasetRow {
    /// Rebuilds the record; a row with only part of the geo columns is `Err`.
    pub(crate) fn into_listing(self) -> Result<EnrichedListing, String> {
        if self.address.trim().is_empty() {
            return Err("address is empty".to_string());
        }

        let geo = match (
            self.latitude,
            self.longitude,
            self.distance_to_campus_km,
            self.walk_time_to_campus_min,
            self.noise_score,
        ) {
            (Some(latitude), Some(longitude), Some(distance), Some(walk), Some(noise)) => {
                Some(GeoMetrics {
                    coordinates: Coordinates::new(latitude, longitude),
                    distance_to_campus_km: distance,
                    walk_time_to_campus_min: walk,
                    noise_score: noise,
                })
            }
            (None, None, None, None, None) => None,
            _ => return Err("geo columns are only partially filled".to_string()),
        };

        let mut amenities = Vec::new();
        for label in self
            .amenities
            .as_deref()
            .unwrap_or_default()
            .split(AMENITY_SEPARATOR.trim())
            .map(str::trim)
            .filter(|label| !label.is_empty())
        {
            let amenity =
                Amenity::from_label(label).ok_or_else(|| format!("unknown amenity '{label}'"))?;
            amenities.push(amenity);
        }

        Ok(EnrichedListing {
            listing: Listing {
                address: self.address,
                unit_id: self.unit_id,
                price: self.price,
                bedrooms: self.bedrooms,
                bathrooms: self.bathrooms,
                available_on: self.available_on,
                property_management: self.property_management.unwrap_or_default(),
                property_management_url: self.property_management_url,
                features: ListingFeatures {
                    remodeled: self.remodeled,
                    balcony: self.balcony,
                    patio: self.patio,
                    parking: self.parking,
                    split_floor_plan: self.split_floor_plan,
                    parking_cost_yearly: self.parking_cost_yearly,
                    amenities,
                },
                description: self.description.unwrap_or_default(),
            },
            geo,
            price_per_bedroom: self.price_per_bedroom,
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}
