//! Listing pipeline stages, from document text to dashboard views.

pub mod assemble;
pub mod dashboard;
pub mod domain;
pub mod enrich;
pub mod extract;
pub mod geocode;

pub use domain::{
    Amenity, Coordinates, EnrichedListing, GeoMetrics, Listing, ListingFeatures, ListingKey,
};
