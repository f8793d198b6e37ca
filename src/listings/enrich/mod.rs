pub mod geometry;
pub mod reference;

use crate::listings::domain::{Coordinates, EnrichedListing, GeoMetrics, Listing};
use crate::listings::geocode::{GeocodeCache, Geocoder};
use geometry::{distance_to_polyline_m, haversine_km, is_valid, round_to};
use reference::{
    DEL_PLAYA_DRIVE, MAX_NOISE_SCORE, NOISE_HALF_DISTANCE_M, UCSB_CAMPUS, WALKING_SPEED_KMH,
};
use tracing::debug;

/// Derives distance, walk time, noise and price-per-bedroom for listings.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricEnricher {
    campus: Coordinates,
    noise_corridor: Vec<Coordinates>,
    walking_speed_kmh: f64,
}

impl Default for MetricEnricher {
    fn default() -> Self {
        Self::new(UCSB_CAMPUS, DEL_PLAYA_DRIVE.to_vec())
    }
}

impl MetricEnricher {
    pub fn new(campus: Coordinates, noise_corridor: Vec<Coordinates>) -> Self {
        Self {
            campus,
            noise_corridor,
            walking_speed_kmh: WALKING_SPEED_KMH,
        }
    }

    /// Looks the address up through the run's cache, then derives every metric.
    pub fn enrich<G: Geocoder>(
        &self,
        listing: Listing,
        cache: &mut GeocodeCache<G>,
    ) -> EnrichedListing {
        let coordinates = cache.lookup(&listing.address);
        self.derive(listing, coordinates)
    }

    /// Pure part of enrichment: no lookups, same inputs give the same record.
    pub fn derive(&self, listing: Listing, coordinates: Option<Coordinates>) -> EnrichedListing {
        let geo = coordinates.and_then(|point| self.geo_metrics(point));
        let price_per_bedroom = price_per_bedroom(listing.price, listing.bedrooms);

        debug!(
            address = %listing.address,
            geocoded = geo.is_some(),
            ?price_per_bedroom,
            "enriched listing"
        );

        EnrichedListing {
            listing,
            geo,
            price_per_bedroom,
        }
    }

    pub fn geo_metrics(&self, point: Coordinates) -> Option<GeoMetrics> {
        if !is_valid(point) {
            return None;
        }

        let distance_km = haversine_km(point, self.campus);
        let corridor_m = distance_to_polyline_m(point, &self.noise_corridor);

        Some(GeoMetrics {
            coordinates: point,
            distance_to_campus_km: round_to(distance_km, 3),
            walk_time_to_campus_min: round_to(distance_km / self.walking_speed_kmh * 60.0, 1),
            noise_score: noise_score(corridor_m),
        })
    }
}

/// `10 × 250 / (250 + d)` for a corridor distance `d` in metres, one decimal.
pub fn noise_score(distance_m: f64) -> f64 {
    if !distance_m.is_finite() {
        return 0.0;
    }
    let distance_m = distance_m.max(0.0);
    let raw = MAX_NOISE_SCORE * NOISE_HALF_DISTANCE_M / (NOISE_HALF_DISTANCE_M + distance_m);
    round_to(raw, 1)
}

pub fn price_per_bedroom(price: Option<f64>, bedrooms: Option<u8>) -> Option<f64> {
    match (price, bedrooms) {
        (Some(price), Some(bedrooms)) if price.is_finite() && bedrooms > 0 => {
            Some(round_to(price / f64::from(bedrooms), 2))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::geocode::{GeocodeError, RetryPolicy};

    fn listing(price: Option<f64>, bedrooms: Option<u8>) -> Listing {
        let mut listing = Listing::new("742 Del Playa Dr");
        listing.price = price;
        listing.bedrooms = bedrooms;
        listing
    }

    #[test]
    fn noise_score_anchors() {
        assert_eq!(noise_score(0.0), 10.0);
        assert_eq!(noise_score(250.0), 5.0);
        assert_eq!(noise_score(2000.0), 1.1);
        assert_eq!(noise_score(f64::INFINITY), 0.0);
        assert!(noise_score(100.0) > noise_score(400.0));
    }

    #[test]
    fn price_per_bedroom_requires_valid_inputs() {
        assert_eq!(price_per_bedroom(Some(3500.0), Some(2)), Some(1750.0));
        assert_eq!(price_per_bedroom(Some(3500.0), Some(3)), Some(1166.67));
        assert_eq!(price_per_bedroom(Some(3500.0), Some(0)), None);
        assert_eq!(price_per_bedroom(None, Some(2)), None);
        assert_eq!(price_per_bedroom(Some(f64::NAN), Some(2)), None);
        assert_eq!(price_per_bedroom(Some(2000.0), None), None);
    }

    #[test]
    fn geo_fields_are_all_or_nothing() {
        let enricher = MetricEnricher::default();

        let absent = enricher.derive(listing(Some(3500.0), Some(3)), None);
        assert!(absent.geo.is_none());
        assert!(absent.price_per_bedroom.is_some());

        let invalid = enricher.derive(
            listing(Some(3500.0), Some(3)),
            Some(Coordinates::new(f64::NAN, -119.86)),
        );
        assert!(invalid.geo.is_none());

        let present = enricher.derive(listing(None, Some(3)), Some(DEL_PLAYA_DRIVE[1]));
        let geo = present.geo.expect("coordinates produce metrics");
        assert_eq!(geo.coordinates, DEL_PLAYA_DRIVE[1]);
        assert_eq!(geo.noise_score, 10.0);
        assert!(geo.distance_to_campus_km > 0.5 && geo.distance_to_campus_km < 1.5);
        assert!(geo.walk_time_to_campus_min > 0.0);
        assert!(present.price_per_bedroom.is_none());
    }

    #[test]
    fn street_front_is_louder_than_two_km_inland() {
        let enricher = MetricEnricher::default();
        let on_del_playa = enricher
            .geo_metrics(DEL_PLAYA_DRIVE[2])
            .expect("valid point");
        // Roughly 2 km north of the corridor.
        let inland = enricher
            .geo_metrics(Coordinates::new(34.4280, -119.8650))
            .expect("valid point");

        assert!(on_del_playa.noise_score > inland.noise_score);
        assert!(inland.noise_score <= 1.5, "got {}", inland.noise_score);
    }

    #[test]
    fn walk_time_is_distance_at_five_kmh() {
        let enricher = MetricEnricher::default();
        let geo = enricher
            .geo_metrics(Coordinates::new(34.4140, -119.8489 - 0.0109))
            .expect("valid point");
        let expected = round_to(geo.distance_to_campus_km / 5.0 * 60.0, 1);
        assert!((geo.walk_time_to_campus_min - expected).abs() <= 0.1);
    }

    #[derive(Debug)]
    struct FixedGeocoder(Option<Coordinates>);

    impl Geocoder for FixedGeocoder {
        fn geocode(&self, _query: &str) -> Result<Option<Coordinates>, GeocodeError> {
            Ok(self.0)
        }
    }

    #[test]
    fn enrich_goes_through_the_cache() {
        let enricher = MetricEnricher::default();
        let mut cache = GeocodeCache::new(FixedGeocoder(Some(DEL_PLAYA_DRIVE[0])), RetryPolicy::none());

        let first = enricher.enrich(listing(Some(3000.0), Some(2)), &mut cache);
        let second = enricher.enrich(listing(Some(3100.0), Some(2)), &mut cache);

        assert!(first.geo.is_some());
        assert_eq!(first.geo, second.geo);
        assert_eq!(cache.stats().provider_calls, 1);
    }
}
