use crate::listings::domain::EnrichedListing;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Price,
    PricePerBedroom,
    Bedrooms,
    WalkTime,
    Distance,
    Noise,
    Available,
    Address,
}

impl SortKey {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::Price,
            Self::PricePerBedroom,
            Self::Bedrooms,
            Self::WalkTime,
            Self::Distance,
            Self::Noise,
            Self::Available,
            Self::Address,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Price => "Price",
            Self::PricePerBedroom => "Price per Bedroom",
            Self::Bedrooms => "Bedrooms",
            Self::WalkTime => "Walk Time",
            Self::Distance => "Distance to Campus",
            Self::Noise => "Noise Score",
            Self::Available => "Available Date",
            Self::Address => "Address",
        }
    }

    fn numeric(self, record: &EnrichedListing) -> Option<f64> {
        let listing = &record.listing;
        match self {
            Self::Price => listing.price,
            Self::PricePerBedroom => record.price_per_bedroom,
            Self::Bedrooms => listing.bedrooms.map(f64::from),
            Self::WalkTime => record.walk_time_to_campus_min(),
            Self::Distance => record.distance_to_campus_km(),
            Self::Noise => record.noise_score(),
            Self::Available => listing
                .available_on
                .map(|date| f64::from(chrono::Datelike::num_days_from_ce(&date))),
            Self::Address => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortOrder {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

/// Dashboard controls. Unset controls do not filter; a set control drops records
/// that lack the field it constrains.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    #[serde(deserialize_with = "empty_as_none")]
    pub min_price: Option<f64>,
    #[serde(deserialize_with = "empty_as_none")]
    pub max_price: Option<f64>,
    #[serde(deserialize_with = "comma_list")]
    pub bedrooms: Vec<u8>,
    #[serde(deserialize_with = "comma_list")]
    pub bathrooms: Vec<f32>,
    #[serde(deserialize_with = "empty_as_none")]
    pub max_walk_min: Option<f64>,
    #[serde(deserialize_with = "empty_as_none")]
    pub max_distance_km: Option<f64>,
    #[serde(deserialize_with = "empty_as_none")]
    pub max_noise: Option<f64>,
    pub remodeled: bool,
    pub parking: bool,
    pub balcony_or_patio: bool,
    #[serde(deserialize_with = "empty_as_none")]
    pub available_from: Option<NaiveDate>,
    #[serde(deserialize_with = "empty_as_none")]
    pub available_until: Option<NaiveDate>,
    pub sort: SortKey,
    pub order: SortOrder,
}

impl FilterState {
    pub fn matches(&self, record: &EnrichedListing) -> bool {
        let listing = &record.listing;
        let features = &listing.features;

        within(listing.price, self.min_price, self.max_price)
            && (self.bedrooms.is_empty()
                || listing
                    .bedrooms
                    .is_some_and(|bedrooms| self.bedrooms.contains(&bedrooms)))
            && (self.bathrooms.is_empty()
                || listing.bathrooms.is_some_and(|bathrooms| {
                    self.bathrooms
                        .iter()
                        .any(|wanted| (wanted - bathrooms).abs() < 0.01)
                }))
            && within(record.walk_time_to_campus_min(), None, self.max_walk_min)
            && within(record.distance_to_campus_km(), None, self.max_distance_km)
            && within(record.noise_score(), None, self.max_noise)
            && (!self.remodeled || features.remodeled)
            && (!self.parking || features.parking)
            && (!self.balcony_or_patio || features.balcony || features.patio)
            && within(listing.available_on, self.available_from, self.available_until)
    }

    /// Total order for table rows: the chosen key, absent values last in either
    /// direction, then `(address, unit_id)`.
    pub fn compare(&self, a: &EnrichedListing, b: &EnrichedListing) -> Ordering {
        let primary = match self.sort {
            SortKey::Address => self.order.apply(a.listing.address.cmp(&b.listing.address)),
            key => match (key.numeric(a), key.numeric(b)) {
                (Some(left), Some(right)) => self.order.apply(left.total_cmp(&right)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        };

        primary.then_with(|| {
            (&a.listing.address, &a.listing.unit_id).cmp(&(&b.listing.address, &b.listing.unit_id))
        })
    }
}

fn within<T: PartialOrd>(value: Option<T>, min: Option<T>, max: Option<T>) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    let Some(value) = value else {
        return false;
    };
    min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
}

fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|err| serde::de::Error::custom(format!("'{value}': {err}")))
        })
        .transpose()
}

fn comma_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|err| serde::de::Error::custom(format!("'{value}': {err}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::domain::{Coordinates, GeoMetrics, Listing};

    fn record(price: Option<f64>, bedrooms: Option<u8>, walk: Option<f64>) -> EnrichedListing {
        let mut listing = Listing::new("6512 Segovia Rd");
        listing.price = price;
        listing.bedrooms = bedrooms;
        EnrichedListing {
            listing,
            geo: walk.map(|walk| GeoMetrics {
                coordinates: Coordinates::new(34.41, -119.86),
                distance_to_campus_km: walk / 12.0,
                walk_time_to_campus_min: walk,
                noise_score: 6.0,
            }),
            price_per_bedroom: None,
        }
    }

    #[test]
    fn unset_filter_keeps_everything() {
        let filter = FilterState::default();
        assert!(filter.matches(&record(None, None, None)));
        assert!(filter.matches(&record(Some(9000.0), Some(6), Some(45.0))));
    }

    #[test]
    fn set_filters_drop_records_missing_the_field() {
        let filter = FilterState {
            max_walk_min: Some(15.0),
            ..FilterState::default()
        };
        assert!(filter.matches(&record(None, None, Some(10.0))));
        assert!(!filter.matches(&record(None, None, Some(20.0))));
        assert!(!filter.matches(&record(None, None, None)));

        let filter = FilterState {
            min_price: Some(2500.0),
            max_price: Some(3500.0),
            bedrooms: vec![2, 3],
            ..FilterState::default()
        };
        assert!(filter.matches(&record(Some(3000.0), Some(2), None)));
        assert!(!filter.matches(&record(Some(3000.0), Some(4), None)));
        assert!(!filter.matches(&record(None, Some(2), None)));
        assert!(!filter.matches(&record(Some(3600.0), Some(3), None)));
    }

    #[test]
    fn feature_flags_require_the_feature() {
        let mut with_patio = record(Some(3000.0), Some(2), None);
        with_patio.listing.features.patio = true;
        let filter = FilterState {
            balcony_or_patio: true,
            ..FilterState::default()
        };
        assert!(filter.matches(&with_patio));
        assert!(!filter.matches(&record(Some(3000.0), Some(2), None)));
    }

    #[test]
    fn absent_sort_values_go_last_in_both_directions() {
        let cheap = record(Some(2000.0), Some(1), None);
        let pricey = record(Some(4000.0), Some(1), None);
        let unknown = record(None, Some(1), None);

        for order in [SortOrder::Ascending, SortOrder::Descending] {
            let filter = FilterState {
                sort: SortKey::Price,
                order,
                ..FilterState::default()
            };
            let mut rows = vec![&unknown, &pricey, &cheap];
            rows.sort_by(|a, b| filter.compare(a, b));
            assert_eq!(rows[2].listing.price, None, "{order:?}");
            let expected_first = match order {
                SortOrder::Ascending => Some(2000.0),
                SortOrder::Descending => Some(4000.0),
            };
            assert_eq!(rows[0].listing.price, expected_first);
        }
    }

    #[test]
    fn parses_query_style_values() {
        let filter: FilterState = serde_json::from_value(serde_json::json!({
            "min_price": "2000",
            "max_price": "",
            "bedrooms": "2, 3",
            "bathrooms": "1.5",
            "available_from": "2026-06-01",
            "sort": "walk_time",
            "order": "desc",
        }))
        .expect("filter parses");

        assert_eq!(filter.min_price, Some(2000.0));
        assert_eq!(filter.max_price, None);
        assert_eq!(filter.bedrooms, vec![2, 3]);
        assert_eq!(filter.bathrooms, vec![1.5]);
        assert_eq!(filter.available_from, NaiveDate::from_ymd_opt(2026, 6, 1));
        assert_eq!(filter.sort, SortKey::WalkTime);
        assert_eq!(filter.order, SortOrder::Descending);
    }

    #[test]
    fn sort_labels_are_distinct() {
        let labels: std::collections::HashSet<_> =
            SortKey::ordered().into_iter().map(SortKey::label).collect();
        assert_eq!(labels.len(), SortKey::ordered().len());
    }
}
