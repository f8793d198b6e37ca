//! Read-only view state for the listings dashboard.
//!
//! Everything here is a pure function of the loaded dataset and a [`FilterState`]:
//! the HTTP layer parses the filter, calls [`build_view`], and serializes the result.

pub mod filter;
pub mod views;

pub use filter::{FilterState, SortKey, SortOrder};
pub use views::{
    CategoryCount, ChartSeries, DashboardView, FilterOptions, HistogramBin, ListingRow,
    MapReference, MarkerView, PriceBand, ScatterPoint, SortOption, SummaryMetrics,
};

use crate::listings::domain::{Coordinates, EnrichedListing};
use crate::listings::enrich::reference::{DEL_PLAYA_DRIVE, UCSB_CAMPUS};
use crate::listings::extract::normalize_address;
use chrono::Datelike;
use std::collections::{BTreeMap, HashSet};

/// Width of a price histogram bin in dollars.
pub const PRICE_BIN_WIDTH: f64 = 250.0;

pub const MAX_PRICE_BINS: usize = 30;

pub const MAP_CENTER: Coordinates = Coordinates::new(34.4133, -119.8550);

/// Records passing `filter`, in table order.
pub fn select<'a>(dataset: &'a [EnrichedListing], filter: &FilterState) -> Vec<&'a EnrichedListing> {
    let mut selected: Vec<&EnrichedListing> = dataset
        .iter()
        .filter(|record| filter.matches(record))
        .collect();
    selected.sort_by(|a, b| filter.compare(a, b));
    selected
}

pub fn build_view(dataset: &[EnrichedListing], filter: &FilterState) -> DashboardView {
    let selected = select(dataset, filter);

    DashboardView {
        filter: filter.clone(),
        total_listings: dataset.len(),
        summary: summarize(&selected),
        markers: selected.iter().filter_map(|record| marker(record)).collect(),
        rows: selected.iter().map(|record| ListingRow::from(*record)).collect(),
        charts: ChartSeries {
            price_histogram: price_histogram(&selected),
            bedrooms: bedroom_counts(&selected),
            availability_by_month: availability_by_month(&selected),
            noise_vs_price: scatter(&selected, EnrichedListing::noise_score),
            distance_vs_price: scatter(&selected, EnrichedListing::distance_to_campus_km),
        },
        map: MapReference {
            center: MAP_CENTER,
            campus: UCSB_CAMPUS,
            noise_corridor: DEL_PLAYA_DRIVE.to_vec(),
        },
    }
}

pub fn filter_options(dataset: &[EnrichedListing]) -> FilterOptions {
    let prices: Vec<f64> = dataset
        .iter()
        .filter_map(|record| record.listing.price)
        .filter(|price| price.is_finite())
        .collect();

    let mut bedrooms: Vec<u8> = dataset
        .iter()
        .filter_map(|record| record.listing.bedrooms)
        .collect();
    bedrooms.sort_unstable();
    bedrooms.dedup();

    let mut bathrooms: Vec<f32> = dataset
        .iter()
        .filter_map(|record| record.listing.bathrooms)
        .filter(|bathrooms| bathrooms.is_finite())
        .collect();
    bathrooms.sort_by(f32::total_cmp);
    bathrooms.dedup();

    let dates = dataset.iter().filter_map(|record| record.listing.available_on);

    FilterOptions {
        min_price: prices.iter().copied().reduce(f64::min),
        max_price: prices.iter().copied().reduce(f64::max),
        bedrooms,
        bathrooms,
        earliest_available: dates.clone().min(),
        latest_available: dates.max(),
        sort_keys: SortKey::ordered()
            .into_iter()
            .map(|key| SortOption {
                key,
                label: key.label(),
            })
            .collect(),
    }
}

fn marker(record: &EnrichedListing) -> Option<MarkerView> {
    let coordinates = record.coordinates()?;
    let band = PriceBand::for_price(record.listing.price);
    Some(MarkerView {
        address: record.listing.address.clone(),
        unit_id: record.listing.unit_id.clone(),
        latitude: coordinates.latitude,
        longitude: coordinates.longitude,
        price: record.listing.price,
        bedrooms: record.listing.bedrooms,
        price_band: band,
        price_band_label: band.label(),
        color: band.color(),
    })
}

fn summarize(selected: &[&EnrichedListing]) -> SummaryMetrics {
    let buildings = selected
        .iter()
        .map(|record| normalize_address(&record.listing.address))
        .collect::<HashSet<_>>()
        .len();

    SummaryMetrics {
        listings: selected.len(),
        buildings,
        average_price: mean(selected.iter().filter_map(|record| record.listing.price)),
        average_walk_time_min: mean(
            selected
                .iter()
                .filter_map(|record| record.walk_time_to_campus_min()),
        ),
        average_noise_score: mean(selected.iter().filter_map(|record| record.noise_score())),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .filter(|value| value.is_finite())
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Contiguous bins from the cheapest to the most expensive selected listing.
///
/// Bins are [`PRICE_BIN_WIDTH`] wide until the range needs more than
/// [`MAX_PRICE_BINS`] of them; wider ranges use a multiple of that width instead.
fn price_histogram(selected: &[&EnrichedListing]) -> Vec<HistogramBin> {
    let prices: Vec<f64> = selected
        .iter()
        .filter_map(|record| record.listing.price)
        .filter(|price| price.is_finite())
        .collect();
    let (Some(min), Some(max)) = (
        prices.iter().copied().reduce(f64::min),
        prices.iter().copied().reduce(f64::max),
    ) else {
        return Vec::new();
    };

    let span = (max - (min / PRICE_BIN_WIDTH).floor() * PRICE_BIN_WIDTH) / PRICE_BIN_WIDTH;
    let needed = span.floor() + 1.0;
    let width = if needed <= MAX_PRICE_BINS as f64 {
        PRICE_BIN_WIDTH
    } else {
        // One bin of slack for the lower edge moving down to a multiple of the new width.
        PRICE_BIN_WIDTH * (needed / (MAX_PRICE_BINS - 1) as f64).ceil()
    };
    let start = (min / width).floor() * width;
    let len = (((max - start) / width).floor() as usize)
        .saturating_add(1)
        .min(MAX_PRICE_BINS);

    let mut counts = vec![0usize; len];
    for price in prices {
        let index = (((price - start) / width).floor() as usize).min(len - 1);
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(index, count)| HistogramBin {
            lower: start + index as f64 * width,
            upper: start + (index + 1) as f64 * width,
            count,
        })
        .collect()
}

/// Selected listings with both a price and geo metrics, plotted against `axis`.
fn scatter(selected: &[&EnrichedListing], axis: fn(&EnrichedListing) -> Option<f64>) -> Vec<ScatterPoint> {
    selected
        .iter()
        .filter_map(|record| {
            let price = record.listing.price.filter(|price| price.is_finite())?;
            let x = axis(record).filter(|x| x.is_finite())?;
            Some(ScatterPoint {
                address: record.listing.address.clone(),
                unit_id: record.listing.unit_id.clone(),
                x,
                price,
                bedrooms: record.listing.bedrooms,
                noise_score: record.noise_score()?,
                walk_time_to_campus_min: record.walk_time_to_campus_min()?,
            })
        })
        .collect()
}

fn bedroom_counts(selected: &[&EnrichedListing]) -> Vec<CategoryCount> {
    let mut known: BTreeMap<u8, usize> = BTreeMap::new();
    let mut unknown = 0usize;
    for record in selected {
        match record.listing.bedrooms {
            Some(bedrooms) => *known.entry(bedrooms).or_insert(0) += 1,
            None => unknown += 1,
        }
    }

    let mut counts: Vec<CategoryCount> = known
        .into_iter()
        .map(|(bedrooms, count)| CategoryCount {
            label: match bedrooms {
                0 => "Studio".to_string(),
                1 => "1 Bedroom".to_string(),
                n => format!("{n} Bedrooms"),
            },
            count,
        })
        .collect();
    if unknown > 0 {
        counts.push(CategoryCount {
            label: "Unknown".to_string(),
            count: unknown,
        });
    }
    counts
}

fn availability_by_month(selected: &[&EnrichedListing]) -> Vec<CategoryCount> {
    let mut months: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    let mut undated = 0usize;
    for record in selected {
        match record.listing.available_on {
            Some(date) => *months.entry((date.year(), date.month())).or_insert(0) += 1,
            None => undated += 1,
        }
    }

    let mut counts: Vec<CategoryCount> = months
        .into_iter()
        .map(|((year, month), count)| CategoryCount {
            label: format!("{year}-{month:02}"),
            count,
        })
        .collect();
    if undated > 0 {
        counts.push(CategoryCount {
            label: "Unspecified".to_string(),
            count: undated,
        });
    }
    counts
}
