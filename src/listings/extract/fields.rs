use crate::listings::domain::{Amenity, ListingFeatures};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

const IV_STREETS: &str = "Del Playa|Sabado Tarde|Embarcadero del Norte|Embarcadero del Mar|\
Camino Corto|Camino Pescadero|Camino del Sur|Camino Lindo|El Nido|El Greco|El Colegio|\
Cordoba|Abrego|Segovia|Trigo|Picasso|Pasado|Sueno|Madrid|Fortuna|Estero|Seville|Cervantes";

const STREET_SUFFIXES: &str = "Rd|Road|St|Street|Ave|Avenue|Dr|Drive|Ln|Lane|Way|Blvd|Ct|Court|Pl|Place";

fn compiled(cell: &'static OnceLock<Regex>, pattern: impl FnOnce() -> String) -> &'static Regex {
    cell.get_or_init(|| {
        let pattern = pattern();
        Regex::new(&pattern)
            .unwrap_or_else(|err| panic!("listing field pattern `{pattern}` does not compile: {err}"))
    })
}

fn known_street_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, || {
        format!(
            r"(?i)^(\d{{3,5}}[A-Z]?\s+(?:{IV_STREETS})\b(?:\s+(?:{STREET_SUFFIXES})\b\.?)?)"
        )
    })
}

fn suffixed_street_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, || {
        format!(r"^(\d{{1,5}}[A-Z]?(?:\s+[A-Z][A-Za-z'\-]*){{1,4}}?\s+(?:{STREET_SUFFIXES})\b\.?)")
    })
}

fn price_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, || {
        r"\$\s*(\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?|[A-Za-z]+)".to_string()
    })
}

fn bedroom_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, || {
        r"(?i)\b(\d{1,2})\s*-?\s*(?:bedrooms?|beds?|bds?|br|singles?|person)\b".to_string()
    })
}

fn studio_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, || r"(?i)\bstudio\b".to_string())
}

fn bathroom_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, || {
        r"(?i)\b(\d{1,2}(?:\.\d)?)\s*-?\s*(?:bathrooms?|baths?|ba)\b".to_string()
    })
}

fn inline_unit_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, || {
        r"(?i)\b(?:unit|apt|apartment)\.?\s*#?\s*([A-Z]?\d+[A-Z]?)\b".to_string()
    })
}

fn unit_section_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, || r"(?i)\bunits?\s*#\s*".to_string())
}

fn unit_token_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, || {
        r"^([A-Za-z]?\d+[A-Za-z]?|[A-Za-z])\b(?:\s*\((\d{1,2})/(\d{1,2})\))?".to_string()
    })
}

fn parking_cost_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, || {
        r"(?i)\$\s*(\d[\d,]*)\s*(?:/|per)\s*(?:year|yr)\b".to_string()
    })
}

fn feature_patterns() -> &'static [(FeatureFlag, Regex)] {
    static CELL: OnceLock<Vec<(FeatureFlag, Regex)>> = OnceLock::new();
    CELL.get_or_init(|| {
        [
            (FeatureFlag::Remodeled, r"(?i)\bremodel"),
            (FeatureFlag::Balcony, r"(?i)\bbalcon(?:y|ies)\b"),
            (FeatureFlag::Patio, r"(?i)\bpatios?\b"),
            (FeatureFlag::Parking, r"(?i)\bparking\s+(?:available|included)\b"),
            (FeatureFlag::SplitFloorPlan, r"(?i)\bsplit\s+floor\s*plan\b"),
            (FeatureFlag::Amenity(Amenity::FreeInternet), r"(?i)\bfree\b.*\binternet\b"),
            (
                FeatureFlag::Amenity(Amenity::WaterTrashIncluded),
                r"(?i)\bwater\b.*\btrash\b|\btrash\b.*\bwater\b",
            ),
            (FeatureFlag::Amenity(Amenity::InUnitLaundry), r"(?i)\bwasher\b.*\bdryer\b"),
            (FeatureFlag::Amenity(Amenity::GasIncluded), r"(?i)\bgas\b"),
        ]
        .into_iter()
        .map(|(flag, pattern)| {
            let regex = Regex::new(pattern).expect("feature pattern compiles");
            (flag, regex)
        })
        .collect()
    })
}

#[derive(Debug, Clone, Copy)]
enum FeatureFlag {
    Remodeled,
    Balcony,
    Patio,
    Parking,
    SplitFloorPlan,
    Amenity(Amenity),
}

/// Street address at the start of a line, plus whatever text follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AddressMatch<'a> {
    pub(crate) address: String,
    pub(crate) rest: &'a str,
}

pub(crate) fn leading_address(line: &str) -> Option<AddressMatch<'_>> {
    let line = line.trim_start_matches(|c: char| {
        c.is_whitespace() || matches!(c, '\u{2022}' | '\u{00b7}' | '*' | '-')
    });

    let found = known_street_pattern()
        .find(line)
        .or_else(|| suffixed_street_pattern().find(line))?;

    let address = found
        .as_str()
        .trim_end_matches(['.', ',', ' '])
        .to_string();
    if address.is_empty() {
        return None;
    }

    Some(AddressMatch {
        address,
        rest: line[found.end()..].trim_start_matches([',', ' ', '-', ':']),
    })
}

/// First `$` token in the text. `amount` is `None` when the token is not numeric.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PriceToken {
    pub(crate) raw: String,
    pub(crate) amount: Option<f64>,
}

pub(crate) fn find_price(text: &str) -> Option<PriceToken> {
    let captures = price_pattern().captures(text)?;
    let raw = captures.get(1)?.as_str().to_string();
    let amount = parse_price(&raw);
    Some(PriceToken { raw, amount })
}

pub(crate) fn starts_with_price(text: &str) -> bool {
    text.trim_start().starts_with('$')
}

/// `$3,500.00` becomes `3500.0`; anything that is not a finite, non-negative number is `None`.
pub(crate) fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}

pub(crate) fn find_bedrooms(text: &str) -> Option<u8> {
    if let Some(captures) = bedroom_pattern().captures(text) {
        return captures.get(1)?.as_str().parse::<u8>().ok();
    }

    studio_pattern().is_match(text).then_some(0)
}

pub(crate) fn find_bathrooms(text: &str) -> Option<f32> {
    bathroom_pattern()
        .captures(text)?
        .get(1)?
        .as_str()
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
}

pub(crate) fn find_inline_unit(text: &str) -> Option<String> {
    inline_unit_pattern()
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|unit| unit.as_str().to_string())
}

/// Splits a price line body at its `Units #` marker into room text and unit text.
pub(crate) fn split_unit_section(text: &str) -> (&str, Option<&str>) {
    match unit_section_pattern().find(text) {
        Some(marker) => (text[..marker.start()].trim(), Some(text[marker.end()..].trim())),
        None => (text.trim(), None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UnitSlot {
    pub(crate) unit_id: String,
    pub(crate) available_on: Option<NaiveDate>,
}

/// Reads `101 (6/15), 102 (7/1)` style unit lists until the first token that is not a unit.
pub(crate) fn parse_units(section: &str, year: i32) -> Vec<UnitSlot> {
    let mut units = Vec::new();
    let mut remaining = section;

    loop {
        remaining = remaining.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ',' | '&'));
        if let Some(stripped) = remaining.strip_prefix("and ") {
            remaining = stripped;
        }

        let Some(captures) = unit_token_pattern().captures(remaining) else {
            break;
        };
        let Some(whole) = captures.get(0) else {
            break;
        };

        let available_on = match (captures.get(2), captures.get(3)) {
            (Some(month), Some(day)) => month
                .as_str()
                .parse::<u32>()
                .ok()
                .zip(day.as_str().parse::<u32>().ok())
                .and_then(|(month, day)| NaiveDate::from_ymd_opt(year, month, day)),
            _ => None,
        };

        units.push(UnitSlot {
            unit_id: captures[1].to_string(),
            available_on,
        });
        remaining = &remaining[whole.end()..];
    }

    units
}

pub(crate) fn detect_features(text: &str) -> ListingFeatures {
    let mut features = ListingFeatures::default();

    for (flag, pattern) in feature_patterns() {
        if !pattern.is_match(text) {
            continue;
        }
        match flag {
            FeatureFlag::Remodeled => features.remodeled = true,
            FeatureFlag::Balcony => features.balcony = true,
            FeatureFlag::Patio => features.patio = true,
            FeatureFlag::Parking => features.parking = true,
            FeatureFlag::SplitFloorPlan => features.split_floor_plan = true,
            FeatureFlag::Amenity(amenity) => features.amenities.push(*amenity),
        }
    }

    features.parking_cost_yearly = parking_cost_pattern()
        .captures(text)
        .and_then(|captures| captures.get(1))
        .and_then(|cost| parse_price(cost.as_str()));
    if features.parking_cost_yearly.is_some() {
        features.parking = true;
    }

    features
}
