use super::fields::{
    detect_features, find_bathrooms, find_bedrooms, find_inline_unit, find_price,
    leading_address, parse_units, split_unit_section, starts_with_price,
};
use super::ExtractionContext;
use crate::listings::domain::Listing;
use std::fmt::Debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    NoAddressInScope,
    EmptyAddress,
}

impl RejectReason {
    pub const fn label(self) -> &'static str {
        match self {
            Self::NoAddressInScope => "price line without a preceding address",
            Self::EmptyAddress => "listing without an address",
        }
    }
}

/// What a matcher made of one line.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Listings(Vec<Listing>),
    Address(String),
    Rejected(RejectReason),
    NoMatch,
}

pub(crate) struct LineScope<'a> {
    pub(crate) current_address: Option<&'a str>,
    pub(crate) context: &'a ExtractionContext,
}

impl LineScope<'_> {
    fn listing(&self, address: &str, line: &str) -> Listing {
        let mut listing = Listing::new(address);
        listing.property_management = self.context.property_manager.clone();
        listing.property_management_url = self.context.source_url.clone();
        listing.description = line.to_string();
        listing
    }

    /// One listing per unit in an optional `Units #` list of `body`, or a single listing
    /// carrying `fallback_unit`. Price and features come from `priced`.
    fn unit_listings(
        &self,
        address: &str,
        line: &str,
        priced: &str,
        body: &str,
        fallback_unit: Option<String>,
    ) -> Vec<Listing> {
        let (rooms, unit_section) = split_unit_section(body);

        let mut template = self.listing(address, line);
        template.price = find_price(priced).and_then(|token| token.amount);
        template.bedrooms = find_bedrooms(rooms);
        template.bathrooms = find_bathrooms(rooms);
        template.features = detect_features(priced);

        let units = unit_section
            .map(|section| parse_units(section, self.context.listing_year))
            .unwrap_or_default();
        if units.is_empty() {
            template.unit_id = fallback_unit;
            return vec![template];
        }

        units
            .into_iter()
            .map(|slot| {
                let mut listing = template.clone();
                listing.unit_id = Some(slot.unit_id);
                listing.available_on = slot.available_on;
                listing
            })
            .collect()
    }
}

pub(crate) trait LineMatcher: Debug {
    fn name(&self) -> &'static str;

    fn match_line(&self, line: &str, scope: &LineScope<'_>) -> MatchOutcome;
}

pub(crate) fn default_matchers() -> Vec<Box<dyn LineMatcher>> {
    vec![
        Box::new(InlineListingMatcher),
        Box::new(AddressHeaderMatcher),
        Box::new(UnitPriceLineMatcher),
    ]
}

/// `742 Del Playa Dr, $3500/mo, 3 bed` style lines.
#[derive(Debug)]
struct InlineListingMatcher;

impl LineMatcher for InlineListingMatcher {
    fn name(&self) -> &'static str {
        "inline"
    }

    fn match_line(&self, line: &str, scope: &LineScope<'_>) -> MatchOutcome {
        let Some(found) = leading_address(line) else {
            return MatchOutcome::NoMatch;
        };

        if find_price(found.rest).is_none() && find_bedrooms(found.rest).is_none() {
            return MatchOutcome::NoMatch;
        }

        let inline_unit = find_inline_unit(found.rest);
        MatchOutcome::Listings(scope.unit_listings(
            &found.address,
            line,
            found.rest,
            found.rest,
            inline_unit,
        ))
    }
}

/// A bare street address that the following price lines belong to.
#[derive(Debug)]
struct AddressHeaderMatcher;

impl LineMatcher for AddressHeaderMatcher {
    fn name(&self) -> &'static str {
        "address-header"
    }

    fn match_line(&self, line: &str, _scope: &LineScope<'_>) -> MatchOutcome {
        match leading_address(line) {
            Some(found) => MatchOutcome::Address(found.address),
            None => MatchOutcome::NoMatch,
        }
    }
}

/// `$3,200 2 Bed 1 Bath Units # 101 (6/15), 102 (7/1) Remodeled` under an address header.
#[derive(Debug)]
struct UnitPriceLineMatcher;

impl LineMatcher for UnitPriceLineMatcher {
    fn name(&self) -> &'static str {
        "unit-price"
    }

    fn match_line(&self, line: &str, scope: &LineScope<'_>) -> MatchOutcome {
        if !starts_with_price(line) {
            return MatchOutcome::NoMatch;
        }
        let Some(address) = scope.current_address else {
            return MatchOutcome::Rejected(RejectReason::NoAddressInScope);
        };
        if address.trim().is_empty() {
            return MatchOutcome::Rejected(RejectReason::EmptyAddress);
        }

        let body = line
            .trim_start()
            .split_once(char::is_whitespace)
            .map(|(_, rest)| rest)
            .unwrap_or("");
        MatchOutcome::Listings(scope.unit_listings(address, line, line, body, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn context() -> ExtractionContext {
        ExtractionContext::default()
    }

    fn outcome(matcher: &dyn LineMatcher, line: &str, address: Option<&str>) -> MatchOutcome {
        let context = context();
        let scope = LineScope {
            current_address: address,
            context: &context,
        };
        matcher.match_line(line, &scope)
    }

    fn listings(outcome: MatchOutcome) -> Vec<Listing> {
        match outcome {
            MatchOutcome::Listings(listings) => listings,
            other => panic!("expected listings, got {other:?}"),
        }
    }

    #[test]
    fn inline_line_yields_one_listing() {
        let found = listings(outcome(
            &InlineListingMatcher,
            "742 Del Playa Dr, $3500/mo, 3 bed",
            None,
        ));
        assert_eq!(found.len(), 1);
        let listing = &found[0];
        assert_eq!(listing.address, "742 Del Playa Dr");
        assert_eq!(listing.price, Some(3500.0));
        assert_eq!(listing.bedrooms, Some(3));
        assert_eq!(listing.unit_id, None);
        assert_eq!(listing.property_management, "Kamap Property Management");
        assert_eq!(listing.description, "742 Del Playa Dr, $3500/mo, 3 bed");
    }

    #[test]
    fn inline_line_keeps_unparseable_price_as_absent() {
        let found = listings(outcome(
            &InlineListingMatcher,
            "6681 Trigo Rd Apt 3, $TBD, 2 bed 1 bath",
            None,
        ));
        assert_eq!(found[0].price, None);
        assert_eq!(found[0].unit_id.as_deref(), Some("3"));
        assert_eq!(found[0].bathrooms, Some(1.0));
    }

    #[test]
    fn inline_line_with_unit_list_fans_out_per_unit() {
        let found = listings(outcome(
            &InlineListingMatcher,
            "6512 Segovia Rd $3,200 2 Bed 1 Bath Units # 101 (6/15), 102 (7/1)",
            None,
        ));

        let units: Vec<(Option<&str>, Option<NaiveDate>)> = found
            .iter()
            .map(|listing| (listing.unit_id.as_deref(), listing.available_on))
            .collect();
        assert_eq!(
            units,
            vec![
                (Some("101"), NaiveDate::from_ymd_opt(2026, 6, 15)),
                (Some("102"), NaiveDate::from_ymd_opt(2026, 7, 1)),
            ]
        );
        assert!(found.iter().all(|listing| listing.address == "6512 Segovia Rd"));
        assert!(found.iter().all(|listing| listing.price == Some(3200.0)));
        assert!(found.iter().all(|listing| listing.bedrooms == Some(2)));
        assert!(found.iter().all(|listing| listing.bathrooms == Some(1.0)));
    }

    #[test]
    fn bare_address_is_not_an_inline_listing() {
        assert_eq!(
            outcome(&InlineListingMatcher, "6512 Segovia Rd", None),
            MatchOutcome::NoMatch
        );
        assert_eq!(
            outcome(&AddressHeaderMatcher, "6512 Segovia Rd", None),
            MatchOutcome::Address("6512 Segovia Rd".to_string())
        );
    }

    #[test]
    fn price_line_fans_out_per_unit() {
        let found = listings(outcome(
            &UnitPriceLineMatcher,
            "$3,200 2 Bed 1 Bath Units # 101 (6/15), 102 (7/1) Remodeled Balcony",
            Some("6512 Segovia Rd"),
        ));
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|listing| listing.address == "6512 Segovia Rd"));
        assert!(found.iter().all(|listing| listing.price == Some(3200.0)));
        assert!(found.iter().all(|listing| listing.bedrooms == Some(2)));
        assert!(found.iter().all(|listing| listing.features.remodeled));
        assert_eq!(found[0].unit_id.as_deref(), Some("101"));
        assert_eq!(found[1].available_on, NaiveDate::from_ymd_opt(2026, 7, 1));
    }

    #[test]
    fn price_line_without_units_yields_single_listing() {
        let found = listings(outcome(
            &UnitPriceLineMatcher,
            "$2,950 3 Singles 1 Bath",
            Some("6700 Sabado Tarde Rd"),
        ));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].unit_id, None);
        assert_eq!(found[0].bedrooms, Some(3));
    }

    #[test]
    fn price_line_without_address_is_rejected() {
        assert_eq!(
            outcome(&UnitPriceLineMatcher, "$3,200 2 Bed Units # 4 (6/15)", None),
            MatchOutcome::Rejected(RejectReason::NoAddressInScope)
        );
        assert_eq!(
            outcome(&UnitPriceLineMatcher, "Free Internet", Some("6512 Segovia Rd")),
            MatchOutcome::NoMatch
        );
    }
}
