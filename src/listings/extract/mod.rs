//! Turns the raw text of a listing document into [`Listing`] records.
//!
//! Each normalized line is offered to an ordered chain of matchers. The first matcher
//! that recognises the line decides what happens to it: emit listings, set the address
//! that later price lines belong to, or reject the line with a logged reason.

mod document;
mod fields;
mod matchers;
mod normalizer;

pub use document::{load_document_text, ExtractError};
pub use matchers::{MatchOutcome, RejectReason};
pub use normalizer::normalize_address;

use crate::config::PipelineConfig;
use crate::listings::domain::Listing;
use matchers::{default_matchers, LineMatcher, LineScope};
use normalizer::normalize_line;
use std::collections::VecDeque;
use tracing::{debug, trace, warn};

/// Document-level facts stamped onto every extracted listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionContext {
    pub listing_year: i32,
    pub property_manager: String,
    pub source_url: Option<String>,
}

impl From<&PipelineConfig> for ExtractionContext {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            listing_year: config.listing_year,
            property_manager: config.property_manager.clone(),
            source_url: config.source_url.clone(),
        }
    }
}

impl Default for ExtractionContext {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub lines: usize,
    pub address_headers: usize,
    pub listings: usize,
    pub rejected: usize,
}

/// Lazy, single-pass listing sequence over document lines.
pub struct ListingExtractor<I> {
    lines: I,
    context: ExtractionContext,
    matchers: Vec<Box<dyn LineMatcher>>,
    current_address: Option<String>,
    pending: VecDeque<Listing>,
    stats: ExtractionStats,
}

impl<'a> ListingExtractor<std::str::Lines<'a>> {
    pub fn from_text(text: &'a str, context: ExtractionContext) -> Self {
        Self::new(text.lines(), context)
    }
}

impl<I, S> ListingExtractor<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    pub fn new(lines: I, context: ExtractionContext) -> Self {
        Self {
            lines,
            context,
            matchers: default_matchers(),
            current_address: None,
            pending: VecDeque::new(),
            stats: ExtractionStats::default(),
        }
    }

    /// Counters for the lines consumed so far.
    pub fn stats(&self) -> ExtractionStats {
        self.stats
    }

    fn classify(&self, line: &str) -> Option<(&'static str, MatchOutcome)> {
        let scope = LineScope {
            current_address: self.current_address.as_deref(),
            context: &self.context,
        };

        self.matchers
            .iter()
            .find_map(|matcher| match matcher.match_line(line, &scope) {
                MatchOutcome::NoMatch => None,
                outcome => Some((matcher.name(), outcome)),
            })
    }

    fn process_line(&mut self, raw: &str) {
        self.stats.lines += 1;
        let line = normalize_line(raw);
        if line.is_empty() {
            return;
        }

        let Some((matcher, outcome)) = self.classify(&line) else {
            trace!(%line, "no matcher recognised line");
            return;
        };

        match outcome {
            MatchOutcome::Address(address) => {
                debug!(%address, "address header");
                self.stats.address_headers += 1;
                self.current_address = Some(address);
            }
            MatchOutcome::Rejected(reason) => {
                warn!(matcher, reason = reason.label(), %line, "dropping listing line");
                self.stats.rejected += 1;
            }
            MatchOutcome::Listings(listings) => {
                for listing in listings {
                    if listing.address.trim().is_empty() {
                        warn!(
                            matcher,
                            reason = RejectReason::EmptyAddress.label(),
                            %line,
                            "dropping listing line"
                        );
                        self.stats.rejected += 1;
                        continue;
                    }
                    debug!(
                        matcher,
                        address = %listing.address,
                        unit = listing.unit_id.as_deref().unwrap_or("-"),
                        price = ?listing.price,
                        "extracted listing"
                    );
                    self.stats.listings += 1;
                    self.pending.push_back(listing);
                }
            }
            MatchOutcome::NoMatch => {}
        }
    }
}

impl<I, S> Iterator for ListingExtractor<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = Listing;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(listing) = self.pending.pop_front() {
                return Some(listing);
            }
            let line = self.lines.next()?;
            self.process_line(line.as_ref());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KAMAP_PAGE: &str = "\
Kamap Property Management - Availability
6512 Segovia Rd
$3,200 2 Bed 1 Bath Units # 101 (6/15), 102 (7/1) Remodeled Balcony
$4,100 4 Singles 2 Bath Units # 201 (6/15) Parking Available $500 per year
6680 Picasso
$2,750 1 Bed 1 Bath Units # A (8/1) Free Internet, Gas
742 Del Playa Dr, $3500/mo, 3 bed
";

    #[test]
    fn walks_a_mixed_layout_in_document_order() {
        let mut extractor = ListingExtractor::from_text(KAMAP_PAGE, ExtractionContext::default());
        let listings: Vec<Listing> = extractor.by_ref().collect();

        let keys: Vec<(String, Option<String>)> = listings
            .iter()
            .map(|listing| (listing.address.clone(), listing.unit_id.clone()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("6512 Segovia Rd".to_string(), Some("101".to_string())),
                ("6512 Segovia Rd".to_string(), Some("102".to_string())),
                ("6512 Segovia Rd".to_string(), Some("201".to_string())),
                ("6680 Picasso".to_string(), Some("A".to_string())),
                ("742 Del Playa Dr".to_string(), None),
            ]
        );

        let stats = extractor.stats();
        assert_eq!(stats.listings, 5);
        assert_eq!(stats.address_headers, 2);
        assert_eq!(stats.rejected, 0);
        assert_eq!(stats.lines, 7);
    }

    #[test]
    fn orphan_price_lines_are_dropped() {
        let text = "$3,200 2 Bed Units # 4 (6/15)\n6512 Segovia Rd\n$2,900 2 Bed";
        let mut extractor = ListingExtractor::from_text(text, ExtractionContext::default());
        let listings: Vec<Listing> = extractor.by_ref().collect();

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].price, Some(2900.0));
        assert_eq!(extractor.stats().rejected, 1);
    }

    #[test]
    fn every_emitted_listing_has_an_address() {
        let text = "noise\n$1 Bed\n\u{feff}6512 Segovia Rd\n$3,000 3 Bed\nunrelated footer";
        let listings: Vec<Listing> =
            ListingExtractor::from_text(text, ExtractionContext::default()).collect();
        assert!(!listings.is_empty());
        assert!(listings
            .iter()
            .all(|listing| !listing.address.trim().is_empty()));
    }

    #[test]
    fn extraction_is_lazy() {
        let lines = vec!["742 Del Playa Dr, $3500/mo, 3 bed".to_string()]
            .into_iter()
            .chain(std::iter::repeat_with(|| -> String { panic!("read past the first listing") }));
        let mut extractor = ListingExtractor::new(lines, ExtractionContext::default());
        let first = extractor.next().expect("first listing available");
        assert_eq!(first.address, "742 Del Playa Dr");
    }
}
