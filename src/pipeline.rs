//! One batch run: listing document in, deduplicated and enriched dataset out.

use crate::config::{GeocoderConfig, PipelineConfig};
use crate::listings::assemble::{write_dataset, AssembleError, AssembledDataset, DatasetAssembler};
use crate::listings::enrich::MetricEnricher;
use crate::listings::extract::{
    load_document_text, ExtractError, ExtractionContext, ExtractionStats, ListingExtractor,
};
use crate::listings::geocode::{
    CacheStats, DisabledGeocoder, GeocodeCache, GeocodeError, Geocoder, NominatimGeocoder,
    RetryPolicy,
};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("input document {} does not exist", path.display())]
    MissingInput { path: PathBuf },
    #[error(transparent)]
    Document(#[from] ExtractError),
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    #[error("geocoder unavailable: {0}")]
    Geocoder(#[source] GeocodeError),
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSummary {
    pub lines: usize,
    pub extracted: usize,
    pub rejected: usize,
    pub unique: usize,
    pub replaced: usize,
    pub geocoded: usize,
    pub geocoder_calls: usize,
    pub output: PathBuf,
}

pub struct ListingPipeline<G> {
    config: PipelineConfig,
    enricher: MetricEnricher,
    cache: GeocodeCache<G>,
}

impl ListingPipeline<Box<dyn Geocoder>> {
    /// Pipeline backed by the configured geocoding service, or by no lookups at all
    /// when `skip_geocoding` is set.
    pub fn from_config(
        config: PipelineConfig,
        geocoder: &GeocoderConfig,
        skip_geocoding: bool,
    ) -> Result<Self, PipelineError> {
        let (provider, retry): (Box<dyn Geocoder>, RetryPolicy) = if skip_geocoding {
            info!("geocoding disabled for this run");
            (Box::new(DisabledGeocoder), RetryPolicy::none())
        } else {
            let provider = NominatimGeocoder::new(geocoder).map_err(PipelineError::Geocoder)?;
            (Box::new(provider), RetryPolicy::from(geocoder))
        };
        Ok(Self::new(config, provider, retry))
    }
}

impl<G: Geocoder> ListingPipeline<G> {
    pub fn new(config: PipelineConfig, geocoder: G, retry: RetryPolicy) -> Self {
        Self {
            config,
            enricher: MetricEnricher::default(),
            cache: GeocodeCache::new(geocoder, retry),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn geocoding_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Reads the configured document and replaces the configured dataset.
    pub fn run(mut self) -> Result<PipelineSummary, PipelineError> {
        let input = self.config.input_pdf.clone();
        if !input.is_file() {
            return Err(PipelineError::MissingInput { path: input });
        }

        let text = load_document_text(&input)?;
        let output = self.config.dataset_path.clone();
        self.run_on_text(&text, &output)
    }

    /// Same as [`run`](Self::run) for text that has already been pulled out of a document.
    pub fn run_on_text(
        &mut self,
        text: &str,
        output: &Path,
    ) -> Result<PipelineSummary, PipelineError> {
        let (dataset, extraction) = self.assemble(text);
        write_dataset(output, &dataset.records)?;

        let geocoding = self.cache.stats();
        let summary = PipelineSummary {
            lines: extraction.lines,
            extracted: extraction.listings,
            rejected: extraction.rejected,
            unique: dataset.records.len(),
            replaced: dataset.replaced,
            geocoded: dataset
                .records
                .iter()
                .filter(|record| record.geo.is_some())
                .count(),
            geocoder_calls: geocoding.provider_calls,
            output: output.to_path_buf(),
        };

        info!(
            lines = summary.lines,
            extracted = summary.extracted,
            rejected = summary.rejected,
            unique = summary.unique,
            replaced = summary.replaced,
            geocoded = summary.geocoded,
            geocoder_calls = summary.geocoder_calls,
            cache_hits = geocoding.hits,
            output = %output.display(),
            "pipeline run complete"
        );

        Ok(summary)
    }

    /// Extract, enrich, and deduplicate without touching the filesystem.
    pub fn assemble(&mut self, text: &str) -> (AssembledDataset, ExtractionStats) {
        let mut extractor =
            ListingExtractor::from_text(text, ExtractionContext::from(&self.config));
        let mut assembler = DatasetAssembler::new();

        for listing in extractor.by_ref() {
            assembler.push(self.enricher.enrich(listing, &mut self.cache));
        }

        let extraction = extractor.stats();
        info!(
            lines = extraction.lines,
            address_headers = extraction.address_headers,
            listings = extraction.listings,
            rejected = extraction.rejected,
            "extraction finished"
        );

        (assembler.finish(), extraction)
    }
}
