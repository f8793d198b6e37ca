use iv_housing::error::AppError;
use iv_housing::listings::assemble::read_dataset;
use iv_housing::listings::EnrichedListing;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Dataset loaded once at startup and shared read-only by every request.
#[derive(Debug, Clone)]
pub(crate) struct ListingStore {
    records: Arc<Vec<EnrichedListing>>,
    source: PathBuf,
}

impl ListingStore {
    pub(crate) fn load(path: &Path) -> Result<Self, AppError> {
        if !path.is_file() {
            return Err(AppError::NotFound(format!(
                "dataset {} (run the pipeline command first)",
                path.display()
            )));
        }

        let records = read_dataset(path)?;
        info!(path = %path.display(), listings = records.len(), "loaded listing dataset");
        Ok(Self::from_records(records, path.to_path_buf()))
    }

    pub(crate) fn from_records(records: Vec<EnrichedListing>, source: PathBuf) -> Self {
        Self {
            records: Arc::new(records),
            source,
        }
    }

    pub(crate) fn records(&self) -> &[EnrichedListing] {
        &self.records
    }

    pub(crate) fn source(&self) -> &Path {
        &self.source
    }
}
