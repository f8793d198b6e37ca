mod nominatim;

pub use nominatim::NominatimGeocoder;

use crate::config::GeocoderConfig;
use crate::listings::domain::Coordinates;
use crate::listings::extract::normalize_address;
use std::collections::HashMap;
use std::fmt::Debug;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("geocoder request timed out")]
    Timeout,
    #[error("could not reach geocoder: {0}")]
    Connection(String),
    #[error("geocoder responded with HTTP {status}")]
    Status { status: u16 },
    #[error("unexpected geocoder response: {0}")]
    InvalidResponse(String),
    #[error("could not build geocoder client: {0}")]
    Client(String),
}

impl GeocodeError {
    /// Timeouts, connection failures, throttling and server errors are worth one more try.
    pub fn is_transient(&self) -> bool {
        match self {
            GeocodeError::Timeout | GeocodeError::Connection(_) => true,
            GeocodeError::Status { status } => *status == 429 || (500..600).contains(status),
            GeocodeError::InvalidResponse(_) | GeocodeError::Client(_) => false,
        }
    }
}

/// Address to coordinate lookup provider.
pub trait Geocoder: Debug {
    /// `Ok(None)` means the provider answered but knows no such place.
    fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError>;
}

impl<G: Geocoder + ?Sized> Geocoder for &G {
    fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        (**self).geocode(query)
    }
}

impl<G: Geocoder + ?Sized> Geocoder for Box<G> {
    fn geocode(&self, query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        (**self).geocode(query)
    }
}

/// Stand-in provider for runs that skip network lookups.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGeocoder;

impl Geocoder for DisabledGeocoder {
    fn geocode(&self, _query: &str) -> Result<Option<Coordinates>, GeocodeError> {
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

impl From<&GeocoderConfig> for RetryPolicy {
    fn from(config: &GeocoderConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: config.retry_backoff(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub lookups: usize,
    pub hits: usize,
    pub provider_calls: usize,
    pub resolved: usize,
    pub failed: usize,
}

/// Run-scoped memo of geocoding results, misses included.
#[derive(Debug)]
pub struct GeocodeCache<G> {
    geocoder: G,
    retry: RetryPolicy,
    entries: HashMap<String, Option<Coordinates>>,
    stats: CacheStats,
}

impl<G: Geocoder> GeocodeCache<G> {
    pub fn new(geocoder: G, retry: RetryPolicy) -> Self {
        Self {
            geocoder,
            retry,
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Never fails: provider errors and unknown addresses both come back as `None`.
    pub fn lookup(&mut self, address: &str) -> Option<Coordinates> {
        self.stats.lookups += 1;
        let key = normalize_address(address);
        if key.is_empty() {
            return None;
        }

        if let Some(cached) = self.entries.get(&key) {
            self.stats.hits += 1;
            return *cached;
        }

        let resolved = self.fetch(address);
        match resolved {
            Some(_) => self.stats.resolved += 1,
            None => self.stats.failed += 1,
        }
        self.entries.insert(key, resolved);
        resolved
    }

    fn fetch(&mut self, address: &str) -> Option<Coordinates> {
        let mut attempt = 0u32;
        loop {
            self.stats.provider_calls += 1;
            match self.geocoder.geocode(address) {
                Ok(Some(coordinates)) => {
                    debug!(%address, ?coordinates, "geocoded address");
                    return Some(coordinates);
                }
                Ok(None) => {
                    warn!(%address, "geocoder found no match");
                    return None;
                }
                Err(err) if err.is_transient() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let backoff = self.retry.backoff(attempt);
                    debug!(%address, error = %err, attempt, ?backoff, "retrying geocode");
                    if !backoff.is_zero() {
                        thread::sleep(backoff);
                    }
                }
                Err(err) => {
                    warn!(%address, error = %err, "geocoding failed");
                    return None;
                }
            }
        }
    }
}
