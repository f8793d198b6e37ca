use super::{GeocodeError, Geocoder};
use crate::config::GeocoderConfig;
use crate::listings::domain::Coordinates;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::cell::Cell;
use std::thread;
use std::time::{Duration, Instant};

/// Blocking client for a Nominatim-compatible `/search` endpoint.
///
/// Requests are spaced at least `min_interval` apart, which is what the public
/// OpenStreetMap instance asks of batch users.
#[derive(Debug)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    locality: String,
    min_interval: Duration,
    last_request: Cell<Option<Instant>>,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()
            .map_err(|err| GeocodeError::Client(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            locality: config.locality.clone(),
            min_interval: config.min_interval(),
            last_request: Cell::new(None),
        })
    }

    fn query_for(&self, address: &str) -> String {
        let locality = self.locality.trim();
        if locality.is_empty()
            || address
                .to_ascii_lowercase()
                .contains(&locality.to_ascii_lowercase())
        {
            return address.trim().to_string();
        }
        format!("{}, {locality}", address.trim())
    }

    fn wait_for_slot(&self) {
        if let Some(last) = self.last_request.get() {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                thread::sleep(self.min_interval - elapsed);
            }
        }
        self.last_request.set(Some(Instant::now()));
    }
}

impl Geocoder for NominatimGeocoder {
    fn geocode(&self, address: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let query = self.query_for(address);
        self.wait_for_slot();

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", query.as_str()), ("format", "json"), ("limit", "1")])
            .send()
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status {
                status: status.as_u16(),
            });
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .map_err(|err| GeocodeError::InvalidResponse(err.to_string()))?;
        first_coordinates(&places)
    }
}

fn classify_transport_error(err: reqwest::Error) -> GeocodeError {
    if err.is_timeout() {
        GeocodeError::Timeout
    } else if let Some(status) = err.status() {
        GeocodeError::Status {
            status: status.as_u16(),
        }
    } else {
        GeocodeError::Connection(err.to_string())
    }
}

fn first_coordinates(places: &[NominatimPlace]) -> Result<Option<Coordinates>, GeocodeError> {
    let Some(place) = places.first() else {
        return Ok(None);
    };

    let latitude = parse_degrees(&place.lat, 90.0)?;
    let longitude = parse_degrees(&place.lon, 180.0)?;
    Ok(Some(Coordinates::new(latitude, longitude)))
}

fn parse_degrees(raw: &str, limit: f64) -> Result<f64, GeocodeError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && value.abs() <= limit)
        .ok_or_else(|| GeocodeError::InvalidResponse(format!("bad coordinate '{raw}'")))
}
