mod record;

use crate::listings::domain::{EnrichedListing, ListingKey};
use record::DatasetRow;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Column order of the persisted dataset.
pub const DATASET_HEADER: [&str; 22] = [
    "address",
    "unit_id",
    "price",
    "bedrooms",
    "bathrooms",
    "available_on",
    "property_management",
    "property_management_url",
    "remodeled",
    "balcony",
    "patio",
    "parking",
    "split_floor_plan",
    "parking_cost_yearly",
    "amenities",
    "description",
    "latitude",
    "longitude",
    "distance_to_campus_km",
    "walk_time_to_campus_min",
    "noise_score",
    "price_per_bedroom",
];

#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    #[error("output location {} is not writable: {source}", path.display())]
    Unwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not encode dataset: {0}")]
    Encode(#[source] csv::Error),
    #[error("could not read dataset {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("dataset {} row {row}: {reason}", path.display())]
    InvalidRow {
        path: PathBuf,
        row: usize,
        reason: String,
    },
}

/// Deduplicates enriched listings by `(address, unit_id)`; the last one pushed wins.
#[derive(Debug, Default)]
pub struct DatasetAssembler {
    records: BTreeMap<ListingKey, EnrichedListing>,
    received: usize,
    replaced: usize,
}

/// Deduplicated records in `(address, unit_id)` order.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledDataset {
    pub records: Vec<EnrichedListing>,
    pub received: usize,
    pub replaced: usize,
}

impl DatasetAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: EnrichedListing) {
        self.received += 1;
        let key = record.listing.key();
        if self.records.insert(key, record).is_some() {
            self.replaced += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn finish(self) -> AssembledDataset {
        if self.replaced > 0 {
            debug!(replaced = self.replaced, "later listings replaced earlier duplicates");
        }
        AssembledDataset {
            records: self.records.into_values().collect(),
            received: self.received,
            replaced: self.replaced,
        }
    }
}

impl Extend<EnrichedListing> for DatasetAssembler {
    fn extend<T: IntoIterator<Item = EnrichedListing>>(&mut self, iter: T) {
        for record in iter {
            self.push(record);
        }
    }
}

impl FromIterator<EnrichedListing> for DatasetAssembler {
    fn from_iter<T: IntoIterator<Item = EnrichedListing>>(iter: T) -> Self {
        let mut assembler = Self::new();
        assembler.extend(iter);
        assembler
    }
}

/// CSV bytes for `records`, header included even when there are no rows.
pub fn encode_dataset<'a, I>(records: I) -> Result<Vec<u8>, AssembleError>
where
    I: IntoIterator<Item = &'a EnrichedListing>,
{
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record(DATASET_HEADER)
        .map_err(AssembleError::Encode)?;
    for record in records {
        writer
            .serialize(DatasetRow::from(record))
            .map_err(AssembleError::Encode)?;
    }

    writer
        .into_inner()
        .map_err(|err| AssembleError::Encode(csv::Error::from(err.into_error())))
}

/// Replaces the dataset at `path` in one rename so readers never see a partial file.
pub fn write_dataset(path: &Path, records: &[EnrichedListing]) -> Result<(), AssembleError> {
    let bytes = encode_dataset(records)?;
    let unwritable = |source: io::Error| AssembleError::Unwritable {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(unwritable)?;
    }

    let temp_path = temp_sibling(path);
    fs::write(&temp_path, &bytes).map_err(unwritable)?;
    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(unwritable(err));
    }

    info!(path = %path.display(), rows = records.len(), bytes = bytes.len(), "wrote dataset");
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset.csv".to_string());
    path.with_file_name(format!(".{file_name}.tmp"))
}

pub fn read_dataset(path: &Path) -> Result<Vec<EnrichedListing>, AssembleError> {
    let unreadable = |source: csv::Error| AssembleError::Unreadable {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_path(path).map_err(unreadable)?;
    let mut records = Vec::new();

    for (index, row) in reader.deserialize::<DatasetRow>().enumerate() {
        let row = row.map_err(unreadable)?;
        let record = row
            .into_listing()
            .map_err(|reason| AssembleError::InvalidRow {
                path: path.to_path_buf(),
                row: index + 1,
                reason,
            })?;
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::domain::{Amenity, Coordinates, GeoMetrics, Listing};
    use chrono::NaiveDate;

    fn record(address: &str, unit: Option<&str>, price: f64) -> EnrichedListing {
        let mut listing = Listing::new(address);
        listing.unit_id = unit.map(str::to_string);
        listing.price = Some(price);
        listing.bedrooms = Some(2);
        EnrichedListing {
            listing,
            geo: None,
            price_per_bedroom: Some(price / 2.0),
        }
    }

    #[test]
    fn later_duplicates_win() {
        let assembled: AssembledDataset = [
            record("742 Del Playa Dr", None, 3400.0),
            record("6512 Segovia Rd", Some("101"), 3200.0),
            record("742 Del Playa Dr", None, 3500.0),
        ]
        .into_iter()
        .collect::<DatasetAssembler>()
        .finish();

        assert_eq!(assembled.records.len(), 2);
        assert_eq!(assembled.received, 3);
        assert_eq!(assembled.replaced, 1);
        let del_playa = assembled
            .records
            .iter()
            .find(|record| record.listing.address == "742 Del Playa Dr")
            .expect("deduplicated record kept");
        assert_eq!(del_playa.listing.price, Some(3500.0));
    }

    #[test]
    fn sorts_by_address_then_unit_with_missing_unit_first() {
        let mut assembler = DatasetAssembler::new();
        assembler.push(record("6512 Segovia Rd", Some("102"), 1.0));
        assembler.push(record("6512 Segovia Rd", None, 1.0));
        assembler.push(record("6512 Segovia Rd", Some("101"), 1.0));
        assembler.push(record("6500 Cordoba Rd", Some("9"), 1.0));

        let keys: Vec<(String, Option<String>)> = assembler
            .finish()
            .records
            .into_iter()
            .map(|record| (record.listing.address, record.listing.unit_id))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("6500 Cordoba Rd".to_string(), Some("9".to_string())),
                ("6512 Segovia Rd".to_string(), None),
                ("6512 Segovia Rd".to_string(), Some("101".to_string())),
                ("6512 Segovia Rd".to_string(), Some("102".to_string())),
            ]
        );
    }

    #[test]
    fn header_lists_every_column_in_row_order() {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .serialize(DatasetRow::from(&record("742 Del Playa Dr", None, 3500.0)))
            .expect("row serializes");
        let bytes = writer.into_inner().expect("flush");
        let text = String::from_utf8(bytes).expect("utf8");
        let header = text.lines().next().expect("header line");
        assert_eq!(header, DATASET_HEADER.join(","));
    }

    #[test]
    fn empty_dataset_still_has_a_header() {
        let bytes = encode_dataset(&[]).expect("encodes");
        assert_eq!(
            String::from_utf8(bytes).expect("utf8"),
            format!("{}\n", DATASET_HEADER.join(","))
        );
    }

    #[test]
    fn absent_values_are_empty_cells() {
        let mut listing = Listing::new("742 Del Playa Dr");
        listing.features.amenities = vec![Amenity::FreeInternet, Amenity::GasIncluded];
        let bytes = encode_dataset(&[EnrichedListing {
            listing,
            geo: None,
            price_per_bedroom: None,
        }])
        .expect("encodes");
        let text = String::from_utf8(bytes).expect("utf8");
        let row = text.lines().nth(1).expect("data row");
        assert_eq!(
            row,
            "742 Del Playa Dr,,,,,,,,false,false,false,false,false,,Free Internet; Gas Included,,,,,,,"
        );
    }

    #[test]
    fn partial_geo_columns_are_rejected_on_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("listings.csv");
        let mut text = DATASET_HEADER.join(",");
        text.push_str("\n742 Del Playa Dr,,,,,,,,false,false,false,false,false,,,,34.41,,,,,\n");
        fs::write(&path, text).expect("fixture written");

        match read_dataset(&path) {
            Err(AssembleError::InvalidRow { row, .. }) => assert_eq!(row, 1),
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[test]
    fn write_creates_directories_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("geocoded").join("all_listings_geocoded.csv");
        let mut listing = Listing::new("6512 Segovia Rd");
        listing.unit_id = Some("101".to_string());
        listing.available_on = NaiveDate::from_ymd_opt(2026, 6, 15);
        let records = vec![EnrichedListing {
            listing,
            geo: Some(GeoMetrics {
                coordinates: Coordinates::new(34.4108, -119.86),
                distance_to_campus_km: 1.08,
                walk_time_to_campus_min: 13.0,
                noise_score: 9.4,
            }),
            price_per_bedroom: None,
        }];

        write_dataset(&path, &records).expect("dataset written");

        let entries: Vec<_> = fs::read_dir(path.parent().expect("parent"))
            .expect("list dir")
            .map(|entry| entry.expect("entry").file_name())
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(read_dataset(&path).expect("reads back"), records);
    }

    #[test]
    fn unwritable_location_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"file").expect("blocker written");
        let path = blocker.join("listings.csv");

        let error = write_dataset(&path, &[]).expect_err("parent is a file");
        assert!(matches!(error, AssembleError::Unwritable { .. }));
    }
}
