mod cache;
mod error;
pub mod outline;

pub use cache::DatasetCache;
pub use error::LoadError;

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// District-level summary file name inside the data directory
pub const DISTRICTS_FILE: &str = "district_wise_details.csv";
/// Per-date warnings file name inside the data directory
pub const WARNINGS_FILE: &str = "warnings_actual_predicted.csv";
/// Date format of the `date` column in the warnings table
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// One row of the district summary table.
///
/// Numeric cells may be empty. Consumers decide what that means: aggregation
/// and marker sizing read `None` as zero, marker labels show an empty string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DistrictRecord {
    pub district: String,
    pub fatalities: Option<u64>,
    pub no_of_camps: Option<u64>,
    pub full_damaged_houses: Option<u64>,
    pub actual_rainfall_in_mm: Option<f64>,
}

/// One (district, date) row of the warnings table
#[derive(Debug, Clone, PartialEq)]
pub struct WarningRecord {
    pub district: String,
    pub date: NaiveDate,
    /// Every other column, in file order (see [`WarningTable::columns`])
    pub fields: Vec<String>,
}

/// Warnings rows plus the names of their passthrough columns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WarningTable {
    pub columns: Vec<String>,
    pub rows: Vec<WarningRecord>,
}

/// Both tables, as loaded from disk
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub districts: Vec<DistrictRecord>,
    pub warnings: WarningTable,
}

impl Dataset {
    /// Distinct district names of the summary table, sorted
    pub fn district_names(&self) -> Vec<String> {
        self.districts
            .iter()
            .map(|d| d.district.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Distinct warning dates, sorted ascending
    pub fn warning_dates(&self) -> Vec<NaiveDate> {
        self.warnings
            .rows
            .iter()
            .map(|w| w.date)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Locations of the two tables inside a data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub dir: PathBuf,
    pub districts: PathBuf,
    pub warnings: PathBuf,
}

impl DataPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            districts: dir.join(DISTRICTS_FILE),
            warnings: dir.join(WARNINGS_FILE),
            dir,
        }
    }
}

/// Load both tables from `paths`
pub fn load_dataset(paths: &DataPaths) -> Result<Dataset, LoadError> {
    let districts = parse_districts(open(&paths.districts)?, &paths.districts)?;
    let warnings = parse_warnings(open(&paths.warnings)?, &paths.warnings)?;

    log::info!(
        "loaded {} district rows and {} warning rows from {}",
        districts.len(),
        warnings.rows.len(),
        paths.dir.display()
    );

    Ok(Dataset {
        districts,
        warnings,
    })
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Parse the district summary table. Columns beyond the five known ones are ignored.
pub fn parse_districts<R: Read>(reader: R, source: &Path) -> Result<Vec<DistrictRecord>, LoadError> {
    csv_reader(reader)
        .deserialize()
        .collect::<Result<Vec<DistrictRecord>, _>>()
        .map_err(|e| LoadError::csv(source, e))
}

/// Parse the warnings table.
///
/// `district` and `date` are required; all other columns are kept verbatim.
/// One unparseable date fails the whole table.
pub fn parse_warnings<R: Read>(reader: R, source: &Path) -> Result<WarningTable, LoadError> {
    let mut rdr = csv_reader(reader);
    let headers = rdr.headers().map_err(|e| LoadError::csv(source, e))?.clone();

    let find = |column: &'static str| {
        headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| LoadError::MissingColumn {
                path: source.to_path_buf(),
                column,
            })
    };
    let district_idx = find("district")?;
    let date_idx = find("date")?;

    let passthrough: Vec<usize> = (0..headers.len())
        .filter(|&i| i != district_idx && i != date_idx)
        .collect();
    let columns = passthrough.iter().map(|&i| headers[i].to_string()).collect();

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| LoadError::csv(source, e))?;
        let line = record.position().map_or(0, |p| p.line());

        let raw_date = record.get(date_idx).unwrap_or_default();
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|_| {
            LoadError::InvalidDate {
                line,
                value: raw_date.to_string(),
            }
        })?;

        rows.push(WarningRecord {
            district: record.get(district_idx).unwrap_or_default().to_string(),
            date,
            fields: passthrough
                .iter()
                .map(|&i| record.get(i).unwrap_or_default().to_string())
                .collect(),
        });
    }

    Ok(WarningTable { columns, rows })
}
