use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

use crate::models::{Coordinates, Program};

/// Errors that can occur while loading the program catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to open catalog {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid catalog row at line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },

    #[error("No programs loaded from {path}")]
    Empty { path: String },
}

/// Load and validate the catalog from a CSV file
///
/// A missing file, a malformed row or an empty file are all fatal: the
/// service cannot rank anything without programs.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Vec<Program>, CatalogError> {
    let path = path.as_ref();
    let source_path = path.display().to_string();

    let file = File::open(path).map_err(|source| CatalogError::Io {
        path: source_path.clone(),
        source,
    })?;

    let programs = parse_catalog(file)?;
    if programs.is_empty() {
        return Err(CatalogError::Empty { path: source_path });
    }

    tracing::info!("Loaded {} programs from {}", programs.len(), source_path);
    Ok(programs)
}

/// Parse catalog rows from any reader
pub fn parse_catalog<R: Read>(reader: R) -> Result<Vec<Program>, CatalogError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let mut programs = Vec::new();
    let mut seen_ids = HashSet::new();

    for record in csv_reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let row: CatalogRow = record.deserialize(Some(&headers))?;
        let program = row.into_program().map_err(|reason| CatalogError::InvalidRow { line, reason })?;

        if !seen_ids.insert(program.id) {
            return Err(CatalogError::InvalidRow {
                line,
                reason: format!("duplicate program id {}", program.id),
            });
        }
        programs.push(program);
    }

    Ok(programs)
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    id: u32,
    #[serde(alias = "nome")]
    name: String,
    #[serde(alias = "corso")]
    program: String,
    city: String,
    annual_cost: f64,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    coordinates: Option<String>,
    min_gpa: f64,
    prestige_rank: u32,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    duration_years: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    employment_rate: Option<String>,
    #[serde(default)]
    academic_profile: String,
    #[serde(default)]
    aspiration_values: String,
    #[serde(default)]
    lifestyle_preferences: String,
    english_courses: String,
    dorms_available: String,
    admission_test_required: String,
}

impl CatalogRow {
    fn into_program(self) -> Result<Program, String> {
        if !self.annual_cost.is_finite() || self.annual_cost < 0.0 {
            return Err(format!("annual_cost {} is not a valid amount", self.annual_cost));
        }
        if !self.min_gpa.is_finite() {
            return Err("min_gpa is not a number".to_string());
        }
        if self.city.is_empty() {
            return Err("city is empty".to_string());
        }

        let coordinates = self
            .coordinates
            .as_deref()
            .map(parse_coordinates)
            .transpose()?;
        let duration_years = parse_optional_number(self.duration_years.as_deref(), "duration_years", 3)?;
        let employment_rate = parse_optional_number(self.employment_rate.as_deref(), "employment_rate", 0)?;

        Ok(Program {
            id: self.id,
            name: self.name,
            program: self.program,
            city: self.city,
            annual_cost: self.annual_cost,
            coordinates,
            min_gpa: self.min_gpa,
            prestige_rank: self.prestige_rank,
            duration_years,
            employment_rate,
            academic_profile: self.academic_profile,
            aspiration_values: self.aspiration_values,
            lifestyle_preferences: self.lifestyle_preferences,
            offers_english_instruction: parse_bool(&self.english_courses, "english_courses")?,
            has_housing: parse_bool(&self.dorms_available, "dorms_available")?,
            requires_admission_test: parse_bool(&self.admission_test_required, "admission_test_required")?,
        })
    }
}

fn parse_coordinates(raw: &str) -> Result<Coordinates, String> {
    let coords: Coordinates = serde_json::from_str(raw)
        .map_err(|e| format!("coordinates {raw:?} are not valid JSON: {e}"))?;
    if !(-90.0..=90.0).contains(&coords.lat) || !(-180.0..=180.0).contains(&coords.lon) {
        return Err(format!("coordinates {raw:?} are out of range"));
    }
    Ok(coords)
}

fn parse_optional_number(raw: Option<&str>, field: &str, default: u8) -> Result<u8, String> {
    match raw {
        Some(value) => value
            .parse::<u8>()
            .map_err(|_| format!("{field} {value:?} is not a small whole number")),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str, field: &str) -> Result<bool, String> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(format!("{field} {other:?} is not a boolean")),
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}
