//! Loading of tabulated extinction coefficients and defaults.
//!
//! Two CSV layouts are supported on the same reader:
//!
//! - the defaults bundle: a `wavelength`-keyed table with one column per
//!   species (default `HbO2`, `HHb`, `CCO`) plus a `wl_dep` column for the
//!   wavelength dependency of pathlength
//! - the derivative-fit layout: `wavelength`, `hhb`, `hbo2`, `water`
//!
//! Design goals mirror the rest of the io layer:
//! - strict schema for required columns (clear errors up front)
//! - row-level errors carry line numbers
//! - no fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use csv::StringRecord;
use nalgebra::DMatrix;

use crate::domain::ExtinctionTable;
use crate::error::NirsError;

/// Species columns loaded by default.
pub const DEFAULT_SPECIES: [&str; 3] = ["HbO2", "HHb", "CCO"];

/// The defaults bundle consumed by the linear (Beer-Lambert) pathway.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectralDefaults {
    /// Sampled wavelength grid, nm, in file order.
    pub wavelengths: Vec<f64>,
    /// Extinction coefficients, one row per wavelength, one column per
    /// requested species.
    pub extinction: DMatrix<f64>,
    /// Wavelength dependency of pathlength.
    pub wavelength_dependency: Vec<f64>,
}

/// Load the defaults bundle, selecting `species` columns in order.
pub fn load_defaults(path: &Path, species: &[&str]) -> Result<SpectralDefaults, NirsError> {
    let mut reader = open_reader(path)?;
    let header_map = build_header_map(reader.headers().map_err(|e| NirsError::Input {
        message: format!("Failed to read CSV headers: {e}"),
    })?);

    let mut required: Vec<&str> = vec!["wavelength", "wl_dep"];
    required.extend_from_slice(species);
    ensure_columns_exist(&header_map, &required)?;

    let mut wavelengths = Vec::new();
    let mut dependency = Vec::new();
    let mut coefficients: Vec<f64> = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| NirsError::Input {
            message: format!("Failed to read CSV record on line {}: {e}", row + 2),
        })?;
        wavelengths.push(get_f64(&record, &header_map, "wavelength", row)?);
        dependency.push(get_f64(&record, &header_map, "wl_dep", row)?);
        for name in species {
            coefficients.push(get_f64(&record, &header_map, name, row)?);
        }
    }

    let extinction =
        DMatrix::from_row_slice(wavelengths.len(), species.len(), &coefficients);
    Ok(SpectralDefaults {
        wavelengths,
        extinction,
        wavelength_dependency: dependency,
    })
}

/// Load the four-column extinction table used by the derivative fit.
pub fn load_extinction_table(path: &Path) -> Result<ExtinctionTable, NirsError> {
    let mut reader = open_reader(path)?;
    let header_map = build_header_map(reader.headers().map_err(|e| NirsError::Input {
        message: format!("Failed to read CSV headers: {e}"),
    })?);
    ensure_columns_exist(&header_map, &["wavelength", "hhb", "hbo2", "water"])?;

    let mut wavelengths = Vec::new();
    let mut hhb = Vec::new();
    let mut hbo2 = Vec::new();
    let mut water = Vec::new();

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| NirsError::Input {
            message: format!("Failed to read CSV record on line {}: {e}", row + 2),
        })?;
        wavelengths.push(get_f64(&record, &header_map, "wavelength", row)?);
        hhb.push(get_f64(&record, &header_map, "hhb", row)?);
        hbo2.push(get_f64(&record, &header_map, "hbo2", row)?);
        water.push(get_f64(&record, &header_map, "water", row)?);
    }

    ExtinctionTable::new(wavelengths, hhb, hbo2, water)
}

fn open_reader(path: &Path) -> Result<csv::Reader<File>, NirsError> {
    let file = File::open(path).map_err(|e| NirsError::Input {
        message: format!("Failed to open CSV '{}': {e}", path.display()),
    })?;
    Ok(csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(file))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Some spreadsheet exports prefix the first header with a UTF-8 BOM;
    // strip it so schema validation doesn't report a missing column.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn ensure_columns_exist(
    header_map: &HashMap<String, usize>,
    names: &[&str],
) -> Result<(), NirsError> {
    for name in names {
        if !header_map.contains_key(&normalize_header_name(name)) {
            return Err(NirsError::Input {
                message: format!("Missing required column: `{name}`"),
            });
        }
    }
    Ok(())
}

fn get_f64(
    record: &StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
    row: usize,
) -> Result<f64, NirsError> {
    let idx = header_map[&normalize_header_name(name)];
    let raw = record.get(idx).unwrap_or("");
    raw.parse::<f64>().map_err(|_| NirsError::Input {
        message: format!(
            "Line {}: column `{name}` has unparseable value '{raw}'.",
            row + 2
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_defaults_bundle() {
        let path = write_temp(
            "nirs_curves_defaults_test.csv",
            "wavelength,HbO2,HHb,CCO,wl_dep\n780,1.0,2.0,3.0,0.9\n781,1.1,2.1,3.1,0.91\n",
        );
        let defaults = load_defaults(&path, &DEFAULT_SPECIES).unwrap();
        assert_eq!(defaults.wavelengths, vec![780.0, 781.0]);
        assert_eq!(defaults.extinction.shape(), (2, 3));
        assert!((defaults.extinction[(1, 2)] - 3.1).abs() < 1e-12);
        assert_eq!(defaults.wavelength_dependency, vec![0.9, 0.91]);
    }

    #[test]
    fn loads_extinction_table() {
        let path = write_temp(
            "nirs_curves_extinction_test.csv",
            "wavelength,HHb,HbO2,water\n710,0.1,0.2,0.001\n715,0.11,0.19,0.0012\n",
        );
        let table = load_extinction_table(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.wavelengths(), &[710.0, 715.0]);
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let path = write_temp(
            "nirs_curves_missing_col_test.csv",
            "wavelength,HbO2,HHb\n780,1.0,2.0\n",
        );
        let err = load_defaults(&path, &DEFAULT_SPECIES).unwrap_err();
        assert!(err.to_string().contains("wl_dep") || err.to_string().contains("CCO"));
    }

    #[test]
    fn unparseable_cell_reports_line_number() {
        let path = write_temp(
            "nirs_curves_bad_cell_test.csv",
            "wavelength,HHb,HbO2,water\n710,0.1,0.2,0.001\n715,abc,0.19,0.0012\n",
        );
        let err = load_extinction_table(&path).unwrap_err();
        assert!(err.to_string().contains("Line 3"), "{err}");
    }
}
