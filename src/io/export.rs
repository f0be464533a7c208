//! Read/write fit-result JSON files.
//!
//! The JSON file is the portable representation of a finished fit: StO2,
//! the fitted coefficients and the residual diagnostics, ready for
//! downstream plotting or cross-run comparisons. The schema is defined by
//! `domain::TissueFit`.

use std::fs::File;
use std::path::Path;

use crate::domain::TissueFit;
use crate::error::NirsError;

/// Write a fit result as pretty-printed JSON.
pub fn write_fit_json(path: &Path, fit: &TissueFit) -> Result<(), NirsError> {
    let file = File::create(path).map_err(|e| NirsError::Input {
        message: format!("Failed to create fit JSON '{}': {e}", path.display()),
    })?;
    serde_json::to_writer_pretty(file, fit).map_err(|e| NirsError::Input {
        message: format!("Failed to write fit JSON: {e}"),
    })?;
    Ok(())
}

/// Read a fit result back from JSON.
pub fn read_fit_json(path: &Path) -> Result<TissueFit, NirsError> {
    let file = File::open(path).map_err(|e| NirsError::Input {
        message: format!("Failed to open fit JSON '{}': {e}", path.display()),
    })?;
    serde_json::from_reader(file).map_err(|e| NirsError::Input {
        message: format!("Invalid fit JSON: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coefficients;

    #[test]
    fn fit_json_round_trips() {
        let fit = TissueFit {
            sto2: 84.0,
            coefficients: Coefficients {
                water_fraction: 0.999,
                hhb: 3.885,
                hbo2: 20.449,
                scatter_amplitude: 0.133,
                scatter_power: 2.556,
            },
            residual: vec![0.1, 0.2],
            residual_norm: vec![0.01, 0.02],
            sum_residual: 0.3,
            score: 0.152,
        };

        let path = std::env::temp_dir().join("nirs_curves_fit_roundtrip.json");
        write_fit_json(&path, &fit).unwrap();
        let loaded = read_fit_json(&path).unwrap();
        assert_eq!(loaded, fit);
    }
}
