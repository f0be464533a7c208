/// Errors surfaced by the fitting pipeline.
///
/// All fatal failures are enumerated here so callers can match on them. No
/// partial results accompany an error: a failed fit produces no output
/// record. The all-variables-fixed case is deliberately *not* an error; the
/// optimizer returns the fixed point and the orchestrator logs a warning.
#[derive(Clone, PartialEq)]
pub enum NirsError {
    /// A model was asked to evaluate a geometry it does not support, e.g. a
    /// long-separation slope model without a far detector distance.
    InvalidModel { detail: String },

    /// A required wavelength sample was missing from the grid, or matched
    /// more than once. Windowing needs exact, unique samples.
    WavelengthLookup { wavelength: f64, matches: usize },

    /// Start / lower / upper bound vectors disagree in length.
    BoundsShape {
        start: usize,
        lower: usize,
        upper: usize,
    },

    /// The simplex search exhausted its iteration budget without meeting
    /// tolerance. Callers may retry with different starts or tolerances; the
    /// library never retries on its own.
    FitConvergence { detail: String },

    /// Malformed input data (mismatched array lengths, unparseable tables).
    Input { message: String },
}

impl std::fmt::Display for NirsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NirsError::InvalidModel { detail } => {
                write!(f, "Invalid model selection: {detail}")
            }
            NirsError::WavelengthLookup {
                wavelength,
                matches,
            } => {
                write!(
                    f,
                    "Expected exactly one sample at {wavelength} nm, found {matches}."
                )
            }
            NirsError::BoundsShape {
                start,
                lower,
                upper,
            } => {
                write!(
                    f,
                    "Start is incompatible in size with the bounds: start={start}, lower={lower}, upper={upper}."
                )
            }
            NirsError::FitConvergence { detail } => {
                write!(f, "Failed to solve for coefficients: {detail}")
            }
            NirsError::Input { message } => write!(f, "{message}"),
        }
    }
}

impl std::fmt::Debug for NirsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NirsError({self})")
    }
}

impl std::error::Error for NirsError {}
