//! Filter tuning parameters and configuration files
//!
//! [`FilterParameters`] holds the five scalar tuning constants of the filter. [`FilterConfig`]
//! bundles them with the declared state dimension and the initial state strategy so a whole
//! filter setup can be kept in a JSON, YAML, or TOML file.
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FilterError, FilterResult};
use crate::models::InitialStateStrategy;

/// Default sigma-point spread
pub const DEFAULT_ALPHA: f64 = 1e-3;
/// Default distribution prior (optimal for Gaussian distributions)
pub const DEFAULT_BETA: f64 = 2.0;
/// Default secondary scaling parameter
pub const DEFAULT_KI: f64 = 0.0;
/// Default process-noise standard deviation
pub const DEFAULT_Q: f64 = 0.05;
/// Default measurement-noise standard deviation
pub const DEFAULT_R: f64 = 0.3;

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}
fn default_beta() -> f64 {
    DEFAULT_BETA
}
fn default_ki() -> f64 {
    DEFAULT_KI
}
fn default_q() -> f64 {
    DEFAULT_Q
}
fn default_r() -> f64 {
    DEFAULT_R
}

/// Tuning constants of the unscented Kalman filter.
///
/// # Example
///
/// ```
/// use ukf::params::FilterParameters;
///
/// let params = FilterParameters::default().with_q(0.1).with_r(0.5);
/// assert_eq!(params.alpha, 1e-3);
/// assert_eq!(params.q, 0.1);
/// assert!(params.validate().is_ok());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterParameters {
    /// Spread of the sigma points around the mean, usually a small positive value.
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    /// Secondary scaling parameter, usually zero.
    #[serde(default = "default_ki")]
    pub ki: f64,
    /// Prior knowledge of the distribution (2 for a Gaussian).
    #[serde(default = "default_beta")]
    pub beta: f64,
    /// Standard deviation of the process noise.
    #[serde(default = "default_q")]
    pub q: f64,
    /// Standard deviation of the measurement noise.
    #[serde(default = "default_r")]
    pub r: f64,
}

impl Default for FilterParameters {
    fn default() -> Self {
        FilterParameters {
            alpha: DEFAULT_ALPHA,
            ki: DEFAULT_KI,
            beta: DEFAULT_BETA,
            q: DEFAULT_Q,
            r: DEFAULT_R,
        }
    }
}

impl FilterParameters {
    /// Build a parameter set from explicit values.
    pub fn from_values(alpha: f64, beta: f64, ki: f64, q: f64, r: f64) -> Self {
        FilterParameters {
            alpha,
            ki,
            beta,
            q,
            r,
        }
    }
    pub fn with_alpha(self, alpha: f64) -> Self {
        FilterParameters { alpha, ..self }
    }
    pub fn with_ki(self, ki: f64) -> Self {
        FilterParameters { ki, ..self }
    }
    pub fn with_beta(self, beta: f64) -> Self {
        FilterParameters { beta, ..self }
    }
    pub fn with_q(self, q: f64) -> Self {
        FilterParameters { q, ..self }
    }
    pub fn with_r(self, r: f64) -> Self {
        FilterParameters { r, ..self }
    }
    /// Check that every parameter is finite and that `alpha` is nonzero.
    ///
    /// Dimension-dependent checks (a degenerate scale factor) happen in
    /// [`SigmaWeights::new`](crate::sigma::SigmaWeights::new) once the state dimension is known.
    pub fn validate(&self) -> FilterResult<()> {
        let fields = [
            ("alpha", self.alpha),
            ("ki", self.ki),
            ("beta", self.beta),
            ("q", self.q),
            ("r", self.r),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(FilterError::InvalidParameters(format!(
                    "{name} must be finite, got {value}"
                )));
            }
        }
        if self.alpha == 0.0 {
            return Err(FilterError::InvalidParameters(
                "alpha must be nonzero".to_string(),
            ));
        }
        Ok(())
    }
    /// Process-noise variance `q²`
    pub fn process_variance(&self) -> f64 {
        self.q * self.q
    }
    /// Measurement-noise variance `r²`
    pub fn measurement_variance(&self) -> f64 {
        self.r * self.r
    }
}

/// Complete filter setup as stored in a configuration file.
///
/// `state_dimension = 0` defers the state dimension to the first measurement.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub state_dimension: usize,
    #[serde(default)]
    pub parameters: FilterParameters,
    #[serde(default)]
    pub initial_state: InitialStateStrategy,
}

/// File I/O shared by the parameter and configuration types. The format is chosen by
/// file extension: `.json`, `.yaml`/`.yml`, or `.toml`.
macro_rules! impl_file_io {
    ($ty:ty) => {
        impl $ty {
            /// Write as pretty-printed JSON.
            pub fn to_json<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
                let file = File::create(path)?;
                serde_json::to_writer_pretty(file, self).map_err(io::Error::other)
            }
            /// Read from JSON.
            pub fn from_json<P: AsRef<Path>>(path: P) -> io::Result<Self> {
                let file = File::open(path)?;
                serde_json::from_reader(file).map_err(io::Error::other)
            }
            /// Write as YAML.
            pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
                let mut file = File::create(path)?;
                let s = serde_yaml::to_string(self).map_err(io::Error::other)?;
                file.write_all(s.as_bytes())
            }
            /// Read from YAML.
            pub fn from_yaml<P: AsRef<Path>>(path: P) -> io::Result<Self> {
                let file = File::open(path)?;
                serde_yaml::from_reader(file).map_err(io::Error::other)
            }
            /// Write as TOML.
            pub fn to_toml<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
                let mut file = File::create(path)?;
                let s = toml::to_string(self).map_err(io::Error::other)?;
                file.write_all(s.as_bytes())
            }
            /// Read from TOML.
            pub fn from_toml<P: AsRef<Path>>(path: P) -> io::Result<Self> {
                let mut s = String::new();
                let mut file = File::open(path)?;
                file.read_to_string(&mut s)?;
                toml::from_str(&s).map_err(io::Error::other)
            }
            /// Generic write: choose format by file extension (.json/.yaml/.yml/.toml)
            pub fn to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
                let p = path.as_ref();
                match extension(p).as_deref() {
                    Some("json") => self.to_json(p),
                    Some("yaml") | Some("yml") => self.to_yaml(p),
                    Some("toml") => self.to_toml(p),
                    _ => Err(unsupported_extension()),
                }
            }
            /// Generic read: choose format by file extension (.json/.yaml/.yml/.toml)
            pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
                let p = path.as_ref();
                match extension(p).as_deref() {
                    Some("json") => Self::from_json(p),
                    Some("yaml") | Some("yml") => Self::from_yaml(p),
                    Some("toml") => Self::from_toml(p),
                    _ => Err(unsupported_extension()),
                }
            }
        }
    };
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
}

fn unsupported_extension() -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, "unsupported file extension")
}

impl_file_io!(FilterParameters);
impl_file_io!(FilterConfig);
