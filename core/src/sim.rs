//! Simulation and batch-processing utilities
//!
//! Synthetic test signals, runs of a filter over a stream of measurements, CSV input and
//! output of measurements and results, and the error metrics used to judge a run.
use std::error::Error;
use std::io;
use std::path::Path;

use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};

use crate::error::FilterResult;
use crate::kalman::UnscentedKalmanFilter;
use crate::models::{ObservationModel, ProcessModel};

/// The rounded π used by the reference sine signal.
#[allow(clippy::approx_constant)]
pub const REFERENCE_PI: f64 = 3.14;

/// Step of the reference sine signal, 5 degrees (with π ≈ 3.14) per sample.
pub const REFERENCE_STEP: f64 = degrees_to_step(5.0);

/// Convert a phase step in degrees to radians using [`REFERENCE_PI`].
pub const fn degrees_to_step(degrees: f64) -> f64 {
    degrees * REFERENCE_PI / 180.0
}

/// Additive measurement noise for synthetic signals.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalNoise {
    /// Uniform on `[low, high)`
    Uniform { low: f64, high: f64 },
    /// Gaussian with the given mean and standard deviation
    Gaussian { mean: f64, std_dev: f64 },
}

impl Default for SignalNoise {
    fn default() -> Self {
        SignalNoise::Uniform {
            low: 0.0,
            high: 0.5,
        }
    }
}

/// One sample of a synthetic signal: the noise-free value and its noisy measurement.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalSample {
    pub index: usize,
    pub truth: f64,
    pub measurement: f64,
}

/// Generate `samples` points of `sin(k · step)` corrupted by `noise`.
///
/// # Errors
/// Returns an error if the noise distribution is invalid (e.g. `low >= high`).
///
/// # Example
///
/// ```
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
/// use ukf::sim::{noisy_sine, SignalNoise, REFERENCE_STEP};
///
/// let mut rng = StdRng::seed_from_u64(7);
/// let signal = noisy_sine(100, REFERENCE_STEP, SignalNoise::default(), &mut rng).unwrap();
/// assert_eq!(signal.len(), 100);
/// assert!(signal.iter().all(|s| s.measurement >= s.truth));
/// ```
pub fn noisy_sine<R: Rng + ?Sized>(
    samples: usize,
    step: f64,
    noise: SignalNoise,
    rng: &mut R,
) -> Result<Vec<SignalSample>, Box<dyn Error>> {
    let noise: Vec<f64> = match noise {
        SignalNoise::Uniform { low, high } => Uniform::<f64>::new(low, high)?
            .sample_iter(&mut *rng)
            .take(samples)
            .collect(),
        SignalNoise::Gaussian { mean, std_dev } => Normal::new(mean, std_dev)?
            .sample_iter(&mut *rng)
            .take(samples)
            .collect(),
    };
    Ok(noise
        .into_iter()
        .enumerate()
        .map(|(index, n)| {
            let truth = (index as f64 * step).sin();
            SignalSample {
                index,
                truth,
                measurement: truth + n,
            }
        })
        .collect())
}

/// Filter output for one scalar sample of a synthetic signal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    pub index: usize,
    pub truth: f64,
    pub measurement: f64,
    pub estimate: f64,
    pub variance: f64,
}

impl SignalRecord {
    /// Read records from a CSV file with a header row.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Self>, Box<dyn Error>> {
        let mut rdr = csv::Reader::from_path(path)?;
        let mut records = Vec::new();
        for result in rdr.deserialize() {
            let record: Self = result?;
            records.push(record);
        }
        Ok(records)
    }
    /// Write records to a CSV file with a header row.
    pub fn to_csv<P: AsRef<Path>>(records: &[Self], path: P) -> io::Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Filter output for one multi-dimensional measurement.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterRecord {
    pub index: usize,
    pub measurement: Vec<f64>,
    pub state: Vec<f64>,
    /// Diagonal of the state covariance
    pub variance: Vec<f64>,
}

impl FilterRecord {
    /// Write records as CSV with columns `index, z0.., x0.., var0..`.
    pub fn to_csv<P: AsRef<Path>>(records: &[Self], path: P) -> io::Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        if let Some(first) = records.first() {
            let mut header = vec!["index".to_string()];
            header.extend((0..first.measurement.len()).map(|i| format!("z{i}")));
            header.extend((0..first.state.len()).map(|i| format!("x{i}")));
            header.extend((0..first.variance.len()).map(|i| format!("var{i}")));
            writer.write_record(&header)?;
        }
        for record in records {
            let mut row = vec![record.index.to_string()];
            row.extend(record.measurement.iter().map(f64::to_string));
            row.extend(record.state.iter().map(f64::to_string));
            row.extend(record.variance.iter().map(f64::to_string));
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Read a CSV file of measurements, one measurement per row and one component per column.
///
/// # Errors
/// Returns an error if the file cannot be read, a field is not a number, or the rows do not
/// all have the same number of columns.
pub fn read_measurements<P: AsRef<Path>>(
    path: P,
    has_headers: bool,
) -> Result<Vec<Vec<f64>>, Box<dyn Error>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(has_headers)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row = record
            .iter()
            .map(|field| field.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(row);
    }
    Ok(rows)
}

/// Run `filter` over every measurement, recording the estimate after each update.
///
/// # Errors
/// Stops at the first rejected update and returns its error.
pub fn run_filter<F, H>(
    filter: &mut UnscentedKalmanFilter<F, H>,
    measurements: &[Vec<f64>],
) -> FilterResult<Vec<FilterRecord>>
where
    F: ProcessModel,
    H: ObservationModel,
{
    let mut records = Vec::with_capacity(measurements.len());
    for (index, z) in measurements.iter().enumerate() {
        filter.update(z)?;
        let (state, variance) = estimate_of(filter);
        records.push(FilterRecord {
            index,
            measurement: z.clone(),
            state,
            variance,
        });
    }
    Ok(records)
}

/// Run `filter` over a scalar synthetic signal. The first state component is reported.
pub fn run_signal<F, H>(
    filter: &mut UnscentedKalmanFilter<F, H>,
    signal: &[SignalSample],
) -> FilterResult<Vec<SignalRecord>>
where
    F: ProcessModel,
    H: ObservationModel,
{
    let mut records = Vec::with_capacity(signal.len());
    for sample in signal {
        filter.update(&[sample.measurement])?;
        let (state, variance) = estimate_of(filter);
        records.push(SignalRecord {
            index: sample.index,
            truth: sample.truth,
            measurement: sample.measurement,
            estimate: state.first().copied().unwrap_or(f64::NAN),
            variance: variance.first().copied().unwrap_or(f64::NAN),
        });
    }
    Ok(records)
}

fn estimate_of<F, H>(filter: &UnscentedKalmanFilter<F, H>) -> (Vec<f64>, Vec<f64>) {
    let state = filter
        .get_state()
        .map(|x| x.iter().copied().collect())
        .unwrap_or_default();
    let variance = filter
        .get_covariance()
        .map(|p| p.diagonal().iter().copied().collect())
        .unwrap_or_default();
    (state, variance)
}

/// Mean absolute difference between two equally long sequences.
pub fn mean_absolute_error(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len(), "mean_absolute_error: length mismatch");
    if a.is_empty() {
        return 0.0;
    }
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum::<f64>() / a.len() as f64
}

/// Sum of absolute sample-to-sample changes.
pub fn total_variation(values: &[f64]) -> f64 {
    values.windows(2).map(|w| (w[1] - w[0]).abs()).sum()
}

/// Error metrics of a filtered synthetic signal against its noise-free truth.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SignalSummary {
    pub measurement_mae: f64,
    pub estimate_mae: f64,
    pub measurement_variation: f64,
    pub estimate_variation: f64,
    pub final_variance: f64,
}

impl SignalSummary {
    pub fn from_records(records: &[SignalRecord]) -> Self {
        let truth: Vec<f64> = records.iter().map(|r| r.truth).collect();
        let measurements: Vec<f64> = records.iter().map(|r| r.measurement).collect();
        let estimates: Vec<f64> = records.iter().map(|r| r.estimate).collect();
        SignalSummary {
            measurement_mae: mean_absolute_error(&measurements, &truth),
            estimate_mae: mean_absolute_error(&estimates, &truth),
            measurement_variation: total_variation(&measurements),
            estimate_variation: total_variation(&estimates),
            final_variance: records.last().map_or(f64::NAN, |r| r.variance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::FilterParameters;
    use assert_approx_eq::assert_approx_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ukf_sim_{}_{}", std::process::id(), name))
    }

    #[test]
    fn sine_truth_and_noise_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let signal = noisy_sine(50, REFERENCE_STEP, SignalNoise::default(), &mut rng).unwrap();
        for (k, s) in signal.iter().enumerate() {
            assert_eq!(s.index, k);
            assert_approx_eq!(s.truth, (k as f64 * REFERENCE_STEP).sin(), 1e-15);
            let noise = s.measurement - s.truth;
            assert!((-1e-12..0.5 + 1e-12).contains(&noise));
        }
    }

    #[test]
    fn gaussian_noise() {
        let mut rng = StdRng::seed_from_u64(3);
        let noise = SignalNoise::Gaussian {
            mean: 0.0,
            std_dev: 0.1,
        };
        let signal = noisy_sine(2000, 0.01, noise, &mut rng).unwrap();
        let errors: Vec<f64> = signal.iter().map(|s| s.measurement - s.truth).collect();
        let mean = errors.iter().sum::<f64>() / errors.len() as f64;
        assert!(mean.abs() < 0.02);
    }

    #[test]
    fn invalid_noise_is_an_error() {
        let mut rng = StdRng::seed_from_u64(3);
        let noise = SignalNoise::Uniform {
            low: 1.0,
            high: 0.0,
        };
        assert!(noisy_sine(10, 0.1, noise, &mut rng).is_err());
        let noise = SignalNoise::Gaussian {
            mean: 0.0,
            std_dev: f64::NAN,
        };
        assert!(noisy_sine(10, 0.1, noise, &mut rng).is_err());
    }

    #[test]
    fn metrics() {
        assert_approx_eq!(mean_absolute_error(&[1.0, 2.0, 3.0], &[1.0, 1.0, 5.0]), 1.0);
        assert_eq!(mean_absolute_error(&[], &[]), 0.0);
        assert_approx_eq!(total_variation(&[0.0, 1.0, -1.0, -1.0]), 3.0);
        assert_eq!(total_variation(&[2.0]), 0.0);
    }

    #[test]
    fn reference_step_uses_rounded_pi() {
        assert_approx_eq!(REFERENCE_STEP, 0.087_222_222_222_222_22, 1e-15);
        assert_approx_eq!(degrees_to_step(180.0), REFERENCE_PI, 1e-15);
    }

    #[test]
    fn run_filter_records_every_step() {
        let mut ukf = UnscentedKalmanFilter::new(0, FilterParameters::default()).unwrap();
        let measurements = vec![vec![0.1, 0.2], vec![0.2, 0.3], vec![0.3, 0.4]];
        let records = run_filter(&mut ukf, &measurements).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].index, 2);
        assert_eq!(records[2].measurement, vec![0.3, 0.4]);
        assert_eq!(records[2].state.len(), 2);
        assert_eq!(records[2].variance.len(), 2);
        assert!(records.iter().all(|r| r.variance.iter().all(|v| *v > 0.0)));
    }

    #[test]
    fn run_filter_stops_on_error() {
        let mut ukf = UnscentedKalmanFilter::new(0, FilterParameters::default()).unwrap();
        let measurements = vec![vec![0.1], vec![0.2, 0.3]];
        assert!(run_filter(&mut ukf, &measurements).is_err());
    }

    #[test]
    fn signal_records_csv() {
        let mut rng = StdRng::seed_from_u64(11);
        let signal = noisy_sine(20, REFERENCE_STEP, SignalNoise::default(), &mut rng).unwrap();
        let mut ukf = UnscentedKalmanFilter::new(0, FilterParameters::default()).unwrap();
        let records = run_signal(&mut ukf, &signal).unwrap();
        let path = temp_path("signal.csv");
        SignalRecord::to_csv(&records, &path).unwrap();
        let read = SignalRecord::from_csv(&path).unwrap();
        assert_eq!(read.len(), records.len());
        assert_eq!(read[5].index, 5);
        assert_approx_eq!(read[5].estimate, records[5].estimate, 1e-12);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn measurements_and_results_csv() {
        let input = temp_path("measurements.csv");
        std::fs::write(&input, "a,b\n0.1, 0.2\n0.3,0.4\n").unwrap();
        let rows = read_measurements(&input, true).unwrap();
        assert_eq!(rows, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);

        let mut ukf = UnscentedKalmanFilter::new(0, FilterParameters::default()).unwrap();
        let records = run_filter(&mut ukf, &rows).unwrap();
        let output = temp_path("results.csv");
        FilterRecord::to_csv(&records, &output).unwrap();
        let written = std::fs::read_to_string(&output).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("index,z0,z1,x0,x1,var0,var1"));
        assert_eq!(lines.count(), 2);
        let _ = std::fs::remove_file(&input);
        let _ = std::fs::remove_file(&output);
    }

    #[test]
    fn unparsable_measurement_is_an_error() {
        let input = temp_path("bad.csv");
        std::fs::write(&input, "0.1\nabc\n").unwrap();
        assert!(read_measurements(&input, false).is_err());
        let _ = std::fs::remove_file(&input);
    }

    #[test]
    fn summary_from_records() {
        let records = vec![
            SignalRecord {
                index: 0,
                truth: 0.0,
                measurement: 0.5,
                estimate: 0.1,
                variance: 1.0,
            },
            SignalRecord {
                index: 1,
                truth: 1.0,
                measurement: 1.5,
                estimate: 0.9,
                variance: 0.5,
            },
        ];
        let summary = SignalSummary::from_records(&records);
        assert_approx_eq!(summary.measurement_mae, 0.5);
        assert_approx_eq!(summary.estimate_mae, 0.1);
        assert_approx_eq!(summary.measurement_variation, 1.0);
        assert_approx_eq!(summary.estimate_variation, 0.8);
        assert_eq!(summary.final_variance, 0.5);
    }
}
