use crate::engine::error::EngineError;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error for '{path}': {source}")]
    Csv { path: String, source: csv::Error },
}

#[derive(Debug, Serialize, Deserialize)]
struct Sample {
    x: f64,
    value: f64,
}

/// A function tabulated on an ascending grid.
///
/// Correlation functions are returned in this form. Values between grid
/// points are obtained by linear interpolation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampledFunction {
    axis: Vec<f64>,
    values: Vec<f64>,
}

impl SampledFunction {
    pub fn new(axis: Vec<f64>, values: Vec<f64>) -> Result<Self, EngineError> {
        if axis.len() != values.len() {
            return Err(EngineError::InvalidParameter(format!(
                "sampled function has {} grid points but {} values",
                axis.len(),
                values.len()
            )));
        }
        Ok(Self { axis, values })
    }

    pub fn axis(&self) -> &[f64] {
        &self.axis
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.axis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axis.is_empty()
    }

    /// Returns `(x, f(x))` pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.axis.iter().copied().zip(self.values.iter().copied())
    }

    pub fn into_tuple(self) -> (Vec<f64>, Vec<f64>) {
        (self.axis, self.values)
    }

    /// Evaluates the function at `x` by linear interpolation.
    ///
    /// Returns `None` outside `[axis[0], axis[len-1]]`.
    pub fn interpolate(&self, x: f64) -> Option<f64> {
        let first = *self.axis.first()?;
        let last = *self.axis.last()?;
        if !(first..=last).contains(&x) {
            return None;
        }
        let upper = self.axis.partition_point(|&a| a < x);
        if upper == 0 {
            return Some(self.values[0]);
        }
        let (x0, x1) = (self.axis[upper - 1], self.axis[upper]);
        let (y0, y1) = (self.values[upper - 1], self.values[upper]);
        Some(y0 + (y1 - y0) * (x - x0) / (x1 - x0))
    }

    /// Writes the samples as CSV with the header `x,value`.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        self.write_records(csv::Writer::from_writer(writer))
    }

    pub fn save_csv(&self, path: &Path) -> Result<(), ExportError> {
        let to_error = |source| ExportError::Csv {
            path: path.to_string_lossy().to_string(),
            source,
        };
        let writer = csv::Writer::from_path(path).map_err(to_error)?;
        self.write_records(writer).map_err(to_error)
    }

    fn write_records<W: Write>(&self, mut writer: csv::Writer<W>) -> Result<(), csv::Error> {
        for (x, value) in self.points() {
            writer.serialize(Sample { x, value })?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Reads samples written by [`save_csv`](Self::save_csv).
    pub fn load_csv(path: &Path) -> Result<Self, ExportError> {
        let to_error = |source| ExportError::Csv {
            path: path.to_string_lossy().to_string(),
            source,
        };
        let mut reader = csv::Reader::from_path(path).map_err(to_error)?;
        let mut axis = Vec::new();
        let mut values = Vec::new();
        for record in reader.deserialize::<Sample>() {
            let sample = record.map_err(to_error)?;
            axis.push(sample.x);
            values.push(sample.value);
        }
        Ok(Self { axis, values })
    }
}
