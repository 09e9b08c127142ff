//! Plain-text log weight vectors: one value per line.
//!
//! Blank lines and lines starting with `#` are skipped on input. Extra
//! tab-separated columns are ignored; only the first is read.

use csv::{ReaderBuilder, Trim, WriterBuilder};
use ndarray::{Array1, ArrayView1};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeightsIoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed weights file: {0}")]
    Csv(#[from] csv::Error),
    #[error("Line {line}: '{value}' is not a number.")]
    InvalidNumber { line: u64, value: String },
    #[error("No log weights found in input.")]
    Empty,
}

/// Reads a log weight vector from `reader`.
pub fn parse_weights<R: Read>(reader: R) -> Result<Array1<f64>, WeightsIoError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .comment(Some(b'#'))
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut values = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let field = match record.get(0) {
            Some(f) if !f.is_empty() => f,
            _ => continue,
        };
        let value = field
            .parse::<f64>()
            .map_err(|_| WeightsIoError::InvalidNumber {
                line: record.position().map_or(0, |p| p.line()),
                value: field.to_string(),
            })?;
        values.push(value);
    }

    if values.is_empty() {
        return Err(WeightsIoError::Empty);
    }
    Ok(Array1::from(values))
}

/// Reads a log weight vector from the file at `path`.
pub fn read_weights(path: &Path) -> Result<Array1<f64>, WeightsIoError> {
    parse_weights(File::open(path)?)
}

/// Writes one value per line, in shortest round-trip form.
pub fn write_weights<W: Write>(writer: W, weights: ArrayView1<f64>) -> Result<(), WeightsIoError> {
    let mut wtr = WriterBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .from_writer(writer);
    for w in weights.iter() {
        wtr.write_record([w.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}
