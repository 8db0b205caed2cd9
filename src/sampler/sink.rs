use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use super::error::SamplerError;
use super::format::{format_decimal, format_timestamp};
use super::{sample_pass, Sample};
use crate::predict::PositionSource;

/// Write samples as CSV: `timestamp,altitude,azimuth` and optionally `range`.
pub fn write_csv<W: Write>(
    writer: W,
    samples: &[Sample],
    tz: &Tz,
    include_range: bool,
) -> Result<(), SamplerError> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = vec!["timestamp", "altitude", "azimuth"];
    if include_range {
        header.push("range");
    }
    csv.write_record(&header)?;

    for sample in samples {
        let mut row = vec![
            format_timestamp(sample.timestamp, tz),
            format_decimal(sample.altitude_deg),
            format_decimal(sample.azimuth_deg),
        ];
        if include_range {
            row.push(format_decimal(sample.range_km));
        }
        csv.write_record(&row)?;
    }

    csv.flush()?;
    Ok(())
}

/// Sample one pass and write it to `path`.
///
/// Every position is computed before the file is created, so a failed query
/// leaves nothing behind. A failed write removes the partial file.
pub fn export_pass<P: PositionSource + ?Sized>(
    path: &Path,
    source: &P,
    rise: DateTime<Utc>,
    set: DateTime<Utc>,
    tz: &Tz,
    include_range: bool,
) -> Result<usize, SamplerError> {
    let samples = sample_pass(source, rise, set)?;

    let result = File::create(path)
        .map_err(SamplerError::from)
        .and_then(|file| write_csv(file, &samples, tz, include_range));

    if let Err(e) = result {
        if path.exists() {
            if let Err(remove_err) = fs::remove_file(path) {
                log::warn!("Failed to remove partial file {}: {}", path.display(), remove_err);
            }
        }
        return Err(e);
    }

    Ok(samples.len())
}

/// Console rendering: range is shown to one decimal place.
pub fn print_samples<W: Write>(
    mut out: W,
    samples: &[Sample],
    tz: &Tz,
) -> Result<(), SamplerError> {
    writeln!(out, "timestamp\taltitude\tazimuth\trange")?;
    for sample in samples {
        writeln!(
            out,
            "{}\t{}\t{}\t{:.1} km",
            format_timestamp(sample.timestamp, tz),
            format_decimal(sample.altitude_deg),
            format_decimal(sample.azimuth_deg),
            sample.range_km
        )?;
    }
    Ok(())
}
