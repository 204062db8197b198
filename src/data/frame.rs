use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

use crate::error::{ProbeError, Result};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Sampling interval of a dataset, which decides its calendar covariates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Frequency {
    Hourly,
    Minutely,
}

impl Frequency {
    pub fn for_dataset(name: &str) -> Self {
        if name.starts_with("ETTm") {
            Frequency::Minutely
        } else {
            Frequency::Hourly
        }
    }

    /// Width of the covariate (`x_mark` / `y_mark`) feature axis.
    pub fn num_features(&self) -> usize {
        match self {
            Frequency::Hourly => 4,
            Frequency::Minutely => 5,
        }
    }
}

/// Calendar covariates scaled to `[-0.5, 0.5]`, row-major `[rows, M]`.
///
/// Hourly: hour of day, day of week, day of month, day of year.
/// Minutely prepends minute of hour.
pub fn time_features(timestamps: &[NaiveDateTime], freq: Frequency) -> Vec<f32> {
    let mut features = Vec::with_capacity(timestamps.len() * freq.num_features());

    for ts in timestamps {
        if freq == Frequency::Minutely {
            features.push(ts.minute() as f32 / 59.0 - 0.5);
        }
        features.push(ts.hour() as f32 / 23.0 - 0.5);
        features.push(ts.weekday().num_days_from_monday() as f32 / 6.0 - 0.5);
        features.push((ts.day() - 1) as f32 / 30.0 - 0.5);
        features.push((ts.ordinal() - 1) as f32 / 365.0 - 0.5);
    }

    features
}

/// A multivariate series held in memory, values row-major `[rows, columns]`.
#[derive(Clone, Debug)]
pub struct TimeSeriesFrame {
    name: String,
    columns: Vec<String>,
    timestamps: Vec<NaiveDateTime>,
    values: Vec<f32>,
}

impl TimeSeriesFrame {
    pub fn new(
        name: impl Into<String>,
        columns: Vec<String>,
        timestamps: Vec<NaiveDateTime>,
        values: Vec<f32>,
    ) -> Result<Self> {
        let expected = vec![timestamps.len(), columns.len()];
        if values.len() != timestamps.len() * columns.len() {
            return Err(ProbeError::ShapeMismatch {
                component: "frame",
                expected,
                actual: vec![values.len()],
            });
        }

        Ok(Self {
            name: name.into(),
            columns,
            timestamps,
            values,
        })
    }

    /// Reads a CSV whose first column is a timestamp and the rest numeric
    /// variates, e.g. the ETT files (`date,HUFL,HULL,...,OT`).
    pub fn from_csv(path: impl AsRef<Path>, name: impl Into<String>) -> Result<Self> {
        let path = path.as_ref();
        let csv_err = |source| ProbeError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_err)?;

        let columns: Vec<String> = reader
            .headers()
            .map_err(csv_err)?
            .iter()
            .skip(1)
            .map(String::from)
            .collect();

        let mut timestamps = Vec::new();
        let mut values = Vec::new();

        for (row, record) in reader.records().enumerate() {
            let record = record.map_err(csv_err)?;
            let stamp = record.get(0).unwrap_or_default();
            timestamps.push(parse_timestamp(stamp).ok_or_else(|| ProbeError::Timestamp {
                row,
                value: stamp.to_string(),
            })?);

            for (column, field) in columns.iter().zip(record.iter().skip(1)) {
                let value = field.parse::<f32>().map_err(|_| ProbeError::Value {
                    row,
                    column: column.clone(),
                    value: field.to_string(),
                })?;
                values.push(value);
            }
        }

        let frame = Self::new(name, columns, timestamps, values)?;
        tracing::debug!(
            "Loaded {:?}: {} rows x {} columns",
            path,
            frame.num_rows(),
            frame.num_columns()
        );

        Ok(frame)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn num_rows(&self) -> usize {
        self.timestamps.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp(value: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT).unwrap()
    }

    #[test]
    fn hourly_features_are_centered() {
        // 2016-07-01 is a Friday.
        let features = time_features(&[stamp("2016-07-01 23:00:00")], Frequency::Hourly);

        assert_eq!(features.len(), 4);
        assert!((features[0] - 0.5).abs() < 1e-6);
        assert!((features[1] - (4.0 / 6.0 - 0.5)).abs() < 1e-6);
        assert!((features[2] + 0.5).abs() < 1e-6);
        assert!((features[3] - (182.0 / 365.0 - 0.5)).abs() < 1e-6);
    }

    #[test]
    fn minutely_features_lead_with_minute() {
        let features = time_features(&[stamp("2016-07-01 00:59:00")], Frequency::Minutely);

        assert_eq!(features.len(), 5);
        assert!((features[0] - 0.5).abs() < 1e-6);
        assert!((features[1] + 0.5).abs() < 1e-6);
        assert_eq!(Frequency::for_dataset("ETTm2"), Frequency::Minutely);
        assert_eq!(Frequency::for_dataset("ETTh1"), Frequency::Hourly);
    }

    #[test]
    fn reads_csv() {
        let path = std::env::temp_dir().join(format!("tsprobe-frame-{}.csv", std::process::id()));
        std::fs::write(
            &path,
            "date,HUFL,OT\n2016-07-01 00:00:00,5.8,30.5\n2016-07-01 01:00:00,5.6,27.7\n",
        )
        .unwrap();

        let frame = TimeSeriesFrame::from_csv(&path, "tiny").unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(frame.columns(), &["HUFL".to_string(), "OT".to_string()]);
        assert_eq!(frame.num_rows(), 2);
        assert_eq!(frame.values(), &[5.8, 30.5, 5.6, 27.7]);
        assert_eq!(frame.timestamps()[1].hour(), 1);
    }

    #[test]
    fn rejects_bad_values() {
        let path = std::env::temp_dir().join(format!("tsprobe-bad-{}.csv", std::process::id()));
        std::fs::write(&path, "date,OT\n2016-07-01 00:00:00,warm\n").unwrap();

        let err = TimeSeriesFrame::from_csv(&path, "bad").unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, ProbeError::Value { row: 0, ref column, .. } if column == "OT"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = TimeSeriesFrame::from_csv("/nonexistent/ETTh1.csv", "ETTh1").unwrap_err();
        assert!(matches!(err, ProbeError::Csv { .. }));
    }

    #[test]
    fn frame_shape_is_checked() {
        let err = TimeSeriesFrame::new(
            "short",
            vec!["a".into(), "b".into()],
            vec![stamp("2016-07-01 00:00:00")],
            vec![1.0],
        )
        .unwrap_err();

        assert!(matches!(err, ProbeError::ShapeMismatch { component: "frame", .. }));
    }
}
