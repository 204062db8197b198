use std::ops::Range;
use std::sync::Arc;

use burn::data::dataset::Dataset;

use super::embeddings::EmbeddingTable;
use crate::error::{ProbeError, Result};

const HOURS_PER_MONTH: usize = 30 * 24;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub fn name(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }

    fn index(&self) -> usize {
        match self {
            Split::Train => 0,
            Split::Val => 1,
            Split::Test => 2,
        }
    }
}

/// Row ranges of the three splits. Val and test start `seq_len` rows before
/// the previous split ends so their first window has a full history.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitBorders {
    start: [usize; 3],
    end: [usize; 3],
}

impl SplitBorders {
    /// ETTh uses 12/4/4 months of hourly rows, ETTm the same at 15 minute
    /// resolution, and every other dataset a 70/10/20 ratio split.
    pub fn for_dataset(name: &str, num_rows: usize, seq_len: usize) -> Result<Self> {
        let rows_per_month = if name.starts_with("ETTh") {
            Some(HOURS_PER_MONTH)
        } else if name.starts_with("ETTm") {
            Some(HOURS_PER_MONTH * 4)
        } else {
            None
        };

        let (train_end, val_end, test_end) = match rows_per_month {
            Some(month) => (12 * month, 16 * month, 20 * month),
            None => {
                let num_train = (num_rows as f64 * 0.7) as usize;
                let num_test = (num_rows as f64 * 0.2) as usize;
                let num_val = num_rows - num_train - num_test;
                (num_train, num_train + num_val, num_rows)
            }
        };

        let required = test_end.max(seq_len);
        if num_rows < required || train_end < seq_len {
            return Err(ProbeError::InsufficientData {
                name: name.to_string(),
                required: required.max(seq_len + 1),
                actual: num_rows,
            });
        }

        Ok(Self {
            start: [0, train_end - seq_len, val_end - seq_len],
            end: [train_end, val_end, test_end],
        })
    }

    pub fn range(&self, split: Split) -> Range<usize> {
        let i = split.index();
        self.start[i]..self.end[i]
    }
}

/// One sliding window, every field row-major and flattened.
#[derive(Clone, Debug)]
pub struct WindowItem {
    pub x: Vec<f32>,          // [seq_len, num_nodes]
    pub y: Vec<f32>,          // [pred_len, num_nodes]
    pub x_mark: Vec<f32>,     // [seq_len, num_marks]
    pub y_mark: Vec<f32>,     // [pred_len, num_marks]
    pub embedding: Vec<f32>, // [num_nodes * d_llm]
}

/// The rows of one split, already scaled.
#[derive(Debug)]
pub struct SplitSeries {
    pub values: Vec<f32>,
    pub marks: Vec<f32>,
    pub num_nodes: usize,
    pub num_marks: usize,
    pub embeddings: EmbeddingTable,
}

impl SplitSeries {
    pub fn num_rows(&self) -> usize {
        if self.num_nodes == 0 {
            0
        } else {
            self.values.len() / self.num_nodes
        }
    }
}

/// Sliding-window view over a split: window `i` reads rows `i..i+seq_len`
/// as input and the following `pred_len` rows as target.
#[derive(Clone, Debug)]
pub struct WindowDataset {
    split: Split,
    series: Arc<SplitSeries>,
    seq_len: usize,
    pred_len: usize,
}

impl WindowDataset {
    pub fn new(split: Split, series: SplitSeries, seq_len: usize, pred_len: usize) -> Result<Self> {
        let dataset = Self {
            split,
            series: Arc::new(series),
            seq_len,
            pred_len,
        };

        if let Some(rows) = dataset.series.embeddings.num_rows() {
            if rows < dataset.len() {
                return Err(ProbeError::InsufficientData {
                    name: format!("{} embeddings", split.name()),
                    required: dataset.len(),
                    actual: rows,
                });
            }
        }

        Ok(dataset)
    }

    pub fn split(&self) -> Split {
        self.split
    }

    pub fn num_nodes(&self) -> usize {
        self.series.num_nodes
    }

    pub fn num_marks(&self) -> usize {
        self.series.num_marks
    }
}

impl Dataset<WindowItem> for WindowDataset {
    fn get(&self, index: usize) -> Option<WindowItem> {
        if index >= self.len() {
            return None;
        }

        let series = &self.series;
        let (n, m) = (series.num_nodes, series.num_marks);
        let input = index..index + self.seq_len;
        let target = input.end..input.end + self.pred_len;

        Some(WindowItem {
            x: series.values[input.start * n..input.end * n].to_vec(),
            y: series.values[target.start * n..target.end * n].to_vec(),
            x_mark: series.marks[input.start * m..input.end * m].to_vec(),
            y_mark: series.marks[target.start * m..target.end * m].to_vec(),
            embedding: series.embeddings.row(index)?,
        })
    }

    fn len(&self) -> usize {
        (self.series.num_rows() + 1).saturating_sub(self.seq_len + self.pred_len)
    }
}
