use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, Result};

/// One window's auxiliary embedding, flattened `[num_nodes * d_llm]`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EmbeddingRow {
    pub values: Vec<f32>,
}

/// Per-window auxiliary embeddings of a split.
#[derive(Clone, Debug)]
pub enum EmbeddingTable {
    Zeros { width: usize },
    Rows { width: usize, rows: Vec<Vec<f32>> },
}

impl EmbeddingTable {
    pub fn zeros(width: usize) -> Self {
        EmbeddingTable::Zeros { width }
    }

    /// Loads a JSON-lines file of `{"values": [...]}` rows, one per window.
    /// Blank lines are skipped; `row` in errors is the zero-based line.
    pub fn from_json_rows(path: impl AsRef<Path>, width: usize) -> Result<Self> {
        let path = path.as_ref();
        let io_err = |source: std::io::Error| ProbeError::Io {
            path: path.to_path_buf(),
            source,
        };
        let reader = BufReader::new(File::open(path).map_err(io_err)?);

        let mut rows = Vec::new();
        for (row, line) in reader.lines().enumerate() {
            let line = line.map_err(io_err)?;
            if line.trim().is_empty() {
                continue;
            }

            let item: EmbeddingRow =
                serde_json::from_str(&line).map_err(|source| ProbeError::EmbeddingParse {
                    path: path.to_path_buf(),
                    row,
                    source,
                })?;
            if item.values.len() != width {
                return Err(ProbeError::Embedding {
                    path: path.to_path_buf(),
                    row,
                    expected: width,
                    actual: item.values.len(),
                });
            }
            rows.push(item.values);
        }

        tracing::debug!("Loaded {} embedding rows from {:?}", rows.len(), path);
        Ok(EmbeddingTable::Rows { width, rows })
    }

    /// Resolves `<dir>/<split>.jsonl`, or zeros when no directory is set.
    pub fn for_split(dir: Option<&str>, split: &str, width: usize) -> Result<Self> {
        match dir {
            Some(dir) => {
                let path: PathBuf = Path::new(dir).join(format!("{split}.jsonl"));
                Self::from_json_rows(path, width)
            }
            None => Ok(Self::zeros(width)),
        }
    }

    pub fn width(&self) -> usize {
        match self {
            EmbeddingTable::Zeros { width } | EmbeddingTable::Rows { width, .. } => *width,
        }
    }

    /// Number of stored rows; `None` means any index is valid.
    pub fn num_rows(&self) -> Option<usize> {
        match self {
            EmbeddingTable::Zeros { .. } => None,
            EmbeddingTable::Rows { rows, .. } => Some(rows.len()),
        }
    }

    pub fn row(&self, index: usize) -> Option<Vec<f32>> {
        match self {
            EmbeddingTable::Zeros { width } => Some(vec![0.0; *width]),
            EmbeddingTable::Rows { rows, .. } => rows.get(index).cloned(),
        }
    }
}
