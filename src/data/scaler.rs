use burn::tensor::{backend::Backend, Data, Shape, Tensor};
use serde::{Deserialize, Serialize};

/// Per-column standardization fitted on the training rows.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Vec<f32>,
    std: Vec<f32>,
}

impl StandardScaler {
    /// Fits on row-major `values` with `num_columns` columns. Uses the
    /// population standard deviation; a constant column gets a scale of 1.
    pub fn fit(values: &[f32], num_columns: usize) -> Self {
        let rows = if num_columns == 0 {
            0
        } else {
            values.len() / num_columns
        };
        let count = rows.max(1) as f64;

        let mut mean = vec![0.0f64; num_columns];
        for row in values.chunks_exact(num_columns.max(1)) {
            for (acc, value) in mean.iter_mut().zip(row) {
                *acc += *value as f64;
            }
        }
        mean.iter_mut().for_each(|m| *m /= count);

        let mut variance = vec![0.0f64; num_columns];
        for row in values.chunks_exact(num_columns.max(1)) {
            for ((acc, value), m) in variance.iter_mut().zip(row).zip(&mean) {
                let diff = *value as f64 - m;
                *acc += diff * diff;
            }
        }

        let std = variance
            .into_iter()
            .map(|v| {
                let std = (v / count).sqrt();
                if std == 0.0 {
                    1.0
                } else {
                    std as f32
                }
            })
            .collect();

        Self {
            mean: mean.into_iter().map(|m| m as f32).collect(),
            std,
        }
    }

    pub fn mean(&self) -> &[f32] {
        &self.mean
    }

    pub fn std(&self) -> &[f32] {
        &self.std
    }

    pub fn num_columns(&self) -> usize {
        self.mean.len()
    }

    pub fn transform(&self, values: &[f32]) -> Vec<f32> {
        values
            .chunks_exact(self.num_columns().max(1))
            .flat_map(|row| {
                row.iter()
                    .zip(self.mean.iter().zip(&self.std))
                    .map(|(v, (m, s))| (v - m) / s)
            })
            .collect()
    }

    pub fn inverse_transform(&self, values: &[f32]) -> Vec<f32> {
        values
            .chunks_exact(self.num_columns().max(1))
            .flat_map(|row| {
                row.iter()
                    .zip(self.mean.iter().zip(&self.std))
                    .map(|(v, (m, s))| v * s + m)
            })
            .collect()
    }

    /// Undoes the scaling on a `[batch, time, columns]` tensor.
    pub fn inverse_tensor<B: Backend>(&self, tensor: Tensor<B, 3>) -> Tensor<B, 3> {
        let device = tensor.device();
        let shape = Shape::new([1, 1, self.num_columns()]);

        let mean: Tensor<B, 3> =
            Tensor::from_data(Data::new(self.mean.clone(), shape.clone()).convert())
                .to_device(&device);
        let std: Tensor<B, 3> =
            Tensor::from_data(Data::new(self.std.clone(), shape).convert()).to_device(&device);

        tensor * std + mean
    }
}
