use burn::data::dataloader::batcher::Batcher;
use burn::tensor::backend::Backend;
use burn::tensor::{Data, Shape, Tensor};

use super::batchitem::ForecastBatch;
use super::window::WindowItem;

pub struct ForecastBatcher<B: Backend> {
    device: B::Device,
    seq_len: usize,
    pred_len: usize,
    num_nodes: usize,
    num_marks: usize,
    d_llm: usize,
}

impl<B: Backend> ForecastBatcher<B> {
    pub fn new(
        device: B::Device,
        seq_len: usize,
        pred_len: usize,
        num_nodes: usize,
        num_marks: usize,
        d_llm: usize,
    ) -> Self {
        Self {
            device,
            seq_len,
            pred_len,
            num_nodes,
            num_marks,
            d_llm,
        }
    }

    fn stack<F>(&self, items: &[WindowItem], field: F, dims: [usize; 3]) -> Tensor<B, 3>
    where
        F: Fn(&WindowItem) -> &[f32],
    {
        let values: Vec<f32> = items
            .iter()
            .flat_map(|item| field(item).iter().copied())
            .collect();

        let data = Data::new(values, Shape::new(dims));
        let tensor: Tensor<B, 3> = Tensor::from_data(data.convert());
        tensor.to_device(&self.device)
    }
}

impl<B: Backend> Batcher<WindowItem, ForecastBatch<B>> for ForecastBatcher<B> {
    fn batch(&self, items: Vec<WindowItem>) -> ForecastBatch<B> {
        let batch_size = items.len();

        ForecastBatch {
            x: self.stack(
                &items,
                |item| item.x.as_slice(),
                [batch_size, self.seq_len, self.num_nodes],
            ),
            y: self.stack(
                &items,
                |item| item.y.as_slice(),
                [batch_size, self.pred_len, self.num_nodes],
            ),
            x_mark: self.stack(
                &items,
                |item| item.x_mark.as_slice(),
                [batch_size, self.seq_len, self.num_marks],
            ),
            y_mark: self.stack(
                &items,
                |item| item.y_mark.as_slice(),
                [batch_size, self.pred_len, self.num_marks],
            ),
            embeddings: self.stack(
                &items,
                |item| item.embedding.as_slice(),
                [batch_size, self.num_nodes, self.d_llm],
            ),
        }
    }
}
