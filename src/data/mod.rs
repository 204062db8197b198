pub mod batcher;
pub mod batchitem;
pub mod embeddings;
pub mod frame;
pub mod loader;
pub mod scaler;
pub mod window;

pub use batchitem::ForecastBatch;
pub use loader::{load_data, load_data_from_frame, BatchLoader, DataBundle};
pub use scaler::StandardScaler;
