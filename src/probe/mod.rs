pub mod batch;
pub mod forward;

pub use batch::{describe_batch, fetch_one_batch, first_batch, BatchReport, TensorInfo};
pub use forward::{run_forward_pass, ForwardOutput, ParamSnapshot};
