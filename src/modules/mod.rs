pub mod gated;
