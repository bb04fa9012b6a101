//! Inference module
//!
//! Turns a raw feature row into target predictions using a loaded
//! (model, scaler) pair. Every row goes through the pair's scaler first;
//! the adapter keeps no per-request state.

mod adapter;
mod slot;

pub use adapter::{predict, InferenceAdapter, InferenceStats, Prediction};
pub use slot::ModelSlot;
