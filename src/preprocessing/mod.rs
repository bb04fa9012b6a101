//! Data preprocessing module
//!
//! Feature standardization fitted on training rows only. The fitted
//! [`ScalerState`] is persisted next to the model it was trained with.

mod scaler;

pub use scaler::{ScalerState, StandardScaler};
